//! Parameter layouts: the named tensors a network owns and their shapes.

/// Entropy bottleneck density filter widths.
const BOTTLENECK_FILTERS: [usize; 4] = [3, 3, 3, 3];
const BOTTLENECK_INIT_SCALE: f64 = 10.0;

/// How a freshly constructed parameter is initialised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamInit {
    KaimingNormal,
    Zeros,
    Ones,
    Const(f64),
    Uniform(f64, f64),
    /// `scale * I`, for square GDN `gamma` matrices.
    ScaledIdentity(f64),
    /// `[-s, 0, s]` along the last axis.
    Quantiles(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub shape: Vec<usize>,
    pub init: ParamInit,
}

impl ParamSpec {
    pub fn elem_count(&self) -> usize {
        self.shape.iter().product()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    params: Vec<ParamSpec>,
}

impl Layout {
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn num_parameters(&self) -> usize {
        self.params.iter().map(ParamSpec::elem_count).sum()
    }
}

#[derive(Debug, Default)]
pub struct LayoutBuilder {
    params: Vec<ParamSpec>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: String, shape: Vec<usize>, init: ParamInit) {
        self.params.push(ParamSpec { name, shape, init });
    }

    /// `Conv2d(in, out, k)`: weight is `(out, in, k, k)`.
    pub fn conv(&mut self, prefix: &str, in_ch: usize, out_ch: usize, kernel: usize) {
        self.push(
            format!("{prefix}.weight"),
            vec![out_ch, in_ch, kernel, kernel],
            ParamInit::KaimingNormal,
        );
        self.push(format!("{prefix}.bias"), vec![out_ch], ParamInit::Zeros);
    }

    /// `ConvTranspose2d(in, out, k)`: weight is `(in, out, k, k)`.
    pub fn deconv(&mut self, prefix: &str, in_ch: usize, out_ch: usize, kernel: usize) {
        self.push(
            format!("{prefix}.weight"),
            vec![in_ch, out_ch, kernel, kernel],
            ParamInit::KaimingNormal,
        );
        self.push(format!("{prefix}.bias"), vec![out_ch], ParamInit::Zeros);
    }

    pub fn gdn(&mut self, prefix: &str, channels: usize) {
        self.push(format!("{prefix}.beta"), vec![channels], ParamInit::Ones);
        self.push(
            format!("{prefix}.gamma"),
            vec![channels, channels],
            ParamInit::ScaledIdentity(0.1),
        );
    }

    pub fn entropy_bottleneck(&mut self, prefix: &str, channels: usize) {
        let mut filters = Vec::with_capacity(BOTTLENECK_FILTERS.len() + 2);
        filters.push(1);
        filters.extend_from_slice(&BOTTLENECK_FILTERS);
        filters.push(1);

        let scale = BOTTLENECK_INIT_SCALE.powf(1.0 / (BOTTLENECK_FILTERS.len() + 1) as f64);
        let last = filters.len() - 1;

        for i in 0..last {
            let fan = filters[i + 1];
            let matrix_init = (1.0 / scale / fan as f64).exp_m1().ln();

            self.push(
                format!("{prefix}._matrix{i}"),
                vec![channels, fan, filters[i]],
                ParamInit::Const(matrix_init),
            );
            self.push(
                format!("{prefix}._bias{i}"),
                vec![channels, fan, 1],
                ParamInit::Uniform(-0.5, 0.5),
            );
            if i < last - 1 {
                self.push(format!("{prefix}._factor{i}"), vec![channels, fan, 1], ParamInit::Zeros);
            }
        }

        self.push(
            format!("{prefix}.quantiles"),
            vec![channels, 1, 3],
            ParamInit::Quantiles(BOTTLENECK_INIT_SCALE),
        );
    }

    pub fn build(self) -> Layout {
        Layout { params: self.params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conv_and_deconv_weights_are_transposed() {
        let mut b = LayoutBuilder::new();
        b.conv("enc", 3, 128, 5);
        b.deconv("dec", 128, 3, 5);
        let layout = b.build();

        assert_eq!(layout.get("enc.weight").unwrap().shape, vec![128, 3, 5, 5]);
        assert_eq!(layout.get("dec.weight").unwrap().shape, vec![128, 3, 5, 5]);
        assert_eq!(layout.get("enc.bias").unwrap().shape, vec![128]);
        assert_eq!(layout.get("dec.bias").unwrap().shape, vec![3]);
    }

    #[test]
    fn entropy_bottleneck_has_five_stages_and_four_factors() {
        let mut b = LayoutBuilder::new();
        b.entropy_bottleneck("eb", 8);
        let layout = b.build();

        assert_eq!(layout.get("eb._matrix0").unwrap().shape, vec![8, 3, 1]);
        assert_eq!(layout.get("eb._matrix2").unwrap().shape, vec![8, 3, 3]);
        assert_eq!(layout.get("eb._matrix4").unwrap().shape, vec![8, 1, 3]);
        assert!(layout.get("eb._factor3").is_some());
        assert!(layout.get("eb._factor4").is_none());
        // 5 matrices, 5 biases, 4 factors, quantiles
        assert_eq!(layout.len(), 15);
    }

    #[test]
    fn parameter_count_sums_every_tensor() {
        let mut b = LayoutBuilder::new();
        b.gdn("gdn", 4);
        let layout = b.build();

        assert_eq!(layout.num_parameters(), 4 + 16);
    }
}
