use crate::error::{Error, Result};
use crate::model::layout::{Layout, LayoutBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The model families the zoo knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Architecture {
    /// Factorized prior (Ballé et al., ICLR 2018).
    Bmshj2018Factorized,
    /// Scale hyperprior (Ballé et al., ICLR 2018).
    Bmshj2018Hyperprior,
    /// Mean and scale hyperprior (Minnen et al., NeurIPS 2018).
    Mbt2018Mean,
    /// Joint autoregressive and hierarchical priors (Minnen et al., NeurIPS 2018).
    Mbt2018,
}

impl Architecture {
    pub const ALL: [Architecture; 4] = [
        Architecture::Bmshj2018Factorized,
        Architecture::Bmshj2018Hyperprior,
        Architecture::Mbt2018Mean,
        Architecture::Mbt2018,
    ];

    /// Registry identifier, e.g. `bmshj2018-factorized`.
    pub fn name(&self) -> &'static str {
        match self {
            Architecture::Bmshj2018Factorized => "bmshj2018-factorized",
            Architecture::Bmshj2018Hyperprior => "bmshj2018-hyperprior",
            Architecture::Mbt2018Mean => "mbt2018-mean",
            Architecture::Mbt2018 => "mbt2018",
        }
    }

    /// Name of the network class the identifier resolves to.
    pub fn model_name(&self) -> &'static str {
        match self {
            Architecture::Bmshj2018Factorized => "FactorizedPrior",
            Architecture::Bmshj2018Hyperprior => "ScaleHyperprior",
            Architecture::Mbt2018Mean => "MeanScaleHyperprior",
            Architecture::Mbt2018 => "JointAutoregressiveHierarchicalPriors",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|arch| arch.name() == name)
            .ok_or_else(|| Error::InvalidArchitecture(name.to_string()))
    }

    /// Named parameters of the network for channel widths `n` and `m`.
    pub fn layout(&self, n: usize, m: usize) -> Layout {
        let mut b = LayoutBuilder::new();

        analysis_transform(&mut b, n, m);
        synthesis_transform(&mut b, n, m);

        match self {
            Architecture::Bmshj2018Factorized => {
                b.entropy_bottleneck("entropy_bottleneck", m);
            }
            Architecture::Bmshj2018Hyperprior => {
                b.entropy_bottleneck("entropy_bottleneck", n);
                b.conv("h_a.0", m, n, 3);
                b.conv("h_a.2", n, n, 5);
                b.conv("h_a.4", n, n, 5);
                b.deconv("h_s.0", n, n, 5);
                b.deconv("h_s.2", n, n, 5);
                b.conv("h_s.4", n, m, 3);
            }
            Architecture::Mbt2018Mean => {
                b.entropy_bottleneck("entropy_bottleneck", n);
                mean_scale_hyper_transforms(&mut b, n, m);
            }
            Architecture::Mbt2018 => {
                b.entropy_bottleneck("entropy_bottleneck", n);
                mean_scale_hyper_transforms(&mut b, n, m);
                b.conv("entropy_parameters.0", m * 12 / 3, m * 10 / 3, 1);
                b.conv("entropy_parameters.2", m * 10 / 3, m * 8 / 3, 1);
                b.conv("entropy_parameters.4", m * 8 / 3, m * 6 / 3, 1);
                b.conv("context_prediction", m, 2 * m, 5);
            }
        }

        b.build()
    }
}

fn analysis_transform(b: &mut LayoutBuilder, n: usize, m: usize) {
    b.conv("g_a.0", 3, n, 5);
    b.gdn("g_a.1", n);
    b.conv("g_a.2", n, n, 5);
    b.gdn("g_a.3", n);
    b.conv("g_a.4", n, n, 5);
    b.gdn("g_a.5", n);
    b.conv("g_a.6", n, m, 5);
}

fn synthesis_transform(b: &mut LayoutBuilder, n: usize, m: usize) {
    b.deconv("g_s.0", m, n, 5);
    b.gdn("g_s.1", n);
    b.deconv("g_s.2", n, n, 5);
    b.gdn("g_s.3", n);
    b.deconv("g_s.4", n, n, 5);
    b.gdn("g_s.5", n);
    b.deconv("g_s.6", n, 3, 5);
}

fn mean_scale_hyper_transforms(b: &mut LayoutBuilder, n: usize, m: usize) {
    b.conv("h_a.0", m, n, 3);
    b.conv("h_a.2", n, n, 5);
    b.conv("h_a.4", n, n, 5);
    b.deconv("h_s.0", n, m, 5);
    b.deconv("h_s.2", m, m * 3 / 2, 5);
    b.conv("h_s.4", m * 3 / 2, m * 2, 3);
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Architecture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Distortion measure a pretrained checkpoint was optimized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Mse,
}

impl Metric {
    pub const ALL: [Metric; 1] = [Metric::Mse];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Mse => "mse",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|metric| metric.name() == s)
            .ok_or_else(|| Error::InvalidMetric(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_to_their_architecture() {
        for arch in Architecture::ALL {
            assert_eq!(arch.name().parse::<Architecture>().unwrap(), arch);
        }
        assert_eq!(Architecture::Mbt2018.model_name(), "JointAutoregressiveHierarchicalPriors");
    }

    #[test]
    fn unknown_architecture_is_rejected() {
        let err = Architecture::from_name("cheng2020-anchor").unwrap_err();
        assert!(matches!(err, Error::InvalidArchitecture(name) if name == "cheng2020-anchor"));
        assert!(Architecture::from_name("BMSHJ2018-FACTORIZED").is_err());
    }

    #[test]
    fn only_mse_is_a_metric() {
        assert_eq!("mse".parse::<Metric>().unwrap(), Metric::Mse);
        assert!(matches!("ms-ssim".parse::<Metric>(), Err(Error::InvalidMetric(_))));
    }

    #[test]
    fn hyperprior_layouts_share_the_main_transforms() {
        let factorized = Architecture::Bmshj2018Factorized.layout(128, 192);
        let hyperprior = Architecture::Bmshj2018Hyperprior.layout(128, 192);

        for name in ["g_a.0.weight", "g_a.6.weight", "g_s.6.weight", "g_s.5.gamma"] {
            assert_eq!(factorized.get(name).unwrap().shape, hyperprior.get(name).unwrap().shape);
        }
        assert!(factorized.get("h_a.0.weight").is_none());
        assert_eq!(hyperprior.get("h_s.4.weight").unwrap().shape, vec![192, 128, 3, 3]);
    }

    #[test]
    fn factorized_bottleneck_runs_over_latent_channels() {
        let layout = Architecture::Bmshj2018Factorized.layout(128, 192);
        assert_eq!(layout.get("entropy_bottleneck.quantiles").unwrap().shape, vec![192, 1, 3]);

        let layout = Architecture::Bmshj2018Hyperprior.layout(128, 192);
        assert_eq!(layout.get("entropy_bottleneck.quantiles").unwrap().shape, vec![128, 1, 3]);
    }

    #[test]
    fn joint_autoregressive_layout_widths() {
        let layout = Architecture::Mbt2018.layout(192, 320);

        assert_eq!(layout.get("context_prediction.weight").unwrap().shape, vec![640, 320, 5, 5]);
        assert_eq!(layout.get("entropy_parameters.0.weight").unwrap().shape, vec![1066, 1280, 1, 1]);
        assert_eq!(layout.get("entropy_parameters.4.weight").unwrap().shape, vec![640, 853, 1, 1]);
        assert_eq!(layout.get("h_s.2.weight").unwrap().shape, vec![320, 480, 5, 5]);
        assert_eq!(layout.get("h_s.4.weight").unwrap().shape, vec![640, 480, 3, 3]);
    }
}
