use crate::error::{Error, Result};
use crate::model::architecture::Architecture;
use crate::model::layout::{ParamInit, ParamSpec};
use candle_core::{DType, Device, Tensor};
use candle_nn::{Init, VarBuilder, VarMap};
use std::collections::HashMap;
use std::path::Path;

/// A compression network's parameters, keyed by state-dict name.
#[derive(Debug, Clone)]
pub struct CompressionModel {
    architecture: Architecture,
    n: usize,
    m: usize,
    device: Device,
    weights: HashMap<String, Tensor>,
}

impl CompressionModel {
    /// Build a fresh, randomly initialised network with channel widths `n` and `m`.
    pub fn new(
        architecture: Architecture,
        n: usize,
        m: usize,
        device: &Device,
        dtype: DType,
    ) -> Result<Self> {
        if n == 0 || m == 0 {
            return Err(Error::InvalidInput(format!(
                "Channel widths must be non-zero, got N={}, M={}",
                n, m
            )));
        }

        let layout = architecture.layout(n, m);
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, dtype, device);

        let mut weights = HashMap::with_capacity(layout.len());
        for spec in layout.params() {
            let tensor = init_param(&vb, spec, dtype, device)?;
            weights.insert(spec.name.clone(), tensor);
        }

        tracing::debug!(
            "Constructed {} (N={}, M={}) with {} tensors",
            architecture.model_name(),
            n,
            m,
            weights.len()
        );

        Ok(Self {
            architecture,
            n,
            m,
            device: device.clone(),
            weights,
        })
    }

    /// Rebuild a network from checkpoint tensors.
    ///
    /// `N` and `M` are read off the first and last analysis convolutions; every
    /// other tensor of the layout must then be present with a matching shape.
    /// Buffers the layout does not describe are dropped. Legacy key forms
    /// (`module.` prefixes, `_matrices.{i}` parameter lists) are accepted.
    pub fn from_state_dict(
        architecture: Architecture,
        state_dict: HashMap<String, Tensor>,
        device: &Device,
        dtype: DType,
    ) -> Result<Self> {
        let mut state_dict: HashMap<String, Tensor> = state_dict
            .into_iter()
            .map(|(name, tensor)| (normalize_key(&name), tensor))
            .collect();
        let n = leading_dim(&state_dict, "g_a.0.weight")?;
        let m = leading_dim(&state_dict, "g_a.6.weight")?;
        let layout = architecture.layout(n, m);

        let mut weights = HashMap::with_capacity(layout.len());
        for spec in layout.params() {
            let tensor = state_dict.remove(&spec.name).ok_or_else(|| {
                Error::ModelLoadFailed(format!(
                    "Missing tensor \"{}\" for {}",
                    spec.name,
                    architecture.model_name()
                ))
            })?;

            if tensor.dims() != spec.shape.as_slice() {
                return Err(Error::ModelLoadFailed(format!(
                    "Tensor \"{}\" has shape {:?}, expected {:?}",
                    spec.name,
                    tensor.dims(),
                    spec.shape
                )));
            }

            weights.insert(spec.name.clone(), tensor.to_device(device)?.to_dtype(dtype)?);
        }

        if !state_dict.is_empty() {
            tracing::debug!("Ignoring {} checkpoint buffers", state_dict.len());
        }

        tracing::info!(
            "Loaded {} (N={}, M={}) from state dict",
            architecture.model_name(),
            n,
            m
        );

        Ok(Self {
            architecture,
            n,
            m,
            device: device.clone(),
            weights,
        })
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn hyperparameters(&self) -> (usize, usize) {
        (self.n, self.m)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn tensor(&self, name: &str) -> Option<&Tensor> {
        self.weights.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.weights.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn num_parameters(&self) -> usize {
        self.weights.values().map(Tensor::elem_count).sum()
    }

    pub fn weights(&self) -> &HashMap<String, Tensor> {
        &self.weights
    }

    pub fn into_weights(self) -> HashMap<String, Tensor> {
        self.weights
    }

    pub fn save_safetensors(&self, path: impl AsRef<Path>) -> Result<()> {
        candle_core::safetensors::save(&self.weights, path.as_ref())?;
        tracing::info!("Saved {} tensors to {:?}", self.weights.len(), path.as_ref());
        Ok(())
    }
}

fn init_param(vb: &VarBuilder, spec: &ParamSpec, dtype: DType, device: &Device) -> Result<Tensor> {
    let hint = match spec.init {
        ParamInit::ScaledIdentity(scale) => {
            let n = spec.shape[0];
            let mut data = vec![0f32; n * n];
            for i in 0..n {
                data[i * n + i] = scale as f32;
            }
            return Ok(Tensor::from_vec(data, (n, n), device)?.to_dtype(dtype)?);
        }
        ParamInit::Quantiles(s) => {
            let s = s as f32;
            let row = Tensor::new(&[-s, 0.0, s], device)?
                .to_dtype(dtype)?
                .reshape((1, 1, 3))?;
            return Ok(row.broadcast_as(spec.shape.as_slice())?.contiguous()?);
        }
        ParamInit::KaimingNormal => candle_nn::init::DEFAULT_KAIMING_NORMAL,
        ParamInit::Zeros => Init::Const(0.0),
        ParamInit::Ones => Init::Const(1.0),
        ParamInit::Const(value) => Init::Const(value),
        ParamInit::Uniform(lo, up) => Init::Uniform { lo, up },
    };

    Ok(vb.get_with_hints(spec.shape.clone(), &spec.name, hint)?)
}

/// Map legacy checkpoint names onto the layout's names.
fn normalize_key(name: &str) -> String {
    let name = name.strip_prefix("module.").unwrap_or(name);

    for (list, flat) in [
        ("._matrices.", "._matrix"),
        ("._biases.", "._bias"),
        ("._factors.", "._factor"),
    ] {
        if let Some((head, index)) = name.split_once(list) {
            return format!("{head}{flat}{index}");
        }
    }

    name.to_string()
}

fn leading_dim(state_dict: &HashMap<String, Tensor>, name: &str) -> Result<usize> {
    let tensor = state_dict
        .get(name)
        .ok_or_else(|| Error::ModelLoadFailed(format!("Missing tensor \"{}\"", name)))?;

    tensor
        .dims()
        .first()
        .copied()
        .ok_or_else(|| Error::ModelLoadFailed(format!("Tensor \"{}\" is a scalar", name)))
}
