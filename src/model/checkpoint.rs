use crate::error::{Error, Result};
use candle_core::{pickle, Device, Tensor};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Path of the safetensors copy kept next to a PyTorch checkpoint.
///
/// `bmshj2018-factorized-prior-3-5c6f152b.pth.tar` maps to
/// `bmshj2018-factorized-prior-3-5c6f152b.safetensors`.
pub fn safetensors_sibling(checkpoint: &Path) -> PathBuf {
    let file_name = checkpoint
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or(&file_name);

    checkpoint.with_file_name(format!("{}.safetensors", stem))
}

/// Read a checkpoint's tensors.
///
/// A `.safetensors` file is loaded directly. Anything else is read as a
/// PyTorch pickle, unless a converted sibling already exists; the first
/// pickle read writes that sibling for later loads.
pub fn load_state_dict(path: &Path) -> Result<HashMap<String, Tensor>> {
    if path.extension().is_some_and(|ext| ext == "safetensors") {
        return load_safetensors(path);
    }

    let converted = safetensors_sibling(path);
    if converted.exists() {
        tracing::debug!("Using converted checkpoint {:?}", converted);
        return load_safetensors(&converted);
    }

    if !path.exists() {
        return Err(Error::ModelLoadFailed(format!("Checkpoint not found: {:?}", path)));
    }

    tracing::info!("Reading PyTorch checkpoint {:?}", path);

    let tensors_vec = pickle::read_all(path)
        .map_err(|e| Error::ModelLoadFailed(format!("Failed to read PyTorch file: {}", e)))?;

    tracing::info!("Loaded {} tensors from checkpoint", tensors_vec.len());

    let tensors: HashMap<String, Tensor> = tensors_vec.into_iter().collect();

    if let Err(e) = candle_core::safetensors::save(&tensors, &converted) {
        tracing::warn!("Could not cache SafeTensors copy at {:?}: {}", converted, e);
    } else {
        tracing::info!("Converted checkpoint to {:?}", converted);
    }

    Ok(tensors)
}

fn load_safetensors(path: &Path) -> Result<HashMap<String, Tensor>> {
    candle_core::safetensors::load(path, &Device::Cpu)
        .map_err(|e| Error::ModelLoadFailed(format!("Failed to load SafeTensors {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;

    #[test]
    fn sibling_drops_every_extension() {
        let path = Path::new("/cache/bmshj2018-factorized-prior-3-5c6f152b.pth.tar");
        assert_eq!(
            safetensors_sibling(path),
            PathBuf::from("/cache/bmshj2018-factorized-prior-3-5c6f152b.safetensors")
        );
    }

    #[test]
    fn converted_sibling_is_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = dir.path().join("model-1-abcdef01.pth.tar");

        let mut tensors = HashMap::new();
        tensors.insert(
            "g_a.0.bias".to_string(),
            Tensor::ones(4, DType::F32, &Device::Cpu).unwrap(),
        );
        candle_core::safetensors::save(&tensors, safetensors_sibling(&checkpoint)).unwrap();

        // The pickle itself does not exist; only the sibling is read.
        let loaded = load_state_dict(&checkpoint).unwrap();
        assert_eq!(loaded["g_a.0.bias"].dims(), &[4]);
    }

    #[test]
    fn missing_checkpoint_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_state_dict(&dir.path().join("absent.pth.tar")).unwrap_err();
        assert!(matches!(err, Error::ModelLoadFailed(_)));
    }
}
