//! Pretrained learned image compression models.
//!
//! Each family has an entry point taking a quality level (1: lowest, 8:
//! highest), the metric the weights were optimized for (only `"mse"`), and
//! [`LoadOptions`]. Without `pretrained` a freshly initialised network with the
//! default channel widths for the quality is returned; with it, the published
//! checkpoint is downloaded (or taken from the cache) and loaded.

pub mod tables;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::checkpoint;
use crate::model::{
    Architecture, CheckpointRequest, CompressionModel, Metric, WeightDownloader,
};
use candle_core::{DType, Device};
use std::path::Path;

pub use tables::QUALITIES;

/// Options forwarded to model construction.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Load the published checkpoint instead of initialising fresh weights.
    pub pretrained: bool,
    /// Show a download progress bar on stderr.
    pub progress: bool,
    /// Check the checkpoint's SHA-256 against the hash in its file name.
    pub check_hash: bool,
    pub device: Device,
    pub dtype: DType,
    /// Cache location; resolved from the environment when unset.
    pub config: Option<Config>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            pretrained: false,
            progress: true,
            check_hash: false,
            device: Device::Cpu,
            dtype: DType::F32,
            config: None,
        }
    }
}

impl LoadOptions {
    pub fn pretrained(mut self, pretrained: bool) -> Self {
        self.pretrained = pretrained;
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn check_hash(mut self, check_hash: bool) -> Self {
        self.check_hash = check_hash;
        self
    }

    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    fn resolve_config(&self) -> Result<Config> {
        match &self.config {
            Some(config) => Ok(config.clone()),
            None => Config::from_env(),
        }
    }
}

/// Build `architecture` at `quality`.
///
/// Checks run in order: architecture name, quality, then (only when
/// `pretrained` is set) whether a checkpoint is published for the metric and
/// quality. The first failing check is returned.
pub fn load_model(
    architecture: &str,
    metric: &str,
    quality: u8,
    options: &LoadOptions,
) -> Result<CompressionModel> {
    let arch = Architecture::from_name(architecture)?;

    let (n, m) = tables::cfg(arch, quality).ok_or(Error::InvalidQuality(quality))?;

    if options.pretrained {
        let metric = metric.parse::<Metric>().map_err(|_| Error::PretrainedUnavailable)?;
        if tables::pretrained_filename(arch, metric, quality).is_none() {
            return Err(Error::PretrainedUnavailable);
        }

        let config = options.resolve_config()?;
        let url = tables::pretrained_url(&config.root_url, arch, metric, quality)
            .ok_or(Error::PretrainedUnavailable)?;

        let mut downloader = WeightDownloader::new(config)?;
        let path = downloader.fetch(
            &CheckpointRequest {
                architecture: arch,
                metric,
                quality,
                url,
            },
            options.progress,
            options.check_hash,
        )?;

        return load_checkpoint(arch, &path, &options.device, options.dtype);
    }

    tracing::info!(
        "Building {} at quality {} (N={}, M={})",
        arch.model_name(),
        quality,
        n,
        m
    );
    CompressionModel::new(arch, n, m, &options.device, options.dtype)
}

/// Load `architecture` from a local checkpoint file.
pub fn load_checkpoint(
    architecture: Architecture,
    path: &Path,
    device: &Device,
    dtype: DType,
) -> Result<CompressionModel> {
    let state_dict = checkpoint::load_state_dict(path)?;
    CompressionModel::from_state_dict(architecture, state_dict, device, dtype)
}

fn check_request(metric: &str, quality: u8) -> Result<()> {
    if metric.parse::<Metric>().is_err() {
        return Err(Error::InvalidMetric(metric.to_string()));
    }

    if !QUALITIES.contains(&quality) {
        return Err(Error::QualityOutOfRange(quality));
    }

    Ok(())
}

/// Factorized Prior model from J. Ballé, D. Minnen, S. Singh, S.J. Hwang,
/// N. Johnston: "Variational Image Compression with a Scale Hyperprior",
/// ICLR 2018 (<https://arxiv.org/abs/1802.01436>).
pub fn bmshj2018_factorized(
    quality: u8,
    metric: &str,
    options: &LoadOptions,
) -> Result<CompressionModel> {
    check_request(metric, quality)?;
    load_model(Architecture::Bmshj2018Factorized.name(), metric, quality, options)
}

/// Scale Hyperprior model from J. Ballé, D. Minnen, S. Singh, S.J. Hwang,
/// N. Johnston: "Variational Image Compression with a Scale Hyperprior",
/// ICLR 2018 (<https://arxiv.org/abs/1802.01436>).
pub fn bmshj2018_hyperprior(
    quality: u8,
    metric: &str,
    options: &LoadOptions,
) -> Result<CompressionModel> {
    check_request(metric, quality)?;
    load_model(Architecture::Bmshj2018Hyperprior.name(), metric, quality, options)
}

/// Scale Hyperprior with non zero-mean Gaussian conditionals from D. Minnen,
/// J. Ballé, G.D. Toderici: "Joint Autoregressive and Hierarchical Priors for
/// Learned Image Compression", NeurIPS 2018 (<https://arxiv.org/abs/1809.02736>).
pub fn mbt2018_mean(quality: u8, metric: &str, options: &LoadOptions) -> Result<CompressionModel> {
    check_request(metric, quality)?;
    load_model(Architecture::Mbt2018Mean.name(), metric, quality, options)
}

/// Joint Autoregressive Hierarchical Priors model from D. Minnen, J. Ballé,
/// G.D. Toderici: "Joint Autoregressive and Hierarchical Priors for Learned
/// Image Compression", NeurIPS 2018 (<https://arxiv.org/abs/1809.02736>).
pub fn mbt2018(quality: u8, metric: &str, options: &LoadOptions) -> Result<CompressionModel> {
    check_request(metric, quality)?;
    load_model(Architecture::Mbt2018.name(), metric, quality, options)
}

/// Signature shared by the per-family entry points.
pub type EntryPoint = fn(u8, &str, &LoadOptions) -> Result<CompressionModel>;

/// Entry point for `architecture`.
pub fn entry_point(architecture: Architecture) -> EntryPoint {
    match architecture {
        Architecture::Bmshj2018Factorized => bmshj2018_factorized,
        Architecture::Bmshj2018Hyperprior => bmshj2018_hyperprior,
        Architecture::Mbt2018Mean => mbt2018_mean,
        Architecture::Mbt2018 => mbt2018,
    }
}
