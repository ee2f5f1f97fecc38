use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::architecture::{Architecture, Metric};
use crate::model::registry::{CheckpointInfo, CheckpointRegistry};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

const USER_AGENT: &str = concat!("imgzoo/", env!("CARGO_PKG_VERSION"));

/// One pretrained checkpoint to fetch.
#[derive(Debug, Clone)]
pub struct CheckpointRequest {
    pub architecture: Architecture,
    pub metric: Metric,
    pub quality: u8,
    pub url: String,
}

/// Downloads checkpoints into the local cache and records them in the manifest.
pub struct WeightDownloader {
    config: Config,
    registry: CheckpointRegistry,
    http_client: Client,
}

impl WeightDownloader {
    pub fn new(config: Config) -> Result<Self> {
        let registry = CheckpointRegistry::load(&config)?;
        let http_client = Client::builder()
            .timeout(Duration::from_secs(3600))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::DownloadFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            registry,
            http_client,
        })
    }

    pub fn cached_path(&self, url: &str) -> Result<PathBuf> {
        Ok(self.config.checkpoints_dir.join(filename_from_url(url)?))
    }

    /// Return the cached checkpoint for `request`, downloading it first if needed.
    pub fn fetch(
        &mut self,
        request: &CheckpointRequest,
        progress: bool,
        check_hash: bool,
    ) -> Result<PathBuf> {
        let file_name = filename_from_url(&request.url)?.to_string();
        let path = self.config.checkpoints_dir.join(&file_name);

        if path.is_file() {
            tracing::debug!("Using cached checkpoint {:?}", path);
            if check_hash {
                verify_or_discard(&path, &file_name)?;
            }
            if !self.registry.contains(&file_name) {
                let size_bytes = fs::metadata(&path)?.len();
                self.record(request, &path, size_bytes)?;
            }
            return Ok(path);
        }

        tracing::info!("Downloading {} to {:?}", request.url, path);

        let partial = self
            .config
            .checkpoints_dir
            .join(format!("{}.partial", file_name));

        let downloaded = self
            .download_to(&request.url, &partial, progress)
            .and_then(|size_bytes| {
                if check_hash {
                    verify_or_discard(&partial, &file_name)?;
                }
                fs::rename(&partial, &path)?;
                Ok(size_bytes)
            });
        let size_bytes = match downloaded {
            Ok(size_bytes) => size_bytes,
            Err(e) => {
                let _ = fs::remove_file(&partial);
                return Err(e);
            }
        };

        self.record(request, &path, size_bytes)?;

        tracing::info!("Checkpoint '{}' downloaded ({} bytes)", file_name, size_bytes);

        Ok(path)
    }

    fn record(&mut self, request: &CheckpointRequest, path: &Path, size_bytes: u64) -> Result<()> {
        self.registry.add_checkpoint(CheckpointInfo {
            architecture: request.architecture,
            metric: request.metric,
            quality: request.quality,
            url: request.url.clone(),
            path: path.to_path_buf(),
            size_bytes,
            downloaded_at: chrono::Utc::now().to_rfc3339(),
        });
        self.registry.save(&self.config)
    }

    fn download_to(&self, url: &str, dest: &Path, progress: bool) -> Result<u64> {
        let response = self
            .http_client
            .get(url)
            .send()
            .map_err(|e| Error::DownloadFailed(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::DownloadFailed(format!(
                "HTTP {} for {}",
                response.status(),
                url
            )));
        }

        let pb = progress_bar(response.content_length(), progress);
        let mut file = File::create(dest)?;
        let mut reader = pb.wrap_read(response);

        let written = match std::io::copy(&mut reader, &mut file) {
            Ok(written) => written,
            Err(e) => {
                pb.abandon();
                return Err(Error::DownloadFailed(format!("Failed to read response: {}", e)));
            }
        };
        file.flush()?;
        pb.finish_and_clear();

        tracing::debug!("Downloaded {} bytes to {:?}", written, dest);
        Ok(written)
    }
}

fn progress_bar(total: Option<u64>, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    match total {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    }
}

fn verify_or_discard(path: &Path, file_name: &str) -> Result<()> {
    let Some(expected) = hash_prefix(file_name) else {
        tracing::warn!("No hash in '{}', skipping checksum", file_name);
        return Ok(());
    };

    if let Err(e) = verify_hash(path, expected) {
        tracing::warn!("Removing {:?}: {}", path, e);
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}

/// Last path segment of `url`.
pub fn filename_from_url(url: &str) -> Result<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::DownloadFailed(format!("No file name in URL: {}", url)))
}

/// Hex digest prefix embedded as `<name>-<hash>.<ext>`.
pub fn hash_prefix(file_name: &str) -> Option<&str> {
    let stem = file_name.split('.').next()?;
    let (_, hash) = stem.rsplit_once('-')?;

    if !hash.is_empty() && hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')) {
        Some(hash)
    } else {
        None
    }
}

/// Check that the SHA-256 of `path` starts with `expected_prefix`.
pub fn verify_hash(path: &Path, expected_prefix: &str) -> Result<()> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    let digest = format!("{:x}", hasher.finalize());

    if digest.starts_with(expected_prefix) {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            file: path.display().to_string(),
            expected: expected_prefix.to_string(),
            actual: digest[..expected_prefix.len().min(digest.len())].to_string(),
        })
    }
}
