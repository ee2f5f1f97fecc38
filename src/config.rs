use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Base URL the pretrained checkpoints are published under.
pub const DEFAULT_ROOT_URL: &str = "https://compressai.s3.amazonaws.com/models/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub data_dir: PathBuf,
	pub checkpoints_dir: PathBuf,
	pub manifest_path: PathBuf,
	pub root_url: String,
}

impl Config {
	pub fn new() -> crate::error::Result<Self> {
		let project_dirs = ProjectDirs::from("", "", "imgzoo")
			.ok_or_else(|| crate::error::Error::ConfigError("Could not determine data directory".to_string()))?;

		Self::with_data_dir(project_dirs.data_dir())
	}

	/// Resolve the configuration from `IMGZOO_DATA_DIR` and `IMGZOO_ROOT_URL`,
	/// falling back to the platform data directory and the default mirror.
	pub fn from_env() -> crate::error::Result<Self> {
		let mut config = match std::env::var("IMGZOO_DATA_DIR") {
			Ok(data_dir) => Self::with_data_dir(data_dir)?,
			Err(_) => Self::new()?,
		};

		config.root_url = root_url_from_env();
		Ok(config)
	}

	pub fn with_data_dir(data_dir: impl AsRef<Path>) -> crate::error::Result<Self> {
		let data_dir = data_dir.as_ref().to_path_buf();
		let checkpoints_dir = data_dir.join("checkpoints");
		let manifest_path = data_dir.join("checkpoints.toml");

		std::fs::create_dir_all(&data_dir)?;
		std::fs::create_dir_all(&checkpoints_dir)?;

		Ok(Self {
			data_dir,
			checkpoints_dir,
			manifest_path,
			root_url: DEFAULT_ROOT_URL.to_string(),
		})
	}
}

/// Weight mirror base URL: `IMGZOO_ROOT_URL` if set, else [`DEFAULT_ROOT_URL`].
pub fn root_url_from_env() -> String {
	root_url_or_default(std::env::var("IMGZOO_ROOT_URL").ok())
}

fn root_url_or_default(root_url: Option<String>) -> String {
	match root_url {
		Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
		_ => DEFAULT_ROOT_URL.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn explicit_data_dir_creates_cache_layout() {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path().join("zoo");

		let config = Config::with_data_dir(&root).unwrap();

		assert!(config.checkpoints_dir.is_dir());
		assert_eq!(config.checkpoints_dir, root.join("checkpoints"));
		assert_eq!(config.manifest_path, root.join("checkpoints.toml"));
		assert_eq!(config.root_url, DEFAULT_ROOT_URL);
	}

	#[test]
	fn root_url_override_is_normalised() {
		assert_eq!(root_url_or_default(None), DEFAULT_ROOT_URL);
		assert_eq!(root_url_or_default(Some("  ".into())), DEFAULT_ROOT_URL);
		assert_eq!(
			root_url_or_default(Some("http://mirror.local/models/v1/".into())),
			"http://mirror.local/models/v1"
		);
	}
}
