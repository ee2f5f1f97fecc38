use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("Invalid architecture name \"{0}\"")]
	InvalidArchitecture(String),

	#[error("Invalid quality value \"{0}\"")]
	InvalidQuality(u8),

	#[error("Invalid quality \"{0}\", should be between (1, 8)")]
	QualityOutOfRange(u8),

	#[error("Invalid metric \"{0}\"")]
	InvalidMetric(String),

	#[error("Pre-trained model not yet available")]
	PretrainedUnavailable,

	#[error("Invalid input: {0}")]
	InvalidInput(String),

	#[error("Download failed: {0}")]
	DownloadFailed(String),

	#[error("Checksum mismatch for {file}: expected prefix {expected}, got {actual}")]
	ChecksumMismatch {
		file: String,
		expected: String,
		actual: String,
	},

	#[error("Failed to load model: {0}")]
	ModelLoadFailed(String),

	#[error("Configuration error: {0}")]
	ConfigError(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Tensor error: {0}")]
	Tensor(#[from] candle_core::Error),

	#[error("Serialization error: {0}")]
	Serialization(String),
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Serialization(err.to_string())
	}
}

impl From<toml::de::Error> for Error {
	fn from(err: toml::de::Error) -> Self {
		Error::Serialization(err.to_string())
	}
}

impl From<toml::ser::Error> for Error {
	fn from(err: toml::ser::Error) -> Self {
		Error::Serialization(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn validation_messages_name_the_offending_value() {
		assert_eq!(
			Error::InvalidArchitecture("resnet".into()).to_string(),
			"Invalid architecture name \"resnet\""
		);
		assert_eq!(Error::InvalidQuality(9).to_string(), "Invalid quality value \"9\"");
		assert_eq!(
			Error::QualityOutOfRange(0).to_string(),
			"Invalid quality \"0\", should be between (1, 8)"
		);
		assert_eq!(Error::InvalidMetric("ms-ssim".into()).to_string(), "Invalid metric \"ms-ssim\"");
		assert_eq!(
			Error::PretrainedUnavailable.to_string(),
			"Pre-trained model not yet available"
		);
	}
}
