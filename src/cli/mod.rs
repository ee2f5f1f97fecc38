use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imgzoo")]
#[command(version, about = "Pretrained learned image compression models", long_about = None)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
	/// List architectures, their quality levels and published weights
	List {
		/// List downloaded checkpoints instead
		#[arg(long)]
		installed: bool,
	},

	/// Show hyperparameters and weight URL for one model
	Info {
		/// Architecture name (e.g., "bmshj2018-factorized")
		architecture: String,

		/// Quality level, 1 (lowest) to 8 (highest)
		#[arg(long, short)]
		quality: u8,

		/// Optimized metric
		#[arg(long, default_value = "mse")]
		metric: String,

		/// Print JSON instead of text
		#[arg(long)]
		json: bool,
	},

	/// Download a pretrained checkpoint into the cache
	Pull {
		/// Architecture name (e.g., "bmshj2018-factorized")
		architecture: String,

		/// Quality level, 1 (lowest) to 8 (highest)
		#[arg(long, short)]
		quality: u8,

		/// Optimized metric
		#[arg(long, default_value = "mse")]
		metric: String,

		/// Verify the SHA-256 prefix encoded in the file name
		#[arg(long)]
		check_hash: bool,
	},

	/// Build a model and optionally save its weights
	Build {
		/// Architecture name (e.g., "bmshj2018-factorized")
		architecture: String,

		/// Quality level, 1 (lowest) to 8 (highest)
		#[arg(long, short)]
		quality: u8,

		/// Optimized metric
		#[arg(long, default_value = "mse")]
		metric: String,

		/// Load published weights instead of initialising fresh ones
		#[arg(long)]
		pretrained: bool,

		/// Device to build on (e.g., "cpu" or "cuda:0")
		#[arg(long, default_value = "cpu")]
		device: String,

		/// Write the weights to this SafeTensors file
		#[arg(long)]
		output: Option<PathBuf>,
	},
}
