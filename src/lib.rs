//! Registry and loader for pretrained learned image compression models.
//!
//! ```no_run
//! use imgzoo::zoo::{bmshj2018_factorized, LoadOptions};
//!
//! let model = bmshj2018_factorized(3, "mse", &LoadOptions::default())?;
//! assert_eq!(model.hyperparameters(), (128, 192));
//! # Ok::<(), imgzoo::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod zoo;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{Architecture, CompressionModel, Metric};
pub use zoo::{
    bmshj2018_factorized, bmshj2018_hyperprior, load_model, mbt2018, mbt2018_mean, LoadOptions,
};
