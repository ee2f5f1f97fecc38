pub mod architecture;
pub mod checkpoint;
pub mod compression;
pub mod downloader;
pub mod layout;
pub mod registry;

pub use architecture::{Architecture, Metric};
pub use compression::CompressionModel;
pub use downloader::{CheckpointRequest, WeightDownloader};
pub use registry::{CheckpointInfo, CheckpointRegistry};
