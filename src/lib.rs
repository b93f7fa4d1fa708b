pub mod config;
pub mod error;
#[cfg(feature = "desktop")]
pub mod image_io;
pub mod message;
pub mod pipeline;
pub mod pose;
pub mod posture;
pub mod render;

pub use config::Config;
pub use error::{PostureError, Result};
pub use pipeline::{PostureAnalysis, PostureContext};
pub use posture::{LeanClassification, PostureResult, SecondaryClassification};
