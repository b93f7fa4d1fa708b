#[cfg(feature = "onnx")]
pub mod detector;
pub mod heatmap;
pub mod keypoint;
pub mod peaks;
pub mod preprocess;
pub mod resize;

#[cfg(feature = "onnx")]
pub use detector::OnnxPoseModel;
pub use heatmap::{aggregate, AggregatedMaps, InferenceAdapter, NetworkOutput};
pub use keypoint::{BodyPart, FrameKeypoints, KeypointCandidate};
pub use peaks::{extract_peaks, find_channel_peaks, gaussian_smooth};
pub use preprocess::{pad_right_down, prepare_input, Padding, PreparedInput};
pub use resize::{resize_cubic, resize_cubic_by};
