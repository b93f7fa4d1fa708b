pub mod overlay;

pub use overlay::{draw_keypoints, KEYPOINT_RADIUS, PART_COLORS};
