//! Error types for the posture pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PostureError>;

/// パイプライン呼び出し側に返すエラー
///
/// `Config` と `IncompleteDetection` はフレーム単位でスキップすべきもの。
/// キーポイント欠落は `Undetermined` として分類結果に含まれ、エラーにはならない。
#[derive(Debug, Error)]
pub enum PostureError {
    /// Missing or invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The network produced fewer heatmap channels than the canonical layout needs.
    #[error("incomplete detection: found {found} heatmap channels, need at least {required}")]
    IncompleteDetection {
        /// Channels supplied by the network.
        found: usize,
        /// Channels required for decoding.
        required: usize,
    },

    /// Inference call failed or returned maps of an unexpected shape.
    #[error("inference error: {0}")]
    Inference(String),

    /// Image could not be decoded, encoded or has an unusable shape.
    #[error("image error: {0}")]
    Image(String),
}

impl PostureError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(details: impl Into<String>) -> Self {
        Self::Config(details.into())
    }

    /// Creates an inference error.
    #[must_use]
    pub fn inference(details: impl Into<String>) -> Self {
        Self::Inference(details.into())
    }

    /// Creates an image error.
    #[must_use]
    pub fn image(details: impl Into<String>) -> Self {
        Self::Image(details.into())
    }
}

/// 2点から角度が定義できない場合のエラー
///
/// 分類器の内部でのみ使われ、`Undetermined` に変換される。
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// Both points share the same coordinates.
    #[error("coincident points at ({x}, {y})")]
    Coincident {
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
    },

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate")]
    NonFinite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PostureError::config("scale_search is empty");
        assert!(format!("{err}").contains("scale_search"));

        let err = PostureError::IncompleteDetection {
            found: 10,
            required: 18,
        };
        let msg = format!("{err}");
        assert!(msg.contains("10"));
        assert!(msg.contains("18"));

        let err = GeometryError::Coincident { x: 1.0, y: 2.0 };
        assert!(format!("{err}").contains("coincident"));
    }
}
