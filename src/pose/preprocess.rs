use ndarray::{s, Array3, Array4, ArrayView3, Axis};

use super::resize::resize_cubic_by;
use crate::config::SearchConfig;
use crate::error::{PostureError, Result};

/// 右下に追加したパディング量（ピクセル）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub bottom: usize,
    pub right: usize,
}

/// 1スケール分のネットワーク入力
#[derive(Debug, Clone)]
pub struct PreparedInput {
    /// [1, H, W, 3] の f32 テンソル
    pub tensor: Array4<f32>,
    /// リサイズ後（パディング前）のサイズ (H, W)
    pub resized: (usize, usize),
    pub padding: Padding,
}

impl PreparedInput {
    /// パディング後のサイズ (H, W)
    pub fn padded(&self) -> (usize, usize) {
        (
            self.resized.0 + self.padding.bottom,
            self.resized.1 + self.padding.right,
        )
    }
}

/// 各スケールの倍率 (scale × boxsize / 元画像の高さ)
pub fn scale_multipliers(search: &SearchConfig, image_height: usize) -> Vec<f64> {
    search
        .scale_search
        .iter()
        .map(|scale| scale * search.boxsize as f64 / image_height as f64)
        .collect()
}

/// BGR u8 画像を倍率でリサイズ（結果は 0〜255 に丸めた f32）
pub fn resize_image(image: ArrayView3<u8>, factor: f64) -> Result<Array3<f32>> {
    let as_float = image.mapv(f32::from);
    let mut resized = resize_cubic_by(as_float.view(), factor)?;
    resized.mapv_inplace(|v| v.round().clamp(0.0, 255.0));
    Ok(resized)
}

/// 高さ・幅が stride の倍数になるよう右下をパディング
pub fn pad_right_down(
    image: ArrayView3<f32>,
    stride: usize,
    pad_value: f32,
) -> Result<(Array3<f32>, Padding)> {
    if stride == 0 {
        return Err(PostureError::config("search.stride must be positive"));
    }
    let (h, w, c) = image.dim();
    let padding = Padding {
        bottom: (stride - h % stride) % stride,
        right: (stride - w % stride) % stride,
    };
    let mut padded = Array3::from_elem((h + padding.bottom, w + padding.right, c), pad_value);
    padded.slice_mut(s![..h, ..w, ..]).assign(&image);
    Ok((padded, padding))
}

/// [1, H, W, 3] テンソルに変換
///
/// `normalize` が true なら x/256 - 0.5
pub fn to_input_tensor(padded: Array3<f32>, normalize: bool) -> Array4<f32> {
    let mut tensor = padded.insert_axis(Axis(0));
    if normalize {
        tensor.mapv_inplace(|v| v / 256.0 - 0.5);
    }
    tensor
}

/// 1スケール分の前処理: リサイズ → パディング → テンソル化
pub fn prepare_input(
    image: ArrayView3<u8>,
    multiplier: f64,
    search: &SearchConfig,
    normalize: bool,
) -> Result<PreparedInput> {
    let (h, w, c) = image.dim();
    if h == 0 || w == 0 || c != 3 {
        return Err(PostureError::image(format!(
            "expected HxWx3 image, got {h}x{w}x{c}"
        )));
    }
    let resized = resize_image(image, multiplier)?;
    let resized_dim = (resized.dim().0, resized.dim().1);
    let (padded, padding) = pad_right_down(resized.view(), search.stride as usize, search.pad_value)?;
    Ok(PreparedInput {
        tensor: to_input_tensor(padded, normalize),
        resized: resized_dim,
        padding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_multipliers() {
        let search = SearchConfig {
            scale_search: vec![0.5, 1.0],
            boxsize: 368,
            ..SearchConfig::default()
        };
        let m = scale_multipliers(&search, 736);
        assert_eq!(m, vec![0.25, 0.5]);
    }

    #[test]
    fn test_pad_right_down() {
        let image = Array3::<f32>::ones((13, 16, 3));
        let (padded, padding) = pad_right_down(image.view(), 8, 128.0).unwrap();
        assert_eq!(padding, Padding { bottom: 3, right: 0 });
        assert_eq!(padded.dim(), (16, 16, 3));
        assert_eq!(padded[[12, 15, 0]], 1.0);
        assert_eq!(padded[[13, 0, 2]], 128.0);
        assert_eq!(padded[[15, 15, 1]], 128.0);
    }

    #[test]
    fn test_pad_exact_multiple_is_noop() {
        let image = Array3::<f32>::zeros((16, 24, 3));
        let (padded, padding) = pad_right_down(image.view(), 8, 128.0).unwrap();
        assert_eq!(padding, Padding::default());
        assert_eq!(padded, image);
    }

    #[test]
    fn test_pad_zero_stride_rejected() {
        let image = Array3::<f32>::zeros((5, 5, 3));
        let err = pad_right_down(image.view(), 0, 128.0).unwrap_err();
        assert!(matches!(err, PostureError::Config(_)));
    }

    #[test]
    fn test_to_input_tensor_normalizes() {
        let image = Array3::<f32>::from_elem((2, 2, 3), 128.0);
        let tensor = to_input_tensor(image.clone(), true);
        assert_eq!(tensor.dim(), (1, 2, 2, 3));
        assert!(tensor.iter().all(|v| v.abs() < 1e-6));

        let raw = to_input_tensor(image, false);
        assert!(raw.iter().all(|v| *v == 128.0));
    }

    #[test]
    fn test_prepare_input_shapes() {
        let image = Array3::<u8>::from_elem((50, 70, 3), 200);
        let search = SearchConfig {
            stride: 8,
            ..SearchConfig::default()
        };
        let input = prepare_input(image.view(), 0.5, &search, true).unwrap();
        assert_eq!(input.resized, (25, 35));
        assert_eq!(input.padding, Padding { bottom: 7, right: 5 });
        assert_eq!(input.padded(), (32, 40));
        assert_eq!(input.tensor.dim(), (1, 32, 40, 3));
    }

    #[test]
    fn test_prepare_input_rejects_grayscale() {
        let image = Array3::<u8>::zeros((10, 10, 1));
        let err = prepare_input(image.view(), 1.0, &SearchConfig::default(), true).unwrap_err();
        assert!(matches!(err, PostureError::Image(_)));
    }
}
