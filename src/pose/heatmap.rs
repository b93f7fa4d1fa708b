//! Multi-scale aggregation of network output back to source resolution.

use ndarray::{s, Array3, Array4, ArrayView3};
use tracing::debug;

use super::keypoint::BodyPart;
use super::preprocess::{prepare_input, scale_multipliers, PreparedInput};
use super::resize::resize_cubic;
use crate::config::Config;
use crate::error::{PostureError, Result};

/// Raw network output at stride resolution.
#[derive(Debug, Clone)]
pub struct NetworkOutput {
    /// Part-affinity fields, (H/stride, W/stride, 38).
    pub pafs: Array3<f32>,
    /// Heatmaps, (H/stride, W/stride, 19).
    pub heatmaps: Array3<f32>,
}

/// Opaque inference capability: normalized `[1, H, W, 3]` tensor in, PAF and
/// heatmap stacks out.
///
/// Takes `&self` so one loaded model can serve concurrent pipeline calls;
/// implementations that cannot run concurrently serialize internally.
pub trait InferenceAdapter {
    fn infer(&self, input: Array4<f32>) -> Result<NetworkOutput>;
}

impl<T: InferenceAdapter + ?Sized> InferenceAdapter for &T {
    fn infer(&self, input: Array4<f32>) -> Result<NetworkOutput> {
        (**self).infer(input)
    }
}

/// Heatmaps and PAFs at the source image's resolution, averaged over scales.
#[derive(Debug, Clone)]
pub struct AggregatedMaps {
    pub heatmaps: Array3<f32>,
    pub pafs: Array3<f32>,
}

/// stride倍に拡大 → パディング除去 → 元画像サイズにリサイズ
fn restore_map(
    map: ArrayView3<f32>,
    input: &PreparedInput,
    stride: usize,
    target: (usize, usize),
) -> Result<Array3<f32>> {
    let (padded_h, padded_w) = input.padded();
    let (h, w, _) = map.dim();
    if h * stride != padded_h || w * stride != padded_w {
        return Err(PostureError::inference(format!(
            "output map {h}x{w} does not match input {padded_h}x{padded_w} at stride {stride}"
        )));
    }
    let upsampled = resize_cubic(map, padded_h, padded_w)?;
    let (resized_h, resized_w) = input.resized;
    let cropped = upsampled.slice(s![..resized_h, ..resized_w, ..]);
    resize_cubic(cropped, target.0, target.1)
}

fn check_channels(output: &NetworkOutput) -> Result<()> {
    let found = output.heatmaps.dim().2;
    if found < BodyPart::COUNT {
        return Err(PostureError::IncompleteDetection {
            found,
            required: BodyPart::COUNT,
        });
    }
    Ok(())
}

/// 1スケール分の推論結果を元画像解像度に戻す
fn run_scale<A: InferenceAdapter + ?Sized>(
    image: ArrayView3<u8>,
    multiplier: f64,
    config: &Config,
    adapter: &A,
) -> Result<(Array3<f32>, Array3<f32>)> {
    let search = &config.search;
    let input = prepare_input(image, multiplier, search, config.model.normalize_input)?;
    debug!(
        multiplier,
        resized = ?input.resized,
        padding = ?input.padding,
        "running inference"
    );

    let output = adapter.infer(input.tensor.clone())?;
    check_channels(&output)?;

    let (height, width, _) = image.dim();
    let stride = search.stride as usize;
    let heatmap = restore_map(output.heatmaps.view(), &input, stride, (height, width))?;
    let paf = restore_map(output.pafs.view(), &input, stride, (height, width))?;
    Ok((heatmap, paf))
}

fn accumulate(acc: &mut Array3<f32>, map: &Array3<f32>, weight: f32, what: &str) -> Result<()> {
    if acc.dim() != map.dim() {
        return Err(PostureError::inference(format!(
            "{what} channel count changed between scales: {:?} vs {:?}",
            acc.dim(),
            map.dim()
        )));
    }
    acc.scaled_add(weight, map);
    Ok(())
}

/// 全スケールで推論して元画像解像度の平均マップを作る
///
/// 出力の空間サイズは常に元画像と一致する。設定は推論前に検証する。
pub fn aggregate<A: InferenceAdapter + ?Sized>(
    image: ArrayView3<u8>,
    config: &Config,
    adapter: &A,
) -> Result<AggregatedMaps> {
    config.validate()?;
    let (height, width, _) = image.dim();
    if height == 0 || width == 0 {
        return Err(PostureError::image("source image is empty"));
    }

    let multipliers = scale_multipliers(&config.search, height);
    let Some((&first, rest)) = multipliers.split_first() else {
        return Err(PostureError::config("search.scale_search must not be empty"));
    };
    let weight = 1.0 / multipliers.len() as f32;

    let (heatmap, paf) = run_scale(image, first, config, adapter)?;
    let mut heatmaps = heatmap * weight;
    let mut pafs = paf * weight;
    for &multiplier in rest {
        let (heatmap, paf) = run_scale(image, multiplier, config, adapter)?;
        accumulate(&mut heatmaps, &heatmap, weight, "heatmap")?;
        accumulate(&mut pafs, &paf, weight, "paf")?;
    }

    Ok(AggregatedMaps { heatmaps, pafs })
}
