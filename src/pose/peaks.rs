use ndarray::{Array2, ArrayView2, ArrayView3, Axis, Zip};
use tracing::debug;

use super::keypoint::{BodyPart, FrameKeypoints, KeypointCandidate};
use crate::error::{PostureError, Result};

/// カーネル半径 = truncate × sigma
const GAUSSIAN_TRUNCATE: f32 = 4.0;

/// 正規化済みの1次元ガウシアンカーネル（長さ 2r+1）
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as i32;
    let denom = -0.5 / (sigma * sigma);
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|x| (denom * (x * x) as f32).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// 端で折り返す（端の画素も繰り返す: d c b a | a b c d | d c b a）
fn reflect_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

fn correlate_axis(input: ArrayView2<f32>, kernel: &[f32], axis: Axis) -> Array2<f32> {
    let radius = (kernel.len() / 2) as isize;
    let mut output = Array2::<f32>::zeros(input.raw_dim());
    Zip::from(output.lanes_mut(axis))
        .and(input.lanes(axis))
        .for_each(|mut out, lane| {
            let n = lane.len();
            for i in 0..n {
                let mut acc = 0.0;
                for (k, w) in kernel.iter().enumerate() {
                    let src = reflect_index(i as isize + k as isize - radius, n);
                    acc += w * lane[src];
                }
                out[i] = acc;
            }
        });
    output
}

/// 分離型ガウシアン平滑化（行方向 → 列方向）
pub fn gaussian_smooth(channel: ArrayView2<f32>, sigma: f32) -> Array2<f32> {
    if channel.is_empty() {
        return channel.to_owned();
    }
    let kernel = gaussian_kernel(sigma);
    let vertical = correlate_axis(channel, &kernel, Axis(0));
    correlate_axis(vertical.view(), &kernel, Axis(1))
}

/// 1チャネル分の局所最大点を (x, y, 平滑化前の値) としてラスタ順に返す
///
/// 上下左右の4近傍すべて以上、かつ閾値を超える画素がピーク。範囲外の近傍は0とみなす。
pub fn find_channel_peaks(channel: ArrayView2<f32>, threshold: f32, sigma: f32) -> Vec<(usize, usize, f32)> {
    let smoothed = gaussian_smooth(channel, sigma);
    let (h, w) = smoothed.dim();
    let at = |y: isize, x: isize| -> f32 {
        if y < 0 || x < 0 || y >= h as isize || x >= w as isize {
            0.0
        } else {
            smoothed[[y as usize, x as usize]]
        }
    };

    let mut peaks = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let v = smoothed[[y, x]];
            let (yi, xi) = (y as isize, x as isize);
            let is_peak = v > threshold
                && v >= at(yi - 1, xi)
                && v >= at(yi + 1, xi)
                && v >= at(yi, xi - 1)
                && v >= at(yi, xi + 1);
            if is_peak {
                peaks.push((x, y, channel[[y, x]]));
            }
        }
    }
    peaks
}

/// ヒートマップ (H, W, C) の先頭18チャネルからキーポイント候補を取り出す
///
/// IDはチャネル順、チャネル内はラスタ順で0から振る。
pub fn extract_peaks(heatmaps: ArrayView3<f32>, threshold: f32, sigma: f32) -> Result<FrameKeypoints> {
    let found = heatmaps.dim().2;
    if found < BodyPart::COUNT {
        return Err(PostureError::IncompleteDetection {
            found,
            required: BodyPart::COUNT,
        });
    }

    let mut frame = FrameKeypoints::new();
    let mut next_id = 0usize;
    for part in BodyPart::ALL {
        let channel = heatmaps.index_axis(Axis(2), part.index());
        for (x, y, score) in find_channel_peaks(channel, threshold, sigma) {
            frame.push(part, KeypointCandidate::new(x as f32, y as f32, score, next_id));
            next_id += 1;
        }
    }
    debug!(candidates = frame.total(), "extracted peaks");
    Ok(frame)
}
