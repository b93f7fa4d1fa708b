use ndarray::{s, Array3, ArrayView3};

use crate::error::{PostureError, Result};

/// バイキュービック補間の係数 (OpenCV INTER_CUBIC と同じ値)
const CUBIC_A: f32 = -0.75;

/// 1出力画素に対する4タップ
struct Tap {
    index: [usize; 4],
    weight: [f32; 4],
}

fn cubic_weights(t: f32) -> [f32; 4] {
    let a = CUBIC_A;
    let w0 = ((a * (t + 1.0) - 5.0 * a) * (t + 1.0) + 8.0 * a) * (t + 1.0) - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let u = 1.0 - t;
    let w2 = ((a + 2.0) * u - (a + 3.0)) * u * u + 1.0;
    [w0, w1, w2, 1.0 - w0 - w1 - w2]
}

/// 画素中心を揃えたサンプリング位置からタップを作る（端は複製）
///
/// `scale` は出力1画素あたりの入力画素数。
fn taps(src_len: usize, dst_len: usize, scale: f64) -> Vec<Tap> {
    let max = src_len as isize - 1;
    (0..dst_len)
        .map(|d| {
            let pos = (d as f64 + 0.5) * scale - 0.5;
            let base = pos.floor();
            let t = (pos - base) as f32;
            let base = base as isize;
            let mut index = [0usize; 4];
            for (k, slot) in index.iter_mut().enumerate() {
                *slot = (base + k as isize - 1).clamp(0, max) as usize;
            }
            Tap {
                index,
                weight: cubic_weights(t),
            }
        })
        .collect()
}

/// 倍率を掛けたサイズ（四捨五入、最小1）
pub fn scaled_size(len: usize, factor: f64) -> usize {
    ((len as f64 * factor).round() as usize).max(1)
}

/// (H, W, C) のマップをバイキュービック補間で (out_h, out_w, C) にリサイズ
///
/// 出力サイズは要求どおりになる。全チャネルを同じタップで処理する。
pub fn resize_cubic(map: ArrayView3<f32>, out_h: usize, out_w: usize) -> Result<Array3<f32>> {
    let (h, w, _) = map.dim();
    if h == 0 || w == 0 {
        return Err(PostureError::image(format!("cannot resize empty map {h}x{w}")));
    }
    if out_h == 0 || out_w == 0 {
        return Err(PostureError::config(format!(
            "resize target {out_h}x{out_w} is empty"
        )));
    }
    let scale_y = h as f64 / out_h as f64;
    let scale_x = w as f64 / out_w as f64;
    resize_with_scale(map, (out_h, out_w), (scale_y, scale_x))
}

/// 倍率指定のリサイズ
///
/// 出力サイズは `scaled_size` で丸めるが、サンプリング位置は 1/factor で決める。
/// 丸めでサイズ比と倍率がずれても、倍率どおりの位置を参照する。
pub fn resize_cubic_by(map: ArrayView3<f32>, factor: f64) -> Result<Array3<f32>> {
    let (h, w, _) = map.dim();
    if h == 0 || w == 0 {
        return Err(PostureError::image(format!("cannot resize empty map {h}x{w}")));
    }
    if !factor.is_finite() || factor <= 0.0 {
        return Err(PostureError::config(format!("resize factor {factor} must be positive")));
    }
    let out = (scaled_size(h, factor), scaled_size(w, factor));
    resize_with_scale(map, out, (1.0 / factor, 1.0 / factor))
}

fn resize_with_scale(
    map: ArrayView3<f32>,
    (out_h, out_w): (usize, usize),
    (scale_y, scale_x): (f64, f64),
) -> Result<Array3<f32>> {
    let (h, w, c) = map.dim();
    if (h, w) == (out_h, out_w) && scale_y == 1.0 && scale_x == 1.0 {
        return Ok(map.to_owned());
    }

    // 水平方向
    let x_taps = taps(w, out_w, scale_x);
    let mut horizontal = Array3::<f32>::zeros((h, out_w, c));
    for y in 0..h {
        for (ox, tap) in x_taps.iter().enumerate() {
            let mut out = horizontal.slice_mut(s![y, ox, ..]);
            for k in 0..4 {
                out.scaled_add(tap.weight[k], &map.slice(s![y, tap.index[k], ..]));
            }
        }
    }

    // 垂直方向
    let y_taps = taps(h, out_h, scale_y);
    let mut resized = Array3::<f32>::zeros((out_h, out_w, c));
    for (oy, tap) in y_taps.iter().enumerate() {
        let mut out = resized.slice_mut(s![oy, .., ..]);
        for k in 0..4 {
            out.scaled_add(tap.weight[k], &horizontal.slice(s![tap.index[k], .., ..]));
        }
    }

    Ok(resized)
}
