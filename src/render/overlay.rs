use ndarray::{Array3, ArrayView3, ArrayViewMut3};

use crate::pose::{BodyPart, FrameKeypoints};

/// キーポイントの円の半径（ピクセル）
pub const KEYPOINT_RADIUS: i32 = 4;

/// 部位ごとの色（画像と同じチャネル順で書き込む）
pub const PART_COLORS: [[u8; 3]; BodyPart::COUNT] = [
    [255, 0, 0],
    [255, 85, 0],
    [255, 170, 0],
    [255, 255, 0],
    [170, 255, 0],
    [85, 255, 0],
    [0, 255, 0],
    [0, 255, 85],
    [0, 255, 170],
    [0, 255, 255],
    [0, 170, 255],
    [0, 85, 255],
    [0, 0, 255],
    [85, 0, 255],
    [170, 0, 255],
    [255, 0, 255],
    [255, 0, 170],
    [255, 0, 85],
];

/// 画像のコピーに全候補の円を描いて返す
///
/// 入力画像は変更しない。
pub fn draw_keypoints(image: ArrayView3<u8>, keypoints: &FrameKeypoints) -> Array3<u8> {
    let mut canvas = image.to_owned();
    for (part, candidates) in keypoints.iter() {
        let color = PART_COLORS[part.index()];
        for kp in candidates {
            draw_circle(
                canvas.view_mut(),
                kp.x.round() as i32,
                kp.y.round() as i32,
                KEYPOINT_RADIUS,
                color,
            );
        }
    }
    canvas
}

/// 円を描画（塗りつぶし、範囲外はクリップ）
fn draw_circle(mut canvas: ArrayViewMut3<u8>, cx: i32, cy: i32, radius: i32, color: [u8; 3]) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                set_pixel(&mut canvas, cx + dx, cy + dy, color);
            }
        }
    }
}

fn set_pixel(canvas: &mut ArrayViewMut3<u8>, x: i32, y: i32, color: [u8; 3]) {
    let (h, w, channels) = canvas.dim();
    if x < 0 || y < 0 || x >= w as i32 || y >= h as i32 {
        return;
    }
    for (c, value) in color.iter().enumerate().take(channels) {
        canvas[[y as usize, x as usize, c]] = *value;
    }
}
