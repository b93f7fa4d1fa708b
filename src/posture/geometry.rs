use crate::error::GeometryError;
use crate::pose::KeypointCandidate;

/// a から b へのベクトルの角度（度、整数に丸め）
///
/// atan2(by - ay, bx - ax) を度に変換し、偶数丸めで整数にする。
pub fn angle_degrees(a: (f32, f32), b: (f32, f32)) -> Result<f32, GeometryError> {
    let (ax, ay) = a;
    let (bx, by) = b;
    if ![ax, ay, bx, by].iter().all(|v| v.is_finite()) {
        return Err(GeometryError::NonFinite);
    }
    let dx = bx - ax;
    let dy = by - ay;
    if dx == 0.0 && dy == 0.0 {
        return Err(GeometryError::Coincident { x: ax, y: ay });
    }
    Ok(dy.atan2(dx).to_degrees().round_ties_even())
}

/// 2点間のユークリッド距離
pub fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

pub fn candidate_angle(a: &KeypointCandidate, b: &KeypointCandidate) -> Result<f32, GeometryError> {
    angle_degrees(a.position(), b.position())
}

pub fn candidate_distance(a: &KeypointCandidate, b: &KeypointCandidate) -> f32 {
    distance(a.position(), b.position())
}
