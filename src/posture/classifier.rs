use tracing::debug;

use super::geometry::{candidate_angle, candidate_distance};
use super::{LeanClassification, PostureResult, SecondaryClassification};
use crate::config::ClassifierConfig;
use crate::pose::{BodyPart, FrameKeypoints, KeypointCandidate};

/// 背骨判定に使う腰（チャネル11）
pub const LEAN_HIP: BodyPart = BodyPart::LeftHip;

/// 膝立ち判定のチャネル対 (7, 8)
///
/// 互換性のためチャネル番号をそのまま使う。COCO配置ではこの2つは
/// 左手首と右腰にあたり、膝ではない。
pub const KNEELING_PAIR: (BodyPart, BodyPart) = (BodyPart::LeftWrist, BodyPart::RightHip);

/// 肩・肘・手首の3点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmChain {
    pub shoulder: BodyPart,
    pub elbow: BodyPart,
    pub wrist: BodyPart,
}

/// 手組み判定で優先する右腕 (2, 3, 4)
pub const HAND_FOLD_RIGHT_ARM: ArmChain = ArmChain {
    shoulder: BodyPart::RightShoulder,
    elbow: BodyPart::RightElbow,
    wrist: BodyPart::RightWrist,
};

/// 右腕が取れないときの左腕 (5, 6, 7)
pub const HAND_FOLD_LEFT_ARM: ArmChain = ArmChain {
    shoulder: BodyPart::LeftShoulder,
    elbow: BodyPart::LeftElbow,
    wrist: BodyPart::LeftWrist,
};

/// キーポイントの幾何関係から姿勢を判定する
///
/// 状態を持たないので、同じ分類器を複数フレームで共有してよい。
#[derive(Debug, Clone)]
pub struct PostureClassifier {
    hunchback_below: f32,
    reclined_above: f32,
    kneeling_below: f32,
    hand_fold_tolerance: f32,
}

impl Default for PostureClassifier {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

impl PostureClassifier {
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            hunchback_below: config.hunchback_below,
            reclined_above: config.reclined_above,
            kneeling_below: config.kneeling_below,
            hand_fold_tolerance: config.hand_fold_tolerance,
        }
    }

    /// 3項目をそれぞれ独立に判定
    pub fn classify(&self, keypoints: &FrameKeypoints) -> PostureResult {
        PostureResult {
            lean: self.check_lean(keypoints),
            kneeling: self.check_kneeling(keypoints),
            hand_fold: self.check_hand_fold(keypoints),
        }
    }

    /// 耳と腰の角度から背骨の傾きを判定
    ///
    /// 右耳を優先し、無ければ左耳を使って角度を左右反転 (180 - θ) する。
    pub fn check_lean(&self, keypoints: &FrameKeypoints) -> LeanClassification {
        let (ear, mirrored) = match (
            keypoints.first(BodyPart::RightEar),
            keypoints.first(BodyPart::LeftEar),
        ) {
            (Some(right), _) => (right, false),
            (None, Some(left)) => (left, true),
            (None, None) => {
                debug!("lean undetermined: no ear detected");
                return LeanClassification::Undetermined;
            }
        };
        let Some(hip) = keypoints.first(LEAN_HIP) else {
            debug!("lean undetermined: no hip detected");
            return LeanClassification::Undetermined;
        };

        let degrees = match candidate_angle(ear, hip) {
            Ok(d) => d,
            Err(e) => {
                debug!(error = %e, "lean undetermined");
                return LeanClassification::Undetermined;
            }
        };
        let degrees = if mirrored { 180.0 - degrees } else { degrees };

        if degrees < self.hunchback_below {
            LeanClassification::Hunchback
        } else if degrees > self.reclined_above {
            LeanClassification::Reclined
        } else {
            LeanClassification::Straight
        }
    }

    pub fn check_kneeling(&self, keypoints: &FrameKeypoints) -> SecondaryClassification {
        let (a, b) = KNEELING_PAIR;
        let (Some(a), Some(b)) = (keypoints.first(a), keypoints.first(b)) else {
            debug!("kneeling undetermined: leg pair not detected");
            return SecondaryClassification::Undetermined;
        };
        match candidate_angle(a, b) {
            Ok(degrees) => SecondaryClassification::from(degrees < self.kneeling_below),
            Err(e) => {
                debug!(error = %e, "kneeling undetermined");
                SecondaryClassification::Undetermined
            }
        }
    }

    /// 前腕と上腕の長さの差で手を組んでいるかを判定
    ///
    /// 許容差はピクセル単位の固定値で、被写体の大きさでは正規化しない。
    pub fn check_hand_fold(&self, keypoints: &FrameKeypoints) -> SecondaryClassification {
        let arm = arm_points(keypoints, HAND_FOLD_RIGHT_ARM)
            .or_else(|| arm_points(keypoints, HAND_FOLD_LEFT_ARM));
        let Some([shoulder, elbow, wrist]) = arm else {
            debug!("hand fold undetermined: no complete arm detected");
            return SecondaryClassification::Undetermined;
        };

        let distance = candidate_distance(elbow, wrist);
        let armdist = candidate_distance(elbow, shoulder);
        let folding = (distance - armdist).abs() > self.hand_fold_tolerance;
        SecondaryClassification::from(folding)
    }
}

/// 腕の3点それぞれの先頭候補。1つでも欠ければ None
fn arm_points(keypoints: &FrameKeypoints, arm: ArmChain) -> Option<[&KeypointCandidate; 3]> {
    Some([
        keypoints.first(arm.shoulder)?,
        keypoints.first(arm.elbow)?,
        keypoints.first(arm.wrist)?,
    ])
}
