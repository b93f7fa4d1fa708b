pub mod classifier;
pub mod geometry;

pub use classifier::{
    PostureClassifier, HAND_FOLD_LEFT_ARM, HAND_FOLD_RIGHT_ARM, KNEELING_PAIR,
};

use serde::{Deserialize, Serialize};

/// 背骨の傾き
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeanClassification {
    Hunchback,
    Straight,
    Reclined,
    Undetermined,
}

impl LeanClassification {
    /// 送信用の符号付きコード (猫背 1, 正常 0, リクライニング -1)
    pub fn code(self) -> Option<i8> {
        match self {
            Self::Hunchback => Some(1),
            Self::Straight => Some(0),
            Self::Reclined => Some(-1),
            Self::Undetermined => None,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            1 => Some(Self::Hunchback),
            0 => Some(Self::Straight),
            -1 => Some(Self::Reclined),
            _ => None,
        }
    }
}

/// 膝立ち・手組みの判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecondaryClassification {
    True,
    False,
    Undetermined,
}

impl SecondaryClassification {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Undetermined => None,
        }
    }
}

impl From<bool> for SecondaryClassification {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

/// 1フレームの判定結果。3項目は独立に計算され、互いに整合性は検査しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostureResult {
    pub lean: LeanClassification,
    pub kneeling: SecondaryClassification,
    pub hand_fold: SecondaryClassification,
}

impl PostureResult {
    pub fn undetermined() -> Self {
        Self {
            lean: LeanClassification::Undetermined,
            kneeling: SecondaryClassification::Undetermined,
            hand_fold: SecondaryClassification::Undetermined,
        }
    }
}
