/// OpenPose COCO の 18 キーポイントインデックス
///
/// ネットワークのヒートマップチャネル順と一致する。チャネル18は背景。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BodyPart {
    Nose = 0,
    Neck = 1,
    RightShoulder = 2,
    RightElbow = 3,
    RightWrist = 4,
    LeftShoulder = 5,
    LeftElbow = 6,
    LeftWrist = 7,
    RightHip = 8,
    RightKnee = 9,
    RightAnkle = 10,
    LeftHip = 11,
    LeftKnee = 12,
    LeftAnkle = 13,
    RightEye = 14,
    LeftEye = 15,
    RightEar = 16,
    LeftEar = 17,
}

impl BodyPart {
    pub const COUNT: usize = 18;

    /// 背景チャネルを含むヒートマップのチャネル数
    pub const HEATMAP_CHANNELS: usize = 19;

    /// チャネル順
    pub const ALL: [BodyPart; BodyPart::COUNT] = [
        Self::Nose,
        Self::Neck,
        Self::RightShoulder,
        Self::RightElbow,
        Self::RightWrist,
        Self::LeftShoulder,
        Self::LeftElbow,
        Self::LeftWrist,
        Self::RightHip,
        Self::RightKnee,
        Self::RightAnkle,
        Self::LeftHip,
        Self::LeftKnee,
        Self::LeftAnkle,
        Self::RightEye,
        Self::LeftEye,
        Self::RightEar,
        Self::LeftEar,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// ヒートマップから取り出した1つの局所最大点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeypointCandidate {
    /// ピクセルX座標
    pub x: f32,
    /// ピクセルY座標
    pub y: f32,
    /// 平滑化前のヒートマップ値 (0.0〜1.0)
    pub confidence: f32,
    /// フレーム内で一意な通し番号（チャネル順 → ラスタ順）
    pub id: usize,
}

impl KeypointCandidate {
    pub fn new(x: f32, y: f32, confidence: f32, id: usize) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self { x, y, confidence, id }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// 1フレーム分の部位ごとの候補リスト
///
/// 候補が空の部位は正常（未検出）として扱う。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameKeypoints {
    parts: [Vec<KeypointCandidate>; BodyPart::COUNT],
}

impl FrameKeypoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, part: BodyPart) -> &[KeypointCandidate] {
        &self.parts[part.index()]
    }

    /// 最初の候補（IDが最小のもの）
    pub fn first(&self, part: BodyPart) -> Option<&KeypointCandidate> {
        self.parts[part.index()].first()
    }

    pub fn push(&mut self, part: BodyPart, candidate: KeypointCandidate) {
        self.parts[part.index()].push(candidate);
    }

    /// (部位, 候補リスト) をチャネル順に返す
    pub fn iter(&self) -> impl Iterator<Item = (BodyPart, &[KeypointCandidate])> {
        BodyPart::ALL
            .iter()
            .map(move |&part| (part, self.parts[part.index()].as_slice()))
    }

    /// 全部位の候補数
    pub fn total(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }
}
