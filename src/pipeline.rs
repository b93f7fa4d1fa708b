use ndarray::{Array3, ArrayView3};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::pose::{aggregate, extract_peaks, FrameKeypoints, InferenceAdapter};
use crate::posture::{PostureClassifier, PostureResult};
use crate::render::draw_keypoints;

/// 1枚の画像の解析結果
#[derive(Debug, Clone)]
pub struct PostureAnalysis {
    pub keypoints: FrameKeypoints,
    pub result: PostureResult,
    /// キーポイントを描画した画像のコピー
    pub annotated: Array3<u8>,
}

/// 起動時に一度だけ作る読み取り専用のコンテキスト
///
/// `analyze` は状態を変更しないので、アダプタが Sync なら複数スレッドから
/// 同時に呼んでよい。
pub struct PostureContext<A> {
    config: Config,
    classifier: PostureClassifier,
    adapter: A,
}

impl<A: InferenceAdapter> PostureContext<A> {
    /// 設定を検証してからコンテキストを作る
    pub fn new(config: Config, adapter: A) -> Result<Self> {
        config.validate()?;
        let classifier = PostureClassifier::from_config(&config.classifier);
        Ok(Self {
            config,
            classifier,
            adapter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 画像 → ヒートマップ → キーポイント
    pub fn detect_keypoints(&self, image: ArrayView3<u8>) -> Result<FrameKeypoints> {
        let maps = aggregate(image, &self.config, &self.adapter)?;
        debug!(
            heatmap = ?maps.heatmaps.dim(),
            paf = ?maps.pafs.dim(),
            "aggregated network output"
        );
        extract_peaks(maps.heatmaps.view(), self.config.peak.thre1, self.config.peak.sigma)
    }

    /// 画像1枚を解析して判定結果と描画画像を返す
    ///
    /// チャネル不足などのエラー時は判定結果を返さない。
    pub fn analyze(&self, image: ArrayView3<u8>) -> Result<PostureAnalysis> {
        let keypoints = self.detect_keypoints(image)?;
        let result = self.classifier.classify(&keypoints);
        info!(
            lean = ?result.lean,
            kneeling = ?result.kneeling,
            hand_fold = ?result.hand_fold,
            candidates = keypoints.total(),
            "posture classified"
        );
        let annotated = draw_keypoints(image, &keypoints);
        Ok(PostureAnalysis {
            keypoints,
            result,
            annotated,
        })
    }
}
