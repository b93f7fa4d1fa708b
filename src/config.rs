use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PostureError, Result};

/// 設定ファイル全体
///
/// 起動時に一度だけ読み込み、`validate` を通してから全フレームで共有する。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub peak: PeakConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// ONNXモデルのパス
    #[serde(default = "default_model_path")]
    pub path: String,
    /// 入力を x/256 - 0.5 に正規化するか（モデル側に正規化層があれば false）
    #[serde(default = "default_normalize_input")]
    pub normalize_input: bool,
}

/// マルチスケール推論のパラメータ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// boxsize に対する倍率のリスト
    #[serde(default = "default_scale_search")]
    pub scale_search: Vec<f64>,
    /// 基準となる入力高さ（ピクセル）
    #[serde(default = "default_boxsize")]
    pub boxsize: u32,
    /// 入力とネットワーク出力の解像度比
    #[serde(default = "default_stride")]
    pub stride: u32,
    /// 右下パディングの画素値
    #[serde(default = "default_pad_value")]
    pub pad_value: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakConfig {
    /// ピーク検出閾値 (thre1)
    #[serde(default = "default_thre1")]
    pub thre1: f32,
    /// ガウシアン平滑化のシグマ
    #[serde(default = "default_sigma")]
    pub sigma: f32,
}

/// 姿勢判定の閾値（度・ピクセル）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// これ未満なら猫背
    #[serde(default = "default_hunchback_below")]
    pub hunchback_below: f32,
    /// これを超えるとリクライニング
    #[serde(default = "default_reclined_above")]
    pub reclined_above: f32,
    /// これ未満なら膝立ち
    #[serde(default = "default_kneeling_below")]
    pub kneeling_below: f32,
    /// 腕の長さの差がこれ以下なら手を組んでいない
    #[serde(default = "default_hand_fold_tolerance")]
    pub hand_fold_tolerance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 描画済み画像の保存先
    #[serde(default = "default_processed_dir")]
    pub processed_dir: String,
}

fn default_model_path() -> String { "models/openpose_coco.onnx".to_string() }
fn default_normalize_input() -> bool { true }
fn default_scale_search() -> Vec<f64> { vec![1.0] }
fn default_boxsize() -> u32 { 368 }
fn default_stride() -> u32 { 8 }
fn default_pad_value() -> f32 { 128.0 }
fn default_thre1() -> f32 { 0.1 }
fn default_sigma() -> f32 { 3.0 }
fn default_hunchback_below() -> f32 { 70.0 }
fn default_reclined_above() -> f32 { 110.0 }
fn default_kneeling_below() -> f32 { 90.0 }
fn default_hand_fold_tolerance() -> f32 { 100.0 }
fn default_processed_dir() -> String { "processed_images".to_string() }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            normalize_input: default_normalize_input(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            scale_search: default_scale_search(),
            boxsize: default_boxsize(),
            stride: default_stride(),
            pad_value: default_pad_value(),
        }
    }
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            thre1: default_thre1(),
            sigma: default_sigma(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            hunchback_below: default_hunchback_below(),
            reclined_above: default_reclined_above(),
            kneeling_below: default_kneeling_below(),
            hand_fold_tolerance: default_hand_fold_tolerance(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            processed_dir: default_processed_dir(),
        }
    }
}

impl Config {
    /// TOMLファイルを読み込んで検証する
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PostureError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| PostureError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// 画像処理前に全パラメータを検査する
    pub fn validate(&self) -> Result<()> {
        let search = &self.search;
        if search.scale_search.is_empty() {
            return Err(PostureError::config("search.scale_search must not be empty"));
        }
        if let Some(bad) = search
            .scale_search
            .iter()
            .find(|s| !s.is_finite() || **s <= 0.0)
        {
            return Err(PostureError::config(format!(
                "search.scale_search contains non-positive value {bad}"
            )));
        }
        if search.boxsize == 0 {
            return Err(PostureError::config("search.boxsize must be positive"));
        }
        if search.stride == 0 {
            return Err(PostureError::config("search.stride must be positive"));
        }
        if !search.pad_value.is_finite() {
            return Err(PostureError::config("search.pad_value must be finite"));
        }

        if !self.peak.thre1.is_finite() {
            return Err(PostureError::config("peak.thre1 must be finite"));
        }
        if !self.peak.sigma.is_finite() || self.peak.sigma <= 0.0 {
            return Err(PostureError::config("peak.sigma must be positive"));
        }

        let c = &self.classifier;
        let thresholds = [
            c.hunchback_below,
            c.reclined_above,
            c.kneeling_below,
            c.hand_fold_tolerance,
        ];
        if thresholds.iter().any(|t| !t.is_finite()) {
            return Err(PostureError::config("classifier thresholds must be finite"));
        }
        if c.hunchback_below >= c.reclined_above {
            return Err(PostureError::config(format!(
                "classifier.hunchback_below ({}) must be below classifier.reclined_above ({})",
                c.hunchback_below, c.reclined_above
            )));
        }
        if c.hand_fold_tolerance < 0.0 {
            return Err(PostureError::config(
                "classifier.hand_fold_tolerance must not be negative",
            ));
        }
        Ok(())
    }
}
