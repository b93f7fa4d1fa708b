use ndarray::{Array3, Array4, Ix3};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use super::heatmap::{InferenceAdapter, NetworkOutput};
use crate::error::{PostureError, Result};

/// OpenPose 系 ONNX モデルの推論アダプタ
///
/// 出力は [1, H/stride, W/stride, 38] (PAF) と [1, H/stride, W/stride, 19] (ヒートマップ) の順。
/// `Session::run` は排他なので Mutex で直列化する。
pub struct OnnxPoseModel {
    session: Mutex<Session>,
    input_name: String,
    paf_output: String,
    heatmap_output: String,
}

fn build_session(model_path: &Path) -> ort::Result<Session> {
    let builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;

    #[cfg(feature = "cuda")]
    let builder = {
        info!("attempting CUDA execution provider");
        builder.with_execution_providers([
            ort::execution_providers::CUDAExecutionProvider::default().build(),
        ])?
    };

    builder.commit_from_file(model_path)
}

impl OnnxPoseModel {
    /// ONNXモデルを読み込んで初期化
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let session = build_session(model_path).map_err(|e| {
            PostureError::config(format!(
                "failed to load ONNX model {}: {e}",
                model_path.display()
            ))
        })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| PostureError::config("model has no inputs"))?;
        if session.outputs.len() < 2 {
            return Err(PostureError::config(format!(
                "model must have PAF and heatmap outputs, found {}",
                session.outputs.len()
            )));
        }
        let paf_output = session.outputs[0].name.clone();
        let heatmap_output = session.outputs[1].name.clone();

        info!(
            path = %model_path.display(),
            input = %input_name,
            paf = %paf_output,
            heatmap = %heatmap_output,
            "loaded pose model"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            paf_output,
            heatmap_output,
        })
    }
}

/// [1, H, W, C] の出力から (H, W, C) を取り出す
fn squeeze_output(view: ndarray::ArrayViewD<f32>, what: &str) -> Result<Array3<f32>> {
    let shape = view.shape().to_vec();
    if shape.len() != 4 || shape[0] != 1 {
        return Err(PostureError::inference(format!(
            "{what} output has shape {shape:?}, expected [1, H, W, C]"
        )));
    }
    view.index_axis(ndarray::Axis(0), 0)
        .to_owned()
        .into_dimensionality::<Ix3>()
        .map_err(|e| PostureError::inference(format!("{what} output: {e}")))
}

impl InferenceAdapter for OnnxPoseModel {
    fn infer(&self, input: Array4<f32>) -> Result<NetworkOutput> {
        let input_tensor = Tensor::from_array(input)
            .map_err(|e| PostureError::inference(format!("failed to build input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PostureError::inference("model session lock poisoned"))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| PostureError::inference(format!("inference failed: {e}")))?;

        let pafs: ndarray::ArrayViewD<f32> = outputs[self.paf_output.as_str()]
            .try_extract_array()
            .map_err(|e| PostureError::inference(format!("failed to extract PAF output: {e}")))?;
        let heatmaps: ndarray::ArrayViewD<f32> = outputs[self.heatmap_output.as_str()]
            .try_extract_array()
            .map_err(|e| {
                PostureError::inference(format!("failed to extract heatmap output: {e}"))
            })?;

        Ok(NetworkOutput {
            pafs: squeeze_output(pafs, "PAF")?,
            heatmaps: squeeze_output(heatmaps, "heatmap")?,
        })
    }
}
