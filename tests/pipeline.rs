use ndarray::{Array3, Array4};

use posture_monitor::config::Config;
use posture_monitor::message::{lean_payload, PostureReport};
use posture_monitor::pose::{BodyPart, InferenceAdapter, NetworkOutput};
use posture_monitor::{
    LeanClassification, PostureContext, PostureError, Result, SecondaryClassification,
};

const STRIDE: usize = 8;

/// 入力画像上の正規化座標にブロブを置く合成ネットワーク
struct SyntheticNetwork {
    blobs: Vec<(BodyPart, f32, f32)>,
    heatmap_channels: usize,
}

impl SyntheticNetwork {
    fn new(blobs: Vec<(BodyPart, f32, f32)>) -> Self {
        Self {
            blobs,
            heatmap_channels: BodyPart::HEATMAP_CHANNELS,
        }
    }
}

impl InferenceAdapter for SyntheticNetwork {
    fn infer(&self, input: Array4<f32>) -> Result<NetworkOutput> {
        let (_, h, w, _) = input.dim();
        let (oh, ow) = (h / STRIDE, w / STRIDE);
        let mut heatmaps = Array3::<f32>::zeros((oh, ow, self.heatmap_channels));
        for &(part, fx, fy) in &self.blobs {
            if part.index() >= self.heatmap_channels {
                continue;
            }
            // 入力画素 (fx*W, fy*H) の中心に当たる出力座標
            let cx = (fx * w as f32 + 0.5) / STRIDE as f32 - 0.5;
            let cy = (fy * h as f32 + 0.5) / STRIDE as f32 - 0.5;
            for y in 0..oh {
                for x in 0..ow {
                    let d2 = (x as f32 - cx).powi(2) + (y as f32 - cy).powi(2);
                    heatmaps[[y, x, part.index()]] += 0.9 * (-d2 / 2.0).exp();
                }
            }
        }
        Ok(NetworkOutput {
            pafs: Array3::zeros((oh, ow, 38)),
            heatmaps,
        })
    }
}

fn test_config(scales: Vec<f64>) -> Config {
    let mut config = Config::default();
    config.search.scale_search = scales;
    config.search.boxsize = 200;
    config.search.stride = STRIDE as u32;
    config
}

fn seated_person() -> Vec<(BodyPart, f32, f32)> {
    vec![
        // 耳と腰が同じ列 → 90°
        (BodyPart::RightEar, 0.5, 0.2),
        (BodyPart::LeftHip, 0.5, 0.7),
        // 膝立ち判定の対: 45°
        (BodyPart::LeftWrist, 0.15, 0.55),
        (BodyPart::RightHip, 0.3, 0.7),
        // 右腕: 上腕と前腕の差は小さい
        (BodyPart::RightShoulder, 0.75, 0.3),
        (BodyPart::RightElbow, 0.75, 0.5),
        (BodyPart::RightWrist, 0.85, 0.5),
    ]
}

#[test]
fn test_full_pipeline_classifies_seated_person() {
    let context = PostureContext::new(test_config(vec![1.0]), SyntheticNetwork::new(seated_person()))
        .unwrap();
    let image = Array3::<u8>::from_elem((200, 200, 3), 30);
    let analysis = context.analyze(image.view()).unwrap();

    assert_eq!(analysis.result.lean, LeanClassification::Straight);
    assert_eq!(analysis.result.kneeling, SecondaryClassification::True);
    assert_eq!(analysis.result.hand_fold, SecondaryClassification::False);
    assert_eq!(analysis.annotated.dim(), (200, 200, 3));
    assert_ne!(analysis.annotated, image);

    assert_eq!(lean_payload(&analysis.result).as_deref(), Some("0"));
    let report = PostureReport::from(&analysis.result);
    assert_eq!(report.lean, Some(0));
    assert_eq!(report.kneeling, Some(true));
    assert_eq!(report.hand_fold, Some(false));
}

#[test]
fn test_candidate_ids_strictly_increase() {
    let context = PostureContext::new(test_config(vec![1.0]), SyntheticNetwork::new(seated_person()))
        .unwrap();
    let image = Array3::<u8>::from_elem((200, 200, 3), 30);
    let keypoints = context.detect_keypoints(image.view()).unwrap();

    assert_eq!(keypoints.total(), seated_person().len());
    let ids: Vec<usize> = keypoints
        .iter()
        .flat_map(|(_, candidates)| candidates.iter().map(|c| c.id))
        .collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(ids.first(), Some(&0));
    for (_, candidates) in keypoints.iter() {
        assert!(candidates
            .iter()
            .all(|c| (0.0..=1.0).contains(&c.confidence)));
    }
}

#[test]
fn test_pipeline_is_deterministic() {
    let context = PostureContext::new(
        test_config(vec![0.5, 1.0]),
        SyntheticNetwork::new(seated_person()),
    )
    .unwrap();
    let image = Array3::from_shape_fn((173, 241, 3), |(y, x, c)| ((y * 7 + x * 3 + c) % 256) as u8);
    let a = context.analyze(image.view()).unwrap();
    let b = context.analyze(image.view()).unwrap();
    assert_eq!(a.keypoints, b.keypoints);
    assert_eq!(a.result, b.result);
    assert_eq!(a.annotated, b.annotated);
}

#[test]
fn test_multi_scale_keeps_lean_straight() {
    let context = PostureContext::new(
        test_config(vec![0.5, 1.0, 1.5]),
        SyntheticNetwork::new(seated_person()),
    )
    .unwrap();
    let image = Array3::<u8>::from_elem((150, 210, 3), 90);
    let analysis = context.analyze(image.view()).unwrap();
    assert_eq!(analysis.annotated.dim(), (150, 210, 3));
    assert_eq!(analysis.result.lean, LeanClassification::Straight);
}

#[test]
fn test_missing_parts_are_undetermined() {
    let context = PostureContext::new(
        test_config(vec![1.0]),
        SyntheticNetwork::new(vec![(BodyPart::Nose, 0.5, 0.5)]),
    )
    .unwrap();
    let image = Array3::<u8>::from_elem((200, 200, 3), 30);
    let analysis = context.analyze(image.view()).unwrap();
    assert_eq!(analysis.keypoints.get(BodyPart::Nose).len(), 1);
    assert_eq!(analysis.result.lean, LeanClassification::Undetermined);
    assert_eq!(analysis.result.kneeling, SecondaryClassification::Undetermined);
    assert_eq!(analysis.result.hand_fold, SecondaryClassification::Undetermined);
    assert_eq!(lean_payload(&analysis.result), None);
}

#[test]
fn test_ten_heatmap_channels_fail_incomplete() {
    let mut network = SyntheticNetwork::new(seated_person());
    network.heatmap_channels = 10;
    let context = PostureContext::new(test_config(vec![1.0]), network).unwrap();
    let image = Array3::<u8>::from_elem((200, 200, 3), 30);
    let err = context.analyze(image.view()).unwrap_err();
    assert!(matches!(
        err,
        PostureError::IncompleteDetection { found: 10, required: 18 }
    ));
}

#[test]
fn test_context_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PostureContext<SyntheticNetwork>>();

    let context = PostureContext::new(test_config(vec![1.0]), SyntheticNetwork::new(seated_person()))
        .unwrap();
    let image = Array3::<u8>::from_elem((200, 200, 3), 30);
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| scope.spawn(|| context.analyze(image.view()).unwrap().result))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(results[0], results[1]);
}
