use super::classifier::ClassifierAdapter;
use super::detectors::{color, compression, facial, frequency};
use super::faces::FaceLocator;
use super::frame::PixelBuffer;
use super::method::{FrameAnalysis, Method, MethodWeights};
use log::warn;
use std::sync::Arc;

/// 对单帧运行所有可用方法，并折算为一个帧分数
#[derive(Clone)]
pub struct FrameScorer {
    weights: MethodWeights,
    classifier: ClassifierAdapter,
    /// `None` 时不做人脸一致性检测
    faces: Option<Arc<dyn FaceLocator>>,
}

impl FrameScorer {
    pub fn new(weights: MethodWeights, classifier: ClassifierAdapter, faces: Option<Arc<dyn FaceLocator>>) -> Self {
        Self {
            weights,
            classifier,
            faces,
        }
    }

    pub fn weights(&self) -> &MethodWeights {
        &self.weights
    }

    pub fn classifier_available(&self) -> bool {
        self.classifier.is_available()
    }

    pub fn face_detection_available(&self) -> bool {
        self.faces.is_some()
    }

    /// 运行全部方法；失败的方法记录日志后略过
    pub fn analyze(&self, frame: &PixelBuffer) -> FrameAnalysis {
        let mut analysis = FrameAnalysis::new();

        for method in Method::ALL {
            let outcome = match method {
                Method::MlModel => self.classifier.evaluate(frame),
                Method::FrequencyAnalysis => Some(Ok(frequency::analyze(frame))),
                Method::FacialConsistency => self.faces.as_ref().map(|f| facial::analyze(frame, f.as_ref())),
                Method::CompressionArtifacts => Some(Ok(compression::analyze(frame))),
                Method::ColorAnalysis => Some(Ok(color::analyze(frame))),
            };

            match outcome {
                Some(Ok(result)) => analysis.insert(method, result),
                Some(Err(e)) => warn!("⚠️ {} failed, skipping: {}", method, e),
                None => {}
            }
        }

        analysis
    }

    /// 已有方法的加权和，上限 1.0。不重新归一化：缺失的方法会降低可达上限
    pub fn score(&self, analysis: &FrameAnalysis) -> f64 {
        let total: f64 = analysis
            .iter()
            .map(|(method, result)| self.weights.weight(method) * result.score())
            .sum();
        total.min(1.0)
    }

    pub fn evaluate(&self, frame: &PixelBuffer) -> (FrameAnalysis, f64) {
        let analysis = self.analyze(frame);
        let score = self.score(&analysis);
        (analysis, score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::MockClassifier;
    use crate::core::faces::{FaceRegion, MockFaceLocator};
    use crate::core::method::{MethodDetail, MethodResult};
    use proptest::prelude::*;

    fn heuristics_only() -> FrameScorer {
        FrameScorer::new(
            MethodWeights::default(),
            ClassifierAdapter::unavailable("not loaded"),
            None,
        )
    }

    fn result(score: f64) -> MethodResult {
        MethodResult::new(score, false, MethodDetail::Color { color_balance: 0.0 }, "synthetic")
    }

    #[test]
    fn test_gray_frame_scores_zero_without_classifier() {
        let scorer = heuristics_only();
        let (analysis, score) = scorer.evaluate(&PixelBuffer::filled(64, 64, [128, 128, 128]));

        assert_eq!(analysis.len(), 3);
        assert!(!analysis.contains(Method::MlModel));
        assert!(!analysis.contains(Method::FacialConsistency));
        assert!(analysis.iter().all(|(_, r)| r.score() == 0.0));
        assert!(score.abs() < 1e-9);
    }

    #[test]
    fn test_missing_classifier_is_not_renormalized() {
        let scorer = heuristics_only();
        let mut analysis = FrameAnalysis::new();
        for method in [
            Method::FrequencyAnalysis,
            Method::FacialConsistency,
            Method::CompressionArtifacts,
            Method::ColorAnalysis,
        ] {
            analysis.insert(method, result(0.5));
        }

        assert!((scorer.score(&analysis) - 0.275).abs() < 1e-9);
    }

    #[test]
    fn test_classifier_result_is_weighted() {
        let scorer = FrameScorer::new(
            MethodWeights::default(),
            ClassifierAdapter::available(Arc::new(MockClassifier::with_fake_probability(1.0))),
            Some(Arc::new(MockFaceLocator::with_regions(Vec::new()))),
        );
        let (analysis, score) = scorer.evaluate(&PixelBuffer::filled(32, 32, [128, 128, 128]));

        assert_eq!(analysis.len(), 5);
        assert!((score - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_failing_methods_are_omitted() {
        let scorer = FrameScorer::new(
            MethodWeights::default(),
            ClassifierAdapter::available(Arc::new(MockClassifier::failing("cuda oom"))),
            Some(Arc::new(MockFaceLocator::failing())),
        );
        let (analysis, score) = scorer.evaluate(&PixelBuffer::filled(32, 32, [60, 60, 60]));

        assert!(!analysis.contains(Method::MlModel));
        assert!(!analysis.contains(Method::FacialConsistency));
        assert_eq!(analysis.len(), 3);
        assert!(score.abs() < 1e-9);
    }

    #[test]
    fn test_alternate_weights_are_honoured() {
        let weights = MethodWeights {
            ml_model: 0.0,
            frequency_analysis: 0.0,
            facial_consistency: 0.0,
            compression_artifacts: 0.0,
            color_analysis: 1.0,
        };
        let scorer = FrameScorer::new(weights, ClassifierAdapter::unavailable("none"), None);
        let mut analysis = FrameAnalysis::new();
        analysis.insert(Method::ColorAnalysis, result(0.7));
        analysis.insert(Method::FrequencyAnalysis, result(1.0));

        assert!((scorer.score(&analysis) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_facial_method_runs_only_with_locator() {
        let frame = PixelBuffer::filled(64, 64, [120, 120, 120]);
        let without = heuristics_only();
        let with_faces = FrameScorer::new(
            MethodWeights::default(),
            ClassifierAdapter::unavailable("not loaded"),
            Some(Arc::new(MockFaceLocator::with_regions(vec![FaceRegion::new(16, 16, 32, 32)]))),
        );

        assert!(!without.face_detection_available());
        assert!(without.analyze(&frame).get(Method::FacialConsistency).is_none());

        assert!(with_faces.face_detection_available());
        let (analysis, score) = with_faces.evaluate(&frame);
        // 平坦人脸框：边缘密度过低 0.3 × 0.15
        assert_eq!(analysis.get(Method::FacialConsistency).map(|r| r.score()), Some(0.3));
        assert!((score - 0.045).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_frame_score_stays_in_unit_range(
            scores in proptest::collection::vec(proptest::option::of(-1.0f64..2.0), 5)
        ) {
            let scorer = heuristics_only();
            let mut analysis = FrameAnalysis::new();
            for (method, score) in Method::ALL.iter().zip(scores) {
                if let Some(s) = score {
                    analysis.insert(*method, result(s));
                }
            }

            for (_, r) in analysis.iter() {
                prop_assert!((0.0..=1.0).contains(&r.score()));
            }
            let score = scorer.score(&analysis);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
