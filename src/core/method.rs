//! 检测方法、单帧结果与静态权重

use super::error::AnalysisError;
use super::verdict::round_to;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 五种单帧检测方法，按报告顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    MlModel,
    FrequencyAnalysis,
    FacialConsistency,
    CompressionArtifacts,
    ColorAnalysis,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::MlModel,
        Method::FrequencyAnalysis,
        Method::FacialConsistency,
        Method::CompressionArtifacts,
        Method::ColorAnalysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::MlModel => "ml_model",
            Method::FrequencyAnalysis => "frequency_analysis",
            Method::FacialConsistency => "facial_consistency",
            Method::CompressionArtifacts => "compression_artifacts",
            Method::ColorAnalysis => "color_analysis",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    Fake,
    Real,
}

/// 各方法的诊断字段
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MethodDetail {
    Classifier {
        fake_probability: f64,
        real_probability: f64,
        confidence: f64,
        prediction: Prediction,
    },
    Frequency {
        high_freq_ratio: f64,
    },
    Facial {
        faces_detected: usize,
        notes: Vec<String>,
    },
    Compression {
        artifact_density: f64,
    },
    Color {
        color_balance: f64,
    },
}

/// 单个检测器在单帧上的结果，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodResult {
    score: f64,
    suspicious: bool,
    detail: MethodDetail,
    label: String,
}

impl MethodResult {
    /// `score` 限制在 [0, 1] 并保留 3 位小数，NaN 记为 0
    pub fn new(score: f64, suspicious: bool, detail: MethodDetail, label: impl Into<String>) -> Self {
        let score = if score.is_nan() {
            0.0
        } else {
            round_to(score.clamp(0.0, 1.0), 3)
        };
        Self {
            score,
            suspicious,
            detail,
            label: label.into(),
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn suspicious(&self) -> bool {
        self.suspicious
    }

    pub fn detail(&self) -> &MethodDetail {
        &self.detail
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// 单帧上已执行方法的结果。缺失的键表示方法未执行（不可用或失败），
/// 绝不按 0 处理
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FrameAnalysis {
    results: BTreeMap<Method, MethodResult>,
}

impl FrameAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, method: Method, result: MethodResult) {
        self.results.insert(method, result);
    }

    pub fn get(&self, method: Method) -> Option<&MethodResult> {
        self.results.get(&method)
    }

    pub fn contains(&self, method: Method) -> bool {
        self.results.contains_key(&method)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Method, &MethodResult)> {
        self.results.iter().map(|(m, r)| (*m, r))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// 各方法的静态权重，总和必须为 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodWeights {
    pub ml_model: f64,
    pub frequency_analysis: f64,
    pub facial_consistency: f64,
    pub compression_artifacts: f64,
    pub color_analysis: f64,
}

impl Default for MethodWeights {
    fn default() -> Self {
        Self {
            ml_model: 0.45,
            frequency_analysis: 0.20,
            facial_consistency: 0.15,
            compression_artifacts: 0.12,
            color_analysis: 0.08,
        }
    }
}

impl MethodWeights {
    const SUM_TOLERANCE: f64 = 1e-6;

    pub fn weight(&self, method: Method) -> f64 {
        match method {
            Method::MlModel => self.ml_model,
            Method::FrequencyAnalysis => self.frequency_analysis,
            Method::FacialConsistency => self.facial_consistency,
            Method::CompressionArtifacts => self.compression_artifacts,
            Method::ColorAnalysis => self.color_analysis,
        }
    }

    pub fn sum(&self) -> f64 {
        Method::ALL.iter().map(|&m| self.weight(m)).sum()
    }

    /// 按方法顺序的 (方法, 权重)
    pub fn entries(&self) -> Vec<(Method, f64)> {
        Method::ALL.iter().map(|&m| (m, self.weight(m))).collect()
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (method, weight) in self.entries() {
            if !(0.0..=1.0).contains(&weight) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "weight for {} must be within [0, 1], got {}",
                    method, weight
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > Self::SUM_TOLERANCE {
            return Err(AnalysisError::InvalidConfig(format!(
                "method weights must sum to 1.0, got {:.6}",
                sum
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = MethodWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_weights_reject_bad_sum() {
        let weights = MethodWeights {
            ml_model: 0.9,
            ..Default::default()
        };
        assert!(matches!(weights.validate(), Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn test_entries_follow_method_order() {
        let names: Vec<&str> = MethodWeights::default()
            .entries()
            .iter()
            .map(|(m, _)| m.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "ml_model",
                "frequency_analysis",
                "facial_consistency",
                "compression_artifacts",
                "color_analysis"
            ]
        );
    }

    #[test]
    fn test_method_result_clamps_score() {
        let detail = MethodDetail::Color { color_balance: 0.0 };
        assert_eq!(MethodResult::new(1.7, true, detail.clone(), "x").score(), 1.0);
        assert_eq!(MethodResult::new(-0.2, false, detail.clone(), "x").score(), 0.0);
        assert_eq!(MethodResult::new(f64::NAN, false, detail, "x").score(), 0.0);
    }

    #[test]
    fn test_method_result_rounds_score() {
        let detail = MethodDetail::Compression { artifact_density: 0.0 };
        assert_eq!(MethodResult::new(0.20408, false, detail.clone(), "x").score(), 0.204);
        assert_eq!(MethodResult::new(0.6666666, true, detail, "x").score(), 0.667);
    }

    #[test]
    fn test_analysis_serializes_as_method_map() {
        let mut analysis = FrameAnalysis::new();
        analysis.insert(
            Method::ColorAnalysis,
            MethodResult::new(0.25, false, MethodDetail::Color { color_balance: 7.5 }, "Normal color characteristics"),
        );

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["color_analysis"]["score"], 0.25);
        assert_eq!(json["color_analysis"]["detail"]["color_balance"], 7.5);
        assert!(json.get("ml_model").is_none());
    }
}
