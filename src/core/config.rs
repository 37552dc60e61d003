use super::error::AnalysisError;
use super::method::MethodWeights;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 单个分析器的可调参数，每个字段都有默认值，部分 JSON 即可
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 每个视频的采样帧数
    pub sample_count: usize,
    pub weights: MethodWeights,
    pub frame_mean_weight: f64,
    pub temporal_weight: f64,
    /// 每次并行打分前解码的帧数，`None` 取逻辑 CPU 数
    pub decode_batch_size: Option<usize>,
    /// Haar 级联 XML，需要 `opencv` feature，否则创建分析器时报错
    pub face_cascade_path: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_count: 30,
            weights: MethodWeights::default(),
            frame_mean_weight: 0.85,
            temporal_weight: 0.15,
            decode_batch_size: None,
            face_cascade_path: None,
        }
    }
}

impl AnalysisConfig {
    /// 预览用，采样更少
    pub fn quick() -> Self {
        Self {
            sample_count: 10,
            ..Self::default()
        }
    }

    pub fn thorough() -> Self {
        Self {
            sample_count: 60,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.sample_count == 0 {
            return Err(AnalysisError::InvalidConfig("sample_count must be at least 1".into()));
        }
        if self.decode_batch_size == Some(0) {
            return Err(AnalysisError::InvalidConfig("decode_batch_size must be at least 1".into()));
        }
        for (name, value) in [
            ("frame_mean_weight", self.frame_mean_weight),
            ("temporal_weight", self.temporal_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalysisError::InvalidConfig(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }
        if ((self.frame_mean_weight + self.temporal_weight) - 1.0).abs() > 1e-6 {
            return Err(AnalysisError::InvalidConfig(
                "frame_mean_weight and temporal_weight must sum to 1".into(),
            ));
        }
        self.weights.validate()
    }

    pub fn batch_size(&self) -> usize {
        self.decode_batch_size.unwrap_or_else(num_cpus::get).max(1)
    }
}
