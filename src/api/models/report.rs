use crate::core::method::{FrameAnalysis, Method};
use crate::core::verdict::Assessment;
use serde::Serialize;

/// 单张图片的分析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageAnalysis {
    pub analysis: FrameAnalysis,
    /// 加权帧分数，[0, 1]
    pub score: f64,
    #[serde(flatten)]
    pub assessment: Assessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MethodCapability {
    pub method: Method,
    pub weight: f64,
}

/// 服务能力描述
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capabilities {
    /// 按报告顺序排列
    pub methods: Vec<MethodCapability>,
    pub classifier_available: bool,
    /// 未配置人脸定位器时为 false，结果中不含 facial_consistency
    pub face_detection_available: bool,
    pub sample_count: usize,
}

impl Capabilities {
    pub fn method_names(&self) -> Vec<&'static str> {
        self.methods.iter().map(|m| m.method.as_str()).collect()
    }
}
