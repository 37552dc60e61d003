//! 学习型分类器边界
//!
//! 模型加载与推理不在本库内，适配器只把模型输出归一化为 伪造/真实 概率对

use super::error::DetectorError;
use super::frame::PixelBuffer;
use super::method::{MethodDetail, MethodResult, Prediction};
use std::sync::Arc;

/// 模型原始输出
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierOutput {
    Probabilities { fake: f64, real: f64 },
    /// 两类 logits，下标 0 为伪造，1 为真实
    Logits(Vec<f64>),
    /// 伪造类的单个 logit
    Logit(f64),
}

impl ClassifierOutput {
    /// (P(伪造), P(真实))
    pub fn probabilities(&self) -> Result<(f64, f64), DetectorError> {
        let (fake, real) = match self {
            ClassifierOutput::Probabilities { fake, real } => (*fake, *real),
            ClassifierOutput::Logits(logits) => match logits.len() {
                0 => return Err(DetectorError::InvalidOutput("empty logits".to_string())),
                1 => complementary(sigmoid(logits[0])),
                _ => {
                    let probs = softmax(logits);
                    (probs[0], probs[1])
                }
            },
            ClassifierOutput::Logit(logit) => complementary(sigmoid(*logit)),
        };

        if !fake.is_finite() || !real.is_finite() {
            return Err(DetectorError::InvalidOutput(format!(
                "non-finite probabilities ({}, {})",
                fake, real
            )));
        }
        Ok((fake.clamp(0.0, 1.0), real.clamp(0.0, 1.0)))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn complementary(fake: f64) -> (f64, f64) {
    (fake, 1.0 - fake)
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;
    fn classify(&self, frame: &PixelBuffer) -> Result<ClassifierOutput, DetectorError>;
}

/// 分类器依赖，构造时注入
#[derive(Clone)]
pub enum ClassifierAdapter {
    Available(Arc<dyn Classifier>),
    Unavailable { reason: String },
}

impl ClassifierAdapter {
    pub fn available(classifier: Arc<dyn Classifier>) -> Self {
        ClassifierAdapter::Available(classifier)
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ClassifierAdapter::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ClassifierAdapter::Available(_))
    }

    /// 未配置分类器时为 `None`，该方法不出现在帧结果中，而不是记 0 分
    pub fn evaluate(&self, frame: &PixelBuffer) -> Option<Result<MethodResult, DetectorError>> {
        match self {
            ClassifierAdapter::Unavailable { .. } => None,
            ClassifierAdapter::Available(classifier) => Some(
                classifier
                    .classify(frame)
                    .and_then(|output| output.probabilities())
                    .map(|(fake, real)| method_result(fake, real)),
            ),
        }
    }
}

impl std::fmt::Debug for ClassifierAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierAdapter::Available(c) => f.debug_tuple("Available").field(&c.name()).finish(),
            ClassifierAdapter::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

fn method_result(fake: f64, real: f64) -> MethodResult {
    let is_fake = fake > real;
    let confidence = fake.max(real);
    let prediction = if is_fake { Prediction::Fake } else { Prediction::Real };
    let label = format!(
        "AI Model: {} ({:.1}% confidence)",
        if is_fake { "FAKE" } else { "REAL" },
        confidence * 100.0
    );

    MethodResult::new(
        fake,
        is_fake,
        MethodDetail::Classifier {
            fake_probability: fake,
            real_probability: real,
            confidence,
            prediction,
        },
        label,
    )
}

/// 每帧返回固定输出
pub struct MockClassifier {
    output: Result<ClassifierOutput, String>,
}

impl MockClassifier {
    pub fn with_output(output: ClassifierOutput) -> Self {
        Self { output: Ok(output) }
    }

    pub fn with_fake_probability(fake: f64) -> Self {
        Self::with_output(ClassifierOutput::Probabilities {
            fake,
            real: 1.0 - fake,
        })
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            output: Err(message.into()),
        }
    }
}

impl Classifier for MockClassifier {
    fn name(&self) -> &str {
        "mock"
    }

    fn classify(&self, _frame: &PixelBuffer) -> Result<ClassifierOutput, DetectorError> {
        self.output.clone().map_err(DetectorError::Classifier)
    }
}
