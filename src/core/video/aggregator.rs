//! 把逐帧分数汇总为视频级报告

use super::temporal;
use crate::core::method::{FrameAnalysis, Method, MethodWeights};
use crate::core::verdict::{round_to, Assessment};
use serde::Serialize;
use std::collections::BTreeMap;

/// 帧分数超过该值即记为可疑帧
pub const SUSPICIOUS_FRAME_THRESHOLD: f64 = 0.6;
pub const MAX_SUSPICIOUS_SEGMENTS: usize = 10;

/// 单个已分析帧
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameScore {
    pub frame_number: u64,
    pub timestamp_seconds: f64,
    pub score: f64,
    pub analysis: FrameAnalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoInfo {
    pub total_frames: u64,
    pub fps: f64,
    pub duration_seconds: f64,
    pub frames_analyzed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverallAnalysis {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub temporal_coherence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreStatistics {
    pub mean_score: f64,
    pub max_score: f64,
    pub min_score: f64,
    pub score_variance: f64,
    pub suspicious_frame_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MethodContribution {
    pub average_score: f64,
    pub weight: f64,
    /// `average_score * weight * 100`
    pub contribution: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SuspiciousSegment {
    pub frame_number: u64,
    pub timestamp_seconds: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoReport {
    pub video_info: VideoInfo,
    pub overall_analysis: OverallAnalysis,
    pub statistics: ScoreStatistics,
    pub method_breakdown: BTreeMap<Method, MethodContribution>,
    pub suspicious_segments: Vec<SuspiciousSegment>,
    pub frame_scores: Vec<FrameScore>,
}

impl VideoReport {
    /// 最终分数，保留 3 位小数
    pub fn overall_score(&self) -> f64 {
        self.overall_analysis.assessment.confidence_score
    }
}

/// 第 `index` 帧距开头的秒数，帧率未知时为 0
pub fn timestamp_for(index: u64, fps: f64) -> f64 {
    if fps > 0.0 {
        index as f64 / fps
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VideoAggregator {
    weights: MethodWeights,
    frame_mean_weight: f64,
    temporal_weight: f64,
}

impl VideoAggregator {
    pub fn new(weights: MethodWeights, frame_mean_weight: f64, temporal_weight: f64) -> Self {
        Self {
            weights,
            frame_mean_weight,
            temporal_weight,
        }
    }

    /// `frames` 必须已按帧序号升序
    pub fn aggregate(&self, total_frames: u64, fps: f64, frames: Vec<FrameScore>) -> VideoReport {
        let scores: Vec<f64> = frames.iter().map(|f| f.score).collect();

        let temporal_coherence = temporal::coherence_score(&scores);
        let statistics = Self::statistics(&scores);
        let overall = if scores.is_empty() {
            0.0
        } else {
            (self.frame_mean_weight * statistics.mean_score + self.temporal_weight * temporal_coherence).clamp(0.0, 1.0)
        };

        let suspicious_segments = frames
            .iter()
            .filter(|f| f.score > SUSPICIOUS_FRAME_THRESHOLD)
            .take(MAX_SUSPICIOUS_SEGMENTS)
            .map(|f| SuspiciousSegment {
                frame_number: f.frame_number,
                timestamp_seconds: f.timestamp_seconds,
                confidence: f.score,
            })
            .collect();

        let duration = if fps > 0.0 { total_frames as f64 / fps } else { 0.0 };

        VideoReport {
            video_info: VideoInfo {
                total_frames,
                fps: round_to(fps, 2),
                duration_seconds: round_to(duration, 2),
                frames_analyzed: frames.len(),
            },
            overall_analysis: OverallAnalysis {
                assessment: Assessment::from_score(overall),
                temporal_coherence: round_to(temporal_coherence, 3),
            },
            statistics: ScoreStatistics {
                mean_score: round_to(statistics.mean_score, 3),
                max_score: round_to(statistics.max_score, 3),
                min_score: round_to(statistics.min_score, 3),
                score_variance: round_to(statistics.score_variance, 3),
                suspicious_frame_count: statistics.suspicious_frame_count,
            },
            method_breakdown: self.method_breakdown(&frames),
            suspicious_segments,
            frame_scores: frames,
        }
    }

    fn statistics(scores: &[f64]) -> ScoreStatistics {
        if scores.is_empty() {
            return ScoreStatistics::default();
        }

        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        ScoreStatistics {
            mean_score: mean,
            max_score: scores.iter().copied().fold(f64::MIN, f64::max),
            min_score: scores.iter().copied().fold(f64::MAX, f64::min),
            score_variance: variance,
            suspicious_frame_count: scores.iter().filter(|s| **s > SUSPICIOUS_FRAME_THRESHOLD).count(),
        }
    }

    /// 每个方法在其运行过的帧上取平均，从未运行的方法不出现
    fn method_breakdown(&self, frames: &[FrameScore]) -> BTreeMap<Method, MethodContribution> {
        let mut breakdown = BTreeMap::new();

        for method in Method::ALL {
            let present: Vec<f64> = frames
                .iter()
                .filter_map(|f| f.analysis.get(method).map(|r| r.score()))
                .collect();
            if present.is_empty() {
                continue;
            }

            let average = present.iter().sum::<f64>() / present.len() as f64;
            let weight = self.weights.weight(method);
            breakdown.insert(
                method,
                MethodContribution {
                    average_score: round_to(average, 3),
                    weight,
                    contribution: round_to(average * weight * 100.0, 2),
                },
            );
        }

        breakdown
    }
}

impl Default for VideoAggregator {
    fn default() -> Self {
        Self::new(MethodWeights::default(), 0.85, 0.15)
    }
}
