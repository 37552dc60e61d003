use super::aggregator::{timestamp_for, FrameScore, VideoAggregator, VideoReport};
use super::sampler::sample_indices;
use super::source::FrameSource;
use crate::core::cancel::CancellationToken;
use crate::core::error::AnalysisError;
use crate::core::scorer::FrameScorer;
use crate::core::verdict::round_to;
use log::{debug, error, info, warn};
use rayon::prelude::*;

/// 单个视频的 采样 → 解码 → 打分 → 聚合
///
/// 按批顺序解码，每批并行打分，同时最多存活 `batch_size` 帧
pub struct VideoPipeline<'a> {
    scorer: &'a FrameScorer,
    aggregator: VideoAggregator,
    batch_size: usize,
}

impl<'a> VideoPipeline<'a> {
    pub fn new(scorer: &'a FrameScorer, aggregator: VideoAggregator, batch_size: usize) -> Self {
        Self {
            scorer,
            aggregator,
            batch_size: batch_size.max(1),
        }
    }

    pub fn run(
        &self,
        source: &mut dyn FrameSource,
        sample_count: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<VideoReport, AnalysisError> {
        let total_frames = source.total_frames();
        let fps = source.fps();
        let indices = sample_indices(total_frames, sample_count);

        info!(
            "🎬 Analyzing {} of {} frames ({:.2} fps, batch {})",
            indices.len(),
            total_frames,
            fps,
            self.batch_size
        );

        let mut frames: Vec<FrameScore> = Vec::with_capacity(indices.len());

        for chunk in indices.chunks(self.batch_size) {
            let mut batch = Vec::with_capacity(chunk.len());
            for &index in chunk {
                if cancel.is_some_and(|c| c.is_cancelled()) {
                    info!("🛑 Cancelled after {} frames", frames.len());
                    return Err(AnalysisError::Cancelled {
                        frames_completed: frames.len(),
                    });
                }
                match source.read_frame(index)? {
                    Some(buffer) => batch.push((index, buffer)),
                    None => warn!("⚠️ Frame {} unreadable, skipping", index),
                }
            }

            let scored: Vec<FrameScore> = batch
                .par_iter()
                .map(|(index, buffer)| {
                    let (analysis, score) = self.scorer.evaluate(buffer);
                    FrameScore {
                        frame_number: *index,
                        timestamp_seconds: round_to(timestamp_for(*index, fps), 2),
                        score,
                        analysis,
                    }
                })
                .collect();
            frames.extend(scored);

            debug!("📊 {}/{} frames analyzed", frames.len(), indices.len());
        }

        if frames.is_empty() {
            error!("❌ No frame decoded out of {} sampled", indices.len());
            return Err(AnalysisError::NoFramesDecoded {
                total_frames,
                sampled: indices.len(),
            });
        }

        let report = self.aggregator.aggregate(total_frames, fps, frames);
        info!(
            "✅ Video analysis done: {:.2}% ({})",
            report.overall_analysis.assessment.probability_percent,
            report.overall_analysis.assessment.verdict
        );
        Ok(report)
    }
}
