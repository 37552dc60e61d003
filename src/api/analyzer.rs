//! 深度伪造分析器

use crate::api::models::{Capabilities, ImageAnalysis, MethodCapability};
use crate::core::cancel::CancellationToken;
use crate::core::classifier::ClassifierAdapter;
use crate::core::config::AnalysisConfig;
use crate::core::error::AnalysisError;
use crate::core::faces::FaceLocator;
use crate::core::frame::PixelBuffer;
use crate::core::scorer::FrameScorer;
use crate::core::verdict::Assessment;
use crate::core::video::{FfmpegSource, FrameSource, VideoAggregator, VideoPipeline, VideoReport};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

/// 深度伪造分析器 - 多方法加权打分
///
/// ```ignore
/// let analyzer = DeepfakeAnalyzer::with_config(AnalysisConfig::default(), ClassifierAdapter::unavailable("no model"))?;
/// let image = analyzer.analyze_image_file("face.jpg")?;
/// let mut video = FfmpegSource::open("clip.mp4")?;
/// let report = analyzer.analyze_video(&mut video, None)?;
/// ```
pub struct DeepfakeAnalyzer {
    config: AnalysisConfig,
    scorer: FrameScorer,
}

impl DeepfakeAnalyzer {
    /// 使用显式注入的分类器与人脸定位器创建
    ///
    /// `faces` 为 `None` 时不做人脸一致性检测，该方法不出现在结果中
    pub fn create(
        config: AnalysisConfig,
        classifier: ClassifierAdapter,
        faces: Option<Arc<dyn FaceLocator>>,
    ) -> Result<Self, AnalysisError> {
        crate::init_logging();
        config.validate()?;

        if let ClassifierAdapter::Unavailable { reason } = &classifier {
            warn!("⚠️ Classifier unavailable ({}), running heuristics only", reason);
        }
        info!(
            "🔍 DeepfakeAnalyzer: created (classifier: {}, faces: {}, samples: {}, batch: {})",
            classifier.is_available(),
            faces.is_some(),
            config.sample_count,
            config.batch_size()
        );

        let scorer = FrameScorer::new(config.weights, classifier, faces);
        Ok(Self { config, scorer })
    }

    /// 人脸定位器由配置决定（需要 `opencv` feature）
    pub fn with_config(config: AnalysisConfig, classifier: ClassifierAdapter) -> Result<Self, AnalysisError> {
        let faces = default_face_locator(&config)?;
        Self::create(config, classifier, faces)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// 分析单帧图片
    pub fn analyze_image(&self, frame: &PixelBuffer) -> ImageAnalysis {
        let (analysis, score) = self.scorer.evaluate(frame);
        let assessment = Assessment::from_score(score);
        info!(
            "🖼️ Image {}x{}: {} methods, {:.2}% ({})",
            frame.width(),
            frame.height(),
            analysis.len(),
            assessment.probability_percent,
            assessment.verdict
        );
        ImageAnalysis {
            analysis,
            score,
            assessment,
        }
    }

    pub fn analyze_image_file<P: AsRef<Path>>(&self, path: P) -> Result<ImageAnalysis, AnalysisError> {
        let frame = PixelBuffer::open(path)?;
        Ok(self.analyze_image(&frame))
    }

    /// 分析视频；`sample_count` 为空时使用配置值
    pub fn analyze_video(
        &self,
        source: &mut dyn FrameSource,
        sample_count: Option<usize>,
    ) -> Result<VideoReport, AnalysisError> {
        self.run_video(source, sample_count, None)
    }

    /// 可取消的视频分析，在每帧解码前检查
    pub fn analyze_video_with_cancel(
        &self,
        source: &mut dyn FrameSource,
        sample_count: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<VideoReport, AnalysisError> {
        self.run_video(source, sample_count, Some(cancel))
    }

    /// 通过 ffprobe/ffmpeg 打开视频文件并分析
    pub fn analyze_video_file<P: AsRef<Path>>(
        &self,
        path: P,
        sample_count: Option<usize>,
    ) -> Result<VideoReport, AnalysisError> {
        let mut source = FfmpegSource::open(path)?;
        self.analyze_video(&mut source, sample_count)
    }

    /// 方法列表、权重、分类器与人脸检测状态
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            methods: self
                .scorer
                .weights()
                .entries()
                .into_iter()
                .map(|(method, weight)| MethodCapability { method, weight })
                .collect(),
            classifier_available: self.scorer.classifier_available(),
            face_detection_available: self.scorer.face_detection_available(),
            sample_count: self.config.sample_count,
        }
    }

    fn run_video(
        &self,
        source: &mut dyn FrameSource,
        sample_count: Option<usize>,
        cancel: Option<&CancellationToken>,
    ) -> Result<VideoReport, AnalysisError> {
        let sample_count = sample_count.unwrap_or(self.config.sample_count);
        if sample_count == 0 {
            return Err(AnalysisError::InvalidConfig("sample_count must be at least 1".into()));
        }

        let aggregator = VideoAggregator::new(
            self.config.weights,
            self.config.frame_mean_weight,
            self.config.temporal_weight,
        );
        VideoPipeline::new(&self.scorer, aggregator, self.config.batch_size()).run(source, sample_count, cancel)
    }
}

impl Drop for DeepfakeAnalyzer {
    fn drop(&mut self) {
        info!("🗑️ DeepfakeAnalyzer: released");
    }
}

fn default_face_locator(config: &AnalysisConfig) -> Result<Option<Arc<dyn FaceLocator>>, AnalysisError> {
    match &config.face_cascade_path {
        Some(path) => cascade_locator(path).map(Some),
        None => {
            warn!("⚠️ No face cascade configured, facial consistency disabled");
            Ok(None)
        }
    }
}

#[cfg(feature = "opencv")]
fn cascade_locator(path: &Path) -> Result<Arc<dyn FaceLocator>, AnalysisError> {
    let locator = crate::core::faces::HaarFaceLocator::new(path)
        .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
    Ok(Arc::new(locator))
}

#[cfg(not(feature = "opencv"))]
fn cascade_locator(path: &Path) -> Result<Arc<dyn FaceLocator>, AnalysisError> {
    Err(AnalysisError::InvalidConfig(format!(
        "face cascade {} needs the opencv feature",
        path.display()
    )))
}
