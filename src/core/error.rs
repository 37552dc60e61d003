use thiserror::Error;

/// 调用级错误，整个分析中止
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Video source could not be opened: {0}")]
    SourceUnreadable(String),
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Analysis cancelled after {frames_completed} frames")]
    Cancelled { frames_completed: usize },
    #[error("No frame could be decoded ({sampled} sampled of {total_frames})")]
    NoFramesDecoded { total_frames: u64, sampled: usize },
}

/// 方法级错误，不会逃出单帧分析，对应方法直接略过
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Face locator failed: {0}")]
    FaceLocator(String),
    #[error("Classifier failed: {0}")]
    Classifier(String),
    #[error("Invalid classifier output: {0}")]
    InvalidOutput(String),
}
