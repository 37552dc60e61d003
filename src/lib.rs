//! 图片与视频采样帧的多方法深度伪造打分

pub mod api;
pub mod core;

pub use api::models::{Capabilities, ImageAnalysis};
pub use api::DeepfakeAnalyzer;
pub use core::video::{FfmpegSource, FrameSource, MemorySource, VideoReport};
pub use core::{AnalysisConfig, AnalysisError, CancellationToken, ClassifierAdapter, PixelBuffer};

pub fn init_logging() {
    #[cfg(target_os = "android")]
    {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("deepfake_lib"),
        );
    }

    #[cfg(not(target_os = "android"))]
    {
        // 日志后端由宿主程序安装
    }
}
