pub mod aggregator;
pub mod pipeline;
pub mod sampler;
pub mod source;
pub mod temporal;

pub use aggregator::{FrameScore, VideoAggregator, VideoReport};
pub use pipeline::VideoPipeline;
pub use source::{FfmpegSource, FrameSource, MemorySource, StreamInfo};
