pub mod cancel;
pub mod classifier;
pub mod config;
pub mod detectors;
pub mod error;
pub mod faces;
pub mod frame;
pub mod method;
pub mod scorer;
pub mod verdict;
pub mod video;

pub use cancel::CancellationToken;
pub use classifier::{Classifier, ClassifierAdapter, ClassifierOutput};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, DetectorError};
pub use faces::{FaceLocator, FaceRegion};
pub use frame::PixelBuffer;
pub use method::{FrameAnalysis, Method, MethodResult, MethodWeights};
pub use scorer::FrameScorer;
pub use verdict::{Assessment, RiskTier, Verdict};
