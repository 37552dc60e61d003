pub mod report;

pub use report::{Capabilities, ImageAnalysis, MethodCapability};
