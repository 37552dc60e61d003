pub mod analyzer;
pub mod models;

pub use analyzer::DeepfakeAnalyzer;
