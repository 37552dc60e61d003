//! 无状态的单帧启发式检测，每个都把帧映射到 [0, 1] 的分数
//! 退化输入（平坦频谱、无人脸、过小的帧）记 0 分

pub mod color;
pub mod compression;
pub mod facial;
pub mod frequency;
