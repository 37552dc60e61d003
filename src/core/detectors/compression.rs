//! 亮度平面上的 8×8 块效应密度

use crate::core::frame::PixelBuffer;
use crate::core::method::{MethodDetail, MethodResult};

const BLOCK_SIZE: usize = 8;
/// 块边界平均跳变超过此值视为可见
const VISIBLE_STEP: f64 = 15.0;
/// 分数饱和时的块效应比例
const SATURATION: f64 = 0.1;
const SUSPICIOUS_ABOVE: f64 = 0.5;

pub fn analyze(frame: &PixelBuffer) -> MethodResult {
    let ratio = artifact_ratio(&frame.luma(), frame.width() as usize, frame.height() as usize);
    let score = (ratio / SATURATION).min(1.0);
    let suspicious = score > SUSPICIOUS_ABOVE;
    let label = if suspicious {
        "Compression artifacts detected"
    } else {
        "Normal compression pattern"
    };

    MethodResult::new(score, suspicious, MethodDetail::Compression { artifact_density: ratio }, label)
}

/// 被标记的块下边界数 / 参与统计的块数。
/// 最后一行/列的块跳过，保证每条边界下方都有像素
fn artifact_ratio(y_plane: &[u8], w: usize, h: usize) -> f64 {
    if w <= BLOCK_SIZE || h <= BLOCK_SIZE {
        return 0.0;
    }

    let mut flagged = 0usize;
    let mut blocks = 0usize;

    for i in (0..h - BLOCK_SIZE).step_by(BLOCK_SIZE) {
        let edge_row = (i + BLOCK_SIZE) * w;
        let inner_row = (i + BLOCK_SIZE - 1) * w;

        for j in (0..w - BLOCK_SIZE).step_by(BLOCK_SIZE) {
            let diff_sum: u32 = (j..j + BLOCK_SIZE)
                .map(|x| (y_plane[edge_row + x] as i32 - y_plane[inner_row + x] as i32).unsigned_abs())
                .sum();
            let boundary_diff = diff_sum as f64 / BLOCK_SIZE as f64;

            if boundary_diff > VISIBLE_STEP {
                flagged += 1;
            }
            blocks += 1;
        }
    }

    if blocks == 0 {
        0.0
    } else {
        flagged as f64 / blocks as f64
    }
}
