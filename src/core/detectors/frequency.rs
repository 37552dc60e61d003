//! 频域异常：外圈高频带在幅度谱中的占比

use crate::core::frame::PixelBuffer;
use crate::core::method::{MethodDetail, MethodResult};
use rustdct::rustfft::num_complex::Complex;
use rustdct::rustfft::FftPlanner;

/// 中心化频谱外圈视为高频的比例
const HIGH_BAND: f64 = 0.3;
const NORMAL_LOW: f64 = 0.15;
const NORMAL_HIGH: f64 = 0.40;
/// 上侧斜坡饱和点
const SATURATION_HIGH: f64 = 0.65;
const SUSPICIOUS_ABOVE: f64 = 0.5;

pub fn analyze(frame: &PixelBuffer) -> MethodResult {
    match high_frequency_ratio(frame) {
        Some(ratio) => {
            let score = anomaly_score(ratio);
            let suspicious = score > SUSPICIOUS_ABOVE;
            let label = if suspicious {
                "Unusual frequency distribution detected"
            } else {
                "Normal frequency distribution"
            };
            MethodResult::new(score, suspicious, MethodDetail::Frequency { high_freq_ratio: ratio }, label)
        }
        None => MethodResult::new(
            0.0,
            false,
            MethodDetail::Frequency { high_freq_ratio: 0.0 },
            "No spectral content beyond DC",
        ),
    }
}

/// 与正常区间 [0.15, 0.40] 的分段线性距离
pub fn anomaly_score(ratio: f64) -> f64 {
    if ratio > NORMAL_HIGH {
        ((ratio - NORMAL_HIGH) / (SATURATION_HIGH - NORMAL_HIGH)).min(1.0)
    } else if ratio < NORMAL_LOW {
        ((NORMAL_LOW - ratio) / NORMAL_LOW).min(1.0)
    } else {
        0.0
    }
}

/// 除直流分量外没有能量时返回 `None`
fn high_frequency_ratio(frame: &PixelBuffer) -> Option<f64> {
    if frame.is_empty() {
        return None;
    }

    let w = frame.width() as usize;
    let h = frame.height() as usize;
    let magnitude = magnitude_spectrum(&frame.luma(), w, h);

    let row_lo = (h as f64 * HIGH_BAND) as usize;
    let row_hi = (h as f64 * (1.0 - HIGH_BAND)) as usize;
    let col_lo = (w as f64 * HIGH_BAND) as usize;
    let col_hi = (w as f64 * (1.0 - HIGH_BAND)) as usize;

    let mut total = 0.0;
    let mut high = 0.0;
    for r in 0..h {
        // 直流移到中心后的坐标
        let sr = (r + h / 2) % h;
        let row_in_band = sr < row_lo || sr >= row_hi;
        for c in 0..w {
            let sc = (c + w / 2) % w;
            let m = magnitude[r * w + c];
            total += m;
            if row_in_band || sc < col_lo || sc >= col_hi {
                high += m;
            }
        }
    }

    let ac = total - magnitude[0];
    if total <= 0.0 || ac <= total * 1e-9 {
        return None;
    }
    Some(high / total)
}

/// |FFT2(gray)|，行优先，未移位
fn magnitude_spectrum(gray: &[u8], w: usize, h: usize) -> Vec<f64> {
    let mut planner = FftPlanner::<f64>::new();

    let mut rows: Vec<Complex<f64>> = gray.iter().map(|&v| Complex::new(v as f64, 0.0)).collect();
    planner.plan_fft_forward(w).process(&mut rows);

    let mut cols = vec![Complex::new(0.0, 0.0); w * h];
    for r in 0..h {
        for c in 0..w {
            cols[c * h + r] = rows[r * w + c];
        }
    }
    planner.plan_fft_forward(h).process(&mut cols);

    let mut magnitude = vec![0.0; w * h];
    for c in 0..w {
        for r in 0..h {
            magnitude[r * w + c] = cols[c * h + r].norm();
        }
    }
    magnitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_frame_is_degenerate() {
        let result = analyze(&PixelBuffer::filled(64, 48, [128, 128, 128]));
        assert_eq!(result.score(), 0.0);
        assert!(!result.suspicious());
    }

    #[test]
    fn test_black_frame_is_degenerate() {
        let result = analyze(&PixelBuffer::filled(16, 16, [0, 0, 0]));
        assert_eq!(result.score(), 0.0);
        assert!(!result.suspicious());
    }

    #[test]
    fn test_checkerboard_splits_energy_between_dc_and_nyquist() {
        // 直流与 Nyquist 角幅度相同，只有后者在外圈
        let mut frame = PixelBuffer::filled(32, 32, [0, 0, 0]);
        for y in 0..32 {
            for x in 0..32 {
                if (x + y) % 2 == 0 {
                    frame.set_pixel(x, y, [255, 255, 255]);
                }
            }
        }
        let result = analyze(&frame);
        match result.detail() {
            MethodDetail::Frequency { high_freq_ratio } => {
                assert!((*high_freq_ratio - 0.5).abs() < 1e-6);
            }
            other => panic!("unexpected detail {:?}", other),
        }
        assert!((result.score() - 0.4).abs() < 1e-6);
        assert!(!result.suspicious());
    }

    #[test]
    fn test_anomaly_score_bands() {
        assert_eq!(anomaly_score(0.15), 0.0);
        assert_eq!(anomaly_score(0.30), 0.0);
        assert_eq!(anomaly_score(0.40), 0.0);
        assert!((anomaly_score(0.525) - 0.5).abs() < 1e-9);
        assert_eq!(anomaly_score(0.65), 1.0);
        assert_eq!(anomaly_score(0.9), 1.0);
        assert!((anomaly_score(0.075) - 0.5).abs() < 1e-9);
        assert_eq!(anomaly_score(0.0), 1.0);
    }

    #[test]
    fn test_spectrum_of_impulse_is_flat() {
        let mut gray = vec![0u8; 8 * 4];
        gray[0] = 10;
        let mag = magnitude_spectrum(&gray, 8, 4);
        assert!(mag.iter().all(|&m| (m - 10.0).abs() < 1e-9));
    }
}
