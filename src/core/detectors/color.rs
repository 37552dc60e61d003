//! 色彩平衡异常：8 位 Lab（L 缩放到 0..255，a/b 偏移 128）
#![allow(clippy::excessive_precision)]

use crate::core::frame::PixelBuffer;
use crate::core::method::{MethodDetail, MethodResult};

const SATURATION: f64 = 30.0;
const SUSPICIOUS_ABOVE: f64 = 0.6;

/// sRGB (D65) → XYZ
const SRGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
];
const D65_WHITE: [f64; 3] = [0.950456, 1.0, 1.088754];

pub fn analyze(frame: &PixelBuffer) -> MethodResult {
    let balance = color_balance(frame);
    let score = (balance / SATURATION).min(1.0);
    let suspicious = score > SUSPICIOUS_ABOVE;
    let label = if suspicious {
        "Unusual color distribution"
    } else {
        "Normal color characteristics"
    };

    MethodResult::new(score, suspicious, MethodDetail::Color { color_balance: balance }, label)
}

/// 三个通道标准差之间的标准差
fn color_balance(frame: &PixelBuffer) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }

    let mut stats = [RunningStats::default(); 3];
    for rgb in frame.data().chunks_exact(3) {
        let lab = srgb_to_lab([rgb[0], rgb[1], rgb[2]]);
        for (s, v) in stats.iter_mut().zip(lab) {
            s.push(v);
        }
    }

    let deviations = [stats[0].std_dev(), stats[1].std_dev(), stats[2].std_dev()];
    let mean = deviations.iter().sum::<f64>() / 3.0;
    let variance = deviations.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / 3.0;
    variance.sqrt()
}

/// 与 8 位 Lab 图像一致：四舍五入并饱和到 0..=255
fn srgb_to_lab(rgb: [u8; 3]) -> [f64; 3] {
    let linear = rgb.map(|c| {
        let v = c as f64 / 255.0;
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    });

    let mut xyz = [0.0; 3];
    for (i, row) in SRGB_TO_XYZ.iter().enumerate() {
        xyz[i] = (row[0] * linear[0] + row[1] * linear[1] + row[2] * linear[2]) / D65_WHITE[i];
    }

    let f = |t: f64| {
        if t > 0.008856 {
            t.cbrt()
        } else {
            7.787 * t + 16.0 / 116.0
        }
    };
    let (fx, fy, fz) = (f(xyz[0]), f(xyz[1]), f(xyz[2]));

    let l = if xyz[1] > 0.008856 {
        116.0 * fy - 16.0
    } else {
        903.3 * xyz[1]
    };

    [
        l * 255.0 / 100.0,
        500.0 * (fx - fy) + 128.0,
        200.0 * (fy - fz) + 128.0,
    ]
    .map(|v| v.round().clamp(0.0, 255.0))
}

/// 单遍总体均值/方差 (Welford)
#[derive(Debug, Default, Clone, Copy)]
struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn std_dev(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }
}
