//! 人脸区域一致性：人脸框内的边缘密度，以及框与上下细条之间的亮度跳变

use crate::core::error::DetectorError;
use crate::core::faces::{FaceLocator, FaceRegion};
use crate::core::frame::PixelBuffer;
use crate::core::method::{MethodDetail, MethodResult};

const EDGE_DENSITY_HIGH: f64 = 0.15;
const EDGE_DENSITY_LOW: f64 = 0.03;
const EDGE_PENALTY: f64 = 0.3;
const BOUNDARY_STRIP: u32 = 5;
const BOUNDARY_STEP: f64 = 50.0;
const BOUNDARY_PENALTY: f64 = 0.2;
const SUSPICIOUS_ABOVE: f64 = 0.4;

const CANNY_LOW: i32 = 100;
const CANNY_HIGH: i32 = 200;

pub fn analyze(frame: &PixelBuffer, locator: &dyn FaceLocator) -> Result<MethodResult, DetectorError> {
    let faces = locator.locate(frame)?;

    if faces.is_empty() {
        return Ok(MethodResult::new(
            0.0,
            false,
            MethodDetail::Facial {
                faces_detected: 0,
                notes: Vec::new(),
            },
            "No faces detected",
        ));
    }

    let mut accumulator = 0.0;
    let mut notes = Vec::new();

    for face in &faces {
        let Some(face) = face.clipped(frame.width(), frame.height()) else {
            continue;
        };

        let density = edge_density(frame, &face);
        if !(EDGE_DENSITY_LOW..=EDGE_DENSITY_HIGH).contains(&density) {
            accumulator += EDGE_PENALTY;
            notes.push("Unusual edge density detected".to_string());
        }

        if let Some(step) = boundary_step(frame, &face) {
            if step > BOUNDARY_STEP {
                accumulator += BOUNDARY_PENALTY;
                notes.push("Sharp boundary transition detected".to_string());
            }
        }
    }

    // 先平均再截断
    let score = (accumulator / faces.len() as f64).min(1.0);
    let suspicious = score > SUSPICIOUS_ABOVE;
    let label = if notes.is_empty() {
        "Normal facial characteristics".to_string()
    } else {
        notes.join("; ")
    };

    Ok(MethodResult::new(
        score,
        suspicious,
        MethodDetail::Facial {
            faces_detected: faces.len(),
            notes,
        },
        label,
    ))
}

/// 人脸框内边缘像素占比
fn edge_density(frame: &PixelBuffer, face: &FaceRegion) -> f64 {
    let area = face.area();
    if area == 0 {
        return 0.0;
    }

    let w = face.width as usize;
    let h = face.height as usize;
    let mut gray = Vec::with_capacity(area);
    for y in face.y as usize..face.y as usize + h {
        for x in face.x as usize..face.x as usize + w {
            let [r, g, b] = frame.pixel(x, y).map(u32::from);
            gray.push(((r * 299 + g * 587 + b * 114 + 500) / 1000) as u8);
        }
    }

    let edges = canny(&gray, w, h, CANNY_LOW, CANNY_HIGH);
    edges.iter().filter(|&&e| e).count() as f64 / area as f64
}

/// |mean(人脸) - mean(上条, 下条)|，上下条都存在时才有值
fn boundary_step(frame: &PixelBuffer, face: &FaceRegion) -> Option<f64> {
    let x0 = face.x as usize;
    let x1 = (face.x + face.width) as usize;
    let top = face.y as usize;
    let bottom = (face.y + face.height) as usize;

    let above = frame.region_mean(x0, top.saturating_sub(BOUNDARY_STRIP as usize), x1, top)?;
    let below = frame.region_mean(x0, bottom, x1, bottom + BOUNDARY_STRIP as usize)?;
    let inside = frame.region_mean(x0, top, x1, bottom)?;

    Some((inside - (above + below) / 2.0).abs())
}

/// Canny 边缘：3×3 Sobel、L1 幅值、非极大值抑制与滞后阈值。
/// 边框像素不算边缘
fn canny(gray: &[u8], w: usize, h: usize, low: i32, high: i32) -> Vec<bool> {
    let mut edges = vec![false; w * h];
    if w < 3 || h < 3 {
        return edges;
    }

    let px = |x: usize, y: usize| gray[y * w + x] as i32;
    let mut gx = vec![0i32; w * h];
    let mut gy = vec![0i32; w * h];
    let mut mag = vec![0i32; w * h];

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let dx = (px(x + 1, y - 1) + 2 * px(x + 1, y) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2 * px(x - 1, y) + px(x - 1, y + 1));
            let dy = (px(x - 1, y + 1) + 2 * px(x, y + 1) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2 * px(x, y - 1) + px(x + 1, y - 1));
            let i = y * w + x;
            gx[i] = dx;
            gy[i] = dy;
            mag[i] = dx.abs() + dy.abs();
        }
    }

    // 0 = 无, 1 = 弱候选, 2 = 强
    let mut class = vec![0u8; w * h];
    let mut stack = Vec::new();
    // tan(22.5°)、tan(67.5°)，1/1024 定点
    const TAN_22: i64 = 424;
    const TAN_67: i64 = 2472;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let m = mag[i];
            if m <= low {
                continue;
            }

            let ax = gx[i].abs() as i64;
            let ay = gy[i].abs() as i64;
            let (a, b) = if ay * 1024 <= ax * TAN_22 {
                (mag[i - 1], mag[i + 1])
            } else if ay * 1024 >= ax * TAN_67 {
                (mag[i - w], mag[i + w])
            } else if (gx[i] < 0) == (gy[i] < 0) {
                (mag[i - w - 1], mag[i + w + 1])
            } else {
                (mag[i - w + 1], mag[i + w - 1])
            };

            if m > a && m >= b {
                if m > high {
                    class[i] = 2;
                    edges[i] = true;
                    stack.push(i);
                } else {
                    class[i] = 1;
                }
            }
        }
    }

    while let Some(i) = stack.pop() {
        let (x, y) = (i % w, i / w);
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let n = ny * w + nx;
                if class[n] == 1 && !edges[n] {
                    edges[n] = true;
                    stack.push(n);
                }
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::faces::MockFaceLocator;

    #[test]
    fn test_no_faces_scores_zero() {
        let frame = PixelBuffer::filled(64, 64, [120, 120, 120]);
        let result = analyze(&frame, &MockFaceLocator::with_regions(Vec::new())).unwrap();

        assert_eq!(result.score(), 0.0);
        assert!(!result.suspicious());
        assert_eq!(result.label(), "No faces detected");
    }

    #[test]
    fn test_flat_face_has_low_edge_density() {
        // 与周围同色的平坦框：只触发边缘密度规则
        let frame = PixelBuffer::filled(64, 64, [120, 120, 120]);
        let locator = MockFaceLocator::with_regions(vec![FaceRegion::new(16, 16, 32, 32)]);
        let result = analyze(&frame, &locator).unwrap();

        assert!((result.score() - 0.3).abs() < 1e-9);
        assert!(!result.suspicious());
        assert_eq!(result.label(), "Unusual edge density detected");
    }

    #[test]
    fn test_bright_face_on_dark_background_is_suspicious() {
        let mut frame = PixelBuffer::filled(64, 64, [10, 10, 10]);
        frame.fill_rect(16, 16, 48, 48, [200, 200, 200]);
        let locator = MockFaceLocator::with_regions(vec![FaceRegion::new(16, 16, 32, 32)]);
        let result = analyze(&frame, &locator).unwrap();

        assert!((result.score() - 0.5).abs() < 1e-9);
        assert!(result.suspicious());
        match result.detail() {
            MethodDetail::Facial { faces_detected, notes } => {
                assert_eq!(*faces_detected, 1);
                assert_eq!(notes.len(), 2);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_score_is_averaged_over_faces() {
        let mut frame = PixelBuffer::filled(128, 64, [10, 10, 10]);
        frame.fill_rect(8, 16, 40, 48, [200, 200, 200]);
        let locator = MockFaceLocator::with_regions(vec![
            FaceRegion::new(8, 16, 32, 32),
            // 贴着上边缘，不做边界比较
            FaceRegion::new(80, 0, 32, 32),
        ]);
        let result = analyze(&frame, &locator).unwrap();

        // (0.3 + 0.2 + 0.3) / 2
        assert!((result.score() - 0.4).abs() < 1e-9);
        assert!(!result.suspicious());
    }

    #[test]
    fn test_locator_failure_propagates() {
        let frame = PixelBuffer::filled(16, 16, [0, 0, 0]);
        assert!(analyze(&frame, &MockFaceLocator::failing()).is_err());
    }

    #[test]
    fn test_canny_finds_step_edge() {
        let (w, h) = (16, 16);
        let mut gray = vec![0u8; w * h];
        for y in 0..h {
            for x in 8..w {
                gray[y * w + x] = 255;
            }
        }
        let edges = canny(&gray, w, h, CANNY_LOW, CANNY_HIGH);
        let count = edges.iter().filter(|&&e| e).count();

        assert!(count > 0);
        // 细响应：沿跳变最多两列
        assert!(count <= 2 * (h - 2));
        assert!(canny(&vec![77u8; w * h], w, h, CANNY_LOW, CANNY_HIGH).iter().all(|e| !e));
    }
}
