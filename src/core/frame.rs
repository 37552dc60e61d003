use super::error::AnalysisError;
use image::DynamicImage;
use std::path::Path;

/// 解码后的帧，紧凑 RGB8 (height × width × 3)
///
/// 字段私有：所有构造路径都保证 `data.len() == width * height * 3`
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, AnalysisError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(AnalysisError::InvalidFrame(format!(
                "expected {} bytes for {}x{} RGB, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// 纯色帧
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_image(img: DynamicImage) -> Self {
        let rgb = img.into_rgb8();
        let (width, height) = rgb.dimensions();
        Self {
            width,
            height,
            data: rgb.into_raw(),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let img = image::open(path)?;
        Ok(Self::from_image(img))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 原始 RGB 字节
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let idx = (y * self.width as usize + x) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// 越界时忽略
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x >= self.width as usize || y >= self.height as usize {
            return;
        }
        let idx = (y * self.width as usize + x) * 3;
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    /// 填充 `[x0, x1) × [y0, y1)`，超出部分裁掉
    pub fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, rgb: [u8; 3]) {
        for y in y0..y1.min(self.height as usize) {
            for x in x0..x1.min(self.width as usize) {
                self.set_pixel(x, y, rgb);
            }
        }
    }

    /// BT.601 亮度，与 YCrCb 转换权重一致
    pub fn luma(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .map(|rgb| {
                let r = rgb[0] as u32;
                let g = rgb[1] as u32;
                let b = rgb[2] as u32;
                ((r * 299 + g * 587 + b * 114 + 500) / 1000) as u8
            })
            .collect()
    }

    /// `[x0, x1) × [y0, y1)` 内所有通道的均值，空区域返回 `None`
    pub fn region_mean(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> Option<f64> {
        let x1 = x1.min(self.width as usize);
        let y1 = y1.min(self.height as usize);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        let w = self.width as usize;
        let mut sum = 0u64;
        for y in y0..y1 {
            let row = &self.data[(y * w + x0) * 3..(y * w + x1) * 3];
            sum += row.iter().map(|&v| v as u64).sum::<u64>();
        }
        let count = (x1 - x0) * (y1 - y0) * 3;
        Some(sum as f64 / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_creation() {
        let data = vec![255u8; 100 * 100 * 3];
        let frame = PixelBuffer::new(100, 100, data).unwrap();

        assert_eq!(frame.width(), 100);
        assert_eq!(frame.height(), 100);
        assert_eq!(frame.pixel_count(), 10000);
        assert_eq!(frame.data().len(), 30000);
    }

    #[test]
    fn test_buffer_rejects_wrong_length() {
        let result = PixelBuffer::new(10, 10, vec![0u8; 10 * 10 * 4]);
        assert!(matches!(result, Err(AnalysisError::InvalidFrame(_))));
    }

    #[test]
    fn test_short_buffer_never_reaches_detectors() {
        // 16x16 需要 768 字节
        let result = PixelBuffer::new(16, 16, vec![0u8; 30]);
        assert!(matches!(result, Err(AnalysisError::InvalidFrame(_))));
    }

    #[test]
    fn test_pixel_writes_keep_length() {
        let mut frame = PixelBuffer::filled(4, 3, [0, 0, 0]);
        frame.set_pixel(3, 2, [7, 8, 9]);
        frame.set_pixel(4, 0, [1, 1, 1]);
        frame.fill_rect(0, 0, 10, 1, [5, 5, 5]);

        assert_eq!(frame.data().len(), 4 * 3 * 3);
        assert_eq!(frame.pixel(3, 2), [7, 8, 9]);
        assert_eq!(frame.pixel(3, 0), [5, 5, 5]);
        assert_eq!(frame.pixel(0, 1), [0, 0, 0]);
    }

    #[test]
    fn test_luma_of_gray_is_identity() {
        let frame = PixelBuffer::filled(4, 4, [128, 128, 128]);
        assert!(frame.luma().iter().all(|&y| y == 128));
    }

    #[test]
    fn test_region_mean() {
        let mut frame = PixelBuffer::filled(10, 10, [0, 0, 0]);
        frame.fill_rect(0, 0, 10, 5, [90, 90, 90]);

        assert_eq!(frame.region_mean(0, 0, 10, 5), Some(90.0));
        assert_eq!(frame.region_mean(0, 0, 10, 10), Some(45.0));
        assert_eq!(frame.region_mean(3, 3, 3, 8), None);
    }
}
