use super::error::DetectorError;
use super::frame::PixelBuffer;

/// 像素坐标下的人脸框
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 裁剪到帧内，完全在外时返回 `None`
    pub fn clipped(&self, frame_width: u32, frame_height: u32) -> Option<FaceRegion> {
        if self.x >= frame_width || self.y >= frame_height {
            return None;
        }
        let width = self.width.min(frame_width - self.x);
        let height = self.height.min(frame_height - self.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(FaceRegion::new(self.x, self.y, width, height))
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

pub trait FaceLocator: Send + Sync {
    fn locate(&self, frame: &PixelBuffer) -> Result<Vec<FaceRegion>, DetectorError>;
}

/// 每帧返回同样的人脸框
pub struct MockFaceLocator {
    regions: Vec<FaceRegion>,
    fail: bool,
}

impl MockFaceLocator {
    pub fn with_regions(regions: Vec<FaceRegion>) -> Self {
        Self {
            regions,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            regions: Vec::new(),
            fail: true,
        }
    }
}

impl FaceLocator for MockFaceLocator {
    fn locate(&self, frame: &PixelBuffer) -> Result<Vec<FaceRegion>, DetectorError> {
        if self.fail {
            return Err(DetectorError::FaceLocator("mock locator failure".to_string()));
        }
        Ok(self
            .regions
            .iter()
            .filter_map(|r| r.clipped(frame.width(), frame.height()))
            .collect())
    }
}

#[cfg(feature = "opencv")]
pub use haar::HaarFaceLocator;

#[cfg(feature = "opencv")]
mod haar {
    use super::{FaceLocator, FaceRegion};
    use crate::core::error::DetectorError;
    use crate::core::frame::PixelBuffer;
    use log::info;
    use opencv::core::{Mat, Rect, Size, Vector};
    use opencv::objdetect::CascadeClassifier;
    use opencv::prelude::*;
    use std::path::Path;
    use std::sync::Mutex;

    const SCALE_FACTOR: f64 = 1.3;
    const MIN_NEIGHBORS: i32 = 5;

    /// 正脸 Haar 级联（如 `haarcascade_frontalface_default.xml`）
    pub struct HaarFaceLocator {
        // detect_multi_scale 需要 &mut
        cascade: Mutex<CascadeClassifier>,
    }

    impl HaarFaceLocator {
        pub fn new<P: AsRef<Path>>(cascade_path: P) -> Result<Self, DetectorError> {
            let path = cascade_path.as_ref().to_string_lossy().to_string();
            info!("🔧 Loading Haar cascade from: {}", path);

            let cascade = CascadeClassifier::new(&path)
                .map_err(|e| DetectorError::FaceLocator(format!("Failed to load cascade: {}", e)))?;
            if cascade
                .empty()
                .map_err(|e| DetectorError::FaceLocator(e.to_string()))?
            {
                return Err(DetectorError::FaceLocator(format!("Cascade at {} is empty", path)));
            }

            Ok(Self {
                cascade: Mutex::new(cascade),
            })
        }
    }

    impl FaceLocator for HaarFaceLocator {
        fn locate(&self, frame: &PixelBuffer) -> Result<Vec<FaceRegion>, DetectorError> {
            if frame.is_empty() {
                return Ok(Vec::new());
            }

            let luma = frame.luma();
            let gray = Mat::new_rows_cols_with_data(frame.height() as i32, frame.width() as i32, &luma)
                .map_err(|e| DetectorError::FaceLocator(e.to_string()))?;

            let mut faces = Vector::<Rect>::new();
            let mut cascade = self
                .cascade
                .lock()
                .map_err(|e| DetectorError::FaceLocator(format!("Cascade lock poisoned: {}", e)))?;
            cascade
                .detect_multi_scale(
                    &*gray,
                    &mut faces,
                    SCALE_FACTOR,
                    MIN_NEIGHBORS,
                    0,
                    Size::default(),
                    Size::default(),
                )
                .map_err(|e| DetectorError::FaceLocator(e.to_string()))?;

            Ok(faces
                .iter()
                .filter(|r| r.width > 0 && r.height > 0)
                .filter_map(|r| {
                    FaceRegion::new(r.x.max(0) as u32, r.y.max(0) as u32, r.width as u32, r.height as u32)
                        .clipped(frame.width(), frame.height())
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_clipping() {
        let region = FaceRegion::new(90, 90, 20, 20);
        assert_eq!(region.clipped(100, 100), Some(FaceRegion::new(90, 90, 10, 10)));
        assert_eq!(FaceRegion::new(100, 0, 5, 5).clipped(100, 100), None);
    }

    #[test]
    fn test_empty_mock_locator() {
        let frame = PixelBuffer::filled(32, 32, [10, 20, 30]);
        assert!(MockFaceLocator::with_regions(Vec::new()).locate(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_mock_locator_clips_to_frame() {
        let locator = MockFaceLocator::with_regions(vec![
            FaceRegion::new(10, 10, 100, 100),
            FaceRegion::new(500, 500, 10, 10),
        ]);
        let frame = PixelBuffer::filled(64, 64, [0, 0, 0]);

        let faces = locator.locate(&frame).unwrap();
        assert_eq!(faces, vec![FaceRegion::new(10, 10, 54, 54)]);
    }
}
