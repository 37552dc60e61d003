//! 解码边界：能报告长度并按序号返回解码帧的来源

use crate::core::error::AnalysisError;
use crate::core::frame::PixelBuffer;
use log::{debug, info};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

pub trait FrameSource {
    fn total_frames(&self) -> u64;

    /// 每秒帧数，未知时为 0
    fn fps(&self) -> f64;

    /// 解码单帧。`Ok(None)` 表示该帧不可读，跳过即可；`Err` 中止整个分析
    fn read_frame(&mut self, index: u64) -> Result<Option<PixelBuffer>, AnalysisError>;
}

/// 内存中的已解码帧，`None` 等同于不可读帧
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    frames: Vec<Option<PixelBuffer>>,
    fps: f64,
}

impl MemorySource {
    pub fn new(frames: Vec<PixelBuffer>, fps: f64) -> Self {
        Self {
            frames: frames.into_iter().map(Some).collect(),
            fps,
        }
    }

    pub fn with_gaps(frames: Vec<Option<PixelBuffer>>, fps: f64) -> Self {
        Self { frames, fps }
    }
}

impl FrameSource for MemorySource {
    fn total_frames(&self) -> u64 {
        self.frames.len() as u64
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn read_frame(&mut self, index: u64) -> Result<Option<PixelBuffer>, AnalysisError> {
        Ok(usize::try_from(index)
            .ok()
            .and_then(|i| self.frames.get(i))
            .and_then(|f| f.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    nb_frames: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// ffprobe 报告的第一条视频流属性
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub total_frames: u64,
    pub fps: f64,
}

impl StreamInfo {
    /// 帧数优先取 `nb_frames`，否则用 流时长 或 容器时长 乘以帧率
    ///
    /// 无法得到任何帧数时视为不可读
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let parsed: FfprobeOutput = serde_json::from_str(json)?;
        let format_duration = parsed.format.and_then(|f| f.duration);
        let stream = parsed
            .streams
            .into_iter()
            .next()
            .ok_or_else(|| AnalysisError::SourceUnreadable("no video stream".into()))?;

        let (width, height) = match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(AnalysisError::SourceUnreadable("video stream has no frame size".into())),
        };

        let fps = stream
            .avg_frame_rate
            .as_deref()
            .and_then(parse_rate)
            .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
            .unwrap_or(0.0);

        let counted = stream
            .nb_frames
            .as_deref()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&n| n > 0);
        let total_frames = match counted {
            Some(n) => n,
            None => {
                let duration = stream
                    .duration
                    .as_deref()
                    .and_then(parse_duration)
                    .or_else(|| format_duration.as_deref().and_then(parse_duration));
                match duration {
                    Some(d) if fps > 0.0 => (d * fps).round() as u64,
                    _ => 0,
                }
            }
        };

        if total_frames == 0 {
            return Err(AnalysisError::SourceUnreadable(
                "frame count unavailable from stream or container".into(),
            ));
        }

        Ok(Self {
            width,
            height,
            total_frames,
            fps,
        })
    }
}

/// "30000/1001" 或 "25" → 每秒帧数
fn parse_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

fn parse_duration(duration: &str) -> Option<f64> {
    duration
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// 解码第 `index` 帧的 ffmpeg 参数
///
/// 帧率已知时先在输入端按时间定位，只解码目标附近的一段；
/// 帧率未知时退回逐帧计数的 select 过滤器
fn decode_args(path: &Path, index: u64, fps: f64) -> Vec<OsString> {
    let input = [OsString::from("-i"), path.as_os_str().to_owned()];
    let mut args = vec![OsString::from("-v"), OsString::from("error")];
    if fps > 0.0 {
        // 后退半帧，避免浮点误差跳过目标帧
        let seconds = (index as f64 - 0.5).max(0.0) / fps;
        args.push(OsString::from("-ss"));
        args.push(OsString::from(format!("{:.6}", seconds)));
        args.extend(input);
    } else {
        args.extend(input);
        args.push(OsString::from("-vf"));
        args.push(OsString::from(format!("select=eq(n\\,{})", index)));
    }
    args.extend(
        ["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"]
            .into_iter()
            .map(OsString::from),
    );
    args
}

/// 调用 `ffprobe` 与 `ffmpeg` 可执行文件解码
pub struct FfmpegSource {
    path: PathBuf,
    info: StreamInfo,
}

impl FfmpegSource {
    /// 打开时先读取流信息，失败即中止分析
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(AnalysisError::SourceUnreadable(format!("{} does not exist", path.display())));
        }

        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,nb_frames,r_frame_rate,avg_frame_rate,duration:format=duration",
                "-of",
                "json",
            ])
            .arg(&path)
            .output()
            .map_err(|e| AnalysisError::SourceUnreadable(format!("ffprobe could not run: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnalysisError::SourceUnreadable(format!(
                "ffprobe rejected {}: {}",
                path.display(),
                stderr.trim()
            )));
        }

        let info = StreamInfo::from_json(&String::from_utf8_lossy(&output.stdout))?;
        info!(
            "📼 Opened {}: {}x{}, {} frames @ {:.2} fps",
            path.display(),
            info.width,
            info.height,
            info.total_frames,
            info.fps
        );

        Ok(Self { path, info })
    }

    pub fn stream_info(&self) -> &StreamInfo {
        &self.info
    }
}

impl FrameSource for FfmpegSource {
    fn total_frames(&self) -> u64 {
        self.info.total_frames
    }

    fn fps(&self) -> f64 {
        self.info.fps
    }

    fn read_frame(&mut self, index: u64) -> Result<Option<PixelBuffer>, AnalysisError> {
        let output = Command::new("ffmpeg")
            .args(decode_args(&self.path, index, self.info.fps))
            .output()?;

        let expected = self.info.width as usize * self.info.height as usize * 3;
        if !output.status.success() || output.stdout.len() != expected {
            debug!(
                "Frame {} unreadable (status {}, {} of {} bytes)",
                index,
                output.status,
                output.stdout.len(),
                expected
            );
            return Ok(None);
        }

        PixelBuffer::new(self.info.width, self.info.height, output.stdout).map(Some)
    }
}
