/// 在 `0..=total_frames - 1` 上均匀取帧序号，升序
///
/// 返回 `min(sample_count, total_frames)` 个序号，插值位置向零截断
pub fn sample_indices(total_frames: u64, sample_count: usize) -> Vec<u64> {
    let n = (sample_count as u64).min(total_frames);
    match n {
        0 => Vec::new(),
        1 => vec![0],
        _ => {
            let last = total_frames - 1;
            (0..n).map(|i| i * last / (n - 1)).collect()
        }
    }
}
