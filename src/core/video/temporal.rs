/// 平均绝对变化达到该值时波动度饱和
const SATURATION: f64 = 0.3;

/// 帧间分数波动度，[0, 1]，越高越不一致
///
/// 只依赖序列顺序，与时间戳无关
pub fn coherence_score(scores: &[f64]) -> f64 {
    if scores.len() < 2 {
        return 0.0;
    }

    let total: f64 = scores.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    let mean_step = total / (scores.len() - 1) as f64;
    (mean_step / SATURATION).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sequences_score_zero() {
        assert_eq!(coherence_score(&[]), 0.0);
        assert_eq!(coherence_score(&[0.9]), 0.0);
    }

    #[test]
    fn test_constant_sequence_scores_zero() {
        assert_eq!(coherence_score(&[0.42; 17]), 0.0);
    }

    #[test]
    fn test_alternating_sequence_saturates() {
        assert_eq!(coherence_score(&[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]), 1.0);
    }

    #[test]
    fn test_partial_volatility() {
        // steps 0.1, 0.05 -> mean 0.075 -> 0.25
        let score = coherence_score(&[0.2, 0.3, 0.25]);
        assert!((score - 0.25).abs() < 1e-9);
    }
}
