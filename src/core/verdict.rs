use serde::Serialize;

/// 面向用户的结论，自上而下匹配，下界包含
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "HIGHLY LIKELY FAKE")]
    HighlyLikelyFake,
    #[serde(rename = "LIKELY FAKE")]
    LikelyFake,
    #[serde(rename = "SUSPICIOUS")]
    Suspicious,
    #[serde(rename = "POSSIBLY AUTHENTIC")]
    PossiblyAuthentic,
    #[serde(rename = "LIKELY AUTHENTIC")]
    LikelyAuthentic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Critical,
    High,
    Medium,
    Low,
    Minimal,
}

impl Verdict {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Verdict::HighlyLikelyFake
        } else if score >= 0.60 {
            Verdict::LikelyFake
        } else if score >= 0.40 {
            Verdict::Suspicious
        } else if score >= 0.25 {
            Verdict::PossiblyAuthentic
        } else {
            Verdict::LikelyAuthentic
        }
    }

    pub fn risk_tier(&self) -> RiskTier {
        match self {
            Verdict::HighlyLikelyFake => RiskTier::Critical,
            Verdict::LikelyFake => RiskTier::High,
            Verdict::Suspicious => RiskTier::Medium,
            Verdict::PossiblyAuthentic => RiskTier::Low,
            Verdict::LikelyAuthentic => RiskTier::Minimal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::HighlyLikelyFake => "HIGHLY LIKELY FAKE",
            Verdict::LikelyFake => "LIKELY FAKE",
            Verdict::Suspicious => "SUSPICIOUS",
            Verdict::PossiblyAuthentic => "POSSIBLY AUTHENTIC",
            Verdict::LikelyAuthentic => "LIKELY AUTHENTIC",
        }
    }
}

impl RiskTier {
    pub fn from_score(score: f64) -> Self {
        Verdict::from_score(score).risk_tier()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Critical => "CRITICAL",
            RiskTier::High => "HIGH",
            RiskTier::Medium => "MEDIUM",
            RiskTier::Low => "LOW",
            RiskTier::Minimal => "MINIMAL",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 分数及其展示字段
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    pub probability_percent: f64,
    pub confidence_score: f64,
    pub verdict: Verdict,
    pub risk_level: RiskTier,
}

impl Assessment {
    pub fn from_score(score: f64) -> Self {
        let verdict = Verdict::from_score(score);
        Self {
            probability_percent: round_to(score * 100.0, 2),
            confidence_score: round_to(score, 3),
            verdict,
            risk_level: verdict.risk_tier(),
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_inclusive() {
        assert_eq!(Verdict::from_score(0.75), Verdict::HighlyLikelyFake);
        assert_eq!(Verdict::from_score(0.60), Verdict::LikelyFake);
        assert_eq!(Verdict::from_score(0.40), Verdict::Suspicious);
        assert_eq!(Verdict::from_score(0.25), Verdict::PossiblyAuthentic);
        assert_eq!(Verdict::from_score(0.2499), Verdict::LikelyAuthentic);
    }

    #[test]
    fn test_risk_tiers_at_boundaries() {
        assert_eq!(RiskTier::from_score(1.0), RiskTier::Critical);
        assert_eq!(RiskTier::from_score(0.75), RiskTier::Critical);
        assert_eq!(RiskTier::from_score(0.7499), RiskTier::High);
        assert_eq!(RiskTier::from_score(0.60), RiskTier::High);
        assert_eq!(RiskTier::from_score(0.40), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(0.25), RiskTier::Low);
        assert_eq!(RiskTier::from_score(0.0), RiskTier::Minimal);
    }

    #[test]
    fn test_assessment_rounding() {
        let a = Assessment::from_score(0.68123);
        assert_eq!(a.probability_percent, 68.12);
        assert_eq!(a.confidence_score, 0.681);
        assert_eq!(a.verdict, Verdict::LikelyFake);
        assert_eq!(a.risk_level, RiskTier::High);
    }

    #[test]
    fn test_labels_serialize_verbatim() {
        let json = serde_json::to_value(Assessment::from_score(0.1)).unwrap();
        assert_eq!(json["verdict"], "LIKELY AUTHENTIC");
        assert_eq!(json["risk_level"], "MINIMAL");
    }
}
