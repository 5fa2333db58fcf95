//! Hazard categories and severity tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A classified disaster category.
///
/// The scorer only ever produces the three modelled categories. `Other`
/// exists for the wire boundary: reports from foreign sensors may carry
/// categories this responder does not model, and those must still dispatch
/// a generic response rather than be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hazard {
    Flood,
    Fire,
    Earthquake,
    Other(String),
}

impl Hazard {
    /// Decode a wire token. Total: unknown tokens are preserved verbatim
    /// as `Other`.
    pub fn parse_token(token: &str) -> Self {
        match token {
            "FLOOD" => Hazard::Flood,
            "FIRE" => Hazard::Fire,
            "EARTHQUAKE" => Hazard::Earthquake,
            other => Hazard::Other(other.to_string()),
        }
    }

    /// Wire token for this category.
    pub fn as_str(&self) -> &str {
        match self {
            Hazard::Flood => "FLOOD",
            Hazard::Fire => "FIRE",
            Hazard::Earthquake => "EARTHQUAKE",
            Hazard::Other(label) => label,
        }
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hazard {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Hazard::parse_token(s))
    }
}

/// Ordinal urgency tier derived from a hazard score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    /// Map a score to its tier. Breakpoint values belong to the higher
    /// tier: 60 is Moderate, 100 is High, 140 is Critical.
    pub fn from_score(score: f64) -> Self {
        if score < 60.0 {
            Severity::Low
        } else if score < 100.0 {
            Severity::Moderate
        } else if score < 140.0 {
            Severity::High
        } else {
            Severity::Critical
        }
    }

    /// The escalation predicate: everything above Low warrants dispatch.
    pub fn is_emergency(&self) -> bool {
        *self >= Severity::Moderate
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Moderate => "MODERATE",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized severity token on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    /// Strict: a report carrying an unrecognized tier is malformed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Severity::Low),
            "MODERATE" => Ok(Severity::Moderate),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            other => Err(UnknownSeverity(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_breakpoints_belong_to_higher_tier() {
        assert_eq!(Severity::from_score(59.9), Severity::Low);
        assert_eq!(Severity::from_score(60.0), Severity::Moderate);
        assert_eq!(Severity::from_score(99.9), Severity::Moderate);
        assert_eq!(Severity::from_score(100.0), Severity::High);
        assert_eq!(Severity::from_score(139.9), Severity::High);
        assert_eq!(Severity::from_score(140.0), Severity::Critical);
    }

    #[test]
    fn emergency_predicate_excludes_low_only() {
        assert!(!Severity::Low.is_emergency());
        assert!(Severity::Moderate.is_emergency());
        assert!(Severity::High.is_emergency());
        assert!(Severity::Critical.is_emergency());
    }

    #[test]
    fn hazard_tokens_round_trip() {
        for token in ["FLOOD", "FIRE", "EARTHQUAKE", "LANDSLIDE"] {
            let hazard: Hazard = token.parse().unwrap();
            assert_eq!(hazard.to_string(), token);
        }
        assert_eq!("LANDSLIDE".parse::<Hazard>().unwrap(), Hazard::Other("LANDSLIDE".into()));
    }

    #[test]
    fn severity_parse_is_strict() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert!("severe".parse::<Severity>().is_err());
    }
}
