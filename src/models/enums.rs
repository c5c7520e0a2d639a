use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same strings, so stored and serialized forms agree.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(FileStatus {
    Ingestion => "Ingestion",
    FeaturesExtracted => "Features Extracted",
    TestCasesGenerated => "Test Cases Generated",
    PartiallyTestCasesGenerated => "Partially Test Cases Generated",
});

str_enum!(RiskLevel {
    Low => "Low",
    Medium => "Medium",
    High => "High",
    Critical => "Critical",
});

str_enum!(ComplianceTag {
    Fda => "FDA",
    Iec62304 => "IEC 62304",
    Iso9001 => "ISO 9001",
    Iso13485 => "ISO 13485",
    Iso27001 => "ISO 27001",
});

impl RiskLevel {
    /// Lenient parse for model output and stored rows: case-insensitive,
    /// anything unrecognized or empty buckets under `Low`.
    pub fn parse_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn file_status_round_trips() {
        for status in [
            FileStatus::Ingestion,
            FileStatus::FeaturesExtracted,
            FileStatus::TestCasesGenerated,
            FileStatus::PartiallyTestCasesGenerated,
        ] {
            assert_eq!(FileStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn risk_parse_loose_is_case_insensitive() {
        assert_eq!(RiskLevel::parse_loose("HIGH"), RiskLevel::High);
        assert_eq!(RiskLevel::parse_loose("critical"), RiskLevel::Critical);
        assert_eq!(RiskLevel::parse_loose("Medium"), RiskLevel::Medium);
    }

    #[test]
    fn risk_parse_loose_buckets_unknown_under_low() {
        assert_eq!(RiskLevel::parse_loose("Severe"), RiskLevel::Low);
        assert_eq!(RiskLevel::parse_loose(""), RiskLevel::Low);
        assert_eq!(RiskLevel::parse_loose("  "), RiskLevel::Low);
    }

    #[test]
    fn compliance_tag_rejects_unknown() {
        assert!(ComplianceTag::from_str("FDA").is_ok());
        assert!(ComplianceTag::from_str("HIPAA").is_err());
        assert!(ComplianceTag::from_str("fda").is_err());
    }

    #[test]
    fn compliance_tag_spellings_match_allowed_set() {
        assert_eq!(ComplianceTag::Iec62304.as_str(), "IEC 62304");
        assert_eq!(ComplianceTag::Iso13485.as_str(), "ISO 13485");
    }

    #[test]
    fn serialized_form_matches_as_str() {
        assert_eq!(
            serde_json::to_value(FileStatus::FeaturesExtracted).unwrap(),
            "Features Extracted"
        );
        assert_eq!(serde_json::to_value(ComplianceTag::Fda).unwrap(), "FDA");
        assert_eq!(serde_json::to_value(RiskLevel::High).unwrap(), "High");
    }
}
