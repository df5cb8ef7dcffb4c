use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::progress::ScreenData;

const HIGH_VALUE_INCOME: i64 = 1_000_000;

/// Score from document checks until the verification service reports one.
const DEFAULT_DOCUMENT_SCORE: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl Display for RiskLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactors {
    pub pep_status: bool,
    pub high_risk_country: bool,
    pub high_value_transaction: bool,
    pub unusual_activity: bool,
    pub document_verification_score: f64,
}

impl RiskFactors {
    /// Derive factors from the case's submitted details.
    pub fn from_screen_data(screen: &ScreenData) -> Self {
        let details = screen.details.as_ref();
        let pep_status = details
            .and_then(|d| d.get("is_pep"))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        let high_value_transaction = details
            .and_then(|d| d.get("annual_income"))
            .and_then(parse_income)
            .is_some_and(|income| income > HIGH_VALUE_INCOME);

        RiskFactors {
            pep_status,
            high_risk_country: false,
            high_value_transaction,
            unusual_activity: false,
            document_verification_score: DEFAULT_DOCUMENT_SCORE,
        }
    }

    pub fn score(&self) -> f64 {
        let mut score = 0.0;
        if self.pep_status {
            score += 3.0;
        }
        if self.high_risk_country {
            score += 2.0;
        }
        if self.high_value_transaction {
            score += 2.0;
        }
        if self.unusual_activity {
            score += 3.0;
        }
        score + self.document_verification_score * 2.0
    }

    pub fn level(&self) -> RiskLevel {
        let score = self.score();
        if score >= 7.0 {
            RiskLevel::High
        } else if score >= 4.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Leading-integer parse, tolerant of trailing text such as "1200000 INR".
fn parse_income(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub factors: RiskFactors,
    pub score: f64,
    pub level: RiskLevel,
}

impl From<RiskFactors> for RiskAssessment {
    fn from(factors: RiskFactors) -> Self {
        RiskAssessment {
            score: factors.score(),
            level: factors.level(),
            factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn screen(details: serde_json::Value) -> ScreenData {
        ScreenData {
            details: Some(details),
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_customer_is_low() {
        let factors = RiskFactors::from_screen_data(&screen(json!({"annual_income": "500000"})));
        assert!(!factors.high_value_transaction);
        assert_eq!(factors.level(), RiskLevel::Low);
    }

    #[test]
    fn test_pep_is_medium() {
        let factors = RiskFactors::from_screen_data(&screen(json!({"is_pep": true})));
        assert_eq!(factors.level(), RiskLevel::Medium);
    }

    #[test]
    fn test_pep_with_high_income_is_medium() {
        let factors = RiskFactors::from_screen_data(&screen(
            json!({"is_pep": true, "annual_income": "2500000 INR"}),
        ));
        assert!(factors.high_value_transaction);
        let assessment = RiskAssessment::from(factors);
        assert!((assessment.score - 6.7).abs() < 1e-9);
        assert_eq!(assessment.level, RiskLevel::Medium);
    }

    #[test]
    fn test_unusual_activity_pushes_to_high() {
        let factors = RiskFactors {
            pep_status: true,
            high_risk_country: false,
            high_value_transaction: false,
            unusual_activity: true,
            document_verification_score: 0.85,
        };
        assert_eq!(factors.level(), RiskLevel::High);
    }

    #[test]
    fn test_missing_details_are_tolerated() {
        let factors = RiskFactors::from_screen_data(&ScreenData::default());
        assert!(!factors.pep_status);
        assert_eq!(factors.level(), RiskLevel::Low);
    }
}
