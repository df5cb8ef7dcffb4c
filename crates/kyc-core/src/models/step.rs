use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// One stage of the self-service KYC wizard, in wizard order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Registration,
    Aadhar,
    Pancard,
    Passport,
    Photo,
    Selfie,
    Video,
    Review,
    Submitted,
}

impl StepId {
    /// Fixed wizard order.
    pub const ORDER: [StepId; 9] = [
        StepId::Registration,
        StepId::Aadhar,
        StepId::Pancard,
        StepId::Passport,
        StepId::Photo,
        StepId::Selfie,
        StepId::Video,
        StepId::Review,
        StepId::Submitted,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn first() -> StepId {
        Self::ORDER[0]
    }

    pub fn last() -> StepId {
        Self::ORDER[Self::ORDER.len() - 1]
    }

    pub fn next(self) -> Option<StepId> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<StepId> {
        self.index().checked_sub(1).map(|i| Self::ORDER[i])
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Registration => "registration",
            StepId::Aadhar => "aadhar",
            StepId::Pancard => "pancard",
            StepId::Passport => "passport",
            StepId::Photo => "photo",
            StepId::Selfie => "selfie",
            StepId::Video => "video",
            StepId::Review => "review",
            StepId::Submitted => "submitted",
        }
    }

    /// Translate a backend progress step id. Unknown ids map to `None`.
    pub fn from_backend(id: &str) -> Option<StepId> {
        match id {
            "registration" => Some(StepId::Registration),
            "aadhar_upload" => Some(StepId::Aadhar),
            "pan_upload" => Some(StepId::Pancard),
            "passport_upload" => Some(StepId::Passport),
            "photo_upload" => Some(StepId::Photo),
            "selfie_upload" => Some(StepId::Selfie),
            "video_upload" => Some(StepId::Video),
            "review" => Some(StepId::Review),
            "kyc_submitted" => Some(StepId::Submitted),
            _ => None,
        }
    }

    pub fn backend_id(self) -> &'static str {
        match self {
            StepId::Registration => "registration",
            StepId::Aadhar => "aadhar_upload",
            StepId::Pancard => "pan_upload",
            StepId::Passport => "passport_upload",
            StepId::Photo => "photo_upload",
            StepId::Selfie => "selfie_upload",
            StepId::Video => "video_upload",
            StepId::Review => "review",
            StepId::Submitted => "kyc_submitted",
        }
    }

    pub fn info(self) -> &'static Step {
        &STEPS[self.index()]
    }
}

impl Display for StepId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StepId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepId::ORDER
            .iter()
            .copied()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Invalid step: {}", s))
    }
}

/// Static description of a wizard step.
#[derive(Debug, Serialize)]
pub struct Step {
    pub id: StepId,
    pub title: &'static str,
    pub description: &'static str,
}

pub static STEPS: [Step; 9] = [
    Step {
        id: StepId::Registration,
        title: "Registration",
        description: "Enter your personal details",
    },
    Step {
        id: StepId::Aadhar,
        title: "Aadhar Card",
        description: "Upload your Aadhar card",
    },
    Step {
        id: StepId::Pancard,
        title: "PAN Card",
        description: "Upload your PAN card",
    },
    Step {
        id: StepId::Passport,
        title: "Passport",
        description: "Upload your passport",
    },
    Step {
        id: StepId::Photo,
        title: "Photo",
        description: "Upload your photo",
    },
    Step {
        id: StepId::Selfie,
        title: "Selfie",
        description: "Take a selfie",
    },
    Step {
        id: StepId::Video,
        title: "Video",
        description: "Record a video",
    },
    Step {
        id: StepId::Review,
        title: "Review",
        description: "Review your information",
    },
    Step {
        id: StepId::Submitted,
        title: "KYC Submitted",
        description: "Your KYC has been submitted.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_table_matches_order() {
        for (i, step) in STEPS.iter().enumerate() {
            assert_eq!(step.id, StepId::ORDER[i]);
            assert_eq!(step.id.index(), i);
        }
    }

    #[test]
    fn test_next_and_previous_at_edges() {
        assert_eq!(StepId::Submitted.next(), None);
        assert_eq!(StepId::Registration.previous(), None);
        assert_eq!(StepId::Review.next(), Some(StepId::Submitted));
        assert_eq!(StepId::Aadhar.previous(), Some(StepId::Registration));
    }

    #[test]
    fn test_backend_mapping_is_bijective_over_known_ids() {
        for step in StepId::ORDER {
            assert_eq!(StepId::from_backend(step.backend_id()), Some(step));
        }
        assert_eq!(StepId::from_backend("risk_analysis"), None);
        assert_eq!(StepId::from_backend("aadhar"), None);
    }

    #[test]
    fn test_from_str_round_trips_display() {
        assert_eq!("pancard".parse::<StepId>().unwrap(), StepId::Pancard);
        assert!("kyc_submitted".parse::<StepId>().is_err());
    }
}
