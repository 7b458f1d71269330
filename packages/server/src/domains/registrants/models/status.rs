use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Registrant review status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RegistrantStatus {
    Pending,
    Approved,
    Incomplete,
    NonCompliant,
    Archived,
}

impl RegistrantStatus {
    pub const ALL: [RegistrantStatus; 5] = [
        RegistrantStatus::Pending,
        RegistrantStatus::Approved,
        RegistrantStatus::Incomplete,
        RegistrantStatus::NonCompliant,
        RegistrantStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrantStatus::Pending => "pending",
            RegistrantStatus::Approved => "approved",
            RegistrantStatus::Incomplete => "incomplete",
            RegistrantStatus::NonCompliant => "non_compliant",
            RegistrantStatus::Archived => "archived",
        }
    }

    /// Parse a stored status column. NULL and blank values read as `None`.
    pub fn from_column(value: Option<&str>) -> Result<Option<Self>> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }

    /// Whether the review workflow allows moving from `current` to `next`.
    ///
    /// Re-applying the current status is allowed; archival is terminal.
    pub fn can_transition(current: Option<Self>, next: Self) -> bool {
        use RegistrantStatus::*;

        let Some(current) = current else {
            return next == Pending;
        };

        match (current, next) {
            (Archived, Archived) => true,
            (Archived, _) => false,
            (a, b) if a == b => true,
            (_, Archived) => true,
            (Pending, Approved | Incomplete | NonCompliant) => true,
            (Incomplete | NonCompliant, Approved) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for RegistrantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RegistrantStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(RegistrantStatus::Pending),
            "approved" => Ok(RegistrantStatus::Approved),
            "incomplete" => Ok(RegistrantStatus::Incomplete),
            "non_compliant" => Ok(RegistrantStatus::NonCompliant),
            "archived" => Ok(RegistrantStatus::Archived),
            _ => Err(anyhow::anyhow!("Invalid registrant status: {}", s)),
        }
    }
}
