//! Application lifecycle states carried by status notifications.
//!
//! The relay never validates transitions between these states; that is the
//! workflow engine's job. It only carries the value to connected clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle state of a job application workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Interview,
    Offer,
    Rejected,
    Withdrawn,
    Archived,
}

impl ApplicationStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Interview,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
        ApplicationStatus::Archived,
    ];

    /// Lowercase wire name, e.g. `"interview"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
            ApplicationStatus::Archived => "archived",
        }
    }

    /// Whether the workflow ends in this state.
    pub fn is_terminal(self) -> bool {
        !matches!(
            self,
            ApplicationStatus::Pending | ApplicationStatus::Interview
        )
    }

    /// Human-readable message shown to users when an application enters
    /// this state.
    pub fn status_message(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Application submitted",
            ApplicationStatus::Interview => "Moved to interview",
            ApplicationStatus::Offer => "Offer received",
            ApplicationStatus::Rejected => "Application rejected",
            ApplicationStatus::Withdrawn => "Application withdrawn",
            ApplicationStatus::Archived => "Application archived",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown application status: '{s}'")))
    }
}
