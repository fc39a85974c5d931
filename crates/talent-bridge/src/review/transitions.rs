use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{ContactStatus, ReviewStatus};

/// Decision an admin takes on a pending talent or sponsor profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewAction::Approve => "approve",
            ReviewAction::Reject => "reject",
        }
    }

    pub const fn target(self) -> ReviewStatus {
        match self {
            ReviewAction::Approve => ReviewStatus::Approved,
            ReviewAction::Reject => ReviewStatus::Rejected,
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Triage step on a contact message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactAction {
    MarkRead,
    MarkReplied,
    Archive,
}

impl ContactAction {
    pub const fn label(self) -> &'static str {
        match self {
            ContactAction::MarkRead => "mark_read",
            ContactAction::MarkReplied => "mark_replied",
            ContactAction::Archive => "archive",
        }
    }

    pub const fn target(self) -> ContactStatus {
        match self {
            ContactAction::MarkRead => ContactStatus::Read,
            ContactAction::MarkReplied => ContactStatus::Replied,
            ContactAction::Archive => ContactStatus::Archived,
        }
    }
}

impl fmt::Display for ContactAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ContactAction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "mark_read" | "read" => Ok(ContactAction::MarkRead),
            "mark_replied" | "replied" => Ok(ContactAction::MarkReplied),
            "archive" | "archived" => Ok(ContactAction::Archive),
            other => Err(format!("unknown contact action '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {action} a record that is already {from}")]
    Final { action: &'static str, from: &'static str },
    #[error("cannot {action} a record that is {from}")]
    NotAllowed { action: &'static str, from: &'static str },
}

/// Pending profiles may be approved or rejected once; both outcomes are final.
pub fn review_transition(
    current: ReviewStatus,
    action: ReviewAction,
) -> Result<ReviewStatus, TransitionError> {
    if current.is_terminal() {
        return Err(TransitionError::Final {
            action: action.label(),
            from: current.label(),
        });
    }
    Ok(action.target())
}

/// `new -> read -> replied`, with `archived` reachable from `new` or `read`.
pub fn contact_transition(
    current: ContactStatus,
    action: ContactAction,
) -> Result<ContactStatus, TransitionError> {
    if current.is_terminal() {
        return Err(TransitionError::Final {
            action: action.label(),
            from: current.label(),
        });
    }

    let allowed = matches!(
        (current, action),
        (ContactStatus::New, ContactAction::MarkRead)
            | (ContactStatus::Read, ContactAction::MarkReplied)
            | (ContactStatus::New | ContactStatus::Read, ContactAction::Archive)
    );
    if allowed {
        Ok(action.target())
    } else {
        Err(TransitionError::NotAllowed {
            action: action.label(),
            from: current.label(),
        })
    }
}
