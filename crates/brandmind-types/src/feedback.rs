//! Feedback events recorded against agent output.
//!
//! Events are immutable and append-only. The learner reads them back in
//! rolling windows per (owner, agent).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// What the user did with an agent's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Approve,
    Reject,
    Edit,
}

impl fmt::Display for FeedbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackAction::Approve => write!(f, "approve"),
            FeedbackAction::Reject => write!(f, "reject"),
            FeedbackAction::Edit => write!(f, "edit"),
        }
    }
}

impl FromStr for FeedbackAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(FeedbackAction::Approve),
            "reject" => Ok(FeedbackAction::Reject),
            "edit" => Ok(FeedbackAction::Edit),
            other => Err(format!("invalid feedback action: '{other}'")),
        }
    }
}

/// A single recorded piece of feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub agent_name: String,
    pub action: FeedbackAction,
    pub original_output: String,
    pub edited_output: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackEvent {
    pub fn new(
        owner_id: Uuid,
        agent_name: impl Into<String>,
        action: FeedbackAction,
        original_output: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id,
            agent_name: agent_name.into(),
            action,
            original_output: original_output.into(),
            edited_output: None,
            note: None,
            created_at: Utc::now(),
        }
    }
}

/// Aggregate statistics over a window of feedback events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    pub total: usize,
    pub approvals: usize,
    pub rejections: usize,
    pub edits: usize,
}

impl FeedbackSummary {
    pub fn from_events(events: &[FeedbackEvent]) -> Self {
        let mut summary = Self {
            total: events.len(),
            approvals: 0,
            rejections: 0,
            edits: 0,
        };
        for event in events {
            match event.action {
                FeedbackAction::Approve => summary.approvals += 1,
                FeedbackAction::Reject => summary.rejections += 1,
                FeedbackAction::Edit => summary.edits += 1,
            }
        }
        summary
    }

    /// Share of approvals; 0.0 for an empty window.
    pub fn positive_rate(&self) -> f32 {
        ratio(self.approvals, self.total)
    }

    /// Share of edits; 0.0 for an empty window.
    pub fn edit_rate(&self) -> f32 {
        ratio(self.edits, self.total)
    }
}

fn ratio(part: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        part as f32 / total as f32
    }
}
