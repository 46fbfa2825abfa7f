//! 顶层报告结构体

use serde::{Deserialize, Serialize};

use crate::config::TrackedService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    UpToDate,
    UpdateAvailable,
    NotFoundLocally,
    NetworkError,
    ParseError,
}

impl Outcome {
    /// Outcomes that call for a pull + restart
    pub fn needs_update(self) -> bool {
        matches!(self, Outcome::UpdateAvailable | Outcome::NotFoundLocally)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::UpToDate        => write!(f, "up to date"),
            Outcome::UpdateAvailable => write!(f, "update available"),
            Outcome::NotFoundLocally => write!(f, "not found locally"),
            Outcome::NetworkError    => write!(f, "network error"),
            Outcome::ParseError      => write!(f, "parse error"),
        }
    }
}

/// One per tracked service per check cycle; discarded after reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestComparison {
    pub service: TrackedService,
    pub remote_digest: Option<String>,
    pub local_digest: Option<String>,
    pub outcome: Outcome,
    /// Underlying error text for NetworkError / ParseError
    pub detail: Option<String>,
}

/// Produced only when an update is attempted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResult {
    pub service: TrackedService,
    pub dry_run: bool,
    pub pulled: bool,
    pub restarted: bool,
    pub error: Option<String>,
}

impl UpdateResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UpdateSummary {
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub collected_at: String,
    pub tag: String,
    pub comparisons: Vec<DigestComparison>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateReport {
    pub collected_at: String,
    pub tag: String,
    pub dry_run: bool,
    pub comparisons: Vec<DigestComparison>,
    pub results: Vec<UpdateResult>,
    pub summary: UpdateSummary,
}
