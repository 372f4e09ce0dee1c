//! Ingestion-task records and their lifecycle.
//!
//! Task state moves monotonically: `Uploaded → Processing →
//! {Completed, Failed}`. A terminal task never changes state again;
//! late writes from an aborted worker are silently dropped by the
//! transition guard.

use crate::core::{DocumentType, Jurisdiction, LawStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an ingestion task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// File received and persisted; worker not yet running.
    Uploaded,
    /// Worker is processing the file.
    Processing,
    /// Processing finished; result summary available.
    Completed,
    /// Processing failed or was cancelled; error available.
    Failed,
}

impl TaskState {
    /// Returns the canonical snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether this state admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a transition to `next` is legal. Re-entering
    /// `Processing` is allowed for progress updates.
    #[must_use]
    pub const fn can_transition(self, next: Self) -> bool {
        match self {
            Self::Uploaded => matches!(next, Self::Processing | Self::Failed),
            Self::Processing => matches!(next, Self::Processing | Self::Completed | Self::Failed),
            Self::Completed | Self::Failed => false,
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied fields accompanying an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMetadata {
    /// Document type; auto-detected when absent.
    pub document_type: Option<DocumentType>,
    /// Jurisdiction tag for the document.
    pub jurisdiction: Jurisdiction,
    /// Law-status tag for the document.
    pub law_status: LawStatus,
    /// Identity of the uploader, when provided.
    pub uploaded_by: Option<String>,
}

impl Default for UploadMetadata {
    fn default() -> Self {
        Self {
            document_type: None,
            jurisdiction: Jurisdiction::Federal,
            law_status: LawStatus::Current,
            uploaded_by: None,
        }
    }
}

/// Result summary of a completed task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Id of the ingested document.
    pub document_id: String,
    /// Number of chunks written to the index.
    pub chunks_created: usize,
    /// Original file name.
    pub file_name: String,
    /// Document type the file was processed as.
    pub document_type: DocumentType,
}

/// One background ingestion task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionTask {
    /// Task id.
    pub id: Uuid,
    /// Original file name of the upload.
    pub file_name: String,
    /// Current lifecycle state.
    pub state: TaskState,
    /// Progress percentage, 0-100.
    pub progress: u8,
    /// Human-readable status message.
    pub message: String,
    /// Copy of the caller-supplied metadata.
    pub metadata: UploadMetadata,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task was last updated.
    pub updated_at: DateTime<Utc>,
    /// Result summary, set on completion.
    pub result: Option<TaskResult>,
    /// Error message, set on failure.
    pub error: Option<String>,
}

impl IngestionTask {
    /// Creates a fresh `Uploaded` task.
    #[must_use]
    pub fn new(id: Uuid, file_name: &str, metadata: UploadMetadata) -> Self {
        let now = Utc::now();
        Self {
            id,
            file_name: file_name.to_string(),
            state: TaskState::Uploaded,
            progress: 0,
            message: "file uploaded, awaiting processing".to_string(),
            metadata,
            created_at: now,
            updated_at: now,
            result: None,
            error: None,
        }
    }

    /// Applies a state transition with progress and message, returning
    /// whether it was accepted. Illegal transitions (including any away
    /// from a terminal state) are dropped.
    pub fn advance(&mut self, state: TaskState, progress: u8, message: &str) -> bool {
        if !self.state.can_transition(state) {
            return false;
        }
        self.state = state;
        self.progress = progress.min(100);
        self.message = message.to_string();
        self.updated_at = Utc::now();
        true
    }

    /// Marks the task completed with its result summary.
    pub fn complete(&mut self, result: TaskResult) -> bool {
        let message = format!("document processed into {} chunks", result.chunks_created);
        if self.advance(TaskState::Completed, 100, &message) {
            self.result = Some(result);
            true
        } else {
            false
        }
    }

    /// Marks the task failed with an error message.
    pub fn fail(&mut self, error: &str) -> bool {
        if self.advance(TaskState::Failed, self.progress, error) {
            self.error = Some(error.to_string());
            true
        } else {
            false
        }
    }
}
