//! Background ingestion manager.
//!
//! One independent tokio worker per submitted file; no shared queue, so
//! a slow extraction never blocks other uploads. The task table is a
//! concurrent map whose rows are written only by their owning worker;
//! readers receive snapshots. Tasks stay readable after reaching a
//! terminal state until explicitly removed.

mod processor;
mod task;

pub use processor::{DocumentProcessor, DocumentSummary, EMBED_BATCH_SIZE, ProcessOutcome};
pub use task::{IngestionTask, TaskResult, TaskState, UploadMetadata};

use crate::error::{Error, IngestError, Result};
use crate::extract::is_allowed_file;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Default maximum upload size: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

struct TaskEntry {
    task: IngestionTask,
    temp_path: PathBuf,
    handle: Option<JoinHandle<()>>,
}

type TaskTable = Arc<RwLock<HashMap<Uuid, TaskEntry>>>;

/// Accepts uploads, runs the pipeline on background workers, and tracks
/// task lifecycle.
pub struct IngestionManager {
    processor: Arc<DocumentProcessor>,
    tasks: TaskTable,
    upload_dir: PathBuf,
    max_upload_bytes: u64,
}

impl IngestionManager {
    /// Creates a manager writing temp files under `upload_dir`.
    #[must_use]
    pub fn new(processor: Arc<DocumentProcessor>, upload_dir: PathBuf) -> Self {
        Self {
            processor,
            tasks: Arc::new(RwLock::new(HashMap::new())),
            upload_dir,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Overrides the upload size cap.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }

    /// Accepts an upload: validates it, persists the bytes to a
    /// task-named temp file, records an `Uploaded` task, and dispatches
    /// a worker.
    ///
    /// # Errors
    ///
    /// Returns an error for empty or oversized uploads, unsupported
    /// file types, and filesystem failures.
    pub async fn submit(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        metadata: UploadMetadata,
    ) -> Result<Uuid> {
        if bytes.is_empty() {
            return Err(IngestError::EmptyUpload.into());
        }
        if bytes.len() as u64 > self.max_upload_bytes {
            return Err(IngestError::UploadTooLarge {
                size: bytes.len() as u64,
                max: self.max_upload_bytes,
            }
            .into());
        }
        let safe_name = sanitize_file_name(file_name);
        if !is_allowed_file(&safe_name) {
            return Err(crate::error::ExtractError::UnsupportedType {
                extension: Path::new(&safe_name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default()
                    .to_string(),
            }
            .into());
        }

        let id = Uuid::new_v4();
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(IngestError::from)?;
        let temp_path = self.upload_dir.join(format!("{id}_{safe_name}"));
        tokio::fs::write(&temp_path, &bytes)
            .await
            .map_err(IngestError::from)?;

        // The row must exist before the worker can observe it.
        let task = IngestionTask::new(id, &safe_name, metadata.clone());
        if let Ok(mut tasks) = self.tasks.write() {
            tasks.insert(
                id,
                TaskEntry {
                    task,
                    temp_path: temp_path.clone(),
                    handle: None,
                },
            );
        }

        let handle = tokio::spawn(run_worker(
            Arc::clone(&self.processor),
            Arc::clone(&self.tasks),
            id,
            temp_path,
            safe_name.clone(),
            metadata,
        ));
        if let Ok(mut tasks) = self.tasks.write()
            && let Some(entry) = tasks.get_mut(&id)
        {
            entry.handle = Some(handle);
        }

        info!(task_id = %id, file_name = %safe_name, "upload accepted");
        Ok(id)
    }

    /// Returns a snapshot of one task.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` for unknown ids.
    pub fn status(&self, id: Uuid) -> Result<IngestionTask> {
        self.tasks
            .read()
            .ok()
            .and_then(|tasks| tasks.get(&id).map(|entry| entry.task.clone()))
            .ok_or_else(|| {
                IngestError::TaskNotFound {
                    id: id.to_string(),
                }
                .into()
            })
    }

    /// Returns snapshots of all tasks, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<IngestionTask> {
        let mut tasks: Vec<IngestionTask> = self
            .tasks
            .read()
            .map(|tasks| tasks.values().map(|entry| entry.task.clone()).collect())
            .unwrap_or_default();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    /// Cancels a running task: aborts its worker, marks it failed with
    /// reason `cancelled`, and removes the temp file.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` for unknown ids and `InvalidState` when
    /// the task already reached a terminal state.
    pub async fn cancel(&self, id: Uuid) -> Result<()> {
        let temp_path = {
            let mut tasks = self.tasks.write().map_err(|_| Error::InvalidState {
                message: "task table poisoned".to_string(),
            })?;
            let entry = tasks.get_mut(&id).ok_or(IngestError::TaskNotFound {
                id: id.to_string(),
            })?;

            if entry.task.state.is_terminal() {
                return Err(Error::InvalidState {
                    message: format!("task {id} already {}", entry.task.state),
                });
            }

            if let Some(handle) = entry.handle.take() {
                handle.abort();
            }
            entry.task.fail("cancelled");
            entry.temp_path.clone()
        };

        remove_temp_file(&temp_path).await;
        info!(task_id = %id, "task cancelled");
        Ok(())
    }

    /// Removes a task from tracking, returning its final snapshot. A
    /// still-running worker is aborted and its temp file removed.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` for unknown ids.
    pub async fn remove(&self, id: Uuid) -> Result<IngestionTask> {
        let entry = {
            let mut tasks = self.tasks.write().map_err(|_| Error::InvalidState {
                message: "task table poisoned".to_string(),
            })?;
            tasks.remove(&id).ok_or(IngestError::TaskNotFound {
                id: id.to_string(),
            })?
        };

        if let Some(handle) = entry.handle {
            handle.abort();
        }
        if !entry.task.state.is_terminal() {
            remove_temp_file(&entry.temp_path).await;
        }
        Ok(entry.task)
    }

    /// The processor backing this manager.
    #[must_use]
    pub fn processor(&self) -> &Arc<DocumentProcessor> {
        &self.processor
    }
}

/// The per-task worker: runs the pipeline, records the outcome, and
/// unconditionally removes the temp file.
async fn run_worker(
    processor: Arc<DocumentProcessor>,
    tasks: TaskTable,
    id: Uuid,
    temp_path: PathBuf,
    file_name: String,
    metadata: UploadMetadata,
) {
    advance(&tasks, id, 10, "starting document processing");

    let progress_tasks = Arc::clone(&tasks);
    let outcome = processor
        .process_file(&temp_path, &file_name, &metadata, &move |pct, msg| {
            advance(&progress_tasks, id, pct, msg);
        })
        .await;

    match outcome {
        Ok(outcome) => {
            if let Ok(mut table) = tasks.write()
                && let Some(entry) = table.get_mut(&id)
            {
                entry.task.complete(outcome.result);
            }
            info!(task_id = %id, "ingestion completed");
        }
        Err(e) => {
            if let Ok(mut table) = tasks.write()
                && let Some(entry) = table.get_mut(&id)
            {
                entry.task.fail(&e.to_string());
            }
            warn!(task_id = %id, error = %e, "ingestion failed");
        }
    }

    remove_temp_file(&temp_path).await;
}

/// Applies a processing-progress update through the monotonic guard.
fn advance(tasks: &TaskTable, id: Uuid, progress: u8, message: &str) {
    if let Ok(mut table) = tasks.write()
        && let Some(entry) = table.get_mut(&id)
    {
        entry.task.advance(TaskState::Processing, progress, message);
    }
}

async fn remove_temp_file(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "could not remove temp file");
    }
}

/// Strips any path components from an uploaded file name.
fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    base.replace(
        |c: char| c.is_control() || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|'),
        "_",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CitationGraph;
    use crate::core::DocumentType;
    use crate::embedding::{DEFAULT_DIMENSIONS, HashEmbedder};
    use crate::index::MemoryIndex;
    use crate::xref::{CrossReferenceEngine, ReferenceGraph};

    fn manager(dir: &tempfile::TempDir) -> (IngestionManager, Arc<MemoryIndex>) {
        let embedder = Arc::new(HashEmbedder::new(DEFAULT_DIMENSIONS));
        let index = Arc::new(MemoryIndex::new(DEFAULT_DIMENSIONS));
        let citations = Arc::new(CitationGraph::new());
        let xref = Arc::new(CrossReferenceEngine::new(
            index.clone(),
            embedder.clone(),
            Arc::new(ReferenceGraph::new()),
        ));
        let processor = Arc::new(DocumentProcessor::new(
            embedder,
            index.clone(),
            citations,
            xref,
        ));
        (
            IngestionManager::new(processor, dir.path().join("uploads")),
            index,
        )
    }

    async fn wait_terminal(manager: &IngestionManager, id: Uuid) -> IngestionTask {
        for _ in 0..500 {
            let task = manager.status(id).unwrap();
            if task.state.is_terminal() {
                return task;
            }
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        manager.status(id).unwrap()
    }

    #[tokio::test]
    async fn test_submit_and_complete() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, index) = manager(&dir);

        let id = manager
            .submit(
                "opinion.txt",
                b"OPINION\nThe court holds under 18 U.S.C. 2703.\nDISSENT\nI dissent.".to_vec(),
                UploadMetadata {
                    document_type: Some(DocumentType::CaseLaw),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let task = wait_terminal(&manager, id).await;
        assert_eq!(task.state, TaskState::Completed);
        assert_eq!(task.progress, 100);
        let result = task.result.unwrap();
        assert_eq!(result.chunks_created, 2);
        assert_eq!(index.len().await, 2);

        // The temp file is gone after the terminal state.
        assert!(!task_temp_exists(&manager, id));
    }

    fn task_temp_exists(manager: &IngestionManager, id: Uuid) -> bool {
        manager
            .tasks
            .read()
            .map(|t| t.get(&id).is_some_and(|e| e.temp_path.exists()))
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_rejects_empty_and_oversized_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _) = manager(&dir);
        let manager = manager.with_max_upload_bytes(10);

        assert!(manager
            .submit("a.txt", Vec::new(), UploadMetadata::default())
            .await
            .is_err());
        assert!(manager
            .submit("a.txt", vec![b'x'; 11], UploadMetadata::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_rejects_unsupported_type() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _) = manager(&dir);
        let result = manager
            .submit("binary.exe", b"MZ".to_vec(), UploadMetadata::default())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_failed_task_still_cleans_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, index) = manager(&dir);

        // Whitespace-only content extracts to nothing and fails.
        let id = manager
            .submit("blank.txt", b"   \n   ".to_vec(), UploadMetadata::default())
            .await
            .unwrap();

        let task = wait_terminal(&manager, id).await;
        assert_eq!(task.state, TaskState::Failed);
        assert!(task.error.is_some());
        assert_eq!(index.len().await, 0);
        assert!(!task_temp_exists(&manager, id));
    }

    #[tokio::test]
    async fn test_cancel_before_worker_runs_leaves_index_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, index) = manager(&dir);

        let id = manager
            .submit(
                "opinion.txt",
                b"OPINION\nHoldings text goes here.".to_vec(),
                UploadMetadata::default(),
            )
            .await
            .unwrap();

        // Current-thread runtime: the worker has not been polled yet, so
        // cancelling here precedes any upsert.
        manager.cancel(id).await.unwrap();

        let task = manager.status(id).unwrap();
        assert_eq!(task.state, TaskState::Failed);
        assert_eq!(task.message, "cancelled");
        assert_eq!(index.len().await, 0);
        assert!(!task_temp_exists(&manager, id));
    }

    #[tokio::test]
    async fn test_cancel_terminal_task_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _) = manager(&dir);

        let id = manager
            .submit("note.txt", b"A short note.".to_vec(), UploadMetadata::default())
            .await
            .unwrap();
        wait_terminal(&manager, id).await;

        assert!(manager.cancel(id).await.is_err());
    }

    #[tokio::test]
    async fn test_remove_returns_final_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _) = manager(&dir);

        let id = manager
            .submit("note.txt", b"A short note.".to_vec(), UploadMetadata::default())
            .await
            .unwrap();
        wait_terminal(&manager, id).await;

        let removed = manager.remove(id).await.unwrap();
        assert_eq!(removed.state, TaskState::Completed);
        assert!(manager.status(id).is_err());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _) = manager(&dir);

        let first = manager
            .submit("a.txt", b"First note text.".to_vec(), UploadMetadata::default())
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = manager
            .submit("b.txt", b"Second note text.".to_vec(), UploadMetadata::default())
            .await
            .unwrap();

        let tasks = manager.list();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, second);
        assert_eq!(tasks[1].id, first);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd.txt"), "passwd.txt");
        assert_eq!(sanitize_file_name("C:\\evil\\doc.pdf"), "doc.pdf");
        assert_eq!(sanitize_file_name("plain.txt"), "plain.txt");
        assert_eq!(sanitize_file_name("we?ird:name.txt"), "we_ird_name.txt");
    }

    #[tokio::test]
    async fn test_unknown_task_errors() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _) = manager(&dir);
        let id = Uuid::new_v4();
        assert!(manager.status(id).is_err());
        assert!(manager.cancel(id).await.is_err());
        assert!(manager.remove(id).await.is_err());
    }
}
