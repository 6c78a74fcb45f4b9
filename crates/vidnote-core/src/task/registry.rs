//! Concurrency-safe task storage.
//!
//! The registry is the single source of truth for task status and progress.
//! It is backed by a sharded map so writers for unrelated tasks never contend
//! on one lock. Every mutation happens under the entry's shard lock and
//! replaces whole fields, so readers always clone a consistent snapshot.

use std::path::PathBuf;

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::errors::RegistryError;
use super::types::{ProgressSnapshot, Task, TaskId, TaskResult, TaskStatus};

/// In-memory registry of download tasks.
///
/// There is no eviction: tasks live until the process exits.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: DashMap<TaskId, Task>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new task in the `queued` state.
    pub fn create(
        &self,
        id: TaskId,
        url: impl Into<String>,
        save_path: impl Into<PathBuf>,
        format_preference: Option<String>,
    ) -> Result<Task, RegistryError> {
        match self.tasks.entry(id.clone()) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                let task = Task::queued(id, url, save_path, format_preference);
                slot.insert(task.clone());
                tracing::debug!(target: "vidnote.tasks", id = %task.id, "Task created");
                Ok(task)
            }
        }
    }

    /// Snapshot of a task.
    pub fn get(&self, id: &TaskId) -> Result<Task, RegistryError> {
        self.tasks
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Replace the progress snapshot of a downloading task.
    ///
    /// Progress events may race with completion, so an unknown task or one
    /// that is no longer downloading is not an error: the update is dropped
    /// and `false` is returned.
    pub fn update_progress(&self, id: &TaskId, progress: ProgressSnapshot) -> bool {
        let Some(mut entry) = self.tasks.get_mut(id) else {
            tracing::debug!(target: "vidnote.tasks", id = %id, "Progress for unknown task dropped");
            return false;
        };

        let task = entry.value_mut();
        if task.status != TaskStatus::Downloading {
            tracing::debug!(
                target: "vidnote.tasks",
                id = %id,
                status = %task.status,
                "Progress outside downloading state dropped"
            );
            return false;
        }

        task.progress = Some(progress);
        task.updated_at = Utc::now();
        true
    }

    /// Move a task along the state machine.
    ///
    /// Terminal transitions must carry the matching [`TaskResult`]; the move to
    /// `downloading` must not carry one. Returns the updated snapshot.
    pub fn transition(
        &self,
        id: &TaskId,
        next: TaskStatus,
        result: Option<TaskResult>,
    ) -> Result<Task, RegistryError> {
        let mut entry = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let task = entry.value_mut();

        if !task.status.can_transition_to(next) {
            return Err(RegistryError::IllegalTransition {
                id: id.clone(),
                from: task.status,
                to: next,
            });
        }

        let result_matches = match &result {
            Some(r) => r.status() == next,
            None => !next.is_terminal(),
        };
        if !result_matches {
            return Err(RegistryError::ResultMismatch {
                id: id.clone(),
                to: next,
            });
        }

        tracing::debug!(
            target: "vidnote.tasks",
            id = %id,
            from = %task.status,
            to = %next,
            "Task transition"
        );

        task.status = next;
        if result.is_some() {
            task.result = result;
        }
        task.updated_at = Utc::now();

        Ok(task.clone())
    }

    /// Number of tasks ever created in this process.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task has been created yet.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
