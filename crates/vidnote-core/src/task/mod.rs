//! Download task model and its in-memory registry.

mod errors;
mod registry;
mod types;

pub use errors::RegistryError;
pub use registry::TaskRegistry;
pub use types::{
    MediaInfo, ProgressPhase, ProgressSnapshot, Task, TaskId, TaskResult, TaskStatus,
};
