//! Types shared by the todo server and the browser client, plus the client-side
//! state synchronizer.

pub mod model;
pub mod sync;

pub use model::{
    CreateTaskRequest, ErrorBody, HealthStatus, ReadyStatus, Task, TaskId, TaskStats,
    UpdateTaskRequest,
};
pub use sync::{ApiError, Change, Mirror, SyncError, Synchronizer, TodoApi};
