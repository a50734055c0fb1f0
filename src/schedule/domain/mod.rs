//! Domain model for the scheduling board.
//!
//! Projects own ordered tasks; employees belong to departments. All values
//! are validated on construction and carry no storage concerns.

mod dataset;
mod dates;
mod error;
mod ids;
mod project;
mod staff;
mod task;

pub use dataset::Dataset;
pub use dates::{format_calendar_date, format_timestamp_date, parse_calendar_date};
pub use error::{EntityKind, ScheduleDomainError};
pub use ids::{DepartmentId, EmployeeId, ProjectId, TaskId};
pub use project::{Project, ProjectPatch};
pub use staff::{Department, DepartmentPatch, Employee, NewEmployee};
pub use task::{
    ColorToken, DateSpan, NewTask, PersistedTaskData, Progress, TASK_PALETTE, Task, TaskPatch,
};

pub(crate) use project::apply_order;
