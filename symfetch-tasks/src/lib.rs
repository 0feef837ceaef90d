//! # symfetch-tasks
//!
//! Spawns the fetch and upload jobs on the remote task queue: fills JSON
//! task templates, mints slug ids, signs queue requests with Hawk.

pub mod error;
pub mod hawk;
pub mod queue;
pub mod slug;
pub mod template;
pub mod trigger;

pub use error::TaskError;
pub use hawk::Credentials;
pub use queue::Queue;
pub use template::{TaskTemplate, TemplateKeys};
pub use trigger::{trigger, SubmittedTask, TriggerReport, TriggerSettings, DECISION_TASK_ENV};
