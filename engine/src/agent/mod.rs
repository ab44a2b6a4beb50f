//! Health Agent
//!
//! The orchestration façade and the task loop it drives. The façade owns the
//! run sequence; the loop consumes the execution service's event stream.

pub mod core;
pub mod task_loop;

pub use core::{effective_mode, HealthAgent, HealthCheckRequest, HealthReport};
pub use task_loop::{TaskLoop, TaskTranscript};
