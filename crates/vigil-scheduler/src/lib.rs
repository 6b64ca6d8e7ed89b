pub mod dispatcher;
pub mod job;
pub mod queue;
pub mod scheduler;
pub mod worker;

pub use job::Job;
pub use scheduler::{next_schedule, Scheduler, MIN_SOFT_FAIL_INTERVAL};
pub use worker::WorkerContext;
