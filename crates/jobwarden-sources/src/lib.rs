//! Every kind of event source a job can bind to: cron schedules, fixed
//! intervals, a one-shot init tick, container lifecycle events, log-file
//! tailing, and process-wide web triggers.

pub mod container;
pub mod cron;
pub mod init;
pub mod interval;
pub mod log_file;
pub mod web;

pub use container::ContainerEventSource;
pub use log_file::LogFileSource;
pub use web::WebEventRegistry;
