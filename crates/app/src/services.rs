//! Application services: use-cases over the storage ports.

pub mod job_service;

pub use job_service::{JobBundle, JobService, TaskBundle};
