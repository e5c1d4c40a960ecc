//! # framebot-app
//!
//! Application layer: the automation engine, the run scheduler and the
//! **port definitions** (traits) they drive.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `WindowLocator`, `ScreenSampler`, `InputController`: the desktop
//!   - `TemplateSource`: reference images by name
//!   - `JobRepository`, `TaskRepository`, `OperationRepository`: the job tree
//!   - `EventPublisher`: run progress
//! - Score templates against frames (`TemplateMatcher`) and map matches to
//!   screen coordinates (`CoordinateMapper`)
//! - Drive one window with checks, clicks and waits (`AutomationEngine`)
//! - Execute whole jobs on a worker (`RunScheduler`)
//! - Author and exchange jobs (`JobService`)
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `framebot-domain` only (plus `image` for pixel buffers and
//! `tokio` for timers and channels). Never imports adapter crates. Adapters
//! depend on *this* crate, not the reverse.

pub mod automation_engine;
pub mod coordinates;
pub mod event_bus;
pub mod matcher;
pub mod ports;
pub mod scheduler;
pub mod services;

#[cfg(test)]
mod test_support;
