//! # framebot-domain
//!
//! Pure domain model for the framebot window automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps, geometry
//! - Define **Jobs** (automation units bound to a window title)
//! - Define **Tasks** (ordered step groups inside a job)
//! - Define **Operations** (click-by-image, click-by-percentage, wait)
//! - The ordering-completion rule for explicit child order lists
//! - Template naming conventions and match modes
//! - Run state machine and run reports
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod geometry;
pub mod id;
pub mod time;

pub mod job;
pub mod operation;
pub mod ordering;
pub mod run;
pub mod task;
pub mod template;
