//! Compilation and execution of restoration jobs.
//!
//! - [`derived`] turns human-facing strengths into concrete filter parameters
//! - [`filter_chain`] compiles a configuration into an ordered filter chain
//! - [`job`] plans each input and drives the process runner

pub mod derived;
pub mod filter_chain;
pub mod job;

pub use filter_chain::{FilterChain, FilterStage, StageKind, compile_filter_chain};
pub use job::{Engine, JobReport, JobStatus, PlannedJob, RunSummary, compile_and_run, plan_job};
