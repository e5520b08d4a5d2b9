//! Meridian Harness: world-level orchestration for the planner.
//!
//! The harness runs a world through the planner pipeline
//! (`plan` → `execute` → artifact rendering) and packages the result as a
//! run-artifact set. Worlds provide domain data only — the harness owns
//! orchestration, and neither implements planning logic (that is the
//! planner crate's job).

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod contract;
pub mod runner;
pub mod worlds;
