//! Meridian Planner: HTN decomposition with re-entrant failure recovery.
//!
//! This crate provides the planning and execution layer for Meridian. It
//! depends only on `meridian_kernel` — it does NOT depend on
//! `meridian_harness`.
//!
//! # Crate dependency graph
//!
//! ```text
//! meridian_kernel  ←  meridian_planner  ←  meridian_harness
//! (facts, domain)     (tree, executor)     (worlds, runner)
//! ```
//!
//! # Key types
//!
//! - [`node::PlanNodeV1`] — one decomposition node with a state snapshot
//! - [`tree::SolutionTreeV1`] — the versioned tree being built and repaired
//! - [`linearize::LinearStepV1`] — one executable step of the linearized plan
//! - [`policy::PlannerPolicyV1`] — retry budget and diagnostic verbosity
//! - [`trace::ExecutionReportV1`] — execution/recovery audit artifact
//! - [`expand::plan`] / [`executor::execute`] — the public surface

#![forbid(unsafe_code)]

pub mod blacklist;
pub mod error;
pub mod executor;
pub mod expand;
pub mod linearize;
pub mod node;
pub mod policy;
pub mod trace;
pub mod tree;
