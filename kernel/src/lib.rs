//! Meridian Kernel: the deterministic carrier core of the Meridian planner.
//!
//! # API Surface
//!
//! The kernel exposes three areas:
//!
//! - carrier types — [`value::FactValueV1`], [`state::WorldStateV1`],
//!   [`todo::TodoItemV1`] and friends
//! - [`domain::DomainV1`] — the explicit, immutable action/method registry
//! - [`dispatch::apply_action`] — the single action application entry point,
//!   with panic normalization
//!
//! # Module Dependency Direction
//!
//! `value` ← `state` ← `todo` ← `domain` ← `dispatch`
//!
//! One-way only. No cycles. `canon` and `hash` are leaf utilities used by
//! `state` and by downstream crates for artifact rendering.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod canon;
pub mod dispatch;
pub mod domain;
pub mod hash;
pub mod state;
pub mod todo;
pub mod value;
