//! # queuectl-core
//!
//! Durable job queue domain layer: the `Job`/`Config` data model, the
//! [`JobStore`] trait a concrete backend must implement, and the pure
//! [`retry::decide_after_failure`] policy that governs backoff and
//! Dead Letter Queue promotion.
//!
//! ## Key principle
//!
//! **The store decides nothing, the retry policy touches nothing.**
//! [`JobStore`] is a durable key/value-ish persistence contract with one
//! atomic primitive, [`JobStore::claim_next_job`], that collapses
//! select-then-update into a single serialized transaction. Everything
//! about *when* a failed job should run again is a pure function over
//! `(attempts, config, now)` with no I/O — see [`retry`].
//!
//! ## Guarantees
//!
//! - Exactly one worker ever holds a claimed job at a time: claims are
//!   linearizable.
//! - A job's lifecycle transitions are always persisted before the call
//!   that caused them returns.
//! - `state == Processing` if and only if `locked_by`/`locked_at` are set.
//!
//! This crate has no I/O of its own; [`queuectl_store_sqlite`] provides the
//! concrete, durable implementation of [`JobStore`].

mod config;
mod error;
mod model;
pub mod retry;
mod store;

pub use config::{ConfigDefaults, CONFIG_BACKOFF_BASE, CONFIG_BACKOFF_INITIAL_DELAY, CONFIG_MAX_RETRIES};
pub use error::StoreError;
pub use model::{Job, JobPatch, JobState, Priority};
pub use retry::Decision;
pub use store::{JobCounts, JobStore, PriorityCounts};
