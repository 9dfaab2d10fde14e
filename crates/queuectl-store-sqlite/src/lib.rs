//! # queuectl-store-sqlite
//!
//! SQLite implementation of [`queuectl_core::JobStore`], backing the
//! queue with a single durable file.
//!
//! # Database layout
//!
//! ```sql
//! CREATE TABLE jobs (
//!     id TEXT PRIMARY KEY,
//!     command TEXT NOT NULL,
//!     priority TEXT NOT NULL DEFAULT 'medium',
//!     state TEXT NOT NULL,
//!     attempts INTEGER NOT NULL DEFAULT 0,
//!     max_retries INTEGER NOT NULL DEFAULT 3,
//!     created_at TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     next_retry_at TEXT,
//!     locked_by TEXT,
//!     locked_at TEXT
//! );
//!
//! CREATE TABLE config (
//!     key TEXT PRIMARY KEY,
//!     value TEXT NOT NULL
//! );
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use queuectl_store_sqlite::SqliteJobStore;
//!
//! let store = SqliteJobStore::open("queue.db").await?;
//! ```

mod migrations;
mod store;

pub use migrations::run_migrations;
pub use store::SqliteJobStore;
