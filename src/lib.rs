//! Changeset-sync: change set lifecycle and publish synchronization.
//!
//! This crate groups pending edits to business objects into change sets,
//! enforces object exclusivity and a monotonic lifecycle, and drives the
//! asynchronous pipeline that publishes a locked change set to an external
//! system of record.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence, publishing, and
//!   messaging
//! - **Adapters**: Concrete implementations of ports (in-memory storage and
//!   `tokio` channels)
//! - **Services**: Management, membership, and the publish pipeline
//!
//! # Modules
//!
//! - [`change_set`]: Change set lifecycle, membership, and publishing

pub mod change_set;
