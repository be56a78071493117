//! Change set lifecycle and publish synchronization.
//!
//! A change set groups pending edits to business objects under one name and
//! owner. It moves through OPEN, LOCKED, and FINALIZED; only open change sets
//! accept edits, and each object belongs to at most one non-finalized change
//! set. Publishing locks the change set, hands it to an external system of
//! record, and reports the itemized result on an outbound destination.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//! - Deployment settings in [`config`]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
