//! Adapter implementations for change set ports.

pub mod memory;
