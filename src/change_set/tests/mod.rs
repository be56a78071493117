//! Unit tests for change set domain rules and services.
