//! Shared helpers for unit tests.

pub mod fake_driver;
