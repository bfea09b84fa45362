//! Deterministic, pure logic shared by the resolvers and locators.
//!
//! Core modules must be free of I/O side effects. They operate on paths and
//! strings only and return deterministic outputs suitable for tests.

pub mod platform;
pub mod priority;
pub mod query;
pub mod types;
