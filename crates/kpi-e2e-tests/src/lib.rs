//! End-to-end tests for kpiwatch.
//!
//! These tests run the full batch:
//! - Grid files through extraction to the dataset document
//! - The three checks against file-backed ledgers
//! - Idempotence across repeated runs

#![cfg(test)]
