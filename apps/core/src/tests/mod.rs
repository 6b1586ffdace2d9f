//! Test Module
//!
//! Cross-module test suites for the health chat brain.
//!
//! ## Test Categories
//! - `brain_tests`: Normalization, keyword index, urgency detection, intent loading
//! - `processor_tests`: End-to-end question processing, reload, reproducibility
