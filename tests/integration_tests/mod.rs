//! Integration tests module
//!
//! End-to-end tests for the weekly report, including:
//! - Complete fetch → rank → deliver → snapshot runs
//! - Delivery channels against a mock chat API
//! - Error handling scenarios

pub mod delivery_test;
pub mod error_scenarios;
pub mod pipeline_test;
