//! Integration tests for page analysis and job orchestration
//!
//! These tests use wiremock to serve pages and link targets, and drive the
//! analyzer and the orchestrator end-to-end against them.

mod analyzer_tests;
mod orchestrator_tests;
