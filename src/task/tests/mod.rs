//! Unit tests for the task module.

mod context_tests;
mod domain_tests;
