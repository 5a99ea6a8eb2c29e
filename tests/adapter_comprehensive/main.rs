//! Adapter Comprehensive Test Suite
//!
//! End-to-end tests through the `redisugar` facade crate, against the
//! in-process store.
//!
//! ## Test Tier Structure
//!
//! - **Tier 1: Invariants** (fast, must pass)
//!   Slice assignment, set algebra and score ordering laws.
//!
//! - **Tier 2: Scenarios** (workflow tests)
//!   Multi-step use of several adapters sharing one namespace.
//!
//! - **Tier 3: Stress** (opt-in with #[ignore], slow)
//!   Many handles mutating one key from several threads.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test adapter_comprehensive
//!
//! # Stress tests
//! cargo test --test adapter_comprehensive stress -- --ignored
//! ```

mod test_utils;

// Tier 1: Invariants
mod list_invariant_tests;
mod set_algebra_tests;
mod sorted_set_invariant_tests;

// Tier 2: Scenarios
mod namespace_scenario_tests;
mod scalar_scenario_tests;

// Tier 3: Stress
mod shared_handle_stress_tests;
