//! Integration test suite for kiln.
//!
//! These tests build small project trees in temporary directories and run
//! the standard `lint` -> `build` pipeline over them, both through the
//! library and through the `kiln` binary.
//!
//! # Test Categories
//!
//! - `pipeline_e2e`: Gate and stage behaviour through `Pipeline::run`
//! - `cli`: Exit codes and report output of the binary
//! - `behaviour`: Transpiled code run under `node` (skipped without it)

mod fixtures;

mod behaviour;
mod cli;
mod pipeline_e2e;
