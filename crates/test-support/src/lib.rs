//! Test helpers shared by the workspace crates.
//!
//! Nothing in here is used by production code paths.

mod fixtures;
mod stub;

pub use fixtures::{design_result_fixture, design_result_for};
pub use stub::{CapturedRequest, PATTERN_PATH, StubBehavior, StubDesignApi};
