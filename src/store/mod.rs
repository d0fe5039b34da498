// src/store/mod.rs
// =============================================================================
// This module owns the local mirror directory: where each test case lands,
// the cached stage list, and the actual file writes.
// =============================================================================

mod writer;

pub use writer::CaseStore;
