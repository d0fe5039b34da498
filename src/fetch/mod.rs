// src/fetch/mod.rs
// =============================================================================
// This module handles talking to the rcomp-cases service over HTTP.
//
// Currently implements:
// - Building endpoint URLs from the configured base URL
// - Fetching the stage list, stage listings and file contents as JSON
// - Mapping failures to ScrapeError (network / HTTP status / bad JSON)
// =============================================================================

mod client;

pub use client::CaseClient;
