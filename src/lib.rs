// ============================================================================
// Debian .properties Rewriter - Library Interface
// ============================================================================
//
// This module exposes the internal modules for integration testing.
// The main binary (main.rs) uses these modules directly.

pub mod cli;
pub mod mapping;
pub mod rewriter;
pub mod scanner;
