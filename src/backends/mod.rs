//! Backend implementations for the inference engine
//!
//! - Tract backend (pure Rust, no external dependencies)

#[cfg(feature = "tract")]
pub mod tract;

// Test utilities for backend testing
#[cfg(test)]
pub mod test_utils;

// Re-export backends based on enabled features
#[cfg(feature = "tract")]
pub use self::tract::TractBackend;
