pub mod entities;
pub mod license;

// Re-export tracing for use in this crate
pub use tracing;
