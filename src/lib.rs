pub mod errors;
pub mod cores;
pub mod modules;
pub mod cli;

// Re-export common items at crate root for benches/tests
pub use errors::Fr3kiError;
