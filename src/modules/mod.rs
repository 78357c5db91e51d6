pub mod fuzz_scan;

// 导出模块级 API
pub use fuzz_scan::{FuzzOrchestrator, FuzzScanConfig, run_fuzz_scan};
