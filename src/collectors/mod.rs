/// File system name filter
pub mod filter;

/// Per-filesystem group and user usage collector
pub mod usage_collector;

pub use filter::{filter_filesystems, FilesystemFilter};
pub use usage_collector::UsageCollector;
