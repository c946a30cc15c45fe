//! Host metrics and their human-readable rendering.

mod format;
mod system;

pub use format::{bytes_to_human, format_uptime, progress_bar};
pub use system::{MetricsError, SystemSampler, SystemSnapshot, UsageStat};

/// Number of cells in a progress bar.
pub const BAR_CELLS: usize = 10;
