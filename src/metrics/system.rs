//! Host metrics collection backed by `sysinfo`.

use std::path::{Path, PathBuf};

use sysinfo::{Disks, MINIMUM_CPU_UPDATE_INTERVAL, System};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::debug;

/// Errors raised while collecting metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Metrics collection task failed: {0}")]
    Task(#[from] JoinError),
}

/// Used and total amount of a resource, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsageStat {
    pub used: u64,
    pub total: u64,
}

impl UsageStat {
    /// Creates a usage stat.
    #[must_use]
    pub const fn new(used: u64, total: u64) -> Self {
        Self { used, total }
    }

    /// Used share in percent; zero when the total is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.used as f64 / self.total as f64 * 100.0
        }
    }
}

/// Point-in-time view of host resources.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSnapshot {
    /// Global CPU usage in percent.
    pub cpu_percent: f64,
    pub physical_cores: Option<usize>,
    pub logical_cores: usize,
    pub memory: UsageStat,
    /// Disk usage of the sampled mount point, if any disk was found.
    pub disk: Option<UsageStat>,
}

/// Collects [`SystemSnapshot`]s.
#[derive(Debug, Clone)]
pub struct SystemSampler {
    disk_path: PathBuf,
}

impl SystemSampler {
    /// Creates a sampler reporting disk usage for `disk_path`.
    #[must_use]
    pub fn new(disk_path: impl Into<PathBuf>) -> Self {
        Self {
            disk_path: disk_path.into(),
        }
    }

    /// Collects a snapshot on a blocking thread.
    ///
    /// Takes at least [`MINIMUM_CPU_UPDATE_INTERVAL`] because CPU usage is
    /// the difference between two samples.
    pub async fn collect(&self) -> Result<SystemSnapshot, MetricsError> {
        let disk_path = self.disk_path.clone();
        let snapshot = tokio::task::spawn_blocking(move || collect_blocking(&disk_path)).await?;
        debug!("Collected system snapshot: {:?}", snapshot);
        Ok(snapshot)
    }
}

fn collect_blocking(disk_path: &Path) -> SystemSnapshot {
    let mut sys = System::new();

    sys.refresh_cpu_usage();
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    let disks = Disks::new_with_refreshed_list();
    let disk = select_disk(
        disks
            .list()
            .iter()
            .map(|d| (d.mount_point(), d.total_space(), d.available_space())),
        disk_path,
    );

    SystemSnapshot {
        cpu_percent: f64::from(sys.global_cpu_usage()),
        physical_cores: sys.physical_core_count(),
        logical_cores: sys.cpus().len(),
        memory: UsageStat::new(sys.used_memory(), sys.total_memory()),
        disk,
    }
}

/// Picks the disk mounted at `path`, or the largest disk when none matches.
///
/// Entries are `(mount point, total bytes, available bytes)`.
fn select_disk<'a>(
    disks: impl Iterator<Item = (&'a Path, u64, u64)>,
    path: &Path,
) -> Option<UsageStat> {
    let mut largest: Option<UsageStat> = None;

    for (mount_point, total, available) in disks {
        let stat = UsageStat::new(total.saturating_sub(available), total);
        if mount_point == path {
            return Some(stat);
        }
        if largest.is_none_or(|l| total > l.total) {
            largest = Some(stat);
        }
    }

    largest
}
