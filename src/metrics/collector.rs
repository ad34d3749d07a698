//! Host metric sampling backed by sysinfo.

use crate::error::{HealthError, Result};
use crate::metrics::{data::Metric, traits::MetricSampler};
use std::io;
use std::path::Path;
use std::time::Duration;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, Networks, RefreshKind, System};

/// Shortest CPU observation window the sampler accepts.
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Samples the local host through sysinfo.
///
/// Every call builds its own sysinfo handles, so nothing is shared between
/// reads and concurrent callers never observe each other's refreshes.
#[derive(Debug, Clone)]
pub struct SystemSampler {
    cpu_window: Duration,
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSampler {
    /// Create a sampler with the default one second CPU window.
    pub fn new() -> Self {
        Self {
            cpu_window: CPU_SAMPLE_WINDOW,
        }
    }

    /// Lengthen the CPU observation window. Values below one second are raised
    /// to one second.
    pub fn with_cpu_window(mut self, window: Duration) -> Self {
        self.cpu_window = window.max(CPU_SAMPLE_WINDOW);
        self
    }

    /// The CPU observation window in use.
    pub fn cpu_window(&self) -> Duration {
        self.cpu_window
    }

    fn ensure_supported(metric: Metric) -> Result<()> {
        if sysinfo::IS_SUPPORTED_SYSTEM {
            Ok(())
        } else {
            Err(HealthError::metric_unavailable(
                metric,
                "platform is not supported by sysinfo",
            ))
        }
    }
}

impl MetricSampler for SystemSampler {
    fn sample_cpu(&self) -> Result<f64> {
        Self::ensure_supported(Metric::Cpu)?;

        let mut system = System::new_with_specifics(
            RefreshKind::new().with_cpu(CpuRefreshKind::new().with_cpu_usage()),
        );
        // The first refresh only establishes a baseline.
        system.refresh_cpu_usage();
        std::thread::sleep(self.cpu_window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        system.refresh_cpu_usage();

        if system.cpus().is_empty() {
            return Err(HealthError::metric_unavailable(
                Metric::Cpu,
                "no CPU information available",
            ));
        }

        Ok(clamp_percent(system.global_cpu_usage() as f64))
    }

    fn sample_memory(&self) -> Result<f64> {
        Self::ensure_supported(Metric::Memory)?;

        let system = System::new_with_specifics(
            RefreshKind::new().with_memory(MemoryRefreshKind::new().with_ram()),
        );
        let total_bytes = system.total_memory();
        if total_bytes == 0 {
            return Err(HealthError::metric_unavailable(
                Metric::Memory,
                "total memory reported as zero",
            ));
        }

        let used_bytes = total_bytes.saturating_sub(system.available_memory());
        Ok(percent_of(used_bytes, total_bytes))
    }

    fn sample_disk(&self, path: &Path) -> Result<f64> {
        Self::ensure_supported(Metric::Disk)?;

        let resolved = path
            .canonicalize()
            .map_err(|_| HealthError::path_not_found(path))?;

        let usage = read_disk_usage(&resolved).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => HealthError::path_not_found(path),
            _ => HealthError::metric_unavailable(Metric::Disk, e.to_string()),
        })?;
        Ok(usage.percent())
    }

    fn sample_network(&self) -> Result<u64> {
        Self::ensure_supported(Metric::Network)?;

        let networks = Networks::new_with_refreshed_list();
        let total = networks.iter().fold(0u64, |acc, (_, data)| {
            acc.saturating_add(data.total_received())
                .saturating_add(data.total_transmitted())
        });
        Ok(total)
    }
}

/// Block counts of one filesystem as reported by `statvfs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    /// Total data blocks (`f_blocks`)
    pub blocks: u64,
    /// Free blocks, including those reserved for root (`f_bfree`)
    pub free: u64,
    /// Free blocks available to unprivileged users (`f_bavail`)
    pub available: u64,
    /// Fragment size in bytes (`f_frsize`)
    pub fragment_size: u64,
}

impl DiskUsage {
    /// Bytes in use.
    pub fn used_bytes(&self) -> u64 {
        self.blocks.saturating_sub(self.free).saturating_mul(self.fragment_size)
    }

    /// Bytes an unprivileged user can still write.
    pub fn available_bytes(&self) -> u64 {
        self.available.saturating_mul(self.fragment_size)
    }

    /// Used space as a percentage of what unprivileged users can address,
    /// rounded to one decimal like `df`. Reserved blocks count as neither
    /// used nor available.
    pub fn percent(&self) -> f64 {
        let used = self.used_bytes();
        let addressable = used.saturating_add(self.available_bytes());
        if addressable == 0 {
            return 0.0;
        }
        (percent_of(used, addressable) * 10.0).round() / 10.0
    }
}

#[cfg(unix)]
fn read_disk_usage(path: &Path) -> io::Result<DiskUsage> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();

    // SAFETY: c_path is NUL-terminated and stat points to writable memory.
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: statvfs returned 0, so stat is initialized.
    let stat = unsafe { stat.assume_init() };

    Ok(DiskUsage {
        blocks: stat.f_blocks as u64,
        free: stat.f_bfree as u64,
        available: stat.f_bavail as u64,
        fragment_size: stat.f_frsize as u64,
    })
}

#[cfg(not(unix))]
fn read_disk_usage(path: &Path) -> io::Result<DiskUsage> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    let disk = disks
        .iter()
        .filter(|disk| path.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().components().count())
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no filesystem holds path"))?;

    // Only byte totals are known here, so reserved space counts as used.
    Ok(DiskUsage {
        blocks: disk.total_space(),
        free: disk.available_space(),
        available: disk.available_space(),
        fragment_size: 1,
    })
}

fn percent_of(used: u64, total: u64) -> f64 {
    clamp_percent(used as f64 / total as f64 * 100.0)
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
