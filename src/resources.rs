//! CPU and memory usage, attached to reconstruction results for reporting
//!
//! CPU usage is measured between two refreshes, so every sample both reads and
//! replaces the previous measurement. The source lives behind a mutex so that
//! concurrent reconstructions can share one sampler.

use std::sync::{Mutex, PoisonError};

use sysinfo::System;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceUsage {
    pub cpu_percent   : f64,
    pub memory_percent: f64,
}

/// Something which can report system load
pub trait UsageSource {
    /// Refresh, then report CPU usage (all cores) since the previous refresh
    fn cpu_percent(&mut self) -> f64;

    /// Refresh, then report the percentage of physical memory in use
    fn memory_percent(&mut self) -> f64;
}

impl UsageSource for System {
    fn cpu_percent(&mut self) -> f64 {
        self.refresh_cpu_usage();
        self.global_cpu_usage() as f64
    }

    fn memory_percent(&mut self) -> f64 {
        self.refresh_memory();
        percent_of(self.used_memory(), self.total_memory())
    }
}

/// `used / total` as a percentage; 0 when `total` is unknown
pub fn percent_of(used: u64, total: u64) -> f64 {
    if total == 0 { return 0.0 }
    100.0 * used as f64 / total as f64
}

pub struct ResourceSampler<S = System> {
    source: Mutex<S>,
}

impl<S: UsageSource> ResourceSampler<S> {

    /// Take the initial CPU measurement, against which the first sample is taken.
    pub fn new(mut source: S) -> Self {
        source.cpu_percent();
        Self { source: Mutex::new(source) }
    }

    /// CPU usage since the previous sample (or since construction), and
    /// current memory usage.
    pub fn sample(&self) -> ResourceUsage {
        // The source holds only counters: a panic elsewhere cannot leave it inconsistent
        let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        let cpu_percent = source.cpu_percent();
        let memory_percent = source.memory_percent();
        ResourceUsage { cpu_percent, memory_percent }
    }
}

impl ResourceSampler<System> {
    /// `None` on platforms `sysinfo` cannot inspect
    pub fn from_system() -> Option<Self> {
        if !sysinfo::IS_SUPPORTED_SYSTEM { return None }
        Some(Self::new(System::new()))
    }
}
