//! Host resource monitor.
//!
//! Samples CPU and memory on a fixed interval from a background task that
//! is independent of fetch completion. Disk and network throughput come
//! from two readings of cumulative counters: a baseline at construction
//! and a final reading at [`ResourceMonitor::stop`].
//!
//! The sampling task owns its sample buffer and hands it back through its
//! join handle, so samples are only read after the task has observed the
//! stop signal and exited. The most recent sample is additionally published
//! through [`LatestSample`] for the progress reporter.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::config::{BYTES_PER_MB, SAMPLE_INTERVAL};
use crate::metrics;
use crate::shutdown::{ShutdownCoordinator, SharedShutdown};

/// Monitor errors
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Host metrics could not be read right now
    #[error("sampling unavailable: {0}")]
    SamplingUnavailable(String),
}

/// One CPU/memory sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceSample {
    /// Global CPU utilisation (0-100)
    pub cpu_percent: f64,
    /// Used memory in MB
    pub memory_mb: f64,
}

/// Most recent sample, published by the sampler and read lock-free.
///
/// CPU and memory are stored as `f64` bits. A reader racing a publish may
/// see CPU from one sample and memory from the next.
#[derive(Debug, Default)]
pub struct LatestSample {
    cpu_bits: AtomicU64,
    mem_bits: AtomicU64,
    published: AtomicBool,
}

impl LatestSample {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current sample.
    pub fn publish(&self, sample: &ResourceSample) {
        self.cpu_bits.store(sample.cpu_percent.to_bits(), Ordering::Release);
        self.mem_bits.store(sample.memory_mb.to_bits(), Ordering::Release);
        self.published.store(true, Ordering::Release);
    }

    /// The latest sample, or `None` before the first one.
    pub fn get(&self) -> Option<ResourceSample> {
        if !self.published.load(Ordering::Acquire) {
            return None;
        }
        Some(ResourceSample {
            cpu_percent: f64::from_bits(self.cpu_bits.load(Ordering::Acquire)),
            memory_mb: f64::from_bits(self.mem_bits.load(Ordering::Acquire)),
        })
    }
}

/// Cumulative host IO counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoCounters {
    /// Bytes read from disk since boot
    pub disk_read_bytes: u64,
    /// Network bytes sent plus received since boot
    pub net_bytes: u64,
}

/// Averages and rates over a monitored window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResourceUsage {
    /// Mean CPU utilisation (0 when no samples)
    pub avg_cpu: f64,
    /// Mean used memory in MB (0 when no samples)
    pub avg_mem: f64,
    /// Disk read rate in MB/s
    pub disk_io_rate: f64,
    /// Network rate in MB/s
    pub net_io_rate: f64,
}

impl ResourceUsage {
    /// Reduce samples and IO readings to averages and rates.
    ///
    /// Rates are 0 when either reading is missing or `total_elapsed` is zero.
    pub fn from_readings(
        samples: &[ResourceSample],
        baseline: Option<IoCounters>,
        last: Option<IoCounters>,
        total_elapsed: Duration,
    ) -> Self {
        let (avg_cpu, avg_mem) = if samples.is_empty() {
            (0.0, 0.0)
        } else {
            let n = samples.len() as f64;
            (
                samples.iter().map(|s| s.cpu_percent).sum::<f64>() / n,
                samples.iter().map(|s| s.memory_mb).sum::<f64>() / n,
            )
        };

        let secs = total_elapsed.as_secs_f64();
        let rate = |start: u64, end: u64| {
            if secs > 0.0 {
                end.saturating_sub(start) as f64 / BYTES_PER_MB / secs
            } else {
                0.0
            }
        };

        let (disk_io_rate, net_io_rate) = match (baseline, last) {
            (Some(start), Some(end)) => (
                rate(start.disk_read_bytes, end.disk_read_bytes),
                rate(start.net_bytes, end.net_bytes),
            ),
            _ => (0.0, 0.0),
        };

        Self {
            avg_cpu,
            avg_mem,
            disk_io_rate,
            net_io_rate,
        }
    }
}

/// Host metrics collaborator.
pub trait HostMetrics: Send + 'static {
    /// Current CPU utilisation and memory use.
    fn sample_usage(&mut self) -> Result<ResourceSample, MonitorError>;

    /// Current cumulative disk/network counters.
    fn io_counters(&mut self) -> Result<IoCounters, MonitorError>;
}

/// [`HostMetrics`] backed by `sysinfo`.
pub struct SysinfoMetrics {
    system: System,
    disks: Disks,
    networks: Networks,
}

impl SysinfoMetrics {
    /// Create a reader and prime the CPU counters.
    pub fn new() -> Self {
        let mut system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        // CPU usage is a delta between refreshes; the first one only sets the baseline.
        system.refresh_cpu_usage();

        Self {
            system,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl HostMetrics for SysinfoMetrics {
    fn sample_usage(&mut self) -> Result<ResourceSample, MonitorError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(MonitorError::SamplingUnavailable(
                "unsupported platform".to_string(),
            ));
        }
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        Ok(ResourceSample {
            cpu_percent: f64::from(self.system.global_cpu_usage()),
            memory_mb: self.system.used_memory() as f64 / BYTES_PER_MB,
        })
    }

    fn io_counters(&mut self) -> Result<IoCounters, MonitorError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(MonitorError::SamplingUnavailable(
                "unsupported platform".to_string(),
            ));
        }
        self.disks.refresh(true);
        self.networks.refresh(true);

        let disk_read_bytes = self
            .disks
            .list()
            .iter()
            .map(|disk| disk.usage().total_read_bytes)
            .sum();
        let net_bytes = self
            .networks
            .iter()
            .map(|(_, data)| data.total_received() + data.total_transmitted())
            .sum();

        Ok(IoCounters {
            disk_read_bytes,
            net_bytes,
        })
    }
}

type SamplerOutput = (Vec<ResourceSample>, Box<dyn HostMetrics>);

enum MonitorState {
    Idle(Box<dyn HostMetrics>),
    Running {
        stop: SharedShutdown,
        handle: JoinHandle<SamplerOutput>,
    },
}

/// Background CPU/memory sampler plus IO throughput over a run.
pub struct ResourceMonitor {
    interval: Duration,
    baseline: Option<IoCounters>,
    latest: Arc<LatestSample>,
    state: MonitorState,
}

impl ResourceMonitor {
    /// Create a monitor over `source`, taking the IO baseline now.
    pub fn new(mut source: Box<dyn HostMetrics>) -> Self {
        let baseline = match source.io_counters() {
            Ok(counters) => Some(counters),
            Err(e) => {
                warn!("IO baseline unavailable, IO rates will be reported as 0: {}", e);
                None
            }
        };

        Self {
            interval: SAMPLE_INTERVAL,
            baseline,
            latest: Arc::new(LatestSample::new()),
            state: MonitorState::Idle(source),
        }
    }

    /// Handle to the most recent sample.
    pub fn latest(&self) -> Arc<LatestSample> {
        Arc::clone(&self.latest)
    }

    /// Override the sampling interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Begin sampling. The first sample is taken one interval from now.
    /// Calling `start` on a running monitor does nothing.
    pub fn start(&mut self) {
        if matches!(self.state, MonitorState::Running { .. }) {
            return;
        }
        let placeholder = MonitorState::Idle(Box::new(NoMetrics));
        let MonitorState::Idle(mut source) = std::mem::replace(&mut self.state, placeholder) else {
            return;
        };

        let stop = ShutdownCoordinator::shared();
        let interval = self.interval;
        let latest = Arc::clone(&self.latest);

        let handle = tokio::spawn({
            let stop = stop.clone();
            async move {
                let mut samples = Vec::new();
                let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        biased;
                        _ = stop.wait_for_shutdown() => break,
                        _ = ticker.tick() => {
                            if stop.is_shutdown_requested() {
                                break;
                            }
                            match source.sample_usage() {
                                Ok(sample) => {
                                    metrics::record_host_sample(&sample);
                                    latest.publish(&sample);
                                    samples.push(sample);
                                }
                                Err(e) => warn!("Skipping resource sample: {}", e),
                            }
                        }
                    }
                }

                debug!(samples = samples.len(), "Resource sampler stopped");
                (samples, source)
            }
        });

        self.state = MonitorState::Running { stop, handle };
    }

    /// Stop sampling and reduce everything collected to a [`ResourceUsage`].
    ///
    /// Signals the sampler, waits one sampling interval, joins the sampler,
    /// and only then takes the final IO reading.
    pub async fn stop(self, total_elapsed: Duration) -> ResourceUsage {
        let (samples, mut source) = match self.state {
            MonitorState::Idle(source) => (Vec::new(), source),
            MonitorState::Running { stop, handle } => {
                stop.request_shutdown();
                tokio::time::sleep(self.interval).await;
                match handle.await {
                    Ok(output) => output,
                    Err(e) => {
                        warn!("Resource sampler task failed: {}", e);
                        return ResourceUsage::default();
                    }
                }
            }
        };

        let last = match source.io_counters() {
            Ok(counters) => Some(counters),
            Err(e) => {
                warn!("Final IO reading unavailable: {}", e);
                None
            }
        };

        ResourceUsage::from_readings(&samples, self.baseline, last, total_elapsed)
    }
}

/// Stand-in source held only while the real one is moved into the sampler.
struct NoMetrics;

impl HostMetrics for NoMetrics {
    fn sample_usage(&mut self) -> Result<ResourceSample, MonitorError> {
        Err(MonitorError::SamplingUnavailable("monitor not idle".to_string()))
    }

    fn io_counters(&mut self) -> Result<IoCounters, MonitorError> {
        Err(MonitorError::SamplingUnavailable("monitor not idle".to_string()))
    }
}
