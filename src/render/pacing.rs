use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::foundation::error::{MapGlueError, MapGlueResult};

/// Rolling window size of [`FrameTimingMonitor`].
pub const MAX_TIMING_SAMPLES: usize = 1000;

const NOMINAL_FRAME_MS: u64 = 16;
const EXCELLENT_ON_TIME_PERCENTAGE: f64 = 95.0;
const ACCEPTABLE_ON_TIME_PERCENTAGE: f64 = 90.0;
const HIGH_COMPOSITOR_DELAY_PERCENTAGE: f64 = 10.0;
const LOW_CONSISTENCY_SCORE: f64 = 80.0;

/// Number of histogram buckets per pacing metric.
pub const PACING_BUCKETS: usize = 6;
/// Length of the raw pacing statistics array.
pub const RAW_PACING_LEN: usize = 1 + 4 * PACING_BUCKETS;

/// avg/min/max/median of one timing series, in nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct TimingSummary {
    /// Mean (integer division).
    pub avg_ns: u64,
    /// Minimum.
    pub min_ns: u64,
    /// Maximum.
    pub max_ns: u64,
    /// Median; the mean of the two middle values for even counts.
    pub median_ns: u64,
}

impl TimingSummary {
    fn from_samples(mut samples: Vec<u64>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        samples.sort_unstable();
        let n = samples.len();
        let sum: u128 = samples.iter().map(|&s| u128::from(s)).sum();
        let median = if n % 2 == 0 {
            let (a, b) = (u128::from(samples[n / 2 - 1]), u128::from(samples[n / 2]));
            ((a + b) / 2) as u64
        } else {
            samples[n / 2]
        };
        Self {
            avg_ns: (sum / n as u128) as u64,
            min_ns: samples[0],
            max_ns: samples[n - 1],
            median_ns: median,
        }
    }
}

fn ms(ns: u64) -> f64 {
    ns as f64 / 1_000_000.0
}

/// Snapshot of the collected frame timings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FrameTimingStats {
    /// CPU (draw) time.
    pub cpu: TimingSummary,
    /// GPU (present) time.
    pub gpu: TimingSummary,
    /// Per-frame `cpu + gpu`.
    pub total: TimingSummary,
    /// Number of samples in the window.
    pub sample_count: usize,
    /// Approximate collection span: `min(samples * 16ms, elapsed)`.
    pub collection_duration_ms: u64,
}

impl FrameTimingStats {
    /// One-line form with averages only.
    pub fn compact(&self) -> String {
        if self.sample_count == 0 {
            return "FrameTimingStats{no samples}".to_owned();
        }
        format!(
            "FrameTimingStats{{samples={}, CPU={:.2}ms, GPU={:.2}ms, Total={:.2}ms}}",
            self.sample_count,
            ms(self.cpu.avg_ns),
            ms(self.gpu.avg_ns),
            ms(self.total.avg_ns)
        )
    }
}

impl fmt::Display for FrameTimingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sample_count == 0 {
            return f.write_str("FrameTimingStats{no samples collected}");
        }
        writeln!(f, "FrameTimingStats{{")?;
        writeln!(
            f,
            "  samples={}, duration={}ms",
            self.sample_count, self.collection_duration_ms
        )?;
        for (label, s) in [("CPU", self.cpu), ("GPU", self.gpu), ("Total", self.total)] {
            writeln!(
                f,
                "  {label}: avg={:.2}ms, min={:.2}ms, max={:.2}ms, median={:.2}ms",
                ms(s.avg_ns),
                ms(s.min_ns),
                ms(s.max_ns),
                ms(s.median_ns)
            )?;
        }
        f.write_str("}")
    }
}

#[derive(Debug)]
struct TimingWindow {
    enabled: bool,
    cpu: Vec<u64>,
    gpu: Vec<u64>,
    next: usize,
    started: Instant,
}

impl TimingWindow {
    fn clear(&mut self) {
        self.cpu.clear();
        self.gpu.clear();
        self.next = 0;
        self.started = Instant::now();
    }
}

/// Rolling window of per-frame timings, guarded by its own lock.
#[derive(Debug)]
pub struct FrameTimingMonitor {
    inner: Mutex<TimingWindow>,
}

impl Default for FrameTimingMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

impl FrameTimingMonitor {
    /// Create a monitor, optionally collecting from the start.
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: Mutex::new(TimingWindow {
                enabled,
                cpu: Vec::with_capacity(MAX_TIMING_SAMPLES),
                gpu: Vec::with_capacity(MAX_TIMING_SAMPLES),
                next: 0,
                started: Instant::now(),
            }),
        }
    }

    /// Enable or disable collection. Disabling drops all samples.
    pub fn set_enabled(&self, enabled: bool) {
        let mut w = self.inner.lock();
        w.enabled = enabled;
        if enabled {
            tracing::info!("frame timing collection enabled");
        } else {
            w.clear();
            tracing::info!("frame timing collection disabled");
        }
    }

    /// Whether samples are being collected.
    pub fn is_enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    /// Record one frame. Ignored while disabled or when either time is negative.
    pub fn add_sample(&self, cpu_ns: i64, gpu_ns: i64) {
        let (Ok(cpu), Ok(gpu)) = (u64::try_from(cpu_ns), u64::try_from(gpu_ns)) else {
            return;
        };
        let mut w = self.inner.lock();
        if !w.enabled {
            return;
        }
        if w.cpu.len() < MAX_TIMING_SAMPLES {
            w.cpu.push(cpu);
            w.gpu.push(gpu);
        } else {
            let i = w.next;
            w.cpu[i] = cpu;
            w.gpu[i] = gpu;
        }
        w.next = (w.next + 1) % MAX_TIMING_SAMPLES;
    }

    /// Drop all samples and restart the collection clock.
    pub fn reset(&self) {
        self.inner.lock().clear();
    }

    /// Summary of the current window, or `None` without samples.
    pub fn stats(&self) -> Option<FrameTimingStats> {
        let w = self.inner.lock();
        let count = w.cpu.len();
        if count == 0 {
            return None;
        }
        let elapsed_ms = u64::try_from(w.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let duration = (count as u64 * NOMINAL_FRAME_MS).min(elapsed_ms);
        let total = w.cpu.iter().zip(&w.gpu).map(|(c, g)| c.saturating_add(*g)).collect();
        Some(FrameTimingStats {
            cpu: TimingSummary::from_samples(w.cpu.clone()),
            gpu: TimingSummary::from_samples(w.gpu.clone()),
            total: TimingSummary::from_samples(total),
            sample_count: count,
            collection_duration_ms: duration,
        })
    }
}

/// Overall verdict on frame delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum PacingAssessment {
    /// At least 95% of frames on time.
    Excellent,
    /// At least 90% of frames on time.
    Acceptable,
    /// Fewer than 90% of frames on time.
    Poor,
}

/// Frame pacer histogram statistics.
///
/// Each histogram has [`PACING_BUCKETS`] buckets indexed by a number of refresh periods.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PacingStats {
    /// Frames counted.
    pub total_frames: u64,
    /// Frames that waited in the compositor queue.
    pub idle_frames: [u64; PACING_BUCKETS],
    /// Frames that missed their presentation deadline.
    pub late_frames: [u64; PACING_BUCKETS],
    /// Refresh periods since the previous frame.
    pub offset_from_previous_frame: [u64; PACING_BUCKETS],
    /// End-to-end latency.
    pub latency_frames: [u64; PACING_BUCKETS],
}

impl PacingStats {
    /// Parse the flat `[total, idle x6, late x6, offset x6, latency x6]` layout.
    pub fn from_raw(raw: &[u64]) -> MapGlueResult<Self> {
        if raw.len() != RAW_PACING_LEN {
            return Err(MapGlueError::render(format!(
                "invalid pacing stats length: {} (expected {RAW_PACING_LEN})",
                raw.len()
            )));
        }
        let bucket = |k: usize| {
            let mut out = [0u64; PACING_BUCKETS];
            out.copy_from_slice(&raw[1 + k * PACING_BUCKETS..1 + (k + 1) * PACING_BUCKETS]);
            out
        };
        Ok(Self {
            total_frames: raw[0],
            idle_frames: bucket(0),
            late_frames: bucket(1),
            offset_from_previous_frame: bucket(2),
            latency_frames: bucket(3),
        })
    }

    /// Sum of all idle buckets.
    pub fn total_idle_frames(&self) -> u64 {
        self.idle_frames.iter().fold(0, |acc, n| acc.saturating_add(*n))
    }

    /// Sum of all late buckets.
    pub fn total_late_frames(&self) -> u64 {
        self.late_frames.iter().fold(0, |acc, n| acc.saturating_add(*n))
    }

    /// Share of frames that were not late, in percent. `0` without frames.
    pub fn on_time_percentage(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        (self.total_frames as f64 - self.total_late_frames() as f64) / self.total_frames as f64
            * 100.0
    }

    /// Share of frames delayed by the compositor, in percent.
    pub fn compositor_delay_percentage(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.total_idle_frames() as f64 / self.total_frames as f64 * 100.0
    }

    /// Share of frames presented zero or one refresh period after the previous one.
    pub fn consistency_score(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        let consistent =
            self.offset_from_previous_frame[0].saturating_add(self.offset_from_previous_frame[1]);
        consistent as f64 / self.total_frames as f64 * 100.0
    }

    /// Classify by on-time percentage.
    pub fn assess(&self) -> PacingAssessment {
        let on_time = self.on_time_percentage();
        if on_time >= EXCELLENT_ON_TIME_PERCENTAGE {
            PacingAssessment::Excellent
        } else if on_time >= ACCEPTABLE_ON_TIME_PERCENTAGE {
            PacingAssessment::Acceptable
        } else {
            PacingAssessment::Poor
        }
    }

    /// Human-readable tuning hints derived from the histograms.
    pub fn recommendations(&self) -> Vec<String> {
        let mut out = Vec::new();
        let delay = self.compositor_delay_percentage();
        if delay > HIGH_COMPOSITOR_DELAY_PERCENTAGE {
            out.push(format!(
                "high compositor delays ({delay:.1}%): reduce rendering complexity or let frames queue less"
            ));
        }
        if self.consistency_score() < LOW_CONSISTENCY_SCORE {
            out.push("inconsistent frame timing: reset frame pacing after scene changes".to_owned());
        }
        let (late, idle) = (self.total_late_frames(), self.total_idle_frames());
        if late > idle.saturating_mul(2) {
            out.push("rendering bottleneck: reduce GPU/CPU work per frame".to_owned());
        } else if idle > late.saturating_mul(2) {
            out.push("compositor bottleneck: frames wait in the queue".to_owned());
        }
        out
    }

    /// Log the summary and recommendations.
    pub fn log_analysis(&self) {
        match self.assess() {
            PacingAssessment::Excellent => tracing::info!(stats = %self, "excellent frame delivery"),
            PacingAssessment::Acceptable => tracing::warn!(stats = %self, "acceptable frame delivery"),
            PacingAssessment::Poor => tracing::error!(stats = %self, "poor frame delivery"),
        }
        for hint in self.recommendations() {
            tracing::info!("{hint}");
        }
    }
}

impl fmt::Display for PacingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PacingStats{{totalFrames={}, onTime={:.1}%, compositorDelay={:.1}%, consistency={:.1}%}}",
            self.total_frames,
            self.on_time_percentage(),
            self.compositor_delay_percentage(),
            self.consistency_score()
        )
    }
}

/// Sleeps out the remainder of a frame budget after each draw.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameRateLimiter {
    expected_frame_time: Option<Duration>,
}

impl FrameRateLimiter {
    /// Limit to `maximum_fps`; values `<= 0` are ignored.
    pub fn set_maximum_fps(&mut self, maximum_fps: i32) {
        if maximum_fps <= 0 {
            return;
        }
        self.expected_frame_time = Some(Duration::from_secs_f64(1.0 / f64::from(maximum_fps)));
    }

    /// Per-frame budget, if limited.
    pub fn expected_frame_time(&self) -> Option<Duration> {
        self.expected_frame_time
    }

    /// Time left in the budget after a frame that took `render_time`.
    pub fn remaining(&self, render_time: Duration) -> Option<Duration> {
        self.expected_frame_time
            .and_then(|budget| budget.checked_sub(render_time))
            .filter(|d| !d.is_zero())
    }
}

/// FPS callback, invoked on the render thread.
pub type FpsListener = Box<dyn FnMut(f64) + Send>;

/// Instantaneous FPS from consecutive draw timestamps.
#[derive(Default)]
pub struct FpsCounter {
    last_frame: Option<Instant>,
    listener: Option<FpsListener>,
    skip_waiting_frames: bool,
}

impl fmt::Debug for FpsCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FpsCounter")
            .field("last_frame", &self.last_frame)
            .field("has_listener", &self.listener.is_some())
            .field("skip_waiting_frames", &self.skip_waiting_frames)
            .finish()
    }
}

impl FpsCounter {
    /// Install or clear the listener.
    pub fn set_listener(&mut self, listener: Option<FpsListener>) {
        self.listener = listener;
        self.last_frame = None;
    }

    /// Do not report frames drawn right after a wait.
    pub fn set_skip_waiting_frames(&mut self, skip: bool) {
        self.skip_waiting_frames = skip;
    }

    /// Register a frame drawn at `now`. Returns the reported FPS, if any.
    pub fn on_frame(&mut self, now: Instant, is_waiting_frame: bool) -> Option<f64> {
        let listener = self.listener.as_mut()?;
        let previous = self.last_frame.replace(now);
        let elapsed = now.checked_duration_since(previous?)?;
        if elapsed.is_zero() || (is_waiting_frame && self.skip_waiting_frames) {
            return None;
        }
        let fps = 1.0 / elapsed.as_secs_f64();
        listener(fps);
        Some(fps)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pacing.rs"]
mod tests;
