//! Post-run analysis and textual reporting.
//!
//! Pure, single-threaded reducers over the final counter and slot values.
//! Both reports render a plain-text block suitable for test logs and
//! terminal output.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::{RunConfig, VisibilityConfig};
use crate::metrics::Stats;
use crate::runner::RunOutcome;
use crate::visibility::VisibilityOutcome;

/// Histogram bucket boundaries. Assignment is inclusive-lower /
/// exclusive-upper per boundary, giving seven buckets including the open
/// ends below 1µs and at 100ms and above.
pub const HISTOGRAM_BOUNDS: [Duration; 6] = [
    Duration::from_micros(1),
    Duration::from_micros(10),
    Duration::from_micros(100),
    Duration::from_millis(1),
    Duration::from_millis(10),
    Duration::from_millis(100),
];

const BUCKET_LABELS: [&str; 7] = [
    "<1µs",
    "1µs-10µs",
    "10µs-100µs",
    "100µs-1ms",
    "1ms-10ms",
    "10ms-100ms",
    "100ms+",
];

/// Fixed-bucket latency distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatencyHistogram {
    counts: [u64; 7],
}

impl LatencyHistogram {
    /// Bucket every non-miss slot value (nanoseconds; negatives are misses
    /// and are skipped).
    pub fn from_latencies(latencies: &[i64]) -> Self {
        let mut counts = [0u64; 7];
        for &nanos in latencies {
            if nanos < 0 {
                continue;
            }
            counts[Self::bucket(Duration::from_nanos(nanos as u64))] += 1;
        }
        Self { counts }
    }

    fn bucket(latency: Duration) -> usize {
        HISTOGRAM_BOUNDS
            .iter()
            .position(|bound| latency < *bound)
            .unwrap_or(HISTOGRAM_BOUNDS.len())
    }

    pub fn counts(&self) -> &[u64; 7] {
        &self.counts
    }

    pub fn labels() -> [&'static str; 7] {
        BUCKET_LABELS
    }
}

/// Min/avg/max over the non-miss latencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
}

impl LatencySummary {
    /// `None` when no probe succeeded.
    pub fn from_latencies(latencies: &[i64]) -> Option<Self> {
        let mut hits = 0u64;
        let mut total: u128 = 0;
        let mut min = i64::MAX;
        let mut max = i64::MIN;
        for &nanos in latencies {
            if nanos < 0 {
                continue;
            }
            hits += 1;
            total += nanos as u128;
            min = min.min(nanos);
            max = max.max(nanos);
        }
        if hits == 0 {
            return None;
        }
        Some(Self {
            min: Duration::from_nanos(min as u64),
            max: Duration::from_nanos(max as u64),
            mean: Duration::from_nanos((total / hits as u128) as u64),
        })
    }
}

/// Throughput report for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub stats: Stats,
    pub elapsed: Duration,
    pub workers: usize,
    pub batch_size: usize,
    pub key_size: usize,
    pub value_size: usize,
    pub read_ratio: f64,
    pub sync_writes: bool,
}

impl RunReport {
    pub fn new(config: &RunConfig, outcome: &RunOutcome) -> Self {
        Self {
            stats: outcome.stats,
            elapsed: outcome.elapsed,
            workers: config.workers,
            batch_size: config.batch_size,
            key_size: config.key_size,
            value_size: config.value_size,
            read_ratio: config.read_ratio,
            sync_writes: config.durability.is_sync(),
        }
    }

    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.stats.total_ops() as f64 / secs
    }

    /// Plain-text block in the shape the tests and benches print.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let line = "=".repeat(44);
        out.push_str(&format!("{line}\n"));
        out.push_str("throughput run\n");
        out.push_str(&format!(
            "  total ops:     {} (reads: {}, writes: {})\n",
            self.stats.total_ops(),
            self.stats.read_ops,
            self.stats.write_ops
        ));
        out.push_str(&format!("  workers:       {}\n", self.workers));
        out.push_str(&format!("  batch size:    {}\n", self.batch_size));
        out.push_str(&format!(
            "  key/value:     {} / {} bytes\n",
            self.key_size, self.value_size
        ));
        out.push_str(&format!("  read ratio:    {:.2}\n", self.read_ratio));
        out.push_str(&format!("  sync writes:   {}\n", self.sync_writes));
        out.push_str(&format!(
            "  elapsed:       {}\n",
            format_duration(self.elapsed)
        ));
        out.push_str(&format!("  throughput:    {:.2} ops/sec\n", self.ops_per_sec()));
        out.push_str(&format!("  errors:        {}\n", self.stats.errors));
        out.push_str(&format!("{line}\n"));
        out
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Visibility report: success/miss ratios, latency summary, distribution.
#[derive(Debug, Clone, Serialize)]
pub struct VisibilityReport {
    pub write_count: usize,
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub sync_writes: bool,
    pub summary: Option<LatencySummary>,
    pub histogram: LatencyHistogram,
}

impl VisibilityReport {
    pub fn new(config: &VisibilityConfig, outcome: &VisibilityOutcome) -> Self {
        let hits = outcome
            .latencies
            .iter()
            .filter(|&&nanos| nanos >= 0)
            .count() as u64;
        Self {
            write_count: config.write_count,
            hits,
            misses: outcome.misses,
            errors: outcome.stats.errors,
            sync_writes: config.durability.is_sync(),
            summary: LatencySummary::from_latencies(&outcome.latencies),
            histogram: LatencyHistogram::from_latencies(&outcome.latencies),
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.write_count == 0 {
            return 0.0;
        }
        self.hits as f64 / self.write_count as f64
    }

    pub fn miss_rate(&self) -> f64 {
        if self.write_count == 0 {
            return 0.0;
        }
        self.misses as f64 / self.write_count as f64
    }

    /// Plain-text block; only non-empty histogram buckets are listed.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let line = "=".repeat(44);
        out.push_str(&format!("{line}\n"));
        out.push_str("write visibility\n");
        out.push_str(&format!("  writes:        {}\n", self.write_count));
        out.push_str(&format!(
            "  observed:      {} ({:.1}%)\n",
            self.hits,
            self.success_rate() * 100.0
        ));
        out.push_str(&format!(
            "  misses:        {} ({:.1}%)\n",
            self.misses,
            self.miss_rate() * 100.0
        ));
        out.push_str(&format!("  sync writes:   {}\n", self.sync_writes));
        if let Some(summary) = &self.summary {
            out.push_str(&format!(
                "  latency:       min {} / mean {} / max {}\n",
                format_duration(summary.min),
                format_duration(summary.mean),
                format_duration(summary.max)
            ));
            out.push_str("  distribution:\n");
            for (label, count) in LatencyHistogram::labels()
                .iter()
                .zip(self.histogram.counts())
            {
                if *count > 0 {
                    out.push_str(&format!(
                        "    {:<11} {} ({:.1}%)\n",
                        label,
                        count,
                        *count as f64 / self.hits as f64 * 100.0
                    ));
                }
            }
        }
        if self.errors > 0 {
            out.push_str(&format!("  errors:        {}\n", self.errors));
        }
        out.push_str(&format!("{line}\n"));
        out
    }
}

impl fmt::Display for VisibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Format a duration with the unit that keeps the number readable.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos >= 1_000_000_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else if nanos >= 1_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else if nanos >= 1_000 {
        format!("{:.2}µs", nanos as f64 / 1_000.0)
    } else {
        format!("{nanos}ns")
    }
}
