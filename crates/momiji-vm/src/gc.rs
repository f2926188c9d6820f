//! Collector configuration and accounting (spec §4.7).
//!
//! Grounded on `fgc::config::GcConfig` / `fgc::stats::GcStats`'s shape —
//! a plain config struct plus a cycle-report struct — simplified from
//! `fgc`'s concurrent, generational, colored-pointer collector down to the
//! spec's single-threaded tricolor mark-sweep (Non-goals §1 exclude
//! multithreading).

/// Tuning knobs threaded down from `momiji-cli`'s `Config` (spec §10.3).
#[derive(Clone, Copy, Debug)]
pub struct GcConfig {
    /// `nextCollection = allocatedBytes * grow_factor` after a cycle.
    pub grow_factor: f64,
    /// Collect before every allocation growth (`DEBUG_STRESS_GC`, spec
    /// §4.7's "Allocation accounting").
    pub stress: bool,
    /// Byte threshold before the very first collection can trigger.
    pub initial_threshold: usize,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self { grow_factor: 2.0, stress: false, initial_threshold: 1024 * 1024 }
    }
}

/// A report of one completed collection cycle, logged via `tracing` at
/// `debug!` (spec §10.2).
#[derive(Clone, Copy, Debug, Default)]
pub struct GcCycleReport {
    pub objects_freed: usize,
    pub bytes_before: usize,
    pub bytes_after: usize,
}

#[derive(Default)]
pub struct GcStats {
    pub cycles_run: u64,
    pub total_objects_freed: u64,
}

impl GcStats {
    pub fn record(&mut self, report: GcCycleReport) {
        self.cycles_run += 1;
        self.total_objects_freed += report.objects_freed as u64;
    }
}
