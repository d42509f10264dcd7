//! Per-phase wall-clock accounting for `--timing` / `TALLY_TIMING`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

/// Environment variable that switches timing on without the flag.
pub const TIMING_ENV: &str = "TALLY_TIMING";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTiming {
    pub name: String,
    pub count: usize,
    pub total: Duration,
    pub max: Duration,
}

/// Phases in first-recorded order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimingReport {
    pub phases: Vec<PhaseTiming>,
}

thread_local! {
    static SAMPLES: RefCell<Vec<(String, Duration)>> = const { RefCell::new(Vec::new()) };
}

static ENABLED: AtomicBool = AtomicBool::new(false);

#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var(TIMING_ENV)
        .ok()
        .is_some_and(|value| is_truthy(&value))
}

pub fn set_timing_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn clear_timings() {
    SAMPLES.with(|samples| samples.borrow_mut().clear());
}

/// Run `f`, recording its duration under `name` when timing is enabled.
pub fn timed<R>(name: &str, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }
    let started = Instant::now();
    let result = f();
    record(name, started.elapsed());
    result
}

/// Drain this thread's samples into a report.
#[must_use]
pub fn collect_report() -> TimingReport {
    let samples = SAMPLES.with(|samples| std::mem::take(&mut *samples.borrow_mut()));

    let mut order: Vec<String> = Vec::new();
    let mut grouped: BTreeMap<String, PhaseTiming> = BTreeMap::new();
    for (name, elapsed) in samples {
        let phase = grouped.entry(name.clone()).or_insert_with(|| {
            order.push(name.clone());
            PhaseTiming {
                name,
                count: 0,
                total: Duration::ZERO,
                max: Duration::ZERO,
            }
        });
        phase.count += 1;
        phase.total += elapsed;
        phase.max = phase.max.max(elapsed);
    }

    TimingReport {
        phases: order
            .into_iter()
            .filter_map(|name| grouped.remove(&name))
            .collect(),
    }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let phases: Vec<_> = self
            .phases
            .iter()
            .map(|phase| {
                json!({
                    "name": phase.name,
                    "count": phase.count,
                    "total_us": phase.total.as_micros(),
                    "max_us": phase.max.as_micros(),
                })
            })
            .collect();
        json!({ "phases": phases })
    }

    #[must_use]
    pub fn display_table(&self) -> String {
        if self.phases.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let mut out = String::new();
        out.push_str("phase                        count     total       max\n");
        out.push_str("-----------------------------------------------------\n");
        for phase in &self.phases {
            let _ = writeln!(
                out,
                "{:<28} {:>5} {:>9} {:>9}",
                phase.name,
                phase.count,
                format_duration(phase.total),
                format_duration(phase.max)
            );
        }
        out
    }
}

fn record(name: &str, elapsed: Duration) {
    SAMPLES.with(|samples| samples.borrow_mut().push((name.to_string(), elapsed)));
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros >= 1_000_000 {
        format!("{}.{:03}s", micros / 1_000_000, (micros % 1_000_000) / 1_000)
    } else if micros >= 1_000 {
        format!("{}.{:03}ms", micros / 1_000, micros % 1_000)
    } else {
        format!("{micros}µs")
    }
}

fn is_truthy(value: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|truthy| value.eq_ignore_ascii_case(truthy))
}
