use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics_lock_poisoned");
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub entity_count: usize,
    /// Simulation time thrown away because a frame hit the tick cap.
    pub dropped_backlog_ms: f32,
}

/// Shared read side of the loop metrics; the loop publishes, anyone may read.
#[derive(Clone, Debug)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl Default for MetricsHandle {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(LoopMetricsSnapshot::default())),
        }
    }
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                *poisoned.into_inner() = snapshot;
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    frame_time_sum: Duration,
    dropped_backlog: Duration,
    entity_count: usize,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            frames: 0,
            ticks: 0,
            frame_time_sum: Duration::ZERO,
            dropped_backlog: Duration::ZERO,
            entity_count: 0,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration, entity_count: usize) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
        self.entity_count = entity_count;
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub(crate) fn record_dropped_backlog(&mut self, dropped: Duration) {
        self.dropped_backlog = self.dropped_backlog.saturating_add(dropped);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            (self.frame_time_sum.as_secs_f32() / self.frames as f32) * 1000.0
        };

        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            tps: self.ticks as f32 / elapsed_seconds,
            frame_time_ms,
            entity_count: self.entity_count,
            dropped_backlog_ms: self.dropped_backlog.as_secs_f32() * 1000.0,
        };

        self.interval_start = now;
        self.frames = 0;
        self.ticks = 0;
        self.frame_time_sum = Duration::ZERO;
        self.dropped_backlog = Duration::ZERO;

        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn poison_lock(lock: &RwLock<LoopMetricsSnapshot>) {
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = lock.write().expect("write guard");
                    panic!("poison metrics lock");
                })
                .join();
        });
    }

    #[test]
    fn snapshot_averages_over_the_interval() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        let base = Instant::now();

        accumulator.record_frame(Duration::from_millis(20), 7);
        accumulator.record_frame(Duration::from_millis(10), 9);
        for _ in 0..6 {
            accumulator.record_tick();
        }
        accumulator.record_dropped_backlog(Duration::from_millis(50));

        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_secs(2))
            .expect("snapshot should be emitted");

        assert!(snapshot.fps <= 2.0);
        assert!(snapshot.tps <= 6.0 && snapshot.tps > 0.0);
        assert!((snapshot.frame_time_ms - 15.0).abs() < 0.001);
        assert_eq!(snapshot.entity_count, 9);
        assert!((snapshot.dropped_backlog_ms - 50.0).abs() < 0.01);
    }

    #[test]
    fn snapshot_resets_counters() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_millis(10));
        let base = Instant::now();
        accumulator.record_dropped_backlog(Duration::from_millis(5));
        accumulator
            .maybe_snapshot(base + Duration::from_secs(1))
            .expect("first snapshot");

        let second = accumulator
            .maybe_snapshot(base + Duration::from_secs(2))
            .expect("second snapshot");
        assert_eq!(second.dropped_backlog_ms, 0.0);
        assert_eq!(second.frame_time_ms, 0.0);
    }

    #[test]
    fn snapshot_not_emitted_before_interval() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(60));
        accumulator.record_frame(Duration::from_millis(16), 0);

        assert!(accumulator.maybe_snapshot(Instant::now()).is_none());
    }

    #[test]
    fn publish_and_read_recover_after_poison() {
        let handle = MetricsHandle::default();
        poison_lock(handle.snapshot.as_ref());

        assert_eq!(handle.snapshot(), LoopMetricsSnapshot::default());

        let expected = LoopMetricsSnapshot {
            fps: 30.0,
            tps: 60.0,
            frame_time_ms: 12.5,
            entity_count: 42,
            dropped_backlog_ms: 0.0,
        };
        handle.publish(expected);
        assert_eq!(handle.snapshot(), expected);
    }
}
