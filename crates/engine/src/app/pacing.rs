use std::time::{Duration, Instant};

const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Fixed-step bookkeeping for one window: how many simulation ticks each
/// redraw owes, and how long to wait before presenting.
#[derive(Debug)]
pub(crate) struct FramePacer {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    present_interval: Option<Duration>,
    backlog: Duration,
    last_frame: Instant,
    last_present: Instant,
}

/// Outcome of one redraw's worth of elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameBudget {
    pub raw_frame_dt: Duration,
    pub ticks: u32,
    pub dropped: Duration,
}

impl FramePacer {
    pub(crate) fn new(
        target_tps: u32,
        max_frame_delta: Duration,
        max_ticks_per_frame: u32,
        max_render_fps: Option<u32>,
        now: Instant,
    ) -> Self {
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / target_tps.max(1) as f64),
            max_frame_delta: if max_frame_delta.is_zero() {
                DEFAULT_MAX_FRAME_DELTA
            } else {
                max_frame_delta
            },
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            present_interval: max_render_fps
                .filter(|fps| *fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / fps as f64)),
            backlog: Duration::ZERO,
            last_frame: now,
            last_present: now,
        }
    }

    pub(crate) fn fixed_dt_seconds(&self) -> f32 {
        self.fixed_dt.as_secs_f32()
    }

    pub(crate) fn max_ticks_per_frame(&self) -> u32 {
        self.max_ticks_per_frame
    }

    pub(crate) fn render_fps_cap(&self) -> Option<u32> {
        self.present_interval
            .map(|interval| (1.0 / interval.as_secs_f64()).round() as u32)
    }

    /// Adds the (clamped) time since the previous frame and takes as many
    /// whole ticks as the per-frame cap allows. Backlog beyond the cap is dropped.
    pub(crate) fn begin_frame(&mut self, now: Instant) -> FrameBudget {
        let raw_frame_dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.backlog = self
            .backlog
            .saturating_add(raw_frame_dt.min(self.max_frame_delta));

        let mut ticks = 0;
        while self.backlog >= self.fixed_dt && ticks < self.max_ticks_per_frame {
            self.backlog -= self.fixed_dt;
            ticks += 1;
        }

        let mut dropped = Duration::ZERO;
        if self.backlog >= self.fixed_dt {
            dropped = self.backlog;
            self.backlog = Duration::ZERO;
        }

        FrameBudget {
            raw_frame_dt,
            ticks,
            dropped,
        }
    }

    /// Time left before the next present is allowed; zero when uncapped.
    pub(crate) fn present_wait(&self, now: Instant) -> Duration {
        let Some(interval) = self.present_interval else {
            return Duration::ZERO;
        };
        interval.saturating_sub(now.saturating_duration_since(self.last_present))
    }

    pub(crate) fn mark_presented(&mut self, now: Instant) {
        self.last_present = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pacer(start: Instant) -> FramePacer {
        FramePacer::new(60, Duration::from_millis(250), 5, Some(60), start)
    }

    #[test]
    fn steady_frame_runs_one_tick() {
        let start = Instant::now();
        let mut pacer = pacer(start);

        let budget = pacer.begin_frame(start + Duration::from_millis(17));
        assert_eq!(budget.ticks, 1);
        assert_eq!(budget.dropped, Duration::ZERO);
    }

    #[test]
    fn long_frame_is_clamped_then_capped() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(60, Duration::from_millis(250), 3, None, start);

        let budget = pacer.begin_frame(start + Duration::from_secs(2));
        assert_eq!(budget.raw_frame_dt, Duration::from_secs(2));
        assert_eq!(budget.ticks, 3);
        assert!(budget.dropped > Duration::ZERO);
        assert!(budget.dropped < Duration::from_millis(250));

        let next = pacer.begin_frame(start + Duration::from_secs(2));
        assert_eq!(next.ticks, 0);
    }

    #[test]
    fn leftover_time_carries_into_the_next_frame() {
        let start = Instant::now();
        let mut pacer = pacer(start);

        assert_eq!(pacer.begin_frame(start + Duration::from_millis(10)).ticks, 0);
        assert_eq!(pacer.begin_frame(start + Duration::from_millis(20)).ticks, 1);
    }

    #[test]
    fn present_wait_only_applies_under_budget() {
        let start = Instant::now();
        let mut pacer = pacer(start);
        pacer.mark_presented(start);

        assert!(pacer.present_wait(start + Duration::from_millis(5)) > Duration::ZERO);
        assert_eq!(
            pacer.present_wait(start + Duration::from_millis(20)),
            Duration::ZERO
        );
    }

    #[test]
    fn zero_settings_fall_back_to_sane_values() {
        let start = Instant::now();
        let pacer = FramePacer::new(0, Duration::ZERO, 0, Some(0), start);

        assert_eq!(pacer.max_ticks_per_frame(), 1);
        assert_eq!(pacer.render_fps_cap(), None);
        assert_eq!(pacer.present_wait(start), Duration::ZERO);
        assert!((pacer.fixed_dt_seconds() - 1.0).abs() < 1e-6);
    }
}
