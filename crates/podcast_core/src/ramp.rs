use std::time::Duration;

/// Interval between two animation frames.
pub const DEFAULT_TICK: Duration = Duration::from_millis(20);

/// Lazy, strictly increasing sequence of percentages from `from` (exclusive)
/// to `to` (inclusive), one value per tick.
///
/// The final value is always exactly `to`, independent of float drift.
/// A ramp with `from == to` yields nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRamp {
    from: f64,
    to: f64,
    tick: Duration,
    steps: u32,
    emitted: u32,
    current: f64,
}

impl ProgressRamp {
    pub fn new(from: f64, to: f64, duration: Duration, tick: Duration) -> Self {
        let to = to.max(from);
        let steps = if to > from {
            step_count(duration, tick)
        } else {
            0
        };
        Self {
            from,
            to,
            tick,
            steps,
            emitted: 0,
            current: from,
        }
    }

    /// Last emitted value, or the start value before the first tick.
    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    pub fn remaining(&self) -> u32 {
        self.steps - self.emitted
    }

    pub fn is_finished(&self) -> bool {
        self.emitted >= self.steps
    }

    /// Raises the endpoint. The ramp restarts from its current value and
    /// spends `duration` reaching the new target. Lower targets are ignored.
    pub fn retarget(&mut self, to: f64, duration: Duration) -> bool {
        if to <= self.to {
            return false;
        }
        self.from = self.current;
        self.to = to;
        self.steps = step_count(duration, self.tick);
        self.emitted = 0;
        true
    }
}

impl Iterator for ProgressRamp {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.is_finished() {
            return None;
        }
        self.emitted += 1;
        let value = if self.emitted == self.steps {
            self.to
        } else {
            let fraction = f64::from(self.emitted) / f64::from(self.steps);
            self.from + (self.to - self.from) * fraction
        };
        self.current = value;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining() as usize;
        (remaining, Some(remaining))
    }
}

fn step_count(duration: Duration, tick: Duration) -> u32 {
    let tick = tick.as_nanos();
    if tick == 0 {
        return 1;
    }
    let steps = duration.as_nanos().div_ceil(tick).max(1);
    u32::try_from(steps).unwrap_or(u32::MAX)
}

/// Converts a server fraction to whole percent, rounding down.
pub fn percent_from_fraction(fraction: f64) -> u8 {
    if fraction.is_nan() {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * 100.0).floor() as u8
}
