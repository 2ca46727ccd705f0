//! Time-driven value transitions (fades and snaps)
//!
//! Only the timing and the resulting value are modelled; the platform
//! renders whatever value the surface hands it.

use std::time::{Duration, Instant};

/// Duration of drawer fades and snaps
pub const ANIM_DURATION: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Starts slow, ends fast
    Accelerate,
    /// Starts fast, ends slow
    Decelerate,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Accelerate => t * t,
            Easing::Decelerate => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
    easing: Easing,
}

impl Transition {
    pub fn new(from: f32, to: f32, start: Instant, easing: Easing) -> Self {
        Self {
            from,
            to,
            start,
            duration: ANIM_DURATION,
            easing,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn value_at(&self, now: Instant) -> f32 {
        let t = self.easing.apply(self.progress(now));
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::Accelerate, Easing::Decelerate] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
        assert!(Easing::Accelerate.apply(0.5) < 0.5);
        assert!(Easing::Decelerate.apply(0.5) > 0.5);
    }

    #[test]
    fn test_value_follows_time() {
        let start = Instant::now();
        let fade = Transition::new(1.0, 0.0, start, Easing::Linear);

        assert_eq!(fade.value_at(start), 1.0);
        assert!((fade.value_at(start + Duration::from_millis(100)) - 0.5).abs() < 1e-4);
        assert!(!fade.is_finished(start + Duration::from_millis(199)));
        assert!(fade.is_finished(start + ANIM_DURATION));
        assert_eq!(fade.value_at(start + Duration::from_secs(5)), 0.0);
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let start = Instant::now();
        let snap = Transition::new(-100.0, 0.0, start, Easing::Decelerate)
            .with_duration(Duration::ZERO);
        assert!(snap.is_finished(start));
        assert_eq!(snap.value_at(start), 0.0);
    }
}
