/// Fires every `period` seconds of simulated time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatingTimer {
    pub period: f32,
    elapsed: f32,
}

impl RepeatingTimer {
    pub fn new(period: f32) -> Self {
        Self {
            period,
            elapsed: 0.0,
        }
    }

    /// Returns true once the accumulated time reaches the period. The period
    /// is subtracted so the remainder counts toward the next firing.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.period {
            self.elapsed -= self.period;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_period() {
        let mut timer = RepeatingTimer::new(0.4);
        let fired = (0..100).filter(|_| timer.tick(0.1)).count();
        // 10 seconds at a 0.4s period, allowing for float accumulation.
        assert!((24..=25).contains(&fired), "fired {fired} times");
    }

    #[test]
    fn remainder_carries_over() {
        let mut timer = RepeatingTimer::new(1.0);
        assert!(timer.tick(1.5));
        assert!(!timer.tick(0.25));
        assert!(timer.tick(0.25));
    }

    #[test]
    fn reset_clears_progress() {
        let mut timer = RepeatingTimer::new(1.0);
        assert!(!timer.tick(0.9));
        timer.reset();
        assert!(!timer.tick(0.9));
    }
}
