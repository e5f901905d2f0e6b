//! Random pauses between spawn attempts.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::config::PopulationConfig;

/// A uniform pause interval, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPacing {
    min_secs: f64,
    max_secs: f64,
}

impl SpawnPacing {
    /// Create a pacing interval. Bounds are swapped if given in reverse,
    /// and negative or non-finite bounds are clamped to zero.
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        let clean = |secs: f64| if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        let (a, b) = (clean(min_secs), clean(max_secs));
        Self {
            min_secs: a.min(b),
            max_secs: a.max(b),
        }
    }

    /// The pacing configured for the population controller.
    pub fn from_config(config: &PopulationConfig) -> Self {
        Self::new(config.pause_min_secs, config.pause_max_secs)
    }

    /// Shortest pause in seconds.
    pub const fn min_secs(&self) -> f64 {
        self.min_secs
    }

    /// Longest pause in seconds.
    pub const fn max_secs(&self) -> f64 {
        self.max_secs
    }

    /// Draw a pause length.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let secs = if self.max_secs > self.min_secs {
            rng.random_range(self.min_secs..=self.max_secs)
        } else {
            self.min_secs
        };
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }

    /// Draw a pause length and sleep for it. Returns the pause taken.
    pub async fn pause<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let pause = self.sample(rng);
        debug!(seconds = pause.as_secs_f64(), "sleeping before next spawn attempt");
        tokio::time::sleep(pause).await;
        pause
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn samples_stay_within_bounds() {
        let pacing = SpawnPacing::new(2.0, 6.0);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..500 {
            let secs = pacing.sample(&mut rng).as_secs_f64();
            assert!((2.0..=6.0).contains(&secs), "{secs} out of range");
        }
    }

    #[test]
    fn degenerate_interval_is_constant() {
        let pacing = SpawnPacing::new(1.5, 1.5);
        let mut rng = StdRng::seed_from_u64(6);
        assert_eq!(pacing.sample(&mut rng), Duration::from_millis(1500));
    }

    #[test]
    fn reversed_and_negative_bounds_are_cleaned() {
        let pacing = SpawnPacing::new(6.0, 2.0);
        assert!((pacing.min_secs() - 2.0).abs() < f64::EPSILON);
        assert!((pacing.max_secs() - 6.0).abs() < f64::EPSILON);

        let pacing = SpawnPacing::new(-3.0, f64::NAN);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pacing.sample(&mut rng), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_sleeps_for_the_sampled_duration() {
        let pacing = SpawnPacing::new(2.0, 6.0);
        let mut rng = StdRng::seed_from_u64(8);
        let start = tokio::time::Instant::now();
        let taken = pacing.pause(&mut rng).await;
        assert!(start.elapsed() >= taken);
        assert!(taken >= Duration::from_secs(2));
        assert!(taken <= Duration::from_secs(6));
    }
}
