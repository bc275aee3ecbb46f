use rand::Rng;
use rand_distr::Poisson;

use crate::context::SimContext;
use crate::error::{SimError, SimResult};

/// Upper bound on arrivals drawn for one window.
const MAX_ARRIVALS: usize = 1 << 24;

/// Homogeneous Poisson arrivals: `rate` events per `time_interval` time units.
#[derive(Debug, Clone, PartialEq)]
pub struct PoissonEmitter {
    rate: f64,
    time_interval: f64,
}

fn invalid(parameter: &'static str, reason: String) -> SimError {
    SimError::Distribution {
        strategy: "poisson",
        parameter,
        reason,
    }
}

impl PoissonEmitter {
    /// `rate` events per time unit.
    pub fn new(rate: f64) -> SimResult<Self> {
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(invalid(
                "rate",
                format!("must be finite and non-negative, got {rate}"),
            ));
        }
        Ok(Self {
            rate,
            time_interval: 1.0,
        })
    }

    /// Express the rate per `time_interval` time units instead of per unit.
    pub fn with_time_interval(mut self, time_interval: f64) -> SimResult<Self> {
        if !(time_interval.is_finite() && time_interval > 0.0) {
            return Err(invalid(
                "time_interval",
                format!("must be positive, got {time_interval}"),
            ));
        }
        self.time_interval = time_interval;
        Ok(self)
    }

    /// Events per time unit.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Time units the rate refers to.
    pub fn time_interval(&self) -> f64 {
        self.time_interval
    }

    pub(crate) fn schedule(
        &self,
        ctx: &mut SimContext<'_>,
        prev: i64,
        tick: i64,
    ) -> SimResult<Vec<i64>> {
        if prev >= tick {
            return Ok(Vec::new());
        }
        let mean = self.rate * (tick - prev) as f64 / self.time_interval;
        if mean <= 0.0 {
            return Ok(Vec::new());
        }
        if mean > MAX_ARRIVALS as f64 {
            return Err(too_many_arrivals(mean));
        }

        let dist = Poisson::new(mean)
            .map_err(|e| invalid("rate", format!("mean {mean} per window: {e}")))?;
        let count: f64 = ctx.rng.sample(dist);
        if count > MAX_ARRIVALS as f64 {
            return Err(too_many_arrivals(mean));
        }

        let mut stamps: Vec<i64> = (0..count as usize)
            .map(|_| ctx.rng.random_range(prev..tick))
            .collect();
        stamps.sort_unstable();
        Ok(stamps)
    }
}

fn too_many_arrivals(mean: f64) -> SimError {
    invalid(
        "rate",
        format!("mean {mean} per window exceeds {MAX_ARRIVALS} arrivals"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SimState;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn run(emitter: &PoissonEmitter, seed: u64, prev: i64, tick: i64) -> Vec<i64> {
        let state = SimState::new(seed, 0, 60);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ctx = SimContext::new(&state, &mut rng);
        emitter.schedule(&mut ctx, prev, tick).unwrap()
    }

    #[test]
    fn zero_rate_or_window_yields_nothing() {
        assert!(run(&PoissonEmitter::new(0.0).unwrap(), 1, 0, 3600).is_empty());
        assert!(run(&PoissonEmitter::new(5.0).unwrap(), 1, 10, 10).is_empty());
    }

    #[test]
    fn empirical_mean_matches_rate() {
        // 2 events per 60 units over a 600 unit window: mean 20.
        let emitter = PoissonEmitter::new(2.0)
            .unwrap()
            .with_time_interval(60.0)
            .unwrap();
        let trials = 400;
        let total: usize = (0..trials).map(|seed| run(&emitter, seed, 0, 600).len()).sum();
        let mean = total as f64 / trials as f64;
        assert!((mean - 20.0).abs() < 1.0, "mean was {mean}");
    }

    #[test]
    fn parameters_validated() {
        assert!(PoissonEmitter::new(-1.0).is_err());
        assert!(PoissonEmitter::new(f64::INFINITY).is_err());
        let ok = PoissonEmitter::new(1.0).unwrap();
        assert!(ok.clone().with_time_interval(0.0).is_err());
        assert!(ok.with_time_interval(-3.0).is_err());
    }

    #[test]
    fn runaway_rate_is_rejected() {
        let state = SimState::new(1, 0, 60);
        let mut rng = StdRng::seed_from_u64(1);
        let mut ctx = SimContext::new(&state, &mut rng);
        let emitter = PoissonEmitter::new(1e9).unwrap();
        assert!(matches!(
            emitter.schedule(&mut ctx, 0, 3600),
            Err(SimError::Distribution {
                strategy: "poisson",
                parameter: "rate",
                ..
            })
        ));
    }

    proptest! {
        #[test]
        fn stamps_sorted_within_window(seed in 0u64..1000, prev in -5_000i64..5_000, len in 1i64..5_000, rate in 0.0f64..0.05) {
            let stamps = run(&PoissonEmitter::new(rate).unwrap(), seed, prev, prev + len);
            prop_assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(stamps.iter().all(|ts| (prev..prev + len).contains(ts)));
        }
    }
}
