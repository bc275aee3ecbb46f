use cadence_core::EntityRef;
use cadence_expr::Expression;
use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::{Exp, Normal};
use serde::{Deserialize, Serialize};

use crate::binding::Binding;
use crate::context::SimContext;
use crate::error::{SimError, SimResult};

/// Where an occurrence falls within its grid slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    /// At the start of the slot.
    #[default]
    Start,
    /// Uniformly within `[slot, slot + interval]`. May spill past the slot.
    Uniform,
}

/// A timestamp perturbation. All offsets on an emitter are summed.
#[derive(Debug, Clone)]
pub enum Offset {
    /// A fixed shift.
    Constant(i64),
    /// Normally distributed, truncated toward zero.
    Normal(Normal<f64>),
    /// Uniform integer in `[low, high]`.
    Uniform {
        /// Inclusive lower bound.
        low: i64,
        /// Inclusive upper bound.
        high: i64,
    },
    /// Exponentially distributed, truncated toward zero.
    Exponential(Exp<f64>),
}

impl Offset {
    /// Normal offset with the given mean and standard deviation.
    pub fn normal(mean: f64, sd: f64) -> SimResult<Self> {
        if !mean.is_finite() {
            return Err(invalid("offset mean", format!("must be finite, got {mean}")));
        }
        Normal::new(mean, sd)
            .map(Self::Normal)
            .map_err(|e| invalid("offset sd", format!("{e}, got {sd}")))
    }

    /// Uniform integer offset in `[low, high]`.
    pub fn uniform(low: i64, high: i64) -> SimResult<Self> {
        if low > high {
            return Err(invalid(
                "offset range",
                format!("low {low} exceeds high {high}"),
            ));
        }
        Ok(Self::Uniform { low, high })
    }

    /// Exponential offset with rate `lambda`.
    pub fn exponential(lambda: f64) -> SimResult<Self> {
        if !(lambda.is_finite() && lambda > 0.0) {
            return Err(invalid(
                "offset lambda",
                format!("must be positive, got {lambda}"),
            ));
        }
        Exp::new(lambda)
            .map(Self::Exponential)
            .map_err(|e| invalid("offset lambda", e.to_string()))
    }

    fn sample(&self, rng: &mut StdRng) -> i64 {
        match self {
            Self::Constant(n) => *n,
            Self::Normal(dist) => rng.sample::<f64, _>(dist).trunc() as i64,
            Self::Uniform { low, high } => rng.random_range(*low..=*high),
            Self::Exponential(dist) => rng.sample::<f64, _>(dist).trunc() as i64,
        }
    }
}

fn invalid(parameter: &'static str, reason: String) -> SimError {
    SimError::Distribution {
        strategy: "interval",
        parameter,
        reason,
    }
}

/// Occurrences on a regular grid `prev, prev + I, ...` below `tick`.
///
/// Offsets are added after the grid is built and may move an occurrence
/// outside `[prev, tick)`.
///
/// Per tick: the interval binding is resolved once at `tick`, all spacing draws are
/// made while building the grid, then each candidate gets one skip draw
/// (when skipping is enabled) and, if it survives, its offset draws.
#[derive(Debug, Clone)]
pub struct IntervalEmitter {
    interval: Binding,
    spacing: Spacing,
    offsets: Vec<Offset>,
    skip_probability: f64,
}

impl Default for IntervalEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalEmitter {
    /// One occurrence per `sim.interval`, at the start of each slot.
    pub fn new() -> Self {
        Self {
            interval: Binding::Expression(Expression::sim_attribute("interval")),
            spacing: Spacing::Start,
            offsets: Vec::new(),
            skip_probability: 0.0,
        }
    }

    /// Set the grid interval. It must resolve to a positive integer.
    pub fn with_interval(mut self, interval: Binding) -> Self {
        self.interval = interval;
        self
    }

    /// Set the slot spacing.
    pub fn with_spacing(mut self, spacing: Spacing) -> Self {
        self.spacing = spacing;
        self
    }

    /// Add an offset.
    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.offsets.push(offset);
        self
    }

    /// Drop each candidate with probability `p`, which must lie in `[0, 1]`.
    pub fn with_skip_probability(mut self, p: f64) -> SimResult<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(invalid(
                "skip_probability",
                format!("must be within [0, 1], got {p}"),
            ));
        }
        self.skip_probability = p;
        Ok(self)
    }

    pub(crate) fn schedule(
        &self,
        ctx: &mut SimContext<'_>,
        parent: &EntityRef,
        prev: i64,
        tick: i64,
    ) -> SimResult<Vec<i64>> {
        if prev >= tick {
            return Ok(Vec::new());
        }

        let resolved = self.interval.resolve(ctx, parent, tick)?;
        let interval = match resolved.as_integer() {
            Some(n) if n > 0 => n,
            _ => {
                return Err(invalid(
                    "interval",
                    format!("must be a positive integer, got {resolved}"),
                ));
            }
        };

        let mut candidates = Vec::new();
        let mut slot = prev;
        while slot < tick {
            let candidate = match self.spacing {
                Spacing::Start => slot,
                Spacing::Uniform => slot.saturating_add(ctx.rng.random_range(0..=interval)),
            };
            candidates.push(candidate);
            match slot.checked_add(interval) {
                Some(next) => slot = next,
                None => break,
            }
        }

        let mut survivors = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if self.skip_probability > 0.0 && ctx.rng.random::<f64>() < self.skip_probability {
                continue;
            }
            let shift = self
                .offsets
                .iter()
                .fold(0i64, |sum, offset| sum.saturating_add(offset.sample(ctx.rng)));
            survivors.push(candidate.saturating_add(shift));
        }
        Ok(survivors)
    }
}
