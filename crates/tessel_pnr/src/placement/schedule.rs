//! Annealing schedule components.
//!
//! A [`Schedule`] bundles four pluggable policies that run at the end of each
//! update cycle: warming, cooling, distance limiting, and the termination
//! check. The defaults are built from [`PlaceConfig`].

use crate::placement::state::SaState;
use tessel_config::PlaceConfig;

/// Raises the temperature until enough moves are accepted.
pub trait Warmer {
    /// Updates `temperature` and `warming`.
    fn warm(&mut self, state: &mut SaState);
}

/// Lowers the temperature once warming has finished.
pub trait Cooler {
    /// Updates `temperature`.
    fn cool(&mut self, state: &mut SaState);
}

/// Adapts the move distance limit to the acceptance rate.
pub trait Limiter {
    /// Updates `distance_limit` and `distance_limit_int`.
    fn limit(&mut self, state: &mut SaState);
}

/// Decides when annealing has converged.
pub trait DoneCheck {
    /// Returns `true` to stop annealing.
    fn done(&self, state: &SaState) -> bool;
}

/// Multiplies the temperature while the acceptance ratio is below a target.
///
/// The target decays each warming cycle so warming always ends.
#[derive(Debug, Clone)]
pub struct DefaultWarmer {
    ratio: f64,
    multiplier: f64,
    decay: f64,
}

impl Warmer for DefaultWarmer {
    fn warm(&mut self, state: &mut SaState) {
        if !state.warming {
            return;
        }
        if state.recent_successful_moves == 0 || state.accept_ratio() >= self.ratio {
            state.warming = false;
            return;
        }
        state.temperature *= self.multiplier;
        self.ratio *= self.decay;
    }
}

/// Geometric cooling: `T *= alpha`.
#[derive(Debug, Clone)]
pub struct DefaultCooler {
    alpha: f64,
}

impl Cooler for DefaultCooler {
    fn cool(&mut self, state: &mut SaState) {
        if !state.warming {
            state.temperature *= self.alpha;
        }
    }
}

/// Shrinks the limit when fewer than `ratio` of moves are accepted and grows
/// it otherwise.
#[derive(Debug, Clone)]
pub struct DefaultLimiter {
    ratio: f64,
    minimum: f64,
}

impl Limiter for DefaultLimiter {
    fn limit(&mut self, state: &mut SaState) {
        if state.warming {
            return;
        }
        let upper = state.max_distance_limit.max(self.minimum);
        let next = state.distance_limit * (1.0 - self.ratio + state.accept_ratio());
        state.distance_limit = next.max(self.minimum).min(upper);
        state.distance_limit_int = state.distance_limit as u32;
    }
}

/// Stops once warming has ended and the average accepted-move deviation
/// drops below `atol`.
#[derive(Debug, Clone)]
pub struct DefaultDone {
    atol: f64,
}

impl DoneCheck for DefaultDone {
    fn done(&self, state: &SaState) -> bool {
        !state.warming && state.deviation < self.atol
    }
}

/// The four schedule policies used by the annealer.
#[derive(Debug, Clone)]
pub struct Schedule<W, C, L, F> {
    /// Warming policy.
    pub warmer: W,
    /// Cooling policy.
    pub cooler: C,
    /// Distance limit policy.
    pub limiter: L,
    /// Termination check.
    pub done: F,
}

/// The schedule built from configuration defaults.
pub type DefaultSchedule = Schedule<DefaultWarmer, DefaultCooler, DefaultLimiter, DefaultDone>;

impl DefaultSchedule {
    /// Builds the default policies from the placement configuration.
    pub fn from_config(config: &PlaceConfig) -> Self {
        Self {
            warmer: DefaultWarmer {
                ratio: config.warm.ratio,
                multiplier: config.warm.multiplier,
                decay: config.warm.decay,
            },
            cooler: DefaultCooler {
                alpha: config.cool.alpha,
            },
            limiter: DefaultLimiter {
                ratio: config.limit.ratio,
                minimum: config.limit.minimum,
            },
            done: DefaultDone {
                atol: config.done.atol,
            },
        }
    }
}

impl<W: Warmer, C: Cooler, L: Limiter, F: DoneCheck> Schedule<W, C, L, F> {
    /// Runs warm, cool, and limit in order.
    pub(crate) fn step(&mut self, state: &mut SaState) {
        self.warmer.warm(state);
        self.cooler.cool(state);
        self.limiter.limit(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(state: &mut SaState, successful: u64, accepted: u64) {
        state.recent_successful_moves = successful;
        state.recent_accepted_moves = accepted;
    }

    #[test]
    fn warming_raises_temperature_until_ratio_met() {
        let mut schedule = DefaultSchedule::from_config(&PlaceConfig::default());
        let mut state = SaState::new(1.0, 4.0, 4.0);

        cycle(&mut state, 100, 10);
        schedule.step(&mut state);
        assert!(state.warming);
        assert_eq!(state.temperature, 2.0);
        assert_eq!(state.distance_limit, 4.0);

        cycle(&mut state, 100, 95);
        schedule.step(&mut state);
        assert!(!state.warming);
        assert!(state.temperature < 2.0);
    }

    #[test]
    fn warming_ends_without_moves() {
        let mut schedule = DefaultSchedule::from_config(&PlaceConfig::default());
        let mut state = SaState::new(1.0, 4.0, 4.0);
        cycle(&mut state, 0, 0);
        schedule.step(&mut state);
        assert!(!state.warming);
    }

    #[test]
    fn warming_target_decays() {
        let mut warmer = DefaultWarmer {
            ratio: 0.9,
            multiplier: 2.0,
            decay: 0.5,
        };
        let mut state = SaState::new(1.0, 1.0, 1.0);
        cycle(&mut state, 100, 50);
        warmer.warm(&mut state);
        assert!(state.warming);
        warmer.warm(&mut state);
        assert!(!state.warming);
    }

    #[test]
    fn cooling_only_after_warming() {
        let mut cooler = DefaultCooler { alpha: 0.5 };
        let mut state = SaState::new(8.0, 1.0, 1.0);
        cooler.cool(&mut state);
        assert_eq!(state.temperature, 8.0);
        state.warming = false;
        cooler.cool(&mut state);
        assert_eq!(state.temperature, 4.0);
    }

    #[test]
    fn limit_is_clamped() {
        let mut limiter = DefaultLimiter {
            ratio: 0.44,
            minimum: 1.0,
        };
        let mut state = SaState::new(1.0, 10.0, 10.0);
        state.warming = false;

        cycle(&mut state, 100, 0);
        for _ in 0..50 {
            limiter.limit(&mut state);
        }
        assert_eq!(state.distance_limit, 1.0);
        assert_eq!(state.distance_limit_int, 1);

        cycle(&mut state, 100, 100);
        for _ in 0..50 {
            limiter.limit(&mut state);
        }
        assert_eq!(state.distance_limit, 10.0);
        assert_eq!(state.distance_limit_int, 10);
    }

    #[test]
    fn done_requires_cool_and_calm() {
        let done = DefaultDone { atol: 0.01 };
        let mut state = SaState::new(1.0, 1.0, 1.0);
        assert!(!done.done(&state));
        state.warming = false;
        state.deviation = 0.5;
        assert!(!done.done(&state));
        state.deviation = 0.001;
        assert!(done.done(&state));
    }
}
