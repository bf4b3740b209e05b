//! Resumable annealing state.

use crate::placement::PlaceError;
use serde::{Deserialize, Serialize};

/// Temperature, distance limit, and move statistics of an annealing run.
///
/// Passing a state back into placement resumes from its temperature and
/// distance limit instead of warming from scratch. The state round-trips
/// through `bincode` for checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaState {
    /// Current temperature.
    pub temperature: f64,
    /// Current objective value.
    pub objective: f64,
    /// Current move distance limit.
    pub distance_limit: f64,
    /// `distance_limit` rounded down, as used by move generators.
    pub distance_limit_int: u32,
    /// Upper bound for the distance limit.
    pub max_distance_limit: f64,
    /// Still raising the temperature.
    pub warming: bool,

    /// Moves proposed this cycle.
    pub recent_move_attempts: u64,
    /// Legal moves evaluated this cycle.
    pub recent_successful_moves: u64,
    /// Moves accepted this cycle.
    pub recent_accepted_moves: u64,
    /// Sum of `|delta|` over moves accepted this cycle.
    pub recent_deviation: f64,

    /// Moves proposed over the run.
    pub total_moves: u64,
    /// Legal moves evaluated over the run.
    pub successful_moves: u64,
    /// Moves accepted over the run.
    pub accepted_moves: u64,
    /// Moving average of the mean `|delta|` of accepted moves per cycle.
    pub deviation: f64,
    /// Completed update cycles.
    pub update_cycles: u64,
    /// Wall-clock seconds spent annealing.
    pub run_time: f64,
    /// Proposals per second over the run.
    pub moves_per_second: f64,
}

impl SaState {
    /// Creates a fresh state in the warming phase.
    pub fn new(temperature: f64, distance_limit: f64, max_distance_limit: f64) -> Self {
        Self {
            temperature,
            objective: 0.0,
            distance_limit,
            distance_limit_int: distance_limit as u32,
            max_distance_limit,
            warming: true,
            recent_move_attempts: 0,
            recent_successful_moves: 0,
            recent_accepted_moves: 0,
            recent_deviation: 0.0,
            total_moves: 0,
            successful_moves: 0,
            accepted_moves: 0,
            deviation: 0.0,
            update_cycles: 0,
            run_time: 0.0,
            moves_per_second: 0.0,
        }
    }

    /// Fraction of this cycle's legal moves that were accepted.
    pub fn accept_ratio(&self) -> f64 {
        if self.recent_successful_moves == 0 {
            0.0
        } else {
            self.recent_accepted_moves as f64 / self.recent_successful_moves as f64
        }
    }

    /// Records a proposal.
    pub(crate) fn record_attempt(&mut self) {
        self.total_moves += 1;
        self.recent_move_attempts += 1;
    }

    /// Records a legal, evaluated move.
    pub(crate) fn record_success(&mut self) {
        self.successful_moves += 1;
        self.recent_successful_moves += 1;
    }

    /// Records an accepted move with cost change `delta`.
    pub(crate) fn record_accept(&mut self, delta: f64) {
        self.accepted_moves += 1;
        self.recent_accepted_moves += 1;
        self.recent_deviation += delta.abs();
        self.objective += delta;
    }

    /// Folds this cycle's accepted deltas into the moving-average deviation.
    pub(crate) fn fold_deviation(&mut self) {
        let cycle = if self.recent_accepted_moves == 0 {
            0.0
        } else {
            self.recent_deviation / self.recent_accepted_moves as f64
        };
        self.deviation = if self.update_cycles <= 1 {
            cycle
        } else {
            0.5 * (self.deviation + cycle)
        };
    }

    /// Clears the per-cycle counters.
    pub(crate) fn reset_recent(&mut self) {
        self.recent_move_attempts = 0;
        self.recent_successful_moves = 0;
        self.recent_accepted_moves = 0;
        self.recent_deviation = 0.0;
    }

    /// Encodes the state for a checkpoint.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PlaceError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| PlaceError::InvalidState(e.to_string()))
    }

    /// Decodes a checkpoint produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PlaceError> {
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map(|(state, _)| state)
            .map_err(|e| PlaceError::InvalidState(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_ratio_without_moves_is_zero() {
        let s = SaState::new(1.0, 4.0, 4.0);
        assert_eq!(s.accept_ratio(), 0.0);
    }

    #[test]
    fn counters() {
        let mut s = SaState::new(1.0, 4.0, 4.0);
        for _ in 0..4 {
            s.record_attempt();
            s.record_success();
        }
        s.record_accept(-2.0);
        s.record_accept(1.0);
        assert_eq!(s.total_moves, 4);
        assert_eq!(s.accept_ratio(), 0.5);
        assert_eq!(s.objective, -1.0);
        assert_eq!(s.recent_deviation, 3.0);

        s.update_cycles = 1;
        s.fold_deviation();
        assert_eq!(s.deviation, 1.5);
        s.reset_recent();
        assert_eq!(s.recent_successful_moves, 0);
        assert_eq!(s.successful_moves, 4);

        s.update_cycles = 2;
        s.fold_deviation();
        assert_eq!(s.deviation, 0.75);
    }

    #[test]
    fn bincode_roundtrip() {
        let mut s = SaState::new(3.5, 7.0, 9.0);
        s.warming = false;
        s.update_cycles = 12;
        let bytes = s.to_bytes().unwrap();
        assert_eq!(SaState::from_bytes(&bytes).unwrap(), s);
    }

    #[test]
    fn garbage_bytes_rejected() {
        let err = SaState::from_bytes(&[0xff]).unwrap_err();
        assert!(matches!(err, PlaceError::InvalidState(_)));
    }
}
