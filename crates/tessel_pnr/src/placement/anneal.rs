//! The simulated annealing loop.
//!
//! Each step picks a random node, asks the move generator for a target, and
//! either relocates the node (free target) or swaps it with the occupant.
//! The move is kept according to the Metropolis criterion and undone
//! otherwise. Every `move_attempts` legal moves form an update cycle, after
//! which the schedule adjusts temperature and distance limit.

use crate::placement::cost::{node_cost, node_pair_cost, objective};
use crate::placement::distance::Distance;
use crate::placement::maptable::MapTable;
use crate::placement::movegen::MoveGenerator;
use crate::placement::schedule::{Cooler, DoneCheck, Limiter, Schedule, Warmer};
use crate::placement::state::SaState;
use crate::placement::structure::SaStruct;
use crate::placement::PlacementExit;
use crate::ruleset::RuleSet;
use crate::stop::StopToken;
use rand::Rng;
use std::time::Instant;
use tessel_taskgraph::Taskgraph;

/// Proposals allowed per update cycle, as a multiple of `move_attempts`,
/// before the cycle is closed even without enough legal moves.
const ATTEMPT_CAP_FACTOR: u64 = 10;

/// Probability of accepting a move with cost change `delta` at temperature
/// `temperature`.
///
/// Improvements and neutral moves are always accepted; at zero temperature
/// nothing else is.
pub fn acceptance_probability(delta: f64, temperature: f64) -> f64 {
    if delta <= 0.0 {
        1.0
    } else if temperature <= 0.0 {
        0.0
    } else {
        (-delta / temperature).exp()
    }
}

/// Metropolis criterion.
pub fn metropolis_accept<G: Rng + ?Sized>(delta: f64, temperature: f64, rng: &mut G) -> bool {
    let p = acceptance_probability(delta, temperature);
    p >= 1.0 || rng.gen::<f64>() < p
}

/// Run limits for [`anneal`].
pub(crate) struct AnnealLimits<'a> {
    pub(crate) move_attempts: u64,
    pub(crate) max_update_cycles: Option<u64>,
    pub(crate) stop: Option<&'a StopToken>,
}

/// Anneals `sa` in place until the schedule reports convergence, the cycle
/// budget runs out, or the stop token fires.
#[allow(clippy::too_many_arguments)]
pub(crate) fn anneal<R, M, D, G, W, C, L, F, Rn>(
    rules: &R,
    taskgraph: &Taskgraph,
    sa: &mut SaStruct<M, D>,
    movegen: &mut G,
    schedule: &mut Schedule<W, C, L, F>,
    state: &mut SaState,
    limits: &AnnealLimits<'_>,
    rng: &mut Rn,
) -> PlacementExit
where
    R: RuleSet,
    M: MapTable,
    D: Distance,
    G: MoveGenerator,
    W: Warmer,
    C: Cooler,
    L: Limiter,
    F: DoneCheck,
    Rn: Rng,
{
    let start = Instant::now();
    let num_nodes = sa.nodes.len();
    state.objective = objective(rules, taskgraph, sa);
    let cap = limits.move_attempts.saturating_mul(ATTEMPT_CAP_FACTOR);

    let exit = loop {
        while num_nodes > 0
            && state.recent_successful_moves < limits.move_attempts
            && state.recent_move_attempts < cap
        {
            state.record_attempt();
            let node = rng.gen_range(0..num_nodes);
            let Some(target) = movegen.generate(sa, node, rng) else {
                continue;
            };
            let from = sa.nodes[node].location;

            match sa.occupant(target) {
                Some(other) => {
                    if !sa.map_table.is_valid(sa.nodes[other].class, from) {
                        continue;
                    }
                    state.record_success();
                    let before = node_pair_cost(rules, taskgraph, sa, node, other);
                    sa.swap_nodes(node, other);
                    let delta = node_pair_cost(rules, taskgraph, sa, node, other) - before;
                    if metropolis_accept(delta, state.temperature, rng) {
                        state.record_accept(delta);
                    } else {
                        sa.swap_nodes(node, other);
                    }
                }
                None => {
                    state.record_success();
                    let before = node_cost(rules, taskgraph, sa, node);
                    sa.move_node(node, target);
                    let delta = node_cost(rules, taskgraph, sa, node) - before;
                    if metropolis_accept(delta, state.temperature, rng) {
                        state.record_accept(delta);
                    } else {
                        sa.move_node(node, from);
                    }
                }
            }
        }

        state.update_cycles += 1;
        schedule.step(state);
        movegen.update(sa, state.distance_limit_int);
        state.fold_deviation();
        state.objective = objective(rules, taskgraph, sa);
        state.reset_recent();

        if schedule.done.done(state) {
            break PlacementExit::Converged;
        }
        if limits.stop.is_some_and(StopToken::is_stopped) {
            break PlacementExit::Stopped;
        }
        if limits
            .max_update_cycles
            .is_some_and(|max| state.update_cycles >= max)
        {
            break PlacementExit::BudgetExhausted;
        }
    };

    state.run_time += start.elapsed().as_secs_f64();
    if state.run_time > 0.0 {
        state.moves_per_second = state.total_moves as f64 / state.run_time;
    }
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::initial::random_placement;
    use crate::placement::maptable::FlatMapTable;
    use crate::placement::movegen::CachedMoveGenerator;
    use crate::placement::schedule::DefaultSchedule;
    use crate::placement::testing::{line_map, structure};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tessel_config::PlaceConfig;

    #[test]
    fn acceptance_is_monotone_in_delta() {
        let t = 2.0;
        let mut last = 1.0;
        for delta in [0.0, 0.5, 1.0, 2.0, 8.0] {
            let p = acceptance_probability(delta, t);
            assert!(p <= last);
            last = p;
        }
        assert_eq!(acceptance_probability(-3.0, t), 1.0);
        assert_eq!(acceptance_probability(1.0, 0.0), 0.0);
    }

    #[test]
    fn acceptance_grows_with_temperature() {
        assert!(acceptance_probability(1.0, 0.5) < acceptance_probability(1.0, 5.0));
    }

    #[test]
    fn improvement_always_accepted() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!((0..100).all(|_| metropolis_accept(-1.0, 0.0, &mut rng)));
    }

    #[test]
    fn anneal_keeps_placement_legal_and_improves_chain() {
        let map = line_map(8, 8);
        let mut sa = structure::<FlatMapTable>(&map);
        let mut rng = StdRng::seed_from_u64(42);
        random_placement(&mut sa, &mut rng).unwrap();

        let config = PlaceConfig {
            move_attempts: 500,
            ..PlaceConfig::default()
        };
        let mut schedule = DefaultSchedule::from_config(&config);
        let max = sa.distance.max_distance() as f64;
        let mut state = SaState::new(config.initial_temperature, max, max);
        let mut movegen = CachedMoveGenerator::build(&sa, state.distance_limit_int);
        let limits = AnnealLimits {
            move_attempts: config.move_attempts,
            max_update_cycles: Some(2000),
            stop: None,
        };
        anneal(&map.rules, &map.taskgraph, &mut sa, &mut movegen, &mut schedule, &mut state, &limits, &mut rng);

        assert!(sa.is_consistent());
        assert_eq!(state.objective, objective(&map.rules, &map.taskgraph, &sa));
        // Optimum is 7: one hop per channel.
        assert!(state.objective <= 12.0, "objective {}", state.objective);
    }

    #[test]
    fn zero_move_attempts_stops_after_one_cycle() {
        let map = line_map(4, 3);
        let mut sa = structure::<FlatMapTable>(&map);
        let mut rng = StdRng::seed_from_u64(1);
        random_placement(&mut sa, &mut rng).unwrap();
        let before: Vec<_> = sa.nodes.iter().map(|n| n.location).collect();

        let config = PlaceConfig {
            move_attempts: 0,
            ..PlaceConfig::default()
        };
        let mut schedule = DefaultSchedule::from_config(&config);
        let mut state = SaState::new(1.0, 3.0, 3.0);
        let mut movegen = CachedMoveGenerator::build(&sa, 3);
        let limits = AnnealLimits {
            move_attempts: 0,
            max_update_cycles: None,
            stop: None,
        };
        let exit = anneal(&map.rules, &map.taskgraph, &mut sa, &mut movegen, &mut schedule, &mut state, &limits, &mut rng);

        assert_eq!(exit, PlacementExit::Converged);
        assert_eq!(state.update_cycles, 1);
        assert_eq!(state.total_moves, 0);
        let after: Vec<_> = sa.nodes.iter().map(|n| n.location).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn stop_token_ends_run() {
        let map = line_map(6, 6);
        let mut sa = structure::<FlatMapTable>(&map);
        let mut rng = StdRng::seed_from_u64(9);
        random_placement(&mut sa, &mut rng).unwrap();
        let mut config = PlaceConfig::default();
        config.done.atol = 0.0;
        let mut schedule = DefaultSchedule::from_config(&config);
        let mut state = SaState::new(1.0, 5.0, 5.0);
        let mut movegen = CachedMoveGenerator::build(&sa, 5);
        let stop = StopToken::new();
        stop.stop();
        let limits = AnnealLimits {
            move_attempts: 50,
            max_update_cycles: None,
            stop: Some(&stop),
        };
        let exit = anneal(&map.rules, &map.taskgraph, &mut sa, &mut movegen, &mut schedule, &mut state, &limits, &mut rng);
        assert_eq!(state.update_cycles, 1);
        assert_eq!(exit, PlacementExit::Stopped);
        assert!(sa.is_consistent());
    }
}
