//! Simulated annealing placement.
//!
//! Placement assigns every task to a mappable component. It builds a flat
//! working structure from the map, places tasks randomly (or restores a
//! previous placement), then anneals with a pluggable [`Schedule`]. The map
//! table and move generator are chosen once per run and the hot loop is
//! monomorphized over them.

mod anneal;
mod cost;
mod distance;
mod initial;
mod maptable;
mod movegen;
mod schedule;
mod state;
mod structure;

#[cfg(test)]
pub(crate) mod testing;

pub use anneal::{acceptance_probability, metropolis_accept};
pub use distance::{BasicDistance, Distance};
pub use maptable::{FlatMapTable, Location, MapTable, SlottedMapTable};
pub use movegen::{CachedMoveGenerator, MoveGenerator, SearchMoveGenerator};
pub use schedule::{
    Cooler, DefaultCooler, DefaultDone, DefaultLimiter, DefaultSchedule, DefaultWarmer, DoneCheck, Limiter,
    Schedule, Warmer,
};
pub use state::SaState;
pub use structure::{PlacementView, SaChannel, SaNode, SaStruct};

use crate::map::Map;
use crate::ruleset::RuleSet;
use crate::stop::StopToken;
use anneal::AnnealLimits;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use structure::Layout;
use tessel_common::InternalError;
use tessel_config::{MoveGeneratorKind, PlaceConfig};
use tessel_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use thiserror::Error;

/// Placement failures.
#[derive(Debug, Error, PartialEq)]
pub enum PlaceError {
    /// A task may not be mapped to any component.
    #[error("task `{task}` (class {class}) has no legal location")]
    NoLegalLocation {
        /// Task name.
        task: String,
        /// Class index the task would have formed.
        class: usize,
    },
    /// A class has more tasks than free legal locations.
    #[error("class {class} needs {needed} locations but only {available} are free")]
    InsufficientResources {
        /// Class index.
        class: usize,
        /// Tasks in the class.
        needed: usize,
        /// Free legal locations.
        available: usize,
    },
    /// An annealing checkpoint could not be encoded or decoded.
    #[error("invalid annealing state: {0}")]
    InvalidState(String),
    /// The working structure broke one of its own invariants.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl PlaceError {
    fn code(&self) -> DiagnosticCode {
        let number = match self {
            PlaceError::NoLegalLocation { .. } => 101,
            PlaceError::InsufficientResources { .. } => 102,
            PlaceError::InvalidState(_) => 103,
            PlaceError::Internal(_) => 199,
        };
        DiagnosticCode::new(Category::Placement, number)
    }
}

/// Why annealing stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementExit {
    /// The done check passed.
    Converged,
    /// `max_update_cycles` was reached.
    BudgetExhausted,
    /// The stop token fired.
    Stopped,
}

/// Statistics of a placement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementReport {
    /// Seconds spent building the working structure and initial placement.
    pub struct_time: f64,
    /// Approximate size of the working structure.
    pub struct_bytes: usize,
    /// Seconds spent annealing.
    pub place_time: f64,
    /// Final objective.
    pub objective: f64,
    /// Final annealing state, usable to resume.
    pub state: SaState,
    /// Why annealing stopped.
    pub exit: PlacementExit,
    /// Number of task equivalence classes.
    pub classes: usize,
    /// Whether the flat map table was used.
    pub flat: bool,
}

/// Places every task with the default schedule.
pub fn place<R: RuleSet>(
    map: &mut Map<R>,
    config: &PlaceConfig,
    sink: &DiagnosticSink,
) -> Result<PlacementReport, PlaceError> {
    let mut schedule = DefaultSchedule::from_config(config);
    place_with(map, config, &mut schedule, None, None, sink)
}

/// Places every task with a custom schedule.
///
/// If `resume` is given and the map already holds a complete, legal
/// placement, annealing continues from that placement and state. Otherwise a
/// fresh random placement is used. Errors are also reported to `sink`.
pub fn place_with<R, W, C, L, F>(
    map: &mut Map<R>,
    config: &PlaceConfig,
    schedule: &mut Schedule<W, C, L, F>,
    resume: Option<SaState>,
    stop: Option<&StopToken>,
    sink: &DiagnosticSink,
) -> Result<PlacementReport, PlaceError>
where
    R: RuleSet,
    W: Warmer,
    C: Cooler,
    L: Limiter,
    F: DoneCheck,
{
    let run = Run {
        config,
        resume,
        stop,
        sink,
    };
    let result = Layout::build(&map.rules, &map.architecture, &map.taskgraph).and_then(|layout| {
        let flat = config.enable_flatness && layout.is_flat();
        match (flat, config.move_generator) {
            (true, MoveGeneratorKind::Cached) => {
                run.execute::<R, FlatMapTable, CachedMoveGenerator, _, _, _, _>(map, schedule, layout)
            }
            (true, MoveGeneratorKind::Search) => {
                run.execute::<R, FlatMapTable, SearchMoveGenerator, _, _, _, _>(map, schedule, layout)
            }
            (false, MoveGeneratorKind::Cached) => {
                run.execute::<R, SlottedMapTable, CachedMoveGenerator, _, _, _, _>(map, schedule, layout)
            }
            (false, MoveGeneratorKind::Search) => {
                run.execute::<R, SlottedMapTable, SearchMoveGenerator, _, _, _, _>(map, schedule, layout)
            }
        }
    });

    if let Err(err) = &result {
        sink.emit(Diagnostic::error(err.code(), err.to_string()).with_subject(map.taskgraph.name()));
    }
    result
}

struct Run<'a> {
    config: &'a PlaceConfig,
    resume: Option<SaState>,
    stop: Option<&'a StopToken>,
    sink: &'a DiagnosticSink,
}

impl Run<'_> {
    fn execute<R, M, G, W, C, L, F>(
        self,
        map: &mut Map<R>,
        schedule: &mut Schedule<W, C, L, F>,
        layout: Layout,
    ) -> Result<PlacementReport, PlaceError>
    where
        R: RuleSet,
        M: MapTable,
        G: MoveGenerator,
        W: Warmer,
        C: Cooler,
        L: Limiter,
        F: DoneCheck,
    {
        let start = Instant::now();
        let classes = layout.class_reps.len();
        let distance = BasicDistance::new(&map.architecture, &layout.addresses);
        let mut sa: SaStruct<M, BasicDistance> = SaStruct::new(
            &map.rules,
            &map.architecture,
            &map.taskgraph,
            layout,
            distance,
            self.config.enable_address,
        );
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let resumed = match self.resume {
            Some(state) if initial::restore_placement(&mut sa, &map.mapping, &map.taskgraph) => Some(state),
            Some(_) => {
                self.sink.emit(
                    Diagnostic::warning(
                        DiagnosticCode::new(Category::Placement, 2),
                        "cannot resume annealing: mapping has no complete legal placement",
                    )
                    .with_help("starting from a random placement"),
                );
                None
            }
            None => None,
        };
        let mut state = match resumed {
            Some(state) => state,
            None => {
                initial::random_placement(&mut sa, &mut rng)?;
                let max = sa.distance.max_distance().max(1) as f64;
                SaState::new(self.config.initial_temperature, max, max)
            }
        };
        let struct_time = start.elapsed().as_secs_f64();
        let struct_bytes = sa.approx_bytes();

        let start = Instant::now();
        let mut movegen = G::build(&sa, state.distance_limit_int);
        let limits = AnnealLimits {
            move_attempts: self.config.move_attempts,
            max_update_cycles: self.config.max_update_cycles,
            stop: self.stop,
        };
        let exit = anneal::anneal(
            &map.rules,
            &map.taskgraph,
            &mut sa,
            &mut movegen,
            schedule,
            &mut state,
            &limits,
            &mut rng,
        );
        let place_time = start.elapsed().as_secs_f64();
        if !sa.is_consistent() {
            return Err(InternalError::new("annealing left a task on an illegal or shared location").into());
        }

        map.mapping.nodes.clear();
        for i in 0..sa.nodes.len() {
            let name = map.taskgraph.node(sa.nodes[i].task).name.clone();
            map.mapping.nodes.insert(name, sa.component_of(i));
        }
        map.mapping.clear_routes();

        let flat = M::IS_FLAT;
        self.sink.emit(
            Diagnostic::note(
                DiagnosticCode::new(Category::Placement, 1),
                format!("placed {} tasks, objective {:.3}", sa.nodes.len(), state.objective),
            )
            .with_subject(map.taskgraph.name())
            .with_note(format!(
                "{} update cycles, {} moves ({:.0}/s), {} classes, {} map table",
                state.update_cycles,
                state.total_moves,
                state.moves_per_second,
                classes,
                if flat { "flat" } else { "slotted" },
            )),
        );
        match exit {
            PlacementExit::Converged => {}
            PlacementExit::BudgetExhausted => self.sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Placement, 3),
                "placement stopped at the update cycle limit before converging",
            )),
            PlacementExit::Stopped => self.sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Placement, 4),
                "placement interrupted",
            )),
        }

        Ok(PlacementReport {
            struct_time,
            struct_bytes,
            place_time,
            objective: state.objective,
            state,
            exit,
            classes,
            flat,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::testing::{line_map, preference_map};
    use crate::verify::check_placement;
    use tessel_arch::Address;
    use tessel_diagnostics::Severity;

    fn quick() -> PlaceConfig {
        PlaceConfig {
            move_attempts: 200,
            seed: Some(3),
            max_update_cycles: Some(300),
            ..PlaceConfig::default()
        }
    }

    #[test]
    fn place_writes_every_task() {
        let mut map = line_map(6, 4);
        let sink = DiagnosticSink::new();
        let report = place(&mut map, &quick(), &sink).unwrap();
        assert!(map.mapping.is_fully_placed(&map.taskgraph));
        assert!(report.flat);
        assert_eq!(report.classes, 1);
        assert!(!sink.has_errors());
    }

    #[test]
    fn all_generator_and_table_combinations_run() {
        for (flatness, generator) in [
            (true, MoveGeneratorKind::Cached),
            (true, MoveGeneratorKind::Search),
            (false, MoveGeneratorKind::Cached),
            (false, MoveGeneratorKind::Search),
        ] {
            let mut map = line_map(5, 5);
            let config = PlaceConfig {
                enable_flatness: flatness,
                move_generator: generator,
                ..quick()
            };
            let report = place(&mut map, &config, &DiagnosticSink::new()).unwrap();
            assert_eq!(report.flat, flatness);
            assert_eq!(map.mapping.nodes.len(), 5);
            let mut used: Vec<_> = map.mapping.nodes.values().copied().collect();
            used.sort();
            used.dedup();
            assert_eq!(used.len(), 5);
        }
    }

    #[test]
    fn seeded_runs_are_deterministic() {
        let mut a = line_map(6, 5);
        let mut b = line_map(6, 5);
        place(&mut a, &quick(), &DiagnosticSink::new()).unwrap();
        place(&mut b, &quick(), &DiagnosticSink::new()).unwrap();
        assert_eq!(a.mapping, b.mapping);
    }

    #[test]
    fn too_few_slots_is_reported() {
        let mut map = line_map(2, 3);
        let sink = DiagnosticSink::new();
        let err = place(&mut map, &quick(), &sink).unwrap_err();
        assert!(matches!(err, PlaceError::InsufficientResources { .. }));
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].code.to_string(), "P102");
    }

    #[test]
    fn resume_without_placement_warns() {
        let mut map = line_map(4, 2);
        let sink = DiagnosticSink::new();
        let mut schedule = DefaultSchedule::from_config(&quick());
        let state = SaState::new(0.5, 1.0, 3.0);
        place_with(&mut map, &quick(), &mut schedule, Some(state), None, &sink).unwrap();
        let codes: Vec<String> = sink.diagnostics().iter().map(|d| d.code.to_string()).collect();
        assert!(codes.contains(&"P002".to_string()));
        assert!(map.mapping.is_fully_placed(&map.taskgraph));
    }

    #[test]
    fn stop_token_interrupts_with_legal_placement() {
        let mut map = line_map(6, 5);
        let mut config = quick();
        config.done.atol = 0.0;
        config.max_update_cycles = None;
        let mut schedule = DefaultSchedule::from_config(&config);
        let stop = StopToken::new();
        stop.stop();
        let sink = DiagnosticSink::new();

        let report = place_with(&mut map, &config, &mut schedule, None, Some(&stop), &sink).unwrap();

        assert_eq!(report.exit, PlacementExit::Stopped);
        assert_eq!(report.state.update_cycles, 1);
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.severity == Severity::Warning && d.code.to_string() == "P004"));
        assert!(map.mapping.is_fully_placed(&map.taskgraph));
        assert!(check_placement(&map).is_empty());
    }

    #[test]
    fn each_task_pays_its_own_address_cost() {
        let mut map = preference_map();
        let mut config = quick();
        config.enable_address = true;
        config.cool.alpha = 0.5;
        let report = place(&mut map, &config, &DiagnosticSink::new()).unwrap();
        assert_eq!(report.classes, 1);

        let at = |task: &str| {
            let c = map.mapping.location(task).unwrap();
            map.architecture.component(c).address.clone().unwrap()
        };
        assert_eq!(at("a"), Address::from([0]));
        assert_eq!(at("b"), Address::from([1]));
        assert_eq!(report.objective, 0.0);
    }
}
