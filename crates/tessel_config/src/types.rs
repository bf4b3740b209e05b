//! Configuration types deserialized from `tessel.toml`.

use serde::{Deserialize, Serialize};

/// The top-level configuration parsed from `tessel.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TesselConfig {
    /// Simulated-annealing placement settings.
    #[serde(default)]
    pub place: PlaceConfig,
    /// Negotiated-congestion routing settings.
    #[serde(default)]
    pub route: RouteConfig,
}

/// Settings for the simulated-annealing placer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceConfig {
    /// Number of successful moves between schedule updates.
    pub move_attempts: u64,
    /// Starting temperature when no prior state is supplied.
    pub initial_temperature: f64,
    /// Seed for the placement RNG. `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Strategy used to pick destination locations.
    pub move_generator: MoveGeneratorKind,
    /// Collapse the map table to a boolean mask when every address hosts
    /// exactly one mappable slot.
    pub enable_flatness: bool,
    /// Include the rule set's address cost in node costs.
    pub enable_address: bool,
    /// Stop after this many update cycles even if not converged.
    pub max_update_cycles: Option<u64>,
    /// Warming schedule.
    pub warm: WarmConfig,
    /// Cooling schedule.
    pub cool: CoolConfig,
    /// Distance-limit schedule.
    pub limit: LimitConfig,
    /// Completion predicate.
    pub done: DoneConfig,
}

impl Default for PlaceConfig {
    fn default() -> Self {
        Self {
            move_attempts: 20_000,
            initial_temperature: 1.0,
            seed: None,
            move_generator: MoveGeneratorKind::Cached,
            enable_flatness: true,
            enable_address: false,
            max_update_cycles: None,
            warm: WarmConfig::default(),
            cool: CoolConfig::default(),
            limit: LimitConfig::default(),
            done: DoneConfig::default(),
        }
    }
}

/// Move generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveGeneratorKind {
    /// Precomputed per-class tables of destinations sorted by distance.
    #[default]
    Cached,
    /// Linear scan of the map table on every move.
    Search,
}

/// Warming: raise the temperature until enough moves are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WarmConfig {
    /// Target acceptance ratio that ends warming.
    pub ratio: f64,
    /// Temperature multiplier applied each warming cycle.
    pub multiplier: f64,
    /// Decay applied to the target ratio each warming cycle.
    pub decay: f64,
}

impl Default for WarmConfig {
    fn default() -> Self {
        Self {
            ratio: 0.9,
            multiplier: 2.0,
            decay: 0.95,
        }
    }
}

/// Cooling: geometric temperature decrease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoolConfig {
    /// Temperature factor applied each cycle once warming is over.
    pub alpha: f64,
}

impl Default for CoolConfig {
    fn default() -> Self {
        Self { alpha: 0.997 }
    }
}

/// Limiter: shrink the move distance limit toward a floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitConfig {
    /// Acceptance ratio the limiter steers toward.
    pub ratio: f64,
    /// Smallest distance limit.
    pub minimum: f64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            ratio: 0.44,
            minimum: 1.0,
        }
    }
}

/// Completion predicate on the moving-average objective deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DoneConfig {
    /// Absolute tolerance on the deviation.
    pub atol: f64,
}

impl Default for DoneConfig {
    fn default() -> Self {
        Self { atol: 0.01 }
    }
}

/// Settings for the negotiated-congestion router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouteConfig {
    /// Maximum number of rip-up and reroute passes.
    pub max_iterations: u32,
    /// Initial weight of present congestion.
    pub present_factor: f64,
    /// Multiplier applied to `present_factor` after each failed pass.
    pub present_growth: f64,
    /// Order in which channels are routed within a pass.
    pub channel_order: ChannelOrder,
    /// Which channels are ripped up before each pass.
    pub rip_up: RipUpPolicy,
    /// Historical congestion penalty growth.
    pub history: HistoryConfig,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            present_factor: 0.5,
            present_growth: 1.5,
            channel_order: ChannelOrder::Input,
            rip_up: RipUpPolicy::All,
            history: HistoryConfig::default(),
        }
    }
}

/// Channel ordering within a routing pass. All orders are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOrder {
    /// Taskgraph edge order.
    #[default]
    Input,
    /// Channels with more sinks first.
    FanoutFirst,
    /// Descending rule-set routing priority.
    RuleSet,
}

/// Rip-up policy between passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RipUpPolicy {
    /// Reroute every channel each pass.
    #[default]
    All,
    /// Reroute only channels touching an over-capacity resource.
    Congested,
}

/// Historical congestion penalty settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Growth law applied to congested resources.
    pub policy: HistoryPolicy,
    /// Additive increment per congested pass.
    pub increment: f64,
    /// Multiplicative growth for the geometric policy.
    pub growth: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            policy: HistoryPolicy::Constant,
            increment: 1.0,
            growth: 1.0,
        }
    }
}

/// How the historical penalty of a congested resource grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// `history += increment`.
    #[default]
    Constant,
    /// `history += increment * overuse`.
    Proportional,
    /// `history = history * growth + increment`.
    Geometric,
}

impl HistoryConfig {
    /// Returns the new history value of a resource that is `overuse` units
    /// over capacity after a pass.
    pub fn grow(&self, history: f64, overuse: usize) -> f64 {
        match self.policy {
            HistoryPolicy::Constant => history + self.increment,
            HistoryPolicy::Proportional => history + self.increment * overuse as f64,
            HistoryPolicy::Geometric => history * self.growth + self.increment,
        }
    }
}
