//! # aeb-types
//!
//! Shared scenario and telemetry structures for the AEB/ACC closed-loop
//! scenario suite.
//!
//! These types are used by:
//! - `aeb-simulator`: consuming validated scenario configs and producing
//!   per-tick telemetry plus terminal episode results
//! - batch collaborators (scenario samplers, boundary-search tooling, report
//!   writers): feeding scenario sets in and persisting episode results out
//!
//! ## Conventions
//!
//! - The core computes in SI units throughout: meters, m/s, m/s², seconds.
//! - km/h appears only at the scenario boundary ([`SpeedKph`]) and in
//!   human-facing output; mph appears only in telemetry, a display convention
//!   of the downstream report consumers.
//! - Longitudinal gap is `target_x - ego_x`: positive means the target leads.
//!   A scenario that places the target at or behind the ego is invalid.
//! - Acceleration commands are signed; braking is negative.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Unit conversions ──────────────────────────────────────────────────────────

pub const MPS_PER_KPH: f64 = 1.0 / 3.6;
pub const KPH_PER_MPS: f64 = 3.6;
pub const MPH_PER_MPS: f64 = 2.237;

/// Speed in km/h — the boundary unit for scenario configs and summaries.
///
/// The conversion to m/s happens exactly once, when the simulator ingests the
/// scenario; everything downstream of that is m/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeedKph(pub f64);

impl SpeedKph {
    pub fn mps(self) -> f64 {
        self.0 * MPS_PER_KPH
    }

    pub fn from_mps(speed_mps: f64) -> Self {
        Self(speed_mps * KPH_PER_MPS)
    }
}

// ── Target speed profile ──────────────────────────────────────────────────────

/// Maximum number of points accepted in a target speed-vs-time profile.
pub const PROFILE_MAX_POINTS: usize = 20;

/// Piecewise-linear target speed schedule.
///
/// Sampling between points interpolates linearly; sampling outside the
/// covered time range extrapolates linearly from the nearest segment, so a
/// profile that ends while still accelerating keeps accelerating. Extrapolated
/// values may go negative — the vehicle model floors speed at zero, so a
/// negative setpoint simply means "brake to a stop".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedProfile {
    /// Sample times, seconds, strictly ascending.
    pub times_s: Vec<f64>,
    /// Target speeds at each sample time, m/s, each ≥ 0.
    pub speeds_mps: Vec<f64>,
}

impl SpeedProfile {
    pub fn new(times_s: Vec<f64>, speeds_mps: Vec<f64>) -> Self {
        Self { times_s, speeds_mps }
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.times_s.is_empty() {
            return Err(ScenarioError::EmptyProfile);
        }
        if self.times_s.len() > PROFILE_MAX_POINTS {
            return Err(ScenarioError::ProfileTooLong(self.times_s.len()));
        }
        if self.times_s.len() != self.speeds_mps.len() {
            return Err(ScenarioError::ProfileLengthMismatch {
                times: self.times_s.len(),
                speeds: self.speeds_mps.len(),
            });
        }
        for i in 1..self.times_s.len() {
            if self.times_s[i] <= self.times_s[i - 1] {
                return Err(ScenarioError::NonMonotonicProfile(i));
            }
        }
        if let Some(i) = self.speeds_mps.iter().position(|s| *s < 0.0) {
            return Err(ScenarioError::NegativeProfileSpeed(i));
        }
        Ok(())
    }

    /// Scheduled speed at `time_s`, m/s. Must only be called on a validated
    /// profile (non-empty, ascending times).
    pub fn speed_at(&self, time_s: f64) -> f64 {
        let n = self.times_s.len();
        if n == 1 {
            return self.speeds_mps[0];
        }

        // Pick the segment that covers time_s; clamp to the end segments so
        // out-of-range queries extrapolate along the nearest slope.
        let seg = match self.times_s.iter().position(|t| *t > time_s) {
            Some(0) => 0,
            Some(i) => i - 1,
            None => n - 2,
        };
        let seg = seg.min(n - 2);

        let (t0, t1) = (self.times_s[seg], self.times_s[seg + 1]);
        let (s0, s1) = (self.speeds_mps[seg], self.speeds_mps[seg + 1]);
        s0 + (time_s - t0) * (s1 - s0) / (t1 - t0)
    }

    /// Speed the target should hold at episode start.
    pub fn initial_speed_mps(&self) -> f64 {
        self.speeds_mps[0]
    }
}

// ── Target behavior ───────────────────────────────────────────────────────────

/// What the lead vehicle does during the episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetBehaviorSpec {
    /// Hold the configured start speed, then decelerate at `decel_mps2` once
    /// the gap to the ego has closed to `trigger_distance_m`. The trigger
    /// latches: the target keeps braking even if the gap reopens.
    Trigger {
        decel_mps2: f64,
        trigger_distance_m: f64,
    },
    /// Decelerate at `decel_mps2` inside the time window
    /// `[start_s, start_s + duration_s]`, then return to the start speed.
    Timed {
        decel_mps2: f64,
        start_s: f64,
        duration_s: f64,
    },
    /// Track a speed-vs-time schedule.
    Profile(SpeedProfile),
}

impl TargetBehaviorSpec {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        match self {
            Self::Trigger { decel_mps2, .. } | Self::Timed { decel_mps2, .. } => {
                if *decel_mps2 > 0.0 {
                    return Err(ScenarioError::PositiveTargetDecel(*decel_mps2));
                }
                Ok(())
            }
            Self::Profile(profile) => profile.validate(),
        }
    }
}

// ── Ego control mode ──────────────────────────────────────────────────────────

/// Which controllers drive the ego vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// AEB alone: the ego coasts at its start speed until AEB brakes.
    #[default]
    AebOnly,
    /// ACC drives the ego (car-following / cruise) with AEB arbitrated on top.
    AccAeb,
}

// ── Scenario configuration ────────────────────────────────────────────────────

/// One rear-end scenario: two vehicles on a lane centerline, target leading.
///
/// Immutable input to an episode. `validate` is called by the runner before
/// any episode state is built; invalid scenarios never start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Ego start position along the lane, meters.
    pub ego_start_x_m: f64,
    /// Ego start speed.
    pub ego_speed: SpeedKph,
    /// Target start position along the lane, meters. Must exceed the ego's.
    pub target_start_x_m: f64,
    /// Target start speed.
    pub target_speed: SpeedKph,
    /// Lead-vehicle script.
    pub behavior: TargetBehaviorSpec,
    /// Ego controller stack for this scenario.
    #[serde(default)]
    pub control_mode: ControlMode,
    /// ACC cruise setpoint; defaults to the ego start speed.
    #[serde(default)]
    pub cruise_speed: Option<SpeedKph>,
}

impl ScenarioConfig {
    /// Initial longitudinal gap, meters.
    pub fn initial_gap_m(&self) -> f64 {
        self.target_start_x_m - self.ego_start_x_m
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        let gap = self.initial_gap_m();
        if gap <= 0.0 {
            return Err(ScenarioError::TargetBehindEgo { gap_m: gap });
        }
        if self.ego_speed.0 < 0.0 {
            return Err(ScenarioError::NegativeSpeed(self.ego_speed.0));
        }
        if self.target_speed.0 < 0.0 {
            return Err(ScenarioError::NegativeSpeed(self.target_speed.0));
        }
        if let Some(cruise) = self.cruise_speed {
            if cruise.0 < 0.0 {
                return Err(ScenarioError::NegativeSpeed(cruise.0));
            }
        }
        self.behavior.validate()
    }
}

// ── Configuration errors ──────────────────────────────────────────────────────

/// Scenario rejection reasons, surfaced before an episode starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScenarioError {
    #[error("target must start ahead of the ego (gap {gap_m:.1} m)")]
    TargetBehindEgo { gap_m: f64 },
    #[error("start speeds must be ≥ 0, got {0} km/h")]
    NegativeSpeed(f64),
    #[error("target deceleration must be ≤ 0, got {0} m/s²")]
    PositiveTargetDecel(f64),
    #[error("speed profile is empty")]
    EmptyProfile,
    #[error("speed profile has {0} points, maximum is {PROFILE_MAX_POINTS}")]
    ProfileTooLong(usize),
    #[error("speed profile has {times} times but {speeds} speeds")]
    ProfileLengthMismatch { times: usize, speeds: usize },
    #[error("speed profile times must be strictly ascending (violated at index {0})")]
    NonMonotonicProfile(usize),
    #[error("speed profile speeds must be ≥ 0 (violated at index {0})")]
    NegativeProfileSpeed(usize),
}

// ── One-shot activation record ────────────────────────────────────────────────

/// Set-once event latch for FCW / soft-brake / hard-brake activations.
///
/// Arms at the first tick its threshold condition holds and never changes
/// again; there is no transition back to `Unarmed`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Activation {
    #[default]
    Unarmed,
    Armed { time_s: f64, distance_m: f64 },
}

impl Activation {
    /// Records `(time_s, distance_m)` on the first call; later calls are no-ops.
    pub fn arm(&mut self, time_s: f64, distance_m: f64) {
        if matches!(self, Self::Unarmed) {
            *self = Self::Armed { time_s, distance_m };
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed { .. })
    }

    pub fn armed(&self) -> Option<(f64, f64)> {
        match *self {
            Self::Unarmed => None,
            Self::Armed { time_s, distance_m } => Some((time_s, distance_m)),
        }
    }
}

// ── Telemetry ─────────────────────────────────────────────────────────────────

/// TTC values above this are reported as exactly this in telemetry, so plots
/// and tables have a finite axis even when the vehicles are not closing.
pub const TTC_DISPLAY_CAP_S: f64 = 10.0;

/// One closed-loop tick as seen by downstream report/plot consumers.
///
/// `applied_decel_mps2` is the command actually in force at the ego vehicle
/// this tick, i.e. the arbitrated value most recently released by the latency
/// gate — not the raw controller request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub time_s: f64,
    pub distance_m: f64,
    pub ego_speed_mph: f64,
    /// Capped at [`TTC_DISPLAY_CAP_S`]; never infinite.
    pub ttc_s: f64,
    pub required_decel_mps2: f64,
    pub applied_decel_mps2: f64,
    pub target_speed_kph: f64,
}

// ── Episode result ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EpisodeOutcome {
    /// Horizon exhausted without contact.
    Completed,
    /// Pairwise collision predicate fired; episode ended early.
    Collided,
}

/// Terminal record of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeResult {
    pub outcome: EpisodeOutcome,
    pub collision_occurred: bool,
    /// Relative speed at contact, km/h; 0 when no collision occurred.
    pub impact_speed_kph: f64,
    /// Whether AEB intervened (definition depends on the control mode; see
    /// the episode runner).
    pub aeb_triggered: bool,
    /// Ego start speed minus ego final speed, km/h.
    pub speed_reduction_kph: f64,
    pub fcw_activation: Activation,
    pub soft_brake_activation: Activation,
    pub hard_brake_activation: Activation,
    pub telemetry: Vec<TelemetrySample>,
}

impl EpisodeResult {
    /// One-line human summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "collision={} impact={:.1} kph aeb_triggered={} speed_reduction={:.1} kph ticks={}",
            self.collision_occurred,
            self.impact_speed_kph,
            self.aeb_triggered,
            self.speed_reduction_kph,
            self.telemetry.len()
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> ScenarioConfig {
        ScenarioConfig {
            ego_start_x_m: 0.0,
            ego_speed: SpeedKph(50.0),
            target_start_x_m: 120.0,
            target_speed: SpeedKph(0.0),
            behavior: TargetBehaviorSpec::Trigger {
                decel_mps2: 0.0,
                trigger_distance_m: 0.0,
            },
            control_mode: ControlMode::AebOnly,
            cruise_speed: None,
        }
    }

    #[test]
    fn test_speed_conversions() {
        assert!((SpeedKph(36.0).mps() - 10.0).abs() < 1e-12);
        assert!((SpeedKph::from_mps(10.0).0 - 36.0).abs() < 1e-12);
        assert!((SpeedKph(50.0).mps() - 13.888_888_888_888_889).abs() < 1e-12);
    }

    #[test]
    fn test_profile_interpolates() {
        let p = SpeedProfile::new(vec![0.0, 10.0], vec![0.0, 20.0]);
        assert!((p.speed_at(0.0) - 0.0).abs() < 1e-12);
        assert!((p.speed_at(5.0) - 10.0).abs() < 1e-12);
        assert!((p.speed_at(10.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_profile_extrapolates_linearly() {
        let p = SpeedProfile::new(vec![0.0, 10.0], vec![0.0, 20.0]);
        // Past the end: keep the last slope.
        assert!((p.speed_at(15.0) - 30.0).abs() < 1e-12);
        // Before the start: same, even if that goes negative.
        assert!((p.speed_at(-5.0) + 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_profile_multi_segment() {
        let p = SpeedProfile::new(vec![0.0, 2.0, 6.0], vec![10.0, 10.0, 2.0]);
        assert!((p.speed_at(1.0) - 10.0).abs() < 1e-12);
        assert!((p.speed_at(4.0) - 6.0).abs() < 1e-12);
        assert!((p.speed_at(8.0) + 2.0).abs() < 1e-12); // extrapolated below zero
    }

    #[test]
    fn test_profile_single_point_is_constant() {
        let p = SpeedProfile::new(vec![0.0], vec![7.5]);
        assert_eq!(p.speed_at(-3.0), 7.5);
        assert_eq!(p.speed_at(100.0), 7.5);
    }

    #[test]
    fn test_profile_validation() {
        assert_eq!(
            SpeedProfile::new(vec![], vec![]).validate(),
            Err(ScenarioError::EmptyProfile)
        );
        assert_eq!(
            SpeedProfile::new(vec![0.0, 1.0], vec![0.0]).validate(),
            Err(ScenarioError::ProfileLengthMismatch { times: 2, speeds: 1 })
        );
        assert_eq!(
            SpeedProfile::new(vec![0.0, 1.0, 1.0], vec![0.0, 1.0, 2.0]).validate(),
            Err(ScenarioError::NonMonotonicProfile(2))
        );
        assert_eq!(
            SpeedProfile::new(vec![0.0, 1.0], vec![0.0, -1.0]).validate(),
            Err(ScenarioError::NegativeProfileSpeed(1))
        );
        let too_long = SpeedProfile::new(
            (0..=PROFILE_MAX_POINTS).map(|i| i as f64).collect(),
            vec![1.0; PROFILE_MAX_POINTS + 1],
        );
        assert_eq!(
            too_long.validate(),
            Err(ScenarioError::ProfileTooLong(PROFILE_MAX_POINTS + 1))
        );
    }

    #[test]
    fn test_scenario_rejects_target_behind_ego() {
        let mut cfg = scenario();
        cfg.target_start_x_m = cfg.ego_start_x_m;
        assert!(matches!(
            cfg.validate(),
            Err(ScenarioError::TargetBehindEgo { .. })
        ));
        cfg.target_start_x_m = cfg.ego_start_x_m - 10.0;
        assert!(matches!(
            cfg.validate(),
            Err(ScenarioError::TargetBehindEgo { .. })
        ));
    }

    #[test]
    fn test_scenario_rejects_bad_speeds_and_decel() {
        let mut cfg = scenario();
        cfg.ego_speed = SpeedKph(-1.0);
        assert_eq!(cfg.validate(), Err(ScenarioError::NegativeSpeed(-1.0)));

        let mut cfg = scenario();
        cfg.behavior = TargetBehaviorSpec::Trigger {
            decel_mps2: 2.0,
            trigger_distance_m: 10.0,
        };
        assert_eq!(cfg.validate(), Err(ScenarioError::PositiveTargetDecel(2.0)));
    }

    #[test]
    fn test_scenario_accepts_valid_config() {
        assert_eq!(scenario().validate(), Ok(()));
    }

    #[test]
    fn test_activation_arms_once() {
        let mut a = Activation::default();
        assert!(!a.is_armed());
        a.arm(1.5, 30.0);
        assert_eq!(a.armed(), Some((1.5, 30.0)));
        a.arm(9.9, 1.0);
        assert_eq!(a.armed(), Some((1.5, 30.0)));
    }

    #[test]
    fn test_scenario_serde_round_trip() {
        let cfg = ScenarioConfig {
            behavior: TargetBehaviorSpec::Profile(SpeedProfile::new(
                vec![0.0, 5.0, 10.0],
                vec![0.0, 13.89, 27.78],
            )),
            control_mode: ControlMode::AccAeb,
            cruise_speed: Some(SpeedKph(60.0)),
            ..scenario()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ScenarioConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
