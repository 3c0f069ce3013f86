//! aeb.rs — Autonomous Emergency Braking decision unit
//!
//! Time-to-collision staged braking against a single lead vehicle:
//! 1. TTC = gap / closing speed (infinite when not closing)
//! 2. physically required deceleration to stop with a 3 m residual gap
//!    (constant-deceleration stopping-distance inversion)
//! 3. a TTC-staged ceiling: no braking above the soft band, −3 m/s² in the
//!    soft band, −8.5 m/s² in the full band
//! 4. the weaker of "required" and "ceiling" is applied — AEB never brakes
//!    harder than its current tier permits, and never harder than physics
//!    demands when the tier would allow more
//! 5. any change to the applied decision restamps `command_time`, which the
//!    actuation latency gate keys off
//! 6. FCW / soft / hard threshold crossings are recorded once per episode

use aeb_types::Activation;

use crate::vehicle::KinematicAgent;

// AEB policy constants
pub const FCW_TTC_S: f64 = 2.3; // forward-collision-warning threshold
pub const SOFT_BRAKE_TTC_S: f64 = 1.5; // soft braking threshold
pub const FULL_BRAKE_TTC_S: f64 = 1.1; // emergency braking threshold
pub const MAX_SOFT_BRAKE_MPS2: f64 = -3.0;
pub const MAX_FULL_BRAKE_MPS2: f64 = -8.5;
/// Residual gap the required-deceleration calculation aims to stop with.
pub const FINAL_DISTANCE_M: f64 = 3.0;
/// Actuation delay between a decision change and the vehicle seeing it.
pub const SYSTEM_LATENCY_S: f64 = 0.3;

/// Per-tick AEB evaluation, returned to the runner for arbitration and
/// telemetry.
#[derive(Debug, Clone, Copy)]
pub struct AebDecision {
    pub distance_m: f64,
    pub ttc_s: f64,
    pub required_decel_mps2: f64,
    pub applied_decel_mps2: f64,
    pub ego_speed_mps: f64,
}

/// Episode-scoped AEB state: construct fresh per episode, never share.
#[derive(Debug)]
pub struct AebController {
    /// Sim time of the last change to the commanded deceleration. Starts at
    /// −∞ so the very first release is immediately eligible.
    command_time_s: f64,
    commanded_decel_mps2: f64,
    /// Value most recently released through the latency gate.
    released_decel_mps2: f64,
    pub fcw_activation: Activation,
    pub soft_brake_activation: Activation,
    pub hard_brake_activation: Activation,
}

impl Default for AebController {
    fn default() -> Self {
        Self::new()
    }
}

impl AebController {
    pub fn new() -> Self {
        Self {
            command_time_s: f64::NEG_INFINITY,
            commanded_decel_mps2: 0.0,
            released_decel_mps2: 0.0,
            fcw_activation: Activation::default(),
            soft_brake_activation: Activation::default(),
            hard_brake_activation: Activation::default(),
        }
    }

    /// Staged deceleration ceiling for the current TTC band.
    pub fn tier_ceiling(ttc_s: f64) -> f64 {
        if ttc_s <= FULL_BRAKE_TTC_S {
            MAX_FULL_BRAKE_MPS2
        } else if ttc_s <= SOFT_BRAKE_TTC_S {
            MAX_SOFT_BRAKE_MPS2
        } else {
            0.0
        }
    }

    /// Evaluate one tick of ego/target kinematic state.
    ///
    /// Side effects: restamps the command time on a decision change and arms
    /// the one-shot activation records.
    pub fn calculate_control<A: KinematicAgent>(
        &mut self,
        ego: &A,
        target: &A,
        now_s: f64,
    ) -> AebDecision {
        let distance_m = ego.distance_to(target);
        let relative_speed = ego.speed_mps() - target.speed_mps();
        let ttc_s = if relative_speed > 0.0 {
            distance_m / relative_speed
        } else {
            f64::INFINITY
        };

        // Deceleration needed to stop FINAL_DISTANCE_M short of the target,
        // assuming it holds its current speed. Guarded so the stopping
        // distance is strictly positive.
        let mut required_decel_mps2 = 0.0;
        if distance_m > FINAL_DISTANCE_M && relative_speed > 0.0 {
            let stopping_distance = distance_m - FINAL_DISTANCE_M;
            required_decel_mps2 = -(relative_speed * relative_speed) / (2.0 * stopping_distance);
        }

        let max_allowed_decel = Self::tier_ceiling(ttc_s);

        // Weaker of the two: never exceed the tier ceiling, never brake
        // harder than physically necessary when the tier would allow it.
        let applied_decel_mps2 = if required_decel_mps2 < 0.0 {
            required_decel_mps2.max(max_allowed_decel)
        } else {
            max_allowed_decel
        };

        if applied_decel_mps2 != self.commanded_decel_mps2 {
            self.commanded_decel_mps2 = applied_decel_mps2;
            self.command_time_s = now_s;
        }

        if ttc_s <= FCW_TTC_S {
            self.fcw_activation.arm(now_s, distance_m);
        }
        if ttc_s <= SOFT_BRAKE_TTC_S {
            self.soft_brake_activation.arm(now_s, distance_m);
        }
        if ttc_s <= FULL_BRAKE_TTC_S {
            self.hard_brake_activation.arm(now_s, distance_m);
        }

        AebDecision {
            distance_m,
            ttc_s,
            required_decel_mps2,
            applied_decel_mps2,
            ego_speed_mps: ego.speed_mps(),
        }
    }

    /// True once the actuation delay since the last decision change has
    /// elapsed — the gate condition for releasing a new command.
    pub fn latency_elapsed(&self, now_s: f64) -> bool {
        now_s >= self.command_time_s + SYSTEM_LATENCY_S
    }

    pub fn command_time_s(&self) -> f64 {
        self.command_time_s
    }

    pub fn commanded_decel_mps2(&self) -> f64 {
        self.commanded_decel_mps2
    }

    pub fn released_decel_mps2(&self) -> f64 {
        self.released_decel_mps2
    }

    /// Record the value the latency gate actually let through this tick.
    pub fn note_release(&mut self, released_mps2: f64) {
        self.released_decel_mps2 = released_mps2;
    }
}
