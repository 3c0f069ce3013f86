//! target.rs — Scripted lead-vehicle drivers
//!
//! The episode runner treats the target's behavior as a pluggable per-tick
//! function of (time, gap, own speed). Three scripts are built in:
//! distance-triggered deceleration, a timed deceleration window, and
//! speed-profile tracking. Batch collaborators can supply their own
//! [`TargetDriver`] implementations.

use aeb_types::{SpeedProfile, TargetBehaviorSpec};

/// Per-tick behavior of the lead vehicle.
pub trait TargetDriver {
    /// Acceleration command for the target this tick, m/s².
    /// `gap_m` is the ego→target longitudinal gap.
    fn command(&mut self, now_s: f64, gap_m: f64, own_speed_mps: f64) -> f64;
}

/// Proportional speed hold used outside deceleration phases.
const HOLD_ACCEL_LIMIT_MPS2: f64 = 2.0;
/// Deadband below which the hold controller coasts, preventing oscillation.
const HOLD_SPEED_DEADBAND_MPS: f64 = 0.1;

fn hold_speed(nominal_mps: f64, current_mps: f64) -> f64 {
    let speed_diff = nominal_mps - current_mps;
    if speed_diff.abs() > HOLD_SPEED_DEADBAND_MPS {
        speed_diff.clamp(-HOLD_ACCEL_LIMIT_MPS2, HOLD_ACCEL_LIMIT_MPS2)
    } else {
        0.0
    }
}

/// Hold the nominal speed until the ego closes to the trigger distance, then
/// brake at a fixed rate. The trigger latches — braking continues even if the
/// gap reopens afterwards.
pub struct TriggeredDecel {
    decel_mps2: f64,
    trigger_distance_m: f64,
    nominal_speed_mps: f64,
    triggered: bool,
}

impl TriggeredDecel {
    pub fn new(decel_mps2: f64, trigger_distance_m: f64, nominal_speed_mps: f64) -> Self {
        Self {
            decel_mps2,
            trigger_distance_m,
            nominal_speed_mps,
            triggered: false,
        }
    }
}

impl TargetDriver for TriggeredDecel {
    fn command(&mut self, _now_s: f64, gap_m: f64, own_speed_mps: f64) -> f64 {
        if gap_m <= self.trigger_distance_m {
            self.triggered = true;
        }
        if self.triggered {
            self.decel_mps2
        } else {
            hold_speed(self.nominal_speed_mps, own_speed_mps)
        }
    }
}

/// Brake at a fixed rate inside a time window, then recover toward the
/// nominal speed.
pub struct TimedDecel {
    decel_mps2: f64,
    start_s: f64,
    duration_s: f64,
    nominal_speed_mps: f64,
}

impl TimedDecel {
    pub fn new(decel_mps2: f64, start_s: f64, duration_s: f64, nominal_speed_mps: f64) -> Self {
        Self {
            decel_mps2,
            start_s,
            duration_s,
            nominal_speed_mps,
        }
    }
}

impl TargetDriver for TimedDecel {
    fn command(&mut self, now_s: f64, _gap_m: f64, own_speed_mps: f64) -> f64 {
        if now_s >= self.start_s && now_s <= self.start_s + self.duration_s {
            self.decel_mps2
        } else {
            hold_speed(self.nominal_speed_mps, own_speed_mps)
        }
    }
}

/// Track a speed-vs-time schedule with a one-step proportional command.
pub struct ProfileFollower {
    profile: SpeedProfile,
    dt_s: f64,
}

/// Tracking authority for the profile follower. Wider than the hold limit so
/// scheduled ramps are followed closely.
const PROFILE_TRACK_LIMIT_MPS2: f64 = 6.0;

impl ProfileFollower {
    pub fn new(profile: SpeedProfile, dt_s: f64) -> Self {
        Self { profile, dt_s }
    }
}

impl TargetDriver for ProfileFollower {
    fn command(&mut self, now_s: f64, _gap_m: f64, own_speed_mps: f64) -> f64 {
        let scheduled_mps = self.profile.speed_at(now_s);
        ((scheduled_mps - own_speed_mps) / self.dt_s)
            .clamp(-PROFILE_TRACK_LIMIT_MPS2, PROFILE_TRACK_LIMIT_MPS2)
    }
}

/// Build the driver a scenario's behavior spec describes. The behavior must
/// have been validated first.
pub fn driver_from_spec(
    spec: &TargetBehaviorSpec,
    nominal_speed_mps: f64,
    dt_s: f64,
) -> Box<dyn TargetDriver> {
    match spec {
        TargetBehaviorSpec::Trigger {
            decel_mps2,
            trigger_distance_m,
        } => Box::new(TriggeredDecel::new(
            *decel_mps2,
            *trigger_distance_m,
            nominal_speed_mps,
        )),
        TargetBehaviorSpec::Timed {
            decel_mps2,
            start_s,
            duration_s,
        } => Box::new(TimedDecel::new(
            *decel_mps2,
            *start_s,
            *duration_s,
            nominal_speed_mps,
        )),
        TargetBehaviorSpec::Profile(profile) => {
            Box::new(ProfileFollower::new(profile.clone(), dt_s))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_latches() {
        let mut driver = TriggeredDecel::new(-4.0, 25.0, 11.0);
        // Holding at nominal before the trigger.
        assert_eq!(driver.command(0.0, 80.0, 11.0), 0.0);
        // Trigger crossed.
        assert_eq!(driver.command(1.0, 24.9, 11.0), -4.0);
        // Gap reopens: still braking.
        assert_eq!(driver.command(2.0, 40.0, 8.0), -4.0);
    }

    #[test]
    fn test_hold_recovers_toward_nominal() {
        let mut driver = TriggeredDecel::new(-4.0, 5.0, 11.0);
        // Below nominal: accelerate, clamped.
        assert_eq!(driver.command(0.0, 80.0, 5.0), 2.0);
        // Slightly above nominal: brake proportionally.
        assert!((driver.command(0.0, 80.0, 11.5) + 0.5).abs() < 1e-12);
        // Within the deadband: coast.
        assert_eq!(driver.command(0.0, 80.0, 11.05), 0.0);
    }

    #[test]
    fn test_timed_window() {
        let mut driver = TimedDecel::new(-3.0, 6.0, 4.0, 10.0);
        assert_eq!(driver.command(5.9, 50.0, 10.0), 0.0);
        assert_eq!(driver.command(6.0, 50.0, 10.0), -3.0);
        assert_eq!(driver.command(10.0, 50.0, 4.0), -3.0);
        // Past the window: recover toward nominal.
        assert_eq!(driver.command(10.1, 50.0, 4.0), 2.0);
    }

    #[test]
    fn test_profile_tracking_clamps() {
        let profile = SpeedProfile::new(vec![0.0, 10.0], vec![0.0, 27.78]);
        let mut driver = ProfileFollower::new(profile, 0.1);
        // Far below schedule: saturated.
        assert_eq!(driver.command(5.0, 50.0, 0.0), 6.0);
        // Near schedule: proportional. Scheduled at t=5 is 13.89.
        assert!((driver.command(5.0, 50.0, 13.8) - 0.9).abs() < 1e-9);
        // Above schedule: braking, saturated.
        assert_eq!(driver.command(5.0, 50.0, 25.0), -6.0);
    }

    #[test]
    fn test_driver_from_spec_builds_each_kind() {
        let trigger = TargetBehaviorSpec::Trigger {
            decel_mps2: -4.0,
            trigger_distance_m: 25.0,
        };
        assert_eq!(driver_from_spec(&trigger, 11.0, 0.1).command(0.0, 10.0, 11.0), -4.0);

        let timed = TargetBehaviorSpec::Timed {
            decel_mps2: -2.0,
            start_s: 1.0,
            duration_s: 2.0,
        };
        assert_eq!(driver_from_spec(&timed, 11.0, 0.1).command(1.5, 10.0, 11.0), -2.0);

        let profile =
            TargetBehaviorSpec::Profile(SpeedProfile::new(vec![0.0, 1.0], vec![5.0, 5.0]));
        assert_eq!(driver_from_spec(&profile, 5.0, 0.1).command(0.5, 10.0, 5.0), 0.0);
    }
}
