//! acc.rs — Adaptive Cruise Control decision unit
//!
//! Two modes, switched on lead-vehicle presence:
//! - car-following: proportional control on the gap error against a
//!   time-gap-derived desired distance
//! - cruise: proportional control on the speed error against the setpoint
//!
//! Both clamp to the same comfort envelope. Car-following intentionally has
//! no cruise-speed cap: a large gap error commands full acceleration until
//! the gap closes toward the desired distance.

use aeb_types::SpeedKph;

use crate::vehicle::KinematicAgent;

// ACC policy constants
pub const DESIRED_TIME_GAP_S: f64 = 1.8; // time gap to maintain
pub const MAX_ACCEL_MPS2: f64 = 2.5;
pub const MAX_DECEL_MPS2: f64 = -3.0;
pub const MIN_FOLLOWING_DISTANCE_M: f64 = 2.0; // standstill gap
pub const DETECTION_RANGE_M: f64 = 100.0; // lead-vehicle detection limit

/// Episode-scoped ACC state: just the cruise setpoint, kept in the boundary
/// unit and converted on use.
#[derive(Debug)]
pub struct AccController {
    cruise_speed: SpeedKph,
}

impl AccController {
    pub fn new(cruise_speed: SpeedKph) -> Self {
        Self { cruise_speed }
    }

    pub fn set_cruise_speed(&mut self, cruise_speed: SpeedKph) {
        self.cruise_speed = cruise_speed;
    }

    pub fn cruise_speed(&self) -> SpeedKph {
        self.cruise_speed
    }

    /// Follow the target when one is detected in range, otherwise track the
    /// cruise setpoint.
    pub fn control_loop<A: KinematicAgent>(&self, ego: &A, target: Option<&A>) -> f64 {
        match target {
            Some(t) if ego.distance_to(t) < DETECTION_RANGE_M => self.follow_control(ego, t),
            _ => self.cruise_control(ego),
        }
    }

    fn follow_control<A: KinematicAgent>(&self, ego: &A, target: &A) -> f64 {
        let current_distance = ego.distance_to(target);
        let desired_distance = ego.speed_mps() * DESIRED_TIME_GAP_S + MIN_FOLLOWING_DISTANCE_M;
        let distance_error = current_distance - desired_distance;
        (distance_error / DESIRED_TIME_GAP_S).clamp(MAX_DECEL_MPS2, MAX_ACCEL_MPS2)
    }

    fn cruise_control<A: KinematicAgent>(&self, ego: &A) -> f64 {
        let speed_error = self.cruise_speed.mps() - ego.speed_mps();
        (speed_error / DESIRED_TIME_GAP_S).clamp(MAX_DECEL_MPS2, MAX_ACCEL_MPS2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::LaneVehicle;

    #[test]
    fn test_follow_accelerates_into_large_gap() {
        let acc = AccController::new(SpeedKph(36.0));
        let ego = LaneVehicle::new(0.0, 10.0);
        let target = LaneVehicle::new(50.0, 10.0);
        // desired 20 m, error +30 → clamped to max accel
        assert_eq!(acc.control_loop(&ego, Some(&target)), MAX_ACCEL_MPS2);
    }

    #[test]
    fn test_follow_brakes_when_too_close() {
        let acc = AccController::new(SpeedKph(36.0));
        let ego = LaneVehicle::new(0.0, 10.0);
        let target = LaneVehicle::new(10.0, 10.0);
        // desired 20 m, error −10 → clamped to max decel
        assert_eq!(acc.control_loop(&ego, Some(&target)), MAX_DECEL_MPS2);
    }

    #[test]
    fn test_follow_proportional_region() {
        let acc = AccController::new(SpeedKph(36.0));
        let ego = LaneVehicle::new(0.0, 10.0);
        let target = LaneVehicle::new(21.8, 10.0);
        // desired 20 m, error 1.8 → 1.0 m/s²
        assert!((acc.control_loop(&ego, Some(&target)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_detection_range_boundary() {
        let acc = AccController::new(SpeedKph(36.0)); // cruise 10 m/s
        let ego = LaneVehicle::new(0.0, 10.0);

        // At exactly the detection range the target is ignored: cruise holds.
        let at_range = LaneVehicle::new(DETECTION_RANGE_M, 0.0);
        assert!(acc.control_loop(&ego, Some(&at_range)).abs() < 1e-12);

        // Just inside: follow mode, huge gap → full acceleration.
        let inside = LaneVehicle::new(DETECTION_RANGE_M - 0.1, 0.0);
        assert_eq!(acc.control_loop(&ego, Some(&inside)), MAX_ACCEL_MPS2);
    }

    #[test]
    fn test_cruise_tracks_setpoint() {
        let acc = AccController::new(SpeedKph(36.0)); // 10 m/s
        let at_speed = LaneVehicle::new(0.0, 10.0);
        assert!(acc.control_loop(&at_speed, None).abs() < 1e-12);

        let slow = LaneVehicle::new(0.0, 2.0);
        assert_eq!(acc.control_loop(&slow, None), MAX_ACCEL_MPS2);

        let fast = LaneVehicle::new(0.0, 20.0);
        assert_eq!(acc.control_loop(&fast, None), MAX_DECEL_MPS2);

        let near = LaneVehicle::new(0.0, 9.1);
        assert!((acc.control_loop(&near, None) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cruise_setpoint_is_mutable() {
        let mut acc = AccController::new(SpeedKph(36.0));
        acc.set_cruise_speed(SpeedKph(72.0));
        let ego = LaneVehicle::new(0.0, 10.0);
        // setpoint now 20 m/s → error 10 → clamped
        assert_eq!(acc.control_loop(&ego, None), MAX_ACCEL_MPS2);
        assert_eq!(acc.cruise_speed(), SpeedKph(72.0));
    }
}
