//! vehicle.rs — Point-mass longitudinal kinematics
//!
//! A deliberately small stand-in for the full 2D rigid-body simulation
//! library: vehicles live on a lane centerline, carry a scalar speed, and
//! advance by Euler integration under the last acceleration command they were
//! given. The controller code only ever talks to the [`KinematicAgent`]
//! contract, so the external library's agents can be substituted without
//! touching the decision units.
//!
//! Invariants:
//! - speed never goes negative; braking stops at zero, vehicles do not reverse
//! - a control command persists until overwritten
//! - vehicles are mutated only by [`LaneWorld::tick`] and `set_control`

/// The slice of the external kinematic/collision library the decision units
/// depend on.
pub trait KinematicAgent {
    fn position_m(&self) -> f64;
    fn speed_mps(&self) -> f64;
    /// Longitudinal gap to `other`, positive when `other` leads.
    fn distance_to(&self, other: &Self) -> f64;
    /// Steering is accepted for interface parity with the 2D library and
    /// ignored by the lane-locked model.
    fn set_control(&mut self, steering: f64, accel_mps2: f64);
    fn collides_with(&self, other: &Self) -> bool;
}

/// Lane-locked point-mass vehicle.
#[derive(Debug, Clone)]
pub struct LaneVehicle {
    start_m: f64,
    position_m: f64,
    speed_mps: f64,
    accel_cmd_mps2: f64,
}

impl LaneVehicle {
    pub fn new(position_m: f64, speed_mps: f64) -> Self {
        Self {
            start_m: position_m,
            position_m,
            speed_mps,
            accel_cmd_mps2: 0.0,
        }
    }

    pub fn accel_cmd_mps2(&self) -> f64 {
        self.accel_cmd_mps2
    }

    fn tick(&mut self, dt_s: f64) {
        self.speed_mps = (self.speed_mps + self.accel_cmd_mps2 * dt_s).max(0.0);
        self.position_m += self.speed_mps * dt_s;
    }
}

impl KinematicAgent for LaneVehicle {
    fn position_m(&self) -> f64 {
        self.position_m
    }

    fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    fn distance_to(&self, other: &Self) -> f64 {
        other.position_m - self.position_m
    }

    fn set_control(&mut self, _steering: f64, accel_mps2: f64) {
        self.accel_cmd_mps2 = accel_mps2;
    }

    /// Point contact: the vehicle that spawned behind has closed the gap to
    /// (or past) the one that spawned ahead.
    fn collides_with(&self, other: &Self) -> bool {
        if self.start_m <= other.start_m {
            other.position_m - self.position_m <= 0.0
        } else {
            self.position_m - other.position_m <= 0.0
        }
    }
}

/// Handle to a vehicle registered with a [`LaneWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleId(usize);

/// Owns the vehicles and the simulation clock; the only mutator of vehicle
/// state. Fixed logical timestep — no wall-clock anywhere.
pub struct LaneWorld {
    vehicles: Vec<LaneVehicle>,
    t_s: f64,
    dt_s: f64,
}

impl LaneWorld {
    pub fn new(dt_s: f64) -> Self {
        Self {
            vehicles: Vec::new(),
            t_s: 0.0,
            dt_s,
        }
    }

    pub fn add(&mut self, vehicle: LaneVehicle) -> VehicleId {
        self.vehicles.push(vehicle);
        VehicleId(self.vehicles.len() - 1)
    }

    pub fn vehicle(&self, id: VehicleId) -> &LaneVehicle {
        &self.vehicles[id.0]
    }

    pub fn set_control(&mut self, id: VehicleId, steering: f64, accel_mps2: f64) {
        self.vehicles[id.0].set_control(steering, accel_mps2);
    }

    /// Advance every vehicle by one timestep and the clock with them.
    pub fn tick(&mut self) {
        for vehicle in &mut self.vehicles {
            vehicle.tick(self.dt_s);
        }
        self.t_s += self.dt_s;
    }

    pub fn elapsed_s(&self) -> f64 {
        self.t_s
    }

    pub fn collision_exists(&self) -> bool {
        for i in 0..self.vehicles.len() {
            for j in (i + 1)..self.vehicles.len() {
                if self.vehicles[i].collides_with(&self.vehicles[j]) {
                    return true;
                }
            }
        }
        false
    }
}
