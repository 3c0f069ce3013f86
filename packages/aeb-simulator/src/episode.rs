//! episode.rs — Closed-loop episode runner
//!
//! Drives one scenario from t=0 to collision or horizon exhaustion:
//! `Running → Collided | Completed`. Per tick, in order:
//! (a) evaluate the target driver and set the target's command
//! (b) evaluate AEB and ACC on the current kinematic state
//! (c) arbitrate (more aggressive braking wins) and pass the result through
//!     the actuation latency gate
//! (d) advance the world one timestep
//! (e) check the pairwise collision predicate
//! (f) append telemetry
//! (g) terminate or continue
//!
//! Everything an episode touches — world, vehicles, controllers, driver — is
//! constructed here and dropped at the end, so independent episodes can run
//! in parallel with no shared state and identical inputs reproduce
//! bit-identical results.

use aeb_types::{
    ControlMode, EpisodeOutcome, EpisodeResult, ScenarioConfig, ScenarioError, SpeedKph,
    TargetBehaviorSpec, TelemetrySample, KPH_PER_MPS, MPH_PER_MPS, TTC_DISPLAY_CAP_S,
};
use serde::Deserialize;
use tracing::debug;

use crate::acc::AccController;
use crate::aeb::AebController;
use crate::target::driver_from_spec;
use crate::vehicle::{KinematicAgent, LaneVehicle, LaneWorld};

pub const DEFAULT_DT_S: f64 = 0.1;
pub const DEFAULT_HORIZON_TICKS: u32 = 250;

/// AEB must undercut ACC by more than this to count as an intervention in
/// combined mode, filtering out ties and numerical noise.
pub const AEB_TRIGGER_THRESHOLD_MPS2: f64 = 0.1;

/// Fixed-step loop parameters, shared by every scenario in a run.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EpisodeParams {
    pub dt_s: f64,
    pub horizon_ticks: u32,
}

impl Default for EpisodeParams {
    fn default() -> Self {
        Self {
            dt_s: DEFAULT_DT_S,
            horizon_ticks: DEFAULT_HORIZON_TICKS,
        }
    }
}

/// The more aggressive (numerically smaller) command wins.
pub fn arbitrate(aeb_decel_mps2: f64, acc_accel_mps2: f64) -> f64 {
    aeb_decel_mps2.min(acc_accel_mps2)
}

/// Run one episode to termination. Validates the scenario first; invalid
/// configs never build any episode state.
pub fn run_episode(
    config: &ScenarioConfig,
    params: EpisodeParams,
) -> Result<EpisodeResult, ScenarioError> {
    config.validate()?;

    let ego_start_mps = config.ego_speed.mps();
    let target_start_mps = match &config.behavior {
        // A profile target starts on its schedule, not the configured speed.
        TargetBehaviorSpec::Profile(profile) => profile.initial_speed_mps(),
        _ => config.target_speed.mps(),
    };

    let mut world = LaneWorld::new(params.dt_s);
    let ego = world.add(LaneVehicle::new(config.ego_start_x_m, ego_start_mps));
    let target = world.add(LaneVehicle::new(config.target_start_x_m, target_start_mps));

    let mut aeb = AebController::new();
    let acc = AccController::new(config.cruise_speed.unwrap_or(config.ego_speed));
    let mut driver = driver_from_spec(&config.behavior, target_start_mps, params.dt_s);

    debug!(
        gap_m = config.initial_gap_m(),
        ego_kph = config.ego_speed.0,
        mode = ?config.control_mode,
        "episode start"
    );

    let mut telemetry = Vec::with_capacity(params.horizon_ticks as usize);
    let mut aeb_triggered = false;
    let mut outcome = EpisodeOutcome::Completed;
    let mut impact_speed_kph = 0.0;

    for k in 0..params.horizon_ticks {
        let now_s = k as f64 * params.dt_s;

        // (a) target behavior
        let gap_m = world.vehicle(ego).distance_to(world.vehicle(target));
        let target_speed_mps = world.vehicle(target).speed_mps();
        let target_cmd = driver.command(now_s, gap_m, target_speed_mps);
        world.set_control(target, 0.0, target_cmd);

        // (b) decision units
        let decision = aeb.calculate_control(world.vehicle(ego), world.vehicle(target), now_s);
        let acc_cmd = match config.control_mode {
            ControlMode::AccAeb => acc.control_loop(world.vehicle(ego), Some(world.vehicle(target))),
            // AEB-only: the ego coasts unless AEB brakes, which arbitration
            // expresses as a standing zero-acceleration command.
            ControlMode::AebOnly => 0.0,
        };

        // (c) arbitration + latency gate. The gate, not the arbitration
        // output, decides what reaches the actuator this tick.
        let final_cmd = arbitrate(decision.applied_decel_mps2, acc_cmd);
        if aeb.latency_elapsed(now_s) {
            aeb.note_release(final_cmd);
            world.set_control(ego, 0.0, final_cmd);
        }
        aeb_triggered |= match config.control_mode {
            ControlMode::AebOnly => aeb.released_decel_mps2() < 0.0,
            ControlMode::AccAeb => {
                decision.applied_decel_mps2 < acc_cmd
                    && decision.applied_decel_mps2 < -AEB_TRIGGER_THRESHOLD_MPS2
            }
        };

        let sample = TelemetrySample {
            time_s: now_s,
            distance_m: decision.distance_m,
            ego_speed_mph: decision.ego_speed_mps * MPH_PER_MPS,
            ttc_s: decision.ttc_s.min(TTC_DISPLAY_CAP_S),
            required_decel_mps2: decision.required_decel_mps2,
            applied_decel_mps2: aeb.released_decel_mps2(),
            target_speed_kph: target_speed_mps * KPH_PER_MPS,
        };

        // (d) advance
        world.tick();

        // (e)–(g) collision check, telemetry, transition
        telemetry.push(sample);
        if world.collision_exists() {
            outcome = EpisodeOutcome::Collided;
            let relative_mps =
                (world.vehicle(ego).speed_mps() - world.vehicle(target).speed_mps()).abs();
            impact_speed_kph = relative_mps * KPH_PER_MPS;
            debug!(time_s = world.elapsed_s(), impact_speed_kph, "collision");
            break;
        }
    }

    let final_ego_mps = world.vehicle(ego).speed_mps();
    let result = EpisodeResult {
        outcome,
        collision_occurred: outcome == EpisodeOutcome::Collided,
        impact_speed_kph,
        aeb_triggered,
        speed_reduction_kph: SpeedKph::from_mps(ego_start_mps - final_ego_mps).0,
        fcw_activation: aeb.fcw_activation,
        soft_brake_activation: aeb.soft_brake_activation,
        hard_brake_activation: aeb.hard_brake_activation,
        telemetry,
    };
    debug!(summary = %result.summary(), "episode end");
    Ok(result)
}
