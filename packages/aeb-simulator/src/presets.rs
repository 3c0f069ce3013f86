//! presets.rs — Built-in scenario presets
//!
//! Canonical configurations selectable from the CLI without a config file.
//! Each exercises a distinct regime of the safety envelope.

use aeb_types::{ControlMode, ScenarioConfig, SpeedKph, SpeedProfile, TargetBehaviorSpec};

/// Comfortable approach to a stationary vehicle: staged braking arrests the
/// ego with margin.
pub fn preset_stationary_target() -> ScenarioConfig {
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

/// Gap too short for even the full-brake tier: guaranteed impact, useful for
/// mitigation (impact-speed) analysis.
pub fn preset_short_gap() -> ScenarioConfig {
    ScenarioConfig {
        ego_start_x_m: 27.0,
        ego_speed: SpeedKph(50.0),
        target_start_x_m: 40.0,
        target_speed: SpeedKph(0.0),
        behavior: TargetBehaviorSpec::Trigger {
            decel_mps2: 0.0,
            trigger_distance_m: 0.0,
        },
        control_mode: ControlMode::AebOnly,
        cruise_speed: None,
    }
}

/// Lead vehicle brakes hard mid-approach, triggered by proximity.
pub fn preset_decelerating_target() -> ScenarioConfig {
    ScenarioConfig {
        ego_start_x_m: 0.0,
        ego_speed: SpeedKph(60.0),
        target_start_x_m: 80.0,
        target_speed: SpeedKph(40.0),
        behavior: TargetBehaviorSpec::Trigger {
            decel_mps2: -4.0,
            trigger_distance_m: 25.0,
        },
        control_mode: ControlMode::AebOnly,
        cruise_speed: None,
    }
}

/// ACC car-following behind a target that brakes for a while and recovers.
pub fn preset_acc_follow() -> ScenarioConfig {
    ScenarioConfig {
        ego_start_x_m: 0.0,
        ego_speed: SpeedKph(55.0),
        target_start_x_m: 100.0,
        target_speed: SpeedKph(55.0),
        behavior: TargetBehaviorSpec::Timed {
            decel_mps2: -2.0,
            start_s: 6.0,
            duration_s: 4.0,
        },
        control_mode: ControlMode::AccAeb,
        cruise_speed: Some(SpeedKph(55.0)),
    }
}

/// Combined stack against a target that accelerates away from standstill and
/// then holds highway speed.
pub fn preset_pull_away_profile() -> ScenarioConfig {
    ScenarioConfig {
        ego_start_x_m: 0.0,
        ego_speed: SpeedKph(60.0),
        target_start_x_m: 50.0,
        target_speed: SpeedKph(0.0),
        behavior: TargetBehaviorSpec::Profile(SpeedProfile::new(
            vec![0.0, 10.0, 20.0],
            vec![0.0, 27.78, 27.78],
        )),
        control_mode: ControlMode::AccAeb,
        cruise_speed: None,
    }
}

/// Look up a preset by CLI name.
pub fn by_name(name: &str) -> Option<ScenarioConfig> {
    match name {
        "stationary_target" => Some(preset_stationary_target()),
        "short_gap" => Some(preset_short_gap()),
        "decelerating_target" => Some(preset_decelerating_target()),
        "acc_follow" => Some(preset_acc_follow()),
        "pull_away_profile" => Some(preset_pull_away_profile()),
        _ => None,
    }
}

pub const PRESET_NAMES: &[&str] = &[
    "stationary_target",
    "short_gap",
    "decelerating_target",
    "acc_follow",
    "pull_away_profile",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_presets_validate() {
        for name in PRESET_NAMES {
            let cfg = by_name(name).unwrap();
            assert_eq!(cfg.validate(), Ok(()), "preset {name}");
        }
    }

    #[test]
    fn test_unknown_preset_is_none() {
        assert!(by_name("does_not_exist").is_none());
    }
}
