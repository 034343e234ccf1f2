//! Obstacle-avoidance policy: range normalization and the turn/forward
//! decision.

use rover_config::AvoidanceCfg;

/// Steering decision for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    Turn,
    Forward,
}

/// Normalize the no-echo sentinel: a raw reading of exactly 0 means the
/// sensor heard nothing, which reads as "clear" at the sensor ceiling.
#[inline]
pub fn normalize_range(raw: f32, max_range: f32) -> f32 {
    if raw == 0.0 { max_range } else { raw }
}

/// Strictly-below threshold selects the turn branch; the boundary itself is
/// forward.
#[inline]
pub fn decide(range: f32, threshold: f32) -> Steer {
    if range < threshold {
        Steer::Turn
    } else {
        Steer::Forward
    }
}

/// What the policy does with motor speeds.
///
/// The reference firmware only ever updates the display in the avoidance
/// branches; the turn/forward speed assignments exist there solely as
/// commented intent, so motor speeds keep whatever value they last had.
/// `DisplayOnly` reproduces that; `Drive` applies the documented intent
/// speeds. Which one runs is a configuration decision, not a code change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrivePolicy {
    DisplayOnly,
    Drive {
        turn: (f32, f32),
        forward: (f32, f32),
    },
}

impl DrivePolicy {
    pub fn from_cfg(cfg: &AvoidanceCfg) -> Self {
        if cfg.drive_enabled {
            DrivePolicy::Drive {
                turn: (cfg.turn_left_speed, cfg.turn_right_speed),
                forward: (cfg.forward_speed, cfg.forward_speed),
            }
        } else {
            DrivePolicy::DisplayOnly
        }
    }

    /// Speeds for a decision. `None` means "leave the previous drive command
    /// in place".
    pub fn speeds(&self, steer: Steer) -> Option<(f32, f32)> {
        match self {
            DrivePolicy::DisplayOnly => None,
            DrivePolicy::Drive { turn, forward } => Some(match steer {
                Steer::Turn => *turn,
                Steer::Forward => *forward,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 150.0)]
    #[case(1.0, 1.0)]
    #[case(49.0, 49.0)]
    #[case(150.0, 150.0)]
    fn sentinel_normalization(#[case] raw: f32, #[case] expected: f32) {
        assert_eq!(normalize_range(raw, 150.0), expected);
    }

    #[test]
    fn threshold_is_strict() {
        assert_eq!(decide(49.0, 50.0), Steer::Turn);
        assert_eq!(decide(50.0, 50.0), Steer::Forward);
        assert_eq!(decide(150.0, 50.0), Steer::Forward);
    }

    #[test]
    fn display_only_policy_never_touches_speeds() {
        let p = DrivePolicy::DisplayOnly;
        assert_eq!(p.speeds(Steer::Turn), None);
        assert_eq!(p.speeds(Steer::Forward), None);
    }

    #[test]
    fn drive_policy_uses_configured_speeds() {
        let cfg = AvoidanceCfg {
            drive_enabled: true,
            ..AvoidanceCfg::default()
        };
        let p = DrivePolicy::from_cfg(&cfg);
        assert_eq!(p.speeds(Steer::Turn), Some((-0.3, 0.3)));
        assert_eq!(p.speeds(Steer::Forward), Some((0.3, 0.3)));
    }
}
