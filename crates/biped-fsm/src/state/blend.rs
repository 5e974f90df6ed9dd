//! 交接期间的插值与刚度渐变

use crate::context::ControlFsmData;
use crate::transition::TransitionData;
use biped_tools::ControlParameters;
use biped_types::{JointArray, JointFrame, LegControlData, LegJoint};

/// 线性插值
#[inline]
pub(crate) fn lerp(from: f32, to: f32, alpha: f32) -> f32 {
    from + (to - from) * alpha
}

/// 插值进度：`iter / ticks`，钳位到 [0, 1]；`ticks == 0` 时直接到位
#[inline]
pub(crate) fn interpolation_alpha(iter: u64, ticks: u32) -> f32 {
    if ticks == 0 {
        1.0
    } else {
        (iter as f32 / ticks as f32).min(1.0)
    }
}

/// 主动控制 → 纯阻尼的刚度渐变
///
/// 起点是交接开始时各关节最后一次写入的命令。渐变过程中保持期望位置不动，
/// `kp` 与前馈力矩线性衰减到 0，`kd` 线性过渡到安全阻尼系数。
#[derive(Debug, Clone, Copy)]
pub(crate) struct StiffnessRamp {
    start: JointArray<JointFrame>,
}

impl StiffnessRamp {
    pub(crate) fn capture(leg: &LegControlData) -> Self {
        Self { start: leg.joints }
    }

    pub(crate) fn apply(&self, leg: &mut LegControlData, params: &ControlParameters, alpha: f32) {
        for joint in LegJoint::ALL {
            let start = &self.start[joint];
            leg.joint_mut(joint).set_command(
                start.q_des,
                0.0,
                lerp(start.tau_ff, 0.0, alpha),
                lerp(start.kp, 0.0, alpha),
                lerp(start.kd, params.damper_kd(joint), alpha),
            );
        }
    }
}

/// 推进一步渐变交接
///
/// 第一次调用时以 `params.transition.ramp_ticks` 为时长开始，并记录起点。
pub(crate) fn step_stiffness_ramp(
    ramp: &mut Option<StiffnessRamp>,
    transition_data: &mut TransitionData,
    data: &mut ControlFsmData,
) {
    let current = match ramp {
        Some(current) => *current,
        None => {
            transition_data.begin(data.params().transition.ramp_ticks);
            let captured = StiffnessRamp::capture(&data.leg);
            *ramp = Some(captured);
            captured
        },
    };

    transition_data.advance();
    let alpha = transition_data.progress();
    let (leg, params) = data.leg_and_params();
    current.apply(leg, params, alpha);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::*;
    use biped_types::ControlMode;

    #[test]
    fn test_interpolation_alpha() {
        assert_eq!(interpolation_alpha(0, 0), 1.0);
        assert_eq!(interpolation_alpha(0, 10), 0.0);
        assert_eq!(interpolation_alpha(5, 10), 0.5);
        assert_eq!(interpolation_alpha(50, 10), 1.0);
    }

    #[test]
    fn test_ramp_reaches_pure_damping() {
        let (mut data, _rx) = context_with_events(ControlMode::LockJoint);
        for frame in data.leg.joints.iter_mut() {
            frame.set_command(0.3, 0.1, 2.0, 80.0, 2.0);
        }

        let mut ramp = None;
        let mut td = TransitionData::default();
        let ticks = data.params().transition.ramp_ticks;

        step_stiffness_ramp(&mut ramp, &mut td, &mut data);
        let knee = *data.leg.joint(LegJoint::LeftKnee);
        assert!(knee.kp < 80.0 && knee.kp > 0.0);
        assert_eq!(knee.q_des, 0.3);
        assert_eq!(knee.qd_des, 0.0);

        for _ in 1..ticks {
            assert!(!td.done);
            step_stiffness_ramp(&mut ramp, &mut td, &mut data);
        }
        assert!(td.done);
        assert_eq!(td.elapsed_ticks, ticks);

        for joint in LegJoint::ALL {
            let frame = data.leg.joint(joint);
            assert_eq!(frame.kp, 0.0);
            assert_eq!(frame.tau_ff, 0.0);
            assert!((frame.kd - data.params().damper_kd(joint)).abs() < 1e-6);
            assert_eq!(frame.q_des, 0.3);
        }
    }
}
