//! 平衡站立状态（BALANCE_STAND）
//!
//! 在 `settle_ticks` 内从进入姿态收敛到站立姿态，带每关节重力补偿前馈。

use crate::context::ControlFsmData;
use crate::state::blend::{StiffnessRamp, interpolation_alpha, lerp, step_stiffness_ramp};
use crate::state::{FsmState, resolve_request};
use crate::transition::TransitionData;
use biped_types::{ControlMode, JointArray, LegJoint, StateName};
use tracing::info;

/// 平衡站立状态
#[derive(Debug, Default)]
pub struct BalanceStandState {
    transition_data: TransitionData,
    iter: u64,
    entry_positions: JointArray<f32>,
    ramp: Option<StiffnessRamp>,
}

impl BalanceStandState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iterations(&self) -> u64 {
        self.iter
    }

    fn route(mode: ControlMode) -> Option<StateName> {
        match mode {
            ControlMode::BalanceStand => Some(StateName::BalanceStand),
            ControlMode::LockJoint => Some(StateName::LockJoint),
            ControlMode::JointPd => Some(StateName::JointPd),
            ControlMode::Passive => Some(StateName::Passive),
            ControlMode::StandUp
            | ControlMode::Locomotion
            | ControlMode::RecoveryStand
            | ControlMode::ImpedanceControl => None,
        }
    }
}

impl FsmState for BalanceStandState {
    fn name(&self) -> StateName {
        StateName::BalanceStand
    }

    fn on_enter(&mut self, data: &mut ControlFsmData) {
        self.transition_data.zero();
        self.iter = 0;
        self.ramp = None;

        let pose = data.params().stand.pose;
        self.entry_positions = data
            .leg
            .measured_positions()
            .map_with_joint(|joint, q| if q.is_finite() { q } else { pose[joint] });

        let stand = &data.params().stand;
        info!(
            "[FSM BALANCESTAND] On Enter, kp={} kd={} settle_ticks={}",
            stand.kp, stand.kd, stand.settle_ticks
        );
    }

    fn run(&mut self, data: &mut ControlFsmData) {
        let (leg, params) = data.leg_and_params();
        let stand = &params.stand;
        let alpha = interpolation_alpha(self.iter, stand.settle_ticks);

        for joint in LegJoint::ALL {
            let q_des = lerp(self.entry_positions[joint], stand.pose[joint], alpha);
            leg.joint_mut(joint)
                .set_command(q_des, 0.0, stand.tau_ff[joint], stand.kp, stand.kd);
        }
        self.iter += 1;
    }

    fn check_transition(&self, data: &ControlFsmData) -> StateName {
        resolve_request(self.name(), data, Self::route)
    }

    fn transition(&mut self, next: StateName, data: &mut ControlFsmData) -> TransitionData {
        match next {
            StateName::LockJoint => {
                step_stiffness_ramp(&mut self.ramp, &mut self.transition_data, data);
            },
            StateName::JointPd => self.transition_data.finish_immediately(),
            StateName::Passive => {
                data.turn_off_all_safety_checks();
                self.transition_data.safety_checks_disabled = true;
                self.transition_data.finish_immediately();
            },
            StateName::BalanceStand => {
                data.report_invalid_transition(self.name());
                self.transition_data.finish_immediately();
            },
        }
        self.transition_data
    }

    fn on_exit(&mut self, _data: &mut ControlFsmData) {
        self.ramp = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::*;
    use biped_tools::ControlParameters;
    use std::sync::Arc;

    #[test]
    fn test_settles_to_stand_pose_with_feedforward() {
        let (mut data, _rx) = context_with_events(ControlMode::BalanceStand);
        let mut params = ControlParameters::default();
        params.stand.settle_ticks = 10;
        params.stand.tau_ff[LegJoint::LeftKnee] = 4.5;
        data.latch_inputs(Some(Arc::new(params)), ControlMode::BalanceStand.as_raw());

        let mut state = BalanceStandState::new();
        state.on_enter(&mut data);
        for _ in 0..20 {
            state.run(&mut data);
        }

        let knee = data.leg.joint(LegJoint::LeftKnee);
        assert!((knee.q_des - data.params().stand.pose[LegJoint::LeftKnee]).abs() < 1e-6);
        assert_eq!(knee.tau_ff, 4.5);
        assert_eq!(knee.kp, 80.0);
        assert_eq!(state.iterations(), 20);
    }

    #[test]
    fn test_lock_joint_ramp_clears_feedforward() {
        let (mut data, _rx) = context_with_events(ControlMode::LockJoint);
        let mut params = ControlParameters::default();
        params.transition.ramp_ticks = 4;
        params.stand.tau_ff = JointArray::splat(2.0);
        data.latch_inputs(Some(Arc::new(params)), ControlMode::LockJoint.as_raw());

        let mut state = BalanceStandState::new();
        state.on_enter(&mut data);
        state.run(&mut data);

        let mut td = state.transition(StateName::LockJoint, &mut data);
        assert!((data.leg.joint(LegJoint::RightKnee).tau_ff - 1.5).abs() < 1e-6);
        while !td.done {
            td = state.transition(StateName::LockJoint, &mut data);
        }
        assert_eq!(td.elapsed_ticks, 4);
        assert_eq!(data.leg.joint(LegJoint::RightKnee).tau_ff, 0.0);
        assert!((data.leg.joint(LegJoint::RightKnee).kd - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_joint_pd_transition_is_immediate() {
        let (mut data, _rx) = context_with_events(ControlMode::JointPd);
        let mut state = BalanceStandState::new();
        state.on_enter(&mut data);
        let td = state.transition(StateName::JointPd, &mut data);
        assert!(td.done);
        assert!(data.safety_checks_enabled());
    }

    #[test]
    fn test_route_table() {
        assert_eq!(BalanceStandState::route(ControlMode::JointPd), Some(StateName::JointPd));
        assert_eq!(BalanceStandState::route(ControlMode::StandUp), None);
    }
}
