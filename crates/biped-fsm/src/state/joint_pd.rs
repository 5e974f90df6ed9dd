//! 关节 PD 状态（JOINT_PD）
//!
//! 从进入时的测量姿态线性插值到配置的目标姿态，之后保持。
//! 增益取自 `params.joint_pd`，无前馈。

use crate::context::ControlFsmData;
use crate::state::blend::{StiffnessRamp, interpolation_alpha, lerp, step_stiffness_ramp};
use crate::state::{FsmState, resolve_request};
use crate::transition::TransitionData;
use biped_types::{ControlMode, JointArray, LegJoint, StateName};
use tracing::info;

/// 关节 PD 状态
#[derive(Debug, Default)]
pub struct JointPdState {
    transition_data: TransitionData,
    iter: u64,
    entry_positions: JointArray<f32>,
    ramp: Option<StiffnessRamp>,
}

impl JointPdState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iterations(&self) -> u64 {
        self.iter
    }

    pub fn entry_positions(&self) -> &JointArray<f32> {
        &self.entry_positions
    }

    fn route(mode: ControlMode) -> Option<StateName> {
        match mode {
            ControlMode::JointPd => Some(StateName::JointPd),
            ControlMode::LockJoint => Some(StateName::LockJoint),
            ControlMode::BalanceStand => Some(StateName::BalanceStand),
            ControlMode::Passive => Some(StateName::Passive),
            ControlMode::StandUp
            | ControlMode::Locomotion
            | ControlMode::RecoveryStand
            | ControlMode::ImpedanceControl => None,
        }
    }
}

impl FsmState for JointPdState {
    fn name(&self) -> StateName {
        StateName::JointPd
    }

    fn on_enter(&mut self, data: &mut ControlFsmData) {
        self.transition_data.zero();
        self.iter = 0;
        self.ramp = None;

        let target = data.params().joint_pd.target;
        // 测量值异常的关节直接从目标开始，避免插值出 NaN
        self.entry_positions = data
            .leg
            .measured_positions()
            .map_with_joint(|joint, q| if q.is_finite() { q } else { target[joint] });

        let pd = &data.params().joint_pd;
        info!(
            "[FSM JOINTPD] On Enter, kp={} kd={} move_ticks={}",
            pd.kp, pd.kd, pd.move_ticks
        );
    }

    fn run(&mut self, data: &mut ControlFsmData) {
        let (leg, params) = data.leg_and_params();
        let pd = &params.joint_pd;
        let alpha = interpolation_alpha(self.iter, pd.move_ticks);

        for joint in LegJoint::ALL {
            let q_des = lerp(self.entry_positions[joint], pd.target[joint], alpha);
            leg.joint_mut(joint).set_command(q_des, 0.0, 0.0, pd.kp, pd.kd);
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
            StateName::BalanceStand => self.transition_data.finish_immediately(),
            StateName::Passive => {
                data.turn_off_all_safety_checks();
                self.transition_data.safety_checks_disabled = true;
                self.transition_data.finish_immediately();
            },
            StateName::JointPd => {
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
