//! 被动状态（PASSIVE）
//!
//! 急停目标：不输出任何主动力矩。期望位置跟随测量位置，增益全部为 0，
//! 执行器侧计算出的力矩恒为 0。

use crate::context::ControlFsmData;
use crate::state::{FsmState, resolve_request};
use crate::transition::TransitionData;
use biped_types::{ControlMode, StateName};
use tracing::info;

/// 被动状态
#[derive(Debug, Default)]
pub struct PassiveState {
    transition_data: TransitionData,
    iter: u64,
}

impl PassiveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iterations(&self) -> u64 {
        self.iter
    }

    fn route(mode: ControlMode) -> Option<StateName> {
        match mode {
            ControlMode::Passive => Some(StateName::Passive),
            ControlMode::JointPd => Some(StateName::JointPd),
            ControlMode::LockJoint => Some(StateName::LockJoint),
            // 站立需要先经过 JointPd 或 LockJoint 建立刚度
            ControlMode::BalanceStand
            | ControlMode::StandUp
            | ControlMode::Locomotion
            | ControlMode::RecoveryStand
            | ControlMode::ImpedanceControl => None,
        }
    }
}

impl FsmState for PassiveState {
    fn name(&self) -> StateName {
        StateName::Passive
    }

    fn on_enter(&mut self, data: &mut ControlFsmData) {
        self.transition_data.zero();
        self.iter = 0;
        info!(
            "[FSM PASSIVE] On Enter, safety checks {}",
            if data.safety_checks_enabled() { "on" } else { "off" }
        );
    }

    fn run(&mut self, data: &mut ControlFsmData) {
        for frame in data.leg.joints.iter_mut() {
            let hold = if frame.q.is_finite() { frame.q } else { 0.0 };
            frame.set_command(hold, 0.0, 0.0, 0.0, 0.0);
        }
        self.iter += 1;
    }

    fn check_transition(&self, data: &ControlFsmData) -> StateName {
        resolve_request(self.name(), data, Self::route)
    }

    fn transition(&mut self, next: StateName, data: &mut ControlFsmData) -> TransitionData {
        match next {
            StateName::JointPd | StateName::LockJoint => {
                data.turn_on_all_safety_checks();
                self.transition_data.safety_checks_disabled = false;
            },
            // 不在模式表内：照常结束交接以免卡住调度器，安全检查保持原样
            StateName::Passive | StateName::BalanceStand => {
                data.report_invalid_transition(self.name())
            },
        }

        self.transition_data.finish_immediately();
        self.transition_data
    }

    fn on_exit(&mut self, _data: &mut ControlFsmData) {}
}
