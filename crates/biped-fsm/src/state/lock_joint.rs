//! 关节锁定状态（LOCK_JOINT）
//!
//! 纯阻尼的安全兜底控制律：所有关节 `kp = 0`、零前馈、零期望速度，
//! `kd` 按关节分组取安全阻尼系数。执行器侧力矩因此为 `kd * (0 - qd)`。

use crate::context::ControlFsmData;
use crate::state::{FsmState, resolve_request};
use crate::transition::TransitionData;
use biped_types::{ControlMode, JOINT_COUNT, JointArray, JointGroup, LegJoint, StateName};
use tracing::info;

/// 参考姿态（rad），左腿 0-5、右腿 6-11
pub const LOCK_JOINT_POSE: [f32; JOINT_COUNT] = [
    0.0, 0.0, 0.24, -0.48, 0.24, -0.24, 0.0, 0.0, 0.24, -0.48, -0.24, 0.24,
];

/// 关节锁定状态
#[derive(Debug, Default)]
pub struct LockJointState {
    transition_data: TransitionData,

    /// 自进入以来 `run` 的次数
    iter: u64,

    /// 进入时的测量位置
    ///
    /// 当前控制律使用固定参考姿态，不读取这份快照；
    /// 保留它和它的采集时机，供需要从进入姿态插值的控制律使用。
    entry_positions: JointArray<f32>,
}

impl LockJointState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 进入时采集的关节位置
    pub fn entry_positions(&self) -> &JointArray<f32> {
        &self.entry_positions
    }

    /// 自进入以来的周期数
    pub fn iterations(&self) -> u64 {
        self.iter
    }

    /// 模式表
    fn route(mode: ControlMode) -> Option<StateName> {
        match mode {
            ControlMode::LockJoint => Some(StateName::LockJoint),
            ControlMode::BalanceStand => Some(StateName::BalanceStand),
            ControlMode::JointPd => Some(StateName::JointPd),
            ControlMode::Passive => Some(StateName::Passive),
            ControlMode::StandUp
            | ControlMode::Locomotion
            | ControlMode::RecoveryStand
            | ControlMode::ImpedanceControl => None,
        }
    }
}

impl FsmState for LockJointState {
    fn name(&self) -> StateName {
        StateName::LockJoint
    }

    fn on_enter(&mut self, data: &mut ControlFsmData) {
        self.transition_data.zero();
        self.iter = 0;
        self.entry_positions = data.leg.measured_positions();

        let params = data.params();
        info!(
            "[FSM LOCKJOINT] On Enter, joint damping: hip={} knee={} ankle={}",
            params.damper_kd_for_group(JointGroup::Hip),
            params.damper_kd_for_group(JointGroup::Knee),
            params.damper_kd_for_group(JointGroup::Ankle),
        );
    }

    fn run(&mut self, data: &mut ControlFsmData) {
        let (leg, params) = data.leg_and_params();
        for joint in LegJoint::ALL {
            leg.joint_mut(joint).set_command(
                LOCK_JOINT_POSE[joint.index()],
                0.0,
                0.0,
                0.0,
                params.damper_kd(joint),
            );
        }
        self.iter += 1;
    }

    fn check_transition(&self, data: &ControlFsmData) -> StateName {
        resolve_request(self.name(), data, Self::route)
    }

    fn transition(&mut self, next: StateName, data: &mut ControlFsmData) -> TransitionData {
        match next {
            // 两个目标都从接近锁定姿态的 PD 控制开始，无需渐变
            StateName::JointPd | StateName::BalanceStand => {},
            StateName::Passive => {
                data.turn_off_all_safety_checks();
                self.transition_data.safety_checks_disabled = true;
            },
            StateName::LockJoint => data.report_invalid_transition(self.name()),
        }

        // 无论目标如何都立即完成，避免调度器卡在交接中
        self.transition_data.finish_immediately();
        self.transition_data
    }

    fn on_exit(&mut self, _data: &mut ControlFsmData) {
        // 无需清理
    }
}
