//! 关节帧（Joint Frame）
//!
//! 每个驱动关节一条记录，包含测量量、期望量与 PD 增益。
//!
//! # 数据流
//!
//! ```text
//! 状态估计 ──写入──▶ q / qd
//!                      │
//!               活动控制状态 run()
//!                      │
//!                      ▼
//!   q_des / qd_des / tau_ff / kp / kd ──读取──▶ 执行器 I/O
//! ```
//!
//! 执行器侧计算的力矩为：
//!
//! ```text
//! tau = kp * (q_des - q) + kd * (qd_des - qd) + tau_ff
//! ```

use crate::joint::{JointArray, LegJoint};

/// 单关节控制记录
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointFrame {
    /// 测量位置（rad）
    pub q: f32,
    /// 测量速度（rad/s）
    pub qd: f32,
    /// 期望位置（rad）
    pub q_des: f32,
    /// 期望速度（rad/s）
    pub qd_des: f32,
    /// 前馈力矩（N·m）
    pub tau_ff: f32,
    /// 位置增益（N·m/rad）
    pub kp: f32,
    /// 速度增益（N·m/(rad/s)）
    pub kd: f32,
}

impl JointFrame {
    /// 执行器按当前记录应输出的力矩（N·m）
    #[inline]
    pub fn commanded_torque(&self) -> f32 {
        self.kp * (self.q_des - self.q) + self.kd * (self.qd_des - self.qd) + self.tau_ff
    }

    /// 一次性写入全部期望字段
    #[inline]
    pub fn set_command(&mut self, q_des: f32, qd_des: f32, tau_ff: f32, kp: f32, kd: f32) {
        self.q_des = q_des;
        self.qd_des = qd_des;
        self.tau_ff = tau_ff;
        self.kp = kp;
        self.kd = kd;
    }

    /// 期望字段是否全部为有限值
    #[inline]
    pub fn command_is_finite(&self) -> bool {
        self.q_des.is_finite()
            && self.qd_des.is_finite()
            && self.tau_ff.is_finite()
            && self.kp.is_finite()
            && self.kd.is_finite()
    }
}

/// 双腿关节控制数据
///
/// 控制循环启动时分配一次，之后每个控制周期由活动状态原地修改，直到关闭。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LegControlData {
    pub joints: JointArray<JointFrame>,
}

impl LegControlData {
    /// 创建全零数据
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取单个关节
    #[inline]
    pub fn joint(&self, joint: LegJoint) -> &JointFrame {
        &self.joints[joint]
    }

    /// 可变访问单个关节
    #[inline]
    pub fn joint_mut(&mut self, joint: LegJoint) -> &mut JointFrame {
        &mut self.joints[joint]
    }

    /// 当前测量位置
    pub fn measured_positions(&self) -> JointArray<f32> {
        self.joints.map(|frame| frame.q)
    }

    /// 当前测量速度
    pub fn measured_velocities(&self) -> JointArray<f32> {
        self.joints.map(|frame| frame.qd)
    }

    /// 写入测量值（由状态估计侧调用）
    pub fn set_measured(&mut self, q: &JointArray<f32>, qd: &JointArray<f32>) {
        for (i, frame) in self.joints.iter_mut().enumerate() {
            frame.q = q[i];
            frame.qd = qd[i];
        }
    }

    /// 清零所有期望字段
    pub fn zero_commands(&mut self) {
        for frame in self.joints.iter_mut() {
            frame.set_command(0.0, 0.0, 0.0, 0.0, 0.0);
        }
    }

    /// 每个关节执行器应输出的力矩
    pub fn commanded_torques(&self) -> JointArray<f32> {
        self.joints.map(|frame| frame.commanded_torque())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commanded_torque_damping_only() {
        let frame = JointFrame {
            qd: 0.3,
            kd: 5.0,
            ..Default::default()
        };
        assert!((frame.commanded_torque() - (-1.5)).abs() < 1e-6);
    }

    #[test]
    fn test_commanded_torque_pd_with_feedforward() {
        let frame = JointFrame {
            q: 0.1,
            qd: 0.0,
            q_des: 0.3,
            qd_des: 0.0,
            tau_ff: 1.0,
            kp: 10.0,
            kd: 1.0,
        };
        assert!((frame.commanded_torque() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_measured_and_zero_commands() {
        let mut leg = LegControlData::new();
        let q = JointArray::new([0.5; 12]);
        let qd = JointArray::new([-0.1; 12]);
        leg.set_measured(&q, &qd);
        leg.joint_mut(LegJoint::LeftKnee).set_command(1.0, 1.0, 1.0, 1.0, 1.0);

        leg.zero_commands();

        assert_eq!(leg.measured_positions(), q);
        assert_eq!(leg.measured_velocities(), qd);
        assert_eq!(leg.joint(LegJoint::LeftKnee).kp, 0.0);
        assert_eq!(leg.joint(LegJoint::LeftKnee).q, 0.5);
    }

    #[test]
    fn test_command_is_finite() {
        let mut frame = JointFrame::default();
        assert!(frame.command_is_finite());
        frame.tau_ff = f32::NAN;
        assert!(!frame.command_is_finite());
    }
}
