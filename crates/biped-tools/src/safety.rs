//! # 安全限制
//!
//! 主动控制状态下的增益、速度、前馈力矩与关节位置包络。
//! 仅在"安全检查"开启时由控制核心强制执行；被动模式会整体关闭安全检查。

use biped_types::{JointArray, LegJoint};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 安全限制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyLimits {
    /// 位置增益上限（N·m/rad）
    pub max_kp: f32,

    /// 速度增益上限（N·m/(rad/s)）
    pub max_kd: f32,

    /// 期望速度上限（rad/s）
    pub max_velocity: f32,

    /// 前馈力矩上限（N·m）
    pub max_feedforward_torque: f32,

    /// 关节位置下限（rad）
    pub q_min: JointArray<f32>,

    /// 关节位置上限（rad）
    pub q_max: JointArray<f32>,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        // 单腿：髋 roll / yaw / pitch、膝、踝 pitch / roll
        const LEG_MIN: [f32; 6] = [-0.5, -0.6, -1.5, -2.2, -0.8, -0.4];
        const LEG_MAX: [f32; 6] = [0.5, 0.6, 1.0, 0.1, 0.8, 0.4];

        Self {
            max_kp: 200.0,
            max_kd: 10.0,
            max_velocity: 10.0,
            max_feedforward_torque: 60.0,
            q_min: JointArray::new(mirror(LEG_MIN)),
            q_max: JointArray::new(mirror(LEG_MAX)),
        }
    }
}

/// 左右腿使用同一组限位
const fn mirror(leg: [f32; 6]) -> [f32; 12] {
    [
        leg[0], leg[1], leg[2], leg[3], leg[4], leg[5], leg[0], leg[1], leg[2], leg[3], leg[4],
        leg[5],
    ]
}

impl SafetyLimits {
    /// 检查增益是否在限制内（增益必须非负）
    pub fn check_gains(&self, kp: f32, kd: f32) -> bool {
        (0.0..=self.max_kp).contains(&kp) && (0.0..=self.max_kd).contains(&kd)
    }

    /// 检查期望速度是否在限制内
    pub fn check_velocity(&self, velocity: f32) -> bool {
        velocity.abs() <= self.max_velocity
    }

    /// 检查关节位置是否在限制内
    pub fn check_joint_position(&self, joint: LegJoint, position: f32) -> bool {
        position >= self.q_min[joint] && position <= self.q_max[joint]
    }

    /// 将位置钳位到关节范围内
    #[inline]
    pub fn clamp_joint_position(&self, joint: LegJoint, position: f32) -> f32 {
        position.clamp(self.q_min[joint], self.q_max[joint])
    }

    /// 校验限制本身是否自洽
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("limits.max_kp", self.max_kp),
            ("limits.max_kd", self.max_kd),
            ("limits.max_velocity", self.max_velocity),
            ("limits.max_feedforward_torque", self.max_feedforward_torque),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }

        for joint in LegJoint::ALL {
            let (lo, hi) = (self.q_min[joint], self.q_max[joint]);
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(ConfigError::invalid(
                    format!("limits.q_min/q_max[{joint}]"),
                    format!("invalid range [{lo}, {hi}]"),
                ));
            }
        }

        Ok(())
    }

    /// 检查整组姿态是否落在关节范围内
    ///
    /// 用于校验参考姿态、目标姿态这类配置：落在范围外的姿态会被安全检查逐周期改写。
    pub fn check_pose(&self, field: &str, pose: &JointArray<f32>) -> Result<(), ConfigError> {
        match pose
            .iter_joints()
            .find(|(joint, q)| !self.check_joint_position(*joint, **q))
        {
            Some((joint, q)) => Err(ConfigError::invalid(
                format!("{field}[{joint}]"),
                format!(
                    "{q} outside joint range [{}, {}]",
                    self.q_min[joint], self.q_max[joint]
                ),
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_are_valid() {
        assert!(SafetyLimits::default().validate().is_ok());
    }

    #[test]
    fn test_gain_limits() {
        let limits = SafetyLimits::default();
        assert!(limits.check_gains(0.0, 0.0));
        assert!(limits.check_gains(200.0, 10.0));
        assert!(!limits.check_gains(-1.0, 1.0));
        assert!(!limits.check_gains(10.0, 10.5));
    }

    #[test]
    fn test_velocity_limit() {
        let limits = SafetyLimits::default();
        assert!(limits.check_velocity(9.9));
        assert!(!limits.check_velocity(-10.5));
    }

    #[test]
    fn test_joint_position_limit() {
        let limits = SafetyLimits::default();
        assert!(limits.check_joint_position(LegJoint::LeftKnee, -0.48));
        assert!(!limits.check_joint_position(LegJoint::RightKnee, 0.5));
        assert_eq!(limits.clamp_joint_position(LegJoint::RightKnee, 0.5), 0.1);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut limits = SafetyLimits::default();
        limits.q_min[LegJoint::LeftAnkleRoll] = 1.0;
        let err = limits.validate().unwrap_err();
        assert!(err.to_string().contains("l_ankle_roll"));
    }

    #[test]
    fn test_check_pose() {
        let limits = SafetyLimits::default();
        let mut pose = JointArray::splat(0.0);
        assert!(limits.check_pose("pose", &pose).is_ok());

        pose[LegJoint::RightKnee] = 0.5;
        let err = limits.check_pose("pose", &pose).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("pose[r_knee]") && msg.contains("0.5"), "{msg}");
    }

    #[test]
    fn test_validate_rejects_negative_gain_limit() {
        let limits = SafetyLimits {
            max_kd: -1.0,
            ..Default::default()
        };
        assert!(limits.validate().is_err());
    }
}
