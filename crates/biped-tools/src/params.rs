//! # 控制参数
//!
//! 控制核心在 `run()` 时读取的只读参数，由外部配置方加载并发布。
//!
//! 所有字段都有默认值，TOML 文件只需写出需要覆盖的部分：
//!
//! ```rust
//! use biped_tools::ControlParameters;
//!
//! let params = ControlParameters::from_toml_str(
//!     r#"
//!     safety_damper_kd = [6.0, 4.0, 1.5]
//!
//!     [transition]
//!     ramp_ticks = 100
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(params.safety_damper_kd, [6.0, 4.0, 1.5]);
//! assert_eq!(params.transition.ramp_ticks, 100);
//! assert_eq!(params.control_rate_hz, 500.0);
//! ```

use std::fs;
use std::path::Path;

use biped_types::{JointArray, JointGroup, LegJoint};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::safety::SafetyLimits;

/// 控制参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlParameters {
    /// 控制频率（Hz）
    pub control_rate_hz: f32,

    /// 安全阻尼系数：`[髋, 膝, 踝]`
    pub safety_damper_kd: [f32; 3],

    /// 关节 PD 状态参数
    pub joint_pd: JointPdParams,

    /// 平衡站立状态参数
    pub stand: StandParams,

    /// 状态切换参数
    pub transition: TransitionParams,

    /// 安全限制
    pub limits: SafetyLimits,
}

impl Default for ControlParameters {
    fn default() -> Self {
        Self {
            control_rate_hz: 500.0,
            safety_damper_kd: [5.0, 3.0, 1.0],
            joint_pd: JointPdParams::default(),
            stand: StandParams::default(),
            transition: TransitionParams::default(),
            limits: SafetyLimits::default(),
        }
    }
}

/// 关节 PD 状态参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointPdParams {
    /// 目标关节位置（rad）
    pub target: JointArray<f32>,
    /// 位置增益
    pub kp: f32,
    /// 速度增益
    pub kd: f32,
    /// 从进入姿态插值到目标所用的控制周期数
    pub move_ticks: u32,
}

impl Default for JointPdParams {
    fn default() -> Self {
        Self {
            target: JointArray::splat(0.0),
            kp: 40.0,
            kd: 1.0,
            move_ticks: 1000,
        }
    }
}

/// 平衡站立状态参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandParams {
    /// 站立姿态（rad）
    pub pose: JointArray<f32>,
    /// 位置增益
    pub kp: f32,
    /// 速度增益
    pub kd: f32,
    /// 每关节重力补偿前馈力矩（N·m）
    pub tau_ff: JointArray<f32>,
    /// 从进入姿态收敛到站立姿态所用的控制周期数
    pub settle_ticks: u32,
}

impl Default for StandParams {
    fn default() -> Self {
        Self {
            pose: JointArray::new([
                0.0, 0.0, 0.3, -0.6, 0.3, 0.0, 0.0, 0.0, 0.3, -0.6, 0.3, 0.0,
            ]),
            kp: 80.0,
            kd: 2.0,
            tau_ff: JointArray::splat(0.0),
            settle_ticks: 500,
        }
    }
}

/// 状态切换参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionParams {
    /// 刚度渐变（主动控制 → 关节锁定）的控制周期数
    pub ramp_ticks: u32,
}

impl Default for TransitionParams {
    fn default() -> Self {
        Self { ramp_ticks: 250 }
    }
}

impl ControlParameters {
    /// 按关节分组取安全阻尼系数
    #[inline]
    pub fn damper_kd(&self, joint: LegJoint) -> f32 {
        self.safety_damper_kd[joint.group().index()]
    }

    /// 某一分组的安全阻尼系数
    #[inline]
    pub fn damper_kd_for_group(&self, group: JointGroup) -> f32 {
        self.safety_damper_kd[group.index()]
    }

    /// 控制周期（秒）
    pub fn control_period_s(&self) -> f32 {
        1.0 / self.control_rate_hz
    }

    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let params: ControlParameters = toml::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    /// 序列化为 TOML 字符串
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 校验参数
    ///
    /// 增益与阻尼必须为非负有限值，姿态必须为有限值，频率必须为正。
    /// 安全阻尼系数不得超过 `limits.max_kd`，目标姿态与站立姿态必须在关节范围内：
    /// 否则安全检查会逐周期改写这些值。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.control_rate_hz.is_finite() || self.control_rate_hz <= 0.0 {
            return Err(ConfigError::invalid(
                "control_rate_hz",
                format!("must be positive, got {}", self.control_rate_hz),
            ));
        }

        for (i, kd) in self.safety_damper_kd.iter().enumerate() {
            check_gain(&format!("safety_damper_kd[{i}]"), *kd)?;
        }

        check_gain("joint_pd.kp", self.joint_pd.kp)?;
        check_gain("joint_pd.kd", self.joint_pd.kd)?;
        check_gain("stand.kp", self.stand.kp)?;
        check_gain("stand.kd", self.stand.kd)?;

        check_finite("joint_pd.target", &self.joint_pd.target)?;
        check_finite("stand.pose", &self.stand.pose)?;
        check_finite("stand.tau_ff", &self.stand.tau_ff)?;

        self.limits.validate()?;

        for (i, kd) in self.safety_damper_kd.iter().enumerate() {
            if *kd > self.limits.max_kd {
                return Err(ConfigError::invalid(
                    format!("safety_damper_kd[{i}]"),
                    format!("{kd} exceeds limits.max_kd {}", self.limits.max_kd),
                ));
            }
        }

        self.limits.check_pose("joint_pd.target", &self.joint_pd.target)?;
        self.limits.check_pose("stand.pose", &self.stand.pose)
    }
}

fn check_gain(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be finite and non-negative, got {value}"),
        ))
    }
}

fn check_finite(field: &str, values: &JointArray<f32>) -> Result<(), ConfigError> {
    match values.iter_joints().find(|(_, v)| !v.is_finite()) {
        Some((joint, v)) => Err(ConfigError::invalid(
            format!("{field}[{joint}]"),
            format!("must be finite, got {v}"),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        let params = ControlParameters::default();
        assert!(params.validate().is_ok());
        assert!((params.control_period_s() - 0.002).abs() < 1e-9);
    }

    #[test]
    fn test_damper_kd_by_group() {
        let params = ControlParameters {
            safety_damper_kd: [5.0, 3.0, 1.0],
            ..Default::default()
        };
        assert_eq!(params.damper_kd(LegJoint::LeftHipRoll), 5.0);
        assert_eq!(params.damper_kd(LegJoint::RightHipPitch), 5.0);
        assert_eq!(params.damper_kd(LegJoint::LeftKnee), 3.0);
        assert_eq!(params.damper_kd(LegJoint::RightAnkleRoll), 1.0);
        assert_eq!(params.damper_kd_for_group(JointGroup::Ankle), 1.0);
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let params = ControlParameters::from_toml_str("").unwrap();
        assert_eq!(params, ControlParameters::default());
    }

    #[test]
    fn test_partial_section_override() {
        let params = ControlParameters::from_toml_str(
            r#"
            [joint_pd]
            kp = 25.0
            "#,
        )
        .unwrap();
        assert_eq!(params.joint_pd.kp, 25.0);
        assert_eq!(params.joint_pd.kd, JointPdParams::default().kd);
        assert_eq!(params.joint_pd.move_ticks, 1000);
    }

    #[test]
    fn test_negative_damper_rejected() {
        let err = ControlParameters::from_toml_str("safety_damper_kd = [5.0, -1.0, 1.0]")
            .unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "safety_damper_kd[1]"),
            other => panic!("Expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_damper_above_kd_limit_rejected() {
        let err = ControlParameters::from_toml_str(
            r#"
            safety_damper_kd = [12.0, 3.0, 1.0]

            [limits]
            max_kd = 10.0
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Invalid { field, reason } => {
                assert_eq!(field, "safety_damper_kd[0]");
                assert!(reason.contains("max_kd"), "{reason}");
            },
            other => panic!("Expected Invalid, got {other:?}"),
        }

        // 恰好等于上限是允许的
        let params = ControlParameters {
            safety_damper_kd: [10.0, 3.0, 1.0],
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_pose_outside_joint_range_rejected() {
        let mut params = ControlParameters::default();
        params.stand.pose[LegJoint::LeftKnee] = 0.4;
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("stand.pose[l_knee]"), "{err}");

        let mut params = ControlParameters::default();
        params.joint_pd.target[LegJoint::RightAnkleRoll] = -1.0;
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("joint_pd.target[r_ankle_roll]"), "{err}");
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(ControlParameters::from_toml_str("control_rate_hz = 0.0").is_err());
    }

    #[test]
    fn test_wrong_pose_length_rejected() {
        let err = ControlParameters::from_toml_str(
            r#"
            [stand]
            pose = [0.0, 0.0, 0.3]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
