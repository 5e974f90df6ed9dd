//! 控制模式与状态标识
//!
//! `ControlMode` 是外部（操作员控制台、网络命令、安全监督器）请求的原始值，
//! 以 `u32` 形式传入，上游不做任何校验；`StateName` 是已注册控制状态的稳定标识。

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// 控制模式请求
///
/// 未在此列出的整数值在转换时失败，由各状态按"无效请求"处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum ControlMode {
    /// 被动模式（断电急停，无主动力矩）
    Passive = 0,
    /// 起立
    StandUp = 1,
    /// 平衡站立
    BalanceStand = 3,
    /// 行走
    Locomotion = 4,
    /// 摔倒恢复
    RecoveryStand = 6,
    /// 关节 PD
    JointPd = 51,
    /// 阻抗控制
    ImpedanceControl = 52,
    /// 关节锁定（纯阻尼安全模式）
    LockJoint = 53,
}

impl ControlMode {
    /// 所有已知模式
    pub const ALL: [ControlMode; 8] = [
        ControlMode::Passive,
        ControlMode::StandUp,
        ControlMode::BalanceStand,
        ControlMode::Locomotion,
        ControlMode::RecoveryStand,
        ControlMode::JointPd,
        ControlMode::ImpedanceControl,
        ControlMode::LockJoint,
    ];

    /// 从原始值转换（无效值返回 None）
    #[inline]
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::try_from(raw).ok()
    }

    /// 转换为原始值
    #[inline]
    pub fn as_raw(self) -> u32 {
        self.into()
    }

    /// 模式名称（与命令行参数一致）
    pub const fn name(self) -> &'static str {
        match self {
            ControlMode::Passive => "passive",
            ControlMode::StandUp => "stand_up",
            ControlMode::BalanceStand => "balance_stand",
            ControlMode::Locomotion => "locomotion",
            ControlMode::RecoveryStand => "recovery_stand",
            ControlMode::JointPd => "joint_pd",
            ControlMode::ImpedanceControl => "impedance_control",
            ControlMode::LockJoint => "lock_joint",
        }
    }

    /// 按名称查找（忽略大小写，`-` 等同于 `_`）
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|mode| mode.name() == normalized)
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 已注册控制状态的标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateName {
    Passive,
    JointPd,
    BalanceStand,
    LockJoint,
}

impl StateName {
    /// 所有已注册状态
    pub const ALL: [StateName; 4] = [
        StateName::Passive,
        StateName::JointPd,
        StateName::BalanceStand,
        StateName::LockJoint,
    ];

    /// 状态对应的控制模式（请求该模式即停留在此状态）
    pub const fn mode(self) -> ControlMode {
        match self {
            StateName::Passive => ControlMode::Passive,
            StateName::JointPd => ControlMode::JointPd,
            StateName::BalanceStand => ControlMode::BalanceStand,
            StateName::LockJoint => ControlMode::LockJoint,
        }
    }

    /// 状态名称（日志与诊断使用）
    pub const fn as_str(self) -> &'static str {
        match self {
            StateName::Passive => "PASSIVE",
            StateName::JointPd => "JOINT_PD",
            StateName::BalanceStand => "BALANCE_STAND",
            StateName::LockJoint => "LOCK_JOINT",
        }
    }

    /// 按名称查找（接受状态名或模式名）
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == upper)
            .or_else(|| {
                let mode = ControlMode::from_name(name)?;
                Self::ALL.into_iter().find(|state| state.mode() == mode)
            })
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
