//! # Biped Tools - 控制参数与安全配置
//!
//! **依赖原则**: 只依赖 `biped-types`，不依赖控制核心 `biped-fsm`
//!
//! ## 包含模块
//!
//! - `params` - 控制参数（阻尼表、PD 增益、站立姿态、过渡时长），TOML 读写
//! - `safety` - 安全限制（增益、速度、前馈力矩、关节位置范围）
//! - `error` - 配置错误类型
//!
//! ## 配置文件示例
//!
//! ```toml
//! control_rate_hz = 500.0
//! safety_damper_kd = [5.0, 3.0, 1.0]
//!
//! [transition]
//! ramp_ticks = 250
//! ```

pub mod error;
pub mod params;
pub mod safety;

// 重新导出常用类型
pub use error::ConfigError;
pub use params::{ControlParameters, JointPdParams, StandParams, TransitionParams};
pub use safety::SafetyLimits;
