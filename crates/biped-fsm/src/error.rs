//! 控制核心错误类型定义
//!
//! 控制周期本身（`ControlFsm::tick`）不返回错误：核心内部的异常都在本地处理，
//! 绝不停止控制循环。这里的错误只出现在循环外围（配置、执行器 I/O）。

use biped_tools::ConfigError;
use thiserror::Error;

/// 执行器 / 状态估计协作方的错误
#[derive(Error, Debug)]
pub enum JointIoError {
    /// 设备断开
    #[error("Joint I/O disconnected: {0}")]
    Disconnected(String),

    /// 读写超时
    #[error("Joint I/O timeout after {timeout_us}us")]
    Timeout { timeout_us: u64 },

    /// 设备报错
    #[error("Joint device error: {0}")]
    Device(String),
}

/// 控制核心错误类型
#[derive(Error, Debug)]
pub enum FsmError {
    /// 参数加载或校验失败
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 执行器 I/O 连续失败超过阈值
    #[error("Consecutive joint I/O failures: {count}, last error: {last_error}")]
    Io {
        count: u32,
        #[source]
        last_error: JointIoError,
    },

    /// 循环配置非法
    #[error("Invalid loop config: {0}")]
    InvalidLoopConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fsm_error_display() {
        let err = FsmError::Io {
            count: 6,
            last_error: JointIoError::Timeout { timeout_us: 500 },
        };
        let msg = err.to_string();
        assert!(msg.contains("6") && msg.contains("500us"), "{msg}");

        let err = FsmError::InvalidLoopConfig("frequency must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid loop config: frequency must be positive");
    }

    #[test]
    fn test_from_config_error() {
        let config_err = ConfigError::Invalid {
            field: "stand.kp".to_string(),
            reason: "must be non-negative".to_string(),
        };
        let err: FsmError = config_err.into();
        assert!(matches!(err, FsmError::Config(ConfigError::Invalid { .. })));
    }
}
