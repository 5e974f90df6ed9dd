//! 操作员模式请求
//!
//! 外部命令源（控制台、网络命令、安全监督器）写入请求的控制模式，
//! 控制核心在每个周期开始时读取一次。
//!
//! # 单写者约定
//!
//! - 写入方：操作员线程，任意时刻
//! - 读取方：`ControlFsm::tick()`，每周期一次，锁存到 `ControlFsmData`
//!
//! 写入的值不做任何校验，任意整数都可能出现。
//!
//! # 示例
//!
//! ```rust
//! use biped_fsm::ModeRequest;
//! use biped_types::ControlMode;
//!
//! let request = ModeRequest::new(ControlMode::Passive);
//! let operator = request.clone();
//!
//! operator.request(ControlMode::LockJoint);
//! assert_eq!(request.current(), ControlMode::LockJoint.as_raw());
//!
//! operator.request_raw(999);
//! assert_eq!(request.current_mode(), None);
//! ```

use biped_types::ControlMode;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// 模式请求句柄（克隆后共享同一个原子值）
#[derive(Debug, Clone)]
pub struct ModeRequest {
    inner: Arc<AtomicU32>,
}

impl ModeRequest {
    /// 以初始模式创建
    pub fn new(initial: ControlMode) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(initial.as_raw())),
        }
    }

    /// 请求一个已知模式
    pub fn request(&self, mode: ControlMode) {
        self.request_raw(mode.as_raw());
    }

    /// 请求原始模式值（不校验）
    pub fn request_raw(&self, raw: u32) {
        self.inner.store(raw, Ordering::Release);
    }

    /// 当前请求的原始值
    pub fn current(&self) -> u32 {
        self.inner.load(Ordering::Acquire)
    }

    /// 当前请求（无效值返回 None）
    pub fn current_mode(&self) -> Option<ControlMode> {
        ControlMode::from_raw(self.current())
    }
}

impl Default for ModeRequest {
    fn default() -> Self {
        Self::new(ControlMode::Passive)
    }
}
