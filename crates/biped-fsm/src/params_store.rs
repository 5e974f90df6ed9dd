//! 参数存储
//!
//! 配置方随时发布新的参数快照，控制核心在周期边界读取。
//! 使用 `ArcSwap` 实现无锁读取：读取端不会被写入端阻塞。

use crate::state::LOCK_JOINT_POSE;
use arc_swap::ArcSwap;
use biped_tools::{ConfigError, ControlParameters};
use biped_types::JointArray;
use std::sync::Arc;
use tracing::info;

/// 参数存储（克隆后共享）
#[derive(Debug, Clone)]
pub struct ParameterStore {
    inner: Arc<ArcSwap<ControlParameters>>,
}

impl ParameterStore {
    /// 校验后创建
    pub fn new(params: ControlParameters) -> Result<Self, ConfigError> {
        validate(&params)?;
        Ok(Self {
            inner: Arc::new(ArcSwap::from_pointee(params)),
        })
    }

    /// 发布新参数（校验失败时保留旧参数）
    pub fn publish(&self, params: ControlParameters) -> Result<(), ConfigError> {
        validate(&params)?;
        self.inner.store(Arc::new(params));
        info!("Control parameters published");
        Ok(())
    }

    /// 获取当前快照
    pub fn snapshot(&self) -> Arc<ControlParameters> {
        self.inner.load_full()
    }

    /// 当前快照是否就是 `current`（指针比较，不增加引用计数）
    pub(crate) fn is_current(&self, current: &Arc<ControlParameters>) -> bool {
        Arc::ptr_eq(&self.inner.load(), current)
    }
}

/// 参数自身校验，外加关节锁定参考姿态必须在关节范围内
fn validate(params: &ControlParameters) -> Result<(), ConfigError> {
    params.validate()?;
    params
        .limits
        .check_pose("lock_joint.pose", &JointArray::new(LOCK_JOINT_POSE))
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(ControlParameters::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_replaces_snapshot() {
        let store = ParameterStore::default();
        let before = store.snapshot();
        assert!(store.is_current(&before));

        let mut params = ControlParameters::default();
        params.safety_damper_kd = [7.0, 2.0, 0.5];
        store.publish(params).unwrap();

        assert!(!store.is_current(&before));
        assert_eq!(store.snapshot().safety_damper_kd, [7.0, 2.0, 0.5]);
    }

    #[test]
    fn test_invalid_publish_keeps_old_snapshot() {
        let store = ParameterStore::default();
        let before = store.snapshot();

        let mut params = ControlParameters::default();
        params.stand.kd = -1.0;
        assert!(store.publish(params).is_err());
        assert!(store.is_current(&before));
    }

    #[test]
    fn test_limits_must_contain_lock_pose() {
        let mut params = ControlParameters::default();
        // 参考姿态的膝关节为 -0.48
        params.limits.q_min[biped_types::LegJoint::LeftKnee] = -0.3;

        let err = ParameterStore::new(params.clone()).unwrap_err();
        assert!(err.to_string().contains("lock_joint.pose[l_knee]"), "{err}");

        let store = ParameterStore::default();
        assert!(store.publish(params).is_err());
    }

    #[test]
    fn test_new_rejects_invalid() {
        let params = ControlParameters {
            control_rate_hz: -5.0,
            ..Default::default()
        };
        assert!(ParameterStore::new(params).is_err());
    }
}
