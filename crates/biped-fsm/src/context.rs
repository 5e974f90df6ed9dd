//! 共享控制上下文
//!
//! 控制循环生命周期内所有状态都能访问的数据：关节帧、参数快照、
//! 本周期锁存的请求模式、全局安全检查开关，以及诊断事件分发器。
//!
//! # 单写者约定
//!
//! 上下文只在控制线程内被修改。外部输入（请求模式、参数）在周期开始时
//! 一次性锁存进来，同一周期内所有回调看到的是同一份值。
//!
//! 状态对象不保存上下文引用，每个回调都以 `&mut ControlFsmData` 传入。

use crate::events::{EventHub, FsmEvent};
use biped_tools::ControlParameters;
use biped_types::{LegControlData, StateName};
use std::sync::Arc;

/// 共享控制上下文
#[derive(Debug)]
pub struct ControlFsmData {
    /// 关节帧（测量字段由状态估计方写入，期望字段由活动状态写入）
    pub leg: LegControlData,

    params: Arc<ControlParameters>,
    requested_mode: u32,
    safety_checks_enabled: bool,
    tick: u64,
    events: EventHub,
}

impl ControlFsmData {
    /// 创建上下文（安全检查默认开启）
    pub fn new(params: Arc<ControlParameters>, requested_mode: u32) -> Self {
        Self {
            leg: LegControlData::new(),
            params,
            requested_mode,
            safety_checks_enabled: true,
            tick: 0,
            events: EventHub::new(),
        }
    }

    /// 当前参数快照
    #[inline]
    pub fn params(&self) -> &ControlParameters {
        &self.params
    }

    pub(crate) fn params_arc(&self) -> &Arc<ControlParameters> {
        &self.params
    }

    /// 同时获取关节帧（可变）与参数（只读）
    #[inline]
    pub fn leg_and_params(&mut self) -> (&mut LegControlData, &ControlParameters) {
        (&mut self.leg, &self.params)
    }

    /// 本周期锁存的请求模式（原始值）
    #[inline]
    pub fn requested_mode(&self) -> u32 {
        self.requested_mode
    }

    /// 全局安全检查是否开启
    #[inline]
    pub fn safety_checks_enabled(&self) -> bool {
        self.safety_checks_enabled
    }

    /// 当前控制周期序号
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// 开启所有安全检查
    pub fn turn_on_all_safety_checks(&mut self) {
        self.set_safety_checks(true);
    }

    /// 关闭所有安全检查（增益 / 速度钳位）
    pub fn turn_off_all_safety_checks(&mut self) {
        self.set_safety_checks(false);
    }

    fn set_safety_checks(&mut self, enabled: bool) {
        if self.safety_checks_enabled != enabled {
            self.safety_checks_enabled = enabled;
            self.emit(FsmEvent::SafetyChecks { enabled });
        }
    }

    /// 投递诊断事件
    #[inline]
    pub fn emit(&self, event: FsmEvent) {
        self.events.emit(self.tick, &event);
    }

    /// 报告无效的模式请求（非致命）
    #[inline]
    pub fn report_invalid_transition(&self, from: StateName) {
        self.emit(FsmEvent::InvalidTransition {
            from,
            requested: self.requested_mode,
        });
    }

    /// 事件分发器（循环启动前注册 sink）
    pub fn events_mut(&mut self) -> &mut EventHub {
        &mut self.events
    }

    pub(crate) fn latch_inputs(&mut self, params: Option<Arc<ControlParameters>>, requested: u32) {
        if let Some(params) = params {
            self.params = params;
        }
        self.requested_mode = requested;
    }

    pub(crate) fn set_requested_mode(&mut self, requested: u32) {
        self.requested_mode = requested;
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use biped_types::ControlMode;

    #[test]
    fn test_safety_toggle_emits_only_on_change() {
        let (mut data, rx) = context_with_events(ControlMode::LockJoint);
        assert!(data.safety_checks_enabled());

        data.turn_on_all_safety_checks();
        assert!(drain(&rx).is_empty());

        data.turn_off_all_safety_checks();
        data.turn_off_all_safety_checks();
        assert!(!data.safety_checks_enabled());
        assert_eq!(drain(&rx), vec![FsmEvent::SafetyChecks { enabled: false }]);
    }

    #[test]
    fn test_report_invalid_carries_latched_request() {
        let (mut data, rx) = context_with_events(ControlMode::LockJoint);
        data.set_requested_mode(12345);
        data.report_invalid_transition(StateName::LockJoint);
        assert_eq!(
            drain(&rx),
            vec![FsmEvent::InvalidTransition {
                from: StateName::LockJoint,
                requested: 12345
            }]
        );
    }

    #[test]
    fn test_latch_inputs_swaps_params() {
        let (mut data, _rx) = context_with_events(ControlMode::Passive);
        let mut params = ControlParameters::default();
        params.safety_damper_kd = [1.0, 1.0, 1.0];

        data.latch_inputs(Some(Arc::new(params)), ControlMode::JointPd.as_raw());
        assert_eq!(data.params().safety_damper_kd, [1.0, 1.0, 1.0]);
        assert_eq!(data.requested_mode(), 51);

        data.latch_inputs(None, 0);
        assert_eq!(data.params().safety_damper_kd, [1.0, 1.0, 1.0]);
    }
}
