//! 控制状态（Control State）
//!
//! 每个状态实现一种控制律，并参与交接协议。
//!
//! # 回调契约
//!
//! | 回调 | 调用时机 | 职责 |
//! |---|---|---|
//! | `on_enter` | 成为活动状态时一次 | 清零交接描述、重置计数器、快照测量值 |
//! | `run` | 活动期间每周期一次 | 写入所控制关节的全部期望字段 |
//! | `check_transition` | 每周期 `run` 之后 | 按本状态的模式表给出下一个状态 |
//! | `transition` | 交接期间每周期一次 | 执行交接策略，返回交接描述 |
//! | `on_exit` | 交接完成后一次 | 清理 |
//!
//! `check_transition` 只拿到 `&self`：它不能推进任何计数器，
//! 同一周期内重复调用结果一致。
//!
//! # 模式表
//!
//! 每个状态用一个对 `ControlMode` 穷尽匹配的函数描述可达状态，
//! 新增模式时编译器会要求每个状态显式处理。不可达的请求一律原地保持并报告。

mod balance_stand;
mod blend;
mod joint_pd;
mod lock_joint;
mod passive;

pub use balance_stand::BalanceStandState;
pub use joint_pd::JointPdState;
pub use lock_joint::{LOCK_JOINT_POSE, LockJointState};
pub use passive::PassiveState;

use crate::context::ControlFsmData;
use crate::transition::TransitionData;
use biped_types::{ControlMode, StateName};

/// 控制状态 Trait
///
/// 调度器只通过这个接口驱动状态，从不关心具体是哪一种控制律。
/// 所有方法都在实时周期内执行：不得分配内存、阻塞或做 I/O。
pub trait FsmState {
    /// 稳定标识
    fn name(&self) -> StateName;

    /// 成为活动状态
    fn on_enter(&mut self, data: &mut ControlFsmData);

    /// 执行一个控制周期
    fn run(&mut self, data: &mut ControlFsmData);

    /// 根据请求模式给出下一个状态（返回自身标识表示保持）
    fn check_transition(&self, data: &ControlFsmData) -> StateName;

    /// 执行一步交接
    fn transition(&mut self, next: StateName, data: &mut ControlFsmData) -> TransitionData;

    /// 停止活动
    fn on_exit(&mut self, data: &mut ControlFsmData);
}

/// 按模式表解析本周期的请求
///
/// 请求值不是已知模式，或模式表给出 `None` 时，报告一次无效请求并保持当前状态。
pub(crate) fn resolve_request(
    current: StateName,
    data: &ControlFsmData,
    table: fn(ControlMode) -> Option<StateName>,
) -> StateName {
    match ControlMode::from_raw(data.requested_mode()).and_then(table) {
        Some(next) => next,
        None => {
            data.report_invalid_transition(current);
            current
        },
    }
}
