//! 控制状态机调度器（Control FSM）
//!
//! 持有全部控制状态，每个控制周期驱动活动状态，并按 `transition()` 返回的交接描述
//! 决定何时切换。
//!
//! # 运行模式
//!
//! ```text
//!            initialize()
//!   Idle ─────────────────▶ Normal(S) ──check_transition() != S──▶ Transitioning(S→T)
//!                               ▲                                        │
//!                               └──────── done: on_exit / on_enter ──────┘
//! ```
//!
//! 立即完成的交接在同一周期内完成切换；多周期交接每周期调用一次 `transition()`。
//!
//! # 示例
//!
//! ```rust
//! use biped_fsm::{ControlFsm, ControlMode, ModeRequest, ParameterStore, StateName};
//!
//! let request = ModeRequest::new(ControlMode::LockJoint);
//! let mut fsm = ControlFsm::new(ParameterStore::default(), request.clone(), StateName::LockJoint);
//!
//! let report = fsm.tick();
//! assert_eq!(report.active, StateName::LockJoint);
//!
//! request.request(ControlMode::Passive);
//! let report = fsm.tick();
//! assert_eq!(report.active, StateName::Passive);
//! assert!(!fsm.data().safety_checks_enabled());
//! ```

use crate::context::ControlFsmData;
use crate::events::FsmEvent;
use crate::mode_request::ModeRequest;
use crate::params_store::ParameterStore;
use crate::safety;
use crate::state::{BalanceStandState, FsmState, JointPdState, LockJointState, PassiveState};
use biped_types::{ControlMode, StateName};
use tracing::{debug, info, trace};

// ==================== 状态注册表 ====================

/// 全部控制状态
///
/// 启动时构造一次，之后只在不同状态之间切换活动标识，从不销毁或重建。
#[derive(Debug, Default)]
pub struct FsmStates {
    passive: PassiveState,
    joint_pd: JointPdState,
    balance_stand: BalanceStandState,
    lock_joint: LockJointState,
}

impl FsmStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passive(&self) -> &PassiveState {
        &self.passive
    }

    pub fn joint_pd(&self) -> &JointPdState {
        &self.joint_pd
    }

    pub fn balance_stand(&self) -> &BalanceStandState {
        &self.balance_stand
    }

    pub fn lock_joint(&self) -> &LockJointState {
        &self.lock_joint
    }

    /// 按标识取状态
    pub fn get(&self, name: StateName) -> &dyn FsmState {
        match name {
            StateName::Passive => &self.passive,
            StateName::JointPd => &self.joint_pd,
            StateName::BalanceStand => &self.balance_stand,
            StateName::LockJoint => &self.lock_joint,
        }
    }

    /// 按标识取状态（可变）
    pub fn get_mut(&mut self, name: StateName) -> &mut dyn FsmState {
        match name {
            StateName::Passive => &mut self.passive,
            StateName::JointPd => &mut self.joint_pd,
            StateName::BalanceStand => &mut self.balance_stand,
            StateName::LockJoint => &mut self.lock_joint,
        }
    }
}

// ==================== 调度器 ====================

/// 调度器运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmOperatingMode {
    /// 尚未激活启动状态
    Idle,
    /// 某个状态处于活动
    Normal(StateName),
    /// 交接进行中（`from` 仍是活动状态）
    Transitioning { from: StateName, to: StateName },
}

/// 单个控制周期的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// 周期结束时的活动状态
    pub active: StateName,
    /// 周期结束时的运行模式
    pub operating_mode: FsmOperatingMode,
    /// 安全后检查修改的字段数
    pub clamped_fields: u32,
}

/// 控制状态机
pub struct ControlFsm {
    states: FsmStates,
    data: ControlFsmData,
    params: ParameterStore,
    mode_request: ModeRequest,
    startup: StateName,
    active: StateName,
    operating_mode: FsmOperatingMode,
}

impl ControlFsm {
    /// 创建调度器（处于 Idle，首次 `tick()` 前激活 `startup`）
    pub fn new(params: ParameterStore, mode_request: ModeRequest, startup: StateName) -> Self {
        let data = ControlFsmData::new(params.snapshot(), mode_request.current());
        Self {
            states: FsmStates::new(),
            data,
            params,
            mode_request,
            startup,
            active: startup,
            operating_mode: FsmOperatingMode::Idle,
        }
    }

    /// 激活启动状态（重复调用无效果）
    pub fn initialize(&mut self) {
        if self.operating_mode != FsmOperatingMode::Idle {
            return;
        }

        if self.startup == StateName::Passive {
            self.data.turn_off_all_safety_checks();
        }

        self.states.get_mut(self.startup).on_enter(&mut self.data);
        self.data.emit(FsmEvent::StateEntered {
            state: self.startup,
        });
        self.active = self.startup;
        self.operating_mode = FsmOperatingMode::Normal(self.startup);
        info!("Control FSM initialized in {}", self.startup);
    }

    /// 执行一个控制周期
    ///
    /// 调用方应在此之前写入测量值，之后读取期望值。
    pub fn tick(&mut self) -> TickReport {
        self.initialize();
        self.latch_inputs();

        match self.operating_mode {
            FsmOperatingMode::Normal(current) => {
                self.states.get_mut(current).run(&mut self.data);

                let next = self.states.get(current).check_transition(&self.data);
                if next != current {
                    self.data.emit(FsmEvent::TransitionStarted {
                        from: current,
                        to: next,
                    });
                    debug!("Transition {} -> {} requested", current, next);
                    self.step_transition(current, next);
                }
            },
            FsmOperatingMode::Transitioning { from, to } => {
                let to = self.preempt_for_passive(from, to);
                self.step_transition(from, to);
            },
            // initialize() 已经离开 Idle
            FsmOperatingMode::Idle => {},
        }

        let checks_enabled = self.data.safety_checks_enabled();
        let (leg, params) = self.data.leg_and_params();
        let clamped_fields = safety::enforce(leg, &params.limits, checks_enabled);
        if clamped_fields > 0 {
            self.data.emit(FsmEvent::SafetyClamp {
                count: clamped_fields,
            });
        }

        trace!(tick = self.data.tick(), active = %self.active, "tick");
        self.data.advance_tick();

        TickReport {
            active: self.active,
            operating_mode: self.operating_mode,
            clamped_fields,
        }
    }

    /// 当前运行模式
    pub fn operating_mode(&self) -> FsmOperatingMode {
        self.operating_mode
    }

    /// 当前活动状态
    pub fn active_state(&self) -> StateName {
        self.active
    }

    /// 共享上下文
    pub fn data(&self) -> &ControlFsmData {
        &self.data
    }

    /// 共享上下文（可变，用于在周期之间写入测量值、注册事件 sink）
    pub fn data_mut(&mut self) -> &mut ControlFsmData {
        &mut self.data
    }

    /// 状态注册表
    pub fn states(&self) -> &FsmStates {
        &self.states
    }

    /// 请求模式句柄
    pub fn mode_request(&self) -> &ModeRequest {
        &self.mode_request
    }

    /// 参数存储句柄
    pub fn parameter_store(&self) -> &ParameterStore {
        &self.params
    }

    fn latch_inputs(&mut self) {
        let fresh = if self.params.is_current(self.data.params_arc()) {
            None
        } else {
            debug!("Latching new control parameters");
            Some(self.params.snapshot())
        };
        self.data.latch_inputs(fresh, self.mode_request.current());
    }

    /// 急停抢占：交接中收到 PASSIVE 请求时，改为交接到 Passive
    fn preempt_for_passive(&mut self, from: StateName, to: StateName) -> StateName {
        let estop = ControlMode::from_raw(self.data.requested_mode()) == Some(ControlMode::Passive);
        if estop && to != StateName::Passive && from != StateName::Passive {
            self.data.emit(FsmEvent::TransitionStarted {
                from,
                to: StateName::Passive,
            });
            info!("E-stop: retargeting {} -> {} handover to PASSIVE", from, to);
            StateName::Passive
        } else {
            to
        }
    }

    fn step_transition(&mut self, from: StateName, to: StateName) {
        let transition_data = self.states.get_mut(from).transition(to, &mut self.data);
        if !transition_data.done {
            self.operating_mode = FsmOperatingMode::Transitioning { from, to };
            return;
        }

        self.states.get_mut(from).on_exit(&mut self.data);
        self.data.emit(FsmEvent::StateExited { state: from });

        self.states.get_mut(to).on_enter(&mut self.data);
        self.data.emit(FsmEvent::StateEntered { state: to });
        self.data.emit(FsmEvent::TransitionCompleted {
            from,
            to,
            ticks: transition_data.elapsed_ticks,
        });

        self.active = to;
        self.operating_mode = FsmOperatingMode::Normal(to);
    }
}

impl std::fmt::Debug for ControlFsm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlFsm")
            .field("active", &self.active)
            .field("operating_mode", &self.operating_mode)
            .field("tick", &self.data.tick())
            .finish_non_exhaustive()
    }
}
