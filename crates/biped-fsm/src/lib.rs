//! # Biped FSM
//!
//! 双足机器人关节级控制的有限状态机核心：每个控制周期决定由哪一个控制律驱动执行器，
//! 控制律之间如何安全交接，以及写入执行器接口的每关节增益/期望值。
//!
//! # 架构
//!
//! ```text
//! 操作员 ──ModeRequest──┐          配置方 ──ParameterStore──┐
//!                       ▼                                   ▼
//!                 ┌──────────────── ControlFsm ────────────────┐
//!                 │  ControlFsmData（关节帧、参数快照、安全开关）  │
//!                 │  Passive / JointPd / BalanceStand / LockJoint │
//!                 └──────────────────────┬──────────────────────┘
//!                                        ▼
//!                         执行器 I/O（JointIo）  诊断事件（EventHub）
//! ```
//!
//! # 每周期时序
//!
//! 1. 锁存输入（参数快照、请求模式）
//! 2. `run()` → `check_transition()` → （需要时）`transition()`
//! 3. 交接完成时 `on_exit()` → `on_enter()`
//! 4. 安全后检查（增益/速度/力矩/位置钳位）
//!
//! # 实时约束
//!
//! 周期内的所有回调都不分配内存、不阻塞、不做 I/O；诊断事件通过 `try_send` 投递。

pub mod context;
mod error;
pub mod events;
pub mod fsm;
pub mod loop_runner;
pub mod mode_request;
pub mod params_store;
pub mod recording;
pub mod safety;
pub mod state;
pub mod transition;

pub use context::ControlFsmData;
pub use error::{FsmError, JointIoError};
pub use events::{EventHub, EventSink, FsmEvent, TracingEventSink};
pub use fsm::{ControlFsm, FsmOperatingMode, FsmStates, TickReport};
pub use loop_runner::{JointIo, LoopConfig, LoopStats, run_control_loop};
pub use mode_request::ModeRequest;
pub use params_store::ParameterStore;
pub use recording::{ChannelEventSink, TimedEvent};
pub use state::{
    BalanceStandState, FsmState, JointPdState, LOCK_JOINT_POSE, LockJointState, PassiveState,
};
pub use transition::TransitionData;

// 基础类型与配置类型一并导出，调用方无需单独依赖
pub use biped_tools::{ConfigError, ControlParameters, SafetyLimits};
pub use biped_types::{
    ControlMode, JOINT_COUNT, JointArray, JointFrame, JointGroup, LegControlData, LegJoint,
    StateName,
};
