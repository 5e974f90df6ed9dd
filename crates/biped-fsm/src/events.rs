//! 诊断事件（Diagnostic Events）
//!
//! 控制核心向外部日志 / 遥测协作方投递的事件，以及投递所用的钩子系统。
//!
//! # 设计原则
//!
//! - **非阻塞**: 所有 `EventSink` 实现必须在 <1μs 内返回，禁止 I/O 与锁等待
//! - **不丢语义**: 事件本身每次都投递，限流只发生在具体的 sink 内部
//! - **类型安全**: 使用 `dyn EventSink` trait object，支持多种 sink 并存
//!
//! # 使用示例
//!
//! ```rust
//! use biped_fsm::events::{EventHub, EventSink, FsmEvent};
//! use biped_fsm::recording::ChannelEventSink;
//! use biped_types::StateName;
//! use std::sync::Arc;
//!
//! let mut hub = EventHub::new();
//! let (sink, rx) = ChannelEventSink::new(64);
//! hub.add_sink(Arc::new(sink));
//!
//! hub.emit(7, &FsmEvent::StateEntered { state: StateName::Passive });
//! assert_eq!(rx.try_recv().unwrap().tick, 7);
//! ```

use biped_types::StateName;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// 诊断事件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FsmEvent {
    /// 状态已激活（`on_enter` 完成）
    StateEntered { state: StateName },

    /// 状态已停用（`on_exit` 完成）
    StateExited { state: StateName },

    /// 开始交接
    TransitionStarted { from: StateName, to: StateName },

    /// 交接完成
    TransitionCompleted {
        from: StateName,
        to: StateName,
        /// 交接经历的周期数（立即完成为 0）
        ticks: u32,
    },

    /// 无效的模式请求：当前状态不支持，或请求值不是已知模式
    InvalidTransition {
        from: StateName,
        /// 请求的原始模式值
        requested: u32,
    },

    /// 安全检查总开关变化
    SafetyChecks { enabled: bool },

    /// 安全后检查钳位了若干字段
    SafetyClamp { count: u32 },
}

impl FsmEvent {
    /// 是否为无效请求事件
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, FsmEvent::InvalidTransition { .. })
    }
}

/// 事件回调 Trait
///
/// # 性能要求
///
/// - **非阻塞**: 实现必须在 <1μs 内完成
/// - **无锁**: 禁止使用 Mutex、I/O、分配等阻塞操作
/// - **Channel 模式**: 推荐使用 `crossbeam_channel::Sender::try_send` 转交给后台线程
pub trait EventSink: Send + Sync {
    /// 控制周期内产生事件时调用
    ///
    /// - `tick`: 产生事件的控制周期序号
    /// - `event`: 事件内容
    fn on_event(&self, tick: u64, event: &FsmEvent);
}

/// 事件分发器
///
/// 持有所有 sink；列表本身只在控制循环启动前修改。
#[derive(Default, Clone)]
pub struct EventHub {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventHub {
    /// 创建空分发器
    #[must_use]
    pub const fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// 添加 sink
    pub fn add_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// 移除所有 sink
    pub fn clear(&mut self) {
        self.sinks.clear();
    }

    /// 向所有 sink 投递事件
    #[inline]
    pub fn emit(&self, tick: u64, event: &FsmEvent) {
        for sink in &self.sinks {
            sink.on_event(tick, event);
        }
    }

    /// sink 数量
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub").field("sinks", &self.sinks.len()).finish()
    }
}

const NO_INVALID_REQUEST: u64 = u64::MAX;

/// 把事件写入 `tracing` 日志
///
/// 同一个无效请求保持不变时只记录一次（直到请求变化或发生状态切换），
/// 避免 1kHz 控制循环刷屏。
#[derive(Debug)]
pub struct TracingEventSink {
    last_invalid: AtomicU64,
}

impl TracingEventSink {
    pub fn new() -> Self {
        Self {
            last_invalid: AtomicU64::new(NO_INVALID_REQUEST),
        }
    }

    fn invalid_key(from: StateName, requested: u32) -> u64 {
        ((from as u64) << 32) | u64::from(requested)
    }
}

impl Default for TracingEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for TracingEventSink {
    fn on_event(&self, tick: u64, event: &FsmEvent) {
        match *event {
            FsmEvent::InvalidTransition { from, requested } => {
                let key = Self::invalid_key(from, requested);
                if self.last_invalid.swap(key, Ordering::Relaxed) != key {
                    warn!(
                        tick,
                        "[CONTROL FSM] Bad Request: Cannot transition from {} to mode {}",
                        from,
                        requested
                    );
                }
                return;
            },
            FsmEvent::StateEntered { state } => info!(tick, "[CONTROL FSM] {} entered", state),
            FsmEvent::StateExited { state } => info!(tick, "[CONTROL FSM] {} exited", state),
            FsmEvent::TransitionStarted { from, to } => {
                debug!(tick, "[CONTROL FSM] Transition {} -> {} started", from, to)
            },
            FsmEvent::TransitionCompleted { from, to, ticks } => info!(
                tick,
                "[CONTROL FSM] Transition {} -> {} completed in {} ticks", from, to, ticks
            ),
            FsmEvent::SafetyChecks { enabled } => {
                warn!(tick, "[CONTROL FSM] Safety checks {}", if enabled { "ON" } else { "OFF" })
            },
            FsmEvent::SafetyClamp { count } => {
                // 钳位可能每个周期都发生，不打断去重
                debug!(tick, "[CONTROL FSM] Safety post-check clamped {} fields", count);
                return;
            },
        }
        self.last_invalid.store(NO_INVALID_REQUEST, Ordering::Relaxed);
    }
}
