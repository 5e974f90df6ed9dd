//! 异步事件录制（Channel Event Sink）
//!
//! 基于有界 Channel 的事件 sink，把诊断事件交给后台线程（日志落盘、遥测上报）。
//!
//! # 设计原则
//!
//! - **Bounded Queue**: 有界队列防止 OOM
//! - **非阻塞**: 使用 `try_send`，队列满时丢事件而非阻塞控制周期
//! - **丢弃监控**: 提供 `dropped_events` 计数器
//!
//! # 使用示例
//!
//! ```rust
//! use biped_fsm::recording::ChannelEventSink;
//! use biped_fsm::events::{EventSink, FsmEvent};
//!
//! let (sink, rx) = ChannelEventSink::new(2);
//! let dropped = sink.dropped_events().clone();
//!
//! for tick in 0..3 {
//!     sink.on_event(tick, &FsmEvent::SafetyClamp { count: 1 });
//! }
//!
//! assert_eq!(rx.len(), 2);
//! assert_eq!(dropped.load(std::sync::atomic::Ordering::Relaxed), 1);
//! ```

use crate::events::{EventSink, FsmEvent};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 带控制周期序号的事件
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    /// 产生事件的控制周期
    pub tick: u64,
    /// 事件内容
    pub event: FsmEvent,
}

/// 默认队列容量（约 4 秒 @ 1kHz 的最坏事件率）
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

/// Channel 事件 sink
pub struct ChannelEventSink {
    tx: Sender<TimedEvent>,

    /// 丢弃计数器（队列满时递增）
    dropped_events: Arc<AtomicU64>,

    /// 成功投递计数器
    event_counter: Arc<AtomicU64>,
}

impl ChannelEventSink {
    /// 以指定容量创建 sink 与接收端
    pub fn new(capacity: usize) -> (Self, Receiver<TimedEvent>) {
        let (tx, rx) = bounded(capacity);
        let sink = Self {
            tx,
            dropped_events: Arc::new(AtomicU64::new(0)),
            event_counter: Arc::new(AtomicU64::new(0)),
        };
        (sink, rx)
    }

    /// 使用默认容量创建
    pub fn with_default_capacity() -> (Self, Receiver<TimedEvent>) {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }

    /// 丢弃计数器
    pub fn dropped_events(&self) -> &Arc<AtomicU64> {
        &self.dropped_events
    }

    /// 投递计数器
    pub fn event_counter(&self) -> &Arc<AtomicU64> {
        &self.event_counter
    }
}

impl EventSink for ChannelEventSink {
    #[inline]
    fn on_event(&self, tick: u64, event: &FsmEvent) {
        match self.tx.try_send(TimedEvent {
            tick,
            event: *event,
        }) {
            Ok(()) => {
                self.event_counter.fetch_add(1, Ordering::Relaxed);
            },
            Err(_) => {
                // 队列满或接收端已关闭：丢弃，绝不阻塞
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
            },
        }
    }
}
