//! 集成测试公共工具

#![allow(dead_code)]

use biped_fsm::{
    ChannelEventSink, ControlFsm, ControlMode, FsmEvent, ModeRequest, ParameterStore, StateName,
    TimedEvent,
};
use crossbeam_channel::Receiver;
use std::sync::Arc;

/// 测试夹具：调度器 + 请求句柄 + 事件接收端
pub struct Harness {
    pub fsm: ControlFsm,
    pub request: ModeRequest,
    pub events: Receiver<TimedEvent>,
}

impl Harness {
    /// 以给定启动状态创建，并执行第一个周期
    pub fn started_in(startup: StateName) -> Self {
        let request = ModeRequest::new(startup.mode());
        let mut fsm = ControlFsm::new(ParameterStore::default(), request.clone(), startup);
        let (sink, events) = ChannelEventSink::new(1024);
        fsm.data_mut().events_mut().add_sink(Arc::new(sink));
        fsm.tick();

        let harness = Self {
            fsm,
            request,
            events,
        };
        harness.drain();
        harness
    }

    /// 执行 n 个周期
    pub fn run_ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.fsm.tick();
        }
    }

    pub fn request(&self, mode: ControlMode) {
        self.request.request(mode);
    }

    /// 取出当前积累的所有事件
    pub fn drain(&self) -> Vec<FsmEvent> {
        self.events.try_iter().map(|e| e.event).collect()
    }
}

/// 把启动状态带到 `target`（经由合法路径）
pub fn harness_in(target: StateName) -> Harness {
    let mut harness = Harness::started_in(StateName::LockJoint);
    if target != StateName::LockJoint {
        harness.request(target.mode());
        // 从 LockJoint 出发的交接都是立即完成的
        harness.fsm.tick();
        harness.drain();
    }
    assert_eq!(harness.fsm.active_state(), target);
    harness
}
