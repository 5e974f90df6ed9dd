//! 交接描述（Transition Data）
//!
//! 描述一次控制律交接的进度与结果。由当前活动状态持有，`on_enter` 时清零；
//! 多周期交接的进度完全保存在这里，每次 `transition()` 调用推进一步，不阻塞等待。

/// 交接描述
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionData {
    /// 已经过的交接周期数
    pub elapsed_ticks: u32,

    /// 目标交接时长（周期数，0 表示立即完成）
    pub duration_ticks: u32,

    /// 交接是否完成；为 true 后调度器可以切换活动状态
    pub done: bool,

    /// 本次交接是否关闭了全局安全检查
    pub safety_checks_disabled: bool,
}

impl TransitionData {
    /// 清零（状态进入时调用）
    #[inline]
    pub fn zero(&mut self) {
        *self = Self::default();
    }

    /// 以给定时长开始一次交接
    #[inline]
    pub fn begin(&mut self, duration_ticks: u32) {
        self.elapsed_ticks = 0;
        self.duration_ticks = duration_ticks;
        self.done = false;
    }

    /// 推进一个周期，到达时长后自动完成
    #[inline]
    pub fn advance(&mut self) {
        self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);
        if self.elapsed_ticks >= self.duration_ticks {
            self.done = true;
        }
    }

    /// 交接进度（0.0 - 1.0）；时长为 0 时恒为 1.0
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.duration_ticks == 0 {
            1.0
        } else {
            (self.elapsed_ticks as f32 / self.duration_ticks as f32).min(1.0)
        }
    }

    /// 立即完成（时长强制为 0）
    #[inline]
    pub fn finish_immediately(&mut self) {
        self.duration_ticks = 0;
        self.done = true;
    }
}
