//! Loop Runner - 控制循环
//!
//! 按固定频率驱动 [`ControlFsm`]：读取测量值 → `tick()` → 写出期望值。
//!
//! # 核心功能
//!
//! - **循环锚点**: 使用绝对时间锚点，消除累积漂移
//! - **精确定时**: 使用 `spin_sleep` 实现低抖动延时
//! - **容错性**: 允许有限次数的连续 I/O 失败（本周期沿用上一份测量值）
//! - **外部停止**: 通过 `AtomicBool` 停止（例如 Ctrl-C 处理器）
//!
//! # 使用示例
//!
//! ```rust
//! use biped_fsm::{
//!     ControlFsm, JointIo, JointIoError, LegControlData, LoopConfig, ModeRequest,
//!     ParameterStore, StateName, run_control_loop,
//! };
//! use std::sync::atomic::AtomicBool;
//!
//! struct NullIo;
//!
//! impl JointIo for NullIo {
//!     fn read_measured(&mut self, _leg: &mut LegControlData) -> Result<(), JointIoError> {
//!         Ok(())
//!     }
//!     fn write_commands(&mut self, _leg: &LegControlData) -> Result<(), JointIoError> {
//!         Ok(())
//!     }
//! }
//!
//! let request = ModeRequest::default();
//! let mut fsm = ControlFsm::new(ParameterStore::default(), request, StateName::Passive);
//! let config = LoopConfig {
//!     frequency_hz: 1000.0,
//!     max_iterations: Some(10),
//!     ..Default::default()
//! };
//!
//! let stats = run_control_loop(&mut fsm, &mut NullIo, &config, &AtomicBool::new(false)).unwrap();
//! assert_eq!(stats.iterations, 10);
//! ```

use crate::error::{FsmError, JointIoError};
use crate::fsm::ControlFsm;
use biped_tools::ControlParameters;
use biped_types::LegControlData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// 执行器 / 状态估计协作方
///
/// 两个方法都在控制线程上调用，实现必须有界时延。
pub trait JointIo {
    /// 写入测量位置 / 速度
    fn read_measured(&mut self, leg: &mut LegControlData) -> Result<(), JointIoError>;

    /// 读取期望值并下发到执行器
    fn write_commands(&mut self, leg: &LegControlData) -> Result<(), JointIoError>;
}

/// 控制循环配置
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// 控制频率（Hz）
    pub frequency_hz: f64,

    /// 最大迭代次数（None 表示运行到外部停止）
    pub max_iterations: Option<u64>,

    /// 允许的最大连续 I/O 失败次数，超过后循环返回错误
    pub max_consecutive_io_failures: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 500.0,
            max_iterations: None,
            max_consecutive_io_failures: 5,
        }
    }
}

impl LoopConfig {
    /// 按控制参数中的频率创建
    pub fn from_params(params: &ControlParameters) -> Self {
        Self {
            frequency_hz: f64::from(params.control_rate_hz),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), FsmError> {
        if !self.frequency_hz.is_finite() || self.frequency_hz <= 0.0 {
            return Err(FsmError::InvalidLoopConfig(format!(
                "Invalid frequency_hz: {} (must be > 0)",
                self.frequency_hz
            )));
        }
        if self.frequency_hz > 10000.0 {
            warn!(
                "Very high control frequency: {} Hz. This may cause performance issues.",
                self.frequency_hz
            );
        }
        Ok(())
    }
}

/// 控制循环统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// 完成的控制周期数
    pub iterations: u64,
    /// 超时（Overrun）周期数
    pub overruns: u64,
    /// I/O 失败总次数
    pub io_failures: u64,
    /// 安全后检查修改的字段总数
    pub clamped_fields: u64,
}

/// 运行控制循环，直到达到最大迭代次数或 `stop` 被置位
///
/// 连续 I/O 失败超过 `max_consecutive_io_failures` 时返回 [`FsmError::Io`]。
pub fn run_control_loop<IO: JointIo + ?Sized>(
    fsm: &mut ControlFsm,
    io: &mut IO,
    config: &LoopConfig,
    stop: &AtomicBool,
) -> Result<LoopStats, FsmError> {
    config.validate()?;

    let period = Duration::from_secs_f64(1.0 / config.frequency_hz);
    let mut stats = LoopStats::default();
    let mut consecutive_failures = 0u32;
    let mut next_tick = Instant::now();

    info!(
        "Control loop started at {} Hz (startup state: {})",
        config.frequency_hz,
        fsm.active_state()
    );

    loop {
        if stop.load(Ordering::Acquire) {
            info!("Control loop stop requested");
            break;
        }
        if let Some(max_iter) = config.max_iterations
            && stats.iterations >= max_iter
        {
            break;
        }

        // 1. 设定下一个锚点（绝对时间）
        next_tick += period;

        // 2. 读取测量值；失败时沿用上一份测量值
        let read = io.read_measured(&mut fsm.data_mut().leg);
        note_io_result(read, &mut consecutive_failures, &mut stats, config)?;

        // 3. 控制周期
        let report = fsm.tick();
        stats.clamped_fields += u64::from(report.clamped_fields);

        // 4. 下发期望值
        let write = io.write_commands(&fsm.data().leg);
        note_io_result(write, &mut consecutive_failures, &mut stats, config)?;

        stats.iterations += 1;

        // 5. 睡眠到下一个锚点
        let now = Instant::now();
        if next_tick > now {
            spin_sleep::sleep(next_tick - now);
        } else {
            // ⚠️ Overrun：重置锚点到当前时间，避免后续累积延迟
            stats.overruns += 1;
            warn!(
                "Control loop overrun: tick took {:?} (period {:?})",
                now.duration_since(next_tick - period),
                period
            );
            next_tick = now;
        }
    }

    info!(
        "Control loop finished: {} iterations, {} overruns, {} I/O failures",
        stats.iterations, stats.overruns, stats.io_failures
    );
    Ok(stats)
}

fn note_io_result(
    result: Result<(), JointIoError>,
    consecutive_failures: &mut u32,
    stats: &mut LoopStats,
    config: &LoopConfig,
) -> Result<(), FsmError> {
    match result {
        Ok(()) => {
            *consecutive_failures = 0;
            Ok(())
        },
        Err(e) => {
            *consecutive_failures += 1;
            stats.io_failures += 1;
            if *consecutive_failures > config.max_consecutive_io_failures {
                error!(
                    "Consecutive joint I/O failures ({}): {}. Aborting control loop.",
                    consecutive_failures, e
                );
                return Err(FsmError::Io {
                    count: *consecutive_failures,
                    last_error: e,
                });
            }
            warn!("Transient joint I/O error ({}): {}", consecutive_failures, e);
            Ok(())
        },
    }
}
