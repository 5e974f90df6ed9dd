//! 模式请求脚本
//!
//! 文本格式，每行 `<tick> <mode>`，`mode` 可以是模式名或原始整数值：
//!
//! ```text
//! # 先锁定，再站立，最后急停
//! 0    lock_joint
//! 500  balance_stand
//! 1500 passive
//! 1600 9999        # 无效请求，应被拒绝
//! ```

use biped_fsm::{ControlMode, JointIo, JointIoError, LegControlData, ModeRequest};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::info;

/// 脚本解析错误
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read script {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// 单条脚本项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptEntry {
    pub tick: u64,
    pub raw_mode: u32,
}

/// 模式请求脚本（按 tick 升序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeScript {
    entries: Vec<ScriptEntry>,
}

impl ModeScript {
    pub fn parse(content: &str) -> Result<Self, ScriptError> {
        let mut entries = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let (Some(tick), Some(mode), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(ScriptError::Parse {
                    line: line_no,
                    reason: format!("expected `<tick> <mode>`, got `{line}`"),
                });
            };

            let tick = tick.parse::<u64>().map_err(|e| ScriptError::Parse {
                line: line_no,
                reason: format!("invalid tick `{tick}`: {e}"),
            })?;
            let raw_mode = parse_mode(mode).ok_or_else(|| ScriptError::Parse {
                line: line_no,
                reason: format!("unknown mode `{mode}`"),
            })?;

            entries.push(ScriptEntry { tick, raw_mode });
        }

        entries.sort_by_key(|entry| entry.tick);
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 模式名或原始整数值
///
/// 整数值不做校验，原样交给控制核心。
pub fn parse_mode(text: &str) -> Option<u32> {
    text.parse::<u32>()
        .ok()
        .or_else(|| ControlMode::from_name(text).map(ControlMode::as_raw))
}

/// 带脚本与中断处理的 I/O 包装
///
/// - 每个周期读取测量值之前，按 tick 下发到期的脚本请求
/// - 收到中断后，每个周期都由会话自己写入 PASSIVE 请求（覆盖脚本可能写入的值），
///   以该请求执行完一个周期后再置位停止标志
pub struct ScriptedSession<IO> {
    inner: IO,
    request: ModeRequest,
    script: ModeScript,
    cursor: usize,
    tick: u64,
    interrupted: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    passive_latched: bool,
}

impl<IO: JointIo> ScriptedSession<IO> {
    pub fn new(
        inner: IO,
        request: ModeRequest,
        script: ModeScript,
        interrupted: Arc<AtomicBool>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            inner,
            request,
            script,
            cursor: 0,
            tick: 0,
            interrupted,
            stop,
            passive_latched: false,
        }
    }

    pub fn inner(&self) -> &IO {
        &self.inner
    }

    fn apply_due_requests(&mut self) {
        while let Some(&entry) = self.script.entries.get(self.cursor) {
            if entry.tick > self.tick {
                break;
            }
            info!(tick = self.tick, "Script request: {}", describe(entry.raw_mode));
            self.request.request_raw(entry.raw_mode);
            self.cursor += 1;
        }
    }
}

impl<IO: JointIo> JointIo for ScriptedSession<IO> {
    fn read_measured(&mut self, leg: &mut LegControlData) -> Result<(), JointIoError> {
        if self.interrupted.load(Ordering::SeqCst) {
            // 中断后不再执行脚本；本周期锁存的请求一定是 PASSIVE
            self.request.request(ControlMode::Passive);
            self.passive_latched = true;
        } else {
            self.apply_due_requests();
        }
        self.inner.read_measured(leg)
    }

    fn write_commands(&mut self, leg: &LegControlData) -> Result<(), JointIoError> {
        let result = self.inner.write_commands(leg);
        self.tick += 1;
        if self.passive_latched {
            self.stop.store(true, Ordering::SeqCst);
        }
        result
    }
}

/// 请求值的可读形式
pub fn describe(raw_mode: u32) -> String {
    match ControlMode::from_raw(raw_mode) {
        Some(mode) => format!("{mode} ({raw_mode})"),
        None => format!("<unknown> ({raw_mode})"),
    }
}
