//! run 命令
//!
//! 在仿真关节对象上运行控制状态机。

use anyhow::{Context, Result, anyhow};
use biped_fsm::{
    ChannelEventSink, ControlFsm, ControlMode, FsmEvent, LOCK_JOINT_POSE, LegJoint, LoopConfig,
    LoopStats, ModeRequest, ParameterStore, StateName, TracingEventSink, run_control_loop,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::commands::config::load_params;
use crate::script::{ModeScript, ScriptedSession};
use crate::sim::SimulatedPlant;

/// 运行命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 配置文件路径（默认：用户配置目录，不存在则使用内置默认值）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 启动状态
    #[arg(long, default_value = "passive", value_parser = parse_state)]
    pub startup: StateName,

    /// 控制频率（Hz，覆盖配置中的 control_rate_hz）
    #[arg(short, long)]
    pub rate: Option<f64>,

    /// 运行的控制周期数（不指定则运行到 Ctrl+C）
    #[arg(short, long)]
    pub ticks: Option<u64>,

    /// 模式请求脚本
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// 初始关节速度扰动（rad/s）
    #[arg(long, default_value_t = 0.0)]
    pub initial_velocity: f32,
}

fn parse_state(text: &str) -> Result<StateName, String> {
    StateName::from_name(text).ok_or_else(|| {
        let names: Vec<_> = StateName::ALL.iter().map(|s| s.as_str()).collect();
        format!("unknown state `{text}` (expected one of: {})", names.join(", "))
    })
}

/// 运行结果摘要
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub stats: LoopStats,
    pub final_state: Option<StateName>,
    pub transitions: u64,
    pub invalid_requests: u64,
    pub dropped_events: u64,
}

impl RunCommand {
    pub fn execute(&self) -> Result<()> {
        let (params, source) = load_params(self.config.as_deref())?;
        match &source {
            Some(path) => println!("📄 配置: {}", path.display()),
            None => println!("📄 配置: 内置默认值"),
        }

        let script = match &self.script {
            Some(path) => {
                let script = ModeScript::load(path)?;
                if script.is_empty() {
                    warn!("Script {} contains no requests", path.display());
                }
                println!("📜 脚本: {} ({} 条请求)", path.display(), script.len());
                script
            },
            None => ModeScript::default(),
        };

        let mut loop_config = LoopConfig::from_params(&params);
        if let Some(rate) = self.rate {
            loop_config.frequency_hz = rate;
        }
        loop_config.max_iterations = self.ticks;

        let interrupted = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));
        let request = ModeRequest::new(self.startup.mode());

        {
            let interrupted = interrupted.clone();
            let request = request.clone();
            ctrlc::set_handler(move || {
                // 先请求 PASSIVE，控制循环执行完下一个周期后停止
                request.request(ControlMode::Passive);
                interrupted.store(true, Ordering::SeqCst);
                eprintln!("\n收到退出信号，切换到 PASSIVE 后停止...");
            })
            .context("设置 Ctrl+C 处理器失败")?;
        }

        println!(
            "🚀 启动: {} @ {} Hz{}",
            self.startup,
            loop_config.frequency_hz,
            match self.ticks {
                Some(n) => format!("，{n} 个周期"),
                None => "，按 Ctrl+C 停止".to_string(),
            }
        );

        let summary = run_session(
            params,
            self.startup,
            request,
            script,
            &loop_config,
            self.initial_velocity,
            interrupted,
            stop,
        )?;

        print_summary(&summary);
        Ok(())
    }
}

/// 组装并运行一次仿真会话
#[allow(clippy::too_many_arguments)]
pub fn run_session(
    params: biped_fsm::ControlParameters,
    startup: StateName,
    request: ModeRequest,
    script: ModeScript,
    loop_config: &LoopConfig,
    initial_velocity: f32,
    interrupted: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
) -> Result<RunSummary> {
    let dt = 1.0 / loop_config.frequency_hz as f32;
    let store = ParameterStore::new(params)?;
    let mut fsm = ControlFsm::new(store, request.clone(), startup);

    let (recorder, events) = ChannelEventSink::with_default_capacity();
    let dropped = recorder.dropped_events().clone();
    fsm.data_mut().events_mut().add_sink(Arc::new(TracingEventSink::new()));
    fsm.data_mut().events_mut().add_sink(Arc::new(recorder));

    let plant = SimulatedPlant::new(dt, LOCK_JOINT_POSE.into()).with_initial_velocity(initial_velocity);
    let mut session = ScriptedSession::new(plant, request, script, interrupted, stop.clone());

    // 事件在独立线程上统计，控制线程只做 try_send
    let counter = std::thread::spawn(move || {
        let mut transitions = 0u64;
        let mut invalid_requests = 0u64;
        for timed in events.iter() {
            match timed.event {
                FsmEvent::TransitionCompleted { .. } => transitions += 1,
                FsmEvent::InvalidTransition { .. } => invalid_requests += 1,
                _ => {},
            }
        }
        (transitions, invalid_requests)
    });

    let result = run_control_loop(&mut fsm, &mut session, loop_config, &stop);
    let final_state = fsm.active_state();
    let dropped_events = dropped.load(Ordering::Relaxed);

    // 释放所有 sink，事件线程随之结束
    fsm.data_mut().events_mut().clear();
    drop(fsm);
    let (transitions, invalid_requests) =
        counter.join().map_err(|_| anyhow!("事件统计线程异常退出"))?;

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            warn!("Control loop aborted: {}", e);
            return Err(e.into());
        },
    };

    let plant = session.inner();
    let q = plant.positions();
    let peak_torque = plant.torques().iter().fold(0.0f32, |acc, tau| acc.max(tau.abs()));
    info!(
        "Final pose: l_knee={:.3} r_knee={:.3}, last peak |tau|={:.2}",
        q[LegJoint::LeftKnee],
        q[LegJoint::RightKnee],
        peak_torque
    );

    Ok(RunSummary {
        stats,
        final_state: Some(final_state),
        transitions,
        invalid_requests,
        dropped_events,
    })
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("📊 运行结果:");
    if let Some(state) = summary.final_state {
        println!("  最终状态: {}", state);
    }
    println!("  控制周期: {}", summary.stats.iterations);
    println!("  超时周期: {}", summary.stats.overruns);
    println!("  状态切换: {}", summary.transitions);
    println!("  无效请求: {}", summary.invalid_requests);
    println!("  安全钳位: {}", summary.stats.clamped_fields);
    if summary.dropped_events > 0 {
        println!("  ⚠️ 丢弃事件: {}", summary.dropped_events);
    }
}
