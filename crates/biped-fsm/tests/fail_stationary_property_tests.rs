//! 请求序列的属性测试
//!
//! 使用 proptest 验证：任意原始请求值序列下，调度器只会落在模式表允许的状态上，
//! 模式表外的请求保持原状态并恰好报告一次，输出始终为有限值，
//! 且 PASSIVE 请求总能在一个周期内生效。

mod common;

use biped_fsm::{ControlMode, FsmEvent, FsmOperatingMode, StateName};
use common::{Harness, harness_in};
use proptest::prelude::*;

fn raw_request() -> impl Strategy<Value = u32> {
    prop_oneof![
        3 => prop::sample::select(ControlMode::ALL.map(ControlMode::as_raw).to_vec()),
        1 => any::<u32>(),
    ]
}

/// 模式表的并集：某状态收到某请求后允许到达的状态
fn allowed(from: StateName, raw: u32) -> Vec<StateName> {
    let target = ControlMode::from_raw(raw);
    let reachable = match (from, target) {
        (StateName::Passive, Some(ControlMode::JointPd)) => Some(StateName::JointPd),
        (StateName::Passive, Some(ControlMode::LockJoint)) => Some(StateName::LockJoint),
        (StateName::Passive, _) => None,
        (_, Some(ControlMode::Passive)) => Some(StateName::Passive),
        (_, Some(ControlMode::JointPd)) => Some(StateName::JointPd),
        (_, Some(ControlMode::LockJoint)) => Some(StateName::LockJoint),
        (_, Some(ControlMode::BalanceStand)) => Some(StateName::BalanceStand),
        _ => None,
    };
    let mut states = vec![from];
    states.extend(reachable);
    states
}

/// 请求不在该状态的模式表内
fn is_off_table(from: StateName, raw: u32) -> bool {
    ControlMode::from_raw(raw) != Some(from.mode()) && allowed(from, raw) == [from]
}

fn invalid_events(events: &[FsmEvent]) -> Vec<FsmEvent> {
    events
        .iter()
        .filter(|e| e.is_invalid_transition())
        .copied()
        .collect()
}

#[test]
fn off_table_requests_hold_and_report_once_for_every_state() {
    let states = [
        StateName::Passive,
        StateName::LockJoint,
        StateName::JointPd,
        StateName::BalanceStand,
    ];
    let out_of_range = [2, 5, 50, 54, 9999, u32::MAX];
    let requests = ControlMode::ALL
        .iter()
        .map(|mode| mode.as_raw())
        .chain(out_of_range);

    for from in states {
        for raw in requests.clone().filter(|raw| is_off_table(from, *raw)) {
            let mut h = if from == StateName::Passive {
                Harness::started_in(StateName::Passive)
            } else {
                harness_in(from)
            };
            h.request.request_raw(raw);

            let report = h.fsm.tick();
            assert_eq!(report.active, from, "{from} --{raw}-->");
            assert_eq!(report.operating_mode, FsmOperatingMode::Normal(from));
            assert_eq!(
                invalid_events(&h.drain()),
                vec![FsmEvent::InvalidTransition { from, requested: raw }],
                "{from} --{raw}-->"
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// 任意请求序列：状态只沿合法路径变化
    #[test]
    fn requests_only_follow_legal_edges(requests in prop::collection::vec(raw_request(), 1..40)) {
        let mut h = Harness::started_in(StateName::LockJoint);

        for raw in requests {
            let before = h.fsm.active_state();
            let was_normal = matches!(h.fsm.operating_mode(), FsmOperatingMode::Normal(_));
            h.request.request_raw(raw);
            let report = h.fsm.tick();

            // 模式表外的请求：原地保持，且该周期恰好一条诊断
            let invalid = invalid_events(&h.drain());
            if was_normal && is_off_table(before, raw) {
                prop_assert_eq!(report.active, before);
                prop_assert_eq!(
                    invalid,
                    vec![FsmEvent::InvalidTransition { from: before, requested: raw }]
                );
            } else if was_normal {
                prop_assert!(invalid.is_empty(), "{} --{}--> {:?}", before, raw, invalid);
            }

            // 序列长度远小于渐变周期数，渐变交接在序列内不会完成
            prop_assert!(
                allowed(before, raw).contains(&report.active),
                "{} --{}--> {}", before, raw, report.active
            );
            for frame in h.fsm.data().leg.joints.iter() {
                prop_assert!(frame.command_is_finite());
            }
        }
    }

    /// 无论前面发生过什么，PASSIVE 请求都在一个周期内生效
    #[test]
    fn passive_always_reached_in_one_tick(requests in prop::collection::vec(raw_request(), 0..20)) {
        let mut h = Harness::started_in(StateName::JointPd);
        for raw in requests {
            h.request.request_raw(raw);
            h.fsm.tick();
        }
        h.drain();

        h.request(ControlMode::Passive);
        let report = h.fsm.tick();

        prop_assert_eq!(report.active, StateName::Passive);
        prop_assert!(!h.fsm.data().safety_checks_enabled());
        prop_assert!(!h.drain().iter().any(FsmEvent::is_invalid_transition));
    }
}
