//! 安全后检查（Safety Post-Check）
//!
//! 控制律写完关节帧之后、执行器读取之前执行。
//!
//! - 安全检查开启：增益、期望速度、前馈力矩、期望位置钳位到 [`SafetyLimits`]
//! - 任何时候：非有限的期望值替换为安全默认值（`q_des` → 测量位置或 0，其余 → 0）
//!
//! 返回被修改的字段数，调度器据此投递 `SafetyClamp` 事件。

use biped_tools::SafetyLimits;
use biped_types::{JointFrame, LegControlData, LegJoint};

/// 对全部关节执行一次后检查，返回被修改的字段数
pub fn enforce(leg: &mut LegControlData, limits: &SafetyLimits, checks_enabled: bool) -> u32 {
    let mut clamped = 0;
    for joint in LegJoint::ALL {
        let frame = leg.joint_mut(joint);
        clamped += sanitize_non_finite(frame);
        if checks_enabled {
            clamped += clamp_to_limits(joint, frame, limits);
        }
    }
    clamped
}

fn sanitize_non_finite(frame: &mut JointFrame) -> u32 {
    if frame.command_is_finite() {
        return 0;
    }

    let mut count = 0;
    if !frame.q_des.is_finite() {
        frame.q_des = if frame.q.is_finite() { frame.q } else { 0.0 };
        count += 1;
    }
    for value in [&mut frame.qd_des, &mut frame.tau_ff, &mut frame.kp, &mut frame.kd] {
        if !value.is_finite() {
            *value = 0.0;
            count += 1;
        }
    }
    count
}

fn clamp_to_limits(joint: LegJoint, frame: &mut JointFrame, limits: &SafetyLimits) -> u32 {
    let mut count = 0;
    count += clamp_field(&mut frame.kp, 0.0, limits.max_kp);
    count += clamp_field(&mut frame.kd, 0.0, limits.max_kd);
    count += clamp_field(&mut frame.qd_des, -limits.max_velocity, limits.max_velocity);
    count += clamp_field(
        &mut frame.tau_ff,
        -limits.max_feedforward_torque,
        limits.max_feedforward_torque,
    );
    count += clamp_field(&mut frame.q_des, limits.q_min[joint], limits.q_max[joint]);
    count
}

#[inline]
fn clamp_field(value: &mut f32, lo: f32, hi: f32) -> u32 {
    let clamped = value.clamp(lo, hi);
    if clamped != *value {
        *value = clamped;
        1
    } else {
        0
    }
}
