//! # Biped Types
//!
//! 双足机器人关节级控制的基础数据类型（无硬件依赖、无状态）。
//!
//! ## 模块
//!
//! - `joint`: 关节索引（`LegJoint`）、阻尼分组与 12 关节数组
//! - `frame`: 每关节的测量/期望/增益记录（`JointFrame`）
//! - `mode`: 操作员请求的控制模式（`ControlMode`）与状态标识（`StateName`）
//!
//! ## 单位
//!
//! 位置使用弧度（rad），速度使用 rad/s，力矩使用 N·m。
//! 所有浮点字段使用 `f32`，与执行器接口保持一致。

pub mod frame;
pub mod joint;
pub mod mode;

// 重新导出常用类型
pub use frame::{JointFrame, LegControlData};
pub use joint::{JOINT_COUNT, JOINTS_PER_LEG, JointArray, JointGroup, LegJoint, LegSide};
pub use mode::{ControlMode, StateName};

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_joint_array_is_a_plain_list() {
        let mut kd = JointArray::splat(0.0f32);
        kd[LegJoint::RightAnkleRoll] = 1.5;

        let json = serde_json::to_string(&kd).unwrap();
        assert!(json.starts_with('[') && json.ends_with("1.5]"), "{json}");

        let back: JointArray<f32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kd);

        // 长度不足 12 的列表无法反序列化
        assert!(serde_json::from_str::<JointArray<f32>>("[0.0, 1.0]").is_err());
    }

    #[test]
    fn test_control_mode_serializes_by_name() {
        let json = serde_json::to_string(&ControlMode::LockJoint).unwrap();
        assert_eq!(json, "\"LockJoint\"");
        let mode: ControlMode = serde_json::from_str("\"BalanceStand\"").unwrap();
        assert_eq!(mode, ControlMode::BalanceStand);
        assert!(serde_json::from_str::<ControlMode>("\"Fly\"").is_err());
    }

    #[test]
    fn test_joint_frame_fields() {
        let mut frame = JointFrame::default();
        frame.set_command(-0.48, 0.0, 2.0, 0.0, 3.0);

        let value = serde_json::to_value(frame).unwrap();
        assert_eq!(value["kd"], 3.0);
        assert_eq!(value["tau_ff"], 2.0);

        let back: JointFrame = serde_json::from_value(value).unwrap();
        assert_eq!(back, frame);
    }
}
