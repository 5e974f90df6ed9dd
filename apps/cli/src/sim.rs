//! 仿真关节对象
//!
//! 每个关节视为独立的一阶惯量 + 粘滞摩擦系统，按执行器侧的 PD 律积分：
//!
//! ```text
//! tau = kp * (q_des - q) + kd * (qd_des - qd) + tau_ff
//! qdd = (tau - damping * qd) / inertia
//! ```
//!
//! 只用于在没有硬件时驱动控制循环，不追求物理精度。

use biped_fsm::{JOINT_COUNT, JointArray, JointIo, JointIoError, LegControlData};

/// 仿真对象
#[derive(Debug, Clone)]
pub struct SimulatedPlant {
    dt: f32,
    inertia: f32,
    damping: f32,
    max_torque: f32,
    q: JointArray<f32>,
    qd: JointArray<f32>,
    tau: JointArray<f32>,
}

impl SimulatedPlant {
    /// 以控制周期 `dt`（秒）创建，初始姿态为 `q0`
    pub fn new(dt: f32, q0: JointArray<f32>) -> Self {
        Self {
            dt,
            inertia: 0.05,
            damping: 0.2,
            max_torque: 80.0,
            q: q0,
            qd: JointArray::splat(0.0),
            tau: JointArray::splat(0.0),
        }
    }

    /// 给所有关节一个初始速度扰动
    pub fn with_initial_velocity(mut self, qd: f32) -> Self {
        self.qd = JointArray::splat(qd);
        self
    }

    pub fn positions(&self) -> &JointArray<f32> {
        &self.q
    }

    pub fn velocities(&self) -> &JointArray<f32> {
        &self.qd
    }

    /// 最近一次施加的力矩
    pub fn torques(&self) -> &JointArray<f32> {
        &self.tau
    }

    fn step(&mut self) {
        for i in 0..JOINT_COUNT {
            let qdd = (self.tau[i] - self.damping * self.qd[i]) / self.inertia;
            self.qd[i] += qdd * self.dt;
            self.q[i] += self.qd[i] * self.dt;
        }
    }
}

impl JointIo for SimulatedPlant {
    fn read_measured(&mut self, leg: &mut LegControlData) -> Result<(), JointIoError> {
        leg.set_measured(&self.q, &self.qd);
        Ok(())
    }

    fn write_commands(&mut self, leg: &LegControlData) -> Result<(), JointIoError> {
        let torques = leg.commanded_torques();
        for i in 0..JOINT_COUNT {
            self.tau[i] = torques[i].clamp(-self.max_torque, self.max_torque);
        }
        self.step();

        if self.q.iter().chain(self.qd.iter()).any(|v| !v.is_finite()) {
            return Err(JointIoError::Device("simulation diverged".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biped_fsm::LegJoint;

    #[test]
    fn test_pure_damping_slows_joint() {
        let mut plant = SimulatedPlant::new(0.002, JointArray::splat(0.0)).with_initial_velocity(1.0);
        let mut leg = LegControlData::new();

        for _ in 0..500 {
            plant.read_measured(&mut leg).unwrap();
            for frame in leg.joints.iter_mut() {
                frame.set_command(0.0, 0.0, 0.0, 0.0, 5.0);
            }
            plant.write_commands(&leg).unwrap();
        }

        assert!(plant.velocities()[LegJoint::LeftKnee].abs() < 0.01);
    }

    #[test]
    fn test_pd_converges_to_target() {
        let mut plant = SimulatedPlant::new(0.002, JointArray::splat(0.0));
        let mut leg = LegControlData::new();

        for _ in 0..2000 {
            plant.read_measured(&mut leg).unwrap();
            for frame in leg.joints.iter_mut() {
                frame.set_command(0.3, 0.0, 0.0, 40.0, 2.0);
            }
            plant.write_commands(&leg).unwrap();
        }

        assert!((plant.positions()[LegJoint::RightHipPitch] - 0.3).abs() < 0.01);
    }

    #[test]
    fn test_zero_command_applies_zero_torque() {
        let mut plant = SimulatedPlant::new(0.002, JointArray::splat(0.1));
        let leg = LegControlData::new();
        plant.write_commands(&leg).unwrap();
        assert!(plant.torques().iter().all(|t| *t == 0.0));
    }
}
