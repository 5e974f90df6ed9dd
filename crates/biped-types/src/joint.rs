//! 关节索引和数组
//!
//! 提供编译期安全的关节索引，防止越界和索引错误。
//!
//! # 示例
//!
//! ```rust
//! use biped_types::{JointArray, LegJoint, JointGroup};
//!
//! let mut kd = JointArray::splat(0.0f32);
//! kd[LegJoint::LeftKnee] = 3.0;
//!
//! assert_eq!(kd[LegJoint::LeftKnee], 3.0);
//! assert_eq!(LegJoint::LeftKnee.group(), JointGroup::Knee);
//! ```

use std::fmt;
use std::ops::{Index, IndexMut};

/// 受控关节总数（每条腿 6 个）
pub const JOINT_COUNT: usize = 12;

/// 每条腿的关节数
pub const JOINTS_PER_LEG: usize = 6;

/// 腿的左右侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LegSide {
    Left,
    Right,
}

/// 安全阻尼分组
///
/// 阻尼表 `safety_damper_kd` 有三个系数，按关节分组选取：
/// 髋部三个关节共用 `kd[0]`，膝关节用 `kd[1]`，踝部两个关节共用 `kd[2]`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JointGroup {
    /// 髋关节（roll / yaw / pitch）
    Hip = 0,
    /// 膝关节
    Knee = 1,
    /// 踝关节（pitch / roll）
    Ankle = 2,
}

impl JointGroup {
    /// 在阻尼表中的下标（0-2）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// 关节枚举
///
/// 表示双足机器人的 12 个驱动关节，顺序与执行器接口的数组顺序一致：
/// 左腿 0-5，右腿 6-11。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LegJoint {
    LeftHipRoll = 0,
    LeftHipYaw = 1,
    LeftHipPitch = 2,
    LeftKnee = 3,
    LeftAnklePitch = 4,
    LeftAnkleRoll = 5,
    RightHipRoll = 6,
    RightHipYaw = 7,
    RightHipPitch = 8,
    RightKnee = 9,
    RightAnklePitch = 10,
    RightAnkleRoll = 11,
}

impl LegJoint {
    /// 所有关节的数组（按执行器顺序）
    pub const ALL: [LegJoint; JOINT_COUNT] = [
        LegJoint::LeftHipRoll,
        LegJoint::LeftHipYaw,
        LegJoint::LeftHipPitch,
        LegJoint::LeftKnee,
        LegJoint::LeftAnklePitch,
        LegJoint::LeftAnkleRoll,
        LegJoint::RightHipRoll,
        LegJoint::RightHipYaw,
        LegJoint::RightHipPitch,
        LegJoint::RightKnee,
        LegJoint::RightAnklePitch,
        LegJoint::RightAnkleRoll,
    ];

    /// 获取关节索引（0-11）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 从索引创建关节（范围检查）
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// 关节所在的腿
    #[inline]
    pub const fn side(self) -> LegSide {
        if self.index() < JOINTS_PER_LEG {
            LegSide::Left
        } else {
            LegSide::Right
        }
    }

    /// 关节所属的阻尼分组
    pub const fn group(self) -> JointGroup {
        match self.index() % JOINTS_PER_LEG {
            0..=2 => JointGroup::Hip,
            3 => JointGroup::Knee,
            _ => JointGroup::Ankle,
        }
    }

    /// 获取关节名称
    pub const fn name(self) -> &'static str {
        match self {
            LegJoint::LeftHipRoll => "l_hip_roll",
            LegJoint::LeftHipYaw => "l_hip_yaw",
            LegJoint::LeftHipPitch => "l_hip_pitch",
            LegJoint::LeftKnee => "l_knee",
            LegJoint::LeftAnklePitch => "l_ankle_pitch",
            LegJoint::LeftAnkleRoll => "l_ankle_roll",
            LegJoint::RightHipRoll => "r_hip_roll",
            LegJoint::RightHipYaw => "r_hip_yaw",
            LegJoint::RightHipPitch => "r_hip_pitch",
            LegJoint::RightKnee => "r_knee",
            LegJoint::RightAnklePitch => "r_ankle_pitch",
            LegJoint::RightAnkleRoll => "r_ankle_roll",
        }
    }
}

impl fmt::Display for LegJoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 关节数组
///
/// 类型安全的 12 关节数组容器，支持按 `LegJoint` 或 `usize` 索引。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct JointArray<T> {
    data: [T; JOINT_COUNT],
}

// 如果 T 实现了 Copy，则 JointArray<T> 也实现 Copy
impl<T: Copy> Copy for JointArray<T> {}

impl<T> JointArray<T> {
    /// 创建新的关节数组
    #[inline]
    pub const fn new(data: [T; JOINT_COUNT]) -> Self {
        JointArray { data }
    }

    /// 获取内部数组的引用
    #[inline]
    pub fn as_array(&self) -> &[T; JOINT_COUNT] {
        &self.data
    }

    /// 获取内部数组的可变引用
    #[inline]
    pub fn as_array_mut(&mut self) -> &mut [T; JOINT_COUNT] {
        &mut self.data
    }

    /// 迭代器
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// 可变迭代器
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// 按关节迭代（关节, 元素）
    pub fn iter_joints(&self) -> impl Iterator<Item = (LegJoint, &T)> {
        LegJoint::ALL.into_iter().zip(self.data.iter())
    }

    /// 映射转换
    pub fn map<U, F>(self, f: F) -> JointArray<U>
    where
        F: FnMut(T) -> U,
    {
        JointArray::new(self.data.map(f))
    }
}

impl<T: Copy> JointArray<T> {
    /// 创建所有元素相同的数组
    #[inline]
    pub const fn splat(value: T) -> Self {
        JointArray::new([value; JOINT_COUNT])
    }

    /// 带关节的映射转换
    pub fn map_with_joint<U, F>(&self, mut f: F) -> JointArray<U>
    where
        F: FnMut(LegJoint, T) -> U,
    {
        JointArray::new(LegJoint::ALL.map(|joint| f(joint, self.data[joint.index()])))
    }
}

impl<T: Default + Copy> Default for JointArray<T> {
    fn default() -> Self {
        JointArray::splat(T::default())
    }
}

// 索引访问
impl<T> Index<LegJoint> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, joint: LegJoint) -> &T {
        &self.data[joint.index()]
    }
}

impl<T> IndexMut<LegJoint> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, joint: LegJoint) -> &mut T {
        &mut self.data[joint.index()]
    }
}

impl<T> Index<usize> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<T> From<[T; JOINT_COUNT]> for JointArray<T> {
    #[inline]
    fn from(data: [T; JOINT_COUNT]) -> Self {
        JointArray::new(data)
    }
}

impl<T> From<JointArray<T>> for [T; JOINT_COUNT] {
    #[inline]
    fn from(arr: JointArray<T>) -> Self {
        arr.data
    }
}

impl<T> IntoIterator for JointArray<T> {
    type Item = T;
    type IntoIter = std::array::IntoIter<T, JOINT_COUNT>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a JointArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut JointArray<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter_mut()
    }
}
