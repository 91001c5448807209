//! 臂状态模型：Side / Orientation / Gripper / ArmState
//!
//! ArmState 只由本侧 SkillExecutor 在技能成功后提交；Coordinator 只读。
//! 朝向标签通过查表得到每侧的单位四元数（静态 XYZ 欧拉角）。

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use nalgebra::{UnitQuaternion, Vector3};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 机械臂侧别
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// 横向符号：左臂 +y，右臂 -y
    pub fn sign(self) -> f64 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// 文本结果行中的大写前缀（LEFT_RESULT / RIGHT_HAND ...）
    pub fn tag(self) -> &'static str {
        match self {
            Side::Left => "LEFT",
            Side::Right => "RIGHT",
        }
    }

    /// 远离桌面中线方向的单位横向向量
    pub fn outward(self) -> Vector3<f64> {
        Vector3::new(0.0, self.sign(), 0.0)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

/// 末端执行器朝向（腕部接近角）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Orientation {
    #[serde(rename = "Vertical")]
    Vertical,
    #[serde(rename = "Horizontally_Up")]
    HorizontallyUp,
    #[serde(rename = "Horizontally_Down")]
    HorizontallyDown,
    #[serde(rename = "Horizontally_Slanted_Up")]
    HorizontallySlantedUp,
    #[serde(rename = "Horizontally_Slanted_Down")]
    HorizontallySlantedDown,
    #[serde(rename = "Vertically_Slanted")]
    VerticallySlanted,
    #[serde(rename = "Vertically_Down")]
    VerticallyDown,
}

/// 静态 XYZ 欧拉角 (roll, pitch, yaw)
type Euler = (f64, f64, f64);

impl Orientation {
    pub const ALL: [Orientation; 7] = [
        Orientation::Vertical,
        Orientation::HorizontallyUp,
        Orientation::HorizontallyDown,
        Orientation::HorizontallySlantedUp,
        Orientation::HorizontallySlantedDown,
        Orientation::VerticallySlanted,
        Orientation::VerticallyDown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Orientation::Vertical => "Vertical",
            Orientation::HorizontallyUp => "Horizontally_Up",
            Orientation::HorizontallyDown => "Horizontally_Down",
            Orientation::HorizontallySlantedUp => "Horizontally_Slanted_Up",
            Orientation::HorizontallySlantedDown => "Horizontally_Slanted_Down",
            Orientation::VerticallySlanted => "Vertically_Slanted",
            Orientation::VerticallyDown => "Vertically_Down",
        }
    }

    fn euler(self, side: Side) -> Euler {
        match (side, self) {
            (_, Orientation::HorizontallyUp) => (0.0, PI / 2.0, PI / 2.0),
            (_, Orientation::HorizontallyDown) => (PI, -PI / 2.0, PI / 2.0),
            (Side::Left, Orientation::Vertical) => (PI / 2.0, PI, PI),
            (Side::Left, Orientation::HorizontallySlantedUp) => (2.0 * PI / 3.0, 5.0 * PI / 6.0, PI),
            (Side::Left, Orientation::HorizontallySlantedDown) => (-PI, -PI / 4.0, 5.0 * PI / 8.0),
            (Side::Left, Orientation::VerticallySlanted) => (PI / 2.0, PI, 4.0 * PI / 3.0),
            (Side::Left, Orientation::VerticallyDown) => (PI, -PI / 8.0, PI / 2.0),
            (Side::Right, Orientation::Vertical) => (PI / 2.0, 0.0, PI),
            (Side::Right, Orientation::HorizontallySlantedUp) => (PI / 4.0, PI / 6.0, PI),
            (Side::Right, Orientation::HorizontallySlantedDown) => (PI, -3.0 * PI / 4.0, 5.0 * PI / 8.0),
            (Side::Right, Orientation::VerticallySlanted) => (PI / 2.0, 0.0, 2.0 * PI / 3.0),
            (Side::Right, Orientation::VerticallyDown) => (PI, 0.0, 3.0 * PI / 8.0),
        }
    }

    /// 该侧在此朝向下的末端四元数
    pub fn quaternion(self, side: Side) -> UnitQuaternion<f64> {
        let (roll, pitch, yaw) = self.euler(side);
        UnitQuaternion::from_euler_angles(roll, pitch, yaw)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Orientation {
    type Err = String;

    /// 同时接受 `Horizontally_Up` 与 `HorizontallyUp` 两种写法
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "").to_ascii_lowercase();
        Orientation::ALL
            .into_iter()
            .find(|o| o.label().replace('_', "").to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("unknown orientation: {s}"))
    }
}

/// 手指 / 夹爪状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Gripper {
    #[serde(rename = "Open")]
    Open,
    #[serde(rename = "Closed")]
    Closed,
    #[serde(rename = "Hold_Up")]
    HoldUp,
    #[serde(rename = "PointAt")]
    PointAt,
}

impl Gripper {
    pub const ALL: [Gripper; 4] = [Gripper::Open, Gripper::Closed, Gripper::HoldUp, Gripper::PointAt];

    pub fn label(self) -> &'static str {
        match self {
            Gripper::Open => "Open",
            Gripper::Closed => "Closed",
            Gripper::HoldUp => "Hold_Up",
            Gripper::PointAt => "PointAt",
        }
    }
}

impl fmt::Display for Gripper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Gripper {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "").to_ascii_lowercase();
        Gripper::ALL
            .into_iter()
            .find(|g| g.label().replace('_', "").to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("unknown gripper state: {s}"))
    }
}

/// 单臂离散状态：朝向 × 夹爪（共 28 种组合）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ArmState {
    pub orientation: Orientation,
    pub gripper: Gripper,
}

impl ArmState {
    /// 回合开始 / reset 后的状态
    pub const INITIAL: ArmState = ArmState {
        orientation: Orientation::Vertical,
        gripper: Gripper::Open,
    };

    pub fn new(orientation: Orientation, gripper: Gripper) -> Self {
        Self { orientation, gripper }
    }

    pub fn is_initial(&self) -> bool {
        *self == Self::INITIAL
    }
}

impl Default for ArmState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// 左右两侧各一份的值
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SidePair<T> {
    pub left: T,
    pub right: T,
}

impl<T> SidePair<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Side, T) -> U) -> SidePair<U> {
        SidePair {
            left: f(Side::Left, self.left),
            right: f(Side::Right, self.right),
        }
    }
}
