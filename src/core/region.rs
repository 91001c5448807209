//! 区域策略：按物体的 y 坐标划分左区 / 右区 / 重叠区
//!
//! 所有以具名物体为目标的技能在发出任何运动前都要先过这一关。

use serde::{Deserialize, Serialize};

use crate::core::Side;

/// 桌面可达区域
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// 仅左臂可达
    Left,
    /// 仅右臂可达
    Right,
    /// 重叠区，两臂都可达
    Shared,
}

impl Region {
    pub fn label(self) -> &'static str {
        match self {
            Region::Left => "left area",
            Region::Right => "right area",
            Region::Shared => "overlap area",
        }
    }
}

/// 区域阈值（默认 ±0.2 m）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionPolicy {
    pub left_threshold: f64,
    pub right_threshold: f64,
}

impl Default for RegionPolicy {
    fn default() -> Self {
        Self {
            left_threshold: 0.2,
            right_threshold: -0.2,
        }
    }
}

impl RegionPolicy {
    pub fn new(left_threshold: f64, right_threshold: f64) -> Self {
        Self {
            left_threshold,
            right_threshold,
        }
    }

    /// y > 左阈值 => Left；y < 右阈值 => Right；否则 Shared（边界值属于重叠区）
    pub fn region_of(&self, y: f64) -> Region {
        if y > self.left_threshold {
            Region::Left
        } else if y < self.right_threshold {
            Region::Right
        } else {
            Region::Shared
        }
    }

    /// 该侧能否作用于位于 y 的物体
    pub fn reaches(&self, side: Side, y: f64) -> bool {
        can_reach(side, self.region_of(y))
    }
}

/// 左臂可达 {Left, Shared}，右臂可达 {Right, Shared}
pub fn can_reach(side: Side, region: Region) -> bool {
    matches!(
        (side, region),
        (_, Region::Shared) | (Side::Left, Region::Left) | (Side::Right, Region::Right)
    )
}

/// 使用默认阈值的便捷函数
pub fn region_of(y: f64) -> Region {
    RegionPolicy::default().region_of(y)
}
