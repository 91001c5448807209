//! 技能执行上下文：一侧的工作状态副本加上访问仿真的辅助方法
//!
//! 技能只修改 `state` 这份工作副本；执行器在技能成功后才提交它。

use std::sync::Arc;

use nalgebra::Vector3;

use super::types::Direction;
use crate::config::SkillsSection;
use crate::core::{ArmState, Gripper, ObjectKind, Orientation, RegionPolicy, Side, SkillError};
use crate::sim::{ObjectHandle, Parent, Pose, Simulator};

/// 张开手指的关节角
pub const OPEN_HAND_JOINTS: [f64; 5] = [-std::f64::consts::PI; 5];

pub struct SkillContext {
    pub side: Side,
    pub state: ArmState,
    pub sim: Arc<dyn Simulator>,
    pub settings: Arc<SkillsSection>,
    pub regions: RegionPolicy,
}

impl SkillContext {
    pub fn new(
        side: Side,
        state: ArmState,
        sim: Arc<dyn Simulator>,
        settings: Arc<SkillsSection>,
        regions: RegionPolicy,
    ) -> Self {
        Self {
            side,
            state,
            sim,
            settings,
            regions,
        }
    }

    /// 横向符号：左 +1，右 -1
    pub fn sign(&self) -> f64 {
        self.side.sign()
    }

    pub fn kind(&self, name: &str) -> ObjectKind {
        ObjectKind::classify(name, &self.settings)
    }

    /// 叙述里的主语
    pub fn hand(&self) -> String {
        format!("The robot's {} hand", self.side)
    }

    /// 查询物体当前位置；每次调用都重新读取
    pub async fn locate(&self, name: &str) -> Result<Vector3<f64>, SkillError> {
        Ok(self.sim.object_pose(name).await?)
    }

    pub fn ensure_reachable(&self, name: &str, position: &Vector3<f64>) -> Result<(), SkillError> {
        if self.regions.reaches(self.side, position.y) {
            Ok(())
        } else {
            let region = self.regions.region_of(position.y);
            Err(SkillError::OutOfArea(format!(
                "The {name} is in the {}, which is out of reach of the robot's {} hand",
                region.label(),
                self.side
            )))
        }
    }

    /// 定位并做区域检查
    pub async fn locate_reachable(&self, name: &str) -> Result<Vector3<f64>, SkillError> {
        let position = self.locate(name).await?;
        self.ensure_reachable(name, &position)?;
        Ok(position)
    }

    /// 锚点 `<name>_<suffix>` 的位置；不存在返回 None，链路故障照常上抛
    pub async fn anchor(&self, name: &str, suffix: &str) -> Result<Option<Vector3<f64>>, SkillError> {
        match self.sim.object_pose(&format!("{name}_{suffix}")).await {
            Ok(p) => Ok(Some(p)),
            Err(e) if e.is_fatal() => Err(SkillError::Sim(e)),
            Err(_) => Ok(None),
        }
    }

    /// 手部在当前朝向下的接触点：竖直手取侧面锚点，顶抓手取顶部锚点（缺省时略高于物体原点）
    pub async fn contact_point(&self, name: &str, position: Vector3<f64>) -> Result<Vector3<f64>, SkillError> {
        if self.state.orientation == Orientation::HorizontallyDown {
            let top = self.anchor(name, "top").await?;
            Ok(top.unwrap_or(position + Vector3::new(0.0, 0.0, 0.015)))
        } else {
            let lateral = self.anchor(name, self.side.label()).await?;
            Ok(lateral.unwrap_or(position))
        }
    }

    pub async fn eef(&self) -> Result<Pose, SkillError> {
        Ok(self.sim.end_effector_pose(self.side).await?)
    }

    /// 以给定朝向下发末端位姿
    pub async fn set_pose(&self, position: Vector3<f64>, orientation: Orientation) -> Result<(), SkillError> {
        let pose = Pose::new(position, orientation.quaternion(self.side));
        Ok(self.sim.set_end_effector_pose(self.side, pose).await?)
    }

    /// 相对当前末端平移，各分量限制在 delta_move_max 以内
    pub async fn delta_move(&self, delta: Vector3<f64>) -> Result<(), SkillError> {
        let max = self.settings.delta_move_max;
        let clamped = delta.map(|d| d.clamp(-max, max));
        let pose = self.eef().await?;
        Ok(self
            .sim
            .set_end_effector_pose(self.side, pose.translated(clamped))
            .await?)
    }

    pub async fn nudge(&self, direction: Direction, distance: f64) -> Result<(), SkillError> {
        tracing::debug!(side = %self.side, %direction, distance, "delta move");
        self.delta_move(direction.unit() * distance).await
    }

    /// 远离中线方向（左手向左、右手向右）
    pub fn outward(&self) -> Direction {
        match self.side {
            Side::Left => Direction::Left,
            Side::Right => Direction::Right,
        }
    }

    pub fn inward(&self) -> Direction {
        match self.side {
            Side::Left => Direction::Right,
            Side::Right => Direction::Left,
        }
    }

    pub async fn detected(&self) -> Result<Option<ObjectHandle>, SkillError> {
        Ok(self.sim.read_proximity_sensor(self.side).await?)
    }

    /// 手里（按接近传感器）的物体；手张开时视为空手
    pub async fn held_object(&self) -> Result<Option<(ObjectHandle, String)>, SkillError> {
        if self.state.gripper == Gripper::Open {
            return Ok(None);
        }
        match self.detected().await? {
            Some(h) => Ok(Some((h, self.sim.object_alias(h).await?))),
            None => Ok(None),
        }
    }

    /// 冻结物理并挂到本侧夹爪上
    pub async fn attach(&self, handle: ObjectHandle) -> Result<(), SkillError> {
        self.sim.freeze(handle, true).await?;
        self.sim.set_object_parent(handle, Parent::Gripper(self.side)).await?;
        Ok(())
    }

    /// 挂回世界；unfreeze 为 true 时恢复物理
    pub async fn detach(&self, handle: ObjectHandle, unfreeze: bool) -> Result<(), SkillError> {
        self.sim.set_object_parent(handle, Parent::World).await?;
        if unfreeze {
            self.sim.freeze(handle, false).await?;
        }
        Ok(())
    }

    pub async fn open_hand(&self) -> Result<(), SkillError> {
        Ok(self
            .sim
            .set_gripper_joints(self.side, &OPEN_HAND_JOINTS, true)
            .await?)
    }

    /// 放下手里的东西并张开手指，不做撤离动作；返回放下的物体名
    pub async fn release_grip(&mut self) -> Result<Option<String>, SkillError> {
        let held = self.held_object().await?;
        if let Some((handle, _)) = &held {
            self.detach(*handle, true).await?;
        }
        self.open_hand().await?;
        self.state.gripper = Gripper::Open;
        Ok(held.map(|(_, name)| name))
    }
}
