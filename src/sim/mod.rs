//! 仿真协作方接口
//!
//! 协调层只通过 [`Simulator`] 与物理仿真交互：查询物体位置、下发末端位姿与手指关节、
//! 读取接近传感器、修改父子关系与冻结物理。[`SceneSimulator`] 是确定性的内存实现。

pub mod scene;

use async_trait::async_trait;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::core::{SimError, Side};

pub use scene::{ObjectSpec, SceneCommand, SceneSimulator};

/// 场景物体句柄
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectHandle(pub u64);

/// 物体的父节点
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parent {
    World,
    /// 附着在某侧夹爪上
    Gripper(Side),
    Object(ObjectHandle),
}

/// 末端位姿：世界坐标 + 单位四元数
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// 平移后的新位姿，朝向不变
    pub fn translated(&self, delta: Vector3<f64>) -> Self {
        Self::new(self.position + delta, self.orientation)
    }
}

/// 仿真协作方；所有调用对发起侧都是阻塞式的，完成后才返回
#[async_trait]
pub trait Simulator: Send + Sync {
    /// 名字 -> 句柄；不存在返回 ObjectNotFound
    async fn resolve(&self, name: &str) -> Result<ObjectHandle, SimError>;

    async fn object_position(&self, handle: ObjectHandle) -> Result<Vector3<f64>, SimError>;

    /// 句柄对应的物体名（去掉 `_respondable` 后缀）
    async fn object_alias(&self, handle: ObjectHandle) -> Result<String, SimError>;

    async fn end_effector_pose(&self, side: Side) -> Result<Pose, SimError>;

    async fn set_end_effector_pose(&self, side: Side, pose: Pose) -> Result<(), SimError>;

    /// 双臂同一拍下发的成对位姿指令
    async fn set_dual_end_effector_pose(&self, left: Pose, right: Pose) -> Result<(), SimError>;

    async fn set_gripper_joints(
        &self,
        side: Side,
        joints: &[f64],
        blocking: bool,
    ) -> Result<(), SimError>;

    async fn set_arm_joints(&self, side: Side, joints: &[f64]) -> Result<(), SimError>;

    /// 夹爪接近传感器；未检测到返回 None
    async fn read_proximity_sensor(&self, side: Side) -> Result<Option<ObjectHandle>, SimError>;

    async fn set_object_parent(&self, handle: ObjectHandle, parent: Parent) -> Result<(), SimError>;

    async fn freeze(&self, handle: ObjectHandle, frozen: bool) -> Result<(), SimError>;

    /// 推进一拍物理，让松开的物体落定
    async fn step(&self) -> Result<(), SimError>;

    /// 按名字查询位置
    async fn object_pose(&self, name: &str) -> Result<Vector3<f64>, SimError> {
        let handle = self.resolve(name).await?;
        self.object_position(handle).await
    }
}
