//! 确定性内存场景：SceneSimulator
//!
//! 运动学替身，不做动力学，只维护：
//! - 具名物体的世界坐标、父子关系（世界 / 夹爪 / 另一物体）、冻结与可检测标记；
//! - 锚点标记（`<obj>_left`、`<obj>_right`、`<obj>_top`），作为所属物体的子节点随之移动；
//! - 两侧末端位姿，移动夹爪时拖动挂在其下的整棵子树；
//! - `step()`：未冻结、挂在世界下的实体落入下方的容器，否则落回初始高度。
//!
//! 每条写指令都会记入命令日志，测试可据此断言；`disconnect()` 用于注入链路故障。

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use nalgebra::{Vector3, Vector2};

use super::{ObjectHandle, Parent, Pose, Simulator};
use crate::core::{Orientation, SidePair, SimError, Side};

/// 接近传感器的检测半径
const PROXIMITY_RADIUS: f64 = 0.05;
/// 落入容器时的水平捕获半径
const SETTLE_RADIUS: f64 = 0.1;
/// 容器至少要比物体低这么多才算“在下方”
const SETTLE_MIN_DROP: f64 = 0.05;
/// 落入容器后相对容器原点的高度
const SETTLE_LIFT: f64 = 0.02;

const RESPONDABLE_SUFFIX: &str = "_respondable";

/// 记录下来的写指令
#[derive(Clone, Debug, PartialEq)]
pub enum SceneCommand {
    EndEffector { side: Side, position: Vector3<f64> },
    DualEndEffector { left: Vector3<f64>, right: Vector3<f64> },
    GripperJoints { side: Side, joints: Vec<f64>, blocking: bool },
    ArmJoints { side: Side, joints: Vec<f64> },
    SetParent { object: String, parent: Parent },
    Freeze { object: String, frozen: bool },
    Step,
}

/// 建场景用的物体描述
#[derive(Clone, Debug)]
pub struct ObjectSpec {
    name: String,
    position: Vector3<f64>,
    body: bool,
    detectable: bool,
    container: bool,
    frozen: bool,
    inside: Option<String>,
}

impl ObjectSpec {
    fn base(name: &str, position: [f64; 3]) -> Self {
        Self {
            name: name.to_string(),
            position: Vector3::from(position),
            body: true,
            detectable: true,
            container: false,
            frozen: false,
            inside: None,
        }
    }

    /// 普通可抓取物体
    pub fn item(name: &str, position: [f64; 3]) -> Self {
        Self::base(name, position)
    }

    /// 无实体的标记点（重叠区、递送点、手部原点）
    pub fn marker(name: &str, position: [f64; 3]) -> Self {
        Self {
            body: false,
            detectable: false,
            ..Self::base(name, position)
        }
    }

    /// 可以盛放其他物体的容器（碗、杯）
    pub fn container(name: &str, position: [f64; 3]) -> Self {
        Self {
            container: true,
            ..Self::base(name, position)
        }
    }

    /// 液体替代物：有实体但接近传感器检测不到
    pub fn liquid(name: &str, position: [f64; 3]) -> Self {
        Self {
            detectable: false,
            ..Self::base(name, position)
        }
    }

    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    /// 初始即挂在某个已存在物体之下
    pub fn inside(mut self, parent: &str) -> Self {
        self.inside = Some(parent.to_string());
        self
    }
}

#[derive(Clone, Debug)]
struct SceneObject {
    name: String,
    position: Vector3<f64>,
    rest_z: f64,
    parent: Parent,
    body: bool,
    detectable: bool,
    container: bool,
    frozen: bool,
}

struct SceneState {
    objects: BTreeMap<ObjectHandle, SceneObject>,
    names: HashMap<String, ObjectHandle>,
    grippers: SidePair<Pose>,
    finger_joints: SidePair<Vec<f64>>,
    arm_joints: SidePair<Vec<f64>>,
    commands: Vec<SceneCommand>,
    next_handle: u64,
    connected: bool,
}

impl SceneState {
    fn object(&self, handle: ObjectHandle) -> Result<&SceneObject, SimError> {
        self.objects
            .get(&handle)
            .ok_or(SimError::UnknownHandle(handle.0))
    }

    fn name_of(&self, handle: ObjectHandle) -> String {
        self.objects
            .get(&handle)
            .map(|o| o.name.clone())
            .unwrap_or_else(|| format!("#{}", handle.0))
    }

    fn resolve(&self, name: &str) -> Result<ObjectHandle, SimError> {
        let stripped = name.strip_suffix(RESPONDABLE_SUFFIX).unwrap_or(name);
        self.names
            .get(stripped)
            .copied()
            .ok_or_else(|| SimError::ObjectNotFound(name.to_string()))
    }

    /// 沿父链向上，判断 handle 是否挂在 root 之下（含自身）；父链成环时按“否”处理
    fn descends_from(&self, handle: ObjectHandle, root: ObjectHandle) -> bool {
        let mut current = handle;
        for _ in 0..=self.objects.len() {
            if current == root {
                return true;
            }
            match self.objects.get(&current).map(|o| o.parent) {
                Some(Parent::Object(p)) => current = p,
                _ => return false,
            }
        }
        false
    }

    /// 物体最终挂在哪一侧夹爪上
    fn gripper_of(&self, handle: ObjectHandle) -> Option<Side> {
        let mut current = handle;
        for _ in 0..=self.objects.len() {
            match self.objects.get(&current).map(|o| o.parent) {
                Some(Parent::Gripper(side)) => return Some(side),
                Some(Parent::Object(p)) => current = p,
                _ => return None,
            }
        }
        None
    }

    fn translate_subtree(&mut self, root: ObjectHandle, delta: Vector3<f64>) {
        let members: Vec<ObjectHandle> = self
            .objects
            .keys()
            .copied()
            .filter(|h| self.descends_from(*h, root))
            .collect();
        for h in members {
            if let Some(o) = self.objects.get_mut(&h) {
                o.position += delta;
            }
        }
    }

    fn move_gripper(&mut self, side: Side, pose: Pose) {
        let delta = pose.position - self.grippers.get(side).position;
        let carried: Vec<ObjectHandle> = self
            .objects
            .keys()
            .copied()
            .filter(|h| self.gripper_of(*h) == Some(side))
            .collect();
        for h in carried {
            if let Some(o) = self.objects.get_mut(&h) {
                o.position += delta;
            }
        }
        *self.grippers.get_mut(side) = pose;
    }

    /// 锚点：挂在物体下的无实体标记
    fn anchors_of(&self, handle: ObjectHandle) -> impl Iterator<Item = &SceneObject> + '_ {
        self.objects
            .values()
            .filter(move |o| !o.body && o.parent == Parent::Object(handle))
    }

    fn sense(&self, side: Side) -> Option<ObjectHandle> {
        let attached = self
            .objects
            .iter()
            .find(|(_, o)| o.body && o.parent == Parent::Gripper(side))
            .map(|(h, _)| *h);
        if attached.is_some() {
            return attached;
        }

        let at = self.grippers.get(side).position;
        self.objects
            .iter()
            .filter(|(_, o)| o.body && o.detectable)
            .filter_map(|(h, o)| {
                let nearest = self
                    .anchors_of(*h)
                    .map(|a| (a.position - at).norm())
                    .fold((o.position - at).norm(), f64::min);
                (nearest <= PROXIMITY_RADIUS).then_some((*h, nearest))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(h, _)| h)
    }

    fn settle(&mut self) {
        let falling: Vec<ObjectHandle> = self
            .objects
            .iter()
            .filter(|(_, o)| o.body && !o.frozen && o.parent == Parent::World)
            .map(|(h, _)| *h)
            .collect();

        for h in falling {
            let Some(body) = self.objects.get(&h).cloned() else {
                continue;
            };
            let xy = Vector2::new(body.position.x, body.position.y);
            let below = self
                .objects
                .iter()
                .filter(|(c, o)| {
                    **c != h
                        && o.container
                        && !self.descends_from(**c, h)
                        && o.position.z < body.position.z - SETTLE_MIN_DROP
                })
                .map(|(c, o)| (*c, o.position, (Vector2::new(o.position.x, o.position.y) - xy).norm()))
                .filter(|(_, _, d)| *d <= SETTLE_RADIUS)
                .min_by(|a, b| a.2.total_cmp(&b.2));

            match below {
                Some((container, at, _)) => {
                    let dz = at.z + SETTLE_LIFT - body.position.z;
                    self.translate_subtree(h, Vector3::new(0.0, 0.0, dz));
                    if let Some(o) = self.objects.get_mut(&h) {
                        o.parent = Parent::Object(container);
                    }
                }
                None if body.position.z > body.rest_z => {
                    let dz = body.rest_z - body.position.z;
                    self.translate_subtree(h, Vector3::new(0.0, 0.0, dz));
                }
                None => {}
            }
        }
    }
}

/// 内存场景仿真器
pub struct SceneSimulator {
    state: Mutex<SceneState>,
}

impl Default for SceneSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneSimulator {
    /// 空场景，两臂位于初始位姿
    pub fn new() -> Self {
        let grippers = SidePair::new(Self::home_pose(Side::Left), Self::home_pose(Side::Right));
        Self {
            state: Mutex::new(SceneState {
                objects: BTreeMap::new(),
                names: HashMap::new(),
                grippers,
                finger_joints: SidePair::default(),
                arm_joints: SidePair::default(),
                commands: Vec::new(),
                next_handle: 1,
                connected: true,
            }),
        }
    }

    /// 该侧的初始末端位姿
    pub fn home_pose(side: Side) -> Pose {
        Pose::new(
            Vector3::new(0.3, 0.5 * side.sign(), 1.1),
            Orientation::Vertical.quaternion(side),
        )
    }

    fn lock(&self) -> Result<MutexGuard<'_, SceneState>, SimError> {
        self.state
            .lock()
            .map_err(|_| SimError::LinkDown("scene state poisoned".to_string()))
    }

    fn connected(&self) -> Result<MutexGuard<'_, SceneState>, SimError> {
        let guard = self.lock()?;
        if guard.connected {
            Ok(guard)
        } else {
            Err(SimError::LinkDown("simulator disconnected".to_string()))
        }
    }

    /// 加入物体；`inside` 指向的父物体必须已存在
    pub fn add_object(&self, spec: ObjectSpec) -> Result<ObjectHandle, SimError> {
        let mut s = self.lock()?;
        let parent = match spec.inside.as_deref() {
            Some(p) => Parent::Object(s.resolve(p)?),
            None => Parent::World,
        };
        let handle = ObjectHandle(s.next_handle);
        s.next_handle += 1;
        s.names.insert(spec.name.clone(), handle);
        s.objects.insert(
            handle,
            SceneObject {
                name: spec.name,
                rest_z: spec.position.z,
                position: spec.position,
                parent,
                body: spec.body,
                detectable: spec.detectable,
                container: spec.container,
                frozen: spec.frozen,
            },
        );
        Ok(handle)
    }

    /// 在物体上挂一个锚点 `<owner>_<suffix>`，位置为物体位置加 offset
    pub fn add_anchor(&self, owner: &str, suffix: &str, offset: [f64; 3]) -> Result<ObjectHandle, SimError> {
        let at = {
            let s = self.lock()?;
            let h = s.resolve(owner)?;
            s.object(h)?.position + Vector3::from(offset)
        };
        let name = format!("{owner}_{suffix}");
        self.add_object(ObjectSpec::marker(&name, [at.x, at.y, at.z]).inside(owner))
    }

    /// 左右两侧锚点，横向间距 ±lateral
    pub fn add_side_anchors(&self, owner: &str, lateral: f64) -> Result<(), SimError> {
        self.add_anchor(owner, "left", [0.0, lateral, 0.0])?;
        self.add_anchor(owner, "right", [0.0, -lateral, 0.0])?;
        Ok(())
    }

    /// 断开链路：之后所有仿真调用都返回 LinkDown
    pub fn disconnect(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.connected = false;
        }
    }

    pub fn reconnect(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.connected = true;
        }
    }

    pub fn position_of(&self, name: &str) -> Option<Vector3<f64>> {
        let s = self.state.lock().ok()?;
        let h = s.resolve(name).ok()?;
        s.objects.get(&h).map(|o| o.position)
    }

    /// 父节点的名字（世界返回 "world"，夹爪返回 "<side>_gripper"）
    pub fn parent_of(&self, name: &str) -> Option<String> {
        let s = self.state.lock().ok()?;
        let h = s.resolve(name).ok()?;
        let label = match s.objects.get(&h)?.parent {
            Parent::World => "world".to_string(),
            Parent::Gripper(side) => format!("{side}_gripper"),
            Parent::Object(p) => s.name_of(p),
        };
        Some(label)
    }

    pub fn is_frozen(&self, name: &str) -> Option<bool> {
        let s = self.state.lock().ok()?;
        let h = s.resolve(name).ok()?;
        s.objects.get(&h).map(|o| o.frozen)
    }

    pub fn gripper_pose(&self, side: Side) -> Option<Pose> {
        self.state.lock().ok().map(|s| *s.grippers.get(side))
    }

    pub fn finger_joints(&self, side: Side) -> Vec<f64> {
        self.state
            .lock()
            .map(|s| s.finger_joints.get(side).clone())
            .unwrap_or_default()
    }

    pub fn arm_joints(&self, side: Side) -> Vec<f64> {
        self.state
            .lock()
            .map(|s| s.arm_joints.get(side).clone())
            .unwrap_or_default()
    }

    pub fn commands(&self) -> Vec<SceneCommand> {
        self.state
            .lock()
            .map(|s| s.commands.clone())
            .unwrap_or_default()
    }

    pub fn clear_commands(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.commands.clear();
        }
    }
}

#[async_trait]
impl Simulator for SceneSimulator {
    async fn resolve(&self, name: &str) -> Result<ObjectHandle, SimError> {
        self.connected()?.resolve(name)
    }

    async fn object_position(&self, handle: ObjectHandle) -> Result<Vector3<f64>, SimError> {
        Ok(self.connected()?.object(handle)?.position)
    }

    async fn object_alias(&self, handle: ObjectHandle) -> Result<String, SimError> {
        let s = self.connected()?;
        let name = &s.object(handle)?.name;
        Ok(name
            .strip_suffix(RESPONDABLE_SUFFIX)
            .unwrap_or(name)
            .to_string())
    }

    async fn end_effector_pose(&self, side: Side) -> Result<Pose, SimError> {
        Ok(*self.connected()?.grippers.get(side))
    }

    async fn set_end_effector_pose(&self, side: Side, pose: Pose) -> Result<(), SimError> {
        let mut s = self.connected()?;
        s.move_gripper(side, pose);
        s.commands.push(SceneCommand::EndEffector {
            side,
            position: pose.position,
        });
        Ok(())
    }

    async fn set_dual_end_effector_pose(&self, left: Pose, right: Pose) -> Result<(), SimError> {
        let mut s = self.connected()?;
        s.move_gripper(Side::Left, left);
        s.move_gripper(Side::Right, right);
        s.commands.push(SceneCommand::DualEndEffector {
            left: left.position,
            right: right.position,
        });
        Ok(())
    }

    async fn set_gripper_joints(&self, side: Side, joints: &[f64], blocking: bool) -> Result<(), SimError> {
        let mut s = self.connected()?;
        *s.finger_joints.get_mut(side) = joints.to_vec();
        s.commands.push(SceneCommand::GripperJoints {
            side,
            joints: joints.to_vec(),
            blocking,
        });
        Ok(())
    }

    /// 关节轨迹只在回到初始位姿时使用，因此末端直接落到 home 位姿
    async fn set_arm_joints(&self, side: Side, joints: &[f64]) -> Result<(), SimError> {
        let mut s = self.connected()?;
        *s.arm_joints.get_mut(side) = joints.to_vec();
        s.move_gripper(side, Self::home_pose(side));
        s.commands.push(SceneCommand::ArmJoints {
            side,
            joints: joints.to_vec(),
        });
        Ok(())
    }

    async fn read_proximity_sensor(&self, side: Side) -> Result<Option<ObjectHandle>, SimError> {
        Ok(self.connected()?.sense(side))
    }

    async fn set_object_parent(&self, handle: ObjectHandle, parent: Parent) -> Result<(), SimError> {
        let mut s = self.connected()?;
        if let Parent::Object(p) = parent {
            s.object(p)?;
            if s.descends_from(p, handle) {
                return Err(SimError::UnknownHandle(p.0));
            }
        }
        let name = {
            let o = s
                .objects
                .get_mut(&handle)
                .ok_or(SimError::UnknownHandle(handle.0))?;
            o.parent = parent;
            o.name.clone()
        };
        s.commands.push(SceneCommand::SetParent { object: name, parent });
        Ok(())
    }

    async fn freeze(&self, handle: ObjectHandle, frozen: bool) -> Result<(), SimError> {
        let mut s = self.connected()?;
        let name = {
            let o = s
                .objects
                .get_mut(&handle)
                .ok_or(SimError::UnknownHandle(handle.0))?;
            o.frozen = frozen;
            o.name.clone()
        };
        s.commands.push(SceneCommand::Freeze { object: name, frozen });
        Ok(())
    }

    async fn step(&self) -> Result<(), SimError> {
        let mut s = self.connected()?;
        s.settle();
        s.commands.push(SceneCommand::Step);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> SceneSimulator {
        let sim = SceneSimulator::new();
        sim.add_object(ObjectSpec::container("Bowl", [0.6, 0.3, 0.81])).unwrap();
        sim.add_side_anchors("Bowl", 0.1).unwrap();
        sim.add_object(ObjectSpec::item("Apple", [0.3, 0.5, 0.82])).unwrap();
        sim.add_object(ObjectSpec::marker("serve_point", [0.6, 0.0, 1.0])).unwrap();
        sim
    }

    #[tokio::test]
    async fn test_resolve_and_alias() {
        let sim = scene();
        let h = sim.resolve("Apple").await.unwrap();
        assert_eq!(sim.resolve("Apple_respondable").await.unwrap(), h);
        assert_eq!(sim.object_alias(h).await.unwrap(), "Apple");
        assert_eq!(
            sim.resolve("Pear").await,
            Err(SimError::ObjectNotFound("Pear".into()))
        );
    }

    #[tokio::test]
    async fn test_anchor_follows_owner() {
        let sim = scene();
        let anchor = sim.object_pose("Bowl_left").await.unwrap();
        assert!((anchor.y - 0.4).abs() < 1e-9);
        assert_eq!(sim.parent_of("Bowl_left").as_deref(), Some("Bowl"));
    }

    #[tokio::test]
    async fn test_proximity_sees_anchor_and_attached_object() {
        let sim = scene();
        let anchor = sim.object_pose("Bowl_left").await.unwrap();
        let q = Orientation::Vertical.quaternion(Side::Left);
        sim.set_end_effector_pose(Side::Left, Pose::new(anchor, q)).await.unwrap();
        let bowl = sim.resolve("Bowl").await.unwrap();
        assert_eq!(sim.read_proximity_sensor(Side::Left).await.unwrap(), Some(bowl));

        let apple = sim.resolve("Apple").await.unwrap();
        sim.set_object_parent(apple, Parent::Gripper(Side::Left)).await.unwrap();
        assert_eq!(sim.read_proximity_sensor(Side::Left).await.unwrap(), Some(apple));
        assert_eq!(sim.read_proximity_sensor(Side::Right).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_gripper_drags_attached_subtree() {
        let sim = scene();
        let bowl = sim.resolve("Bowl").await.unwrap();
        sim.set_object_parent(bowl, Parent::Gripper(Side::Left)).await.unwrap();
        let start = sim.gripper_pose(Side::Left).unwrap();
        sim.set_end_effector_pose(Side::Left, start.translated(Vector3::new(0.0, -0.1, 0.2)))
            .await
            .unwrap();
        let moved = sim.position_of("Bowl").unwrap();
        assert!((moved - Vector3::new(0.6, 0.2, 1.01)).norm() < 1e-9);
        let anchor = sim.position_of("Bowl_left").unwrap();
        assert!((anchor.y - 0.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_step_settles_into_container_below() {
        let sim = scene();
        let apple = sim.resolve("Apple").await.unwrap();
        sim.set_object_parent(apple, Parent::Gripper(Side::Left)).await.unwrap();
        let start = sim.gripper_pose(Side::Left).unwrap();
        // 把苹果带到碗正上方 0.2 处
        let delta = Vector3::new(0.6, 0.3, 1.01) - Vector3::new(0.3, 0.5, 0.82);
        sim.set_end_effector_pose(Side::Left, start.translated(delta)).await.unwrap();
        sim.set_object_parent(apple, Parent::World).await.unwrap();
        sim.step().await.unwrap();
        assert_eq!(sim.parent_of("Apple").as_deref(), Some("Bowl"));
        let z = sim.position_of("Apple").unwrap().z;
        assert!((z - 0.83).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_step_drops_to_rest_height_and_respects_freeze() {
        let sim = scene();
        let apple = sim.resolve("Apple").await.unwrap();
        sim.set_object_parent(apple, Parent::Gripper(Side::Left)).await.unwrap();
        let start = sim.gripper_pose(Side::Left).unwrap();
        sim.set_end_effector_pose(Side::Left, start.translated(Vector3::new(0.0, 0.0, 0.1)))
            .await
            .unwrap();
        sim.set_object_parent(apple, Parent::World).await.unwrap();
        sim.freeze(apple, true).await.unwrap();
        sim.step().await.unwrap();
        assert!((sim.position_of("Apple").unwrap().z - 0.92).abs() < 1e-9);

        sim.freeze(apple, false).await.unwrap();
        sim.step().await.unwrap();
        assert!((sim.position_of("Apple").unwrap().z - 0.82).abs() < 1e-9);
        assert_eq!(sim.parent_of("Apple").as_deref(), Some("world"));
    }

    #[tokio::test]
    async fn test_parent_cycle_rejected() {
        let sim = scene();
        let bowl = sim.resolve("Bowl").await.unwrap();
        let anchor = sim.resolve("Bowl_left").await.unwrap();
        assert!(sim.set_object_parent(bowl, Parent::Object(anchor)).await.is_err());
    }

    #[tokio::test]
    async fn test_disconnect_is_link_down() {
        let sim = scene();
        sim.disconnect();
        let err = sim.object_pose("Apple").await.unwrap_err();
        assert!(err.is_fatal());
        sim.reconnect();
        assert!(sim.object_pose("Apple").await.is_ok());
    }

    #[tokio::test]
    async fn test_commands_are_logged() {
        let sim = scene();
        sim.set_gripper_joints(Side::Right, &[0.0; 5], true).await.unwrap();
        sim.step().await.unwrap();
        let cmds = sim.commands();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[1], SceneCommand::Step);
    }
}
