//! move_to / move_above：把手移到具名物体处
//!
//! 目标位姿 = 接触点 + 夹爪状态相关的横向偏移 + 调用方请求的偏移。
//! 没有显式偏移时先经过外侧 3 cm 的预备位姿再到目标。
//! 托举（Hold_Up）中的手只能把托着的物体推向重叠区，这一分支由 [`push::push_held`] 实现。

use std::collections::BTreeMap;

use async_trait::async_trait;
use nalgebra::Vector3;

use super::context::SkillContext;
use super::push;
use super::registry::{Completed, Skill};
use super::types::Offset;
use crate::core::{Gripper, ObjectKind, Orientation, Region, SkillError};

/// 无偏移时预备位姿的横向距离
const APPROACH_LATERAL: f64 = 0.03;

/// 解析可选的 offset 参数
fn parse_offset(params: &BTreeMap<String, String>) -> Result<Option<Offset>, SkillError> {
    params.get("offset").map(|s| s.parse()).transpose()
}

/// 夹爪状态决定的横向（以及 PointAt 的前后、上下）偏移
fn grip_offset(ctx: &SkillContext, kind: ObjectKind, offsets: &[Offset]) -> Vector3<f64> {
    let s = ctx.sign();
    let lateral = |d: f64| Vector3::new(0.0, s * d, 0.0);
    match ctx.state.gripper {
        Gripper::PointAt => Vector3::new(-0.03, s * 0.05, 0.09),
        Gripper::Closed if kind == ObjectKind::RegionMarker => {
            if offsets.contains(&Offset::Up) {
                lateral(0.06)
            } else {
                lateral(0.1)
            }
        }
        Gripper::Closed => lateral(0.04),
        Gripper::Open if kind == ObjectKind::RegionMarker => lateral(0.02),
        Gripper::Open if kind == ObjectKind::OriginMarker => lateral(0.05),
        Gripper::Open | Gripper::HoldUp => Vector3::zeros(),
    }
}

/// 把手移到物体处；grasp 也复用它完成接近动作
pub(crate) async fn approach_object(
    ctx: &mut SkillContext,
    target: &str,
    requested: &[Offset],
) -> Result<Completed, SkillError> {
    let kind = ctx.kind(target);
    let position = ctx.locate_reachable(target).await?;
    let held = ctx.held_object().await?.map(|(_, name)| name);

    if ctx.state.gripper == Gripper::Closed && held.is_some() && kind == ObjectKind::Cup && requested.is_empty() {
        return Err(SkillError::AlreadyOccupied(format!(
            "{} is holding the {}, it can not be placed on the {} directly",
            ctx.hand(),
            held.as_deref().unwrap_or("object"),
            target
        )));
    }

    let mut offsets = requested.to_vec();
    if ctx.state.orientation == Orientation::HorizontallyDown && kind == ObjectKind::Bowl && offsets.is_empty() {
        offsets.push(Offset::Up);
    }

    let contact = ctx.contact_point(target, position).await?;
    let extra: Vector3<f64> = offsets.iter().map(|o| o.vector()).sum();
    let goal = contact + grip_offset(ctx, kind, &offsets) + extra;
    let orientation = ctx.state.orientation;

    if offsets.is_empty() {
        let approach = goal + ctx.side.outward() * APPROACH_LATERAL;
        ctx.set_pose(approach, orientation).await?;
    }
    ctx.set_pose(goal, orientation).await?;

    let above = offsets.contains(&Offset::Up);
    let place = if above { "moved above" } else { "moved to" };
    let narrative = match &held {
        Some(obj) => format!("{} has {place} the {target} with the {obj} grasped in the hand.", ctx.hand()),
        None => format!("{} has {place} the {target}.", ctx.hand()),
    };
    Ok(Completed::new(narrative).holding(held))
}

/// 托举中的 move_to：只允许进入重叠区；传感器检测到托着的物体时改为推送
async fn move_while_holding_up(
    ctx: &mut SkillContext,
    target: &str,
    offsets: &[Offset],
) -> Result<Completed, SkillError> {
    let position = ctx.locate(target).await?;
    if ctx.regions.region_of(position.y) != Region::Shared {
        return Err(SkillError::AlreadyOccupied(format!(
            "{} is holding up an object, it can only move it into the overlap area",
            ctx.hand()
        )));
    }
    match ctx.detected().await? {
        Some(handle) => push::push_held(ctx, handle, target).await,
        None => approach_object(ctx, target, offsets).await,
    }
}

pub struct MoveToSkill;

#[async_trait]
impl Skill for MoveToSkill {
    fn name(&self) -> &str {
        "move_to"
    }

    fn description(&self) -> &str {
        "Move the hand (and anything it holds) to the object. Optional offset: up, down, left, right."
    }

    fn required_params(&self) -> &[&'static str] {
        &["obj_name"]
    }

    fn optional_params(&self) -> &[&'static str] {
        &["offset"]
    }

    async fn execute(
        &self,
        ctx: &mut SkillContext,
        params: &BTreeMap<String, String>,
    ) -> Result<Completed, SkillError> {
        let target = params.get("obj_name").map(String::as_str).unwrap_or_default();
        let offsets: Vec<Offset> = parse_offset(params)?.into_iter().collect();
        if ctx.state.gripper == Gripper::HoldUp {
            move_while_holding_up(ctx, target, &offsets).await
        } else {
            approach_object(ctx, target, &offsets).await
        }
    }
}

pub struct MoveAboveSkill;

#[async_trait]
impl Skill for MoveAboveSkill {
    fn name(&self) -> &str {
        "move_above"
    }

    fn description(&self) -> &str {
        "Move the hand to a point above the object, e.g. to place or pour into it."
    }

    fn required_params(&self) -> &[&'static str] {
        &["obj_name"]
    }

    fn optional_params(&self) -> &[&'static str] {
        &["offset"]
    }

    async fn execute(
        &self,
        ctx: &mut SkillContext,
        params: &BTreeMap<String, String>,
    ) -> Result<Completed, SkillError> {
        let target = params.get("obj_name").map(String::as_str).unwrap_or_default();
        if ctx.kind(target) == ObjectKind::ServePoint {
            return Err(SkillError::InvalidTarget(
                "You can not move above the serve point!".to_string(),
            ));
        }
        let mut offsets = vec![Offset::Up];
        offsets.extend(parse_offset(params)?.filter(|o| *o != Offset::Up));
        if ctx.state.gripper == Gripper::HoldUp {
            move_while_holding_up(ctx, target, &offsets).await
        } else {
            approach_object(ctx, target, &offsets).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::SkillsSection;
    use crate::core::{ArmState, RegionPolicy, Side};
    use crate::sim::{ObjectSpec, SceneSimulator, Simulator};

    fn ctx(side: Side, state: ArmState, sim: Arc<SceneSimulator>) -> SkillContext {
        SkillContext::new(side, state, sim, Arc::new(SkillsSection::default()), RegionPolicy::default())
    }

    fn params(obj: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("obj_name".to_string(), obj.to_string())])
    }

    fn scene() -> Arc<SceneSimulator> {
        let sim = Arc::new(SceneSimulator::new());
        sim.add_object(ObjectSpec::container("Bowl", [0.6, 0.3, 0.81])).unwrap();
        sim.add_side_anchors("Bowl", 0.1).unwrap();
        sim.add_object(ObjectSpec::marker("overlap_area", [0.6, 0.0, 0.81])).unwrap();
        sim.add_object(ObjectSpec::marker("serve_point", [0.6, 0.0, 1.0])).unwrap();
        sim
    }

    #[tokio::test]
    async fn test_move_to_side_anchor_with_approach() {
        let sim = scene();
        let mut c = ctx(Side::Left, ArmState::INITIAL, sim.clone());
        let done = MoveToSkill.execute(&mut c, &params("Bowl")).await.unwrap();
        assert_eq!(done.narrative, "The robot's left hand has moved to the Bowl.");
        let at = sim.gripper_pose(Side::Left).unwrap().position;
        assert!((at - Vector3::new(0.6, 0.4, 0.81)).norm() < 1e-9);
        // 预备位姿 + 目标位姿
        assert_eq!(sim.commands().len(), 2);
    }

    #[tokio::test]
    async fn test_move_to_with_offset_goes_directly() {
        let sim = scene();
        let mut c = ctx(Side::Left, ArmState::INITIAL, sim.clone());
        let mut p = params("Bowl");
        p.insert("offset".into(), "up".into());
        MoveToSkill.execute(&mut c, &p).await.unwrap();
        assert_eq!(sim.commands().len(), 1);
        let at = sim.gripper_pose(Side::Left).unwrap().position;
        assert!((at.z - 0.99).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_right_hand_cannot_reach_left_area() {
        let sim = scene();
        let mut c = ctx(Side::Right, ArmState::INITIAL, sim.clone());
        let err = MoveToSkill.execute(&mut c, &params("Bowl")).await.unwrap_err();
        assert!(matches!(err, SkillError::OutOfArea(_)));
        assert!(sim.commands().is_empty());
    }

    #[tokio::test]
    async fn test_missing_object() {
        let sim = scene();
        let mut c = ctx(Side::Left, ArmState::INITIAL, sim);
        let err = MoveToSkill.execute(&mut c, &params("Pear")).await.unwrap_err();
        assert!(matches!(err, SkillError::ObjectNotFound(_)));
    }

    #[tokio::test]
    async fn test_move_above_rejects_serve_point() {
        let sim = scene();
        let mut c = ctx(Side::Left, ArmState::INITIAL, sim);
        let err = MoveAboveSkill
            .execute(&mut c, &params("serve_point"))
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::InvalidTarget(_)));
    }

    #[tokio::test]
    async fn test_open_hand_offset_on_overlap_area() {
        let sim = scene();
        let mut c = ctx(Side::Right, ArmState::INITIAL, sim.clone());
        MoveAboveSkill.execute(&mut c, &params("overlap_area")).await.unwrap();
        let at = sim.gripper_pose(Side::Right).unwrap().position;
        assert!((at - Vector3::new(0.6, -0.02, 0.99)).norm() < 1e-9);
    }

    #[tokio::test]
    async fn test_hold_up_cannot_leave_overlap_area() {
        let sim = scene();
        let state = ArmState::new(Orientation::HorizontallySlantedUp, Gripper::HoldUp);
        let mut c = ctx(Side::Left, state, sim);
        let err = MoveToSkill.execute(&mut c, &params("Bowl")).await.unwrap_err();
        assert!(matches!(err, SkillError::AlreadyOccupied(_)));
    }

    #[tokio::test]
    async fn test_hold_up_without_detection_moves_plainly() {
        let sim = scene();
        let state = ArmState::new(Orientation::HorizontallySlantedUp, Gripper::HoldUp);
        let mut c = ctx(Side::Left, state, sim.clone());
        let done = MoveToSkill.execute(&mut c, &params("overlap_area")).await.unwrap();
        assert!(done.narrative.contains("moved to the overlap_area"));
        assert_eq!(c.state, state);
        let bowl = sim.object_pose("Bowl").await.unwrap();
        assert!((bowl.y - 0.3).abs() < 1e-9);
    }
}
