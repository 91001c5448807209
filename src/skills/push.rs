//! push_to：把物体沿横向推向目标
//!
//! 有界收敛循环：每步先测源与目标的距离，低于阈值（或横向已对齐）即停，否则横向推一步；
//! 步数用尽也一定返回。结束后松开（不恢复物理）并向外撤离，手回到 {Vertical, Open}。

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use async_trait::async_trait;
use nalgebra::Vector3;

use super::context::SkillContext;
use super::registry::{Completed, Skill};
use crate::core::{
    converge_within, ArmState, Convergence, Gripper, ObjectKind, Orientation, Side, SimError,
    SkillError,
};
use crate::sim::{ObjectHandle, Simulator};

/// 接近与撤离时的外侧距离
const SIDE_CLEARANCE: f64 = 0.06;

/// 单步：测距，未到阈值则横向推 step。
/// 只能横向推，横向差已在阈值内时同样停止，否则方向会在目标两侧来回翻转。
async fn push_step(
    sim: Arc<dyn Simulator>,
    side: Side,
    source: ObjectHandle,
    target: Vector3<f64>,
    threshold: f64,
    step: f64,
) -> Result<ControlFlow<()>, SimError> {
    let at = sim.object_position(source).await?;
    let lateral = target.y - at.y;
    if (target - at).norm() < threshold || lateral.abs() < threshold {
        return Ok(ControlFlow::Break(()));
    }
    let toward = lateral.signum();
    let pose = sim.end_effector_pose(side).await?;
    sim.set_end_effector_pose(side, pose.translated(Vector3::new(0.0, toward * step, 0.0)))
        .await?;
    Ok(ControlFlow::Continue(()))
}

/// 目标合法性：不能是递送点，也不能比源物体高出太多
fn check_target(
    ctx: &SkillContext,
    source: &Vector3<f64>,
    target_name: &str,
    target: &Vector3<f64>,
) -> Result<(), SkillError> {
    if ctx.kind(target_name) == ObjectKind::ServePoint {
        return Err(SkillError::InvalidTarget(format!(
            "The {target_name} can not be the target of a push"
        )));
    }
    if target.z - source.z > ctx.settings.push_max_height_gap {
        return Err(SkillError::InvalidTarget(format!(
            "The {target_name} is too high above the object to push onto"
        )));
    }
    Ok(())
}

/// 推动已经挂在本侧夹爪上的物体，直到收敛或步数用尽，然后松开并撤离
async fn drive(
    ctx: &mut SkillContext,
    source: ObjectHandle,
    source_name: &str,
    target_name: &str,
    target: Vector3<f64>,
) -> Result<Completed, SkillError> {
    let sim = ctx.sim.clone();
    let side = ctx.side;
    let threshold = ctx.settings.push_distance_threshold;
    let step = ctx.settings.push_step.min(ctx.settings.delta_move_max);

    let outcome = converge_within(ctx.settings.push_max_steps, |_| {
        push_step(sim.clone(), side, source, target, threshold, step)
    })
    .await?;
    tracing::debug!(side = %side, source = source_name, steps = outcome.steps(), converged = outcome.converged(), "push loop finished");

    ctx.detach(source, false).await?;
    ctx.open_hand().await?;
    ctx.nudge(ctx.outward(), SIDE_CLEARANCE).await?;
    ctx.state = ArmState::new(Orientation::Vertical, Gripper::Open);

    let narrative = match outcome {
        Convergence::Converged { .. } => format!(
            "{} has pushed the {source_name} to the {target_name}.",
            ctx.hand()
        ),
        Convergence::Exhausted { steps } => format!(
            "{} has pushed the {source_name} towards the {target_name} for {steps} steps, but it has not reached the {target_name}.",
            ctx.hand()
        ),
    };
    Ok(Completed::new(narrative))
}

/// 托举中的手把托着的物体推向目标（move_to 的显式推送变体）
pub(crate) async fn push_held(
    ctx: &mut SkillContext,
    handle: ObjectHandle,
    target_name: &str,
) -> Result<Completed, SkillError> {
    let source_name = ctx.sim.object_alias(handle).await?;
    let source = ctx.sim.object_position(handle).await?;
    let target = ctx.locate(target_name).await?;
    check_target(ctx, &source, target_name, &target)?;
    tracing::info!(side = %ctx.side, source = %source_name, target = target_name, "holding up: move_to becomes push");
    drive(ctx, handle, &source_name, target_name, target).await
}

pub struct PushToSkill;

#[async_trait]
impl Skill for PushToSkill {
    fn name(&self) -> &str {
        "push_to"
    }

    fn description(&self) -> &str {
        "Push the source object sideways on the table towards the target object, e.g. into the overlap area."
    }

    fn required_params(&self) -> &[&'static str] {
        &["source_obj_name", "target_obj_name"]
    }

    async fn execute(
        &self,
        ctx: &mut SkillContext,
        params: &BTreeMap<String, String>,
    ) -> Result<Completed, SkillError> {
        let source_name = params.get("source_obj_name").map(String::as_str).unwrap_or_default();
        let target_name = params.get("target_obj_name").map(String::as_str).unwrap_or_default();

        if ctx.state.gripper == Gripper::Closed {
            if let Some((_, held)) = ctx.held_object().await? {
                return Err(SkillError::AlreadyOccupied(format!(
                    "{} is holding the {held}, release it before pushing",
                    ctx.hand()
                )));
            }
        }
        if ctx.kind(source_name) == ObjectKind::OriginMarker {
            return Err(SkillError::UnsupportedObject(format!(
                "The {source_name} can not be pushed"
            )));
        }

        let source = ctx.locate_reachable(source_name).await?;
        let target = ctx.locate(target_name).await?;
        check_target(ctx, &source, target_name, &target)?;
        let handle = ctx.sim.resolve(source_name).await?;

        ctx.release_grip().await?;
        ctx.state.orientation = Orientation::Vertical;
        let contact = ctx.contact_point(source_name, source).await?;
        ctx.set_pose(contact + ctx.side.outward() * SIDE_CLEARANCE, Orientation::Vertical)
            .await?;
        ctx.set_pose(contact, Orientation::Vertical).await?;
        ctx.attach(handle).await?;

        drive(ctx, handle, source_name, target_name, target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SkillsSection;
    use crate::core::RegionPolicy;
    use crate::sim::{ObjectSpec, SceneSimulator};

    fn ctx(side: Side, state: ArmState, sim: Arc<SceneSimulator>, settings: SkillsSection) -> SkillContext {
        SkillContext::new(side, state, sim, Arc::new(settings), RegionPolicy::default())
    }

    fn params(source: &str, target: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("source_obj_name".to_string(), source.to_string()),
            ("target_obj_name".to_string(), target.to_string()),
        ])
    }

    fn scene() -> Arc<SceneSimulator> {
        let sim = Arc::new(SceneSimulator::new());
        sim.add_object(ObjectSpec::container("Bowl", [0.6, 0.32, 0.81])).unwrap();
        sim.add_side_anchors("Bowl", 0.1).unwrap();
        sim.add_object(ObjectSpec::marker("overlap_area", [0.6, 0.0, 0.81])).unwrap();
        sim.add_object(ObjectSpec::marker("serve_point", [0.6, 0.0, 1.0])).unwrap();
        sim.add_object(ObjectSpec::marker("shelf", [0.6, 0.0, 1.2])).unwrap();
        sim.add_object(ObjectSpec::marker("Origin_left_hand", [0.3, 0.4, 0.81])).unwrap();
        sim
    }

    #[tokio::test]
    async fn test_push_converges_into_overlap_area() {
        let sim = scene();
        let mut c = ctx(Side::Left, ArmState::INITIAL, sim.clone(), SkillsSection::default());
        let done = PushToSkill
            .execute(&mut c, &params("Bowl", "overlap_area"))
            .await
            .unwrap();
        assert_eq!(done.narrative, "The robot's left hand has pushed the Bowl to the overlap_area.");
        let bowl = sim.position_of("Bowl").unwrap();
        assert!((bowl.y - 0.08).abs() < 1e-9);
        assert_eq!(sim.parent_of("Bowl").as_deref(), Some("world"));
        assert_eq!(c.state, ArmState::new(Orientation::Vertical, Gripper::Open));
    }

    #[tokio::test]
    async fn test_push_terminates_when_budget_runs_out() {
        let sim = scene();
        let settings = SkillsSection {
            push_max_steps: 2,
            ..SkillsSection::default()
        };
        let mut c = ctx(Side::Left, ArmState::INITIAL, sim.clone(), settings);
        let done = PushToSkill
            .execute(&mut c, &params("Bowl", "overlap_area"))
            .await
            .unwrap();
        assert!(done.narrative.contains("for 2 steps"));
        let bowl = sim.position_of("Bowl").unwrap();
        assert!((bowl.y - 0.20).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_push_stops_when_already_aligned_sideways() {
        let sim = scene();
        sim.add_object(ObjectSpec::item("red_block", [0.45, -0.1, 0.81])).unwrap();
        sim.add_object(ObjectSpec::marker("blue_mat", [0.7, -0.1, 0.81])).unwrap();
        let mut c = ctx(Side::Left, ArmState::INITIAL, sim.clone(), SkillsSection::default());
        let done = PushToSkill
            .execute(&mut c, &params("red_block", "blue_mat"))
            .await
            .unwrap();
        assert_eq!(done.narrative, "The robot's left hand has pushed the red_block to the blue_mat.");
        let block = sim.position_of("red_block").unwrap();
        assert!((block - Vector3::new(0.45, -0.1, 0.81)).norm() < 1e-9);
        assert_eq!(sim.parent_of("red_block").as_deref(), Some("world"));
    }

    #[tokio::test]
    async fn test_push_rejects_serve_point_and_high_targets() {
        let sim = scene();
        let mut c = ctx(Side::Left, ArmState::INITIAL, sim.clone(), SkillsSection::default());
        let err = PushToSkill
            .execute(&mut c, &params("Bowl", "serve_point"))
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::InvalidTarget(_)));
        let err = PushToSkill.execute(&mut c, &params("Bowl", "shelf")).await.unwrap_err();
        assert!(matches!(err, SkillError::InvalidTarget(_)));
        assert!(sim.commands().is_empty());
    }

    #[tokio::test]
    async fn test_push_rejects_origin_marker() {
        let sim = scene();
        let mut c = ctx(Side::Left, ArmState::INITIAL, sim, SkillsSection::default());
        let err = PushToSkill
            .execute(&mut c, &params("Origin_left_hand", "overlap_area"))
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::UnsupportedObject(_)));
    }

    #[tokio::test]
    async fn test_push_with_occupied_hand() {
        let sim = scene();
        sim.add_object(ObjectSpec::item("Apple", [0.3, 0.5, 1.1])).unwrap();
        let apple = sim.resolve("Apple").await.unwrap();
        sim.set_object_parent(apple, crate::sim::Parent::Gripper(Side::Left))
            .await
            .unwrap();
        let state = ArmState::new(Orientation::Vertical, Gripper::Closed);
        let mut c = ctx(Side::Left, state, sim, SkillsSection::default());
        let err = PushToSkill
            .execute(&mut c, &params("Bowl", "overlap_area"))
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::AlreadyOccupied(_)));
        assert_eq!(c.state, state);
    }
}
