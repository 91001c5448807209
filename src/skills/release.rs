//! release：松手并撤离
//!
//! 手未张开时先向内收 2 cm，再放开物体（恢复物理）、张开手指、推进两拍物理让物体落定，
//! 最后按朝向撤离。手已张开时只做撤离动作，可重复调用。

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::context::SkillContext;
use super::registry::{Completed, Skill};
use super::types::Direction;
use crate::core::{Gripper, Orientation, SkillError};

const INWARD_BEFORE_RELEASE: f64 = 0.02;

/// 按朝向撤离：竖直手向上并外移，顶抓手两次上抬
async fn retract(ctx: &SkillContext) -> Result<(), SkillError> {
    match ctx.state.orientation {
        Orientation::Vertical => {
            ctx.delta_move(Direction::Up.unit() * 0.06 + ctx.outward().unit() * 0.03)
                .await
        }
        Orientation::HorizontallyDown => {
            ctx.nudge(Direction::Up, 0.08).await?;
            ctx.nudge(Direction::Up, 0.08).await
        }
        _ => ctx.nudge(Direction::Up, 0.06).await,
    }
}

/// 松手并撤离，返回放下的物体名；release 与 reset 共用
pub(crate) async fn let_go(ctx: &mut SkillContext) -> Result<Option<String>, SkillError> {
    let mut released = None;
    if ctx.state.gripper != Gripper::Open {
        ctx.nudge(ctx.inward(), INWARD_BEFORE_RELEASE).await?;
        released = ctx.release_grip().await?;
        ctx.sim.step().await?;
        ctx.sim.step().await?;
    }
    retract(ctx).await?;
    ctx.state.gripper = Gripper::Open;
    Ok(released)
}

pub struct ReleaseSkill;

#[async_trait]
impl Skill for ReleaseSkill {
    fn name(&self) -> &str {
        "release"
    }

    fn description(&self) -> &str {
        "Open the fingers to put down whatever the hand holds, then move the hand slightly away."
    }

    async fn execute(
        &self,
        ctx: &mut SkillContext,
        _params: &BTreeMap<String, String>,
    ) -> Result<Completed, SkillError> {
        let narrative = match let_go(ctx).await? {
            Some(obj) => format!("{} has released the {obj}.", ctx.hand()),
            None => format!("{} has opened the fingers, nothing is held in the hand.", ctx.hand()),
        };
        Ok(Completed::new(narrative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::SkillsSection;
    use crate::core::{ArmState, RegionPolicy, Side};
    use crate::sim::{ObjectSpec, Parent, SceneCommand, SceneSimulator, Simulator};

    fn ctx(side: Side, state: ArmState, sim: Arc<SceneSimulator>) -> SkillContext {
        SkillContext::new(side, state, sim, Arc::new(SkillsSection::default()), RegionPolicy::default())
    }

    #[tokio::test]
    async fn test_release_detaches_and_drops() {
        let sim = Arc::new(SceneSimulator::new());
        sim.add_object(ObjectSpec::item("red_block", [0.3, 0.5, 1.1]).frozen()).unwrap();
        let block = sim.resolve("red_block").await.unwrap();
        sim.set_object_parent(block, Parent::Gripper(Side::Left)).await.unwrap();
        let state = ArmState::new(Orientation::Vertical, Gripper::Closed);
        let mut c = ctx(Side::Left, state, sim.clone());

        let done = ReleaseSkill.execute(&mut c, &BTreeMap::new()).await.unwrap();
        assert_eq!(done.narrative, "The robot's left hand has released the red_block.");
        assert_eq!(c.state, ArmState::new(Orientation::Vertical, Gripper::Open));
        assert_eq!(sim.parent_of("red_block").as_deref(), Some("world"));
        assert_eq!(sim.is_frozen("red_block"), Some(false));
        // 向内收 2 cm 时被带走，随后撤离不再带动
        let block_at = sim.position_of("red_block").unwrap();
        assert!((block_at.y - 0.48).abs() < 1e-9);
        let hand = sim.gripper_pose(Side::Left).unwrap().position;
        assert!((hand.y - 0.51).abs() < 1e-9);
        assert!((hand.z - 1.16).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_release_open_hand_only_retracts() {
        let sim = Arc::new(SceneSimulator::new());
        let state = ArmState::new(Orientation::HorizontallyDown, Gripper::Open);
        let mut c = ctx(Side::Right, state, sim.clone());
        ReleaseSkill.execute(&mut c, &BTreeMap::new()).await.unwrap();
        let cmds = sim.commands();
        assert_eq!(cmds.len(), 2);
        assert!(cmds.iter().all(|c| matches!(c, SceneCommand::EndEffector { .. })));
        assert!((sim.gripper_pose(Side::Right).unwrap().position.z - 1.26).abs() < 1e-9);
    }
}
