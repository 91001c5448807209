//! pour_out：倾倒手中容器里的液体
//!
//! 先把腕部转到 Horizontally_Slanted_Down 并略微前移，放出液体替代物让它落定，
//! 再抬高 3 cm 回到 Vertical。

use std::collections::BTreeMap;

use async_trait::async_trait;
use nalgebra::Vector3;

use super::context::SkillContext;
use super::registry::{Completed, Skill};
use crate::core::{Orientation, SimError, SkillError};
use crate::sim::Parent;

pub struct PourOutSkill;

#[async_trait]
impl Skill for PourOutSkill {
    fn name(&self) -> &str {
        "pour_out"
    }

    fn description(&self) -> &str {
        "Tilt the grasped container to pour its content out, then turn the hand back upright."
    }

    async fn execute(
        &self,
        ctx: &mut SkillContext,
        _params: &BTreeMap<String, String>,
    ) -> Result<Completed, SkillError> {
        let liquid = match ctx.sim.resolve(&ctx.settings.liquid_object).await {
            Ok(h) => h,
            Err(SimError::ObjectNotFound(_)) => {
                return Err(SkillError::NoContent(
                    "There is no water inside the container!".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        };
        let held = ctx.held_object().await?.map(|(_, name)| name);

        let start = ctx.eef().await?.position;
        let tilted = start + Vector3::new(0.01, ctx.sign() * 0.015, 0.0);
        ctx.set_pose(tilted, Orientation::HorizontallySlantedDown).await?;

        ctx.sim.set_object_parent(liquid, Parent::World).await?;
        ctx.sim.freeze(liquid, false).await?;
        ctx.sim.step().await?;

        ctx.set_pose(tilted + Vector3::new(0.0, 0.0, 0.03), Orientation::Vertical)
            .await?;
        ctx.state.orientation = Orientation::Vertical;

        let narrative = match &held {
            Some(container) => format!(
                "{} has poured out the content of the {container}, and is still holding the {container}.",
                ctx.hand()
            ),
            None => format!("{} has poured out the content.", ctx.hand()),
        };
        Ok(Completed::new(narrative).holding(held))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::SkillsSection;
    use crate::core::{ArmState, Gripper, RegionPolicy, Side};
    use crate::sim::{ObjectSpec, SceneSimulator, Simulator};

    fn ctx(sim: Arc<SceneSimulator>) -> SkillContext {
        SkillContext::new(
            Side::Left,
            ArmState::new(Orientation::Vertical, Gripper::Closed),
            sim,
            Arc::new(SkillsSection::default()),
            RegionPolicy::default(),
        )
    }

    #[tokio::test]
    async fn test_no_liquid_in_scene() {
        let sim = Arc::new(SceneSimulator::new());
        let mut c = ctx(sim.clone());
        let err = PourOutSkill.execute(&mut c, &BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, SkillError::NoContent(_)));
        assert!(sim.commands().is_empty());
    }

    #[tokio::test]
    async fn test_pour_into_cup_below() {
        let sim = Arc::new(SceneSimulator::new());
        sim.add_object(ObjectSpec::container("yellow_cup", [0.31, 0.515, 0.85])).unwrap();
        sim.add_object(ObjectSpec::container("blue_cup", [0.3, 0.5, 1.1])).unwrap();
        sim.add_object(ObjectSpec::liquid("big_ball", [0.3, 0.5, 1.12]).frozen().inside("blue_cup"))
            .unwrap();
        let cup = sim.resolve("blue_cup").await.unwrap();
        sim.set_object_parent(cup, Parent::Gripper(Side::Left)).await.unwrap();

        let mut c = ctx(sim.clone());
        let done = PourOutSkill.execute(&mut c, &BTreeMap::new()).await.unwrap();
        assert!(done.narrative.contains("content of the blue_cup"));
        assert_eq!(c.state.orientation, Orientation::Vertical);
        assert_eq!(sim.parent_of("big_ball").as_deref(), Some("yellow_cup"));
        assert_eq!(sim.parent_of("blue_cup").as_deref(), Some("left_gripper"));
    }
}
