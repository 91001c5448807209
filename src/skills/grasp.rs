//! move_and_grasp：侧抓（Vertical）或顶抓（Horizontally_Down）
//!
//! 到位后读接近传感器确认：检测不到物体则失败（此时手已张开，状态随之为 Open）；
//! 检测到则冻结并挂到夹爪上。

use std::collections::BTreeMap;
use std::f64::consts::PI;

use async_trait::async_trait;

use super::context::SkillContext;
use super::move_to::approach_object;
use super::registry::{Completed, Skill};
use crate::core::{uses_top_grasp, Gripper, ObjectKind, Orientation, SkillError};

/// 侧抓手指轨迹（逐行阻塞下发）
const SIDE_GRASP_JOINTS: [[f64; 5]; 3] = [
    [PI, -PI, -PI, -PI, -PI],
    [PI, -PI, -PI, -PI, -PI],
    [PI, -2.9, -1.8, -1.8, -1.8],
];

/// 顶抓手指轨迹
const TOP_GRASP_JOINTS: [[f64; 5]; 3] = [
    [PI, -PI, -PI, -PI, -PI],
    [PI, -PI / 2.0, -0.3, 0.0, 0.0],
    [PI, -2.0, -0.3, 0.0, 0.0],
];

pub struct GraspSkill;

impl GraspSkill {
    fn check_object(ctx: &SkillContext, name: &str) -> Result<(), SkillError> {
        let kind = ctx.kind(name);
        if kind == ObjectKind::Bowl || kind.is_marker() {
            return Err(SkillError::UnsupportedObject(format!(
                "The {name} can not be grasped by one hand"
            )));
        }
        Ok(())
    }

    /// 另一只手正接触着目标时，顶抓会与之冲突
    async fn check_other_hand(ctx: &SkillContext, name: &str) -> Result<(), SkillError> {
        let target = ctx.sim.resolve(name).await?;
        let other = ctx.side.other();
        if ctx.sim.read_proximity_sensor(other).await? == Some(target) {
            return Err(SkillError::AlreadyOccupied(format!(
                "The {name} is already taken by the robot's {other} hand"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Skill for GraspSkill {
    fn name(&self) -> &str {
        "move_and_grasp"
    }

    fn description(&self) -> &str {
        "Move the hand to the object and grasp it. Fruits are grasped from the top, other objects from the side."
    }

    fn required_params(&self) -> &[&'static str] {
        &["obj_name"]
    }

    async fn execute(
        &self,
        ctx: &mut SkillContext,
        params: &BTreeMap<String, String>,
    ) -> Result<Completed, SkillError> {
        let name = params.get("obj_name").map(String::as_str).unwrap_or_default();

        if ctx.state.gripper == Gripper::Closed {
            if let Some((_, held)) = ctx.held_object().await? {
                return Err(SkillError::AlreadyOccupied(format!(
                    "{} is already holding the {held}",
                    ctx.hand()
                )));
            }
        }
        Self::check_object(ctx, name)?;
        ctx.locate_reachable(name).await?;

        let top = uses_top_grasp(name, &ctx.settings);
        if top {
            Self::check_other_hand(ctx, name).await?;
        }

        ctx.release_grip().await?;
        ctx.state.orientation = if top {
            Orientation::HorizontallyDown
        } else {
            Orientation::Vertical
        };
        approach_object(ctx, name, &[]).await?;

        let trajectory = if top { &TOP_GRASP_JOINTS } else { &SIDE_GRASP_JOINTS };
        for joints in trajectory {
            ctx.sim.set_gripper_joints(ctx.side, joints, true).await?;
        }

        let Some(handle) = ctx.detected().await? else {
            return Err(SkillError::NothingDetected(format!(
                "{} did not detect anything to grasp at the {name}",
                ctx.hand()
            )));
        };
        ctx.attach(handle).await?;
        let grasped = ctx.sim.object_alias(handle).await?;
        ctx.state.gripper = Gripper::Closed;

        Ok(Completed::new(format!(
            "{} has grasped the {grasped}, and is holding the {grasped}.",
            ctx.hand()
        ))
        .holding(Some(grasped)))
    }
}
