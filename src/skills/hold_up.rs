//! hold_up：从侧面锚点托住大件物体（如碗）
//!
//! 经过三个路点接近锚点，手指摆成托举姿态，做一次向内上的微调后把物体挂到夹爪上。
//! 已处于托举状态时不再移动手臂，只重新挂接物体。

use std::collections::BTreeMap;
use std::f64::consts::PI;

use async_trait::async_trait;
use nalgebra::Vector3;

use super::context::SkillContext;
use super::registry::{Completed, Skill};
use crate::core::{ArmState, Gripper, ObjectKind, Orientation, SkillError};

/// 托举手指姿态
const CRADLE_JOINTS: [f64; 5] = [-PI, -PI, -0.75 * PI, -0.75 * PI, -0.75 * PI];

pub struct HoldUpSkill;

#[async_trait]
impl Skill for HoldUpSkill {
    fn name(&self) -> &str {
        "hold_up"
    }

    fn description(&self) -> &str {
        "Hold up a large object such as a bowl from its side. Two hands holding up the same object can carry it together."
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

        match ctx.kind(name) {
            ObjectKind::Cup => {
                return Err(SkillError::UnsupportedObject(format!(
                    "The {name} is too small to be held up, grasp it instead"
                )))
            }
            kind if kind.is_marker() => {
                return Err(SkillError::UnsupportedObject(format!(
                    "The {name} is not an object that can be held up"
                )))
            }
            _ => {}
        }
        if ctx.state.gripper == Gripper::Closed {
            if let Some((_, held)) = ctx.held_object().await? {
                return Err(SkillError::AlreadyOccupied(format!(
                    "{} is holding the {held}, release it before holding up the {name}",
                    ctx.hand()
                )));
            }
        }

        let orientation = Orientation::HorizontallySlantedUp;
        if ctx.state == ArmState::new(orientation, Gripper::HoldUp) {
            return refresh(ctx, name).await;
        }

        let position = ctx.locate_reachable(name).await?;
        let handle = ctx.sim.resolve(name).await?;
        let s = ctx.sign();
        let anchor = ctx
            .anchor(name, ctx.side.label())
            .await?
            .unwrap_or(position);

        let waypoints = [
            Vector3::new(0.6, s * 0.5, 1.1),
            anchor + Vector3::new(0.0, s * 0.01, 0.18),
            anchor + Vector3::new(0.0, s * 0.04, 0.0),
        ];
        for point in waypoints {
            ctx.set_pose(point, orientation).await?;
        }
        ctx.sim.set_gripper_joints(ctx.side, &CRADLE_JOINTS, true).await?;
        ctx.delta_move(Vector3::new(-0.03, -s * 0.07, 0.01)).await?;
        ctx.attach(handle).await?;

        ctx.state = ArmState::new(orientation, Gripper::HoldUp);
        Ok(Completed::new(format!("{} is holding up the {name}.", ctx.hand())).holding(Some(name.to_string())))
    }
}

/// 已在托举：不走轨迹，只确认托着的是同一物体并重新挂接
async fn refresh(ctx: &mut SkillContext, name: &str) -> Result<Completed, SkillError> {
    let handle = ctx.sim.resolve(name).await?;
    if let Some((held_handle, held)) = ctx.held_object().await? {
        if held_handle != handle {
            return Err(SkillError::AlreadyOccupied(format!(
                "{} is holding up the {held}, release it before holding up the {name}",
                ctx.hand()
            )));
        }
    }
    ctx.attach(handle).await?;
    Ok(Completed::new(format!("{} is still holding up the {name}.", ctx.hand()))
        .holding(Some(name.to_string())))
}
