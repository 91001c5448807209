//! reset：松手并收回到初始位姿，状态恢复为 {Vertical, Open}
//!
//! 顺序：与 release 相同的松手撤离，再张开手指，最后臂关节回到收回角。

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::context::SkillContext;
use super::registry::{Completed, Skill};
use super::release::let_go;
use crate::core::{ArmState, Side, SkillError};

/// 收回后的臂关节角（肩部 ∓1.57，其余归零）
pub fn home_joints(side: Side) -> [f64; 8] {
    let mut joints = [0.0; 8];
    joints[0] = -1.57 * side.sign();
    joints
}

pub struct ResetSkill;

#[async_trait]
impl Skill for ResetSkill {
    fn name(&self) -> &str {
        "reset"
    }

    fn description(&self) -> &str {
        "Release anything in the hand and move the arm back to its initial position."
    }

    async fn execute(
        &self,
        ctx: &mut SkillContext,
        _params: &BTreeMap<String, String>,
    ) -> Result<Completed, SkillError> {
        let_go(ctx).await?;
        ctx.open_hand().await?;
        ctx.sim.set_arm_joints(ctx.side, &home_joints(ctx.side)).await?;
        ctx.state = ArmState::INITIAL;
        Ok(Completed::new(format!(
            "The robot's {} arm has been reset to the initial position.",
            ctx.side
        )))
    }
}
