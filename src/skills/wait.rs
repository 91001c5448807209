//! wait：保持当前状态（含手中物体）不动

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::context::SkillContext;
use super::registry::{Completed, Skill};
use crate::core::SkillError;

pub struct WaitSkill;

#[async_trait]
impl Skill for WaitSkill {
    fn name(&self) -> &str {
        "wait"
    }

    fn description(&self) -> &str {
        "The hand, including any grasped object, holds on its present state."
    }

    async fn execute(
        &self,
        ctx: &mut SkillContext,
        _params: &BTreeMap<String, String>,
    ) -> Result<Completed, SkillError> {
        Ok(Completed::new(format!("{} is keeping the current status.", ctx.hand())))
    }
}
