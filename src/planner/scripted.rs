//! 固定脚本规划器：按顺序回放预先写好的技能对，忽略反馈

use std::collections::VecDeque;

use async_trait::async_trait;

use super::PairPlanner;
use crate::core::DispatchResult;
use crate::skills::SkillPair;

#[derive(Debug, Default)]
pub struct ScriptedPlanner {
    queue: VecDeque<SkillPair>,
}

impl ScriptedPlanner {
    pub fn new(pairs: impl IntoIterator<Item = SkillPair>) -> Self {
        Self {
            queue: pairs.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

#[async_trait]
impl PairPlanner for ScriptedPlanner {
    async fn next_pair(&mut self, feedback: Option<&DispatchResult>) -> Result<Option<SkillPair>, String> {
        if let Some(last) = feedback {
            if !last.all_succeeded() {
                tracing::debug!(step = last.step, "scripted plan continues after a failed skill");
            }
        }
        Ok(self.queue.pop_front())
    }
}
