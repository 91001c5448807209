//! 回合循环：规划器给出技能对 → 协调器调度 → 结果作为反馈回传
//!
//! 规划器返回 None 或达到步数上限时结束；致命错误直接上抛。

use super::coordinator::{Coordinator, DispatchResult};
use super::error::CoordinatorError;
use crate::planner::PairPlanner;

#[derive(Debug, Default)]
pub struct EpisodeReport {
    pub results: Vec<DispatchResult>,
    /// 规划器主动结束（而非被步数上限截断）
    pub finished: bool,
}

impl EpisodeReport {
    pub fn steps(&self) -> usize {
        self.results.len()
    }

    /// 失败的单侧结果总数
    pub fn failed_skills(&self) -> usize {
        self.results
            .iter()
            .map(|r| usize::from(!r.outcomes.left.success) + usize::from(!r.outcomes.right.success))
            .sum()
    }
}

pub async fn run_episode(
    coordinator: &mut Coordinator,
    planner: &mut dyn PairPlanner,
    max_steps: usize,
) -> Result<EpisodeReport, CoordinatorError> {
    let mut report = EpisodeReport::default();
    while report.steps() < max_steps {
        let pair = planner
            .next_pair(report.results.last())
            .await
            .map_err(CoordinatorError::Planner)?;
        let Some(pair) = pair else {
            report.finished = true;
            break;
        };
        let result = coordinator.dispatch(pair).await?;
        report.results.push(result);
    }
    if !report.finished {
        tracing::warn!(max_steps, "episode stopped at the step limit");
    }
    Ok(report)
}
