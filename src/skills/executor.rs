//! 单侧技能执行器
//!
//! 独占本侧 ArmState。execute 先校验参数，再在工作副本上运行技能：
//! 成功则提交新状态；可恢复错误转为失败 Outcome，并提交技能在失败前已落实的状态
//! （例如抓取前已经松开的手）。只有仿真链路断开作为 Err 返回，此时状态不变。每次调用输出结构化审计日志（JSON）。

use std::sync::Arc;
use std::time::Instant;

use super::context::SkillContext;
use super::registry::SkillRegistry;
use super::types::{SkillInvocation, SkillOutcome};
use crate::config::SkillsSection;
use crate::core::{ArmState, RegionPolicy, Side, SimError, SkillError};
use crate::sim::Simulator;

pub struct SkillExecutor {
    side: Side,
    state: ArmState,
    registry: Arc<SkillRegistry>,
    sim: Arc<dyn Simulator>,
    settings: Arc<SkillsSection>,
    regions: RegionPolicy,
}

impl SkillExecutor {
    pub fn new(
        side: Side,
        registry: Arc<SkillRegistry>,
        sim: Arc<dyn Simulator>,
        settings: Arc<SkillsSection>,
        regions: RegionPolicy,
    ) -> Self {
        Self {
            side,
            state: ArmState::INITIAL,
            registry,
            sim,
            settings,
            regions,
        }
    }

    /// 以指定初始状态构造（测试与回放使用）
    pub fn with_state(mut self, state: ArmState) -> Self {
        self.state = state;
        self
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn state(&self) -> ArmState {
        self.state
    }

    /// 回合边界：状态回到 {Vertical, Open}
    pub fn reset_state(&mut self) {
        self.state = ArmState::INITIAL;
    }

    pub async fn execute(&mut self, invocation: &SkillInvocation) -> Result<SkillOutcome, SimError> {
        let start = Instant::now();
        let (reached, result) = self.run(invocation).await;

        let (ok, error_kind) = match &result {
            Ok(_) => (true, None),
            Err(e) => (false, e.kind()),
        };
        let audit = serde_json::json!({
            "event": "skill_audit",
            "side": self.side.label(),
            "skill": invocation.command,
            "ok": ok,
            "error": error_kind,
            "duration_ms": start.elapsed().as_millis() as u64,
            "params_preview": params_preview(invocation),
        });
        tracing::info!(audit = %audit.to_string(), "skill");

        match result {
            Ok(done) => {
                self.state = reached;
                Ok(SkillOutcome::succeeded(done.narrative, reached, done.grasped_object))
            }
            Err(SkillError::Sim(e)) => {
                tracing::error!(side = %self.side, skill = %invocation.command, error = %e, "simulation link failure");
                Err(e)
            }
            Err(e) => {
                tracing::warn!(side = %self.side, skill = %invocation.command, error = %e, "skill failed");
                if reached != self.state {
                    tracing::debug!(side = %self.side, from = ?self.state, to = ?reached, "committing state reached before failure");
                }
                self.state = reached;
                Ok(SkillOutcome::failed(&e, reached))
            }
        }
    }

    /// 返回技能结束（成功或失败）时工作副本上的状态
    async fn run(
        &self,
        invocation: &SkillInvocation,
    ) -> (ArmState, Result<super::registry::Completed, SkillError>) {
        let skill = match self.registry.validate(&invocation.command, &invocation.params) {
            Ok(skill) => skill,
            Err(e) => return (self.state, Err(e)),
        };
        let mut ctx = SkillContext::new(
            self.side,
            self.state,
            self.sim.clone(),
            self.settings.clone(),
            self.regions,
        );
        let result = skill.execute(&mut ctx, &invocation.params).await;
        (ctx.state, result)
    }
}

fn params_preview(invocation: &SkillInvocation) -> String {
    let s = invocation.params_json();
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Gripper, Orientation, SkillErrorKind};
    use crate::sim::{ObjectSpec, SceneSimulator};

    fn executor(side: Side, sim: Arc<SceneSimulator>) -> SkillExecutor {
        SkillExecutor::new(
            side,
            Arc::new(SkillRegistry::with_default_skills()),
            sim,
            Arc::new(SkillsSection::default()),
            RegionPolicy::default(),
        )
    }

    fn scene() -> Arc<SceneSimulator> {
        let sim = Arc::new(SceneSimulator::new());
        sim.add_object(ObjectSpec::container("yellow_cup", [0.55, 0.35, 0.81])).unwrap();
        sim.add_side_anchors("yellow_cup", 0.05).unwrap();
        sim
    }

    #[tokio::test]
    async fn test_success_commits_state() {
        let sim = scene();
        let mut ex = executor(Side::Left, sim);
        let out = ex
            .execute(&SkillInvocation::move_and_grasp("yellow_cup"))
            .await
            .unwrap();
        assert!(out.success);
        assert_eq!(out.state, ArmState::new(Orientation::Vertical, Gripper::Closed));
        assert_eq!(ex.state(), out.state);
    }

    #[tokio::test]
    async fn test_failure_keeps_state() {
        let sim = scene();
        let mut ex = executor(Side::Right, sim);
        let out = ex.execute(&SkillInvocation::move_to("yellow_cup")).await.unwrap();
        assert!(!out.success);
        assert_eq!(out.error, Some(SkillErrorKind::OutOfArea));
        assert!(out.state.is_initial());
        assert!(ex.state().is_initial());
    }

    #[tokio::test]
    async fn test_invalid_parameters_become_failed_outcome() {
        let sim = scene();
        let mut ex = executor(Side::Left, sim);
        let out = ex
            .execute(&SkillInvocation::new("move_to", [("object", "yellow_cup")]))
            .await
            .unwrap();
        assert_eq!(out.error, Some(SkillErrorKind::InvalidParameters));
        let out = ex.execute(&SkillInvocation::new("dance", Vec::<(String, String)>::new())).await.unwrap();
        assert_eq!(out.error, Some(SkillErrorKind::UnknownCommand));
    }

    #[tokio::test]
    async fn test_link_down_is_returned_as_error() {
        let sim = scene();
        let mut ex = executor(Side::Left, sim.clone());
        sim.disconnect();
        let err = ex
            .execute(&SkillInvocation::move_to("yellow_cup"))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(ex.state().is_initial());
    }

    #[tokio::test]
    async fn test_grasp_then_release_is_open() {
        let sim = scene();
        let mut ex = executor(Side::Left, sim);
        ex.execute(&SkillInvocation::move_and_grasp("yellow_cup")).await.unwrap();
        let out = ex.execute(&SkillInvocation::release()).await.unwrap();
        assert_eq!(out.state.gripper, Gripper::Open);

        // 抓取失败后释放同样得到 Open
        let out = ex.execute(&SkillInvocation::move_and_grasp("missing_cup")).await.unwrap();
        assert!(!out.success);
        let out = ex.execute(&SkillInvocation::release()).await.unwrap();
        assert_eq!(out.state.gripper, Gripper::Open);
    }

    #[tokio::test]
    async fn test_failed_grasp_reports_released_hand() {
        let sim = Arc::new(SceneSimulator::new());
        sim.add_object(ObjectSpec::container("Bowl", [0.6, 0.05, 0.81])).unwrap();
        sim.add_side_anchors("Bowl", 0.1).unwrap();
        sim.add_object(ObjectSpec::liquid("ghost", [0.5, 0.3, 0.81])).unwrap();
        let mut ex = executor(Side::Left, sim.clone());
        let out = ex.execute(&SkillInvocation::hold_up("Bowl")).await.unwrap();
        assert!(out.success);
        assert_eq!(sim.parent_of("Bowl").as_deref(), Some("left_gripper"));

        let out = ex.execute(&SkillInvocation::move_and_grasp("ghost")).await.unwrap();
        assert!(!out.success);
        assert_eq!(out.error, Some(SkillErrorKind::NothingDetected));
        assert_eq!(sim.parent_of("Bowl").as_deref(), Some("world"));
        assert_eq!(out.state, ArmState::new(Orientation::Vertical, Gripper::Open));
        assert_eq!(ex.state(), out.state);
    }

    #[tokio::test]
    async fn test_reset_state() {
        let sim = scene();
        let mut ex = executor(Side::Left, sim)
            .with_state(ArmState::new(Orientation::HorizontallyDown, Gripper::PointAt));
        assert!(!ex.state().is_initial());
        ex.reset_state();
        assert!(ex.state().is_initial());
        assert_eq!(ex.side(), Side::Left);
    }
}
