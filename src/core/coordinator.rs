//! 双臂协调器
//!
//! 每次 dispatch 接收一对技能调用并选择执行方式：
//! - 两侧同时 move_to 同一个 serve point、参数完全相同、且都处于
//!   Horizontally_Slanted_Up 时，走双手同步搬运；
//! - 否则两侧各自交给自己的工作者任务并行执行（一侧为 wait 时记为单侧模式）。
//!
//! 协调器只保存两侧 ArmState 的镜像，镜像只从 Outcome 更新。
//! 成功完成的调度会追加到会话日志；致命链路错误直接返回，不写日志。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::CoordinatorError;
use super::session::{DispatchRecord, SessionLog};
use super::state::{ArmState, Orientation, Side, SidePair};
use super::transport::synchronized_transport;
use crate::config::{AppConfig, TransportSection};
use crate::sim::Simulator;
use crate::skills::{ArmHandle, SkillExecutor, SkillOutcome, SkillPair, SkillRegistry};

/// 本次调度采用的执行方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DispatchMode {
    Independent,
    /// 另一侧为 wait
    OneSided { active: Side },
    SynchronizedTransport,
}

/// 一次调度的合并结果
#[derive(Clone, Debug)]
pub struct DispatchResult {
    pub step: usize,
    pub mode: DispatchMode,
    pub invocations: SkillPair,
    pub outcomes: SidePair<SkillOutcome>,
}

impl DispatchResult {
    pub fn outcome(&self, side: Side) -> &SkillOutcome {
        self.outcomes.get(side)
    }

    pub fn states(&self) -> SidePair<ArmState> {
        SidePair::new(self.outcomes.left.state, self.outcomes.right.state)
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.left.success && self.outcomes.right.success
    }
}

pub struct Coordinator {
    arms: SidePair<ArmHandle>,
    states: SidePair<ArmState>,
    sim: Arc<dyn Simulator>,
    transport: TransportSection,
    serve_point: String,
    session: SessionLog,
    steps: usize,
}

impl Coordinator {
    /// 为两侧各启动一个工作者任务；必须在 tokio 运行时内调用
    pub fn new(sim: Arc<dyn Simulator>, registry: Arc<SkillRegistry>, cfg: &AppConfig) -> Self {
        let settings = Arc::new(cfg.skills.clone());
        let regions = cfg.regions.policy();
        let arms = SidePair::new(Side::Left, Side::Right).map(|_, side| {
            ArmHandle::spawn(SkillExecutor::new(
                side,
                registry.clone(),
                sim.clone(),
                settings.clone(),
                regions,
            ))
        });
        Self {
            arms,
            states: SidePair::new(ArmState::INITIAL, ArmState::INITIAL),
            sim,
            transport: cfg.transport.clone(),
            serve_point: cfg.skills.serve_point.clone(),
            session: SessionLog::new(),
            steps: 0,
        }
    }

    pub fn states(&self) -> SidePair<ArmState> {
        self.states
    }

    pub fn session(&self) -> &SessionLog {
        &self.session
    }

    /// 回合边界：两侧状态回到 {Vertical, Open}，清空会话日志
    pub async fn reset_episode(&mut self) -> Result<(), CoordinatorError> {
        for side in Side::BOTH {
            let state = self.arms.get(side).reset().await?;
            *self.states.get_mut(side) = state;
        }
        self.session.clear();
        self.steps = 0;
        tracing::info!(session = %self.session.id(), "episode reset");
        Ok(())
    }

    /// 同步搬运的触发条件
    pub fn is_synchronized_transport(&self, pair: &SkillPair) -> bool {
        pair.left.command == "move_to"
            && pair.left == pair.right
            && pair.left.param("obj_name") == Some(self.serve_point.as_str())
            && self.states.left.orientation == Orientation::HorizontallySlantedUp
            && self.states.right.orientation == Orientation::HorizontallySlantedUp
    }

    fn mode_for(&self, pair: &SkillPair) -> DispatchMode {
        if self.is_synchronized_transport(pair) {
            return DispatchMode::SynchronizedTransport;
        }
        match (pair.left.command == "wait", pair.right.command == "wait") {
            (false, true) => DispatchMode::OneSided { active: Side::Left },
            (true, false) => DispatchMode::OneSided { active: Side::Right },
            _ => DispatchMode::Independent,
        }
    }

    pub async fn dispatch(&mut self, pair: SkillPair) -> Result<DispatchResult, CoordinatorError> {
        let mode = self.mode_for(&pair);
        tracing::debug!(
            ?mode,
            left = %pair.left.command,
            right = %pair.right.command,
            "dispatching skill pair"
        );

        let outcomes = match mode {
            DispatchMode::SynchronizedTransport => {
                synchronized_transport(self.sim.clone(), &self.serve_point, &self.transport, self.states)
                    .await
                    .map_err(CoordinatorError::Transport)?
            }
            DispatchMode::Independent | DispatchMode::OneSided { .. } => {
                self.dispatch_independent(&pair).await?
            }
        };

        self.states = SidePair::new(outcomes.left.state, outcomes.right.state);
        self.steps += 1;
        let result = DispatchResult {
            step: self.steps,
            mode,
            invocations: pair,
            outcomes,
        };
        self.session.append(DispatchRecord {
            step: result.step,
            mode: result.mode,
            pair: result.invocations.clone(),
            outcomes: result.outcomes.clone(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        });
        tracing::info!(
            step = result.step,
            left_ok = result.outcomes.left.success,
            right_ok = result.outcomes.right.success,
            "dispatch finished"
        );
        Ok(result)
    }

    async fn dispatch_independent(&mut self, pair: &SkillPair) -> Result<SidePair<SkillOutcome>, CoordinatorError> {
        let (left, right) = tokio::join!(
            self.arms.left.execute(pair.left.clone()),
            self.arms.right.execute(pair.right.clone()),
        );
        // 一侧链路断开时，另一侧已提交的状态仍同步到镜像
        if let Ok(out) = &left {
            self.states.left = out.state;
        }
        if let Ok(out) = &right {
            self.states.right = out.state;
        }
        Ok(SidePair::new(left?, right?))
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("states", &self.states)
            .field("steps", &self.steps)
            .field("session", &self.session.id())
            .finish()
    }
}
