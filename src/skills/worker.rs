//! 单侧工作者：在独立 tokio 任务里持有 SkillExecutor
//!
//! 请求经 mpsc 送达、oneshot 返回，同一侧的技能严格按到达顺序执行；
//! 两侧各一个任务，因此调度时真正并行。

use tokio::sync::{mpsc, oneshot};

use super::executor::SkillExecutor;
use super::types::{SkillInvocation, SkillOutcome};
use crate::core::{ArmState, CoordinatorError, Side, SimError};

const CHANNEL_CAPACITY: usize = 16;

enum ArmRequest {
    Execute {
        invocation: SkillInvocation,
        reply: oneshot::Sender<Result<SkillOutcome, SimError>>,
    },
    State {
        reply: oneshot::Sender<ArmState>,
    },
    Reset {
        reply: oneshot::Sender<ArmState>,
    },
}

/// 指向某侧工作者任务的句柄；丢弃全部句柄后任务退出
#[derive(Clone)]
pub struct ArmHandle {
    side: Side,
    tx: mpsc::Sender<ArmRequest>,
}

impl ArmHandle {
    /// 启动工作者任务；必须在 tokio 运行时内调用
    pub fn spawn(executor: SkillExecutor) -> Self {
        let side = executor.side();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(run(executor, rx));
        Self { side, tx }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub async fn execute(&self, invocation: SkillInvocation) -> Result<SkillOutcome, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(ArmRequest::Execute { invocation, reply }).await?;
        let result = rx.await.map_err(|_| CoordinatorError::WorkerGone(self.side))?;
        result.map_err(|source| CoordinatorError::Link {
            side: self.side,
            source,
        })
    }

    pub async fn state(&self) -> Result<ArmState, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(ArmRequest::State { reply }).await?;
        rx.await.map_err(|_| CoordinatorError::WorkerGone(self.side))
    }

    /// 把本侧状态复位为 {Vertical, Open}（不驱动机械臂）
    pub async fn reset(&self) -> Result<ArmState, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(ArmRequest::Reset { reply }).await?;
        rx.await.map_err(|_| CoordinatorError::WorkerGone(self.side))
    }

    async fn send(&self, request: ArmRequest) -> Result<(), CoordinatorError> {
        self.tx
            .send(request)
            .await
            .map_err(|_| CoordinatorError::WorkerGone(self.side))
    }
}

async fn run(mut executor: SkillExecutor, mut rx: mpsc::Receiver<ArmRequest>) {
    tracing::debug!(side = %executor.side(), "arm worker started");
    while let Some(request) = rx.recv().await {
        match request {
            ArmRequest::Execute { invocation, reply } => {
                let result = executor.execute(&invocation).await;
                let _ = reply.send(result);
            }
            ArmRequest::State { reply } => {
                let _ = reply.send(executor.state());
            }
            ArmRequest::Reset { reply } => {
                executor.reset_state();
                let _ = reply.send(executor.state());
            }
        }
    }
    tracing::debug!(side = %executor.side(), "arm worker stopped");
}
