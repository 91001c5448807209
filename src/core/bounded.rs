//! 有界收敛组合子：最多迭代 N 步，每步可提前终止
//!
//! push_to 与双手同步搬运都通过它循环，保证步数上限内一定返回。

use std::future::Future;
use std::ops::ControlFlow;

/// 有界循环的结束方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convergence {
    /// 某一步返回 Break，steps 为已执行的步数（含该步）
    Converged { steps: usize },
    /// 用尽预算仍未收敛
    Exhausted { steps: usize },
}

impl Convergence {
    pub fn converged(&self) -> bool {
        matches!(self, Convergence::Converged { .. })
    }

    pub fn steps(&self) -> usize {
        match self {
            Convergence::Converged { steps } | Convergence::Exhausted { steps } => *steps,
        }
    }
}

/// 依次调用 `step(i)`（i 从 0 开始），返回 `Break` 即停；第一个错误立即返回
pub async fn converge_within<F, Fut, E>(max_steps: usize, mut step: F) -> Result<Convergence, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<ControlFlow<()>, E>>,
{
    for i in 0..max_steps {
        if step(i).await?.is_break() {
            return Ok(Convergence::Converged { steps: i + 1 });
        }
    }
    Ok(Convergence::Exhausted { steps: max_steps })
}
