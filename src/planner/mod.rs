//! 规划器协作方
//!
//! 规划器每一步给出一对技能调用，并读取上一次调度的合并结果作为反馈。
//! 内置 [`ScriptedPlanner`] 按固定顺序回放；外部（如语言模型）规划器可借助
//! [`skill_pair_schema_json`] 描述输出格式，用 [`parse_pair_output`] 解析回复，
//! 并用 [`feedback_text`] 把结果渲染成文本反馈。

mod schema;
mod scripted;
mod wire;

use async_trait::async_trait;

use crate::core::DispatchResult;
use crate::skills::SkillPair;

pub use schema::{parse_pair_output, skill_pair_schema_json};
pub use scripted::ScriptedPlanner;
pub use wire::{feedback_text, format_result_line, parse_result_line, WireInvocation};

#[async_trait]
pub trait PairPlanner: Send {
    /// 返回下一对技能；None 表示任务结束
    async fn next_pair(&mut self, feedback: Option<&DispatchResult>) -> Result<Option<SkillPair>, String>;
}
