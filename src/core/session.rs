//! 会话日志：按调度顺序记录每一对技能及其结果
//!
//! 回合结束后可导出为扁平行（任务名、回合序号、成功标记、两侧命令 / 参数 / 反馈），
//! 并以 JSON Lines 追加写入文件，便于离线统计。

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::coordinator::DispatchMode;
use super::state::SidePair;
use crate::skills::{SkillOutcome, SkillPair};

/// 一次成功调度的完整记录
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub step: usize,
    pub mode: DispatchMode,
    pub pair: SkillPair,
    pub outcomes: SidePair<SkillOutcome>,
    pub timestamp_ms: i64,
}

/// 导出行；para 为参数 JSON，feedback 为叙述
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub task_type: String,
    pub task_index: usize,
    pub success: bool,
    pub left_command: String,
    pub left_para: String,
    pub right_command: String,
    pub right_para: String,
    pub left_feedback: String,
    pub right_feedback: String,
}

#[derive(Debug)]
pub struct SessionLog {
    id: String,
    records: Vec<DispatchRecord>,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            records: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn append(&mut self, record: DispatchRecord) {
        self.records.push(record);
    }

    /// 新回合：清空记录并换一个会话 id
    pub fn clear(&mut self) {
        self.records.clear();
        self.id = uuid::Uuid::new_v4().to_string();
    }

    pub fn records(&self) -> &[DispatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 每次调度一行；成功标记取回合最终判定
    pub fn rows(&self, task_type: &str, task_index: usize, success: bool) -> Vec<SessionRow> {
        self.records
            .iter()
            .map(|r| SessionRow {
                task_type: task_type.to_string(),
                task_index,
                success,
                left_command: r.pair.left.command.clone(),
                left_para: r.pair.left.params_json(),
                right_command: r.pair.right.command.clone(),
                right_para: r.pair.right.params_json(),
                left_feedback: r.outcomes.left.narrative.clone(),
                right_feedback: r.outcomes.right.narrative.clone(),
            })
            .collect()
    }
}

/// JSON Lines 文件存储；文件不存在时 load 返回空
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加写入；父目录不存在时自动创建
    pub fn append(&self, rows: &[SessionRow]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for row in rows {
            writeln!(file, "{}", serde_json::to_string(row)?)?;
        }
        Ok(())
    }

    pub fn load(&self) -> anyhow::Result<Vec<SessionRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        data.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(Into::into))
            .collect()
    }
}
