//! 错误类型：仿真链路错误、技能失败、协调器致命错误
//!
//! 技能失败（SkillError 除 Sim 外的所有变体）在 SkillExecutor 边界内被转为带失败标记的 Outcome；
//! 只有仿真链路断开（SimError::LinkDown）会穿过执行器，经 Coordinator 传给调用方。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Side;

/// 仿真协作方返回的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("object '{0}' is not in the scene")]
    ObjectNotFound(String),

    #[error("unknown object handle {0}")]
    UnknownHandle(u64),

    /// 仿真不可达 / 连接断开：唯一的致命错误
    #[error("simulation link down: {0}")]
    LinkDown(String),
}

impl SimError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SimError::LinkDown(_))
    }
}

/// 技能执行失败；除 Sim 外每个变体都携带面向规划器的叙述
#[derive(Error, Debug)]
pub enum SkillError {
    #[error("{0}")]
    OutOfArea(String),

    #[error("{0}")]
    AlreadyOccupied(String),

    #[error("{0}")]
    UnsupportedObject(String),

    #[error("{0}")]
    ObjectNotFound(String),

    #[error("{0}")]
    InvalidTarget(String),

    #[error("{0}")]
    NoContent(String),

    /// 抓取到位后接近传感器未检测到任何物体
    #[error("{0}")]
    NothingDetected(String),

    #[error("{0}")]
    InvalidParameters(String),

    #[error("{0}")]
    UnknownCommand(String),

    /// 仿真链路致命错误，不在执行器内恢复
    #[error(transparent)]
    Sim(SimError),
}

impl SkillError {
    /// 可恢复错误对应的类别；致命错误返回 None
    pub fn kind(&self) -> Option<SkillErrorKind> {
        let kind = match self {
            SkillError::OutOfArea(_) => SkillErrorKind::OutOfArea,
            SkillError::AlreadyOccupied(_) => SkillErrorKind::AlreadyOccupied,
            SkillError::UnsupportedObject(_) => SkillErrorKind::UnsupportedObject,
            SkillError::ObjectNotFound(_) => SkillErrorKind::ObjectNotFound,
            SkillError::InvalidTarget(_) => SkillErrorKind::InvalidTarget,
            SkillError::NoContent(_) => SkillErrorKind::NoContent,
            SkillError::NothingDetected(_) => SkillErrorKind::NothingDetected,
            SkillError::InvalidParameters(_) => SkillErrorKind::InvalidParameters,
            SkillError::UnknownCommand(_) => SkillErrorKind::UnknownCommand,
            SkillError::Sim(_) => return None,
        };
        Some(kind)
    }
}

impl From<SimError> for SkillError {
    fn from(e: SimError) -> Self {
        match e {
            SimError::ObjectNotFound(name) => {
                SkillError::ObjectNotFound(format!("The object {name} is not in the scene"))
            }
            SimError::UnknownHandle(h) => {
                SkillError::ObjectNotFound(format!("The object with handle {h} is not in the scene"))
            }
            fatal @ SimError::LinkDown(_) => SkillError::Sim(fatal),
        }
    }
}

/// 失败 Outcome 中携带的错误类别（可序列化）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillErrorKind {
    OutOfArea,
    AlreadyOccupied,
    UnsupportedObject,
    ObjectNotFound,
    InvalidTarget,
    NoContent,
    NothingDetected,
    InvalidParameters,
    UnknownCommand,
}

/// 协调器向调用方传播的致命错误
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("simulation link failure on the {side} arm: {source}")]
    Link { side: Side, source: SimError },

    #[error("synchronized transport failed: {0}")]
    Transport(SimError),

    #[error("the {0} arm worker has stopped")]
    WorkerGone(Side),

    #[error("planner error: {0}")]
    Planner(String),
}
