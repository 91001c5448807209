//! 技能调用与结果的数据类型

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::{ArmState, SkillError, SkillErrorKind};

/// 单侧技能调用；侧别由它在 SkillPair 中的位置决定
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SkillInvocation {
    /// 技能名：move_to / move_and_grasp / move_above / push_to / pour_out / hold_up / release / reset / wait
    pub command: String,
    /// 命名字符串参数（obj_name、source_obj_name、target_obj_name、offset）
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl SkillInvocation {
    pub fn new<I, K, V>(command: &str, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            command: command.to_string(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn bare(command: &str) -> Self {
        Self {
            command: command.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn wait() -> Self {
        Self::bare("wait")
    }

    pub fn release() -> Self {
        Self::bare("release")
    }

    pub fn reset() -> Self {
        Self::bare("reset")
    }

    pub fn pour_out() -> Self {
        Self::bare("pour_out")
    }

    pub fn move_to(obj: &str) -> Self {
        Self::new("move_to", [("obj_name", obj)])
    }

    pub fn move_to_with_offset(obj: &str, offset: &str) -> Self {
        Self::new("move_to", [("obj_name", obj), ("offset", offset)])
    }

    pub fn move_above(obj: &str) -> Self {
        Self::new("move_above", [("obj_name", obj)])
    }

    pub fn move_and_grasp(obj: &str) -> Self {
        Self::new("move_and_grasp", [("obj_name", obj)])
    }

    pub fn hold_up(obj: &str) -> Self {
        Self::new("hold_up", [("obj_name", obj)])
    }

    pub fn push_to(source: &str, target: &str) -> Self {
        Self::new(
            "push_to",
            [("source_obj_name", source), ("target_obj_name", target)],
        )
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// 参数的紧凑 JSON 形式（会话记录与审计日志使用）
    pub fn params_json(&self) -> String {
        serde_json::to_string(&self.params).unwrap_or_else(|_| "{}".to_string())
    }
}

/// 一次调度的左右技能对
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SkillPair {
    pub left: SkillInvocation,
    pub right: SkillInvocation,
}

impl SkillPair {
    pub fn new(left: SkillInvocation, right: SkillInvocation) -> Self {
        Self { left, right }
    }
}

/// 单侧技能结果；无论成败都携带该侧执行后的权威状态
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillOutcome {
    pub success: bool,
    pub error: Option<SkillErrorKind>,
    pub narrative: String,
    pub state: ArmState,
    pub grasped_object: Option<String>,
}

impl SkillOutcome {
    pub fn succeeded(narrative: String, state: ArmState, grasped_object: Option<String>) -> Self {
        Self {
            success: true,
            error: None,
            narrative,
            state,
            grasped_object,
        }
    }

    /// 可恢复失败：state 为技能失败时已落实的状态
    pub fn failed(error: &SkillError, state: ArmState) -> Self {
        Self {
            success: false,
            error: error.kind(),
            narrative: error.to_string(),
            state,
            grasped_object: None,
        }
    }
}

/// 调用方请求的附加偏移
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Offset {
    Up,
    Down,
    Left,
    Right,
}

impl Offset {
    pub fn vector(self) -> Vector3<f64> {
        match self {
            Offset::Up => Vector3::new(0.0, 0.0, 0.18),
            Offset::Down => Vector3::new(0.0, 0.0, -0.18),
            Offset::Left => Vector3::new(0.0, 0.06, 0.0),
            Offset::Right => Vector3::new(0.0, -0.06, 0.0),
        }
    }
}

impl FromStr for Offset {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "above" => Ok(Offset::Up),
            "down" | "below" => Ok(Offset::Down),
            "left" => Ok(Offset::Left),
            "right" => Ok(Offset::Right),
            other => Err(SkillError::InvalidParameters(format!(
                "Unknown offset '{other}', expected one of up, down, left, right"
            ))),
        }
    }
}

/// delta_move 的方向
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Forward,
    Backward,
}

impl Direction {
    pub fn unit(self) -> Vector3<f64> {
        match self {
            Direction::Up => Vector3::z(),
            Direction::Down => -Vector3::z(),
            Direction::Left => Vector3::y(),
            Direction::Right => -Vector3::y(),
            Direction::Forward => Vector3::x(),
            Direction::Backward => -Vector3::x(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_constructors() {
        let inv = SkillInvocation::push_to("Bowl", "overlap_area");
        assert_eq!(inv.command, "push_to");
        assert_eq!(inv.param("source_obj_name"), Some("Bowl"));
        assert_eq!(inv.params_json(), r#"{"source_obj_name":"Bowl","target_obj_name":"overlap_area"}"#);
        assert!(SkillInvocation::wait().params.is_empty());
    }

    #[test]
    fn test_offset_parsing() {
        assert_eq!("above".parse::<Offset>().unwrap(), Offset::Up);
        assert_eq!("Below".parse::<Offset>().unwrap(), Offset::Down);
        assert!(matches!(
            "sideways".parse::<Offset>(),
            Err(SkillError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_failed_outcome_keeps_state() {
        let err = SkillError::OutOfArea("too far".into());
        let out = SkillOutcome::failed(&err, ArmState::INITIAL);
        assert!(!out.success);
        assert_eq!(out.error, Some(SkillErrorKind::OutOfArea));
        assert_eq!(out.narrative, "too far");
        assert!(out.state.is_initial());
    }

    #[test]
    fn test_pair_deserializes_without_params() {
        let pair: SkillPair = serde_json::from_str(
            r#"{"left":{"command":"wait"},"right":{"command":"move_to","params":{"obj_name":"Bowl"}}}"#,
        )
        .unwrap();
        assert_eq!(pair.left, SkillInvocation::wait());
        assert_eq!(pair.right, SkillInvocation::move_to("Bowl"));
    }
}
