//! 文本线格式
//!
//! 技能在独立进程中运行时，调用以 JSON 传递，结果以一行带标签的文本返回：
//! ```text
//! LEFT_RESULT: <narrative>. LEFT_HAND: <orientation> LEFT_FINGER: <gripper>
//! ```
//! 内部始终使用结构化的 SkillOutcome，文本形式只用于日志与规划器反馈。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{ArmState, DispatchResult, Gripper, Orientation, Side};
use crate::skills::{SkillInvocation, SkillOutcome};

/// 跨进程的单侧调用
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireInvocation {
    pub side: Side,
    pub command: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    pub prior_orientation: Orientation,
    pub prior_gripper: Gripper,
}

impl WireInvocation {
    pub fn new(side: Side, invocation: &SkillInvocation, prior: ArmState) -> Self {
        Self {
            side,
            command: invocation.command.clone(),
            params: invocation.params.clone(),
            prior_orientation: prior.orientation,
            prior_gripper: prior.gripper,
        }
    }

    pub fn invocation(&self) -> SkillInvocation {
        SkillInvocation {
            command: self.command.clone(),
            params: self.params.clone(),
        }
    }

    pub fn prior_state(&self) -> ArmState {
        ArmState::new(self.prior_orientation, self.prior_gripper)
    }
}

pub fn format_result_line(side: Side, outcome: &SkillOutcome) -> String {
    let tag = side.tag();
    let narrative = outcome.narrative.trim().trim_end_matches('.');
    format!(
        "{tag}_RESULT: {narrative}. {tag}_HAND: {} {tag}_FINGER: {}",
        outcome.state.orientation, outcome.state.gripper
    )
}

/// 按固定字段位置解析结果行；格式不符时返回 None
pub fn parse_result_line(side: Side, line: &str) -> Option<(String, Orientation, Gripper)> {
    let tag = side.tag();
    let result_key = format!("{tag}_RESULT: ");
    let hand_key = format!(" {tag}_HAND: ");
    let finger_key = format!(" {tag}_FINGER: ");

    let rest = &line[line.find(&result_key)? + result_key.len()..];
    let hand_at = rest.rfind(&hand_key)?;
    let narrative = rest[..hand_at].trim().to_string();
    let rest = &rest[hand_at + hand_key.len()..];
    let finger_at = rest.find(&finger_key)?;
    let orientation = rest[..finger_at].trim().parse().ok()?;
    let gripper = rest[finger_at + finger_key.len()..].trim().parse().ok()?;
    Some((narrative, orientation, gripper))
}

/// 一次调度的文本反馈（两行，左在前）
pub fn feedback_text(result: &DispatchResult) -> String {
    Side::BOTH
        .iter()
        .map(|&side| format_result_line(side, result.outcome(side)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(text: &str, state: ArmState) -> SkillOutcome {
        SkillOutcome::succeeded(text.to_string(), state, None)
    }

    #[test]
    fn test_result_line_layout() {
        let out = outcome(
            "The robot's left hand has grasped the Apple, and is holding the Apple.",
            ArmState::new(Orientation::HorizontallyDown, Gripper::Closed),
        );
        let line = format_result_line(Side::Left, &out);
        assert_eq!(
            line,
            "LEFT_RESULT: The robot's left hand has grasped the Apple, and is holding the Apple. \
             LEFT_HAND: Horizontally_Down LEFT_FINGER: Closed"
        );
        let (narrative, ori, grip) = parse_result_line(Side::Left, &line).unwrap();
        assert_eq!(narrative, out.narrative);
        assert_eq!(ori, Orientation::HorizontallyDown);
        assert_eq!(grip, Gripper::Closed);
    }

    #[test]
    fn test_parse_rejects_other_side_or_bad_labels() {
        let line = format_result_line(Side::Right, &outcome("done", ArmState::INITIAL));
        assert!(parse_result_line(Side::Left, &line).is_none());
        assert!(parse_result_line(Side::Right, "RIGHT_RESULT: x. RIGHT_HAND: Sideways RIGHT_FINGER: Open").is_none());
        assert_eq!(
            parse_result_line(Side::Right, &line).map(|(n, _, g)| (n, g)),
            Some(("done.".to_string(), Gripper::Open))
        );
    }

    #[test]
    fn test_wire_invocation_json() {
        let prior = ArmState::new(Orientation::HorizontallySlantedUp, Gripper::HoldUp);
        let wire = WireInvocation::new(Side::Right, &SkillInvocation::move_to("serve_point"), prior);
        let json = serde_json::to_string(&wire).unwrap();
        assert!(json.contains(r#""side":"right""#));
        assert!(json.contains("Horizontally_Slanted_Up"));
        let back: WireInvocation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.invocation(), SkillInvocation::move_to("serve_point"));
        assert_eq!(back.prior_state(), prior);
    }
}
