//! 技能对 JSON Schema 与规划器回复解析
//!
//! schema 可拼入语言模型的 system prompt，约束其输出 `{"left": {...}, "right": {...}}`。

use schemars::schema_for;

use crate::skills::SkillPair;

/// 返回 SkillPair 的 JSON Schema 字符串
pub fn skill_pair_schema_json() -> String {
    let schema = schema_for!(SkillPair);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| String::new())
}

/// 从规划器回复中提取技能对：支持 ```json 代码块或裸 JSON
pub fn parse_pair_output(output: &str) -> Result<SkillPair, String> {
    let trimmed = output.trim();

    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim())
    } else if let Some((start, end)) = trimmed
        .find('{')
        .zip(trimmed.rfind('}'))
        .filter(|(start, end)| start < end)
    {
        &trimmed[start..=end]
    } else {
        return Err(format!("no skill pair found in planner output: {trimmed}"));
    };

    let pair: SkillPair = serde_json::from_str(json_str).map_err(|e| format!("{e}: {json_str}"))?;
    if pair.left.command.is_empty() || pair.right.command.is_empty() {
        return Err("both sides need a command; use \"wait\" to keep a hand still".to_string());
    }
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::SkillInvocation;

    #[test]
    fn test_schema_names_both_sides() {
        let s = skill_pair_schema_json();
        assert!(s.contains("left"));
        assert!(s.contains("right"));
        assert!(s.contains("command"));
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "Next step:\n```json\n{\"left\": {\"command\": \"hold_up\", \"params\": {\"obj_name\": \"Bowl\"}}, \"right\": {\"command\": \"wait\"}}\n```";
        let pair = parse_pair_output(reply).unwrap();
        assert_eq!(pair.left, SkillInvocation::hold_up("Bowl"));
        assert_eq!(pair.right, SkillInvocation::wait());
    }

    #[test]
    fn test_parse_rejects_prose_and_empty_commands() {
        assert!(parse_pair_output("I think the left hand should wait.").is_err());
        assert!(parse_pair_output(r#"{"left": {"command": ""}, "right": {"command": "wait"}}"#).is_err());
    }

    #[test]
    fn test_parse_reversed_braces_is_an_error() {
        let err = parse_pair_output("Done } nothing more {").unwrap_err();
        assert!(err.starts_with("no skill pair found"));
        assert!(parse_pair_output("}{").is_err());
    }
}
