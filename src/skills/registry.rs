//! 技能注册表
//!
//! 所有技能实现 Skill trait（name / description / 参数声明 / execute），由 SkillRegistry 按名注册与查找；
//! SkillExecutor 在调用前用 validate 检查参数键，调用后把结果或错误转为 SkillOutcome。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::context::SkillContext;
use super::{
    GraspSkill, HoldUpSkill, MoveAboveSkill, MoveToSkill, PourOutSkill, PushToSkill, ReleaseSkill,
    ResetSkill, WaitSkill,
};
use crate::core::SkillError;

/// 技能成功完成时的产物；新状态写在 SkillContext 的工作副本里
#[derive(Clone, Debug, PartialEq)]
pub struct Completed {
    pub narrative: String,
    pub grasped_object: Option<String>,
}

impl Completed {
    pub fn new(narrative: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            grasped_object: None,
        }
    }

    pub fn holding(mut self, object: Option<String>) -> Self {
        self.grasped_object = object;
        self
    }
}

/// 技能 trait：名称、描述（供规划器理解）、参数声明、异步执行
#[async_trait]
pub trait Skill: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// 必须提供的参数键
    fn required_params(&self) -> &[&'static str] {
        &[]
    }

    /// 可选参数键
    fn optional_params(&self) -> &[&'static str] {
        &[]
    }

    /// 参数 JSON Schema（所有参数均为字符串）
    fn parameters_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for key in self.required_params().iter().chain(self.optional_params()) {
            properties.insert((*key).to_string(), serde_json::json!({ "type": "string" }));
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required_params(),
            "additionalProperties": false
        })
    }

    /// 执行技能；成功时在 ctx.state 中写入新状态
    async fn execute(
        &self,
        ctx: &mut SkillContext,
        params: &BTreeMap<String, String>,
    ) -> Result<Completed, SkillError>;
}

/// 技能注册表：按名称存储 Arc<dyn Skill>
#[derive(Default, Clone)]
pub struct SkillRegistry {
    skills: HashMap<String, Arc<dyn Skill>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册全部九个内置技能
    pub fn with_default_skills() -> Self {
        let mut registry = Self::new();
        registry.register(MoveToSkill);
        registry.register(MoveAboveSkill);
        registry.register(GraspSkill);
        registry.register(PushToSkill);
        registry.register(PourOutSkill);
        registry.register(HoldUpSkill);
        registry.register(ReleaseSkill);
        registry.register(ResetSkill);
        registry.register(WaitSkill);
        registry
    }

    pub fn register(&mut self, skill: impl Skill + 'static) {
        let name = skill.name().to_string();
        self.skills.insert(name, Arc::new(skill));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Skill>> {
        self.skills.get(name).cloned()
    }

    /// 查找技能并检查参数：必需键一个不能少，其余键只能是声明过的可选键
    pub fn validate(
        &self,
        name: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Arc<dyn Skill>, SkillError> {
        let skill = self
            .get(name)
            .ok_or_else(|| SkillError::UnknownCommand(format!("Unknown command: {name}")))?;

        let missing: Vec<&str> = skill
            .required_params()
            .iter()
            .copied()
            .filter(|k| !params.contains_key(*k))
            .collect();
        if !missing.is_empty() {
            return Err(SkillError::InvalidParameters(format!(
                "The command {name} is missing parameters: {}",
                missing.join(", ")
            )));
        }

        let unexpected: Vec<&str> = params
            .keys()
            .map(String::as_str)
            .filter(|k| {
                !skill
                    .required_params()
                    .iter()
                    .chain(skill.optional_params())
                    .any(|p| p == k)
            })
            .collect();
        if !unexpected.is_empty() {
            return Err(SkillError::InvalidParameters(format!(
                "The command {name} does not accept parameters: {}",
                unexpected.join(", ")
            )));
        }
        Ok(skill)
    }

    /// 按名字排序的技能名列表
    pub fn skill_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.skills.keys().cloned().collect();
        names.sort();
        names
    }

    /// 返回 (name, description) 列表，用于生成规划器提示中的技能说明
    pub fn skill_descriptions(&self) -> Vec<(String, String)> {
        self.skill_names()
            .into_iter()
            .filter_map(|name| {
                let desc = self.skills.get(&name)?.description().to_string();
                Some((name, desc))
            })
            .collect()
    }

    /// 动态生成技能 schema JSON，与实际注册的技能保持一致
    pub fn to_schema_json(&self) -> String {
        let skills: Vec<Value> = self
            .skill_names()
            .iter()
            .filter_map(|name| {
                let skill = self.skills.get(name)?;
                Some(serde_json::json!({
                    "name": name,
                    "description": skill.description(),
                    "parameters": skill.parameters_schema()
                }))
            })
            .collect();
        serde_json::to_string_pretty(&skills).unwrap_or_else(|_| "[]".to_string())
    }
}
