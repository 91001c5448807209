//! Bimanual - 双臂机器人技能协调层
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 臂状态、区域策略、错误类型、双臂协调器、会话日志与回合循环
//! - **observability**: 日志订阅器初始化
//! - **planner**: 规划器协作方（脚本回放、JSON Schema、文本线格式）
//! - **sim**: 仿真协作方接口与内存运动学场景
//! - **skills**: 技能系统（注册表、各技能实现、单侧执行器与工作者任务）
//! - **tasks**: 演示任务场景（ServeFruit / ServeWater）

pub mod config;
pub mod core;
pub mod observability;
pub mod planner;
pub mod sim;
pub mod skills;
pub mod tasks;

pub use crate::core::{Coordinator, DispatchResult};
pub use skills::{SkillInvocation, SkillOutcome, SkillPair};
