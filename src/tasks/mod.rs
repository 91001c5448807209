//! 演示任务场景
//!
//! 每个场景负责：按变体搭建内存场景、判定成功、给出一条固定的技能对脚本。
//! 布局是确定的（同一变体的备选布局按回合序号轮换），便于重复运行与测试。

mod serve_fruit;
mod serve_water;

use std::sync::Arc;

use thiserror::Error;

use crate::core::SimError;
use crate::sim::SceneSimulator;
use crate::skills::SkillPair;

pub use serve_fruit::ServeFruit;
pub use serve_water::ServeWater;

/// 判定“送到”时与递送点的最大距离
pub const SERVE_TOLERANCE: f64 = 0.15;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("task {task} has no variant '{variant}'")]
    UnknownVariant { task: String, variant: String },

    #[error("scene setup failed: {0}")]
    Scene(#[from] SimError),
}

pub trait TaskScenario: Send + Sync {
    fn name(&self) -> &'static str;

    fn variants(&self) -> &'static [&'static str];

    /// 面向规划器的任务说明
    fn description(&self) -> &'static str;

    fn build_scene(&self, variant: &str, round: usize) -> Result<Arc<SceneSimulator>, TaskError>;

    fn check_success(&self, scene: &SceneSimulator) -> bool;

    /// 根据当前布局生成的固定技能对序列
    fn scripted_plan(&self, scene: &SceneSimulator) -> Vec<SkillPair>;
}

pub fn create_task(name: &str) -> Result<Box<dyn TaskScenario>, TaskError> {
    match name {
        "ServeFruit" => Ok(Box::new(ServeFruit)),
        "ServeWater" => Ok(Box::new(ServeWater)),
        other => Err(TaskError::UnknownTask(other.to_string())),
    }
}

fn unknown_variant(task: &str, variant: &str) -> TaskError {
    TaskError::UnknownVariant {
        task: task.to_string(),
        variant: variant.to_string(),
    }
}

/// 物体是否在递送点附近
fn is_served(scene: &SceneSimulator, object: &str, serve_point: &str) -> bool {
    match (scene.position_of(object), scene.position_of(serve_point)) {
        (Some(obj), Some(goal)) => (obj - goal).norm() <= SERVE_TOLERANCE,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_task() {
        assert_eq!(create_task("ServeFruit").unwrap().name(), "ServeFruit");
        let water = create_task("ServeWater").unwrap();
        assert_eq!(water.variants().len(), 4);
        assert!(water.description().contains("serve point"));
        assert!(matches!(create_task("HoldBowl"), Err(TaskError::UnknownTask(_))));
    }

    #[test]
    fn test_unknown_variant_is_rejected() {
        let task = create_task("ServeWater").unwrap();
        assert!(matches!(
            task.build_scene("upside_down", 0),
            Err(TaskError::UnknownVariant { .. })
        ));
    }
}
