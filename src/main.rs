//! Bimanual - 双臂机器人技能协调层
//!
//! 入口：初始化日志、加载配置，按配置对任务的每个变体跑若干回合脚本，
//! 统计成功率，并（可选）把会话记录追加写入 JSON Lines 文件。
//! 用法：`bimanual [config.toml]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bimanual::{
    config::{load_config, AppConfig},
    core::{run_episode, Coordinator, SessionStore},
    observability,
    planner::{feedback_text, ScriptedPlanner},
    skills::SkillRegistry,
    tasks::create_task,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = match load_config(std::env::args().nth(1).map(PathBuf::from)) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            AppConfig::default()
        }
    };

    let task = create_task(&cfg.episode.task).context("Failed to create task")?;
    let registry = Arc::new(SkillRegistry::with_default_skills());
    let store = cfg.session.records_path.as_ref().map(SessionStore::new);

    tracing::info!(task = task.name(), rounds = cfg.episode.rounds, "the task starts");
    tracing::debug!(description = task.description(), "task description");
    for (name, description) in registry.skill_descriptions() {
        tracing::debug!(skill = %name, %description, "available skill");
    }
    let mut total = 0usize;
    let mut succeeded = 0usize;

    for round in 0..cfg.episode.rounds {
        for (i, variant) in task.variants().iter().enumerate() {
            let task_index = round * task.variants().len() + i;
            let scene = task
                .build_scene(variant, round)
                .with_context(|| format!("Failed to build scene for {variant}"))?;
            let mut coordinator = Coordinator::new(scene.clone(), registry.clone(), &cfg);
            let mut planner = ScriptedPlanner::new(task.scripted_plan(&scene));

            let report = run_episode(&mut coordinator, &mut planner, cfg.episode.max_steps)
                .await
                .with_context(|| format!("Episode {task_index} ({variant}) aborted"))?;
            for result in &report.results {
                tracing::debug!(step = result.step, "\n{}", feedback_text(result));
            }

            let success = task.check_success(&scene);
            total += 1;
            succeeded += usize::from(success);
            tracing::info!(
                task_index,
                variant,
                steps = report.steps(),
                failed_skills = report.failed_skills(),
                success,
                "episode finished"
            );

            if let Some(store) = &store {
                let rows = coordinator.session().rows(task.name(), task_index, success);
                store
                    .append(&rows)
                    .with_context(|| format!("Failed to write records to {}", store.path().display()))?;
            }
        }
    }

    let rate = if total == 0 { 0.0 } else { succeeded as f64 / total as f64 };
    tracing::info!(succeeded, total, rate, "success rate");
    Ok(())
}
