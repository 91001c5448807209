//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `BIMANUAL__*` 覆盖（双下划线表示嵌套，如 `BIMANUAL__EPISODE__TASK=ServeWater`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::RegionPolicy;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub regions: RegionsSection,
    #[serde(default)]
    pub skills: SkillsSection,
    #[serde(default)]
    pub transport: TransportSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub episode: EpisodeSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [regions] 段：左右专属区的 y 阈值
#[derive(Debug, Clone, Deserialize)]
pub struct RegionsSection {
    #[serde(default = "default_left_threshold")]
    pub left_threshold: f64,
    #[serde(default = "default_right_threshold")]
    pub right_threshold: f64,
}

fn default_left_threshold() -> f64 {
    0.2
}

fn default_right_threshold() -> f64 {
    -0.2
}

impl Default for RegionsSection {
    fn default() -> Self {
        Self {
            left_threshold: default_left_threshold(),
            right_threshold: default_right_threshold(),
        }
    }
}

impl RegionsSection {
    pub fn policy(&self) -> RegionPolicy {
        RegionPolicy::new(self.left_threshold, self.right_threshold)
    }
}

/// [skills] 段：推动收敛参数、特殊物体名、顶抓物体列表
#[derive(Debug, Clone, Deserialize)]
pub struct SkillsSection {
    /// push_to 收敛距离（源与目标欧氏距离）
    #[serde(default = "default_push_distance_threshold")]
    pub push_distance_threshold: f64,
    /// push_to 每步横向位移
    #[serde(default = "default_push_step")]
    pub push_step: f64,
    /// push_to 最大推动步数
    #[serde(default = "default_push_max_steps")]
    pub push_max_steps: usize,
    /// 目标高出源物体超过此值则拒绝推动
    #[serde(default = "default_push_max_height_gap")]
    pub push_max_height_gap: f64,
    /// 单次相对移动的上限
    #[serde(default = "default_delta_move_max")]
    pub delta_move_max: f64,
    /// 液体替代物（pour_out 前提）
    #[serde(default = "default_liquid_object")]
    pub liquid_object: String,
    #[serde(default = "default_serve_point")]
    pub serve_point: String,
    #[serde(default = "default_overlap_area")]
    pub overlap_area: String,
    /// 使用顶抓（Horizontally_Down）的物体
    #[serde(default = "default_top_grasp_objects")]
    pub top_grasp_objects: Vec<String>,
}

fn default_push_distance_threshold() -> f64 {
    0.12
}

fn default_push_step() -> f64 {
    0.06
}

fn default_push_max_steps() -> usize {
    5
}

fn default_push_max_height_gap() -> f64 {
    0.2
}

fn default_delta_move_max() -> f64 {
    0.08
}

fn default_liquid_object() -> String {
    "big_ball".to_string()
}

fn default_serve_point() -> String {
    "serve_point".to_string()
}

fn default_overlap_area() -> String {
    "overlap_area".to_string()
}

fn default_top_grasp_objects() -> Vec<String> {
    vec!["Apple".into(), "Banana".into()]
}

impl Default for SkillsSection {
    fn default() -> Self {
        Self {
            push_distance_threshold: default_push_distance_threshold(),
            push_step: default_push_step(),
            push_max_steps: default_push_max_steps(),
            push_max_height_gap: default_push_max_height_gap(),
            delta_move_max: default_delta_move_max(),
            liquid_object: default_liquid_object(),
            serve_point: default_serve_point(),
            overlap_area: default_overlap_area(),
            top_grasp_objects: default_top_grasp_objects(),
        }
    }
}

/// [transport] 段：双手同步搬运的步长与步数上限
#[derive(Debug, Clone, Deserialize)]
pub struct TransportSection {
    #[serde(default = "default_step_length")]
    pub step_length: f64,
    #[serde(default = "default_transport_max_steps")]
    pub max_steps: usize,
}

fn default_step_length() -> f64 {
    0.065
}

fn default_transport_max_steps() -> usize {
    64
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            step_length: default_step_length(),
            max_steps: default_transport_max_steps(),
        }
    }
}

/// [session] 段：回合记录输出（JSON Lines）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SessionSection {
    pub records_path: Option<PathBuf>,
}

/// [episode] 段：演示程序跑哪个任务、几轮、每回合步数上限
#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeSection {
    #[serde(default = "default_task")]
    pub task: String,
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    #[serde(default = "default_episode_max_steps")]
    pub max_steps: usize,
}

fn default_task() -> String {
    "ServeFruit".to_string()
}

fn default_rounds() -> usize {
    1
}

fn default_episode_max_steps() -> usize {
    20
}

impl Default for EpisodeSection {
    fn default() -> Self {
        Self {
            task: default_task(),
            rounds: default_rounds(),
            max_steps: default_episode_max_steps(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 BIMANUAL__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 BIMANUAL__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("BIMANUAL")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.regions.left_threshold, 0.2);
        assert_eq!(cfg.skills.push_max_steps, 5);
        assert_eq!(cfg.skills.serve_point, "serve_point");
        assert_eq!(cfg.transport.step_length, 0.065);
        assert_eq!(cfg.episode.task, "ServeFruit");
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[skills]\npush_max_steps = 3\n\n[episode]\ntask = \"ServeWater\"\nrounds = 2"
        )
        .unwrap();
        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.skills.push_max_steps, 3);
        assert_eq!(cfg.skills.push_step, 0.06);
        assert_eq!(cfg.episode.task, "ServeWater");
        assert_eq!(cfg.episode.rounds, 2);
        assert_eq!(cfg.transport.max_steps, 64);
    }
}
