//! 技能系统
//!
//! 每个技能实现 [`Skill`] trait，由 [`SkillRegistry`] 按名注册；
//! [`SkillExecutor`] 持有单侧 ArmState 并把技能错误收敛为失败 Outcome，
//! [`ArmHandle`] 把执行器放进独立任务，供协调器并行调度两侧。
//!
//! 内置技能：
//! ```text
//! move_to / move_above   移到物体处（可带 offset）
//! move_and_grasp         侧抓或顶抓
//! push_to                横向推动物体
//! hold_up                从侧面托起大件物体
//! pour_out               倾倒容器内液体
//! release / reset / wait
//! ```

mod context;
mod executor;
mod grasp;
mod hold_up;
mod move_to;
mod pour;
mod push;
mod registry;
mod release;
mod reset;
mod types;
mod wait;
mod worker;

pub use context::{SkillContext, OPEN_HAND_JOINTS};
pub use executor::SkillExecutor;
pub use grasp::GraspSkill;
pub use hold_up::HoldUpSkill;
pub use move_to::{MoveAboveSkill, MoveToSkill};
pub use pour::PourOutSkill;
pub use push::PushToSkill;
pub use registry::{Completed, Skill, SkillRegistry};
pub use release::ReleaseSkill;
pub use reset::{home_joints, ResetSkill};
pub use types::{Direction, Offset, SkillInvocation, SkillOutcome, SkillPair};
pub use wait::WaitSkill;
pub use worker::ArmHandle;
