//! 协调核心：臂状态、区域策略、物体分类、有界收敛、双臂协调器、会话日志与回合循环

pub mod bounded;
pub mod coordinator;
pub mod episode;
pub mod error;
pub mod object;
pub mod region;
pub mod session;
pub mod state;
pub mod transport;

pub use bounded::{converge_within, Convergence};
pub use coordinator::{Coordinator, DispatchMode, DispatchResult};
pub use episode::{run_episode, EpisodeReport};
pub use error::{CoordinatorError, SimError, SkillError, SkillErrorKind};
pub use object::{uses_top_grasp, ObjectKind};
pub use region::{can_reach, region_of, Region, RegionPolicy};
pub use session::{DispatchRecord, SessionLog, SessionRow, SessionStore};
pub use state::{ArmState, Gripper, Orientation, Side, SidePair};
pub use transport::{plan_transport, synchronized_transport};
