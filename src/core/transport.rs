//! 双手同步搬运
//!
//! 两只手共同托着一个物体时必须一起移动：保持两手间距，把两手中点移到目的地，
//! 每一拍下发一条成对位姿指令。步数 = 最大单轴位移 / 步长（向上取整，有上限），
//! 最后一拍精确落在目标上。

use std::ops::ControlFlow;
use std::sync::Arc;

use nalgebra::Vector3;

use crate::config::TransportSection;
use crate::core::{converge_within, ArmState, SidePair, SimError, Side, SkillError};
use crate::sim::{Pose, Simulator};
use crate::skills::SkillOutcome;

/// 每一拍两手的目标位置；最后一项就是最终目标
pub fn plan_transport(
    left: Vector3<f64>,
    right: Vector3<f64>,
    destination: Vector3<f64>,
    step_length: f64,
    max_steps: usize,
) -> Vec<SidePair<Vector3<f64>>> {
    let midpoint = (left + right) / 2.0;
    let displacement = destination - midpoint;
    let targets = SidePair::new(left + displacement, right + displacement);

    let largest = displacement.amax();
    let steps = if step_length > 0.0 {
        ((largest / step_length).ceil() as usize).min(max_steps.max(1))
    } else {
        1
    };
    if steps <= 1 {
        return vec![targets];
    }

    let delta = displacement / steps as f64;
    let mut plan: Vec<SidePair<Vector3<f64>>> = (1..steps)
        .map(|i| {
            let offset = delta * i as f64;
            SidePair::new(left + offset, right + offset)
        })
        .collect();
    plan.push(targets);
    plan
}

async fn dual_step(sim: Arc<dyn Simulator>, left: Pose, right: Pose, last: bool) -> Result<ControlFlow<()>, SimError> {
    sim.set_dual_end_effector_pose(left, right).await?;
    Ok(if last {
        ControlFlow::Break(())
    } else {
        ControlFlow::Continue(())
    })
}

/// 执行同步搬运；目的地不存在时两侧都得到 ObjectNotFound 失败结果，链路故障上抛
pub async fn synchronized_transport(
    sim: Arc<dyn Simulator>,
    destination: &str,
    settings: &TransportSection,
    states: SidePair<ArmState>,
) -> Result<SidePair<SkillOutcome>, SimError> {
    let goal = match sim.object_pose(destination).await {
        Ok(p) => p,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            let err = SkillError::from(e);
            return Ok(states.map(|_, state| SkillOutcome::failed(&err, state)));
        }
    };

    let start = SidePair::new(
        sim.end_effector_pose(Side::Left).await?,
        sim.end_effector_pose(Side::Right).await?,
    );
    let plan = plan_transport(
        start.left.position,
        start.right.position,
        goal,
        settings.step_length,
        settings.max_steps,
    );
    let last = plan.len().saturating_sub(1);

    let finished = converge_within(plan.len(), |i| {
        let pair = plan[i];
        dual_step(
            sim.clone(),
            Pose::new(pair.left, start.left.orientation),
            Pose::new(pair.right, start.right.orientation),
            i == last,
        )
    })
    .await?;
    tracing::debug!(steps = finished.steps(), destination, "synchronized transport finished");

    let carried = match sim.read_proximity_sensor(Side::Left).await? {
        Some(h) => Some(sim.object_alias(h).await?),
        None => None,
    };
    let narrative = match &carried {
        Some(obj) => format!("The robot's both hands have moved the {obj} to the {destination} together."),
        None => format!("The robot's both hands have moved to the {destination} together."),
    };
    Ok(states.map(|_, state| SkillOutcome::succeeded(narrative.clone(), state, carried.clone())))
}
