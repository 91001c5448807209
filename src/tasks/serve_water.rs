//! ServeWater：把蓝杯里的水倒进黄杯，放回蓝杯，再把黄杯送到递送点
//!
//! 水用一个小球（big_ball）代替，初始冻结在蓝杯里；倒水即解冻并让它落进下方的杯子。

use std::sync::Arc;

use super::{is_served, unknown_variant, TaskError, TaskScenario};
use crate::sim::{ObjectSpec, SceneSimulator};
use crate::skills::{SkillInvocation as S, SkillPair};

const CUP_Z: f64 = 0.86;
const CUP_ANCHOR: f64 = 0.05;
const BALL: &str = "big_ball";

const VARIANTS: [&str; 4] = [
    "left_blue_right_yellow",
    "left_yellow_right_blue",
    "both_left",
    "both_right",
];

const DESCRIPTION: &str = "There are two cups on the table: a blue cup filled with water and an empty yellow cup. \
Pour the water from the blue cup into the yellow cup, put the blue cup back, and serve the water to the human user \
at the serve point (0.8, 0.0, 1.2). Do not release the cup at the serve point. \
Marked points: Origin_blue_cup, Origin_yellow_cup, yellow_cup, blue_cup, serve_point, overlap_area; \
names starting with Origin_ are initial positions and are not used for grasping.";

pub struct ServeWater;

impl ServeWater {
    /// (blue_x, blue_y, yellow_x, yellow_y)；两杯横向距中线之差不小于 0.15
    fn layout(variant: &str) -> Option<(f64, f64, f64, f64)> {
        match variant {
            "left_blue_right_yellow" => Some((0.42, 0.4, 0.6, -0.25)),
            "left_yellow_right_blue" => Some((0.4, -0.4, 0.6, 0.25)),
            "both_left" => Some((0.42, 0.42, 0.6, 0.25)),
            "both_right" => Some((0.4, -0.42, 0.6, -0.25)),
            _ => None,
        }
    }
}

impl TaskScenario for ServeWater {
    fn name(&self) -> &'static str {
        "ServeWater"
    }

    fn variants(&self) -> &'static [&'static str] {
        &VARIANTS
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn build_scene(&self, variant: &str, _round: usize) -> Result<Arc<SceneSimulator>, TaskError> {
        let (bx, by, yx, yy) = Self::layout(variant).ok_or_else(|| unknown_variant(self.name(), variant))?;

        let sim = Arc::new(SceneSimulator::new());
        sim.add_object(ObjectSpec::marker("serve_point", [0.8, 0.0, 1.2]))?;
        sim.add_object(ObjectSpec::marker("overlap_area", [0.6, 0.0, CUP_Z]))?;
        sim.add_object(ObjectSpec::marker("Origin_blue_cup", [bx, by, CUP_Z]))?;
        sim.add_object(ObjectSpec::marker("Origin_yellow_cup", [yx, yy, CUP_Z]))?;
        sim.add_object(ObjectSpec::container("blue_cup", [bx, by, CUP_Z]).frozen())?;
        sim.add_side_anchors("blue_cup", CUP_ANCHOR)?;
        sim.add_object(ObjectSpec::container("yellow_cup", [yx, yy, CUP_Z]).frozen())?;
        sim.add_side_anchors("yellow_cup", CUP_ANCHOR)?;
        sim.add_object(ObjectSpec::liquid(BALL, [bx, by, CUP_Z + 0.01]).frozen().inside("blue_cup"))?;
        tracing::debug!(variant, "ServeWater scene ready");
        Ok(sim)
    }

    fn check_success(&self, scene: &SceneSimulator) -> bool {
        let poured = scene.parent_of(BALL).as_deref() == Some("yellow_cup");
        let served = is_served(scene, "yellow_cup", "serve_point");
        if !poured {
            tracing::info!("the water is not in the yellow cup");
        }
        if !served {
            tracing::info!("the yellow cup is not at the serve point");
        }
        poured && served
    }

    fn scripted_plan(&self, scene: &SceneSimulator) -> Vec<SkillPair> {
        let y_of = |name: &str| scene.position_of(name).map(|p| p.y).unwrap_or_default();
        let (blue_y, yellow_y) = (y_of("blue_cup"), y_of("yellow_cup"));

        match (blue_y >= 0.0, yellow_y >= 0.0) {
            (true, true) | (false, false) => {
                let left = blue_y >= 0.0;
                let one_side = |inv: S| {
                    if left {
                        SkillPair::new(inv, S::wait())
                    } else {
                        SkillPair::new(S::wait(), inv)
                    }
                };
                vec![
                    one_side(S::move_and_grasp("blue_cup")),
                    one_side(S::move_above("yellow_cup")),
                    one_side(S::pour_out()),
                    one_side(S::move_to("Origin_blue_cup")),
                    one_side(S::release()),
                    one_side(S::move_and_grasp("yellow_cup")),
                    one_side(S::move_to("serve_point")),
                ]
            }
            (false, true) => vec![
                SkillPair::new(S::move_and_grasp("yellow_cup"), S::move_and_grasp("blue_cup")),
                SkillPair::new(S::move_to("overlap_area"), S::wait()),
                SkillPair::new(S::wait(), S::move_above("yellow_cup")),
                SkillPair::new(S::wait(), S::pour_out()),
                SkillPair::new(S::move_to("serve_point"), S::move_to("Origin_blue_cup")),
            ],
            (true, false) => vec![
                SkillPair::new(S::move_and_grasp("blue_cup"), S::move_and_grasp("yellow_cup")),
                SkillPair::new(S::wait(), S::move_to("overlap_area")),
                SkillPair::new(S::move_above("yellow_cup"), S::wait()),
                SkillPair::new(S::pour_out(), S::wait()),
                SkillPair::new(S::move_to("Origin_blue_cup"), S::move_to("serve_point")),
            ],
        }
    }
}
