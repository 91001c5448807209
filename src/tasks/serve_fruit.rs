//! ServeFruit：把苹果和香蕉放进碗里，双手端碗送到递送点
//!
//! 碗太大，单手不能抓：先把碗推到重叠区，再分别放入水果，最后双手托起碗同步搬运。

use std::sync::Arc;

use super::{is_served, unknown_variant, TaskError, TaskScenario};
use crate::sim::{ObjectSpec, SceneSimulator};
use crate::skills::{SkillInvocation as S, SkillPair};

const APPLE_Z: f64 = 0.82;
const BANANA_Z: f64 = 0.81;
const BOWL_Z: f64 = 0.81;
const BOWL_X: f64 = 0.6;
const BOWL_Y: f64 = 0.3;

/// (apple_x, apple_y, banana_x, banana_y)
type FruitLayout = (f64, f64, f64, f64);

const SAME_SIDE: [FruitLayout; 2] = [(0.25, 0.5, 0.45, 0.6), (0.25, -0.5, 0.45, -0.6)];
const SPLIT: [FruitLayout; 2] = [(0.45, -0.6, 0.45, 0.6), (0.45, 0.55, 0.45, -0.6)];

const VARIANTS: [&str; 4] = [
    "same_fruits_same_bowl",
    "same_fruits_diff_bowl",
    "diff_fruit_left_bowl",
    "diff_fruit_right_bowl",
];

const DESCRIPTION: &str = "There are an apple, a banana and a large bowl on the table. \
The bowl is not graspable with one single hand. \
Grasp the fruits and release them into the bowl, then serve the bowl to the human user at the serve point (0.6, 0.0, 1.0). \
Do not release the bowl at the serve point, and do not release the fruits in the overlap area. \
Marked points: Origin_right_hand, Origin_left_hand, Apple, Banana, Bowl, overlap_area, serve_point; \
names starting with Origin_ are initial positions.";

pub struct ServeFruit;

impl ServeFruit {
    /// 水果布局与碗所在的一侧（+1 左，-1 右）
    fn layout(variant: &str, round: usize) -> Option<(FruitLayout, f64)> {
        let pick = round % 2;
        let layout = match variant {
            "same_fruits_same_bowl" => {
                let fruits = SAME_SIDE[pick];
                (fruits, fruits.1.signum())
            }
            "same_fruits_diff_bowl" => {
                let fruits = SAME_SIDE[pick];
                (fruits, -fruits.1.signum())
            }
            "diff_fruit_left_bowl" => (SPLIT[pick], 1.0),
            "diff_fruit_right_bowl" => (SPLIT[pick], -1.0),
            _ => return None,
        };
        Some(layout)
    }
}

impl TaskScenario for ServeFruit {
    fn name(&self) -> &'static str {
        "ServeFruit"
    }

    fn variants(&self) -> &'static [&'static str] {
        &VARIANTS
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn build_scene(&self, variant: &str, round: usize) -> Result<Arc<SceneSimulator>, TaskError> {
        let ((ax, ay, bx, by), bowl_side) =
            Self::layout(variant, round).ok_or_else(|| unknown_variant(self.name(), variant))?;

        let sim = Arc::new(SceneSimulator::new());
        sim.add_object(ObjectSpec::marker("serve_point", [0.6, 0.0, 1.0]))?;
        sim.add_object(ObjectSpec::marker("overlap_area", [0.6, 0.0, BOWL_Z]))?;
        sim.add_object(ObjectSpec::marker("Origin_left_hand", [0.3, 0.5, 1.1]))?;
        sim.add_object(ObjectSpec::marker("Origin_right_hand", [0.3, -0.5, 1.1]))?;
        sim.add_object(ObjectSpec::item("Apple", [ax, ay, APPLE_Z]))?;
        sim.add_object(ObjectSpec::item("Banana", [bx, by, BANANA_Z]))?;
        sim.add_object(ObjectSpec::container("Bowl", [BOWL_X, bowl_side * BOWL_Y, BOWL_Z]).frozen())?;
        sim.add_side_anchors("Bowl", 0.1)?;
        tracing::debug!(variant, round, "ServeFruit scene ready");
        Ok(sim)
    }

    fn check_success(&self, scene: &SceneSimulator) -> bool {
        let apple = is_served(scene, "Apple", "serve_point");
        let banana = is_served(scene, "Banana", "serve_point");
        if !apple {
            tracing::info!("the apple is not lifted with the bowl");
        }
        if !banana {
            tracing::info!("the banana is not lifted with the bowl");
        }
        apple && banana
    }

    fn scripted_plan(&self, scene: &SceneSimulator) -> Vec<SkillPair> {
        let y_of = |name: &str| scene.position_of(name).map(|p| p.y).unwrap_or_default();
        let (apple_y, banana_y, bowl_y) = (y_of("Apple"), y_of("Banana"), y_of("Bowl"));

        let mut plan = Vec::new();
        let push = S::push_to("Bowl", "overlap_area");
        if bowl_y < 0.0 {
            plan.push(SkillPair::new(S::wait(), push));
        } else {
            plan.push(SkillPair::new(push, S::wait()));
        }

        if apple_y * banana_y < 0.0 {
            if apple_y < 0.0 {
                plan.extend([
                    SkillPair::new(S::move_and_grasp("Banana"), S::move_and_grasp("Apple")),
                    SkillPair::new(S::wait(), S::move_above("Bowl")),
                    SkillPair::new(S::wait(), S::release()),
                    SkillPair::new(S::move_above("Bowl"), S::move_to("Origin_right_hand")),
                    SkillPair::new(S::release(), S::wait()),
                ]);
            } else {
                plan.extend([
                    SkillPair::new(S::move_and_grasp("Apple"), S::move_and_grasp("Banana")),
                    SkillPair::new(
                        S::new("move_above", [("obj_name", "Bowl"), ("offset", "up")]),
                        S::wait(),
                    ),
                    SkillPair::new(S::release(), S::wait()),
                    SkillPair::new(S::move_to("Origin_left_hand"), S::move_above("Bowl")),
                    SkillPair::new(S::wait(), S::release()),
                ]);
            }
        } else {
            let one_side = |inv: S| {
                if apple_y > 0.0 {
                    SkillPair::new(inv, S::wait())
                } else {
                    SkillPair::new(S::wait(), inv)
                }
            };
            for fruit in ["Apple", "Banana"] {
                plan.push(one_side(S::move_and_grasp(fruit)));
                plan.push(one_side(S::move_above("Bowl")));
                plan.push(one_side(S::release()));
            }
        }

        plan.push(SkillPair::new(S::hold_up("Bowl"), S::hold_up("Bowl")));
        plan.push(SkillPair::new(S::move_to("serve_point"), S::move_to("serve_point")));
        plan
    }
}
