//! 物体分类：由名字推断物体类别，供各技能前置条件检查使用

use serde::{Deserialize, Serialize};

use crate::config::SkillsSection;

/// 场景物体类别
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// 重叠区标记（overlap_area）
    RegionMarker,
    /// 递送点
    ServePoint,
    /// 手部原点标记（Origin_*）
    OriginMarker,
    Bowl,
    Cup,
    /// 液体替代物
    Liquid,
    Other,
}

impl ObjectKind {
    /// 按名字分类；Origin 前缀优先于其他规则
    pub fn classify(name: &str, settings: &SkillsSection) -> Self {
        if name.starts_with("Origin") {
            ObjectKind::OriginMarker
        } else if name == settings.overlap_area {
            ObjectKind::RegionMarker
        } else if name == settings.serve_point {
            ObjectKind::ServePoint
        } else if name == settings.liquid_object {
            ObjectKind::Liquid
        } else if name.contains("Bowl") || name.contains("bowl") {
            ObjectKind::Bowl
        } else if name.contains("cup") || name.contains("Cup") {
            ObjectKind::Cup
        } else {
            ObjectKind::Other
        }
    }

    /// 标记点不是实体，不能被抓取或托举
    pub fn is_marker(self) -> bool {
        matches!(
            self,
            ObjectKind::RegionMarker | ObjectKind::ServePoint | ObjectKind::OriginMarker
        )
    }
}

/// 该物体是否走顶抓（Horizontally_Down）路线；大小写不敏感
pub fn uses_top_grasp(name: &str, settings: &SkillsSection) -> bool {
    settings
        .top_grasp_objects
        .iter()
        .any(|o| o.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_special_names() {
        let s = SkillsSection::default();
        assert_eq!(ObjectKind::classify("overlap_area", &s), ObjectKind::RegionMarker);
        assert_eq!(ObjectKind::classify("serve_point", &s), ObjectKind::ServePoint);
        assert_eq!(ObjectKind::classify("Origin_left_hand", &s), ObjectKind::OriginMarker);
        assert_eq!(ObjectKind::classify("big_ball", &s), ObjectKind::Liquid);
    }

    #[test]
    fn test_classify_containers() {
        let s = SkillsSection::default();
        assert_eq!(ObjectKind::classify("Bowl", &s), ObjectKind::Bowl);
        assert_eq!(ObjectKind::classify("green_bowl", &s), ObjectKind::Bowl);
        assert_eq!(ObjectKind::classify("yellow_cup", &s), ObjectKind::Cup);
        assert_eq!(ObjectKind::classify("Apple", &s), ObjectKind::Other);
        assert!(ObjectKind::ServePoint.is_marker());
        assert!(!ObjectKind::Cup.is_marker());
    }

    #[test]
    fn test_top_grasp_list() {
        let s = SkillsSection::default();
        assert!(uses_top_grasp("apple", &s));
        assert!(uses_top_grasp("Banana", &s));
        assert!(!uses_top_grasp("yellow_cup", &s));
    }
}
