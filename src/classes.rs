//! Land-cover class registry: class code to name and display color.
//!
//! Keeps class semantics (legend names, palette) out of the raster values
//! themselves; anything that labels or renders classification output takes a
//! registry by reference.

use serde::{Deserialize, Serialize};

/// One land-cover class: integer code, legend name, hex display color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandCoverClass {
    pub code: u32,
    pub name: String,
    pub color: String,
}

/// Ordered set of land-cover classes for one deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRegistry {
    classes: Vec<LandCoverClass>,
}

impl ClassRegistry {
    /// Build a registry from (code, name, color) triples, sorted by code.
    pub fn new(mut classes: Vec<LandCoverClass>) -> Self {
        classes.sort_by_key(|c| c.code);
        classes.dedup_by_key(|c| c.code);
        Self { classes }
    }

    /// The 12-class legend of the reference deployment.
    pub fn twelve_class_legend() -> Self {
        let entries: [(&str, &str); 12] = [
            ("Bare soil/Rocks", "#114611"),
            ("Builtup", "#33a02c"),
            ("Cultivated irrigation", "#694838"),
            ("Close/Open forest", "#cd853f"),
            ("Cultivated rainfed", "#bc13de"),
            ("Mango", "#bc92de"),
            ("Mangrove/Wetland", "#ebbff2"),
            ("Mining", "#ffc0cb"),
            ("Oil palm/Rubber", "#0bf6fa"),
            ("Salt pan", "#34f709"),
            ("Savanna", "#36f79d"),
            ("Waterbodies", "#3942c4"),
        ];
        Self::new(
            entries
                .iter()
                .enumerate()
                .map(|(i, (name, color))| LandCoverClass {
                    code: i as u32 + 1,
                    name: name.to_string(),
                    color: color.to_string(),
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[LandCoverClass] {
        &self.classes
    }

    /// Class codes in ascending order
    pub fn codes(&self) -> Vec<u32> {
        self.classes.iter().map(|c| c.code).collect()
    }

    pub fn name_of(&self, code: u32) -> Option<&str> {
        self.classes
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.name.as_str())
    }

    pub fn color_of(&self, code: u32) -> Option<&str> {
        self.classes
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.color.as_str())
    }

    /// Hex colors in code order, for palette-based rendering
    pub fn palette(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.color.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twelve_class_legend() {
        let registry = ClassRegistry::twelve_class_legend();
        assert_eq!(registry.len(), 12);
        assert_eq!(registry.codes(), (1..=12).collect::<Vec<u32>>());
        assert_eq!(registry.name_of(2), Some("Builtup"));
        assert_eq!(registry.name_of(12), Some("Waterbodies"));
        assert_eq!(registry.color_of(1), Some("#114611"));
        assert_eq!(registry.name_of(13), None);
    }

    #[test]
    fn test_registry_sorts_and_dedups() {
        let registry = ClassRegistry::new(vec![
            LandCoverClass {
                code: 3,
                name: "c".into(),
                color: "#000000".into(),
            },
            LandCoverClass {
                code: 1,
                name: "a".into(),
                color: "#111111".into(),
            },
            LandCoverClass {
                code: 3,
                name: "dup".into(),
                color: "#222222".into(),
            },
        ]);
        assert_eq!(registry.codes(), vec![1, 3]);
        assert_eq!(registry.name_of(3), Some("c"));
    }
}
