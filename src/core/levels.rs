//! The fixed 16-tier emergence hierarchy, quantum foam to cosmic mind.

pub const LEVEL_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmergenceLevel {
    pub index: usize,
    pub name: &'static str,
    /// Order-of-magnitude physical scale in metres.
    pub scale: f64,
    pub color: [f32; 3],
    pub geometry: &'static str,
}

const fn level(
    index: usize,
    name: &'static str,
    scale: f64,
    color: [f32; 3],
    geometry: &'static str,
) -> EmergenceLevel {
    EmergenceLevel {
        index,
        name,
        scale,
        color,
        geometry,
    }
}

static LEVELS: [EmergenceLevel; LEVEL_COUNT] = [
    level(0, "Quantum Fields", 1e-18, [1.0, 1.0, 1.0], "quantum-foam"),
    level(1, "Subatomic Particles", 1e-15, [0.9, 0.9, 1.0], "point-particles"),
    level(2, "Atoms", 1e-10, [0.8, 1.0, 0.8], "electron-shells"),
    level(3, "Molecules", 1e-9, [0.7, 0.9, 1.0], "molecular-bonds"),
    level(4, "Macromolecules", 1e-8, [1.0, 0.8, 0.9], "protein-folds"),
    level(5, "Cells", 1e-6, [0.9, 1.0, 0.7], "cellular-membrane"),
    level(6, "Tissues", 1e-4, [1.0, 0.9, 0.8], "tissue-network"),
    level(7, "Organs", 1e-2, [0.8, 0.8, 1.0], "organ-structure"),
    level(8, "Organisms", 1.0, [1.0, 0.8, 0.8], "body-system"),
    level(9, "Communities", 1e3, [0.9, 0.9, 0.9], "social-network"),
    level(10, "Ecosystems", 1e6, [0.7, 1.0, 0.7], "ecosystem-web"),
    level(11, "Planets", 1e7, [0.6, 0.8, 1.0], "planetary-sphere"),
    level(12, "Solar Systems", 1e13, [1.0, 1.0, 0.6], "orbital-system"),
    level(13, "Galaxies", 1e21, [0.8, 0.6, 1.0], "spiral-galaxy"),
    level(14, "Galaxy Clusters", 1e24, [1.0, 0.7, 0.9], "cluster-web"),
    level(15, "Universal Consciousness", 1e26, [1.0, 1.0, 1.0], "cosmic-neural-web"),
];

/// Read-only catalog. Zero-sized; every instance sees the same table.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmergenceLevelTable;

impl EmergenceLevelTable {
    pub fn ordered(&self) -> &'static [EmergenceLevel] {
        &LEVELS
    }

    pub fn get(&self, index: usize) -> Option<&'static EmergenceLevel> {
        LEVELS.get(index)
    }

    pub fn len(&self) -> usize {
        LEVEL_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn last_index(&self) -> usize {
        LEVEL_COUNT - 1
    }

    /// Next index, clamped at the top.
    pub fn next(&self, index: usize) -> usize {
        (index + 1).min(self.last_index())
    }

    /// Previous index, clamped at 0.
    pub fn previous(&self, index: usize) -> usize {
        index.saturating_sub(1).min(self.last_index())
    }

    pub fn find_by_name(&self, name: &str) -> Option<&'static EmergenceLevel> {
        LEVELS.iter().find(|l| l.name.eq_ignore_ascii_case(name))
    }
}

/// Emergence level shown for a content section.
pub fn level_for_section(section_id: &str) -> Option<usize> {
    let level = match section_id {
        "cover" => 0,
        "1.1" => 2,
        "1.2" => 13,
        "1.3" => 1,
        "2.1" => 4,
        "2.2" => 8,
        "2.3" => 15,
        "6.1" => 11,
        "7.2" => 1,
        "9" => 14,
        "11.2" => 15,
        _ => return None,
    };
    Some(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_contiguous_levels_ordered_by_scale() {
        let t = EmergenceLevelTable;
        assert_eq!(t.ordered().len(), 16);
        for (i, l) in t.ordered().iter().enumerate() {
            assert_eq!(l.index, i);
            for c in l.color {
                assert!((0.0..=1.0).contains(&c));
            }
        }
        for w in t.ordered().windows(2) {
            assert!(w[0].scale < w[1].scale, "{} !< {}", w[0].name, w[1].name);
        }
    }

    #[test]
    fn inventory_is_stable() {
        let names: Vec<&str> = EmergenceLevelTable.ordered().iter().map(|l| l.name).collect();
        assert_eq!(names[0], "Quantum Fields");
        assert_eq!(names[8], "Organisms");
        assert_eq!(names[15], "Universal Consciousness");
        assert_eq!(EmergenceLevelTable.get(13).map(|l| l.geometry), Some("spiral-galaxy"));
    }

    #[test]
    fn navigation_clamps_without_wrap() {
        let t = EmergenceLevelTable;
        assert_eq!(t.next(15), 15);
        assert_eq!(t.next(3), 4);
        assert_eq!(t.previous(0), 0);
        assert_eq!(t.previous(7), 6);
        assert!(t.get(16).is_none());
    }

    #[test]
    fn section_levels() {
        assert_eq!(level_for_section("cover"), Some(0));
        assert_eq!(level_for_section("1.2"), Some(13));
        assert_eq!(level_for_section("11.2"), Some(15));
        assert_eq!(level_for_section("nope"), None);
    }
}
