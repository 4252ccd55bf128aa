//! Named visual parameters pushed to renderers every frame.
//!
//! A [`ParameterBag`] is the uniform/style contract shared by cards, the
//! emergence renderer and the depth view. Writers call [`ParameterBag::set`];
//! the frame's render pass drains [`ParameterBag::take_changes`] and only
//! pushes what actually moved.

use hashbrown::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value", rename_all = "snake_case"))]
pub enum ParamValue {
    Number(f32),
    Vec2([f32; 2]),
    Color([f32; 3]),
    Flag(bool),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f32> {
        match *self {
            ParamValue::Number(v) => Some(v),
            ParamValue::Flag(b) => Some(if b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match *self {
            ParamValue::Flag(b) => Some(b),
            ParamValue::Number(v) => Some(v != 0.0),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<[f32; 2]> {
        match *self {
            ParamValue::Vec2(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<[f32; 3]> {
        match *self {
            ParamValue::Color(c) => Some(c),
            _ => None,
        }
    }

    /// Number of float components when uploaded as a uniform.
    pub fn components(&self) -> usize {
        match self {
            ParamValue::Number(_) | ParamValue::Flag(_) => 1,
            ParamValue::Vec2(_) => 2,
            ParamValue::Color(_) => 3,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Number(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Flag(v)
    }
}

impl From<[f32; 2]> for ParamValue {
    fn from(v: [f32; 2]) -> Self {
        ParamValue::Vec2(v)
    }
}

impl From<[f32; 3]> for ParamValue {
    fn from(v: [f32; 3]) -> Self {
        ParamValue::Color(v)
    }
}

/// Uniform name for a parameter (`crack_formation` -> `u_crack_formation`).
pub fn uniform_name(name: &str) -> String {
    format!("u_{name}")
}

#[derive(Debug, Clone, Default)]
pub struct ParameterBag {
    values: HashMap<String, ParamValue>,
    changed: Vec<String>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value. Returns true when the stored value changed.
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) -> bool {
        let value = value.into();
        match self.values.get_mut(name) {
            Some(existing) if *existing == value => false,
            Some(existing) => {
                *existing = value;
                self.mark_changed(name);
                true
            }
            None => {
                self.values.insert(name.to_string(), value);
                self.mark_changed(name);
                true
            }
        }
    }

    fn mark_changed(&mut self, name: &str) {
        if !self.changed.iter().any(|n| n == name) {
            self.changed.push(name.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f32> {
        self.values.get(name).and_then(ParamValue::as_number)
    }

    pub fn number_or(&self, name: &str, default: f32) -> f32 {
        self.number(name).unwrap_or(default)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.values
            .get(name)
            .and_then(ParamValue::as_flag)
            .unwrap_or(false)
    }

    pub fn color(&self, name: &str) -> Option<[f32; 3]> {
        self.values.get(name).and_then(ParamValue::as_color)
    }

    pub fn vec2(&self, name: &str) -> Option<[f32; 2]> {
        self.values.get(name).and_then(ParamValue::as_vec2)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.changed.retain(|n| n != name);
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names in sorted order (hash order is not stable across runs).
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Changes since the last call, in first-write order.
    pub fn take_changes(&mut self) -> Vec<(String, ParamValue)> {
        let names = std::mem::take(&mut self.changed);
        names
            .into_iter()
            .filter_map(|n| self.values.get(&n).map(|v| (n.clone(), *v)))
            .collect()
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Copy every value from `other` (other wins on conflicts).
    pub fn merge_from(&mut self, other: &ParameterBag) {
        for (name, value) in other.iter() {
            self.set(name, *value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_change_only_when_value_moves() {
        let mut bag = ParameterBag::new();
        assert!(bag.set("stress_level", 0.7));
        assert!(!bag.set("stress_level", 0.7));
        assert!(bag.set("stress_level", 0.8));
        assert_eq!(bag.number("stress_level"), Some(0.8));
    }

    #[test]
    fn take_changes_drains_in_write_order() {
        let mut bag = ParameterBag::new();
        bag.set("b", 1.0);
        bag.set("a", true);
        bag.set("b", 2.0);
        let changes = bag.take_changes();
        let names: Vec<&str> = changes.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(changes[0].1, ParamValue::Number(2.0));
        assert!(bag.take_changes().is_empty());
    }

    #[test]
    fn typed_accessors_convert_flags_and_numbers() {
        let mut bag = ParameterBag::new();
        bag.set("cosmic_pulse", true);
        bag.set("density", 0.0);
        bag.set("section_color", [1.0, 0.5, 0.1]);
        assert!(bag.flag("cosmic_pulse"));
        assert_eq!(bag.number("cosmic_pulse"), Some(1.0));
        assert!(!bag.flag("density"));
        assert_eq!(bag.color("section_color"), Some([1.0, 0.5, 0.1]));
        assert_eq!(bag.color("density"), None);
        assert!(!bag.flag("missing"));
        assert_eq!(bag.number_or("missing", 0.25), 0.25);
    }

    #[test]
    fn remove_drops_pending_change() {
        let mut bag = ParameterBag::new();
        bag.set("explosion_force", 1.0);
        assert!(bag.remove("explosion_force").is_some());
        assert!(!bag.has_changes());
        assert!(bag.remove("explosion_force").is_none());
    }

    #[test]
    fn uniform_names_are_prefixed() {
        assert_eq!(uniform_name("crack_formation"), "u_crack_formation");
        assert_eq!(ParamValue::Color([0.0; 3]).components(), 3);
    }
}
