//! Card lifecycle: creation, placement, removal and the per-card busy flag.
//!
//! A card is a positioned content panel with its own [`ParameterBag`]. The
//! manager owns every live card and mirrors it to a [`CardSurface`]; nothing
//! is collected implicitly, so every card created here is eventually passed
//! to [`CardLifecycleManager::remove_card`] by a behavior exit or by teardown.

use std::fmt;

use tracing::{debug, warn};

use crate::error::BehaviorError;
use crate::forces::EpoForces;
use crate::geometry::{Rect, Size2, Vec2};
use crate::params::ParameterBag;
use crate::surface::CardSurface;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique per creation; never reused while the manager lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card-{}", self.0)
    }
}

/// Initial placement (normalized screen fractions).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardOptions {
    pub center: Vec2,
    pub size: Size2,
    pub text: &'static str,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            center: Vec2::CENTER,
            size: Size2::new(0.4, 0.3),
            text: "",
        }
    }
}

impl CardOptions {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            center: Vec2::new(x, y),
            ..Self::default()
        }
    }

    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.size = Size2::new(width, height);
        self
    }

    pub fn with_text(mut self, text: &'static str) -> Self {
        self.text = text;
        self
    }
}

/// Default look of a content section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionVisualState {
    pub section: &'static str,
    pub geometry: &'static str,
    pub density: f32,
    pub speed: f32,
    pub color: [f32; 3],
}

static SECTION_STATES: [SectionVisualState; 9] = [
    SectionVisualState { section: "cover", geometry: "cosmic-genesis", density: 8.0, speed: 0.8, color: [1.0, 1.0, 1.0] },
    SectionVisualState { section: "1.1", geometry: "fracturing-cube", density: 6.0, speed: 0.4, color: [1.0, 0.5, 0.1] },
    SectionVisualState { section: "1.2", geometry: "void-sphere", density: 2.0, speed: 0.2, color: [0.1, 0.1, 0.8] },
    SectionVisualState { section: "1.3", geometry: "interference-pattern", density: 5.0, speed: 0.6, color: [1.0, 0.0, 1.0] },
    SectionVisualState { section: "2.1", geometry: "information-tree", density: 7.0, speed: 0.5, color: [0.0, 1.0, 1.0] },
    SectionVisualState { section: "2.2", geometry: "dual-hypercube", density: 6.0, speed: 0.7, color: [0.5, 0.0, 1.0] },
    SectionVisualState { section: "2.3", geometry: "mobius-topology", density: 5.0, speed: 0.3, color: [1.0, 1.0, 0.0] },
    SectionVisualState { section: "6.1", geometry: "spacetime-manifold", density: 9.0, speed: 0.9, color: [0.8, 0.8, 1.0] },
    SectionVisualState { section: "11.2", geometry: "consciousness-web", density: 10.0, speed: 1.0, color: [1.0, 0.8, 1.0] },
];

/// Visual state for `section`; unknown ids get the cover state.
pub fn section_visual_state(section: &str) -> &'static SectionVisualState {
    SECTION_STATES
        .iter()
        .find(|s| s.section == section)
        .unwrap_or(&SECTION_STATES[0])
}

pub fn section_visual_states() -> &'static [SectionVisualState] {
    &SECTION_STATES
}

#[derive(Debug, Clone)]
pub struct Card {
    pub id: CardId,
    pub section: String,
    pub geometry: &'static str,
    pub rect: Rect,
    pub opacity: f32,
    pub scale: f32,
    pub text: &'static str,
    pub params: ParameterBag,
    busy: bool,
}

impl Card {
    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

pub struct CardLifecycleManager {
    cards: Vec<Card>,
    next_id: u64,
    forces: EpoForces,
    pointer: Vec2,
    visible: bool,
    surface: Box<dyn CardSurface>,
}

impl CardLifecycleManager {
    pub fn new(surface: Box<dyn CardSurface>) -> Self {
        Self {
            cards: Vec::new(),
            next_id: 0,
            forces: EpoForces::default(),
            pointer: Vec2::CENTER,
            visible: true,
            surface,
        }
    }

    /// Create a card with the section's default parameters. Always succeeds.
    pub fn create_card(&mut self, section: &str, options: CardOptions) -> CardId {
        self.next_id += 1;
        let id = CardId(self.next_id);
        let state = section_visual_state(section);

        let mut params = ParameterBag::new();
        params.set("section_color", state.color);
        params.set("density", state.density);
        params.set("speed", state.speed);
        params.set("chaos_intensity", 0.0);
        params.set("time", 0.0);
        params.set("mouse", [0.5, 0.5]);
        write_forces(&mut params, self.forces);
        params.set("global_mouse_x", self.pointer.x);
        params.set("global_mouse_y", self.pointer.y);

        let card = Card {
            id,
            section: section.to_string(),
            geometry: state.geometry,
            rect: Rect::new(options.center, options.size),
            opacity: 1.0,
            scale: 1.0,
            text: options.text,
            params,
            busy: false,
        };
        self.surface.mount(&card);
        debug!(%id, section, "card created");
        self.cards.push(card);
        id
    }

    /// Remove a card. Unknown or already-removed ids are a no-op.
    pub fn remove_card(&mut self, id: CardId) -> bool {
        let Some(i) = self.cards.iter().position(|c| c.id == id) else {
            return false;
        };
        self.cards.remove(i);
        self.surface.unmount(id);
        debug!(%id, "card removed");
        true
    }

    /// Remove every card; returns how many were live.
    pub fn remove_all(&mut self) -> usize {
        let ids = self.ids();
        for id in &ids {
            self.remove_card(*id);
        }
        ids.len()
    }

    /// Move and resize. Takes effect on the next sync.
    pub fn position_card(&mut self, id: CardId, center: Vec2, size: Size2) -> bool {
        match self.card_mut(id) {
            Some(card) => {
                card.rect = Rect::new(center, size);
                true
            }
            None => {
                warn!(%id, "position_card on unknown card");
                false
            }
        }
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn card_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.card(id).is_some()
    }

    /// Live ids in creation order.
    pub fn ids(&self) -> Vec<CardId> {
        self.cards.iter().map(|c| c.id).collect()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn forces(&self) -> EpoForces {
        self.forces
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.surface.set_visible(visible);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Mark `ids` busy for one behavior run.
    ///
    /// Checks every id before touching any flag, so a rejected claim leaves
    /// the cards as they were.
    pub fn claim(&mut self, ids: &[CardId]) -> Result<(), BehaviorError> {
        for (k, id) in ids.iter().enumerate() {
            if ids[..k].contains(id) {
                return Err(BehaviorError::DuplicateCard(*id));
            }
            let card = self.card(*id).ok_or(BehaviorError::UnknownCard(*id))?;
            if card.busy {
                return Err(BehaviorError::CardBusy(*id));
            }
        }
        for id in ids {
            if let Some(card) = self.card_mut(*id) {
                card.busy = true;
            }
        }
        Ok(())
    }

    /// Clear the busy flag; removed cards are skipped.
    pub fn release(&mut self, ids: &[CardId]) {
        for id in ids {
            if let Some(card) = self.card_mut(*id) {
                card.busy = false;
            }
        }
    }

    pub fn is_busy(&self, id: CardId) -> bool {
        self.card(id).is_some_and(|c| c.busy)
    }

    /// Store the EPO quad and write it to every live card.
    pub fn set_epo_forces(&mut self, forces: EpoForces) {
        self.forces = forces;
        for card in &mut self.cards {
            write_forces(&mut card.params, forces);
        }
    }

    /// Normalized pointer position for every card.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = Vec2::new(x, y);
        for card in &mut self.cards {
            card.params.set("global_mouse_x", x);
            card.params.set("global_mouse_y", y);
        }
    }

    /// Scroll-derived globals pushed to every card.
    pub fn set_scroll_progress(&mut self, progress: f32) {
        let p = progress.clamp(0.0, 1.0);
        let density = (2.0 * p).min(1.0);
        let consciousness = (2.0 * (p - 0.4)).clamp(0.0, 1.0);
        for card in &mut self.cards {
            card.params.set("cosmic_time", p);
            card.params.set("information_density", density);
            card.params.set("consciousness_level", consciousness);
        }
    }

    /// Write one parameter to every live card.
    pub fn set_all(&mut self, name: &str, value: f32) {
        for card in &mut self.cards {
            card.params.set(name, value);
        }
    }

    /// Advance each card's `time` by `dt_secs`.
    pub fn advance_time(&mut self, dt_secs: f32) {
        for card in &mut self.cards {
            let t = card.params.number_or("time", 0.0) + dt_secs;
            card.params.set("time", t);
        }
    }

    /// Push every card's current state to the surface.
    pub fn sync(&mut self) {
        for card in &mut self.cards {
            card.params.take_changes();
            self.surface.sync(card);
        }
    }
}

fn write_forces(params: &mut ParameterBag, f: EpoForces) {
    params.set("epo_integration", f.integration);
    params.set("epo_dispersion", f.dispersion);
    params.set("information_density", f.information);
    params.set("consciousness_level", f.consciousness);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingCardSurface;

    fn manager() -> (CardLifecycleManager, RecordingCardSurface) {
        let surface = RecordingCardSurface::new();
        (CardLifecycleManager::new(Box::new(surface.clone())), surface)
    }

    #[test]
    fn ids_are_unique_and_display() {
        let (mut m, _) = manager();
        let a = m.create_card("cover", CardOptions::default());
        m.remove_card(a);
        let b = m.create_card("cover", CardOptions::default());
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "card-1");
        assert_eq!(b.to_string(), "card-2");
    }

    #[test]
    fn removal_is_idempotent() {
        let (mut m, surface) = manager();
        let a = m.create_card("1.1", CardOptions::at(0.3, 0.4));
        let b = m.create_card("1.2", CardOptions::at(0.6, 0.4));
        assert!(m.remove_card(a));
        assert!(!m.remove_card(a));
        assert!(!m.remove_card(CardId(999)));
        assert_eq!(m.ids(), vec![b]);
        assert_eq!(surface.live_count(), 1);
        assert_eq!(surface.log().borrow().unmounts, 1);
    }

    #[test]
    fn section_defaults_seed_the_bag() {
        let (mut m, _) = manager();
        let id = m.create_card("2.2", CardOptions::default());
        let card = m.card(id).map(|c| c.params.clone()).unwrap_or_default();
        assert_eq!(card.color("section_color"), Some([0.5, 0.0, 1.0]));
        assert_eq!(card.number("density"), Some(6.0));
        assert_eq!(card.number("chaos_intensity"), Some(0.0));
        assert_eq!(card.vec2("mouse"), Some([0.5, 0.5]));
        assert_eq!(card.number("epo_integration"), Some(0.5));
        assert_eq!(m.card(id).map(|c| c.geometry), Some("dual-hypercube"));

        let unknown = m.create_card("no-such-section", CardOptions::default());
        assert_eq!(m.card(unknown).map(|c| c.geometry), Some("cosmic-genesis"));
    }

    #[test]
    fn claims_are_all_or_nothing() {
        let (mut m, _) = manager();
        let a = m.create_card("cover", CardOptions::default());
        let b = m.create_card("cover", CardOptions::default());
        assert_eq!(m.claim(&[a, a]), Err(BehaviorError::DuplicateCard(a)));
        assert_eq!(m.claim(&[a, CardId(77)]), Err(BehaviorError::UnknownCard(CardId(77))));
        assert!(!m.is_busy(a));
        assert_eq!(m.claim(&[a]), Ok(()));
        assert_eq!(m.claim(&[b, a]), Err(BehaviorError::CardBusy(a)));
        assert!(!m.is_busy(b));
        m.release(&[a]);
        assert_eq!(m.claim(&[a, b]), Ok(()));
    }

    #[test]
    fn global_pushes_reach_every_card() {
        let (mut m, _) = manager();
        let a = m.create_card("cover", CardOptions::default());
        let b = m.create_card("2.1", CardOptions::default());
        m.set_epo_forces(EpoForces::new(0.9, 0.1, 0.8, 0.7));
        m.set_pointer(0.2, 0.9);
        m.set_scroll_progress(0.6);
        m.advance_time(0.5);
        for id in [a, b] {
            let p = m.card(id).map(|c| c.params.clone()).unwrap_or_default();
            assert_eq!(p.number("epo_integration"), Some(0.9));
            assert_eq!(p.number("global_mouse_y"), Some(0.9));
            assert_eq!(p.number("cosmic_time"), Some(0.6));
            assert_eq!(p.number("information_density"), Some(1.0));
            assert!((p.number_or("consciousness_level", 0.0) - 0.4).abs() < 1e-6);
            assert_eq!(p.number("time"), Some(0.5));
        }
    }

    #[test]
    fn sync_mirrors_rects() {
        let (mut m, surface) = manager();
        let a = m.create_card("cover", CardOptions::default());
        m.position_card(a, Vec2::new(0.2, 0.3), Size2::new(0.1, 0.1));
        assert!(!m.position_card(CardId(50), Vec2::ZERO, Size2::new(0.1, 0.1)));
        m.sync();
        let log = surface.log();
        let rect = log.borrow().live.get(&a).copied();
        assert_eq!(rect.map(|r| r.center), Some(Vec2::new(0.2, 0.3)));
        assert_eq!(m.remove_all(), 1);
        assert_eq!(surface.live_count(), 0);
    }
}
