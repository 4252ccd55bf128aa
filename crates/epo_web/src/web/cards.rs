use std::collections::HashMap;

use epo::cards::{Card, CardId};
use epo::surface::CardSurface;
use tracing::warn;

use crate::layout::{card_element_id, CardStyle, CARD_CLASS};

/// Mirrors engine cards as absolutely positioned `div`s inside a container.
pub(super) struct DomCardSurface {
    document: web_sys::Document,
    container: web_sys::Element,
    nodes: HashMap<CardId, web_sys::Element>,
}

impl DomCardSurface {
    pub(super) fn new(document: web_sys::Document, container: web_sys::Element) -> Self {
        Self {
            document,
            container,
            nodes: HashMap::new(),
        }
    }

    fn viewport(&self) -> (f32, f32) {
        web_sys::window()
            .map(|w| {
                let width = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1280.0);
                let height = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(720.0);
                (width as f32, height as f32)
            })
            .unwrap_or((1280.0, 720.0))
    }

    fn apply(&self, node: &web_sys::Element, card: &Card) {
        let (vw, vh) = self.viewport();
        let _ = node.set_attribute("style", &CardStyle::of(card, vw, vh).css());
        let _ = node.set_attribute("data-geometry", card.geometry);
    }
}

impl CardSurface for DomCardSurface {
    fn mount(&mut self, card: &Card) {
        let node = match self.document.create_element("div") {
            Ok(n) => n,
            Err(_) => {
                warn!(id = %card.id, "could not create card element");
                return;
            }
        };
        node.set_class_name(CARD_CLASS);
        node.set_id(&card_element_id(card.id.0));
        let _ = node.set_attribute("data-section", &card.section);
        node.set_text_content(Some(card.text));
        self.apply(&node, card);
        if self.container.append_child(&node).is_ok() {
            self.nodes.insert(card.id, node);
        }
    }

    fn sync(&mut self, card: &Card) {
        if let Some(node) = self.nodes.get(&card.id) {
            self.apply(node, card);
        }
    }

    fn unmount(&mut self, id: CardId) {
        if let Some(node) = self.nodes.remove(&id) {
            node.remove();
        }
    }

    fn set_visible(&mut self, visible: bool) {
        let style = if visible { "" } else { "display:none;" };
        let _ = self.container.set_attribute("style", style);
    }
}
