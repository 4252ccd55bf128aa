//! DOM geometry for mirrored cards and document scroll metrics.

use epo::cards::Card;
use epo::geometry::Rect;

/// Class shared by every mirrored card element.
pub const CARD_CLASS: &str = "epo-card";

/// Pixel placement of one card inside a `vw`×`vh` viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardStyle {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
    pub scale: f32,
}

impl CardStyle {
    pub fn from_rect(rect: &Rect, opacity: f32, scale: f32, vw: f32, vh: f32) -> Self {
        let (left, top, width, height) = rect.to_pixels(vw, vh);
        Self {
            left,
            top,
            width,
            height,
            opacity: opacity.clamp(0.0, 1.0),
            scale: scale.max(0.0),
        }
    }

    pub fn of(card: &Card, vw: f32, vh: f32) -> Self {
        Self::from_rect(&card.rect, card.opacity, card.scale, vw, vh)
    }

    /// Inline `style` attribute value.
    pub fn css(&self) -> String {
        format!(
            "position:fixed;left:{:.1}px;top:{:.1}px;width:{:.1}px;height:{:.1}px;opacity:{:.3};transform:scale({:.3});",
            self.left, self.top, self.width, self.height, self.opacity, self.scale
        )
    }
}

/// `(scroll_y, max_scroll)` from document metrics. Pages shorter than the
/// viewport report a zero maximum.
pub fn scroll_metrics(scroll_y: f64, scroll_height: f64, inner_height: f64) -> (f32, f32) {
    let max = (scroll_height - inner_height).max(0.0);
    (scroll_y.clamp(0.0, max) as f32, max as f32)
}

/// Element id for a card's DOM node.
pub fn card_element_id(id: u64) -> String {
    format!("epo-card-{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use epo::geometry::{Size2, Vec2};

    #[test]
    fn rect_maps_to_pixels() {
        let rect = Rect::new(Vec2::new(0.5, 0.5), Size2::new(0.2, 0.1));
        let s = CardStyle::from_rect(&rect, 1.4, 0.5, 1000.0, 800.0);
        assert_eq!(s.left, 400.0);
        assert_eq!(s.top, 360.0);
        assert_eq!(s.width, 200.0);
        assert_eq!(s.height, 80.0);
        assert_eq!(s.opacity, 1.0);
        assert!(s.css().contains("left:400.0px"));
        assert!(s.css().contains("scale(0.500)"));
    }

    #[test]
    fn short_pages_have_no_scroll_range() {
        assert_eq!(scroll_metrics(10.0, 600.0, 800.0), (0.0, 0.0));
        assert_eq!(scroll_metrics(500.0, 5800.0, 800.0), (500.0, 5000.0));
        assert_eq!(scroll_metrics(9000.0, 5800.0, 800.0), (5000.0, 5000.0));
        assert_eq!(card_element_id(7), "epo-card-7");
    }
}
