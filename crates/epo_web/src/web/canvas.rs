use std::f64::consts::TAU;

use epo::geometry::{Size2, Vec2};
use epo::surface::{Canvas2d, Rgba, TextAlign};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const BACKGROUND: &str = "#000000";

/// [`Canvas2d`] over a `CanvasRenderingContext2d`.
pub(super) struct WebCanvas {
    canvas: web_sys::HtmlCanvasElement,
    ctx: web_sys::CanvasRenderingContext2d,
}

impl WebCanvas {
    pub(super) fn new(canvas: web_sys::HtmlCanvasElement) -> Result<Self, String> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| "canvas: get_context threw".to_string())?
            .ok_or("canvas: missing 2d context".to_string())?
            .dyn_into::<web_sys::CanvasRenderingContext2d>()
            .map_err(|_| "canvas: context is not 2d".to_string())?;
        Ok(Self { canvas, ctx })
    }
}

impl Canvas2d for WebCanvas {
    fn size(&self) -> Size2 {
        Size2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.canvas.set_width(width.max(1.0) as u32);
        self.canvas.set_height(height.max(1.0) as u32);
    }

    #[allow(deprecated)]
    fn clear(&mut self) {
        self.ctx.set_fill_style(&JsValue::from_str(BACKGROUND));
        self.ctx
            .fill_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);
    }

    #[allow(deprecated)]
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        self.ctx.set_fill_style(&JsValue::from_str(&color.css()));
        self.ctx.fill_rect(x as f64, y as f64, w as f64, h as f64);
    }

    #[allow(deprecated)]
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgba) {
        self.ctx.set_fill_style(&JsValue::from_str(&color.css()));
        self.ctx.begin_path();
        let _ = self.ctx.arc(x as f64, y as f64, radius.max(0.0) as f64, 0.0, TAU);
        self.ctx.fill();
    }

    #[allow(deprecated)]
    fn stroke_circle(&mut self, x: f32, y: f32, radius: f32, width: f32, color: Rgba) {
        self.ctx.set_stroke_style(&JsValue::from_str(&color.css()));
        self.ctx.set_line_width(width as f64);
        self.ctx.begin_path();
        let _ = self.ctx.arc(x as f64, y as f64, radius.max(0.0) as f64, 0.0, TAU);
        self.ctx.stroke();
    }

    #[allow(deprecated)]
    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.ctx.set_stroke_style(&JsValue::from_str(&color.css()));
        self.ctx.set_line_width(width as f64);
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.stroke();
    }

    #[allow(deprecated)]
    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.set_fill_style(&JsValue::from_str(&color.css()));
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        self.ctx.close_path();
        self.ctx.fill();
    }

    #[allow(deprecated)]
    fn fill_text(&mut self, text: &str, x: f32, y: f32, size_px: f32, color: Rgba, align: TextAlign) {
        self.ctx.set_fill_style(&JsValue::from_str(&color.css()));
        self.ctx.set_font(&format!("{size_px:.0}px serif"));
        self.ctx.set_text_align(match align {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        });
        let _ = self.ctx.fill_text(text, x as f64, y as f64);
    }
}
