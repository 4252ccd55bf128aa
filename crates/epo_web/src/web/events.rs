use std::cell::RefCell;
use std::rc::Rc;

use epo::input::{InputEvent, Key};
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::{with_runtime, Hud};
use crate::layout::scroll_metrics;

/// Current document scroll position as an input event.
pub(super) fn current_scroll(window: &web_sys::Window) -> Option<InputEvent> {
    let y = window.scroll_y().ok()?;
    let root = window.document()?.document_element()?;
    let inner = window.inner_height().ok()?.as_f64()?;
    let (y, max) = scroll_metrics(y, root.scroll_height() as f64, inner);
    Some(InputEvent::Scroll { y, max })
}

pub(super) fn viewport(window: &web_sys::Window) -> (f32, f32) {
    let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1280.0);
    let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(720.0);
    (w as f32, h as f32)
}

fn push(event: InputEvent) {
    with_runtime(|rt| rt.show.handle_input(event));
}

fn listen(window: &web_sys::Window, name: &str, passive: bool, f: impl FnMut(web_sys::Event) + 'static) {
    let cb = Closure::wrap(Box::new(f) as Box<dyn FnMut(web_sys::Event)>);
    let opts = web_sys::AddEventListenerOptions::new();
    opts.set_passive(passive);
    if window
        .add_event_listener_with_callback_and_add_event_listener_options(name, cb.as_ref().unchecked_ref(), &opts)
        .is_err()
    {
        warn!(event = name, "listener registration failed");
    }
    // Listeners live for the page.
    cb.forget();
}

/// Forward window events into the engine's input queue.
pub(super) fn attach(window: &web_sys::Window) {
    let w = window.clone();
    listen(window, "scroll", true, move |_| {
        if let Some(ev) = current_scroll(&w) {
            push(ev);
        }
    });

    // wheel deltas are damped by the engine, which then asks for a scroll
    listen(window, "wheel", false, |e| {
        if let Some(wheel) = e.dyn_ref::<web_sys::WheelEvent>() {
            e.prevent_default();
            push(InputEvent::Wheel {
                delta_y: wheel.delta_y() as f32,
            });
        }
    });

    listen(window, "keydown", false, |e| {
        if let Some(k) = e.dyn_ref::<web_sys::KeyboardEvent>() {
            let key = Key::from_dom(&k.key());
            if matches!(key, Key::Space | Key::ArrowUp | Key::ArrowDown | Key::Home | Key::End) {
                e.prevent_default();
            }
            push(InputEvent::Key(key));
        }
    });

    listen(window, "mousemove", true, |e| {
        if let Some(m) = e.dyn_ref::<web_sys::MouseEvent>() {
            push(InputEvent::PointerMove {
                x: m.client_x() as f32,
                y: m.client_y() as f32,
            });
        }
    });

    let w = window.clone();
    listen(window, "resize", true, move |_| {
        let (width, height) = viewport(&w);
        push(InputEvent::Resize { width, height });
    });

    listen(window, "touchstart", true, |e| {
        if let Some(t) = e.dyn_ref::<web_sys::TouchEvent>().and_then(|t| t.changed_touches().get(0)) {
            push(InputEvent::TouchStart { y: t.client_y() as f32 });
        }
    });

    listen(window, "touchend", true, |e| {
        if let Some(t) = e.dyn_ref::<web_sys::TouchEvent>().and_then(|t| t.changed_touches().get(0)) {
            push(InputEvent::TouchEnd { y: t.client_y() as f32 });
        }
    });
}

fn request_frame(window: &web_sys::Window, cb: &Closure<dyn FnMut(f64)>) {
    if window.request_animation_frame(cb.as_ref().unchecked_ref()).is_err() {
        warn!("requestAnimationFrame failed; animation stopped");
    }
}

/// Drive tick + render from `requestAnimationFrame` until the runtime is gone.
pub(super) fn start_frame_loop(window: web_sys::Window, hud: Hud) {
    let slot: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&slot);
    let w = window.clone();
    *slot.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
        let alive = with_runtime(|rt| rt.frame(&w, now, hud)).is_some();
        if alive {
            if let Some(cb) = next.borrow().as_ref() {
                request_frame(&w, cb);
            }
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(cb) = slot.borrow().as_ref() {
        request_frame(&window, cb);
    }
}
