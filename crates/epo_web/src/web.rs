use std::cell::RefCell;

use epo::clock::FrameClock;
use epo::config::{PerformanceProfile, Preferences, StaticConfig};
use epo::content::StaticContent;
use epo::error::InitError;
use epo::orchestrator::{OrchestratorConfig, PresentationMode, PresentationOrchestrator};
use epo::surface::GpuSurface;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

mod canvas;
mod cards;
mod events;
mod storage;
mod webgl;

const EMERGENCE_CANVAS_ID: &str = "epo-emergence";
const SHADER_CANVAS_ID: &str = "epo-emergence-gl";
const CARD_CONTAINER_ID: &str = "epo-cards";

thread_local! {
    static RUNTIME: RefCell<Option<WebRuntime>> = const { RefCell::new(None) };
}

/// Run `f` against the live runtime. `None` before boot and after teardown.
pub(super) fn with_runtime<T>(f: impl FnOnce(&mut WebRuntime) -> T) -> Option<T> {
    RUNTIME.with(|cell| cell.borrow_mut().as_mut().map(f))
}

/// Signals the frame loop writes for the overlay.
#[derive(Clone, Copy)]
pub(super) struct Hud {
    beat: WriteSignal<String>,
    mode: WriteSignal<String>,
    level: WriteSignal<String>,
}

pub(super) struct WebRuntime {
    show: PresentationOrchestrator,
    clock: FrameClock,
    shown_beat: Option<&'static str>,
    shown_mode: Option<PresentationMode>,
    shown_level: Option<usize>,
}

impl WebRuntime {
    fn frame(&mut self, window: &web_sys::Window, now_ms: f64, hud: Hud) {
        let dt = self.clock.tick(now_ms);
        self.show.tick(dt);
        self.show.render();

        if let Some(y) = self.show.take_scroll_request() {
            window.scroll_to_with_x_and_y(0.0, y as f64);
        }

        let beat = self.show.active_beat().map(|b| b.id);
        if beat != self.shown_beat {
            self.shown_beat = beat;
            hud.beat.set(beat.unwrap_or("-").to_string());
        }
        let mode = self.show.mode();
        if Some(mode) != self.shown_mode {
            self.shown_mode = Some(mode);
            hud.mode.set(mode.label().to_string());
        }
        let level = self.show.renderer().current_level();
        if Some(level) != self.shown_level {
            self.shown_level = Some(level);
            hud.level.set(self.show.renderer().current_level_name().to_string());
        }
    }
}

fn canvas_by_id(document: &web_sys::Document, id: &str) -> Result<web_sys::HtmlCanvasElement, InitError> {
    document
        .get_element_by_id(id)
        .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        .ok_or_else(|| InitError::MissingContainer(id.to_string()))
}

fn boot(prefs: Preferences, hud: Hud) -> Result<(), InitError> {
    let window = web_sys::window().ok_or(InitError::NoRenderSurface)?;
    let document = window.document().ok_or(InitError::NoRenderSurface)?;
    let (width, height) = events::viewport(&window);

    let canvas = canvas_by_id(&document, EMERGENCE_CANVAS_ID)?;
    canvas.set_width(width as u32);
    canvas.set_height(height as u32);
    let canvas = canvas::WebCanvas::new(canvas).map_err(|e| {
        web_sys::console::error_1(&e.clone().into());
        InitError::NoRenderSurface
    })?;

    let gpu = canvas_by_id(&document, SHADER_CANVAS_ID).ok().map(|c| {
        c.set_width(width as u32);
        c.set_height(height as u32);
        Box::new(webgl::WebGlSurface::new(c)) as Box<dyn GpuSurface>
    });

    let container = document
        .get_element_by_id(CARD_CONTAINER_ID)
        .ok_or_else(|| InitError::MissingContainer(CARD_CONTAINER_ID.to_string()))?;
    let cards = cards::DomCardSurface::new(document.clone(), container);

    let config = OrchestratorConfig::default().with_viewport(width, height);
    let mut show = PresentationOrchestrator::new(
        config,
        Box::new(canvas),
        gpu,
        Box::new(cards),
        Box::new(StaticContent),
        Box::new(StaticConfig::new(prefs)),
    )?;
    if let Some(ev) = events::current_scroll(&window) {
        show.handle_input(ev);
    }

    RUNTIME.with(|cell| {
        *cell.borrow_mut() = Some(WebRuntime {
            show,
            clock: FrameClock::default(),
            shown_beat: None,
            shown_mode: None,
            shown_level: None,
        });
    });
    events::attach(&window);
    events::start_frame_loop(window, hud);
    Ok(())
}

pub fn start() {
    mount_to_body(|| view! { <App /> });
}

#[component]
fn App() -> impl IntoView {
    let (beat, set_beat) = signal(String::from("-"));
    let (mode, set_mode) = signal(String::from("hybrid"));
    let (level, set_level) = signal(String::new());
    let (status, set_status) = signal(String::new());
    let prefs = RwSignal::new(storage::load_preferences());

    let hud = Hud {
        beat: set_beat,
        mode: set_mode,
        level: set_level,
    };

    Effect::new(move |_| {
        if let Err(e) = boot(prefs.get_untracked(), hud) {
            web_sys::console::error_1(&e.to_string().into());
            set_status.set(e.to_string());
        }
    });

    let choose_mode = move |m: PresentationMode| {
        with_runtime(|rt| rt.show.set_mode(m));
    };

    let update_prefs = move |f: fn(Preferences) -> Preferences| {
        let next = f(prefs.get_untracked());
        prefs.set(next);
        storage::save_preferences(&next);
        with_runtime(|rt| rt.show.apply_preferences(next));
        set_status.set("preferences saved (particle budget applies on reload)".to_string());
    };

    view! {
        <div class="epo-app">
            <canvas id=SHADER_CANVAS_ID class="epo-layer"></canvas>
            <canvas id=EMERGENCE_CANVAS_ID class="epo-layer"></canvas>
            <div id=CARD_CONTAINER_ID class="epo-layer"></div>
            <div class="epo-hud">
                <span class="epo-hud-beat">{move || beat.get()}</span>
                <span class="epo-hud-level">{move || level.get()}</span>
                <span class="epo-hud-mode">{move || mode.get()}</span>
                <button on:click=move |_| choose_mode(PresentationMode::Hybrid)>"Hybrid"</button>
                <button on:click=move |_| choose_mode(PresentationMode::Cards)>"Cards"</button>
                <button on:click=move |_| choose_mode(PresentationMode::Emergence)>"Emergence"</button>
                <button on:click=move |_| choose_mode(PresentationMode::Depth)>"Depth"</button>
                <button on:click=move |_| update_prefs(|p| p.with_performance(PerformanceProfile::Low))>"Low"</button>
                <button on:click=move |_| update_prefs(|p| p.with_performance(PerformanceProfile::High))>"High"</button>
                <button on:click=move |_| {
                    update_prefs(|p| p.with_reduced_motion(!p.accessibility.reduced_motion))
                }>"Reduced motion"</button>
                <span class="epo-hud-status">{move || status.get()}</span>
            </div>
            <div class="epo-scroll-space" style="height: 1000vh"></div>
        </div>
    }
}
