//! Browser backend.
//!
//! [`Scrubber`] mounts a [`FrameEngine`] into a page: it sizes the host
//! container, pins a canvas stage for one viewport height, loads frames with
//! `HtmlImageElement`, and wires passive scroll, resize and
//! `requestAnimationFrame` callbacks to the engine.

use std::cell::{OnceCell, RefCell};
use std::rc::{Rc, Weak};

use log::{debug, warn, Level};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Document, Event, HtmlCanvasElement, HtmlElement, HtmlImageElement,
    Window,
};

use crate::render::web::CanvasSurface;
use crate::{
    CanvasMetrics, FetchRequest, FrameEngine, FrameFetcher, LoadTicket, OverlayFade,
    ScrollGeometry, ScrubConfig,
};

/// Back-reference from the fetcher to the state that owns it, filled in once
/// the state exists.
type Link = Rc<OnceCell<Weak<RefCell<Shared>>>>;

/// Loads frames through `HtmlImageElement` and reports back to the engine.
///
/// Completions resolve the link at call time, so loads that settle after the
/// scrubber is dropped find nothing and do nothing.
pub struct ImageFetcher {
    link: Link,
}

impl FrameFetcher for ImageFetcher {
    fn fetch(&mut self, request: FetchRequest) -> Result<(), String> {
        let image = HtmlImageElement::new().map_err(|_| "Failed to create image element")?;

        let ticket = request.ticket;
        let link = self.link.clone();
        let target = image.clone();
        // One handler for both events: it runs exactly once and is freed after.
        let settle = Closure::once_into_js(move |event: Event| {
            target.set_onload(None);
            target.set_onerror(None);
            let Some(shared) = link.get().and_then(Weak::upgrade) else {
                return;
            };
            let Ok(mut shared) = shared.try_borrow_mut() else {
                warn!("frame {} settled while the scrubber was busy", ticket.index);
                return;
            };
            if event.type_() == "load" {
                shared.frame_loaded(ticket, target);
            } else {
                shared.frame_failed(ticket);
            }
        });

        image.set_onload(Some(settle.unchecked_ref()));
        image.set_onerror(Some(settle.unchecked_ref()));
        image.set_src(&request.locator);
        Ok(())
    }
}

struct Shared {
    engine: FrameEngine<HtmlImageElement, ImageFetcher>,
    surface: CanvasSurface,
    window: Window,
    container: HtmlElement,
    stage: HtmlElement,
    overlay: Option<HtmlElement>,
    diagnostics: Option<HtmlElement>,
    tick: Option<js_sys::Function>,
    raf_id: Option<i32>,
}

impl Shared {
    fn geometry(&self) -> ScrollGeometry {
        let scroll_y = self.window.scroll_y().unwrap_or(0.0);
        let rect = self.container.get_bounding_client_rect();
        ScrollGeometry::new(
            scroll_y,
            rect.top() + scroll_y,
            rect.height(),
            viewport_height(&self.window),
        )
    }

    fn metrics(&self) -> CanvasMetrics {
        CanvasMetrics::new(
            self.stage.client_width() as f64,
            self.stage.client_height() as f64,
            self.window.device_pixel_ratio(),
        )
    }

    fn mount(&mut self) {
        self.resize_surface();
        let geometry = self.geometry();
        self.engine.mount(&geometry, &mut self.surface);
        self.sync_overlays();
    }

    fn scrolled(&mut self) {
        if !self.engine.on_scroll() {
            return;
        }
        let Some(tick) = &self.tick else {
            return;
        };
        match self.window.request_animation_frame(tick) {
            Ok(id) => self.raf_id = Some(id),
            Err(_) => {
                warn!("requestAnimationFrame failed");
                self.engine.cancel_tick();
            }
        }
    }

    fn animation_frame(&mut self) {
        self.raf_id = None;
        let geometry = self.geometry();
        if self.engine.on_animation_frame(&geometry, &mut self.surface).is_some() {
            self.sync_overlays();
        }
    }

    fn resized(&mut self) {
        let cleared = self.resize_surface();
        let width = viewport_width(&self.window);
        self.engine.on_resize(width, cleared, &mut self.surface);
        // The container may have moved; pick up the new position.
        let geometry = self.geometry();
        self.engine.update(&geometry, &mut self.surface);
        self.sync_overlays();
    }

    /// Returns whether the canvas was cleared.
    fn resize_surface(&mut self) -> bool {
        let metrics = self.metrics();
        match self.surface.resize(metrics) {
            Ok(cleared) => cleared,
            Err(err) => {
                warn!("canvas resize failed: {err}");
                true
            }
        }
    }

    fn frame_loaded(&mut self, ticket: LoadTicket, image: HtmlImageElement) {
        self.engine.on_frame_loaded(ticket, image, &mut self.surface);
    }

    fn frame_failed(&mut self, ticket: LoadTicket) {
        self.engine.on_frame_failed(ticket);
    }

    fn sync_overlays(&self) {
        if let Some(label) = &self.diagnostics {
            label.set_text_content(Some(&self.engine.diagnostics_label()));
        }
        if let (Some(overlay), Some((opacity, interactive))) =
            (&self.overlay, self.engine.overlay_state())
        {
            let style = overlay.style();
            if style.set_property("opacity", &opacity.to_string()).is_err() {
                warn!("failed to set overlay opacity");
            }
            let pointer_events = if interactive { "auto" } else { "none" };
            if style.set_property("pointer-events", pointer_events).is_err() {
                warn!("failed to set overlay pointer-events");
            }
        }
    }
}

/// A scroll-scrubbed animation mounted into a page.
///
/// Dropping it (or calling `destroy` from JavaScript) removes the listeners,
/// cancels any pending animation frame, removes the stage and turns pending
/// loads into no-ops.
#[wasm_bindgen]
pub struct Scrubber {
    shared: Rc<RefCell<Shared>>,
    window: Window,
    stage: HtmlElement,
    scroll_closure: Closure<dyn FnMut(Event)>,
    resize_closure: Closure<dyn FnMut(Event)>,
    // Referenced by `Shared::tick`; must outlive it.
    _tick_closure: Closure<dyn FnMut(f64)>,
}

#[wasm_bindgen]
impl Scrubber {
    /// Mount into `container` with `total_frames` frames under `frame_base_path`.
    #[wasm_bindgen(constructor)]
    pub fn js_new(
        container: HtmlElement,
        total_frames: u32,
        frame_base_path: String,
    ) -> Result<Scrubber, JsValue> {
        Self::mount(container, ScrubConfig::new(total_frames, frame_base_path))
    }

    #[wasm_bindgen(js_name = currentFrame)]
    pub fn current_frame(&self) -> u32 {
        self.shared.borrow().engine.current_frame()
    }

    #[wasm_bindgen(js_name = totalFrames)]
    pub fn total_frames(&self) -> u32 {
        self.shared.borrow().engine.frame_range().total()
    }

    /// Fade `element` in from `start_frame` over `fade_frames` frames.
    #[wasm_bindgen(js_name = setOverlay)]
    pub fn set_overlay(&self, element: HtmlElement, start_frame: u32, fade_frames: u32) {
        let mut shared = self.shared.borrow_mut();
        shared.engine.set_overlay(Some(OverlayFade::new(start_frame, fade_frames)));
        shared.overlay = Some(element);
        shared.sync_overlays();
    }

    /// Unmount. Equivalent to dropping the scrubber.
    pub fn destroy(self) {}
}

impl Scrubber {
    /// Mount into `container` with a full configuration.
    ///
    /// The container's height is set so scroll travel is proportional to the
    /// frame count; a sticky stage holding the canvas is appended to it.
    pub fn mount(container: HtmlElement, config: ScrubConfig) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("No window available")?;
        let document = window.document().ok_or("No document available")?;

        let (stage, canvas, diagnostics) =
            build_stage(&document, &container, config.container_height())?;
        let surface = CanvasSurface::new(canvas).map_err(|e| JsValue::from_str(&e))?;

        let link: Link = Rc::new(OnceCell::new());
        let fetcher = ImageFetcher { link: link.clone() };
        let engine = FrameEngine::new(config, fetcher, viewport_width(&window))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let shared = Rc::new(RefCell::new(Shared {
            engine,
            surface,
            window: window.clone(),
            container,
            stage: stage.clone(),
            overlay: None,
            diagnostics,
            tick: None,
            raf_id: None,
        }));
        let _ = link.set(Rc::downgrade(&shared));

        let weak = Rc::downgrade(&shared);
        let tick_closure = Closure::wrap(Box::new(move |_timestamp: f64| {
            if let Some(shared) = weak.upgrade() {
                shared.borrow_mut().animation_frame();
            }
        }) as Box<dyn FnMut(f64)>);
        let tick: &js_sys::Function = tick_closure.as_ref().unchecked_ref();
        shared.borrow_mut().tick = Some(tick.clone());

        let weak = Rc::downgrade(&shared);
        let scroll_closure = Closure::wrap(Box::new(move |_event: Event| {
            if let Some(shared) = weak.upgrade() {
                shared.borrow_mut().scrolled();
            }
        }) as Box<dyn FnMut(Event)>);

        let weak = Rc::downgrade(&shared);
        let resize_closure = Closure::wrap(Box::new(move |_event: Event| {
            if let Some(shared) = weak.upgrade() {
                shared.borrow_mut().resized();
            }
        }) as Box<dyn FnMut(Event)>);

        let options = AddEventListenerOptions::new();
        options.set_passive(true);
        window.add_event_listener_with_callback_and_add_event_listener_options(
            "scroll",
            scroll_closure.as_ref().unchecked_ref(),
            &options,
        )?;
        window.add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref())?;

        shared.borrow_mut().mount();
        debug!("scrubber mounted");

        Ok(Self {
            shared,
            window,
            stage,
            scroll_closure,
            resize_closure,
            _tick_closure: tick_closure,
        })
    }

    /// Run `f` against the engine.
    pub fn with_engine<R>(
        &self,
        f: impl FnOnce(&FrameEngine<HtmlImageElement, ImageFetcher>) -> R,
    ) -> R {
        f(&self.shared.borrow().engine)
    }
}

impl Drop for Scrubber {
    fn drop(&mut self) {
        let scroll = self.scroll_closure.as_ref().unchecked_ref();
        let _ = self.window.remove_event_listener_with_callback("scroll", scroll);
        let resize = self.resize_closure.as_ref().unchecked_ref();
        let _ = self.window.remove_event_listener_with_callback("resize", resize);

        if let Ok(mut shared) = self.shared.try_borrow_mut() {
            if let Some(id) = shared.raf_id.take() {
                let _ = self.window.cancel_animation_frame(id);
            }
            shared.tick = None;
            shared.engine.teardown();
        }
        self.stage.remove();
        debug!("scrubber unmounted");
    }
}

/// Size the container and append the sticky stage, its canvas and (in debug
/// builds) the frame counter.
fn build_stage(
    document: &Document,
    container: &HtmlElement,
    container_height: f64,
) -> Result<(HtmlElement, HtmlCanvasElement, Option<HtmlElement>), JsValue> {
    let style = container.style();
    style.set_property("position", "relative")?;
    style.set_property("width", "100%")?;
    style.set_property("height", &format!("{container_height}px"))?;

    let stage: HtmlElement = document.create_element("div")?.dyn_into()?;
    let style = stage.style();
    style.set_property("position", "sticky")?;
    style.set_property("top", "0")?;
    style.set_property("width", "100%")?;
    style.set_property("height", "100vh")?;
    style.set_property("overflow", "hidden")?;

    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    canvas.style().set_property("display", "block")?;
    stage.append_child(&canvas)?;

    let diagnostics = if cfg!(debug_assertions) {
        let label: HtmlElement = document.create_element("div")?.dyn_into()?;
        let style = label.style();
        style.set_property("position", "absolute")?;
        style.set_property("bottom", "16px")?;
        style.set_property("right", "16px")?;
        style.set_property("padding", "8px 16px")?;
        style.set_property("border-radius", "8px")?;
        style.set_property("background", "rgba(0,0,0,0.5)")?;
        style.set_property("color", "#fff")?;
        style.set_property("font", "14px monospace")?;
        stage.append_child(&label)?;
        Some(label)
    } else {
        None
    };

    container.append_child(&stage)?;
    Ok((stage, canvas, diagnostics))
}

fn viewport_width(window: &Window) -> f64 {
    window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

fn viewport_height(window: &Window) -> f64 {
    window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

/// Route `log` output to the browser console and install the panic hook.
///
/// Only the first call installs a logger.
pub fn init_logging(level: Level) {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(level);
}

#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging_js(verbose: bool) {
    init_logging(if verbose { Level::Debug } else { Level::Warn });
}
