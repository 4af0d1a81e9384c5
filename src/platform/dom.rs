//! Browser DOM surface
//!
//! Binds the page elements, draws cans as nested divs, and queues clicks as
//! `PlayerInput` for the frame loop to feed into the engine.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, MouseEvent, Window};

use super::{DisplaySurface, FeedbackKind, PlayerInput};
use crate::consts::MAX_FRAME_MS;
use crate::sim::{GameEngine, SpawnKind, SpawnTarget};
use crate::tuning::{Tuning, TuningError};

const GOOD_COLOR: &str = "#4FCB53";
const BAD_COLOR: &str = "#F5402C";

const RED_CAN_STYLE: &str = "
.red-can {
  width: 100%;
  height: 100%;
  background-image: url('img/redcan.png');
  background-size: cover;
  background-repeat: no-repeat;
  background-position: center;
  border-radius: 50%;
  animation: popUp 0.5s cubic-bezier(0.17, 0.67, 0.34, 2);
  transform-origin: center;
  cursor: pointer;
}
";

/// Page bootstrap failures
#[derive(Debug, Error)]
pub enum BootError {
    #[error("browser window is unavailable")]
    NoWindow,
    #[error("document is unavailable")]
    NoDocument,
    #[error("missing page element `{0}`")]
    MissingElement(&'static str),
    #[error("page element `{0}` is not an HTML element")]
    NotHtml(&'static str),
    #[error("DOM call failed: {0}")]
    Js(String),
    #[error(transparent)]
    Tuning(#[from] TuningError),
}

impl From<JsValue> for BootError {
    fn from(value: JsValue) -> Self {
        BootError::Js(format!("{:?}", value))
    }
}

/// Clicks waiting for the next frame
pub type InputQueue = Rc<RefCell<VecDeque<PlayerInput>>>;

type ClickHandler = Closure<dyn FnMut(MouseEvent)>;

pub struct DomSurface {
    window: Window,
    document: Document,
    grid: Element,
    score: Element,
    timer: Element,
    feedback: HtmlElement,
    cells: Vec<Element>,
    /// Listener for the can in each cell; dropped when the cell clears
    handlers: Vec<Option<ClickHandler>>,
    inputs: InputQueue,
    /// Bumped on every feedback change so stale auto-clears do nothing
    feedback_generation: Rc<Cell<u32>>,
    feedback_duration_ms: i32,
}

impl DomSurface {
    /// Bind to the page's game elements and inject the red can stylesheet
    pub fn attach(inputs: InputQueue, feedback_duration_ms: u32) -> Result<Self, BootError> {
        let window = web_sys::window().ok_or(BootError::NoWindow)?;
        let document = window.document().ok_or(BootError::NoDocument)?;

        let grid = document
            .query_selector(".game-grid")?
            .ok_or(BootError::MissingElement(".game-grid"))?;
        let score = by_id(&document, "current-cans")?;
        let timer = by_id(&document, "timer")?;
        let feedback = by_id(&document, "achievements")?
            .dyn_into::<HtmlElement>()
            .map_err(|_| BootError::NotHtml("achievements"))?;

        inject_styles(&document)?;

        Ok(Self {
            window,
            document,
            grid,
            score,
            timer,
            feedback,
            cells: Vec::new(),
            handlers: Vec::new(),
            inputs,
            feedback_generation: Rc::new(Cell::new(0)),
            feedback_duration_ms: i32::try_from(feedback_duration_ms).unwrap_or(i32::MAX),
        })
    }

    fn schedule_feedback_clear(&self) {
        let generation = self.feedback_generation.get();
        let current = self.feedback_generation.clone();
        let el = self.feedback.clone();
        let clear = Closure::once_into_js(move || {
            if current.get() == generation {
                el.set_text_content(None);
            }
        });
        if let Err(e) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                clear.unchecked_ref(),
                self.feedback_duration_ms,
            )
        {
            log::warn!("Failed to schedule feedback clear: {:?}", e);
        }
    }
}

impl DisplaySurface for DomSurface {
    fn render_grid(&mut self, cells: usize) {
        self.grid.set_inner_html("");
        self.handlers.clear();
        self.cells.clear();

        for _ in 0..cells {
            let cell = match self.document.create_element("div") {
                Ok(cell) => cell,
                Err(e) => {
                    log::warn!("Failed to create grid cell: {:?}", e);
                    return;
                }
            };
            cell.set_class_name("grid-cell");
            if let Err(e) = self.grid.append_child(&cell) {
                log::warn!("Failed to attach grid cell: {:?}", e);
                return;
            }
            self.cells.push(cell);
            self.handlers.push(None);
        }
    }

    fn render_spawnable(&mut self, target: SpawnTarget, kind: SpawnKind) {
        let Some(cell) = self.cells.get(target.cell).cloned() else {
            log::warn!("No grid cell {} to draw into", target.cell);
            return;
        };

        let wrapper = match self.document.create_element("div") {
            Ok(w) => w,
            Err(e) => {
                log::warn!("Failed to create can: {:?}", e);
                return;
            }
        };
        wrapper.set_class_name("water-can-wrapper");

        let handler = match attach_can(&self.document, &wrapper, target, kind, &self.inputs) {
            Ok(handler) => handler,
            Err(e) => {
                log::warn!("Failed to build can: {:?}", e);
                return;
            }
        };

        cell.set_inner_html("");
        if let Err(e) = cell.append_child(&wrapper) {
            log::warn!("Failed to draw can: {:?}", e);
            return;
        }
        self.handlers[target.cell] = Some(handler);
    }

    fn clear_cell(&mut self, cell: usize) {
        if let Some(el) = self.cells.get(cell) {
            el.set_inner_html("");
        }
        if let Some(slot) = self.handlers.get_mut(cell) {
            *slot = None;
        }
    }

    fn set_score_display(&mut self, value: u32) {
        self.score.set_text_content(Some(&value.to_string()));
    }

    fn set_timer_display(&mut self, seconds: u32) {
        self.timer.set_text_content(Some(&seconds.to_string()));
    }

    fn show_feedback(&mut self, message: &str, kind: FeedbackKind) {
        self.feedback_generation
            .set(self.feedback_generation.get().wrapping_add(1));
        self.feedback.set_text_content(Some(message));

        let color = match kind {
            FeedbackKind::Good => GOOD_COLOR,
            FeedbackKind::Bad => BAD_COLOR,
        };
        let style = self.feedback.style();
        if let Err(e) = style
            .set_property("color", color)
            .and_then(|_| style.set_property("font-weight", "bold"))
        {
            log::warn!("Failed to style feedback: {:?}", e);
        }

        self.schedule_feedback_clear();
    }

    fn clear_feedback(&mut self) {
        self.feedback_generation
            .set(self.feedback_generation.get().wrapping_add(1));
        self.feedback.set_text_content(None);
    }
}

/// Build the inner can element inside `wrapper` and wire its click
fn attach_can(
    document: &Document,
    wrapper: &Element,
    target: SpawnTarget,
    kind: SpawnKind,
    inputs: &InputQueue,
) -> Result<ClickHandler, JsValue> {
    let can = document.create_element("div")?;
    match kind {
        SpawnKind::Collectible => can.set_class_name("water-can"),
        SpawnKind::Hazard => {
            can.set_class_name("red-can");
            can.set_attribute("title", "Don't click!")?;
        }
    }
    wrapper.append_child(&can)?;

    let inputs = inputs.clone();
    let handler = ClickHandler::new(move |event: MouseEvent| {
        event.stop_propagation();
        inputs.borrow_mut().push_back(PlayerInput::Click(target));
    });
    can.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
    Ok(handler)
}

fn by_id(document: &Document, id: &'static str) -> Result<Element, BootError> {
    document
        .get_element_by_id(id)
        .ok_or(BootError::MissingElement(id))
}

fn inject_styles(document: &Document) -> Result<(), BootError> {
    let head = document.head().ok_or(BootError::MissingElement("head"))?;
    let style = document.create_element("style")?;
    style.set_text_content(Some(RED_CAN_STYLE));
    head.append_child(&style)?;
    Ok(())
}

/// Engine plus frame bookkeeping, shared with the RAF and button closures
struct Game {
    engine: GameEngine<DomSurface>,
    inputs: InputQueue,
    last_time: Option<f64>,
    /// Sub-millisecond remainder carried to the next frame
    carry_ms: f64,
}

impl Game {
    fn frame(&mut self, time: f64) {
        let inputs: Vec<PlayerInput> = self.inputs.borrow_mut().drain(..).collect();

        let dt = self.last_time.map_or(0.0, |last| (time - last).max(0.0)) + self.carry_ms;
        self.last_time = Some(time);
        let whole = dt.floor();
        self.carry_ms = dt - whole;
        self.engine
            .frame(inputs, (whole as u64).min(MAX_FRAME_MS));
    }
}

/// Bootstrap the page and start the frame loop
pub fn run() -> Result<(), BootError> {
    let inputs: InputQueue = Rc::default();
    let tuning = Tuning::default();

    let surface = DomSurface::attach(inputs.clone(), tuning.feedback_duration_ms)?;
    let seed = js_sys::Date::now() as u64;
    let engine = GameEngine::with_tuning(surface, seed, tuning)?;
    log::info!("Game initialized with seed: {}", seed);

    bind_start_button(&engine.surface().document, inputs.clone())?;

    let game = Rc::new(RefCell::new(Game {
        engine,
        inputs,
        last_time: None,
        carry_ms: 0.0,
    }));
    request_animation_frame(game);
    Ok(())
}

fn bind_start_button(document: &Document, inputs: InputQueue) -> Result<(), BootError> {
    let btn = by_id(document, "start-game")?;
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
        inputs.borrow_mut().push_back(PlayerInput::Start);
    });
    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn request_animation_frame(game: Rc<RefCell<Game>>) {
    let Some(window) = web_sys::window() else {
        log::error!("Window disappeared; frame loop stopped");
        return;
    };
    let closure = Closure::once(move |time: f64| {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    });
    if let Err(e) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
        log::error!("requestAnimationFrame failed: {:?}", e);
    }
    closure.forget();
}
