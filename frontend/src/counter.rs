use crate::config::SiteConfig;
use crate::dom;
use crate::error::SiteError;
use crate::visibility::{ImmediateStrategy, IntersectionStrategy, VisibilityStrategy, Watch};
use log::{info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Element;

const COUNTER_SELECTOR: &str = ".counter";
const TARGET_KEY: &str = "target";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Frame {
    /// Mid-animation value to display.
    Show(f64),
    /// Final value; the animation is over.
    Done(f64),
}

impl Frame {
    pub fn value(self) -> f64 {
        match self {
            Frame::Show(v) | Frame::Done(v) => v,
        }
    }
}

/// Counts from 0 towards `target` in `divisor` equal steps, one per frame.
#[derive(Clone, Debug)]
pub struct CounterAnimation {
    target: f64,
    step: f64,
    current: f64,
}

impl CounterAnimation {
    pub fn new(target: f64, divisor: f64) -> Self {
        Self {
            target,
            step: target / divisor,
            current: 0.0,
        }
    }

    pub fn advance(&mut self) -> Frame {
        self.current += self.step;
        if self.current < self.target {
            // Clamped so a fractional target never shows a value above itself
            Frame::Show(self.current.ceil().min(self.target))
        } else {
            Frame::Done(self.target)
        }
    }
}

/// Reads a counter's `data-target`. A blank target counts as 0; missing or
/// non-numeric targets yield `None`.
pub fn parse_target(raw: Option<String>) -> Option<f64> {
    let raw = raw?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0.0);
    }
    raw.parse::<f64>().ok().filter(|t| t.is_finite())
}

pub fn format_count(value: f64) -> String {
    // ceil() of a small negative step yields -0
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

pub fn init_counters(config: &SiteConfig) -> Result<(), SiteError> {
    let window = dom::window()?;
    let document = dom::document()?;
    let counters: Vec<Element> = dom::query_all(&document, COUNTER_SELECTOR)?;
    if counters.is_empty() {
        return Ok(());
    }
    let count = counters.len();

    let strategy: Box<dyn VisibilityStrategy> = if dom::supports_intersection_observer(&window) {
        Box::new(IntersectionStrategy::new(config.counter_threshold))
    } else {
        Box::new(ImmediateStrategy)
    };

    let divisor = config.counter_divisor;
    strategy.track(
        counters,
        Box::new(move |element: &Element, in_view: bool| {
            if !in_view {
                return Watch::Keep;
            }
            start(element, divisor);
            Watch::Stop
        }),
    )?;

    info!("Counters ready ({} elements)", count);
    Ok(())
}

fn start(element: &Element, divisor: f64) {
    let raw = element.get_attribute(&format!("data-{}", TARGET_KEY));
    match parse_target(raw.clone()) {
        Some(target) => animate(element.clone(), CounterAnimation::new(target, divisor)),
        None => warn!("Skipping counter with invalid data-{}: {:?}", TARGET_KEY, raw),
    }
}

/// Returns true once the final value has been written.
fn render(element: &Element, frame: Frame) -> bool {
    element.set_text_content(Some(&format_count(frame.value())));
    matches!(frame, Frame::Done(_))
}

fn animate(element: Element, mut animation: CounterAnimation) {
    if render(&element, animation.advance()) {
        return;
    }

    let Some(window) = web_sys::window() else {
        render(&element, Frame::Done(animation.target));
        return;
    };

    let holder: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let holder_for_cb = Rc::clone(&holder);
    let window_for_cb = window.clone();
    let cb = Closure::wrap(Box::new(move |_ts: f64| {
        let frame = animation.advance();
        if render(&element, frame) {
            holder_for_cb.borrow_mut().take();
            return;
        }
        let scheduled = holder_for_cb
            .borrow()
            .as_ref()
            .map(|cb| window_for_cb.request_animation_frame(cb.as_ref().unchecked_ref()));
        if !matches!(scheduled, Some(Ok(_))) {
            render(&element, Frame::Done(animation.target));
            holder_for_cb.borrow_mut().take();
        }
    }) as Box<dyn FnMut(f64)>);

    if window
        .request_animation_frame(cb.as_ref().unchecked_ref())
        .is_ok()
    {
        *holder.borrow_mut() = Some(cb);
    }
}
