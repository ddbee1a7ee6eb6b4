// Viewport visibility tracking.
//
// Reveal and counter elements only care about "is this element in view now".
// How that is answered depends on the browser: IntersectionObserver when it
// exists, otherwise measuring each element on scroll.

use crate::dom;
use crate::error::SiteError;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

/// Returned by a visibility callback to keep or drop the element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Watch {
    Keep,
    Stop,
}

pub type VisibilityCallback = Box<dyn FnMut(&Element, bool) -> Watch>;

pub trait VisibilityStrategy {
    /// Report visibility changes of `elements` to `on_change` until it
    /// answers [`Watch::Stop`] for an element.
    fn track(
        &self,
        elements: Vec<Element>,
        on_change: VisibilityCallback,
    ) -> Result<(), SiteError>;
}

/// IntersectionObserver-backed tracking.
pub struct IntersectionStrategy {
    pub threshold: f64,
    pub root_margin: String,
}

impl IntersectionStrategy {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            root_margin: "0px".to_string(),
        }
    }

    /// Grow the viewport vertically by `px` on both edges.
    pub fn with_vertical_margin(mut self, px: f64) -> Self {
        self.root_margin = format!("{}px 0px", px);
        self
    }
}

impl VisibilityStrategy for IntersectionStrategy {
    fn track(
        &self,
        elements: Vec<Element>,
        mut on_change: VisibilityCallback,
    ) -> Result<(), SiteError> {
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    let target = entry.target();
                    if on_change(&target, entry.is_intersecting()) == Watch::Stop {
                        observer.unobserve(&target);
                    }
                }
            },
        );

        let options = IntersectionObserverInit::new();
        options.set_threshold(&JsValue::from_f64(self.threshold));
        options.set_root_margin(&self.root_margin);

        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)?;
        for element in &elements {
            observer.observe(element);
        }
        callback.forget();
        Ok(())
    }
}

/// Fallback for browsers without IntersectionObserver: measure every tracked
/// element on each scroll event and once up front.
pub struct ScrollPollStrategy {
    /// An element counts as visible once its top is this far above the
    /// bottom of the viewport.
    pub offset: f64,
}

impl VisibilityStrategy for ScrollPollStrategy {
    fn track(
        &self,
        elements: Vec<Element>,
        on_change: VisibilityCallback,
    ) -> Result<(), SiteError> {
        let window = dom::window()?;
        let offset = self.offset;
        let tracked = Rc::new(RefCell::new(elements));
        let on_change = Rc::new(RefCell::new(on_change));

        let poll = {
            let window = window.clone();
            move || {
                let viewport_height = window
                    .inner_height()
                    .ok()
                    .and_then(|h| h.as_f64())
                    .unwrap_or(0.0);
                let mut on_change = on_change.borrow_mut();
                tracked.borrow_mut().retain(|element| {
                    let top = element.get_bounding_client_rect().top();
                    (*on_change)(element, is_within_viewport(top, viewport_height, offset))
                        == Watch::Keep
                });
            }
        };
        let poll = Rc::new(poll);

        {
            let poll = Rc::clone(&poll);
            dom::listen(&window, "scroll", move |_| poll())?;
        }
        poll();
        Ok(())
    }
}

/// Treats every element as visible right away. Used where animating at once
/// beats not animating at all.
pub struct ImmediateStrategy;

impl VisibilityStrategy for ImmediateStrategy {
    fn track(
        &self,
        elements: Vec<Element>,
        mut on_change: VisibilityCallback,
    ) -> Result<(), SiteError> {
        for element in &elements {
            on_change(element, true);
        }
        Ok(())
    }
}

pub fn is_within_viewport(top: f64, viewport_height: f64, offset: f64) -> bool {
    top < viewport_height - offset
}
