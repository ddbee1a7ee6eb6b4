use crate::config::SiteConfig;
use crate::dom;
use crate::error::SiteError;
use crate::visibility::{IntersectionStrategy, ScrollPollStrategy, VisibilityStrategy, Watch};
use log::info;
use web_sys::Element;

const REVEAL_SELECTOR: &str = ".reveal";
const ACTIVE_CLASS: &str = "active";

/// How a reveal element reacts to its visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealPolicy {
    /// Active exactly while in view.
    Reactive,
    /// Becomes active the first time it is in view and stays that way.
    Once,
}

impl RevealPolicy {
    pub fn from_config(config: &SiteConfig) -> Self {
        if config.reveal_once {
            RevealPolicy::Once
        } else {
            RevealPolicy::Reactive
        }
    }

    /// Next `active` state plus whether the element still needs watching.
    pub fn apply(self, was_active: bool, in_view: bool) -> (bool, Watch) {
        match self {
            RevealPolicy::Reactive => (in_view, Watch::Keep),
            RevealPolicy::Once => {
                let active = was_active || in_view;
                (active, if active { Watch::Stop } else { Watch::Keep })
            }
        }
    }
}

pub fn init_scroll_reveal(config: &SiteConfig) -> Result<(), SiteError> {
    let window = dom::window()?;
    let document = dom::document()?;
    let elements = dom::query_all(&document, REVEAL_SELECTOR)?;
    if elements.is_empty() {
        return Ok(());
    }
    let count = elements.len();

    let policy = RevealPolicy::from_config(config);
    let strategy: Box<dyn VisibilityStrategy> = if dom::supports_intersection_observer(&window) {
        Box::new(
            IntersectionStrategy::new(config.reveal_threshold)
                .with_vertical_margin(config.reveal_offset),
        )
    } else {
        Box::new(ScrollPollStrategy {
            offset: config.reveal_offset,
        })
    };

    strategy.track(
        elements,
        Box::new(move |element: &Element, in_view: bool| {
            let classes = element.class_list();
            let (active, watch) = policy.apply(classes.contains(ACTIVE_CLASS), in_view);
            // toggle_with_force only fails on an invalid token
            let _ = classes.toggle_with_force(ACTIVE_CLASS, active);
            watch
        }),
    )?;

    info!("Scroll reveal tracking {} elements ({:?})", count, policy);
    Ok(())
}
