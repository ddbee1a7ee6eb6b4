use crate::dom;
use crate::error::SiteError;
use log::info;
use wasm_bindgen::JsCast;
use web_sys::{Element, Node};

const TOGGLE_SELECTOR: &str = ".menu-toggle";
const MENU_SELECTOR: &str = "nav ul";
const SHOWN_CLASS: &str = "show";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuState {
    Open,
    Closed,
}

impl MenuState {
    pub fn from_open(open: bool) -> Self {
        if open {
            MenuState::Open
        } else {
            MenuState::Closed
        }
    }

    pub fn is_open(self) -> bool {
        self == MenuState::Open
    }

    pub fn toggled(self) -> Self {
        MenuState::from_open(!self.is_open())
    }

    /// State after a click outside the menu, or `None` when nothing changes.
    pub fn after_outside_click(self) -> Option<Self> {
        match self {
            MenuState::Open => Some(MenuState::Closed),
            MenuState::Closed => None,
        }
    }

    pub fn aria_expanded(self) -> &'static str {
        if self.is_open() {
            "true"
        } else {
            "false"
        }
    }
}

fn current_state(menu: &Element) -> MenuState {
    MenuState::from_open(menu.class_list().contains(SHOWN_CLASS))
}

fn apply(menu: &Element, toggle: &Element, state: MenuState) -> Result<(), SiteError> {
    menu.class_list().toggle_with_force(SHOWN_CLASS, state.is_open())?;
    toggle.set_attribute("aria-expanded", state.aria_expanded())?;
    Ok(())
}

fn contains(container: &Element, target: Option<&Node>) -> bool {
    target.map_or(false, |node| container.contains(Some(node)))
}

pub fn init_mobile_menu() -> Result<(), SiteError> {
    let document = dom::document()?;
    let (Some(toggle), Some(menu)) = (
        document.query_selector(TOGGLE_SELECTOR)?,
        document.query_selector(MENU_SELECTOR)?,
    ) else {
        return Ok(());
    };

    {
        let menu = menu.clone();
        let toggle_el = toggle.clone();
        dom::listen(&toggle, "click", move |_| {
            let next = current_state(&menu).toggled();
            if let Err(err) = apply(&menu, &toggle_el, next) {
                log::warn!("Menu toggle failed: {}", err);
            }
        })?;
    }

    dom::listen(&document, "click", move |event| {
        let target = event.target().and_then(|t| t.dyn_into::<Node>().ok());
        if contains(&menu, target.as_ref()) || contains(&toggle, target.as_ref()) {
            return;
        }
        if let Some(next) = current_state(&menu).after_outside_click() {
            if let Err(err) = apply(&menu, &toggle, next) {
                log::warn!("Closing menu failed: {}", err);
            }
        }
    })?;

    info!("Mobile menu ready");
    Ok(())
}
