use log::{error, info};

mod config;
mod counter;
mod debounce;
mod dom;
mod error;
mod form;
mod menu;
mod reveal;
mod visibility;
mod components {
    pub mod back_to_top;
    pub mod notification;
}

use components::back_to_top::init_back_to_top;
use config::SiteConfig;
use error::SiteError;

#[cfg(all(test, target_arch = "wasm32"))]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

fn run(name: &str, init: impl FnOnce() -> Result<(), SiteError>) {
    if let Err(err) = init() {
        error!("{} failed to initialize: {}", name, err);
    }
}

fn init_all() {
    let config = match dom::body() {
        Ok(body) => SiteConfig::from_body(&body),
        Err(err) => {
            error!("Using default config: {}", err);
            SiteConfig::default()
        }
    };

    run("Back to top", || init_back_to_top(&config));
    run("Scroll reveal", || reveal::init_scroll_reveal(&config));
    run("Counters", || counter::init_counters(&config));
    run("Mobile menu", menu::init_mobile_menu);
    run("Form submission", || form::init_form_submission(&config));
}

fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    console_log::init_with_level(config::log_level()).expect("error initializing log");

    info!("Starting site interactions");
    if let Err(err) = dom::on_dom_ready(init_all) {
        error!("Could not wait for the page to load: {}", err);
    }
}
