use crate::config::SiteConfig;
use crate::dom;
use crate::error::SiteError;
use crate::debounce::Debouncer;
use log::info;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{MouseEvent, ScrollBehavior, ScrollToOptions};
use yew::prelude::*;

pub fn is_past_threshold(offset: f64, threshold: f64) -> bool {
    offset > threshold
}

fn current_offset() -> f64 {
    web_sys::window()
        .and_then(|w| w.scroll_y().ok())
        .unwrap_or(0.0)
}

fn scroll_to_top() {
    if let Some(window) = web_sys::window() {
        let options = ScrollToOptions::new();
        options.set_top(0.0);
        options.set_behavior(ScrollBehavior::Smooth);
        window.scroll_to_with_scroll_to_options(&options);
    }
}

#[derive(Properties, PartialEq)]
pub struct BackToTopProps {
    pub threshold: f64,
    pub debounce_ms: u32,
}

#[function_component(BackToTop)]
pub fn back_to_top(props: &BackToTopProps) -> Html {
    let threshold = props.threshold;
    let debounce_ms = props.debounce_ms;
    let visible = use_state_eq(|| is_past_threshold(current_offset(), threshold));

    {
        let visible = visible.clone();
        use_effect_with_deps(
            move |_| {
                let debouncer = Debouncer::new(debounce_ms);
                let window = web_sys::window();

                let listener = window.map(|window| {
                    let debouncer = debouncer.clone();
                    let scroll_callback = Closure::wrap(Box::new(move || {
                        let visible = visible.clone();
                        debouncer.call(move || {
                            visible.set(is_past_threshold(current_offset(), threshold));
                        });
                    }) as Box<dyn FnMut()>);

                    if let Err(err) = window.add_event_listener_with_callback(
                        "scroll",
                        scroll_callback.as_ref().unchecked_ref(),
                    ) {
                        log::warn!("Back to top scroll listener failed: {:?}", err);
                    }
                    (window, scroll_callback)
                });

                move || {
                    if let Some((window, scroll_callback)) = listener {
                        let _ = window.remove_event_listener_with_callback(
                            "scroll",
                            scroll_callback.as_ref().unchecked_ref(),
                        );
                    }
                    debouncer.cancel();
                }
            },
            (threshold, debounce_ms),
        );
    }

    let onclick = Callback::from(|_: MouseEvent| scroll_to_top());
    let style = if *visible { "display: block;" } else { "display: none;" };

    html! {
        <button class="back-to-top" aria-label="Back to top" style={style} onclick={onclick}>
            <span class="arrow">{"↑"}</span>
            <span class="sr-only">{"Back to top"}</span>
        </button>
    }
}

/// Mount the floating button at the end of `<body>`.
pub fn init_back_to_top(config: &SiteConfig) -> Result<(), SiteError> {
    let document = dom::document()?;
    let host = document.create_element("div")?;
    host.set_class_name("back-to-top-host");
    dom::body()?.append_child(&host)?;

    yew::Renderer::<BackToTop>::with_root_and_props(
        host,
        BackToTopProps {
            threshold: config.scroll_threshold,
            debounce_ms: config.scroll_debounce_ms,
        },
    )
    .render();

    info!("Back to top button mounted");
    Ok(())
}


#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use gloo_timers::future::TimeoutFuture;
    use wasm_bindgen_test::*;

    fn make_scrollable() -> web_sys::HtmlElement {
        let body = dom::body().unwrap();
        body.set_attribute("style", "min-height: 6000px").unwrap();
        body
    }

    #[wasm_bindgen_test]
    async fn shows_only_after_debounce_settles() {
        let window = dom::window().unwrap();
        let body = make_scrollable();
        window.scroll_to_with_x_and_y(0.0, 0.0);
        TimeoutFuture::new(50).await;

        let host = dom::document().unwrap().create_element("div").unwrap();
        body.append_child(&host).unwrap();
        yew::Renderer::<BackToTop>::with_root_and_props(
            host.clone(),
            BackToTopProps {
                threshold: 300.0,
                debounce_ms: 150,
            },
        )
        .render();
        TimeoutFuture::new(50).await;

        let button = host.query_selector("button.back-to-top").unwrap().unwrap();
        assert_eq!(button.get_attribute("style").as_deref(), Some("display: none;"));

        window.scroll_to_with_x_and_y(0.0, 1000.0);
        TimeoutFuture::new(60).await;
        assert_eq!(button.get_attribute("style").as_deref(), Some("display: none;"));

        TimeoutFuture::new(300).await;
        assert_eq!(button.get_attribute("style").as_deref(), Some("display: block;"));

        window.scroll_to_with_x_and_y(0.0, 100.0);
        TimeoutFuture::new(400).await;
        assert_eq!(button.get_attribute("style").as_deref(), Some("display: none;"));

        host.remove();
        body.remove_attribute("style").unwrap();
    }

    #[wasm_bindgen_test]
    async fn scroll_to_top_reaches_origin() {
        let window = dom::window().unwrap();
        let body = make_scrollable();
        window.scroll_to_with_x_and_y(0.0, 1200.0);
        TimeoutFuture::new(50).await;
        assert!(window.scroll_y().unwrap() > 0.0);

        scroll_to_top();
        TimeoutFuture::new(1500).await;
        assert_eq!(window.scroll_y().unwrap(), 0.0);

        body.remove_attribute("style").unwrap();
    }
}
