use crate::config::SiteConfig;
use crate::dom;
use crate::error::SiteError;
use gloo_timers::callback::Timeout;

const FADE_CLASS: &str = "fade-out";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

impl NotificationKind {
    pub fn class_name(self) -> &'static str {
        match self {
            NotificationKind::Success => "notification success",
            NotificationKind::Error => "notification error",
        }
    }
}

/// How long a notification stays up and how long it takes to fade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotificationTiming {
    pub visible_ms: u32,
    pub fade_ms: u32,
}

impl NotificationTiming {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            visible_ms: config.notification_visible_ms,
            fade_ms: config.notification_fade_ms,
        }
    }

    /// Delay from creation until the fade class is added.
    pub fn fade_delay(self) -> u32 {
        self.visible_ms
    }

    /// Delay from the start of the fade until the node is removed.
    pub fn remove_delay(self) -> u32 {
        self.fade_ms
    }

    /// Total lifetime from creation to removal.
    pub fn lifetime(self) -> u32 {
        self.fade_delay().saturating_add(self.remove_delay())
    }
}

/// Append a toast to `<body>` that fades and removes itself.
///
/// Every call gets its own pair of timers, so toasts stack independently.
pub fn show_notification(
    message: &str,
    kind: NotificationKind,
    timing: NotificationTiming,
) -> Result<(), SiteError> {
    let document = dom::document()?;
    let body = dom::body()?;

    let notification = document.create_element("div")?;
    notification.set_class_name(kind.class_name());
    notification.set_text_content(Some(message));
    body.append_child(&notification)?;

    let remove_delay = timing.remove_delay();
    let timeout = Timeout::new(timing.fade_delay(), move || {
        let _ = notification.class_list().add_1(FADE_CLASS);
        let removal = Timeout::new(remove_delay, move || {
            notification.remove();
        });
        removal.forget();
    });
    timeout.forget();
    Ok(())
}


#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use gloo_timers::future::TimeoutFuture;
    use wasm_bindgen_test::*;

    fn notifications(message: &str) -> Vec<web_sys::Element> {
        let document = dom::document().unwrap();
        dom::query_all(&document, ".notification")
            .unwrap()
            .into_iter()
            .filter(|n| n.text_content().as_deref() == Some(message))
            .collect()
    }

    #[wasm_bindgen_test]
    async fn notification_fades_then_disappears() {
        let timing = NotificationTiming {
            visible_ms: 120,
            fade_ms: 80,
        };
        show_notification("lifecycle check", NotificationKind::Success, timing).unwrap();

        TimeoutFuture::new(60).await;
        let shown = notifications("lifecycle check");
        assert_eq!(shown.len(), 1);
        assert!(!shown[0].class_list().contains(FADE_CLASS));

        TimeoutFuture::new(100).await;
        let fading = notifications("lifecycle check");
        assert_eq!(fading.len(), 1);
        assert!(fading[0].class_list().contains(FADE_CLASS));

        TimeoutFuture::new(150).await;
        assert!(notifications("lifecycle check").is_empty());
    }

    #[wasm_bindgen_test]
    async fn notifications_stack_independently() {
        let short = NotificationTiming {
            visible_ms: 40,
            fade_ms: 20,
        };
        let long = NotificationTiming {
            visible_ms: 400,
            fade_ms: 20,
        };
        show_notification("stack short", NotificationKind::Error, short).unwrap();
        show_notification("stack long", NotificationKind::Success, long).unwrap();

        TimeoutFuture::new(150).await;
        assert!(notifications("stack short").is_empty());
        assert_eq!(notifications("stack long").len(), 1);

        TimeoutFuture::new(400).await;
        assert!(notifications("stack long").is_empty());
    }
}
