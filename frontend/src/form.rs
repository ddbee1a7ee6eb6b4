use crate::components::notification::{show_notification, NotificationKind, NotificationTiming};
use crate::config::SiteConfig;
use crate::dom;
use crate::error::SiteError;
use gloo_net::http::{Method, Request};
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{FormData, HtmlButtonElement, HtmlFormElement, HtmlInputElement, UrlSearchParams};

pub const SUCCESS_MESSAGE: &str = "Message sent successfully!";
pub const FALLBACK_MESSAGE: &str = "Submission failed";
pub const PENDING_LABEL: &str = "Sending...";

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The request never got a response.
    #[error("{0}")]
    Network(String),
    /// The server answered with a non-ok status.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Dom(#[from] SiteError),
}

/// Text shown to the user for a failed submission.
pub fn error_notice(err: &SubmitError) -> String {
    format!("Error: {}", err)
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<Value>,
}

/// Message to report for a rejected submission, from the response body.
///
/// Any truthy `message` is shown as the browser would stringify it; a falsy or
/// missing one, or a body that is not a JSON object, gives the fallback.
pub fn rejection_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .and_then(|message| truthy_text(&message))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(js_text(other)),
    }
}

/// `String(value)` for a JSON value.
fn js_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::String(text) => text.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::Array(items) => items.iter().map(js_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

impl FormMethod {
    /// `HTMLFormElement.method` is normalized to "get", "post" or "dialog".
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("post") {
            FormMethod::Post
        } else {
            FormMethod::Get
        }
    }

    pub fn sends_body(self) -> bool {
        self == FormMethod::Post
    }
}

impl From<FormMethod> for Method {
    fn from(method: FormMethod) -> Self {
        match method {
            FormMethod::Get => Method::GET,
            FormMethod::Post => Method::POST,
        }
    }
}

/// Append an encoded query to `action`, keeping any fragment last.
pub fn with_query(action: &str, query: &str) -> String {
    if query.is_empty() {
        return action.to_string();
    }
    let (base, fragment) = match action.find('#') {
        Some(idx) => action.split_at(idx),
        None => (action, ""),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}{}", base, separator, query, fragment)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Sending,
    Succeeded,
    Failed,
}

impl SubmitState {
    /// Idle -> Sending. Refused unless idle, so a submit that lands while a
    /// request is in flight is dropped.
    pub fn begin(&mut self) -> bool {
        if *self != SubmitState::Idle {
            return false;
        }
        *self = SubmitState::Sending;
        true
    }

    pub fn complete(&mut self, succeeded: bool) {
        if *self == SubmitState::Sending {
            *self = if succeeded {
                SubmitState::Succeeded
            } else {
                SubmitState::Failed
            };
        }
    }

    /// Succeeded/Failed -> Idle, once the control has been restored.
    pub fn settle(&mut self) {
        if matches!(self, SubmitState::Succeeded | SubmitState::Failed) {
            *self = SubmitState::Idle;
        }
    }

    pub fn control_disabled(self) -> bool {
        self == SubmitState::Sending
    }
}

/// The form's `[type="submit"]` control: an `<input>` labelled by its value
/// or a `<button>` labelled by its text.
enum SubmitControl {
    Input(HtmlInputElement),
    Button(HtmlButtonElement),
}

impl SubmitControl {
    fn find(form: &HtmlFormElement) -> Option<Self> {
        let element = form.query_selector("[type=\"submit\"]").ok().flatten()?;
        match element.dyn_into::<HtmlInputElement>() {
            Ok(input) => Some(SubmitControl::Input(input)),
            Err(element) => element
                .dyn_into::<HtmlButtonElement>()
                .ok()
                .map(SubmitControl::Button),
        }
    }

    fn label(&self) -> String {
        match self {
            SubmitControl::Input(input) => input.value(),
            SubmitControl::Button(button) => button.text_content().unwrap_or_default(),
        }
    }

    fn set_label(&self, label: &str) {
        match self {
            SubmitControl::Input(input) => input.set_value(label),
            SubmitControl::Button(button) => button.set_text_content(Some(label)),
        }
    }

    fn set_disabled(&self, disabled: bool) {
        match self {
            SubmitControl::Input(input) => input.set_disabled(disabled),
            SubmitControl::Button(button) => button.set_disabled(disabled),
        }
    }
}

async fn send_form(form: HtmlFormElement) -> Result<(), SubmitError> {
    let form_data = FormData::new_with_form(&form).map_err(SiteError::from)?;
    let method = FormMethod::parse(&form.method());
    let action = form.action();

    let request = if method.sends_body() {
        Request::new(&action).method(method.into()).body(form_data)
    } else {
        let params =
            UrlSearchParams::new_with_str_sequence_sequence(&form_data).map_err(SiteError::from)?;
        let query = String::from(params.to_string());
        Request::new(&with_query(&action, &query)).method(method.into())
    };

    let response = request
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|err| SubmitError::Network(err.to_string()))?;

    if response.ok() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(SubmitError::Rejected(rejection_message(&body)))
}

fn notify(message: &str, kind: NotificationKind, timing: NotificationTiming) {
    if let Err(err) = show_notification(message, kind, timing) {
        warn!("Could not show notification {:?}: {}", message, err);
    }
}

/// One submission: lock the control, `send` the form, report the outcome and
/// restore the control whatever happened.
async fn run_submission<S, Fut>(
    form: HtmlFormElement,
    state: Rc<RefCell<SubmitState>>,
    timing: NotificationTiming,
    send: S,
) where
    S: FnOnce(HtmlFormElement) -> Fut,
    Fut: Future<Output = Result<(), SubmitError>>,
{
    if !state.borrow_mut().begin() {
        return;
    }

    let control = SubmitControl::find(&form);
    let saved_label = control.as_ref().map(SubmitControl::label);
    if let Some(control) = &control {
        control.set_disabled(state.borrow().control_disabled());
        control.set_label(PENDING_LABEL);
    }

    let result = send(form.clone()).await;
    match &result {
        Ok(()) => {
            notify(SUCCESS_MESSAGE, NotificationKind::Success, timing);
            form.reset();
        }
        Err(err) => {
            notify(&error_notice(err), NotificationKind::Error, timing);
            gloo_console::error!("Form error:", err.to_string());
        }
    }
    state.borrow_mut().complete(result.is_ok());

    if let Some(control) = &control {
        control.set_disabled(state.borrow().control_disabled());
        if let Some(label) = &saved_label {
            control.set_label(label);
        }
    }
    state.borrow_mut().settle();
}

pub fn init_form_submission(config: &SiteConfig) -> Result<(), SiteError> {
    let document = dom::document()?;
    let Some(form) = document.query_selector("form")? else {
        return Ok(());
    };
    let form: HtmlFormElement = form
        .dyn_into()
        .map_err(|_| SiteError::Js("first form is not an HTMLFormElement".to_string()))?;

    let timing = NotificationTiming::from_config(config);
    let state = Rc::new(RefCell::new(SubmitState::Idle));

    let target = form.clone();
    dom::listen(&target, "submit", move |event| {
        event.prevent_default();
        spawn_local(run_submission(
            form.clone(),
            Rc::clone(&state),
            timing,
            send_form,
        ));
    })?;

    info!("Form submission ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_uses_server_message() {
        let err = SubmitError::Rejected(rejection_message(r#"{"message":"Invalid email"}"#));
        assert_eq!(error_notice(&err), "Error: Invalid email");
    }

    #[test]
    fn rejection_without_message_falls_back() {
        assert_eq!(rejection_message("{}"), FALLBACK_MESSAGE);
        assert_eq!(rejection_message(r#"{"message":null}"#), FALLBACK_MESSAGE);
        assert_eq!(rejection_message(r#"{"message":""}"#), FALLBACK_MESSAGE);
        assert_eq!(rejection_message(r#"{"error":"nope"}"#), FALLBACK_MESSAGE);
    }

    #[test]
    fn rejection_with_unparsable_body_falls_back() {
        assert_eq!(rejection_message(""), FALLBACK_MESSAGE);
        assert_eq!(rejection_message("<html>502</html>"), FALLBACK_MESSAGE);
        assert_eq!(rejection_message(r#"["message"]"#), FALLBACK_MESSAGE);
    }

    #[test]
    fn non_string_messages_are_stringified() {
        assert_eq!(rejection_message(r#"{"message": 42}"#), "42");
        assert_eq!(rejection_message(r#"{"message": 2.5}"#), "2.5");
        assert_eq!(rejection_message(r#"{"message": true}"#), "true");
        assert_eq!(rejection_message(r#"{"message": ["a", 1]}"#), "a,1");
        assert_eq!(rejection_message(r#"{"message": {"a": 1}}"#), "[object Object]");
        let err = SubmitError::Rejected(rejection_message(r#"{"message": 42}"#));
        assert_eq!(error_notice(&err), "Error: 42");
    }

    #[test]
    fn falsy_messages_fall_back() {
        assert_eq!(rejection_message(r#"{"message": 0}"#), FALLBACK_MESSAGE);
        assert_eq!(rejection_message(r#"{"message": false}"#), FALLBACK_MESSAGE);
    }

    #[test]
    fn network_errors_are_prefixed() {
        let err = SubmitError::Network("Failed to fetch".to_string());
        assert_eq!(error_notice(&err), "Error: Failed to fetch");
    }

    #[test]
    fn dom_errors_are_prefixed() {
        let err = SubmitError::from(SiteError::NoDocument);
        assert_eq!(error_notice(&err), "Error: window has no document");
    }

    #[test]
    fn method_parsing() {
        assert_eq!(FormMethod::parse("post"), FormMethod::Post);
        assert_eq!(FormMethod::parse("POST"), FormMethod::Post);
        assert_eq!(FormMethod::parse("get"), FormMethod::Get);
        assert_eq!(FormMethod::parse("dialog"), FormMethod::Get);
        assert!(FormMethod::Post.sends_body());
        assert!(!FormMethod::Get.sends_body());
    }

    #[test]
    fn query_is_appended_to_action() {
        assert_eq!(with_query("/contact", "a=1&b=2"), "/contact?a=1&b=2");
        assert_eq!(with_query("/contact?x=0", "a=1"), "/contact?x=0&a=1");
        assert_eq!(with_query("/contact#top", "a=1"), "/contact?a=1#top");
        assert_eq!(with_query("/contact", ""), "/contact");
    }

    #[test]
    fn successful_submission_cycle() {
        let mut state = SubmitState::Idle;
        assert!(!state.control_disabled());
        assert!(state.begin());
        assert!(state.control_disabled());
        state.complete(true);
        assert_eq!(state, SubmitState::Succeeded);
        assert!(!state.control_disabled());
        state.settle();
        assert_eq!(state, SubmitState::Idle);
    }

    #[test]
    fn failed_submission_returns_to_idle() {
        let mut state = SubmitState::Idle;
        assert!(state.begin());
        state.complete(false);
        assert_eq!(state, SubmitState::Failed);
        assert!(!state.control_disabled());
        state.settle();
        assert_eq!(state, SubmitState::Idle);
    }

    #[test]
    fn second_send_refused_until_settled() {
        let mut state = SubmitState::Idle;
        assert!(state.begin());
        assert!(!state.begin());
        state.complete(true);
        assert!(!state.begin());
        state.settle();
        assert!(state.begin());
    }

    #[test]
    fn complete_and_settle_without_begin_are_ignored() {
        let mut state = SubmitState::Idle;
        state.complete(false);
        assert_eq!(state, SubmitState::Idle);
        state.settle();
        assert_eq!(state, SubmitState::Idle);
    }
}
