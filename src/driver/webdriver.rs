//! HTTP client for a chromedriver endpoint.

use super::types::{
    BrowserOptions, ElementRef, LogEntry, NewSessionValue, WebDriverErrorValue,
    WebDriverResponse, ELEMENT_KEY,
};
use super::BrowserDriver;
use crate::trace::{parse_trace_events, TraceEvent};
use crate::utils::config::{DEFAULT_ELEMENT_WAIT, DEFAULT_HTTP_TIMEOUT, ELEMENT_POLL_INTERVAL};
use crate::utils::error::DriverError;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

/// Elements that host the winning ad
const NESTED_FRAME_SELECTOR: &str = "fencedframe, iframe";

/// WebDriver session driving one Chrome instance
///
/// The session is deleted (browser closed) when the client is dropped.
pub struct WebDriverClient {
    client: Client,
    base_url: String,
    session_id: String,
    element_wait: Duration,
    /// Performance log entries drained so far; chromedriver hands each out once
    performance_log: Vec<Value>,
}

impl WebDriverClient {
    /// Start a new browser session
    ///
    /// # Errors
    /// * `DriverError::RequestFailed` - chromedriver unreachable
    /// * `DriverError::WebDriver` - session could not be created
    pub fn connect(base_url: impl Into<String>, options: &BrowserOptions) -> Result<Self, DriverError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(DriverError::RequestFailed)?;

        info!("Creating WebDriver session at: {}", base_url);

        let session: NewSessionValue = execute(
            &client,
            Method::POST,
            &format!("{}/session", base_url),
            Some(options.to_capabilities()),
        )?;

        debug!("Session capabilities: {}", session.capabilities);
        info!("WebDriver session: {}", session.session_id);

        Ok(Self {
            client,
            base_url,
            session_id: session.session_id,
            element_wait: DEFAULT_ELEMENT_WAIT,
            performance_log: Vec::new(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/session/{}/{}", self.base_url, self.session_id, path)
    }

    fn command<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, DriverError> {
        execute(&self.client, method, &self.endpoint(path), body)
    }

    fn find_element(&self, selector: &str) -> Result<String, DriverError> {
        let body = json!({ "using": "css selector", "value": selector });
        match self.command::<ElementRef>(Method::POST, "element", Some(body)) {
            Ok(element) => Ok(element.id),
            Err(DriverError::WebDriver { error, .. }) if error == "no such element" => {
                Err(DriverError::ElementNotFound(selector.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn read_log(&self, kind: &str) -> Result<Vec<LogEntry>, DriverError> {
        self.command(Method::POST, "se/log", Some(json!({ "type": kind })))
    }
}

impl BrowserDriver for WebDriverClient {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        debug!("Navigating to: {}", url);
        let _: Value = self.command(Method::POST, "url", Some(json!({ "url": url })))?;
        Ok(())
    }

    fn element_text(&mut self, selector: &str) -> Result<String, DriverError> {
        let element = self.find_element(selector)?;
        self.command(Method::GET, &format!("element/{}/text", element), None)
    }

    fn switch_to_nested_frame(&mut self) -> Result<(), DriverError> {
        let deadline = Instant::now() + self.element_wait;

        // The frame only exists once the auction resolved
        let element = loop {
            match self.find_element(NESTED_FRAME_SELECTOR) {
                Ok(element) => break element,
                Err(DriverError::ElementNotFound(_)) if Instant::now() < deadline => {
                    std::thread::sleep(ELEMENT_POLL_INTERVAL);
                }
                Err(DriverError::ElementNotFound(_)) => return Err(DriverError::FrameNotFound),
                Err(e) => return Err(e),
            }
        };

        let body = json!({ "id": { ELEMENT_KEY: element } });
        let _: Value = self.command(Method::POST, "frame", Some(body))?;
        Ok(())
    }

    fn switch_to_top(&mut self) -> Result<(), DriverError> {
        let _: Value = self.command(Method::POST, "frame", Some(json!({ "id": null })))?;
        Ok(())
    }

    fn console_log(&mut self) -> Result<Vec<LogEntry>, DriverError> {
        self.read_log("browser")
    }

    fn trace_events(&mut self) -> Result<Vec<TraceEvent>, DriverError> {
        let drained = self.read_log("performance")?;
        debug!("Drained {} performance log entries", drained.len());

        for entry in drained {
            self.performance_log.push(serde_json::to_value(entry).map_err(|e| {
                DriverError::InvalidResponse(format!("log entry: {}", e))
            })?);
        }

        let capture = Value::Array(self.performance_log.clone());
        Ok(parse_trace_events(&capture)?)
    }

    fn element_wait(&self) -> Duration {
        self.element_wait
    }
}

impl Drop for WebDriverClient {
    fn drop(&mut self) {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        if let Err(e) = self.client.delete(&url).send() {
            warn!("Failed to close WebDriver session {}: {}", self.session_id, e);
        }
    }
}

/// Send one command and unwrap the `value` envelope
///
/// **Private** - shared by session creation and session commands
fn execute<T: DeserializeOwned>(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<T, DriverError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().map_err(DriverError::RequestFailed)?;
    let status = response.status();
    let payload: Value = response.json().map_err(DriverError::RequestFailed)?;

    if !status.is_success() {
        return Err(map_webdriver_error(status.as_u16(), payload));
    }

    let envelope: WebDriverResponse<T> = serde_json::from_value(payload)
        .map_err(|e| DriverError::InvalidResponse(e.to_string()))?;
    Ok(envelope.value)
}

/// Map an error payload to our error type
fn map_webdriver_error(status: u16, payload: Value) -> DriverError {
    match serde_json::from_value::<WebDriverResponse<WebDriverErrorValue>>(payload) {
        Ok(envelope) => DriverError::WebDriver {
            error: envelope.value.error,
            message: envelope.value.message,
        },
        Err(_) => DriverError::InvalidResponse(format!("HTTP {} without error payload", status)),
    }
}
