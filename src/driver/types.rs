//! Types for the W3C WebDriver wire protocol (chromedriver flavour).
//!
//! Every response wraps its payload in a `value` field; errors carry
//! `{error, message}` inside that same field.

use crate::utils::config::{CHROME_FLEDGE_ARGS, TRACE_CATEGORY};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Key under which element references are exchanged
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Generic WebDriver response envelope
#[derive(Debug, Deserialize)]
pub struct WebDriverResponse<T> {
    pub value: T,
}

/// Error payload of a failed command
#[derive(Debug, Deserialize)]
pub struct WebDriverErrorValue {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

/// Payload of `POST /session`
#[derive(Debug, Deserialize)]
pub struct NewSessionValue {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub capabilities: Value,
}

/// Element reference returned by `POST /session/{id}/element`
#[derive(Debug, Deserialize)]
pub struct ElementRef {
    #[serde(rename = "element-6066-11e4-a52e-4f735466cecf")]
    pub id: String,
}

/// One entry of a browser or performance log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub level: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: i64,
}

/// Browser launch options
#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    /// Run without a visible window
    pub headless: bool,

    /// Chrome binary to launch instead of chromedriver's default
    pub chrome_binary: Option<PathBuf>,

    /// Additional command line switches
    pub extra_args: Vec<String>,
}

impl BrowserOptions {
    /// Capabilities for a new Chrome session
    ///
    /// Enables the auction API, browser + performance logs and tracing of
    /// the auction category.
    pub fn to_capabilities(&self) -> Value {
        let mut args: Vec<String> = CHROME_FLEDGE_ARGS.iter().map(|s| s.to_string()).collect();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args.extend(self.extra_args.iter().cloned());

        let mut chrome_options = json!({
            "args": args,
            "perfLoggingPrefs": {
                "enableNetwork": false,
                "enablePage": false,
                "traceCategories": TRACE_CATEGORY,
            },
        });

        if let Some(binary) = &self.chrome_binary {
            chrome_options["binary"] = json!(binary.display().to_string());
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": chrome_options,
                    "goog:loggingPrefs": {
                        "browser": "ALL",
                        "performance": "ALL",
                    },
                }
            }
        })
    }
}
