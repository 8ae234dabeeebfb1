use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::browser::page::FormPage;
use crate::error::FillError;
use crate::form::form_model::Verb;
use crate::form::snapshot::{FormSnapshot, snapshot_from_value};

pub const DEFAULT_SERVER_SCRIPT: &str = "node/form-driver/browser_server.js";

/// Request sent to browser_server.js over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BrowserRequest {
    Navigate {
        cmd: &'static str,
        url: String,
    },
    Snapshot {
        cmd: &'static str,
    },
    Act {
        cmd: &'static str,
        index: u32,
        verb: Verb,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    PageText {
        cmd: &'static str,
    },
    Wait {
        cmd: &'static str,
        duration_ms: u64,
    },
    CurrentUrl {
        cmd: &'static str,
    },
    Quit {
        cmd: &'static str,
    },
}

impl BrowserRequest {
    pub fn navigate(url: &str) -> Self {
        BrowserRequest::Navigate {
            cmd: "navigate",
            url: url.to_string(),
        }
    }

    pub fn snapshot() -> Self {
        BrowserRequest::Snapshot { cmd: "snapshot" }
    }

    pub fn act(index: u32, verb: Verb, value: Option<&str>) -> Self {
        BrowserRequest::Act {
            cmd: "act",
            index,
            verb,
            value: value.map(str::to_string),
        }
    }

    pub fn page_text() -> Self {
        BrowserRequest::PageText { cmd: "page_text" }
    }

    pub fn wait(duration_ms: u64) -> Self {
        BrowserRequest::Wait {
            cmd: "wait",
            duration_ms,
        }
    }

    pub fn current_url() -> Self {
        BrowserRequest::CurrentUrl { cmd: "current_url" }
    }

    pub fn quit() -> Self {
        BrowserRequest::Quit { cmd: "quit" }
    }
}

/// Response received from browser_server.js over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A persistent browser session backed by browser_server.js.
///
/// Launches a long-lived Node.js process that keeps a Chromium browser open.
/// Commands are sent as NDJSON over stdin, responses read from stdout.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
}

impl BrowserSession {
    /// Launch a new browser session by spawning the driver script.
    pub fn launch(script: &str, visible: bool) -> Result<Self, FillError> {
        let mut command = Command::new("node");
        command.arg(script);
        if visible {
            command.arg("--headed");
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| FillError::SubprocessSpawn {
                script: script.into(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FillError::SessionIO(format!("Failed to capture stdin of {}", script)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FillError::SessionIO(format!("Failed to capture stdout of {}", script)))?;

        let mut reader = BufReader::new(stdout);

        // Wait for the ready signal
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| FillError::SessionIO(format!("Failed to read ready signal: {}", e)))?;

        let response: BrowserResponse =
            serde_json::from_str(line.trim()).map_err(|e| FillError::JsonParse {
                context: format!("{} ready signal", script),
                source: e,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(FillError::SessionProtocol {
                command: "launch".into(),
                error: format!("Did not receive ready signal from {}", script),
            });
        }

        tracing::debug!("Browser driver {} ready", script);

        Ok(BrowserSession {
            child,
            stdin,
            reader,
        })
    }

    /// Send a request and read the response.
    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, FillError> {
        let json = serde_json::to_string(request).map_err(|e| FillError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)
            .map_err(|e| FillError::SessionIO(format!("Failed to write to driver stdin: {}", e)))?;

        self.stdin
            .flush()
            .map_err(|e| FillError::SessionIO(format!("Failed to flush driver stdin: {}", e)))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| FillError::SessionIO(format!("Failed to read from driver stdout: {}", e)))?;

        if line.trim().is_empty() {
            return Err(FillError::SessionIO(
                "Empty response from browser driver (process may have died)".into(),
            ));
        }

        serde_json::from_str(line.trim()).map_err(|e| FillError::JsonParse {
            context: "browser driver response".into(),
            source: e,
        })
    }

    /// Send a request and verify it succeeded.
    fn send_ok(&mut self, request: &BrowserRequest, command_name: &str) -> Result<BrowserResponse, FillError> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(FillError::SessionProtocol {
                command: command_name.into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }

    /// Quit the browser session.
    pub fn quit(&mut self) -> Result<(), FillError> {
        // Best-effort quit, the process may already be gone
        let _ = self.send(&BrowserRequest::quit());
        let _ = self.child.wait();
        Ok(())
    }
}

impl FormPage for BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<(), FillError> {
        self.send_ok(&BrowserRequest::navigate(url), "navigate")?;
        Ok(())
    }

    fn snapshot(&mut self) -> Result<FormSnapshot, FillError> {
        let response = self.send_ok(&BrowserRequest::snapshot(), "snapshot")?;
        let data = response.data.ok_or_else(|| FillError::SessionProtocol {
            command: "snapshot".into(),
            error: "No data in snapshot response".into(),
        })?;
        snapshot_from_value(data)
    }

    fn act(&mut self, index: u32, verb: Verb, value: Option<&str>) -> Result<(), FillError> {
        self.send_ok(&BrowserRequest::act(index, verb, value), "act")?;
        Ok(())
    }

    fn page_text(&mut self) -> Result<String, FillError> {
        let response = self.send_ok(&BrowserRequest::page_text(), "page_text")?;
        Ok(response.text.unwrap_or_default())
    }

    fn current_url(&mut self) -> Result<String, FillError> {
        let response = self.send_ok(&BrowserRequest::current_url(), "current_url")?;
        response.url.ok_or_else(|| FillError::SessionProtocol {
            command: "current_url".into(),
            error: "No URL in current_url response".into(),
        })
    }

    fn settle(&mut self, ms: u64) -> Result<(), FillError> {
        self.send_ok(&BrowserRequest::wait(ms), "wait")?;
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Best-effort cleanup
        let _ = self.quit();
    }
}
