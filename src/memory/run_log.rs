use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
};

use crate::memory::event::RunEvent;

pub const DEFAULT_LOG_PATH: &str = "memory/run_log.jsonl";

/// Append-only JSON Lines record of past runs.
///
/// Optional: a disabled log (fresh mode) swallows every event. Write
/// failures are reported once per event and never interrupt a run.
pub struct RunLog {
    file: Option<File>,
}

impl RunLog {
    pub fn open(path: &str) -> Self {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Could not create run log directory '{}': {}", parent.display(), e);
            }
        }

        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Self { file: Some(f) },
            Err(e) => {
                tracing::warn!("Could not open run log '{}': {}", path, e);
                Self { file: None }
            }
        }
    }

    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub fn log(&self, event: &RunEvent) {
        let mut file = match &self.file {
            Some(f) => f,
            None => return, // memory bypassed
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("Failed to serialize run event: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            tracing::warn!("Failed to write run event: {}", e);
        }
    }
}

/// Read every parseable event from a run log. Missing file → empty.
pub fn read_events(path: &str) -> std::io::Result<Vec<RunEvent>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    Ok(content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| match serde_json::from_str::<RunEvent>(l) {
            Ok(ev) => Some(ev),
            Err(e) => {
                tracing::debug!("Skipping unreadable run log line: {}", e);
                None
            }
        })
        .collect())
}

/// Clear the run log. With `keep_latest`, events of the most recent run are
/// kept. Unreadable lines always go. Returns the number of removed lines.
pub fn clear_run_log(path: &str, keep_latest: bool) -> std::io::Result<usize> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let lines: Vec<(&str, Option<RunEvent>)> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| (l, serde_json::from_str::<RunEvent>(l).ok()))
        .collect();
    if lines.is_empty() {
        return Ok(0);
    }

    let latest = lines
        .iter()
        .rev()
        .find_map(|(_, ev)| ev.as_ref().map(|e| e.run_id.clone()));
    let kept: Vec<&str> = match (&latest, keep_latest) {
        (Some(id), true) => lines
            .iter()
            .filter(|(_, ev)| ev.as_ref().is_some_and(|e| &e.run_id == id))
            .map(|(l, _)| *l)
            .collect(),
        _ => Vec::new(),
    };

    let mut out = String::new();
    for line in &kept {
        out.push_str(line);
        out.push('\n');
    }
    std::fs::write(path, out)?;

    Ok(lines.len() - kept.len())
}
