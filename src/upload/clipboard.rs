use std::io::{self, BufRead, Read, Write};

use thiserror::Error;

/// Hidden subcommand a detached copy of this binary runs to keep serving a
/// copied selection on Linux.
pub const HOLD_COMMAND: &str = "__hold-clipboard";

const READY: &str = "ready";

#[derive(Debug, Error)]
#[error("Clipboard error: {0}")]
pub struct ClipboardError(String);

impl From<io::Error> for ClipboardError {
    fn from(e: io::Error) -> Self {
        ClipboardError(e.to_string())
    }
}

impl From<arboard::Error> for ClipboardError {
    fn from(e: arboard::Error) -> Self {
        ClipboardError(e.to_string())
    }
}

pub trait Clipboard {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Ownership of the system selection.
pub trait Selection {
    fn take(&mut self, text: &str) -> Result<(), ClipboardError>;
    /// Blocks until another program replaces the selection.
    fn serve(&mut self, text: &str) -> Result<(), ClipboardError>;
}

pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        Ok(Self {
            inner: arboard::Clipboard::new()?,
        })
    }
}

impl Selection for SystemClipboard {
    fn take(&mut self, text: &str) -> Result<(), ClipboardError> {
        Ok(self.inner.set_text(text.to_string())?)
    }

    #[cfg(target_os = "linux")]
    fn serve(&mut self, text: &str) -> Result<(), ClipboardError> {
        use arboard::SetExtLinux;
        Ok(self.inner.set().wait().text(text.to_string())?)
    }

    #[cfg(not(target_os = "linux"))]
    fn serve(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Ok(())
    }
}

impl Clipboard for SystemClipboard {
    /// X11 and Wayland selections vanish with the process that owns them, so the
    /// text is handed to a detached helper that outlives this one.
    #[cfg(target_os = "linux")]
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        use std::io::BufReader;
        use std::process::{Command, Stdio};

        let mut child = Command::new(std::env::current_exe()?)
            .arg(HOLD_COMMAND)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        tracing::debug!(pid = child.id(), "clipboard helper started");

        // closing stdin ends the text
        child
            .stdin
            .take()
            .ok_or_else(|| ClipboardError("helper stdin unavailable".to_string()))?
            .write_all(text.as_bytes())?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClipboardError("helper stdout unavailable".to_string()))?;
        wait_ready(BufReader::new(stdout))
    }

    #[cfg(not(target_os = "linux"))]
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.take(text)
    }
}

/// Parent side of the handoff: succeeds once the helper owns the selection.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn wait_ready(mut helper: impl BufRead) -> Result<(), ClipboardError> {
    let mut line = String::new();
    helper.read_line(&mut line)?;
    if line.trim_end() == READY {
        Ok(())
    } else {
        Err(ClipboardError(
            "helper exited before taking the clipboard".to_string(),
        ))
    }
}

/// Helper side: reads the text until EOF, takes the selection, reports
/// readiness, then serves the text until it is replaced.
pub fn hold_selection(
    mut input: impl Read,
    mut output: impl Write,
    selection: &mut dyn Selection,
) -> Result<(), ClipboardError> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    selection.take(&text)?;

    writeln!(output, "{}", READY)?;
    output.flush()?;
    drop(output);

    selection.serve(&text)
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryClipboard {
    pub contents: Vec<String>,
}

#[cfg(test)]
impl Clipboard for MemoryClipboard {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.contents.push(text.to_string());
        Ok(())
    }
}
