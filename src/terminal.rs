//! Terminal adapters for the capability ports, plus the stdin command parser.
//!
//! DESIGN
//! ======
//! Everything here is presentation. Write failures are logged and dropped so
//! a closed stdout cannot wedge a draw cycle. Diagnostics go through
//! `tracing` (stderr); stdout carries only user-facing output, which is
//! either plain text or one JSON object per line.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as Process;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ports::{Chime, PortError, Presenter, ShareTarget};
use crate::reveal::{CycleEvent, Pacing, RevealEvent, SummaryEvent};

// =============================================================================
// COMMANDS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Draw,
    Share,
    Quit,
}

/// Map one input line to a command. An empty line draws.
#[must_use]
pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "d" | "draw" => Some(Command::Draw),
        "s" | "share" => Some(Command::Share),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

/// Blocking command reader: parse each line of `input` and forward it to `tx`.
///
/// Stops right after forwarding `Quit`, at end of input, on a read error,
/// or once the receiver is gone. Call it from a plain thread: `blocking_send`
/// panics inside the runtime.
pub fn forward_commands<R: BufRead>(input: R, tx: &mpsc::Sender<Command>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                return;
            }
        };
        let Some(cmd) = parse_command(&line) else {
            debug!(input = %line.trim(), "unrecognized command");
            continue;
        };
        if tx.blocking_send(cmd).is_err() || cmd == Command::Quit {
            return;
        }
    }
}

/// What to tell the user after `via` took the shared result. The console
/// target already printed the text, so it gets no extra line.
#[must_use]
pub fn share_confirmation(via: &str) -> Option<&'static str> {
    match via {
        "console" => None,
        "clipboard" => Some("Result copied to clipboard."),
        "file" => Some("Result written to the share file."),
        _ => Some("Result shared."),
    }
}

// =============================================================================
// PRESENTER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct TerminalPresenter<W> {
    out: Mutex<W>,
    mode: OutputMode,
}

impl TerminalPresenter<std::io::Stdout> {
    #[must_use]
    pub fn stdout(mode: OutputMode) -> Self {
        Self::new(std::io::stdout(), mode)
    }
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub fn new(out: W, mode: OutputMode) -> Self {
        Self { out: Mutex::new(out), mode }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Greeting shown once at startup (text mode only).
    pub fn welcome(&self) {
        if self.mode == OutputMode::Text {
            self.emit("Welcome! Fair random draw for cleaning duty.");
            self.emit("Enter (or d) draws, s shares the last result, q quits.");
        }
    }

    /// Free-form notice, for example "nothing to share yet".
    pub fn notice(&self, message: &str) {
        match self.mode {
            OutputMode::Text => self.emit(message),
            OutputMode::Json => self.emit_json(&serde_json::json!({ "event": "notice", "message": message })),
        }
    }

    fn emit(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!(error = %e, "terminal write failed");
        }
    }

    fn emit_json(&self, value: &serde_json::Value) {
        self.emit(&value.to_string());
    }

    fn emit_event(&self, event: &CycleEvent) {
        match serde_json::to_value(event) {
            Ok(value) => self.emit_json(&value),
            Err(e) => warn!(error = %e, "event serialization failed"),
        }
    }
}

#[async_trait]
impl<W: Write + Send> Presenter for TerminalPresenter<W> {
    async fn announce(&self, pacing: &Pacing) {
        match self.mode {
            OutputMode::Text => self.emit("Drawing duty numbers, hold on..."),
            OutputMode::Json => {
                let announce_ms = u64::try_from(pacing.announce.as_millis()).unwrap_or(u64::MAX);
                self.emit_json(&serde_json::json!({ "event": "announce", "announce_ms": announce_ms }));
            }
        }
    }

    async fn present_reveal(&self, event: &RevealEvent) {
        match self.mode {
            OutputMode::Text => self.emit(&format!("  #{} -> {:>2}", event.position + 1, event.value)),
            OutputMode::Json => self.emit_event(&CycleEvent::Reveal(event.clone())),
        }
    }

    /// Acknowledges on its own: returns as soon as the summary is written,
    /// so the session goes back to `Idle` without waiting for a key.
    async fn present_summary(&self, event: &SummaryEvent) {
        match self.mode {
            OutputMode::Text => {
                self.emit(&format!("Selected: {}", event.draw));
                self.emit(&format!("Draw #{} complete.", event.ordinal));
            }
            OutputMode::Json => self.emit_event(&CycleEvent::Summary(event.clone())),
        }
    }
}

// =============================================================================
// CHIME
// =============================================================================

/// Terminal bell on stdout.
pub struct BellChime;

impl Chime for BellChime {
    fn play(&self) -> Result<(), PortError> {
        let mut out = std::io::stdout().lock();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

// =============================================================================
// SHARE TARGETS
// =============================================================================

const CLIPBOARD_PROGRAMS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("pbcopy", &[]),
];

/// Pipes the share text into the first clipboard program found on `PATH`.
pub struct ClipboardCommand {
    programs: Vec<(&'static str, &'static [&'static str])>,
}

impl Default for ClipboardCommand {
    fn default() -> Self {
        Self { programs: CLIPBOARD_PROGRAMS.to_vec() }
    }
}

impl ClipboardCommand {
    #[must_use]
    pub fn with_programs(programs: Vec<(&'static str, &'static [&'static str])>) -> Self {
        Self { programs }
    }
}

#[async_trait]
impl ShareTarget for ClipboardCommand {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    async fn share(&self, _title: &str, text: &str) -> Result<(), PortError> {
        for &(program, args) in &self.programs {
            let spawned = Process::new(program)
                .args(args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
            let mut child = match spawned {
                Ok(child) => child,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(text.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            let status = child.wait().await?;
            if status.success() {
                return Ok(());
            }
            return Err(PortError::Failed { target: "clipboard", message: format!("{program} exited with {status}") });
        }
        Err(PortError::Unsupported("clipboard"))
    }
}

/// Writes the share text to a file.
pub struct FileShare {
    path: PathBuf,
}

impl FileShare {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ShareTarget for FileShare {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn share(&self, _title: &str, text: &str) -> Result<(), PortError> {
        tokio::fs::write(&self.path, format!("{text}\n")).await?;
        Ok(())
    }
}

/// Last resort: print the text so the user can copy it by hand.
pub struct ConsoleShare<W> {
    out: Mutex<W>,
}

impl ConsoleShare<std::io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleShare<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<W: Write + Send> ShareTarget for ConsoleShare<W> {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn share(&self, title: &str, text: &str) -> Result<(), PortError> {
        let width = text.lines().chain([title]).map(|l| l.chars().count()).max().unwrap_or(0);
        let rule = "-".repeat(width + 4);

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "+{rule}+")?;
        writeln!(out, "|  {title:<width$}  |")?;
        writeln!(out, "+{rule}+")?;
        for line in text.lines() {
            writeln!(out, "|  {line:<width$}  |")?;
        }
        writeln!(out, "+{rule}+")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "terminal_test.rs"]
mod tests;
