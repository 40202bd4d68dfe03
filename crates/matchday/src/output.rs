//! Output formatting: human-readable text or JSON.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;

use matchday_core::{ConnectionState, FeedItem, LiveEvent, MatchSnapshot, Phase};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Output settings resolved once from the global flags.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Printer {
    /// Print the rendered output to stdout, respecting quiet mode.
    pub fn print(&self, output: &str) {
        if self.quiet || output.is_empty() {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{output}");
    }

    /// Render `data` in the chosen structured format, or with `text_fn`.
    pub fn render<T: Serialize + ?Sized>(
        &self,
        data: &T,
        text_fn: impl FnOnce(&T) -> String,
    ) -> Result<String, CliError> {
        Ok(match self.format {
            OutputFormat::Text => text_fn(data),
            OutputFormat::Json => serde_json::to_string_pretty(data)?,
            OutputFormat::JsonCompact => serde_json::to_string(data)?,
        })
    }
}

// ── Text renderers ───────────────────────────────────────────────────

/// One line per feed item; the `over.ball` label only on group heads.
pub fn feed_text(items: &[FeedItem], color: bool) -> String {
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let entry = &item.entry;
        let label = item.label().map(|l| l.to_string()).unwrap_or_default();
        let label = format!("{label:>6}");
        let label = if color {
            label.bold().to_string()
        } else {
            label
        };

        let text = match (entry.wicket, entry.runs) {
            (true, _) => format!("{} {}", paint("W", color, Tone::Alert), entry.text),
            (false, Some(runs @ (4 | 6))) => {
                format!("{} {}", paint(&runs.to_string(), color, Tone::Good), entry.text)
            }
            _ => entry.text.clone(),
        };

        let text = match entry.phase {
            Phase::Ball => text,
            Phase::PreBall | Phase::PostBall => paint(&text, color, Tone::Muted),
        };
        lines.push(format!("{label}  {text}"));
    }
    lines.join("\n")
}

pub fn snapshot_text(snapshot: &MatchSnapshot, color: bool) -> String {
    let header = format!("{} {}", snapshot.sport, snapshot.match_id);
    let header = if color {
        header.bold().to_string()
    } else {
        header
    };
    let summary = ["status", "score", "summary"]
        .iter()
        .find_map(|key| snapshot.payload.get(key).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
        .unwrap_or_default();
    format!(
        "{header}  {}  {}  {summary}",
        snapshot.received_at.format("%H:%M:%S"),
        paint(&format!("{:?}", snapshot.origin).to_lowercase(), color, Tone::Muted),
    )
}

pub fn event_text(event: &LiveEvent, color: bool) -> String {
    let (name, tone) = match event {
        LiveEvent::MatchStarted { .. } => ("match started", Tone::Good),
        LiveEvent::MatchEnded { .. } => ("match ended", Tone::Muted),
        LiveEvent::GoalScored { .. } => ("goal", Tone::Good),
        LiveEvent::WicketFallen { .. } => ("wicket", Tone::Alert),
        LiveEvent::NewContent { .. } => ("new content", Tone::Muted),
        LiveEvent::Notification { category, message } => {
            return format!("{} {message}", paint(&format!("[{category}]"), color, Tone::Muted));
        }
    };
    paint(&format!("* {name}"), color, tone)
}

pub fn state_text(state: &ConnectionState, color: bool) -> String {
    let tone = match state {
        ConnectionState::Connected { .. } => Tone::Good,
        ConnectionState::Degraded { .. } => Tone::Alert,
        _ => Tone::Muted,
    };
    paint(&format!("-- {state}"), color, tone)
}

#[derive(Clone, Copy)]
enum Tone {
    Good,
    Alert,
    Muted,
}

fn paint(text: &str, color: bool, tone: Tone) -> String {
    if !color {
        return text.to_owned();
    }
    match tone {
        Tone::Good => text.green().to_string(),
        Tone::Alert => text.red().bold().to_string(),
        Tone::Muted => text.dimmed().to_string(),
    }
}
