//! Replay a session script against a mock editor.
//!
//! A script has one JSON step per line; blank lines and lines starting with
//! `#` are skipped:
//!
//! ```text
//! {"publish": {"uri": "file:/a.mj", "name": "target", "language": "js", "content": "", "rangeMap": []}}
//! {"select": {"uri": "file:///a.mj", "selections": [[1, 1]]}}
//! {"sync": {"uri": "file:///a.mj"}}
//! {"close": {"uri": "monto:/a.mj-target.js"}}
//! ```
//!
//! After every step the session runs until idle and the transcript lists the
//! content changes, view opens and selection writes it caused.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use url::Url;

use monto_sync_client::{
    ContentChange, DisplayPolicy, FramedChannel, MockEditor, Session, SessionConfig, SessionEvent,
    ShowAll, ShowNone,
};
use monto_sync_core::TextRange;
use monto_sync_types::{Message, PublishProduct};

use crate::ShowArg;

/// One scripted step.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    /// Deliver a `monto/publishProduct` notification.
    Publish(PublishProduct),
    /// The user selects in a document (opening it if needed).
    Select {
        uri: String,
        selections: Vec<(usize, usize)>,
    },
    /// The user triggers a manual sync from a source document.
    Sync { uri: String },
    /// The user closes a document's view.
    Close { uri: String },
}

/// Run the replay command.
pub async fn run<W: Write>(
    config: &SessionConfig,
    script: &Path,
    frames: Option<&Path>,
    show: ShowArg,
    out: &mut W,
) -> Result<()> {
    let text = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let steps = parse_script(&text)?;
    tracing::debug!(script = %script.display(), steps = steps.len(), "replaying script");

    let editor = MockEditor::new();
    let policy: Arc<dyn DisplayPolicy> = match show {
        ShowArg::All => Arc::new(ShowAll),
        ShowArg::None => Arc::new(ShowNone),
    };
    let mut session =
        Session::new(Arc::new(editor.clone()), config, policy).context("Failed to start session")?;
    let mut transcript = Transcript::new(session.provider().subscribe(), editor.clone());

    if let Some(path) = frames {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        writeln!(out, "> frames {}", path.display())?;
        session.attach(Arc::new(FramedChannel::new(file)));
        session.run_until_idle().await;
        transcript.flush(out)?;
    }

    for (line, step) in steps {
        let event = match step {
            Step::Publish(payload) => {
                writeln!(out, "> publish {} {}.{}", payload.uri, payload.name, payload.language)?;
                let body = Message::PublishProduct(payload)
                    .to_bytes()
                    .with_context(|| format!("line {line}: cannot encode product"))?;
                SessionEvent::Notification(body)
            }
            Step::Select { uri, selections } => {
                let uri = parse_uri(line, &uri)?;
                let selections: Vec<TextRange> = selections
                    .into_iter()
                    .map(|(start, end)| TextRange::new(start, end))
                    .collect();
                writeln!(out, "> select {uri} {}", format_ranges(&selections))?;
                let view = editor.select(&uri, selections.clone());
                SessionEvent::SelectionChanged {
                    uri,
                    view,
                    selections,
                }
            }
            Step::Sync { uri } => {
                let uri = parse_uri(line, &uri)?;
                writeln!(out, "> sync {uri}")?;
                let view = editor
                    .view_of(&uri)
                    .unwrap_or_else(|| editor.open_now(&uri));
                SessionEvent::ManualSync { uri, view }
            }
            Step::Close { uri } => {
                let uri = parse_uri(line, &uri)?;
                writeln!(out, "> close {uri}")?;
                SessionEvent::ViewClosed { uri }
            }
        };

        if let Err(e) = session.process(event).await {
            writeln!(out, "  ! {e}")?;
        }
        session.run_until_idle().await;
        transcript.flush(out)?;
    }

    Ok(())
}

fn parse_script(text: &str) -> Result<Vec<(usize, Step)>> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| {
            let step = serde_json::from_str(line).with_context(|| format!("line {n}: invalid step"))?;
            Ok((n, step))
        })
        .collect()
}

fn parse_uri(line: usize, raw: &str) -> Result<Url> {
    Url::parse(raw).with_context(|| format!("line {line}: invalid uri {raw:?}"))
}

fn format_ranges(ranges: &[TextRange]) -> String {
    ranges
        .iter()
        .map(|r| format!("[{}, {})", r.start, r.end))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reports what the session did since the last flush.
struct Transcript {
    changes: broadcast::Receiver<ContentChange>,
    editor: MockEditor,
    opens_seen: usize,
    applied_seen: usize,
}

impl Transcript {
    fn new(changes: broadcast::Receiver<ContentChange>, editor: MockEditor) -> Self {
        Self {
            changes,
            editor,
            opens_seen: 0,
            applied_seen: 0,
        }
    }

    fn flush<W: Write>(&mut self, out: &mut W) -> Result<()> {
        loop {
            match self.changes.try_recv() {
                Ok(change) => writeln!(
                    out,
                    "  content {} generation {}",
                    change.uri,
                    change.generation.value()
                )?,
                Err(TryRecvError::Lagged(skipped)) => {
                    writeln!(out, "  content ({skipped} changes skipped)")?
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        let opens = self.editor.opens();
        for (uri, placement) in &opens[self.opens_seen..] {
            writeln!(out, "  open {uri} column {}", placement.column)?;
        }
        self.opens_seen = opens.len();

        let applied = self.editor.applied();
        for write in &applied[self.applied_seen..] {
            writeln!(out, "  apply {} {}", write.uri, format_ranges(&write.selections))?;
        }
        self.applied_seen = applied.len();
        Ok(())
    }
}
