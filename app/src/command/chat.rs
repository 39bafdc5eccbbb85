//! Interactive client for a running `banter serve`.
//!
//! Each line read from stdin is posted as one turn and the event stream is
//! rendered as it arrives: stage changes as a transient status line, tokens
//! inline, then the cited sources and a timing footer.

use std::io::{self, Write};
use std::time::Instant;

use banter_core::TurnEvent;
use banter_providers::sse::{SseDecoder, SseFrame};
use futures::StreamExt;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Base URL of the server
    pub url: String,
    /// Session key to resume; generated when absent
    pub session: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let session = input
            .session
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        let endpoint = format!("{}/v1/conversation", input.url.trim_end_matches('/'));
        let client = reqwest::Client::new();

        println!("=== Conversation Session: {session} ===");
        println!("Type 'exit' or 'quit' to end the session.\n");

        let mut turns = 0_usize;
        loop {
            print!("> ");
            io::stdout().flush()?;

            let mut line = String::new();
            if io::stdin().read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();

            if matches!(line, "exit" | "quit") {
                break;
            }
            if line.is_empty() {
                continue;
            }

            match send_turn(&client, &endpoint, &session, line).await {
                Ok(true) => turns += 1,
                Ok(false) => {}
                Err(e) => eprintln!("Error: {e}"),
            }
        }

        println!("\nSession ended. Completed turns: {turns}");
        Ok(())
    }
}

/// Post one turn and render its events. Returns whether it finished.
async fn send_turn(
    client: &reqwest::Client,
    endpoint: &str,
    session: &str,
    input: &str,
) -> anyhow::Result<bool> {
    let started = Instant::now();
    let response = client
        .post(endpoint)
        .json(&json!({ "session": session, "input": input }))
        .send()
        .await?
        .error_for_status()?;

    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut view = TurnView::default();
    let mut stdout = io::stdout();

    while let Some(chunk) = body.next().await {
        for frame in decoder.push(&chunk?) {
            view.render_frame(&frame, &mut stdout)?;
        }
    }
    if let Some(frame) = decoder.finish() {
        view.render_frame(&frame, &mut stdout)?;
    }

    if !view.terminal_seen {
        warn!("Event stream ended before the turn finished");
        writeln!(stdout, "\n[connection closed before the turn finished]")?;
    }
    writeln!(
        stdout,
        "\nGenerated {} tokens in {:.2} seconds\n",
        view.tokens,
        started.elapsed().as_secs_f64()
    )?;
    Ok(view.finished)
}

/// Terminal rendering state of one turn.
#[derive(Debug, Default)]
struct TurnView {
    tokens: usize,
    status_shown: bool,
    terminal_seen: bool,
    finished: bool,
}

impl TurnView {
    fn render_frame(&mut self, frame: &SseFrame, out: &mut impl Write) -> io::Result<()> {
        match serde_json::from_str::<TurnEvent>(&frame.data) {
            Ok(event) => self.render(&event, out),
            Err(e) => {
                debug!(event = ?frame.event, "Skipping undecodable frame: {e}");
                Ok(())
            }
        }
    }

    fn render(&mut self, event: &TurnEvent, out: &mut impl Write) -> io::Result<()> {
        match event {
            TurnEvent::GeneratingToken { text } => {
                if self.tokens == 0 {
                    self.clear_status(out)?;
                    write!(out, "AI:")?;
                }
                self.tokens += 1;
                write!(out, "{text}")?;
            }
            TurnEvent::Finished { sources } => {
                self.clear_status(out)?;
                self.terminal_seen = true;
                self.finished = true;
                writeln!(out)?;
                if !sources.is_empty() {
                    writeln!(out, "\nSources:")?;
                    for source in sources {
                        writeln!(out, "  - {source}")?;
                    }
                }
            }
            TurnEvent::Failed => {
                self.clear_status(out)?;
                self.terminal_seen = true;
                writeln!(out, "\nTurn failed; nothing was remembered.")?;
            }
            stage => {
                if self.tokens == 0 {
                    write!(out, "\r\x1b[2K[{}]", status_label(stage))?;
                    self.status_shown = true;
                } else {
                    write!(out, "\n[{}]", status_label(stage))?;
                }
            }
        }
        out.flush()
    }

    fn clear_status(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.status_shown {
            write!(out, "\r\x1b[2K")?;
            self.status_shown = false;
        }
        Ok(())
    }
}

const fn status_label(event: &TurnEvent) -> &'static str {
    match event {
        TurnEvent::LoadingHistory => "Loading history...",
        TurnEvent::SearchingWeb => "Searching the web...",
        TurnEvent::BuildingPrompt => "Building prompt...",
        TurnEvent::GeneratingToken { .. } => "Generating...",
        TurnEvent::UpdatingMemory => "Updating memory...",
        TurnEvent::Finished { .. } => "Finished",
        TurnEvent::Failed => "Failed",
    }
}
