use anyhow::{Context, Result};
use colored::*;
use gemini_chat_widget::output::{render_message, render_panel};
use gemini_chat_widget::widget::{KeyCode, KeyEvent};
use gemini_chat_widget::{ChatFailure, ChatTransport, ChatWidget};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

fn typing_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Assistant is typing...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn print_latest(widget: &ChatWidget) {
    if let Some(message) = widget.messages().last() {
        println!("{}", render_message(message, widget.options()));
    }
}

/// Opens the panel, sends one message and prints the transcript
pub async fn run_single_query(
    prompt: String,
    widget: &mut ChatWidget,
    transport: &dyn ChatTransport,
) -> Result<()> {
    info!("Running single query: {}", prompt);
    if !widget.is_open() {
        widget.toggle();
    }

    let spinner = typing_spinner();
    let sent = widget.send(&prompt, transport).await;
    spinner.finish_and_clear();

    if !sent {
        println!("Nothing to send.");
        return Ok(());
    }

    for message in widget.messages() {
        println!("{}", render_message(message, widget.options()));
    }
    Ok(())
}

/// Key presses equivalent to typing `line` and pressing Enter.
///
/// A trailing backslash stands for Shift+Enter: the line break is kept in
/// the input and nothing is submitted.
pub fn keys_for_line(line: &str) -> Vec<KeyEvent> {
    let (text, shift) = match line.strip_suffix('\\') {
        Some(text) => (text, true),
        None => (line, false),
    };

    let mut keys: Vec<KeyEvent> = text.chars().map(|c| KeyEvent::new(KeyCode::Char(c))).collect();
    keys.push(KeyEvent {
        code: KeyCode::Enter,
        shift,
    });
    keys
}

/// Runs the panel against stdin until `exit`, `quit` or end of input.
pub async fn run_interactive_chat(
    widget: &mut ChatWidget,
    transport: Arc<dyn ChatTransport>,
) -> Result<()> {
    if !widget.is_open() {
        widget.toggle();
    }
    println!("{}", render_panel(widget));
    println!("Type 'exit' or 'quit' to end the session.");
    println!();

    chat_loop(widget, transport, BufReader::new(tokio::io::stdin())).await
}

/// Input keeps being read while a request is in flight so that the
/// single-flight gate is visible: such lines are dropped. When the input
/// ends with a request still in flight, its answer is awaited and shown.
async fn chat_loop<R>(
    widget: &mut ChatWidget,
    transport: Arc<dyn ChatTransport>,
    input: R,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<Result<String, ChatFailure>>(1);
    let mut spinner: Option<ProgressBar> = None;
    let mut input_closed = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    input_closed = true;
                    break;
                };
                let trimmed = line.trim();

                if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
                    println!("Exiting chat session.");
                    break;
                }
                if trimmed == "/toggle" {
                    widget.toggle();
                    println!("{}", render_panel(widget));
                    continue;
                }
                if trimmed == "/show" {
                    println!("{}", render_panel(widget));
                    continue;
                }
                if !widget.is_open() {
                    println!("{}", "The chat panel is closed. Type /toggle to open it.".yellow());
                    continue;
                }
                if widget.is_busy() {
                    debug!("Dropped input while busy: {}", line);
                    if let Some(spinner) = &spinner {
                        spinner.println("Still waiting for the previous answer; message not sent.");
                    }
                    continue;
                }

                for key in keys_for_line(&line) {
                    let Some(pending) = widget.handle_key(key) else {
                        continue;
                    };
                    print_latest(widget);
                    spinner = Some(typing_spinner());

                    let transport = Arc::clone(&transport);
                    let outcome_tx = outcome_tx.clone();
                    tokio::spawn(async move {
                        let outcome = transport.send(&pending.message).await;
                        let _ = outcome_tx.send(outcome).await;
                    });
                }
            }
            Some(outcome) = outcome_rx.recv() => {
                if let Some(spinner) = spinner.take() {
                    spinner.finish_and_clear();
                }
                widget.complete(outcome);
                print_latest(widget);
                println!();
            }
        }
    }

    // Only the spawned request still holds a sender now.
    drop(outcome_tx);
    if input_closed && widget.is_busy() {
        if let Some(outcome) = outcome_rx.recv().await {
            if let Some(spinner) = spinner.take() {
                spinner.finish_and_clear();
            }
            widget.complete(outcome);
            print_latest(widget);
        }
    }

    if let Some(spinner) = spinner.take() {
        spinner.finish_and_clear();
    }
    Ok(())
}
