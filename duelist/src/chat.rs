//! Terminal chat surface: scrollback, a `Question:` prompt, streamed tokens.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::Assistant;
use crate::errors::AppError;
use crate::transcript::Transcript;

pub const GREETING: &str = "Ask a question about the YuGiOh card game!";

/// Runs the chat loop until EOF or an exit command, threading the transcript
/// through each turn and returning the final log.
pub async fn run(assistant: &Assistant, mut transcript: Transcript) -> Result<Transcript, AppError> {
    for turn in transcript.turns() {
        println!("[{}] {}", turn.role, turn.content);
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\nQuestion: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        transcript = take_turn(assistant, transcript, question).await?;
    }

    Ok(transcript)
}

/// One chat turn: stream the response to stdout, report failures as chat
/// output instead of ending the session, and return the extended log.
async fn take_turn(
    assistant: &Assistant,
    transcript: Transcript,
    question: &str,
) -> Result<Transcript, AppError> {
    print!("\n[assistant] ");
    std::io::stdout().flush()?;

    let response = match assistant
        .stream_turn(question, &transcript, |token| {
            print!("{token}");
            let _ = std::io::stdout().flush();
        })
        .await
    {
        Ok(response) => response,
        Err(err) => {
            let fallback = format!("Something went wrong answering that: {err}");
            print!("{fallback}");
            tracing::error!(error = %err, "chat turn failed");
            fallback
        }
    };
    println!();

    Ok(transcript.with_exchange(question, response))
}
