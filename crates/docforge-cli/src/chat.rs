//! Interactive question loop

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use docforge_core::ai::TokenSink;
use docforge_core::AppContext;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error};

const SEPARATOR: &str = "--------------------------------------------------";

/// Sink that echoes streamed tokens to stdout as they arrive
pub fn stdout_sink(stream: bool) -> Option<TokenSink> {
    if !stream {
        return None;
    }
    let sink: TokenSink = Arc::new(|token: &str| {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(token.as_bytes());
        let _ = stdout.flush();
    });
    Some(sink)
}

pub fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("exit")
}

/// Run both stages for one request and print the final code
pub async fn answer(context: &AppContext, query: &str) -> Result<()> {
    let pipeline = context.pipeline();
    let streaming = context.config().generator.stream;

    println!("Analyzing required functions...");
    let mut session = pipeline.analyze(query).await?;
    if streaming {
        // Stage 1 output was already echoed by the sink
        println!();
    }

    println!("{SEPARATOR}");
    pipeline.synthesize(&mut session).await?;
    if streaming {
        println!();
    } else if let Some(response) = &session.response {
        println!("{response}");
    }
    println!("{SEPARATOR}");
    Ok(())
}

/// Answer one chat line; failures are logged and the loop carries on
pub async fn answer_or_log(context: &AppContext, query: &str) -> bool {
    debug!("Chat query: {}", query);
    match answer(context, query).await {
        Ok(()) => true,
        Err(e) => {
            error!("Query failed: {e:#}");
            false
        }
    }
}

pub async fn run(context: &AppContext) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nYour question: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if is_exit(&line) {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        answer_or_log(context, query).await;
    }
    Ok(())
}
