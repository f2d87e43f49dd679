//! Replays captured service output through the engine

use anyhow::{Context, Result};
use futures::StreamExt;
use recon_engine::{Grouped, MessageGrouper, TurnMode, format_turn, into_sse};
use recon_wire::parse_items;
use serde_json::Value;
use std::io::{Read, Write};
use std::path::Path;

/// Read a capture file, or stdin when the path is `-`
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Group a captured item list
pub fn group_capture(text: &str, fallback_timestamp: i64) -> Result<Grouped> {
    let raw: Value = serde_json::from_str(text).context("Item capture is not valid JSON")?;
    let items = parse_items(&raw)?;
    Ok(MessageGrouper::new()
        .with_fallback_timestamp(fallback_timestamp)
        .group_with_report(&items))
}

/// Parse a JSON-lines step event capture, skipping blank lines
pub fn parse_event_lines(text: &str) -> Result<Vec<Value>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Line {} is not valid JSON", index + 1))
        })
        .collect()
}

/// Print grouped messages as JSON on stdout and drops on stderr
pub fn print_messages(grouped: &Grouped, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(&grouped.messages)?
    } else {
        serde_json::to_string_pretty(&grouped.messages)?
    };
    println!("{}", json);

    for dropped in &grouped.drops {
        eprintln!(
            "dropped {} tool call(s) ({}): {}",
            dropped.tool_call_ids.len(),
            serde_json::to_string(&dropped.reason)?,
            dropped.tool_call_ids.join(", ")
        );
    }
    Ok(())
}

/// Format a captured turn and write it to `out` as text or SSE frames
pub async fn replay_turn(
    events: Vec<Value>,
    mode: TurnMode,
    sse: bool,
    out: &mut impl Write,
) -> Result<()> {
    let fragments = format_turn(tokio_stream::iter(events), mode);

    if sse {
        let mut frames = into_sse(fragments);
        while let Some(frame) = frames.next().await {
            out.write_all(frame.as_bytes())?;
            out.flush()?;
        }
    } else {
        let mut fragments = fragments;
        while let Some(fragment) = fragments.next().await {
            write!(out, "{}", fragment)?;
            out.flush()?;
        }
        writeln!(out)?;
    }
    Ok(())
}
