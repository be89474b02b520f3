use chrono::{DateTime, Utc};
use pixatools_application::ToolOutput;
use pixatools_domain::{HistoryEntry, QuotaStatus};

pub fn present_history_row(entry: &HistoryEntry) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        entry.id,
        format_date(entry.timestamp),
        short_type(&entry.mime_type),
        format_size(entry.size),
        entry.name
    )
}

pub fn present_usage(status: &QuotaStatus) -> String {
    format!(
        "ai calls used {}/{} (remaining {}), window resets {}",
        status.used,
        status.limit,
        status.remaining,
        format_datetime(status.resets_at)
    )
}

pub fn present_tool_output(output: &ToolOutput, path: &str) -> String {
    let mut line = format!(
        "saved {} ({}, {}) as history entry {}",
        path,
        output.image.mime_type,
        format_size(output.image.bytes.len() as u64),
        output.entry.id
    );
    if output.degraded {
        line.push_str(" [processing failed, original kept]");
    }
    line
}

fn short_type(mime: &str) -> &str {
    mime.split_once('/').map_or(mime, |(_, subtype)| subtype)
}

fn format_date(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

fn format_datetime(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|date| date.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

fn format_size(bytes: u64) -> String {
    match bytes {
        0..=1023 => format!("{bytes} B"),
        1024..=1_048_575 => format!("{:.1} KB", bytes as f64 / 1024.0),
        _ => format!("{:.1} MB", bytes as f64 / 1_048_576.0),
    }
}
