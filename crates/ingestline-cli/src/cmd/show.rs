//! Config subcommand - print the effective settings

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::config::Config;

pub fn run(config: &Config) {
    eprintln!("\n{}", format_table(config));
}

fn format_table(config: &Config) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    let retry = &config.retry;
    table.add_row(vec![
        "Input file",
        &config.input.file_path.display().to_string(),
    ]);
    table.add_row(vec!["Record kind", ingest_kind(config)]);
    table.add_row(vec!["Batch size", &config.ingest.batch_size.to_string()]);
    table.add_row(vec![
        "Rate limit",
        &format!("{}/min", config.ingest.rate_limit_per_minute),
    ]);
    table.add_row(vec!["Customer URL", &config.endpoints.customer_url]);
    table.add_row(vec!["Transaction URL", &config.endpoints.transaction_url]);
    table.add_row(vec![
        "Max retries",
        &if retry.unbounded {
            "unbounded".to_string()
        } else {
            retry.max_retries.to_string()
        },
    ]);
    table.add_row(vec![
        "Backoff",
        &format!("{}ms doubling, cap {}ms", retry.base_delay_ms, retry.max_delay_ms),
    ]);
    table.add_row(vec![
        "Rate-limited wait",
        &format!("{}-{}ms", retry.rate_limit_min_ms, retry.rate_limit_max_ms),
    ]);
    table.add_row(vec![
        "Request timeout",
        &format!("{}s", config.http.timeout_secs),
    ]);
    table
}

fn ingest_kind(config: &Config) -> &'static str {
    ingestline_bulk::RecordKind::from(config.ingest.record_kind).as_str()
}
