//! Run counters and the end-of-run summary.
//!
//! Record counters:
//! - `successful_records` / `failed_records`: as reported by the endpoint for
//!   delivered batches, plus every record of a batch that ran out of retries
//!   (counted as failed)
//! - `rejected_records`: records of batches the endpoint refused outright;
//!   these are skipped, not failed

use std::time::Duration;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use ingestline_core::fmt_num;

/// Counters owned by the ingestion loop, updated as batches resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTally {
    pub total_records: u64,
    pub successful_records: u64,
    pub failed_records: u64,
    pub rejected_records: u64,
    pub batches_total: usize,
    pub batches_delivered: usize,
    pub batches_abandoned: usize,
    /// Submission attempts, retries included
    pub attempts: u64,
    pub retries: u64,
    /// Any attempt received an HTTP response
    pub endpoint_reached: bool,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl RunTally {
    pub fn batches_resolved(&self) -> usize {
        self.batches_delivered + self.batches_abandoned
    }

    /// Submissions were attempted but none ever got an HTTP response.
    pub fn endpoint_unreachable(&self) -> bool {
        self.attempts > 0 && !self.endpoint_reached
    }

    /// Log summary lines (non-TTY mode).
    pub fn log(&self) {
        for line in self.summary_lines() {
            log::info!("{line}");
        }
    }

    /// Lines for [`log`](Self::log). Record totals are left to the
    /// `Completed` event.
    fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Batches: {}/{} resolved ({} delivered, {} abandoned, {} retries)",
            self.batches_resolved(),
            self.batches_total,
            self.batches_delivered,
            self.batches_abandoned,
            self.retries
        )];
        if self.rejected_records > 0 {
            lines.push(format!("Rejected records: {}", self.rejected_records));
        }
        lines.push(format!("Time: {:.1}s", self.elapsed.as_secs_f64()));
        if self.successful_records > 0 && !self.elapsed.is_zero() {
            let rate = self.successful_records as f64 / self.elapsed.as_secs_f64();
            lines.push(format!("Throughput: {rate:.0} records/sec"));
        }
        lines
    }

    /// Format summary table as a string.
    pub fn format_table(&self, label: &str) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new(format!("Ingest: {label}"))
                    .fg(Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").fg(Color::Cyan),
            ]);

        let status = if self.cancelled {
            Cell::new("cancelled").fg(Color::Yellow)
        } else if self.endpoint_unreachable() {
            Cell::new("endpoint unreachable").fg(Color::Red)
        } else {
            Cell::new("completed").fg(Color::Green)
        };
        table.add_row(vec![Cell::new("Status"), status]);
        table.add_row(vec![
            Cell::new("Records"),
            Cell::new(fmt_num(self.total_records as usize)),
        ]);
        table.add_row(vec![
            Cell::new("Batches"),
            Cell::new(format!(
                "{}/{} ({} abandoned)",
                self.batches_resolved(),
                self.batches_total,
                self.batches_abandoned
            )),
        ]);
        table.add_row(vec![
            Cell::new("Retries"),
            Cell::new(fmt_num(self.retries as usize)),
        ]);
        table.add_row(vec![
            Cell::new("Successful"),
            Cell::new(fmt_num(self.successful_records as usize)).fg(Color::Green),
        ]);
        let failed = Cell::new(fmt_num(self.failed_records as usize));
        table.add_row(vec![
            Cell::new("Failed"),
            if self.failed_records > 0 {
                failed.fg(Color::Red)
            } else {
                failed
            },
        ]);
        if self.rejected_records > 0 {
            table.add_row(vec![
                Cell::new("Rejected (skipped)"),
                Cell::new(fmt_num(self.rejected_records as usize)).fg(Color::Yellow),
            ]);
        }
        table.add_row(vec![
            Cell::new("Time"),
            Cell::new(format!("{:.1}s", self.elapsed.as_secs_f64())),
        ]);
        table.to_string()
    }

    /// Print summary table to stderr (TTY mode).
    pub fn print(&self, label: &str) {
        eprintln!("\n{}", self.format_table(label));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lines_leave_totals_to_completed_event() {
        let tally = RunTally {
            successful_records: 250,
            failed_records: 3,
            rejected_records: 10,
            batches_total: 4,
            batches_delivered: 3,
            batches_abandoned: 1,
            elapsed: std::time::Duration::from_secs(2),
            ..RunTally::default()
        };
        let lines = tally.summary_lines();
        assert_eq!(
            lines[0],
            "Batches: 4/4 resolved (3 delivered, 1 abandoned, 0 retries)"
        );
        assert!(lines.contains(&"Rejected records: 10".to_string()));
        assert!(lines.contains(&"Throughput: 125 records/sec".to_string()));
        assert!(!lines.iter().any(|l| l.contains("Successful") || l.contains("Failed")));
    }

    #[test]
    fn unreachable_only_after_attempts() {
        let mut tally = RunTally::default();
        assert!(!tally.endpoint_unreachable());
        tally.attempts = 4;
        assert!(tally.endpoint_unreachable());
        tally.endpoint_reached = true;
        assert!(!tally.endpoint_unreachable());
    }

    #[test]
    fn table_lists_counts() {
        let tally = RunTally {
            total_records: 1_250,
            successful_records: 1_200,
            failed_records: 50,
            batches_total: 13,
            batches_delivered: 13,
            attempts: 14,
            retries: 1,
            endpoint_reached: true,
            ..RunTally::default()
        };
        let table = tally.format_table("customer");
        assert!(table.contains("Ingest: customer"));
        assert!(table.contains("1,250"));
        assert!(table.contains("1,200"));
        assert!(table.contains("13/13 (0 abandoned)"));
        assert!(table.contains("completed"));
        assert!(!table.contains("Rejected"));
    }

    #[test]
    fn table_flags_cancelled_and_rejected() {
        let tally = RunTally {
            rejected_records: 100,
            cancelled: true,
            ..RunTally::default()
        };
        let table = tally.format_table("transaction");
        assert!(table.contains("cancelled"));
        assert!(table.contains("Rejected (skipped)"));
    }
}
