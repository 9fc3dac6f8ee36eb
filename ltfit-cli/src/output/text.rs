//! Text output formatting with colors.

use chrono::{DateTime, Local, Utc};
use ltfit_core::{ApiKeys, CalendarEvent};
use ltfit_store::{CoordinatorState, RefreshFailure};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the visit counts, one value per line.
    pub fn format_visits(&self, username: &str, state: &CoordinatorState) -> String {
        let mut lines = Vec::new();

        let status = if state.available() {
            self.green("available")
        } else {
            self.red("unavailable")
        };
        lines.push(format!("{} ({status})", self.bold(username)));
        if let Some(member_id) = &state.member_id {
            lines.push(self.dim(&format!("Member {member_id}")));
        }

        if let Some(data) = &state.data {
            lines.push(format!("  {:<16}{}", "Total visits:", data.total_visits));
            lines.push(format!("  {:<16}{}", "This year:", data.visits_this_year));
            lines.push(format!("  {:<16}{}", "This month:", data.visits_this_month));
            lines.push(format!("  {:<16}{}", "This week:", data.visits_this_week));
            let last = data
                .last_visit()
                .map_or_else(|| self.dim("never"), |at| self.format_time(&at));
            lines.push(format!("  {:<16}{last}", "Last visit:"));
        } else {
            lines.push(self.dim("  No data yet"));
        }

        if let Some(error) = &state.reservations_error {
            lines.push(self.yellow(&format!("  Reservations not updated: {error}")));
        }
        if let Some(failure) = &state.last_failure {
            lines.push(self.format_failure(failure));
        }

        lines.join("\n")
    }

    /// Formats one reservation as a single line.
    pub fn format_event(&self, event: &CalendarEvent) -> String {
        let start = event.start.with_timezone(&Local);
        let end = event.end.with_timezone(&Local);
        let mut line = format!(
            "{} {}-{}  {}",
            start.format("%a %b %d"),
            start.format("%H:%M"),
            end.format("%H:%M"),
            self.bold(&event.summary)
        );
        if let Some(location) = &event.location {
            line.push_str(&format!(" {}", self.dim(&format!("@ {location}"))));
        }
        line
    }

    /// Formats a list of reservations.
    pub fn format_events(&self, events: &[CalendarEvent]) -> String {
        if events.is_empty() {
            return self.dim("No upcoming reservations");
        }
        events
            .iter()
            .map(|e| self.format_event(e))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats the fetched API keys.
    pub fn format_keys(&self, keys: &ApiKeys, reveal: bool) -> String {
        let render = |key: &str| {
            if reveal {
                key.to_string()
            } else {
                ApiKeys::masked(key)
            }
        };
        [
            format!("{:<18}{}", "Subscription key:", self.cyan(&render(keys.subscription_key()))),
            format!("{:<18}{}", "Account key:", self.cyan(&render(keys.account_key()))),
        ]
        .join("\n")
    }

    /// Formats a refresh failure.
    pub fn format_failure(&self, failure: &RefreshFailure) -> String {
        let label = if failure.is_auth() {
            "Login failed"
        } else {
            "Update failed"
        };
        format!("  {} {}", self.red(&format!("{label}:")), failure.error())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn format_time(&self, at: &DateTime<Utc>) -> String {
        at.with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}
