//! Output formatting for CLI display
//!
//! This module provides utilities for formatting output in the CLI: compiled
//! queries as JSON or as a coloured summary, scan results, and alias lists.

use colored::Colorize;

use crate::grammar::ClauseType;
use crate::query::{FieldValue, GroupEntry, Query};
use crate::scan::ScanItem;

/// Serialize a query as JSON
///
/// # Errors
/// Returns `serde_json::Error` if serialization fails.
pub fn query_json(query: &Query, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(query)
    } else {
        serde_json::to_string(query)
    }
}

fn clause_label(clause: ClauseType) -> String {
    match clause {
        ClauseType::Must => "must".green().to_string(),
        ClauseType::MustNot => "must not".red().to_string(),
        ClauseType::Should => "should".yellow().to_string(),
    }
}

/// Human-readable summary of a query, one line per entry
///
/// Groups are indented under their clause; unparsed groups show their text.
#[must_use]
pub fn query_summary(query: &Query) -> Vec<String> {
    let mut lines = Vec::new();
    summarize_into(query, 0, &mut lines);
    lines
}

fn summarize_into(query: &Query, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for clause in ClauseType::ALL {
        let tags = query.tags.get(clause);
        if !tags.is_empty() {
            lines.push(format!("{indent}{}: {}", clause_label(clause), tags.join(" ")));
        }
    }
    for (key, value) in &query.metatags {
        lines.push(format!("{indent}{} = {}", key.cyan(), field_text(value)));
    }
    for (clause, entry) in query.groups.iter() {
        match entry {
            GroupEntry::Unparsed(text) => {
                lines.push(format!("{indent}{} group: ( {text} )", clause_label(clause)));
            }
            GroupEntry::Parsed(inner) => {
                lines.push(format!("{indent}{} group:", clause_label(clause)));
                summarize_into(inner, depth + 1, lines);
            }
            GroupEntry::Exceeded { message, query: inner } => {
                lines.push(format!(
                    "{indent}{} group ({}):",
                    clause_label(clause),
                    message.red()
                ));
                summarize_into(inner, depth + 1, lines);
            }
        }
    }
    if depth == 0 {
        lines.push(format!("tag count: {}", query.tag_count).dimmed().to_string());
    }
}

fn field_text(value: &FieldValue) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
}

/// Render scan output
///
/// Flat results are space-joined; nested groups are shown as JSON arrays.
#[must_use]
pub fn scan_items(items: &[ScanItem]) -> String {
    items
        .iter()
        .map(|item| match item {
            ScanItem::Tag(tag) => tag.clone(),
            ScanItem::Nested(_) => serde_json::to_string(item).unwrap_or_default(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format an alias mapping for display
#[must_use]
pub fn alias_line(alias: &str, canonical: &str, quiet: bool) -> String {
    if quiet {
        format!("{alias} {canonical}")
    } else {
        format!("  {} → {}", alias, canonical.bold())
    }
}

/// Print a success message with a green check mark
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message to stderr
pub fn error(message: &str) {
    eprintln!("{} {}", "❌".red(), message);
}
