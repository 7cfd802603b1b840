//! Rendering of a usage collection for the command line

use crate::models::UsageResponse;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Output format of the `fbusage` binary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON document
    #[default]
    Json,
    /// One aligned line per group or user
    Table,
}

/// A usage collection stamped with the time it was taken
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UsageReport {
    pub collected_at: DateTime<Utc>,
    /// File system of each entry in `usage.groups` and `usage.users`
    pub file_systems: Vec<String>,
    /// False when collection stopped early and `usage` is partial
    pub complete: bool,
    pub usage: UsageResponse,
}

/// One row of the table output
struct Row {
    file_system: String,
    kind: &'static str,
    name: String,
    usage: String,
    quota: String,
    default_quota: String,
}

impl UsageReport {
    pub fn new(usage: UsageResponse, complete: bool) -> Self {
        Self::at(Utc::now(), usage, complete)
    }

    pub fn at(collected_at: DateTime<Utc>, usage: UsageResponse, complete: bool) -> Self {
        Self {
            collected_at,
            file_systems: usage.file_systems.clone(),
            complete,
            usage,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Json => self.to_json(),
            OutputFormat::Table => Ok(self.to_table()),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Format quota-like values; 0 means unset
    fn quota_cell(value: i64) -> String {
        if value == 0 {
            "-".to_string()
        } else {
            value.to_string()
        }
    }

    fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();

        for (index, (group_page, user_page)) in self.usage.per_filesystem().enumerate() {
            // Items name their file system; fall back to the collected name
            let collected = self.file_systems.get(index).cloned().unwrap_or_default();
            let file_system_of = |names: &BTreeMap<String, String>| {
                names.get("name").cloned().unwrap_or_else(|| collected.clone())
            };

            for item in &group_page.items {
                rows.push(Row {
                    file_system: file_system_of(&item.file_system),
                    kind: "group",
                    name: item.group.name.clone(),
                    usage: item.usage.to_string(),
                    quota: Self::quota_cell(item.quota),
                    default_quota: Self::quota_cell(item.file_system_default_quota),
                });
            }
            for item in &user_page.items {
                rows.push(Row {
                    file_system: file_system_of(&item.file_system),
                    kind: "user",
                    name: item.user.name.clone(),
                    usage: item.usage.to_string(),
                    quota: Self::quota_cell(item.quota),
                    default_quota: Self::quota_cell(item.file_system_default_quota),
                });
            }
        }

        rows
    }

    /// Plain-text table with a header line
    pub fn to_table(&self) -> String {
        let header = Row {
            file_system: "FILE SYSTEM".to_string(),
            kind: "KIND",
            name: "NAME".to_string(),
            usage: "USAGE".to_string(),
            quota: "QUOTA".to_string(),
            default_quota: "DEFAULT QUOTA".to_string(),
        };
        let rows = self.rows();

        let width = |cell: fn(&Row) -> usize| {
            rows.iter().map(cell).chain(std::iter::once(cell(&header))).max().unwrap_or(0)
        };
        let fs_width = width(|row| row.file_system.len());
        let kind_width = width(|row| row.kind.len());
        let name_width = width(|row| row.name.len());
        let usage_width = width(|row| row.usage.len());
        let quota_width = width(|row| row.quota.len());

        let mut out = String::new();
        for row in std::iter::once(&header).chain(rows.iter()) {
            // Writing to a String cannot fail
            let _ = writeln!(
                out,
                "{:<fs_width$}  {:<kind_width$}  {:<name_width$}  {:>usage_width$}  {:>quota_width$}  {}",
                row.file_system,
                row.kind,
                row.name,
                row.usage,
                row.quota,
                row.default_quota,
            );
        }

        if !self.complete {
            out.push_str("(incomplete: collection stopped after an error)\n");
        }
        out
    }
}
