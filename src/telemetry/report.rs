//! 使用统计报告

use super::tracker::UsageSnapshot;
use crate::error::Result;
use crate::plugins::PluginStatus;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

const WIDE_RULE: usize = 80;
const NARROW_RULE: usize = 50;

/// 人类可读的诊断报告，同时可序列化为 JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub framework: String,
    pub generated_at: DateTime<Utc>,
    pub operations: Vec<UsageSnapshot>,
    pub plugins: Vec<PluginStatus>,
}

impl UsageReport {
    /// 操作按调用次数降序、操作名升序排列
    pub fn new(mut operations: Vec<UsageSnapshot>, plugins: Vec<PluginStatus>) -> Self {
        operations.sort_by(|a, b| {
            b.total_calls
                .cmp(&a.total_calls)
                .then_with(|| a.operation.cmp(&b.operation))
        });
        Self {
            framework: crate::FRAMEWORK_NAME.to_string(),
            generated_at: Utc::now(),
            operations,
            plugins,
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        let wide = "=".repeat(WIDE_RULE);
        let narrow = "-".repeat(NARROW_RULE);

        writeln!(out, "{}", wide)?;
        writeln!(out, "{} - OPERATION USAGE REPORT", self.framework.to_uppercase())?;
        writeln!(out, "{}", wide)?;

        if self.operations.is_empty() {
            writeln!(
                out,
                "No operations have been recorded yet. Start using the framework to see usage statistics."
            )?;
        } else {
            writeln!(out, "\nOPERATION USAGE STATISTICS:")?;
            writeln!(out, "{}", narrow)?;

            for snapshot in &self.operations {
                writeln!(out, "\n📍 {}", snapshot.operation)?;
                writeln!(out, "   📊 Total Calls: {}", snapshot.total_calls)?;
                writeln!(out, "   🕐 First Used: {}", iso8601(&snapshot.first_used_at))?;
                writeln!(out, "   🕐 Last Used: {}", iso8601(&snapshot.last_used_at))?;
                writeln!(out, "   📈 Avg Parameters: {:.1}", snapshot.average_parameter_count())?;

                if !snapshot.parameter_frequency.is_empty() {
                    writeln!(out, "   🔧 Common Parameters:")?;
                    for (key, count) in &snapshot.parameter_frequency {
                        writeln!(out, "      - {}: {} times", key, count)?;
                    }
                }
            }
        }

        writeln!(out, "\n{}", wide)?;
        writeln!(out, "AVAILABLE PLUGINS:")?;
        writeln!(out, "{}", narrow)?;
        if self.plugins.is_empty() {
            writeln!(out, "No plugins registered.")?;
        }
        for plugin in &self.plugins {
            let state = if plugin.enabled { "enabled" } else { "disabled" };
            writeln!(out, "\n   🔌 {} v{} [{}]", plugin.name, plugin.version, state)?;
            writeln!(out, "      {} ({})", plugin.description, plugin.provider)?;
        }
        write!(out, "{}", wide)?;

        f.write_str(&out)
    }
}

fn iso8601(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
