//! 测试分析快照插件
//!
//! 返回固定的信息快照，不读取任何外部状态。

use crate::plugins::contract::*;
use crate::plugins::result::{PluginOutput, PluginResult};
use crate::properties::ConfigResolver;
use crate::types::ParamBag;
use semver::Version;
use serde_json::{json, Value};
use std::sync::Arc;

pub const ANALYTICS_PLUGIN: &str = "test-analytics";
pub const ANALYTICS_ENABLED_KEY: &str = "ai.test.analytics.enabled";

pub struct AnalyticsPlugin {
    metadata: PluginMetadata,
    toggle: ConfigToggle,
}

impl AnalyticsPlugin {
    pub fn new(resolver: Arc<dyn ConfigResolver>) -> Self {
        Self {
            metadata: PluginMetadata::new(
                ANALYTICS_PLUGIN,
                Version::new(1, 0, 0),
                "Test analytics and insights",
                "Internal",
                PluginCapability::Analytics,
            ),
            toggle: ConfigToggle::new(resolver, ANALYTICS_ENABLED_KEY),
        }
    }
}

impl Plugin for AnalyticsPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn is_enabled(&self) -> bool {
        self.toggle.is_enabled()
    }

    fn execute(&self, _parameters: &ParamBag) -> PluginResult {
        Ok(PluginOutput::success(analytics_snapshot()))
    }
}

pub fn analytics_snapshot() -> Value {
    json!({
        "testCoverage": "85%",
        "averageExecutionTime": "2.5 seconds",
        "stabilityScore": "92%",
        "recommendedActions": [
            "Increase API test coverage",
            "Optimize mobile test execution",
            "Add more edge case scenarios",
        ],
    })
}
