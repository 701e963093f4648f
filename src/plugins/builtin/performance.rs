//! 测试执行指标分析插件

use crate::plugins::contract::*;
use crate::plugins::result::{PluginError, PluginOutput, PluginResult};
use crate::properties::ConfigResolver;
use crate::types::{params_into, ParamBag};
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

pub const PERFORMANCE_PLUGIN: &str = "test-optimization";
pub const PERFORMANCE_ENABLED_KEY: &str = "ai.test.optimization.enabled";

/// 执行时间阈值（毫秒）
pub const EXECUTION_TIME_THRESHOLD_MS: f64 = 30_000.0;
/// 失败率阈值
pub const FAILURE_RATE_THRESHOLD: f64 = 0.1;

/// 指标分析请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// 指标映射，例如 `executionTime`、`failureRate`
    pub metrics: Map<String, Value>,
}

impl AnalysisRequest {
    pub fn new(metrics: Map<String, Value>) -> Self {
        Self { metrics }
    }
}

/// 优化优先级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    #[default]
    Low,
}

impl Priority {
    /// 由建议数量决定：>3 为 HIGH，>1 为 MEDIUM，否则 LOW
    pub fn from_recommendation_count(count: usize) -> Self {
        if count > 3 {
            Priority::High
        } else if count > 1 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

/// 分析结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    pub recommendations: Vec<String>,
    /// 取值范围 [0, 100]
    pub score: u32,
    pub priority: Priority,
}

pub struct PerformanceAnalyzerPlugin {
    metadata: PluginMetadata,
    toggle: ConfigToggle,
}

impl PerformanceAnalyzerPlugin {
    pub fn new(resolver: Arc<dyn ConfigResolver>) -> Self {
        Self {
            metadata: PluginMetadata::new(
                PERFORMANCE_PLUGIN,
                Version::new(1, 0, 0),
                "Test optimization analysis",
                "Internal",
                PluginCapability::PerformanceAnalysis,
            ),
            toggle: ConfigToggle::new(resolver, PERFORMANCE_ENABLED_KEY),
        }
    }
}

impl Plugin for PerformanceAnalyzerPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn is_enabled(&self) -> bool {
        self.toggle.is_enabled()
    }

    fn execute(&self, parameters: &ParamBag) -> PluginResult {
        let request: AnalysisRequest = params_into(parameters)?;
        let analysis = analyze_metrics(&request.metrics)?;
        let data = serde_json::to_value(&analysis)
            .map_err(|e| PluginError::rejected(format!("Performance analysis failed: {}", e)))?;
        Ok(PluginOutput::success(data))
    }
}

/// 按固定阈值评估指标
pub fn analyze_metrics(metrics: &Map<String, Value>) -> Result<PerformanceAnalysis, PluginError> {
    let mut recommendations = Vec::new();

    if let Some(execution_time) = numeric_metric(metrics, "executionTime")? {
        if execution_time > EXECUTION_TIME_THRESHOLD_MS {
            recommendations.push("Consider optimizing wait strategies".to_string());
            recommendations.push("Review page load performance".to_string());
        }
    }

    if let Some(failure_rate) = numeric_metric(metrics, "failureRate")? {
        if failure_rate > FAILURE_RATE_THRESHOLD {
            recommendations.push("Review test stability".to_string());
            recommendations.push("Consider implementing retry mechanisms".to_string());
        }
    }

    let priority = Priority::from_recommendation_count(recommendations.len());
    Ok(PerformanceAnalysis {
        recommendations,
        score: optimization_score(metrics.len()),
        priority,
    })
}

/// 每个指标扣 10 分，下限 0
fn optimization_score(metric_count: usize) -> u32 {
    100u32.saturating_sub((metric_count as u32).saturating_mul(10))
}

fn numeric_metric(metrics: &Map<String, Value>, key: &str) -> Result<Option<f64>, PluginError> {
    match metrics.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| {
            PluginError::rejected(format!(
                "Performance analysis failed: metric '{}' must be numeric",
                key
            ))
        }),
    }
}
