//! 元素选择器优化插件
//!
//! 按顺序应用启发式改写规则，无规则匹配时原样返回输入。

use crate::plugins::contract::*;
use crate::plugins::result::{PluginOutput, PluginResult};
use crate::properties::ConfigResolver;
use crate::types::{params_into, ParamBag};
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub const SELECTOR_PLUGIN: &str = "element-locator";
pub const SELECTOR_ENABLED_KEY: &str = "ai.element.locator.enabled";

static NTH_CHILD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"nth-child\(\s*\d+\s*\)").expect("valid nth-child pattern")
});

static STABLE_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@(?:data-testid|id|name)\s*=\s*['"]([^'"]+)['"]"#).expect("valid attribute pattern")
});

static STEP_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][\w-]*)").expect("valid tag pattern")
});

/// 选择器优化请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorRequest {
    /// 当前选择器
    pub current_selector: String,
    /// 页面内容（辅助上下文）
    #[serde(default)]
    pub page_content: Option<String>,
}

impl SelectorRequest {
    pub fn new(current_selector: &str) -> Self {
        Self {
            current_selector: current_selector.to_string(),
            page_content: None,
        }
    }

    pub fn with_page_content(mut self, page_content: &str) -> Self {
        self.page_content = Some(page_content.to_string());
        self
    }
}

pub struct SelectorOptimizerPlugin {
    metadata: PluginMetadata,
    toggle: ConfigToggle,
}

impl SelectorOptimizerPlugin {
    pub fn new(resolver: Arc<dyn ConfigResolver>) -> Self {
        Self {
            metadata: PluginMetadata::new(
                SELECTOR_PLUGIN,
                Version::new(1, 0, 0),
                "Element locator optimization",
                "Internal",
                PluginCapability::SelectorOptimization,
            ),
            toggle: ConfigToggle::new(resolver, SELECTOR_ENABLED_KEY),
        }
    }
}

impl Plugin for SelectorOptimizerPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn is_enabled(&self) -> bool {
        self.toggle.is_enabled()
    }

    fn execute(&self, parameters: &ParamBag) -> PluginResult {
        let request: SelectorRequest = params_into(parameters)?;
        let optimized = optimize_selector(&request.current_selector);
        if optimized != request.current_selector {
            debug!("Selector '{}' rewritten to '{}'", request.current_selector, optimized);
        }
        Ok(PluginOutput::success(Value::String(optimized)))
    }
}

/// 应用改写规则
pub fn optimize_selector(selector: &str) -> String {
    if is_hierarchical_path(selector) {
        return format!("[data-testid='{}']", derive_test_id(selector));
    }

    if NTH_CHILD.is_match(selector) {
        return NTH_CHILD.replace_all(selector, "first-of-type").into_owned();
    }

    selector.to_string()
}

fn is_hierarchical_path(selector: &str) -> bool {
    let trimmed = selector.trim();
    trimmed.starts_with("//") || trimmed.starts_with("xpath=")
}

/// 从路径最后一步推导测试 ID：优先使用稳定属性值，否则使用标签名
fn derive_test_id(selector: &str) -> String {
    let last_step = selector
        .trim()
        .trim_start_matches("xpath=")
        .rsplit('/')
        .find(|step| !step.is_empty())
        .unwrap_or("");

    if let Some(captures) = STABLE_ATTRIBUTE.captures_iter(last_step).last() {
        return captures[1].to_string();
    }

    match STEP_TAG.captures(last_step) {
        Some(captures) => format!("optimized-{}", &captures[1]),
        _ => "optimized-element".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchical_path_becomes_attribute_selector() {
        let optimized = optimize_selector("//div[1]/span[2]");
        assert_eq!(optimized, "[data-testid='optimized-span']");
        assert_ne!(optimized, "//div[1]/span[2]");
    }

    #[test]
    fn test_hierarchical_path_keeps_stable_attribute() {
        assert_eq!(
            optimize_selector("xpath=//form/input[@id='email']"),
            "[data-testid='email']"
        );
    }

    #[test]
    fn test_ancestor_attribute_is_not_reused() {
        assert_eq!(
            optimize_selector("//div[@id='main']/span"),
            "[data-testid='optimized-span']"
        );
        assert_eq!(
            optimize_selector("//div[@id='main']/input[@name='q']"),
            "[data-testid='q']"
        );
    }

    #[test]
    fn test_css_mentioning_xpath_is_not_a_path() {
        let selector = "a[data-xpath='x'][href^='//cdn.example.com']";
        assert_eq!(optimize_selector(selector), selector);
    }

    #[test]
    fn test_nth_child_becomes_type_based() {
        assert_eq!(optimize_selector("ul > li:nth-child(3)"), "ul > li:first-of-type");
    }

    #[test]
    fn test_stable_selector_unchanged() {
        assert_eq!(optimize_selector("#stable-id"), "#stable-id");
        assert_eq!(optimize_selector("[data-testid='submit']"), "[data-testid='submit']");
    }

    #[test]
    fn test_wildcard_step_falls_back() {
        assert_eq!(optimize_selector("//*"), "[data-testid='optimized-element']");
    }
}
