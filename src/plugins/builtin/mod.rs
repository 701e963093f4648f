//! 内置插件
//!
//! 五个示例能力插件，均可被同名注册的自定义插件替换。

pub mod analytics;
pub mod codegen;
pub mod data_generation;
pub mod performance;
pub mod selector;

pub use analytics::*;
pub use codegen::*;
pub use data_generation::*;
pub use performance::*;
pub use selector::*;

use super::contract::Plugin;
use crate::properties::ConfigResolver;
use std::sync::Arc;

/// 使用同一配置解析器构造所有内置插件
pub fn builtin_plugins(resolver: Arc<dyn ConfigResolver>) -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(CodegenPlugin::new(resolver.clone())),
        Arc::new(PerformanceAnalyzerPlugin::new(resolver.clone())),
        Arc::new(SelectorOptimizerPlugin::new(resolver.clone())),
        Arc::new(DataGenerationPlugin::new(resolver.clone())),
        Arc::new(AnalyticsPlugin::new(resolver)),
    ]
}

/// 插件启用开关的配置键；非内置插件使用 `plugins.<name>.enabled`
pub fn enable_key_for(name: &str) -> String {
    match name {
        CODEGEN_PLUGIN => CODEGEN_ENABLED_KEY.to_string(),
        SELECTOR_PLUGIN => SELECTOR_ENABLED_KEY.to_string(),
        DATA_GENERATION_PLUGIN => DATA_GENERATION_ENABLED_KEY.to_string(),
        PERFORMANCE_PLUGIN => PERFORMANCE_ENABLED_KEY.to_string(),
        ANALYTICS_PLUGIN => ANALYTICS_ENABLED_KEY.to_string(),
        other => format!("plugins.{}.enabled", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::LayeredProperties;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_names_are_unique() {
        let plugins = builtin_plugins(LayeredProperties::new().without_environment().shared());
        let names: HashSet<&str> = plugins.iter().map(|p| p.name()).collect();
        assert_eq!(plugins.len(), 5);
        assert_eq!(names.len(), 5);
        assert!(names.contains(CODEGEN_PLUGIN));
        assert!(names.contains(SELECTOR_PLUGIN));
        assert!(names.contains(DATA_GENERATION_PLUGIN));
        assert!(names.contains(PERFORMANCE_PLUGIN));
        assert!(names.contains(ANALYTICS_PLUGIN));
    }

    #[test]
    fn test_enable_keys() {
        assert_eq!(enable_key_for(SELECTOR_PLUGIN), "ai.element.locator.enabled");
        assert_eq!(enable_key_for("test-analytics"), "ai.test.analytics.enabled");
        assert_eq!(enable_key_for("echo"), "plugins.echo.enabled");
    }
}
