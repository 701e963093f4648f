//! 分层属性解析
//!
//! 插件的启用状态来自外部配置，每次分发时实时查询。
//! 优先级：运行时覆盖 > 环境变量 > 配置文件属性 > 默认值。

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// 只读配置解析接口
#[cfg_attr(test, mockall::automock)]
pub trait ConfigResolver: Send + Sync {
    /// 查询原始字符串值
    fn get(&self, key: &str) -> Option<String>;

    /// 查询布尔值：`"true"`（忽略大小写）为真，其余已设置的值为假，未设置时返回默认值
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(value) => value.trim().eq_ignore_ascii_case("true"),
            None => default,
        }
    }
}

/// 分层属性存储
#[derive(Debug)]
pub struct LayeredProperties {
    overrides: RwLock<HashMap<String, String>>,
    file: HashMap<String, String>,
    use_environment: bool,
}

impl LayeredProperties {
    /// 创建空属性存储（读取环境变量）
    pub fn new() -> Self {
        Self {
            overrides: RwLock::new(HashMap::new()),
            file: HashMap::new(),
            use_environment: true,
        }
    }

    /// 使用配置文件中的属性
    pub fn with_file_properties(mut self, properties: HashMap<String, String>) -> Self {
        self.file = properties;
        self
    }

    /// 不读取环境变量
    pub fn without_environment(mut self) -> Self {
        self.use_environment = false;
        self
    }

    /// 包装为共享解析器
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 设置运行时覆盖值
    pub fn set_property(&self, key: &str, value: &str) {
        self.overrides.write().insert(key.to_string(), value.to_string());
    }

    /// 清除运行时覆盖值
    pub fn clear_property(&self, key: &str) -> Option<String> {
        self.overrides.write().remove(key)
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// 所有已知键（覆盖层与文件层）
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.file.keys().cloned().collect();
        keys.extend(self.overrides.read().keys().cloned());
        keys.sort();
        keys.dedup();
        keys
    }

    fn from_environment(key: &str) -> Option<String> {
        if key.is_empty() || key.contains(|c: char| c == '=' || c == '\0') {
            return None;
        }
        std::env::var(key)
            .ok()
            .or_else(|| std::env::var(environment_name(key)).ok())
    }
}

impl Default for LayeredProperties {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver for LayeredProperties {
    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.overrides.read().get(key) {
            return Some(value.clone());
        }

        if self.use_environment {
            if let Some(value) = Self::from_environment(key) {
                return Some(value);
            }
        }

        self.file.get(key).cloned()
    }
}

/// `ai.test.analytics.enabled` → `AI_TEST_ANALYTICS_ENABLED`
pub fn environment_name(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_properties() -> HashMap<String, String> {
        let mut props = HashMap::new();
        props.insert("ai.data.generation.enabled".to_string(), "false".to_string());
        props.insert("report.retention.days".to_string(), "14".to_string());
        props
    }

    #[test]
    fn test_override_wins_over_file() {
        let props = LayeredProperties::new()
            .without_environment()
            .with_file_properties(file_properties());

        assert!(!props.get_bool("ai.data.generation.enabled", true));

        props.set_property("ai.data.generation.enabled", "TRUE");
        assert!(props.get_bool("ai.data.generation.enabled", false));

        props.clear_property("ai.data.generation.enabled");
        assert!(!props.get_bool("ai.data.generation.enabled", true));
    }

    #[test]
    fn test_absent_key_uses_default() {
        let props = LayeredProperties::new().without_environment();
        assert!(props.get_bool("ai.unknown.enabled", true));
        assert!(!props.get_bool("ai.unknown.enabled", false));
    }

    #[test]
    fn test_non_true_value_is_false() {
        let props = LayeredProperties::new().without_environment();
        props.set_property("ai.flag.enabled", "yes");
        assert!(!props.get_bool("ai.flag.enabled", true));
    }

    #[test]
    fn test_numeric_helpers() {
        let props = LayeredProperties::new()
            .without_environment()
            .with_file_properties(file_properties());
        assert_eq!(props.get_int("report.retention.days", 7), 14);
        assert_eq!(props.get_int("missing", 7), 7);
        assert_eq!(props.get_f64("report.retention.days", 0.0), 14.0);
    }

    #[test]
    fn test_environment_layer() {
        let key = "hybrid.auto.props.test.enabled";
        std::env::set_var(environment_name(key), "false");

        let props = LayeredProperties::new().with_file_properties({
            let mut p = HashMap::new();
            p.insert(key.to_string(), "true".to_string());
            p
        });
        assert!(!props.get_bool(key, true));

        std::env::remove_var(environment_name(key));
        assert!(props.get_bool(key, false));
    }

    #[test]
    fn test_environment_name() {
        assert_eq!(environment_name("ai.test.analytics.enabled"), "AI_TEST_ANALYTICS_ENABLED");
    }
}
