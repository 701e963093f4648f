//! HybridAuto 配置管理系统
//!
//! 支持 YAML / TOML 配置文件，按扩展名选择格式

use crate::plugins::enable_key_for;
use crate::properties::LayeredProperties;
use crate::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// 框架配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// 框架基础设置
    pub framework: FrameworkSettings,
    /// 插件配置
    pub plugins: PluginsConfig,
    /// 使用遥测配置
    pub telemetry: TelemetryConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 额外属性，作为属性解析的文件层
    pub properties: BTreeMap<String, String>,
}

/// 框架基础设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkSettings {
    /// 框架名称
    pub name: String,
    /// 版本
    pub version: String,
}

/// 插件配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// 启动时注册内置插件
    pub load_builtins: bool,
    /// 插件名 → 是否启用，会被翻译为插件的启用开关键
    pub enabled: BTreeMap<String, bool>,
}

/// 使用遥测配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
}

/// 日志配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
    /// 是否启用详细日志（等价于 debug 级别）
    pub verbose: bool,
}

/// 日志级别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// `EnvFilter` 指令
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl LoggingConfig {
    /// 实际生效的级别
    pub fn effective_level(&self) -> LogLevel {
        if self.verbose && matches!(self.level, LogLevel::Error | LogLevel::Warn | LogLevel::Info) {
            LogLevel::Debug
        } else {
            self.level
        }
    }
}

impl Default for FrameworkSettings {
    fn default() -> Self {
        Self {
            name: crate::FRAMEWORK_NAME.to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            load_builtins: true,
            enabled: BTreeMap::new(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: HarnessConfig,
}

impl ConfigManager {
    /// 从文件加载配置
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HarnessError::config(&format!("Failed to read config file {}: {}", path.display(), e)))?;

        let manager = match ConfigFormat::from_path(path) {
            ConfigFormat::Toml => Self::from_toml_str(&content)?,
            ConfigFormat::Yaml => Self::from_yaml_str(&content)?,
        };
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(manager)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: HarnessConfig = serde_yaml::from_str(content)?;
        Ok(Self { config })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: HarnessConfig = toml::from_str(content)?;
        Ok(Self { config })
    }

    /// 创建默认配置
    pub fn new_default() -> Self {
        Self {
            config: HarnessConfig::default(),
        }
    }

    /// 保存配置到文件
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::from_path(path) {
            ConfigFormat::Toml => toml::to_string_pretty(&self.config)
                .map_err(|e| HarnessError::config(&format!("Failed to serialize config: {}", e)))?,
            ConfigFormat::Yaml => serde_yaml::to_string(&self.config)?,
        };

        tokio::fs::write(path, content)
            .await
            .map_err(|e| HarnessError::config(&format!("Failed to write config file {}: {}", path.display(), e)))?;

        Ok(())
    }

    /// 获取配置
    pub fn get_config(&self) -> &HarnessConfig {
        &self.config
    }

    /// 获取可变配置
    pub fn get_config_mut(&mut self) -> &mut HarnessConfig {
        &mut self.config
    }

    pub fn into_config(self) -> HarnessConfig {
        self.config
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if self.config.framework.name.trim().is_empty() {
            return Err(HarnessError::validation("Framework name cannot be empty"));
        }

        if self.config.plugins.enabled.keys().any(|name| name.trim().is_empty()) {
            return Err(HarnessError::validation("Plugin names in plugins.enabled cannot be empty"));
        }

        if self.config.properties.keys().any(|key| key.trim().is_empty()) {
            return Err(HarnessError::validation("Property keys cannot be empty"));
        }

        tracing::info!("Configuration validation passed");
        Ok(())
    }

    /// 构造属性解析器：`properties` 作为文件层，`plugins.enabled` 翻译为启用开关键
    pub fn to_properties(&self) -> LayeredProperties {
        let mut file: HashMap<String, String> = self
            .config
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (name, enabled) in &self.config.plugins.enabled {
            file.insert(enable_key_for(name), enabled.to_string());
        }

        LayeredProperties::new().with_file_properties(file)
    }
}

/// 生成默认配置文件
pub async fn generate_default_config_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let config_manager = ConfigManager::new_default();
    config_manager.save_to_file(path).await?;
    Ok(())
}
