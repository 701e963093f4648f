//! 插件系统核心特征定义
//!
//! 每个能力插件都实现 [`Plugin`]：身份元数据、实时启用检查和同步执行。
//! 分发器只依赖该特征，不依赖任何具体插件类型。

use super::result::PluginResult;
use crate::properties::ConfigResolver;
use crate::types::ParamBag;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 插件能力标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluginCapability {
    /// 测试代码模板生成
    CodeGeneration,
    /// 元素选择器优化
    SelectorOptimization,
    /// 合成测试数据
    DataGeneration,
    /// 执行指标分析
    PerformanceAnalysis,
    /// 测试分析快照
    Analytics,
    /// 自定义能力
    Custom(String),
}

/// 插件元数据（注册表中的插件描述符）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// 插件名称，注册表键
    pub name: String,
    /// 插件版本
    pub version: Version,
    /// 插件描述
    pub description: String,
    /// 提供方
    pub provider: String,
    /// 插件能力
    pub capability: PluginCapability,
}

impl PluginMetadata {
    pub fn new(name: &str, version: Version, description: &str, provider: &str, capability: PluginCapability) -> Self {
        Self {
            name: name.to_string(),
            version,
            description: description.to_string(),
            provider: provider.to_string(),
            capability,
        }
    }
}

/// 核心插件特征 - 所有插件必须实现
///
/// `execute` 接收未校验的参数包，必须同步返回；未识别的键应忽略，
/// 缺失必需键应返回错误而不是 panic。分发器仍会捕获插件中的 panic。
pub trait Plugin: Send + Sync {
    /// 插件元数据
    fn metadata(&self) -> &PluginMetadata;

    /// 当前是否启用，每次分发时重新求值
    fn is_enabled(&self) -> bool;

    /// 执行插件
    fn execute(&self, parameters: &ParamBag) -> PluginResult;

    fn name(&self) -> &str {
        &self.metadata().name
    }

    fn version(&self) -> &Version {
        &self.metadata().version
    }

    fn description(&self) -> &str {
        &self.metadata().description
    }

    fn provider(&self) -> &str {
        &self.metadata().provider
    }
}

impl fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name())
            .field("version", &self.version().to_string())
            .finish()
    }
}

/// 基于外部配置的启用开关
///
/// 键形如 `"<area>.<plugin>.enabled"`，未配置时视为启用。
#[derive(Clone)]
pub struct ConfigToggle {
    key: String,
    resolver: Arc<dyn ConfigResolver>,
}

impl ConfigToggle {
    pub fn new(resolver: Arc<dyn ConfigResolver>, key: &str) -> Self {
        Self {
            key: key.to_string(),
            resolver,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 实时查询配置
    pub fn is_enabled(&self) -> bool {
        self.resolver.get_bool(&self.key, true)
    }
}

impl fmt::Debug for ConfigToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigToggle").field("key", &self.key).finish()
    }
}

/// 插件状态报告条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginStatus {
    pub name: String,
    pub enabled: bool,
    pub version: String,
    pub description: String,
    pub provider: String,
}
