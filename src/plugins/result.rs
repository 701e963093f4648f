//! 插件执行结果
//!
//! 每次分发恰好产生两种形态之一：成功（消息 + 负载）或失败（仅消息）。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// 成功结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginOutput {
    /// 结果消息
    pub message: String,
    /// 插件相关的负载，结构由具体插件决定
    pub data: Value,
}

impl PluginOutput {
    /// 以默认消息 "Success" 创建成功结果
    pub fn success(data: Value) -> Self {
        Self {
            message: "Success".to_string(),
            data,
        }
    }

    /// 以自定义消息创建成功结果
    pub fn with_message(message: impl Into<String>, data: Value) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// 分发错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluginErrorKind {
    NotFound,
    Disabled,
    ExecutionFault,
    Rejected,
}

/// 分发失败结果，只携带消息
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginError {
    /// 未注册该名称的插件
    #[error("Plugin not found: {name}")]
    NotFound { name: String },

    /// 插件在当前配置下被禁用
    #[error("Plugin is disabled: {name}")]
    Disabled { name: String },

    /// 插件代码发生了未捕获的故障（panic）
    #[error("Plugin execution failed: {message}")]
    ExecutionFault { name: String, message: String },

    /// 插件自身报告的失败，例如缺失必需参数
    #[error("{message}")]
    Rejected { message: String },
}

impl PluginError {
    pub fn not_found(name: &str) -> Self {
        Self::NotFound { name: name.to_string() }
    }

    pub fn disabled(name: &str) -> Self {
        Self::Disabled { name: name.to_string() }
    }

    pub fn execution_fault(name: &str, message: impl Into<String>) -> Self {
        Self::ExecutionFault {
            name: name.to_string(),
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected { message: message.into() }
    }

    /// 错误分类
    pub fn kind(&self) -> PluginErrorKind {
        match self {
            Self::NotFound { .. } => PluginErrorKind::NotFound,
            Self::Disabled { .. } => PluginErrorKind::Disabled,
            Self::ExecutionFault { .. } => PluginErrorKind::ExecutionFault,
            Self::Rejected { .. } => PluginErrorKind::Rejected,
        }
    }

    /// 面向报告的消息文本
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// 分发结果
pub type PluginResult = std::result::Result<PluginOutput, PluginError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_default_message() {
        let output = PluginOutput::success(json!({"count": 3}));
        assert_eq!(output.message, "Success");
        assert_eq!(output.data["count"], 3);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(PluginError::not_found("ghost").message(), "Plugin not found: ghost");
        assert_eq!(PluginError::disabled("echo").message(), "Plugin is disabled: echo");
        assert_eq!(
            PluginError::execution_fault("echo", "index out of bounds").message(),
            "Plugin execution failed: index out of bounds"
        );
        assert_eq!(PluginError::rejected("Missing count").message(), "Missing count");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(PluginError::not_found("x").kind(), PluginErrorKind::NotFound);
        assert_eq!(PluginError::disabled("x").kind(), PluginErrorKind::Disabled);
        assert_eq!(PluginError::execution_fault("x", "boom").kind(), PluginErrorKind::ExecutionFault);
        assert_eq!(PluginError::rejected("no").kind(), PluginErrorKind::Rejected);
    }
}
