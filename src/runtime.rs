//! 插件运行时上下文
//!
//! 进程启动时构造一次，持有注册表、遥测追踪器和属性解析器，
//! 由需要分发或记录的调用方显式持有或注入。

use crate::config::ConfigManager;
use crate::plugins::*;
use crate::properties::LayeredProperties;
use crate::telemetry::{UsageReport, UsageTracker};
use crate::types::{params_from, ParamBag};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// 分发操作在遥测中的名称前缀
pub const DISPATCH_OPERATION_PREFIX: &str = "plugin.";

/// 插件运行时
pub struct PluginRuntime {
    registry: PluginRegistry,
    tracker: Arc<UsageTracker>,
    properties: Arc<LayeredProperties>,
}

impl PluginRuntime {
    /// 空运行时，不含任何插件
    pub fn new(properties: Arc<LayeredProperties>) -> Self {
        Self {
            registry: PluginRegistry::new(),
            tracker: Arc::new(UsageTracker::new()),
            properties,
        }
    }

    /// 注册全部内置插件
    pub fn with_builtins(properties: Arc<LayeredProperties>) -> Self {
        let runtime = Self::new(properties);
        runtime
            .registry
            .register_all(builtin_plugins(runtime.properties.clone()));
        runtime
    }

    /// 按配置构造
    pub fn from_config(manager: &ConfigManager) -> Self {
        let config = manager.get_config();
        let properties = manager.to_properties().shared();

        let runtime = if config.plugins.load_builtins {
            Self::with_builtins(properties)
        } else {
            Self::new(properties)
        };
        runtime.tracker.set_enabled(config.telemetry.enabled);

        info!(
            "Plugin runtime ready: {} plugins, telemetry {}",
            runtime.registry.len(),
            if config.telemetry.enabled { "on" } else { "off" }
        );
        runtime
    }

    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Option<Arc<dyn Plugin>> {
        self.registry.register(plugin)
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.registry.unregister(name)
    }

    /// 记录遥测后分发
    pub fn dispatch(&self, name: &str, parameters: &ParamBag) -> PluginResult {
        self.tracker
            .record(&format!("{}{}", DISPATCH_OPERATION_PREFIX, name), parameters);
        self.registry.dispatch(name, parameters)
    }

    /// 记录一次非插件操作后执行闭包
    pub fn traced<T>(&self, operation: &str, parameters: &ParamBag, f: impl FnOnce() -> T) -> T {
        self.tracker.traced(operation, parameters, f)
    }

    /// 生成测试代码模板
    ///
    /// 失败时返回空字符串。
    pub fn generate_code(&self, description: &str, page_url: &str) -> String {
        let params = params_from(&CodegenRequest::new(description, page_url));
        self.dispatch_payload(CODEGEN_PLUGIN, &params).unwrap_or_default()
    }

    /// 优化选择器
    ///
    /// 失败时原样返回输入的选择器。
    pub fn optimize_selector(&self, selector: &str, page_content: Option<&str>) -> String {
        let mut request = SelectorRequest::new(selector);
        if let Some(content) = page_content {
            request = request.with_page_content(content);
        }
        self.dispatch_payload(SELECTOR_PLUGIN, &params_from(&request))
            .unwrap_or_else(|| selector.to_string())
    }

    /// 生成测试数据
    ///
    /// 失败时返回空结果（无记录，计数为 0）。
    pub fn generate_test_data(&self, request: &DataRequest) -> GeneratedData {
        self.dispatch_payload(DATA_GENERATION_PLUGIN, &params_from(request))
            .unwrap_or_default()
    }

    /// 分析测试执行指标
    ///
    /// 失败时返回 `PerformanceAnalysis::default()`：无建议、分数 0、优先级 LOW。
    pub fn analyze_test_performance(&self, metrics: Map<String, Value>) -> PerformanceAnalysis {
        self.dispatch_payload(PERFORMANCE_PLUGIN, &params_from(&AnalysisRequest::new(metrics)))
            .unwrap_or_default()
    }

    /// 测试分析快照
    ///
    /// 失败时返回空映射。
    pub fn analytics_snapshot(&self) -> Map<String, Value> {
        self.dispatch_payload(ANALYTICS_PLUGIN, &ParamBag::new())
            .unwrap_or_default()
    }

    fn dispatch_payload<T: DeserializeOwned>(&self, name: &str, parameters: &ParamBag) -> Option<T> {
        match self.dispatch(name, parameters) {
            Ok(output) => match serde_json::from_value(output.data) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    debug!("Unexpected payload from plugin {}: {}", name, e);
                    None
                }
            },
            Err(e) => {
                debug!("Falling back to default for {}: {}", name, e);
                None
            }
        }
    }

    pub fn plugin_status(&self) -> Vec<PluginStatus> {
        self.registry.plugin_status()
    }

    /// 当前的使用统计报告
    pub fn usage_report(&self) -> UsageReport {
        UsageReport::new(self.tracker.get_all_snapshots(), self.registry.plugin_status())
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &Arc<UsageTracker> {
        &self.tracker
    }

    pub fn properties(&self) -> &Arc<LayeredProperties> {
        &self.properties
    }
}
