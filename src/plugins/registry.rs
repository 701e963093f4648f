//! 插件注册表和分发器
//!
//! 名称 → 插件 的映射，读多写少。分发顺序固定：
//! 未注册 → `NotFound`，未启用 → `Disabled`，否则在故障隔离边界内执行。

use super::contract::*;
use super::result::{PluginError, PluginResult};
use crate::types::ParamBag;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 插件注册表
#[derive(Default)]
pub struct PluginRegistry {
    plugins: RwLock<HashMap<String, Arc<dyn Plugin>>>,
}

impl PluginRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(HashMap::new()),
        }
    }

    /// 注册插件，同名插件被覆盖（后写者胜），返回被替换的插件
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Option<Arc<dyn Plugin>> {
        let name = plugin.name().to_string();
        let previous = self.plugins.write().insert(name.clone(), plugin);

        match &previous {
            Some(old) => warn!("Plugin '{}' re-registered, replacing version {}", name, old.version()),
            None => info!("Registered plugin: {}", name),
        }
        previous
    }

    /// 批量注册
    pub fn register_all<I>(&self, plugins: I)
    where
        I: IntoIterator<Item = Arc<dyn Plugin>>,
    {
        for plugin in plugins {
            self.register(plugin);
        }
    }

    /// 注销插件
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        let removed = self.plugins.write().remove(name);
        if removed.is_some() {
            info!("Unregistered plugin: {}", name);
        }
        removed
    }

    /// 查找插件
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.read().get(name).cloned()
    }

    /// 查找插件描述符
    pub fn descriptor(&self, name: &str) -> Option<PluginMetadata> {
        self.plugins.read().get(name).map(|p| p.metadata().clone())
    }

    /// 所有插件的独立副本，对返回值的修改不影响注册表
    pub fn list_all(&self) -> BTreeMap<String, Arc<dyn Plugin>> {
        self.plugins
            .read()
            .iter()
            .map(|(name, plugin)| (name.clone(), plugin.clone()))
            .collect()
    }

    /// 已注册名称（有序）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }

    /// 按能力查找插件描述符
    pub fn find_by_capability(&self, capability: &PluginCapability) -> Vec<PluginMetadata> {
        let mut found: Vec<PluginMetadata> = self
            .plugins
            .read()
            .values()
            .filter(|p| &p.metadata().capability == capability)
            .map(|p| p.metadata().clone())
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// 插件状态报告，启用状态实时求值
    pub fn plugin_status(&self) -> Vec<PluginStatus> {
        self.list_all()
            .into_values()
            .map(|plugin| {
                let enabled = guarded(|| plugin.is_enabled()).unwrap_or(false);
                PluginStatus {
                    name: plugin.name().to_string(),
                    enabled,
                    version: plugin.version().to_string(),
                    description: plugin.description().to_string(),
                    provider: plugin.provider().to_string(),
                }
            })
            .collect()
    }

    /// 按名称分发
    ///
    /// 插件中的任何 panic 都会被转换为 `ExecutionFault`，不会传播给调用方。
    pub fn dispatch(&self, name: &str, parameters: &ParamBag) -> PluginResult {
        // 先克隆出 Arc，执行期间不持有注册表锁
        let plugin = match self.lookup(name) {
            Some(plugin) => plugin,
            None => {
                debug!("Dispatch to unknown plugin '{}'", name);
                return Err(PluginError::not_found(name));
            }
        };

        match guarded(|| plugin.is_enabled()) {
            Ok(true) => {}
            Ok(false) => return Err(PluginError::disabled(name)),
            Err(fault) => {
                error!("Enabled check for plugin {} panicked: {}", name, fault);
                return Err(PluginError::execution_fault(name, fault));
            }
        }

        match guarded(|| plugin.execute(parameters)) {
            Ok(result) => result,
            Err(fault) => {
                error!("Error executing plugin {}: {}", name, fault);
                Err(PluginError::execution_fault(name, fault))
            }
        }
    }
}

/// 在 panic 边界内运行闭包，panic 负载转换为描述文本
fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "plugin panicked with unknown error".to_string()
    }
}
