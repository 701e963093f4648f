//! HybridAuto 核心数据类型
//!
//! 参数包及其与强类型请求结构之间的转换

use crate::plugins::PluginError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// 参数包：无序、未校验的 键 → 值 映射
pub type ParamBag = HashMap<String, Value>;
pub type PluginName = String;
pub type OperationName = String;

/// 将强类型请求转换为参数包
///
/// 非对象的序列化结果（例如单元结构体）得到空参数包。
pub fn params_from<T: Serialize>(request: &T) -> ParamBag {
    match serde_json::to_value(request) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        _ => ParamBag::new(),
    }
}

/// 从参数包解析强类型请求
///
/// 未识别的键被忽略；缺失必需键或类型不符时返回 `PluginError::Rejected`。
pub fn params_into<T: DeserializeOwned>(params: &ParamBag) -> std::result::Result<T, PluginError> {
    let object: serde_json::Map<String, Value> = params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    serde_json::from_value(Value::Object(object))
        .map_err(|e| PluginError::rejected(format!("Invalid parameters: {}", e)))
}
