//! 测试数据生成插件
//!
//! 字段值只由记录的 0 起始索引推导，相同输入的重复调用结果一致。

use crate::plugins::contract::*;
use crate::plugins::result::{PluginError, PluginOutput, PluginResult};
use crate::properties::ConfigResolver;
use crate::types::{params_into, ParamBag};
use rayon::prelude::*;
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub const DATA_GENERATION_PLUGIN: &str = "data-generation";
pub const DATA_GENERATION_ENABLED_KEY: &str = "ai.data.generation.enabled";

/// 单次请求允许生成的最大记录数
pub const MAX_RECORDS: usize = 100_000;

/// 低于该数量时串行生成
const PARALLEL_THRESHOLD: usize = 1_024;

/// 数据生成请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequest {
    /// 记录类型：user / product / 其他
    pub data_type: String,
    /// 记录数量
    pub count: usize,
    /// 约束条件，原样回显在结果中
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
}

impl DataRequest {
    pub fn new(data_type: &str, count: usize) -> Self {
        Self {
            data_type: data_type.to_string(),
            count,
            constraints: BTreeMap::new(),
        }
    }

    pub fn with_constraint(mut self, key: &str, value: &str) -> Self {
        self.constraints.insert(key.to_string(), value.to_string());
        self
    }
}

/// 生成结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedData {
    pub records: Vec<Map<String, Value>>,
    pub count: usize,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
}

pub struct DataGenerationPlugin {
    metadata: PluginMetadata,
    toggle: ConfigToggle,
}

impl DataGenerationPlugin {
    pub fn new(resolver: Arc<dyn ConfigResolver>) -> Self {
        Self {
            metadata: PluginMetadata::new(
                DATA_GENERATION_PLUGIN,
                Version::new(1, 0, 0),
                "Synthetic test data generation",
                "Internal",
                PluginCapability::DataGeneration,
            ),
            toggle: ConfigToggle::new(resolver, DATA_GENERATION_ENABLED_KEY),
        }
    }
}

impl Plugin for DataGenerationPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn is_enabled(&self) -> bool {
        self.toggle.is_enabled()
    }

    fn execute(&self, parameters: &ParamBag) -> PluginResult {
        let request: DataRequest = params_into(parameters)?;
        if request.count > MAX_RECORDS {
            return Err(PluginError::rejected(format!(
                "Data generation failed: count {} exceeds limit {}",
                request.count, MAX_RECORDS
            )));
        }

        let generated = generate_data(&request);
        debug!("Generated {} '{}' records", generated.count, generated.data_type);

        let data = serde_json::to_value(&generated)
            .map_err(|e| PluginError::rejected(format!("Data generation failed: {}", e)))?;
        Ok(PluginOutput::success(data))
    }
}

/// 按请求生成记录
pub fn generate_data(request: &DataRequest) -> GeneratedData {
    let kind = request.data_type.to_lowercase();

    let records = if request.count < PARALLEL_THRESHOLD {
        (0..request.count).map(|i| generate_record(&kind, i)).collect()
    } else {
        (0..request.count)
            .into_par_iter()
            .map(|i| generate_record(&kind, i))
            .collect()
    };

    GeneratedData {
        records,
        count: request.count,
        data_type: request.data_type.clone(),
        constraints: request.constraints.clone(),
    }
}

fn generate_record(kind: &str, index: usize) -> Map<String, Value> {
    let record = match kind {
        "user" => json!({
            "firstName": format!("TestUser{}", index),
            "lastName": format!("Generated{}", index),
            "email": format!("testuser{}@example.com", index),
            "age": 20 + (index % 50),
        }),
        "product" => json!({
            "name": format!("Product{}", index),
            "price": 10.0 + index as f64,
            "category": format!("Category{}", index % 5),
        }),
        _ => json!({
            "id": index,
            "value": format!("Generated value {}", index),
        }),
    };

    match record {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::LayeredProperties;
    use crate::types::params_from;

    #[test]
    fn test_user_records_derived_from_index() {
        let data = generate_data(&DataRequest::new("user", 3));
        assert_eq!(data.records.len(), 3);
        assert_eq!(data.count, 3);
        for (i, record) in data.records.iter().enumerate() {
            assert_eq!(record["firstName"], json!(format!("TestUser{}", i)));
            assert_eq!(record["lastName"], json!(format!("Generated{}", i)));
            assert_eq!(record["email"], json!(format!("testuser{}@example.com", i)));
            assert_eq!(record["age"], json!(20 + i));
        }
    }

    #[test]
    fn test_product_and_default_shapes() {
        let products = generate_data(&DataRequest::new("Product", 6));
        assert_eq!(products.records[5]["category"], json!("Category0"));
        assert_eq!(products.records[2]["price"], json!(12.0));

        let other = generate_data(&DataRequest::new("order", 2));
        assert_eq!(other.records[1]["id"], json!(1));
        assert_eq!(other.records[1]["value"], json!("Generated value 1"));
    }

    #[test]
    fn test_parallel_generation_keeps_order() {
        let data = generate_data(&DataRequest::new("user", PARALLEL_THRESHOLD + 10));
        assert_eq!(data.records.len(), PARALLEL_THRESHOLD + 10);
        let last = PARALLEL_THRESHOLD + 9;
        assert_eq!(data.records[last]["firstName"], json!(format!("TestUser{}", last)));
    }

    #[test]
    fn test_reproducible() {
        let request = DataRequest::new("user", 5).with_constraint("locale", "en");
        assert_eq!(generate_data(&request), generate_data(&request));
    }

    #[test]
    fn test_execute_rejects_bad_input() {
        let plugin = DataGenerationPlugin::new(LayeredProperties::new().without_environment().shared());

        let mut params = ParamBag::new();
        params.insert("dataType".into(), json!("user"));
        assert!(plugin.execute(&params).is_err());

        params.insert("count".into(), json!(-1));
        assert!(plugin.execute(&params).is_err());

        let too_many = params_from(&DataRequest::new("user", MAX_RECORDS + 1));
        let err = plugin.execute(&too_many).unwrap_err();
        assert!(err.to_string().contains("exceeds limit"));
    }

    #[test]
    fn test_execute_payload_shape() {
        let plugin = DataGenerationPlugin::new(LayeredProperties::new().without_environment().shared());
        let output = plugin.execute(&params_from(&DataRequest::new("user", 2))).unwrap();
        assert_eq!(output.data["count"], json!(2));
        assert_eq!(output.data["type"], json!("user"));
        assert_eq!(output.data["records"].as_array().unwrap().len(), 2);
    }
}
