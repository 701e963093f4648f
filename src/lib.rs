//! HybridAuto - 测试自动化框架的能力插件运行时
//!
//! 按名称分发的可插拔能力插件，以及所有被追踪操作共用的并发安全使用统计。
//!
//! # 模块
//!
//! - **plugins**: 插件契约、执行结果、注册表/分发器和五个内置插件
//! - **telemetry**: 使用统计追踪器与诊断报告
//! - **runtime**: 进程级上下文对象，组合注册表、追踪器和属性解析器
//! - **properties / config**: 启用开关的属性解析与 YAML/TOML 配置文件
//!
//! # 特性
//!
//! - **故障隔离**: 插件中的 panic 在分发边界被转换为错误结果
//! - **实时开关**: 插件启用状态每次分发时重新读取配置
//! - **无锁计数**: 使用统计基于原子计数器与并发映射

pub mod config;
pub mod error;
pub mod plugins;
pub mod properties;
pub mod runtime;
pub mod telemetry;
pub mod types;

// 重新导出核心类型
pub use error::*;
pub use plugins::*;
pub use properties::{ConfigResolver, LayeredProperties};
pub use runtime::PluginRuntime;
pub use telemetry::*;
pub use types::*;

use config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// 框架信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FRAMEWORK_NAME: &str = "HybridAuto";

/// 初始化日志系统
///
/// `RUST_LOG` 优先于配置中的级别。重复调用不会报错。
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.effective_level().as_filter()));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.verbose)
        .try_init()
        .is_ok()
    {
        tracing::info!("🚀 Initializing {} v{}", FRAMEWORK_NAME, VERSION);
    }

    Ok(())
}
