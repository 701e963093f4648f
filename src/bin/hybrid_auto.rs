//! HybridAuto 主程序 - 配置驱动运行
//!
//! 以配置文件构造插件运行时，执行一轮示范调用并输出使用统计报告

use anyhow::{Context, Result};
use hybrid_auto::{
    config::{generate_default_config_file, ConfigManager},
    init_logging, DataRequest, ParamBag, PluginRuntime,
};
use serde_json::{json, Map};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "hybrid_auto.yaml";

/// 程序入口点
#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(_) => {}
        Err(e) => {
            tracing::error!("❌ Run failed: {:#}", e);
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// 主要逻辑函数
async fn run_main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => run_with_config(ConfigManager::new_default()).await,
        2 => match args[1].as_str() {
            "init" => generate_config_file().await,
            "status" => print_status().await,
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            path => run_with_config_file(path).await,
        },
        _ => {
            print_usage();
            Ok(())
        }
    }
}

/// 使用配置文件运行
async fn run_with_config_file(config_path: &str) -> Result<()> {
    if !Path::new(config_path).exists() {
        anyhow::bail!(
            "config file not found: {} (run 'hybrid_auto init' to generate one)",
            config_path
        );
    }

    let config_manager = ConfigManager::load_from_file(config_path)
        .await
        .with_context(|| format!("loading {}", config_path))?;
    run_with_config(config_manager).await
}

async fn run_with_config(config_manager: ConfigManager) -> Result<()> {
    config_manager.validate().context("invalid configuration")?;
    init_logging(&config_manager.get_config().logging)?;

    let config = config_manager.get_config();
    tracing::info!("🏗️  Framework: {} v{}", config.framework.name, config.framework.version);

    let runtime = PluginRuntime::from_config(&config_manager);
    run_demo(&runtime);

    println!("{}", runtime.usage_report().render());
    tracing::info!("🎉 Run complete");
    Ok(())
}

/// 一轮示范调用：插件分发与普通被追踪操作
fn run_demo(runtime: &PluginRuntime) {
    let mut navigate = ParamBag::new();
    navigate.insert("url".to_string(), json!("https://example.com/login"));
    navigate.insert("waitForLoad".to_string(), json!(true));
    runtime.traced("navigateTo", &navigate, || {
        tracing::info!("🌐 navigateTo https://example.com/login");
    });

    let code = runtime.generate_code(
        "Fill the login form, click submit and verify the dashboard",
        "https://example.com/login",
    );
    tracing::info!("🧪 Generated {} lines of test code", code.lines().count());

    let selector = runtime.optimize_selector("//div[1]/form/button[2]", None);
    tracing::info!("🎯 Optimized selector: {}", selector);

    let data = runtime.generate_test_data(&DataRequest::new("user", 3).with_constraint("locale", "en"));
    tracing::info!("📋 Generated {} '{}' records", data.count, data.data_type);

    let mut metrics = Map::new();
    metrics.insert("executionTime".to_string(), json!(45_000));
    metrics.insert("failureRate".to_string(), json!(0.15));
    let analysis = runtime.analyze_test_performance(metrics);
    tracing::info!(
        "📈 Performance score {} ({:?}), {} recommendations",
        analysis.score,
        analysis.priority,
        analysis.recommendations.len()
    );

    let snapshot = runtime.analytics_snapshot();
    tracing::info!("📊 Analytics fields: {}", snapshot.len());
}

/// 生成默认配置文件
async fn generate_config_file() -> Result<()> {
    generate_default_config_file(DEFAULT_CONFIG_PATH)
        .await
        .with_context(|| format!("writing {}", DEFAULT_CONFIG_PATH))?;

    println!("✅ Wrote default configuration to {}", DEFAULT_CONFIG_PATH);
    println!("🔧 Edit it, then run: hybrid_auto {}", DEFAULT_CONFIG_PATH);
    Ok(())
}

/// 输出插件状态（JSON）
async fn print_status() -> Result<()> {
    let config_manager = if Path::new(DEFAULT_CONFIG_PATH).exists() {
        ConfigManager::load_from_file(DEFAULT_CONFIG_PATH).await?
    } else {
        ConfigManager::new_default()
    };

    let runtime = PluginRuntime::from_config(&config_manager);
    println!("{}", serde_json::to_string_pretty(&runtime.plugin_status())?);
    Ok(())
}

/// 打印使用说明
fn print_usage() {
    println!("HybridAuto plugin runtime");
    println!();
    println!("Usage:");
    println!("  hybrid_auto                    # run with the default configuration");
    println!("  hybrid_auto init               # write {}", DEFAULT_CONFIG_PATH);
    println!("  hybrid_auto status             # print plugin status as JSON");
    println!("  hybrid_auto <config_file>      # run with a YAML or TOML configuration");
}
