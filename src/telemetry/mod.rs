//! 使用遥测模块
//!
//! 所有被追踪的调用（插件分发或框架其他操作）都汇报到 [`UsageTracker`]。

pub mod report;
pub mod tracker;

pub use report::*;
pub use tracker::*;
