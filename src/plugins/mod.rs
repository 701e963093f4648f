//! 可插拔能力层模块
//!
//! 插件契约、执行结果、注册表/分发器以及内置插件

pub mod builtin;
pub mod contract;
pub mod registry;
pub mod result;

// 重新导出核心组件
pub use builtin::*;
pub use contract::*;
pub use registry::*;
pub use result::*;
