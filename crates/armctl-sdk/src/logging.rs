//! 日志初始化
//!
//! 二进制程序启动时调用一次 [`init`]。`RUST_LOG` 存在时优先生效。

use tracing_subscriber::EnvFilter;

/// 构造过滤器：`RUST_LOG` 优先，否则使用 `default_directive`
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// 安装全局 fmt subscriber
///
/// 重复调用时保留第一次的设置并返回 `false`。
pub fn init(default_directive: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .with_target(false)
        .try_init()
        .is_ok()
}
