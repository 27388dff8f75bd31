//! 运行模式
//!
//! 目前只有 One-shot 模式：每条命令独立加载配置、装配机械臂、执行后关闭。

pub mod oneshot;
