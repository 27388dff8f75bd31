//! 命令定义和实现

pub mod config;
pub mod estop;
pub mod goto;
pub mod monitor;
pub mod r#move;
pub mod peripheral;
pub mod ports;
pub mod say;
pub mod status;

pub use config::ConfigCommand;
pub use estop::EstopCommand;
pub use goto::GotoCommand;
pub use monitor::MonitorCommand;
pub use r#move::MoveCommand;
pub use peripheral::{LedCommand, PumpCommand, ServoCommand};
pub use ports::PortsCommand;
pub use say::SayCommand;
pub use status::StatusCommand;
