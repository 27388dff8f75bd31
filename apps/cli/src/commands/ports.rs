//! 串口枚举命令

use anyhow::Result;
use armctl_sdk::serial::available_ports;
use clap::Args;

#[derive(Args, Debug)]
pub struct PortsCommand {}

impl PortsCommand {
    pub async fn execute(&self) -> Result<()> {
        let ports = available_ports();
        if ports.is_empty() {
            println!("⚠️  未发现串口设备");
            return Ok(());
        }

        println!("可用串口:");
        for port in ports {
            println!("  {}", port);
        }
        Ok(())
    }
}
