//! 串口配置
//!
//! 启动时确定，运行期不修改。可以来自 TOML（serde）或环境变量。

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// 串口传输配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// 串口设备名（如 `COM3`、`/dev/ttyUSB0`）
    pub port: String,
    /// 波特率
    pub baud_rate: u32,
    /// 读写超时（毫秒）
    pub timeout_ms: u64,
    /// 是否启用真实串口；关闭时使用 Mock
    pub enabled: bool,
    /// 连接后发送的握手指令，空字符串表示不握手
    pub handshake: Option<String>,
    /// 行终止符
    pub newline: String,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "COM3".to_string(),
            baud_rate: 115_200,
            timeout_ms: 500,
            enabled: false,
            handshake: Some("remote_enable".to_string()),
            newline: "\n".to_string(),
        }
    }
}

impl SerialConfig {
    /// 读写超时
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// 有效的握手指令
    pub fn handshake_command(&self) -> Option<&str> {
        self.handshake.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// 从默认值出发应用进程环境变量
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// 应用 `SERIAL_*` 覆盖项
    ///
    /// `lookup` 返回变量值（测试中可以注入）。无法解析的值保留原配置并记录警告。
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SERIAL_ENABLED") {
            match parse_bool(&value) {
                Some(enabled) => self.enabled = enabled,
                None => warn!("Ignoring invalid SERIAL_ENABLED={:?}", value),
            }
        }

        if let Some(value) = lookup("SERIAL_PORT")
            && !value.trim().is_empty()
        {
            self.port = value.trim().to_string();
        }

        if let Some(value) = lookup("SERIAL_BAUDRATE") {
            match value.trim().parse::<u32>() {
                Ok(baud) if baud > 0 => self.baud_rate = baud,
                _ => warn!("Ignoring invalid SERIAL_BAUDRATE={:?}", value),
            }
        }

        // 秒，允许小数
        if let Some(value) = lookup("SERIAL_TIMEOUT") {
            match value.trim().parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs > 0.0 => {
                    self.timeout_ms = (secs * 1000.0).round() as u64;
                },
                _ => warn!("Ignoring invalid SERIAL_TIMEOUT={:?}", value),
            }
        }

        if let Some(value) = lookup("SERIAL_HANDSHAKE") {
            let value = value.trim();
            self.handshake = (!value.is_empty()).then(|| value.to_string());
        }

        if let Some(value) = lookup("SERIAL_NEWLINE")
            && !value.is_empty()
        {
            self.newline = unescape_newline(&value);
        }
    }
}

/// 解析布尔开关：`1/true/yes/on` 与 `0/false/no/off`（忽略大小写）
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// 环境变量里常写成字面量 "\r\n"
fn unescape_newline(value: &str) -> String {
    value.replace("\\r", "\r").replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SerialConfig::default();
        assert_eq!(config.port, "COM3");
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.timeout(), Duration::from_millis(500));
        assert!(!config.enabled);
        assert_eq!(config.handshake_command(), Some("remote_enable"));
        assert_eq!(config.newline, "\n");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SerialConfig::default();
        config.apply_env(lookup_from(&[
            ("SERIAL_ENABLED", "yes"),
            ("SERIAL_PORT", "/dev/ttyUSB0"),
            ("SERIAL_BAUDRATE", "9600"),
            ("SERIAL_TIMEOUT", "1.5"),
            ("SERIAL_HANDSHAKE", ""),
            ("SERIAL_NEWLINE", "\\r\\n"),
        ]));

        assert!(config.enabled);
        assert_eq!(config.port, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.handshake_command(), None);
        assert_eq!(config.newline, "\r\n");
    }

    #[test]
    fn test_invalid_env_keeps_defaults() {
        let mut config = SerialConfig::default();
        config.apply_env(lookup_from(&[
            ("SERIAL_ENABLED", "maybe"),
            ("SERIAL_BAUDRATE", "fast"),
            ("SERIAL_TIMEOUT", "-1"),
        ]));
        assert_eq!(config, SerialConfig::default());
    }

    #[test]
    fn test_parse_bool() {
        for text in ["1", "true", "YES", " on "] {
            assert_eq!(parse_bool(text), Some(true), "{text}");
        }
        for text in ["0", "False", "no", "OFF"] {
            assert_eq!(parse_bool(text), Some(false), "{text}");
        }
        assert_eq!(parse_bool("enabled"), None);
    }

    #[test]
    fn test_toml_partial() {
        let config: SerialConfig = toml::from_str(
            r#"
            port = "/dev/ttyACM0"
            enabled = true
            handshake = ""
            "#,
        )
        .unwrap();
        assert_eq!(config.port, "/dev/ttyACM0");
        assert!(config.enabled);
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.handshake_command(), None);
    }
}
