//! 上行状态报文
//!
//! 格式：`STATUS,<j1>,<j2>,<j3>,<j4>,<j5>,<j6>,<error_code>`
//!
//! 前缀大小写不敏感，多余字段忽略。

use crate::error::ProtocolError;
use crate::joint::{JOINT_COUNT, JointAngles};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

const STATUS_PREFIX: &str = "STATUS";
const STATUS_FIELDS: usize = 2 + JOINT_COUNT;

/// 控制板状态回读
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    /// 关节角度（度）
    pub angles_deg: JointAngles,
    /// 控制板错误码
    pub error_code: i64,
    /// 原始报文（已去除首尾空白）
    pub raw: String,
    /// 解析时刻（Unix 秒）
    pub timestamp: f64,
    /// 是否来自 Mock 传输
    pub is_mock: bool,
}

impl StatusReport {
    /// 解析一行状态报文
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let raw = line.trim();
        if raw.is_empty() {
            return Err(ProtocolError::EmptyLine);
        }

        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if !parts[0].eq_ignore_ascii_case(STATUS_PREFIX) {
            return Err(ProtocolError::NotStatus {
                prefix: parts[0].to_string(),
            });
        }
        if parts.len() < STATUS_FIELDS {
            return Err(ProtocolError::MissingFields {
                expected: STATUS_FIELDS,
                actual: parts.len(),
            });
        }

        let mut angles_deg = [0.0; JOINT_COUNT];
        for (idx, slot) in angles_deg.iter_mut().enumerate() {
            *slot = parse_field(&parts, idx + 1)?;
        }
        let error_code = parse_error_code(&parts, STATUS_FIELDS - 1)?;

        Ok(Self {
            angles_deg,
            error_code,
            raw: raw.to_string(),
            timestamp: unix_timestamp(),
            is_mock: false,
        })
    }

    /// Mock 传输返回的全零状态
    pub fn synthetic_zero() -> Self {
        Self {
            angles_deg: [0.0; JOINT_COUNT],
            error_code: 0,
            raw: "mock".to_string(),
            timestamp: unix_timestamp(),
            is_mock: true,
        }
    }
}

impl FromStr for StatusReport {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_field(parts: &[&str], field: usize) -> Result<f64, ProtocolError> {
    parts[field]
        .parse::<f64>()
        .map_err(|_| ProtocolError::InvalidNumber {
            field,
            value: parts[field].to_string(),
        })
}

// 错误码允许写成 "7" 或 "7.0"
fn parse_error_code(parts: &[&str], field: usize) -> Result<i64, ProtocolError> {
    let text = parts[field];
    if let Ok(code) = text.parse::<i64>() {
        return Ok(code);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value as i64),
        _ => Err(ProtocolError::InvalidNumber {
            field,
            value: text.to_string(),
        }),
    }
}

/// 当前 Unix 时间戳（秒）
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
