//! 传输层错误类型

use thiserror::Error;

/// 传输层统一错误类型
///
/// [`crate::Transport`] 的公开方法以 `bool` / `Option` 返回，
/// 这里的错误只在实现内部传递并写入日志。
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open serial port {port}: {message}")]
    Open { port: String, message: String },

    #[error("Serial port not connected")]
    NotConnected,

    #[error("Read timeout")]
    Timeout,
}

impl TransportError {
    /// 是否需要丢弃当前句柄并在下次重连
    pub fn is_link_lost(&self) -> bool {
        match self {
            TransportError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::WriteZero
                    | std::io::ErrorKind::PermissionDenied
                    | std::io::ErrorKind::NotFound
            ),
            TransportError::NotConnected => true,
            _ => false,
        }
    }
}

#[cfg(feature = "serial")]
impl From<serialport::Error> for TransportError {
    fn from(e: serialport::Error) -> Self {
        TransportError::Io(e.into())
    }
}
