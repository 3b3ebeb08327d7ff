//! 知乎客户端错误类型

use std::fmt;

/// 知乎客户端错误类型
#[derive(Debug)]
pub enum Error {
    /// HTTP 请求错误
    Http(reqwest::Error),
    /// JSON 解析错误
    Json(serde_json::Error),
    /// 非 2xx 响应
    Status { status: u16, message: String },
    /// 页面缺少 js-initialData 数据块
    InitialDataMissing,
    /// 目标用户或问题不存在
    NotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Json(e) => write!(f, "JSON parse error: {}", e),
            Error::Status { status, message } => {
                write!(f, "Unexpected status {}: {}", status, message)
            }
            Error::InitialDataMissing => write!(f, "Page carries no js-initialData block"),
            Error::NotFound(what) => write!(f, "Not found: {}", what),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
