//! 知乎数据抓取客户端
//!
//! 这是一个干净的知乎页面/接口封装，不依赖项目其他代码。
//! 页面数据来自内嵌的 `js-initialData` JSON，红包状态来自 brand 活动接口。

mod client;
mod error;
mod models;

pub use client::{ZhihuClient, ZhihuClientConfig};
pub use error::{Error, Result};
pub use models::{
    AuthorActivity, QuestionDetail, QuestionKind, QuestionSummary, RedPacketStatus, UserProfile,
};
