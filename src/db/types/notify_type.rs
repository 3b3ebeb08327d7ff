use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::StreamType;

/// 历史记录里的通知类别：三条作者动态流加红包触发
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum NotifyType {
    #[sea_orm(string_value = "publish")]
    Publish,
    #[sea_orm(string_value = "follow")]
    Follow,
    #[sea_orm(string_value = "answer")]
    Answer,
    /// 红包问题开奖
    #[sea_orm(string_value = "question")]
    Question,
}

impl NotifyType {
    pub fn as_str(&self) -> &str {
        match self {
            NotifyType::Publish => "publish",
            NotifyType::Follow => "follow",
            NotifyType::Answer => "answer",
            NotifyType::Question => "question",
        }
    }
}

impl From<StreamType> for NotifyType {
    fn from(stream: StreamType) -> Self {
        match stream {
            StreamType::Publish => NotifyType::Publish,
            StreamType::Follow => NotifyType::Follow,
            StreamType::Answer => NotifyType::Answer,
        }
    }
}

impl std::fmt::Display for NotifyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
