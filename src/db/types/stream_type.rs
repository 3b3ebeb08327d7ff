use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 问题来自作者动态的哪条流
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum StreamType {
    /// 作者新发布的问题
    #[sea_orm(string_value = "publish")]
    Publish,
    /// 作者新关注的问题
    #[sea_orm(string_value = "follow")]
    Follow,
    /// 作者新回答的问题
    #[sea_orm(string_value = "answer")]
    Answer,
}

impl StreamType {
    pub fn as_str(&self) -> &str {
        match self {
            StreamType::Publish => "publish",
            StreamType::Follow => "follow",
            StreamType::Answer => "answer",
        }
    }
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
