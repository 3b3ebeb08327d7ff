use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 关注类型：盯博主发布的新问题，还是盯博主的关注/回答动态
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum AuthorType {
    #[sea_orm(string_value = "publisher")]
    Publisher,
    #[sea_orm(string_value = "answer")]
    Answer,
}

impl AuthorType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "publisher" => Some(AuthorType::Publisher),
            "answer" => Some(AuthorType::Answer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AuthorType::Publisher => "publisher",
            AuthorType::Answer => "answer",
        }
    }
}

impl std::fmt::Display for AuthorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
