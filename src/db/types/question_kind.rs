use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 问题类别，站点把带红包活动的问题标记为 commercial
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum QuestionKind {
    #[sea_orm(string_value = "commercial")]
    Commercial,
    #[sea_orm(string_value = "normal")]
    Normal,
}

impl Default for QuestionKind {
    fn default() -> Self {
        QuestionKind::Normal
    }
}

impl QuestionKind {
    pub fn is_commercial(&self) -> bool {
        matches!(self, QuestionKind::Commercial)
    }

    pub fn as_str(&self) -> &str {
        match self {
            QuestionKind::Commercial => "commercial",
            QuestionKind::Normal => "normal",
        }
    }
}

impl From<zhihu_client::QuestionKind> for QuestionKind {
    fn from(kind: zhihu_client::QuestionKind) -> Self {
        match kind {
            zhihu_client::QuestionKind::Commercial => QuestionKind::Commercial,
            zhihu_client::QuestionKind::Normal => QuestionKind::Normal,
        }
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
