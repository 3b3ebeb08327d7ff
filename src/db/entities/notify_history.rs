use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::types::NotifyType;

/// 一行对应一次通知事件，收件人扇出不在这里展开
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "notify_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 站点侧问题 id
    pub subject_id: String,
    pub notify_type: NotifyType,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub uid: i64,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
