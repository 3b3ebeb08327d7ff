use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::types::{QuestionKind, StreamType};

/// 某次 tick 发现的问题快照，(question_id, aid, uid, stream) 唯一
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "author_questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub question_id: String,
    pub title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub author_name: Option<String>,
    /// 问题创建时间（站点侧 unix 秒）
    pub question_created: i64,
    pub question_updated: i64,
    pub kind: QuestionKind,
    pub stream: StreamType,
    /// 所属 authors.id
    pub aid: i32,
    pub uid: i64,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::authors::Entity",
        from = "Column::Aid",
        to = "super::authors::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::authors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
