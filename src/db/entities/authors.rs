use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::types::AuthorType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "authors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 站点侧作者标识 (url_token)
    pub author_id: String,
    pub author_type: AuthorType,
    pub author_name: Option<String>,
    pub avatar_url: Option<String>,
    /// 机构号走 org 页面，个人号走 people 页面
    #[sea_orm(default_value = false)]
    pub is_org: bool,
    /// 定时任务是否在跑（进程内任务的持久化镜像）
    #[sea_orm(default_value = false)]
    pub status: bool,
    pub weight: i32,
    pub uid: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::author_questions::Entity")]
    AuthorQuestions,
}

impl Related<super::author_questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthorQuestions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
