use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 站点侧问题 id
    pub question_id: String,
    pub title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// 提问者（站点侧 url_token 或 id）
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    /// 问题创建/更新时间（站点侧 unix 秒），建档抓取失败时为 0
    pub question_created: i64,
    pub question_updated: i64,
    /// 红包金额（元），开奖后回填
    pub question_amount: i32,
    /// 红包份数
    pub question_red_count: i32,
    /// 是否已通知过
    #[sea_orm(default_value = false)]
    pub notify_status: bool,
    #[sea_orm(default_value = false)]
    pub status: bool,
    pub weight: i32,
    pub uid: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
