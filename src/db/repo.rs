use anyhow::{Context, Result};
use chrono::Local;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::entities::{author_questions, authors, notify_history, notify_receivers, questions};
use crate::db::types::{AuthorType, NotifyType, QuestionKind, StreamType};

/// 新建作者的输入字段
#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub author_id: String,
    pub author_type: AuthorType,
    pub author_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_org: bool,
}

/// 部分更新，None 表示该字段不动
#[derive(Debug, Clone, Default)]
pub struct AuthorPatch {
    pub author_id: Option<String>,
    pub author_type: Option<AuthorType>,
    pub author_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_org: Option<bool>,
    pub weight: Option<i32>,
}

/// 建档时从问题页抓到的快照；抓取失败时除 id/标题外都留默认值
#[derive(Debug, Clone, Default)]
pub struct NewQuestion {
    pub question_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub question_created: i64,
    pub question_updated: i64,
}

#[derive(Debug, Clone, Default)]
pub struct QuestionPatch {
    pub question_id: Option<String>,
    pub title: Option<String>,
    pub weight: Option<i32>,
}

/// tick 里发现新问题时落库的快照
#[derive(Debug, Clone)]
pub struct NewAuthorQuestion {
    pub question_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub author_name: Option<String>,
    pub question_created: i64,
    pub question_updated: i64,
    pub kind: QuestionKind,
    pub stream: StreamType,
}

#[derive(Debug, Clone, Default)]
pub struct AuthorQuery {
    /// 模糊匹配 author_id / author_name
    pub search: Option<String>,
    pub author_type: Option<AuthorType>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct QuestionQuery {
    /// 模糊匹配 question_id / title
    pub search: Option<String>,
    pub status: Option<bool>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

fn page_bounds(page: Option<u64>, size: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, size)
}

pub struct Repo {
    db: DatabaseConnection,
}

impl Repo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn ping(&self) -> Result<()> {
        self.db.ping().await.context("Database ping failed")
    }

    // ==================== Authors ====================

    /// Create an author watch entry (inactive until toggled on)
    pub async fn create_author(&self, data: NewAuthor, uid: i64) -> Result<authors::Model> {
        let weight = self.next_author_weight(uid).await?;
        let now = Local::now().naive_local();

        let new_author = authors::ActiveModel {
            author_id: Set(data.author_id),
            author_type: Set(data.author_type),
            author_name: Set(data.author_name),
            avatar_url: Set(data.avatar_url),
            is_org: Set(data.is_org),
            status: Set(false),
            weight: Set(weight),
            uid: Set(uid),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        new_author
            .insert(&self.db)
            .await
            .context("Failed to create author")
    }

    /// 新条目排最前：当前最大 weight 加一，空表从 1 起
    async fn next_author_weight(&self, uid: i64) -> Result<i32> {
        let top = authors::Entity::find()
            .filter(authors::Column::Uid.eq(uid))
            .order_by_desc(authors::Column::Weight)
            .one(&self.db)
            .await
            .context("Failed to query max author weight")?;
        Ok(top.map(|a| a.weight + 1).unwrap_or(1))
    }

    pub async fn get_author(&self, id: i32, uid: i64) -> Result<Option<authors::Model>> {
        authors::Entity::find_by_id(id)
            .filter(authors::Column::Uid.eq(uid))
            .one(&self.db)
            .await
            .context("Failed to get author")
    }

    /// Owner-scoped listing: weight desc, then optional search and type filter
    pub async fn list_authors(
        &self,
        uid: i64,
        query: &AuthorQuery,
    ) -> Result<(Vec<authors::Model>, u64)> {
        let (page, size) = page_bounds(query.page, query.size);

        let mut find = authors::Entity::find().filter(authors::Column::Uid.eq(uid));
        if let Some(author_type) = query.author_type {
            find = find.filter(authors::Column::AuthorType.eq(author_type));
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            find = find.filter(
                Condition::any()
                    .add(authors::Column::AuthorId.contains(search))
                    .add(authors::Column::AuthorName.contains(search)),
            );
        }

        let total = find
            .clone()
            .count(&self.db)
            .await
            .context("Failed to count authors")?;
        let rows = find
            .order_by_desc(authors::Column::Weight)
            .order_by_desc(authors::Column::Id)
            .offset((page - 1) * size)
            .limit(size)
            .all(&self.db)
            .await
            .context("Failed to list authors")?;

        Ok((rows, total))
    }

    pub async fn update_author(
        &self,
        id: i32,
        patch: AuthorPatch,
        uid: i64,
    ) -> Result<Option<authors::Model>> {
        let author = match self.get_author(id, uid).await? {
            Some(author) => author,
            None => return Ok(None),
        };

        let mut active = author.into_active_model();
        if let Some(author_id) = patch.author_id {
            active.author_id = Set(author_id);
        }
        if let Some(author_type) = patch.author_type {
            active.author_type = Set(author_type);
        }
        if let Some(author_name) = patch.author_name {
            active.author_name = Set(Some(author_name));
        }
        if let Some(avatar_url) = patch.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }
        if let Some(is_org) = patch.is_org {
            active.is_org = Set(is_org);
        }
        if let Some(weight) = patch.weight {
            active.weight = Set(weight);
        }
        active.updated_at = Set(Local::now().naive_local());

        let updated = active
            .update(&self.db)
            .await
            .context("Failed to update author")?;
        Ok(Some(updated))
    }

    /// Mirror the in-memory job state into the row; false when the row is gone
    pub async fn set_author_status(&self, id: i32, uid: i64, status: bool) -> Result<bool> {
        let author = match self.get_author(id, uid).await? {
            Some(author) => author,
            None => return Ok(false),
        };

        let mut active = author.into_active_model();
        active.status = Set(status);
        active.updated_at = Set(Local::now().naive_local());
        active
            .update(&self.db)
            .await
            .context("Failed to update author status")?;
        Ok(true)
    }

    /// Delete an author together with its discovered question records
    pub async fn delete_author(&self, id: i32, uid: i64) -> Result<()> {
        author_questions::Entity::delete_many()
            .filter(author_questions::Column::Aid.eq(id))
            .filter(author_questions::Column::Uid.eq(uid))
            .exec(&self.db)
            .await
            .context("Failed to delete author question records")?;

        authors::Entity::delete_many()
            .filter(authors::Column::Id.eq(id))
            .filter(authors::Column::Uid.eq(uid))
            .exec(&self.db)
            .await
            .context("Failed to delete author")?;
        Ok(())
    }

    /// 所有 status 为真的作者（不分 uid），进程启动时恢复任务用
    pub async fn list_active_authors(&self) -> Result<Vec<authors::Model>> {
        authors::Entity::find()
            .filter(authors::Column::Status.eq(true))
            .order_by_asc(authors::Column::Id)
            .all(&self.db)
            .await
            .context("Failed to list active authors")
    }

    // ==================== Author questions ====================

    pub async fn author_question_exists(
        &self,
        question_id: &str,
        aid: i32,
        uid: i64,
        stream: StreamType,
    ) -> Result<bool> {
        let count = author_questions::Entity::find()
            .filter(author_questions::Column::QuestionId.eq(question_id))
            .filter(author_questions::Column::Aid.eq(aid))
            .filter(author_questions::Column::Uid.eq(uid))
            .filter(author_questions::Column::Stream.eq(stream))
            .count(&self.db)
            .await
            .context("Failed to check author question existence")?;
        Ok(count > 0)
    }

    pub async fn add_author_question(
        &self,
        data: NewAuthorQuestion,
        aid: i32,
        uid: i64,
    ) -> Result<()> {
        let now = Local::now().naive_local();

        let record = author_questions::ActiveModel {
            question_id: Set(data.question_id),
            title: Set(data.title),
            description: Set(data.description),
            author_name: Set(data.author_name),
            question_created: Set(data.question_created),
            question_updated: Set(data.question_updated),
            kind: Set(data.kind),
            stream: Set(data.stream),
            aid: Set(aid),
            uid: Set(uid),
            created_at: Set(now),
            ..Default::default()
        };

        // Racing ticks may rediscover the same question; the unique index wins
        author_questions::Entity::insert(record)
            .on_conflict(
                OnConflict::columns([
                    author_questions::Column::QuestionId,
                    author_questions::Column::Aid,
                    author_questions::Column::Uid,
                    author_questions::Column::Stream,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("Failed to record author question")?;
        Ok(())
    }

    pub async fn list_author_questions(
        &self,
        aid: i32,
        uid: i64,
    ) -> Result<Vec<author_questions::Model>> {
        author_questions::Entity::find()
            .filter(author_questions::Column::Aid.eq(aid))
            .filter(author_questions::Column::Uid.eq(uid))
            .order_by_desc(author_questions::Column::QuestionCreated)
            .all(&self.db)
            .await
            .context("Failed to list author questions")
    }

    pub async fn delete_author_question(&self, id: i32, uid: i64) -> Result<()> {
        author_questions::Entity::delete_many()
            .filter(author_questions::Column::Id.eq(id))
            .filter(author_questions::Column::Uid.eq(uid))
            .exec(&self.db)
            .await
            .context("Failed to delete author question")?;
        Ok(())
    }

    // ==================== Questions ====================

    /// Create a red-packet watch entry
    pub async fn create_question(&self, data: NewQuestion, uid: i64) -> Result<questions::Model> {
        let weight = self.next_question_weight(uid).await?;
        let now = Local::now().naive_local();

        let new_question = questions::ActiveModel {
            question_id: Set(data.question_id),
            title: Set(data.title),
            description: Set(data.description),
            author_id: Set(data.author_id),
            author_name: Set(data.author_name),
            question_created: Set(data.question_created),
            question_updated: Set(data.question_updated),
            question_amount: Set(0),
            question_red_count: Set(0),
            notify_status: Set(false),
            status: Set(false),
            weight: Set(weight),
            uid: Set(uid),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        new_question
            .insert(&self.db)
            .await
            .context("Failed to create question")
    }

    async fn next_question_weight(&self, uid: i64) -> Result<i32> {
        let top = questions::Entity::find()
            .filter(questions::Column::Uid.eq(uid))
            .order_by_desc(questions::Column::Weight)
            .one(&self.db)
            .await
            .context("Failed to query max question weight")?;
        Ok(top.map(|q| q.weight + 1).unwrap_or(1))
    }

    pub async fn get_question(&self, id: i32, uid: i64) -> Result<Option<questions::Model>> {
        questions::Entity::find_by_id(id)
            .filter(questions::Column::Uid.eq(uid))
            .one(&self.db)
            .await
            .context("Failed to get question")
    }

    pub async fn list_questions(
        &self,
        uid: i64,
        query: &QuestionQuery,
    ) -> Result<(Vec<questions::Model>, u64)> {
        let (page, size) = page_bounds(query.page, query.size);

        let mut find = questions::Entity::find().filter(questions::Column::Uid.eq(uid));
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            find = find.filter(
                Condition::any()
                    .add(questions::Column::QuestionId.contains(search))
                    .add(questions::Column::Title.contains(search)),
            );
        }
        if let Some(status) = query.status {
            find = find.filter(questions::Column::Status.eq(status));
        }

        let total = find
            .clone()
            .count(&self.db)
            .await
            .context("Failed to count questions")?;
        let rows = find
            .order_by_desc(questions::Column::Weight)
            .order_by_desc(questions::Column::Id)
            .offset((page - 1) * size)
            .limit(size)
            .all(&self.db)
            .await
            .context("Failed to list questions")?;

        Ok((rows, total))
    }

    pub async fn update_question(
        &self,
        id: i32,
        patch: QuestionPatch,
        uid: i64,
    ) -> Result<Option<questions::Model>> {
        let question = match self.get_question(id, uid).await? {
            Some(question) => question,
            None => return Ok(None),
        };

        let mut active = question.into_active_model();
        if let Some(question_id) = patch.question_id {
            active.question_id = Set(question_id);
        }
        if let Some(title) = patch.title {
            active.title = Set(Some(title));
        }
        if let Some(weight) = patch.weight {
            active.weight = Set(weight);
        }
        active.updated_at = Set(Local::now().naive_local());

        let updated = active
            .update(&self.db)
            .await
            .context("Failed to update question")?;
        Ok(Some(updated))
    }

    pub async fn set_question_status(&self, id: i32, uid: i64, status: bool) -> Result<bool> {
        let question = match self.get_question(id, uid).await? {
            Some(question) => question,
            None => return Ok(false),
        };

        let mut active = question.into_active_model();
        active.status = Set(status);
        active.updated_at = Set(Local::now().naive_local());
        active
            .update(&self.db)
            .await
            .context("Failed to update question status")?;
        Ok(true)
    }

    /// 红包开奖后回填金额份数并停表，一次写入
    pub async fn mark_question_notified(
        &self,
        id: i32,
        uid: i64,
        amount: i32,
        red_count: i32,
    ) -> Result<Option<questions::Model>> {
        let question = match self.get_question(id, uid).await? {
            Some(question) => question,
            None => return Ok(None),
        };

        let mut active = question.into_active_model();
        active.question_amount = Set(amount);
        active.question_red_count = Set(red_count);
        active.notify_status = Set(true);
        active.status = Set(false);
        active.updated_at = Set(Local::now().naive_local());

        let updated = active
            .update(&self.db)
            .await
            .context("Failed to mark question notified")?;
        Ok(Some(updated))
    }

    pub async fn delete_question(&self, id: i32, uid: i64) -> Result<()> {
        questions::Entity::delete_many()
            .filter(questions::Column::Id.eq(id))
            .filter(questions::Column::Uid.eq(uid))
            .exec(&self.db)
            .await
            .context("Failed to delete question")?;
        Ok(())
    }

    pub async fn list_active_questions(&self) -> Result<Vec<questions::Model>> {
        questions::Entity::find()
            .filter(questions::Column::Status.eq(true))
            .order_by_asc(questions::Column::Id)
            .all(&self.db)
            .await
            .context("Failed to list active questions")
    }

    // ==================== Notify receivers ====================

    pub async fn create_receiver(
        &self,
        email: String,
        remark: Option<String>,
        uid: i64,
    ) -> Result<notify_receivers::Model> {
        let now = Local::now().naive_local();

        let receiver = notify_receivers::ActiveModel {
            email: Set(email),
            remark: Set(remark),
            active: Set(true),
            uid: Set(uid),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        receiver
            .insert(&self.db)
            .await
            .context("Failed to create receiver")
    }

    pub async fn list_receivers(&self, uid: i64) -> Result<Vec<notify_receivers::Model>> {
        notify_receivers::Entity::find()
            .filter(notify_receivers::Column::Uid.eq(uid))
            .order_by_asc(notify_receivers::Column::Id)
            .all(&self.db)
            .await
            .context("Failed to list receivers")
    }

    /// 发信前现查一遍，收件人增删下一次通知即生效
    pub async fn active_receivers(&self, uid: i64) -> Result<Vec<notify_receivers::Model>> {
        notify_receivers::Entity::find()
            .filter(notify_receivers::Column::Uid.eq(uid))
            .filter(notify_receivers::Column::Active.eq(true))
            .order_by_asc(notify_receivers::Column::Id)
            .all(&self.db)
            .await
            .context("Failed to load active receivers")
    }

    pub async fn set_receiver_active(&self, id: i32, uid: i64, active: bool) -> Result<bool> {
        let receiver = notify_receivers::Entity::find_by_id(id)
            .filter(notify_receivers::Column::Uid.eq(uid))
            .one(&self.db)
            .await
            .context("Failed to get receiver")?;

        let receiver = match receiver {
            Some(receiver) => receiver,
            None => return Ok(false),
        };

        let mut model = receiver.into_active_model();
        model.active = Set(active);
        model.updated_at = Set(Local::now().naive_local());
        model
            .update(&self.db)
            .await
            .context("Failed to update receiver")?;
        Ok(true)
    }

    pub async fn delete_receiver(&self, id: i32, uid: i64) -> Result<()> {
        notify_receivers::Entity::delete_many()
            .filter(notify_receivers::Column::Id.eq(id))
            .filter(notify_receivers::Column::Uid.eq(uid))
            .exec(&self.db)
            .await
            .context("Failed to delete receiver")?;
        Ok(())
    }

    // ==================== Notify history ====================

    /// Append one history row per notification event
    pub async fn add_history(
        &self,
        subject_id: &str,
        notify_type: NotifyType,
        content: Option<String>,
        uid: i64,
    ) -> Result<notify_history::Model> {
        let record = notify_history::ActiveModel {
            subject_id: Set(subject_id.to_string()),
            notify_type: Set(notify_type),
            content: Set(content),
            uid: Set(uid),
            created_at: Set(Local::now().naive_local()),
            ..Default::default()
        };

        record
            .insert(&self.db)
            .await
            .context("Failed to record notify history")
    }

    pub async fn list_history(
        &self,
        uid: i64,
        page: Option<u64>,
        size: Option<u64>,
    ) -> Result<(Vec<notify_history::Model>, u64)> {
        let (page, size) = page_bounds(page, size);

        let find = notify_history::Entity::find().filter(notify_history::Column::Uid.eq(uid));
        let total = find
            .clone()
            .count(&self.db)
            .await
            .context("Failed to count notify history")?;
        let rows = find
            .order_by_desc(notify_history::Column::Id)
            .offset((page - 1) * size)
            .limit(size)
            .all(&self.db)
            .await
            .context("Failed to list notify history")?;

        Ok((rows, total))
    }

    // ==================== Statistics ====================

    pub async fn count_all_authors(&self) -> Result<u64> {
        authors::Entity::find()
            .count(&self.db)
            .await
            .context("Failed to count all authors")
    }

    pub async fn count_active_authors(&self) -> Result<u64> {
        authors::Entity::find()
            .filter(authors::Column::Status.eq(true))
            .count(&self.db)
            .await
            .context("Failed to count active authors")
    }

    pub async fn count_all_questions(&self) -> Result<u64> {
        questions::Entity::find()
            .count(&self.db)
            .await
            .context("Failed to count all questions")
    }

    pub async fn count_active_questions(&self) -> Result<u64> {
        questions::Entity::find()
            .filter(questions::Column::Status.eq(true))
            .count(&self.db)
            .await
            .context("Failed to count active questions")
    }

    pub async fn count_all_receivers(&self) -> Result<u64> {
        notify_receivers::Entity::find()
            .count(&self.db)
            .await
            .context("Failed to count all receivers")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::setup_repo;

    fn publisher(author_id: &str, name: &str) -> NewAuthor {
        NewAuthor {
            author_id: author_id.to_string(),
            author_type: AuthorType::Publisher,
            author_name: Some(name.to_string()),
            avatar_url: None,
            is_org: false,
        }
    }

    fn link(question_id: &str, stream: StreamType) -> NewAuthorQuestion {
        NewAuthorQuestion {
            question_id: question_id.to_string(),
            title: Some("title".to_string()),
            description: None,
            author_name: None,
            question_created: 1_700_000_000,
            question_updated: 1_700_000_000,
            kind: QuestionKind::Normal,
            stream,
        }
    }

    #[tokio::test]
    async fn test_create_author_assigns_increasing_weight() {
        let repo = setup_repo().await.unwrap();

        let first = repo.create_author(publisher("alice", "Alice"), 1).await.unwrap();
        let second = repo.create_author(publisher("bob", "Bob"), 1).await.unwrap();

        assert_eq!(first.weight, 1);
        assert_eq!(second.weight, 2);
        assert!(!first.status);

        // Weight is scoped per owner
        let other = repo.create_author(publisher("carol", "Carol"), 2).await.unwrap();
        assert_eq!(other.weight, 1);
    }

    #[tokio::test]
    async fn test_get_author_fails_closed_across_owners() {
        let repo = setup_repo().await.unwrap();

        let author = repo.create_author(publisher("alice", "Alice"), 1).await.unwrap();

        assert!(repo.get_author(author.id, 1).await.unwrap().is_some());
        assert!(repo.get_author(author.id, 2).await.unwrap().is_none());

        // Cross-owner update behaves as not-found
        let patch = AuthorPatch {
            author_name: Some("Mallory".to_string()),
            ..Default::default()
        };
        assert!(repo.update_author(author.id, patch, 2).await.unwrap().is_none());
        let unchanged = repo.get_author(author.id, 1).await.unwrap().unwrap();
        assert_eq!(unchanged.author_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_list_authors_search_filter_and_pages() {
        let repo = setup_repo().await.unwrap();

        repo.create_author(publisher("alice", "Alice"), 1).await.unwrap();
        repo.create_author(publisher("bob", "Bob"), 1).await.unwrap();
        repo.create_author(
            NewAuthor {
                author_id: "carol".to_string(),
                author_type: AuthorType::Answer,
                author_name: Some("Carol".to_string()),
                avatar_url: None,
                is_org: false,
            },
            1,
        )
        .await
        .unwrap();

        // Newest weight first
        let (all, total) = repo.list_authors(1, &AuthorQuery::default()).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(all[0].author_id, "carol");

        let (found, total) = repo
            .list_authors(
                1,
                &AuthorQuery {
                    search: Some("ali".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].author_id, "alice");

        let (answers, _) = repo
            .list_authors(
                1,
                &AuthorQuery {
                    author_type: Some(AuthorType::Answer),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(answers.len(), 1);

        let (page2, total) = repo
            .list_authors(
                1,
                &AuthorQuery {
                    page: Some(2),
                    size: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(page2.len(), 1);
    }

    #[tokio::test]
    async fn test_update_author_touches_only_patched_fields() {
        let repo = setup_repo().await.unwrap();

        let author = repo.create_author(publisher("alice", "Alice"), 1).await.unwrap();
        let updated = repo
            .update_author(
                author.id,
                AuthorPatch {
                    author_name: Some("Alice Z".to_string()),
                    ..Default::default()
                },
                1,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.author_name.as_deref(), Some("Alice Z"));
        assert_eq!(updated.author_id, "alice");
        assert_eq!(updated.author_type, AuthorType::Publisher);
    }

    #[tokio::test]
    async fn test_author_question_insert_is_idempotent() {
        let repo = setup_repo().await.unwrap();

        let author = repo.create_author(publisher("alice", "Alice"), 1).await.unwrap();

        assert!(!repo
            .author_question_exists("q1", author.id, 1, StreamType::Publish)
            .await
            .unwrap());

        repo.add_author_question(link("q1", StreamType::Publish), author.id, 1)
            .await
            .unwrap();
        // Second insert of the same key is swallowed by the unique index
        repo.add_author_question(link("q1", StreamType::Publish), author.id, 1)
            .await
            .unwrap();

        assert!(repo
            .author_question_exists("q1", author.id, 1, StreamType::Publish)
            .await
            .unwrap());
        let records = repo.list_author_questions(author.id, 1).await.unwrap();
        assert_eq!(records.len(), 1);

        // Same question on a different stream is a separate discovery
        repo.add_author_question(link("q1", StreamType::Follow), author.id, 1)
            .await
            .unwrap();
        let records = repo.list_author_questions(author.id, 1).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_author_removes_question_records() {
        let repo = setup_repo().await.unwrap();

        let author = repo.create_author(publisher("alice", "Alice"), 1).await.unwrap();
        repo.add_author_question(link("q1", StreamType::Publish), author.id, 1)
            .await
            .unwrap();

        repo.delete_author(author.id, 1).await.unwrap();

        assert!(repo.get_author(author.id, 1).await.unwrap().is_none());
        let records = repo.list_author_questions(author.id, 1).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_delete_author_question_fails_closed_across_owners() {
        let repo = setup_repo().await.unwrap();

        let author = repo.create_author(publisher("alice", "Alice"), 1).await.unwrap();
        repo.add_author_question(link("q1", StreamType::Publish), author.id, 1)
            .await
            .unwrap();
        let record_id = repo.list_author_questions(author.id, 1).await.unwrap()[0].id;

        // Cross-owner delete is a no-op
        repo.delete_author_question(record_id, 2).await.unwrap();
        assert_eq!(repo.list_author_questions(author.id, 1).await.unwrap().len(), 1);

        repo.delete_author_question(record_id, 1).await.unwrap();
        assert!(repo.list_author_questions(author.id, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_receiver_fails_closed_across_owners() {
        let repo = setup_repo().await.unwrap();

        let receiver = repo
            .create_receiver("a@example.com".to_string(), None, 1)
            .await
            .unwrap();

        repo.delete_receiver(receiver.id, 2).await.unwrap();
        assert_eq!(repo.list_receivers(1).await.unwrap().len(), 1);

        repo.delete_receiver(receiver.id, 1).await.unwrap();
        assert!(repo.list_receivers(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_question_notified_stops_the_watch() {
        let repo = setup_repo().await.unwrap();

        let question = repo
            .create_question(
                NewQuestion {
                    question_id: "8888".to_string(),
                    title: Some("红包问题".to_string()),
                    ..Default::default()
                },
                1,
            )
            .await
            .unwrap();
        assert_eq!(question.question_amount, 0);
        assert!(!question.notify_status);

        repo.set_question_status(question.id, 1, true).await.unwrap();

        let done = repo
            .mark_question_notified(question.id, 1, 100, 5)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.question_amount, 100);
        assert_eq!(done.question_red_count, 5);
        assert!(done.notify_status);
        assert!(!done.status);
    }

    #[tokio::test]
    async fn test_active_receivers_skips_disabled() {
        let repo = setup_repo().await.unwrap();

        let kept = repo
            .create_receiver("a@example.com".to_string(), None, 1)
            .await
            .unwrap();
        let disabled = repo
            .create_receiver("b@example.com".to_string(), Some("备用".to_string()), 1)
            .await
            .unwrap();
        repo.create_receiver("other@example.com".to_string(), None, 2)
            .await
            .unwrap();

        repo.set_receiver_active(disabled.id, 1, false).await.unwrap();

        let active = repo.active_receivers(1).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, kept.id);

        let all = repo.list_receivers(1).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_history_lists_newest_first() {
        let repo = setup_repo().await.unwrap();

        repo.add_history("q1", NotifyType::Publish, Some("first".to_string()), 1)
            .await
            .unwrap();
        repo.add_history("q2", NotifyType::Question, Some("second".to_string()), 1)
            .await
            .unwrap();
        repo.add_history("q3", NotifyType::Answer, None, 2)
            .await
            .unwrap();

        let (rows, total) = repo.list_history(1, None, None).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows[0].subject_id, "q2");
        assert_eq!(rows[0].notify_type, NotifyType::Question);
        assert_eq!(rows[1].subject_id, "q1");
    }

    #[tokio::test]
    async fn test_active_entity_listings_for_restore() {
        let repo = setup_repo().await.unwrap();

        let author = repo.create_author(publisher("alice", "Alice"), 1).await.unwrap();
        repo.create_author(publisher("bob", "Bob"), 2).await.unwrap();
        let question = repo
            .create_question(
                NewQuestion {
                    question_id: "8888".to_string(),
                    title: None,
                    ..Default::default()
                },
                2,
            )
            .await
            .unwrap();

        repo.set_author_status(author.id, 1, true).await.unwrap();
        repo.set_question_status(question.id, 2, true).await.unwrap();

        let active_authors = repo.list_active_authors().await.unwrap();
        assert_eq!(active_authors.len(), 1);
        assert_eq!(active_authors[0].author_id, "alice");

        let active_questions = repo.list_active_questions().await.unwrap();
        assert_eq!(active_questions.len(), 1);
        assert_eq!(active_questions[0].uid, 2);

        assert_eq!(repo.count_all_authors().await.unwrap(), 2);
        assert_eq!(repo.count_active_authors().await.unwrap(), 1);
        assert_eq!(repo.count_active_questions().await.unwrap(), 1);
    }
}
