//! Author activity watches.
//!
//! One recurring cron job per tracked author. Each tick re-reads the author
//! row, pulls the activity page, records newly discovered questions per
//! stream and mails the receivers when a commercial one shows up. The job
//! runs until the watch is toggled off, fetch failures only skip the tick.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_cron_scheduler::Job;
use tracing::{error, info, warn};

use crate::config::SchedulerConfig;
use crate::db::entities::authors;
use crate::db::repo::{AuthorPatch, AuthorQuery, NewAuthor, NewAuthorQuestion, Repo};
use crate::db::types::{AuthorType, StreamType};
use crate::error::{AppError, AppResult};
use crate::notify::{author_question_body, Notifier};
use crate::scheduler::registry::JobRegistry;
use crate::source::RemoteSource;

/// 任务键：`{author_id}-{author_type}-{内部 id}`，改 id 或类型后键会变
pub fn author_job_key(author: &authors::Model) -> String {
    format!("{}-{}-{}", author.author_id, author.author_type, author.id)
}

/// 新增作者监控的输入
#[derive(Debug, Clone)]
pub struct CreateAuthor {
    pub author_id: String,
    pub author_type: AuthorType,
    pub is_org: bool,
}

pub struct AuthorWatch {
    repo: Arc<Repo>,
    source: Arc<dyn RemoteSource>,
    notifier: Arc<Notifier>,
    registry: Arc<JobRegistry>,
    crons: SchedulerConfig,
}

impl AuthorWatch {
    pub fn new(
        repo: Arc<Repo>,
        source: Arc<dyn RemoteSource>,
        notifier: Arc<Notifier>,
        registry: Arc<JobRegistry>,
        crons: SchedulerConfig,
    ) -> Self {
        Self {
            repo,
            source,
            notifier,
            registry,
            crons,
        }
    }

    /// 建档时顺手刷一遍主页资料，拿到昵称和头像
    pub async fn create(&self, data: CreateAuthor, uid: i64) -> AppResult<authors::Model> {
        let profile = self
            .source
            .user_profile(&data.author_id, data.is_org)
            .await?;

        let author = self
            .repo
            .create_author(
                NewAuthor {
                    author_id: data.author_id,
                    author_type: data.author_type,
                    author_name: Some(profile.name),
                    avatar_url: Some(profile.avatar_url),
                    is_org: data.is_org,
                },
                uid,
            )
            .await?;
        info!("➕ Author {} created", author_job_key(&author));
        Ok(author)
    }

    pub async fn get(&self, id: i32, uid: i64) -> AppResult<authors::Model> {
        self.repo
            .get_author(id, uid)
            .await?
            .ok_or_else(|| AppError::not_found(format!("author {}", id)))
    }

    pub async fn list(
        &self,
        uid: i64,
        query: &AuthorQuery,
    ) -> AppResult<(Vec<authors::Model>, u64)> {
        Ok(self.repo.list_authors(uid, query).await?)
    }

    /// Identity fields feed the job key, so an edit that touches them stops
    /// the old-keyed job before persisting and restarts under the new key
    /// when the watch was active.
    pub async fn update(
        &self,
        id: i32,
        patch: AuthorPatch,
        uid: i64,
    ) -> AppResult<authors::Model> {
        let current = self.get(id, uid).await?;

        let identity_changed = patch
            .author_id
            .as_ref()
            .is_some_and(|v| *v != current.author_id)
            || patch
                .author_type
                .is_some_and(|t| t != current.author_type);

        if identity_changed {
            self.registry.remove(&author_job_key(&current)).await?;
        }

        let updated = self
            .repo
            .update_author(id, patch, uid)
            .await?
            .ok_or_else(|| AppError::not_found(format!("author {}", id)))?;

        if identity_changed && current.status {
            self.start_watch(&updated).await?;
        }
        Ok(updated)
    }

    /// 删行之前先摘掉定时任务，免得 tick 指着一条已经不存在的记录
    pub async fn delete(&self, id: i32, uid: i64) -> AppResult<()> {
        let author = self.get(id, uid).await?;
        self.registry.remove(&author_job_key(&author)).await?;
        self.repo.delete_author(id, uid).await?;
        info!("➖ Author {} deleted", author_job_key(&author));
        Ok(())
    }

    /// Flip the watch on or off; returns the new status. The `status`
    /// column mirrors registry membership on every transition.
    pub async fn toggle_schedule(&self, id: i32, uid: i64) -> AppResult<bool> {
        let author = self.get(id, uid).await?;
        let key = author_job_key(&author);

        if author.status {
            self.registry.remove(&key).await?;
            self.repo.set_author_status(id, uid, false).await?;
            Ok(false)
        } else {
            self.start_watch(&author).await?;
            self.repo.set_author_status(id, uid, true).await?;
            Ok(true)
        }
    }

    /// Register the cron job for `author`. Publisher and answer watches run
    /// on separate offsets so the two kinds never hit the site together.
    pub async fn start_watch(&self, author: &authors::Model) -> AppResult<()> {
        let key = author_job_key(author);
        let cron = match author.author_type {
            AuthorType::Publisher => self.crons.publisher_cron.clone(),
            AuthorType::Answer => self.crons.answer_cron.clone(),
        };

        let repo = Arc::clone(&self.repo);
        let source = Arc::clone(&self.source);
        let notifier = Arc::clone(&self.notifier);
        let job_key = key.clone();
        let (id, uid) = (author.id, author.uid);

        let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
            let repo = Arc::clone(&repo);
            let source = Arc::clone(&source);
            let notifier = Arc::clone(&notifier);
            let job_key = job_key.clone();
            Box::pin(async move {
                // 失败只记日志，任务留着，下个周期自动重试
                if let Err(e) = author_tick(&repo, source.as_ref(), &notifier, id, uid).await {
                    error!("Author watch {} tick failed: {:#}", job_key, e);
                }
            })
        })
        .with_context(|| format!("Failed to build author watch job {}", key))?;

        self.registry.add(&key, job).await?;
        Ok(())
    }

    /// 进程重启后按库里的 status 把任务拉起来，单条失败不拦着别人
    pub async fn restore_active(&self) -> AppResult<usize> {
        let authors = self.repo.list_active_authors().await?;
        let mut restored = 0;
        for author in &authors {
            match self.start_watch(author).await {
                Ok(()) => restored += 1,
                Err(e) => error!(
                    "Failed to restore author watch {}: {}",
                    author_job_key(author),
                    e
                ),
            }
        }
        Ok(restored)
    }
}

/// One firing of an author watch.
///
/// Re-reads the row first (the author may have been edited or deleted since
/// the job was scheduled), partitions the activity into the streams this
/// author type cares about, fetches every candidate's detail up front, then
/// records the new ones. Any fetch error makes the whole tick a no-change.
pub(crate) async fn author_tick(
    repo: &Repo,
    source: &dyn RemoteSource,
    notifier: &Notifier,
    id: i32,
    uid: i64,
) -> Result<()> {
    let author = match repo.get_author(id, uid).await? {
        Some(author) => author,
        None => {
            warn!("Author {} is gone, skipping tick", id);
            return Ok(());
        }
    };

    let activity = source
        .author_activity(&author.author_id, author.is_org)
        .await
        .with_context(|| format!("Failed to fetch activity of {}", author.author_id))?;

    // 发布号只看发布流，回答号看关注和回答两条流
    let streams = match author.author_type {
        AuthorType::Publisher => vec![(StreamType::Publish, activity.published)],
        AuthorType::Answer => vec![
            (StreamType::Follow, activity.followed),
            (StreamType::Answer, activity.answered),
        ],
    };

    let mut candidates = Vec::new();
    for (stream, summaries) in streams {
        for summary in summaries {
            let detail = source
                .question_detail(&summary.id)
                .await
                .with_context(|| format!("Failed to fetch question {}", summary.id))?;
            candidates.push((stream, detail));
        }
    }

    let author_name = author
        .author_name
        .clone()
        .unwrap_or_else(|| author.author_id.clone());

    for (stream, detail) in candidates {
        if repo
            .author_question_exists(&detail.id, author.id, uid, stream)
            .await?
        {
            continue;
        }

        repo.add_author_question(
            NewAuthorQuestion {
                question_id: detail.id.clone(),
                title: Some(detail.title.clone()),
                description: Some(detail.description.clone()),
                author_name: Some(detail.author_name.clone()),
                question_created: detail.created,
                question_updated: detail.updated,
                kind: detail.kind.into(),
                stream,
            },
            author.id,
            uid,
        )
        .await?;
        info!(
            "🆕 Author {} {} question {} ({})",
            author.author_id, stream, detail.id, detail.title
        );

        if detail.kind.is_commercial() {
            let body = author_question_body(stream, &author_name, &detail.title, &detail.id);
            notifier.notify(uid, stream.into(), &detail.id, &body).await?;
        }
    }

    Ok(())
}
