//! Red-packet question watches.
//!
//! One cron job per tracked question polling the red-packet endpoint. The
//! watch is one-shot: the first tick that sees an active packet with a
//! parsable amount mails the receivers, backfills amount and count on the
//! row and removes its own job. An active packet whose title carries no
//! digit run is not a valid trigger, the watch keeps polling.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_cron_scheduler::Job;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::db::entities::questions;
use crate::db::repo::{NewQuestion, QuestionPatch, QuestionQuery, Repo};
use crate::db::types::NotifyType;
use crate::error::{AppError, AppResult};
use crate::notify::{red_packet_body, Notifier};
use crate::scheduler::registry::JobRegistry;
use crate::source::RemoteSource;

/// 任务键：`{question_id}-question-{内部 id}`
pub fn question_job_key(question: &questions::Model) -> String {
    format!("{}-question-{}", question.question_id, question.id)
}

/// 新增红包监控的输入，标题只在抓不到问题页时兜底
#[derive(Debug, Clone)]
pub struct CreateQuestion {
    pub question_id: String,
    pub title: Option<String>,
}

pub struct QuestionWatch {
    repo: Arc<Repo>,
    source: Arc<dyn RemoteSource>,
    notifier: Arc<Notifier>,
    registry: Arc<JobRegistry>,
    crons: SchedulerConfig,
}

impl QuestionWatch {
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

    /// 建档时抓一次问题页，把标题、描述、提问者和时间戳一并落库。
    /// 页面抓不到就先存个空壳，tick 照常跑。
    pub async fn create(&self, data: CreateQuestion, uid: i64) -> AppResult<questions::Model> {
        let new_question = match self.source.question_detail(&data.question_id).await {
            Ok(detail) => NewQuestion {
                question_id: data.question_id,
                title: Some(detail.title),
                description: Some(detail.description),
                author_id: Some(detail.author_id),
                author_name: Some(detail.author_name),
                question_created: detail.created,
                question_updated: detail.updated,
            },
            Err(e) => {
                warn!(
                    "Failed to fetch question {} on create: {}, storing bare entry",
                    data.question_id, e
                );
                NewQuestion {
                    question_id: data.question_id,
                    title: data.title,
                    ..Default::default()
                }
            }
        };

        let question = self.repo.create_question(new_question, uid).await?;
        info!("➕ Question {} created", question_job_key(&question));
        Ok(question)
    }

    pub async fn get(&self, id: i32, uid: i64) -> AppResult<questions::Model> {
        self.repo
            .get_question(id, uid)
            .await?
            .ok_or_else(|| AppError::not_found(format!("question {}", id)))
    }

    pub async fn list(
        &self,
        uid: i64,
        query: &QuestionQuery,
    ) -> AppResult<(Vec<questions::Model>, u64)> {
        Ok(self.repo.list_questions(uid, query).await?)
    }

    /// A `question_id` edit changes the job key, so the old-keyed job goes
    /// first and the watch restarts under the new key if it was active.
    pub async fn update(
        &self,
        id: i32,
        patch: QuestionPatch,
        uid: i64,
    ) -> AppResult<questions::Model> {
        let current = self.get(id, uid).await?;

        let identity_changed = patch
            .question_id
            .as_ref()
            .is_some_and(|v| *v != current.question_id);

        if identity_changed {
            self.registry.remove(&question_job_key(&current)).await?;
        }

        let updated = self
            .repo
            .update_question(id, patch, uid)
            .await?
            .ok_or_else(|| AppError::not_found(format!("question {}", id)))?;

        if identity_changed && current.status {
            self.start_watch(&updated).await?;
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: i32, uid: i64) -> AppResult<()> {
        let question = self.get(id, uid).await?;
        self.registry.remove(&question_job_key(&question)).await?;
        self.repo.delete_question(id, uid).await?;
        info!("➖ Question {} deleted", question_job_key(&question));
        Ok(())
    }

    pub async fn toggle_schedule(&self, id: i32, uid: i64) -> AppResult<bool> {
        let question = self.get(id, uid).await?;
        let key = question_job_key(&question);

        if question.status {
            self.registry.remove(&key).await?;
            self.repo.set_question_status(id, uid, false).await?;
            Ok(false)
        } else {
            self.start_watch(&question).await?;
            self.repo.set_question_status(id, uid, true).await?;
            Ok(true)
        }
    }

    pub async fn start_watch(&self, question: &questions::Model) -> AppResult<()> {
        let key = question_job_key(question);

        let repo = Arc::clone(&self.repo);
        let source = Arc::clone(&self.source);
        let notifier = Arc::clone(&self.notifier);
        let registry = Arc::clone(&self.registry);
        let job_key = key.clone();
        let (id, uid) = (question.id, question.uid);

        let job = Job::new_async(self.crons.question_cron.as_str(), move |_uuid, _lock| {
            let repo = Arc::clone(&repo);
            let source = Arc::clone(&source);
            let notifier = Arc::clone(&notifier);
            let registry = Arc::clone(&registry);
            let job_key = job_key.clone();
            Box::pin(async move {
                if let Err(e) =
                    question_tick(&repo, source.as_ref(), &notifier, &registry, id, uid).await
                {
                    error!("Question watch {} tick failed: {:#}", job_key, e);
                }
            })
        })
        .with_context(|| format!("Failed to build question watch job {}", key))?;

        self.registry.add(&key, job).await?;
        Ok(())
    }

    pub async fn restore_active(&self) -> AppResult<usize> {
        let questions = self.repo.list_active_questions().await?;
        let mut restored = 0;
        for question in &questions {
            match self.start_watch(question).await {
                Ok(()) => restored += 1,
                Err(e) => error!(
                    "Failed to restore question watch {}: {}",
                    question_job_key(question),
                    e
                ),
            }
        }
        Ok(restored)
    }
}

/// One firing of a red-packet watch. The only tick-side registry mutation
/// in the system is the self-removal at the end of the trigger branch.
pub(crate) async fn question_tick(
    repo: &Repo,
    source: &dyn RemoteSource,
    notifier: &Notifier,
    registry: &JobRegistry,
    id: i32,
    uid: i64,
) -> Result<()> {
    let question = match repo.get_question(id, uid).await? {
        Some(question) => question,
        None => {
            warn!("Question {} is gone, skipping tick", id);
            return Ok(());
        }
    };

    let status = source
        .red_packet_status(&question.question_id)
        .await
        .with_context(|| format!("Failed to fetch red packet of {}", question.question_id))?;

    if !status.is_active {
        debug!("Question {} red packet not active yet", question.question_id);
        return Ok(());
    }

    let Some(amount) = status.amount() else {
        // 标题里抠不出数字就当没开奖，留给下一轮
        warn!(
            "Question {} red packet active but title {:?} has no amount, keep polling",
            question.question_id, status.title
        );
        return Ok(());
    };

    info!(
        "🧧 Question {} red packet active: {} yuan, {} left",
        question.question_id, amount, status.count
    );

    let body = red_packet_body(&status, &question.question_id);
    notifier
        .notify(uid, NotifyType::Question, &question.question_id, &body)
        .await?;

    repo.mark_question_notified(id, uid, amount, status.count)
        .await?;
    registry.remove(&question_job_key(&question)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::setup_repo;
    use crate::notify::mailer::testing::RecordingMailer;
    use crate::source::testing::FakeSource;
    use zhihu_client::RedPacketStatus;

    struct Fixture {
        repo: Arc<Repo>,
        source: Arc<FakeSource>,
        mailer: Arc<RecordingMailer>,
        registry: Arc<JobRegistry>,
        notifier: Arc<Notifier>,
        watch: QuestionWatch,
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(setup_repo().await.unwrap());
        let source = Arc::new(FakeSource::new());
        let mailer = Arc::new(RecordingMailer::new());
        let notifier = Arc::new(Notifier::new(
            Arc::clone(&repo),
            mailer.clone() as Arc<dyn crate::notify::Mailer>,
            "红包问题通知".to_string(),
        ));
        let registry = Arc::new(JobRegistry::new().await.unwrap());
        let watch = QuestionWatch::new(
            Arc::clone(&repo),
            source.clone() as Arc<dyn RemoteSource>,
            Arc::clone(&notifier),
            Arc::clone(&registry),
            SchedulerConfig::default(),
        );
        Fixture {
            repo,
            source,
            mailer,
            registry,
            notifier,
            watch,
        }
    }

    async fn create_q1(fx: &Fixture) -> questions::Model {
        // 不喂 detail，走抓取失败的兜底分支，建出裸条目
        fx.watch
            .create(
                CreateQuestion {
                    question_id: "q1".to_string(),
                    title: Some("标题".to_string()),
                },
                1,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_scrapes_question_page() {
        let fx = fixture().await;
        fx.source.put_detail(
            "q7",
            zhihu_client::QuestionDetail {
                id: "q7".to_string(),
                title: "页面标题".to_string(),
                description: "问题描述".to_string(),
                author_id: "asker".to_string(),
                author_name: "提问者".to_string(),
                created: 1_700_000_000,
                updated: 1_700_000_100,
                kind: zhihu_client::QuestionKind::Normal,
            },
        );

        let question = fx
            .watch
            .create(
                CreateQuestion {
                    question_id: "q7".to_string(),
                    title: None,
                },
                1,
            )
            .await
            .unwrap();

        assert_eq!(question.title.as_deref(), Some("页面标题"));
        assert_eq!(question.description.as_deref(), Some("问题描述"));
        assert_eq!(question.author_id.as_deref(), Some("asker"));
        assert_eq!(question.author_name.as_deref(), Some("提问者"));
        assert_eq!(question.question_created, 1_700_000_000);
        assert_eq!(question.question_updated, 1_700_000_100);
        assert!(!question.status);
    }

    #[tokio::test]
    async fn test_create_falls_back_when_page_fetch_fails() {
        let fx = fixture().await;
        fx.source.set_failing(true);

        let question = fx
            .watch
            .create(
                CreateQuestion {
                    question_id: "q8".to_string(),
                    title: Some("手填标题".to_string()),
                },
                1,
            )
            .await
            .unwrap();

        assert_eq!(question.question_id, "q8");
        assert_eq!(question.title.as_deref(), Some("手填标题"));
        assert!(question.description.is_none());
        assert_eq!(question.question_created, 0);
    }

    #[tokio::test]
    async fn test_toggle_alternates_status_and_membership() {
        let fx = fixture().await;
        let question = create_q1(&fx).await;
        let key = question_job_key(&question);
        assert_eq!(key, format!("q1-question-{}", question.id));

        assert!(fx.watch.toggle_schedule(question.id, 1).await.unwrap());
        assert_eq!(fx.registry.len().await, 1);
        assert!(fx.registry.contains(&key).await);

        assert!(!fx.watch.toggle_schedule(question.id, 1).await.unwrap());
        assert_eq!(fx.registry.len().await, 0);
        assert!(
            !fx.repo
                .get_question(question.id, 1)
                .await
                .unwrap()
                .unwrap()
                .status
        );
    }

    #[tokio::test]
    async fn test_inactive_packet_never_mails_nor_mutates() {
        let fx = fixture().await;
        let question = create_q1(&fx).await;
        fx.watch.toggle_schedule(question.id, 1).await.unwrap();
        fx.source.put_red_packet(
            "q1",
            RedPacketStatus {
                is_active: false,
                ..Default::default()
            },
        );

        question_tick(
            &fx.repo,
            fx.source.as_ref(),
            &fx.notifier,
            &fx.registry,
            question.id,
            1,
        )
        .await
        .unwrap();

        let row = fx.repo.get_question(question.id, 1).await.unwrap().unwrap();
        assert!(!row.notify_status);
        assert!(row.status);
        assert_eq!(fx.mailer.sent_count(), 0);
        assert!(fx.registry.contains(&question_job_key(&question)).await);
    }

    #[tokio::test]
    async fn test_active_packet_triggers_once_and_stops_the_watch() {
        let fx = fixture().await;
        fx.repo
            .create_receiver("a@example.com".to_string(), None, 1)
            .await
            .unwrap();
        fx.repo
            .create_receiver("b@example.com".to_string(), None, 1)
            .await
            .unwrap();
        let question = create_q1(&fx).await;
        fx.watch.toggle_schedule(question.id, 1).await.unwrap();
        fx.source.put_red_packet(
            "q1",
            RedPacketStatus {
                is_active: true,
                title: "100元红包".to_string(),
                content: String::new(),
                count: 5,
            },
        );

        question_tick(
            &fx.repo,
            fx.source.as_ref(),
            &fx.notifier,
            &fx.registry,
            question.id,
            1,
        )
        .await
        .unwrap();

        let row = fx.repo.get_question(question.id, 1).await.unwrap().unwrap();
        assert_eq!(row.question_amount, 100);
        assert_eq!(row.question_red_count, 5);
        assert!(row.notify_status);
        assert!(!row.status);

        assert_eq!(fx.mailer.sent_count(), 2);
        let (history, total) = fx.repo.list_history(1, None, None).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(history[0].notify_type, NotifyType::Question);
        assert_eq!(history[0].subject_id, "q1");

        // One-shot: the job removed itself
        assert!(!fx.registry.contains(&question_job_key(&question)).await);
    }

    #[tokio::test]
    async fn test_active_packet_without_amount_keeps_polling() {
        let fx = fixture().await;
        fx.repo
            .create_receiver("a@example.com".to_string(), None, 1)
            .await
            .unwrap();
        let question = create_q1(&fx).await;
        fx.watch.toggle_schedule(question.id, 1).await.unwrap();
        fx.source.put_red_packet(
            "q1",
            RedPacketStatus {
                is_active: true,
                title: "红包来了".to_string(),
                content: String::new(),
                count: 3,
            },
        );

        question_tick(
            &fx.repo,
            fx.source.as_ref(),
            &fx.notifier,
            &fx.registry,
            question.id,
            1,
        )
        .await
        .unwrap();

        let row = fx.repo.get_question(question.id, 1).await.unwrap().unwrap();
        assert!(!row.notify_status);
        assert!(row.status);
        assert_eq!(fx.mailer.sent_count(), 0);
        assert!(fx.registry.contains(&question_job_key(&question)).await);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_watch_registered() {
        let fx = fixture().await;
        let question = create_q1(&fx).await;
        fx.watch.toggle_schedule(question.id, 1).await.unwrap();
        fx.source.set_failing(true);

        let result = question_tick(
            &fx.repo,
            fx.source.as_ref(),
            &fx.notifier,
            &fx.registry,
            question.id,
            1,
        )
        .await;
        assert!(result.is_err());

        let row = fx.repo.get_question(question.id, 1).await.unwrap().unwrap();
        assert!(row.status);
        assert!(!row.notify_status);
        assert!(fx.registry.contains(&question_job_key(&question)).await);
    }

    #[tokio::test]
    async fn test_delete_removes_job() {
        let fx = fixture().await;
        let question = create_q1(&fx).await;
        fx.watch.toggle_schedule(question.id, 1).await.unwrap();

        fx.watch.delete(question.id, 1).await.unwrap();
        assert!(!fx.registry.contains(&question_job_key(&question)).await);
        assert!(fx.repo.get_question(question.id, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_question_id_update_restarts_under_new_key() {
        let fx = fixture().await;
        let question = create_q1(&fx).await;
        fx.watch.toggle_schedule(question.id, 1).await.unwrap();
        let old_key = question_job_key(&question);

        let patch = QuestionPatch {
            question_id: Some("q2".to_string()),
            ..Default::default()
        };
        let updated = fx.watch.update(question.id, patch, 1).await.unwrap();

        assert!(!fx.registry.contains(&old_key).await);
        assert!(fx.registry.contains(&question_job_key(&updated)).await);
        assert_eq!(fx.registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_restore_active_rebuilds_jobs_from_status() {
        let fx = fixture().await;
        let question = create_q1(&fx).await;
        fx.repo
            .set_question_status(question.id, 1, true)
            .await
            .unwrap();

        let restored = fx.watch.restore_active().await.unwrap();
        assert_eq!(restored, 1);
        assert!(fx.registry.contains(&question_job_key(&question)).await);
    }

    #[tokio::test]
    async fn test_cross_owner_access_fails_closed() {
        let fx = fixture().await;
        let question = create_q1(&fx).await;

        assert!(matches!(
            fx.watch.toggle_schedule(question.id, 99).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            fx.watch.delete(question.id, 99).await,
            Err(AppError::NotFound(_))
        ));
    }
}
