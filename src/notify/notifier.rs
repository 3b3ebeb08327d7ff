use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tracing::{error, info};
use zhihu_client::RedPacketStatus;

use crate::db::repo::Repo;
use crate::db::types::{NotifyType, StreamType};

use super::mailer::Mailer;

/// 作者动态三条流的邮件正文，沿用站内话术
pub fn author_question_body(
    stream: StreamType,
    author_name: &str,
    title: &str,
    question_id: &str,
) -> String {
    let action = match stream {
        StreamType::Publish => "新添加了",
        StreamType::Follow => "新关注了",
        StreamType::Answer => "新回答了",
    };
    format!(
        "【{}】{}一个问题：{}，<a href=\"https://www.zhihu.com/question/{}\" target=\"_blank\">赶快前往去回答吧</a>",
        author_name, action, title, question_id
    )
}

/// 红包开奖正文：接口带了现成文案就直接用，否则按标题拼一份
pub fn red_packet_body(status: &RedPacketStatus, question_id: &str) -> String {
    if !status.content.is_empty() {
        return status.content.clone();
    }
    format!(
        "{}，<a href=\"https://www.zhihu.com/question/{}\" target=\"_blank\">赶快前往去回答吧</a>",
        status.title, question_id
    )
}

/// Fans one event out to every active receiver and records a single
/// history row, receivers succeed or fail independently.
pub struct Notifier {
    repo: Arc<Repo>,
    mailer: Arc<dyn Mailer>,
    subject: String,
}

impl Notifier {
    pub fn new(repo: Arc<Repo>, mailer: Arc<dyn Mailer>, subject: String) -> Self {
        Self {
            repo,
            mailer,
            subject,
        }
    }

    /// 收件人名单每次现查，停用立即生效；一次事件只记一行历史
    pub async fn notify(
        &self,
        uid: i64,
        notify_type: NotifyType,
        subject_id: &str,
        html_body: &str,
    ) -> Result<()> {
        let receivers = self.repo.active_receivers(uid).await?;

        if receivers.is_empty() {
            info!(
                "No active receivers for uid {}, recording history only",
                uid
            );
        } else {
            let mut set = JoinSet::new();
            for receiver in &receivers {
                let mailer = Arc::clone(&self.mailer);
                let to = receiver.email.clone();
                let subject = self.subject.clone();
                let body = html_body.to_string();
                set.spawn(async move {
                    let result = mailer.send(&to, &subject, &body).await;
                    (to, result)
                });
            }

            let mut sent = 0usize;
            let mut failed = 0usize;
            while let Some(joined) = set.join_next().await {
                match joined.context("Mail send task panicked")? {
                    (_, Ok(())) => sent += 1,
                    (to, Err(e)) => {
                        failed += 1;
                        error!("❌ Failed to mail {}: {}", to, e);
                    }
                }
            }
            info!(
                "Notify {} for question {}: {} sent, {} failed",
                notify_type, subject_id, sent, failed
            );
        }

        self.repo
            .add_history(subject_id, notify_type, Some(html_body.to_string()), uid)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::setup_repo;
    use crate::notify::mailer::testing::RecordingMailer;

    async fn notifier_with(
        repo: Arc<Repo>,
        mailer: Arc<RecordingMailer>,
    ) -> Notifier {
        Notifier::new(repo, mailer, "红包问题通知".to_string())
    }

    #[tokio::test]
    async fn test_notify_fans_out_and_records_once() {
        let repo = Arc::new(setup_repo().await.unwrap());
        repo.create_receiver("a@example.com".to_string(), None, 1)
            .await
            .unwrap();
        repo.create_receiver("b@example.com".to_string(), None, 1)
            .await
            .unwrap();
        repo.create_receiver("other@example.com".to_string(), None, 2)
            .await
            .unwrap();
        let disabled = repo
            .create_receiver("off@example.com".to_string(), None, 1)
            .await
            .unwrap();
        repo.set_receiver_active(disabled.id, 1, false).await.unwrap();

        let mailer = Arc::new(RecordingMailer::new());
        let notifier = notifier_with(Arc::clone(&repo), Arc::clone(&mailer)).await;

        notifier
            .notify(1, NotifyType::Publish, "q100", "<b>新问题</b>")
            .await
            .unwrap();

        assert_eq!(mailer.sent_count(), 2);
        let recipients = mailer.sent_to();
        assert!(recipients.contains(&"a@example.com".to_string()));
        assert!(recipients.contains(&"b@example.com".to_string()));
        assert_eq!(mailer.sent.lock().unwrap()[0].subject, "红包问题通知");

        let (rows, total) = repo.list_history(1, None, None).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].subject_id, "q100");
        assert_eq!(rows[0].notify_type, NotifyType::Publish);
        assert_eq!(rows[0].content.as_deref(), Some("<b>新问题</b>"));
    }

    #[tokio::test]
    async fn test_notify_without_receivers_still_records_history() {
        let repo = Arc::new(setup_repo().await.unwrap());
        let mailer = Arc::new(RecordingMailer::new());
        let notifier = notifier_with(Arc::clone(&repo), Arc::clone(&mailer)).await;

        notifier
            .notify(9, NotifyType::Question, "q200", "正文")
            .await
            .unwrap();

        assert_eq!(mailer.sent_count(), 0);
        let (_, total) = repo.list_history(9, None, None).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_notify_survives_single_receiver_failure() {
        let repo = Arc::new(setup_repo().await.unwrap());
        repo.create_receiver("good@example.com".to_string(), None, 1)
            .await
            .unwrap();
        repo.create_receiver("bad@example.com".to_string(), None, 1)
            .await
            .unwrap();

        let mailer = Arc::new(RecordingMailer::new());
        mailer.fail_for("bad@example.com");
        let notifier = notifier_with(Arc::clone(&repo), Arc::clone(&mailer)).await;

        notifier
            .notify(1, NotifyType::Answer, "q300", "正文")
            .await
            .unwrap();

        assert_eq!(mailer.sent_to(), vec!["good@example.com".to_string()]);
        let (_, total) = repo.list_history(1, None, None).await.unwrap();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_author_question_body_wording() {
        let body = author_question_body(StreamType::Publish, "阿狸", "这是标题", "101");
        assert_eq!(
            body,
            "【阿狸】新添加了一个问题：这是标题，<a href=\"https://www.zhihu.com/question/101\" target=\"_blank\">赶快前往去回答吧</a>"
        );

        assert!(author_question_body(StreamType::Follow, "阿狸", "t", "1").contains("新关注了"));
        assert!(author_question_body(StreamType::Answer, "阿狸", "t", "1").contains("新回答了"));
    }

    #[test]
    fn test_red_packet_body_prefers_api_content() {
        let status = RedPacketStatus {
            is_active: true,
            title: "100元红包".to_string(),
            content: "官方开奖文案".to_string(),
            count: 5,
        };
        assert_eq!(red_packet_body(&status, "8888"), "官方开奖文案");

        let bare = RedPacketStatus {
            content: String::new(),
            ..status
        };
        let body = red_packet_body(&bare, "8888");
        assert!(body.contains("100元红包"));
        assert!(body.contains("https://www.zhihu.com/question/8888"));
    }
}
