//! Remote site access behind a trait so watch ticks can run against a fake.

use async_trait::async_trait;
use zhihu_client::{AuthorActivity, QuestionDetail, RedPacketStatus, UserProfile, ZhihuClient};

#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// 拉取作者主页资料（头像、昵称）
    async fn user_profile(&self, url_token: &str, is_org: bool)
        -> zhihu_client::Result<UserProfile>;

    /// 拉取作者动态页，按发布/关注/回答分流
    async fn author_activity(
        &self,
        url_token: &str,
        is_org: bool,
    ) -> zhihu_client::Result<AuthorActivity>;

    async fn question_detail(&self, question_id: &str) -> zhihu_client::Result<QuestionDetail>;

    async fn red_packet_status(&self, question_id: &str)
        -> zhihu_client::Result<RedPacketStatus>;
}

#[async_trait]
impl RemoteSource for ZhihuClient {
    async fn user_profile(
        &self,
        url_token: &str,
        is_org: bool,
    ) -> zhihu_client::Result<UserProfile> {
        ZhihuClient::user_profile(self, url_token, is_org).await
    }

    async fn author_activity(
        &self,
        url_token: &str,
        is_org: bool,
    ) -> zhihu_client::Result<AuthorActivity> {
        ZhihuClient::author_activity(self, url_token, is_org).await
    }

    async fn question_detail(&self, question_id: &str) -> zhihu_client::Result<QuestionDetail> {
        ZhihuClient::question_detail(self, question_id).await
    }

    async fn red_packet_status(
        &self,
        question_id: &str,
    ) -> zhihu_client::Result<RedPacketStatus> {
        ZhihuClient::red_packet_status(self, question_id).await
    }
}
