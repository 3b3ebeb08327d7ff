//! 知乎客户端
//!
//! 主页与问题页直接抓 HTML，再从内嵌的 `js-initialData` 脚本块取 JSON；
//! 红包状态走 brand 活动接口。

use crate::error::{Error, Result};
use crate::models::*;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

const ZHIHU_HOST: &str = "https://www.zhihu.com";

const USER_AGENT_VALUE: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0.0.0 Safari/537.36";

static INITIAL_DATA_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script[^>]*id="js-initialData"[^>]*>(.*?)</script>"#).unwrap()
});

/// 知乎客户端配置
#[derive(Debug, Clone)]
pub struct ZhihuClientConfig {
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for ZhihuClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// 知乎客户端
pub struct ZhihuClient {
    client: reqwest::Client,
}

impl ZhihuClient {
    /// 创建新的客户端
    pub fn new(config: ZhihuClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// 构建请求头
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/json,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        headers
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching: {}", url);

        let response = self
            .client
            .get(url)
            .headers(self.build_headers())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(text)
    }

    /// 抓取页面并解出 js-initialData JSON
    async fn fetch_initial_data(&self, url: &str) -> Result<Value> {
        let html = self.fetch_text(url).await?;
        extract_initial_data(&html)
    }

    fn profile_url(url_token: &str, is_org: bool) -> String {
        let kind = if is_org { "org" } else { "people" };
        format!("{}/{}/{}", ZHIHU_HOST, kind, url_token)
    }

    /// 拉取用户主页资料
    pub async fn user_profile(&self, url_token: &str, is_org: bool) -> Result<UserProfile> {
        let data = self
            .fetch_initial_data(&Self::profile_url(url_token, is_org))
            .await?;
        UserProfile::from_initial_data(&data, url_token)
    }

    /// 拉取作者主页活动（发布 / 关注 / 回答 三路）
    pub async fn author_activity(&self, url_token: &str, is_org: bool) -> Result<AuthorActivity> {
        let data = self
            .fetch_initial_data(&Self::profile_url(url_token, is_org))
            .await?;
        AuthorActivity::from_initial_data(&data, url_token)
    }

    /// 拉取问题详情
    pub async fn question_detail(&self, question_id: &str) -> Result<QuestionDetail> {
        let url = format!("{}/question/{}", ZHIHU_HOST, question_id);
        let data = self.fetch_initial_data(&url).await?;
        QuestionDetail::from_initial_data(&data, question_id)
    }

    /// 查询问题的红包活动状态
    pub async fn red_packet_status(&self, question_id: &str) -> Result<RedPacketStatus> {
        let url = format!(
            "{}/api/v4/brand/questions/{}/activity/red-packet",
            ZHIHU_HOST, question_id
        );
        let text = self.fetch_text(&url).await?;
        let wire: RedPacketWire = serde_json::from_str(&text)?;
        Ok(RedPacketStatus::from(wire))
    }
}

/// 从 HTML 里解出 js-initialData 脚本块的 JSON
fn extract_initial_data(html: &str) -> Result<Value> {
    let captures = INITIAL_DATA_REGEX
        .captures(html)
        .ok_or(Error::InitialDataMissing)?;
    let json = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    Ok(serde_json::from_str(json)?)
}
