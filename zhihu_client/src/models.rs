//! 知乎数据模型
//!
//! 域模型由页面内嵌的 initialData JSON 构建，字段名以知乎前端实际返回为准。

use crate::error::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

static DIGIT_RUN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// 问题类型：商业(红包)问题或普通问题
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Commercial,
    Normal,
}

impl QuestionKind {
    fn from_wire(question_type: Option<&str>) -> Self {
        match question_type {
            Some("commercial") => QuestionKind::Commercial,
            _ => QuestionKind::Normal,
        }
    }

    pub fn is_commercial(&self) -> bool {
        matches!(self, QuestionKind::Commercial)
    }
}

/// 用户主页资料
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub url_token: String,
    pub name: String,
    pub avatar_url: String,
}

/// 活动流中出现的问题（仅标识信息，详情需另行抓取）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSummary {
    pub id: String,
    pub title: String,
}

/// 作者主页活动，按来源分成三路：发布 / 关注 / 回答
#[derive(Debug, Clone, Default)]
pub struct AuthorActivity {
    pub published: Vec<QuestionSummary>,
    pub followed: Vec<QuestionSummary>,
    pub answered: Vec<QuestionSummary>,
}

/// 问题详情页数据
#[derive(Debug, Clone)]
pub struct QuestionDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author_id: String,
    pub author_name: String,
    /// 创建时间（unix 秒）
    pub created: i64,
    /// 更新时间（unix 秒）
    pub updated: i64,
    pub kind: QuestionKind,
}

/// 红包活动状态
#[derive(Debug, Clone, Default)]
pub struct RedPacketStatus {
    pub is_active: bool,
    pub title: String,
    pub content: String,
    /// 接口返回的剩余数量（count_down_value）
    pub count: i32,
}

impl RedPacketStatus {
    /// 从红包标题提取金额：取第一段连续数字。
    /// 标题里没有数字（或数字超出 i32）时返回 None，调用方应视为未触发。
    pub fn amount(&self) -> Option<i32> {
        DIGIT_RUN_REGEX
            .find(&self.title)
            .and_then(|m| m.as_str().parse::<i32>().ok())
    }
}

// ==================== Wire types ====================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url_token: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl WireUser {
    /// 命中判断：url_token 或数字 id 任一匹配即认为是同一作者
    fn matches_token(&self, token: &str) -> bool {
        self.url_token.as_deref() == Some(token) || self.id == token
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireQuestion {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub author: Option<WireUser>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub updated_time: i64,
    #[serde(default)]
    pub question_type: Option<String>,
}

/// 问题 id 在不同接口里时而是数字、时而是字符串
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireId {
    Num(u64),
    Str(String),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Num(n) => n.to_string(),
            WireId::Str(s) => s,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireAnswerQuestion {
    pub id: WireId,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireAnswer {
    #[serde(default)]
    pub author: Option<WireUser>,
    #[serde(default)]
    pub question: Option<WireAnswerQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RedPacketWire {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub count_down_value: i32,
}

impl From<RedPacketWire> for RedPacketStatus {
    fn from(wire: RedPacketWire) -> Self {
        RedPacketStatus {
            // count_down_value 为 0 表示活动未开始或已结束
            is_active: wire.count_down_value > 0,
            title: wire.title,
            content: wire.content,
            count: wire.count_down_value,
        }
    }
}

// ==================== initialData extraction ====================

fn entities(initial_data: &Value) -> Result<&Value> {
    initial_data
        .get("initialState")
        .and_then(|s| s.get("entities"))
        .ok_or(Error::InitialDataMissing)
}

impl UserProfile {
    /// 从主页 initialData 取出 `entities.users[token]`
    pub(crate) fn from_initial_data(initial_data: &Value, token: &str) -> Result<UserProfile> {
        let user = entities(initial_data)?
            .get("users")
            .and_then(|u| u.get(token))
            .ok_or_else(|| Error::NotFound(format!("user {}", token)))?;
        let wire: WireUser = serde_json::from_value(user.clone())?;
        Ok(UserProfile {
            url_token: wire.url_token.unwrap_or_else(|| token.to_string()),
            id: wire.id,
            name: wire.name,
            avatar_url: wire.avatar_url,
        })
    }
}

impl AuthorActivity {
    /// 把主页 initialData 的 questions/answers 实体拆成三路活动流。
    ///
    /// - published: 问题作者就是被跟踪作者
    /// - followed: 主页上出现、但不是其发布的问题
    /// - answered: 该作者的回答所挂的问题
    pub(crate) fn from_initial_data(initial_data: &Value, token: &str) -> Result<AuthorActivity> {
        let entities = entities(initial_data)?;
        let mut activity = AuthorActivity::default();

        if let Some(questions) = entities.get("questions").and_then(Value::as_object) {
            for (id, raw) in questions {
                let Ok(question) = serde_json::from_value::<WireQuestion>(raw.clone()) else {
                    continue;
                };
                let summary = QuestionSummary {
                    id: id.clone(),
                    title: question.title.clone(),
                };
                let authored = question
                    .author
                    .as_ref()
                    .is_some_and(|a| a.matches_token(token));
                if authored {
                    activity.published.push(summary);
                } else {
                    activity.followed.push(summary);
                }
            }
        }

        if let Some(answers) = entities.get("answers").and_then(Value::as_object) {
            for raw in answers.values() {
                let Ok(answer) = serde_json::from_value::<WireAnswer>(raw.clone()) else {
                    continue;
                };
                let answered = answer
                    .author
                    .as_ref()
                    .is_some_and(|a| a.matches_token(token));
                if !answered {
                    continue;
                }
                if let Some(question) = answer.question {
                    activity.answered.push(QuestionSummary {
                        id: question.id.into_string(),
                        title: question.title,
                    });
                }
            }
        }

        Ok(activity)
    }
}

impl QuestionDetail {
    /// 从问题详情页 initialData 取出 `entities.questions[id]`
    pub(crate) fn from_initial_data(initial_data: &Value, question_id: &str) -> Result<QuestionDetail> {
        let question = entities(initial_data)?
            .get("questions")
            .and_then(|q| q.get(question_id))
            .ok_or_else(|| Error::NotFound(format!("question {}", question_id)))?;
        let wire: WireQuestion = serde_json::from_value(question.clone())?;

        let (author_id, author_name) = match wire.author {
            Some(author) => {
                let id = author
                    .url_token
                    .filter(|t| !t.is_empty())
                    .unwrap_or(author.id);
                (id, author.name)
            }
            None => (String::new(), String::new()),
        };

        Ok(QuestionDetail {
            id: question_id.to_string(),
            title: wire.title,
            // detail 有时为空，退回 excerpt
            description: wire
                .detail
                .filter(|d| !d.is_empty())
                .or(wire.excerpt)
                .unwrap_or_default(),
            author_id,
            author_name,
            created: wire.created,
            updated: wire.updated_time,
            kind: QuestionKind::from_wire(wire.question_type.as_deref()),
        })
    }
}
