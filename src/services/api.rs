// src/services/api.rs

//! JSON API client for board listings and post details.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{
    AttachmentRef, Comment, Config, ImageRef, ListOptions, PostDetail, PostSummary, WriterInfo,
    sort_comments,
};
use crate::session::Session;
use crate::utils::text::{clean_text, decode_entities, format_timestamp, strip_tags};
use crate::utils::{Pacer, Pause};

/// Attempts per API call; only 5xx responses are retried.
pub const MAX_API_ATTEMPTS: u32 = 2;

pub(crate) const UNKNOWN_AUTHOR: &str = "알 수 없음";
pub(crate) const UNTITLED: &str = "제목 없음";

/// Client for the cafe's private web API.
pub struct CafeApi {
    config: Arc<Config>,
    session: Arc<dyn Session>,
    pacer: Arc<dyn Pacer>,
}

impl CafeApi {
    pub fn new(config: Arc<Config>, session: Arc<dyn Session>, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            config,
            session,
            pacer,
        }
    }

    /// Endpoint of one board page.
    pub fn list_url(&self, options: &ListOptions) -> String {
        format!(
            "{}/cafe-web/cafe-boardlist-api/v1/cafes/{}/menus/{}/articles?page={}&pageSize={}&sortBy={}&viewType=L",
            self.config.cafe.api_base.trim_end_matches('/'),
            self.config.cafe.cafe_id,
            options.menu_id,
            options.page_num,
            options.page_size,
            options.sort_by,
        )
    }

    /// Endpoint of one post.
    pub fn detail_url(&self, article_id: &str) -> String {
        format!(
            "{}/cafe-web/cafe-articleapi/v3/cafes/{}/articles/{}?query=&useCafeId=true&requestFrom=A",
            self.config.cafe.api_base.trim_end_matches('/'),
            self.config.cafe.cafe_id,
            article_id,
        )
    }

    fn list_referer(&self, options: &ListOptions) -> String {
        format!(
            "{}/ca-fe/cafes/{}/menus/{}?page={}",
            self.config.cafe.site_base.trim_end_matches('/'),
            self.config.cafe.cafe_id,
            options.menu_id,
            options.page_num,
        )
    }

    /// Fetch one board page. Entries that fail to convert are skipped.
    pub async fn fetch_list(&self, options: &ListOptions) -> Result<Vec<PostSummary>> {
        let url = self.list_url(options);
        log::debug!("List API request: {}", url);
        let envelope: ListEnvelope = self.get_json(&url, &self.list_referer(options)).await?;
        Ok(convert_list(envelope, &self.config))
    }

    /// Fetch one post and merge it over its summary.
    pub async fn fetch_detail(&self, summary: &PostSummary) -> Result<PostDetail> {
        let url = self.detail_url(&summary.id);
        log::debug!("Detail API request: {}", url);
        let referer = if summary.url.is_empty() {
            self.config.cafe.article_url(&summary.id)
        } else {
            summary.url.clone()
        };
        let envelope: DetailEnvelope = self.get_json(&url, &referer).await?;
        convert_detail(envelope, summary, &self.config)
    }

    /// GET and decode JSON, retrying 5xx responses up to [`MAX_API_ATTEMPTS`].
    async fn get_json<T: DeserializeOwned>(&self, url: &str, referer: &str) -> Result<T> {
        let mut headers = vec![
            (
                "User-Agent".to_string(),
                self.config.crawler.user_agent.clone(),
            ),
            ("Referer".to_string(), referer.to_string()),
            (
                "Accept".to_string(),
                "application/json, text/plain, */*".to_string(),
            ),
        ];
        let cookie = self.session.cookie_header(url)?;
        if !cookie.is_empty() {
            headers.push(("Cookie".to_string(), cookie));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = self.session.get(url, &headers).await;
            self.pacer.pause(Pause::Request).await;

            let response = outcome?;
            if response.is_success() {
                return Ok(serde_json::from_str(&response.body)?);
            }

            let error = AppError::api(url, response.status);
            if error.is_server_error() && attempt < MAX_API_ATTEMPTS {
                log::warn!(
                    "Server error {} from {} (attempt {}/{}), retrying",
                    response.status,
                    url,
                    attempt,
                    MAX_API_ATTEMPTS
                );
                self.pacer.pause(Pause::RetryBackoff).await;
                continue;
            }
            return Err(error);
        }
    }
}

/// An ID the API sends either as a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ApiId {
    Num(i64),
    Str(String),
}

impl ApiId {
    /// String form; `None` for zero or blank IDs.
    fn into_id(self) -> Option<String> {
        match self {
            Self::Num(0) => None,
            Self::Num(n) => Some(n.to_string()),
            Self::Str(s) => {
                let s = s.trim().to_string();
                (!s.is_empty() && s != "0").then_some(s)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    result: Option<ListResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResult {
    #[serde(default)]
    article_list: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    item: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListItem {
    article_id: ApiId,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    writer_info: Option<ApiWriter>,
    #[serde(default)]
    write_date_timestamp: Option<i64>,
    #[serde(default)]
    read_count: Option<u64>,
    #[serde(default)]
    comment_count: Option<u64>,
    #[serde(default)]
    menu_name: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiWriter {
    #[serde(default)]
    nick_name: Option<String>,
    #[serde(default)]
    member_key: Option<String>,
    #[serde(default)]
    member_level: Option<u32>,
    #[serde(default)]
    member_level_name: Option<String>,
    #[serde(default)]
    staff: Option<bool>,
    #[serde(default)]
    manager: Option<bool>,
}

impl ApiWriter {
    fn nickname(&self) -> Option<String> {
        self.nick_name
            .as_deref()
            .map(clean_text)
            .filter(|n| !n.is_empty())
    }

    fn into_info(self) -> WriterInfo {
        WriterInfo {
            nickname: self.nickname().unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            member_key: self.member_key.unwrap_or_default(),
            level: self.member_level.unwrap_or_default(),
            level_name: self.member_level_name.unwrap_or_default(),
            is_staff: self.staff.unwrap_or_default(),
            is_manager: self.manager.unwrap_or_default(),
        }
    }
}

fn convert_list(envelope: ListEnvelope, config: &Config) -> Vec<PostSummary> {
    let entries = envelope.result.map(|r| r.article_list).unwrap_or_default();
    entries
        .into_iter()
        .filter_map(|raw| {
            let entry: ListEntry = serde_json::from_value(raw).ok()?;
            if entry.kind != "ARTICLE" {
                return None;
            }
            let item = entry.item?;
            match convert_list_item(item, config) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    log::warn!("Skipping list entry that failed to convert: {}", e);
                    None
                }
            }
        })
        .collect()
}

fn convert_list_item(item: Value, config: &Config) -> Result<PostSummary> {
    let item: ListItem = serde_json::from_value(item)?;
    let id = item
        .article_id
        .into_id()
        .ok_or_else(|| AppError::validation("list entry has no article id"))?;

    let title = item
        .subject
        .map(|s| clean_text(&decode_entities(&s)))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());
    let author = item
        .writer_info
        .and_then(|w| w.nickname())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    Ok(PostSummary {
        url: config.cafe.article_url(&id),
        id,
        title,
        author,
        date: item.write_date_timestamp.map(format_timestamp).unwrap_or_default(),
        view_count: item.read_count.unwrap_or_default(),
        comment_count: item.comment_count.unwrap_or_default(),
        menu_name: item.menu_name.filter(|m| !m.is_empty()),
        summary: item
            .summary
            .map(|s| clean_text(&decode_entities(&s)))
            .filter(|s| !s.is_empty()),
    })
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    #[serde(default)]
    result: Option<DetailResult>,
}

#[derive(Debug, Deserialize)]
struct DetailResult {
    #[serde(default)]
    article: Option<ApiArticle>,
    #[serde(default)]
    comments: Option<CommentBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct CommentBlock {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    writer_info: Option<ApiWriter>,
    #[serde(default)]
    content_text: Option<String>,
    #[serde(default)]
    content_html: Option<String>,
    #[serde(default)]
    write_date_timestamp: Option<i64>,
    #[serde(default)]
    read_count: Option<u64>,
    #[serde(default)]
    menu_name: Option<String>,
    #[serde(default)]
    attach_image_list: Vec<ApiImage>,
    #[serde(default)]
    tag_list: Vec<ApiTag>,
    #[serde(default)]
    has_file: Option<bool>,
    #[serde(default)]
    attach_file_list: Vec<ApiFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiImage {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiTag {
    Named { name: String },
    Plain(String),
    Other(Value),
}

impl ApiTag {
    fn into_name(self) -> Option<String> {
        let name = match self {
            Self::Named { name } => name,
            Self::Plain(name) => name,
            Self::Other(_) => return None,
        };
        let name = name.trim().to_string();
        (!name.is_empty()).then_some(name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFile {
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    file_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiComment {
    #[serde(default)]
    id: Option<ApiId>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    update_date: Option<i64>,
    #[serde(default)]
    is_ref: Option<bool>,
    #[serde(default)]
    ref_id: Option<ApiId>,
    #[serde(default)]
    writer: Option<ApiCommentWriter>,
}

#[derive(Debug, Deserialize)]
struct ApiCommentWriter {
    #[serde(default)]
    nick: Option<String>,
}

fn convert_detail(
    envelope: DetailEnvelope,
    summary: &PostSummary,
    config: &Config,
) -> Result<PostDetail> {
    let result = envelope
        .result
        .ok_or_else(|| AppError::crawl(format!("article {}", summary.id), "empty API result"))?;
    let article = result.article.ok_or_else(|| {
        AppError::crawl(format!("article {}", summary.id), "API result has no article")
    })?;
    let comments = convert_comments(result.comments.unwrap_or_default().items);

    let content = match (&article.content_text, &article.content_html) {
        (Some(text), _) if !text.trim().is_empty() => clean_text(text),
        (_, Some(html)) => strip_tags(html),
        _ => String::new(),
    };

    let writer = article.writer_info.map(ApiWriter::into_info);
    let mut base = summary.clone();
    if let Some(title) = article
        .subject
        .map(|s| clean_text(&decode_entities(&s)))
        .filter(|s| !s.is_empty())
    {
        base.title = title;
    } else if base.title.is_empty() {
        base.title = UNTITLED.to_string();
    }
    if let Some(writer) = &writer {
        base.author = writer.nickname.clone();
    }
    let date = article
        .write_date_timestamp
        .map(format_timestamp)
        .unwrap_or_default();
    if !date.is_empty() {
        base.date = date;
    }
    if let Some(views) = article.read_count.filter(|v| *v > 0) {
        base.view_count = views;
    }
    if !comments.is_empty() {
        base.comment_count = comments.len() as u64;
    }
    if base.url.is_empty() {
        base.url = config.cafe.article_url(&base.id);
    }
    if article.menu_name.as_deref().is_some_and(|m| !m.is_empty()) {
        base.menu_name = article.menu_name.clone();
    }

    let images = convert_images(article.attach_image_list);
    let tags: BTreeSet<String> = article
        .tag_list
        .into_iter()
        .filter_map(ApiTag::into_name)
        .collect();
    let attachments = article
        .attach_file_list
        .into_iter()
        .filter_map(|file| {
            let url = file.url.filter(|u| !u.is_empty())?;
            Some(AttachmentRef {
                name: file.file_name.unwrap_or_else(|| "알 수 없는 파일".to_string()),
                url,
                size: file.file_size.unwrap_or_default(),
                kind: file.file_type.unwrap_or_default(),
            })
        })
        .collect();

    Ok(PostDetail {
        category: article.menu_name.unwrap_or_default(),
        content,
        comments,
        images,
        attachments,
        tags,
        has_attachments: article.has_file.unwrap_or_default(),
        writer,
        error: None,
        summary: base,
    })
}

fn convert_images(list: Vec<ApiImage>) -> Vec<ImageRef> {
    let mut images = Vec::new();
    for image in list {
        let Some(url) = image.url.filter(|u| !u.is_empty()) else {
            continue;
        };
        images.push(ImageRef {
            thumbnail_url: image.thumbnail_url.unwrap_or_else(|| url.clone()),
            width: image.width.unwrap_or_default(),
            height: image.height.unwrap_or_default(),
            file_size: image.file_size.unwrap_or_default(),
            file_name: image
                .file_name
                .unwrap_or_else(|| format!("image-{}.jpg", images.len() + 1)),
            url,
        });
    }
    images
}

/// Convert raw comment items, skipping the ones that fail, in display order.
fn convert_comments(items: Vec<Value>) -> Vec<Comment> {
    let mut comments: Vec<Comment> = items
        .into_iter()
        .filter_map(|raw| match convert_comment(raw) {
            Ok(comment) => comment,
            Err(e) => {
                log::warn!("Skipping comment: {}", e);
                None
            }
        })
        .collect();
    sort_comments(&mut comments);
    comments
}

/// `Ok(None)` when the comment has no ID; `Err` when it cannot be read.
fn convert_comment(raw: Value) -> Result<Option<Comment>> {
    let item: ApiComment = serde_json::from_value(raw)?;
    let Some(id) = item.id.and_then(ApiId::into_id) else {
        log::warn!("Dropping comment without an ID");
        return Ok(None);
    };
    let writer = item
        .writer
        .ok_or_else(|| AppError::crawl(format!("comment {id}"), "missing writer"))?;

    Ok(Some(Comment {
        content: item.content.unwrap_or_default(),
        date: item.update_date.map(format_timestamp).unwrap_or_default(),
        author: writer.nick.unwrap_or_default(),
        is_reply: item.is_ref.unwrap_or_default(),
        ref_comment_id: item.ref_id.and_then(ApiId::into_id),
        id,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::session::{Cookie, HttpResponse};
    use crate::utils::RecordingPacer;

    /// Replies with queued responses and records requested URLs.
    struct QueueSession {
        responses: Mutex<Vec<HttpResponse>>,
        urls: Mutex<Vec<String>>,
    }

    impl QueueSession {
        fn new(mut responses: Vec<HttpResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Session for QueueSession {
        fn cookies(&self, _url: &str) -> Result<Vec<Cookie>> {
            Ok(vec![Cookie::new("NID_SES", "s")])
        }

        async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
            assert!(headers.iter().any(|(k, v)| k == "Cookie" && v == "NID_SES=s"));
            self.urls.lock().unwrap().push(url.to_string());
            Ok(self.responses.lock().unwrap().pop().unwrap_or(HttpResponse {
                status: 404,
                body: String::new(),
            }))
        }

        async fn navigate(&self, _url: &str) -> Result<String> {
            Ok(String::new())
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
    }

    fn response(status: u16, body: Value) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    fn summary(id: &str) -> PostSummary {
        PostSummary {
            id: id.to_string(),
            title: "목록 제목".to_string(),
            author: "목록 작성자".to_string(),
            date: "2024-01-01 00:00".to_string(),
            view_count: 7,
            comment_count: 2,
            url: String::new(),
            menu_name: None,
            summary: None,
        }
    }

    fn list_body() -> Value {
        json!({
            "result": {
                "articleList": [
                    {"type": "ARTICLE", "item": {
                        "articleId": 300, "subject": "첫 &amp; 글",
                        "writerInfo": {"nickName": "맘1"},
                        "writeDateTimestamp": 1700000000000i64,
                        "readCount": 10, "commentCount": 1, "menuName": "자유"
                    }},
                    {"type": "NOTICE", "item": {"articleId": 1}},
                    {"type": "ARTICLE"},
                    {"type": "ARTICLE", "item": {"articleId": {"bad": true}}},
                    {"type": "ARTICLE", "item": {"articleId": "299"}}
                ]
            }
        })
    }

    #[test]
    fn test_convert_list_filters_and_defaults() {
        let config = Config::default();
        let envelope: ListEnvelope = serde_json::from_value(list_body()).unwrap();
        let posts = convert_list(envelope, &config);

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "300");
        assert_eq!(posts[0].title, "첫 & 글");
        assert_eq!(posts[0].author, "맘1");
        assert_eq!(posts[0].view_count, 10);
        assert_eq!(posts[0].menu_name.as_deref(), Some("자유"));
        assert_eq!(
            posts[0].url,
            "https://cafe.naver.com/ca-fe/cafes/23529966/articles/300"
        );
        assert_eq!(posts[1].id, "299");
        assert_eq!(posts[1].title, UNTITLED);
        assert_eq!(posts[1].author, UNKNOWN_AUTHOR);
        assert_eq!(posts[1].date, "");
    }

    #[test]
    fn test_convert_comments_skips_bad_items_and_sorts() {
        let comments = convert_comments(vec![
            json!({"id": 3, "content": "reply", "updateDate": 1700000300000i64,
                   "isRef": true, "refId": 1, "writer": {"nick": "c"}}),
            json!({"content": "no id", "writer": {"nick": "x"}}),
            json!({"id": 4, "content": "no writer"}),
            json!({"id": 2, "content": "second", "updateDate": 1700000200000i64,
                   "writer": {"nick": "b"}}),
            json!({"id": 1, "content": "first", "updateDate": 1700000100000i64,
                   "isRef": false, "writer": {"nick": "a"}}),
        ]);
        let ids: Vec<_> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(comments[2].is_reply);
        assert_eq!(comments[2].ref_comment_id.as_deref(), Some("1"));
        assert_eq!(comments[0].author, "a");
    }

    #[test]
    fn test_convert_detail_merges_over_summary() {
        let config = Config::default();
        let envelope: DetailEnvelope = serde_json::from_value(json!({
            "result": {
                "article": {
                    "subject": "상세 제목",
                    "writerInfo": {"nickName": "작성자", "memberKey": "k1", "memberLevel": 3,
                                   "memberLevelName": "우수", "staff": false, "manager": true},
                    "contentHtml": "<p>본문&nbsp;입니다</p>",
                    "readCount": 0,
                    "menuName": "질문",
                    "attachImageList": [
                        {"url": "https://img/1.jpg", "width": 10},
                        {"thumbnailUrl": "https://img/skip.jpg"},
                        {"url": "https://img/2.jpg", "fileName": "b.png"}
                    ],
                    "tagList": [{"name": "육아"}, "수면", {"name": ""}, 3],
                    "hasFile": true,
                    "attachFileList": [
                        {"fileName": "a.pdf", "url": "https://f/a.pdf", "fileSize": 5, "fileType": "pdf"},
                        {"fileName": "nourl.pdf"}
                    ]
                },
                "comments": {"items": [
                    {"id": 9, "content": "hi", "writer": {"nick": "n"}}
                ]}
            }
        }))
        .unwrap();

        let detail = convert_detail(envelope, &summary("55"), &config).unwrap();
        assert_eq!(detail.summary.title, "상세 제목");
        assert_eq!(detail.summary.author, "작성자");
        assert_eq!(detail.summary.date, "2024-01-01 00:00");
        assert_eq!(detail.summary.view_count, 7);
        assert_eq!(detail.summary.comment_count, 1);
        assert_eq!(
            detail.summary.url,
            "https://cafe.naver.com/ca-fe/cafes/23529966/articles/55"
        );
        assert_eq!(detail.content, "본문 입니다");
        assert_eq!(detail.category, "질문");
        assert_eq!(detail.images.len(), 2);
        assert_eq!(detail.images[0].thumbnail_url, "https://img/1.jpg");
        assert_eq!(detail.images[0].file_name, "image-1.jpg");
        assert_eq!(detail.images[1].file_name, "b.png");
        assert_eq!(
            detail.tags.iter().cloned().collect::<Vec<_>>(),
            vec!["수면".to_string(), "육아".to_string()]
        );
        assert!(detail.has_attachments);
        assert_eq!(detail.attachments.len(), 1);
        let writer = detail.writer.unwrap();
        assert_eq!(writer.level, 3);
        assert!(writer.is_manager);
    }

    #[test]
    fn test_convert_detail_without_article_is_error() {
        let envelope: DetailEnvelope = serde_json::from_value(json!({"result": {}})).unwrap();
        assert!(convert_detail(envelope, &summary("1"), &Config::default()).is_err());
    }

    fn api(session: Arc<QueueSession>, pacer: Arc<RecordingPacer>) -> CafeApi {
        CafeApi::new(Arc::new(Config::default()), session, pacer)
    }

    #[tokio::test]
    async fn test_server_error_retried_once() {
        let session = Arc::new(QueueSession::new(vec![
            response(503, json!({})),
            response(200, list_body()),
        ]));
        let pacer = Arc::new(RecordingPacer::new());
        let posts = api(session.clone(), pacer.clone())
            .fetch_list(&ListOptions::default())
            .await
            .unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(session.urls.lock().unwrap().len(), 2);
        assert_eq!(pacer.count(Pause::Request), 2);
        assert_eq!(pacer.count(Pause::RetryBackoff), 1);
    }

    #[tokio::test]
    async fn test_retry_is_bounded() {
        let session = Arc::new(QueueSession::new(vec![
            response(500, json!({})),
            response(502, json!({})),
            response(200, list_body()),
        ]));
        let pacer = Arc::new(RecordingPacer::new());
        let err = api(session.clone(), pacer.clone())
            .fetch_list(&ListOptions::default())
            .await
            .unwrap_err();

        assert!(err.is_server_error());
        assert_eq!(session.urls.lock().unwrap().len(), MAX_API_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let session = Arc::new(QueueSession::new(vec![response(403, json!({}))]));
        let pacer = Arc::new(RecordingPacer::new());
        let err = api(session.clone(), pacer.clone())
            .fetch_list(&ListOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Api { status: 403, .. }));
        assert_eq!(session.urls.lock().unwrap().len(), 1);
        assert_eq!(pacer.count(Pause::Request), 1);
        assert_eq!(pacer.count(Pause::RetryBackoff), 0);
    }

    #[test]
    fn test_endpoint_urls() {
        let session = Arc::new(QueueSession::new(Vec::new()));
        let api = api(session, Arc::new(RecordingPacer::new()));
        let options = ListOptions {
            page_num: 2,
            page_size: 20,
            ..ListOptions::default()
        };
        assert_eq!(
            api.list_url(&options),
            "https://apis.naver.com/cafe-web/cafe-boardlist-api/v1/cafes/23529966/menus/0/articles?page=2&pageSize=20&sortBy=TIME&viewType=L"
        );
        assert_eq!(
            api.detail_url("7"),
            "https://apis.naver.com/cafe-web/cafe-articleapi/v3/cafes/23529966/articles/7?query=&useCafeId=true&requestFrom=A"
        );
        assert_eq!(
            api.list_referer(&options),
            "https://cafe.naver.com/ca-fe/cafes/23529966/menus/0?page=2"
        );
    }
}
