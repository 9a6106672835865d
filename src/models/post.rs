// src/models/post.rs

//! Post, comment and attachment records.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::utils::url::is_synthetic_id;

/// One row of a board listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    /// Numeric string, or a synthetic `unknown-` placeholder
    pub id: String,
    pub title: String,
    pub author: String,
    /// `YYYY-MM-DD HH:MM` from the API, raw cell text from markup
    pub date: String,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl PostSummary {
    /// Numeric value of the ID; `None` for synthetic or malformed IDs.
    pub fn numeric_id(&self) -> Option<u64> {
        if is_synthetic_id(&self.id) {
            return None;
        }
        self.id.trim().parse().ok()
    }
}

/// Richer author record from the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterInfo {
    pub nickname: String,
    #[serde(default)]
    pub member_key: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub level_name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_manager: bool,
}

/// A full post with its body, comments and media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub summary: PostSummary,
    pub content: String,
    pub comments: Vec<Comment>,
    pub images: Vec<ImageRef>,
    pub attachments: Vec<AttachmentRef>,
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub has_attachments: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<WriterInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PostDetail {
    /// A detail with the summary's fields and nothing else filled in.
    pub fn from_summary(summary: PostSummary) -> Self {
        let category = summary.menu_name.clone().unwrap_or_default();
        Self {
            summary,
            content: String::new(),
            comments: Vec::new(),
            images: Vec::new(),
            attachments: Vec::new(),
            tags: BTreeSet::new(),
            category,
            has_attachments: false,
            writer: None,
            error: None,
        }
    }

    /// Placeholder for a post whose retrieval failed entirely.
    pub fn failed(summary: PostSummary, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::from_summary(summary)
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn id(&self) -> &str {
        &self.summary.id
    }

    pub fn title(&self) -> &str {
        &self.summary.title
    }

    /// Category, falling back to the board menu name.
    pub fn category_label(&self) -> &str {
        if self.category.is_empty() {
            self.summary.menu_name.as_deref().unwrap_or("")
        } else {
            &self.category
        }
    }
}

/// A comment or reply on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub date: String,
    pub author: String,
    #[serde(default)]
    pub is_reply: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_comment_id: Option<String>,
}

impl Comment {
    /// Top-level comments first by date, then replies grouped by parent and
    /// ordered by date within a group.
    pub fn display_order(a: &Comment, b: &Comment) -> Ordering {
        match (a.is_reply, b.is_reply) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, false) => a.date.cmp(&b.date),
            (true, true) => a
                .ref_comment_id
                .as_deref()
                .unwrap_or("")
                .cmp(b.ref_comment_id.as_deref().unwrap_or(""))
                .then_with(|| a.date.cmp(&b.date)),
        }
    }
}

/// Sort comments into display order in place.
pub fn sort_comments(comments: &mut [Comment]) {
    comments.sort_by(Comment::display_order);
}

/// An image attached to or embedded in a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub file_name: String,
}

/// A downloadable file attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str) -> PostSummary {
        PostSummary {
            id: id.to_string(),
            title: format!("post {id}"),
            author: "writer".to_string(),
            date: "2024-01-01 10:00".to_string(),
            view_count: 3,
            comment_count: 1,
            url: format!("https://cafe.naver.com/ca-fe/cafes/1/articles/{id}"),
            menu_name: Some("자유게시판".to_string()),
            summary: None,
        }
    }

    fn comment(id: &str, date: &str, parent: Option<&str>) -> Comment {
        Comment {
            id: id.to_string(),
            content: format!("comment {id}"),
            date: date.to_string(),
            author: "a".to_string(),
            is_reply: parent.is_some(),
            ref_comment_id: parent.map(str::to_string),
        }
    }

    #[test]
    fn test_numeric_id() {
        assert_eq!(summary("1234").numeric_id(), Some(1234));
        assert_eq!(summary("unknown-1700000000000").numeric_id(), None);
        assert_eq!(summary("abc").numeric_id(), None);
    }

    #[test]
    fn test_failed_detail_keeps_identity() {
        let detail = PostDetail::failed(summary("77"), "both paths failed");
        assert!(detail.is_failed());
        assert_eq!(detail.id(), "77");
        assert_eq!(detail.title(), "post 77");
        assert!(detail.content.is_empty());
        assert!(detail.comments.is_empty());
        assert!(detail.images.is_empty());
        assert!(detail.attachments.is_empty());
        assert!(detail.tags.is_empty());
        assert!(!detail.has_attachments);
    }

    #[test]
    fn test_comment_ordering() {
        let mut comments = vec![
            comment("r2", "2024-01-01 12:00", Some("b")),
            comment("t2", "2024-01-01 11:00", None),
            comment("r1", "2024-01-01 13:00", Some("a")),
            comment("r3", "2024-01-01 09:00", Some("b")),
            comment("t1", "2024-01-01 10:00", None),
        ];
        sort_comments(&mut comments);
        let ids: Vec<_> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "r1", "r3", "r2"]);
    }

    #[test]
    fn test_detail_serializes_flat_camel_case() {
        let mut detail = PostDetail::from_summary(summary("5"));
        detail.has_attachments = true;
        detail.attachments.push(AttachmentRef {
            name: "a.pdf".to_string(),
            url: "https://files/a.pdf".to_string(),
            size: 10,
            kind: "pdf".to_string(),
        });
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["id"], "5");
        assert_eq!(value["viewCount"], 3);
        assert_eq!(value["menuName"], "자유게시판");
        assert_eq!(value["hasAttachments"], true);
        assert_eq!(value["attachments"][0]["type"], "pdf");
        assert!(value.get("error").is_none());
        assert!(value.get("summary").is_none());

        let back: PostDetail = serde_json::from_value(value).unwrap();
        assert_eq!(back, detail);
    }
}
