// src/services/html_detail.rs

//! Post page extraction from markup.

use std::collections::BTreeSet;
use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::models::{Comment, Config, ImageRef, sort_comments};
use crate::parser::{Cascade, FirstStrategy, Strategy, extract_meta_content, parse_selector};
use crate::utils::text::{clean_text, extract_hashtags};
use crate::utils::url::{last_path_segment, resolve_url};

/// What the markup path recovered from a post page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HtmlDetail {
    pub title: Option<String>,
    pub content: String,
    pub images: Vec<ImageRef>,
    pub tags: BTreeSet<String>,
    pub comments: Vec<Comment>,
}

/// The matched post body.
#[derive(Debug, Clone)]
struct Body {
    text: String,
    images: Vec<ImageRef>,
}

struct CommentFields {
    items: Vec<(String, Selector)>,
    author: Cascade<String>,
    date: Cascade<String>,
    content: Cascade<String>,
}

impl CommentFields {
    /// Comments under `scope`, using the first item selector that matches.
    fn parse_items(&self, scope: ElementRef<'_>) -> Option<Vec<Comment>> {
        for (label, selector) in &self.items {
            let items: Vec<ElementRef<'_>> = scope.select(selector).collect();
            if items.is_empty() {
                continue;
            }
            log::debug!("Comment items matched '{}' ({})", label, items.len());
            let comments: Vec<Comment> = items
                .into_iter()
                .enumerate()
                .filter_map(|(index, item)| self.parse_item(index, item))
                .collect();
            return (!comments.is_empty()).then_some(comments);
        }
        None
    }

    fn parse_item(&self, index: usize, item: ElementRef<'_>) -> Option<Comment> {
        let Some(author) = self.author.value(item) else {
            log::debug!("Skipping comment {} without author", index);
            return None;
        };
        let element = item.value();
        let id = element
            .attr("data-comment-id")
            .or_else(|| element.attr("id"))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("html-{index}"));
        let is_reply = element
            .attr("class")
            .is_some_and(|class| class.to_lowercase().contains("reply"));

        Some(Comment {
            id,
            content: self.content.value(item).unwrap_or_default(),
            date: self.date.value(item).unwrap_or_default(),
            author,
            is_reply,
            ref_comment_id: None,
        })
    }
}

/// Looks for comment items anywhere in the scope.
struct LooseComments(Arc<CommentFields>);

impl Strategy<Vec<Comment>> for LooseComments {
    fn label(&self) -> &str {
        "comment items without container"
    }

    fn attempt(&self, scope: ElementRef<'_>) -> Option<Vec<Comment>> {
        self.0.parse_items(scope)
    }
}

/// Compiled selectors for reading a post page.
pub struct HtmlDetailParser {
    frame: Selector,
    title: Cascade<String>,
    body: Cascade<Body>,
    comments: Cascade<Vec<Comment>>,
}

impl HtmlDetailParser {
    /// Compile the configured selectors. An invalid selector is an error.
    pub fn new(config: &Config) -> Result<Self> {
        let selectors = &config.selectors;
        let image_sel = Arc::new(parse_selector("img[src]")?);
        let site_base = config.cafe.site_base.clone();

        let mut body = Cascade::new("post body");
        for selector in &selectors.content {
            let image_sel = Arc::clone(&image_sel);
            let site_base = site_base.clone();
            body = body.then(FirstStrategy::new(selector, move |el| {
                let text = clean_text(&el.text().collect::<String>());
                (!text.is_empty()).then(|| Body {
                    images: body_images(el, &image_sel, &site_base),
                    text,
                })
            })?);
        }

        let fields = Arc::new(CommentFields {
            items: selectors
                .comment_item
                .iter()
                .map(|s| -> Result<(String, Selector)> { Ok((s.clone(), parse_selector(s)?)) })
                .collect::<Result<_>>()?,
            author: Cascade::text("comment author", &selectors.comment_author)?,
            date: Cascade::text("comment date", &selectors.comment_date)?,
            content: Cascade::text("comment content", &selectors.comment_content)?,
        });
        let mut comments = Cascade::new("comments");
        for selector in &selectors.comment_container {
            let fields = Arc::clone(&fields);
            comments = comments.then(FirstStrategy::new(selector, move |container| {
                fields.parse_items(container)
            })?);
        }
        comments = comments.then(LooseComments(fields));

        Ok(Self {
            frame: parse_selector(&selectors.content_frame)?,
            title: Cascade::text("post title", &selectors.title)?,
            body,
            comments,
        })
    }

    /// Source of the embedded content frame, if the page has one.
    pub fn content_frame(&self, markup: &str, site_base: &str) -> Option<String> {
        let document = Html::parse_document(markup);
        document
            .select(&self.frame)
            .find_map(|el| el.value().attr("src"))
            .map(|src| resolve_url(src.trim(), site_base))
            .filter(|src| !src.is_empty())
    }

    /// Extract a post. `None` when no body selector matches.
    ///
    /// The title falls back to the page's `og:title` meta tag.
    pub fn parse(&self, markup: &str) -> Option<HtmlDetail> {
        let document = Html::parse_document(markup);
        let root = document.root_element();

        let body = self.body.run(root)?;
        log::debug!("Post body matched '{}'", body.label);
        let Body { text, images } = body.value;

        let comments = match self.comments.run(root) {
            Some(hit) => {
                let mut comments = hit.value;
                sort_comments(&mut comments);
                comments
            }
            None => Vec::new(),
        };

        let title = self.title.value(root).or_else(|| {
            extract_meta_content(markup, "og:title").filter(|title| !title.is_empty())
        });

        Some(HtmlDetail {
            title,
            tags: extract_hashtags(&text).into_iter().collect(),
            content: text,
            images,
            comments,
        })
    }
}

fn body_images(body: ElementRef<'_>, selector: &Selector, site_base: &str) -> Vec<ImageRef> {
    let mut images: Vec<ImageRef> = Vec::new();
    for img in body.select(selector) {
        let Some(src) = img.value().attr("src").map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        let url = resolve_url(src, site_base);
        let attr_num = |name: &str| {
            img.value()
                .attr(name)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .unwrap_or(0)
        };
        let file_name = last_path_segment(&url)
            .unwrap_or_else(|| format!("image-{}.jpg", images.len() + 1));
        images.push(ImageRef {
            thumbnail_url: url.clone(),
            width: attr_num("width"),
            height: attr_num("height"),
            file_size: 0,
            file_name,
            url,
        });
    }
    images
}
