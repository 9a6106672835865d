// src/parser/cascade.rs

//! Ordered selector fallbacks.
//!
//! A [`Cascade`] tries its strategies in order against a scope element and
//! keeps the first non-empty result, reporting which strategy produced it.

use std::fmt;

use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};
use crate::utils::text::clean_text;

/// Compile a CSS selector, mapping failures to a configuration error.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// One way of extracting a `T` from a scope.
pub trait Strategy<T>: Send + Sync {
    /// Short label used in logs.
    fn label(&self) -> &str;

    /// `None` when this strategy finds nothing usable.
    fn attempt(&self, scope: ElementRef<'_>) -> Option<T>;
}

/// The winning result of a cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<'c, T> {
    pub value: T,
    pub label: &'c str,
}

/// Strategies tried in order until one succeeds.
pub struct Cascade<T> {
    name: String,
    strategies: Vec<Box<dyn Strategy<T>>>,
}

impl<T> Cascade<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategies: Vec::new(),
        }
    }

    /// Append a strategy with the lowest priority so far.
    pub fn then(mut self, strategy: impl Strategy<T> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Run the strategies in order; the first `Some` wins.
    pub fn run(&self, scope: ElementRef<'_>) -> Option<Hit<'_, T>> {
        for strategy in &self.strategies {
            if let Some(value) = strategy.attempt(scope) {
                log::debug!("{}: matched '{}'", self.name, strategy.label());
                return Some(Hit {
                    value,
                    label: strategy.label(),
                });
            }
        }
        log::debug!("{}: no strategy matched", self.name);
        None
    }

    /// Like [`Cascade::run`], discarding the label.
    pub fn value(&self, scope: ElementRef<'_>) -> Option<T> {
        self.run(scope).map(|hit| hit.value)
    }
}

impl Cascade<String> {
    /// A cascade of [`TextStrategy`] over `selectors`, in order.
    pub fn text(name: impl Into<String>, selectors: &[String]) -> Result<Self> {
        let mut cascade = Self::new(name);
        for selector in selectors {
            cascade = cascade.then(TextStrategy::new(selector)?);
        }
        Ok(cascade)
    }
}

impl<T> fmt::Debug for Cascade<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.strategies.iter().map(|s| s.label()).collect();
        f.debug_struct("Cascade")
            .field("name", &self.name)
            .field("strategies", &labels)
            .finish()
    }
}

/// Cleaned text of the first matching element with non-empty text.
pub struct TextStrategy {
    raw: String,
    selector: Selector,
}

impl TextStrategy {
    pub fn new(selector: &str) -> Result<Self> {
        Ok(Self {
            raw: selector.to_string(),
            selector: parse_selector(selector)?,
        })
    }
}

impl Strategy<String> for TextStrategy {
    fn label(&self) -> &str {
        &self.raw
    }

    fn attempt(&self, scope: ElementRef<'_>) -> Option<String> {
        scope
            .select(&self.selector)
            .map(|el| clean_text(&el.text().collect::<String>()))
            .find(|text| !text.is_empty())
    }
}

type Mapper<T> = Box<dyn Fn(ElementRef<'_>) -> Option<T> + Send + Sync>;

/// Maps every matching element; succeeds when at least one maps to `Some`.
pub struct EachStrategy<T> {
    raw: String,
    selector: Selector,
    map: Mapper<T>,
}

impl<T> EachStrategy<T> {
    pub fn new(
        selector: &str,
        map: impl Fn(ElementRef<'_>) -> Option<T> + Send + Sync + 'static,
    ) -> Result<Self> {
        Ok(Self {
            raw: selector.to_string(),
            selector: parse_selector(selector)?,
            map: Box::new(map),
        })
    }
}

impl<T> Strategy<Vec<T>> for EachStrategy<T> {
    fn label(&self) -> &str {
        &self.raw
    }

    fn attempt(&self, scope: ElementRef<'_>) -> Option<Vec<T>> {
        let items: Vec<T> = scope
            .select(&self.selector)
            .filter_map(|el| (self.map)(el))
            .collect();
        (!items.is_empty()).then_some(items)
    }
}

/// Maps matching elements in order; the first `Some` wins.
pub struct FirstStrategy<T> {
    raw: String,
    selector: Selector,
    map: Mapper<T>,
}

impl<T> FirstStrategy<T> {
    pub fn new(
        selector: &str,
        map: impl Fn(ElementRef<'_>) -> Option<T> + Send + Sync + 'static,
    ) -> Result<Self> {
        Ok(Self {
            raw: selector.to_string(),
            selector: parse_selector(selector)?,
            map: Box::new(map),
        })
    }
}

impl<T> Strategy<T> for FirstStrategy<T> {
    fn label(&self) -> &str {
        &self.raw
    }

    fn attempt(&self, scope: ElementRef<'_>) -> Option<T> {
        scope.select(&self.selector).find_map(|el| (self.map)(el))
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    const DOC: &str = r#"
        <div class="board">
          <p class="empty">   </p>
          <p class="name"> 홍길동 </p>
          <ul><li>a</li><li>b</li><li></li></ul>
        </div>
    "#;

    fn selectors(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("div.class").is_ok());
        assert!(parse_selector("tr:not(.notice)").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_text_cascade_skips_empty_matches() {
        let doc = Html::parse_document(DOC);
        let cascade =
            Cascade::text("author", &selectors(&[".missing", ".empty", ".name"])).unwrap();
        let hit = cascade.run(doc.root_element()).unwrap();
        assert_eq!(hit.value, "홍길동");
        assert_eq!(hit.label, ".name");
    }

    #[test]
    fn test_text_cascade_none_when_nothing_matches() {
        let doc = Html::parse_document(DOC);
        let cascade = Cascade::text("author", &selectors(&[".missing"])).unwrap();
        assert!(cascade.run(doc.root_element()).is_none());
    }

    #[test]
    fn test_invalid_selector_fails_construction() {
        assert!(Cascade::text("bad", &selectors(&[".ok", "[[bad"])).is_err());
    }

    #[test]
    fn test_each_strategy_collects_non_empty() {
        let doc = Html::parse_document(DOC);
        let strategy = EachStrategy::new("li", |el| {
            let text = el.text().collect::<String>();
            (!text.is_empty()).then_some(text)
        })
        .unwrap();
        let cascade = Cascade::new("items")
            .then(EachStrategy::new("li.none", |_| Some(String::new())).unwrap())
            .then(strategy);
        let hit = cascade.run(doc.root_element()).unwrap();
        assert_eq!(hit.value, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(hit.label, "li");
    }

    #[test]
    fn test_first_strategy() {
        let doc = Html::parse_document(DOC);
        let strategy = FirstStrategy::new("li", |el| {
            let text = el.text().collect::<String>();
            (text == "b").then_some(text)
        })
        .unwrap();
        assert_eq!(strategy.attempt(doc.root_element()), Some("b".to_string()));
    }
}
