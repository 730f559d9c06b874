/*!
 * Markup-preserving translation.
 *
 * Markup-bearing text is split into alternating tag and text tokens. Only text tokens are
 * sent to the translation backend; tags are copied through untouched, so the translated
 * string always has the tag structure of the source. Markup is not validated: any
 * `<...>` substring is an atomic literal.
 */

use async_trait::async_trait;
use futures::future::try_join_all;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::content::extractor::{is_blank, is_invisible, split_whitespace_edges};
use crate::errors::TranslationError;

/// Anything shaped like a tag
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("valid tag pattern"));

/// A slice of markup-bearing text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A `<...>` literal
    Tag(&'a str),
    /// Text between tags
    Text(&'a str),
}

impl<'a> Token<'a> {
    /// The underlying slice
    pub fn as_str(&self) -> &'a str {
        match self {
            Token::Tag(s) | Token::Text(s) => s,
        }
    }

    /// Whether the token is copied through without translation
    pub fn is_passthrough(&self) -> bool {
        match self {
            Token::Tag(_) => true,
            Token::Text(s) => is_blank(s) || s.chars().all(is_invisible),
        }
    }
}

/// Whether the text contains at least one tag
pub fn is_html_like(text: &str) -> bool {
    TAG_REGEX.is_match(text)
}

/// Split text into tag and text tokens. Concatenating the tokens yields the input exactly.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for tag in TAG_REGEX.find_iter(text) {
        if tag.start() > last {
            tokens.push(Token::Text(&text[last..tag.start()]));
        }
        tokens.push(Token::Tag(tag.as_str()));
        last = tag.end();
    }
    if last < text.len() {
        tokens.push(Token::Text(&text[last..]));
    }
    tokens
}

/// Whether any part of the text would be sent to the backend
pub fn has_translatable_text(text: &str) -> bool {
    tokenize(text).iter().any(|t| !t.is_passthrough())
}

/// Plain-text translation path used for individual text tokens
#[async_trait]
pub trait PlainTextTranslate: Send + Sync {
    /// Translate a trimmed, tag-free string
    async fn translate_plain(&self, text: &str) -> Result<String, TranslationError>;
}

/// Translates text while guaranteeing identical tag structure
pub struct HtmlPreservingTranslator<'a> {
    inner: &'a dyn PlainTextTranslate,
}

impl<'a> HtmlPreservingTranslator<'a> {
    /// Wrap a plain-text translation path
    pub fn new(inner: &'a dyn PlainTextTranslate) -> Self {
        Self { inner }
    }

    /// Translate `text`, treating it as markup when it contains tags
    pub async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        if !is_html_like(text) {
            return self.translate_segment(text).await;
        }

        let tokens = tokenize(text);
        let translated = try_join_all(tokens.iter().map(|token| async move {
            if token.is_passthrough() {
                Ok(token.as_str().to_string())
            } else {
                self.translate_segment(token.as_str()).await
            }
        }))
        .await?;

        Ok(translated.concat())
    }

    async fn translate_segment(&self, segment: &str) -> Result<String, TranslationError> {
        if is_blank(segment) {
            return Ok(segment.to_string());
        }
        let (leading, core, trailing) = split_whitespace_edges(segment);
        let translated = self.inner.translate_plain(core).await?;
        Ok(format!("{}{}{}", leading, translated, trailing))
    }
}
