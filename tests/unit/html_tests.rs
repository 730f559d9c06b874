/*!
 * Tests for markup tokenization and tag-preserving translation
 */

use rand::Rng;
use std::sync::Arc;

use locsync::providers::mock::MockBackend;
use locsync::sync::RunContext;
use locsync::translation::html::{has_translatable_text, tokenize, Token};

use crate::common::service;

/// Concatenating the tokens must give back the input, whatever its shape
#[test]
fn test_tokenize_withArbitraryStrings_shouldRoundTrip() {
    let samples = [
        "",
        "plain text",
        "<p>Hello <b>bold</b> world</p>",
        "a < b and c > d",
        "<<nested>>",
        "unterminated <span",
        "<br/>\u{200B}<img src=\"x\">",
        "  <em> spaced </em>  ",
        "ümlaut <i>ñ</i> 漢字",
    ];
    for sample in samples {
        let joined: String = tokenize(sample).iter().map(|t| t.as_str()).collect();
        assert_eq!(joined, sample);
    }
}

#[test]
fn test_tokenize_withRandomStrings_shouldRoundTrip() {
    let alphabet = ['<', '>', '/', '"', '=', 'a', 'p', ' ', '\n', '\u{200B}', 'é', '漢'];
    let mut rng = rand::rng();
    for _ in 0..500 {
        let len = rng.random_range(0..40);
        let sample: String = (0..len).map(|_| alphabet[rng.random_range(0..alphabet.len())]).collect();
        let joined: String = tokenize(&sample).iter().map(|t| t.as_str()).collect();
        assert_eq!(joined, sample);
    }
}

#[test]
fn test_tokenize_withTags_shouldAlternate() {
    let tokens = tokenize("<p>Hi</p>");
    assert_eq!(tokens, vec![Token::Tag("<p>"), Token::Text("Hi"), Token::Tag("</p>")]);
}

#[test]
fn test_hasTranslatableText_withOnlyTagsAndInvisibles_shouldBeFalse() {
    assert!(!has_translatable_text("<br/><img src=\"a.png\">"));
    assert!(!has_translatable_text("<p>\u{200B}\u{FEFF}</p>"));
    assert!(!has_translatable_text("<p>   </p>"));
    assert!(has_translatable_text("<p>x</p>"));
}

/// Tag-only input goes through unchanged and never reaches the backend
#[tokio::test]
async fn test_translate_withTagOnlyInput_shouldBeIdentity() {
    let backend = Arc::new(MockBackend::working());
    let service = service(backend.clone());
    let ctx = RunContext::new();
    let translator = service.for_locale("en", "fr", &ctx);

    let input = "<div><br/>\u{200B}</div>";
    assert_eq!(translator.translate(input).await.unwrap(), input);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_translate_withMarkup_shouldKeepTagsAndSpacing() {
    let backend = Arc::new(MockBackend::working());
    let service = service(backend.clone());
    let ctx = RunContext::new();
    let translator = service.for_locale("en", "de", &ctx);

    let translated = translator.translate("<p> Hello <a href=\"/x\">link</a></p>").await.unwrap();
    assert_eq!(translated, "<p> [de] Hello <a href=\"/x\">[de] link</a></p>");

    let texts: Vec<String> = backend.calls().into_iter().map(|c| c.text).collect();
    assert!(texts.contains(&"Hello".to_string()));
    assert!(texts.contains(&"link".to_string()));
}
