/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Page markup normalisation.
//!
//! Pages arrive as raw markup whose root element carries the page metadata as
//! `data-*` attributes. Only the root start tag is read; the body is kept
//! verbatim for the view tree.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

const ATTR_CONTROLLER: &str = "data-controller";
const ATTR_TYPE: &str = "data-type";
const ATTR_PROPERTIES: &str = "data-properties";
const ATTR_TITLE: &str = "data-title";

pub(crate) const PROPERTY_FULLSCREEN: &str = "fullscreen";

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PageMarkup {
    pub html: String,
    /// Root element attributes in document order, names lowercased.
    pub attributes: Vec<(String, String)>,
    pub controller: Option<String>,
    pub page_type: Option<String>,
    pub properties: Vec<String>,
    pub title: Option<String>,
    pub has_script: bool,
}

impl PageMarkup {
    pub fn parse(raw: &str) -> Self {
        let (attributes, has_script) = scan_markup(raw);

        let lookup = |name: &str| {
            attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let controller = lookup(ATTR_CONTROLLER);
        let page_type = lookup(ATTR_TYPE);
        let title = lookup(ATTR_TITLE);
        let properties = lookup(ATTR_PROPERTIES)
            .map(|raw| split_properties(&raw))
            .unwrap_or_default();

        Self {
            html: raw.to_string(),
            controller,
            page_type,
            properties,
            title,
            has_script,
            attributes,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.attributes
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_fullscreen(&self) -> bool {
        self.properties.iter().any(|p| p == PROPERTY_FULLSCREEN)
    }

    /// Request metadata wins over what the markup declares.
    pub(crate) fn apply_request_metadata(&mut self, page_type: Option<&str>, fullscreen: bool) {
        if let Some(page_type) = page_type {
            self.page_type = Some(page_type.to_string());
        }
        if fullscreen && !self.is_fullscreen() {
            self.properties.push(PROPERTY_FULLSCREEN.to_string());
        }
    }
}

fn split_properties(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collects the first start tag of a page and notes any `<script>` tags.
#[derive(Default)]
struct RootTagSink {
    root: Option<Tag>,
    has_script: bool,
}

impl TokenSink for RootTagSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(tag) = token
            && tag.kind == TagKind::StartTag
        {
            if &*tag.name == "script" {
                self.has_script = true;
            }
            if self.root.is_none() {
                self.root = Some(tag);
            }
        }
        TokenSinkResult::Continue
    }
}

/// Tokenizes `raw` and returns the root tag's attributes, with names
/// lowercased and character references decoded, plus whether a script tag
/// appears anywhere.
fn scan_markup(raw: &str) -> (Vec<(String, String)>, bool) {
    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(raw));
    let mut tokenizer = Tokenizer::new(RootTagSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();

    let sink = tokenizer.sink;
    let attributes = sink
        .root
        .map(|tag| {
            tag.attrs
                .into_iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect()
        })
        .unwrap_or_default();
    (attributes, sink.has_script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_root_page_attributes() {
        let page = PageMarkup::parse(
            r#"<div id="dashboardPage" data-role="page" class="page type-interior"
                 data-controller="dashboard/dashboard" data-title="Dashboard"
                 data-type="dashboard" data-properties="fullscreen, noScroll">
                 <div class="content-primary"></div>
               </div>"#,
        );

        assert_eq!(page.controller.as_deref(), Some("dashboard/dashboard"));
        assert_eq!(page.title.as_deref(), Some("Dashboard"));
        assert_eq!(page.page_type.as_deref(), Some("dashboard"));
        assert_eq!(page.properties, vec!["fullscreen", "noScroll"]);
        assert!(page.is_fullscreen());
        assert_eq!(page.attribute("DATA-ROLE"), Some("page"));
        assert!(!page.has_script);
    }

    #[test]
    fn skips_leading_comments_and_doctype() {
        let page = PageMarkup::parse(
            "<!DOCTYPE html>\n<!-- <div data-controller=\"wrong\"> -->\n<div data-controller='right'></div>",
        );
        assert_eq!(page.controller.as_deref(), Some("right"));
    }

    #[rstest]
    #[case(r#"<div data-controller="a>b"></div>"#, Some("a>b"))]
    #[case(r#"<div data-controller=plain></div>"#, Some("plain"))]
    #[case(r#"<div data-controller="x&amp;y"></div>"#, Some("x&y"))]
    #[case(r#"<div data-controller=""></div>"#, None)]
    #[case("no markup here", None)]
    fn reads_controller_attribute_forms(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(PageMarkup::parse(raw).controller.as_deref(), expected);
    }

    #[rstest]
    #[case(r#"<div data-title="Caf&eacute; &#34;Q&#34; &#x2F;x"></div>"#, "Café \"Q\" /x")]
    #[case(r#"<div data-title='Fish &amp; Chips &lt;HD&gt;'></div>"#, "Fish & Chips <HD>")]
    #[case(r#"<div data-title="&#8212;&nbsp;Live TV"></div>"#, "\u{2014}\u{a0}Live TV")]
    fn decodes_character_references_in_attributes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(PageMarkup::parse(raw).title.as_deref(), Some(expected));
    }

    #[test]
    fn detects_inline_scripts() {
        let page = PageMarkup::parse("<div><SCRIPT>init()</SCRIPT></div>");
        assert!(page.has_script);
    }

    #[test]
    fn request_metadata_overrides_markup() {
        let mut page = PageMarkup::parse(r#"<div data-type="list"></div>"#);
        page.apply_request_metadata(Some("video-osd"), true);
        assert_eq!(page.page_type.as_deref(), Some("video-osd"));
        assert!(page.is_fullscreen());

        page.apply_request_metadata(None, true);
        assert_eq!(page.properties.iter().filter(|p| *p == "fullscreen").count(), 1);
    }

    #[test]
    fn bare_attributes_have_empty_values() {
        let page = PageMarkup::parse("<section hidden data-type=settings>");
        assert_eq!(page.attribute("hidden"), Some(""));
        assert_eq!(page.page_type.as_deref(), Some("settings"));
    }
}
