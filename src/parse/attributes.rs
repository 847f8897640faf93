use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::todo::{AttributeValue, Attributes};

static CLASSIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)(?:\(([^)]+)\))?").unwrap());
static DATAVIEW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^:\]]+)::([^\]]+)\]").unwrap());
static WIKILINK_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(\d{4}-\d{2}-\d{2})\]\]").unwrap());

/// Surface syntax of inline attributes
pub trait AttributeSyntax: Send + Sync + fmt::Debug {
    /// Pattern matching one attribute annotation
    fn pattern(&self) -> &Regex;
    /// Key and value of one match, or `None` when the match is unusable
    fn decode(&self, caps: &Captures<'_>) -> Option<(String, AttributeValue)>;
    fn encode(&self, key: &str, value: &AttributeValue) -> String;
}

/// `@flag` and `@key(value)`
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicSyntax;

impl AttributeSyntax for ClassicSyntax {
    fn pattern(&self) -> &Regex {
        &CLASSIC_RE
    }

    fn decode(&self, caps: &Captures<'_>) -> Option<(String, AttributeValue)> {
        let key = caps.get(1)?.as_str().trim();
        if key.is_empty() {
            return None;
        }
        let value = match caps.get(2) {
            Some(v) => AttributeValue::text(v.as_str().trim()),
            None => AttributeValue::Flag,
        };
        Some((key.to_string(), value))
    }

    fn encode(&self, key: &str, value: &AttributeValue) -> String {
        match value {
            AttributeValue::Flag => format!("@{}", key),
            AttributeValue::Text(v) => format!("@{}({})", key, v),
        }
    }
}

/// `[key:: value]`. Flags have no native form and are written `[key:: true]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataviewSyntax;

impl AttributeSyntax for DataviewSyntax {
    fn pattern(&self) -> &Regex {
        &DATAVIEW_RE
    }

    fn decode(&self, caps: &Captures<'_>) -> Option<(String, AttributeValue)> {
        let key = caps.get(1)?.as_str().trim();
        if key.is_empty() {
            return None;
        }
        let value = caps.get(2)?.as_str().trim();
        let value = if value == "true" {
            AttributeValue::Flag
        } else {
            AttributeValue::text(value)
        };
        Some((key.to_string(), value))
    }

    fn encode(&self, key: &str, value: &AttributeValue) -> String {
        match value {
            AttributeValue::Flag => format!("[{}:: true]", key),
            AttributeValue::Text(v) => format!("[{}:: {}]", key, v),
        }
    }
}

/// Pick the syntax once, from configuration
pub fn syntax_for(use_dataview_syntax: bool) -> Box<dyn AttributeSyntax> {
    if use_dataview_syntax {
        Box::new(DataviewSyntax)
    } else {
        Box::new(ClassicSyntax)
    }
}

/// Task text with its attribute annotations pulled out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributesStructure {
    pub text_without_attributes: String,
    pub attributes: Attributes,
}

/// Extract every attribute from `text` under `syntax`.
///
/// Wikilink dates (`[[2024-03-01]]`) are always stripped from the text; the
/// latest one becomes the `due_attribute` unless that key is already set.
pub fn parse_attributes(
    syntax: &dyn AttributeSyntax,
    due_attribute: &str,
    text: &str,
) -> AttributesStructure {
    let mut remaining = text.to_string();
    let mut attributes = Attributes::new();

    for caps in syntax.pattern().captures_iter(text) {
        let Some((key, value)) = syntax.decode(&caps) else {
            continue;
        };
        attributes.insert(key, value);
        if let Some(whole) = caps.get(0) {
            remaining = remaining.replacen(whole.as_str(), "", 1);
        }
    }

    let wikilinks: Vec<(String, String)> = WIKILINK_DATE_RE
        .captures_iter(&remaining)
        .map(|caps| (caps[0].to_string(), caps[1].to_string()))
        .collect();
    if !attributes.contains_key(due_attribute)
        && let Some(latest) = wikilinks.iter().map(|(_, date)| date).max()
    {
        attributes.insert(due_attribute.to_string(), AttributeValue::text(latest.clone()));
    }
    for (full, _) in &wikilinks {
        remaining = remaining.replacen(full.as_str(), "", 1);
    }

    AttributesStructure {
        text_without_attributes: remaining.trim().to_string(),
        attributes,
    }
}

/// Clean text followed by the serialized attributes, space separated.
pub fn attributes_to_string(syntax: &dyn AttributeSyntax, structure: &AttributesStructure) -> String {
    let encoded: Vec<String> = structure
        .attributes
        .iter()
        .map(|(key, value)| syntax.encode(key, value))
        .collect();
    let text = &structure.text_without_attributes;
    if encoded.is_empty() {
        text.clone()
    } else if text.is_empty() {
        encoded.join(" ")
    } else {
        format!("{} {}", text, encoded.join(" "))
    }
}
