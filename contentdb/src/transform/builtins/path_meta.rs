use crate::error::Result;
use crate::schema::base::CONTENT_EXTENSIONS;
use crate::transform::{extname, StepOptions, Transform, TransformedContent};
use async_trait::async_trait;
use heck::ToTitleCase;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").unwrap());

const DRAFT_SUFFIX: &str = ".draft";

/// Derives `stem`, `extension`, `draft`, `partial`, `path`, `title` and
/// `locale` from the document id.
///
/// Options (`pathMeta` slice): `locales`, `defaultLocale`, `respectPathCase`.
pub struct PathMeta;

#[async_trait]
impl Transform for PathMeta {
    async fn transform(
        &self,
        mut content: TransformedContent,
        options: &StepOptions,
    ) -> Result<TransformedContent> {
        let locales: Vec<&str> = options
            .get("locales")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let default_locale = options.get("defaultLocale").and_then(Value::as_str);
        let respect_case = options
            .get("respectPathCase")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let id = content.id.clone();
        let ext = extname(&id);
        let stem = &id[..id.len() - ext.len()];

        let mut parts: Vec<&str> = stem.split('/').filter(|p| !p.is_empty()).collect();
        let file_name = parts.last().copied().unwrap_or("");
        let draft = file_name.ends_with(DRAFT_SUFFIX);
        let partial = parts.iter().any(|p| p.starts_with('_'));

        let locale = match parts.first() {
            Some(first) if locales.contains(first) => {
                let locale = first.to_string();
                parts.remove(0);
                Some(locale)
            }
            _ => default_locale.map(str::to_string),
        };

        let mut segments: Vec<String> = parts
            .iter()
            .map(|p| clean_segment(p, respect_case))
            .filter(|s| !s.is_empty())
            .collect();
        if segments.last().map(String::as_str) == Some("index") {
            segments.pop();
        }
        let path = format!("/{}", segments.join("/"));
        let title = parts
            .last()
            .map(|p| strip_decorations(p).to_title_case())
            .unwrap_or_default();

        content.insert("stem", Value::String(stem.to_string()));
        match content_extension(ext) {
            Some(extension) => {
                content.insert("extension", Value::String(extension));
            }
            None => log::debug!("{id} has no content extension, leaving `extension` unset"),
        }
        content.insert("draft", Value::Bool(draft));
        content.insert("partial", Value::Bool(partial));
        content.insert_if_absent("path", Value::String(path));
        if !title.is_empty() {
            content.insert_if_absent("title", Value::String(title));
        }
        if let Some(locale) = locale {
            content.insert("locale", Value::String(locale));
        }
        Ok(content)
    }
}

/// The stored form of a file extension, if it is one of the content
/// extensions. `.markdown` files are recorded as `md`.
fn content_extension(ext: &str) -> Option<String> {
    let ext = ext.trim_start_matches('.').to_lowercase();
    let ext = match ext.as_str() {
        "markdown" => "md".to_string(),
        _ => ext,
    };
    CONTENT_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// A segment without its numeric ordering prefix and draft marker.
fn strip_decorations(segment: &str) -> &str {
    let segment = match NUMERIC_PREFIX.find(segment) {
        Some(m) => &segment[m.end()..],
        None => segment,
    };
    segment.strip_suffix(DRAFT_SUFFIX).unwrap_or(segment)
}

fn clean_segment(segment: &str, respect_case: bool) -> String {
    let segment = strip_decorations(segment);
    if respect_case {
        segment.split_whitespace().collect::<Vec<_>>().join("-")
    } else {
        slug::slugify(segment)
    }
}
