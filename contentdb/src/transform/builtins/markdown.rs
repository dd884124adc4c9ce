use crate::error::{ContentDbError, Result};
use crate::transform::{Parse, StepOptions, TransformedContent};
use async_trait::async_trait;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

const DEFAULT_TOC_DEPTH: u64 = 2;

/// Parses markdown files: YAML front matter plus a JSON-ready AST in `body`.
///
/// Options (`markdown` slice): `toc.depth` and `toc.searchDepth`, both
/// defaulting to 2.
pub struct MarkdownParser;

/// A node in the markdown AST.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MarkdownNode {
    Element {
        tag: String,
        #[serde(skip_serializing_if = "Map::is_empty")]
        props: Map<String, Value>,
        children: Vec<MarkdownNode>,
    },
    Text {
        value: String,
    },
    /// Inline or block HTML, passed through untouched.
    Raw {
        value: String,
    },
}

impl MarkdownNode {
    fn element(tag: &str) -> Self {
        MarkdownNode::Element {
            tag: tag.to_string(),
            props: Map::new(),
            children: Vec::new(),
        }
    }

    fn with_prop(mut self, key: &str, value: Value) -> Self {
        if let MarkdownNode::Element { props, .. } = &mut self {
            props.insert(key.to_string(), value);
        }
        self
    }

    fn tag(&self) -> Option<&str> {
        match self {
            MarkdownNode::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            MarkdownNode::Text { value } => out.push_str(value),
            MarkdownNode::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
            MarkdownNode::Raw { .. } => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkdownRoot {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub children: Vec<MarkdownNode>,
    pub toc: Toc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toc {
    pub title: String,
    pub depth: u64,
    pub search_depth: u64,
    pub links: Vec<TocLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocLink {
    pub id: String,
    pub text: String,
    pub depth: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocLink>,
}

#[async_trait]
impl Parse for MarkdownParser {
    async fn parse(&self, id: &str, content: &str, options: &StepOptions) -> Result<TransformedContent> {
        let (front_matter, body) = split_front_matter(content);

        let mut doc = TransformedContent::new(id);
        if let Some(yaml) = front_matter {
            doc.merge(parse_front_matter(id, yaml)?);
        }

        let toc_options = options.get("toc");
        let depth = toc_setting(toc_options, "depth");
        let search_depth = toc_setting(toc_options, "searchDepth");

        let tree = build_tree(body);
        if let Some(title) = tree.title {
            doc.insert_if_absent("title", Value::String(title));
        }
        if let Some(description) = tree.description {
            doc.insert_if_absent("description", Value::String(description));
        }

        let mut links = Vec::new();
        for heading in tree.headings {
            if heading.depth >= 2 && heading.depth <= depth {
                nest_link(&mut links, heading);
            }
        }

        let root = MarkdownRoot {
            kind: "root",
            children: tree.children,
            toc: Toc {
                title: String::new(),
                depth,
                search_depth,
                links,
            },
        };
        doc.insert("body", serde_json::to_value(root)?);
        Ok(doc)
    }
}

/// Split a leading `---` fenced YAML block from the markdown body.
fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, content)
}

fn parse_front_matter(id: &str, yaml: &str) -> Result<Map<String, Value>> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_yaml::from_str(yaml).map_err(|e| ContentDbError::transform(id, e))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ContentDbError::transform(
            id,
            format!("front matter must be a mapping, got {other}"),
        )),
    }
}

fn toc_setting(toc: Option<&Value>, key: &str) -> u64 {
    toc.and_then(|t| t.get(key))
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_TOC_DEPTH)
}

fn nest_link(links: &mut Vec<TocLink>, link: TocLink) {
    match links.last_mut() {
        Some(last) if last.depth < link.depth => nest_link(&mut last.children, link),
        _ => links.push(link),
    }
}

struct Tree {
    children: Vec<MarkdownNode>,
    headings: Vec<TocLink>,
    title: Option<String>,
    description: Option<String>,
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<MarkdownNode>,
    root: Vec<MarkdownNode>,
    headings: Vec<TocLink>,
    title: Option<String>,
    description: Option<String>,
    in_table_head: bool,
    heading_ids: HashSet<String>,
}

impl TreeBuilder {
    fn open(&mut self, node: MarkdownNode) {
        if node.tag() == Some("thead") {
            self.in_table_head = true;
        }
        self.stack.push(node);
    }

    fn close(&mut self) {
        let Some(mut node) = self.stack.pop() else {
            return;
        };

        let tag = node.tag().map(str::to_string);
        match tag.as_deref() {
            Some("thead") => self.in_table_head = false,
            Some("p") if self.stack.is_empty() && self.description.is_none() => {
                self.description = Some(node.text_content());
            }
            Some(tag) => {
                let Some(depth) = heading_depth(tag) else {
                    self.append(node);
                    return;
                };
                let text = node.text_content();
                let id = match &mut node {
                    MarkdownNode::Element { props, .. } => {
                        let id = match props.get("id").and_then(Value::as_str) {
                            Some(explicit) => explicit.to_string(),
                            None => self.unique_heading_id(&slug::slugify(&text)),
                        };
                        self.heading_ids.insert(id.clone());
                        props.insert("id".to_string(), Value::String(id.clone()));
                        id
                    }
                    _ => slug::slugify(&text),
                };
                if depth == 1 && self.title.is_none() {
                    self.title = Some(text.clone());
                }
                self.headings.push(TocLink {
                    id,
                    text,
                    depth,
                    children: Vec::new(),
                });
            }
            None => {}
        }

        self.append(node);
    }

    /// `base`, or `base-1`, `base-2`, ... if an earlier heading took it.
    fn unique_heading_id(&self, base: &str) -> String {
        let mut id = base.to_string();
        let mut n = 0;
        while self.heading_ids.contains(&id) {
            n += 1;
            id = format!("{base}-{n}");
        }
        id
    }

    fn append(&mut self, node: MarkdownNode) {
        let siblings = match self.stack.last_mut() {
            Some(MarkdownNode::Element { children, .. }) => children,
            _ => &mut self.root,
        };
        // Adjacent text runs are merged into one node.
        if let (Some(MarkdownNode::Text { value: last }), MarkdownNode::Text { value }) =
            (siblings.last_mut(), &node)
        {
            last.push_str(value);
            return;
        }
        siblings.push(node);
    }

    fn text(&mut self, value: &str) {
        self.append(MarkdownNode::Text {
            value: value.to_string(),
        });
    }

    fn finish(mut self) -> Tree {
        while !self.stack.is_empty() {
            self.close();
        }
        Tree {
            children: self.root,
            headings: self.headings,
            title: self.title,
            description: self.description,
        }
    }
}

fn heading_depth(tag: &str) -> Option<u64> {
    let level = tag.strip_prefix('h')?.parse::<u64>().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn element_for(tag: Tag<'_>, in_table_head: bool) -> MarkdownNode {
    match tag {
        Tag::Paragraph => MarkdownNode::element("p"),
        Tag::Heading { level, id, .. } => {
            let node = MarkdownNode::element(&format!("h{}", level as u8));
            match id {
                Some(id) => node.with_prop("id", Value::String(id.to_string())),
                None => node,
            }
        }
        Tag::BlockQuote => MarkdownNode::element("blockquote"),
        Tag::CodeBlock(kind) => {
            let node = MarkdownNode::element("pre");
            match kind {
                CodeBlockKind::Fenced(info) => match info.split_whitespace().next() {
                    Some(language) => node.with_prop("language", Value::String(language.to_string())),
                    None => node,
                },
                CodeBlockKind::Indented => node,
            }
        }
        Tag::List(Some(start)) if start != 1 => {
            MarkdownNode::element("ol").with_prop("start", Value::from(start))
        }
        Tag::List(Some(_)) => MarkdownNode::element("ol"),
        Tag::List(None) => MarkdownNode::element("ul"),
        Tag::Item => MarkdownNode::element("li"),
        Tag::FootnoteDefinition(label) => {
            MarkdownNode::element("footnote").with_prop("id", Value::String(label.to_string()))
        }
        Tag::Table(_) => MarkdownNode::element("table"),
        Tag::TableHead => MarkdownNode::element("thead"),
        Tag::TableRow => MarkdownNode::element("tr"),
        Tag::TableCell if in_table_head => MarkdownNode::element("th"),
        Tag::TableCell => MarkdownNode::element("td"),
        Tag::Emphasis => MarkdownNode::element("em"),
        Tag::Strong => MarkdownNode::element("strong"),
        Tag::Strikethrough => MarkdownNode::element("del"),
        Tag::Link { dest_url, title, .. } => {
            let node = MarkdownNode::element("a").with_prop("href", Value::String(dest_url.to_string()));
            if title.is_empty() {
                node
            } else {
                node.with_prop("title", Value::String(title.to_string()))
            }
        }
        Tag::Image { dest_url, title, .. } => {
            let node = MarkdownNode::element("img").with_prop("src", Value::String(dest_url.to_string()));
            if title.is_empty() {
                node
            } else {
                node.with_prop("title", Value::String(title.to_string()))
            }
        }
        _ => MarkdownNode::element("div"),
    }
}

fn build_tree(markdown: &str) -> Tree {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(tag) => {
                let node = element_for(tag, builder.in_table_head);
                builder.open(node);
            }
            Event::End(_) => builder.close(),
            Event::Text(text) => builder.text(&text),
            Event::Code(code) => {
                builder.open(MarkdownNode::element("code"));
                builder.text(&code);
                builder.close();
            }
            Event::Html(html) | Event::InlineHtml(html) => builder.append(MarkdownNode::Raw {
                value: html.to_string(),
            }),
            Event::SoftBreak => builder.text("\n"),
            Event::HardBreak => builder.append(MarkdownNode::element("br")),
            Event::Rule => builder.append(MarkdownNode::element("hr")),
            Event::TaskListMarker(checked) => builder.append(
                MarkdownNode::element("input")
                    .with_prop("type", Value::String("checkbox".to_string()))
                    .with_prop("checked", Value::Bool(checked)),
            ),
            _ => {}
        }
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn parse(content: &str, options: Value) -> TransformedContent {
        let options = options.as_object().cloned().unwrap_or_default();
        MarkdownParser.parse("docs/guide.md", content, &options).await.unwrap()
    }

    #[test]
    fn test_split_front_matter() {
        assert_eq!(
            split_front_matter("---\ntitle: A\n---\n# Body"),
            (Some("title: A\n"), "# Body")
        );
        assert_eq!(split_front_matter("# No front matter"), (None, "# No front matter"));
        assert_eq!(split_front_matter("---\nunterminated"), (None, "---\nunterminated"));
    }

    #[tokio::test]
    async fn test_front_matter_wins_over_derived_fields() {
        let doc = parse(
            "---\ntitle: From front matter\nid: ignored\ntags: [a, b]\n---\n# Heading\n\nFirst paragraph.\n",
            json!({}),
        )
        .await;
        assert_eq!(doc.id, "docs/guide.md");
        assert_eq!(doc.get_str("title"), Some("From front matter"));
        assert_eq!(doc.get_str("description"), Some("First paragraph."));
        assert_eq!(doc.get("tags"), Some(&json!(["a", "b"])));
    }

    #[tokio::test]
    async fn test_title_and_description_from_body() {
        let doc = parse("# Getting Started\n\nInstall the **CLI** first.\n\nMore.\n", json!({})).await;
        assert_eq!(doc.get_str("title"), Some("Getting Started"));
        assert_eq!(doc.get_str("description"), Some("Install the CLI first."));
    }

    #[tokio::test]
    async fn test_ast_shape() {
        let doc = parse("## Hello World\n\nSome `code` here.\n", json!({})).await;
        let body = doc.body().unwrap();
        assert_eq!(body["type"], json!("root"));
        assert_eq!(
            body["children"],
            json!([
                {
                    "type": "element",
                    "tag": "h2",
                    "props": { "id": "hello-world" },
                    "children": [{ "type": "text", "value": "Hello World" }]
                },
                {
                    "type": "element",
                    "tag": "p",
                    "children": [
                        { "type": "text", "value": "Some " },
                        {
                            "type": "element",
                            "tag": "code",
                            "children": [{ "type": "text", "value": "code" }]
                        },
                        { "type": "text", "value": " here." }
                    ]
                }
            ])
        );
    }

    #[tokio::test]
    async fn test_toc_defaults_to_depth_two() {
        let doc = parse("# Top\n\n## One\n\n### Deep\n\n## Two\n", json!({})).await;
        assert_eq!(
            doc.body().unwrap()["toc"],
            json!({
                "title": "",
                "depth": 2,
                "searchDepth": 2,
                "links": [
                    { "id": "one", "text": "One", "depth": 2 },
                    { "id": "two", "text": "Two", "depth": 2 }
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_toc_nests_deeper_headings() {
        let doc = parse(
            "## One\n\n### Deep\n\n## Two\n",
            json!({ "toc": { "depth": 3, "searchDepth": 4 } }),
        )
        .await;
        let toc = &doc.body().unwrap()["toc"];
        assert_eq!(toc["depth"], json!(3));
        assert_eq!(toc["searchDepth"], json!(4));
        assert_eq!(
            toc["links"],
            json!([
                {
                    "id": "one",
                    "text": "One",
                    "depth": 2,
                    "children": [{ "id": "deep", "text": "Deep", "depth": 3 }]
                },
                { "id": "two", "text": "Two", "depth": 2 }
            ])
        );
    }

    #[tokio::test]
    async fn test_repeated_headings_get_distinct_ids() {
        let doc = parse("## Intro\n\n## Intro\n\n## Intro\n", json!({})).await;
        let body = doc.body().unwrap();
        let ids: Vec<&Value> = body["children"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| &h["props"]["id"])
            .collect();
        assert_eq!(ids, vec![&json!("intro"), &json!("intro-1"), &json!("intro-2")]);
        assert_eq!(
            body["toc"]["links"],
            json!([
                { "id": "intro", "text": "Intro", "depth": 2 },
                { "id": "intro-1", "text": "Intro", "depth": 2 },
                { "id": "intro-2", "text": "Intro", "depth": 2 }
            ])
        );
    }

    #[tokio::test]
    async fn test_non_mapping_front_matter_is_rejected() {
        let err = MarkdownParser
            .parse("bad.md", "---\n- a\n- b\n---\nbody", &StepOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentDbError::Transform { ref id, .. } if id == "bad.md"));
    }

    #[tokio::test]
    async fn test_table_header_cells() {
        let doc = parse("| a | b |\n|---|---|\n| 1 | 2 |\n", json!({})).await;
        let table = &doc.body().unwrap()["children"][0];
        assert_eq!(table["tag"], json!("table"));
        assert_eq!(table["children"][0]["tag"], json!("thead"));
        assert_eq!(table["children"][0]["children"][0]["tag"], json!("th"));
    }
}
