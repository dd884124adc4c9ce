use crate::error::{ContentDbError, Result};
use crate::transform::{Parse, StepOptions, Transform, TransformedContent};
use async_trait::async_trait;
use serde_json::{Map, Number, Value};

/// Parses `.csv` files into an array of rows under `body`.
///
/// Options (`csv` slice): `delimiter` (a single character, default `,`) and
/// `headers` (default `true`). With headers each row is an object keyed by
/// column name, otherwise an array of cells. Cells past the last header are
/// keyed `field<N>` by their 1-based position. Cells stay strings.
pub struct CsvParser;

/// Converts string cells that look like booleans or numbers into JSON values.
pub struct CsvTyping;

#[async_trait]
impl Parse for CsvParser {
    async fn parse(&self, id: &str, content: &str, options: &StepOptions) -> Result<TransformedContent> {
        let delimiter = delimiter(id, options)?;
        let headers = options.get("headers").and_then(Value::as_bool).unwrap_or(true);

        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(headers)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        if headers {
            let columns = reader
                .headers()
                .map_err(|e| ContentDbError::transform(id, e))?
                .clone();
            for record in reader.records() {
                let record = record.map_err(|e| ContentDbError::transform(id, e))?;
                let row: Map<String, Value> = record
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        let column = match columns.get(i) {
                            Some(name) => name.to_string(),
                            None => format!("field{}", i + 1),
                        };
                        (column, Value::String(cell.to_string()))
                    })
                    .collect();
                rows.push(Value::Object(row));
            }
        } else {
            for record in reader.records() {
                let record = record.map_err(|e| ContentDbError::transform(id, e))?;
                rows.push(Value::Array(
                    record.iter().map(|cell| Value::String(cell.to_string())).collect(),
                ));
            }
        }

        let mut doc = TransformedContent::new(id);
        doc.insert("body", Value::Array(rows));
        Ok(doc)
    }
}

#[async_trait]
impl Transform for CsvTyping {
    async fn transform(
        &self,
        mut content: TransformedContent,
        _options: &StepOptions,
    ) -> Result<TransformedContent> {
        if let Some(Value::Array(rows)) = content.remove("body") {
            let typed = rows
                .into_iter()
                .map(|row| match row {
                    Value::Object(cells) => Value::Object(
                        cells.into_iter().map(|(k, v)| (k, type_cell(v))).collect(),
                    ),
                    Value::Array(cells) => Value::Array(cells.into_iter().map(type_cell).collect()),
                    other => other,
                })
                .collect();
            content.insert("body", Value::Array(typed));
        }
        Ok(content)
    }
}

fn delimiter(id: &str, options: &StepOptions) -> Result<u8> {
    match options.get("delimiter").and_then(Value::as_str) {
        None => Ok(b','),
        Some(d) if d.len() == 1 && d.is_ascii() => Ok(d.as_bytes()[0]),
        Some(d) => Err(ContentDbError::transform(
            id,
            format!("CSV delimiter must be a single ASCII character, got {d:?}"),
        )),
    }
}

fn type_cell(cell: Value) -> Value {
    let Value::String(text) = cell else {
        return cell;
    };
    match text.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    // Zero-padded codes such as "007" keep their padding.
    let digits = text.trim_start_matches('-');
    if digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.") {
        return Value::String(text);
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = text.parse::<f64>().ok().and_then(Number::from_f64) {
        if text.bytes().any(|b| b.is_ascii_digit()) {
            return Value::Number(n);
        }
    }
    Value::String(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn parse(content: &str, options: Value) -> Result<TransformedContent> {
        let options = options.as_object().cloned().unwrap_or_default();
        CsvParser.parse("data.csv", content, &options).await
    }

    #[tokio::test]
    async fn test_rows_keyed_by_header() {
        let doc = parse("name,role\nAda,admin\nGrace,editor\n", json!({})).await.unwrap();
        assert_eq!(
            doc.body(),
            Some(&json!([
                { "name": "Ada", "role": "admin" },
                { "name": "Grace", "role": "editor" }
            ]))
        );
    }

    #[tokio::test]
    async fn test_cells_beyond_headers_are_kept() {
        let doc = parse("name,role\nAda,admin,extra,more\nGrace\n", json!({})).await.unwrap();
        assert_eq!(
            doc.body(),
            Some(&json!([
                { "name": "Ada", "role": "admin", "field3": "extra", "field4": "more" },
                { "name": "Grace" }
            ]))
        );
    }

    #[tokio::test]
    async fn test_custom_delimiter_without_headers() {
        let doc = parse("a;1\nb;2\n", json!({ "delimiter": ";", "headers": false }))
            .await
            .unwrap();
        assert_eq!(doc.body(), Some(&json!([["a", "1"], ["b", "2"]])));
    }

    #[tokio::test]
    async fn test_quoted_cells() {
        let doc = parse("name,quote\nAda,\"Hello, \"\"world\"\"\"\n", json!({}))
            .await
            .unwrap();
        assert_eq!(
            doc.body(),
            Some(&json!([{ "name": "Ada", "quote": "Hello, \"world\"" }]))
        );
    }

    #[tokio::test]
    async fn test_bad_delimiter_is_rejected() {
        let err = parse("a,b\n", json!({ "delimiter": "::" })).await.unwrap_err();
        assert!(matches!(err, ContentDbError::Transform { .. }));
    }

    #[tokio::test]
    async fn test_typing_converts_scalars() {
        let mut doc = TransformedContent::new("data.csv");
        doc.insert(
            "body",
            json!([
                { "n": "42", "f": "1.5", "b": "false", "s": "hello", "zip": "007", "neg": "-3" },
                ["true", "NaN", ""]
            ]),
        );
        let doc = CsvTyping.transform(doc, &StepOptions::new()).await.unwrap();
        assert_eq!(
            doc.body(),
            Some(&json!([
                { "n": 42, "f": 1.5, "b": false, "s": "hello", "zip": "007", "neg": -3 },
                [true, "NaN", ""]
            ]))
        );
    }
}
