#[cfg(test)]
#[path = "snippet_test.rs"]
mod tests;

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SnippetError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("response must be a JSON array")]
    NotAnArray,
    #[error("snippet {index} is missing a string '{field}' field")]
    MissingField { index: usize, field: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snippet {
    pub name: String,
    pub code: String,
}

/// Parses a single-batch response. The array itself must be well formed;
/// individual entries are validated on their own so one bad entry does not
/// reject its siblings.
pub fn parse_snippets(text: &str) -> Result<Vec<Result<Snippet, SnippetError>>, SnippetError> {
    let value: Value = serde_json::from_str(text)?;
    let entries = match value {
        Value::Array(entries) => entries,
        _ => return Err(SnippetError::NotAnArray),
    };

    let res = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| -> Result<Snippet, SnippetError> {
            let name = string_field(entry, index, "name")?;
            let code = string_field(entry, index, "code")?;
            return Ok(Snippet { name, code });
        })
        .collect();

    return Ok(res);
}

fn string_field(entry: &Value, index: usize, field: &'static str) -> Result<String, SnippetError> {
    return entry
        .get(field)
        .and_then(|e| return e.as_str())
        .map(|e| return e.to_string())
        .ok_or(SnippetError::MissingField { index, field });
}
