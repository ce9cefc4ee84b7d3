//! JSON decode helpers for SIS responses.

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Attempts to parse JSON and, on failure, includes a contextual snippet of
/// the line where the error occurred along with the serde path.
pub fn parse_json_with_context<T: DeserializeOwned>(body: &str) -> Result<T> {
    let jd = &mut serde_json::Deserializer::from_str(body);
    match serde_path_to_error::deserialize(jd) {
        Ok(value) => Ok(value),
        Err(err) => {
            let inner = err.inner();
            let (line, column) = (inner.line(), inner.column());
            let path = err.path().to_string();
            let snippet = build_error_snippet(body, line, column, 40);

            let mut message = String::new();
            if !path.is_empty() && path != "." {
                message.push_str(&format!("at path '{path}': "));
            }
            message.push_str(&format!("{inner} (line {line} col {column})\n{snippet}"));

            Err(anyhow::anyhow!(message))
        }
    }
}

/// Decodes a JSON value into a typed model, naming the serde path of the
/// first mismatch on failure.
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        anyhow::anyhow!("at path '{path}': {inner}", inner = err.inner())
    })
}

fn build_error_snippet(body: &str, line: usize, column: usize, context_len: usize) -> String {
    let target_line = body.lines().nth(line.saturating_sub(1)).unwrap_or("");
    if target_line.is_empty() {
        return "(empty line)".to_string();
    }

    // column is 1-based, convert to 0-based for slicing
    let error_idx = column.saturating_sub(1).min(target_line.len());
    let half_len = context_len / 2;
    let start = error_idx.saturating_sub(half_len);
    let end = (error_idx + half_len).min(target_line.len());

    let slice = &target_line[start..end];
    let indicator = " ".repeat(error_idx - start) + "^";

    format!("...{slice}...\n   {indicator}")
}
