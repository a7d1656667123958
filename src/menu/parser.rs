//! Response Parser
//!
//! Vision models are asked to reply with bare JSON but often wrap it in
//! commentary or code fences. The parsers here pull the JSON object out of
//! the reply text and decode its `menuItems` array.

use serde_json::Value;

use super::types::MenuItem;

/// Response parsing errors. Every variant that saw a JSON candidate keeps
/// the full reply so it can be returned to the caller for debugging.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("No JSON object found in response")]
    NoJsonObject { raw: String },

    #[error("Malformed JSON in response: {message}")]
    MalformedJson { message: String, raw: String },

    #[error("Invalid response structure: {message}")]
    UnexpectedShape { message: String, raw: String },
}

impl ParseError {
    /// The model reply that failed to parse
    pub fn raw_response(&self) -> &str {
        match self {
            Self::NoJsonObject { raw }
            | Self::MalformedJson { raw, .. }
            | Self::UnexpectedShape { raw, .. } => raw,
        }
    }
}

/// Strategy for turning a model reply into menu items
pub trait ResponseParser: Send + Sync {
    /// Strategy name, used in logs
    fn name(&self) -> &'static str;

    /// Locate the JSON object in `text`, as a byte range
    fn locate(&self, text: &str) -> Result<(usize, usize), ParseError>;

    /// Parse a model reply into an ordered list of items
    fn parse(&self, text: &str) -> Result<Vec<MenuItem>, ParseError> {
        let (start, end) = self.locate(text)?;
        decode_menu_items(&text[start..end], text)
    }
}

/// Takes everything from the first `{` to the last `}`.
///
/// If the reply contains more than one object the span covers all of them
/// and usually fails to decode.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringParser;

impl ResponseParser for SubstringParser {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn locate(&self, text: &str) -> Result<(usize, usize), ParseError> {
        let start = text.find('{');
        let end = text.rfind('}');

        match (start, end) {
            (Some(start), Some(end)) if end > start => Ok((start, end + 1)),
            _ => Err(ParseError::NoJsonObject {
                raw: text.to_string(),
            }),
        }
    }
}

/// Takes the first brace-balanced object, ignoring braces inside strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct BalancedParser;

impl ResponseParser for BalancedParser {
    fn name(&self) -> &'static str {
        "balanced"
    }

    fn locate(&self, text: &str) -> Result<(usize, usize), ParseError> {
        let start = text.find('{').ok_or_else(|| ParseError::NoJsonObject {
            raw: text.to_string(),
        })?;

        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (offset, ch) in text[start..].char_indices() {
            if in_string {
                match ch {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }

            match ch {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok((start, start + offset + 1));
                    }
                }
                _ => {}
            }
        }

        Err(ParseError::MalformedJson {
            message: "unterminated JSON object".to_string(),
            raw: text.to_string(),
        })
    }
}

/// Decode a JSON candidate and pull out its `menuItems` array. Items are
/// taken as they are; only the array itself is checked.
fn decode_menu_items(candidate: &str, raw: &str) -> Result<Vec<MenuItem>, ParseError> {
    let value: Value = serde_json::from_str(candidate).map_err(|e| ParseError::MalformedJson {
        message: e.to_string(),
        raw: raw.to_string(),
    })?;

    let unexpected = |message: &str| ParseError::UnexpectedShape {
        message: message.to_string(),
        raw: raw.to_string(),
    };

    match value {
        Value::Object(mut object) => match object.remove("menuItems") {
            Some(Value::Array(items)) => Ok(items.into_iter().map(MenuItem::from).collect()),
            Some(_) => Err(unexpected("menuItems is not an array")),
            None => Err(unexpected("missing menuItems array")),
        },
        _ => Err(unexpected("expected a JSON object")),
    }
}
