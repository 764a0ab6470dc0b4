//! Expands `{{ key }}`-style placeholders from a string→value table.
//!
//! Used for command text, env values, URLs and headers; callers decide
//! which of their own fields get expanded. A failed expansion is
//! recoverable: the caller logs the error and falls back to the
//! unexpanded input rather than aborting the task attempt.

mod value;

pub use value::Value;

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown template key {key:?}")]
    UnknownKey { key: String },
    #[error("unterminated placeholder starting at byte {offset}")]
    Unterminated { offset: usize },
}

/// Expands every `{{ key }}` placeholder in `template` against `vars`.
/// Whitespace around the key inside the braces is trimmed; non-string
/// values are stringified. Fails on the first unknown key or unterminated
/// placeholder.
pub fn evaluate(template: &str, vars: &HashMap<String, Value>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' && bytes.get(i + 1) == Some(&b'{') {
            let start = i;
            let Some(end) = template[i + 2..].find("}}") else {
                return Err(TemplateError::Unterminated { offset: start });
            };
            let key = template[i + 2..i + 2 + end].trim();
            match vars.get(key) {
                Some(value) => out.push_str(&value.to_string()),
                None => {
                    return Err(TemplateError::UnknownKey {
                        key: key.to_string(),
                    })
                }
            }
            i = i + 2 + end + 2;
        } else {
            let ch_len = utf8_char_len(bytes[i]);
            out.push_str(&template[i..i + ch_len]);
            i += ch_len;
        }
    }

    Ok(out)
}

fn utf8_char_len(first_byte: u8) -> usize {
    if first_byte & 0x80 == 0 {
        1
    } else if first_byte & 0xE0 == 0xC0 {
        2
    } else if first_byte & 0xF0 == 0xE0 {
        3
    } else {
        4
    }
}

/// Expands `template` against `vars`; on error, logs (when the `tracing`
/// feature is enabled) and returns the original, unexpanded input.
pub fn evaluate_or_original(template: &str, vars: &HashMap<String, Value>) -> String {
    match evaluate(template, vars) {
        Ok(expanded) => expanded,
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(template, error = %_err, "template expansion failed, using raw input");
            template.to_string()
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Num(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Any string with no `{{` substring round-trips through `evaluate`
    /// unchanged, for any vars table: absence of placeholder syntax means
    /// nothing is ever substituted.
    fn no_placeholder_string() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ,.\\-_/]{0,40}".prop_filter("must not contain a placeholder opener", |s| !s.contains("{{"))
    }

    proptest! {
        #[test]
        fn placeholder_free_strings_are_idempotent(s in no_placeholder_string(), extra in "[a-z]{1,8}") {
            let mut vars = HashMap::new();
            vars.insert(extra, Value::Str("ignored".to_string()));
            prop_assert_eq!(evaluate(&s, &vars).unwrap(), s);
        }

        #[test]
        fn a_known_key_expands_to_its_stringified_value(key in "[a-z]{1,8}", value in "[a-zA-Z0-9]{0,16}") {
            let mut vars = HashMap::new();
            vars.insert(key.clone(), Value::Str(value.clone()));
            let template = format!("{{{{ {key} }}}}");
            prop_assert_eq!(evaluate(&template, &vars).unwrap(), value);
        }
    }
}
