//! The event attribute value type: a small tagged union, rejecting
//! anything else at the dispatcher boundary.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Str(String),
    Num(f64),
    Bool(bool),
    List(Vec<Attribute>),
    Map(HashMap<String, Attribute>),
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Str(s) => f.write_str(s),
            Attribute::Num(n) => write!(f, "{n}"),
            Attribute::Bool(b) => write!(f, "{b}"),
            Attribute::List(items) => {
                let rendered: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", rendered.join(","))
            }
            Attribute::Map(entries) => {
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                let rendered: Vec<String> = keys
                    .into_iter()
                    .map(|k| format!("{k}={}", entries[k]))
                    .collect();
                write!(f, "{{{}}}", rendered.join(","))
            }
        }
    }
}

impl From<&str> for Attribute {
    fn from(s: &str) -> Self {
        Attribute::Str(s.to_string())
    }
}

impl From<String> for Attribute {
    fn from(s: String) -> Self {
        Attribute::Str(s)
    }
}

/// Flattens to the scalar [`jobwarden_template::Value`] the template
/// evaluator understands. Lists and maps are rendered to their `Display`
/// form, since placeholders only ever expand to text.
impl From<&Attribute> for jobwarden_template::Value {
    fn from(attr: &Attribute) -> Self {
        match attr {
            Attribute::Str(s) => jobwarden_template::Value::Str(s.clone()),
            Attribute::Num(n) => jobwarden_template::Value::Num(*n),
            Attribute::Bool(b) => jobwarden_template::Value::Bool(*b),
            other => jobwarden_template::Value::Str(other.to_string()),
        }
    }
}
