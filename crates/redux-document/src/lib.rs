//! Softcore Redux Document Store
//!
//! Loads commented JSON (`config.json5`) into a lossless tree and writes it
//! back byte for byte. Values can be read and replaced by key path; a
//! replacement only rewrites the text of the targeted value, so the comments
//! that document every setting survive edits.

mod path;
mod syntax;
mod tree;
mod value;

pub use path::KeyPath;
pub use value::{Number, Value};

use std::fmt;
use tree::{line_indent, Layout, Node};

/// Document loading and editing errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl DocumentError {
    fn invalid_path(path: &KeyPath, reason: impl Into<String>) -> Self {
        DocumentError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// A parsed document with all comments and whitespace retained.
///
/// `Clone` is a deep copy: the clone shares nothing with the original.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    leading: String,
    root: Node,
    trailing: String,
    layout: Layout,
}

/// Parse `text` into a [`Document`].
pub fn parse(text: &str) -> Result<Document, DocumentError> {
    Document::parse(text)
}

/// Render `document` back to text.
pub fn serialize(document: &Document) -> String {
    document.to_text()
}

impl Document {
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let parsed = syntax::parse(text)?;
        Ok(Self {
            leading: parsed.leading,
            root: parsed.root,
            trailing: parsed.trailing,
            layout: Layout::detect(text),
        })
    }

    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.leading.len() + self.trailing.len() + 256);
        out.push_str(&self.leading);
        self.root.write(&mut out);
        out.push_str(&self.trailing);
        out
    }

    /// The whole document as a plain value.
    pub fn root_value(&self) -> Value {
        self.root.to_value()
    }

    /// Value at `path`; the empty path addresses the root.
    pub fn get(&self, path: &KeyPath) -> Option<Value> {
        self.node(path).map(Node::to_value)
    }

    pub fn contains(&self, path: &KeyPath) -> bool {
        self.node(path).is_some()
    }

    fn node(&self, path: &KeyPath) -> Option<&Node> {
        let mut node = &self.root;
        for segment in path.segments() {
            match node {
                Node::Object(container) => node = &container.find(segment)?.value,
                _ => return None,
            }
        }
        Some(node)
    }

    /// Replace the value at `path`.
    ///
    /// Every segment but the last must name an existing object. The last
    /// segment is updated in place, or appended to its parent object when
    /// absent. Nothing outside the targeted value changes.
    pub fn set(&mut self, path: &KeyPath, value: &Value) -> Result<(), DocumentError> {
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| DocumentError::invalid_path(path, "empty key path"))?;
        if !value.is_representable() {
            return Err(DocumentError::InvalidValue(format!(
                "non-finite number in value for '{}'",
                path
            )));
        }

        let mut indent = line_indent(&self.leading).unwrap_or("").to_string();
        let mut node = &mut self.root;
        for (depth, segment) in parents.iter().enumerate() {
            let Node::Object(container) = node else {
                return Err(DocumentError::invalid_path(
                    path,
                    format!("'{}' is not an object", parents[..depth].join(".")),
                ));
            };
            let Some(entry) = container.find_mut(segment) else {
                return Err(DocumentError::invalid_path(
                    path,
                    format!("key '{}' not found", parents[..=depth].join(".")),
                ));
            };
            indent = entry
                .indent()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}{}", indent, self.layout.unit));
            node = &mut entry.value;
        }

        let Node::Object(container) = node else {
            return Err(DocumentError::invalid_path(
                path,
                format!("'{}' is not an object", parents.join(".")),
            ));
        };
        container.set_member(last, value, &indent, &self.layout);
        tracing::trace!(path = %path, "document value set");
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
  // Hideout tweaks
  "hideoutOptions": {
    "fasterBitcoinFarming": {
      "enabled": true, // master switch
      /* handbook price, null keeps vanilla */
      "bitcoinPrice": 100000,
      "gpuEfficiency": 1.5
    },
    "disableFIRHideout": false,
  },
  "list": [1, 2, 3]
}
"#;

    #[test]
    fn round_trip_is_byte_identical() {
        let doc = parse(SAMPLE).expect("parse");
        assert_eq!(serialize(&doc), SAMPLE);
    }

    #[test]
    fn set_leaf_touches_only_its_value() {
        let mut doc = parse(SAMPLE).expect("parse");
        let path = KeyPath::from("hideoutOptions.fasterBitcoinFarming.bitcoinPrice");
        doc.set(&path, &Value::from(250000_i64)).expect("set");
        assert_eq!(
            doc.to_text(),
            SAMPLE.replace("\"bitcoinPrice\": 100000", "\"bitcoinPrice\": 250000")
        );
        assert_eq!(doc.get(&path), Some(Value::from(250000_i64)));
    }

    #[test]
    fn set_rejects_missing_and_non_object_parents() {
        let mut doc = parse(SAMPLE).expect("parse");
        let err = doc
            .set(&KeyPath::from("hideoutOptions.missing.enabled"), &Value::from(true))
            .expect_err("missing parent");
        assert!(matches!(err, DocumentError::InvalidPath { .. }));

        let err = doc
            .set(&KeyPath::from("list.0"), &Value::from(true))
            .expect_err("array parent");
        assert!(err.to_string().contains("not an object"));

        assert!(doc.set(&KeyPath::default(), &Value::Null).is_err());
        assert_eq!(doc.to_text(), SAMPLE);
    }

    #[test]
    fn set_appends_new_key_with_sibling_indent() {
        let mut doc = parse(SAMPLE).expect("parse");
        doc.set(&KeyPath::from("hideoutOptions.fasterBitcoinFarming.extra"), &Value::from(7_i64))
            .expect("set");
        let text = doc.to_text();
        assert!(text.contains("\"gpuEfficiency\": 1.5,\n      \"extra\": 7\n    },"));
    }

    #[test]
    fn clone_is_independent() {
        let original = parse(SAMPLE).expect("parse");
        let mut working = original.clone();
        working
            .set(&KeyPath::from("hideoutOptions.disableFIRHideout"), &Value::from(true))
            .expect("set");
        assert_eq!(original.to_text(), SAMPLE);
        assert_ne!(working.to_text(), SAMPLE);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut doc = parse(SAMPLE).expect("parse");
        let err = doc
            .set(
                &KeyPath::from("hideoutOptions.fasterBitcoinFarming.gpuEfficiency"),
                &Value::Number(Number::Float(f64::INFINITY)),
            )
            .expect_err("infinite");
        assert!(matches!(err, DocumentError::InvalidValue(_)));
    }
}
