//! Lossless syntax tree. Every byte of the source lives in exactly one
//! field, so writing the tree back reproduces the input.

use crate::value::{quote, Value};

/// Newline and indentation conventions detected in the source, used when
/// new text has to be generated.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Layout {
    pub newline: String,
    pub unit: String,
}

impl Layout {
    pub fn detect(src: &str) -> Self {
        let newline = if src.contains("\r\n") { "\r\n" } else { "\n" };
        let unit = src
            .lines()
            .map(|line| {
                let trimmed = line.trim_start_matches([' ', '\t']);
                &line[..line.len() - trimmed.len()]
            })
            .find(|indent| !indent.is_empty())
            .unwrap_or("  ");
        Self {
            newline: newline.to_string(),
            unit: unit.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Scalar(Scalar),
    Object(Container),
    Array(Container),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scalar {
    pub raw: String,
    pub value: Value,
}

/// Members of an object or items of an array. `tail` is the trivia between
/// the last entry (or the opening bracket) and the closing bracket.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Container {
    pub entries: Vec<Entry>,
    pub tail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    /// Trivia before the key (objects) or the value (arrays).
    pub leading: String,
    pub key: Option<Key>,
    pub value: Node,
    /// Trivia between the value and its comma; empty when there is no comma.
    pub trailing: String,
    pub comma: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Key {
    pub raw: String,
    pub name: String,
    pub before_colon: String,
    pub after_colon: String,
}

impl Key {
    fn new(name: &str) -> Self {
        Self {
            raw: quote(name),
            name: name.to_string(),
            before_colon: String::new(),
            after_colon: " ".to_string(),
        }
    }
}

/// Indentation of the line a piece of leading trivia ends on, if that line
/// holds only whitespace.
pub(crate) fn line_indent(leading: &str) -> Option<&str> {
    let start = leading.rfind('\n')? + 1;
    let indent = &leading[start..];
    indent.chars().all(|c| c == ' ' || c == '\t').then_some(indent)
}

/// Comment text before the first line break of `leading`, when there is one.
/// It belongs to whatever precedes the entry on that line.
fn same_line_comment(leading: &str) -> Option<&str> {
    let end = leading.find('\n')?;
    let head = leading[..end].strip_suffix('\r').unwrap_or(&leading[..end]);
    let text = head.trim_start_matches([' ', '\t']);
    let line_comment = text.starts_with("//");
    let block_comment =
        text.starts_with("/*") && head.matches("/*").count() == head.matches("*/").count();
    (line_comment || block_comment).then_some(head)
}

impl Entry {
    pub fn indent(&self) -> Option<&str> {
        line_indent(&self.leading)
    }

    pub fn key_name(&self) -> Option<&str> {
        self.key.as_ref().map(|k| k.name.as_str())
    }

    fn write(&self, out: &mut String) {
        out.push_str(&self.leading);
        if let Some(key) = &self.key {
            out.push_str(&key.raw);
            out.push_str(&key.before_colon);
            out.push(':');
            out.push_str(&key.after_colon);
        }
        self.value.write(out);
        out.push_str(&self.trailing);
        if self.comma {
            out.push(',');
        }
    }
}

impl Node {
    pub fn write(&self, out: &mut String) {
        match self {
            Node::Scalar(scalar) => out.push_str(&scalar.raw),
            Node::Object(container) => container.write(out, '{', '}'),
            Node::Array(container) => container.write(out, '[', ']'),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Node::Scalar(scalar) => scalar.value.clone(),
            Node::Object(container) => Value::Object(
                container
                    .entries
                    .iter()
                    .filter_map(|e| e.key_name().map(|k| (k.to_string(), e.value.to_value())))
                    .collect(),
            ),
            Node::Array(container) => {
                Value::Array(container.entries.iter().map(|e| e.value.to_value()).collect())
            }
        }
    }

    /// Generate fresh text for `value`. `indent` is the indentation of the
    /// line the value starts on.
    pub fn from_value(value: &Value, indent: &str, layout: &Layout) -> Node {
        match value {
            Value::Object(members) => {
                let mut container = Container::default();
                for (name, member) in members {
                    container.push(Some(name), member, indent, layout);
                }
                Node::Object(container)
            }
            Value::Array(items) => {
                let mut container = Container::default();
                for item in items {
                    container.push(None, item, indent, layout);
                }
                Node::Array(container)
            }
            scalar => Node::Scalar(Scalar {
                raw: scalar.scalar_text(),
                value: scalar.clone(),
            }),
        }
    }

    /// Make this node hold `value`, keeping as much of the existing text
    /// (comments, member order, number spelling) as the new value allows.
    pub fn assign(&mut self, value: &Value, indent: &str, layout: &Layout) {
        if let (Node::Object(container), Value::Object(members)) = (&mut *self, value) {
            container.assign_members(members, indent, layout);
            return;
        }
        if let (Node::Array(container), Value::Array(items)) = (&mut *self, value) {
            container.assign_items(items, indent, layout);
            return;
        }
        if let Node::Scalar(scalar) = self {
            if scalar.value == *value {
                return;
            }
        }
        *self = Node::from_value(value, indent, layout);
    }
}

impl Container {
    fn write(&self, out: &mut String, open: char, close: char) {
        out.push(open);
        for entry in &self.entries {
            entry.write(out);
        }
        out.push_str(&self.tail);
        out.push(close);
    }

    /// Last entry with the given key; later duplicates win, as in JSON.parse.
    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().rev().find(|e| e.key_name() == Some(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().rev().find(|e| e.key_name() == Some(name))
    }

    /// Set one member, appending it when the key is new.
    pub fn set_member(&mut self, name: &str, value: &Value, indent: &str, layout: &Layout) {
        if let Some(entry) = self.find_mut(name) {
            let child_indent = entry
                .indent()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}{}", indent, layout.unit));
            entry.value.assign(value, &child_indent, layout);
        } else {
            self.push(Some(name), value, indent, layout);
        }
    }

    fn assign_members(&mut self, members: &[(String, Value)], indent: &str, layout: &Layout) {
        let mut index = 0;
        while index < self.entries.len() {
            let keep = match self.entries[index].key_name() {
                Some(name) => members.iter().any(|(k, _)| k == name),
                None => true,
            };
            if keep {
                index += 1;
            } else {
                self.remove(index);
            }
        }
        for (name, value) in members {
            self.set_member(name, value, indent, layout);
        }
    }

    fn assign_items(&mut self, items: &[Value], indent: &str, layout: &Layout) {
        while self.entries.len() > items.len() {
            self.remove(self.entries.len() - 1);
        }
        for (index, item) in items.iter().enumerate() {
            match self.entries.get_mut(index) {
                Some(entry) => {
                    let child_indent = entry
                        .indent()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{}{}", indent, layout.unit));
                    entry.value.assign(item, &child_indent, layout);
                }
                None => self.push(None, item, indent, layout),
            }
        }
    }

    fn remove(&mut self, index: usize) {
        let removed = self.entries.remove(index);
        // the previous entry's same-line comment lives in our leading trivia
        let same_line = same_line_comment(&removed.leading).unwrap_or_default();
        if index == self.entries.len() {
            self.tail.insert_str(0, same_line);
            if !removed.comma {
                if let Some(prev) = self.entries.last_mut() {
                    // prev is now last: drop its comma, move its pre-comma
                    // trivia in front of the closing bracket
                    prev.comma = false;
                    let trailing = std::mem::take(&mut prev.trailing);
                    self.tail.insert_str(0, &trailing);
                }
            }
        } else {
            self.entries[index].leading.insert_str(0, same_line);
        }
    }

    fn push(&mut self, name: Option<&str>, value: &Value, indent: &str, layout: &Layout) {
        let child_indent = self
            .entries
            .last()
            .and_then(Entry::indent)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", indent, layout.unit));

        let mut same_line = String::new();
        match self.entries.last_mut() {
            Some(last) => {
                if !last.comma {
                    last.comma = true;
                    // a comment sharing the old last line stays on that line
                    let (head, rest) = match self.tail.find('\n') {
                        Some(pos) if self.tail[..pos].ends_with('\r') => self.tail.split_at(pos - 1),
                        Some(pos) => self.tail.split_at(pos),
                        None => (self.tail.as_str(), ""),
                    };
                    if !head.contains("/*") && !rest.is_empty() {
                        same_line = head.to_string();
                        self.tail = rest.to_string();
                    }
                }
            }
            None => {
                if self.tail.trim().is_empty() {
                    self.tail = format!("{}{}", layout.newline, indent);
                }
            }
        }

        let value = Node::from_value(value, &child_indent, layout);
        self.entries.push(Entry {
            leading: format!("{}{}{}", same_line, layout.newline, child_indent),
            key: name.map(Key::new),
            value,
            trailing: String::new(),
            comma: false,
        });
    }
}
