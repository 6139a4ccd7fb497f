//! Tokenization of the GTF attribute column.
//!
//! Two dialects are supported.
//!
//! - [`Grammar::Escaped`] walks the string character by character.  Inside double quotes,
//!   `;`, spaces, and `\"` are data.  Unquoted spaces after the attribute name are data as
//!   well.  A `;` outside of quotes terminates the attribute, and a single space following it
//!   is skipped.
//! - [`Grammar::Grouped`] splits the string at `"; "` and matches each piece against
//!   `name "data"`.  Attributes without data are recorded as [`AttributeValue::Present`];
//!   unquoted data such as GENCODE's `level 2` is kept as text.
//!
//! A [`Dialect`] pairs a grammar with the attribute names that may repeat in one record.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;

/// Regular expression for one attribute of the grouped dialect.
static RE_ATTRIBUTE_GROUPS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?P<name>[^"; ]+)(?: "(?P<data>.*)"| (?P<bare>[^"]+?))?;?$"#)
        .expect("invalid regex")
});

/// Attribute column grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Grammar {
    /// Character state machine with quoting and backslash escapes.
    Escaped,
    /// `"; "`-separated `name "data"` groups.
    Grouped,
}

/// Attribute grammar together with the names allowed to occur more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub grammar: Grammar,
    pub repeatable: &'static [&'static str],
}

impl Dialect {
    /// Ensembl/GENCODE files read with the escaped grammar.
    pub const ESCAPED: Self = Self {
        grammar: Grammar::Escaped,
        repeatable: &["tag", "ont", "db_xref"],
    };
    /// Ensembl files read with the grouped grammar.
    pub const GROUPED: Self = Self {
        grammar: Grammar::Grouped,
        repeatable: &["tag", "ont", "db_xref"],
    };
    /// NCBI RefSeq files; gene rows list every synonym and CDS rows every evidence.
    pub const NCBI: Self = Self {
        grammar: Grammar::Escaped,
        repeatable: &["tag", "ont", "db_xref", "gene_synonym", "inference", "experiment"],
    };

    /// Whether `name` may occur more than once per record.
    pub fn is_repeatable(&self, name: &str) -> bool {
        self.repeatable.contains(&name)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.grammar)
    }
}

/// One value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeValue {
    /// Attribute data, possibly empty.
    Text(String),
    /// The attribute name occurred without data.
    Present,
}

impl AttributeValue {
    /// The textual data, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s.as_str()),
            AttributeValue::Present => None,
        }
    }
}

/// Ordered mapping from attribute name to its non-empty list of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: IndexMap<String, Vec<AttributeValue>>,
}

impl Attributes {
    /// Tokenize `s` according to `dialect`.
    pub fn parse(s: &str, dialect: Dialect) -> Result<Self, Error> {
        let mut result = Self::default();
        match dialect.grammar {
            Grammar::Escaped => {
                for (name, data) in tokenize_escaped(s)? {
                    result.push(&dialect, s, name, AttributeValue::Text(data), false)?;
                }
            }
            Grammar::Grouped => {
                for piece in s.split("; ").filter(|piece| !piece.is_empty()) {
                    let caps =
                        RE_ATTRIBUTE_GROUPS
                            .captures(piece)
                            .ok_or_else(|| Error::MalformedAttributes {
                                attributes: s.to_string(),
                                reason: format!("cannot parse attribute {:?}", piece),
                            })?;
                    let value = match caps.name("data").or_else(|| caps.name("bare")) {
                        Some(data) if !data.as_str().is_empty() => {
                            AttributeValue::Text(data.as_str().to_string())
                        }
                        _ => AttributeValue::Present,
                    };
                    result.push(&dialect, s, caps["name"].to_string(), value, true)?;
                }
            }
        }
        Ok(result)
    }

    /// Append one value, enforcing the repeatability rules.
    fn push(
        &mut self,
        dialect: &Dialect,
        raw: &str,
        name: String,
        value: AttributeValue,
        dedup: bool,
    ) -> Result<(), Error> {
        if let Some(values) = self.values.get_mut(&name) {
            if !dialect.is_repeatable(&name) {
                return Err(Error::MalformedAttributes {
                    attributes: raw.to_string(),
                    reason: format!("attribute {:?} occurs more than once", name),
                });
            }
            if !(dedup && values.contains(&value)) {
                values.push(value);
            }
        } else {
            self.values.insert(name, vec![value]);
        }
        Ok(())
    }

    /// All values for `name`.
    pub fn get(&self, name: &str) -> Option<&[AttributeValue]> {
        self.values.get(name).map(|v| v.as_slice())
    }

    /// The single textual value of `name`.
    ///
    /// Returns `None` if the attribute is absent or carries no data.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.first())
            .and_then(AttributeValue::as_text)
    }

    /// All textual values of `name`.
    pub fn texts<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(AttributeValue::as_text)
    }

    /// Whether any value of `name` equals `value`.
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.texts(name).any(|v| v == value)
    }

    /// Iterate names and values in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AttributeValue])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// States of the escaped-dialect tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// At the start of the string or directly after a `;`.
    Terminated,
    /// Reading the attribute name.
    Name,
    /// Reading unquoted data.
    Data,
    /// Reading quoted data.
    Quoted,
    /// A backslash was read; `quoted` is the state to return to.
    Escaped { quoted: bool },
}

/// Effect of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Skip,
    Name(char),
    Data(char),
    /// Push a backslash followed by the character.
    Unescaped(char),
    Emit,
}

/// Transition table of the escaped-dialect tokenizer.
fn step(state: State, c: char) -> (State, Action) {
    match (state, c) {
        (State::Escaped { quoted }, '"' | '\\') => (resume(quoted), Action::Data(c)),
        (State::Escaped { quoted }, _) => (resume(quoted), Action::Unescaped(c)),
        (State::Quoted, '"') => (State::Data, Action::Skip),
        (State::Quoted, '\\') => (State::Escaped { quoted: true }, Action::Skip),
        (State::Quoted, _) => (State::Quoted, Action::Data(c)),
        (_, ';') => (State::Terminated, Action::Emit),
        (_, '"') => (State::Quoted, Action::Skip),
        (_, '\\') => (State::Escaped { quoted: false }, Action::Skip),
        (State::Terminated, ' ') => (State::Name, Action::Skip),
        (State::Name, ' ') => (State::Data, Action::Skip),
        (State::Terminated | State::Name, _) => (State::Name, Action::Name(c)),
        (State::Data, _) => (State::Data, Action::Data(c)),
    }
}

fn resume(quoted: bool) -> State {
    if quoted {
        State::Quoted
    } else {
        State::Data
    }
}

/// Split an escaped-dialect attribute string into `(name, data)` pairs.
fn tokenize_escaped(s: &str) -> Result<Vec<(String, String)>, Error> {
    let malformed = |reason: &str| Error::MalformedAttributes {
        attributes: s.to_string(),
        reason: reason.to_string(),
    };

    let mut result = Vec::new();
    let mut name = String::new();
    let mut data = String::new();
    let mut emit = |name: &mut String, data: &mut String| -> Result<(), Error> {
        if name.is_empty() {
            if data.is_empty() {
                return Ok(());
            }
            return Err(malformed("attribute data without name"));
        }
        result.push((std::mem::take(name), std::mem::take(data)));
        Ok(())
    };

    let mut state = State::Terminated;
    for c in s.chars() {
        let (next, action) = step(state, c);
        match action {
            Action::Skip => (),
            Action::Name(c) => name.push(c),
            Action::Data(c) => data.push(c),
            Action::Unescaped(c) => {
                data.push('\\');
                data.push(c);
            }
            Action::Emit => emit(&mut name, &mut data)?,
        }
        state = next;
    }

    match state {
        State::Quoted => Err(malformed("unbalanced quotes")),
        State::Escaped { .. } => Err(malformed("dangling escape character")),
        _ => {
            emit(&mut name, &mut data)?;
            Ok(result)
        }
    }
}
