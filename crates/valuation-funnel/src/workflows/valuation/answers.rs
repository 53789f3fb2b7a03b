use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw answer to one survey question: a single option token or a multi-select set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(String),
    Multiple(Vec<String>),
}

impl AnswerValue {
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Single(token) => token.trim().is_empty(),
            AnswerValue::Multiple(tokens) => tokens.is_empty(),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Single(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Single(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(value: Vec<String>) -> Self {
        AnswerValue::Multiple(value)
    }
}

/// Question id to answer mapping. No schema is enforced here; consumers pick the
/// keys they understand and ignore the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, AnswerValue>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures and the CLI.
    pub fn with(mut self, question: &str, value: impl Into<AnswerValue>) -> Self {
        self.insert(question, value);
        self
    }

    pub fn insert(&mut self, question: &str, value: impl Into<AnswerValue>) {
        self.0.insert(question.to_string(), value.into());
    }

    pub fn remove(&mut self, question: &str) -> Option<AnswerValue> {
        self.0.remove(question)
    }

    pub fn get(&self, question: &str) -> Option<&AnswerValue> {
        self.0.get(question)
    }

    /// Single-select token for `question`. Blank strings and multi-select answers
    /// yield `None`.
    pub fn single(&self, question: &str) -> Option<&str> {
        match self.0.get(question) {
            Some(AnswerValue::Single(token)) if !token.trim().is_empty() => Some(token.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, AnswerValue)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (String, AnswerValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
