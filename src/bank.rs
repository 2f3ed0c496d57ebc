use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::{LoadError, QuizError};

static BANK_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/banks");

pub const DEFAULT_BUNDLED_BANK: &str = "sample";

/// Stable identifier of a question, shared by normal and review play
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A single-letter option key, always stored uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionKey(char);

impl OptionKey {
    /// Accepts ASCII letters, normalising to uppercase.
    pub fn new(c: char) -> Option<Self> {
        c.is_ascii_alphabetic()
            .then(|| Self(c.to_ascii_uppercase()))
    }

    pub fn as_char(&self) -> char {
        self.0
    }

    fn parse(s: &str) -> Option<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(c),
            _ => None,
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub category: Option<String>,
    /// Display order is source order
    pub options: Vec<(OptionKey, String)>,
    pub correct_option: OptionKey,
    pub explanation: String,
}

impl Question {
    pub fn category_label(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => "General",
        }
    }

    pub fn option_text(&self, key: OptionKey) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, text)| text.as_str())
    }

    pub fn has_option(&self, key: OptionKey) -> bool {
        self.option_text(key).is_some()
    }
}

/// Where a bank comes from
#[derive(Debug, Clone, PartialEq)]
pub enum BankSource {
    File(PathBuf),
    Bundled(String),
}

impl fmt::Display for BankSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankSource::File(path) => write!(f, "{}", path.display()),
            BankSource::Bundled(name) => write!(f, "bundled:{name}"),
        }
    }
}

/// Ordered questions, read-only once loaded
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBank {
    pub title: String,
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn load(source: &BankSource) -> Result<Self, LoadError> {
        match source {
            BankSource::File(path) => Self::from_path(path),
            BankSource::Bundled(name) => Self::bundled(name),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn bundled(name: &str) -> Result<Self, LoadError> {
        let file = BANK_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| LoadError::UnknownBundled(name.to_string()))?;
        let text = file
            .contents_utf8()
            .ok_or_else(|| LoadError::Malformed(format!("bundled bank '{name}' is not utf-8")))?;
        Self::from_json(text)
    }

    /// Names of the banks compiled into the binary
    pub fn bundled_names() -> Vec<String> {
        let mut names: Vec<String> = BANK_DIR
            .files()
            .filter_map(|f| f.path().file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        let raw: RawBank = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawBank) -> Result<Self, LoadError> {
        if raw.questions.is_empty() {
            return Err(LoadError::Empty);
        }

        let mut seen = HashSet::new();
        let mut questions = Vec::with_capacity(raw.questions.len());

        for (idx, rq) in raw.questions.into_iter().enumerate() {
            let number = idx + 1;
            let id = match rq.id {
                serde_json::Value::String(s) if !s.trim().is_empty() => QuestionId::new(s),
                serde_json::Value::Number(n) => QuestionId::new(n.to_string()),
                other => {
                    return Err(LoadError::Malformed(format!(
                        "question {number} has an invalid id: {other}"
                    )))
                }
            };
            if !seen.insert(id.clone()) {
                return Err(LoadError::Malformed(format!("duplicate question id {id}")));
            }

            if rq.options.0.is_empty() {
                return Err(LoadError::Malformed(format!("question {id} has no options")));
            }
            let mut options = Vec::with_capacity(rq.options.0.len());
            for (key, text) in rq.options.0 {
                let key = OptionKey::parse(&key).ok_or_else(|| {
                    LoadError::Malformed(format!(
                        "question {id} has option key '{key}', expected a single letter"
                    ))
                })?;
                if options.iter().any(|(k, _)| *k == key) {
                    return Err(LoadError::Malformed(format!(
                        "question {id} repeats option {key}"
                    )));
                }
                options.push((key, text));
            }

            let correct_option = OptionKey::parse(&rq.correct_option)
                .filter(|k| options.iter().any(|(o, _)| o == k))
                .ok_or_else(|| {
                    LoadError::Malformed(format!(
                        "question {id} marks '{}' correct but offers no such option",
                        rq.correct_option
                    ))
                })?;

            questions.push(Question {
                id,
                prompt: rq.prompt,
                category: rq.category,
                options,
                correct_option,
                explanation: rq.explanation,
            });
        }

        Ok(Self {
            title: raw.title,
            questions,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Question> {
        self.questions.get(idx)
    }

    pub fn index_of(&self, id: &QuestionId) -> Option<usize> {
        self.questions.iter().position(|q| &q.id == id)
    }

    pub fn by_id(&self, id: &QuestionId) -> Result<&Question, QuizError> {
        self.questions
            .iter()
            .find(|q| &q.id == id)
            .ok_or_else(|| QuizError::NotFound(id.clone()))
    }

    /// Reordered copy; only meant to be taken before a session starts.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut questions = self.questions.clone();
        questions.shuffle(rng);
        Self {
            title: self.title.clone(),
            questions,
        }
    }
}

#[derive(Deserialize)]
struct RawBank {
    #[serde(alias = "titulo")]
    title: String,
    #[serde(alias = "questoes")]
    questions: Vec<RawQuestion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    id: serde_json::Value,
    #[serde(alias = "pergunta")]
    prompt: String,
    #[serde(default, alias = "tipo")]
    category: Option<String>,
    #[serde(alias = "opcoes")]
    options: RawOptions,
    #[serde(alias = "correta", alias = "correct_option")]
    correct_option: String,
    #[serde(alias = "explicacao")]
    explanation: String,
}

/// Option map that keeps source order regardless of serde_json features
struct RawOptions(Vec<(String, String)>);

impl<'de> Deserialize<'de> for RawOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OptionsVisitor;

        impl<'de> Visitor<'de> for OptionsVisitor {
            type Value = RawOptions;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of option letter to option text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawOptions, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(4));
                while let Some((key, text)) = map.next_entry::<String, String>()? {
                    entries.push((key, text));
                }
                Ok(RawOptions(entries))
            }
        }

        deserializer.deserialize_map(OptionsVisitor)
    }
}

impl fmt::Debug for RawOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
