use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::bank::Question;
use crate::error::ExportError;
use crate::session::AnswerRecord;
use crate::util::strip_markup;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Text,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Plain-text listing of mistakes, one block per question separated by `---`.
pub fn render_text(mistakes: &[(&AnswerRecord, &Question)]) -> String {
    mistakes
        .iter()
        .map(|(record, question)| {
            format!(
                "Question: {}\nYour answer: {}\nCorrect: {}\nExplanation: {}\n",
                strip_markup(&question.prompt),
                describe(question, record.selected_option),
                describe(question, record.correct_option),
                strip_markup(&question.explanation),
            )
        })
        .join("\n---\n")
}

pub fn render_csv(mistakes: &[(&AnswerRecord, &Question)]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "number",
        "category",
        "question",
        "your_answer",
        "correct_answer",
        "explanation",
    ])?;

    for (record, question) in mistakes {
        writer.write_record([
            (record.position_at_answer_time + 1).to_string(),
            question.category_label().to_string(),
            strip_markup(&question.prompt),
            describe(question, record.selected_option),
            describe(question, record.correct_option),
            strip_markup(&question.explanation),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn describe(question: &Question, key: crate::bank::OptionKey) -> String {
    match question.option_text(key) {
        Some(text) => format!("{key}) {}", strip_markup(text)),
        None => key.to_string(),
    }
}

pub fn render(
    format: ExportFormat,
    mistakes: &[(&AnswerRecord, &Question)],
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Text => Ok(render_text(mistakes)),
        ExportFormat::Csv => render_csv(mistakes),
    }
}

/// Writes the mistakes into a timestamped file under `dir`.
pub fn write_export(
    dir: &Path,
    format: ExportFormat,
    mistakes: &[(&AnswerRecord, &Question)],
) -> Result<PathBuf, ExportError> {
    if mistakes.is_empty() {
        return Err(ExportError::NoMistakes);
    }

    let body = render(format, mistakes)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "mistakes-{}.{}",
        Local::now().format("%Y%m%d-%H%M%S"),
        format.extension()
    ));
    fs::write(&path, body)?;

    tracing::info!(path = %path.display(), count = mistakes.len(), "mistakes exported");
    Ok(path)
}
