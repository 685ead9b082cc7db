//! Command-line arguments and tag-question configuration.
//!
//! Question definitions come from a JSON file with two sections:
//!
//! ```json
//! {
//!   "group_level": [
//!     { "name": "habitat", "description": "habitat type",
//!       "answers": ["forest", "field"], "open_ended": false }
//!   ],
//!   "image_level": [ ... ]
//! }
//! ```
//!
//! All four fields are required on every question; a malformed file is a
//! construction-time failure, never a per-row one.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

/// Display zoom applied to previews while cropping.
pub const DEFAULT_ZOOM: f64 = 0.5;

/// Display zoom for the detail-crop pass.
pub const DETAIL_ZOOM: f64 = 2.0;

/// Batch image cropping and tagging.
#[derive(Debug, Parser)]
#[command(name = "groupcrop", version, about)]
pub struct Args {
    /// Directory holding the images to crop.
    #[arg(short = 'i', long)]
    pub image_path: PathBuf,

    /// Directory where cropped images and CSV logs are written.
    #[arg(short = 'o', long)]
    pub output_path: PathBuf,

    /// Images per group. Without this, each directory forms one group.
    #[arg(short = 's', long)]
    pub size_of_group: Option<usize>,

    /// Question definition file.
    #[arg(short = 'q', long, default_value = "questions.json")]
    pub questions: PathBuf,

    /// Prepend the built-in "number of classes of targets" group question.
    #[arg(long)]
    pub grouping: bool,

    /// Mirror every image left-to-right before cropping.
    #[arg(long)]
    pub flip: bool,

    /// Preview zoom factor.
    #[arg(long, default_value_t = DEFAULT_ZOOM)]
    pub zoom: f64,
}

/// Errors loading or validating the question configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read question file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed question file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("question '{0}' has a non-scalar answer option")]
    BadAnswer(String),

    #[error("question '{0}' defines no answers and is not open ended")]
    Unanswerable(String),
}

/// One tag question as defined in the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDef {
    pub name: String,
    pub description: String,
    /// Answer options; scalars only (numbers are stringified).
    pub answers: Vec<serde_json::Value>,
    /// Whether a free-text answer is also accepted.
    pub open_ended: bool,
}

#[derive(Debug, Deserialize)]
struct QuestionsFile {
    group_level: Vec<QuestionDef>,
    image_level: Vec<QuestionDef>,
}

/// A validated question, answers normalized to strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSpec {
    pub name: String,
    pub description: String,
    pub answers: Vec<String>,
    pub open_ended: bool,
}

/// Validated question configuration.
#[derive(Debug, Clone)]
pub struct QuestionSet {
    pub group_level: Vec<QuestionSpec>,
    pub image_level: Vec<QuestionSpec>,
}

impl QuestionSet {
    /// Load and validate the question file. With `grouping`, the built-in
    /// target-class-count question is prepended to the group section.
    pub fn load(path: &Path, grouping: bool) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: QuestionsFile = serde_json::from_str(&text)?;

        let mut group_level = Vec::with_capacity(file.group_level.len() + 1);
        if grouping {
            group_level.push(grouping_question());
        }
        for def in file.group_level {
            group_level.push(validate(def)?);
        }
        let image_level = file
            .image_level
            .into_iter()
            .map(validate)
            .collect::<Result<_, _>>()?;

        Ok(Self {
            group_level,
            image_level,
        })
    }
}

/// The built-in group question asked when grouping is enabled.
fn grouping_question() -> QuestionSpec {
    QuestionSpec {
        name: "nr_groups".to_string(),
        description: "number of classes of targets".to_string(),
        answers: vec!["0", "1", "2", "3"]
            .into_iter()
            .map(String::from)
            .collect(),
        open_ended: true,
    }
}

fn validate(def: QuestionDef) -> Result<QuestionSpec, ConfigError> {
    let mut answers = Vec::with_capacity(def.answers.len());
    for value in &def.answers {
        let label = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => return Err(ConfigError::BadAnswer(def.name)),
        };
        answers.push(label);
    }
    if answers.is_empty() && !def.open_ended {
        return Err(ConfigError::Unanswerable(def.name));
    }
    Ok(QuestionSpec {
        name: def.name,
        description: def.description,
        answers,
        open_ended: def.open_ended,
    })
}
