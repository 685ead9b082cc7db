//! Answer state for a set of tag questions.

use crate::config::QuestionSpec;

/// One question plus the operator's current answer.
///
/// An open-ended entry, when filled in, takes precedence over a selected
/// preset answer.
#[derive(Debug, Clone)]
pub struct Question {
    spec: QuestionSpec,
    selected: Option<String>,
    open_entry: String,
}

impl Question {
    pub fn new(spec: QuestionSpec) -> Self {
        Self {
            spec,
            selected: None,
            open_entry: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &QuestionSpec {
        &self.spec
    }

    /// Select one of the preset answers. Unknown options are ignored.
    pub fn select(&mut self, answer: &str) {
        if self.spec.answers.iter().any(|a| a == answer) {
            self.selected = Some(answer.to_string());
        }
    }

    /// Replace the free-text entry. Ignored for questions that are not
    /// open ended.
    pub fn set_open_entry(&mut self, text: &str) {
        if self.spec.open_ended {
            self.open_entry = text.to_string();
        }
    }

    /// The effective answer, if any.
    pub fn answer(&self) -> Option<&str> {
        if self.spec.open_ended && !self.open_entry.is_empty() {
            return Some(&self.open_entry);
        }
        self.selected.as_deref()
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.open_entry.clear();
    }
}

/// The full set of questions shown for one group or one image.
#[derive(Debug, Clone, Default)]
pub struct AnswerSheet {
    questions: Vec<Question>,
}

impl AnswerSheet {
    pub fn new(specs: &[QuestionSpec]) -> Self {
        Self {
            questions: specs.iter().cloned().map(Question::new).collect(),
        }
    }

    pub fn questions_mut(&mut self) -> &mut [Question] {
        &mut self.questions
    }

    /// Column names for the CSV logs, in question order.
    pub fn column_names(&self) -> Vec<String> {
        self.questions
            .iter()
            .map(|q| q.name().to_string())
            .collect()
    }

    /// True when any question has an answer (something was clicked).
    pub fn any_answered(&self) -> bool {
        self.questions.iter().any(|q| q.answer().is_some())
    }

    /// The first unanswered question's name, if any.
    pub fn first_missing(&self) -> Option<&str> {
        self.questions
            .iter()
            .find(|q| q.answer().is_none())
            .map(Question::name)
    }

    /// All answers in question order; `None` unless every question is
    /// answered.
    pub fn answers(&self) -> Option<Vec<String>> {
        self.questions
            .iter()
            .map(|q| q.answer().map(str::to_string))
            .collect()
    }

    /// Deselect everything, ready for the next image or group.
    pub fn clear(&mut self) {
        for question in &mut self.questions {
            question.clear();
        }
    }
}
