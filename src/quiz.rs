//! Quiz content and answer correctness
//!
//! This module defines the quiz data model (questions, options, time
//! limits) and the pure answer-correctness check. A quiz is immutable once
//! a session starts hosting it; question order may be shuffled exactly once
//! at session creation and never again mid-game.

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Sentinel value of [`Question::correct_index`] for text-entry questions
const TEXT_ENTRY_SENTINEL: i64 = -1;

/// The kind of a question, determining how it is presented and answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    /// Pick one option out of several
    MultipleChoice,
    /// Pick one of two options
    TrueFalse,
    /// Free-text answer checked against a canonical accepted answer
    ShortAnswer,
    /// Free-text completion checked against a canonical accepted answer
    FillInTheBlank,
}

impl QuestionType {
    /// Whether this question type is answered with free text
    pub fn is_text_entry(self) -> bool {
        matches!(self, Self::ShortAnswer | Self::FillInTheBlank)
    }
}

/// A submitted answer, shaped by the question type
///
/// Exactly one representation applies to any given question: index-based
/// for multiple choice and true/false, text for the text-entry types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Answer selected by option index (multiple choice, true/false)
    Indexed {
        /// Index into the question's options
        #[serde(rename = "answerIndex")]
        answer_index: usize,
    },
    /// Free-text answer (short answer, fill in the blank)
    Text {
        /// The submitted text
        #[serde(rename = "answerText")]
        answer_text: String,
    },
}

impl Answer {
    /// Creates an index-based answer
    pub fn indexed(answer_index: usize) -> Self {
        Self::Indexed { answer_index }
    }

    /// Creates a text answer
    pub fn text(answer_text: impl Into<String>) -> Self {
        Self::Text {
            answer_text: answer_text.into(),
        }
    }
}

/// A single question within a quiz
///
/// For multiple choice and true/false questions, `options` holds the
/// choices and `correct_index` points at the right one. For text-entry
/// questions `correct_index` is `-1` and `options` holds exactly one
/// element, the canonical accepted answer.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Stable identifier of the question within its quiz
    #[garde(skip)]
    pub id: String,
    /// The question kind
    #[garde(skip)]
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// The question text shown to everyone
    #[garde(length(chars, min = 1, max = crate::constants::quiz::MAX_QUESTION_LENGTH))]
    pub text: String,
    /// Choices (index types) or the single accepted answer (text types)
    #[garde(
        length(min = 1, max = crate::constants::quiz::MAX_OPTION_COUNT),
        inner(length(chars, max = crate::constants::quiz::MAX_OPTION_LENGTH))
    )]
    pub options: Vec<String>,
    /// Index of the correct option, or `-1` for text-entry questions
    #[garde(skip)]
    pub correct_index: i64,
    /// Time players have to answer, in seconds
    #[garde(range(
        min = crate::constants::quiz::MIN_TIME_LIMIT,
        max = crate::constants::quiz::MAX_TIME_LIMIT
    ))]
    pub time_limit_seconds: u32,
}

/// Information revealed to players after a round closes
///
/// Broadcast only while the session is in the REVEAL state. `correct_text`
/// is present only for text-entry questions so players can verify their own
/// submission locally.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultInfo {
    /// Index of the correct option, or `-1` for text-entry questions
    pub correct_index: i64,
    /// The canonical accepted answer for text-entry questions
    pub correct_text: Option<String>,
}

/// Normalizes a text answer for comparison: trim plus case-fold
///
/// No fuzzy matching; trailing punctuation is significant.
fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

impl ResultInfo {
    /// Judges an answer against the revealed result
    ///
    /// Lets a player work out their own round outcome locally from the
    /// broadcast, applying the same rules as [`Question::check`].
    pub fn judges(&self, answer: &Answer) -> bool {
        match answer {
            Answer::Indexed { answer_index } => {
                i64::try_from(*answer_index) == Ok(self.correct_index)
            }
            Answer::Text { answer_text } => self
                .correct_text
                .as_deref()
                .is_some_and(|accepted| normalize(answer_text) == normalize(accepted)),
        }
    }
}

impl Question {
    /// Whether this question is answered with free text
    pub fn is_text_entry(&self) -> bool {
        self.correct_index == TEXT_ENTRY_SENTINEL
    }

    /// Whether an answer has the shape required by this question's type
    ///
    /// A mismatched shape is a malformed submission and is rejected on the
    /// player side before it reaches the wire.
    pub fn accepts(&self, answer: &Answer) -> bool {
        match answer {
            Answer::Indexed { .. } => !self.is_text_entry(),
            Answer::Text { .. } => self.is_text_entry(),
        }
    }

    /// Judges a submitted answer against this question
    ///
    /// Index answers are correct iff they equal `correct_index`. Text
    /// answers are compared against the canonical answer after
    /// normalization (trim + case-fold). A mismatched answer shape is
    /// never correct. Absence of a submission is handled by the caller
    /// and counts as incorrect.
    pub fn check(&self, answer: &Answer) -> bool {
        match answer {
            Answer::Indexed { answer_index } => {
                !self.is_text_entry() && i64::try_from(*answer_index) == Ok(self.correct_index)
            }
            Answer::Text { answer_text } => {
                self.is_text_entry()
                    && self
                        .options
                        .first()
                        .is_some_and(|accepted| normalize(answer_text) == normalize(accepted))
            }
        }
    }

    /// Builds the result payload revealed to players after the round
    pub fn result_info(&self) -> ResultInfo {
        ResultInfo {
            correct_index: self.correct_index,
            correct_text: if self.is_text_entry() {
                self.options.first().cloned()
            } else {
                None
            },
        }
    }
}

/// A complete quiz: metadata plus an ordered list of questions
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    /// The quiz title
    #[garde(length(chars, max = crate::constants::quiz::MAX_TITLE_LENGTH))]
    pub title: String,
    /// The topic the quiz was built around
    #[garde(length(chars, max = crate::constants::quiz::MAX_TOPIC_LENGTH))]
    pub topic: String,
    /// The questions, in play order
    #[garde(length(min = 1, max = crate::constants::quiz::MAX_QUESTION_COUNT), dive)]
    pub questions: Vec<Question>,
}

impl Quiz {
    /// Returns the number of questions in this quiz
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Checks whether this quiz contains any questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Returns a copy of this quiz with its question order shuffled
    ///
    /// Called at most once, when a session is created. The question order
    /// is fixed for the lifetime of the session afterwards.
    pub fn shuffled(&self) -> Self {
        let mut questions = self.questions.clone();
        fastrand::shuffle(&mut questions);
        Self {
            title: self.title.clone(),
            topic: self.topic.clone(),
            questions,
        }
    }
}
