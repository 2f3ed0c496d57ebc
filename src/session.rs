use std::sync::Arc;
use std::time::Duration;

use crate::bank::{OptionKey, Question, QuestionBank, QuestionId};
use crate::clock::{Clock, MonotonicClock, Stopwatch};
use crate::error::QuizError;
use crate::util::percentage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum Mode {
    #[default]
    Normal,
    Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// One recorded answer. At most one exists per question per play-through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub position_at_answer_time: usize,
    pub selected_option: OptionKey,
    pub correct_option: OptionKey,
    pub is_correct: bool,
}

/// What the shell shows once a question has an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub selected: OptionKey,
    pub correct_option: OptionKey,
    pub is_correct: bool,
    pub explanation: String,
}

impl AnswerOutcome {
    fn from_record(record: &AnswerRecord, question: &Question) -> Self {
        Self {
            selected: record.selected_option,
            correct_option: record.correct_option,
            is_correct: record.is_correct,
            explanation: question.explanation.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub total: usize,
    pub percentage: u32,
    pub elapsed_seconds: u64,
}

/// A single play-through over either the whole bank or the missed questions.
///
/// All mutation goes through the methods below; the presentation layer only
/// reads. The active sequence holds indices into the bank, which never changes
/// while a session refers to it.
#[derive(Debug)]
pub struct QuizSession<C: Clock = MonotonicClock> {
    bank: Option<Arc<QuestionBank>>,
    mode: Mode,
    state: SessionState,
    sequence: Vec<usize>,
    position: usize,
    answers: Vec<AnswerRecord>,
    correct_count: usize,
    incorrect_count: usize,
    paused: bool,
    stopwatch: Stopwatch,
    clock: C,
}

impl QuizSession<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock)
    }
}

impl Default for QuizSession<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> QuizSession<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            bank: None,
            mode: Mode::Normal,
            state: SessionState::NotStarted,
            sequence: Vec::new(),
            position: 0,
            answers: Vec::new(),
            correct_count: 0,
            incorrect_count: 0,
            paused: false,
            stopwatch: Stopwatch::default(),
            clock,
        }
    }

    pub fn start(&mut self, bank: &Arc<QuestionBank>) -> SessionState {
        match self.state {
            SessionState::InProgress => {
                tracing::debug!("start requested while in progress, keeping answers");
            }
            SessionState::NotStarted | SessionState::Completed => {
                if self.mode == Mode::Normal {
                    self.sequence = (0..bank.len()).collect();
                }
                self.begin_run();
                self.state = SessionState::InProgress;
                tracing::info!(
                    mode = %self.mode,
                    questions = self.sequence.len(),
                    "quiz started"
                );
            }
        }
        self.bank = Some(Arc::clone(bank));

        if !self.paused {
            self.stopwatch.start(self.clock.now());
        }
        self.state
    }

    fn begin_run(&mut self) {
        self.position = 0;
        self.answers.clear();
        self.correct_count = 0;
        self.incorrect_count = 0;
        self.paused = false;
    }

    fn question_at(&self, position: usize) -> Option<&Question> {
        let bank = self.bank.as_ref()?;
        self.sequence
            .get(position)
            .and_then(|&idx| bank.get(idx))
    }

    /// `None` once the play-through is complete or before it starts.
    pub fn current_question(&self) -> Option<&Question> {
        if self.state != SessionState::InProgress {
            return None;
        }
        self.question_at(self.position)
    }

    pub fn answer(
        &mut self,
        question_id: &QuestionId,
        selected: OptionKey,
    ) -> Result<AnswerOutcome, QuizError> {
        if self.state != SessionState::InProgress {
            return Err(QuizError::NotInProgress);
        }
        if self.record_for(question_id).is_some() {
            tracing::debug!(question = %question_id, "ignoring repeat answer");
            return Err(QuizError::AlreadyAnswered);
        }

        let bank = self.bank.clone().ok_or(QuizError::NotInProgress)?;
        let position = self
            .sequence
            .iter()
            .position(|&idx| bank.get(idx).is_some_and(|q| &q.id == question_id))
            .ok_or_else(|| QuizError::NotFound(question_id.clone()))?;
        let question = &bank.questions()[self.sequence[position]];

        if !question.has_option(selected) {
            return Err(QuizError::InvalidOption {
                question: question_id.clone(),
                key: selected,
            });
        }

        let record = AnswerRecord {
            question_id: question_id.clone(),
            position_at_answer_time: position,
            selected_option: selected,
            correct_option: question.correct_option,
            is_correct: selected == question.correct_option,
        };

        if record.is_correct {
            self.correct_count += 1;
        } else {
            self.incorrect_count += 1;
        }
        tracing::debug!(
            question = %question_id,
            selected = %selected,
            correct = record.is_correct,
            "answer recorded"
        );

        let outcome = AnswerOutcome::from_record(&record, question);
        self.answers.push(record);
        debug_assert_eq!(self.correct_count + self.incorrect_count, self.answers.len());
        Ok(outcome)
    }

    /// Answers whatever question is on screen
    pub fn answer_current(&mut self, selected: OptionKey) -> Result<AnswerOutcome, QuizError> {
        let id = self
            .current_question()
            .map(|q| q.id.clone())
            .ok_or(QuizError::NotInProgress)?;
        self.answer(&id, selected)
    }

    fn record_for(&self, question_id: &QuestionId) -> Option<&AnswerRecord> {
        self.answers.iter().find(|a| &a.question_id == question_id)
    }

    /// The stored outcome for a question, used when revisiting it.
    pub fn outcome_for(&self, question_id: &QuestionId) -> Option<AnswerOutcome> {
        let record = self.record_for(question_id)?;
        let question = self.bank.as_ref()?.by_id(question_id).ok()?;
        Some(AnswerOutcome::from_record(record, question))
    }

    pub fn current_outcome(&self) -> Option<AnswerOutcome> {
        self.current_question()
            .and_then(|q| self.outcome_for(&q.id))
    }

    pub fn advance(&mut self) -> SessionState {
        if self.state != SessionState::InProgress {
            return self.state;
        }

        if self.position + 1 < self.sequence.len() {
            self.position += 1;
        } else {
            self.complete();
        }
        self.state
    }

    fn complete(&mut self) {
        self.stopwatch.stop(self.clock.now());
        self.paused = false;
        self.position = self.sequence.len();
        self.state = SessionState::Completed;
        tracing::info!(
            mode = %self.mode,
            correct = self.correct_count,
            incorrect = self.incorrect_count,
            elapsed_secs = self.elapsed().as_secs(),
            "quiz completed"
        );
    }

    pub fn retreat(&mut self) {
        if self.state == SessionState::InProgress && self.position > 0 {
            self.position -= 1;
        }
    }

    /// Returns the new paused flag. Ignored outside a running play-through.
    pub fn toggle_pause(&mut self) -> bool {
        if self.state != SessionState::InProgress {
            return self.paused;
        }

        let now = self.clock.now();
        self.paused = !self.paused;
        if self.paused {
            self.stopwatch.pause(now);
        } else {
            self.stopwatch.resume(now);
        }
        tracing::debug!(paused = self.paused, "pause toggled");
        self.paused
    }

    /// Replays the questions answered wrongly, in the order they were missed.
    /// Returns the number of questions to redo; the caller then calls `start`.
    pub fn enter_review_mode(&mut self, bank: &Arc<QuestionBank>) -> Result<usize, QuizError> {
        let sequence = self
            .answers
            .iter()
            .filter(|a| !a.is_correct)
            .map(|a| {
                bank.index_of(&a.question_id)
                    .ok_or_else(|| QuizError::NotFound(a.question_id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if sequence.is_empty() {
            return Err(QuizError::NoMistakes);
        }

        self.stopwatch.stop(self.clock.now());
        self.bank = Some(Arc::clone(bank));
        self.mode = Mode::Review;
        self.sequence = sequence;
        self.begin_run();
        self.state = SessionState::NotStarted;
        tracing::info!(questions = self.sequence.len(), "entering review mode");
        Ok(self.sequence.len())
    }

    pub fn reset(&mut self) {
        self.bank = None;
        self.mode = Mode::Normal;
        self.state = SessionState::NotStarted;
        self.sequence.clear();
        self.begin_run();
        self.stopwatch.reset();
        tracing::info!("session reset");
    }

    pub fn summary(&self) -> Option<Summary> {
        if self.state != SessionState::Completed {
            return None;
        }
        Some(Summary {
            correct_count: self.correct_count,
            incorrect_count: self.incorrect_count,
            total: self.sequence.len(),
            percentage: percentage(self.correct_count, self.sequence.len()),
            elapsed_seconds: self.elapsed().as_secs(),
        })
    }

    pub fn mistakes(&self) -> Result<Vec<(&AnswerRecord, &Question)>, QuizError> {
        let Some(bank) = self.bank.as_ref() else {
            return Ok(Vec::new());
        };
        self.answers
            .iter()
            .filter(|a| !a.is_correct)
            .map(|a| bank.by_id(&a.question_id).map(|q| (a, q)))
            .collect()
    }

    pub fn elapsed(&self) -> Duration {
        self.stopwatch.elapsed(self.clock.now())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.position + 1 >= self.sequence.len()
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn incorrect_count(&self) -> usize {
        self.incorrect_count
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
