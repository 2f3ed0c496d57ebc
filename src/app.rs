use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::bank::{OptionKey, QuestionBank};
use crate::clock::{Clock, MonotonicClock};
use crate::error::{ExportError, LoadError, QuizError};
use crate::export::{self, ExportFormat};
use crate::keymap::{command_for, Command};
use crate::runtime::{QuizEvent, Timer};
use crate::session::{QuizSession, SessionState};

pub const LOAD_FAILED_MESSAGE: &str =
    "Failed to load questions! Check that the question file exists and is valid JSON.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Loading,
    LoadFailed,
    Welcome,
    Question,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Status {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub shuffle: bool,
    pub export_format: ExportFormat,
    pub export_dir: PathBuf,
}

/// Owns the session and everything the screens read from
#[derive(Debug)]
pub struct App<C: Clock = MonotonicClock> {
    pub state: AppState,
    pub session: QuizSession<C>,
    pub timer: Timer,
    pub settings: AppSettings,
    /// Option under the cursor for Up/Down + Enter selection
    pub highlighted: usize,
    bank: Option<Arc<QuestionBank>>,
    load_error: Option<String>,
    status: Option<Status>,
    displayed_elapsed: Duration,
}

impl App<MonotonicClock> {
    pub fn new(settings: AppSettings) -> Self {
        Self::with_session(settings, QuizSession::new())
    }
}

impl<C: Clock> App<C> {
    pub fn with_session(settings: AppSettings, session: QuizSession<C>) -> Self {
        Self {
            state: AppState::Loading,
            session,
            timer: Timer::default(),
            settings,
            highlighted: 0,
            bank: None,
            load_error: None,
            status: None,
            displayed_elapsed: Duration::ZERO,
        }
    }

    pub fn bank(&self) -> Option<&QuestionBank> {
        self.bank.as_deref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Clock shown on screen; frozen while paused and after completion
    pub fn displayed_elapsed(&self) -> Duration {
        self.displayed_elapsed
    }

    pub fn handle_event(&mut self, event: QuizEvent) -> Flow {
        match event {
            QuizEvent::Key(key) => match command_for(key, self.state, self.session.is_paused()) {
                Some(cmd) => self.apply(cmd),
                None => Flow::Continue,
            },
            QuizEvent::Tick => {
                self.on_tick();
                Flow::Continue
            }
            QuizEvent::Resize => Flow::Continue,
            QuizEvent::BankLoaded(result) => {
                self.on_bank_loaded(result);
                Flow::Continue
            }
        }
    }

    pub fn on_bank_loaded(&mut self, result: Result<QuestionBank, LoadError>) {
        if self.state != AppState::Loading {
            tracing::warn!("ignoring repeated bank load");
            return;
        }

        match result {
            Ok(bank) => {
                let bank = if self.settings.shuffle {
                    bank.shuffled(&mut rand::thread_rng())
                } else {
                    bank
                };
                self.bank = Some(Arc::new(bank));
                self.state = AppState::Welcome;
            }
            Err(e) => {
                self.load_error = Some(e.to_string());
                self.state = AppState::LoadFailed;
            }
        }
    }

    /// Refreshes the visible clock only; scoring state is never touched here.
    pub fn on_tick(&mut self) {
        if self.timer.is_armed() && !self.session.is_paused() {
            self.displayed_elapsed = self.session.elapsed();
        }
    }

    pub fn apply(&mut self, cmd: Command) -> Flow {
        match cmd {
            Command::Start => self.start(),
            Command::Answer(key) => self.answer(key),
            Command::Confirm => self.confirm(),
            Command::HighlightUp => {
                self.highlighted = self.highlighted.saturating_sub(1);
            }
            Command::HighlightDown => {
                let options = self
                    .session
                    .current_question()
                    .map(|q| q.options.len())
                    .unwrap_or(0);
                if self.highlighted + 1 < options {
                    self.highlighted += 1;
                }
            }
            Command::Advance => self.advance(),
            Command::Retreat => {
                self.session.retreat();
                self.highlighted = 0;
            }
            Command::TogglePause => {
                let paused = self.session.toggle_pause();
                self.displayed_elapsed = self.session.elapsed();
                self.status = paused.then(|| Status::info("Paused. Press space to continue."));
            }
            Command::Review => self.review(),
            Command::Export => self.export(),
            Command::NewRun => {
                self.reset();
                self.start();
            }
            Command::Reset => self.reset(),
            Command::Quit => {
                self.timer.cancel();
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    fn start(&mut self) {
        let Some(bank) = self.bank.clone() else {
            self.status = Some(Status::error("Questions have not been loaded yet!"));
            return;
        };

        self.session.start(&bank);
        self.timer.arm();
        self.highlighted = 0;
        self.displayed_elapsed = self.session.elapsed();
        self.state = AppState::Question;
    }

    fn answer(&mut self, key: OptionKey) {
        match self.session.answer_current(key) {
            Ok(_) => {
                self.status = None;
                if let Some(idx) = self
                    .session
                    .current_question()
                    .and_then(|q| q.options.iter().position(|(k, _)| *k == key))
                {
                    self.highlighted = idx;
                }
            }
            Err(QuizError::AlreadyAnswered) => {
                self.status = Some(Status::info("Already answered."));
            }
            Err(QuizError::InvalidOption { key, .. }) => {
                self.status = Some(Status::info(format!("There is no option {key}.")));
            }
            Err(QuizError::NotInProgress) => {}
            Err(e) => self.report(e),
        }
    }

    fn confirm(&mut self) {
        if self.session.current_outcome().is_some() {
            self.advance();
            return;
        }
        let key = self
            .session
            .current_question()
            .and_then(|q| q.options.get(self.highlighted))
            .map(|(k, _)| *k);
        if let Some(key) = key {
            self.answer(key);
        }
    }

    fn advance(&mut self) {
        if self.session.advance() == SessionState::Completed {
            self.finish();
        }
        self.highlighted = 0;
    }

    fn finish(&mut self) {
        self.timer.cancel();
        self.displayed_elapsed = self.session.elapsed();
        self.status = None;
        self.state = AppState::Results;
    }

    fn review(&mut self) {
        let Some(bank) = self.bank.clone() else {
            return;
        };
        match self.session.enter_review_mode(&bank) {
            Ok(count) => {
                self.session.start(&bank);
                self.timer.arm();
                self.highlighted = 0;
                self.state = AppState::Question;
                self.status = Some(Status::info(format!(
                    "Review mode: {count} questions to redo"
                )));
            }
            Err(QuizError::NoMistakes) => {
                self.status = Some(Status::info("No mistakes to review!"));
            }
            Err(e) => self.report(e),
        }
    }

    fn export(&mut self) {
        let mistakes = match self.session.mistakes() {
            Ok(mistakes) => mistakes,
            Err(e) => return self.report(e),
        };
        let count = mistakes.len();
        let result =
            export::write_export(&self.settings.export_dir, self.settings.export_format, &mistakes);

        self.status = Some(match result {
            Ok(path) => Status::info(format!("{count} mistakes exported to {}", path.display())),
            Err(ExportError::NoMistakes) => Status::info("No mistakes to export!"),
            Err(e) => {
                tracing::error!("export failed: {e}");
                Status::error(format!("Export failed: {e}"))
            }
        });
    }

    fn reset(&mut self) {
        self.timer.cancel();
        self.session.reset();
        self.highlighted = 0;
        self.displayed_elapsed = Duration::ZERO;
        self.status = None;
        if self.bank.is_some() {
            self.state = AppState::Welcome;
        }
    }

    fn report(&mut self, e: QuizError) {
        tracing::error!("session inconsistency: {e}");
        self.status = Some(Status::error(e.to_string()));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bank::tests::two_question_bank;
    use crate::clock::ManualClock;
    use crate::session::Mode;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    pub(crate) fn settings(dir: &std::path::Path) -> AppSettings {
        AppSettings {
            shuffle: false,
            export_format: ExportFormat::Text,
            export_dir: dir.to_path_buf(),
        }
    }

    pub(crate) fn loaded_app(dir: &std::path::Path) -> (App<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let mut app = App::with_session(settings(dir), QuizSession::with_clock(clock.clone()));
        app.on_bank_loaded(Ok(two_question_bank()));
        (app, clock)
    }

    fn key(app: &mut App<ManualClock>, code: KeyCode) -> Flow {
        app.handle_event(QuizEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    #[test]
    fn test_starts_in_loading_state() {
        let app = App::new(settings(std::path::Path::new(".")));
        assert_eq!(app.state, AppState::Loading);
        assert!(app.bank().is_none());
    }

    #[test]
    fn test_load_failure_blocks_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(settings(dir.path()));
        app.on_bank_loaded(Err(LoadError::Empty));

        assert_eq!(app.state, AppState::LoadFailed);
        assert_eq!(app.load_error(), Some("question bank has no questions"));

        app.apply(Command::Start);
        assert_eq!(app.state, AppState::LoadFailed);
        assert!(!app.timer.is_armed());
        assert_eq!(app.status().unwrap().kind, StatusKind::Error);
    }

    #[test]
    fn test_second_load_result_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = loaded_app(dir.path());
        app.on_bank_loaded(Err(LoadError::Empty));
        assert_eq!(app.state, AppState::Welcome);
        assert!(app.load_error().is_none());
    }

    #[test]
    fn test_keyboard_session_flow() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = loaded_app(dir.path());

        key(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::Question);
        assert!(app.timer.is_armed());

        key(&mut app, KeyCode::Char('a'));
        key(&mut app, KeyCode::Right);
        key(&mut app, KeyCode::Char('a'));
        key(&mut app, KeyCode::Right);

        assert_eq!(app.state, AppState::Results);
        assert!(!app.timer.is_armed());
        let summary = app.session.summary().unwrap();
        assert_eq!(summary.correct_count, 1);
        assert_eq!(summary.incorrect_count, 1);
        assert_eq!(summary.percentage, 50);
    }

    #[test]
    fn test_highlight_and_enter_use_same_answer_path() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = loaded_app(dir.path());
        app.apply(Command::Start);

        app.apply(Command::HighlightDown);
        app.apply(Command::HighlightDown);
        assert_eq!(app.highlighted, 1);
        app.apply(Command::Confirm);

        let answers = app.session.answers();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].selected_option, OptionKey::new('B').unwrap());

        // a letter after the fact is rejected exactly like a repeated Enter would be
        app.apply(Command::Answer(OptionKey::new('A').unwrap()));
        assert_eq!(app.session.answers().len(), 1);
        assert_eq!(app.status().unwrap().text, "Already answered.");

        // Enter on an answered question moves on
        app.apply(Command::Confirm);
        assert_eq!(app.session.position(), 1);
    }

    #[test]
    fn test_unknown_letter_is_informational() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = loaded_app(dir.path());
        app.apply(Command::Start);

        key(&mut app, KeyCode::Char('z'));

        assert!(app.session.answers().is_empty());
        let status = app.status().unwrap();
        assert_eq!(status.kind, StatusKind::Info);
        assert_eq!(status.text, "There is no option Z.");
    }

    #[test]
    fn test_tick_never_touches_scoring_state() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, clock) = loaded_app(dir.path());
        app.apply(Command::Start);
        key(&mut app, KeyCode::Char('b'));
        let answers = app.session.answers().to_vec();
        let position = app.session.position();

        clock.advance(Duration::from_secs(3));
        app.handle_event(QuizEvent::Tick);

        assert_eq!(app.displayed_elapsed(), Duration::from_secs(3));
        assert_eq!(app.session.answers(), answers.as_slice());
        assert_eq!(app.session.position(), position);
    }

    #[test]
    fn test_displayed_clock_freezes_while_paused() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, clock) = loaded_app(dir.path());
        app.apply(Command::Start);
        clock.advance(Duration::from_secs(2));

        key(&mut app, KeyCode::Char(' '));
        clock.advance(Duration::from_secs(30));
        app.on_tick();
        assert_eq!(app.displayed_elapsed(), Duration::from_secs(2));

        // answers are blocked while paused
        key(&mut app, KeyCode::Char('a'));
        assert!(app.session.answers().is_empty());

        key(&mut app, KeyCode::Char(' '));
        clock.advance(Duration::from_secs(1));
        app.on_tick();
        assert_eq!(app.displayed_elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn test_review_flow_and_announcement() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = loaded_app(dir.path());
        app.apply(Command::Start);
        key(&mut app, KeyCode::Char('a'));
        key(&mut app, KeyCode::Right);
        key(&mut app, KeyCode::Char('a'));
        key(&mut app, KeyCode::Right);

        key(&mut app, KeyCode::Char('r'));

        assert_eq!(app.state, AppState::Question);
        assert_eq!(app.session.mode(), Mode::Review);
        assert!(app.timer.is_armed());
        assert_eq!(app.status().unwrap().text, "Review mode: 1 questions to redo");
        assert_eq!(app.session.current_question().unwrap().prompt, "Second?");
    }

    #[test]
    fn test_review_without_mistakes_stays_on_results() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = loaded_app(dir.path());
        app.apply(Command::Start);
        key(&mut app, KeyCode::Char('a'));
        key(&mut app, KeyCode::Right);
        key(&mut app, KeyCode::Char('b'));
        key(&mut app, KeyCode::Right);

        key(&mut app, KeyCode::Char('r'));

        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.status().unwrap().text, "No mistakes to review!");
        assert_eq!(app.status().unwrap().kind, StatusKind::Info);
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = loaded_app(dir.path());
        app.apply(Command::Start);
        key(&mut app, KeyCode::Char('b'));
        key(&mut app, KeyCode::Right);
        key(&mut app, KeyCode::Right);

        key(&mut app, KeyCode::Char('x'));

        let status = app.status().unwrap();
        assert!(status.text.starts_with("1 mistakes exported to"), "{}", status.text);
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_export_without_mistakes_is_informational() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = loaded_app(dir.path());
        app.apply(Command::Start);
        app.apply(Command::Advance);
        app.apply(Command::Advance);

        app.apply(Command::Export);

        assert_eq!(app.status().unwrap().text, "No mistakes to export!");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_reset_cancels_timer_and_returns_to_welcome() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = loaded_app(dir.path());
        app.apply(Command::Start);
        key(&mut app, KeyCode::Char('a'));

        key(&mut app, KeyCode::Esc);

        assert_eq!(app.state, AppState::Welcome);
        assert!(!app.timer.is_armed());
        assert!(app.session.answers().is_empty());
        assert_eq!(app.displayed_elapsed(), Duration::ZERO);
        // the timer was already stopped by the reset
        assert!(!app.timer.cancel());
    }

    #[test]
    fn test_new_run_restarts_from_first_question() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = loaded_app(dir.path());
        app.apply(Command::Start);
        app.apply(Command::Advance);
        app.apply(Command::Advance);
        assert_eq!(app.state, AppState::Results);

        key(&mut app, KeyCode::Char('n'));

        assert_eq!(app.state, AppState::Question);
        assert_eq!(app.session.position(), 0);
        assert!(app.timer.is_armed());
    }

    #[test]
    fn test_quit_from_welcome_and_ctrl_c() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = loaded_app(dir.path());
        assert_eq!(key(&mut app, KeyCode::Esc), Flow::Quit);

        app.apply(Command::Start);
        let flow = app.handle_event(QuizEvent::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert_eq!(flow, Flow::Quit);
        assert!(!app.timer.is_armed());
    }
}
