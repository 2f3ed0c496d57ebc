use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::bank::{BankSource, QuestionBank};
use crate::error::LoadError;

/// Unified event type consumed by the app runner
#[derive(Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// The one-time result of loading the question bank
    BankLoaded(Result<QuestionBank, LoadError>),
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait QuizEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<QuizEvent>,
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        std::thread::spawn(move || loop {
            match event::read() {
                // release/repeat events would answer twice on some terminals
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    if input_tx.send(QuizEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if input_tx.send(QuizEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("terminal input failed: {e}");
                    break;
                }
            }
        });

        Self { tx, rx }
    }

    /// Extra producers (such as the bank loader) feed the same queue.
    pub fn sender(&self) -> Sender<QuizEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }
}

impl QuizEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: QuizEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: QuizEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> QuizEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => QuizEvent::Tick,
        }
    }

    pub fn event_source(&self) -> &E {
        &self.event_source
    }
}

/// Loads the bank off the UI thread; the single continuation is a `BankLoaded` event.
pub fn spawn_bank_loader(source: BankSource, tx: Sender<QuizEvent>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        tracing::info!(%source, "loading question bank");
        let result = QuestionBank::load(&source);
        match &result {
            Ok(bank) => tracing::info!(questions = bank.len(), title = %bank.title, "question bank loaded"),
            Err(e) => tracing::error!(%source, "failed to load question bank: {e}"),
        }
        let _ = tx.send(QuizEvent::BankLoaded(result));
    })
}

/// The periodic clock refresh. Armed while a play-through runs and
/// cancelled once when it completes or is reset.
#[derive(Debug, Default)]
pub struct Timer {
    armed: bool,
}

impl Timer {
    pub fn arm(&mut self) {
        if !self.armed {
            tracing::debug!("timer armed");
        }
        self.armed = true;
    }

    /// True only for the call that actually stopped an armed timer.
    pub fn cancel(&mut self) -> bool {
        let was_armed = std::mem::take(&mut self.armed);
        if was_armed {
            tracing::debug!("timer cancelled");
        }
        was_armed
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
