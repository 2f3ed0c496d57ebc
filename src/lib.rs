// Library surface for the binary and for headless integration tests.
pub mod app;
pub mod app_dirs;
pub mod bank;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod keymap;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod ui;
pub mod util;

pub use app::{App, AppSettings, AppState, Flow};
pub use bank::{QuestionBank, QuestionId, OptionKey};
pub use session::QuizSession;
