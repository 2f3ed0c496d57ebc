use std::sync::mpsc::{self, Sender};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use quizr::app::{App, AppSettings, AppState, Flow};
use quizr::bank::BankSource;
use quizr::export::ExportFormat;
use quizr::runtime::{spawn_bank_loader, FixedTicker, QuizEvent, Runner, TestEventSource};

const BANK: &str = r#"{
    "title": "Headless",
    "questions": [
        {"id": 1, "prompt": "One?", "category": "Numbers",
         "options": {"A": "one", "B": "two"}, "correctOption": "A", "explanation": "it is one"},
        {"id": 2, "prompt": "Two?",
         "options": {"A": "one", "B": "two"}, "correctOption": "B", "explanation": "it is two"},
        {"id": 3, "prompt": "Three?",
         "options": {"A": "three", "B": "four", "C": "five"}, "correctOption": "A", "explanation": "it is three"}
    ]
}"#;

fn settings(dir: &std::path::Path) -> AppSettings {
    AppSettings {
        shuffle: false,
        export_format: ExportFormat::Text,
        export_dir: dir.to_path_buf(),
    }
}

fn send_key(tx: &Sender<QuizEvent>, code: KeyCode) {
    tx.send(QuizEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
        .unwrap();
}

/// Steps the runner until `done` holds or the step budget runs out
fn drive<F>(
    runner: &Runner<TestEventSource, FixedTicker>,
    app: &mut App,
    mut done: F,
) -> Flow
where
    F: FnMut(&App) -> bool,
{
    for _ in 0..400u32 {
        if done(app) {
            return Flow::Continue;
        }
        if app.handle_event(runner.step()) == Flow::Quit {
            return Flow::Quit;
        }
    }
    Flow::Continue
}

fn runner() -> (Runner<TestEventSource, FixedTicker>, Sender<QuizEvent>) {
    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    (Runner::new(es, ticker), tx)
}

#[test]
fn headless_session_completes_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bank.json");
    std::fs::write(&path, BANK).unwrap();

    let (runner, tx) = runner();
    let mut app = App::new(settings(dir.path()));
    spawn_bank_loader(BankSource::File(path), tx.clone());

    drive(&runner, &mut app, |a| a.state != AppState::Loading);
    assert_eq!(app.state, AppState::Welcome);
    assert_eq!(app.bank().unwrap().len(), 3);

    send_key(&tx, KeyCode::Enter);
    send_key(&tx, KeyCode::Char('a'));
    send_key(&tx, KeyCode::Right);
    send_key(&tx, KeyCode::Char('a'));
    send_key(&tx, KeyCode::Right);
    // Up/Down + Enter selects the highlighted option
    send_key(&tx, KeyCode::Down);
    send_key(&tx, KeyCode::Up);
    send_key(&tx, KeyCode::Enter);
    send_key(&tx, KeyCode::Right);

    drive(&runner, &mut app, |a| a.state == AppState::Results);

    assert_eq!(app.state, AppState::Results);
    assert!(!app.timer.is_armed());
    let summary = app.session.summary().unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.correct_count, 2);
    assert_eq!(summary.incorrect_count, 1);
    assert_eq!(summary.percentage, 67);
}

#[test]
fn headless_ticks_do_not_change_answers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bank.json");
    std::fs::write(&path, BANK).unwrap();

    let (runner, tx) = runner();
    let mut app = App::new(settings(dir.path()));
    spawn_bank_loader(BankSource::File(path), tx.clone());
    drive(&runner, &mut app, |a| a.state == AppState::Welcome);

    send_key(&tx, KeyCode::Enter);
    send_key(&tx, KeyCode::Char('b'));
    drive(&runner, &mut app, |a| !a.session.answers().is_empty());

    // nothing queued: every step below is a tick
    for _ in 0..10 {
        assert!(matches!(runner.step(), QuizEvent::Tick));
        app.handle_event(QuizEvent::Tick);
    }

    assert_eq!(app.state, AppState::Question);
    assert_eq!(app.session.answers().len(), 1);
    assert_eq!(app.session.position(), 0);
    assert_eq!(app.session.incorrect_count(), 1);
}

#[test]
fn headless_load_failure_blocks_the_quiz() {
    let dir = tempfile::tempdir().unwrap();

    let (runner, tx) = runner();
    let mut app = App::new(settings(dir.path()));
    spawn_bank_loader(BankSource::File(dir.path().join("missing.json")), tx.clone());

    drive(&runner, &mut app, |a| a.state != AppState::Loading);
    assert_eq!(app.state, AppState::LoadFailed);
    assert!(app.load_error().is_some());

    send_key(&tx, KeyCode::Enter);
    send_key(&tx, KeyCode::Esc);
    let flow = drive(&runner, &mut app, |_| false);

    assert_eq!(flow, Flow::Quit);
    assert_eq!(app.state, AppState::LoadFailed);
    assert!(app.session.answers().is_empty());
}

#[test]
fn headless_unknown_bundled_bank_fails() {
    let dir = tempfile::tempdir().unwrap();

    let (runner, tx) = runner();
    let mut app = App::new(settings(dir.path()));
    spawn_bank_loader(BankSource::Bundled("no-such-bank".into()), tx);

    drive(&runner, &mut app, |a| a.state != AppState::Loading);
    assert_eq!(app.state, AppState::LoadFailed);
}
