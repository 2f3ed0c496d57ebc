use ratatui::Frame;

use crate::app::{App, AppState};
use crate::clock::Clock;
use crate::ui::{render_load_failed, render_loading, render_question, render_results, render_welcome};

/// A UI Screen boundary: renders one application state
pub trait Screen<C: Clock> {
    fn render(&self, app: &App<C>, f: &mut Frame);
}

pub struct LoadingScreen;

impl<C: Clock> Screen<C> for LoadingScreen {
    fn render(&self, _app: &App<C>, f: &mut Frame) {
        render_loading(f.area(), f.buffer_mut());
    }
}

pub struct LoadFailedScreen;

impl<C: Clock> Screen<C> for LoadFailedScreen {
    fn render(&self, app: &App<C>, f: &mut Frame) {
        render_load_failed(app, f.area(), f.buffer_mut());
    }
}

pub struct WelcomeScreen;

impl<C: Clock> Screen<C> for WelcomeScreen {
    fn render(&self, app: &App<C>, f: &mut Frame) {
        render_welcome(app, f.area(), f.buffer_mut());
    }
}

/// Question screen; shows the pause banner instead of the question while paused
pub struct QuestionScreen;

impl<C: Clock> Screen<C> for QuestionScreen {
    fn render(&self, app: &App<C>, f: &mut Frame) {
        render_question(app, f.area(), f.buffer_mut());
    }
}

pub struct ResultsScreen;

impl<C: Clock> Screen<C> for ResultsScreen {
    fn render(&self, app: &App<C>, f: &mut Frame) {
        render_results(app, f.area(), f.buffer_mut());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen<C: Clock>(state: AppState) -> Box<dyn Screen<C>> {
    match state {
        AppState::Loading => Box::new(LoadingScreen),
        AppState::LoadFailed => Box::new(LoadFailedScreen),
        AppState::Welcome => Box::new(WelcomeScreen),
        AppState::Question => Box::new(QuestionScreen),
        AppState::Results => Box::new(ResultsScreen),
    }
}

pub fn draw<C: Clock>(app: &App<C>, f: &mut Frame) {
    current_screen::<C>(app.state).render(app, f);
}
