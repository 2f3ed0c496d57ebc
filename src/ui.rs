pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, StatusKind, LOAD_FAILED_MESSAGE};
use crate::bank::{OptionKey, Question};
use crate::clock::Clock;
use crate::session::{AnswerOutcome, Mode};
use crate::util::{format_clock, strip_markup};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// Rows a paragraph needs at `width`, counting explicit line breaks
fn wrapped_height(text: &str, width: u16) -> u16 {
    let width = width.max(1) as usize;
    text.lines()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum::<usize>()
        .max(1) as u16
}

fn status_line<C: Clock>(app: &App<C>) -> Paragraph<'static> {
    let line = match app.status() {
        Some(status) => {
            let style = match status.kind {
                StatusKind::Info => Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
                StatusKind::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            };
            Line::from(Span::styled(status.text.clone(), style))
        }
        None => Line::default(),
    };
    Paragraph::new(line).alignment(Alignment::Center)
}

pub fn render_loading(area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    Paragraph::new(Span::styled("Loading questions...", dim().add_modifier(Modifier::BOLD)))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
}

pub fn render_load_failed<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let mut lines = vec![Line::from(Span::styled(
        LOAD_FAILED_MESSAGE,
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    ))];
    if let Some(reason) = app.load_error() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(reason.to_string(), italic())));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("(esc)ape", italic())));

    let height = lines.len() as u16 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Error"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}

pub fn render_welcome<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let (title, total) = app
        .bank()
        .map(|b| (b.title.clone(), b.len()))
        .unwrap_or_default();

    let lines = vec![
        Line::from(Span::styled(title, bold().fg(Color::Cyan))),
        Line::default(),
        Line::from(format!("{total} questions")),
        Line::default(),
        Line::from(Span::styled(
            "answer with the option letter or ↑/↓ + enter, ←/→ to move between questions",
            dim(),
        )),
        Line::from(Span::styled("space pauses the clock", dim())),
        Line::default(),
        Line::from(Span::styled("(enter) start / (esc)ape", italic())),
    ];

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(lines.len() as u16),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
    status_line(app).render(chunks[2], buf);
}

fn option_lines(
    question: &Question,
    outcome: Option<&AnswerOutcome>,
    highlighted: usize,
) -> Vec<Line<'static>> {
    question
        .options
        .iter()
        .enumerate()
        .map(|(idx, (key, text))| {
            let style = match outcome {
                Some(o) if *key == o.correct_option => bold().fg(Color::Green),
                Some(o) if *key == o.selected => bold().fg(Color::Red),
                Some(_) => dim(),
                None if idx == highlighted => bold().add_modifier(Modifier::REVERSED),
                None => Style::default(),
            };
            let marker = match outcome {
                Some(o) if *key == o.selected => "›",
                None if idx == highlighted => "›",
                _ => " ",
            };
            Line::from(vec![
                Span::raw(format!("{marker} ")),
                Span::styled(format!("{key}  {}", strip_markup(text)), style),
            ])
        })
        .collect()
}

pub fn render_question<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let Some(question) = session.current_question() else {
        return;
    };

    if session.is_paused() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        Paragraph::new(vec![
            Line::from(Span::styled(
                format!("PAUSED  {}", format_clock(app.displayed_elapsed())),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            )),
            Line::default(),
            Line::from(Span::styled("press space to continue", italic())),
        ])
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
        return;
    }

    let outcome = session.current_outcome();
    let inner_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2);
    let prompt = strip_markup(&question.prompt);
    let prompt_height = wrapped_height(&prompt, inner_width);
    let explanation = outcome
        .as_ref()
        .map(|o| format!("Explanation: {}", strip_markup(&o.explanation)));
    let explanation_height = explanation
        .as_deref()
        .map(|e| wrapped_height(e, inner_width) + 1)
        .unwrap_or(0);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),                            // header
            Constraint::Length(1),                            // progress
            Constraint::Length(1),                            // running stats
            Constraint::Length(1),                            // padding
            Constraint::Length(prompt_height),                // prompt
            Constraint::Length(1),                            // padding
            Constraint::Length(question.options.len() as u16), // options
            Constraint::Length(explanation_height),           // explanation
            Constraint::Min(0),
            Constraint::Length(1), // status
            Constraint::Length(1), // legend
        ])
        .split(area);

    let title = app.bank().map(|b| b.title.as_str()).unwrap_or_default();
    let mode = match session.mode() {
        Mode::Normal => Span::raw(""),
        Mode::Review => Span::styled("  [REVIEW]", bold().fg(Color::Magenta)),
    };
    let header = Line::from(vec![
        Span::styled(title.to_string(), bold().fg(Color::Cyan)),
        mode,
        Span::styled(format!("  ·  {}", question.category_label()), dim()),
        Span::styled(format!("  ·  {}", format_clock(app.displayed_elapsed())), bold()),
    ]);
    Paragraph::new(header).render(chunks[0], buf);

    let position = session.position() + 1;
    let total = session.len().max(1);
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio((position as f64 / total as f64).clamp(0.0, 1.0))
        .label(format!("Question {position} of {}", session.len()))
        .render(chunks[1], buf);

    let stats = Line::from(vec![
        Span::styled(format!("{} answered", session.answers().len()), dim()),
        Span::raw("   "),
        Span::styled(format!("{} correct", session.correct_count()), Style::default().fg(Color::Green)),
        Span::raw("   "),
        Span::styled(format!("{} wrong", session.incorrect_count()), Style::default().fg(Color::Red)),
    ]);
    Paragraph::new(stats)
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(prompt)
        .style(bold())
        .wrap(Wrap { trim: false })
        .render(chunks[4], buf);

    Paragraph::new(option_lines(question, outcome.as_ref(), app.highlighted))
        .render(chunks[6], buf);

    if let (Some(text), Some(o)) = (explanation, outcome.as_ref()) {
        let verdict = if o.is_correct {
            Span::styled("Correct! ", bold().fg(Color::Green))
        } else {
            Span::styled(format!("Wrong, the answer is {}. ", o.correct_option), bold().fg(Color::Red))
        };
        Paragraph::new(vec![Line::default(), Line::from(vec![verdict, Span::raw(text)])])
            .wrap(Wrap { trim: true })
            .render(chunks[7], buf);
    }

    status_line(app).render(chunks[9], buf);

    let next = if session.is_last() { "Finish (→)" } else { "Next →" };
    let legend = format!("← Previous / {next} / letter answers / (space) pause / (esc) menu");
    Paragraph::new(Span::styled(legend, italic())).render(chunks[10], buf);
}

pub fn render_results<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let Some(summary) = session.summary() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // heading
            Constraint::Length(1), // stats
            Constraint::Length(1), // padding
            Constraint::Min(1),    // mistakes
            Constraint::Length(1), // status
            Constraint::Length(1), // legend
        ])
        .split(area);

    let heading = match session.mode() {
        Mode::Normal => "Results",
        Mode::Review => "Review results",
    };
    Paragraph::new(Span::styled(heading, bold().fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} correct   {} incorrect   {}%   {}",
            summary.correct_count,
            summary.incorrect_count,
            summary.percentage,
            format_clock(app.displayed_elapsed())
        ),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let mistakes = session.mistakes().unwrap_or_default();
    let body: Vec<Line> = if mistakes.is_empty() {
        vec![Line::from(Span::styled(
            "Congratulations! You got every question right!",
            bold().fg(Color::Green),
        ))]
    } else {
        let mut lines = vec![Line::from(Span::styled("Wrong answers:", bold()))];
        for (record, question) in &mistakes {
            let answer_text = |key: OptionKey| {
                question
                    .option_text(key)
                    .map(|t| format!("{key}) {}", strip_markup(t)))
                    .unwrap_or_else(|| key.to_string())
            };
            lines.push(Line::default());
            lines.push(Line::from(vec![
                Span::styled(
                    format!("Question {}: ", record.position_at_answer_time + 1),
                    bold(),
                ),
                Span::raw(strip_markup(&question.prompt)),
            ]));
            lines.push(Line::from(Span::styled(
                format!("Your answer: {}", answer_text(record.selected_option)),
                Style::default().fg(Color::Red),
            )));
            lines.push(Line::from(Span::styled(
                format!("Correct answer: {}", answer_text(record.correct_option)),
                Style::default().fg(Color::Green),
            )));
            lines.push(Line::from(Span::styled(
                format!("Explanation: {}", strip_markup(&question.explanation)),
                italic(),
            )));
        }
        lines
    };
    Paragraph::new(body)
        .block(Block::default().borders(Borders::TOP))
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    status_line(app).render(chunks[4], buf);

    let legend = if mistakes.is_empty() {
        "(n)ew run / (esc) menu / (q)uit"
    } else {
        "(r)eview mistakes / e(x)port mistakes / (n)ew run / (esc) menu / (q)uit"
    };
    Paragraph::new(Span::styled(legend, italic())).render(chunks[5], buf);
}
