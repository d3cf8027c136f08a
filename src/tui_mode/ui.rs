use super::app::{App, EXAMPLES};
use super::helpers::{highlight_expression, wrap_text};
use crate::calc_engine::format_number;
use crate::i18n::Text;
use crate::number_line::Window;
use crate::render_help::render_help;
use crate::settings::FONT_SCALE_MAX;
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use ratatui::{
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget, Wrap},
    Frame, Terminal,
};
use std::time::Instant;
use unicode_width::UnicodeWidthStr;

const MIN_TERMINAL_WIDTH: u16 = 60;
const MIN_TERMINAL_HEIGHT: u16 = 22;

pub fn run_ui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.tick(Instant::now());

        terminal.draw(|f| {
            if app.show_help {
                render_help(f, app);
            } else {
                ui(f, app);
            }
        })?;

        if app.should_quit {
            break;
        }

        if crossterm::event::poll(app.poll_timeout(Instant::now()))? {
            match crossterm::event::read()? {
                Event::Key(KeyEvent { code, modifiers, kind, .. }) if kind == KeyEventKind::Press => {
                    handle_key_event(app, code, modifiers);
                }
                Event::Mouse(event) => {
                    handle_mouse_event(app, event);
                }
                _ => {}
            }
        }
    }
    app.animator.cancel();
    Ok(())
}

fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if app.show_help {
        match code {
            KeyCode::Down => app.help_scroll = app.help_scroll.saturating_add(1),
            KeyCode::Up => app.help_scroll = app.help_scroll.saturating_sub(1),
            KeyCode::PageDown => app.help_scroll = app.help_scroll.saturating_add(10),
            KeyCode::PageUp => app.help_scroll = app.help_scroll.saturating_sub(10),
            KeyCode::Esc | KeyCode::F(1) => {
                app.show_help = false;
                app.help_scroll = 0;
            }
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char(c @ '1'..='4') if modifiers.contains(KeyModifiers::ALT) => {
            let index = c as usize - '1' as usize;
            app.load_example(index, Instant::now());
        }
        KeyCode::Char('u') | KeyCode::Char('U') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_input();
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Char(c) if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT => {
            app.insert_char(c);
        }
        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left if modifiers.contains(KeyModifiers::CONTROL) => {
            app.move_cursor_by_words(-1);
        }
        KeyCode::Right if modifiers.contains(KeyModifiers::CONTROL) => {
            app.move_cursor_by_words(1);
        }
        KeyCode::Left => app.move_cursor(-1),
        KeyCode::Right => app.move_cursor(1),
        KeyCode::Home => {
            app.cursor_position = 0;
            app.input_scroll = 0;
        }
        KeyCode::End => {
            app.cursor_position = app.input.chars().count();
        }
        KeyCode::Up => app.navigate_history(-1),
        KeyCode::Down => app.navigate_history(1),
        KeyCode::Enter => app.submit(Instant::now()),
        KeyCode::F(1) => {
            app.show_help = true;
            app.help_scroll = 0;
        }
        KeyCode::F(2) => app.toggle_language(),
        KeyCode::F(3) => app.settings.decrease_font(),
        KeyCode::F(4) => app.settings.increase_font(),
        KeyCode::F(5) => app.settings.reset_font(),
        KeyCode::Esc => app.clear_input(),
        _ => {}
    }
}

fn handle_mouse_event(app: &mut App, event: crossterm::event::MouseEvent) {
    if app.show_help {
        match event.kind {
            MouseEventKind::ScrollDown => app.help_scroll = app.help_scroll.saturating_add(3),
            MouseEventKind::ScrollUp => app.help_scroll = app.help_scroll.saturating_sub(3),
            _ => {}
        }
    }
}

fn text_alignment(app: &App) -> Alignment {
    if app.settings.is_rtl() { Alignment::Right } else { Alignment::Left }
}

fn ui(frame: &mut Frame, app: &mut App) {
    let terminal_size = frame.size();

    app.terminal_too_small = terminal_size.width < MIN_TERMINAL_WIDTH ||
                             terminal_size.height < MIN_TERMINAL_HEIGHT;

    if app.terminal_too_small {
        render_resize_message(frame, terminal_size);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(12),
        ])
        .split(terminal_size);

    render_header(frame, app, layout[0]);
    render_input(frame, app, layout[1]);
    render_status(frame, app, layout[2]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(layout[3]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(4),
        ])
        .split(body[0]);

    render_result(frame, app, left[0]);
    render_steps(frame, app, left[1]);
    render_examples(frame, app, left[2]);
    render_number_line(frame, app, body[1]);
}

fn render_resize_message(frame: &mut Frame, area: Rect) {
    let message = format!(
        "Terminal too small! Min size: {}x{}. Current: {}x{}",
        MIN_TERMINAL_WIDTH,
        MIN_TERMINAL_HEIGHT,
        area.width,
        area.height
    );

    let text = vec![
        Line::from(Span::styled(
            message,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Please resize your terminal window",
            Style::default().fg(Color::Yellow)
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Resize Required ")
        .title_alignment(Alignment::Center);

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let lang = app.language();
    let text = vec![
        Line::from(Span::styled(
            lang.text(Text::Title),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(lang.text(Text::Subtitle), Style::default().fg(Color::DarkGray))),
    ];
    frame.render_widget(Paragraph::new(text).alignment(text_alignment(app)), area);
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", title))
        .title_alignment(Alignment::Center)
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = panel(app.language().text(Text::EnterExpression));

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let visible_width = (inner_area.width.saturating_sub(2)) as usize;
    let total_chars = app.input.chars().count();
    app.adjust_input_scroll(visible_width);

    let visible_input: String = app.input
        .chars()
        .skip(app.input_scroll)
        .take(visible_width)
        .collect();

    let mut spans = vec![Span::styled("> ", Style::default().fg(Color::Green))];
    if app.input.is_empty() {
        spans.push(Span::styled(
            app.language().text(Text::Placeholder),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.extend(highlight_expression(&visible_input, Style::default().fg(Color::Cyan)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), inner_area);

    let visible_cursor = app.cursor_position.saturating_sub(app.input_scroll);
    let visible_prefix = visible_input.chars().take(visible_cursor).collect::<String>();
    let cursor_x = inner_area.x + 2 + visible_prefix.width() as u16;
    let cursor_y = inner_area.y;
    frame.set_cursor(cursor_x, cursor_y);

    let scroll_indicator_style = Style::default().fg(Color::DarkGray);

    if app.input_scroll > 0 {
        let left_indicator = Paragraph::new("<").style(scroll_indicator_style);
        frame.render_widget(left_indicator, Rect::new(inner_area.x, inner_area.y, 1, 1));
    }

    if total_chars > app.input_scroll + visible_width {
        let right_indicator = Paragraph::new(">").style(scroll_indicator_style);
        frame.render_widget(
            right_indicator,
            Rect::new(inner_area.x + inner_area.width - 1, inner_area.y, 1, 1),
        );
    }
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let lang = app.language();
    let scale = format!("{} {:.0}%", lang.text(Text::Scale), app.settings.font_scale * 100.0);
    let keys = [
        ("Enter", lang.text(Text::Calculate)),
        ("Alt+1..4", lang.text(Text::Examples)),
        ("F1", "Help"),
        ("F2", lang.toggled().text(Text::LanguageName)),
        ("F3/F4/F5", scale.as_str()),
        ("Ctrl+U", "Clear"),
    ];

    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(
                    *key,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" {} ", desc),
                    Style::default().fg(Color::DarkGray),
                ),
            ]
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_result(frame: &mut Frame, app: &App, area: Rect) {
    let lang = app.language();
    let block = panel(lang.text(Text::Result));

    let line = match app.solution.as_ref().map(|s| s.result) {
        Some(Some(value)) => Line::from(Span::styled(
            format_number(value),
            Style::default().fg(Color::LightMagenta).add_modifier(Modifier::BOLD),
        )),
        Some(None) => Line::from(Span::styled(
            lang.text(Text::InvalidExpression),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None => Line::from(""),
    };

    frame.render_widget(Paragraph::new(line).block(block).alignment(Alignment::Center), area);
}

fn render_steps(frame: &mut Frame, app: &App, area: Rect) {
    let lang = app.language();
    let block = panel(lang.text(Text::Steps));
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let Some(solution) = &app.solution else {
        return;
    };

    let wrap_width = inner_area.width.saturating_sub(2) as usize;
    let mut items = Vec::new();

    let summary_style = if solution.is_valid() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    };
    for line in &solution.summary {
        for wrapped in wrap_text(line, wrap_width) {
            items.push(ListItem::new(Line::from(Span::styled(wrapped, summary_style))));
        }
    }

    let active = app.active_step();
    for (i, step) in solution.steps.iter().enumerate() {
        let style = if active == Some(i) {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if i < app.animator.state().animation_step_index {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let text = format!("{}. {}", i + 1, step.description);
        for (line_idx, line) in wrap_text(&text, wrap_width).into_iter().enumerate() {
            let prefix = if line_idx == 0 { "- " } else { "  " };
            items.push(ListItem::new(Line::from(Span::styled(format!("{}{}", prefix, line), style))));
        }
    }

    if solution.diverges() {
        for line in wrap_text(lang.text(Text::Divergence), wrap_width) {
            items.push(ListItem::new(Line::from(Span::styled(line, Style::default().fg(Color::Yellow)))));
        }
    }

    frame.render_widget(List::new(items), inner_area);
}

fn render_examples(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel(app.language().text(Text::Examples));

    let spans: Vec<Span> = EXAMPLES
        .iter()
        .enumerate()
        .flat_map(|(i, example)| {
            vec![
                Span::styled(format!("Alt+{} ", i + 1), Style::default().fg(Color::Yellow)),
                Span::styled(format!("{}   ", example), Style::default().fg(Color::Cyan)),
            ]
        })
        .collect();

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_number_line(frame: &mut Frame, app: &App, area: Rect) {
    let lang = app.language();
    let block = panel(lang.text(Text::NumberLine));
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let Some(window) = app.number_line() else {
        let prompt = Paragraph::new(lang.text(Text::SolvePrompt))
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(prompt, inner_area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(2),
            Constraint::Length(5),
            Constraint::Min(1),
        ])
        .split(inner_area);

    if let Some(caption) = app.caption() {
        let caption = Paragraph::new(Line::from(Span::styled(
            caption.to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(caption, rows[0]);
    }

    let state = app.animator.state();
    frame.render_widget(
        NumberLineView {
            window: &window,
            current: state.current_position,
            is_animating: state.is_animating,
            scale: app.settings.font_scale,
            result_label: lang.text(Text::Result),
        },
        rows[1],
    );

    let footer = if state.is_animating { Text::Watching } else { Text::ResultMarked };
    let footer = Paragraph::new(lang.text(footer))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, rows[2]);
}

/// Axis with nine integer ticks, the live marker while animating and the
/// result badge once the animation is over.
struct NumberLineView<'a> {
    window: &'a Window,
    current: f64,
    is_animating: bool,
    scale: f64,
    result_label: &'a str,
}

impl NumberLineView<'_> {
    fn put_centered(buf: &mut Buffer, area: Rect, x: u16, y: u16, text: &str, style: Style) {
        let width = text.width() as u16;
        let start = x.saturating_sub(width / 2).max(area.x);
        let start = start.min((area.x + area.width).saturating_sub(width));
        buf.set_string(start, y, text, style);
    }
}

impl Widget for NumberLineView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 4 || area.width < 10 || self.window.points.is_empty() {
            return;
        }

        // масштаб растягивает ось, как размер шрифта на странице
        let wanted = (area.width as f64 * self.scale / FONT_SCALE_MAX).round() as u16;
        let width = wanted.clamp(area.width.min(20), area.width);
        let left = area.x + (area.width - width) / 2;
        let column = |p: i64| left + (self.window.fraction(p) * (width - 1) as f64).round() as u16;

        let badge_y = area.y;
        let pointer_y = area.y + 1;
        let axis_y = area.y + 2;
        let label_y = area.y + 3;

        let axis_style = Style::default().fg(Color::DarkGray);
        for x in left..left + width - 1 {
            buf.get_mut(x, axis_y).set_symbol("─").set_style(axis_style);
        }
        buf.get_mut(left + width - 1, axis_y).set_symbol("▶").set_style(axis_style);

        for &p in &self.window.points {
            let x = column(p);
            let is_result = self.window.result_tick == Some(p);
            let (tick, style) = if is_result {
                ("╋", Style::default().fg(Color::LightMagenta).add_modifier(Modifier::BOLD))
            } else {
                ("┼", Style::default().fg(Color::Gray))
            };
            buf.get_mut(x, axis_y).set_symbol(tick).set_style(style);
            Self::put_centered(buf, area, x, label_y, &p.to_string(), style);
        }

        if self.is_animating {
            if let Some(marker) = self.window.marker {
                let x = column(marker);
                let style = Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD);
                Self::put_centered(buf, area, x, badge_y, &format!(" {:.0} ", self.current), style);
                buf.get_mut(x, pointer_y).set_symbol("▼").set_style(Style::default().fg(Color::Green));
            }
        } else if let Some(result) = self.window.result_tick {
            let x = column(result);
            let style = Style::default().fg(Color::Black).bg(Color::LightMagenta).add_modifier(Modifier::BOLD);
            Self::put_centered(buf, area, x, badge_y, &format!(" {} ", self.result_label), style);
            buf.get_mut(x, pointer_y).set_symbol("▼").set_style(Style::default().fg(Color::LightMagenta));
        }
    }
}
