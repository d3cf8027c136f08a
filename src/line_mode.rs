use crate::animation::Animator;
use crate::calc_engine::{format_number, solve};
use crate::number_line::{self, Window};
use crate::settings::DisplaySettings;
use anyhow::{Context, Result};
use log::{debug, info};
use std::io::{stdin, stdout, Write};
use std::time::Instant;
use termion::{clear::CurrentLine as ClearLine, event::Key, input::TermRead, raw::IntoRawMode};

// Функция для преобразования позиции символа в байтовую позицию
fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or_else(|| s.len())
}

/// Compact text form of the number line: the live marker in brackets while
/// animating, the result in angle brackets afterwards.
pub fn render_window(window: &Window, is_animating: bool) -> String {
    window
        .points
        .iter()
        .map(|&p| {
            if is_animating && window.marker == Some(p) {
                format!("[{}]", p)
            } else if !is_animating && window.result_tick == Some(p) {
                format!("<{}>", p)
            } else {
                format!(" {} ", p)
            }
        })
        .collect::<Vec<_>>()
        .join("─")
}

enum Edit {
    Submit(String),
    Quit,
}

fn read_expression<W: Write>(
    out: &mut W,
    history: &[String],
    prompt: &str,
) -> Result<Edit> {
    let mut expression = String::new();
    let mut cursor_pos = 0; // позиция курсора в символах
    let mut history_index = history.len();

    let stdin = stdin();
    let mut keys = stdin.keys();

    loop {
        write!(out, "\r{}{}: {}", ClearLine, prompt, expression)?;
        let tail = expression.chars().count() - cursor_pos;
        if tail > 0 {
            write!(out, "{}", termion::cursor::Left(tail as u16))?;
        }
        out.flush()?;

        let Some(key) = keys.next() else {
            return Ok(Edit::Quit);
        };

        match key? {
            Key::Char('\n') => return Ok(Edit::Submit(expression)),
            Key::Ctrl('c') | Key::Ctrl('d') => return Ok(Edit::Quit),
            Key::Char(c) => {
                let byte_idx = char_index_to_byte_index(&expression, cursor_pos);
                expression.insert(byte_idx, c);
                cursor_pos += 1;
            }
            Key::Backspace if cursor_pos > 0 => {
                cursor_pos -= 1;
                let byte_idx = char_index_to_byte_index(&expression, cursor_pos);
                if let Some(c) = expression[byte_idx..].chars().next() {
                    expression.drain(byte_idx..byte_idx + c.len_utf8());
                }
            }
            Key::Delete if cursor_pos < expression.chars().count() => {
                let byte_idx = char_index_to_byte_index(&expression, cursor_pos);
                if let Some(c) = expression[byte_idx..].chars().next() {
                    expression.drain(byte_idx..byte_idx + c.len_utf8());
                }
            }
            Key::Left if cursor_pos > 0 => cursor_pos -= 1,
            Key::Right if cursor_pos < expression.chars().count() => cursor_pos += 1,
            Key::Home => cursor_pos = 0,
            Key::End => cursor_pos = expression.chars().count(),
            Key::Up if history_index > 0 => {
                history_index -= 1;
                expression = history[history_index].clone();
                cursor_pos = expression.chars().count();
            }
            Key::Down => {
                if history_index + 1 < history.len() {
                    history_index += 1;
                    expression = history[history_index].clone();
                } else {
                    history_index = history.len();
                    expression.clear();
                }
                cursor_pos = expression.chars().count();
            }
            _ => {}
        }
    }
}

fn play<W: Write>(out: &mut W, animator: &mut Animator, result: Option<f64>) -> Result<()> {
    debug!("replaying {} steps", animator.steps().len());
    loop {
        animator.update(Instant::now());
        let animating = animator.is_animating();
        let position = animator.state().current_position;

        if let Some(window) = number_line::window(result, position, animating) {
            let caption = animator
                .last_completed_step()
                .map(|s| s.description.as_str())
                .unwrap_or("");
            write!(
                out,
                "\r{}  {}   {}",
                ClearLine,
                render_window(&window, animating),
                caption
            )?;
            out.flush()?;
        }

        match animator.next_deadline() {
            Some(deadline) => std::thread::sleep(deadline.saturating_duration_since(Instant::now())),
            None => break,
        }
    }
    write!(out, "\r\n")?;
    Ok(())
}

pub fn run_line(mut settings: DisplaySettings) -> Result<()> {
    let mut out = stdout().into_raw_mode().context("line mode needs a terminal")?;
    let mut history: Vec<String> = Vec::new();
    let mut animator = Animator::new();

    write!(out, "Rust Number Line Calculator\r\n")?;
    write!(out, "Supports: +, -, *, /, ** and parentheses (result only)\r\n")?;
    write!(out, "Navigation: ←/→, Backspace/Delete, Home/End, ↑/↓ for history\r\n")?;
    write!(out, "Special commands: 'quit' to exit, 'clear' to reset history, 'lang' to switch language\r\n\n")?;

    loop {
        let prompt = settings.language.text(crate::i18n::Text::Expression);
        let expression = match read_expression(&mut out, &history, prompt)? {
            Edit::Submit(expression) => expression,
            Edit::Quit => {
                write!(out, "\r\nGoodbye!\r\n")?;
                return Ok(());
            }
        };

        let input = expression.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                write!(out, "\r\nGoodbye!\r\n")?;
                return Ok(());
            }
            "clear" | "reset" => {
                history.clear();
                write!(out, "\r\nHistory cleared\r\n\n")?;
                continue;
            }
            "lang" => {
                settings.toggle_language();
                write!(out, "\r\n{}\r\n\n", settings.language.text(crate::i18n::Text::LanguageName))?;
                continue;
            }
            _ => {}
        }

        history.push(input.to_string());

        let solution = solve(input, settings.language);
        info!("line mode: {:?} = {:?}", solution.expression, solution.result.map(format_number));

        write!(out, "\r\n")?;
        for line in solution.report(settings.language) {
            write!(out, "  {}\r\n", line)?;
        }

        animator.start(solution.steps.clone(), Instant::now());
        play(&mut out, &mut animator, solution.result)?;
        write!(out, "\r\n")?;
    }
}
