use crate::i18n::Text;
use crate::tui_mode::app::{App, EXAMPLES};
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

fn heading(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED)))
}

pub fn render_help(frame: &mut Frame, app: &mut App) {
    let lang = app.language();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" {} ", lang.text(Text::Title)))
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));

    let mut help_text = vec![
        Line::from(Span::styled(lang.text(Text::Subtitle), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))),
        Line::from(""),
        heading("Operations:"),
        Line::from("  + : Addition        (e.g., 5 + 3 = 8)"),
        Line::from("  - : Subtraction     (e.g., 10 - 4 = 6)"),
        Line::from("  * : Multiplication  (e.g., 6 * 7 = 42)"),
        Line::from("  / : Division        (e.g., 15 / 3 = 5)"),
        Line::from("  ** : Power          (e.g., 2 ** 3 = 8, result only)"),
        Line::from("  ( ) : Grouping      (e.g., (2 + 3) * 4 = 20, result only)"),
        Line::from("  A leading '-' or a '-' right after an operator is a sign: -5 + 3, 5 + -3"),
        Line::from(""),
        heading("Number line:"),
        Line::from("  The result uses normal operator precedence."),
        Line::from("  The steps and the marker walk the expression strictly left to right,"),
        Line::from("  so 2 + 3 * 4 gives 14 but the marker ends on 20."),
        Line::from("  The marker moves 1, 2 or 10 units per tick depending on the distance."),
        Line::from(""),
        heading("Keys:"),
        Line::from("  Enter : Calculate"),
        Line::from("  Alt+1..Alt+4 : Load an example"),
        Line::from("  F2 : Switch English / اردو"),
        Line::from("  F3 / F4 / F5 : Shrink / stretch / reset the number line"),
        Line::from("  ← → : Move cursor left/right"),
        Line::from("  Ctrl+←/→ : Move cursor by words"),
        Line::from("  Home/End : Move to start/end of line"),
        Line::from("  ↑ ↓ : Previous expressions"),
        Line::from("  Ctrl+U / Esc : Clear current input"),
        Line::from("  Ctrl+C : Exit"),
        Line::from(""),
        heading("Commands:"),
        Line::from("  clear : Forget the current result and history"),
        Line::from("  help : Show this help screen"),
        Line::from("  quit : Exit the calculator"),
        Line::from(""),
        heading(lang.text(Text::Examples)),
    ];
    help_text.extend(EXAMPLES.iter().map(|e| Line::from(format!("  {}", e))));

    let alignment = if app.settings.is_rtl() { Alignment::Right } else { Alignment::Left };
    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(alignment)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll as u16, 0));

    frame.render_widget(Clear, frame.size());
    frame.render_widget(paragraph, frame.size());
}
