use crate::utils::text::{display_width, wrap_text};
use console::style;
use termimad::MadSkin;

fn box_width() -> usize {
    let terminal_width = console::Term::stdout().size().1 as usize;
    std::cmp::min(terminal_width.saturating_sub(4), 100).max(40)
}

fn looks_like_markdown(text: &str) -> bool {
    text.contains("```")
        || text.contains("**")
        || text.contains('`')
        || text.contains("\n#")
        || text.starts_with('#')
        || text.contains("\n* ")
        || text.contains("\n- ")
}

/// Label printed before every assistant message.
pub fn display_assistant_label() {
    println!("\n{}", style("🩺 Assistant").bold().magenta());
}

/// Show a complete assistant message: markdown is rendered, plain text is boxed.
pub fn display_message(text: &str) {
    display_assistant_label();
    if looks_like_markdown(text) {
        MadSkin::default().print_text(text);
    } else {
        display_boxed(text);
    }
}

fn display_boxed(text: &str) {
    let max_width = box_width();
    let inner = max_width.saturating_sub(4);

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        lines.extend(wrap_text(paragraph, inner));
    }

    let content_width = lines.iter().map(|l| display_width(l)).max().unwrap_or(0);
    let width = std::cmp::min(max_width, content_width + 4);

    println!("{}", style(format!("┌{}┐", "─".repeat(width - 2))).dim().blue());
    for line in lines {
        let padding = width.saturating_sub(display_width(&line) + 3);
        println!("│ {}{}│", style(&line).white(), " ".repeat(padding));
    }
    println!("{}", style(format!("└{}┘", "─".repeat(width - 2))).dim().blue());
}

/// Output of a slash command.
pub fn display_command_output(text: &str) {
    println!("{}", text);
}

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("✖").bold().red(), style(message).red());
}

pub fn display_notice(message: &str) {
    println!("{}", style(message).dim());
}
