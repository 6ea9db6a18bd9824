use crate::message::{Message, Sender};
use crate::options::{parse_hex_color, Palette, WidgetOptions};
use crate::widget::{ChatWidget, PanelEntry};
use colored::*;
use pulldown_cmark::{CodeBlockKind, Event as MdEvent, HeadingLevel, Options, Parser as MdParser, Tag};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

/// Messages shown in the panel at once; older ones scroll out of view
pub const VIEWPORT_MESSAGES: usize = 12;

const PANEL_WIDTH: usize = 56;

fn paint(text: &str, hex: &str) -> ColoredString {
    match parse_hex_color(hex) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

fn bubble(text: &str, fg: &str, bg: &str) -> ColoredString {
    let painted = paint(text, fg);
    match parse_hex_color(bg) {
        Some((r, g, b)) => painted.on_truecolor(r, g, b),
        None => painted,
    }
}

const BUBBLE_TEXT_ON_ACCENT: &str = "#ffffff";

/// Foreground and background of a sender's bubble
fn sender_colors(sender: Sender, palette: &Palette) -> (&str, &str) {
    match sender {
        Sender::User => (BUBBLE_TEXT_ON_ACCENT, palette.user_bubble.as_str()),
        Sender::Bot => (palette.text.as_str(), palette.bot_bubble.as_str()),
    }
}

fn sender_label(sender: Sender, palette: &Palette) -> ColoredString {
    let (fg, bg) = sender_colors(sender, palette);
    bubble(sender.label(), fg, bg).bold()
}

/// Renders one message the way the panel shows it
pub fn render_message(message: &Message, options: &WidgetOptions) -> String {
    let palette = options.palette();
    let label = sender_label(message.sender(), &palette);
    let body = match message.sender() {
        Sender::User => message.text().to_string(),
        Sender::Bot => render_markdown(message.text()).trim_end().to_string(),
    };

    let mut line = format!("{}: {}", label, body);
    if options.show_timestamp {
        line.push_str(&format!(" {}", message.time_of_day().dimmed()));
    }
    line
}

/// Renders the whole panel: toggle button, header, visible messages, input row.
pub fn render_panel(widget: &ChatWidget) -> String {
    let options = widget.options();
    let palette = options.palette();
    let indent = panel_indent(options);
    let mut lines = Vec::new();

    let button = paint(&format!("[ {} ]", widget.toggle_icon()), &palette.button).bold();
    if !widget.is_open() {
        lines.push(button.to_string());
        return indent_lines(&lines, indent);
    }

    if options.position.is_top() {
        lines.push(button.to_string());
    }

    lines.push(header_rule(&palette));
    lines.push(paint(&options.header_title, &palette.header_start).bold().to_string());
    lines.push(paint(&options.header_subtitle, &palette.header_end).italic().to_string());
    lines.push(header_rule(&palette));

    for entry in visible_entries(widget) {
        match entry {
            PanelEntry::Welcome(text) => {
                lines.push(bubble(text, &palette.text, &palette.chat_background).to_string())
            }
            PanelEntry::Message(message) => lines.push(render_message(message, options)),
            PanelEntry::Typing => lines.push(format!(
                "{}: {}",
                sender_label(Sender::Bot, &palette),
                "• • •".dimmed()
            )),
        }
    }

    lines.push(header_rule(&palette));
    let input = if widget.input().is_empty() {
        paint(&options.placeholder_text, &palette.placeholder).to_string()
    } else {
        bubble(widget.input(), &palette.text, &palette.input_background).to_string()
    };
    let send = if widget.is_busy() { "⏳" } else { "➤" };
    lines.push(format!("> {} {}", input, send));

    if !options.position.is_top() {
        lines.push(button.to_string());
    }

    indent_lines(&lines, indent)
}

/// Entries ending at the scroll anchor, at most `VIEWPORT_MESSAGES` messages
fn visible_entries(widget: &ChatWidget) -> Vec<PanelEntry<'_>> {
    let entries = widget.entries();
    let Some(anchor) = widget.scroll_anchor() else {
        return entries;
    };

    // With messages present, entries are the messages plus an optional typing row.
    let mut end = anchor + 1;
    if widget.is_busy() && end == widget.messages().len() {
        end += 1;
    }
    let start = (anchor + 1).saturating_sub(VIEWPORT_MESSAGES);
    entries[start..end].to_vec()
}

fn header_rule(palette: &Palette) -> String {
    paint(&"─".repeat(PANEL_WIDTH), &palette.header_start).to_string()
}

/// Right-anchored panels are pushed to the right edge of the terminal.
fn panel_indent(options: &WidgetOptions) -> usize {
    if !options.position.is_right() {
        return 2;
    }
    let columns = std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse::<usize>().ok())
        .unwrap_or(80);
    columns.saturating_sub(PANEL_WIDTH + 2)
}

fn indent_lines(lines: &[String], indent: usize) -> String {
    let pad = " ".repeat(indent);
    lines
        .iter()
        .flat_map(|line| line.lines().map(|l| format!("{}{}", pad, l)).collect::<Vec<_>>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Show usage instructions when no prompt or action is provided
pub fn print_usage_instructions() {
    println!("{}", "Usage:".yellow().bold());
    println!("  {}", "chat-widget \"your question\"".green().bold());
    println!("    Send a single message to the chat proxy");
    println!();
    println!("  {}", "chat-widget -i".green().bold());
    println!("    Open the chat panel interactively");
    println!();
    println!("{}", "Interactive keys:".cyan());
    println!("  Enter              Send the message");
    println!("  line ending in \\   Insert a line break (Shift+Enter)");
    println!("  /toggle            Open or close the panel");
    println!("  /show              Redraw the panel");
    println!("  exit, quit         Leave");
    println!();
    println!("{}", "Options:".cyan());
    println!("  --base-url <URL>   Proxy base URL (default http://127.0.0.1:5000)");
    println!("  --api-url <URL>    Chat endpoint path or absolute URL");
    println!("  --help             Show this help message");
    println!();
}

/// Render markdown in the terminal with syntax highlighting for code blocks
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut output = String::new();
    let mut code_lang: Option<String> = None;
    let mut code = String::new();
    let mut list_depth = 0usize;

    for event in MdParser::new_ext(markdown, options) {
        match event {
            MdEvent::Start(Tag::Heading(level, ..)) => {
                if !output.is_empty() {
                    output.push('\n');
                }
                let marker = match level {
                    HeadingLevel::H1 => "#",
                    HeadingLevel::H2 => "##",
                    _ => "###",
                };
                output.push_str(&format!("{} ", marker.bright_cyan().bold()));
            }
            MdEvent::End(Tag::Heading(..)) => output.push('\n'),
            MdEvent::Start(Tag::Paragraph) => {
                if list_depth == 0 && !output.is_empty() && !output.ends_with("\n\n") {
                    output.push('\n');
                }
            }
            MdEvent::End(Tag::Paragraph) => {
                if list_depth == 0 {
                    output.push('\n');
                }
            }
            MdEvent::Start(Tag::List(_)) => {
                if list_depth == 0 && !output.is_empty() && !output.ends_with('\n') {
                    output.push('\n');
                }
                list_depth += 1;
            }
            MdEvent::End(Tag::List(_)) => list_depth = list_depth.saturating_sub(1),
            MdEvent::Start(Tag::Item) => {
                let pad = "  ".repeat(list_depth.saturating_sub(1));
                output.push_str(&format!("{}{}  ", pad, "•".yellow()));
            }
            MdEvent::End(Tag::Item) => {
                if !output.ends_with('\n') {
                    output.push('\n');
                }
            }
            MdEvent::Start(Tag::CodeBlock(kind)) => {
                code_lang = Some(match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                });
                code.clear();
            }
            MdEvent::End(Tag::CodeBlock(_)) => {
                let lang = code_lang.take().unwrap_or_default();
                output.push_str(&highlight_code(&code, &lang));
            }
            MdEvent::Start(Tag::Strong) | MdEvent::End(Tag::Strong) => {}
            MdEvent::Code(text) => {
                output.push_str(&format!("`{}`", text.on_bright_black().white()));
            }
            MdEvent::Text(text) => {
                if code_lang.is_some() {
                    code.push_str(&text);
                } else {
                    output.push_str(&text);
                }
            }
            MdEvent::SoftBreak => output.push(' '),
            MdEvent::HardBreak => output.push('\n'),
            _ => {}
        }
    }

    output
}

fn highlight_code(code: &str, lang: &str) -> String {
    let syntax_set = SyntaxSet::load_defaults_newlines();
    let theme_set = ThemeSet::load_defaults();
    let syntax = syntax_set
        .find_syntax_by_token(lang)
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let rule = "─".repeat(40).dimmed().to_string();
    let mut output = format!("\n{}\n", rule);

    match theme_set.themes.get("base16-ocean.dark") {
        Some(theme) if colored::control::SHOULD_COLORIZE.should_colorize() => {
            let mut highlighter = HighlightLines::new(syntax, theme);
            for line in LinesWithEndings::from(code) {
                match highlighter.highlight_line(line, &syntax_set) {
                    Ok(ranges) => output.push_str(&as_24_bit_terminal_escaped(&ranges, false)),
                    Err(_) => output.push_str(line),
                }
            }
            output.push_str("\x1b[0m");
        }
        _ => output.push_str(code),
    }

    if !output.ends_with('\n') {
        output.push('\n');
    }
    output.push_str(&rule);
    output.push('\n');
    output
}
