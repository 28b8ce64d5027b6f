use colored::*;
use pulldown_cmark::{CodeBlockKind, Event as MdEvent, Options, Parser as MdParser, Tag};
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};

const RULE_WIDTH: usize = 40;

/// Print an assistant reply to the terminal
pub fn print_reply(reply: &str) {
    println!("\n🤖 {}: {}", "Assistant".blue().bold(), render_markdown(reply));
}

pub fn print_banner(user_id: &str, model: &str) {
    println!("{}", "✅ Chatbot initialized successfully!".green());
    println!("👤 User ID: {}", user_id.cyan());
    println!("⚡ Model: {}", model.cyan());
    println!("📝 Type 'quit' or 'exit' to end the conversation\n");
    println!("{}", "-".repeat(60).dimmed());
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAXES: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAXES.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> Option<&'static Theme> {
    static THEMES: OnceLock<ThemeSet> = OnceLock::new();
    let themes = THEMES.get_or_init(ThemeSet::load_defaults);
    themes
        .themes
        .get("base16-ocean.dark")
        .or_else(|| themes.themes.values().next())
}

fn highlight_code(lang: &str, code: &str) -> String {
    let mut output = String::new();
    if !lang.is_empty() {
        output.push_str(&format!("{}:\n", lang.cyan()));
    }
    output.push_str(&"─".repeat(RULE_WIDTH).dimmed().to_string());
    output.push('\n');

    let syntaxes = syntax_set();
    let syntax = syntaxes
        .find_syntax_by_token(lang)
        .unwrap_or_else(|| syntaxes.find_syntax_plain_text());

    match theme() {
        Some(theme) => {
            let mut highlighter = HighlightLines::new(syntax, theme);
            for line in LinesWithEndings::from(code) {
                match highlighter.highlight_line(line, syntaxes) {
                    Ok(ranges) => output.push_str(&as_24_bit_terminal_escaped(&ranges, false)),
                    Err(_) => output.push_str(line),
                }
            }
            // Reset colours left over from the last highlighted span
            output.push_str("\x1b[0m");
        }
        None => output.push_str(code),
    }

    if !output.ends_with('\n') {
        output.push('\n');
    }
    output.push_str(&"─".repeat(RULE_WIDTH).dimmed().to_string());
    output.push('\n');
    output
}

fn ensure_blank_line(output: &mut String) {
    if output.is_empty() || output.ends_with("\n\n") {
        return;
    }
    output.push_str(if output.ends_with('\n') { "\n" } else { "\n\n" });
}

/// Render markdown for the terminal
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut output = String::new();
    let mut code_block: Option<(String, String)> = None;
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut heading = false;
    let mut strong = false;
    let mut emphasis = false;

    for event in MdParser::new_ext(markdown, options) {
        match event {
            MdEvent::Start(Tag::Heading(..)) => {
                ensure_blank_line(&mut output);
                heading = true;
            }
            MdEvent::End(Tag::Heading(..)) => {
                heading = false;
                output.push('\n');
            }
            MdEvent::Start(Tag::Paragraph) => {
                if lists.is_empty() {
                    ensure_blank_line(&mut output);
                }
            }
            MdEvent::End(Tag::Paragraph) => output.push('\n'),
            MdEvent::Start(Tag::List(start)) => {
                if lists.is_empty() {
                    ensure_blank_line(&mut output);
                }
                lists.push(start);
            }
            MdEvent::End(Tag::List(_)) => {
                lists.pop();
            }
            MdEvent::Start(Tag::Item) => {
                if !output.is_empty() && !output.ends_with('\n') {
                    output.push('\n');
                }
                output.push_str(&"  ".repeat(lists.len().saturating_sub(1)));
                match lists.last_mut() {
                    Some(Some(number)) => {
                        output.push_str(&format!("{}. ", number));
                        *number += 1;
                    }
                    _ => output.push_str(&format!("{}  ", "•".yellow())),
                }
            }
            MdEvent::End(Tag::Item) => {
                if !output.ends_with('\n') {
                    output.push('\n');
                }
            }
            MdEvent::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                code_block = Some((lang, String::new()));
            }
            MdEvent::End(Tag::CodeBlock(_)) => {
                if let Some((lang, code)) = code_block.take() {
                    ensure_blank_line(&mut output);
                    output.push_str(&highlight_code(&lang, &code));
                }
            }
            MdEvent::Start(Tag::Strong) => strong = true,
            MdEvent::End(Tag::Strong) => strong = false,
            MdEvent::Start(Tag::Emphasis) => emphasis = true,
            MdEvent::End(Tag::Emphasis) => emphasis = false,
            MdEvent::Text(text) => match code_block.as_mut() {
                Some((_, code)) => code.push_str(&text),
                None => {
                    let styled = if heading {
                        text.bright_cyan().bold()
                    } else if strong {
                        text.bold()
                    } else if emphasis {
                        text.italic()
                    } else {
                        text.normal()
                    };
                    output.push_str(&styled.to_string());
                }
            },
            MdEvent::Code(code) => {
                output.push_str(&format!("`{}`", code).on_bright_black().white().to_string());
            }
            MdEvent::TaskListMarker(done) => output.push_str(if done { "[x] " } else { "[ ] " }),
            MdEvent::Rule => {
                ensure_blank_line(&mut output);
                output.push_str(&"─".repeat(RULE_WIDTH).dimmed().to_string());
                output.push('\n');
            }
            MdEvent::SoftBreak => output.push(' '),
            MdEvent::HardBreak => output.push('\n'),
            MdEvent::Html(html) => output.push_str(&html),
            _ => {}
        }
    }

    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(markdown: &str) -> String {
        colored::control::set_override(false);
        render_markdown(markdown)
    }

    #[test]
    fn test_plain_paragraphs() {
        assert_eq!(plain("Hello there.\n\nSecond line."), "Hello there.\n\nSecond line.");
    }

    #[test]
    fn test_lists() {
        let rendered = plain("Options:\n\n- dark\n- light\n\n1. first\n2. second");
        assert!(rendered.contains("•  dark\n"));
        assert!(rendered.contains("•  light\n"));
        assert!(rendered.contains("1. first\n2. second"));
    }

    #[test]
    fn test_code_block_keeps_source() {
        let rendered = plain("```rust\nfn main() {}\n```");
        assert!(rendered.contains("rust:"));
        assert!(rendered.contains("fn"));
        assert!(rendered.contains("main"));
    }
}
