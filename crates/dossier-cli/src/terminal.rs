//! Terminal output for rendered blocks, previews and errors

use colored::Colorize;
use dossier_core::{Block, ListItem, Normalized, RenderedBlocks, Span, StageResult};
use std::fmt::Write;

const RULE_WIDTH: usize = 40;

/// Format display blocks for a terminal, one blank line between blocks
pub fn format_blocks(rendered: &RenderedBlocks) -> String {
    let mut out = String::new();
    for (i, block) in rendered.blocks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        format_block(&mut out, block);
    }
    out
}

fn format_block(out: &mut String, block: &Block) {
    match block {
        Block::Heading { level, spans } => {
            let marker = "#".repeat(usize::from(*level));
            let line = format!("{} {}", marker, format_spans(spans));
            let _ = writeln!(out, "{}", if *level <= 2 { line.bold().underline() } else { line.bold() });
        }
        Block::Paragraph { spans } => {
            let _ = writeln!(out, "{}", format_spans(spans));
        }
        Block::List {
            ordered,
            start,
            items,
        } => {
            let mut number = start.unwrap_or(1);
            for ListItem { depth, spans } in items {
                let indent = "  ".repeat(usize::from(*depth));
                let bullet = if *ordered && *depth == 0 {
                    let b = format!("{}.", number);
                    number += 1;
                    b
                } else {
                    "*".to_string()
                };
                let _ = writeln!(out, "{}{} {}", indent, bullet.cyan(), format_spans(spans));
            }
        }
        Block::CodeBlock { code, .. } => {
            for line in code.lines() {
                let _ = writeln!(out, "    {}", line.dimmed());
            }
        }
        Block::Rule => {
            let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH).dimmed());
        }
    }
}

fn format_spans(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text { text } => text.normal().to_string(),
            Span::Emphasis { text } => text.italic().to_string(),
            Span::Strong { text } => text.bold().to_string(),
            Span::Code { text } => text.yellow().to_string(),
            Span::Link { text, url } if text == url => url.blue().underline().to_string(),
            Span::Link { text, url } => format!("{} <{}>", text.underline(), url.blue()),
        })
        .collect()
}

/// One-line summary of what the normalizer found
pub fn format_preview(normalized: &Normalized) -> String {
    match normalized {
        Normalized::Structured { rule, record } => {
            let fields: Vec<String> = record
                .iter()
                .map(|(key, value)| format!("{}={}", key.bold(), value))
                .collect();
            format!("[{}] {}", rule.as_str().green(), fields.join(", "))
        }
        Normalized::Raw(_) => format!("[{}] no structure detected", "raw".yellow()),
    }
}

pub fn print_stage(result: &StageResult) {
    println!();
    print!("{}", format_blocks(&dossier_core::render(&result.content)));
    println!();
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message.red());
}

pub fn print_info(message: &str) {
    println!("{}", message.dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::{render, Normalizer};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_report() {
        plain();
        let out = format_blocks(&render(
            "# Acme\n## Description\nBuilds **anvils**.\n\n## Key Offerings\n* Anvils\n* Rockets\n  * Small",
        ));
        assert_eq!(
            out,
            "# Acme\n\n## Description\n\nBuilds anvils.\n\n## Key Offerings\n\n* Anvils\n* Rockets\n  * Small\n"
        );
    }

    #[test]
    fn test_ordered_list_numbering() {
        plain();
        let out = format_blocks(&render("3. one\n4. two"));
        assert_eq!(out, "3. one\n4. two\n");
    }

    #[test]
    fn test_links_and_code() {
        plain();
        let out = format_blocks(&render("See [site](https://acme.example) and `cargo`"));
        assert_eq!(out, "See site <https://acme.example> and cargo\n");
    }

    #[test]
    fn test_preview() {
        plain();
        let normalizer = Normalizer::default();
        assert_eq!(
            format_preview(&normalizer.normalize("Acme\nNYC")),
            "[short_text] location=NYC, name=Acme"
        );
        assert_eq!(
            format_preview(&normalizer.normalize("a: b\nc: d\ne: f\ng: h")),
            "[raw] no structure detected"
        );
    }
}
