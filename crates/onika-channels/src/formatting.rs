//! Reply formatting for Telegram.
//!
//! Models answer in loose Markdown; Telegram accepts a small HTML subset.
//! [`markdown_to_telegram_html`] covers what shows up in practice: fenced
//! and inline code, bold, italic, links, headings and bullets. Anything else
//! is escaped and passed through as text.

use regex::{Captures, Regex};

use onika_router::RouteOutcome;

pub use onika_core::utils::escape_html;

/// Telegram message length limit, in characters.
pub const TELEGRAM_MAX_LEN: usize = 4096;

/// `replace_all`, or the input unchanged if the pattern fails to compile.
fn replace_all(text: &str, pattern: &str, replacement: &str) -> String {
    match Regex::new(pattern) {
        Ok(re) => re.replace_all(text, replacement).into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Pull matches of `pattern` out into `store`, leaving `\x00<tag><n>\x00`.
fn protect(text: &str, pattern: &str, tag: char, store: &mut Vec<String>) -> String {
    let Ok(re) = Regex::new(pattern) else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures| {
        store.push(caps[1].to_string());
        format!("\x00{tag}{}\x00", store.len() - 1)
    })
    .into_owned()
}

/// Convert model Markdown to Telegram HTML.
pub fn markdown_to_telegram_html(text: &str) -> String {
    let mut blocks = Vec::new();
    let mut spans = Vec::new();
    let text = protect(text, r"(?s)```[\w+-]*\n?(.*?)```", 'B', &mut blocks);
    let text = protect(&text, r"`([^`\n]+)`", 'C', &mut spans);

    let text = escape_html(&text);
    let text = replace_all(&text, r"(?m)^#{1,6}\s+(.+?)\s*#*$", "<b>$1</b>");
    let text = replace_all(&text, r"\[([^\]]+)\]\((https?://[^)\s]+)\)", r#"<a href="$2">$1</a>"#);
    let text = replace_all(&text, r"\*\*(.+?)\*\*", "<b>$1</b>");
    let text = replace_all(&text, r"(?m)^[ \t]*[-*+]\s+", "• ");
    let text = replace_all(&text, r"(^|[^\w*])\*([^*\n]+?)\*($|[^\w*])", "$1<i>$2</i>$3");
    let text = replace_all(&text, r"(^|[^\w])_([^_\n]+?)_($|[^\w])", "$1<i>$2</i>$3");

    let mut text = text;
    for (idx, code) in spans.iter().enumerate() {
        text = text.replace(
            &format!("\x00C{idx}\x00"),
            &format!("<code>{}</code>", escape_html(code)),
        );
    }
    for (idx, code) in blocks.iter().enumerate() {
        text = text.replace(
            &format!("\x00B{idx}\x00"),
            &format!("<pre>{}</pre>", escape_html(code.trim_end_matches('\n'))),
        );
    }
    text
}

/// Plain-text footer naming the layer that answered. Empty for the primary layer.
pub fn layer_footer(layer_ordinal: u32) -> String {
    if layer_ordinal > 1 {
        format!("\n\n— Layer {layer_ordinal}")
    } else {
        String::new()
    }
}

/// HTML form of [`layer_footer`].
pub fn layer_footer_html(layer_ordinal: u32) -> String {
    if layer_ordinal > 1 {
        format!("\n\n<i>— Layer {layer_ordinal}</i>")
    } else {
        String::new()
    }
}

/// One Telegram message: HTML to try first, plain text if Telegram rejects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyChunk {
    pub html: String,
    pub plain: String,
}

impl ReplyChunk {
    /// Chunk for text that needs no formatting.
    pub fn text(text: &str) -> Self {
        Self {
            html: escape_html(text),
            plain: text.to_string(),
        }
    }

    /// Chunk for HTML built by this crate; the plain form has tags stripped.
    pub fn html(html: &str) -> Self {
        let stripped = replace_all(html, r"<[^>]*>", "");
        let plain = stripped
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&amp;", "&");
        Self {
            html: html.to_string(),
            plain,
        }
    }
}

/// Split model Markdown into Telegram messages whose HTML stays within
/// `max_chars` and never leaves a tag open across messages.
///
/// A fenced block cut by a split is closed at the end of one chunk and
/// reopened at the start of the next.
pub fn reply_chunks(markdown: &str, max_chars: usize) -> Vec<ReplyChunk> {
    let max_chars = max_chars.max(MIN_CHUNK);
    let mut out = Vec::new();
    push_chunks(markdown, max_chars, max_chars, &mut out);
    out
}

const FENCE: &str = "```";
const MIN_CHUNK: usize = 16;

fn push_chunks(markdown: &str, budget: usize, max_chars: usize, out: &mut Vec<ReplyChunk>) {
    for piece in split_markdown(markdown, budget) {
        let html = markdown_to_telegram_html(&piece);
        if html.chars().count() > max_chars && budget / 2 >= MIN_CHUNK {
            push_chunks(&piece, budget / 2, max_chars, out);
        } else {
            out.push(ReplyChunk { html, plain: piece });
        }
    }
}

/// `split_message`, keeping fenced code blocks closed within each chunk.
fn split_markdown(text: &str, max_chars: usize) -> Vec<String> {
    // Room for a reopened "```\n" and a closing "\n```".
    let reserve = 2 * (FENCE.len() + 1);
    let budget = max_chars.saturating_sub(reserve).max(1);

    let mut in_fence = false;
    split_message(text, budget)
        .into_iter()
        .filter_map(|chunk| {
            let mut piece = String::with_capacity(chunk.len() + reserve);
            if in_fence {
                piece.push_str(FENCE);
                piece.push('\n');
            }
            piece.push_str(&chunk);
            if chunk.matches(FENCE).count() % 2 == 1 {
                in_fence = !in_fence;
            }
            if in_fence {
                close_fence(&mut piece);
            }
            (!piece.trim().is_empty()).then_some(piece)
        })
        .collect()
}

/// Close a fence left open at the end of `piece`. A bare opening line is
/// dropped instead, since the next chunk reopens the block anyway.
fn close_fence(piece: &mut String) {
    let trimmed = piece.trim_end();
    let last_line = trimmed.rsplit('\n').next().unwrap_or("");
    if last_line.trim_start().starts_with(FENCE) && last_line.matches(FENCE).count() == 1 {
        let cut = trimmed.len() - last_line.len();
        piece.truncate(cut);
        while piece.ends_with('\n') {
            piece.pop();
        }
    } else {
        piece.push('\n');
        piece.push_str(FENCE);
    }
}

/// Telegram messages for a route outcome: the formatted answer (with a
/// footer when a fallback layer answered) or the fallback message.
pub fn outcome_chunks(outcome: &RouteOutcome) -> Vec<ReplyChunk> {
    match outcome {
        RouteOutcome::Success {
            content,
            layer_ordinal,
            ..
        } => {
            let footer = layer_footer(*layer_ordinal);
            let room = TELEGRAM_MAX_LEN - layer_footer_html(*layer_ordinal).chars().count();
            let mut chunks = reply_chunks(content, room);
            if chunks.is_empty() {
                chunks.push(ReplyChunk::text(""));
            }
            if let Some(last) = chunks.last_mut() {
                last.html.push_str(&layer_footer_html(*layer_ordinal));
                last.plain.push_str(&footer);
            }
            chunks
        }
        RouteOutcome::Failure {
            fallback_message, ..
        } => split_message(fallback_message, TELEGRAM_MAX_LEN)
            .iter()
            .map(|part| ReplyChunk::text(part))
            .collect(),
    }
}

/// Split `text` into chunks of at most `max_chars` characters, preferring
/// to break after a newline. Never splits inside a UTF-8 sequence.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.chars().count() > max_chars {
        let limit = remaining
            .char_indices()
            .nth(max_chars)
            .map_or(remaining.len(), |(i, _)| i);
        let window = &remaining[..limit];

        match window.rfind('\n').filter(|&i| i > 0) {
            Some(newline) => {
                chunks.push(window[..newline].to_string());
                remaining = &remaining[newline + 1..];
            }
            None => {
                chunks.push(window.to_string());
                remaining = &remaining[limit..];
            }
        }
    }

    chunks.push(remaining.to_string());
    chunks
}
