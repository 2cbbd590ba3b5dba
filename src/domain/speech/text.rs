use html2text::from_read;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"https?://[^\s]+").ok());
static WHITESPACE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());
static SENTENCE_END_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[.!?]+\s+").ok());

fn replace_all<'t>(pattern: &LazyLock<Option<Regex>>, text: &'t str, with: &str) -> Cow<'t, str> {
    match pattern.as_ref() {
        Some(pattern) => pattern.replace_all(text, with),
        None => Cow::Borrowed(text),
    }
}

/// Clean text before synthesis: HTML to plain text, URLs and emoji removed,
/// whitespace collapsed.
pub fn clean_text(text: &str) -> String {
    let plain_text = from_read(text.as_bytes(), usize::MAX);

    let without_urls = replace_all(&URL_PATTERN, &plain_text, "");
    let without_emoji: String = without_urls.chars().filter(|c| !is_emoji(*c)).collect();
    let normalized = replace_all(&WHITESPACE_PATTERN, &without_emoji, " ");

    normalized.trim().to_string()
}

fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0xFE0F | 0x200D | 0x1F1E6..=0x1F1FF
    )
}

/// Split text into batches of at most `max_len` bytes, breaking at sentence
/// boundaries where possible and at character boundaries otherwise.
pub fn split_into_batches(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut batches = Vec::new();
    let mut current_batch = String::new();

    for sentence in sentences(text) {
        if !current_batch.is_empty() && current_batch.len() + sentence.len() > max_len {
            batches.push(current_batch.trim().to_string());
            current_batch.clear();
        }

        if sentence.len() > max_len {
            batches.extend(chunk_chars(sentence, max_len));
        } else {
            current_batch.push_str(sentence);
        }
    }

    if !current_batch.trim().is_empty() {
        batches.push(current_batch.trim().to_string());
    }

    batches
}

/// Sentences keep their trailing punctuation and whitespace.
fn sentences(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;

    if let Some(pattern) = SENTENCE_END_PATTERN.as_ref() {
        for sentence_end in pattern.find_iter(text) {
            result.push(&text[start..sentence_end.end()]);
            start = sentence_end.end();
        }
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

fn chunk_chars(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if current.len() + c.len_utf8() > max_len && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
