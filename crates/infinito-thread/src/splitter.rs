//! Progressive disclosure: a short lead plus an optional remainder.
//!
//! Pure text functions; no I/O.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Sentences shown before "show more"
const CONCISE_SENTENCES: usize = 2;

const LEGACY_IMAGE_TAG: &str = "[AiO Image Generated]";

static MEDIA_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(IMAGE|VIDEO|AUDIO)_DISPLAY:([^\]]*)\]").expect("media marker pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosure {
    pub concise: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed: Option<String>,
}

impl Disclosure {
    pub fn has_more(&self) -> bool {
        self.detailed.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMarker {
    pub kind: MediaKind,
    pub url: String,
}

/// Split completed answer text into `{concise, detailed}`.
///
/// Text carrying a media marker is never split. Otherwise the first two
/// sentences form the concise part and the rest, if any, the detailed part.
pub fn split(text: &str) -> Disclosure {
    if contains_media_marker(text) {
        return Disclosure {
            concise: text.to_string(),
            detailed: None,
        };
    }

    let sentences = sentences(text);
    if sentences.len() <= CONCISE_SENTENCES {
        return Disclosure {
            concise: text.to_string(),
            detailed: None,
        };
    }

    Disclosure {
        concise: sentences[..CONCISE_SENTENCES].join(" "),
        detailed: Some(sentences[CONCISE_SENTENCES..].join(" ")),
    }
}

/// Sentences with their terminal punctuation, trimmed.
///
/// A run of `.`, `!` or `?` ends a sentence only when followed by whitespace
/// or the end of the text, so "2.1M" and "e.g" stay whole. Closing quotes and
/// brackets directly after the run stay with the sentence.
pub fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminal(c) {
            continue;
        }

        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if is_terminal(next) || is_closer(next) {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        let at_boundary = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
        if at_boundary {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

pub fn contains_media_marker(text: &str) -> bool {
    text.contains(LEGACY_IMAGE_TAG) || MEDIA_MARKER.is_match(text)
}

/// Media references embedded in the text, in order of appearance
pub fn media_markers(text: &str) -> Vec<MediaMarker> {
    MEDIA_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let kind = match &caps[1] {
                "IMAGE" => MediaKind::Image,
                "VIDEO" => MediaKind::Video,
                "AUDIO" => MediaKind::Audio,
                _ => return None,
            };
            Some(MediaMarker {
                kind,
                url: caps[2].trim().to_string(),
            })
        })
        .collect()
}

/// Display paragraphs: blank-line separated first, then single lines, then
/// one paragraph per sentence.
pub fn paragraphs(text: &str) -> Vec<String> {
    let blocks: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if blocks.len() > 1 {
        return blocks.into_iter().map(String::from).collect();
    }

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() > 1 {
        return lines.into_iter().map(String::from).collect();
    }

    sentences(text).into_iter().map(String::from).collect()
}

/// Expansion topic derived from the concise text
pub fn topic_from(concise: &str) -> String {
    concise
        .trim_end()
        .trim_end_matches(|c: char| is_terminal(c) || c.is_whitespace())
        .trim()
        .to_string()
}
