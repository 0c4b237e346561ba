//! Maps heterogeneous upstream TOC/chapter shapes into the canonical
//! [`BookOutline`] / [`Chapter`] model. Pure functions, fixed defaults,
//! never errors on malformed input.

use crate::book::{BookInfo, BookOutline, Chapter, ChapterState, PromptContext};
use crate::client::{EstimatedPages, TocResponse, TocSection};
use regex::Regex;
use std::sync::OnceLock;

/// Words assumed per printed page.
pub const WORDS_PER_PAGE: u32 = 250;

/// Word target applied when a page estimate is missing or unparseable
/// (the 10-15 page default band).
pub const DEFAULT_TARGET_WORDS: u32 = 3000;

const DEFAULT_SECTION_TITLE: &str = "Untitled Section";
const DEFAULT_DESCRIPTION: &str = "Chapter content description";
const DEFAULT_TONE: &str = "clear and engaging";

/// Build a canonical outline from an upstream TOC response.
///
/// Upstream section order is preserved exactly. The first chapter is always
/// `intro`; subsequent ids are `chapter-NN` zero-padded from the 1-based
/// position. `target_length` is recomputed from the normalized chapters.
pub fn outline_from_toc(resp: &TocResponse, title: &str, book_idea: &str) -> BookOutline {
    let chapters: Vec<Chapter> = resp
        .toc
        .iter()
        .enumerate()
        .map(|(index, section)| normalize_section(section, index))
        .collect();

    let mut outline = BookOutline {
        book: BookInfo {
            title: title.to_string(),
            description: book_idea.to_string(),
            target_length: 0,
        },
        chapters,
    };
    outline.recompute_target_length();
    outline
}

fn normalize_section(section: &TocSection, index: usize) -> Chapter {
    let title = section
        .section_name
        .as_deref()
        .or(section.title.as_deref())
        .or(section.name.as_deref())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SECTION_TITLE)
        .to_string();

    let key_points = resolve_ideas(section);

    let description = if key_points.len() >= 2 {
        format!("{}. {}", key_points[0], key_points[1])
    } else {
        key_points
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string())
    };

    let target_words = match &section.estimated_pages {
        Some(EstimatedPages::Text(s)) => parse_estimated_pages(s),
        Some(EstimatedPages::Number(n)) => ((*n) * WORDS_PER_PAGE as f64).round() as u32,
        None => DEFAULT_TARGET_WORDS,
    };

    let focus = key_points
        .first()
        .cloned()
        .unwrap_or_else(|| "Main chapter focus".to_string());

    Chapter {
        id: chapter_id(index),
        slug: slugify(&title),
        title,
        description,
        target_words,
        status: ChapterState::Pending,
        key_points,
        prompt_context: PromptContext {
            focus,
            tone: DEFAULT_TONE.to_string(),
        },
        content: None,
    }
}

fn resolve_ideas(section: &TocSection) -> Vec<String> {
    let picked = section
        .section_ideas
        .as_ref()
        .or(section.ideas.as_ref())
        .or(section.topics.as_ref());
    match picked {
        Some(ideas) if !ideas.is_empty() => ideas.clone(),
        // Never an empty list; downstream prompts index into it.
        _ => vec!["Key chapter content".to_string()],
    }
}

/// First chapter is `intro`, then `chapter-02`, `chapter-03`, ...
pub fn chapter_id(index: usize) -> String {
    if index == 0 {
        "intro".to_string()
    } else {
        format!("chapter-{:02}", index + 1)
    }
}

fn pages_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*[-\u{2013}]\s*(\d+)").expect("pages regex"))
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("number regex"))
}

/// Turn an upstream page estimate into a word target.
///
/// A range like "8-12" averages to its midpoint; otherwise the first number
/// in the string is taken as a page count ("about 10 pages" reads as 10);
/// anything else falls back to [`DEFAULT_TARGET_WORDS`]. Input comes from a
/// remote backend, so arithmetic saturates instead of overflowing. Never
/// errors.
pub fn parse_estimated_pages(estimated_pages: &str) -> u32 {
    let trimmed = estimated_pages.trim();
    if trimmed.is_empty() {
        return DEFAULT_TARGET_WORDS;
    }

    if let Some(caps) = pages_regex().captures(trimmed) {
        let min: f64 = caps[1].parse().unwrap_or(0.0);
        let max: f64 = caps[2].parse().unwrap_or(min);
        // f64 -> u32 casts saturate.
        return (((min + max) / 2.0) * WORDS_PER_PAGE as f64).round() as u32;
    }

    if let Some(m) = number_regex().find(trimmed) {
        if let Ok(pages) = m.as_str().parse::<u32>() {
            return pages.saturating_mul(WORDS_PER_PAGE);
        }
    }

    DEFAULT_TARGET_WORDS
}

/// Lowercase, drop everything outside word/space/hyphen, collapse runs of
/// whitespace/underscores/hyphens to a single hyphen, trim hyphens.
/// Idempotent.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;
    for c in lowered.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '_' || c == '-' {
            pending_hyphen = true;
        }
        // Everything else is stripped.
    }
    slug
}

/// Whitespace-delimited token count.
pub fn estimate_word_count(content: &str) -> u32 {
    content.split_whitespace().count() as u32
}

/// Drop a leading H1 that merely repeats the chapter title, plus any blank
/// lines right after it. Some backends prepend the title even though the
/// renderer adds its own heading.
pub fn clean_chapter_content(content: &str, chapter_title: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut start = 0;

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(heading) = line.strip_prefix("# ") {
            let heading = heading.trim();
            if heading == chapter_title
                || heading.to_lowercase() == chapter_title.to_lowercase()
            {
                start = i + 1;
                while start < lines.len() && lines[start].trim().is_empty() {
                    start += 1;
                }
            }
        }
        break;
    }

    lines[start..].join("\n")
}

/// Trim Markdown code fences some models wrap JSON payloads in.
pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: Option<&str>, ideas: Option<Vec<&str>>, pages: Option<&str>) -> TocSection {
        TocSection {
            section_name: name.map(str::to_string),
            title: None,
            name: None,
            section_ideas: ideas.map(|v| v.into_iter().map(str::to_string).collect()),
            ideas: None,
            topics: None,
            estimated_pages: pages.map(|p| EstimatedPages::Text(p.to_string())),
        }
    }

    #[test]
    fn test_parse_pages_range() {
        // ((8 + 12) / 2) * 250
        assert_eq!(parse_estimated_pages("8-12"), 2500);
        assert_eq!(parse_estimated_pages("10-15"), 3125);
        // en-dash variant
        assert_eq!(parse_estimated_pages("8\u{2013}12"), 2500);
    }

    #[test]
    fn test_parse_pages_single_number() {
        assert_eq!(parse_estimated_pages("12"), 3000);
        assert_eq!(parse_estimated_pages(" 10 "), 2500);
    }

    #[test]
    fn test_parse_pages_number_embedded_in_prose() {
        assert_eq!(parse_estimated_pages("about 10 pages"), 2500);
        assert_eq!(parse_estimated_pages("~12pp"), 3000);
    }

    #[test]
    fn test_parse_pages_unparseable_falls_back() {
        assert_eq!(parse_estimated_pages("several"), DEFAULT_TARGET_WORDS);
        assert_eq!(parse_estimated_pages(""), DEFAULT_TARGET_WORDS);
    }

    #[test]
    fn test_parse_pages_huge_estimates_saturate() {
        // Remote input must never panic, debug builds included.
        assert_eq!(parse_estimated_pages("99999999"), u32::MAX);
        assert_eq!(
            parse_estimated_pages("4000000000-4000000000"),
            u32::MAX
        );
        // Digit runs beyond u32 fall back to the default.
        assert_eq!(
            parse_estimated_pages("999999999999999999999"),
            DEFAULT_TARGET_WORDS
        );
    }

    #[test]
    fn test_slugify_charset_and_trimming() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  __Advanced -- Topics  "), "advanced-topics");
        assert_eq!(slugify("C++ & Rust"), "c-rust");
        let slug = slugify("-Leading and Trailing-");
        assert!(!slug.starts_with('-') && !slug.ends_with('-'));
    }

    #[test]
    fn test_slugify_idempotent() {
        for input in ["Some Chapter Title!", "already-a-slug", "Mixed_Case 42"] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once);
            assert!(once
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }
    }

    #[test]
    fn test_missing_ideas_get_nonempty_default() {
        let resp = TocResponse {
            toc: vec![section(Some("Basics"), None, Some("8-12"))],
            total_estimated_pages: None,
            book_summary: None,
        };
        let outline = outline_from_toc(&resp, "Book", "Idea");
        assert!(!outline.chapters[0].key_points.is_empty());
    }

    #[test]
    fn test_title_resolution_order() {
        let mut s = section(None, None, None);
        s.title = Some("From Title".to_string());
        s.name = Some("From Name".to_string());
        let resp = TocResponse {
            toc: vec![s.clone()],
            total_estimated_pages: None,
            book_summary: None,
        };
        assert_eq!(outline_from_toc(&resp, "B", "I").chapters[0].title, "From Title");

        s.title = None;
        let resp = TocResponse {
            toc: vec![s],
            total_estimated_pages: None,
            book_summary: None,
        };
        assert_eq!(outline_from_toc(&resp, "B", "I").chapters[0].title, "From Name");

        let resp = TocResponse {
            toc: vec![section(None, None, None)],
            total_estimated_pages: None,
            book_summary: None,
        };
        assert_eq!(
            outline_from_toc(&resp, "B", "I").chapters[0].title,
            "Untitled Section"
        );
    }

    #[test]
    fn test_chapter_ids_and_order() {
        let resp = TocResponse {
            toc: vec![
                section(Some("One"), Some(vec!["a"]), Some("10")),
                section(Some("Two"), Some(vec!["b"]), Some("10")),
                section(Some("Three"), Some(vec!["c"]), Some("10")),
            ],
            total_estimated_pages: None,
            book_summary: None,
        };
        let outline = outline_from_toc(&resp, "B", "I");
        let ids: Vec<&str> = outline.chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "chapter-02", "chapter-03"]);
        let titles: Vec<&str> = outline.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_target_length_is_chapter_sum() {
        let resp = TocResponse {
            toc: vec![
                section(Some("One"), Some(vec!["a"]), Some("8-12")),
                section(Some("Two"), Some(vec!["b"]), Some("12")),
            ],
            total_estimated_pages: Some(99.0),
            book_summary: None,
        };
        let outline = outline_from_toc(&resp, "B", "I");
        assert_eq!(outline.book.target_length, 2500 + 3000);
    }

    #[test]
    fn test_clean_chapter_content_strips_duplicate_h1() {
        let content = "# My Chapter\n\nFirst paragraph.";
        assert_eq!(clean_chapter_content(content, "My Chapter"), "First paragraph.");
        // Case-insensitive match
        assert_eq!(
            clean_chapter_content("# MY CHAPTER\nBody", "My Chapter"),
            "Body"
        );
    }

    #[test]
    fn test_clean_chapter_content_keeps_unrelated_heading() {
        let content = "# Different Title\n\nBody.";
        assert_eq!(clean_chapter_content(content, "My Chapter"), content);
        assert_eq!(clean_chapter_content("Plain text", "My Chapter"), "Plain text");
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("{}"), "{}");
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
    }

    #[test]
    fn test_estimate_word_count() {
        assert_eq!(estimate_word_count("one  two\nthree"), 3);
        assert_eq!(estimate_word_count(""), 0);
    }
}
