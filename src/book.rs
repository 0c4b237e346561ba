use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chapter lifecycle within an outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterState {
    Pending,
    Generated,
    Edited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptContext {
    pub focus: String,
    pub tone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub description: String,
    pub target_words: u32,
    pub status: ChapterState,
    pub key_points: Vec<String>,
    pub prompt_context: PromptContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookInfo {
    pub title: String,
    pub description: String,
    pub target_length: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookOutline {
    pub book: BookInfo,
    pub chapters: Vec<Chapter>,
}

impl BookOutline {
    /// Recompute `target_length` as the sum of per-chapter targets.
    /// The upstream estimate is advisory only; this is the binding value.
    pub fn recompute_target_length(&mut self) {
        self.book.target_length = self.chapters.iter().map(|c| c.target_words).sum();
    }
}

/// A chapter with its prose attached. Unlike [`Chapter`], content is mandatory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedChapter {
    pub id: String,
    pub title: String,
    pub description: String,
    pub target_words: u32,
    pub status: ChapterState,
    pub key_points: Vec<String>,
    pub prompt_context: PromptContext,
    pub content: String,
    pub word_count: u32,
    pub generated_at: DateTime<Utc>,
    pub slug: String,
    pub chapter_number: u32,
}

/// Project status. Transitions only move forward:
/// draft -> outline_complete -> generating -> complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    OutlineComplete,
    Generating,
    Complete,
}

/// Persisted project record, owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookProject {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub author: String,
    pub book_idea: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<BookOutline>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transient bundle carrying everything the project renderer needs.
/// Not persisted independently.
#[derive(Debug, Clone)]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub topic: String,
    pub outline: BookOutline,
}

/// User form input kicking off the pipeline.
#[derive(Debug, Clone)]
pub struct BookRequest {
    pub title: String,
    pub author: String,
    pub book_idea: String,
    pub topic: String,
    pub writing_style: Option<String>,
    pub target_audience: Option<String>,
}

/// Parameters for generating one chapter.
#[derive(Debug, Clone)]
pub struct ChapterRequest {
    pub chapter_number: u32,
    pub chapter_title: String,
    pub chapter_summary: String,
    pub key_points: Vec<String>,
    pub book_title: String,
    pub author: String,
    pub previous_chapters: Vec<String>,
    pub book_theme: String,
    pub target_audience: String,
    pub writing_style: String,
    pub target_words: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Content came back from the remote endpoint.
    Generated,
    /// Remote call failed; deterministic placeholder content was substituted.
    Fallback,
    /// Requested index does not exist in the outline.
    Skipped,
}

/// Per-chapter result of a batch generation run. Both the sequential and the
/// parallel paths report one outcome per requested index.
#[derive(Debug, Clone)]
pub struct ChapterOutcome {
    pub index: usize,
    pub kind: OutcomeKind,
    pub word_count: u32,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectStats {
    pub total_chapters: usize,
    pub completed_chapters: usize,
    pub completion_percentage: u32,
    pub estimated_words: u32,
    pub actual_words: u32,
    pub average_words_per_chapter: u32,
}
