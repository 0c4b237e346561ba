//! Deterministic placeholder content substituted when the remote generation
//! endpoints fail. Extracted into its own collaborator so tests can swap in
//! fixtures instead of matching source literals.

use crate::book::{
    BookInfo, BookOutline, BookRequest, Chapter, ChapterRequest, ChapterState, GeneratedChapter,
    PromptContext,
};
use crate::normalize::{estimate_word_count, slugify};
use chrono::Utc;

/// Sentence embedded in fallback prose so callers can tell placeholder
/// content from real output.
pub const FALLBACK_MARKER: &str =
    "*Note: This is demonstration content generated while the generation service was unavailable.*";

pub trait FallbackProvider: Send + Sync {
    fn fallback_outline(&self, request: &BookRequest) -> BookOutline;
    fn fallback_chapter(
        &self,
        request: &ChapterRequest,
        outline: &BookOutline,
    ) -> GeneratedChapter;
}

/// The fixed six-chapter generic outline, parameterized only by the requested
/// title and idea.
#[derive(Debug, Default)]
pub struct CannedFallback;

impl CannedFallback {
    fn chapter(
        id: &str,
        slug: &str,
        title: String,
        description: String,
        target_words: u32,
        key_points: Vec<String>,
        focus: &str,
    ) -> Chapter {
        Chapter {
            id: id.to_string(),
            slug: slug.to_string(),
            title,
            description,
            target_words,
            status: ChapterState::Pending,
            key_points,
            prompt_context: PromptContext {
                focus: focus.to_string(),
                tone: "clear and engaging".to_string(),
            },
            content: None,
        }
    }
}

impl FallbackProvider for CannedFallback {
    fn fallback_outline(&self, request: &BookRequest) -> BookOutline {
        let idea = &request.book_idea;
        let mut outline = BookOutline {
            book: BookInfo {
                title: request.title.clone(),
                description: idea.clone(),
                target_length: 0,
            },
            chapters: vec![
                Self::chapter(
                    "intro",
                    "introduction",
                    format!("Introduction to {}", request.title),
                    format!("Overview of {} and what readers will learn", idea),
                    3000,
                    vec![
                        format!("Overview of {}", idea),
                        "Setting the foundation".to_string(),
                        "What readers will learn".to_string(),
                        "Why this topic matters".to_string(),
                    ],
                    "Introduction and overview",
                ),
                Self::chapter(
                    "chapter-02",
                    "core-concepts",
                    "Core Concepts and Fundamentals".to_string(),
                    "Essential principles and foundational knowledge".to_string(),
                    4000,
                    vec![
                        "Essential principles and theories".to_string(),
                        "Key terminology and definitions".to_string(),
                        "Historical context and evolution".to_string(),
                        "Current state of the field".to_string(),
                    ],
                    "Foundational concepts",
                ),
                Self::chapter(
                    "chapter-03",
                    "practical-applications",
                    "Practical Applications".to_string(),
                    "Real-world implementation and case studies".to_string(),
                    5000,
                    vec![
                        "Real-world implementation strategies".to_string(),
                        "Case studies and examples".to_string(),
                        "Step-by-step methodologies".to_string(),
                        "Tools and resources".to_string(),
                    ],
                    "Practical implementation",
                ),
                Self::chapter(
                    "chapter-04",
                    "advanced-techniques",
                    "Advanced Techniques".to_string(),
                    "Expert-level strategies and optimization".to_string(),
                    4500,
                    vec![
                        "Expert-level strategies".to_string(),
                        "Optimization and best practices".to_string(),
                        "Troubleshooting common issues".to_string(),
                        "Scaling and growth considerations".to_string(),
                    ],
                    "Advanced techniques",
                ),
                Self::chapter(
                    "chapter-05",
                    "future-trends",
                    "Future Trends and Opportunities".to_string(),
                    "Emerging developments and future outlook".to_string(),
                    3500,
                    vec![
                        "Emerging developments in the field".to_string(),
                        "Predicted future changes".to_string(),
                        "Opportunities for innovation".to_string(),
                        "Preparing for what's next".to_string(),
                    ],
                    "Future trends",
                ),
                Self::chapter(
                    "chapter-06",
                    "conclusion",
                    "Conclusion and Next Steps".to_string(),
                    "Key takeaways and actionable next steps".to_string(),
                    2500,
                    vec![
                        "Key takeaways and summary".to_string(),
                        "Action items for readers".to_string(),
                        "Additional resources".to_string(),
                        "Final thoughts and encouragement".to_string(),
                    ],
                    "Conclusion and next steps",
                ),
            ],
        };
        outline.recompute_target_length();
        outline
    }

    fn fallback_chapter(
        &self,
        request: &ChapterRequest,
        outline: &BookOutline,
    ) -> GeneratedChapter {
        let title_lower = request.chapter_title.to_lowercase();

        let sections: String = request
            .key_points
            .iter()
            .map(|point| {
                format!(
                    "### {point}\n\nThis section would cover {} in comprehensive detail. \
                     In the full version, this content is generated from your specific \
                     requirements and the overall book context.\n\n",
                    point.to_lowercase()
                )
            })
            .collect();

        let content = format!(
            "## Introduction\n\n{summary}\n\n\
             This chapter explores the key concepts and practical applications related to {title_lower}.\n\n\
             ## Key Topics Covered\n\n{sections}\
             ## Summary\n\nThis chapter has provided an overview of {title_lower}. The key takeaways \
             include understanding the fundamental concepts, practical applications, and how they fit \
             into the broader context of {book_title}.\n\n\
             ## Next Steps\n\nIn the next chapter, we'll build upon the concepts covered here.\n\n\
             ---\n\n{marker}",
            summary = request.chapter_summary,
            book_title = outline.book.title,
            marker = FALLBACK_MARKER,
        );

        GeneratedChapter {
            id: format!("chapter-{:02}", request.chapter_number),
            title: request.chapter_title.clone(),
            description: request.chapter_summary.clone(),
            target_words: request.target_words,
            status: ChapterState::Generated,
            key_points: request.key_points.clone(),
            prompt_context: PromptContext {
                focus: request
                    .key_points
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "Chapter focus".to_string()),
                tone: request.writing_style.clone(),
            },
            word_count: estimate_word_count(&content),
            content,
            generated_at: Utc::now(),
            slug: slugify(&request.chapter_title),
            chapter_number: request.chapter_number,
        }
    }
}
