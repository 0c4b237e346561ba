//! Orchestrates the pipeline: outline -> chapters -> packaged project, plus
//! project persistence. Failure policy is uniform: outline and chapter
//! generation never error (fallback content absorbs failures, reported per
//! chapter), while cover/PDF generation and persistence surface generic
//! errors with the upstream detail logged only.

use crate::archive::build_zip;
use crate::book::{
    BookMetadata, BookOutline, BookProject, BookRequest, Chapter, ChapterOutcome, ChapterRequest,
    ChapterState, GeneratedChapter, OutcomeKind, ProjectStats, ProjectStatus, PromptContext,
};
use crate::client::{
    ApiError, ContentRequest, CoverRequest, CoverResponse, GenerationClient, PdfRequest,
    PdfResponse, TocEntry, TocRequest,
};
use crate::config::Config;
use crate::fallback::FallbackProvider;
use crate::normalize::{clean_chapter_content, estimate_word_count, outline_from_toc, slugify};
use crate::project::{create_project_filename, generate_project};
use crate::store::ProjectStore;
use anyhow::{anyhow, Result};
use chrono::Utc;
use futures_util::future::join_all;
use log::{error, warn};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ConfigCheck {
    pub configured: bool,
    pub error: Option<String>,
}

pub struct BookService {
    config: Config,
    client: Box<dyn GenerationClient>,
    fallback: Box<dyn FallbackProvider>,
    store: Box<dyn ProjectStore>,
    user_id: Option<String>,
}

impl BookService {
    pub fn new(
        config: Config,
        client: Box<dyn GenerationClient>,
        fallback: Box<dyn FallbackProvider>,
        store: Box<dyn ProjectStore>,
    ) -> Self {
        let user_id = config.store.as_ref().map(|s| s.user_id.clone());
        Self {
            config,
            client,
            fallback,
            store,
            user_id,
        }
    }

    /// Request an outline and normalize it. Never errors: any upstream
    /// failure is logged and replaced by the fallback outline.
    pub async fn generate_outline(&self, request: &BookRequest) -> BookOutline {
        let toc_request = TocRequest {
            title: request.title.clone(),
            author: request.author.clone(),
            book_idea: request.book_idea.clone(),
        };

        match self.client.generate_toc(&toc_request).await {
            Ok(resp) if !resp.toc.is_empty() => {
                outline_from_toc(&resp, &request.title, &request.book_idea)
            }
            Ok(_) => {
                warn!("Outline endpoint returned an empty TOC, using fallback outline");
                self.fallback.fallback_outline(request)
            }
            Err(e) => {
                warn!("Outline generation failed ({e}), using fallback outline");
                self.fallback.fallback_outline(request)
            }
        }
    }

    /// Generate one chapter, substituting fallback prose on failure.
    pub async fn generate_chapter(
        &self,
        request: &ChapterRequest,
        outline: &BookOutline,
    ) -> GeneratedChapter {
        match self.request_chapter(request, outline).await {
            Ok(chapter) => chapter,
            Err(e) => {
                warn!(
                    "Chapter {} generation failed ({e}), using fallback chapter",
                    request.chapter_number
                );
                self.fallback.fallback_chapter(request, outline)
            }
        }
    }

    /// Generate the requested chapters one at a time, pausing between calls.
    ///
    /// An empty `indices` slice means every chapter. Failures are recovered
    /// per chapter with fallback content; the outcome list records what
    /// happened at each index. Indices outside the outline are skipped.
    pub async fn generate_chapters<F>(
        &self,
        outline: &BookOutline,
        metadata: &BookMetadata,
        indices: &[usize],
        mut on_progress: F,
    ) -> (Vec<GeneratedChapter>, Vec<ChapterOutcome>)
    where
        F: FnMut(usize, &GeneratedChapter),
    {
        let requested = resolve_indices(indices, outline.chapters.len());
        let delay = Duration::from_millis(self.config.generation.chapter_delay_ms);

        let mut chapters: Vec<GeneratedChapter> = Vec::new();
        let mut outcomes: Vec<ChapterOutcome> = Vec::new();
        let mut first = true;

        for index in requested {
            let Some(chapter) = outline.chapters.get(index) else {
                outcomes.push(skipped(index));
                continue;
            };

            if !first {
                tokio::time::sleep(delay).await;
            }
            first = false;

            let request = self.chapter_request(index, chapter, metadata, &chapters);
            match self.request_chapter(&request, outline).await {
                Ok(generated) => {
                    outcomes.push(ChapterOutcome {
                        index,
                        kind: OutcomeKind::Generated,
                        word_count: generated.word_count,
                        detail: None,
                    });
                    on_progress(index, &generated);
                    chapters.push(generated);
                }
                Err(e) => {
                    warn!("Chapter {} generation failed ({e}), using fallback", index + 1);
                    let generated = self.fallback.fallback_chapter(&request, outline);
                    outcomes.push(ChapterOutcome {
                        index,
                        kind: OutcomeKind::Fallback,
                        word_count: generated.word_count,
                        detail: Some(e.to_string()),
                    });
                    on_progress(index, &generated);
                    chapters.push(generated);
                }
            }
        }

        (chapters, outcomes)
    }

    /// Generate the requested chapters concurrently.
    ///
    /// Same contract as [`generate_chapters`](Self::generate_chapters): one
    /// rejected request falls back to placeholder content for that chapter
    /// only, never failing the whole batch. Requests are independent, so
    /// chapters generated this way see no previous-chapter context.
    pub async fn generate_chapters_parallel<F>(
        &self,
        outline: &BookOutline,
        metadata: &BookMetadata,
        indices: &[usize],
        mut on_progress: F,
    ) -> (Vec<GeneratedChapter>, Vec<ChapterOutcome>)
    where
        F: FnMut(usize, &GeneratedChapter),
    {
        let requested = resolve_indices(indices, outline.chapters.len());

        let mut outcomes: Vec<ChapterOutcome> = Vec::new();
        let mut futures = Vec::new();
        for index in requested {
            let Some(chapter) = outline.chapters.get(index) else {
                outcomes.push(skipped(index));
                continue;
            };
            let request = self.chapter_request(index, chapter, metadata, &[]);
            futures.push(async move {
                match self.request_chapter(&request, outline).await {
                    Ok(generated) => (index, generated, None),
                    Err(e) => {
                        warn!(
                            "Chapter {} generation failed ({e}), using fallback",
                            index + 1
                        );
                        let generated = self.fallback.fallback_chapter(&request, outline);
                        (index, generated, Some(e.to_string()))
                    }
                }
            });
        }

        let mut chapters = Vec::new();
        for (index, generated, detail) in join_all(futures).await {
            outcomes.push(ChapterOutcome {
                index,
                kind: if detail.is_some() {
                    OutcomeKind::Fallback
                } else {
                    OutcomeKind::Generated
                },
                word_count: generated.word_count,
                detail,
            });
            on_progress(index, &generated);
            chapters.push(generated);
        }

        (chapters, outcomes)
    }

    /// Generate a cover image. Surfaces a generic error; detail is logged.
    pub async fn generate_cover(&self, request: &CoverRequest) -> Result<CoverResponse> {
        self.client.generate_cover(request).await.map_err(|e| {
            error!("Cover generation error: {e}");
            anyhow!("Failed to generate cover")
        })
    }

    /// Render the book as a PDF. Surfaces a generic error; detail is logged.
    pub async fn generate_pdf(&self, request: &PdfRequest) -> Result<PdfResponse> {
        self.client.generate_pdf(request).await.map_err(|e| {
            error!("PDF generation error: {e}");
            anyhow!("Failed to generate PDF")
        })
    }

    /// Render the project files and pack them into a zip archive. Pure
    /// in-memory transformation.
    pub fn create_quarto_project(
        &self,
        outline: &BookOutline,
        metadata: &BookMetadata,
        chapters: &[GeneratedChapter],
    ) -> Result<Vec<u8>> {
        let files = generate_project(outline, metadata, chapters);
        build_zip(&files)
    }

    pub fn download_filename(&self, metadata: &BookMetadata) -> String {
        create_project_filename(metadata)
    }

    pub async fn save_project(
        &self,
        metadata: &BookMetadata,
        status: ProjectStatus,
    ) -> Result<String> {
        let user_id = self
            .user_id
            .clone()
            .ok_or_else(|| anyhow!("User not authenticated"))?;
        let now = Utc::now();
        let project = BookProject {
            id: Uuid::new_v4().to_string(),
            user_id,
            title: metadata.title.clone(),
            author: metadata.author.clone(),
            book_idea: metadata.topic.clone(),
            topic: metadata.topic.clone(),
            outline: Some(metadata.outline.clone()),
            status,
            created_at: now,
            updated_at: now,
        };
        self.store.save(&project).await.map_err(|e| {
            error!("Database save error: {e:#}");
            anyhow!("Failed to save project")
        })
    }

    pub async fn load_project(&self, project_id: &str) -> Result<BookProject> {
        self.store.load(project_id).await.map_err(|e| {
            error!("Database load error: {e:#}");
            anyhow!("Failed to load project")
        })
    }

    /// Projects owned by the configured user, newest first. No user means an
    /// empty list, not an error.
    pub async fn list_projects(&self) -> Result<Vec<BookProject>> {
        let Some(user_id) = &self.user_id else {
            return Ok(Vec::new());
        };
        self.store.list(user_id).await.map_err(|e| {
            error!("Database list error: {e:#}");
            anyhow!("Failed to list projects")
        })
    }

    pub async fn update_project_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
    ) -> Result<()> {
        self.store.update_status(project_id, status).await.map_err(|e| {
            error!("Status update error: {e:#}");
            anyhow!("Failed to update project status")
        })
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        self.store.delete(project_id).await.map_err(|e| {
            error!("Delete project error: {e:#}");
            anyhow!("Failed to delete project")
        })
    }

    pub fn check_configuration(&self) -> ConfigCheck {
        if self.config.api.provider != "demo" && self.config.api.token.is_empty() {
            return ConfigCheck {
                configured: false,
                error: Some(
                    "Generation API token not configured. Set api.token in config.yml."
                        .to_string(),
                ),
            };
        }
        ConfigCheck {
            configured: true,
            error: None,
        }
    }

    pub fn project_stats(
        &self,
        outline: &BookOutline,
        generated: &[GeneratedChapter],
    ) -> ProjectStats {
        let total = outline.chapters.len();
        let completed = generated.len();
        let actual: u32 = generated.iter().map(|c| c.word_count).sum();
        ProjectStats {
            total_chapters: total,
            completed_chapters: completed,
            completion_percentage: if total > 0 {
                ((completed as f64 / total as f64) * 100.0).round() as u32
            } else {
                0
            },
            estimated_words: outline.book.target_length,
            actual_words: actual,
            average_words_per_chapter: if completed > 0 {
                (actual as f64 / completed as f64).round() as u32
            } else {
                0
            },
        }
    }

    fn chapter_request(
        &self,
        index: usize,
        chapter: &Chapter,
        metadata: &BookMetadata,
        done: &[GeneratedChapter],
    ) -> ChapterRequest {
        ChapterRequest {
            chapter_number: index as u32 + 1,
            chapter_title: chapter.title.clone(),
            chapter_summary: chapter.description.clone(),
            key_points: chapter.key_points.clone(),
            book_title: metadata.title.clone(),
            author: metadata.author.clone(),
            previous_chapters: done.iter().map(|c| c.title.clone()).collect(),
            book_theme: metadata.topic.clone(),
            target_audience: self.config.defaults.target_audience.clone(),
            writing_style: chapter.prompt_context.tone.clone(),
            target_words: chapter.target_words,
        }
    }

    async fn request_chapter(
        &self,
        request: &ChapterRequest,
        outline: &BookOutline,
    ) -> Result<GeneratedChapter, ApiError> {
        // The content endpoint wants the whole TOC back in its own shape.
        let toc: Vec<TocEntry> = outline
            .chapters
            .iter()
            .map(|c| TocEntry {
                section_name: c.title.clone(),
                section_ideas: c.key_points.clone(),
                estimated_pages: c.target_words.div_ceil(250).to_string(),
            })
            .collect();

        let resp = self
            .client
            .generate_content(&ContentRequest {
                title: request.book_title.clone(),
                author: request.author.clone(),
                book_idea: outline.book.description.clone(),
                toc,
                chapter_number: request.chapter_number,
                content_depth: self.config.generation.content_depth.clone(),
                generation_mode: self.config.generation.generation_mode.clone(),
            })
            .await?;

        if resp.content.trim().is_empty() {
            return Err(ApiError::Malformed("empty chapter content".to_string()));
        }

        let title = resp
            .chapter_title
            .unwrap_or_else(|| request.chapter_title.clone());
        let content = clean_chapter_content(&resp.content, &title);
        let word_count = resp
            .word_count
            .unwrap_or_else(|| estimate_word_count(&content));

        Ok(GeneratedChapter {
            id: format!("chapter-{:02}", request.chapter_number),
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
            word_count,
            content,
            generated_at: Utc::now(),
            slug: slugify(&title),
            chapter_number: resp.chapter_number.unwrap_or(request.chapter_number),
            title,
        })
    }
}

fn resolve_indices(indices: &[usize], chapter_count: usize) -> Vec<usize> {
    if indices.is_empty() {
        (0..chapter_count).collect()
    } else {
        indices.to_vec()
    }
}

fn skipped(index: usize) -> ChapterOutcome {
    ChapterOutcome {
        index,
        kind: OutcomeKind::Skipped,
        word_count: 0,
        detail: Some("no such chapter in outline".to_string()),
    }
}
