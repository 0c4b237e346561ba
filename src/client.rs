use crate::config::Config;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;
use url::Url;

/// Errors from the remote generation endpoints. The orchestrator decides
/// whether these are absorbed by fallback content or surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("generation API returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Malformed(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
}

// --- Wire shapes ---

#[derive(Debug, Clone, Serialize)]
pub struct TocRequest {
    pub title: String,
    pub author: String,
    pub book_idea: String,
}

/// One TOC section as returned upstream. Field names vary between backends,
/// so every variant is captured and resolution happens in the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocSection {
    #[serde(default)]
    pub section_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub section_ideas: Option<Vec<String>>,
    #[serde(default)]
    pub ideas: Option<Vec<String>>,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub estimated_pages: Option<EstimatedPages>,
}

/// Backends send page estimates either as "8-12" strings or bare numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EstimatedPages {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TocResponse {
    pub toc: Vec<TocSection>,
    #[serde(default)]
    pub total_estimated_pages: Option<f64>,
    #[serde(default)]
    pub book_summary: Option<String>,
}

/// TOC entry in the shape the content endpoint expects.
#[derive(Debug, Clone, Serialize)]
pub struct TocEntry {
    pub section_name: String,
    pub section_ideas: Vec<String>,
    pub estimated_pages: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentRequest {
    pub title: String,
    pub author: String,
    pub book_idea: String,
    pub toc: Vec<TocEntry>,
    pub chapter_number: u32,
    pub content_depth: String,
    pub generation_mode: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentResponse {
    #[serde(default)]
    pub chapter_number: Option<u32>,
    #[serde(default)]
    pub chapter_title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub word_count: Option<u32>,
    #[serde(default)]
    pub estimated_pages: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverRequest {
    pub title: String,
    pub author: String,
    pub book_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_style: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverResponse {
    pub cover_url: String,
    pub design_description: String,
    #[serde(default)]
    pub color_palette: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfChapter {
    pub chapter_number: u32,
    pub chapter_title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfRequest {
    pub title: String,
    pub author: String,
    pub chapters: Vec<PdfChapter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_toc: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfResponse {
    pub pdf_url: String,
    pub total_pages: u32,
    pub word_count: u32,
    pub file_size_mb: f64,
}

// --- Client trait ---

#[async_trait]
pub trait GenerationClient: Send + Sync + Debug {
    async fn generate_toc(&self, request: &TocRequest) -> Result<TocResponse, ApiError>;
    async fn generate_content(&self, request: &ContentRequest)
        -> Result<ContentResponse, ApiError>;
    async fn generate_cover(&self, request: &CoverRequest) -> Result<CoverResponse, ApiError>;
    async fn generate_pdf(&self, request: &PdfRequest) -> Result<PdfResponse, ApiError>;
}

pub fn create_client(config: &Config) -> Result<Box<dyn GenerationClient>> {
    match config.api.provider.as_str() {
        "hal9" => Ok(Box::new(HttpGenerationClient::new(
            &config.api.base_url,
            &config.api.token,
        )?)),
        "demo" => Ok(Box::new(DemoGenerationClient::new(Duration::from_millis(
            config.generation.demo_delay_ms,
        )))),
        other => Err(anyhow!("Unknown generation provider: {}", other)),
    }
}

// --- HTTP implementation ---

#[derive(Debug)]
pub struct HttpGenerationClient {
    base_url: Url,
    token: String,
    client: reqwest::Client,
}

impl HttpGenerationClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, ApiError> {
        if token.is_empty() {
            return Err(ApiError::NotConfigured(
                "generation API token is not set".to_string(),
            ));
        }
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url =
            Url::parse(&base).map_err(|e| ApiError::NotConfigured(format!("bad base URL: {e}")))?;
        Ok(Self {
            base_url,
            token: token.to_string(),
            client: reqwest::Client::new(),
        })
    }

    async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| ApiError::NotConfigured(format!("bad endpoint {endpoint}: {e}")))?;

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        // Some backends wrap JSON payloads in Markdown code fences.
        let text = resp.text().await?;
        let body = crate::normalize::strip_code_blocks(&text);
        serde_json::from_str::<R>(&body).map_err(|e| ApiError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate_toc(&self, request: &TocRequest) -> Result<TocResponse, ApiError> {
        self.post_json("generate-toc", request).await
    }

    async fn generate_content(
        &self,
        request: &ContentRequest,
    ) -> Result<ContentResponse, ApiError> {
        self.post_json("generate-content", request).await
    }

    async fn generate_cover(&self, request: &CoverRequest) -> Result<CoverResponse, ApiError> {
        self.post_json("generate-cover", request).await
    }

    async fn generate_pdf(&self, request: &PdfRequest) -> Result<PdfResponse, ApiError> {
        self.post_json("generate-pdf", request).await
    }
}

// --- Demo implementation ---

/// Fabricates canned responses after an artificial delay. Used for the
/// unauthenticated flow and for exercising the pipeline offline.
#[derive(Debug)]
pub struct DemoGenerationClient {
    delay: Duration,
}

impl DemoGenerationClient {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    fn canned_sections(book_idea: &str) -> Vec<TocSection> {
        let mk = |name: &str, ideas: Vec<String>, pages: &str| TocSection {
            section_name: Some(name.to_string()),
            title: None,
            name: None,
            section_ideas: Some(ideas),
            ideas: None,
            topics: None,
            estimated_pages: Some(EstimatedPages::Text(pages.to_string())),
        };
        vec![
            mk(
                "Introduction",
                vec![
                    format!("Overview of {book_idea}"),
                    "What readers will learn".to_string(),
                    "Why this topic matters".to_string(),
                ],
                "10-14",
            ),
            mk(
                "Core Concepts and Fundamentals",
                vec![
                    "Essential principles and theories".to_string(),
                    "Key terminology and definitions".to_string(),
                    "Current state of the field".to_string(),
                ],
                "14-18",
            ),
            mk(
                "Practical Applications",
                vec![
                    "Real-world implementation strategies".to_string(),
                    "Case studies and examples".to_string(),
                    "Tools and resources".to_string(),
                ],
                "18-22",
            ),
            mk(
                "Advanced Techniques",
                vec![
                    "Expert-level strategies".to_string(),
                    "Optimization and best practices".to_string(),
                    "Troubleshooting common issues".to_string(),
                ],
                "16-20",
            ),
            mk(
                "Future Trends and Opportunities",
                vec![
                    "Emerging developments in the field".to_string(),
                    "Predicted future changes".to_string(),
                    "Opportunities for innovation".to_string(),
                ],
                "12-16",
            ),
            mk(
                "Conclusion and Next Steps",
                vec![
                    "Key takeaways and summary".to_string(),
                    "Action items for readers".to_string(),
                    "Additional resources".to_string(),
                ],
                "8-12",
            ),
        ]
    }
}

#[async_trait]
impl GenerationClient for DemoGenerationClient {
    async fn generate_toc(&self, request: &TocRequest) -> Result<TocResponse, ApiError> {
        tokio::time::sleep(self.delay).await;
        Ok(TocResponse {
            toc: Self::canned_sections(&request.book_idea),
            total_estimated_pages: Some(100.0),
            book_summary: Some(format!(
                "A practical guide to {} by {}.",
                request.book_idea, request.author
            )),
        })
    }

    async fn generate_content(
        &self,
        request: &ContentRequest,
    ) -> Result<ContentResponse, ApiError> {
        tokio::time::sleep(self.delay).await;

        let index = request.chapter_number.saturating_sub(1) as usize;
        let section = request.toc.get(index);
        let title = section
            .map(|s| s.section_name.clone())
            .unwrap_or_else(|| "Generated Chapter".to_string());
        let points = section
            .map(|s| {
                s.section_ideas
                    .iter()
                    .map(|idea| format!("- {idea}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_else(|| "- Key chapter content".to_string());

        let content = format!(
            "# {title}\n\nThis is demo chapter content generated for \"{}\" by {}.\n\n\
             ## Overview\n\n{}\n\n## Key Points\n\n{points}\n\n\
             ## Detailed Analysis\n\nThis chapter provides comprehensive coverage of the topic \
             with real-world examples, expert insights, and actionable recommendations.\n\n\
             ## Conclusion\n\nThis demo content shows how the book would be structured and formatted.",
            request.title, request.author, request.book_idea,
        );
        let word_count = crate::normalize::estimate_word_count(&content);

        Ok(ContentResponse {
            chapter_number: Some(request.chapter_number),
            chapter_title: Some(title),
            word_count: Some(word_count),
            estimated_pages: Some((word_count as f64 / 250.0).ceil()),
            content,
        })
    }

    async fn generate_cover(&self, request: &CoverRequest) -> Result<CoverResponse, ApiError> {
        tokio::time::sleep(self.delay).await;
        let text: String = url::form_urlencoded::byte_serialize(request.title.as_bytes()).collect();
        Ok(CoverResponse {
            cover_url: format!("https://via.placeholder.com/400x600/6366f1/white?text={text}"),
            design_description: format!(
                "Demo {} cover with {} color scheme",
                request.design_style.as_deref().unwrap_or("modern"),
                request.color_scheme.as_deref().unwrap_or("blue"),
            ),
            color_palette: vec![
                "#6366f1".to_string(),
                "#8b5cf6".to_string(),
                "#06b6d4".to_string(),
            ],
        })
    }

    async fn generate_pdf(&self, request: &PdfRequest) -> Result<PdfResponse, ApiError> {
        tokio::time::sleep(self.delay).await;
        // Rough word estimate from raw content length, 300 words per page.
        let total_words: usize = request
            .chapters
            .iter()
            .map(|c| c.content.chars().count() / 5)
            .sum();
        let total_pages = (total_words as f64 / 300.0).ceil() as u32;
        Ok(PdfResponse {
            pdf_url: "https://example.com/demo/book.pdf".to_string(),
            total_pages,
            word_count: total_words as u32,
            file_size_mb: 2.5,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toc_response_parsing_canonical_fields() {
        let json = r#"{
            "toc": [
                {
                    "section_name": "Getting Started",
                    "section_ideas": ["First steps", "Setup"],
                    "estimated_pages": "8-12"
                }
            ],
            "total_estimated_pages": 120,
            "book_summary": "A summary."
        }"#;
        let resp: TocResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.toc.len(), 1);
        assert_eq!(resp.toc[0].section_name.as_deref(), Some("Getting Started"));
        assert!(matches!(
            resp.toc[0].estimated_pages,
            Some(EstimatedPages::Text(_))
        ));
    }

    #[test]
    fn test_toc_response_parsing_variant_fields() {
        // Some backends use title/topics and numeric page estimates.
        let json = r#"{
            "toc": [
                { "title": "Alt Shape", "topics": ["a", "b"], "estimated_pages": 12 }
            ]
        }"#;
        let resp: TocResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.toc[0].title.as_deref(), Some("Alt Shape"));
        assert_eq!(resp.toc[0].topics.as_ref().unwrap().len(), 2);
        assert!(matches!(
            resp.toc[0].estimated_pages,
            Some(EstimatedPages::Number(n)) if n == 12.0
        ));
    }

    #[test]
    fn test_content_response_parsing_minimal() {
        let json = r#"{ "content": "Chapter text." }"#;
        let resp: ContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.content, "Chapter text.");
        assert!(resp.chapter_title.is_none());
        assert!(resp.word_count.is_none());
    }

    #[test]
    fn test_content_response_missing_content_is_error() {
        let json = r#"{ "chapter_title": "No body" }"#;
        assert!(serde_json::from_str::<ContentResponse>(json).is_err());
    }

    #[test]
    fn test_http_client_requires_token() {
        let err = HttpGenerationClient::new("https://api.example.com/v1", "").unwrap_err();
        assert!(matches!(err, ApiError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_demo_toc_is_deterministic() {
        let client = DemoGenerationClient::new(Duration::ZERO);
        let request = TocRequest {
            title: "T".to_string(),
            author: "A".to_string(),
            book_idea: "gardening".to_string(),
        };
        let a = client.generate_toc(&request).await.unwrap();
        let b = client.generate_toc(&request).await.unwrap();
        assert_eq!(a.toc.len(), 6);
        assert_eq!(
            a.toc[0].section_ideas.as_ref().unwrap()[0],
            "Overview of gardening"
        );
        assert_eq!(
            serde_json::to_string(&a.toc).unwrap(),
            serde_json::to_string(&b.toc).unwrap()
        );
    }

    #[tokio::test]
    async fn test_demo_content_uses_requested_section() {
        let client = DemoGenerationClient::new(Duration::ZERO);
        let toc = TocRequest {
            title: "T".to_string(),
            author: "A".to_string(),
            book_idea: "gardening".to_string(),
        };
        let sections = client.generate_toc(&toc).await.unwrap();
        let entries: Vec<TocEntry> = sections
            .toc
            .iter()
            .map(|s| TocEntry {
                section_name: s.section_name.clone().unwrap(),
                section_ideas: s.section_ideas.clone().unwrap(),
                estimated_pages: "10".to_string(),
            })
            .collect();
        let resp = client
            .generate_content(&ContentRequest {
                title: "T".to_string(),
                author: "A".to_string(),
                book_idea: "gardening".to_string(),
                toc: entries,
                chapter_number: 2,
                content_depth: "polished".to_string(),
                generation_mode: "selective".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            resp.chapter_title.as_deref(),
            Some("Core Concepts and Fundamentals")
        );
        assert!(resp.content.contains("Essential principles and theories"));
    }

    #[tokio::test]
    async fn test_demo_cover_url_encodes_title() {
        let client = DemoGenerationClient::new(Duration::ZERO);
        let resp = client
            .generate_cover(&CoverRequest {
                title: "My Book!".to_string(),
                author: "A".to_string(),
                book_description: "D".to_string(),
                style_prompt: None,
                color_scheme: None,
                design_style: None,
            })
            .await
            .unwrap();
        assert!(resp.cover_url.ends_with("text=My+Book%21"));
    }
}
