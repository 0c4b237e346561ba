use anyhow::Result;
use idea2book::book::{BookMetadata, BookRequest, GeneratedChapter, OutcomeKind, ProjectStatus};
use idea2book::client::create_client;
use idea2book::config::Config;
use idea2book::fallback::CannedFallback;
use idea2book::service::BookService;
use idea2book::store::{MemoryProjectStore, ProjectStore, RestProjectStore};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, Text};
use log::info;
use std::fs;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Load Config
    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            let create = Confirm::new("Create a default config.yml?")
                .with_default(true)
                .prompt()?;
            if !create {
                eprintln!("Please ensure 'config.yml' exists with valid API settings.");
                return Err(e);
            }
            let cfg = Config::default();
            cfg.save()?;
            println!("Wrote config.yml with demo defaults. Edit it to use a real backend.");
            cfg
        }
    };

    config.ensure_directories()?;

    let output_folder = config.output_folder.clone();
    let parallel = config.generation.parallel;
    let has_store = config.store.is_some();

    // 2. Initialize client and store
    let client = create_client(&config)?;
    let store: Box<dyn ProjectStore> = match &config.store {
        Some(store_config) => Box::new(RestProjectStore::new(
            &store_config.table_url,
            &store_config.api_key,
        )?),
        None => Box::new(MemoryProjectStore::new()),
    };

    let service = BookService::new(config, client, Box::new(CannedFallback), store);

    let check = service.check_configuration();
    if !check.configured {
        eprintln!(
            "{}",
            check.error.unwrap_or_else(|| "Not configured.".to_string())
        );
        anyhow::bail!("generation backend not configured");
    }

    // 3. Describe the book
    let title = Text::new("Book title:").prompt()?;
    let author = Text::new("Author name:").prompt()?;
    let book_idea = Text::new("What is the book about?").prompt()?;
    let topic = Text::new("Topic keyword:")
        .with_default(&book_idea)
        .prompt()?;

    let request = BookRequest {
        title: title.clone(),
        author: author.clone(),
        book_idea,
        topic: topic.clone(),
        writing_style: None,
        target_audience: None,
    };

    // 4. Outline
    println!("Generating outline...");
    let outline = service.generate_outline(&request).await;
    println!(
        "\n{} ({} chapters, ~{} words)",
        outline.book.title,
        outline.chapters.len(),
        outline.book.target_length
    );
    for (i, chapter) in outline.chapters.iter().enumerate() {
        println!("  {}. {} ({} words)", i + 1, chapter.title, chapter.target_words);
    }

    let metadata = BookMetadata {
        title,
        author,
        topic,
        outline: outline.clone(),
    };

    let project_id = if has_store {
        let id = service
            .save_project(&metadata, ProjectStatus::OutlineComplete)
            .await?;
        info!("Saved project {}", id);
        Some(id)
    } else {
        None
    };

    let proceed = Confirm::new(&format!(
        "Generate all {} chapters?",
        outline.chapters.len()
    ))
    .with_default(true)
    .prompt()?;
    if !proceed {
        println!("Stopped after outline.");
        return Ok(());
    }

    if let Some(id) = &project_id {
        service
            .update_project_status(id, ProjectStatus::Generating)
            .await?;
    }

    // 5. Chapters
    let pb = ProgressBar::new(outline.chapters.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let on_progress = |_index: usize, _chapter: &GeneratedChapter| pb.inc(1);
    let (chapters, outcomes) = if parallel {
        service
            .generate_chapters_parallel(&outline, &metadata, &[], on_progress)
            .await
    } else {
        service
            .generate_chapters(&outline, &metadata, &[], on_progress)
            .await
    };
    pb.finish_with_message("chapters done");

    let fallbacks = outcomes
        .iter()
        .filter(|o| o.kind == OutcomeKind::Fallback)
        .count();
    if fallbacks > 0 {
        println!(
            "{} chapter(s) used placeholder content after generation failures.",
            fallbacks
        );
    }

    if let Some(id) = &project_id {
        service
            .update_project_status(id, ProjectStatus::Complete)
            .await?;
    }

    // 6. Package
    let archive = service.create_quarto_project(&outline, &metadata, &chapters)?;
    let filename = service.download_filename(&metadata);
    let path = Path::new(&output_folder).join(&filename);
    fs::write(&path, archive)?;

    let stats = service.project_stats(&outline, &chapters);
    println!("\nWrote {}", path.display());
    println!(
        "{}/{} chapters, {} words (avg {} per chapter)",
        stats.completed_chapters,
        stats.total_chapters,
        stats.actual_words,
        stats.average_words_per_chapter
    );

    Ok(())
}
