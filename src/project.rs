//! Renders a normalized outline (plus any generated chapters) into the fixed
//! set of Quarto project files. Pure string templating; archiving happens in
//! [`crate::archive`].

use crate::book::{BookMetadata, BookOutline, Chapter, GeneratedChapter};
use crate::normalize::slugify;
use chrono::{Datelike, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub name: String,
    pub contents: String,
}

/// Produce the full project file set. Chapters with generated content use it;
/// the rest get a placeholder scaffold. Chapter files are numbered in outline
/// order as `chapters/NN-slug.qmd`.
pub fn generate_project(
    outline: &BookOutline,
    metadata: &BookMetadata,
    generated: &[GeneratedChapter],
) -> Vec<ProjectFile> {
    let date = Utc::now().format("%Y-%m-%d").to_string();
    let year = Utc::now().year();

    // Generated content is merged by 1-based chapter number.
    let by_number: HashMap<u32, &GeneratedChapter> =
        generated.iter().map(|c| (c.chapter_number, c)).collect();

    let mut files = vec![
        ProjectFile {
            name: "_quarto.yml".to_string(),
            contents: quarto_config(outline, metadata, &date, year),
        },
        ProjectFile {
            name: "index.qmd".to_string(),
            contents: index_file(outline, metadata),
        },
        ProjectFile {
            name: "preface.qmd".to_string(),
            contents: preface_file(metadata, year),
        },
        ProjectFile {
            name: "conclusion.qmd".to_string(),
            contents: conclusion_file(outline, metadata),
        },
        ProjectFile {
            name: "references.qmd".to_string(),
            contents: references_file(),
        },
        ProjectFile {
            name: "references.bib".to_string(),
            contents: bibliography_file(),
        },
        ProjectFile {
            name: "styles.css".to_string(),
            contents: styles_file(),
        },
        ProjectFile {
            name: "README.md".to_string(),
            contents: readme_file(outline, metadata),
        },
        ProjectFile {
            name: ".gitignore".to_string(),
            contents: gitignore_file(),
        },
    ];

    for (index, chapter) in outline.chapters.iter().enumerate() {
        let number = index as u32 + 1;
        let content = by_number.get(&number).map(|g| g.content.as_str());
        files.push(ProjectFile {
            name: format!("chapters/{}", chapter_filename(chapter, index)),
            contents: chapter_file(chapter, content),
        });
    }

    files
}

pub fn chapter_filename(chapter: &Chapter, index: usize) -> String {
    let slug = if chapter.slug.is_empty() {
        slugify(&chapter.title)
    } else {
        chapter.slug.clone()
    };
    format!("{:02}-{}.qmd", index + 1, slug)
}

/// Download filename for the archive: slug plus date.
pub fn create_project_filename(metadata: &BookMetadata) -> String {
    format!(
        "{}-{}.zip",
        slugify(&metadata.title),
        Utc::now().format("%Y-%m-%d")
    )
}

fn quarto_config(outline: &BookOutline, metadata: &BookMetadata, date: &str, year: i32) -> String {
    let chapter_entries: String = outline
        .chapters
        .iter()
        .enumerate()
        .map(|(index, chapter)| format!("    - chapters/{}\n", chapter_filename(chapter, index)))
        .collect();

    format!(
        "project:\n  type: book\n  title: \"{title}\"\n\n\
         book:\n  title: \"{title}\"\n  author: \"{author}\"\n  date: \"{date}\"\n  search: true\n  downloads: [pdf, epub]\n  chapters:\n    - index.qmd\n    - preface.qmd\n{chapter_entries}    - conclusion.qmd\n    - references.qmd\n\n\
         bibliography: references.bib\nnocite: '@*'\n\n\
         format:\n  html:\n    theme: cosmo\n    toc: true\n    toc-depth: 3\n    number-sections: true\n    page-footer: \"(c) {year} {author}\"\n    css: styles.css\n  pdf:\n    papersize: \"Letter\"\n    mainfont: \"Georgia\"\n    sansfont: \"Arial\"\n    toc: true\n    toc-depth: 2\n    documentclass: scrbook\n    geometry:\n      - margin=1in\n      - paperwidth=6in\n      - paperheight=9in\n    standalone: true\n    keep-tex: false\n    number-sections: true\n    colorlinks: true\n  epub:\n    toc: true\n    toc-depth: 2\n    number-sections: true\n",
        title = metadata.title,
        author = metadata.author,
    )
}

fn index_file(outline: &BookOutline, metadata: &BookMetadata) -> String {
    let chapter_list: String = outline
        .chapters
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. **{}** - {}\n", i + 1, c.title, c.description))
        .collect();

    format!(
        "---\ntitle: \"{title}\"\nauthor: \"{author}\"\n---\n\n# {title}\n\nby **{author}**\n\n\
         ## About This Book\n\n{description}\n\n\
         This book consists of {count} chapters covering:\n\n{chapter_list}\n\
         ## How to Use This Book\n\nThis book is designed to be read sequentially, with each chapter \
         building upon the previous ones. However, you can also jump to specific chapters that \
         interest you most.\n\n\
         ## Target Audience\n\nThis book is written for readers who want to understand {topic} in \
         depth, regardless of their background level.\n\n---\n\n\
         *Total estimated length: ~{length}k words*\n",
        title = metadata.title,
        author = metadata.author,
        description = outline.book.description,
        count = outline.chapters.len(),
        topic = metadata.topic,
        length = (outline.book.target_length as f64 / 1000.0).round() as u32,
    )
}

fn preface_file(metadata: &BookMetadata, year: i32) -> String {
    format!(
        "---\ntitle: \"Preface\"\n---\n\n# Preface\n\n\
         Welcome to *{title}*. This book represents a comprehensive exploration of {topic}, \
         designed to provide you with both theoretical understanding and practical insights.\n\n\
         ## What You'll Learn\n\nBy the end of this book, you will:\n\n\
         - Have a solid foundation in the core concepts of {topic}\n\
         - Understand how to apply these concepts in real-world situations\n\
         - Be equipped with the knowledge to continue learning and growing in this field\n\
         - Have practical tools and frameworks you can use immediately\n\n\
         ## How This Book Is Organized\n\nThis book is structured to take you on a journey from \
         foundational concepts to advanced applications. Each chapter builds upon the previous \
         ones, creating a comprehensive learning experience.\n\n\
         ## A Note to Readers\n\nThis book is designed to be practical and actionable. Don't just \
         read it - engage with it. Take notes, try the exercises, and most importantly, apply what \
         you learn.\n\n---\n\n*{author}*\n*{year}*\n",
        title = metadata.title,
        topic = metadata.topic,
        author = metadata.author,
    )
}

fn chapter_file(chapter: &Chapter, generated_content: Option<&str>) -> String {
    let body = match generated_content.or(chapter.content.as_deref()) {
        Some(content) => content.to_string(),
        None => placeholder_content(chapter),
    };
    format!(
        "---\ntitle: \"{title}\"\n---\n\n# {title}\n\n{body}\n",
        title = chapter.title,
    )
}

fn placeholder_content(chapter: &Chapter) -> String {
    let points: String = chapter
        .key_points
        .iter()
        .map(|p| format!("- {p}\n"))
        .collect();
    format!(
        "## Overview\n\n{description}\n\n## Key Topics\n\nThis chapter will cover:\n\n{points}\n\
         ## Chapter Content\n\n*This chapter content will be generated based on the outline and key \
         topics above.*\n\n---\n\n*Target length: ~{words} words*\n",
        description = chapter.description,
        words = chapter.target_words,
    )
}

fn conclusion_file(outline: &BookOutline, metadata: &BookMetadata) -> String {
    let covered: String = outline
        .chapters
        .iter()
        .enumerate()
        .map(|(i, c)| format!("- **Chapter {}**: {}\n", i + 1, c.title))
        .collect();

    format!(
        "---\ntitle: \"Conclusion\"\n---\n\n# Conclusion\n\n\
         As we reach the end of *{title}*, let's reflect on the journey we've taken together \
         through the world of {topic}.\n\n\
         ## What We've Covered\n\nThroughout this book, we've explored:\n\n{covered}\n\
         ## Next Steps\n\nYour learning journey doesn't end here. Consider these next steps:\n\n\
         - **Practice**: Apply what you've learned in your own projects\n\
         - **Stay Updated**: Keep up with the latest developments in {topic}\n\
         - **Connect**: Join communities of practitioners and learners\n\
         - **Teach**: Share your knowledge with others\n\n\
         ## Final Thoughts\n\nThank you for taking this journey. I hope this book serves as a \
         valuable resource that you'll return to again and again.\n",
        title = metadata.title,
        topic = metadata.topic,
    )
}

fn references_file() -> String {
    "---\ntitle: \"References\"\n---\n\n# References\n\n::: {#refs}\n:::\n\n\
     ## Additional Resources\n\n### Books\n\n- [Recommended books will be listed here]\n\n\
     ### Articles and Papers\n\n- [Relevant academic papers and articles]\n\n\
     ### Websites and Online Resources\n\n- [Useful websites and online tools]\n"
        .to_string()
}

fn bibliography_file() -> String {
    "@book{sample2024,\n  title={Sample Reference},\n  author={Sample Author},\n  year={2024},\n  publisher={Sample Publisher}\n}\n\n\
     @article{example2024,\n  title={Example Article},\n  author={Example Author},\n  journal={Example Journal},\n  year={2024},\n  volume={1},\n  pages={1--10}\n}\n"
        .to_string()
}

fn styles_file() -> String {
    "/* Custom styles for the book */\n\n\
     body {\n  font-family: Georgia, serif;\n  line-height: 1.6;\n}\n\n\
     h1, h2, h3, h4, h5, h6 {\n  font-family: Arial, sans-serif;\n  font-weight: 600;\n}\n\n\
     blockquote {\n  border-left: 4px solid #6c757d;\n  padding-left: 1rem;\n  margin-left: 0;\n  font-style: italic;\n  color: #6c757d;\n}\n\n\
     code {\n  background-color: #f8f9fa;\n  padding: 0.2rem 0.4rem;\n  border-radius: 0.25rem;\n  font-size: 0.9em;\n}\n"
        .to_string()
}

fn readme_file(outline: &BookOutline, metadata: &BookMetadata) -> String {
    let status: String = outline
        .chapters
        .iter()
        .enumerate()
        .map(|(i, c)| format!("- [ ] Chapter {}: {}\n", i + 1, c.title))
        .collect();

    format!(
        "# {title}\n\nby **{author}**\n\n## About\n\n{topic}\n\n\
         ## Building This Book\n\nThis book is built using [Quarto](https://quarto.org/). \
         To render the book:\n\n```bash\n# Render to HTML\nquarto render --to html\n\n\
         # Render to PDF\nquarto render --to pdf\n\n# Render to EPUB\nquarto render --to epub\n```\n\n\
         ## Chapter Status\n\n{status}\n\
         ## Output\n\nThe rendered book will be available in the `_book/` directory after running \
         `quarto render`.\n",
        title = metadata.title,
        author = metadata.author,
        topic = metadata.topic,
    )
}

fn gitignore_file() -> String {
    "# Quarto output\n_book/\n_site/\n.quarto/\n\n# LaTeX\n*.aux\n*.log\n*.synctex.gz\n*.toc\n*.out\n\n\
     # Editor files\n.vscode/\n.idea/\n*.swp\n\n# macOS\n.DS_Store\n"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::BookRequest;
    use crate::fallback::{CannedFallback, FallbackProvider};

    fn fixture() -> (BookOutline, BookMetadata) {
        let outline = CannedFallback.fallback_outline(&BookRequest {
            title: "Urban Beekeeping".to_string(),
            author: "A. Author".to_string(),
            book_idea: "keeping bees on city rooftops".to_string(),
            topic: "beekeeping".to_string(),
            writing_style: None,
            target_audience: None,
        });
        let metadata = BookMetadata {
            title: "Urban Beekeeping".to_string(),
            author: "A. Author".to_string(),
            topic: "beekeeping".to_string(),
            outline: outline.clone(),
        };
        (outline, metadata)
    }

    #[test]
    fn test_project_contains_fixed_files_and_chapters() {
        let (outline, metadata) = fixture();
        let files = generate_project(&outline, &metadata, &[]);
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();

        for expected in [
            "_quarto.yml",
            "index.qmd",
            "preface.qmd",
            "conclusion.qmd",
            "references.qmd",
            "references.bib",
            "styles.css",
            "README.md",
            ".gitignore",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        assert!(names.contains(&"chapters/01-introduction.qmd"));
        assert!(names.contains(&"chapters/02-core-concepts.qmd"));
        assert!(names.contains(&"chapters/06-conclusion.qmd"));
        assert_eq!(files.len(), 9 + outline.chapters.len());
    }

    #[test]
    fn test_quarto_config_lists_chapters_in_order() {
        let (outline, metadata) = fixture();
        let files = generate_project(&outline, &metadata, &[]);
        let config = &files.iter().find(|f| f.name == "_quarto.yml").unwrap().contents;
        let first = config.find("chapters/01-introduction.qmd").unwrap();
        let second = config.find("chapters/02-core-concepts.qmd").unwrap();
        assert!(first < second);
        assert!(config.contains("- index.qmd"));
        assert!(config.contains("- references.qmd"));
    }

    #[test]
    fn test_generated_content_is_merged_by_chapter_number() {
        let (outline, metadata) = fixture();
        let chapter_request = crate::book::ChapterRequest {
            chapter_number: 2,
            chapter_title: outline.chapters[1].title.clone(),
            chapter_summary: outline.chapters[1].description.clone(),
            key_points: outline.chapters[1].key_points.clone(),
            book_title: metadata.title.clone(),
            author: metadata.author.clone(),
            previous_chapters: vec![],
            book_theme: metadata.topic.clone(),
            target_audience: "general readers".to_string(),
            writing_style: "clear and engaging".to_string(),
            target_words: 4000,
        };
        let generated = CannedFallback.fallback_chapter(&chapter_request, &outline);
        let files = generate_project(&outline, &metadata, &[generated.clone()]);

        let ch2 = &files
            .iter()
            .find(|f| f.name == "chapters/02-core-concepts.qmd")
            .unwrap()
            .contents;
        assert!(ch2.contains(&generated.content));

        // Chapters without content keep the placeholder scaffold.
        let ch3 = &files
            .iter()
            .find(|f| f.name == "chapters/03-practical-applications.qmd")
            .unwrap()
            .contents;
        assert!(ch3.contains("*This chapter content will be generated"));
    }

    #[test]
    fn test_project_filename_uses_slug() {
        let (_, metadata) = fixture();
        let name = create_project_filename(&metadata);
        assert!(name.starts_with("urban-beekeeping-"));
        assert!(name.ends_with(".zip"));
    }
}
