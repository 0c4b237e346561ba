use std::collections::HashMap;

/// Value bound to a `{placeholder}`. Lists are rendered joined with ", ".
#[derive(Debug, Clone)]
pub enum PromptValue {
    Text(String),
    List(Vec<String>),
}

impl PromptValue {
    fn render(&self) -> String {
        match self {
            PromptValue::Text(s) => s.clone(),
            PromptValue::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for PromptValue {
    fn from(s: &str) -> Self {
        PromptValue::Text(s.to_string())
    }
}

impl From<String> for PromptValue {
    fn from(s: String) -> Self {
        PromptValue::Text(s)
    }
}

impl From<Vec<String>> for PromptValue {
    fn from(items: Vec<String>) -> Self {
        PromptValue::List(items)
    }
}

impl From<u32> for PromptValue {
    fn from(n: u32) -> Self {
        PromptValue::Text(n.to_string())
    }
}

pub type PromptVars = HashMap<String, PromptValue>;

/// Substitute `{key}` placeholders in a single left-to-right pass.
///
/// The template is scanned once; substituted values are emitted verbatim and
/// never rescanned, so a value that itself contains `{otherKey}` cannot
/// trigger a second substitution. Placeholders with no binding are left as-is
/// (the templates contain literal JSON braces that must survive).
pub fn process_prompt(template: &str, vars: &PromptVars) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        // A placeholder key is a run of identifier characters up to '}'.
        let key_end = after.find(|c: char| !c.is_ascii_alphanumeric() && c != '_');
        match key_end {
            Some(end) if after[end..].starts_with('}') && end > 0 => {
                let key = &after[..end];
                match vars.get(key) {
                    Some(value) => out.push_str(&value.render()),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                // Not a placeholder: literal brace.
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Defaults callers merge in explicitly. Never applied automatically.
pub fn default_prompt_vars() -> PromptVars {
    let mut vars = PromptVars::new();
    vars.insert("writingStyle".to_string(), "clear and engaging".into());
    vars.insert("targetAudience".to_string(), "general readers".into());
    vars.insert("estimatedPages".to_string(), 15u32.into());
    vars.insert("targetWords".to_string(), 4000u32.into());
    vars
}

pub const OUTLINE_PROMPT: &str = r#"You are an expert book outline generator. Generate a detailed chapter outline for a book on the following topic:

**Topic:** {topic}
**Writing Style:** {writingStyle}
**Target Audience:** {targetAudience}

Please create an outline with 8-12 chapters that:
1. Starts with an engaging introduction
2. Builds knowledge progressively
3. Includes practical applications where relevant
4. Ends with a compelling conclusion

For each chapter, provide:
- A clear, engaging chapter title
- A 2-3 sentence description of what the chapter covers
- Estimated word count (aim for 3000-5000 words per chapter)
- Key points or subtopics to cover

Format your response as a JSON structure that matches this template:

{
  "book": {
    "title": "{title}",
    "description": "{topic}",
    "target_length": 50000
  },
  "chapters": [
    {
      "id": "intro",
      "title": "Your Chapter Title Here",
      "description": "Brief description of what this chapter covers and why it's important.",
      "target_words": 3500,
      "status": "pending",
      "key_points": [
        "First key point to cover",
        "Second key point to cover",
        "Third key point to cover"
      ],
      "prompt_context": {
        "focus": "Key themes or focus areas for this chapter",
        "tone": "{writingStyle}"
      }
    }
  ]
}

Continue this pattern for all chapters. Make sure:
- Chapter IDs are unique and follow the pattern: intro, chapter-02, chapter-03, etc.
- Total word count across all chapters is around 40,000-60,000 words
- Each chapter builds on previous ones logically
- The outline is comprehensive yet focused on the core topic

Generate only the JSON content, no additional commentary."#;

pub const CHAPTER_PROMPT: &str = r#"Write Chapter {chapterNumber}: "{chapterTitle}" for the book "{title}" by {author}.

Chapter Summary: {chapterSummary}
Key Points to Cover: {keyPoints}

Context:
- Previous chapters: {previousChapters}
- Book theme: {bookTheme}
- Target audience: {targetAudience}
- Writing style: {writingStyle}

Write a complete, engaging chapter of approximately {estimatedPages} pages (roughly {targetWords} words). The chapter should:

1. **Start with a compelling hook** that draws readers in
2. **Build on previous chapters** while introducing new concepts
3. **Cover all key points** in a logical, flowing manner
4. **Include practical examples** and real-world applications where relevant
5. **End with a smooth transition** to the next chapter or conclusion

Format the chapter in Markdown with:
- Clear section headings (##, ###)
- Well-structured paragraphs
- Bullet points or numbered lists where appropriate
- Emphasis (*italic* or **bold**) for important concepts
- Code blocks or quotes where relevant

The chapter should be engaging, informative, and maintain the {writingStyle} style throughout. Write for {targetAudience}, ensuring concepts are accessible yet thorough.

Generate only the chapter content in Markdown format, no additional commentary."#;

pub const INTRODUCTION_PROMPT: &str = r#"Write an engaging introduction chapter for the book "{title}" by {author}.

Book Description: {topic}
Writing Style: {writingStyle}
Target Audience: {targetAudience}

This introduction should:

1. **Hook the reader** with a compelling opening that demonstrates why this topic matters
2. **Establish credibility** and explain why you're qualified to write about this topic
3. **Preview the journey** - what readers will learn and accomplish by the end
4. **Set expectations** for the book's approach and style
5. **Create excitement** for the chapters ahead

The introduction should be approximately 2000-3000 words and include:
- A powerful opening story, statistic, or question
- Clear explanation of what the book covers
- Who this book is for (and who it's not for)
- How to get the most out of the book
- What readers will be able to do after reading

Format in Markdown with clear sections and engaging, accessible language that matches the {writingStyle} style.

Generate only the introduction content in Markdown format, no additional commentary."#;

pub const CONCLUSION_PROMPT: &str = r#"Write a compelling conclusion chapter for the book "{title}" by {author}.

Book Description: {topic}
Key Chapters Covered: {previousChapters}
Writing Style: {writingStyle}
Target Audience: {targetAudience}

This conclusion should:

1. **Summarize key insights** from throughout the book
2. **Reinforce the main message** and why it matters
3. **Provide actionable next steps** for readers
4. **Inspire action** and continued learning
5. **End on a high note** that leaves readers motivated

The conclusion should be approximately 2000-3000 words and include:
- Brief recap of the journey through the book
- The most important takeaways
- Practical next steps readers can take immediately
- Resources for continued learning
- A memorable final thought or call to action

Format in Markdown with clear sections and inspiring, motivational language that matches the {writingStyle} style.

Generate only the conclusion content in Markdown format, no additional commentary."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_substitution() {
        let mut vars = PromptVars::new();
        vars.insert("name".to_string(), "World".into());
        assert_eq!(process_prompt("Hello {name}", &vars), "Hello World");
    }

    #[test]
    fn test_list_values_joined_with_comma() {
        let mut vars = PromptVars::new();
        vars.insert(
            "keyPoints".to_string(),
            vec!["one".to_string(), "two".to_string()].into(),
        );
        assert_eq!(process_prompt("Cover: {keyPoints}", &vars), "Cover: one, two");
    }

    #[test]
    fn test_substituted_values_are_never_rescanned() {
        // A value containing placeholder-shaped text must be emitted verbatim.
        let mut vars = PromptVars::new();
        vars.insert("a".to_string(), "{b}".into());
        vars.insert("b".to_string(), "X".into());
        assert_eq!(process_prompt("{a}{b}", &vars), "{b}X");
    }

    #[test]
    fn test_unknown_placeholders_left_verbatim() {
        let vars = PromptVars::new();
        assert_eq!(process_prompt("keep {this} intact", &vars), "keep {this} intact");
    }

    #[test]
    fn test_literal_json_braces_survive() {
        let mut vars = PromptVars::new();
        vars.insert("title".to_string(), "My Book".into());
        let out = process_prompt(r#"{ "book": { "title": "{title}" } }"#, &vars);
        assert_eq!(out, r#"{ "book": { "title": "My Book" } }"#);
    }

    #[test]
    fn test_empty_value_becomes_empty_string() {
        let mut vars = PromptVars::new();
        vars.insert("author".to_string(), "".into());
        assert_eq!(process_prompt("by {author}.", &vars), "by .");
    }

    #[test]
    fn test_outline_prompt_renders_with_defaults() {
        let mut vars = default_prompt_vars();
        vars.insert("topic".to_string(), "beekeeping".into());
        vars.insert("title".to_string(), "The Hive".into());
        let out = process_prompt(OUTLINE_PROMPT, &vars);
        assert!(out.contains("**Topic:** beekeeping"));
        assert!(out.contains("**Writing Style:** clear and engaging"));
        assert!(out.contains(r#""title": "The Hive""#));
        // Template's example JSON keeps its structural braces.
        assert!(out.contains(r#""id": "intro""#));
    }
}
