//! crates/study_guide_core/src/markdown.rs
//!
//! Renders study content as downloadable Markdown.
//!
//! The per-item bodies are shared between the single-section exports and the
//! full study guide, so the two always number and label items identically.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Flashcard, KeyConcept, QuizItem, QuizKind, ShareData, SharePayload, ShareView, StudyContent,
};

/// Which part of a study guide to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportSection {
    Summary,
    Concepts,
    Flashcards,
    Quiz,
    All,
}

impl ExportSection {
    /// The suffix used in the exported file name.
    pub fn file_suffix(self) -> &'static str {
        match self {
            ExportSection::Summary => "summary",
            ExportSection::Concepts => "concepts",
            ExportSection::Flashcards => "flashcards",
            ExportSection::Quiz => "quiz",
            ExportSection::All => "study_guide",
        }
    }
}

impl From<ShareView> for ExportSection {
    fn from(view: ShareView) -> Self {
        match view {
            ShareView::Summary => ExportSection::Summary,
            ShareView::Concepts => ExportSection::Concepts,
            ShareView::Flashcards => ExportSection::Flashcards,
            ShareView::Quiz => ExportSection::Quiz,
        }
    }
}

/// A rendered Markdown file, ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownDocument {
    pub file_name: String,
    pub body: String,
}

pub fn export(content: &StudyContent, source_name: &str, section: ExportSection) -> MarkdownDocument {
    let body = match section {
        ExportSection::Summary => summary_markdown(&content.summary, source_name),
        ExportSection::Concepts => concepts_markdown(&content.key_concepts, source_name),
        ExportSection::Flashcards => flashcards_markdown(&content.flashcards, source_name),
        ExportSection::Quiz => quiz_markdown(&content.quiz, source_name),
        ExportSection::All => study_guide_markdown(content, source_name),
    };
    MarkdownDocument {
        file_name: file_name(source_name, section),
        body,
    }
}

/// Renders the slice carried by a share link.
pub fn export_share(payload: &SharePayload) -> MarkdownDocument {
    let source_name = payload.source_name.as_str();
    let body = match &payload.data {
        ShareData::Summary(summary) => summary_markdown(summary, source_name),
        ShareData::Concepts(concepts) => concepts_markdown(concepts, source_name),
        ShareData::Flashcards(cards) => flashcards_markdown(cards, source_name),
        ShareData::Quiz(items) => quiz_markdown(items, source_name),
    };
    MarkdownDocument {
        file_name: file_name(source_name, payload.view().into()),
        body,
    }
}

pub fn summary_markdown(summary: &str, source_name: &str) -> String {
    format!("# Summary for {source_name}\n\n{summary}")
}

pub fn concepts_markdown(concepts: &[KeyConcept], source_name: &str) -> String {
    format!("# Key Concepts for {source_name}\n\n{}", concept_bodies(concepts))
}

pub fn flashcards_markdown(cards: &[Flashcard], source_name: &str) -> String {
    format!("# Flashcards for {source_name}\n\n---\n\n{}", flashcard_bodies(cards))
}

pub fn quiz_markdown(items: &[QuizItem], source_name: &str) -> String {
    format!("# Quiz for {source_name}\n\n{}", quiz_bodies(items))
}

pub fn study_guide_markdown(content: &StudyContent, source_name: &str) -> String {
    let mut out = format!("# Study Guide for {source_name}\n\n");
    out.push_str(&format!("## Summary\n\n{}\n\n", content.summary));
    out.push_str("## Key Concepts\n\n");
    out.push_str(&concept_bodies(&content.key_concepts));
    out.push_str("## Flashcards\n\n---\n\n");
    out.push_str(&flashcard_bodies(&content.flashcards));
    out.push_str("## Quiz\n\n");
    out.push_str(&quiz_bodies(&content.quiz));
    out
}

fn concept_bodies(concepts: &[KeyConcept]) -> String {
    let mut out = String::new();
    for concept in concepts {
        out.push_str(&format!("### {}\n{}\n\n", concept.concept, concept.explanation));
    }
    out
}

fn flashcard_bodies(cards: &[Flashcard]) -> String {
    let mut out = String::new();
    for (index, card) in cards.iter().enumerate() {
        let n = index + 1;
        out.push_str(&format!(
            "**Term {n}:** {}\n\n**Definition {n}:** {}\n\n---\n\n",
            card.term, card.definition
        ));
    }
    out
}

fn quiz_bodies(items: &[QuizItem]) -> String {
    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        out.push_str(&format!("**Question {}:** {}\n", index + 1, item.question));
        match item.kind {
            QuizKind::MultipleChoice => {
                for option in &item.options {
                    out.push_str(&format!("  - {option}\n"));
                }
            }
            QuizKind::TrueFalse => out.push_str("  - True\n  - False\n"),
        }
        out.push_str(&format!("\n**Answer:** {}\n\n", item.answer));
    }
    out
}

/// `<source name without extension>_<section>.md`.
///
/// The extension is the last `.xxx` suffix that contains no `/`, so URL
/// sources such as `https://site.com/watch?v=x` keep their full text.
pub fn file_name(source_name: &str, section: ExportSection) -> String {
    let stem = match source_name.rfind('.') {
        Some(dot) if dot + 1 < source_name.len() && !source_name[dot + 1..].contains('/') => {
            &source_name[..dot]
        }
        _ => source_name,
    };
    format!("{stem}_{}.md", section.file_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> StudyContent {
        StudyContent {
            summary: "Short summary.".to_string(),
            key_concepts: vec![
                KeyConcept { concept: "Mitosis".into(), explanation: "Cell division".into() },
                KeyConcept { concept: "Meiosis".into(), explanation: "Gamete division".into() },
            ],
            flashcards: vec![
                Flashcard { term: "A".into(), definition: "1".into() },
                Flashcard { term: "B".into(), definition: "2".into() },
            ],
            quiz: vec![
                QuizItem {
                    question: "2+2?".into(),
                    kind: QuizKind::MultipleChoice,
                    options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
                    answer: "4".into(),
                },
                QuizItem {
                    question: "Water is wet.".into(),
                    kind: QuizKind::TrueFalse,
                    options: vec![],
                    answer: "True".into(),
                },
            ],
        }
    }

    #[test]
    fn flashcards_render_numbered_blocks_between_dividers() {
        let doc = export(&content(), "bio.pdf", ExportSection::Flashcards);
        assert_eq!(
            doc.body,
            "# Flashcards for bio.pdf\n\n---\n\n\
             **Term 1:** A\n\n**Definition 1:** 1\n\n---\n\n\
             **Term 2:** B\n\n**Definition 2:** 2\n\n---\n\n"
        );
        assert_eq!(doc.file_name, "bio_flashcards.md");
    }

    #[test]
    fn quiz_lists_options_and_answer() {
        let doc = export(&content(), "bio.pdf", ExportSection::Quiz);
        assert_eq!(
            doc.body,
            "# Quiz for bio.pdf\n\n\
             **Question 1:** 2+2?\n  - 3\n  - 4\n  - 5\n  - 6\n\n**Answer:** 4\n\n\
             **Question 2:** Water is wet.\n  - True\n  - False\n\n**Answer:** True\n\n"
        );
    }

    #[test]
    fn summary_and_concepts_sections() {
        let summary = export(&content(), "bio.pdf", ExportSection::Summary);
        assert_eq!(summary.body, "# Summary for bio.pdf\n\nShort summary.");
        assert_eq!(summary.file_name, "bio_summary.md");

        let concepts = export(&content(), "bio.pdf", ExportSection::Concepts);
        assert_eq!(
            concepts.body,
            "# Key Concepts for bio.pdf\n\n### Mitosis\nCell division\n\n### Meiosis\nGamete division\n\n"
        );
    }

    #[test]
    fn study_guide_reuses_the_section_bodies() {
        let content = content();
        let all = export(&content, "bio.pdf", ExportSection::All);
        assert!(all.body.starts_with("# Study Guide for bio.pdf\n\n## Summary\n\nShort summary.\n\n"));
        assert_eq!(all.file_name, "bio_study_guide.md");

        let cards = flashcards_markdown(&content.flashcards, "bio.pdf");
        let card_bodies = cards.trim_start_matches("# Flashcards for bio.pdf\n\n");
        assert!(all.body.contains(&format!("## Flashcards\n\n{card_bodies}")));

        let quiz = quiz_markdown(&content.quiz, "bio.pdf");
        let quiz_bodies = quiz.trim_start_matches("# Quiz for bio.pdf\n\n");
        assert!(all.body.ends_with(&format!("## Quiz\n\n{quiz_bodies}")));
    }

    #[test]
    fn shared_slices_export_like_their_section() {
        let payload = SharePayload {
            source_name: "bio.pdf".into(),
            data: ShareData::Quiz(content().quiz),
        };
        let doc = export_share(&payload);
        assert_eq!(doc, export(&content(), "bio.pdf", ExportSection::Quiz));
    }

    #[test]
    fn file_names_strip_only_a_real_extension() {
        assert_eq!(file_name("notes.v2.pdf", ExportSection::Quiz), "notes.v2_quiz.md");
        assert_eq!(file_name("README", ExportSection::Summary), "README_summary.md");
        assert_eq!(
            file_name("https://example.com/paper.pdf", ExportSection::All),
            "https://example.com/paper_study_guide.md"
        );
        assert_eq!(
            file_name("https://www.youtube.com/watch?v=abc", ExportSection::Concepts),
            "https://www.youtube.com/watch?v=abc_concepts.md"
        );
    }
}
