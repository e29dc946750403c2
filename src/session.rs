//! One user's interaction: knowledge reports, the current upload, questions.
//!
//! A [`Session`] ties the two halves of the crate together. Each upload
//! replaces the previous [`Ingestion`] outright; nothing is cached between
//! uploads. Questions are answered from the rule table alone, so
//! [`Session::ask`] works before any upload, after a failed one, and after
//! a successful one alike. The extracted text rides along only as context
//! for display.

use crate::analyze;
use crate::config::AnalyzerConfig;
use crate::knowledge::{self, KnowledgeReport};
use crate::output::Ingestion;
use crate::pipeline::input::Upload;
use crate::query::{QueryMatcher, QueryResult};
use serde::Serialize;
use std::fmt;

/// Shown in place of the extracted text when there is none.
pub const NO_TEXT_PLACEHOLDER: &str = "No text extracted from the image.";

/// A question, its answer, and the extracted text shown beside it.
#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
    pub result: QueryResult,
    pub context_text: String,
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "**Your Query:** {}", self.result.query)?;
        writeln!(f, "**Knowledge-Based Answer:** {}", self.result.answer)?;
        writeln!(f)?;
        writeln!(f, "Extracted Text (for your context):")?;
        write!(f, "{}", self.context_text)
    }
}

#[derive(Debug)]
pub struct Session {
    config: AnalyzerConfig,
    matcher: QueryMatcher,
    confusion_matrix: KnowledgeReport,
    formulas: KnowledgeReport,
    ingestion: Option<Ingestion>,
}

impl Session {
    /// A session with the built-in rule table.
    pub fn new(config: AnalyzerConfig) -> Self {
        Self::with_matcher(config, QueryMatcher::default())
    }

    pub fn with_matcher(config: AnalyzerConfig, matcher: QueryMatcher) -> Self {
        Self {
            config,
            matcher,
            confusion_matrix: knowledge::confusion_matrix_facts(),
            formulas: knowledge::formula_facts(),
            ingestion: None,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn confusion_matrix_report(&self) -> &KnowledgeReport {
        &self.confusion_matrix
    }

    pub fn formula_report(&self) -> &KnowledgeReport {
        &self.formulas
    }

    /// The latest upload, if any.
    pub fn ingestion(&self) -> Option<&Ingestion> {
        self.ingestion.as_ref()
    }

    /// Upload a path or URL, replacing the current document.
    pub async fn upload(&mut self, input: &str, declared_mime: Option<&str>) -> &Ingestion {
        let ingestion = analyze::ingest(input, declared_mime, &self.config).await;
        self.ingestion.insert(ingestion)
    }

    /// Upload in-memory bytes, replacing the current document.
    pub async fn upload_bytes(&mut self, upload: Upload) -> &Ingestion {
        let ingestion = analyze::ingest_upload(upload, &self.config).await;
        self.ingestion.insert(ingestion)
    }

    /// Install an ingestion produced elsewhere (e.g. by [`analyze::ingest_blocking`]).
    pub fn set_ingestion(&mut self, ingestion: Ingestion) {
        self.ingestion = Some(ingestion);
    }

    /// Extracted text of the current upload, or the placeholder.
    pub fn context_text(&self) -> &str {
        match self.ingestion {
            Some(ref ing) if !ing.text.is_empty() => &ing.text,
            _ => NO_TEXT_PLACEHOLDER,
        }
    }

    /// Answer a question. Never fails.
    pub fn ask(&self, query: &str) -> Interaction {
        Interaction {
            result: self.matcher.answer(query),
            context_text: self.context_text().to_string(),
        }
    }

    /// Serialisable snapshot for JSON output.
    pub fn report(&self, interactions: Vec<Interaction>) -> SessionReport<'_> {
        SessionReport {
            confusion_matrix_knowledge: &self.confusion_matrix,
            formula_knowledge: &self.formulas,
            ingestion: self.ingestion.as_ref(),
            interactions,
        }
    }
}

/// Everything a session showed the user, for `--json`.
#[derive(Debug, Serialize)]
pub struct SessionReport<'a> {
    pub confusion_matrix_knowledge: &'a KnowledgeReport,
    pub formula_knowledge: &'a KnowledgeReport,
    pub ingestion: Option<&'a Ingestion>,
    pub interactions: Vec<Interaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FigqaError;
    use crate::query::{ACCURACY_ANSWER, DEFAULT_ANSWER};

    fn ingestion_with_text(text: &str) -> Ingestion {
        let mut ing = Ingestion::failed("cm.png", "image/png", FigqaError::NoPagesFound);
        ing.error = None;
        ing.text = text.to_string();
        ing
    }

    #[test]
    fn ask_before_upload_uses_placeholder() {
        let session = Session::new(AnalyzerConfig::default());
        let i = session.ask("");
        assert_eq!(i.result.answer, DEFAULT_ANSWER);
        assert_eq!(i.context_text, NO_TEXT_PLACEHOLDER);
    }

    #[test]
    fn ask_shows_extracted_text_verbatim() {
        let mut session = Session::new(AnalyzerConfig::default());
        session.set_ingestion(ingestion_with_text("  Accuracy = TP+TN \n"));
        let i = session.ask("What is accuracy in a confusion matrix?");
        assert_eq!(i.result.answer, ACCURACY_ANSWER);
        assert_eq!(i.context_text, "  Accuracy = TP+TN \n");
    }

    #[test]
    fn failed_upload_does_not_block_questions() {
        let mut session = Session::new(AnalyzerConfig::default());
        session.set_ingestion(Ingestion::failed(
            "x.txt",
            "text/plain",
            FigqaError::UnsupportedType {
                mime: "text/plain".into(),
            },
        ));
        let i = session.ask("f1 score?");
        assert_eq!(i.result.rule, "f1_score");
        assert_eq!(i.context_text, NO_TEXT_PLACEHOLDER);
    }

    #[test]
    fn new_upload_replaces_old_text() {
        let mut session = Session::new(AnalyzerConfig::default());
        session.set_ingestion(ingestion_with_text("first"));
        session.set_ingestion(ingestion_with_text("second"));
        assert_eq!(session.context_text(), "second");
    }

    #[test]
    fn knowledge_reports_always_present() {
        let a = Session::new(AnalyzerConfig::default());
        let b = Session::new(AnalyzerConfig::default());
        assert_eq!(a.confusion_matrix_report(), b.confusion_matrix_report());
        assert_eq!(a.formula_report(), b.formula_report());
    }

    #[test]
    fn interaction_display_matches_layout() {
        let session = Session::new(AnalyzerConfig::default());
        let text = session.ask("what?").to_string();
        assert!(text.starts_with("**Your Query:** what?\n"));
        assert!(text.contains("**Knowledge-Based Answer:** Based on general knowledge"));
        assert!(text.ends_with(NO_TEXT_PLACEHOLDER));
    }

    #[test]
    fn report_serialises() {
        let session = Session::new(AnalyzerConfig::default());
        let interactions = vec![session.ask("f1 score")];
        let json = serde_json::to_value(session.report(interactions)).unwrap();
        assert!(json["ingestion"].is_null());
        assert_eq!(json["interactions"][0]["result"]["rule"], "f1_score");
        assert_eq!(
            json["confusion_matrix_knowledge"]["title"],
            "General Knowledge on Confusion Matrices:"
        );
    }
}
