//! Static domain facts shown alongside every upload.
//!
//! Two reports exist, one for confusion matrices and one for formulas. They
//! take no input and never change, so they are plain functions over
//! `'static` string tables.

use serde::Serialize;
use std::fmt;

const CONFUSION_MATRIX_TITLE: &str = "General Knowledge on Confusion Matrices:";

const CONFUSION_MATRIX_FACTS: &[&str] = &[
    "A confusion matrix typically has dimensions corresponding to the number of classes.",
    "For binary: TP, FP, FN, TN represent counts of true/false positives/negatives.",
    "Axes represent predicted vs. actual classes.",
    "Issues: Missing cells, inconsistent labels, negative values.",
];

const FORMULA_TITLE: &str = "General Knowledge on Formulas:";

const FORMULA_FACTS: &[&str] = &[
    "Formulas show relationships between variables using math symbols.",
    "Elements: variables, constants, operators, functions.",
    "Issues: Syntax errors, undefined variables, nonsensical operations.",
];

/// A titled, ordered list of fact statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeReport {
    pub title: &'static str,
    pub facts: &'static [&'static str],
}

impl KnowledgeReport {
    /// Render as Markdown: a bold title line followed by one bullet per fact.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KnowledgeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "**{}**", self.title)?;
        for fact in self.facts {
            write!(f, "\n- {fact}")?;
        }
        Ok(())
    }
}

/// Facts about confusion-matrix shape, cell meaning, axes and common defects.
pub fn confusion_matrix_facts() -> KnowledgeReport {
    KnowledgeReport {
        title: CONFUSION_MATRIX_TITLE,
        facts: CONFUSION_MATRIX_FACTS,
    }
}

/// Facts about formula vocabulary and common syntax defects.
pub fn formula_facts() -> KnowledgeReport {
    KnowledgeReport {
        title: FORMULA_TITLE,
        facts: FORMULA_FACTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_are_deterministic() {
        assert_eq!(confusion_matrix_facts(), confusion_matrix_facts());
        assert_eq!(formula_facts(), formula_facts());
        assert_eq!(
            confusion_matrix_facts().render(),
            confusion_matrix_facts().render()
        );
    }

    #[test]
    fn confusion_matrix_report_covers_cells_and_axes() {
        let text = confusion_matrix_facts().render();
        assert!(text.starts_with("**General Knowledge on Confusion Matrices:**"));
        for needle in ["TP, FP, FN, TN", "predicted vs. actual", "negative values"] {
            assert!(text.contains(needle), "missing {needle:?} in {text}");
        }
        assert_eq!(text.lines().count(), 1 + CONFUSION_MATRIX_FACTS.len());
    }

    #[test]
    fn formula_report_renders_bullets() {
        let text = formula_facts().render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "**General Knowledge on Formulas:**");
        assert!(lines[1..].iter().all(|l| l.starts_with("- ")));
        assert!(text.contains("undefined variables"));
    }
}
