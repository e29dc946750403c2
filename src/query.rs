//! Rule-based question answering over a fixed table of canned answers.
//!
//! A question is lowercased and tested against an ordered rule table. Each
//! rule is a conjunction of keywords; the first rule whose keywords all occur
//! in the question wins, with no scoring. The table always ends with a
//! catch-all rule, so [`QueryMatcher::answer`] is total: every input,
//! including the empty string, maps to exactly one answer.
//!
//! Order is part of the behaviour. "f1 score" is checked before the
//! confusion-matrix metrics, so "precision, recall and f1 score of this
//! confusion matrix" gets the F1 answer even though rule 3 also matches.

use serde::Serialize;

/// Identifier of the catch-all rule.
pub const DEFAULT_RULE_ID: &str = "default";

pub const F1_SCORE_ANSWER: &str = "The F1 score is a common metric derived from a confusion matrix, especially for binary classification. It is the harmonic mean of precision and recall. Precision is TP / (TP + FP), and recall is TP / (TP + FN). A potential issue would be an F1 score calculated incorrectly from the TP, FP, and FN values (if they were present).";

pub const ACCURACY_ANSWER: &str = "Accuracy, in the context of a confusion matrix, is typically calculated as (TP + TN) / (TP + TN + FP + FN) for binary classification. An incorrect accuracy would arise from using the wrong formula or incorrect values from the matrix.";

pub const PRECISION_ANSWER: &str = "Precision (also called positive predictive value) is calculated as TP / (TP + FP). It indicates how many of the positively predicted cases were actually positive. An incorrect precision would result from using the wrong TP or FP values.";

pub const RECALL_ANSWER: &str = "Recall (also called sensitivity or true positive rate) is calculated as TP / (TP + FN). It indicates how many of the actual positive cases were correctly identified. An incorrect recall would result from using the wrong TP or FN values.";

pub const FORMULA_SYNTAX_ANSWER: &str = "A formula with incorrect syntax might have unbalanced parentheses, missing operators between variables or numbers, or misuse of mathematical symbols.";

pub const UNDEFINED_VARIABLE_ANSWER: &str = "A formula using an undefined variable (a variable not introduced or explained within the context) would be considered potentially incorrect or incomplete.";

pub const DEFAULT_ANSWER: &str = "Based on general knowledge, I don't see an immediately obvious issue related to your query.";

/// When a rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "keywords")]
pub enum Predicate {
    /// Every keyword occurs as a substring of the lowercased query.
    AllOf(Vec<String>),
    /// Matches any query.
    Always,
}

impl Predicate {
    /// Build a keyword conjunction. Keywords are lowercased once here.
    pub fn all_of<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Predicate::AllOf(
            keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        )
    }

    /// Test against an already-lowercased query.
    pub fn matches(&self, normalized: &str) -> bool {
        match self {
            Predicate::AllOf(keywords) => keywords.iter().all(|k| normalized.contains(k.as_str())),
            Predicate::Always => true,
        }
    }
}

/// A predicate paired with the answer returned when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRule {
    pub id: String,
    pub predicate: Predicate,
    pub answer: String,
}

impl QueryRule {
    pub fn new(id: impl Into<String>, predicate: Predicate, answer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            predicate,
            answer: answer.into(),
        }
    }

    /// Shorthand for a keyword-conjunction rule.
    pub fn keywords<I, S>(id: impl Into<String>, keywords: I, answer: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(id, Predicate::all_of(keywords), answer)
    }
}

/// The answer selected for one question, echoing the question for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub query: String,
    pub answer: String,
    /// `id` of the rule that fired.
    pub rule: String,
    /// Position of that rule in the table (the catch-all is last).
    pub rule_index: usize,
}

impl QueryResult {
    pub fn is_default(&self) -> bool {
        self.rule == DEFAULT_RULE_ID
    }
}

/// The built-in rule table, in evaluation order, without the catch-all.
pub fn builtin_rules() -> Vec<QueryRule> {
    vec![
        QueryRule::keywords("f1_score", ["f1 score"], F1_SCORE_ANSWER),
        QueryRule::keywords("accuracy", ["accuracy", "confusion matrix"], ACCURACY_ANSWER),
        QueryRule::keywords("precision", ["precision", "confusion matrix"], PRECISION_ANSWER),
        QueryRule::keywords("recall", ["recall", "confusion matrix"], RECALL_ANSWER),
        QueryRule::keywords("formula_syntax", ["formula", "syntax"], FORMULA_SYNTAX_ANSWER),
        QueryRule::keywords(
            "undefined_variable",
            ["variable", "defined", "formula"],
            UNDEFINED_VARIABLE_ANSWER,
        ),
    ]
}

/// First-match-wins evaluator over an ordered rule table.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    /// Invariant: non-empty, last rule is `Predicate::Always`.
    rules: Vec<QueryRule>,
}

impl Default for QueryMatcher {
    fn default() -> Self {
        Self::new(builtin_rules(), DEFAULT_ANSWER)
    }
}

impl QueryMatcher {
    /// Build a matcher from ordered rules; a catch-all returning
    /// `default_answer` is appended.
    pub fn new(rules: Vec<QueryRule>, default_answer: impl Into<String>) -> Self {
        let mut rules = rules;
        rules.push(QueryRule::new(
            DEFAULT_RULE_ID,
            Predicate::Always,
            default_answer,
        ));
        Self { rules }
    }

    /// Insert `rule` after all existing rules but before the catch-all.
    pub fn with_rule(mut self, rule: QueryRule) -> Self {
        let at = self.rules.len() - 1;
        self.rules.insert(at, rule);
        self
    }

    /// The full table, catch-all included.
    pub fn rules(&self) -> &[QueryRule] {
        &self.rules
    }

    /// Answer a free-text question. Never fails.
    pub fn answer(&self, query: &str) -> QueryResult {
        let normalized = query.to_lowercase();
        let (rule_index, rule) = self
            .rules
            .iter()
            .enumerate()
            .find(|(_, r)| r.predicate.matches(&normalized))
            .unwrap_or_else(|| {
                let last = self.rules.len() - 1;
                (last, &self.rules[last])
            });

        QueryResult {
            query: query.to_string(),
            answer: rule.answer.clone(),
            rule: rule.id.clone(),
            rule_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(q: &str) -> QueryResult {
        QueryMatcher::default().answer(q)
    }

    #[test]
    fn each_rule_reachable() {
        let cases = [
            ("what is the f1 score?", F1_SCORE_ANSWER),
            ("What is accuracy in a confusion matrix?", ACCURACY_ANSWER),
            ("precision of this confusion matrix", PRECISION_ANSWER),
            ("recall from the confusion matrix", RECALL_ANSWER),
            ("is the formula syntax ok", FORMULA_SYNTAX_ANSWER),
            ("is every variable defined in the formula", UNDEFINED_VARIABLE_ANSWER),
            ("what colour is the sky", DEFAULT_ANSWER),
        ];
        for (q, expected) in cases {
            assert_eq!(answer(q).answer, expected, "query {q:?}");
        }
    }

    #[test]
    fn blank_queries_get_default() {
        for q in ["", "   ", "\n\t"] {
            let r = answer(q);
            assert!(r.is_default(), "{q:?} matched {}", r.rule);
            assert_eq!(r.answer, DEFAULT_ANSWER);
        }
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(answer("F1 SCORE").answer, answer("f1 score").answer);
        assert_eq!(
            answer("ACCURACY of the CONFUSION MATRIX").answer,
            ACCURACY_ANSWER
        );
    }

    #[test]
    fn earliest_matching_rule_wins() {
        // Matches f1, accuracy, precision and recall; f1 is first.
        let r = answer("accuracy, precision, recall and f1 score of a confusion matrix");
        assert_eq!(r.rule, "f1_score");
        assert_eq!(r.rule_index, 0);

        // Matches precision and recall; precision is first.
        let r = answer("recall vs precision in a confusion matrix");
        assert_eq!(r.rule, "precision");

        // Matches both formula rules; syntax is first.
        let r = answer("is the formula syntax wrong or is a variable not defined");
        assert_eq!(r.rule, "formula_syntax");
    }

    #[test]
    fn partial_conjunction_falls_through() {
        // "accuracy" without "confusion matrix" is not rule 2.
        assert!(answer("what is accuracy").is_default());
        // "f1" alone is not "f1 score".
        assert!(answer("f1 of the model").is_default());
    }

    #[test]
    fn result_echoes_original_query() {
        let r = answer("  What is the F1 Score?  ");
        assert_eq!(r.query, "  What is the F1 Score?  ");
    }

    #[test]
    fn answers_come_from_the_table() {
        let matcher = QueryMatcher::default();
        let canned: Vec<&str> = matcher.rules().iter().map(|r| r.answer.as_str()).collect();
        assert_eq!(canned.len(), 7);
        for q in ["", "f1 score", "syntax", "confusion matrix recall", "???", "ünïcödé"] {
            assert!(canned.contains(&matcher.answer(q).answer.as_str()));
        }
    }

    #[test]
    fn table_ends_with_catch_all() {
        let matcher = QueryMatcher::default();
        let last = matcher.rules().last().unwrap();
        assert_eq!(last.predicate, Predicate::Always);
        assert_eq!(last.id, DEFAULT_RULE_ID);
    }

    #[test]
    fn custom_rule_inserted_before_catch_all() {
        let matcher = QueryMatcher::default().with_rule(QueryRule::keywords(
            "specificity",
            ["Specificity"],
            "TN / (TN + FP)",
        ));
        assert_eq!(matcher.rules().len(), 8);
        assert_eq!(matcher.answer("what about specificity").answer, "TN / (TN + FP)");
        // Earlier rules still win.
        assert_eq!(matcher.answer("specificity and f1 score").rule, "f1_score");
        assert!(matcher.answer("nothing relevant").is_default());
    }

    #[test]
    fn empty_table_is_still_total() {
        let matcher = QueryMatcher::new(Vec::new(), "nothing to say");
        let r = matcher.answer("anything");
        assert_eq!(r.answer, "nothing to say");
        assert_eq!(r.rule_index, 0);
    }
}
