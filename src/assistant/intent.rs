//! Intent classification for chat messages
//!
//! The rule table is plain data: an ordered list of intents, each with an
//! ordered list of patterns. The first rule with a matching pattern wins,
//! even when a later rule would match more specifically.

use regex::Regex;
use std::sync::OnceLock;

/// A classified user-message category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Greet,
    About,
    FindFile,
    ListDependencies,
    ExplainCode,
    GetMetadata,
    Help,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greet => "greet",
            Intent::About => "about",
            Intent::FindFile => "find_file",
            Intent::ListDependencies => "list_dependencies",
            Intent::ExplainCode => "explain_code",
            Intent::GetMetadata => "get_metadata",
            Intent::Help => "help",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of the rule table
#[derive(Debug)]
pub struct IntentRule {
    pub intent: Intent,
    pub patterns: Vec<Regex>,
}

/// Result of a successful classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMatch {
    pub intent: Intent,
    /// Index of the matching pattern within its rule
    pub pattern: usize,
    /// First capture group, when the pattern has one and it participated
    pub argument: Option<String>,
}

/// Ordered, first-match-wins rule table
pub struct IntentMatcher {
    rules: Vec<IntentRule>,
}

impl IntentMatcher {
    pub fn new() -> Self {
        let rules = vec![
            IntentRule {
                intent: Intent::Greet,
                patterns: vec![pattern(r"(?i)^\s*(?:hi|hello)\s*$")],
            },
            IntentRule {
                intent: Intent::About,
                patterns: vec![pattern(r"(?i)^\s*(?:what is this|about|describe|purpose)")],
            },
            IntentRule {
                intent: Intent::FindFile,
                patterns: vec![pattern(
                    r"(?i)\b(?:find|show me|where is|open|get)\s+(?:the\s+)?`?([\w./-]+)`?",
                )],
            },
            IntentRule {
                intent: Intent::ListDependencies,
                patterns: vec![pattern(r"(?i)\b(?:dependencies|packages|libraries|libs)\b")],
            },
            IntentRule {
                intent: Intent::ExplainCode,
                patterns: vec![pattern(
                    r"(?i)\b(?:what does|explain|how does)\s+(?:the\s+)?`?([A-Za-z_$][\w$]*)`?\s*(?:function|method|do)\b",
                )],
            },
            IntentRule {
                intent: Intent::GetMetadata,
                patterns: vec![pattern(r"(?i)\b(?:owner|author|stars|forks|license)\b")],
            },
            IntentRule {
                intent: Intent::Help,
                patterns: vec![
                    pattern(r"(?i)^\s*help\s*$"),
                    pattern(r"(?i)what can you do"),
                ],
            },
        ];
        Self { rules }
    }

    /// Process-wide matcher; the table never changes after construction.
    pub fn shared() -> &'static IntentMatcher {
        static MATCHER: OnceLock<IntentMatcher> = OnceLock::new();
        MATCHER.get_or_init(IntentMatcher::new)
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Find the first rule whose pattern matches `message`.
    pub fn classify(&self, message: &str) -> Option<IntentMatch> {
        for rule in &self.rules {
            for (index, re) in rule.patterns.iter().enumerate() {
                if let Some(captures) = re.captures(message) {
                    return Some(IntentMatch {
                        intent: rule.intent,
                        pattern: index,
                        argument: captures.get(1).map(|m| m.as_str().to_string()),
                    });
                }
            }
        }
        None
    }
}

impl Default for IntentMatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("built-in intent pattern must compile")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent_of(message: &str) -> Option<Intent> {
        IntentMatcher::shared().classify(message).map(|m| m.intent)
    }

    fn argument_of(message: &str) -> Option<String> {
        IntentMatcher::shared()
            .classify(message)
            .and_then(|m| m.argument)
    }

    #[test]
    fn test_table_order_is_declared_order() {
        let order: Vec<Intent> = IntentMatcher::shared()
            .rules()
            .iter()
            .map(|r| r.intent)
            .collect();
        assert_eq!(
            order,
            vec![
                Intent::Greet,
                Intent::About,
                Intent::FindFile,
                Intent::ListDependencies,
                Intent::ExplainCode,
                Intent::GetMetadata,
                Intent::Help,
            ]
        );
    }

    #[test]
    fn test_greet_is_exact() {
        assert_eq!(intent_of("hi"), Some(Intent::Greet));
        assert_eq!(intent_of("HELLO"), Some(Intent::Greet));
        assert_eq!(intent_of("hello there"), None);
    }

    #[test]
    fn test_about_is_prefix() {
        assert_eq!(intent_of("What is this repo?"), Some(Intent::About));
        assert_eq!(intent_of("describe it"), Some(Intent::About));
        assert_eq!(intent_of("purpose?"), Some(Intent::About));
        assert_eq!(intent_of("tell me what is this"), None);
    }

    #[test]
    fn test_find_file_captures_token() {
        assert_eq!(argument_of("find package.json").as_deref(), Some("package.json"));
        assert_eq!(argument_of("show me the src/app.js").as_deref(), Some("src/app.js"));
        assert_eq!(argument_of("Where is `README.md`?").as_deref(), Some("README.md"));
        assert_eq!(intent_of("open index.html"), Some(Intent::FindFile));
    }

    #[test]
    fn test_list_dependencies_keywords() {
        assert_eq!(intent_of("what are the dependencies?"), Some(Intent::ListDependencies));
        assert_eq!(intent_of("which libs"), Some(Intent::ListDependencies));
    }

    #[test]
    fn test_explain_code_captures_identifier() {
        assert_eq!(intent_of("explain the `foo` function"), Some(Intent::ExplainCode));
        assert_eq!(argument_of("explain the `foo` function").as_deref(), Some("foo"));
        assert_eq!(argument_of("what does parseArgs do").as_deref(), Some("parseArgs"));
        assert_eq!(argument_of("how does $init function work").as_deref(), Some("$init"));
        assert_eq!(argument_of("explain the render method").as_deref(), Some("render"));
    }

    #[test]
    fn test_explain_code_requires_trailing_keyword() {
        // without function/method/do these fall through to later rules
        assert_eq!(intent_of("what does the license say?"), Some(Intent::GetMetadata));
        assert_eq!(intent_of("explain the owner"), Some(Intent::GetMetadata));
        assert_eq!(intent_of("how does it work?"), None);
        assert_eq!(intent_of("what does foo doing"), None);
    }

    #[test]
    fn test_get_metadata_keywords() {
        assert_eq!(intent_of("how many stars?"), Some(Intent::GetMetadata));
        assert_eq!(intent_of("who is the owner"), Some(Intent::GetMetadata));
    }

    #[test]
    fn test_help_variants() {
        assert_eq!(intent_of("help"), Some(Intent::Help));
        assert_eq!(intent_of("What can you do?"), Some(Intent::Help));
        assert_eq!(
            IntentMatcher::shared().classify("what can you do").map(|m| m.pattern),
            Some(1)
        );
    }

    #[test]
    fn test_earlier_rule_shadows_later_rule() {
        // both `about` and `get_metadata` patterns match
        assert_eq!(intent_of("about the license"), Some(Intent::About));
        // both `find_file` and `list_dependencies` patterns match
        assert_eq!(intent_of("find the dependencies"), Some(Intent::FindFile));
        // `get` is a find_file verb, so this never reaches explain_code
        assert_eq!(intent_of("what does get do"), Some(Intent::FindFile));
    }

    #[test]
    fn test_unmatched_messages() {
        for message in ["", "   ", "thanks!", "what time is it", "forgotten"] {
            assert_eq!(intent_of(message), None, "{:?}", message);
        }
    }
}
