//! Text heuristics: which units are worth translating, and how backend
//! output is tidied before it reaches the markup.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Key/value fragments typical of JSON.
static JSON_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""[^"]+"\s*:\s*"[^"]*""#,
        r#""[^"]+"\s*:\s*\{"#,
        r#""[^"]+"\s*:\s*\["#,
        r#"\{\s*"[^"]+"\s*:"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Source-code fragments across common languages. Two or more matches mark a unit as code.
static CODE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Python
        r"\bdef\s+\w+\s*\(",
        r"\bclass\s+\w+\s*[(:]",
        r"\bimport\s+\w+",
        r"\bfrom\s+\w+\s+import",
        r"\bprint\s*\(",
        r"\b__\w+__\b",
        r"\bself\.\w+",
        // JavaScript / TypeScript
        r"\bfunction\s+\w+\s*\(",
        r"\bvar\s+\w+\s*=",
        r"\blet\s+\w+\s*=",
        r"\bconst\s+\w+\s*=",
        r"\bconsole\.\w+\s*\(",
        r"=>\s*\{",
        r"\$\{\w+\}",
        // Java / C# / C++
        r"\bpublic\s+\w+",
        r"\bprivate\s+\w+",
        r"\bprotected\s+\w+",
        r"\bstatic\s+\w+",
        r"\bvoid\s+\w+\s*\(",
        r"\bint\s+\w+\s*[=;]",
        r"\bString\s+\w+\s*[=;]",
        r"System\.out\.print",
        // Control flow
        r"\bif\s*\([^)]+\)\s*\{",
        r"\bfor\s*\([^)]+\)\s*\{",
        r"\bwhile\s*\([^)]+\)\s*\{",
        r"\btry\s*\{",
        r"\bcatch\s*\([^)]+\)\s*\{",
        r"\breturn\s+[^;]+;",
        r"\w+\s*=\s*new\s+\w+\s*\(",
        // Calls, indexing, comments
        r"\w+\.\w+\s*\(",
        r"\w+\[\w*\]\s*=",
        r"(?m)//.*$",
        r"/\*.*?\*/",
        r"(?m)#.*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// A leading "Translation to French:" style label.
static TRANSLATION_LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^translation to \w+:\s*").unwrap());

/// Characters counted towards the symbol density check.
const SPECIAL_CHARS: &str = "{}[]()\":,;=<>+-*/%&|!^~";

/// Decides which units are sent to the backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFilter;

impl TextFilter {
    /// Create a new filter.
    pub fn new() -> Self {
        Self
    }

    /// Whether `text` should be left as is.
    pub fn should_skip(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return true;
        }

        if text.starts_with("```") || text.ends_with("```") {
            return true;
        }

        if (text.starts_with('{') && text.ends_with('}')) || (text.starts_with('[') && text.ends_with(']')) {
            return true;
        }

        if JSON_PATTERNS.iter().any(|re| re.is_match(text)) {
            return true;
        }

        let code_matches = CODE_PATTERNS.iter().filter(|re| re.is_match(text)).count();
        if code_matches >= 2 {
            return true;
        }

        let total = text.chars().count();
        let special = text.chars().filter(|c| SPECIAL_CHARS.contains(*c)).count();
        if total > 10 && special * 4 > total {
            return true;
        }

        total <= 2 && !text.chars().any(char::is_alphabetic)
    }
}

/// Tidy one translated segment.
///
/// Trims, removes quotes wrapping the whole text, drops a leading
/// "Translation to X:" label and normalizes to NFC. Returns `None` when
/// nothing is left.
pub fn clean_translation(raw: &str) -> Option<String> {
    let mut cleaned = raw.trim();

    for quote in ['"', '\'', '“'] {
        let closing = if quote == '“' { '”' } else { quote };
        if cleaned.chars().count() >= 2 && cleaned.starts_with(quote) && cleaned.ends_with(closing) {
            cleaned = cleaned[quote.len_utf8()..cleaned.len() - closing.len_utf8()].trim();
            break;
        }
    }

    let cleaned = TRANSLATION_LABEL_REGEX.replace(cleaned, "");
    let cleaned: String = cleaned.trim().nfc().collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
