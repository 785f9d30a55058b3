// ABOUTME: Fixed lexical surface: keywords, special symbols, the variadic marker

/// Reserved names. None of these are ever bindable, rebindable or
/// deletable (spec §4.3, §6 "Keywords"; mirrors `spsp.keywords.Keyword`).
pub const KEYWORDS: &[&str] = &[
    "None",
    "True",
    "False",
    "const",
    "let",
    "rebind",
    "if",
    "import-module",
    "del",
    "lambda",
    "macro",
    "do",
    "expr!",
    "eval!",
    "inline!",
    "inline-value!",
    "symbolic!",
    "&",
    "raise",
    "run-catching",
    "make-lazy",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Two-character sequence separating an identifier's head from its
/// attribute path.
pub const QUALIFIER_SEPARATOR: &str = "::";

pub const COLON: char = ':';

/// Identifier that marks the variadic tail of a structural binding target.
pub const VARIADIC_MARKER: &str = "&";

pub const TRUE_LITERAL: &str = "True";
pub const FALSE_LITERAL: &str = "False";
pub const NONE_LITERAL: &str = "None";

pub const LEFT_PAREN: char = '(';
pub const RIGHT_PAREN: char = ')';
pub const LEFT_BRACKET: char = '[';
pub const RIGHT_BRACKET: char = ']';
pub const DOUBLE_QUOTE: char = '"';
pub const SINGLE_QUOTE: char = '\'';
pub const SEMICOLON: char = ';';
pub const COMMA: char = ',';
pub const BACKSLASH: char = '\\';
pub const NEWLINE: char = '\n';

/// Whitespace class per spec §4.1: host whitespace plus comma and backslash.
pub fn is_whitespace(c: char) -> bool {
    c.is_whitespace() || c == COMMA || c == BACKSLASH
}

/// Characters that terminate a maximal symbol run.
pub fn can_appear_in_symbol(c: char) -> bool {
    !is_whitespace(c)
        && c != LEFT_PAREN
        && c != RIGHT_PAREN
        && c != LEFT_BRACKET
        && c != RIGHT_BRACKET
        && c != DOUBLE_QUOTE
        && c != SINGLE_QUOTE
        && c != SEMICOLON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_contains_variadic_marker() {
        assert!(is_keyword("&"));
        assert!(is_keyword("lambda"));
        assert!(!is_keyword("foo"));
    }

    #[test]
    fn whitespace_class_includes_comma_and_backslash() {
        assert!(is_whitespace(' '));
        assert!(is_whitespace(','));
        assert!(is_whitespace('\\'));
        assert!(!is_whitespace('a'));
    }
}
