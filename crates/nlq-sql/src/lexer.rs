//! Pest-based SQL tokenizer

use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "sql.pest"]
struct SqlLexer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Word,
    QuotedIdent,
    Str,
    Number,
    Placeholder,
    Semicolon,
    Comment,
    Punct,
    /// Opening quote with no closing partner
    Unterminated,
    /// Character outside the accepted alphabet
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    /// Word or quoted identifier
    pub fn is_name(&self) -> bool {
        matches!(self.kind, TokenKind::Word | TokenKind::QuotedIdent)
    }

    /// Identifier text with quotes removed, lowercased for catalog lookup
    pub fn name(&self) -> String {
        match self.kind {
            TokenKind::QuotedIdent => self.text[1..self.text.len() - 1]
                .replace("\"\"", "\"")
                .to_ascii_lowercase(),
            _ => self.text.to_ascii_lowercase(),
        }
    }

    /// Case-insensitive keyword test. Quoted identifiers are never keywords.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(word)
    }

    pub fn is_punct(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == punct
    }
}

#[derive(Debug, thiserror::Error)]
#[error("SQL tokenizer failed: {0}")]
pub(crate) struct LexError(String);

/// Split SQL text into tokens. Whitespace is dropped; comments and string
/// literals are single opaque tokens.
pub(crate) fn lex(sql: &str) -> Result<Vec<Token<'_>>, LexError> {
    let pairs =
        SqlLexer::parse(Rule::tokens, sql).map_err(|e| LexError(e.to_string()))?;

    let mut tokens = Vec::new();
    for pair in pairs.flatten() {
        let kind = match pair.as_rule() {
            Rule::word => TokenKind::Word,
            Rule::quoted_ident => TokenKind::QuotedIdent,
            Rule::string => TokenKind::Str,
            Rule::number => TokenKind::Number,
            Rule::placeholder => TokenKind::Placeholder,
            Rule::semicolon => TokenKind::Semicolon,
            Rule::line_comment | Rule::block_comment => TokenKind::Comment,
            Rule::punct => TokenKind::Punct,
            Rule::unterminated => TokenKind::Unterminated,
            Rule::unknown => TokenKind::Unknown,
            _ => continue,
        };
        tokens.push(Token {
            kind,
            text: pair.as_str(),
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        lex(sql).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_simple_select() {
        let tokens = lex("SELECT o.order_id, COUNT(*) FROM orders o WHERE x = ?").unwrap();
        let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(
            texts,
            vec![
                "SELECT", "o", ".", "order_id", ",", "COUNT", "(", "*", ")", "FROM", "orders",
                "o", "WHERE", "x", "=", "?"
            ]
        );
        assert_eq!(tokens[15].kind, TokenKind::Placeholder);
    }

    #[test]
    fn test_strings_and_comments_are_opaque() {
        assert_eq!(
            kinds("SELECT 'a; DROP -- x' -- trailing"),
            vec![TokenKind::Word, TokenKind::Str, TokenKind::Comment]
        );
        assert_eq!(
            kinds("SELECT /* hidden; */ 1"),
            vec![TokenKind::Word, TokenKind::Comment, TokenKind::Number]
        );
        assert_eq!(
            kinds("SELECT 'it''s'"),
            vec![TokenKind::Word, TokenKind::Str]
        );
    }

    #[test]
    fn test_semicolon_and_unterminated() {
        assert_eq!(
            kinds("SELECT 1; DROP"),
            vec![
                TokenKind::Word,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Word
            ]
        );
        assert!(kinds("SELECT 'oops").contains(&TokenKind::Unterminated));
        assert!(kinds("SELECT $$x$$").contains(&TokenKind::Unknown));
    }

    #[test]
    fn test_quoted_identifier_name() {
        let tokens = lex(r#"SELECT "Order_Id" FROM "orders""#).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::QuotedIdent);
        assert_eq!(tokens[1].name(), "order_id");
        assert!(!tokens[1].is_word("order_id"));
        assert!(tokens[2].is_word("from"));
    }
}
