//! Lexer producing a small, closed set of token kinds
//!
//! Raw tokenization is delegated to sqlparser; its token stream is folded
//! into the four kinds the lineage parser cares about. Only words that play
//! a role in statement recognition or table-reference scanning become
//! [`Keyword`]s; everything else is an [`Ident`].

use sqlparser::dialect::Dialect;
use sqlparser::tokenizer::{Token as SqlToken, Tokenizer, TokenizerError};

/// A lexical token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Keyword(Keyword),
    Identifier(Ident),
    Punctuation(Punct),
    /// String or numeric literal
    Literal(String),
}

impl Token {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Keyword(k) if *k == keyword)
    }

    pub fn is_punct(&self, punct: &Punct) -> bool {
        matches!(self, Token::Punctuation(p) if p == punct)
    }
}

/// An identifier, possibly quoted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub value: String,
    pub quoted: bool,
}

impl Ident {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    Comma,
    Period,
    /// Any other operator or symbol
    Other(String),
}

/// Keywords relevant to lineage extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Create,
    Or,
    Replace,
    Temp,
    Temporary,
    Materialized,
    View,
    Table,
    If,
    Not,
    Exists,
    As,
    With,
    Recursive,
    Select,
    Values,
    Delete,
    From,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    Natural,
    Lateral,
    Only,
    On,
    Using,
    Where,
    Group,
    Having,
    Qualify,
    Window,
    Order,
    Limit,
    Offset,
    Fetch,
    Union,
    Except,
    Intersect,
    Returning,
}

impl Keyword {
    /// Look up an unquoted word, case-insensitively
    pub fn from_word(word: &str) -> Option<Self> {
        let keyword = match word.to_ascii_uppercase().as_str() {
            "CREATE" => Keyword::Create,
            "OR" => Keyword::Or,
            "REPLACE" => Keyword::Replace,
            "TEMP" => Keyword::Temp,
            "TEMPORARY" => Keyword::Temporary,
            "MATERIALIZED" => Keyword::Materialized,
            "VIEW" => Keyword::View,
            "TABLE" => Keyword::Table,
            "IF" => Keyword::If,
            "NOT" => Keyword::Not,
            "EXISTS" => Keyword::Exists,
            "AS" => Keyword::As,
            "WITH" => Keyword::With,
            "RECURSIVE" => Keyword::Recursive,
            "SELECT" => Keyword::Select,
            "VALUES" => Keyword::Values,
            "DELETE" => Keyword::Delete,
            "FROM" => Keyword::From,
            "JOIN" => Keyword::Join,
            "INNER" => Keyword::Inner,
            "LEFT" => Keyword::Left,
            "RIGHT" => Keyword::Right,
            "FULL" => Keyword::Full,
            "OUTER" => Keyword::Outer,
            "CROSS" => Keyword::Cross,
            "NATURAL" => Keyword::Natural,
            "LATERAL" => Keyword::Lateral,
            "ONLY" => Keyword::Only,
            "ON" => Keyword::On,
            "USING" => Keyword::Using,
            "WHERE" => Keyword::Where,
            "GROUP" => Keyword::Group,
            "HAVING" => Keyword::Having,
            "QUALIFY" => Keyword::Qualify,
            "WINDOW" => Keyword::Window,
            "ORDER" => Keyword::Order,
            "LIMIT" => Keyword::Limit,
            "OFFSET" => Keyword::Offset,
            "FETCH" => Keyword::Fetch,
            "UNION" => Keyword::Union,
            "EXCEPT" => Keyword::Except,
            "INTERSECT" => Keyword::Intersect,
            "RETURNING" => Keyword::Returning,
            _ => return None,
        };
        Some(keyword)
    }
}

/// Tokenize a single statement, dropping whitespace and comments.
///
/// A word next to `.` is always a name part, so `sales.order` or
/// `temp.orders` lex as identifiers even though `ORDER` and `TEMP` are
/// keywords elsewhere.
pub fn tokenize(dialect: &dyn Dialect, sql: &str) -> Result<Vec<Token>, TokenizerError> {
    let raw: Vec<SqlToken> = Tokenizer::new(dialect, sql)
        .tokenize()?
        .into_iter()
        .filter(|t| !matches!(t, SqlToken::EOF | SqlToken::Whitespace(_) | SqlToken::SemiColon))
        .collect();

    let qualified: Vec<bool> = (0..raw.len())
        .map(|i| {
            (i > 0 && matches!(raw[i - 1], SqlToken::Period))
                || matches!(raw.get(i + 1), Some(SqlToken::Period))
        })
        .collect();

    Ok(raw
        .into_iter()
        .zip(qualified)
        .map(|(token, qualified)| convert(token, qualified))
        .collect())
}

fn convert(token: SqlToken, qualified: bool) -> Token {
    match token {
        SqlToken::Word(word) => match word.quote_style {
            None if qualified => Token::Identifier(Ident::new(word.value)),
            None => match Keyword::from_word(&word.value) {
                Some(keyword) => Token::Keyword(keyword),
                None => Token::Identifier(Ident::new(word.value)),
            },
            Some(_) => Token::Identifier(Ident {
                value: word.value,
                quoted: true,
            }),
        },
        SqlToken::Number(n, _) => Token::Literal(n),
        SqlToken::SingleQuotedString(s)
        | SqlToken::DoubleQuotedString(s)
        | SqlToken::NationalStringLiteral(s)
        | SqlToken::EscapedStringLiteral(s)
        | SqlToken::HexStringLiteral(s) => Token::Literal(s),
        SqlToken::DollarQuotedString(s) => Token::Literal(s.value),
        SqlToken::LParen => Token::Punctuation(Punct::LParen),
        SqlToken::RParen => Token::Punctuation(Punct::RParen),
        SqlToken::Comma => Token::Punctuation(Punct::Comma),
        SqlToken::Period => Token::Punctuation(Punct::Period),
        other => Token::Punctuation(Punct::Other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::PostgreSqlDialect;

    fn lex(sql: &str) -> Vec<Token> {
        tokenize(&PostgreSqlDialect {}, sql).unwrap()
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let tokens = lex("create View v aS select 1");
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Create),
                Token::Keyword(Keyword::View),
                Token::Identifier(Ident::new("v")),
                Token::Keyword(Keyword::As),
                Token::Keyword(Keyword::Select),
                Token::Literal("1".to_string()),
            ]
        );
    }

    #[test]
    fn test_quoted_words_are_identifiers() {
        let tokens = lex("SELECT * FROM \"from\"");
        assert_eq!(
            tokens.last(),
            Some(&Token::Identifier(Ident {
                value: "from".to_string(),
                quoted: true
            }))
        );
    }

    #[test]
    fn test_whitespace_and_comments_dropped() {
        let tokens = lex("SELECT a -- trailing\n, b /* block */ FROM t");
        assert_eq!(tokens.len(), 6);
        assert!(tokens[2].is_punct(&Punct::Comma));
        assert!(tokens[4].is_keyword(Keyword::From));
    }

    #[test]
    fn test_non_lineage_words_are_identifiers() {
        let tokens = lex("events orders name");
        assert!(tokens
            .iter()
            .all(|t| matches!(t, Token::Identifier(ident) if !ident.quoted)));
    }

    #[test]
    fn test_unterminated_string_is_error() {
        assert!(tokenize(&PostgreSqlDialect {}, "SELECT 'oops FROM t").is_err());
    }

    #[test]
    fn test_keywords_next_to_period_are_name_parts() {
        assert_eq!(
            lex("FROM sales.Order"),
            vec![
                Token::Keyword(Keyword::From),
                Token::Identifier(Ident::new("sales")),
                Token::Punctuation(Punct::Period),
                Token::Identifier(Ident::new("Order")),
            ]
        );
        assert_eq!(lex("temp.orders")[0], Token::Identifier(Ident::new("temp")));
        assert_eq!(lex("CREATE TEMP VIEW v")[1], Token::Keyword(Keyword::Temp));
    }

    #[test]
    fn test_operators_are_punctuation() {
        let tokens = lex("a.b = c");
        assert!(tokens[1].is_punct(&Punct::Period));
        assert!(matches!(&tokens[3], Token::Punctuation(Punct::Other(op)) if op == "="));
    }
}
