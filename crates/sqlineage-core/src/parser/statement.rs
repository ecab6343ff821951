//! Recognition of name-binding CREATE statements

use crate::entity::{EntityKind, EntityName};
use crate::parser::lexer::{Keyword, Punct, Token};

/// A statement that binds a name to a query body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: EntityName,
    pub kind: EntityKind,
    /// Tokens following `AS`
    pub body: Vec<Token>,
}

/// Why a statement could not be split into name and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub message: String,
    pub help: Option<String>,
}

impl ParseIssue {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            help: None,
        }
    }

    fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Recognize `CREATE [OR REPLACE] [TEMP] [MATERIALIZED] VIEW|TABLE
/// [IF NOT EXISTS] name [(columns)] AS body`.
///
/// Returns `Ok(None)` for statements that bind no name to a query, which
/// are irrelevant to lineage.
pub fn parse_definition(tokens: &[Token]) -> Result<Option<Definition>, ParseIssue> {
    check_balanced(tokens)?;

    let mut cursor = Cursor::new(tokens);
    if !cursor.eat_keyword(Keyword::Create) {
        return Ok(None);
    }
    if cursor.eat_keyword(Keyword::Or) && !cursor.eat_keyword(Keyword::Replace) {
        return Err(ParseIssue::new("expected REPLACE after CREATE OR"));
    }
    let _ = cursor.eat_keyword(Keyword::Temp) || cursor.eat_keyword(Keyword::Temporary);
    let materialized = cursor.eat_keyword(Keyword::Materialized);

    let kind = if cursor.eat_keyword(Keyword::View) {
        EntityKind::View
    } else if !materialized && cursor.eat_keyword(Keyword::Table) {
        EntityKind::Table
    } else {
        return Ok(None);
    };

    if cursor.eat_keyword(Keyword::If)
        && !(cursor.eat_keyword(Keyword::Not) && cursor.eat_keyword(Keyword::Exists))
    {
        return Err(ParseIssue::new("expected NOT EXISTS after IF"));
    }

    let name = match object_name(&mut cursor) {
        Some(name) => name,
        None => {
            return Err(ParseIssue::new(format!("CREATE {} without a name", keyword_for(kind)))
                .with_help("name the object directly after the CREATE clause"));
        }
    };

    if cursor.peek().is_some_and(|t| t.is_punct(&Punct::LParen)) {
        cursor.skip_group();
    }

    if !cursor.eat_keyword(Keyword::As) {
        return match kind {
            // Plain DDL such as CREATE TABLE t (id int)
            EntityKind::Table => Ok(None),
            _ => Err(ParseIssue::new(format!(
                "expected AS after view name '{}'",
                name.display()
            ))),
        };
    }

    let body = cursor.rest().to_vec();
    if body.is_empty() {
        return Err(ParseIssue::new(format!(
            "empty body for {} '{}'",
            keyword_for(kind).to_lowercase(),
            name.display()
        )));
    }

    Ok(Some(Definition { name, kind, body }))
}

fn keyword_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Table => "TABLE",
        _ => "VIEW",
    }
}

/// Parse a dotted identifier chain such as `db.schema.table`
pub(crate) fn object_name(cursor: &mut Cursor<'_>) -> Option<EntityName> {
    let mut parts = vec![cursor.identifier()?];
    while cursor.peek().is_some_and(|t| t.is_punct(&Punct::Period)) {
        cursor.advance();
        match cursor.identifier() {
            Some(part) => parts.push(part),
            None => break,
        }
    }
    Some(EntityName::from_parts(parts))
}

fn check_balanced(tokens: &[Token]) -> Result<(), ParseIssue> {
    let mut depth: usize = 0;
    for token in tokens {
        match token {
            Token::Punctuation(Punct::LParen) => depth += 1,
            Token::Punctuation(Punct::RParen) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    ParseIssue::new("unbalanced parentheses: unexpected ')'")
                })?;
            }
            _ => {}
        }
    }
    if depth > 0 {
        return Err(ParseIssue::new(format!(
            "unbalanced parentheses: {} unclosed '('",
            depth
        ))
        .with_help("check for a missing ')'"));
    }
    Ok(())
}

/// Forward-only cursor over tokens
pub(crate) struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(crate) fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek().is_some_and(|t| t.is_keyword(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn identifier(&mut self) -> Option<String> {
        match self.peek() {
            Some(Token::Identifier(ident)) => {
                self.pos += 1;
                Some(ident.value.clone())
            }
            _ => None,
        }
    }

    /// Skip a parenthesized group starting at the current `(`
    pub(crate) fn skip_group(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            match token {
                Token::Punctuation(Punct::LParen) => depth += 1,
                Token::Punctuation(Punct::RParen) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    pub(crate) fn rest(&self) -> &'a [Token] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;
    use sqlparser::dialect::PostgreSqlDialect;

    fn parse(sql: &str) -> Result<Option<Definition>, ParseIssue> {
        let tokens = tokenize(&PostgreSqlDialect {}, sql).unwrap();
        parse_definition(&tokens)
    }

    #[test]
    fn test_create_view() {
        let def = parse("CREATE VIEW Customer_Orders AS SELECT * FROM orders")
            .unwrap()
            .unwrap();
        assert_eq!(def.name.key(), "customer_orders");
        assert_eq!(def.name.display(), "Customer_Orders");
        assert_eq!(def.kind, EntityKind::View);
        assert!(def.body[0].is_keyword(Keyword::Select));
    }

    #[test]
    fn test_create_table_as() {
        let def = parse("create table if not exists analytics.daily as select 1")
            .unwrap()
            .unwrap();
        assert_eq!(def.name.key(), "analytics.daily");
        assert_eq!(def.kind, EntityKind::Table);
    }

    #[test]
    fn test_create_or_replace_materialized_view_with_columns() {
        let def = parse("CREATE OR REPLACE MATERIALIZED VIEW mv (a, b) AS SELECT x, y FROM t")
            .unwrap()
            .unwrap();
        assert_eq!(def.name.key(), "mv");
        assert!(def.body[0].is_keyword(Keyword::Select));
    }

    #[test]
    fn test_keyword_schema_in_name() {
        let def = parse("CREATE VIEW temp.v AS SELECT * FROM public.order")
            .unwrap()
            .unwrap();
        assert_eq!(def.name.key(), "temp.v");
        assert_eq!(def.kind, EntityKind::View);
    }

    #[test]
    fn test_quoted_name() {
        let def = parse("CREATE VIEW \"Sales\".\"Big Orders\" AS SELECT 1")
            .unwrap()
            .unwrap();
        assert_eq!(def.name.key(), "sales.big orders");
    }

    #[test]
    fn test_non_definitional_statements_are_skipped() {
        assert_eq!(parse("SELECT * FROM orders"), Ok(None));
        assert_eq!(parse("CREATE TABLE users (id int, name text)"), Ok(None));
        assert_eq!(parse("CREATE INDEX idx ON users (id)"), Ok(None));
        assert_eq!(parse("INSERT INTO t SELECT * FROM s"), Ok(None));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let issue = parse("CREATE VIEW v AS SELECT count(* FROM t").unwrap_err();
        assert!(issue.message.contains("unbalanced"));

        let issue = parse("CREATE VIEW v AS SELECT a) FROM t").unwrap_err();
        assert!(issue.message.contains("unexpected ')'"));
    }

    #[test]
    fn test_missing_name() {
        let issue = parse("CREATE VIEW AS SELECT 1").unwrap_err();
        assert!(issue.message.contains("without a name"));
    }

    #[test]
    fn test_missing_body() {
        assert!(parse("CREATE VIEW v AS").is_err());
        assert!(parse("CREATE VIEW v SELECT 1").is_err());
    }
}
