//! Table reference extraction from a statement body
//!
//! A small state machine walks the body tokens:
//!
//! ```text
//! Scan --FROM/JOIN--> ExpectTable --name--> AfterTable --AS--> ExpectAlias
//!                                              |                   |
//!                                              +--ident--> AfterAlias <--ident
//! ```
//!
//! `,` after a table or alias returns to `ExpectTable`; any other token
//! falls back to `Scan` and is re-examined there. Alias identifiers are
//! recorded separately and never reported as tables.

use indexmap::{IndexMap, IndexSet};

use crate::entity::{normalize, EntityName};
use crate::parser::{object_name, Cursor, Keyword, Punct, Token};

/// Tables referenced by one statement body, plus the aliases bound to them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableReferences {
    tables: IndexSet<EntityName>,
    aliases: IndexMap<String, EntityName>,
}

impl TableReferences {
    /// Referenced tables in first-seen order
    pub fn tables(&self) -> impl Iterator<Item = &EntityName> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains(&EntityName::parse(name))
    }

    /// Alias -> aliased table
    pub fn aliases(&self) -> &IndexMap<String, EntityName> {
        &self.aliases
    }

    /// Resolve an alias back to its table
    pub fn resolve_alias(&self, alias: &str) -> Option<&EntityName> {
        self.aliases.get(&normalize(alias))
    }

    /// Resolve a qualifier that is either an alias or a referenced table
    pub fn resolve(&self, qualifier: &str) -> Option<&EntityName> {
        self.resolve_alias(qualifier).or_else(|| {
            let name = EntityName::parse(qualifier);
            self.tables.get(&name)
        })
    }

    /// Consume into the referenced tables
    pub fn into_tables(self) -> IndexSet<EntityName> {
        self.tables
    }
}

#[derive(Debug)]
enum State {
    Scan,
    ExpectTable,
    AfterTable(EntityName),
    ExpectAlias(EntityName),
    AfterAlias,
}

/// Extract the distinct tables a body reads from
pub fn extract_references(body: &[Token]) -> TableReferences {
    Extractor::new(body).run()
}

struct Extractor<'a> {
    tokens: &'a [Token],
    pos: usize,
    state: State,
    /// Per parenthesis depth: whether a SELECT/DELETE opened a query there
    query_depths: Vec<bool>,
    refs: TableReferences,
}

impl<'a> Extractor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            state: State::Scan,
            query_depths: vec![false],
            refs: TableReferences::default(),
        }
    }

    fn run(mut self) -> TableReferences {
        let tokens = self.tokens;
        while let Some(token) = tokens.get(self.pos) {
            let state = std::mem::replace(&mut self.state, State::Scan);
            match state {
                State::Scan => self.scan(token),
                State::ExpectTable => self.expect_table(token),
                State::AfterTable(table) => self.after_table(token, table),
                State::ExpectAlias(table) => self.expect_alias(token, table),
                State::AfterAlias => self.after_alias(token),
            }
        }
        self.refs
    }

    fn scan(&mut self, token: &Token) {
        match token {
            Token::Keyword(Keyword::Select | Keyword::Delete) => {
                if let Some(top) = self.query_depths.last_mut() {
                    *top = true;
                }
            }
            Token::Keyword(Keyword::From) => {
                if self.query_depths.last().copied().unwrap_or(false) {
                    self.state = State::ExpectTable;
                }
            }
            Token::Keyword(Keyword::Join) => self.state = State::ExpectTable,
            Token::Punctuation(Punct::LParen) => self.query_depths.push(false),
            Token::Punctuation(Punct::RParen) => self.close_paren(),
            _ => {}
        }
        self.pos += 1;
    }

    fn expect_table(&mut self, token: &Token) {
        match token {
            Token::Identifier(_) => {
                let remaining = &self.tokens[self.pos..];
                let mut cursor = Cursor::new(remaining);
                let Some(name) = object_name(&mut cursor) else {
                    self.pos += 1;
                    return;
                };
                self.pos += remaining.len() - cursor.rest().len();

                // name( ... ) is a table function, not a table
                if cursor.peek().is_some_and(|t| t.is_punct(&Punct::LParen)) {
                    return;
                }
                self.refs.tables.insert(name.clone());
                self.state = State::AfterTable(name);
            }
            Token::Punctuation(Punct::LParen) => {
                // Derived table or parenthesized join
                self.query_depths.push(false);
                self.pos += 1;
                self.state = State::ExpectTable;
            }
            Token::Keyword(Keyword::Lateral | Keyword::Only) => {
                self.pos += 1;
                self.state = State::ExpectTable;
            }
            // Re-examine in Scan
            _ => {}
        }
    }

    fn after_table(&mut self, token: &Token, table: EntityName) {
        match token {
            Token::Keyword(Keyword::As) => {
                self.pos += 1;
                self.state = State::ExpectAlias(table);
            }
            Token::Identifier(ident) => {
                self.bind_alias(&ident.value, table);
                self.pos += 1;
                self.state = State::AfterAlias;
            }
            Token::Punctuation(Punct::Comma) => {
                self.pos += 1;
                self.state = State::ExpectTable;
            }
            _ => {}
        }
    }

    fn expect_alias(&mut self, token: &Token, table: EntityName) {
        if let Token::Identifier(ident) = token {
            self.bind_alias(&ident.value, table);
            self.pos += 1;
            self.state = State::AfterAlias;
        }
    }

    fn after_alias(&mut self, token: &Token) {
        match token {
            Token::Punctuation(Punct::Comma) => {
                self.pos += 1;
                self.state = State::ExpectTable;
            }
            Token::Punctuation(Punct::LParen) => {
                // Column alias list: t(a, b)
                let remaining = &self.tokens[self.pos..];
                let mut cursor = Cursor::new(remaining);
                cursor.skip_group();
                self.pos += remaining.len() - cursor.rest().len();
                self.state = State::AfterAlias;
            }
            _ => {}
        }
    }

    fn bind_alias(&mut self, alias: &str, table: EntityName) {
        self.refs.aliases.insert(normalize(alias), table);
    }

    fn close_paren(&mut self) {
        if self.query_depths.len() > 1 {
            self.query_depths.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenize;
    use pretty_assertions::assert_eq;
    use sqlparser::dialect::PostgreSqlDialect;

    fn tables(body: &str) -> Vec<String> {
        refs(body).tables().map(|t| t.key().to_string()).collect()
    }

    fn refs(body: &str) -> TableReferences {
        let tokens = tokenize(&PostgreSqlDialect {}, body).unwrap();
        extract_references(&tokens)
    }

    #[test]
    fn test_from_and_join() {
        assert_eq!(
            tables("SELECT c.id, o.total FROM customers c JOIN orders o ON c.id = o.customer_id"),
            vec!["customers", "orders"]
        );
    }

    #[test]
    fn test_aliases_are_not_tables() {
        let refs = refs(
            "SELECT * FROM orders AS customers LEFT OUTER JOIN items i ON i.order_id = customers.id",
        );
        assert_eq!(refs.len(), 2);
        assert!(refs.contains("orders"));
        assert!(refs.contains("items"));
        assert!(!refs.contains("customers"));
        assert_eq!(refs.resolve_alias("Customers").map(|t| t.key()), Some("orders"));
        assert_eq!(refs.resolve("i").map(|t| t.key()), Some("items"));
        assert_eq!(refs.resolve("items").map(|t| t.key()), Some("items"));
    }

    #[test]
    fn test_schema_qualified_and_case_insensitive() {
        assert_eq!(
            tables("select * from Sales.Orders join sales.orders o2 on true"),
            vec!["sales.orders"]
        );
    }

    #[test]
    fn test_comma_separated_from_list() {
        assert_eq!(
            tables("SELECT * FROM a, b bb, c AS cc WHERE a.id = bb.id"),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_subqueries_are_scanned() {
        assert_eq!(
            tables(
                "SELECT * FROM (SELECT id FROM raw_events) e \
                 WHERE e.id IN (SELECT id FROM allowed)"
            ),
            vec!["raw_events", "allowed"]
        );
    }

    #[test]
    fn test_parenthesized_join() {
        assert_eq!(
            tables("SELECT * FROM (a JOIN b ON a.id = b.id) JOIN c ON c.id = a.id"),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_from_inside_function_call_is_ignored() {
        assert_eq!(
            tables("SELECT EXTRACT(YEAR FROM created_at), TRIM(BOTH ' ' FROM name) FROM users"),
            vec!["users"]
        );
    }

    #[test]
    fn test_table_functions_are_ignored() {
        assert_eq!(
            tables("SELECT * FROM generate_series(1, 10) g JOIN numbers n ON n.v = g"),
            vec!["numbers"]
        );
    }

    #[test]
    fn test_values_body_has_no_references() {
        assert!(refs("VALUES (1, 'a'), (2, 'b')").is_empty());
    }

    #[test]
    fn test_self_reference_is_kept() {
        assert_eq!(tables("SELECT * FROM v WHERE x > 1"), vec!["v"]);
    }

    #[test]
    fn test_keyword_named_name_parts() {
        assert_eq!(tables("SELECT * FROM sales.order"), vec!["sales.order"]);
        assert_eq!(tables("SELECT * FROM temp.orders t"), vec!["temp.orders"]);
        assert_eq!(
            tables("SELECT * FROM a JOIN analytics.view v ON v.id = a.id"),
            vec!["a", "analytics.view"]
        );
    }

    #[test]
    fn test_quoted_names() {
        assert_eq!(
            tables("SELECT * FROM \"Sales\".\"Big Orders\" bo"),
            vec!["sales.big orders"]
        );
    }

    #[test]
    fn test_column_alias_list() {
        let refs = refs("SELECT * FROM pairs AS p(a, b), other");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs.resolve_alias("p").map(|t| t.key()), Some("pairs"));
    }

    #[test]
    fn test_lateral_join() {
        assert_eq!(
            tables("SELECT * FROM a CROSS JOIN LATERAL (SELECT * FROM b WHERE b.x = a.x) sub"),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(
            tables("SELECT * FROM t UNION SELECT * FROM T UNION SELECT * FROM u"),
            vec!["t", "u"]
        );
    }
}
