use log::debug;
use sqlparser::tokenizer::Token;

use super::ast::{ExprAst, GroupKeyAst, OrderByExprAst, SelectAst, SelectItemAst, TableRefAst};
use super::errors::{ParseError, Position};
use super::lexer::{self, Keyword, Lexeme};
use super::logical::{
    AggregateFunc, BinaryOp, ColumnRef, Expr, Literal, PREC_ADD_SUB, PREC_AND, PREC_COMPARISON,
    PREC_MUL_DIV, PREC_NOT, PREC_OR, PREC_UNARY_MINUS, QueryIr, RelationRef, SortDirection, UnaryOp,
};
use super::validate::{self, Draft, Site, Violation};

type Result<T> = std::result::Result<T, ParseError>;

/// Parse a single SELECT statement (optional trailing `;`) into a validated IR.
pub fn parse_query(sql: &str) -> Result<QueryIr> {
    let tokens = lexer::tokenize(sql)?;
    let mut parser = Parser::new(tokens, lexer::end_position(sql));
    let select = parser.parse_select()?;
    let ir = resolve(select)?;
    debug!(
        "parsed query over {}: {} projection item(s), {} group key(s), {} sort key(s)",
        ir.source().name(),
        ir.projection().len(),
        ir.group_by().len(),
        ir.sort().len()
    );
    Ok(ir)
}

/// Turn the positioned parse tree into an IR, mapping violations back to source positions.
fn resolve(select: SelectAst) -> Result<QueryIr> {
    let item_positions: Vec<Position> = select.projection.iter().map(|i| i.expr.position).collect();
    let sort_positions: Vec<Position> = select.order_by.iter().map(|o| o.expr.position).collect();
    let filter_position = select.selection.as_ref().map(|s| s.position);

    let draft = Draft {
        source: RelationRef::new(select.from.name),
        projection: select.projection.into_iter().map(|i| (i.expr.expr, i.alias)).collect(),
        filter: select.selection.map(|s| s.expr),
        group_by: select.group_by.into_iter().map(|g| g.column).collect(),
        sort: select.order_by.into_iter().map(|o| (o.expr.expr, o.direction)).collect(),
        limit: select.limit,
    };

    let site_position = |site: Site| match site {
        Site::Projection(i) => item_positions[i],
        Site::Filter => filter_position.unwrap_or(Position::new(1, 1)),
        Site::Sort(i) => sort_positions[i],
    };
    validate::assemble(draft).map_err(|violation| match violation {
        // The grammar only produces `*` as a whole item or inside COUNT.
        Violation::MisplacedWildcard { site, .. } => ParseError::UnexpectedToken {
            expected: "expression".to_string(),
            found: "'*'".to_string(),
            position: site_position(site),
        },
        Violation::NonFiniteLiteral { site, item } => ParseError::UnexpectedToken {
            expected: "numeric literal".to_string(),
            found: format!("'{item}'"),
            position: site_position(site),
        },
        Violation::NestedAggregate { site, item } => ParseError::NestedAggregate { item, position: site_position(site) },
        Violation::NotAggregated { index, item } => {
            ParseError::ProjectionNotAggregated { item, position: item_positions[index] }
        }
        Violation::UnboundSortKey { index, name } => {
            ParseError::UnboundAlias { name, position: sort_positions[index] }
        }
    })
}

/// Which clause was parsed last; clauses must appear in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    From,
    Where,
    GroupBy,
    OrderBy,
    Limit,
}

enum FunctionName {
    Aggregate(AggregateFunc),
    Round,
}

impl FunctionName {
    fn lookup(name: &str) -> Option<FunctionName> {
        Some(match name.to_ascii_uppercase().as_str() {
            "COUNT" => FunctionName::Aggregate(AggregateFunc::Count),
            "SUM" => FunctionName::Aggregate(AggregateFunc::Sum),
            "AVG" => FunctionName::Aggregate(AggregateFunc::Avg),
            "MIN" => FunctionName::Aggregate(AggregateFunc::Min),
            "MAX" => FunctionName::Aggregate(AggregateFunc::Max),
            "ROUND" => FunctionName::Round,
            _ => return None,
        })
    }
}

struct Parser {
    tokens: Vec<Lexeme>,
    idx: usize,
    end: Position,
}

impl Parser {
    fn new(tokens: Vec<Lexeme>, end: Position) -> Self {
        Self { tokens, idx: 0, end }
    }

    fn peek(&self) -> Option<&Lexeme> {
        self.tokens.get(self.idx)
    }

    fn peek_nth(&self, n: usize) -> Option<&Lexeme> {
        self.tokens.get(self.idx + n)
    }

    fn next(&mut self) -> Option<Lexeme> {
        let tok = self.tokens.get(self.idx).cloned();
        if tok.is_some() {
            self.idx += 1;
        }
        tok
    }

    fn position(&self) -> Position {
        self.peek().map(|t| t.position).unwrap_or(self.end)
    }

    fn peek_keyword(&self) -> Option<Keyword> {
        self.peek().and_then(Lexeme::keyword)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|t| &t.token)
    }

    /// Consume the keyword if it is next.
    fn parse_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek_keyword() == Some(keyword) {
            self.idx += 1;
            true
        } else {
            false
        }
    }

    fn consume_token(&mut self, token: &Token) -> bool {
        if self.peek_token() == Some(token) {
            self.idx += 1;
            true
        } else {
            false
        }
    }

    /// Error for whatever token sits at the cursor. Clause keywords get the
    /// more specific `UnexpectedClause`.
    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(tok) => match tok.keyword() {
                Some(kw) if kw.is_clause() => ParseError::UnexpectedClause {
                    found: tok.describe(),
                    position: tok.position,
                },
                _ => ParseError::UnexpectedToken {
                    expected: expected.to_string(),
                    found: tok.describe(),
                    position: tok.position,
                },
            },
            None => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: "end of input".to_string(),
                position: self.end,
            },
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword, expected: &str) -> Result<()> {
        if self.parse_keyword(keyword) { Ok(()) } else { Err(self.unexpected(expected)) }
    }

    fn expect_token(&mut self, token: &Token, expected: &str) -> Result<()> {
        if self.consume_token(token) { Ok(()) } else { Err(self.unexpected(expected)) }
    }

    fn parse_identifier(&mut self, expected: &str) -> Result<String> {
        match self.peek().and_then(Lexeme::identifier) {
            Some(ident) => {
                let ident = ident.to_string();
                self.idx += 1;
                Ok(ident)
            }
            None => Err(self.unexpected(expected)),
        }
    }

    fn parse_select(&mut self) -> Result<SelectAst> {
        self.expect_keyword(Keyword::Select, "SELECT")?;
        let projection = self.parse_select_list()?;
        self.expect_keyword(Keyword::From, "FROM")?;
        let position = self.position();
        let name = self.parse_identifier("relation name")?;
        let from = TableRefAst { name, position };

        let mut select = SelectAst {
            projection,
            from,
            selection: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        };

        let mut stage = Stage::From;
        while let Some(tok) = self.peek() {
            let keyword = tok.keyword();
            match keyword {
                Some(Keyword::Where) if stage < Stage::Where => {
                    self.idx += 1;
                    select.selection = Some(self.parse_positioned_expr()?);
                    stage = Stage::Where;
                }
                Some(Keyword::Group) if stage < Stage::GroupBy => {
                    self.idx += 1;
                    self.expect_keyword(Keyword::By, "BY")?;
                    select.group_by = self.parse_group_keys()?;
                    stage = Stage::GroupBy;
                }
                Some(Keyword::Order) if stage < Stage::OrderBy => {
                    self.idx += 1;
                    self.expect_keyword(Keyword::By, "BY")?;
                    select.order_by = self.parse_order_by()?;
                    stage = Stage::OrderBy;
                }
                Some(Keyword::Limit) if stage < Stage::Limit => {
                    self.idx += 1;
                    select.limit = Some(self.parse_limit()?);
                    stage = Stage::Limit;
                }
                Some(kw) if kw.is_clause() => {
                    return Err(ParseError::UnexpectedClause { found: tok.describe(), position: tok.position });
                }
                _ => break,
            }
        }

        self.consume_token(&Token::SemiColon);
        if let Some(tok) = self.peek() {
            return Err(match tok.keyword() {
                Some(kw) if kw.is_clause() => {
                    ParseError::UnexpectedClause { found: tok.describe(), position: tok.position }
                }
                _ => ParseError::TrailingInput { found: tok.describe(), position: tok.position },
            });
        }
        Ok(select)
    }

    fn parse_select_list(&mut self) -> Result<Vec<SelectItemAst>> {
        let mut items = vec![self.parse_select_item()?];
        while self.consume_token(&Token::Comma) {
            items.push(self.parse_select_item()?);
        }
        Ok(items)
    }

    fn parse_select_item(&mut self) -> Result<SelectItemAst> {
        let position = self.position();
        if self.consume_token(&Token::Mul) {
            return Ok(SelectItemAst { expr: ExprAst { expr: Expr::Wildcard, position }, alias: None });
        }
        if matches!(self.peek_keyword(), Some(kw) if kw.is_clause()) || self.peek().is_none() {
            return Err(self.unexpected("select item"));
        }
        let expr = self.parse_positioned_expr()?;
        let alias = if self.parse_keyword(Keyword::As) {
            Some(self.parse_identifier("alias after AS")?)
        } else if let Some(ident) = self.peek().and_then(Lexeme::identifier) {
            let ident = ident.to_string();
            self.idx += 1;
            Some(ident)
        } else {
            None
        };
        Ok(SelectItemAst { expr, alias })
    }

    fn parse_group_keys(&mut self) -> Result<Vec<GroupKeyAst>> {
        let mut keys = Vec::new();
        loop {
            let position = self.position();
            let column = self.parse_column_ref("group-by column")?;
            keys.push(GroupKeyAst { column, position });
            if !self.consume_token(&Token::Comma) {
                break;
            }
        }
        Ok(keys)
    }

    fn parse_order_by(&mut self) -> Result<Vec<OrderByExprAst>> {
        let mut items = Vec::new();
        loop {
            let expr = self.parse_positioned_expr()?;
            let direction = if self.parse_keyword(Keyword::Desc) {
                SortDirection::Desc
            } else {
                self.parse_keyword(Keyword::Asc);
                SortDirection::Asc
            };
            items.push(OrderByExprAst { expr, direction });
            if !self.consume_token(&Token::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_limit(&mut self) -> Result<u64> {
        if let Some(Lexeme { token: Token::Number(n, _), .. }) = self.peek()
            && let Ok(limit) = n.parse::<u64>()
        {
            self.idx += 1;
            return Ok(limit);
        }
        Err(self.unexpected("non-negative integer after LIMIT"))
    }

    /// `name` or `relation.name`
    fn parse_column_ref(&mut self, expected: &str) -> Result<ColumnRef> {
        let first = self.parse_identifier(expected)?;
        if self.consume_token(&Token::Period) {
            let name = self.parse_identifier("column name after '.'")?;
            Ok(ColumnRef::qualified(first, name))
        } else {
            Ok(ColumnRef::new(first))
        }
    }

    fn parse_positioned_expr(&mut self) -> Result<ExprAst> {
        let position = self.position();
        let expr = self.parse_expr()?;
        Ok(ExprAst { expr, position })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_subexpr(0)
    }

    fn parse_subexpr(&mut self, precedence: u8) -> Result<Expr> {
        let mut expr = self.parse_prefix()?;

        loop {
            let next_precedence = self.infix_precedence();
            if precedence >= next_precedence {
                break;
            }

            expr = self.parse_infix(expr, next_precedence)?;
        }

        Ok(expr)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        let Some(tok) = self.peek().cloned() else {
            return Err(self.unexpected("expression"));
        };

        if let Some(kw) = tok.keyword() {
            return match kw {
                Keyword::Not => {
                    self.idx += 1;
                    let inner = self.parse_subexpr(PREC_NOT)?;
                    Ok(Expr::Unary { op: UnaryOp::Not, expr: Box::new(inner) })
                }
                Keyword::True => {
                    self.idx += 1;
                    Ok(Expr::Literal(Literal::Boolean(true)))
                }
                Keyword::False => {
                    self.idx += 1;
                    Ok(Expr::Literal(Literal::Boolean(false)))
                }
                Keyword::Null => {
                    self.idx += 1;
                    Ok(Expr::Literal(Literal::Null))
                }
                _ => Err(self.unexpected("expression")),
            };
        }

        match &tok.token {
            Token::Word(w) => {
                if self.peek_nth(1).map(|t| &t.token) == Some(&Token::LParen) && w.quote_style.is_none() {
                    return self.parse_function(&w.value, tok.position);
                }
                Ok(Expr::Column(self.parse_column_ref("expression")?))
            }
            Token::Number(n, _) => {
                self.idx += 1;
                parse_number(n, false, tok.position)
            }
            Token::SingleQuotedString(s) => {
                self.idx += 1;
                Ok(Expr::Literal(Literal::String(s.clone())))
            }
            Token::Minus => {
                self.idx += 1;
                // Fold `-<number>` into a negative literal.
                if let Some(Lexeme { token: Token::Number(n, _), position }) = self.peek().cloned() {
                    self.idx += 1;
                    return parse_number(&n, true, position);
                }
                let inner = self.parse_subexpr(PREC_UNARY_MINUS)?;
                Ok(Expr::Unary { op: UnaryOp::Neg, expr: Box::new(inner) })
            }
            Token::Plus => {
                self.idx += 1;
                self.parse_subexpr(PREC_UNARY_MINUS)
            }
            Token::LParen => {
                self.idx += 1;
                let expr = self.parse_expr()?;
                self.expect_token(&Token::RParen, "')'")?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_function(&mut self, name: &str, position: Position) -> Result<Expr> {
        let Some(func) = FunctionName::lookup(name) else {
            return Err(ParseError::UnknownFunction { name: name.to_string(), position });
        };
        // name and '('
        self.idx += 2;
        let expr = match func {
            FunctionName::Aggregate(func) => {
                let arg = if func == AggregateFunc::Count && self.consume_token(&Token::Mul) {
                    Expr::Wildcard
                } else {
                    self.parse_expr()?
                };
                Expr::Aggregate { func, arg: Box::new(arg) }
            }
            FunctionName::Round => {
                let arg = self.parse_expr()?;
                let precision = if self.consume_token(&Token::Comma) {
                    Some(self.parse_precision()?)
                } else {
                    None
                };
                Expr::Round { arg: Box::new(arg), precision }
            }
        };
        self.expect_token(&Token::RParen, "')'")?;
        Ok(expr)
    }

    fn parse_precision(&mut self) -> Result<i64> {
        let negative = self.consume_token(&Token::Minus);
        if let Some(Lexeme { token: Token::Number(n, _), .. }) = self.peek()
            && let Ok(p) = n.parse::<i64>()
        {
            self.idx += 1;
            return Ok(if negative { -p } else { p });
        }
        Err(self.unexpected("integer precision"))
    }

    fn infix_precedence(&self) -> u8 {
        let Some(tok) = self.peek() else {
            return 0;
        };
        match &tok.token {
            Token::Word(_) => match tok.keyword() {
                Some(Keyword::Or) => PREC_OR,
                Some(Keyword::And) => PREC_AND,
                _ => 0,
            },
            Token::Eq | Token::DoubleEq | Token::Neq | Token::Lt | Token::LtEq | Token::Gt | Token::GtEq => {
                PREC_COMPARISON
            }
            Token::Plus | Token::Minus => PREC_ADD_SUB,
            Token::Mul | Token::Div => PREC_MUL_DIV,
            _ => 0,
        }
    }

    fn parse_infix(&mut self, left: Expr, precedence: u8) -> Result<Expr> {
        let Some(tok) = self.next() else {
            return Err(self.unexpected("operator"));
        };
        let op = match &tok.token {
            Token::Eq | Token::DoubleEq => BinaryOp::Eq,
            Token::Neq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::LtEq => BinaryOp::LtEq,
            Token::Gt => BinaryOp::Gt,
            Token::GtEq => BinaryOp::GtEq,
            Token::Plus => BinaryOp::Plus,
            Token::Minus => BinaryOp::Minus,
            Token::Mul => BinaryOp::Multiply,
            Token::Div => BinaryOp::Divide,
            _ => match tok.keyword() {
                Some(Keyword::And) => BinaryOp::And,
                Some(Keyword::Or) => BinaryOp::Or,
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "operator".to_string(),
                        found: tok.describe(),
                        position: tok.position,
                    });
                }
            },
        };
        let right = self.parse_subexpr(precedence)?;
        Ok(Expr::Binary { left: Box::new(left), op, right: Box::new(right) })
    }
}

/// Integers stay integers; anything with a fraction or exponent is a float.
fn parse_number(text: &str, negative: bool, position: Position) -> Result<Expr> {
    let signed = if negative { format!("-{text}") } else { text.to_string() };
    let literal = if text.contains(['.', 'e', 'E']) {
        signed.parse::<f64>().ok().filter(|f| f.is_finite()).map(Literal::Float)
    } else {
        signed.parse::<i64>().ok().map(Literal::Integer)
    };
    literal.map(Expr::Literal).ok_or_else(|| ParseError::UnexpectedToken {
        expected: "numeric literal".to_string(),
        found: format!("'{signed}'"),
        position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_ast::logical::{SortTarget, avg, col, count_all, lit, round, round_to};

    fn parse(sql: &str) -> QueryIr {
        parse_query(sql).unwrap()
    }

    fn filter_of(sql: &str) -> Expr {
        parse(sql).filter().cloned().unwrap()
    }

    #[test]
    fn test_simple_select() {
        let ir = parse("SELECT mpg, hp FROM mtcars");
        assert_eq!(ir.source().name(), "mtcars");
        assert_eq!(ir.output_names(), vec!["mpg", "hp"]);
        assert!(ir.filter().is_none());
        assert_eq!(ir.limit(), None);
    }

    #[test]
    fn test_explicit_and_bare_aliases() {
        let ir = parse("SELECT hp AS power, wt weight FROM mtcars");
        assert_eq!(ir.projection()[0].alias.as_deref(), Some("power"));
        assert_eq!(ir.projection()[1].alias.as_deref(), Some("weight"));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            filter_of("SELECT * FROM t WHERE a = 1 OR b = 2 AND c = 3"),
            col("a").eq(lit(1)).or(col("b").eq(lit(2)).and(col("c").eq(lit(3))))
        );
        assert_eq!(filter_of("SELECT * FROM t WHERE a + b * 2 > 3"), (col("a") + col("b") * lit(2)).gt(lit(3)));
        assert_eq!(filter_of("SELECT * FROM t WHERE NOT a = 1 AND b"), (!col("a").eq(lit(1))).and(col("b")));
        assert_eq!(filter_of("SELECT * FROM t WHERE (a OR b) AND c"), col("a").or(col("b")).and(col("c")));
        assert_eq!(filter_of("SELECT * FROM t WHERE a - b - c"), (col("a") - col("b")) - col("c"));
    }

    #[test]
    fn test_comparison_spellings() {
        assert_eq!(filter_of("SELECT * FROM t WHERE a <> 1"), col("a").not_eq(lit(1)));
        assert_eq!(filter_of("SELECT * FROM t WHERE a != 1"), col("a").not_eq(lit(1)));
        assert_eq!(filter_of("SELECT * FROM t WHERE a == 1"), col("a").eq(lit(1)));
        assert_eq!(filter_of("SELECT * FROM t WHERE a <= 1 AND b >= 2"), col("a").lt_eq(lit(1)).and(col("b").gt_eq(lit(2))));
    }

    #[test]
    fn test_literals() {
        assert_eq!(filter_of("SELECT * FROM t WHERE am = 1"), col("am").eq(lit(1)));
        assert_eq!(filter_of("SELECT * FROM t WHERE wt > 2.5"), col("wt").gt(lit(2.5)));
        assert_eq!(filter_of("SELECT * FROM t WHERE x = -3"), col("x").eq(lit(-3)));
        assert_eq!(filter_of("SELECT * FROM t WHERE x = -(3)"), col("x").eq(-lit(3)));
        assert_eq!(filter_of("SELECT * FROM t WHERE name = 'it''s'"), col("name").eq(lit("it's")));
        assert_eq!(filter_of("SELECT * FROM t WHERE flag = TRUE"), col("flag").eq(lit(true)));
        assert_eq!(filter_of("SELECT * FROM t WHERE x = NULL"), col("x").eq(Expr::Literal(Literal::Null)));
    }

    #[test]
    fn test_functions() {
        let ir = parse("SELECT round(avg(mpg), 2), COUNT(*), ROUND(hp, -1) FROM mtcars");
        assert_eq!(ir.projection()[0].expr, round_to(avg("mpg"), 2));
        assert_eq!(ir.projection()[1].expr, count_all());
        assert_eq!(ir.projection()[2].expr, round_to("hp", -1));
        let ir = parse("SELECT ROUND(wt) FROM mtcars");
        assert_eq!(ir.projection()[0].expr, round("wt"));
    }

    #[test]
    fn test_unknown_function() {
        let err = parse_query("SELECT median(mpg) FROM mtcars").unwrap_err();
        assert_eq!(err, ParseError::UnknownFunction { name: "median".into(), position: Position::new(1, 8) });
    }

    #[test]
    fn test_qualified_columns_resolve_against_source() {
        let ir = parse("SELECT mtcars.mpg FROM mtcars WHERE mtcars.am = 1");
        assert_eq!(ir.projection()[0].expr, col("mpg"));
        assert_eq!(ir.filter(), Some(&col("am").eq(lit(1))));
    }

    #[test]
    fn test_quoted_identifiers() {
        let ir = parse("SELECT \"order\", `group` AS [by] FROM \"my table\"");
        assert_eq!(ir.source().name(), "my table");
        assert_eq!(ir.projection()[0].expr, col("order"));
        assert_eq!(ir.projection()[1].alias.as_deref(), Some("by"));
    }

    #[test]
    fn test_order_by_binding() {
        let ir = parse("SELECT AVG(mpg) AS m, cyl FROM mtcars GROUP BY cyl ORDER BY m DESC, cyl, AVG(mpg) ASC");
        let targets: Vec<_> = ir.sort().iter().map(|s| (s.target.clone(), s.direction)).collect();
        assert_eq!(
            targets,
            vec![
                (SortTarget::Output("m".into()), SortDirection::Desc),
                (SortTarget::Output("cyl".into()), SortDirection::Asc),
                (SortTarget::Output("m".into()), SortDirection::Asc),
            ]
        );
        let ir = parse("SELECT mpg FROM mtcars ORDER BY hp");
        assert_eq!(ir.sort()[0].target, SortTarget::Expr(col("hp")));
    }

    #[test]
    fn test_unbound_alias() {
        let err = parse_query("SELECT cyl FROM mtcars GROUP BY cyl ORDER BY mpg").unwrap_err();
        assert_eq!(err, ParseError::UnboundAlias { name: "mpg".into(), position: Position::new(1, 46) });
        let err = parse_query("SELECT cyl FROM mtcars GROUP BY cyl ORDER BY mpg + 1").unwrap_err();
        assert_eq!(err, ParseError::UnboundAlias { name: "mpg + 1".into(), position: Position::new(1, 46) });
        assert!(parse_query("SELECT cyl FROM mtcars GROUP BY cyl ORDER BY SUM(hp) + 1").is_ok());
    }

    #[test]
    fn test_order_by_implicit_output_name() {
        let ir = parse("SELECT cyl, AVG(mpg) FROM mtcars GROUP BY cyl ORDER BY \"AVG(mpg)\" DESC");
        assert_eq!(ir.sort()[0].target, SortTarget::Output("AVG(mpg)".into()));
        let ir = parse("SELECT AVG(mpg) FROM mtcars ORDER BY \"AVG(mpg)\"");
        assert_eq!(ir.sort()[0].target, SortTarget::Output("AVG(mpg)".into()));
    }

    #[test]
    fn test_qualified_order_key_ignores_aliases() {
        let ir = parse("SELECT hp AS mpg, mpg FROM mtcars ORDER BY mtcars.mpg");
        assert_eq!(ir.sort()[0].target, SortTarget::Expr(col("mpg")));
        let ir = parse("SELECT hp AS mpg, mpg FROM mtcars ORDER BY mpg");
        assert_eq!(ir.sort()[0].target, SortTarget::Output("mpg".into()));
    }

    #[test]
    fn test_out_of_range_float_rejected() {
        let err = parse_query("SELECT a FROM t WHERE a = 1e400").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "numeric literal"));
        assert_eq!(filter_of("SELECT a FROM t WHERE a = 1e3"), col("a").eq(lit(1000.0)));
    }

    #[test]
    fn test_select_without_items() {
        let err = parse_query("SELECT FROM mtcars").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedClause { position, .. } if position == Position::new(1, 8)));
    }

    #[test]
    fn test_out_of_order_clause() {
        let err = parse_query("SELECT mpg FROM mtcars LIMIT 3 WHERE am = 1").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedClause { position, .. } if position == Position::new(1, 32)));
        let err = parse_query("SELECT mpg FROM mtcars WHERE am = 1 WHERE vs = 0").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedClause { .. }));
    }

    #[test]
    fn test_unsupported_clause() {
        let err = parse_query("SELECT cyl FROM mtcars GROUP BY cyl HAVING cyl > 4").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedClause { position, .. } if position == Position::new(1, 37)));
    }

    #[test]
    fn test_trailing_input() {
        let err = parse_query("SELECT mpg FROM mtcars LIMIT 3 garbage").unwrap_err();
        assert!(matches!(err, ParseError::TrailingInput { position, .. } if position == Position::new(1, 32)));
        let err = parse_query("SELECT mpg FROM mtcars; SELECT 1").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedClause { .. }));
        let err = parse_query("SELECT mpg FROM mtcars; hp").unwrap_err();
        assert!(matches!(err, ParseError::TrailingInput { .. }));
        assert!(parse_query("SELECT mpg FROM mtcars;").is_ok());
    }

    #[test]
    fn test_unexpected_token() {
        let err = parse_query("SELECT mpg FROM mtcars WHERE am = ").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref found, .. } if found == "end of input"));
        let err = parse_query("SELECT (mpg FROM mtcars").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedClause { .. }));
        let err = parse_query("SELECT mpg FROM mtcars LIMIT -1").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
        let err = parse_query("SELECT SUM(*) FROM mtcars").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_projection_not_aggregated() {
        let err = parse_query("SELECT cyl, mpg FROM mtcars GROUP BY cyl").unwrap_err();
        assert_eq!(err, ParseError::ProjectionNotAggregated { item: "mpg".into(), position: Position::new(1, 13) });
    }

    #[test]
    fn test_nested_aggregate() {
        let err = parse_query("SELECT AVG(SUM(mpg)) FROM mtcars").unwrap_err();
        assert!(matches!(err, ParseError::NestedAggregate { position, .. } if position == Position::new(1, 8)));
    }

    #[test]
    fn test_multiline_positions() {
        let err = parse_query("SELECT mpg\nFROM mtcars\nORDER BY hp\nLIMIT 1 WHERE").unwrap_err();
        assert_eq!(err.position(), Position::new(4, 9));
    }
}
