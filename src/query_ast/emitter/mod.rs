use log::{trace, warn};

use super::logical::{
    BinaryOp, ColumnRef, Expr, Literal, PREC_NOT, PREC_UNARY_MINUS, ProjectionItem, QueryIr, SortKey,
    SortTarget, UnaryOp,
};
use crate::models::enums::DatabaseType;

pub mod dialect;
use dialect::{QuoteStyle, quote_string};

/// Generation-time options; nothing here is part of the IR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub quote_style: QuoteStyle,
}

impl GenerateOptions {
    pub fn with_quote_style(quote_style: QuoteStyle) -> Self {
        Self { quote_style }
    }

    pub fn for_database(db_type: &DatabaseType) -> Self {
        Self { quote_style: QuoteStyle::for_database(db_type) }
    }
}

/// Emit canonical SQL for a validated IR. Never fails; no trailing `;`.
pub fn emit_sql(ir: &QueryIr, options: &GenerateOptions) -> String {
    let emitter = FlatEmitter { quote: Some(options.quote_style) };
    let sql = emitter.emit(ir);
    trace!("emitted {} bytes of SQL for {}", sql.len(), ir.source().name());
    sql
}

/// Render a single expression; `None` yields the unquoted canonical form.
pub(crate) fn render_expr(expr: &Expr, quote: Option<QuoteStyle>) -> String {
    FlatEmitter { quote }.emit_expr(expr)
}

struct FlatEmitter {
    quote: Option<QuoteStyle>,
}

impl FlatEmitter {
    fn emit(&self, ir: &QueryIr) -> String {
        let proj_sql = ir
            .projection()
            .iter()
            .map(|p| self.emit_projection(p))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {} FROM {}", proj_sql, self.quote_ident(ir.source().name()));
        if let Some(predicate) = ir.filter() {
            sql.push_str(&format!(" WHERE {}", self.emit_expr(predicate)));
        }
        if !ir.group_by().is_empty() {
            let grp = ir
                .group_by()
                .iter()
                .map(|c| self.emit_expr(&Expr::Column(c.clone())))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" GROUP BY {}", grp));
        }
        if !ir.sort().is_empty() {
            let order = ir
                .sort()
                .iter()
                .map(|s| self.emit_sort_key(ir, s))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" ORDER BY {}", order));
        }
        if let Some(l) = ir.limit() {
            sql.push_str(&format!(" LIMIT {}", l));
        }
        sql
    }

    fn emit_projection(&self, item: &ProjectionItem) -> String {
        match &item.alias {
            Some(alias) => format!("{} AS {}", self.emit_expr(&item.expr), self.quote_ident(alias)),
            None => self.emit_expr(&item.expr),
        }
    }

    fn emit_sort_key(&self, ir: &QueryIr, key: &SortKey) -> String {
        let target = match &key.target {
            SortTarget::Output(name) => match ir.output_item(name) {
                Some(ProjectionItem { alias: Some(alias), .. }) => self.quote_ident(alias),
                Some(item) => self.emit_expr(&unshadowed(&item.expr, ir)),
                None => {
                    warn!("sort key {name} does not name an output column");
                    self.quote_ident(name)
                }
            },
            SortTarget::Expr(e) => self.emit_expr(&unshadowed(e, ir)),
        };
        format!("{} {}", target, key.direction.keyword())
    }

    fn emit_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Column(c) => match &c.relation {
                Some(rel) => format!("{}.{}", self.quote_ident(rel), self.quote_ident(&c.name)),
                None => self.quote_ident(&c.name),
            },
            Expr::Literal(l) => emit_literal(l),
            Expr::Wildcard => "*".into(),
            Expr::Unary { op: UnaryOp::Not, expr } => {
                let inner = self.emit_expr(expr);
                if expr.precedence() < PREC_NOT {
                    format!("NOT ({})", inner)
                } else {
                    format!("NOT {}", inner)
                }
            }
            Expr::Unary { op: UnaryOp::Neg, expr } => {
                // A bare numeric operand would be folded into a negative literal on reparse.
                let inner = self.emit_expr(expr);
                let wrap = expr.precedence() < PREC_UNARY_MINUS
                    || matches!(**expr, Expr::Literal(Literal::Integer(_) | Literal::Float(_)))
                    || inner.starts_with('-');
                if wrap {
                    format!("-({})", inner)
                } else {
                    format!("-{}", inner)
                }
            }
            Expr::Binary { left, op, right } => {
                let prec = op.precedence();
                let l = self.emit_expr(left);
                let r = self.emit_expr(right);
                // Left-associative: equal precedence only needs parens on the right.
                let l = if left.precedence() < prec { format!("({})", l) } else { l };
                let r = if right.precedence() <= prec { format!("({})", r) } else { r };
                format!("{} {} {}", l, emit_binary_op(*op), r)
            }
            Expr::Aggregate { func, arg } => format!("{}({})", func.name(), self.emit_expr(arg)),
            Expr::Round { arg, precision } => match precision {
                Some(p) => format!("ROUND({}, {})", self.emit_expr(arg), p),
                None => format!("ROUND({})", self.emit_expr(arg)),
            },
        }
    }

    fn quote_ident(&self, ident: &str) -> String {
        match self.quote {
            Some(style) => style.quote_ident(ident),
            None => ident.to_string(),
        }
    }
}

/// ORDER BY resolves bare names against output aliases first, so a source
/// column sharing a name with an alias is written qualified.
fn unshadowed(expr: &Expr, ir: &QueryIr) -> Expr {
    let aliases: Vec<&str> = ir.projection().iter().filter_map(|p| p.alias.as_deref()).collect();
    if aliases.is_empty() {
        return expr.clone();
    }
    let source = ir.source().name();
    expr.clone().map_columns(&|c: ColumnRef| {
        if c.relation.is_none() && aliases.contains(&c.name.as_str()) {
            ColumnRef::qualified(source, c.name)
        } else {
            c
        }
    })
}

fn emit_binary_op(op: BinaryOp) -> &'static str {
    op.symbol()
}

fn emit_literal(l: &Literal) -> String {
    match l {
        Literal::Integer(n) => n.to_string(),
        Literal::Float(f) => emit_float(*f),
        Literal::String(s) => quote_string(s),
        Literal::Boolean(true) => "TRUE".into(),
        Literal::Boolean(false) => "FALSE".into(),
        Literal::Null => "NULL".into(),
    }
}

/// Floats always carry a decimal point so they never reparse as integers.
fn emit_float(f: f64) -> String {
    if !f.is_finite() {
        warn!("non-finite float literal {f} emitted as NULL");
        return "NULL".into();
    }
    if f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_ast::builder::from;
    use crate::query_ast::logical::{SortDirection, avg, col, count_all, lit, round, round_to, sum};

    fn emit_default(ir: &QueryIr) -> String {
        emit_sql(ir, &GenerateOptions::default())
    }

    #[test]
    fn test_clause_order_and_quoting() {
        let ir = from("mtcars")
            .filter(col("am").eq(lit(1)))
            .unwrap()
            .group_by(["cyl"])
            .aggregate(round(avg("mpg")), "avg_mpg")
            .select("cyl")
            .sort_by("avg_mpg", SortDirection::Desc)
            .limit(5)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            emit_default(&ir),
            "SELECT ROUND(AVG(\"mpg\")) AS \"avg_mpg\", \"cyl\" FROM \"mtcars\" WHERE \"am\" = 1 GROUP BY \"cyl\" ORDER BY \"avg_mpg\" DESC LIMIT 5"
        );
    }

    #[test]
    fn test_bracket_and_backtick_styles() {
        let ir = from("mtcars").select("hp").build().unwrap();
        let bracket = emit_sql(&ir, &GenerateOptions::with_quote_style(QuoteStyle::Bracket));
        assert_eq!(bracket, "SELECT [hp] FROM [mtcars]");
        let mysql = emit_sql(&ir, &GenerateOptions::for_database(&DatabaseType::MySQL));
        assert_eq!(mysql, "SELECT `hp` FROM `mtcars`");
    }

    #[test]
    fn test_integer_literals_stay_integers() {
        assert_eq!(render_expr(&col("am").eq(lit(1)), None), "am = 1");
        assert_eq!(render_expr(&col("am").eq(lit(1.0)), None), "am = 1.0");
        assert_eq!(render_expr(&lit(2.5), None), "2.5");
    }

    #[test]
    fn test_parenthesization_follows_precedence() {
        let e = (col("a") + col("b")) * col("c");
        assert_eq!(render_expr(&e, None), "(a + b) * c");
        let e = col("a") - (col("b") - col("c"));
        assert_eq!(render_expr(&e, None), "a - (b - c)");
        let e = (col("a") - col("b")) - col("c");
        assert_eq!(render_expr(&e, None), "a - b - c");
        let e = col("x").eq(lit(1)).or(col("y").eq(lit(2))).and(col("z"));
        assert_eq!(render_expr(&e, None), "(x = 1 OR y = 2) AND z");
        let e = !(col("x").or(col("y")));
        assert_eq!(render_expr(&e, None), "NOT (x OR y)");
        let e = !col("x").eq(lit(1));
        assert_eq!(render_expr(&e, None), "NOT x = 1");
    }

    #[test]
    fn test_negation_rendering() {
        assert_eq!(render_expr(&-col("hp"), None), "-hp");
        assert_eq!(render_expr(&-lit(1), None), "-(1)");
        assert_eq!(render_expr(&lit(-1), None), "-1");
        assert_eq!(render_expr(&-lit(-1), None), "-(-1)");
        assert_eq!(render_expr(&-(col("a") + col("b")), None), "-(a + b)");
        assert_eq!(render_expr(&(col("a") - lit(-1)), None), "a - -1");
    }

    #[test]
    fn test_function_rendering() {
        assert_eq!(render_expr(&round_to(avg("mpg"), 2), None), "ROUND(AVG(mpg), 2)");
        assert_eq!(render_expr(&round(sum("hp")), None), "ROUND(SUM(hp))");
        assert_eq!(render_expr(&count_all(), None), "COUNT(*)");
    }

    #[test]
    fn test_string_and_float_literals() {
        assert_eq!(render_expr(&lit("it's"), None), "'it''s'");
        assert_eq!(render_expr(&lit(f64::NAN), None), "NULL");
        assert_eq!(render_expr(&lit(true), None), "TRUE");
    }

    #[test]
    fn test_sort_column_shadowed_by_alias_is_qualified() {
        let ir = from("mtcars")
            .select_as("hp", "mpg")
            .select("mpg")
            .sort_by("mtcars.mpg", SortDirection::Asc)
            .sort_by("mpg", SortDirection::Desc)
            .build()
            .unwrap();
        assert_eq!(
            emit_default(&ir),
            "SELECT \"hp\" AS \"mpg\", \"mpg\" FROM \"mtcars\" ORDER BY \"mtcars\".\"mpg\" ASC, \"mpg\" DESC"
        );
    }

    #[test]
    fn test_sort_on_implicit_name_emits_the_expression() {
        let ir = from("mtcars").select(avg("mpg")).sort_by("AVG(mpg)", SortDirection::Desc).build().unwrap();
        assert_eq!(emit_default(&ir), "SELECT AVG(\"mpg\") FROM \"mtcars\" ORDER BY AVG(\"mpg\") DESC");
    }

    #[test]
    fn test_foreign_relation_stays_qualified() {
        let ir = from("mtcars").select("gears.ratio").select("mtcars.hp").build().unwrap();
        assert_eq!(emit_default(&ir), "SELECT \"gears\".\"ratio\", \"hp\" FROM \"mtcars\"");
    }
}
