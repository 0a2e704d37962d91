//! Query IR shared by the parser, the builder and the emitter.
//!
//! A `QueryIr` is only ever produced whole (by `parser::parse_query` or
//! `QueryBuilder::build`) and cannot be mutated afterwards.

use std::fmt;
use std::ops;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationRef {
    name: String,
}

impl RelationRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub relation: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { relation: None, name: name.into() }
    }

    pub fn qualified(relation: impl Into<String>, name: impl Into<String>) -> Self {
        Self { relation: Some(relation.into()), name: name.into() }
    }

    /// Drops the qualifier when it names the query's own source.
    pub(crate) fn resolved_against(mut self, source: &RelationRef) -> Self {
        if self.relation.as_deref() == Some(source.name()) {
            self.relation = None;
        }
        self
    }
}

/// `"cyl"` is unqualified, `"mtcars.cyl"` is qualified: the text is split on
/// its first `.`. A name that itself contains a dot needs [`ColumnRef::new`]
/// (or `QueryBuilder::sort_by_output` when it names an output column).
impl From<&str> for ColumnRef {
    fn from(s: &str) -> Self {
        match s.split_once('.') {
            Some((relation, name)) => ColumnRef::qualified(relation, name),
            None => ColumnRef::new(s),
        }
    }
}

impl From<String> for ColumnRef {
    fn from(s: String) -> Self {
        ColumnRef::from(s.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Integer(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Integer(v.into())
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Boolean(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::String(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::String(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

// Precedences, ordered low to high.
pub(crate) const PREC_OR: u8 = 10;
pub(crate) const PREC_AND: u8 = 20;
pub(crate) const PREC_NOT: u8 = 30;
pub(crate) const PREC_COMPARISON: u8 = 50;
pub(crate) const PREC_ADD_SUB: u8 = 80;
pub(crate) const PREC_MUL_DIV: u8 = 90;
pub(crate) const PREC_UNARY_MINUS: u8 = 100;
pub(crate) const PREC_ATOM: u8 = u8::MAX;

impl BinaryOp {
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => PREC_OR,
            BinaryOp::And => PREC_AND,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq => PREC_COMPARISON,
            BinaryOp::Plus | BinaryOp::Minus => PREC_ADD_SUB,
            BinaryOp::Multiply | BinaryOp::Divide => PREC_MUL_DIV,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        self.precedence() >= PREC_ADD_SUB
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunc {
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Literal),
    /// `*`, either a whole projection item or the argument of `COUNT`.
    Wildcard,
    Unary { op: UnaryOp, expr: Box<Expr> },
    Binary { left: Box<Expr>, op: BinaryOp, right: Box<Expr> },
    Aggregate { func: AggregateFunc, arg: Box<Expr> },
    /// `precision` is `None` unless the source spelled it out.
    Round { arg: Box<Expr>, precision: Option<i64> },
}

impl Expr {
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Expr::Aggregate { .. })
    }

    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Column(_) | Expr::Literal(_) | Expr::Wildcard => false,
            Expr::Unary { expr, .. } => expr.contains_aggregate(),
            Expr::Binary { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expr::Round { arg, .. } => arg.contains_aggregate(),
        }
    }

    /// Best-effort static check used by `QueryBuilder::filter`.
    pub fn may_be_boolean(&self) -> bool {
        match self {
            Expr::Column(_) => true,
            Expr::Literal(Literal::Boolean(_) | Literal::Null) => true,
            Expr::Literal(_) | Expr::Wildcard => false,
            Expr::Unary { op, .. } => *op == UnaryOp::Not,
            Expr::Binary { op, .. } => !op.is_arithmetic(),
            Expr::Aggregate { .. } | Expr::Round { .. } => false,
        }
    }

    /// Precedence of the root node, used to decide where parentheses go.
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { op: UnaryOp::Not, .. } => PREC_NOT,
            Expr::Unary { op: UnaryOp::Neg, .. } => PREC_UNARY_MINUS,
            _ => PREC_ATOM,
        }
    }

    pub(crate) fn resolved_against(self, source: &RelationRef) -> Expr {
        self.map_columns(&|c| c.resolved_against(source))
    }

    /// Rebuild the tree with every column reference passed through `f`.
    pub(crate) fn map_columns(self, f: &impl Fn(ColumnRef) -> ColumnRef) -> Expr {
        match self {
            Expr::Column(c) => Expr::Column(f(c)),
            Expr::Literal(_) | Expr::Wildcard => self,
            Expr::Unary { op, expr } => Expr::Unary { op, expr: Box::new(expr.map_columns(f)) },
            Expr::Binary { left, op, right } => Expr::Binary {
                left: Box::new(left.map_columns(f)),
                op,
                right: Box::new(right.map_columns(f)),
            },
            Expr::Aggregate { func, arg } => Expr::Aggregate { func, arg: Box::new(arg.map_columns(f)) },
            Expr::Round { arg, precision } => Expr::Round { arg: Box::new(arg.map_columns(f)), precision },
        }
    }

    fn binary(self, op: BinaryOp, rhs: Expr) -> Expr {
        Expr::Binary { left: Box::new(self), op, right: Box::new(rhs) }
    }

    pub fn eq(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Eq, rhs)
    }

    pub fn not_eq(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::NotEq, rhs)
    }

    pub fn lt(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Lt, rhs)
    }

    pub fn lt_eq(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::LtEq, rhs)
    }

    pub fn gt(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Gt, rhs)
    }

    pub fn gt_eq(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::GtEq, rhs)
    }

    pub fn and(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::And, rhs)
    }

    pub fn or(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Or, rhs)
    }
}

/// Canonical unquoted rendering; doubles as the implicit output name.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::emitter::render_expr(self, None))
    }
}

/// A bare string names a column, as in `select("cyl")` or `avg("mpg")`.
impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::Column(ColumnRef::from(name))
    }
}

impl From<ColumnRef> for Expr {
    fn from(c: ColumnRef) -> Self {
        Expr::Column(c)
    }
}

impl From<Literal> for Expr {
    fn from(l: Literal) -> Self {
        Expr::Literal(l)
    }
}

impl ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Plus, rhs)
    }
}

impl ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Minus, rhs)
    }
}

impl ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Multiply, rhs)
    }
}

impl ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Divide, rhs)
    }
}

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Unary { op: UnaryOp::Neg, expr: Box::new(self) }
    }
}

impl ops::Not for Expr {
    type Output = Expr;
    fn not(self) -> Expr {
        Expr::Unary { op: UnaryOp::Not, expr: Box::new(self) }
    }
}

pub fn col(name: impl Into<ColumnRef>) -> Expr {
    Expr::Column(name.into())
}

pub fn lit(value: impl Into<Literal>) -> Expr {
    Expr::Literal(value.into())
}

fn aggregate(func: AggregateFunc, arg: impl Into<Expr>) -> Expr {
    Expr::Aggregate { func, arg: Box::new(arg.into()) }
}

pub fn count(arg: impl Into<Expr>) -> Expr {
    aggregate(AggregateFunc::Count, arg)
}

/// `COUNT(*)`
pub fn count_all() -> Expr {
    aggregate(AggregateFunc::Count, Expr::Wildcard)
}

pub fn sum(arg: impl Into<Expr>) -> Expr {
    aggregate(AggregateFunc::Sum, arg)
}

pub fn avg(arg: impl Into<Expr>) -> Expr {
    aggregate(AggregateFunc::Avg, arg)
}

pub fn min(arg: impl Into<Expr>) -> Expr {
    aggregate(AggregateFunc::Min, arg)
}

pub fn max(arg: impl Into<Expr>) -> Expr {
    aggregate(AggregateFunc::Max, arg)
}

pub fn round(arg: impl Into<Expr>) -> Expr {
    Expr::Round { arg: Box::new(arg.into()), precision: None }
}

pub fn round_to(arg: impl Into<Expr>, precision: i64) -> Expr {
    Expr::Round { arg: Box::new(arg.into()), precision: Some(precision) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl ProjectionItem {
    /// An alias that merely repeats a non-aggregate expression is dropped.
    pub(crate) fn new(expr: Expr, alias: Option<String>) -> Self {
        let alias = alias.filter(|a| expr.contains_aggregate() || *a != expr.to_string());
        Self { expr, alias }
    }

    /// Alias when present, canonical rendering otherwise.
    pub fn output_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.expr.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SortTarget {
    /// Bound to a projection entry by alias or implicit output name.
    Output(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub target: SortTarget,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryIr {
    source: RelationRef,
    projection: Vec<ProjectionItem>,
    filter: Option<Expr>,
    group_by: Vec<ColumnRef>,
    sort: Vec<SortKey>,
    limit: Option<u64>,
}

impl QueryIr {
    /// Callers are responsible for having validated the parts (see `validate`).
    pub(crate) fn from_parts(
        source: RelationRef,
        projection: Vec<ProjectionItem>,
        filter: Option<Expr>,
        group_by: Vec<ColumnRef>,
        sort: Vec<SortKey>,
        limit: Option<u64>,
    ) -> Self {
        Self { source, projection, filter, group_by, sort, limit }
    }

    pub fn source(&self) -> &RelationRef {
        &self.source
    }

    pub fn projection(&self) -> &[ProjectionItem] {
        &self.projection
    }

    pub fn filter(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }

    pub fn group_by(&self) -> &[ColumnRef] {
        &self.group_by
    }

    pub fn sort(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
    }

    /// Output column names, or empty when the projection contains `*` (unknown until runtime).
    pub fn output_names(&self) -> Vec<String> {
        if self.projection.iter().any(|p| p.expr == Expr::Wildcard) {
            return Vec::new();
        }
        self.projection.iter().map(ProjectionItem::output_name).collect()
    }

    /// Projection entry an `Output` sort target refers to; aliases win over implicit names.
    pub fn output_item(&self, name: &str) -> Option<&ProjectionItem> {
        find_output(&self.projection, name)
    }

    pub(crate) fn with_limit(&self, limit: Option<u64>) -> QueryIr {
        QueryIr { limit, ..self.clone() }
    }
}

pub(crate) fn find_output<'a>(projection: &'a [ProjectionItem], name: &str) -> Option<&'a ProjectionItem> {
    projection
        .iter()
        .find(|p| p.alias.as_deref() == Some(name))
        .or_else(|| projection.iter().find(|p| p.alias.is_none() && p.expr.to_string() == name))
}
