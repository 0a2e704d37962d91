//! Parse tree produced by the parser before semantic resolution.
//! Keeps token positions so validation errors can point at the source.

use super::errors::Position;
use super::logical::{ColumnRef, Expr, SortDirection};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectAst {
    pub projection: Vec<SelectItemAst>,
    pub from: TableRefAst,
    pub selection: Option<ExprAst>,
    pub group_by: Vec<GroupKeyAst>,
    pub order_by: Vec<OrderByExprAst>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItemAst {
    pub expr: ExprAst,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRefAst {
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupKeyAst {
    pub column: ColumnRef,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExprAst {
    pub expr: ExprAst,
    pub direction: SortDirection,
}

/// An expression together with the position of its first token.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprAst {
    pub expr: Expr,
    pub position: Position,
}
