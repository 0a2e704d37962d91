//! Semantic checks shared by the parser and the builder, so both sides
//! accept exactly the same set of queries.

use super::logical::{
    AggregateFunc, ColumnRef, Expr, Literal, ProjectionItem, QueryIr, RelationRef, SortDirection, SortKey,
    SortTarget, find_output,
};

/// Query parts as collected by the parser or the builder, not yet checked.
#[derive(Debug, Clone)]
pub(crate) struct Draft {
    pub source: RelationRef,
    pub projection: Vec<(Expr, Option<String>)>,
    pub filter: Option<Expr>,
    pub group_by: Vec<ColumnRef>,
    pub sort: Vec<(Expr, SortDirection)>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Site {
    Projection(usize),
    Filter,
    Sort(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Violation {
    MisplacedWildcard { site: Site, item: String },
    NonFiniteLiteral { site: Site, item: String },
    NestedAggregate { site: Site, item: String },
    NotAggregated { index: usize, item: String },
    UnboundSortKey { index: usize, name: String },
}

/// Resolve qualifiers, enforce invariants and bind sort keys. First violation wins.
pub(crate) fn assemble(draft: Draft) -> Result<QueryIr, Violation> {
    let Draft { source, projection, filter, group_by, sort, limit } = draft;

    let projection: Vec<ProjectionItem> = projection
        .into_iter()
        .map(|(expr, alias)| ProjectionItem::new(expr.resolved_against(&source), alias))
        .collect();
    let filter = filter.map(|f| f.resolved_against(&source));
    let group_by: Vec<ColumnRef> = group_by.into_iter().map(|c| c.resolved_against(&source)).collect();
    // Only a key written as a bare name may refer to an output name.
    let sort: Vec<(Expr, Option<String>, SortDirection)> = sort
        .into_iter()
        .map(|(e, d)| {
            let bare = match &e {
                Expr::Column(ColumnRef { relation: None, name }) => Some(name.clone()),
                _ => None,
            };
            (e.resolved_against(&source), bare, d)
        })
        .collect();

    let sites = projection
        .iter()
        .enumerate()
        .map(|(i, p)| (Site::Projection(i), &p.expr))
        .chain(filter.iter().map(|f| (Site::Filter, f)))
        .chain(sort.iter().enumerate().map(|(i, (e, _, _))| (Site::Sort(i), e)));
    for (site, expr) in sites {
        let whole_item_star = matches!(site, Site::Projection(_)) && *expr == Expr::Wildcard;
        if !whole_item_star && has_misplaced_wildcard(expr) {
            return Err(Violation::MisplacedWildcard { site, item: expr.to_string() });
        }
        if has_non_finite_literal(expr) {
            return Err(Violation::NonFiniteLiteral { site, item: expr.to_string() });
        }
        if has_nested_aggregate(expr) {
            return Err(Violation::NestedAggregate { site, item: expr.to_string() });
        }
    }

    if !group_by.is_empty() {
        for (index, item) in projection.iter().enumerate() {
            if !is_grouped_valid(&item.expr, &group_by) {
                return Err(Violation::NotAggregated { index, item: item.output_name() });
            }
        }
    }

    let mut keys = Vec::with_capacity(sort.len());
    for (index, (expr, bare, direction)) in sort.into_iter().enumerate() {
        let target = resolve_sort_target(expr, bare.as_deref(), &projection, &group_by)
            .map_err(|name| Violation::UnboundSortKey { index, name })?;
        keys.push(SortKey { target, direction });
    }

    Ok(QueryIr::from_parts(source, projection, filter, group_by, keys, limit))
}

/// `*` is only meaningful as a whole SELECT item or as `COUNT(*)`; the
/// caller handles the first case.
pub(crate) fn has_misplaced_wildcard(expr: &Expr) -> bool {
    match expr {
        Expr::Wildcard => true,
        Expr::Aggregate { func: AggregateFunc::Count, arg } if **arg == Expr::Wildcard => false,
        Expr::Column(_) | Expr::Literal(_) => false,
        Expr::Unary { expr, .. } => has_misplaced_wildcard(expr),
        Expr::Binary { left, right, .. } => has_misplaced_wildcard(left) || has_misplaced_wildcard(right),
        Expr::Aggregate { arg, .. } | Expr::Round { arg, .. } => has_misplaced_wildcard(arg),
    }
}

fn has_non_finite_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(Literal::Float(f)) => !f.is_finite(),
        Expr::Column(_) | Expr::Literal(_) | Expr::Wildcard => false,
        Expr::Unary { expr, .. } => has_non_finite_literal(expr),
        Expr::Binary { left, right, .. } => has_non_finite_literal(left) || has_non_finite_literal(right),
        Expr::Aggregate { arg, .. } | Expr::Round { arg, .. } => has_non_finite_literal(arg),
    }
}

/// True when an aggregate call appears anywhere inside another aggregate's argument.
pub(crate) fn has_nested_aggregate(expr: &Expr) -> bool {
    match expr {
        Expr::Aggregate { arg, .. } => arg.contains_aggregate(),
        Expr::Column(_) | Expr::Literal(_) | Expr::Wildcard => false,
        Expr::Unary { expr, .. } => has_nested_aggregate(expr),
        Expr::Binary { left, right, .. } => has_nested_aggregate(left) || has_nested_aggregate(right),
        Expr::Round { arg, .. } => has_nested_aggregate(arg),
    }
}

/// A grouped projection may combine group keys, literals and aggregates, nothing else.
pub(crate) fn is_grouped_valid(expr: &Expr, group_by: &[ColumnRef]) -> bool {
    match expr {
        Expr::Column(c) => group_by.contains(c),
        Expr::Literal(_) | Expr::Aggregate { .. } => true,
        Expr::Wildcard => false,
        Expr::Unary { expr, .. } => is_grouped_valid(expr, group_by),
        Expr::Binary { left, right, .. } => {
            is_grouped_valid(left, group_by) && is_grouped_valid(right, group_by)
        }
        Expr::Round { arg, .. } => is_grouped_valid(arg, group_by),
    }
}

/// A bare name binds to an output name (alias first, then implicit name).
/// Otherwise a key equal to a projected expression binds to that item when
/// its output name leads back to it, else the expression is kept as is.
/// `Err` carries the rendering of a key a grouped query cannot order by.
pub(crate) fn resolve_sort_target(
    expr: Expr,
    bare: Option<&str>,
    projection: &[ProjectionItem],
    group_by: &[ColumnRef],
) -> Result<SortTarget, String> {
    if let Some(name) = bare
        && find_output(projection, name).is_some()
    {
        return Ok(SortTarget::Output(name.to_string()));
    }
    if let Some(item) = projection.iter().find(|p| p.expr == expr) {
        let name = item.output_name();
        if find_output(projection, &name).is_some_and(|owner| std::ptr::eq(owner, item)) {
            return Ok(SortTarget::Output(name));
        }
    }
    if !group_by.is_empty() && !is_grouped_valid(&expr, group_by) {
        return Err(expr.to_string());
    }
    Ok(SortTarget::Expr(expr))
}
