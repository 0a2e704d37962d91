//! Fluent construction of a [`QueryIr`].
//!
//! Every step borrows the builder and returns a new one, so prefixes can be
//! reused and branched freely:
//!
//! ```
//! use sqlchain::query_ast::builder::from;
//! use sqlchain::query_ast::logical::{avg, col, lit, round, SortDirection};
//!
//! let base = from("mtcars").filter(col("am").eq(lit(1))).unwrap();
//! let ir = base
//!     .group_by(["cyl"])
//!     .aggregate(round(avg("mpg")), "avg_mpg")
//!     .select("cyl")
//!     .sort_by("avg_mpg", SortDirection::Desc)
//!     .build()
//!     .unwrap();
//! assert_eq!(ir.output_names(), vec!["avg_mpg", "cyl"]);
//! ```

use log::debug;

use super::errors::BuildError;
use super::logical::{ColumnRef, Expr, QueryIr, RelationRef, SortDirection};
use super::validate::{self, Draft, Violation};

/// Start a chain over `relation`.
pub fn from(relation: impl Into<String>) -> QueryBuilder {
    QueryBuilder::new(relation)
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    source: RelationRef,
    projection: Vec<(Expr, Option<String>)>,
    filter: Option<Expr>,
    group_by: Vec<ColumnRef>,
    sort: Vec<(Expr, SortDirection)>,
    limit: Option<u64>,
}

impl QueryBuilder {
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            source: RelationRef::new(relation),
            projection: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            sort: Vec::new(),
            limit: None,
        }
    }

    /// AND-composes with any earlier filter. Expressions that can never be
    /// boolean (numeric/string literals, arithmetic, function calls) are rejected.
    pub fn filter(&self, predicate: impl Into<Expr>) -> Result<Self, BuildError> {
        let predicate = predicate.into();
        if !predicate.may_be_boolean() {
            return Err(BuildError::NonBooleanFilter { expr: predicate.to_string() });
        }
        let mut next = self.clone();
        next.filter = Some(match next.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        Ok(next)
    }

    /// Replaces the group keys. Compatibility with the projection is checked by `build`.
    pub fn group_by<I, C>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        let mut next = self.clone();
        next.group_by = columns.into_iter().map(Into::into).collect();
        next
    }

    pub fn aggregate(&self, expr: impl Into<Expr>, alias: impl Into<String>) -> Self {
        self.push_projection(expr.into(), Some(alias.into()))
    }

    pub fn select(&self, expr: impl Into<Expr>) -> Self {
        self.push_projection(expr.into(), None)
    }

    pub fn select_as(&self, expr: impl Into<Expr>, alias: impl Into<String>) -> Self {
        self.push_projection(expr.into(), Some(alias.into()))
    }

    /// Appends a sort key; earlier calls are the primary keys.
    /// A bare name binds to an output name (alias or implicit) when one matches.
    /// `"a.b"` is read as column `b` of relation `a`.
    pub fn sort_by(&self, target: impl Into<Expr>, direction: SortDirection) -> Self {
        let mut next = self.clone();
        next.sort.push((target.into(), direction));
        next
    }

    /// Like `sort_by` with a bare name, but the name is taken verbatim, dots included.
    pub fn sort_by_output(&self, name: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by(Expr::Column(ColumnRef::new(name)), direction)
    }

    pub fn limit(&self, n: i64) -> Result<Self, BuildError> {
        let limit = u64::try_from(n).map_err(|_| BuildError::InvalidLimit { value: n })?;
        let mut next = self.clone();
        next.limit = Some(limit);
        Ok(next)
    }

    pub fn build(&self) -> Result<QueryIr, BuildError> {
        let mut projection = self.projection.clone();
        if projection.is_empty() {
            projection.push((Expr::Wildcard, None));
        }
        let draft = Draft {
            source: self.source.clone(),
            projection,
            filter: self.filter.clone(),
            group_by: self.group_by.clone(),
            sort: self.sort.clone(),
            limit: self.limit,
        };
        let ir = validate::assemble(draft).map_err(|violation| match violation {
            Violation::MisplacedWildcard { item, .. } => BuildError::MisplacedWildcard { item },
            Violation::NonFiniteLiteral { item, .. } => BuildError::NonFiniteLiteral { item },
            Violation::NestedAggregate { item, .. } => BuildError::NestedAggregate { item },
            Violation::NotAggregated { index, item } => BuildError::ProjectionNotAggregated { index, item },
            Violation::UnboundSortKey { name, .. } => BuildError::UnboundSortKey { name },
        })?;
        debug!("built query over {} with {} projection item(s)", ir.source().name(), ir.projection().len());
        Ok(ir)
    }

    fn push_projection(&self, expr: Expr, alias: Option<String>) -> Self {
        let mut next = self.clone();
        next.projection.push((expr, alias));
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_ast::logical::{SortTarget, avg, col, count_all, lit, max, sum};

    #[test]
    fn test_steps_do_not_mutate_the_receiver() {
        let base = from("mtcars").select("mpg");
        let filtered = base.filter(col("am").eq(lit(1))).unwrap();
        assert!(base.build().unwrap().filter().is_none());
        assert!(filtered.build().unwrap().filter().is_some());
    }

    #[test]
    fn test_filters_compose_with_and() {
        let ir = from("mtcars")
            .filter(col("am").eq(lit(1)))
            .unwrap()
            .filter(col("hp").gt(lit(100)))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(ir.filter(), Some(&col("am").eq(lit(1)).and(col("hp").gt(lit(100)))));
    }

    #[test]
    fn test_non_boolean_filters_are_rejected() {
        let b = from("mtcars");
        assert!(matches!(b.filter(lit(1)), Err(BuildError::NonBooleanFilter { .. })));
        assert!(matches!(b.filter(lit("yes")), Err(BuildError::NonBooleanFilter { .. })));
        assert!(matches!(b.filter(col("a") + col("b")), Err(BuildError::NonBooleanFilter { .. })));
        assert!(matches!(b.filter(sum("hp")), Err(BuildError::NonBooleanFilter { .. })));
        assert!(b.filter(col("vs")).is_ok());
        assert!(b.filter(!col("vs")).is_ok());
    }

    #[test]
    fn test_group_by_replaces_keys() {
        let ir = from("mtcars")
            .group_by(["cyl"])
            .group_by(["gear", "am"])
            .select("gear")
            .select("am")
            .build()
            .unwrap();
        assert_eq!(ir.group_by(), &[ColumnRef::new("gear"), ColumnRef::new("am")]);
    }

    #[test]
    fn test_empty_projection_selects_everything() {
        let ir = from("mtcars").limit(3).unwrap().build().unwrap();
        assert_eq!(ir.projection().len(), 1);
        assert_eq!(ir.projection()[0].expr, Expr::Wildcard);
        assert!(ir.output_names().is_empty());
    }

    #[test]
    fn test_projection_not_aggregated() {
        let err = from("mtcars").group_by(["cyl"]).select("cyl").select("mpg").build().unwrap_err();
        assert_eq!(err, BuildError::ProjectionNotAggregated { index: 1, item: "mpg".into() });
    }

    #[test]
    fn test_nested_aggregate_rejected() {
        let err = from("mtcars").aggregate(max(avg("mpg")), "m").build().unwrap_err();
        assert!(matches!(err, BuildError::NestedAggregate { .. }));
    }

    #[test]
    fn test_unbound_sort_key_in_grouped_query() {
        let err = from("mtcars")
            .group_by(["cyl"])
            .select("cyl")
            .aggregate(count_all(), "n")
            .sort_by("mpg", SortDirection::Asc)
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::UnboundSortKey { name: "mpg".into() });
    }

    #[test]
    fn test_sort_binds_to_alias() {
        let ir = from("mtcars")
            .select_as(col("hp") / col("wt"), "ratio")
            .sort_by("ratio", SortDirection::Desc)
            .sort_by("mpg", SortDirection::Asc)
            .build()
            .unwrap();
        assert_eq!(ir.sort()[0].target, SortTarget::Output("ratio".into()));
        assert_eq!(ir.sort()[1].target, SortTarget::Expr(col("mpg")));
    }

    #[test]
    fn test_sort_binds_to_implicit_output_name() {
        let ir = from("mtcars")
            .group_by(["cyl"])
            .select("cyl")
            .select(avg("mpg"))
            .sort_by("AVG(mpg)", SortDirection::Desc)
            .build()
            .unwrap();
        assert_eq!(ir.sort()[0].target, SortTarget::Output("AVG(mpg)".into()));
    }

    #[test]
    fn test_grouped_sort_expression_must_be_aggregated() {
        let grouped = from("mtcars").group_by(["cyl"]).select("cyl");
        let err = grouped.sort_by(col("mpg") + lit(1), SortDirection::Asc).build().unwrap_err();
        assert_eq!(err, BuildError::UnboundSortKey { name: "mpg + 1".into() });
        assert!(grouped.sort_by(sum("hp") + lit(1), SortDirection::Asc).build().is_ok());
    }

    #[test]
    fn test_qualified_sort_key_skips_aliases() {
        let ir = from("mtcars")
            .select_as("hp", "mpg")
            .select("mpg")
            .sort_by("mtcars.mpg", SortDirection::Asc)
            .build()
            .unwrap();
        assert_eq!(ir.sort()[0].target, SortTarget::Expr(col("mpg")));
    }

    #[test]
    fn test_sort_by_output_keeps_dotted_names() {
        let b = from("mtcars").select_as(col("hp"), "a.b");
        let ir = b.sort_by_output("a.b", SortDirection::Asc).build().unwrap();
        assert_eq!(ir.sort()[0].target, SortTarget::Output("a.b".into()));
        let ir = b.sort_by("a.b", SortDirection::Asc).build().unwrap();
        assert_eq!(ir.sort()[0].target, SortTarget::Expr(col("a.b")));
    }

    #[test]
    fn test_wildcard_placement() {
        let b = from("mtcars");
        let err = b.aggregate(sum(Expr::Wildcard), "s").build().unwrap_err();
        assert_eq!(err, BuildError::MisplacedWildcard { item: "SUM(*)".into() });
        assert!(matches!(b.select(Expr::Wildcard + lit(1)).build(), Err(BuildError::MisplacedWildcard { .. })));
        let filtered = b.filter(Expr::Wildcard.eq(lit(1))).unwrap();
        assert!(matches!(filtered.build(), Err(BuildError::MisplacedWildcard { .. })));
        assert!(matches!(
            b.select("mpg").sort_by(Expr::Wildcard, SortDirection::Asc).build(),
            Err(BuildError::MisplacedWildcard { .. })
        ));
        assert!(b.aggregate(count_all(), "n").build().is_ok());
        assert!(b.select(Expr::Wildcard).select("mpg").build().is_ok());
    }

    #[test]
    fn test_non_finite_literal_rejected() {
        let err = from("mtcars").filter(col("mpg").gt(lit(f64::NAN))).unwrap().build().unwrap_err();
        assert!(matches!(err, BuildError::NonFiniteLiteral { .. }));
    }

    #[test]
    fn test_negative_limit_rejected() {
        let b = from("mtcars").select("mpg").limit(10).unwrap();
        let before = b.clone();
        assert_eq!(b.limit(-1).unwrap_err(), BuildError::InvalidLimit { value: -1 });
        assert_eq!(b, before);
        assert_eq!(b.build().unwrap().limit(), Some(10));
        assert_eq!(from("t").limit(0).unwrap().build().unwrap().limit(), Some(0));
    }
}
