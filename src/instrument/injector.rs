use serde::Serialize;

use super::provenance::{
    TokenSource, contains_aggregate, contains_window, is_aggregating, tokens_expr, trace_id_expr,
};
use crate::ast::{
    ColumnExpr, Distinct, Expr, From, FromItem, FromSubqueryExpr, GroupBy, GroupByExpr, Identifier,
    OrderBy, QueryExpr, Select, SelectColExpr, SelectExpr, SelectQueryExpr, SetQueryOperator,
    Statement, TableAlias, With,
};
use crate::vocabulary::{PARENT_TRACE_COLUMN, TRACE_COLUMN, is_reserved_column};

/// Alias of the derived table a deduplicating query is moved into before it
/// is grouped.
const GROUPED_ROWS_ALIAS: &str = "_distinct_rows";

/// A table reference found in a rewritten statement, with the alias its
/// tokens are emitted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceBinding {
    pub alias: String,
    pub relation: Vec<String>,
}

impl SourceBinding {
    /// Whether the reference points at `schema.table`. Unqualified references
    /// match any schema.
    pub fn refers_to(&self, schema: &str, table: &str) -> bool {
        let mut parts = self.relation.iter().rev();
        let Some(name) = parts.next() else {
            return false;
        };
        name.eq_ignore_ascii_case(table)
            && parts
                .next()
                .is_none_or(|relation_schema| relation_schema.eq_ignore_ascii_case(schema))
    }
}

/// Reserved columns a query exposes, as `(position, name)` insertions made
/// into its output list.
#[derive(Debug, Clone, Default)]
struct Exposure {
    injected: Vec<(usize, &'static str)>,
    exposes_tokens: bool,
}

#[derive(Debug, Clone)]
struct CteObject {
    name: Identifier,
    exposure: Exposure,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct InjectOptions {
    /// Add the reserved columns to `EXCLUDE` lists of stars over instrumented
    /// sources, so the output does not carry them twice.
    pub exclude_reserved_from_stars: bool,
}

/// Walks a statement innermost-first and adds the reserved columns to every
/// block that produces a relation.
#[derive(Debug, Default)]
pub(crate) struct Injector {
    options: InjectOptions,
    stack: Vec<Vec<CteObject>>,
    bindings: Vec<SourceBinding>,
    changed: bool,
    unsupported: Option<String>,
}

fn same_name(left: &Identifier, right: &Identifier) -> bool {
    if left.quoted || right.quoted {
        left.value == right.value
    } else {
        left.value.eq_ignore_ascii_case(&right.value)
    }
}

fn is_reserved_expr(select_expr: &SelectExpr, name: &str) -> bool {
    match select_expr {
        SelectExpr::Col(col) => match (&col.alias, &col.expr) {
            (Some(alias), _) => alias.matches(name),
            (None, Expr::Column(column)) => column.name().is_some_and(|last| last.matches(name)),
            _ => false,
        },
        SelectExpr::ColAll(_) | SelectExpr::All(_) => false,
    }
}

fn reserved_column(expr: Expr, name: &str) -> SelectExpr {
    SelectExpr::Col(SelectColExpr {
        expr,
        alias: Some(Identifier::new(name)),
    })
}

/// Inserts the reserved names into a column list that renames the output of
/// a query with the given exposure.
fn extend_column_list(columns: &mut Vec<Identifier>, exposure: &Exposure) -> bool {
    let mut changed = false;
    for (pos, name) in &exposure.injected {
        if columns.iter().any(|column| column.matches(name)) {
            continue;
        }
        columns.insert(std::cmp::min(*pos, columns.len()), Identifier::new(name));
        changed = true;
    }
    changed
}

fn shift_ordinal(expr: &mut Expr, injected: &[(usize, &'static str)]) {
    let Expr::Number(number) = expr else {
        return;
    };
    let Ok(mut ordinal) = number.parse::<usize>() else {
        return;
    };
    if ordinal == 0 {
        return;
    }
    for (pos, _) in injected {
        if ordinal > *pos {
            ordinal += 1;
        }
    }
    *number = ordinal.to_string();
}

fn shift_order_by(order_by: &mut Option<OrderBy>, injected: &[(usize, &'static str)]) {
    if injected.is_empty() {
        return;
    }
    if let Some(order_by) = order_by {
        for order_by_expr in order_by.exprs.iter_mut() {
            shift_ordinal(&mut order_by_expr.expr, injected);
        }
    }
}

fn is_instrumented(select: &Select) -> bool {
    let has = |name| {
        select
            .exprs
            .iter()
            .any(|select_expr| is_reserved_expr(select_expr, name))
    };
    has(TRACE_COLUMN) && has(PARENT_TRACE_COLUMN)
}

/// Whether `SELECT DISTINCT` can be turned into a plain `GROUP BY` over its
/// own outputs.
fn distinct_is_groupable(select: &Select) -> bool {
    select.group_by.is_none()
        && select.exprs.iter().all(|select_expr| match select_expr {
            SelectExpr::Col(col) => !contains_aggregate(&col.expr) && !contains_window(&col.expr),
            SelectExpr::ColAll(_) | SelectExpr::All(_) => false,
        })
}

/// Names of the columns a select list produces.
fn output_names(exprs: &[SelectExpr]) -> Result<Vec<Identifier>, String> {
    let mut names: Vec<Identifier> = vec![];
    for select_expr in exprs {
        let name = match select_expr {
            SelectExpr::Col(SelectColExpr {
                alias: Some(alias), ..
            }) => alias.clone(),
            SelectExpr::Col(SelectColExpr {
                expr: Expr::Column(column),
                alias: None,
            }) => match column.name() {
                Some(name) => name.clone(),
                None => return Err("an output column has no name".to_owned()),
            },
            SelectExpr::Col(_) => return Err("an output expression has no alias".to_owned()),
            SelectExpr::ColAll(_) | SelectExpr::All(_) => {
                return Err("star outputs cannot be listed".to_owned());
            }
        };
        if is_reserved_column(&name.value) {
            return Err(format!("`{}` is already an output", name.value));
        }
        if names.iter().any(|other| same_name(other, &name)) {
            return Err(format!("`{}` is output twice", name.value));
        }
        names.push(name);
    }
    Ok(names)
}

fn query_output_names(query: &QueryExpr) -> Result<Vec<Identifier>, String> {
    match query {
        QueryExpr::Grouping(grouping) => query_output_names(&grouping.query),
        QueryExpr::Select(select_query) => output_names(&select_query.select.exprs),
        QueryExpr::SetSelect(set_select) => query_output_names(&set_select.left_query),
        QueryExpr::Values(_) => Err("VALUES columns have no names".to_owned()),
    }
}

/// Rewrites `ORDER BY` terms so they still resolve once the query is grouped
/// over a derived table whose columns are `names`. Terms repeating an output
/// expression become its ordinal.
fn order_by_over_grouped(
    order_by: &mut Option<OrderBy>,
    names: &[Identifier],
    exprs: &[SelectExpr],
) -> Result<(), String> {
    let Some(order_by) = order_by else {
        return Ok(());
    };
    for order_by_expr in order_by.exprs.iter_mut() {
        match &order_by_expr.expr {
            Expr::Number(_) => continue,
            Expr::Column(column)
                if column.parts.len() == 1
                    && names.iter().any(|name| same_name(name, &column.parts[0])) =>
            {
                continue;
            }
            _ => {}
        }
        let expr = format!("{:?}", order_by_expr.expr);
        let pos = exprs.iter().position(|select_expr| match select_expr {
            SelectExpr::Col(col) => format!("{:?}", col.expr) == expr,
            SelectExpr::ColAll(_) | SelectExpr::All(_) => false,
        });
        match pos {
            Some(pos) => order_by_expr.expr = Expr::Number((pos + 1).to_string()),
            None => return Err("an ORDER BY term is not an output column".to_owned()),
        }
    }
    Ok(())
}

// SELECT _distinct_rows.a, _distinct_rows.b FROM (<query>) AS _distinct_rows GROUP BY 1, 2
fn grouped_over(names: &[Identifier], query: QueryExpr) -> Select {
    let alias = Identifier::new(GROUPED_ROWS_ALIAS);
    Select {
        distinct: None,
        exprs: names
            .iter()
            .map(|name| {
                SelectExpr::Col(SelectColExpr {
                    expr: Expr::Column(ColumnExpr {
                        parts: vec![alias.clone(), name.clone()],
                    }),
                    alias: None,
                })
            })
            .collect(),
        from: Some(From {
            source: FromItem::Subquery(FromSubqueryExpr {
                lateral: false,
                query: Box::new(query),
                alias: Some(TableAlias {
                    name: alias,
                    columns: None,
                }),
            }),
            joins: vec![],
        }),
        r#where: None,
        group_by: Some(GroupBy {
            expr: GroupByExpr::Items(
                (1..=names.len())
                    .map(|ordinal| Expr::Number(ordinal.to_string()))
                    .collect(),
            ),
        }),
        having: None,
        qualify: None,
        window: None,
    }
}

impl Injector {
    pub(crate) fn new(options: InjectOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub(crate) fn changed(&self) -> bool {
        self.changed
    }

    /// Why the statement cannot carry lineage without changing its result,
    /// if it cannot.
    pub(crate) fn unsupported(&self) -> Option<&str> {
        self.unsupported.as_deref()
    }

    pub(crate) fn into_bindings(self) -> Vec<SourceBinding> {
        self.bindings
    }

    fn mark_unsupported(&mut self, reason: String) {
        if self.unsupported.is_none() {
            self.unsupported = Some(reason);
        }
    }

    // SELECT DISTINCT <outputs> ...  ->  SELECT <outputs> FROM (SELECT <outputs> ...) GROUP BY <outputs>
    fn wrap_distinct(&mut self, select_query: &mut SelectQueryExpr) {
        let names = match output_names(&select_query.select.exprs) {
            Ok(names) => names,
            Err(reason) => {
                self.mark_unsupported(format!("SELECT DISTINCT where {}", reason));
                return;
            }
        };
        if let Err(reason) = order_by_over_grouped(
            &mut select_query.order_by,
            &names,
            &select_query.select.exprs,
        ) {
            self.mark_unsupported(format!("SELECT DISTINCT where {}", reason));
            return;
        }
        let mut inner = select_query.select.clone();
        inner.distinct = None;
        select_query.select = grouped_over(
            &names,
            QueryExpr::Select(SelectQueryExpr {
                with: None,
                select: inner,
                order_by: None,
                limit: None,
            }),
        );
    }

    // a UNION b  ->  SELECT <outputs> FROM (a UNION ALL b) GROUP BY <outputs>
    fn wrap_union(&mut self, query: &mut QueryExpr) {
        let names = match query_output_names(query) {
            Ok(names) => names,
            Err(reason) => {
                self.mark_unsupported(format!("UNION where {}", reason));
                return;
            }
        };
        let QueryExpr::SetSelect(set_select) = query else {
            return;
        };
        if let Err(reason) = order_by_over_grouped(&mut set_select.order_by, &names, &[]) {
            self.mark_unsupported(format!("UNION where {}", reason));
            return;
        }
        let with = set_select.with.take();
        let order_by = set_select.order_by.take();
        let limit = set_select.limit.take();
        set_select.set_operator = SetQueryOperator::UnionAll;
        let inner = query.clone();
        *query = QueryExpr::Select(SelectQueryExpr {
            with,
            select: grouped_over(&names, inner),
            order_by,
            limit,
        });
    }

    pub(crate) fn statement(&mut self, statement: &mut Statement) {
        match statement {
            Statement::Query(query_statement) => {
                self.query_expr(&mut query_statement.query);
            }
            Statement::Insert(insert) => {
                let exposure = self.query_expr(&mut insert.query);
                if let Some(columns) = &mut insert.columns {
                    self.changed |= extend_column_list(columns, &exposure);
                }
            }
            Statement::CreateAs(create) => {
                self.query_expr(&mut create.query);
            }
            Statement::Raw(_) => {}
        }
    }

    fn push_ctx(&mut self) {
        self.stack.push(vec![]);
    }

    fn pop_ctx(&mut self) {
        self.stack.pop();
    }

    fn get_cte(&self, name: &Identifier) -> Option<&CteObject> {
        self.stack
            .iter()
            .rev()
            .flat_map(|ctes| ctes.iter().rev())
            .find(|cte| same_name(&cte.name, name))
    }

    fn with_inj(&mut self, with: &mut With) {
        if with.recursive {
            // A recursive body reads its own rows, which will expose tokens
            // unless they come from VALUES.
            for cte in &with.ctes {
                let exposes_tokens = !matches!(cte.query, QueryExpr::Values(_));
                let exposure = Exposure {
                    injected: vec![],
                    exposes_tokens,
                };
                if let Some(ctx) = self.stack.last_mut() {
                    ctx.push(CteObject {
                        name: cte.name.clone(),
                        exposure,
                    });
                }
            }
        }
        for cte in with.ctes.iter_mut() {
            let exposure = self.query_expr(&mut cte.query);
            if let Some(columns) = &mut cte.columns {
                self.changed |= extend_column_list(columns, &exposure);
            }
            if let Some(ctx) = self.stack.last_mut() {
                ctx.push(CteObject {
                    name: cte.name.clone(),
                    exposure,
                });
            }
        }
    }

    fn query_expr(&mut self, query: &mut QueryExpr) -> Exposure {
        let set_operator = match query {
            QueryExpr::SetSelect(set_select) => Some(set_select.set_operator),
            _ => None,
        };
        match set_operator {
            Some(SetQueryOperator::Union) => self.wrap_union(query),
            // Both compare whole rows, trace columns included
            Some(
                SetQueryOperator::Intersect
                | SetQueryOperator::IntersectAll
                | SetQueryOperator::Except
                | SetQueryOperator::ExceptAll,
            ) => {
                self.mark_unsupported("INTERSECT and EXCEPT compare trace columns".to_owned());
            }
            Some(SetQueryOperator::UnionAll) | None => {}
        }

        self.push_ctx();
        let exposure = match query {
            QueryExpr::Grouping(grouping) => {
                if let Some(with) = &mut grouping.with {
                    self.with_inj(with);
                }
                let exposure = self.query_expr(&mut grouping.query);
                shift_order_by(&mut grouping.order_by, &exposure.injected);
                exposure
            }
            QueryExpr::Select(select_query) => {
                if let Some(with) = &mut select_query.with {
                    self.with_inj(with);
                }
                let select = &select_query.select;
                if matches!(select.distinct, Some(Distinct::Distinct))
                    && !is_instrumented(select)
                    && !distinct_is_groupable(select)
                {
                    self.wrap_distinct(select_query);
                }
                self.select_inj(&mut select_query.select, &mut select_query.order_by)
            }
            QueryExpr::SetSelect(set_select) => {
                if let Some(with) = &mut set_select.with {
                    self.with_inj(with);
                }
                let left = self.query_expr(&mut set_select.left_query);
                let right = self.query_expr(&mut set_select.right_query);
                shift_order_by(&mut set_select.order_by, &left.injected);
                Exposure {
                    injected: left.injected,
                    exposes_tokens: left.exposes_tokens && right.exposes_tokens,
                }
            }
            QueryExpr::Values(values) => {
                if let Some(with) = &mut values.with {
                    self.with_inj(with);
                }
                Exposure::default()
            }
        };
        self.pop_ctx();
        exposure
    }

    fn from_inj(&mut self, from: &mut From, sources: &mut Vec<TokenSource>) {
        self.from_item_inj(&mut from.source, sources);
        for join in from.joins.iter_mut() {
            self.from_item_inj(&mut join.item, sources);
        }
    }

    fn from_item_inj(&mut self, item: &mut FromItem, sources: &mut Vec<TokenSource>) {
        match item {
            FromItem::Table(table) => {
                let Some(name) = table.path.last() else {
                    return;
                };
                let alias = table
                    .alias
                    .as_ref()
                    .map(|alias| alias.name.clone())
                    .unwrap_or_else(|| name.clone());

                let cte = if table.path.len() == 1 {
                    self.get_cte(name).cloned()
                } else {
                    None
                };
                if let Some(cte) = cte {
                    if let Some(TableAlias {
                        columns: Some(columns),
                        ..
                    }) = &mut table.alias
                    {
                        self.changed |= extend_column_list(columns, &cte.exposure);
                    }
                    if cte.exposure.exposes_tokens {
                        sources.push(TokenSource::Derived(alias));
                    }
                    return;
                }

                if table
                    .alias
                    .as_ref()
                    .is_some_and(|alias| alias.columns.is_some())
                {
                    log::debug!(
                        "Skipping `{}`: its column alias list hides `{}`.",
                        alias.value,
                        TRACE_COLUMN
                    );
                    return;
                }
                self.bindings.push(SourceBinding {
                    alias: alias.value.clone(),
                    relation: table.path.iter().map(|part| part.value.clone()).collect(),
                });
                sources.push(TokenSource::Table(alias));
            }
            FromItem::Subquery(subquery) => {
                let exposure = self.query_expr(&mut subquery.query);
                let Some(alias) = &mut subquery.alias else {
                    return;
                };
                if let Some(columns) = &mut alias.columns {
                    self.changed |= extend_column_list(columns, &exposure);
                }
                if exposure.exposes_tokens {
                    sources.push(TokenSource::Derived(alias.name.clone()));
                }
            }
            FromItem::Function(_) => {}
            FromItem::Nested(from) => self.from_inj(from, sources),
        }
    }

    // SELECT DISTINCT a, b  ->  SELECT a, b GROUP BY 1, 2
    fn distinct_to_group_by(select: &mut Select) {
        if !matches!(select.distinct, Some(Distinct::Distinct)) || !distinct_is_groupable(select) {
            return;
        }
        select.distinct = None;
        select.group_by = Some(GroupBy {
            expr: GroupByExpr::Items(
                (1..=select.exprs.len())
                    .map(|ordinal| Expr::Number(ordinal.to_string()))
                    .collect(),
            ),
        });
    }

    // GROUP BY ALL  ->  GROUP BY <ordinals of the non-aggregate outputs>
    fn expand_group_by_all(select: &mut Select) {
        if !matches!(
            select.group_by,
            Some(GroupBy {
                expr: GroupByExpr::All
            })
        ) {
            return;
        }
        let mut ordinals = vec![];
        for (idx, select_expr) in select.exprs.iter().enumerate() {
            match select_expr {
                SelectExpr::Col(col) => {
                    if !contains_aggregate(&col.expr) {
                        ordinals.push(Expr::Number((idx + 1).to_string()));
                    }
                }
                // Star outputs cannot be listed
                SelectExpr::ColAll(_) | SelectExpr::All(_) => return,
            }
        }
        select.group_by = if ordinals.is_empty() {
            None
        } else {
            Some(GroupBy {
                expr: GroupByExpr::Items(ordinals),
            })
        };
    }

    fn exclude_reserved_from_stars(&self, select: &mut Select, sources: &[TokenSource]) {
        if !self.options.exclude_reserved_from_stars || sources.is_empty() {
            return;
        }
        // Tables carry a trace column, derived sources carry both
        let any_derived = sources
            .iter()
            .any(|source| matches!(source, TokenSource::Derived(_)));
        for select_expr in select.exprs.iter_mut() {
            let (exclude, derived) = match select_expr {
                SelectExpr::All(all) => (&mut all.exclude, any_derived),
                SelectExpr::ColAll(col_all) => {
                    let covered = col_all.qualifier.last().and_then(|qualifier| {
                        sources.iter().find_map(|source| match source {
                            TokenSource::Table(alias) if same_name(alias, qualifier) => Some(false),
                            TokenSource::Derived(alias) if same_name(alias, qualifier) => {
                                Some(true)
                            }
                            _ => None,
                        })
                    });
                    let Some(derived) = covered else {
                        continue;
                    };
                    (&mut col_all.exclude, derived)
                }
                SelectExpr::Col(_) => continue,
            };
            let names: &[&str] = if derived {
                &[TRACE_COLUMN, PARENT_TRACE_COLUMN]
            } else {
                &[TRACE_COLUMN]
            };
            let exclude = exclude.get_or_insert_with(Vec::new);
            for name in names {
                if !exclude.iter().any(|column| column.matches(name)) {
                    exclude.push(Identifier::new(name));
                }
            }
        }
    }

    fn select_inj(&mut self, select: &mut Select, order_by: &mut Option<OrderBy>) -> Exposure {
        let mut sources = vec![];
        if let Some(from) = &mut select.from {
            self.from_inj(from, &mut sources);
        }

        let trace_pos = select
            .exprs
            .iter()
            .position(|select_expr| is_reserved_expr(select_expr, TRACE_COLUMN));
        let has_tokens = select
            .exprs
            .iter()
            .any(|select_expr| is_reserved_expr(select_expr, PARENT_TRACE_COLUMN));

        if trace_pos.is_some() && has_tokens {
            return Exposure {
                injected: vec![],
                exposes_tokens: true,
            };
        }

        self.exclude_reserved_from_stars(select, &sources);

        let mut injected = vec![];
        if !has_tokens {
            Self::distinct_to_group_by(select);
            Self::expand_group_by_all(select);
        }

        let trace_pos = match trace_pos {
            Some(pos) => pos,
            None => {
                select
                    .exprs
                    .insert(0, reserved_column(trace_id_expr(), TRACE_COLUMN));
                injected.push((0, TRACE_COLUMN));
                0
            }
        };

        if !has_tokens {
            let aggregating = is_aggregating(select);
            let tokens = tokens_expr(&sources, aggregating);
            select
                .exprs
                .insert(trace_pos + 1, reserved_column(tokens, PARENT_TRACE_COLUMN));
            injected.push((trace_pos + 1, PARENT_TRACE_COLUMN));
        }

        if let Some(GroupBy {
            expr: GroupByExpr::Items(items),
        }) = &mut select.group_by
        {
            for item in items.iter_mut() {
                shift_ordinal(item, &injected);
            }
        }
        shift_order_by(order_by, &injected);

        self.changed = true;
        Exposure {
            injected,
            exposes_tokens: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_shift_past_injected_columns() {
        let mut expr = Expr::Number("1".to_owned());
        shift_ordinal(&mut expr, &[(0, TRACE_COLUMN), (1, PARENT_TRACE_COLUMN)]);
        assert!(matches!(expr, Expr::Number(ref n) if n == "3"));

        // Trace column already at position 1: only the tokens column is added
        let mut expr = Expr::Number("1".to_owned());
        shift_ordinal(&mut expr, &[(2, PARENT_TRACE_COLUMN)]);
        assert!(matches!(expr, Expr::Number(ref n) if n == "1"));

        let mut expr = Expr::Number("3".to_owned());
        shift_ordinal(&mut expr, &[(2, PARENT_TRACE_COLUMN)]);
        assert!(matches!(expr, Expr::Number(ref n) if n == "4"));
    }

    #[test]
    fn column_lists_follow_injected_positions() {
        let mut columns = vec![Identifier::new("a"), Identifier::new("b")];
        let exposure = Exposure {
            injected: vec![(0, TRACE_COLUMN), (1, PARENT_TRACE_COLUMN)],
            exposes_tokens: true,
        };
        assert!(extend_column_list(&mut columns, &exposure));
        let names = columns.iter().map(|c| c.value.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec![TRACE_COLUMN, PARENT_TRACE_COLUMN, "a", "b"]);
        assert!(!extend_column_list(&mut columns, &exposure));
    }

    #[test]
    fn bindings_match_relations() {
        let binding = SourceBinding {
            alias: "o".to_owned(),
            relation: vec!["analytics".to_owned(), "Orders".to_owned()],
        };
        assert!(binding.refers_to("analytics", "orders"));
        assert!(!binding.refers_to("staging", "orders"));
        let unqualified = SourceBinding {
            alias: "orders".to_owned(),
            relation: vec!["orders".to_owned()],
        };
        assert!(unqualified.refers_to("any_schema", "orders"));
    }

    fn column(parts: &[&str]) -> Expr {
        Expr::Column(ColumnExpr {
            parts: parts.iter().map(|part| Identifier::new(part)).collect(),
        })
    }

    fn output(expr: Expr, alias: Option<&str>) -> SelectExpr {
        SelectExpr::Col(SelectColExpr {
            expr,
            alias: alias.map(Identifier::new),
        })
    }

    #[test]
    fn output_names_need_distinct_plain_names() {
        let names = output_names(&[
            output(column(&["o", "region"]), None),
            output(Expr::Number("1".to_owned()), Some("n")),
        ])
        .unwrap();
        let names = names.iter().map(|n| n.value.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["region", "n"]);

        assert!(output_names(&[output(Expr::Number("1".to_owned()), None)]).is_err());
        assert!(
            output_names(&[
                output(column(&["a", "id"]), None),
                output(column(&["b", "ID"]), None),
            ])
            .is_err()
        );
        assert!(output_names(&[output(column(&[TRACE_COLUMN]), None)]).is_err());
    }

    #[test]
    fn order_by_terms_map_to_grouped_outputs() {
        let exprs = [
            output(column(&["region"]), None),
            output(column(&["o", "amount"]), Some("total")),
        ];
        let names = output_names(&exprs).unwrap();
        let order_by_expr = |expr| crate::ast::OrderByExpr {
            expr,
            sort_direction: None,
            nulls: None,
        };
        let mut order_by = Some(OrderBy {
            exprs: vec![
                order_by_expr(column(&["total"])),
                order_by_expr(column(&["o", "amount"])),
                order_by_expr(Expr::Number("1".to_owned())),
            ],
        });
        order_by_over_grouped(&mut order_by, &names, &exprs).unwrap();
        let terms = order_by
            .unwrap()
            .exprs
            .into_iter()
            .map(|order_by_expr| format!("{:?}", order_by_expr.expr))
            .collect::<Vec<_>>();
        assert_eq!(
            terms,
            vec![
                format!("{:?}", column(&["total"])),
                format!("{:?}", Expr::Number("2".to_owned())),
                format!("{:?}", Expr::Number("1".to_owned())),
            ]
        );

        let mut order_by = Some(OrderBy {
            exprs: vec![order_by_expr(column(&["o", "created_at"]))],
        });
        assert!(order_by_over_grouped(&mut order_by, &names, &exprs).is_err());
    }
}

