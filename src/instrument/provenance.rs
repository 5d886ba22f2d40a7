//! Classification of select blocks and construction of the parent-tokens
//! expression.

use crate::ast::{
    ArrayConcatFunctionExpr, ArrayConstructFunctionExpr, ArrayUniqueFunctionExpr, BinaryExpr,
    BinaryOperator, CastExpr, CastStyle, CoalesceFunctionExpr, ColumnExpr, DataType, Distinct,
    Expr, FunctionExpr, GenericFunctionExpr, Identifier, IsTest, Select, SelectExpr,
};
use crate::vocabulary::{PARENT_TRACE_COLUMN, TRACE_COLUMN, token_prefix};

/// Functions that fold many input rows into one, unless called with `OVER`.
const AGGREGATE_FUNCTIONS: &[&str] = &[
    "any_value",
    "approx_count_distinct",
    "approx_percentile",
    "arg_max",
    "arg_min",
    "array_agg",
    "array_unique_agg",
    "array_union_agg",
    "avg",
    "bit_and",
    "bit_or",
    "bit_xor",
    "bitand_agg",
    "bitor_agg",
    "bool_and",
    "bool_or",
    "booland_agg",
    "boolor_agg",
    "corr",
    "count",
    "count_if",
    "covar_pop",
    "covar_samp",
    "every",
    "group_concat",
    "json_agg",
    "json_object_agg",
    "jsonb_agg",
    "jsonb_object_agg",
    "kurtosis",
    "list",
    "listagg",
    "max",
    "max_by",
    "median",
    "min",
    "min_by",
    "mode",
    "object_agg",
    "percentile_cont",
    "percentile_disc",
    "regr_avgx",
    "regr_avgy",
    "regr_count",
    "regr_intercept",
    "regr_r2",
    "regr_slope",
    "skewness",
    "stddev",
    "stddev_pop",
    "stddev_samp",
    "string_agg",
    "sum",
    "var_pop",
    "var_samp",
    "variance",
    "xmlagg",
];

pub(crate) fn is_aggregate_function(function: &GenericFunctionExpr) -> bool {
    function.over.is_none() && AGGREGATE_FUNCTIONS.contains(&function.base_name().as_str())
}

/// Whether `expr` calls an aggregate, looking through everything except
/// subqueries and windowed calls.
pub(crate) fn contains_aggregate(expr: &Expr) -> bool {
    any_expr(expr, &|expr| match expr {
        Expr::GenericFunction(function) => is_aggregate_function(function),
        _ => false,
    })
}

pub(crate) fn contains_window(expr: &Expr) -> bool {
    any_expr(expr, &|expr| match expr {
        Expr::GenericFunction(function) => function.over.is_some(),
        _ => false,
    })
}

/// Aggregating blocks collapse many input rows into one output row.
pub(crate) fn is_aggregating(select: &Select) -> bool {
    select.group_by.is_some()
        || select.having.is_some()
        || matches!(select.distinct, Some(Distinct::Distinct))
        || select.exprs.iter().any(|select_expr| match select_expr {
            SelectExpr::Col(col) => contains_aggregate(&col.expr),
            SelectExpr::ColAll(_) | SelectExpr::All(_) => false,
        })
}

// Pre-order search that stops at subqueries and at windowed calls.
fn any_expr(expr: &Expr, pred: &dyn Fn(&Expr) -> bool) -> bool {
    if pred(expr) {
        return true;
    }
    let any = |exprs: &[&Expr]| exprs.iter().any(|expr| any_expr(expr, pred));
    match expr {
        Expr::Binary(binary) => any(&[binary.left.as_ref(), binary.right.as_ref()]),
        Expr::Unary(unary) => any_expr(&unary.right, pred),
        Expr::Grouping(grouping) => any_expr(&grouping.expr, pred),
        Expr::Tuple(exprs) => exprs.iter().any(|expr| any_expr(expr, pred)),
        Expr::Interval(interval) => any_expr(&interval.value, pred),
        Expr::InList(in_list) => {
            any_expr(&in_list.expr, pred) || in_list.list.iter().any(|expr| any_expr(expr, pred))
        }
        Expr::InQuery(in_query) => any_expr(&in_query.expr, pred),
        Expr::Between(between) => any(&[between.expr.as_ref(), between.low.as_ref(), between.high.as_ref()]),
        Expr::Like(like) => {
            any(&[like.expr.as_ref(), like.pattern.as_ref()])
                || like.escape.as_ref().is_some_and(|escape| any_expr(escape, pred))
        }
        Expr::Is(is) => {
            any_expr(&is.expr, pred)
                || matches!(&is.test, IsTest::DistinctFrom(other) if any_expr(other, pred))
        }
        Expr::Case(case) => {
            case.case.as_ref().is_some_and(|operand| any_expr(operand, pred))
                || case
                    .when_thens
                    .iter()
                    .any(|(when, then)| any_expr(when, pred) || any_expr(then, pred))
                || case.r#else.as_ref().is_some_and(|r#else| any_expr(r#else, pred))
        }
        Expr::Cast(cast) => any_expr(&cast.expr, pred),
        Expr::Extract(extract) => any_expr(&extract.expr, pred),
        Expr::Array(array) => array.exprs.iter().any(|expr| any_expr(expr, pred)),
        Expr::Subscript(subscript) => any(&[subscript.expr.as_ref(), subscript.index.as_ref()]),
        Expr::GenericFunction(function) => {
            function.over.is_none()
                && (function.arguments.iter().any(|expr| any_expr(expr, pred))
                    || function
                        .filter
                        .as_ref()
                        .is_some_and(|filter| any_expr(filter, pred)))
        }
        Expr::Function(function) => match function {
            FunctionExpr::Coalesce(coalesce) => {
                coalesce.exprs.iter().any(|expr| any_expr(expr, pred))
            }
            FunctionExpr::Concat(concat) => concat.values.iter().any(|expr| any_expr(expr, pred)),
            FunctionExpr::ArrayConstruct(construct) => {
                construct.exprs.iter().any(|expr| any_expr(expr, pred))
            }
            FunctionExpr::ArrayConcat(concat) => any(&[concat.left.as_ref(), concat.right.as_ref()]),
            FunctionExpr::ArrayUnique(unique) | FunctionExpr::ArrayUniqueAgg(unique) => {
                any_expr(&unique.array, pred)
            }
            FunctionExpr::TraceId => false,
        },
        Expr::Column(_)
        | Expr::String(_)
        | Expr::Number(_)
        | Expr::Bool(_)
        | Expr::Null
        | Expr::Star
        | Expr::Placeholder(_)
        | Expr::TypedString(_)
        | Expr::Query(_)
        | Expr::Exists(_)
        | Expr::ArraySubquery(_) => false,
    }
}

/// A relation in a block's `FROM`/`JOIN` list that contributes tokens.
#[derive(Debug, Clone)]
pub(crate) enum TokenSource {
    /// A relation whose rows carry their own trace id.
    Table(Identifier),
    /// A subquery or CTE whose rows already carry parent tokens.
    Derived(Identifier),
}

fn column(qualifier: &Identifier, name: &str) -> Expr {
    Expr::Column(ColumnExpr {
        parts: vec![qualifier.clone(), Identifier::new(name)],
    })
}

fn empty_array() -> Expr {
    Expr::Function(FunctionExpr::ArrayConstruct(ArrayConstructFunctionExpr {
        exprs: vec![],
    }))
}

pub(crate) fn trace_id_expr() -> Expr {
    Expr::Function(FunctionExpr::TraceId)
}

// ['<alias>:' || CAST(<alias>._row_trace_id AS TEXT)]
fn table_token(alias: &Identifier) -> Expr {
    let token = Expr::Binary(BinaryExpr {
        left: Box::new(Expr::String(token_prefix(&alias.value))),
        operator: BinaryOperator::Concat,
        right: Box::new(Expr::Cast(CastExpr {
            expr: Box::new(column(alias, TRACE_COLUMN)),
            r#type: DataType::simple("TEXT"),
            style: CastStyle::Cast,
        })),
    });
    Expr::Function(FunctionExpr::ArrayConstruct(ArrayConstructFunctionExpr {
        exprs: vec![token],
    }))
}

/// Builds the parent-tokens expression of a block reading from `sources`.
pub(crate) fn tokens_expr(sources: &[TokenSource], aggregating: bool) -> Expr {
    let contributions = sources.iter().map(|source| {
        let contribution = match source {
            TokenSource::Table(alias) => table_token(alias),
            TokenSource::Derived(alias) => column(alias, PARENT_TRACE_COLUMN),
        };
        Expr::Function(FunctionExpr::Coalesce(CoalesceFunctionExpr {
            exprs: vec![contribution, empty_array()],
        }))
    });

    let Some(merged) = contributions.reduce(|merged, contribution| {
        Expr::Function(FunctionExpr::ArrayConcat(ArrayConcatFunctionExpr {
            left: Box::new(merged),
            right: Box::new(contribution),
        }))
    }) else {
        return empty_array();
    };

    let unique = ArrayUniqueFunctionExpr {
        array: Box::new(merged),
    };
    if aggregating {
        Expr::Function(FunctionExpr::ArrayUniqueAgg(unique))
    } else {
        Expr::Function(FunctionExpr::ArrayUnique(unique))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::emitter::emit_expr;

    #[test]
    fn no_sources_give_the_empty_array() {
        assert_eq!(
            emit_expr(&tokens_expr(&[], true), Dialect::Postgres),
            "CAST(ARRAY[] AS TEXT[])"
        );
    }

    #[test]
    fn sources_are_folded_left_in_order() {
        let sources = vec![
            TokenSource::Table(Identifier::new("a")),
            TokenSource::Derived(Identifier::new("s")),
        ];
        assert_eq!(
            emit_expr(&tokens_expr(&sources, false), Dialect::DuckDb),
            "LIST_DISTINCT(LIST_CONCAT(COALESCE(['a:' || CAST(a._row_trace_id AS TEXT)], CAST([] AS TEXT[])), COALESCE(s._row_parent_trace_ids, CAST([] AS TEXT[]))))"
        );
    }

    #[test]
    fn windowed_calls_are_not_aggregates() {
        let sql = "SELECT SUM(x) OVER (PARTITION BY y) AS s, (SELECT COUNT(*) FROM t) AS c FROM u";
        let ast = crate::parser::parse_sql(sql, "postgres").unwrap();
        let crate::ast::Statement::Query(query) = &ast.statements[0] else {
            panic!("expected a query");
        };
        let crate::ast::QueryExpr::Select(select) = &query.query else {
            panic!("expected a select");
        };
        assert!(!is_aggregating(&select.select));
    }
}
