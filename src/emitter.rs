//! Renders statement trees back to SQL.
//!
//! Output is single-line: keywords upper case, identifiers as written.
//! Emitting a re-parsed emission yields the same text, which is what keeps
//! instrumentation idempotent.

use crate::ast::{
    ArrayStyle, BinaryOperator, CastStyle, CreateKind, CreateModifier, DataType, Distinct, Expr,
    FrameBound, From, FromItem, FunctionExpr, FunctionNulls, GenericFunctionExpr, GroupByExpr,
    Identifier, IsTest, JoinCondition, JoinKind, Limit, NamedWindowExpr, OrderBy, OrderByExpr,
    OrderByNulls, OrderBySortDirection, QueryExpr, Select, SelectExpr, SetQueryOperator,
    Statement, TableAlias, UnaryOperator, WindowFrame, WindowFrameKind, WindowSpec, With,
};
use crate::dialect::Dialect;

pub const STATEMENT_SEPARATOR: &str = ";\n";

pub fn emit_statements(statements: &[Statement], dialect: Dialect) -> String {
    statements
        .iter()
        .map(|statement| emit_statement(statement, dialect))
        .collect::<Vec<_>>()
        .join(STATEMENT_SEPARATOR)
}

pub fn emit_statement(statement: &Statement, dialect: Dialect) -> String {
    let mut emitter = Emitter::new(dialect);
    emitter.statement(statement);
    emitter.out
}

pub fn emit_query(query: &QueryExpr, dialect: Dialect) -> String {
    let mut emitter = Emitter::new(dialect);
    emitter.query_expr(query);
    emitter.out
}

pub fn emit_expr(expr: &Expr, dialect: Dialect) -> String {
    let mut emitter = Emitter::new(dialect);
    emitter.expr(expr);
    emitter.out
}

/// Quotes `value` as a `"` identifier.
pub fn quote_identifier(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

struct Emitter {
    dialect: Dialect,
    out: String,
}

impl Emitter {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            out: String::new(),
        }
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn comma_separated<T>(&mut self, items: &[T], mut emit_item: impl FnMut(&mut Self, &T)) {
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                self.push(", ");
            }
            emit_item(self, item);
        }
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Query(query_statement) => self.query_expr(&query_statement.query),
            Statement::Insert(insert) => {
                self.push("INSERT INTO ");
                self.path(&insert.table);
                if let Some(columns) = &insert.columns {
                    self.push(" ");
                    self.identifier_list(columns);
                }
                self.push(" ");
                self.query_expr(&insert.query);
            }
            Statement::CreateAs(create) => {
                self.push("CREATE ");
                if create.replace {
                    self.push("OR REPLACE ");
                }
                match create.modifier {
                    Some(CreateModifier::Temp) => self.push("TEMP "),
                    Some(CreateModifier::Temporary) => self.push("TEMPORARY "),
                    Some(CreateModifier::Transient) => self.push("TRANSIENT "),
                    None => {}
                }
                match create.kind {
                    CreateKind::Table => self.push("TABLE "),
                    CreateKind::View => self.push("VIEW "),
                    CreateKind::MaterializedView => self.push("MATERIALIZED VIEW "),
                }
                if create.if_not_exists {
                    self.push("IF NOT EXISTS ");
                }
                self.path(&create.name);
                if create.copy_grants {
                    self.push(" COPY GRANTS");
                }
                self.push(" AS ");
                self.query_expr(&create.query);
            }
            Statement::Raw(raw) => self.push(&raw.sql),
        }
    }

    fn identifier(&mut self, identifier: &Identifier) {
        if identifier.quoted {
            let quoted = quote_identifier(&identifier.value);
            self.push(&quoted);
        } else {
            self.push(&identifier.value);
        }
    }

    fn path(&mut self, path: &[Identifier]) {
        for (idx, part) in path.iter().enumerate() {
            if idx > 0 {
                self.push(".");
            }
            self.identifier(part);
        }
    }

    fn identifier_list(&mut self, identifiers: &[Identifier]) {
        self.push("(");
        self.comma_separated(identifiers, |e, ident| e.identifier(ident));
        self.push(")");
    }

    fn string_literal(&mut self, value: &str) {
        let mut escaped = value.replace('\'', "''");
        if self.dialect.backslash_escapes() {
            escaped = escaped.replace('\\', "\\\\");
        }
        self.push("'");
        self.push(&escaped);
        self.push("'");
    }

    fn data_type(&mut self, data_type: &DataType) {
        if data_type.name.starts_with('"') {
            self.push(&data_type.name);
        } else {
            self.push(&data_type.name.to_uppercase());
        }
        if !data_type.parameters.is_empty() {
            self.push("(");
            self.push(&data_type.parameters.join(", "));
            self.push(")");
        }
        for _ in 0..data_type.array_dims {
            self.push("[]");
        }
    }

    fn query_expr(&mut self, query: &QueryExpr) {
        let (with, order_by, limit) = match query {
            QueryExpr::Grouping(q) => (&q.with, &q.order_by, &q.limit),
            QueryExpr::Select(q) => (&q.with, &q.order_by, &q.limit),
            QueryExpr::SetSelect(q) => (&q.with, &q.order_by, &q.limit),
            QueryExpr::Values(q) => (&q.with, &q.order_by, &q.limit),
        };

        if let Some(with) = with {
            self.with(with);
            self.push(" ");
        }

        match query {
            QueryExpr::Grouping(grouping) => {
                self.push("(");
                self.query_expr(&grouping.query);
                self.push(")");
            }
            QueryExpr::Select(select) => self.select(&select.select),
            QueryExpr::SetSelect(set_select) => {
                self.query_expr(&set_select.left_query);
                self.push(match set_select.set_operator {
                    SetQueryOperator::Union => " UNION ",
                    SetQueryOperator::UnionAll => " UNION ALL ",
                    SetQueryOperator::Intersect => " INTERSECT ",
                    SetQueryOperator::IntersectAll => " INTERSECT ALL ",
                    SetQueryOperator::Except => " EXCEPT ",
                    SetQueryOperator::ExceptAll => " EXCEPT ALL ",
                });
                self.query_expr(&set_select.right_query);
            }
            QueryExpr::Values(values) => {
                self.push("VALUES ");
                self.comma_separated(&values.rows, |e, row| {
                    e.push("(");
                    e.comma_separated(row, |e, expr| e.expr(expr));
                    e.push(")");
                });
            }
        }

        if let Some(order_by) = order_by {
            self.order_by(order_by);
        }
        if let Some(limit) = limit {
            self.limit(limit);
        }
    }

    fn with(&mut self, with: &With) {
        self.push("WITH ");
        if with.recursive {
            self.push("RECURSIVE ");
        }
        self.comma_separated(&with.ctes, |e, cte| {
            e.identifier(&cte.name);
            if let Some(columns) = &cte.columns {
                e.identifier_list(columns);
            }
            e.push(" AS ");
            match cte.materialized {
                Some(true) => e.push("MATERIALIZED "),
                Some(false) => e.push("NOT MATERIALIZED "),
                None => {}
            }
            e.push("(");
            e.query_expr(&cte.query);
            e.push(")");
        });
    }

    fn order_by(&mut self, order_by: &OrderBy) {
        self.push(" ORDER BY ");
        self.order_by_exprs(&order_by.exprs);
    }

    fn order_by_exprs(&mut self, exprs: &[OrderByExpr]) {
        self.comma_separated(exprs, |e, order_by_expr| {
            e.expr(&order_by_expr.expr);
            match order_by_expr.sort_direction {
                Some(OrderBySortDirection::Asc) => e.push(" ASC"),
                Some(OrderBySortDirection::Desc) => e.push(" DESC"),
                None => {}
            }
            match order_by_expr.nulls {
                Some(OrderByNulls::First) => e.push(" NULLS FIRST"),
                Some(OrderByNulls::Last) => e.push(" NULLS LAST"),
                None => {}
            }
        });
    }

    fn limit(&mut self, limit: &Limit) {
        if let Some(count) = &limit.count {
            self.push(" LIMIT ");
            self.expr(count);
        }
        if let Some(offset) = &limit.offset {
            self.push(" OFFSET ");
            self.expr(offset);
        }
    }

    fn select(&mut self, select: &Select) {
        self.push("SELECT ");
        match &select.distinct {
            Some(Distinct::Distinct) => self.push("DISTINCT "),
            Some(Distinct::On(exprs)) => {
                self.push("DISTINCT ON (");
                self.comma_separated(exprs, |e, expr| e.expr(expr));
                self.push(") ");
            }
            None => {}
        }

        self.comma_separated(&select.exprs, |e, select_expr| e.select_expr(select_expr));

        if let Some(from) = &select.from {
            self.push(" FROM ");
            self.from(from);
        }
        if let Some(r#where) = &select.r#where {
            self.push(" WHERE ");
            self.expr(&r#where.expr);
        }
        if let Some(group_by) = &select.group_by {
            self.push(" GROUP BY ");
            match &group_by.expr {
                GroupByExpr::All => self.push("ALL"),
                GroupByExpr::Items(exprs) => self.comma_separated(exprs, |e, expr| e.expr(expr)),
            }
        }
        if let Some(having) = &select.having {
            self.push(" HAVING ");
            self.expr(&having.expr);
        }
        if let Some(window) = &select.window {
            self.push(" WINDOW ");
            self.comma_separated(&window.named_windows, |e, named_window| {
                e.identifier(&named_window.name);
                e.push(" AS ");
                e.named_window_expr(&named_window.window);
            });
        }
        if let Some(qualify) = &select.qualify {
            self.push(" QUALIFY ");
            self.expr(&qualify.expr);
        }
    }

    fn select_expr(&mut self, select_expr: &SelectExpr) {
        let exclude = match select_expr {
            SelectExpr::Col(col) => {
                self.expr(&col.expr);
                if let Some(alias) = &col.alias {
                    self.push(" AS ");
                    self.identifier(alias);
                }
                return;
            }
            SelectExpr::ColAll(col_all) => {
                self.path(&col_all.qualifier);
                self.push(".*");
                &col_all.exclude
            }
            SelectExpr::All(all) => {
                self.push("*");
                &all.exclude
            }
        };
        if let Some(exclude) = exclude {
            self.push(" EXCLUDE ");
            self.identifier_list(exclude);
        }
    }

    fn from(&mut self, from: &From) {
        self.from_item(&from.source);
        for join in &from.joins {
            if join.kind == JoinKind::Comma {
                self.push(", ");
                self.from_item(&join.item);
                continue;
            }
            self.push(" ");
            if join.natural {
                self.push("NATURAL ");
            }
            self.push(match join.kind {
                JoinKind::Inner => "JOIN ",
                JoinKind::Left => "LEFT JOIN ",
                JoinKind::Right => "RIGHT JOIN ",
                JoinKind::Full => "FULL JOIN ",
                JoinKind::Cross | JoinKind::Comma => "CROSS JOIN ",
            });
            self.from_item(&join.item);
            match &join.cond {
                Some(JoinCondition::On(expr)) => {
                    self.push(" ON ");
                    self.expr(expr);
                }
                Some(JoinCondition::Using(columns)) => {
                    self.push(" USING ");
                    self.identifier_list(columns);
                }
                None => {}
            }
        }
    }

    fn from_item(&mut self, item: &FromItem) {
        match item {
            FromItem::Table(table) => {
                self.path(&table.path);
                self.table_alias(&table.alias);
            }
            FromItem::Subquery(subquery) => {
                if subquery.lateral {
                    self.push("LATERAL ");
                }
                self.push("(");
                self.query_expr(&subquery.query);
                self.push(")");
                self.table_alias(&subquery.alias);
            }
            FromItem::Function(function) => {
                if function.lateral {
                    self.push("LATERAL ");
                }
                self.expr(&function.function);
                self.table_alias(&function.alias);
            }
            FromItem::Nested(from) => {
                self.push("(");
                self.from(from);
                self.push(")");
            }
        }
    }

    fn table_alias(&mut self, alias: &Option<TableAlias>) {
        if let Some(alias) = alias {
            self.push(" AS ");
            self.identifier(&alias.name);
            if let Some(columns) = &alias.columns {
                self.identifier_list(columns);
            }
        }
    }

    fn named_window_expr(&mut self, window: &NamedWindowExpr) {
        match window {
            NamedWindowExpr::Reference(name) => self.identifier(name),
            NamedWindowExpr::WindowSpec(spec) => self.window_spec(spec),
        }
    }

    fn window_spec(&mut self, spec: &WindowSpec) {
        let mut parts = vec![];
        if let Some(name) = &spec.window_name {
            let mut e = Emitter::new(self.dialect);
            e.identifier(name);
            parts.push(e.out);
        }
        if let Some(partition_by) = &spec.partition_by {
            let mut e = Emitter::new(self.dialect);
            e.push("PARTITION BY ");
            e.comma_separated(partition_by, |e, expr| e.expr(expr));
            parts.push(e.out);
        }
        if let Some(order_by) = &spec.order_by {
            let mut e = Emitter::new(self.dialect);
            e.push("ORDER BY ");
            e.order_by_exprs(order_by);
            parts.push(e.out);
        }
        if let Some(frame) = &spec.frame {
            let mut e = Emitter::new(self.dialect);
            e.window_frame(frame);
            parts.push(e.out);
        }
        self.push("(");
        self.push(&parts.join(" "));
        self.push(")");
    }

    fn window_frame(&mut self, frame: &WindowFrame) {
        self.push(match frame.kind {
            WindowFrameKind::Rows => "ROWS ",
            WindowFrameKind::Range => "RANGE ",
            WindowFrameKind::Groups => "GROUPS ",
        });
        match &frame.end {
            Some(end) => {
                self.push("BETWEEN ");
                self.frame_bound(&frame.start);
                self.push(" AND ");
                self.frame_bound(end);
            }
            None => self.frame_bound(&frame.start),
        }
    }

    fn frame_bound(&mut self, bound: &FrameBound) {
        match bound {
            FrameBound::UnboundedPreceding => self.push("UNBOUNDED PRECEDING"),
            FrameBound::Preceding(offset) => {
                self.expr(offset);
                self.push(" PRECEDING");
            }
            FrameBound::CurrentRow => self.push("CURRENT ROW"),
            FrameBound::Following(offset) => {
                self.expr(offset);
                self.push(" FOLLOWING");
            }
            FrameBound::UnboundedFollowing => self.push("UNBOUNDED FOLLOWING"),
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Binary(binary) => {
                self.expr(&binary.left);
                self.push(" ");
                self.push(binary_operator_str(binary.operator));
                self.push(" ");
                self.expr(&binary.right);
            }
            Expr::Unary(unary) => {
                let operand = emit_expr(&unary.right, self.dialect);
                match unary.operator {
                    UnaryOperator::Not => self.push("NOT "),
                    UnaryOperator::Minus => self.push("-"),
                    UnaryOperator::Plus => self.push("+"),
                    UnaryOperator::BitwiseNot => self.push("~"),
                }
                // `- -x` must not collapse into a `--` comment
                if operand.starts_with(['-', '+']) {
                    self.push(" ");
                }
                self.push(&operand);
            }
            Expr::Grouping(grouping) => {
                self.push("(");
                self.expr(&grouping.expr);
                self.push(")");
            }
            Expr::Tuple(exprs) => {
                self.push("(");
                self.comma_separated(exprs, |e, expr| e.expr(expr));
                self.push(")");
            }
            Expr::Column(column) => self.path(&column.parts),
            Expr::String(value) => self.string_literal(value),
            Expr::Number(value) => self.push(value),
            Expr::Bool(true) => self.push("TRUE"),
            Expr::Bool(false) => self.push("FALSE"),
            Expr::Null => self.push("NULL"),
            Expr::Star => self.push("*"),
            Expr::Placeholder(placeholder) => self.push(placeholder),
            Expr::TypedString(typed) => {
                self.data_type(&typed.r#type);
                self.push(" ");
                self.string_literal(&typed.value);
            }
            Expr::Interval(interval) => {
                self.push("INTERVAL ");
                self.expr(&interval.value);
                if let Some(unit) = &interval.unit {
                    self.push(" ");
                    self.push(&unit.to_uppercase());
                }
            }
            Expr::Query(query) => {
                self.push("(");
                self.query_expr(query);
                self.push(")");
            }
            Expr::Exists(query) => {
                self.push("EXISTS (");
                self.query_expr(query);
                self.push(")");
            }
            Expr::InList(in_list) => {
                self.expr(&in_list.expr);
                self.push(if in_list.negated { " NOT IN (" } else { " IN (" });
                self.comma_separated(&in_list.list, |e, expr| e.expr(expr));
                self.push(")");
            }
            Expr::InQuery(in_query) => {
                self.expr(&in_query.expr);
                self.push(if in_query.negated { " NOT IN (" } else { " IN (" });
                self.query_expr(&in_query.query);
                self.push(")");
            }
            Expr::Between(between) => {
                self.expr(&between.expr);
                self.push(if between.negated {
                    " NOT BETWEEN "
                } else {
                    " BETWEEN "
                });
                self.expr(&between.low);
                self.push(" AND ");
                self.expr(&between.high);
            }
            Expr::Like(like) => {
                self.expr(&like.expr);
                if like.negated {
                    self.push(" NOT");
                }
                self.push(if like.case_insensitive {
                    " ILIKE "
                } else {
                    " LIKE "
                });
                self.expr(&like.pattern);
                if let Some(escape) = &like.escape {
                    self.push(" ESCAPE ");
                    self.expr(escape);
                }
            }
            Expr::Is(is) => {
                self.expr(&is.expr);
                self.push(if is.negated { " IS NOT " } else { " IS " });
                match &is.test {
                    IsTest::Null => self.push("NULL"),
                    IsTest::True => self.push("TRUE"),
                    IsTest::False => self.push("FALSE"),
                    IsTest::DistinctFrom(other) => {
                        self.push("DISTINCT FROM ");
                        self.expr(other);
                    }
                }
            }
            Expr::Case(case) => {
                self.push("CASE");
                if let Some(operand) = &case.case {
                    self.push(" ");
                    self.expr(operand);
                }
                for (when, then) in &case.when_thens {
                    self.push(" WHEN ");
                    self.expr(when);
                    self.push(" THEN ");
                    self.expr(then);
                }
                if let Some(r#else) = &case.r#else {
                    self.push(" ELSE ");
                    self.expr(r#else);
                }
                self.push(" END");
            }
            Expr::Cast(cast) => match cast.style {
                CastStyle::DoubleColon => {
                    self.expr(&cast.expr);
                    self.push("::");
                    self.data_type(&cast.r#type);
                }
                CastStyle::Cast | CastStyle::TryCast => {
                    self.push(if cast.style == CastStyle::Cast {
                        "CAST("
                    } else {
                        "TRY_CAST("
                    });
                    self.expr(&cast.expr);
                    self.push(" AS ");
                    self.data_type(&cast.r#type);
                    self.push(")");
                }
            },
            Expr::Extract(extract) => {
                self.push("EXTRACT(");
                self.push(&extract.field);
                self.push(" FROM ");
                self.expr(&extract.expr);
                self.push(")");
            }
            Expr::Array(array) => {
                if array.style == ArrayStyle::Keyword {
                    self.push("ARRAY");
                }
                self.push("[");
                self.comma_separated(&array.exprs, |e, expr| e.expr(expr));
                self.push("]");
            }
            Expr::ArraySubquery(query) => {
                self.push("ARRAY(");
                self.query_expr(query);
                self.push(")");
            }
            Expr::Subscript(subscript) => {
                self.expr(&subscript.expr);
                self.push("[");
                self.expr(&subscript.index);
                self.push("]");
            }
            Expr::GenericFunction(function) => self.generic_function(function),
            Expr::Function(function) => self.function(function),
        }
    }

    fn generic_function(&mut self, function: &GenericFunctionExpr) {
        self.path(&function.name);
        self.push("(");
        if function.distinct {
            self.push("DISTINCT ");
        }
        self.comma_separated(&function.arguments, |e, arg| e.expr(arg));
        if let Some(order_by) = &function.order_by {
            if !function.arguments.is_empty() {
                self.push(" ");
            }
            self.push("ORDER BY ");
            self.order_by_exprs(order_by);
        }
        self.push(")");
        if let Some(within_group) = &function.within_group {
            self.push(" WITHIN GROUP (ORDER BY ");
            self.order_by_exprs(within_group);
            self.push(")");
        }
        if let Some(filter) = &function.filter {
            self.push(" FILTER (WHERE ");
            self.expr(filter);
            self.push(")");
        }
        match function.nulls {
            Some(FunctionNulls::Ignore) => self.push(" IGNORE NULLS"),
            Some(FunctionNulls::Respect) => self.push(" RESPECT NULLS"),
            None => {}
        }
        if let Some(over) = &function.over {
            self.push(" OVER ");
            self.named_window_expr(over);
        }
    }

    fn call(&mut self, name: &str, args: &[&Expr]) {
        self.push(name);
        self.push("(");
        self.comma_separated(args, |e, arg| e.expr(arg));
        self.push(")");
    }

    fn function(&mut self, function: &FunctionExpr) {
        match function {
            FunctionExpr::Coalesce(coalesce) => {
                let args = coalesce.exprs.iter().collect::<Vec<_>>();
                self.call("COALESCE", &args);
            }
            FunctionExpr::Concat(concat) => {
                let args = concat.values.iter().collect::<Vec<_>>();
                self.call("CONCAT", &args);
            }
            FunctionExpr::TraceId => self.push(match self.dialect {
                Dialect::Postgres => {
                    "CAST(MD5(CAST(RANDOM() AS TEXT) || CAST(CLOCK_TIMESTAMP() AS TEXT)) AS UUID)"
                }
                Dialect::Snowflake => "UUID_STRING()",
                Dialect::DuckDb => "UUID()",
            }),
            FunctionExpr::ArrayConstruct(construct) => {
                if construct.exprs.is_empty() {
                    self.push(match self.dialect {
                        Dialect::Postgres => "CAST(ARRAY[] AS TEXT[])",
                        Dialect::Snowflake => "ARRAY_CONSTRUCT()",
                        Dialect::DuckDb => "CAST([] AS TEXT[])",
                    });
                    return;
                }
                let (open, close) = match self.dialect {
                    Dialect::Postgres => ("ARRAY[", "]"),
                    Dialect::Snowflake => ("ARRAY_CONSTRUCT(", ")"),
                    Dialect::DuckDb => ("[", "]"),
                };
                self.push(open);
                self.comma_separated(&construct.exprs, |e, expr| e.expr(expr));
                self.push(close);
            }
            FunctionExpr::ArrayConcat(concat) => {
                let name = match self.dialect {
                    Dialect::Postgres | Dialect::Snowflake => "ARRAY_CAT",
                    Dialect::DuckDb => "LIST_CONCAT",
                };
                self.call(name, &[concat.left.as_ref(), concat.right.as_ref()]);
            }
            FunctionExpr::ArrayUnique(unique) => match self.dialect {
                Dialect::Postgres => {
                    self.push("ARRAY_REMOVE(ARRAY(SELECT DISTINCT UNNEST(");
                    self.expr(&unique.array);
                    self.push(")), NULL)");
                }
                Dialect::Snowflake => self.call("ARRAY_DISTINCT", &[unique.array.as_ref()]),
                Dialect::DuckDb => self.call("LIST_DISTINCT", &[unique.array.as_ref()]),
            },
            FunctionExpr::ArrayUniqueAgg(unique) => match self.dialect {
                Dialect::Postgres => {
                    self.push(
                        "ARRAY_REMOVE(ARRAY(SELECT DISTINCT UNNEST(STRING_TO_ARRAY(STRING_AGG(ARRAY_TO_STRING(",
                    );
                    self.expr(&unique.array);
                    self.push(", CHR(31)), CHR(31)), CHR(31)))), '')");
                }
                Dialect::Snowflake => {
                    self.push("ARRAY_DISTINCT(ARRAY_FLATTEN(ARRAY_AGG(");
                    self.expr(&unique.array);
                    self.push(")))");
                }
                Dialect::DuckDb => {
                    self.push("LIST_DISTINCT(FLATTEN(LIST(");
                    self.expr(&unique.array);
                    self.push(")))");
                }
            },
        }
    }
}

fn binary_operator_str(operator: BinaryOperator) -> &'static str {
    match operator {
        BinaryOperator::Or => "OR",
        BinaryOperator::And => "AND",
        BinaryOperator::Equal => "=",
        BinaryOperator::NotEqual => "<>",
        BinaryOperator::BangEqual => "!=",
        BinaryOperator::Less => "<",
        BinaryOperator::LessEqual => "<=",
        BinaryOperator::Greater => ">",
        BinaryOperator::GreaterEqual => ">=",
        BinaryOperator::Concat => "||",
        BinaryOperator::Arrow => "->",
        BinaryOperator::LongArrow => "->>",
        BinaryOperator::Plus => "+",
        BinaryOperator::Minus => "-",
        BinaryOperator::Star => "*",
        BinaryOperator::Slash => "/",
        BinaryOperator::Percent => "%",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ArrayConcatFunctionExpr, ArrayConstructFunctionExpr, ArrayUniqueFunctionExpr};

    fn column(name: &str) -> Box<Expr> {
        Box::new(Expr::Column(crate::ast::ColumnExpr {
            parts: vec![Identifier::new(name)],
        }))
    }

    #[test]
    fn renders_lineage_primitives_per_dialect() {
        let concat = Expr::Function(FunctionExpr::ArrayConcat(ArrayConcatFunctionExpr {
            left: column("a"),
            right: column("b"),
        }));
        assert_eq!(emit_expr(&concat, Dialect::Postgres), "ARRAY_CAT(a, b)");
        assert_eq!(emit_expr(&concat, Dialect::DuckDb), "LIST_CONCAT(a, b)");

        let empty = Expr::Function(FunctionExpr::ArrayConstruct(ArrayConstructFunctionExpr {
            exprs: vec![],
        }));
        assert_eq!(emit_expr(&empty, Dialect::Postgres), "CAST(ARRAY[] AS TEXT[])");
        assert_eq!(emit_expr(&empty, Dialect::Snowflake), "ARRAY_CONSTRUCT()");

        let unique = Expr::Function(FunctionExpr::ArrayUnique(ArrayUniqueFunctionExpr {
            array: column("m"),
        }));
        assert_eq!(
            emit_expr(&unique, Dialect::Postgres),
            "ARRAY_REMOVE(ARRAY(SELECT DISTINCT UNNEST(m)), NULL)"
        );
        assert_eq!(emit_expr(&unique, Dialect::Snowflake), "ARRAY_DISTINCT(m)");
    }

    #[test]
    fn escapes_literals_and_identifiers() {
        let string = Expr::String("it's a \\ test".to_owned());
        assert_eq!(emit_expr(&string, Dialect::Postgres), "'it''s a \\ test'");
        assert_eq!(
            emit_expr(&string, Dialect::Snowflake),
            "'it''s a \\\\ test'"
        );
        assert_eq!(quote_identifier("My \"Col\""), "\"My \"\"Col\"\"\"");
    }

    #[test]
    fn separates_nested_unary_minus() {
        let expr = Expr::Unary(crate::ast::UnaryExpr {
            operator: UnaryOperator::Minus,
            right: Box::new(Expr::Unary(crate::ast::UnaryExpr {
                operator: UnaryOperator::Minus,
                right: column("x"),
            })),
        });
        assert_eq!(emit_expr(&expr, Dialect::Postgres), "- -x");
    }
}
