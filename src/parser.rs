use anyhow::anyhow;
use strum::IntoDiscriminant;

use crate::ast::{
    ArrayExpr, ArrayStyle, Ast, BetweenExpr, BinaryExpr, BinaryOperator, CaseExpr, CastExpr,
    CastStyle, CoalesceFunctionExpr, ColumnExpr, ConcatFunctionExpr, CreateAsStatement, CreateKind,
    CreateModifier, Cte, DataType, Distinct, Expr, ExtractExpr, FrameBound, From,
    FromFunctionExpr, FromItem, FromSubqueryExpr, FromTableExpr, FunctionExpr, FunctionNulls,
    GenericFunctionExpr, GroupBy, GroupByExpr, GroupingExpr, GroupingQueryExpr, Having,
    Identifier, InListExpr, InQueryExpr, InsertStatement, IntervalExpr, IsExpr, IsTest, Join,
    JoinCondition, JoinKind, LikeExpr, Limit, NamedWindow, NamedWindowExpr, OrderBy, OrderByExpr,
    OrderByNulls, OrderBySortDirection, Qualify, QueryExpr, QueryStatement, RawStatement, Select,
    SelectAllExpr, SelectColAllExpr, SelectColExpr, SelectExpr, SelectQueryExpr,
    SetQueryOperator, SetSelectQueryExpr, Statement, SubscriptExpr, TableAlias, Token, TokenType,
    TokenTypeVariant, TypedStringExpr, UnaryExpr, UnaryOperator, ValuesQueryExpr, Where, Window,
    WindowFrame, WindowFrameKind, WindowSpec, With,
};
use crate::dialect::Dialect;
use crate::scanner::Scanner;

const INTERVAL_UNITS: &[&str] = &[
    "year",
    "years",
    "quarter",
    "quarters",
    "month",
    "months",
    "week",
    "weeks",
    "day",
    "days",
    "hour",
    "hours",
    "minute",
    "minutes",
    "second",
    "seconds",
    "millisecond",
    "milliseconds",
    "microsecond",
    "microseconds",
];

/// One statement of a multi-statement script, parsed on its own.
#[derive(Debug)]
pub struct ParsedStatement {
    /// Source text of the statement, without the trailing `;`.
    pub sql: String,
    pub statement: anyhow::Result<Statement>,
}

pub struct Parser<'a> {
    source_tokens: &'a [Token],
    source: &'a str,
    curr: usize,
}

impl<'a> Parser<'a> {
    /// `tokens` must come from scanning `source` and end with `Eof`.
    pub fn new(tokens: &'a [Token], source: &'a str) -> Parser<'a> {
        Self {
            source_tokens: tokens,
            source,
            curr: 0,
        }
    }

    pub fn parse(&mut self) -> anyhow::Result<Ast> {
        self.parse_query()
    }

    /// Splits the token stream at top-level `;` and parses every statement
    /// independently, so one malformed statement does not hide the others.
    pub fn parse_statements(&self) -> Vec<ParsedStatement> {
        let mut parsed = vec![];
        let mut depth = 0usize;
        let mut start = 0;
        for (idx, token) in self.source_tokens.iter().enumerate() {
            match token.kind {
                TokenType::LeftParen => depth += 1,
                TokenType::RightParen => depth = depth.saturating_sub(1),
                TokenType::Semicolon if depth == 0 => {
                    if idx > start {
                        parsed.push(self.parse_segment(start, idx));
                    }
                    start = idx + 1;
                }
                TokenType::Eof => {
                    if idx > start {
                        parsed.push(self.parse_segment(start, idx));
                    }
                    break;
                }
                _ => {}
            }
        }
        parsed
    }

    fn parse_segment(&self, start: usize, end: usize) -> ParsedStatement {
        let sql = self
            .source
            .get(self.source_tokens[start].start..self.source_tokens[end - 1].end)
            .unwrap_or_default()
            .to_owned();
        let eof_offset = self.source_tokens[end].start;
        let mut segment = self.source_tokens[start..end].to_vec();
        segment.push(Token {
            kind: TokenType::Eof,
            lexeme: String::from("eof"),
            line: self.source_tokens[end].line,
            col: self.source_tokens[end].col,
            start: eof_offset,
            end: eof_offset,
        });
        let mut parser = Parser::new(&segment, self.source);
        let statement = parser.parse_single_statement();
        ParsedStatement { sql, statement }
    }

    fn parse_single_statement(&mut self) -> anyhow::Result<Statement> {
        let statement = self.parse_statement()?;
        self.match_token_type(TokenTypeVariant::Semicolon);
        self.consume(TokenTypeVariant::Eof)?;
        Ok(statement)
    }

    fn peek_prev(&self) -> &'a Token {
        &self.source_tokens[self.curr - 1]
    }

    fn peek(&self) -> &'a Token {
        &self.source_tokens[self.curr]
    }

    fn peek_next_i(&self, i: usize) -> &'a Token {
        // The last token is always Eof
        let idx = std::cmp::min(self.curr + i, self.source_tokens.len() - 1);
        &self.source_tokens[idx]
    }

    fn advance(&mut self) -> &'a Token {
        if !self.is_at_end() {
            // Do not advance if we peek Eof
            self.curr += 1;
        }
        self.peek_prev()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenType::Eof
    }

    fn check_token_type(&self, token_type: TokenTypeVariant) -> bool {
        self.peek().kind.discriminant() == token_type
    }

    fn match_token_type(&mut self, token_type: TokenTypeVariant) -> bool {
        if self.check_token_type(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_token_types(&mut self, token_types: &[TokenTypeVariant]) -> bool {
        for tok in token_types {
            if self.check_token_type(*tok) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check_non_reserved_keyword(&self, value: &str) -> bool {
        is_non_reserved_keyword(self.peek(), value)
    }

    fn check_identifier(&self) -> bool {
        self.check_token_type(TokenTypeVariant::Identifier)
            || self.check_token_type(TokenTypeVariant::QuotedIdentifier)
    }

    fn match_non_reserved_keyword(&mut self, value: &str) -> bool {
        if self.check_non_reserved_keyword(value) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_non_reserved_keyword(&mut self, value: &str) -> anyhow::Result<&'a Token> {
        if self.check_non_reserved_keyword(value) {
            Ok(self.advance())
        } else {
            let err_msg = format!("Expected `{}`.", value.to_uppercase());
            Err(anyhow!(self.error(self.peek(), &err_msg)))
        }
    }

    fn consume_one_of_non_reserved_keywords(
        &mut self,
        values: &[&str],
    ) -> anyhow::Result<&'a Token> {
        for value in values {
            if self.check_non_reserved_keyword(value) {
                return Ok(self.advance());
            }
        }
        let err_msg = values
            .iter()
            .map(|el| format!("`{}`", el.to_uppercase()))
            .collect::<Vec<String>>()
            .join(" or ");
        Err(anyhow!(self.error(
            self.peek(),
            &format!("Expected one of: {}.", err_msg)
        )))
    }

    fn consume(&mut self, token_type: TokenTypeVariant) -> anyhow::Result<&'a Token> {
        if self.check_token_type(token_type) {
            Ok(self.advance())
        } else {
            let err_msg = format!("Expected `{}`.", token_type.variant_str());
            Err(anyhow!(self.error(self.peek(), &err_msg)))
        }
    }

    fn match_identifier(&mut self) -> bool {
        self.match_token_types(&[
            TokenTypeVariant::Identifier,
            TokenTypeVariant::QuotedIdentifier,
        ])
    }

    fn consume_identifier(&mut self) -> anyhow::Result<Identifier> {
        let token = self.consume_one_of(&[
            TokenTypeVariant::Identifier,
            TokenTypeVariant::QuotedIdentifier,
        ])?;
        Ok(token_identifier(token))
    }

    fn consume_one_of(&mut self, token_types: &[TokenTypeVariant]) -> anyhow::Result<&'a Token> {
        for token_type in token_types {
            if self.check_token_type(*token_type) {
                return Ok(self.advance());
            }
        }
        let err_msg = token_types
            .iter()
            .map(|el| format!("`{}`", el.variant_str()))
            .collect::<Vec<String>>()
            .join(" or ");
        Err(anyhow!(self.error(
            self.peek(),
            &format!("Expected one of: {}.", err_msg)
        )))
    }

    fn error(&self, token: &Token, message: &str) -> String {
        format!(
            "[line {}, col {}] Error {}: {}",
            token.line,
            token.col,
            &format!("at '{}'", token.lexeme),
            message
        )
    }

    // query -> statement (";" statement)* [";"]
    fn parse_query(&mut self) -> anyhow::Result<Ast> {
        let mut statements = vec![];

        loop {
            while self.match_token_type(TokenTypeVariant::Semicolon) {}
            if self.check_token_type(TokenTypeVariant::Eof) {
                break;
            }

            statements.push(self.parse_statement()?);

            if !self.match_token_type(TokenTypeVariant::Semicolon) {
                break;
            }
        }

        self.consume(TokenTypeVariant::Eof)?;
        Ok(Ast { statements })
    }

    // statement -> query_statement | insert_statement | create_as_statement | raw_statement
    fn parse_statement(&mut self) -> anyhow::Result<Statement> {
        let peek = self.peek();

        let statement = match &peek.kind {
            TokenType::With | TokenType::Select | TokenType::Values | TokenType::LeftParen => {
                self.parse_query_statement()?
            }
            TokenType::Create if self.check_create_as() => self.parse_create_as_statement()?,
            TokenType::Identifier(keyword)
                if keyword.eq_ignore_ascii_case("insert") && self.check_insert_query() =>
            {
                self.parse_insert_statement()?
            }
            _ => self.parse_raw_statement()?,
        };
        Ok(statement)
    }

    // query_statement -> query_expr
    fn parse_query_statement(&mut self) -> anyhow::Result<Statement> {
        let query = self.parse_query_expr()?;
        Ok(Statement::Query(QueryStatement { query }))
    }

    // raw_statement -> any token sequence up to a top level ";"
    fn parse_raw_statement(&mut self) -> anyhow::Result<Statement> {
        let first = self.peek();
        let mut last = first;
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenType::Eof => break,
                TokenType::Semicolon if depth == 0 => break,
                TokenType::LeftParen => depth += 1,
                TokenType::RightParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            last = self.advance();
        }
        let sql = self
            .source
            .get(first.start..last.end)
            .ok_or_else(|| anyhow!(self.error(first, "Statement is not part of the source.")))?;
        Ok(Statement::Raw(RawStatement {
            sql: sql.to_owned(),
        }))
    }

    fn check_query_start(&self, i: usize) -> bool {
        let mut i = i;
        while self.peek_next_i(i).kind == TokenType::LeftParen {
            i += 1;
        }
        matches!(
            self.peek_next_i(i).kind,
            TokenType::With | TokenType::Select | TokenType::Values
        )
    }

    // Returns the offset after a dotted name starting at `i`, if there is one.
    fn lookahead_path(&self, i: usize) -> Option<usize> {
        let mut i = i;
        loop {
            match self.peek_next_i(i).kind {
                TokenType::Identifier(_) | TokenType::QuotedIdentifier(_) => i += 1,
                _ => return None,
            }
            if self.peek_next_i(i).kind != TokenType::Dot {
                return Some(i);
            }
            i += 1;
        }
    }

    fn check_create_as(&self) -> bool {
        let keyword_at = |i: usize, value: &str| is_non_reserved_keyword(self.peek_next_i(i), value);

        let mut i = 1;
        if self.peek_next_i(i).kind == TokenType::Or {
            if !keyword_at(i + 1, "replace") {
                return false;
            }
            i += 2;
        }
        if keyword_at(i, "temp") || keyword_at(i, "temporary") || keyword_at(i, "transient") {
            i += 1;
        }
        if keyword_at(i, "table") || keyword_at(i, "view") {
            i += 1;
        } else if keyword_at(i, "materialized") && keyword_at(i + 1, "view") {
            i += 2;
        } else {
            return false;
        }
        if keyword_at(i, "if")
            && self.peek_next_i(i + 1).kind == TokenType::Not
            && self.peek_next_i(i + 2).kind == TokenType::Exists
        {
            i += 3;
        }
        let Some(mut i) = self.lookahead_path(i) else {
            return false;
        };
        if keyword_at(i, "copy") && keyword_at(i + 1, "grants") {
            i += 2;
        }
        self.peek_next_i(i).kind == TokenType::As && self.check_query_start(i + 1)
    }

    // create_as_statement ->
    // "CREATE" ["OR" "REPLACE"] ["TEMP" | "TEMPORARY" | "TRANSIENT"]
    // ("TABLE" | "VIEW" | "MATERIALIZED" "VIEW") ["IF" "NOT" "EXISTS"] path
    // ["COPY" "GRANTS"] "AS" query_expr
    fn parse_create_as_statement(&mut self) -> anyhow::Result<Statement> {
        self.consume(TokenTypeVariant::Create)?;
        let replace = self.match_token_type(TokenTypeVariant::Or);
        if replace {
            self.consume_non_reserved_keyword("replace")?;
        }

        let modifier = if self.match_non_reserved_keyword("temp") {
            Some(CreateModifier::Temp)
        } else if self.match_non_reserved_keyword("temporary") {
            Some(CreateModifier::Temporary)
        } else if self.match_non_reserved_keyword("transient") {
            Some(CreateModifier::Transient)
        } else {
            None
        };

        let kind = if self.match_non_reserved_keyword("materialized") {
            self.consume_non_reserved_keyword("view")?;
            CreateKind::MaterializedView
        } else {
            let tok = self.consume_one_of_non_reserved_keywords(&["table", "view"])?;
            if is_non_reserved_keyword(tok, "view") {
                CreateKind::View
            } else {
                CreateKind::Table
            }
        };

        let if_not_exists = self.match_non_reserved_keyword("if");
        if if_not_exists {
            self.consume(TokenTypeVariant::Not)?;
            self.consume(TokenTypeVariant::Exists)?;
        }

        let name = self.parse_path()?;

        let copy_grants = self.match_non_reserved_keyword("copy");
        if copy_grants {
            self.consume_non_reserved_keyword("grants")?;
        }

        self.consume(TokenTypeVariant::As)?;
        let query = self.parse_query_expr()?;

        Ok(Statement::CreateAs(CreateAsStatement {
            replace,
            modifier,
            kind,
            if_not_exists,
            name,
            copy_grants,
            query,
        }))
    }

    fn check_insert_query(&self) -> bool {
        if self.peek_next_i(1).kind != TokenType::Into {
            return false;
        }
        let Some(mut i) = self.lookahead_path(2) else {
            return false;
        };
        if self.peek_next_i(i).kind == TokenType::LeftParen && !self.check_query_start(i) {
            i += 1;
            loop {
                match self.peek_next_i(i).kind {
                    TokenType::Identifier(_) | TokenType::QuotedIdentifier(_) => i += 1,
                    _ => return false,
                }
                match self.peek_next_i(i).kind {
                    TokenType::Comma => i += 1,
                    TokenType::RightParen => {
                        i += 1;
                        break;
                    }
                    _ => return false,
                }
            }
        }
        self.check_query_start(i)
    }

    // insert_statement -> "INSERT" "INTO" path ["(" column ("," column)* ")"] query_expr
    // where:
    // column -> "Identifier" | "QuotedIdentifier"
    fn parse_insert_statement(&mut self) -> anyhow::Result<Statement> {
        self.consume_non_reserved_keyword("insert")?;
        self.consume(TokenTypeVariant::Into)?;
        let table = self.parse_path()?;

        let columns = if self.check_token_type(TokenTypeVariant::LeftParen)
            && !self.check_query_start(0)
        {
            Some(self.parse_identifier_list()?)
        } else {
            None
        };

        let query = self.parse_query_expr()?;
        Ok(Statement::Insert(InsertStatement {
            table,
            columns,
            query,
        }))
    }

    // identifier_list -> "(" ("Identifier" | "QuotedIdentifier") ("," ("Identifier" | "QuotedIdentifier"))* ")"
    fn parse_identifier_list(&mut self) -> anyhow::Result<Vec<Identifier>> {
        self.consume(TokenTypeVariant::LeftParen)?;
        let mut identifiers = vec![self.consume_identifier()?];
        while self.match_token_type(TokenTypeVariant::Comma) {
            identifiers.push(self.consume_identifier()?);
        }
        self.consume(TokenTypeVariant::RightParen)?;
        Ok(identifiers)
    }

    // query_expr ->
    // ["WITH" with_expr]
    // set_operand (set_operator set_operand)*
    // ["ORDER" "BY" order_by_expr]
    // [limit_expr]
    // where:
    // set_operator -> ("UNION" | "INTERSECT" | "EXCEPT") ["ALL" | "DISTINCT"]
    fn parse_query_expr(&mut self) -> anyhow::Result<QueryExpr> {
        let with = if self.match_token_type(TokenTypeVariant::With) {
            Some(self.parse_with_expr()?)
        } else {
            None
        };
        let mut output: QueryExpr = self.parse_set_operand()?;

        loop {
            let peek_token = self.peek();
            let (distinct_operator, all_operator) = match peek_token.kind {
                TokenType::Union => (SetQueryOperator::Union, SetQueryOperator::UnionAll),
                TokenType::Intersect => {
                    (SetQueryOperator::Intersect, SetQueryOperator::IntersectAll)
                }
                TokenType::Except => (SetQueryOperator::Except, SetQueryOperator::ExceptAll),
                _ => break,
            };
            self.advance();
            let set_operator = if self.match_token_type(TokenTypeVariant::All) {
                all_operator
            } else {
                self.match_token_type(TokenTypeVariant::Distinct);
                distinct_operator
            };
            let right_query_expr = self.parse_set_operand()?;
            output = QueryExpr::SetSelect(SetSelectQueryExpr {
                with: None,
                left_query: Box::new(output),
                set_operator,
                right_query: Box::new(right_query_expr),
                order_by: None,
                limit: None,
            })
        }

        let order_by = if self.match_token_type(TokenTypeVariant::Order) {
            self.consume(TokenTypeVariant::By)?;
            Some(OrderBy {
                exprs: self.parse_order_by_expr()?,
            })
        } else {
            None
        };

        let limit = self.parse_limit_expr()?;

        match output {
            QueryExpr::Grouping(ref mut grouping_query_expr) => {
                grouping_query_expr.with = with;
                grouping_query_expr.order_by = order_by;
                grouping_query_expr.limit = limit;
            }
            QueryExpr::Select(ref mut select_query_expr) => {
                select_query_expr.with = with;
                select_query_expr.order_by = order_by;
                select_query_expr.limit = limit;
            }
            QueryExpr::SetSelect(ref mut set_select_query_expr) => {
                set_select_query_expr.with = with;
                set_select_query_expr.order_by = order_by;
                set_select_query_expr.limit = limit;
            }
            QueryExpr::Values(ref mut values_query_expr) => {
                values_query_expr.with = with;
                values_query_expr.order_by = order_by;
                values_query_expr.limit = limit;
            }
        }

        Ok(output)
    }

    // set_operand -> select | values | "(" query_expr ")"
    fn parse_set_operand(&mut self) -> anyhow::Result<QueryExpr> {
        if self.match_token_type(TokenTypeVariant::LeftParen) {
            let query_expr = self.parse_query_expr()?;
            self.consume(TokenTypeVariant::RightParen)?;
            Ok(QueryExpr::Grouping(GroupingQueryExpr {
                with: None,
                query: Box::new(query_expr),
                order_by: None,
                limit: None,
            }))
        } else if self.check_token_type(TokenTypeVariant::Values) {
            self.parse_values()
        } else {
            let select = self.parse_select()?;
            Ok(QueryExpr::Select(SelectQueryExpr {
                with: None,
                select,
                order_by: None,
                limit: None,
            }))
        }
    }

    // values -> "VALUES" "(" expr ("," expr)* ")" ("," "(" expr ("," expr)* ")")*
    fn parse_values(&mut self) -> anyhow::Result<QueryExpr> {
        self.consume(TokenTypeVariant::Values)?;
        let mut rows = vec![];
        loop {
            self.consume(TokenTypeVariant::LeftParen)?;
            rows.push(self.parse_expr_list()?);
            self.consume(TokenTypeVariant::RightParen)?;
            if !self.match_token_type(TokenTypeVariant::Comma) {
                break;
            }
        }
        Ok(QueryExpr::Values(ValuesQueryExpr {
            with: None,
            rows,
            order_by: None,
            limit: None,
        }))
    }

    // limit_expr -> ["LIMIT" ("ALL" | expr)] ["OFFSET" expr ["ROW" | "ROWS"]] (in any order)
    fn parse_limit_expr(&mut self) -> anyhow::Result<Option<Limit>> {
        let mut count = None;
        let mut offset = None;
        loop {
            if count.is_none() && self.match_token_type(TokenTypeVariant::Limit) {
                if !self.match_token_type(TokenTypeVariant::All) {
                    count = Some(Box::new(self.parse_expr()?));
                }
            } else if offset.is_none() && self.match_token_type(TokenTypeVariant::Offset) {
                offset = Some(Box::new(self.parse_expr()?));
                let _ = self.match_non_reserved_keyword("rows")
                    || self.match_non_reserved_keyword("row");
            } else {
                break;
            }
        }
        if count.is_none() && offset.is_none() {
            return Ok(None);
        }
        Ok(Some(Limit { count, offset }))
    }

    // with_expr -> ["RECURSIVE"] cte ("," cte)*
    // where:
    // cte -> ("Identifier" | "QuotedIdentifier") [identifier_list] "AS" [["NOT"] "MATERIALIZED"] "(" query_expr ")"
    fn parse_with_expr(&mut self) -> anyhow::Result<With> {
        let recursive = self.match_token_type(TokenTypeVariant::Recursive);
        let mut ctes = vec![];
        loop {
            let name = self.consume_identifier()?;
            let columns = if self.check_token_type(TokenTypeVariant::LeftParen) {
                Some(self.parse_identifier_list()?)
            } else {
                None
            };
            self.consume(TokenTypeVariant::As)?;
            let materialized = if self.match_non_reserved_keyword("materialized") {
                Some(true)
            } else if self.check_token_type(TokenTypeVariant::Not)
                && is_non_reserved_keyword(self.peek_next_i(1), "materialized")
            {
                self.advance();
                self.advance();
                Some(false)
            } else {
                None
            };
            self.consume(TokenTypeVariant::LeftParen)?;
            let query = self.parse_query_expr()?;
            self.consume(TokenTypeVariant::RightParen)?;
            ctes.push(Cte {
                name,
                columns,
                materialized,
                query,
            });

            if !self.match_token_type(TokenTypeVariant::Comma) {
                break;
            }
        }
        Ok(With { recursive, ctes })
    }

    // order_by_expr -> order_by_expr_item ("," order_by_expr_item)*
    // where:
    // order_by_expr_item -> expr [("ASC" | "DESC")] [("NULLS" "FIRST" | "NULLS" "LAST")]
    fn parse_order_by_expr(&mut self) -> anyhow::Result<Vec<OrderByExpr>> {
        let mut order_by_exprs = vec![];

        loop {
            let expr = self.parse_expr()?;

            let asc_desc = if self.match_token_type(TokenTypeVariant::Asc) {
                Some(OrderBySortDirection::Asc)
            } else if self.match_token_type(TokenTypeVariant::Desc) {
                Some(OrderBySortDirection::Desc)
            } else {
                None
            };

            let nulls = if self.match_non_reserved_keyword("nulls") {
                let tok = self.consume_one_of_non_reserved_keywords(&["first", "last"])?;
                if is_non_reserved_keyword(tok, "first") {
                    Some(OrderByNulls::First)
                } else {
                    Some(OrderByNulls::Last)
                }
            } else {
                None
            };

            order_by_exprs.push(OrderByExpr {
                expr,
                sort_direction: asc_desc,
                nulls,
            });

            if !self.match_token_type(TokenTypeVariant::Comma) {
                break;
            }
        }

        Ok(order_by_exprs)
    }

    // select ->
    // "SELECT"
    // ["ALL" | "DISTINCT" ["ON" "(" expr ("," expr)* ")"]]
    // select_expr ("," select_expr)*
    // ["FROM" from_expr]
    // ["WHERE" expr]
    // ["GROUP" "BY" group_by_expr]
    // ["HAVING" expr]
    // ["QUALIFY" expr]
    // ["WINDOW" window]
    fn parse_select(&mut self) -> anyhow::Result<Select> {
        self.consume(TokenTypeVariant::Select)?;

        let distinct = if self.match_token_type(TokenTypeVariant::Distinct) {
            if self.match_token_type(TokenTypeVariant::On) {
                self.consume(TokenTypeVariant::LeftParen)?;
                let exprs = self.parse_expr_list()?;
                self.consume(TokenTypeVariant::RightParen)?;
                Some(Distinct::On(exprs))
            } else {
                Some(Distinct::Distinct)
            }
        } else {
            self.match_token_type(TokenTypeVariant::All);
            None
        };

        let mut select_exprs = vec![self.parse_select_expr()?];
        while self.match_token_type(TokenTypeVariant::Comma) {
            select_exprs.push(self.parse_select_expr()?);
        }

        let from = if self.match_token_type(TokenTypeVariant::From) {
            Some(self.parse_from_expr()?)
        } else {
            None
        };

        let r#where = if self.match_token_type(TokenTypeVariant::Where) {
            Some(Where {
                expr: Box::new(self.parse_expr()?),
            })
        } else {
            None
        };

        let group_by = if self.match_token_type(TokenTypeVariant::Group) {
            self.consume(TokenTypeVariant::By)?;
            Some(GroupBy {
                expr: self.parse_group_by_expr()?,
            })
        } else {
            None
        };

        let having = if self.match_token_type(TokenTypeVariant::Having) {
            Some(Having {
                expr: Box::new(self.parse_expr()?),
            })
        } else {
            None
        };

        // WINDOW and QUALIFY are accepted in either order
        let mut window = if self.check_token_type(TokenTypeVariant::Window) {
            Some(self.parse_window()?)
        } else {
            None
        };

        let qualify = if self.match_token_type(TokenTypeVariant::Qualify) {
            Some(Qualify {
                expr: Box::new(self.parse_expr()?),
            })
        } else {
            None
        };

        if window.is_none() && self.check_token_type(TokenTypeVariant::Window) {
            window = Some(self.parse_window()?);
        }

        Ok(Select {
            distinct,
            exprs: select_exprs,
            from,
            r#where,
            group_by,
            having,
            qualify,
            window,
        })
    }

    // Lookahead for `qualifier.*` in a select list.
    fn check_qualified_star(&self) -> bool {
        let mut i = 0;
        loop {
            match self.peek_next_i(i).kind {
                TokenType::Identifier(_) | TokenType::QuotedIdentifier(_) => {}
                _ => return false,
            }
            if self.peek_next_i(i + 1).kind != TokenType::Dot {
                return false;
            }
            if self.peek_next_i(i + 2).kind == TokenType::Star {
                return true;
            }
            i += 2;
        }
    }

    // select_expr -> "*" [exclude] | path "." "*" [exclude] | expr [["AS"] "Identifier"]
    fn parse_select_expr(&mut self) -> anyhow::Result<SelectExpr> {
        if self.match_token_type(TokenTypeVariant::Star) {
            let exclude = self.parse_exclude()?;
            return Ok(SelectExpr::All(SelectAllExpr { exclude }));
        }

        if self.check_qualified_star() {
            let mut qualifier = vec![self.consume_identifier()?];
            loop {
                self.consume(TokenTypeVariant::Dot)?;
                if self.match_token_type(TokenTypeVariant::Star) {
                    break;
                }
                qualifier.push(self.consume_identifier()?);
            }
            let exclude = self.parse_exclude()?;
            return Ok(SelectExpr::ColAll(SelectColAllExpr { qualifier, exclude }));
        }

        let expr = self.parse_expr()?;
        let alias = self.parse_as_alias()?;
        Ok(SelectExpr::Col(SelectColExpr { expr, alias }))
    }

    // exclude -> "EXCLUDE" (identifier_list | ("Identifier" | "QuotedIdentifier"))
    fn parse_exclude(&mut self) -> anyhow::Result<Option<Vec<Identifier>>> {
        if !self.match_non_reserved_keyword("exclude") {
            return Ok(None);
        }
        if self.check_token_type(TokenTypeVariant::LeftParen) {
            Ok(Some(self.parse_identifier_list()?))
        } else {
            Ok(Some(vec![self.consume_identifier()?]))
        }
    }

    // from_expr -> from_item (join)*
    // where:
    // join -> "," from_item
    //   | "CROSS" "JOIN" from_item
    //   | ["NATURAL"] join_op from_item [cond]
    // join_op -> ["INNER"] "JOIN" | ("LEFT" | "RIGHT" | "FULL") ["OUTER"] "JOIN"
    fn parse_from_expr(&mut self) -> anyhow::Result<From> {
        let source = self.parse_from_item()?;
        let mut joins = vec![];

        loop {
            if self.match_token_type(TokenTypeVariant::Comma) {
                let item = self.parse_from_item()?;
                joins.push(Join {
                    kind: JoinKind::Comma,
                    natural: false,
                    item,
                    cond: None,
                });
                continue;
            }
            if self.match_token_type(TokenTypeVariant::Cross) {
                self.consume(TokenTypeVariant::Join)?;
                let item = self.parse_from_item()?;
                joins.push(Join {
                    kind: JoinKind::Cross,
                    natural: false,
                    item,
                    cond: None,
                });
                continue;
            }

            let natural = self.match_token_type(TokenTypeVariant::Natural);
            let kind = match self.peek().kind {
                TokenType::Inner | TokenType::Join => {
                    self.match_token_type(TokenTypeVariant::Inner);
                    JoinKind::Inner
                }
                TokenType::Left => {
                    self.advance();
                    self.match_token_type(TokenTypeVariant::Outer);
                    JoinKind::Left
                }
                TokenType::Right => {
                    self.advance();
                    self.match_token_type(TokenTypeVariant::Outer);
                    JoinKind::Right
                }
                TokenType::Full => {
                    self.advance();
                    self.match_token_type(TokenTypeVariant::Outer);
                    JoinKind::Full
                }
                _ => {
                    if natural {
                        return Err(anyhow!(self.error(self.peek(), "Expected `JOIN`.")));
                    }
                    break;
                }
            };
            self.consume(TokenTypeVariant::Join)?;
            let item = self.parse_from_item()?;
            let cond = if natural {
                None
            } else {
                Some(self.parse_cond()?)
            };
            joins.push(Join {
                kind,
                natural,
                item,
                cond,
            });
        }
        Ok(From { source, joins })
    }

    // cond -> "ON" expr | "USING" identifier_list
    fn parse_cond(&mut self) -> anyhow::Result<JoinCondition> {
        if self.match_token_type(TokenTypeVariant::On) {
            Ok(JoinCondition::On(self.parse_expr()?))
        } else if self.check_token_type(TokenTypeVariant::Using) {
            self.advance();
            Ok(JoinCondition::Using(self.parse_identifier_list()?))
        } else {
            Err(anyhow!(
                self.error(self.peek(), "Expected `ON` or `USING`.")
            ))
        }
    }

    // from_item ->
    // ["LATERAL"] "(" query_expr ")" [table_alias]
    // | ["LATERAL"] function_expr [table_alias]
    // | "(" from_expr ")" [table_alias]
    // | path [table_alias]
    fn parse_from_item(&mut self) -> anyhow::Result<FromItem> {
        let lateral = self.match_token_type(TokenTypeVariant::Lateral);

        if self.check_token_type(TokenTypeVariant::LeftParen) {
            if self.check_query_start(0) {
                self.advance();
                let query = self.parse_query_expr()?;
                self.consume(TokenTypeVariant::RightParen)?;
                let alias = self.parse_table_alias()?;
                return Ok(FromItem::Subquery(FromSubqueryExpr {
                    lateral,
                    query: Box::new(query),
                    alias,
                }));
            }
            if lateral {
                return Err(anyhow!(self.error(self.peek(), "Expected subquery.")));
            }
            self.advance();
            let from = self.parse_from_expr()?;
            self.consume(TokenTypeVariant::RightParen)?;
            return Ok(FromItem::Nested(Box::new(from)));
        }

        let is_function = self
            .lookahead_path(0)
            .is_some_and(|i| self.peek_next_i(i).kind == TokenType::LeftParen);
        if is_function {
            let function = self.parse_function_expr()?;
            let alias = self.parse_table_alias()?;
            return Ok(FromItem::Function(FromFunctionExpr {
                lateral,
                function,
                alias,
            }));
        }
        if lateral {
            return Err(anyhow!(
                self.error(self.peek(), "Expected subquery or function.")
            ));
        }

        let path = self.parse_path()?;
        let alias = self.parse_table_alias()?;
        Ok(FromItem::Table(FromTableExpr { path, alias }))
    }

    // table_alias -> as_alias [identifier_list]
    fn parse_table_alias(&mut self) -> anyhow::Result<Option<TableAlias>> {
        let Some(name) = self.parse_as_alias()? else {
            return Ok(None);
        };
        let columns = if self.check_token_type(TokenTypeVariant::LeftParen) {
            Some(self.parse_identifier_list()?)
        } else {
            None
        };
        Ok(Some(TableAlias { name, columns }))
    }

    // as_alias -> ["AS"] ("Identifier" | "QuotedIdentifier")
    fn parse_as_alias(&mut self) -> anyhow::Result<Option<Identifier>> {
        if self.match_token_type(TokenTypeVariant::As) {
            return Ok(Some(self.consume_identifier()?));
        }
        if self.match_identifier() {
            return Ok(Some(token_identifier(self.peek_prev())));
        }
        Ok(None)
    }

    // path -> ("Identifier" | "QuotedIdentifier") ("." ("Identifier" | "QuotedIdentifier"))*
    fn parse_path(&mut self) -> anyhow::Result<Vec<Identifier>> {
        let mut path = vec![self.consume_identifier()?];
        while self.match_token_type(TokenTypeVariant::Dot) {
            path.push(self.consume_identifier()?);
        }
        Ok(path)
    }

    // group_by_expr -> "ALL" | expr ("," expr)*
    fn parse_group_by_expr(&mut self) -> anyhow::Result<GroupByExpr> {
        if self.match_token_type(TokenTypeVariant::All) {
            return Ok(GroupByExpr::All);
        }
        Ok(GroupByExpr::Items(self.parse_expr_list()?))
    }

    fn parse_expr_list(&mut self) -> anyhow::Result<Vec<Expr>> {
        let mut exprs = vec![self.parse_expr()?];
        while self.match_token_type(TokenTypeVariant::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    // frame_bound -> "UNBOUNDED" ("PRECEDING" | "FOLLOWING") | "CURRENT" "ROW" | other_op_expr ("PRECEDING" | "FOLLOWING")
    fn parse_frame_bound(&mut self) -> anyhow::Result<FrameBound> {
        if self.match_non_reserved_keyword("unbounded") {
            let tok = self.consume_one_of_non_reserved_keywords(&["preceding", "following"])?;
            return Ok(if is_non_reserved_keyword(tok, "preceding") {
                FrameBound::UnboundedPreceding
            } else {
                FrameBound::UnboundedFollowing
            });
        }
        if self.match_non_reserved_keyword("current") {
            self.consume_non_reserved_keyword("row")?;
            return Ok(FrameBound::CurrentRow);
        }
        let offset = Box::new(self.parse_other_op_expr()?);
        let tok = self.consume_one_of_non_reserved_keywords(&["preceding", "following"])?;
        Ok(if is_non_reserved_keyword(tok, "preceding") {
            FrameBound::Preceding(offset)
        } else {
            FrameBound::Following(offset)
        })
    }

    // window_frame -> ("ROWS" | "RANGE" | "GROUPS") (frame_bound | "BETWEEN" frame_bound "AND" frame_bound)
    fn parse_window_frame(&mut self) -> anyhow::Result<WindowFrame> {
        let tok = self.consume_one_of_non_reserved_keywords(&["rows", "range", "groups"])?;
        let kind = if is_non_reserved_keyword(tok, "rows") {
            WindowFrameKind::Rows
        } else if is_non_reserved_keyword(tok, "range") {
            WindowFrameKind::Range
        } else {
            WindowFrameKind::Groups
        };

        if self.match_token_type(TokenTypeVariant::Between) {
            let start = self.parse_frame_bound()?;
            self.consume(TokenTypeVariant::And)?;
            let end = self.parse_frame_bound()?;
            Ok(WindowFrame {
                kind,
                start,
                end: Some(end),
            })
        } else {
            Ok(WindowFrame {
                kind,
                start: self.parse_frame_bound()?,
                end: None,
            })
        }
    }

    fn check_window_frame(&self) -> bool {
        ["rows", "range", "groups"]
            .iter()
            .any(|kw| self.check_non_reserved_keyword(kw))
    }

    // named_window_expr -> ("Identifier" | "QuotedIdentifier") | "(" [("Identifier" | "QuotedIdentifier")] [partition_by] [order_by] [frame] ")"
    // where:
    // partition_by -> "PARTITION" "BY" expr ("," expr)*
    // order_by -> "ORDER" "BY" order_by_expr
    // frame -> window_frame
    fn parse_named_window_expr(&mut self) -> anyhow::Result<NamedWindowExpr> {
        if !self.match_token_type(TokenTypeVariant::LeftParen) {
            return Ok(NamedWindowExpr::Reference(self.consume_identifier()?));
        }
        let window_name = if self.check_identifier()
            && !self.check_non_reserved_keyword("partition")
            && !self.check_window_frame()
        {
            Some(self.consume_identifier()?)
        } else {
            None
        };
        let partition_by = if self.match_non_reserved_keyword("partition") {
            self.consume(TokenTypeVariant::By)?;
            Some(self.parse_expr_list()?)
        } else {
            None
        };

        let order_by = if self.match_token_type(TokenTypeVariant::Order) {
            self.consume(TokenTypeVariant::By)?;
            Some(self.parse_order_by_expr()?)
        } else {
            None
        };

        let frame = if self.check_window_frame() {
            Some(self.parse_window_frame()?)
        } else {
            None
        };
        self.consume(TokenTypeVariant::RightParen)?;

        Ok(NamedWindowExpr::WindowSpec(WindowSpec {
            window_name,
            partition_by,
            order_by,
            frame,
        }))
    }

    // window -> "WINDOW" ("Identifier" | "QuotedIdentifier") "AS" named_window_expr ("," ("Identifier" | "QuotedIdentifier") "AS" named_window_expr)*
    fn parse_window(&mut self) -> anyhow::Result<Window> {
        self.consume(TokenTypeVariant::Window)?;
        let mut named_windows = vec![];
        loop {
            let name = self.consume_identifier()?;
            self.consume(TokenTypeVariant::As)?;
            let window = self.parse_named_window_expr()?;
            named_windows.push(NamedWindow { name, window });
            if !self.match_token_type(TokenTypeVariant::Comma) {
                break;
            }
        }
        Ok(Window { named_windows })
    }

    // expr -> or_expr
    fn parse_expr(&mut self) -> anyhow::Result<Expr> {
        self.parse_or_expr()
    }

    /// Util function to parse a standard binary rule expression of kind
    ///
    /// `parse_rule -> next_parsing_rule (("T1" | "T2" | ...) next_parsing_rule)*`
    fn parse_standard_binary_expr(
        &mut self,
        token_types_to_match: &[TokenTypeVariant],
        next_parsing_rule_fn: impl Fn(&mut Self) -> anyhow::Result<Expr>,
    ) -> anyhow::Result<Expr> {
        let mut output = next_parsing_rule_fn(self)?;

        while self.match_token_types(token_types_to_match) {
            let operator = binary_operator(self.peek_prev())
                .ok_or_else(|| anyhow!(self.error(self.peek_prev(), "Expected operator.")))?;
            let right = next_parsing_rule_fn(self)?;
            output = Expr::Binary(BinaryExpr {
                left: Box::new(output),
                operator,
                right: Box::new(right),
            });
        }

        Ok(output)
    }

    // or_expr -> and_expr ("OR" and_expr)*
    fn parse_or_expr(&mut self) -> anyhow::Result<Expr> {
        self.parse_standard_binary_expr(&[TokenTypeVariant::Or], Self::parse_and_expr)
    }

    // and_expr -> not_expr ("AND" not_expr)*
    fn parse_and_expr(&mut self) -> anyhow::Result<Expr> {
        self.parse_standard_binary_expr(&[TokenTypeVariant::And], Self::parse_not_expr)
    }

    // not_expr -> "NOT" not_expr | comparison_expr
    fn parse_not_expr(&mut self) -> anyhow::Result<Expr> {
        if self.match_token_type(TokenTypeVariant::Not) {
            return Ok(Expr::Unary(UnaryExpr {
                operator: UnaryOperator::Not,
                right: Box::new(self.parse_not_expr()?),
            }));
        }
        self.parse_comparison_expr()
    }

    // comparison_expr ->
    // other_op_expr
    // | other_op_expr (("=" | ">" | "<" | ">=" | "<=" | "!=" | "<>") other_op_expr)*
    // | other_op_expr "IS" ["NOT"] ("TRUE" | "FALSE" | "NULL" | "DISTINCT" "FROM" other_op_expr)
    // | other_op_expr ["NOT"] "IN" ("(" query_expr ")" | "(" expr ("," expr)* ")")
    // | other_op_expr ["NOT"] "BETWEEN" other_op_expr "AND" other_op_expr
    // | other_op_expr ["NOT"] ("LIKE" | "ILIKE") other_op_expr ["ESCAPE" other_op_expr]
    fn parse_comparison_expr(&mut self) -> anyhow::Result<Expr> {
        let mut output = self.parse_other_op_expr()?;

        loop {
            let curr_token = self.peek();
            match curr_token.kind {
                TokenType::Equal
                | TokenType::Greater
                | TokenType::Less
                | TokenType::GreaterEqual
                | TokenType::LessEqual
                | TokenType::BangEqual
                | TokenType::NotEqual => {
                    self.advance();
                    let operator = binary_operator(curr_token)
                        .ok_or_else(|| anyhow!(self.error(curr_token, "Expected operator.")))?;
                    let right = self.parse_other_op_expr()?;
                    output = Expr::Binary(BinaryExpr {
                        left: Box::new(output),
                        operator,
                        right: Box::new(right),
                    })
                }
                TokenType::Is => {
                    self.advance();
                    let negated = self.match_token_type(TokenTypeVariant::Not);
                    let test = if self.match_token_type(TokenTypeVariant::Null) {
                        IsTest::Null
                    } else if self.match_token_type(TokenTypeVariant::True) {
                        IsTest::True
                    } else if self.match_token_type(TokenTypeVariant::False) {
                        IsTest::False
                    } else if self.match_token_type(TokenTypeVariant::Distinct) {
                        self.consume(TokenTypeVariant::From)?;
                        IsTest::DistinctFrom(Box::new(self.parse_other_op_expr()?))
                    } else {
                        return Err(anyhow!(self.error(
                            self.peek(),
                            "Expected one of: `NULL`, `TRUE`, `FALSE`, `DISTINCT`."
                        )));
                    };
                    output = Expr::Is(IsExpr {
                        expr: Box::new(output),
                        negated,
                        test,
                    })
                }
                TokenType::Not
                    if matches!(
                        self.peek_next_i(1).kind,
                        TokenType::In | TokenType::Between | TokenType::Like | TokenType::Ilike
                    ) =>
                {
                    self.advance();
                    output = self.parse_comparison_suffix(output, true)?;
                }
                TokenType::In | TokenType::Between | TokenType::Like | TokenType::Ilike => {
                    output = self.parse_comparison_suffix(output, false)?;
                }
                _ => {
                    break;
                }
            }
        }
        Ok(output)
    }

    fn parse_comparison_suffix(&mut self, left: Expr, negated: bool) -> anyhow::Result<Expr> {
        let tok = self.consume_one_of(&[
            TokenTypeVariant::In,
            TokenTypeVariant::Between,
            TokenTypeVariant::Like,
            TokenTypeVariant::Ilike,
        ])?;
        let expr = Box::new(left);
        match tok.kind {
            TokenType::In => {
                if self.check_query_start(0) {
                    self.consume(TokenTypeVariant::LeftParen)?;
                    let query = self.parse_query_expr()?;
                    self.consume(TokenTypeVariant::RightParen)?;
                    Ok(Expr::InQuery(InQueryExpr {
                        expr,
                        query: Box::new(query),
                        negated,
                    }))
                } else {
                    self.consume(TokenTypeVariant::LeftParen)?;
                    let list = self.parse_expr_list()?;
                    self.consume(TokenTypeVariant::RightParen)?;
                    Ok(Expr::InList(InListExpr {
                        expr,
                        list,
                        negated,
                    }))
                }
            }
            TokenType::Between => {
                let low = Box::new(self.parse_other_op_expr()?);
                self.consume(TokenTypeVariant::And)?;
                let high = Box::new(self.parse_other_op_expr()?);
                Ok(Expr::Between(BetweenExpr {
                    expr,
                    low,
                    high,
                    negated,
                }))
            }
            _ => {
                let case_insensitive = tok.kind == TokenType::Ilike;
                let pattern = Box::new(self.parse_other_op_expr()?);
                let escape = if self.match_non_reserved_keyword("escape") {
                    Some(Box::new(self.parse_other_op_expr()?))
                } else {
                    None
                };
                Ok(Expr::Like(LikeExpr {
                    expr,
                    pattern,
                    negated,
                    case_insensitive,
                    escape,
                }))
            }
        }
    }

    // other_op_expr -> add_expr (("||" | "->" | "->>") add_expr)*
    fn parse_other_op_expr(&mut self) -> anyhow::Result<Expr> {
        self.parse_standard_binary_expr(
            &[
                TokenTypeVariant::ConcatOperator,
                TokenTypeVariant::Arrow,
                TokenTypeVariant::LongArrow,
            ],
            Self::parse_add_expr,
        )
    }

    // add_expr -> mul_expr (("+" | "-") mul_expr)*
    fn parse_add_expr(&mut self) -> anyhow::Result<Expr> {
        self.parse_standard_binary_expr(
            &[TokenTypeVariant::Plus, TokenTypeVariant::Minus],
            Self::parse_mul_expr,
        )
    }

    // mul_expr -> unary_expr (("*" | "/" | "%") unary_expr)*
    fn parse_mul_expr(&mut self) -> anyhow::Result<Expr> {
        self.parse_standard_binary_expr(
            &[
                TokenTypeVariant::Star,
                TokenTypeVariant::Slash,
                TokenTypeVariant::Percent,
            ],
            Self::parse_unary_expr,
        )
    }

    // unary_expr -> ("+" | "-" | "~") unary_expr | postfix_expr
    fn parse_unary_expr(&mut self) -> anyhow::Result<Expr> {
        if self.match_token_types(&[
            TokenTypeVariant::Plus,
            TokenTypeVariant::Minus,
            TokenTypeVariant::BitwiseNot,
        ]) {
            let operator = match self.peek_prev().kind {
                TokenType::Plus => UnaryOperator::Plus,
                TokenType::Minus => UnaryOperator::Minus,
                _ => UnaryOperator::BitwiseNot,
            };
            return Ok(Expr::Unary(UnaryExpr {
                operator,
                right: Box::new(self.parse_unary_expr()?),
            }));
        }
        self.parse_postfix_expr()
    }

    // postfix_expr -> primary_expr ("::" data_type | "[" expr "]")*
    fn parse_postfix_expr(&mut self) -> anyhow::Result<Expr> {
        let mut output = self.parse_primary_expr()?;

        loop {
            if self.match_token_type(TokenTypeVariant::DoubleColon) {
                let r#type = self.parse_data_type()?;
                output = Expr::Cast(CastExpr {
                    expr: Box::new(output),
                    r#type,
                    style: CastStyle::DoubleColon,
                });
            } else if self.match_token_type(TokenTypeVariant::LeftSquare) {
                let index = self.parse_expr()?;
                self.consume(TokenTypeVariant::RightSquare)?;
                output = Expr::Subscript(SubscriptExpr {
                    expr: Box::new(output),
                    index: Box::new(index),
                });
            } else {
                break;
            }
        }
        Ok(output)
    }

    // data_type -> type_name ["(" type_param ("," type_param)* ")"] ("[" ["Number"] "]")*
    // where:
    // type_name -> "Identifier" | "QuotedIdentifier" | "ARRAY" | "INTERVAL"
    //   | "DOUBLE" "PRECISION" | "CHARACTER" "VARYING"
    //   | ("TIMESTAMP" | "TIME") ("WITH" | "WITHOUT") "TIME" "ZONE"
    fn parse_data_type(&mut self) -> anyhow::Result<DataType> {
        let tok = self.consume_one_of(&[
            TokenTypeVariant::Identifier,
            TokenTypeVariant::QuotedIdentifier,
            TokenTypeVariant::Array,
            TokenTypeVariant::Interval,
        ])?;
        let mut name = tok.lexeme.clone();
        let lower_name = name.to_lowercase();

        let extra_words = match lower_name.as_str() {
            "double" if self.check_non_reserved_keyword("precision") => 1,
            "character" | "char" if self.check_non_reserved_keyword("varying") => 1,
            "timestamp" | "time"
                if (self.check_token_type(TokenTypeVariant::With)
                    || self.check_non_reserved_keyword("without"))
                    && is_non_reserved_keyword(self.peek_next_i(1), "time")
                    && is_non_reserved_keyword(self.peek_next_i(2), "zone") =>
            {
                3
            }
            _ => 0,
        };
        for _ in 0..extra_words {
            name.push(' ');
            name.push_str(&self.advance().lexeme);
        }

        let mut parameters = vec![];
        if self.match_token_type(TokenTypeVariant::LeftParen) {
            loop {
                let tok = self.consume_one_of(&[
                    TokenTypeVariant::Number,
                    TokenTypeVariant::Identifier,
                ])?;
                parameters.push(tok.lexeme.clone());
                if !self.match_token_type(TokenTypeVariant::Comma) {
                    break;
                }
            }
            self.consume(TokenTypeVariant::RightParen)?;
        }

        let mut array_dims = 0;
        loop {
            let empty_dim = self.check_token_type(TokenTypeVariant::LeftSquare)
                && self.peek_next_i(1).kind == TokenType::RightSquare;
            if !empty_dim {
                break;
            }
            self.advance();
            self.advance();
            array_dims += 1;
        }

        Ok(DataType {
            name,
            parameters,
            array_dims,
        })
    }

    // cast -> ("CAST" | "TRY_CAST") "(" expr "AS" data_type ")"
    fn parse_cast_fn_expr(&mut self, style: CastStyle) -> anyhow::Result<Expr> {
        self.advance();
        self.consume(TokenTypeVariant::LeftParen)?;
        let expr = self.parse_expr()?;
        self.consume(TokenTypeVariant::As)?;
        let r#type = self.parse_data_type()?;
        self.consume(TokenTypeVariant::RightParen)?;
        Ok(Expr::Cast(CastExpr {
            expr: Box::new(expr),
            r#type,
            style,
        }))
    }

    // extract -> "EXTRACT" "(" field "FROM" expr ")"
    fn parse_extract_fn_expr(&mut self) -> anyhow::Result<Expr> {
        self.consume(TokenTypeVariant::Extract)?;
        self.consume(TokenTypeVariant::LeftParen)?;
        let field = match &self.peek().kind {
            TokenType::Identifier(_) | TokenType::QuotedIdentifier(_) | TokenType::String(_) => {
                self.advance().lexeme.clone()
            }
            _ => {
                return Err(anyhow!(self.error(self.peek(), "Expected date part.")));
            }
        };
        self.consume(TokenTypeVariant::From)?;
        let expr = self.parse_expr()?;
        self.consume(TokenTypeVariant::RightParen)?;
        Ok(Expr::Extract(ExtractExpr {
            field,
            expr: Box::new(expr),
        }))
    }

    // interval_expr -> "INTERVAL" ("String" | "Number" | "(" expr ")") [interval_unit]
    fn parse_interval_expr(&mut self) -> anyhow::Result<Expr> {
        self.consume(TokenTypeVariant::Interval)?;
        let value = match &self.peek().kind {
            TokenType::String(value) => {
                self.advance();
                Expr::String(value.clone())
            }
            TokenType::Number(value) => {
                self.advance();
                Expr::Number(value.clone())
            }
            TokenType::LeftParen => self.parse_primary_expr()?,
            _ => {
                return Err(anyhow!(self.error(self.peek(), "Expected interval value.")));
            }
        };
        let unit = match &self.peek().kind {
            TokenType::Identifier(ident) if INTERVAL_UNITS.contains(&ident.to_lowercase().as_str()) => {
                Some(self.advance().lexeme.clone())
            }
            _ => None,
        };
        Ok(Expr::Interval(IntervalExpr {
            value: Box::new(value),
            unit,
        }))
    }

    // array_expr -> "ARRAY" "[" [expr ("," expr)*] "]" | "[" [expr ("," expr)*] "]" | "ARRAY" "(" query_expr ")"
    fn parse_array_expr(&mut self) -> anyhow::Result<Expr> {
        let style = if self.match_token_type(TokenTypeVariant::Array) {
            if self.match_token_type(TokenTypeVariant::LeftParen) {
                let query = self.parse_query_expr()?;
                self.consume(TokenTypeVariant::RightParen)?;
                return Ok(Expr::ArraySubquery(Box::new(query)));
            }
            ArrayStyle::Keyword
        } else {
            ArrayStyle::Bracket
        };
        self.consume(TokenTypeVariant::LeftSquare)?;
        let exprs = if self.check_token_type(TokenTypeVariant::RightSquare) {
            vec![]
        } else {
            self.parse_expr_list()?
        };
        self.consume(TokenTypeVariant::RightSquare)?;
        Ok(Expr::Array(ArrayExpr { exprs, style }))
    }

    // function_expr -> coalesce | concat | try_cast | generic_function
    fn parse_function_expr(&mut self) -> anyhow::Result<Expr> {
        let is_qualified = self.peek_next_i(1).kind == TokenType::Dot;
        let function_name = self.peek().lexeme.to_lowercase();
        match function_name.as_str() {
            "coalesce" if !is_qualified => {
                self.advance();
                self.consume(TokenTypeVariant::LeftParen)?;
                let exprs = self.parse_expr_list()?;
                self.consume(TokenTypeVariant::RightParen)?;
                Ok(Expr::Function(FunctionExpr::Coalesce(CoalesceFunctionExpr {
                    exprs,
                })))
            }
            "concat" if !is_qualified => {
                self.advance();
                self.consume(TokenTypeVariant::LeftParen)?;
                let values = self.parse_expr_list()?;
                self.consume(TokenTypeVariant::RightParen)?;
                Ok(Expr::Function(FunctionExpr::Concat(ConcatFunctionExpr {
                    values,
                })))
            }
            "try_cast" if !is_qualified => self.parse_cast_fn_expr(CastStyle::TryCast),
            _ => self.parse_generic_function(),
        }
    }

    // generic_function -> function_name "(" ["DISTINCT" | "ALL"] [arg ("," arg)*] ["ORDER" "BY" order_by_expr] ")"
    //   ["WITHIN" "GROUP" "(" "ORDER" "BY" order_by_expr ")"]
    //   ["FILTER" "(" "WHERE" expr ")"]
    //   [("IGNORE" | "RESPECT") "NULLS"]
    //   ["OVER" named_window_expr]
    // where:
    // function_name -> ("Identifier" | "QuotedIdentifier" | "LEFT" | "RIGHT") ("." ("Identifier" | "QuotedIdentifier"))*
    // arg -> "*" | expr
    fn parse_generic_function(&mut self) -> anyhow::Result<Expr> {
        let mut name = vec![];
        let first = self.consume_one_of(&[
            TokenTypeVariant::Identifier,
            TokenTypeVariant::QuotedIdentifier,
            TokenTypeVariant::Left,
            TokenTypeVariant::Right,
        ])?;
        name.push(token_identifier(first));
        while self.match_token_type(TokenTypeVariant::Dot) {
            name.push(self.consume_identifier()?);
        }
        self.consume(TokenTypeVariant::LeftParen)?;

        let distinct = self.match_token_type(TokenTypeVariant::Distinct);
        if !distinct {
            self.match_token_type(TokenTypeVariant::All);
        }

        let mut arguments = vec![];
        if !self.check_token_type(TokenTypeVariant::RightParen)
            && !self.check_token_type(TokenTypeVariant::Order)
        {
            loop {
                if self.match_token_type(TokenTypeVariant::Star) {
                    arguments.push(Expr::Star);
                } else {
                    arguments.push(self.parse_expr()?);
                }
                if !self.match_token_type(TokenTypeVariant::Comma) {
                    break;
                }
            }
        }

        let order_by = if self.match_token_type(TokenTypeVariant::Order) {
            self.consume(TokenTypeVariant::By)?;
            Some(self.parse_order_by_expr()?)
        } else {
            None
        };
        self.consume(TokenTypeVariant::RightParen)?;

        let within_group = if self.check_non_reserved_keyword("within")
            && self.peek_next_i(1).kind == TokenType::Group
        {
            self.advance();
            self.advance();
            self.consume(TokenTypeVariant::LeftParen)?;
            self.consume(TokenTypeVariant::Order)?;
            self.consume(TokenTypeVariant::By)?;
            let exprs = self.parse_order_by_expr()?;
            self.consume(TokenTypeVariant::RightParen)?;
            Some(exprs)
        } else {
            None
        };

        let filter = if self.check_non_reserved_keyword("filter")
            && self.peek_next_i(1).kind == TokenType::LeftParen
        {
            self.advance();
            self.advance();
            self.consume(TokenTypeVariant::Where)?;
            let expr = self.parse_expr()?;
            self.consume(TokenTypeVariant::RightParen)?;
            Some(Box::new(expr))
        } else {
            None
        };

        let nulls = if (self.check_non_reserved_keyword("ignore")
            || self.check_non_reserved_keyword("respect"))
            && is_non_reserved_keyword(self.peek_next_i(1), "nulls")
        {
            let tok = self.advance();
            self.advance();
            if is_non_reserved_keyword(tok, "ignore") {
                Some(FunctionNulls::Ignore)
            } else {
                Some(FunctionNulls::Respect)
            }
        } else {
            None
        };

        let over = if self.check_non_reserved_keyword("over")
            && matches!(
                self.peek_next_i(1).kind,
                TokenType::LeftParen | TokenType::Identifier(_) | TokenType::QuotedIdentifier(_)
            ) {
            self.advance();
            Some(self.parse_named_window_expr()?)
        } else {
            None
        };

        Ok(Expr::GenericFunction(Box::new(GenericFunctionExpr {
            name,
            distinct,
            arguments,
            order_by,
            within_group,
            filter,
            nulls,
            over,
        })))
    }

    // case_expr -> "CASE" [expr] ("WHEN" expr "THEN" expr)+ ["ELSE" expr] "END"
    fn parse_case_expr(&mut self) -> anyhow::Result<Expr> {
        self.consume(TokenTypeVariant::Case)?;

        let case = if self.check_token_type(TokenTypeVariant::When) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        let mut when_thens = vec![];
        while self.match_token_type(TokenTypeVariant::When) {
            let when_expr = self.parse_expr()?;
            self.consume(TokenTypeVariant::Then)?;
            let then_expr = self.parse_expr()?;
            when_thens.push((when_expr, then_expr));
        }
        if when_thens.is_empty() {
            return Err(anyhow!(self.error(self.peek(), "Expected `WHEN`.")));
        }

        let r#else = if self.match_token_type(TokenTypeVariant::Else) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        self.consume(TokenTypeVariant::End)?;

        Ok(Expr::Case(CaseExpr {
            case,
            when_thens,
            r#else,
        }))
    }

    // column_expr -> path
    fn parse_column_expr(&mut self) -> anyhow::Result<Expr> {
        Ok(Expr::Column(ColumnExpr {
            parts: self.parse_path()?,
        }))
    }

    // primary_expr ->
    // "True" | "False" | "Null" | "String" | "Number" | "Placeholder"
    // | type_name "String"
    // | interval_expr | array_expr | case_expr | cast | extract
    // | "EXISTS" "(" query_expr ")"
    // | function_expr | column_expr
    // | "(" expr ")" | "(" expr ("," expr)+ ")" | "(" query_expr ")"
    fn parse_primary_expr(&mut self) -> anyhow::Result<Expr> {
        let peek_token = self.peek();
        let primary_expr = match &peek_token.kind {
            TokenType::True => {
                self.advance();
                Expr::Bool(true)
            }
            TokenType::False => {
                self.advance();
                Expr::Bool(false)
            }
            TokenType::Null => {
                self.advance();
                Expr::Null
            }
            TokenType::Number(num) => {
                self.advance();
                Expr::Number(num.clone())
            }
            TokenType::String(value) => {
                self.advance();
                Expr::String(value.clone())
            }
            TokenType::Placeholder(placeholder) => {
                self.advance();
                Expr::Placeholder(placeholder.clone())
            }
            TokenType::Array | TokenType::LeftSquare => self.parse_array_expr()?,
            TokenType::Case => self.parse_case_expr()?,
            TokenType::Cast => self.parse_cast_fn_expr(CastStyle::Cast)?,
            TokenType::Extract => self.parse_extract_fn_expr()?,
            TokenType::Interval => self.parse_interval_expr()?,
            TokenType::Exists => {
                self.advance();
                self.consume(TokenTypeVariant::LeftParen)?;
                let query = self.parse_query_expr()?;
                self.consume(TokenTypeVariant::RightParen)?;
                Expr::Exists(Box::new(query))
            }
            // Functions whose name is a reserved keyword
            TokenType::Left | TokenType::Right
                if self.peek_next_i(1).kind == TokenType::LeftParen =>
            {
                self.parse_generic_function()?
            }
            TokenType::Identifier(ident) => {
                let next = &self.peek_next_i(1).kind;
                if let TokenType::String(value) = next {
                    self.advance();
                    self.advance();
                    Expr::TypedString(TypedStringExpr {
                        r#type: DataType::simple(ident),
                        value: value.clone(),
                    })
                } else if self
                    .lookahead_path(0)
                    .is_some_and(|i| self.peek_next_i(i).kind == TokenType::LeftParen)
                {
                    self.parse_function_expr()?
                } else {
                    self.parse_column_expr()?
                }
            }
            TokenType::QuotedIdentifier(_) => {
                if self
                    .lookahead_path(0)
                    .is_some_and(|i| self.peek_next_i(i).kind == TokenType::LeftParen)
                {
                    self.parse_function_expr()?
                } else {
                    self.parse_column_expr()?
                }
            }
            TokenType::LeftParen => {
                self.advance();
                // Look ahead to check whether we need to parse a query_expr or an expr
                if self.check_token_type(TokenTypeVariant::With)
                    || self.check_token_type(TokenTypeVariant::Select)
                {
                    let query_expr = self.parse_query_expr()?;
                    self.consume(TokenTypeVariant::RightParen)?;
                    Expr::Query(Box::new(query_expr))
                } else {
                    let expr = self.parse_expr()?;
                    if self.match_token_type(TokenTypeVariant::Comma) {
                        let mut exprs = vec![expr];
                        exprs.extend(self.parse_expr_list()?);
                        self.consume(TokenTypeVariant::RightParen)?;
                        Expr::Tuple(exprs)
                    } else {
                        self.consume(TokenTypeVariant::RightParen)?;
                        Expr::Grouping(GroupingExpr {
                            expr: Box::new(expr),
                        })
                    }
                }
            }
            _ => {
                return Err(anyhow!(self.error(peek_token, "Expected Expression.")));
            }
        };

        Ok(primary_expr)
    }
}

fn is_non_reserved_keyword(token: &Token, value: &str) -> bool {
    match &token.kind {
        TokenType::Identifier(ident) => ident.eq_ignore_ascii_case(value),
        _ => false,
    }
}

fn token_identifier(token: &Token) -> Identifier {
    match &token.kind {
        TokenType::QuotedIdentifier(value) => Identifier::quoted(value),
        _ => Identifier::new(&token.lexeme),
    }
}

fn binary_operator(token: &Token) -> Option<BinaryOperator> {
    let operator = match token.kind {
        TokenType::Or => BinaryOperator::Or,
        TokenType::And => BinaryOperator::And,
        TokenType::Equal => BinaryOperator::Equal,
        TokenType::NotEqual => BinaryOperator::NotEqual,
        TokenType::BangEqual => BinaryOperator::BangEqual,
        TokenType::Less => BinaryOperator::Less,
        TokenType::LessEqual => BinaryOperator::LessEqual,
        TokenType::Greater => BinaryOperator::Greater,
        TokenType::GreaterEqual => BinaryOperator::GreaterEqual,
        TokenType::ConcatOperator => BinaryOperator::Concat,
        TokenType::Arrow => BinaryOperator::Arrow,
        TokenType::LongArrow => BinaryOperator::LongArrow,
        TokenType::Plus => BinaryOperator::Plus,
        TokenType::Minus => BinaryOperator::Minus,
        TokenType::Star => BinaryOperator::Star,
        TokenType::Slash => BinaryOperator::Slash,
        TokenType::Percent => BinaryOperator::Percent,
        _ => return None,
    };
    Some(operator)
}

fn scan(sql: &str, dialect: Dialect) -> anyhow::Result<Vec<Token>> {
    log::debug!("Parsing {}", sql.chars().take(50).collect::<String>());

    let mut scanner = Scanner::new(sql, dialect);
    scanner.scan()?;

    log::debug!("Tokens:");
    scanner
        .tokens()
        .iter()
        .for_each(|tok| log::debug!("{:?}", tok));
    Ok(scanner.into_tokens())
}

/// Parses a whole script, failing on the first malformed statement.
pub fn parse_sql(sql: &str, dialect: &str) -> anyhow::Result<Ast> {
    let dialect = Dialect::parse(dialect)?;
    let tokens = scan(sql, dialect)?;
    let mut parser = Parser::new(&tokens, sql);
    let ast = parser.parse()?;
    log::debug!("AST: {:?}", ast);
    Ok(ast)
}

/// Parses a script statement by statement.
///
/// Only a scanner failure is an error; statement level failures are reported
/// in the returned list.
pub fn parse_sql_statements(sql: &str, dialect: Dialect) -> anyhow::Result<Vec<ParsedStatement>> {
    let tokens = scan(sql, dialect)?;
    let parser = Parser::new(&tokens, sql);
    let statements = parser.parse_statements();
    statements
        .iter()
        .for_each(|parsed| log::debug!("Statement: {:?}", parsed.statement));
    Ok(statements)
}
