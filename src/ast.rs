use serde::{Deserialize, Serialize};
use strum_macros::EnumDiscriminants;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ast {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    Query(QueryStatement),
    Insert(InsertStatement),
    CreateAs(CreateAsStatement),
    /// A statement kept verbatim: it carries no select block to instrument.
    Raw(RawStatement),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryStatement {
    pub query: QueryExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertStatement {
    pub table: Vec<Identifier>,
    pub columns: Option<Vec<Identifier>>,
    pub query: QueryExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAsStatement {
    pub replace: bool,
    pub modifier: Option<CreateModifier>,
    pub kind: CreateKind,
    pub if_not_exists: bool,
    pub name: Vec<Identifier>,
    pub copy_grants: bool,
    pub query: QueryExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CreateModifier {
    Temp,
    Temporary,
    Transient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CreateKind {
    Table,
    View,
    MaterializedView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStatement {
    pub sql: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub value: String,
    pub quoted: bool,
}

impl Identifier {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            quoted: false,
        }
    }

    pub fn quoted(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            quoted: true,
        }
    }

    /// Unquoted identifiers compare case-insensitively, quoted ones exactly.
    pub fn matches(&self, name: &str) -> bool {
        if self.quoted {
            self.value == name
        } else {
            self.value.eq_ignore_ascii_case(name)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataType {
    pub name: String,
    pub parameters: Vec<String>,
    pub array_dims: usize,
}

impl DataType {
    pub fn simple(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            parameters: vec![],
            array_dims: 0,
        }
    }

    pub fn array_of(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            parameters: vec![],
            array_dims: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Grouping(GroupingExpr),
    Tuple(Vec<Expr>),
    Column(ColumnExpr),
    String(String),
    Number(String),
    Bool(bool),
    Null,
    Star,
    Placeholder(String),
    TypedString(TypedStringExpr),
    Interval(IntervalExpr),
    Query(Box<QueryExpr>),
    Exists(Box<QueryExpr>),
    InList(InListExpr),
    InQuery(InQueryExpr),
    Between(BetweenExpr),
    Like(LikeExpr),
    Is(IsExpr),
    Case(CaseExpr),
    Cast(CastExpr),
    Extract(ExtractExpr),
    Array(ArrayExpr),
    ArraySubquery(Box<QueryExpr>),
    Subscript(SubscriptExpr),
    GenericFunction(Box<GenericFunctionExpr>),
    Function(FunctionExpr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: BinaryOperator,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Or,
    And,
    Equal,
    NotEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Concat,
    Arrow,
    LongArrow,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub operator: UnaryOperator,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Minus,
    Plus,
    BitwiseNot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingExpr {
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnExpr {
    pub parts: Vec<Identifier>,
}

impl ColumnExpr {
    pub fn name(&self) -> Option<&Identifier> {
        self.parts.last()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedStringExpr {
    pub r#type: DataType,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalExpr {
    pub value: Box<Expr>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InListExpr {
    pub expr: Box<Expr>,
    pub list: Vec<Expr>,
    pub negated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InQueryExpr {
    pub expr: Box<Expr>,
    pub query: Box<QueryExpr>,
    pub negated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetweenExpr {
    pub expr: Box<Expr>,
    pub low: Box<Expr>,
    pub high: Box<Expr>,
    pub negated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeExpr {
    pub expr: Box<Expr>,
    pub pattern: Box<Expr>,
    pub negated: bool,
    pub case_insensitive: bool,
    pub escape: Option<Box<Expr>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsExpr {
    pub expr: Box<Expr>,
    pub negated: bool,
    pub test: IsTest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IsTest {
    Null,
    True,
    False,
    DistinctFrom(Box<Expr>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseExpr {
    pub case: Option<Box<Expr>>,
    pub when_thens: Vec<(Expr, Expr)>,
    pub r#else: Option<Box<Expr>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastExpr {
    pub expr: Box<Expr>,
    pub r#type: DataType,
    pub style: CastStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CastStyle {
    Cast,
    TryCast,
    DoubleColon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractExpr {
    pub field: String,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayExpr {
    pub exprs: Vec<Expr>,
    pub style: ArrayStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ArrayStyle {
    /// `ARRAY[a, b]`
    Keyword,
    /// `[a, b]`
    Bracket,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptExpr {
    pub expr: Box<Expr>,
    pub index: Box<Expr>,
}

/// Generic function call, whose signature is not modelled by the parser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericFunctionExpr {
    pub name: Vec<Identifier>,
    pub distinct: bool,
    pub arguments: Vec<Expr>,
    pub order_by: Option<Vec<OrderByExpr>>,
    pub within_group: Option<Vec<OrderByExpr>>,
    pub filter: Option<Box<Expr>>,
    pub nulls: Option<FunctionNulls>,
    pub over: Option<NamedWindowExpr>,
}

impl GenericFunctionExpr {
    /// Lowercased, unqualified function name.
    pub fn base_name(&self) -> String {
        self.name
            .last()
            .map(|ident| ident.value.to_lowercase())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FunctionNulls {
    Ignore,
    Respect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FunctionExpr {
    Coalesce(CoalesceFunctionExpr),
    Concat(ConcatFunctionExpr),
    // Lineage primitives, rendered per dialect by the emitter
    TraceId,
    ArrayConstruct(ArrayConstructFunctionExpr),
    ArrayConcat(ArrayConcatFunctionExpr),
    ArrayUnique(ArrayUniqueFunctionExpr),
    ArrayUniqueAgg(ArrayUniqueFunctionExpr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoalesceFunctionExpr {
    pub exprs: Vec<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcatFunctionExpr {
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayConstructFunctionExpr {
    pub exprs: Vec<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayConcatFunctionExpr {
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayUniqueFunctionExpr {
    pub array: Box<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueryExpr {
    Grouping(GroupingQueryExpr),
    Select(SelectQueryExpr),
    SetSelect(SetSelectQueryExpr),
    Values(ValuesQueryExpr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingQueryExpr {
    pub with: Option<With>,
    pub query: Box<QueryExpr>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectQueryExpr {
    pub with: Option<With>,
    pub select: Select,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSelectQueryExpr {
    pub with: Option<With>,
    pub left_query: Box<QueryExpr>,
    pub set_operator: SetQueryOperator,
    pub right_query: Box<QueryExpr>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuesQueryExpr {
    pub with: Option<With>,
    pub rows: Vec<Vec<Expr>>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SetQueryOperator {
    Union,
    UnionAll,
    Intersect,
    IntersectAll,
    Except,
    ExceptAll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBy {
    pub exprs: Vec<OrderByExpr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderBySortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderByNulls {
    First,
    Last,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub sort_direction: Option<OrderBySortDirection>,
    pub nulls: Option<OrderByNulls>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limit {
    pub count: Option<Box<Expr>>,
    pub offset: Option<Box<Expr>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct With {
    pub recursive: bool,
    pub ctes: Vec<Cte>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cte {
    pub name: Identifier,
    pub columns: Option<Vec<Identifier>>,
    /// `AS MATERIALIZED` / `AS NOT MATERIALIZED`
    pub materialized: Option<bool>,
    pub query: QueryExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Select {
    pub distinct: Option<Distinct>,
    pub exprs: Vec<SelectExpr>,
    pub from: Option<From>,
    pub r#where: Option<Where>,
    pub group_by: Option<GroupBy>,
    pub having: Option<Having>,
    pub qualify: Option<Qualify>,
    pub window: Option<Window>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Distinct {
    Distinct,
    On(Vec<Expr>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SelectExpr {
    Col(SelectColExpr),
    ColAll(SelectColAllExpr),
    All(SelectAllExpr),
}

impl SelectExpr {
    /// Name of the output column, when it can be read off the syntax.
    pub fn output_name(&self) -> Option<&Identifier> {
        match self {
            SelectExpr::Col(SelectColExpr {
                alias: Some(alias), ..
            }) => Some(alias),
            SelectExpr::Col(SelectColExpr {
                expr: Expr::Column(column),
                alias: None,
            }) => column.name(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectColExpr {
    pub expr: Expr,
    pub alias: Option<Identifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectColAllExpr {
    pub qualifier: Vec<Identifier>,
    pub exclude: Option<Vec<Identifier>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectAllExpr {
    pub exclude: Option<Vec<Identifier>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct From {
    pub source: FromItem,
    pub joins: Vec<Join>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub natural: bool,
    pub item: FromItem,
    pub cond: Option<JoinCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    /// `FROM a, b`
    Comma,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JoinCondition {
    On(Expr),
    Using(Vec<Identifier>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FromItem {
    Table(FromTableExpr),
    Subquery(FromSubqueryExpr),
    Function(FromFunctionExpr),
    Nested(Box<From>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableAlias {
    pub name: Identifier,
    pub columns: Option<Vec<Identifier>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FromTableExpr {
    pub path: Vec<Identifier>,
    pub alias: Option<TableAlias>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FromSubqueryExpr {
    pub lateral: bool,
    pub query: Box<QueryExpr>,
    pub alias: Option<TableAlias>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FromFunctionExpr {
    pub lateral: bool,
    pub function: Expr,
    pub alias: Option<TableAlias>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Where {
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupByExpr {
    Items(Vec<Expr>),
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupBy {
    pub expr: GroupByExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Having {
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Qualify {
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    pub named_windows: Vec<NamedWindow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedWindow {
    pub name: Identifier,
    pub window: NamedWindowExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NamedWindowExpr {
    Reference(Identifier),
    WindowSpec(WindowSpec),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSpec {
    pub window_name: Option<Identifier>,
    pub partition_by: Option<Vec<Expr>>,
    pub order_by: Option<Vec<OrderByExpr>>,
    pub frame: Option<WindowFrame>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowFrame {
    pub kind: WindowFrameKind,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(Box<Expr>),
    CurrentRow,
    Following(Box<Expr>),
    UnboundedFollowing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WindowFrameKind {
    Rows,
    Range,
    Groups,
}

#[derive(PartialEq, Clone, Debug, EnumDiscriminants, Serialize, Deserialize)]
#[strum_discriminants(name(TokenTypeVariant))]
pub enum TokenType {
    LeftParen,
    RightParen,
    LeftSquare,
    RightSquare,
    Comma,
    Dot,
    Minus,
    Plus,
    Slash,
    Star,
    Percent,
    Colon,
    DoubleColon,
    Semicolon,
    BitwiseNot,
    ConcatOperator,
    Arrow,
    LongArrow,
    Equal,
    NotEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    Identifier(String),
    QuotedIdentifier(String),
    String(String),
    Number(String),
    Placeholder(String),

    // Reserved keywords
    All,
    And,
    Array,
    As,
    Asc,
    Between,
    By,
    Case,
    Cast,
    Create,
    Cross,
    Desc,
    Distinct,
    Else,
    End,
    Except,
    Exists,
    Extract,
    False,
    For,
    From,
    Full,
    Group,
    Having,
    Ilike,
    In,
    Inner,
    Intersect,
    Interval,
    Into,
    Is,
    Join,
    Lateral,
    Left,
    Like,
    Limit,
    Natural,
    Not,
    Null,
    Offset,
    On,
    Or,
    Order,
    Outer,
    Qualify,
    Recursive,
    Right,
    Select,
    Then,
    True,
    Union,
    Using,
    Values,
    When,
    Where,
    Window,
    With,

    Eof,
}

impl TokenTypeVariant {
    pub(crate) fn variant_str(&self) -> &str {
        match self {
            TokenTypeVariant::LeftParen => "(",
            TokenTypeVariant::RightParen => ")",
            TokenTypeVariant::LeftSquare => "[",
            TokenTypeVariant::RightSquare => "]",
            TokenTypeVariant::Comma => ",",
            TokenTypeVariant::Dot => ".",
            TokenTypeVariant::Minus => "-",
            TokenTypeVariant::Plus => "+",
            TokenTypeVariant::Slash => "/",
            TokenTypeVariant::Star => "*",
            TokenTypeVariant::Percent => "%",
            TokenTypeVariant::Colon => ":",
            TokenTypeVariant::DoubleColon => "::",
            TokenTypeVariant::Semicolon => ";",
            TokenTypeVariant::BitwiseNot => "~",
            TokenTypeVariant::ConcatOperator => "||",
            TokenTypeVariant::Arrow => "->",
            TokenTypeVariant::LongArrow => "->>",
            TokenTypeVariant::Equal => "=",
            TokenTypeVariant::NotEqual => "<>",
            TokenTypeVariant::BangEqual => "!=",
            TokenTypeVariant::Less => "<",
            TokenTypeVariant::LessEqual => "<=",
            TokenTypeVariant::Greater => ">",
            TokenTypeVariant::GreaterEqual => ">=",
            TokenTypeVariant::Identifier => "Identifier",
            TokenTypeVariant::QuotedIdentifier => "QuotedIdentifier",
            TokenTypeVariant::String => "String",
            TokenTypeVariant::Number => "Number",
            TokenTypeVariant::Placeholder => "Placeholder",
            TokenTypeVariant::All => "ALL",
            TokenTypeVariant::And => "AND",
            TokenTypeVariant::Array => "ARRAY",
            TokenTypeVariant::As => "AS",
            TokenTypeVariant::Asc => "ASC",
            TokenTypeVariant::Between => "BETWEEN",
            TokenTypeVariant::By => "BY",
            TokenTypeVariant::Case => "CASE",
            TokenTypeVariant::Cast => "CAST",
            TokenTypeVariant::Create => "CREATE",
            TokenTypeVariant::Cross => "CROSS",
            TokenTypeVariant::Desc => "DESC",
            TokenTypeVariant::Distinct => "DISTINCT",
            TokenTypeVariant::Else => "ELSE",
            TokenTypeVariant::End => "END",
            TokenTypeVariant::Except => "EXCEPT",
            TokenTypeVariant::Exists => "EXISTS",
            TokenTypeVariant::Extract => "EXTRACT",
            TokenTypeVariant::False => "FALSE",
            TokenTypeVariant::For => "FOR",
            TokenTypeVariant::From => "FROM",
            TokenTypeVariant::Full => "FULL",
            TokenTypeVariant::Group => "GROUP",
            TokenTypeVariant::Having => "HAVING",
            TokenTypeVariant::Ilike => "ILIKE",
            TokenTypeVariant::In => "IN",
            TokenTypeVariant::Inner => "INNER",
            TokenTypeVariant::Intersect => "INTERSECT",
            TokenTypeVariant::Interval => "INTERVAL",
            TokenTypeVariant::Into => "INTO",
            TokenTypeVariant::Is => "IS",
            TokenTypeVariant::Join => "JOIN",
            TokenTypeVariant::Lateral => "LATERAL",
            TokenTypeVariant::Left => "LEFT",
            TokenTypeVariant::Like => "LIKE",
            TokenTypeVariant::Limit => "LIMIT",
            TokenTypeVariant::Natural => "NATURAL",
            TokenTypeVariant::Not => "NOT",
            TokenTypeVariant::Null => "NULL",
            TokenTypeVariant::Offset => "OFFSET",
            TokenTypeVariant::On => "ON",
            TokenTypeVariant::Or => "OR",
            TokenTypeVariant::Order => "ORDER",
            TokenTypeVariant::Outer => "OUTER",
            TokenTypeVariant::Qualify => "QUALIFY",
            TokenTypeVariant::Recursive => "RECURSIVE",
            TokenTypeVariant::Right => "RIGHT",
            TokenTypeVariant::Select => "SELECT",
            TokenTypeVariant::Then => "THEN",
            TokenTypeVariant::True => "TRUE",
            TokenTypeVariant::Union => "UNION",
            TokenTypeVariant::Using => "USING",
            TokenTypeVariant::Values => "VALUES",
            TokenTypeVariant::When => "WHEN",
            TokenTypeVariant::Where => "WHERE",
            TokenTypeVariant::Window => "WINDOW",
            TokenTypeVariant::With => "WITH",
            TokenTypeVariant::Eof => "EOF",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenType,
    pub lexeme: String,
    pub line: u32,
    pub col: u32,
    /// Byte range of the lexeme in the scanned source.
    pub start: usize,
    pub end: usize,
}
