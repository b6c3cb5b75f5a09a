//! ORDER BY clause AST
//!
//! The parsed form handed to the resolver. Serializable so that clauses can
//! be supplied as JSON:
//!
//! ```json
//! [
//!   {"expr": {"column": {"name": "a"}}, "direction": "desc"},
//!   {"expr": {"num_val": "2"}},
//!   {"index": {"table": "t", "index": "idx"}},
//!   {"primary_key": {"table": "t"}}
//! ]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A whole ORDER BY clause
pub type OrderBy = Vec<Order>;

/// Sort direction requested by one clause item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One ORDER BY item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// What to order by
    #[serde(flatten)]
    pub target: OrderTarget,
    /// Requested direction (default ascending)
    #[serde(default)]
    pub direction: SortDirection,
}

impl Order {
    /// Orders by an expression ascending
    pub fn asc(expr: Expr) -> Self {
        Self {
            target: OrderTarget::Expr(expr),
            direction: SortDirection::Asc,
        }
    }

    /// Orders by an expression descending
    pub fn desc(expr: Expr) -> Self {
        Self {
            target: OrderTarget::Expr(expr),
            direction: SortDirection::Desc,
        }
    }

    /// Orders by the key columns of `table@index`
    pub fn index(table: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            target: OrderTarget::Index {
                table: table.into(),
                index: Some(index.into()),
            },
            direction: SortDirection::Asc,
        }
    }

    /// Orders by the primary key columns of `table`
    pub fn primary_key(table: impl Into<String>) -> Self {
        Self {
            target: OrderTarget::PrimaryKey {
                table: table.into(),
            },
            direction: SortDirection::Asc,
        }
    }

    /// Sets the direction
    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            OrderTarget::Expr(e) => write!(f, "{}", e)?,
            OrderTarget::Index { table, index } => {
                write!(f, "INDEX {}@{}", table, index.as_deref().unwrap_or("primary"))?
            }
            OrderTarget::PrimaryKey { table } => write!(f, "PRIMARY KEY {}", table)?,
        }
        if self.direction == SortDirection::Desc {
            write!(f, " DESC")?;
        }
        Ok(())
    }
}

/// Kinds of ORDER BY item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderTarget {
    /// `ORDER BY <expr>`
    Expr(Expr),
    /// `ORDER BY INDEX table@index`; no index name means the primary index
    Index {
        table: String,
        #[serde(default)]
        index: Option<String>,
    },
    /// `ORDER BY PRIMARY KEY table`
    PrimaryKey { table: String },
}

/// A possibly qualified column reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnItem {
    #[serde(default)]
    pub table: Option<String>,
    pub name: String,
}

impl ColumnItem {
    /// Normalized column name
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Normalized table qualifier, if any
    pub fn normalized_table(&self) -> Option<String> {
        self.table.as_deref().map(normalize_name)
    }
}

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    Plus,
    Minus,
    Mult,
    Div,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Mult => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Scalar expressions that may appear in an ORDER BY item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Column reference, `a` or `t.a`
    Column(ColumnItem),
    /// Wildcard, `*` or `t.*`
    Star(Option<String>),
    /// Untyped numeric literal as written, e.g. `2` or `1.5`
    NumVal(String),
    /// Typed integer constant
    Int(i64),
    /// Typed float constant
    Float(f64),
    /// String constant
    Str(String),
    /// Boolean constant
    Bool(bool),
    /// NULL constant
    Null,
    /// Parenthesized expression
    Paren(Box<Expr>),
    /// Arithmetic
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Unqualified column reference
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(ColumnItem {
            table: None,
            name: name.into(),
        })
    }

    /// Table-qualified column reference
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column(ColumnItem {
            table: Some(table.into()),
            name: name.into(),
        })
    }

    /// Numeric literal
    pub fn num(text: impl Into<String>) -> Self {
        Expr::NumVal(text.into())
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Removes any number of enclosing parentheses, `((a))` to `a`
    pub fn strip_parens(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Paren(inner) = expr {
            expr = inner;
        }
        expr
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(c) => match &c.table {
                Some(t) => write!(f, "{}.{}", t, c.name),
                None => write!(f, "{}", c.name),
            },
            Expr::Star(Some(t)) => write!(f, "{}.*", t),
            Expr::Star(None) => write!(f, "*"),
            Expr::NumVal(s) => write!(f, "{}", s),
            Expr::Int(i) => write!(f, "{}", i),
            Expr::Float(v) => write!(f, "{:?}", v),
            Expr::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Expr::Bool(true) => write!(f, "true"),
            Expr::Bool(false) => write!(f, "false"),
            Expr::Null => write!(f, "NULL"),
            Expr::Paren(e) => write!(f, "({})", e),
            Expr::Binary { op, left, right } => write!(f, "{} {} {}", left, op.symbol(), right),
        }
    }
}

/// Normalizes an identifier for comparison.
///
/// Unquoted identifiers fold to lower case; a double-quoted identifier is
/// taken verbatim without its quotes.
pub fn normalize_name(name: &str) -> String {
    if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
        name[1..name.len() - 1].replace("\"\"", "\"")
    } else {
        name.to_lowercase()
    }
}
