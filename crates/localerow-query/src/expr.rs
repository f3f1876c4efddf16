//! Predicate expression trees for WHERE clauses.
//!
//! Leaf predicates reference a column through a [`FieldRef`]. Only leaves
//! expose a field accessor; boolean combinators (`And`, `Or`, `Not`) only
//! hold children. Traversal visits every node so callers can rewrite field
//! references in place.
//!
//! # Example
//!
//! ```
//! use localerow_query::Expr;
//!
//! let filter = Expr::eq("title", "Bonjour").and(Expr::gt("articles.id", 10));
//! let mut params = Vec::new();
//! assert_eq!(filter.to_sql(&mut params), "(title = ? AND articles.id > ?)");
//! assert_eq!(params.len(), 2);
//! ```

use std::cmp::Ordering;

use localerow_core::Value;

/// A reference to a column in a predicate or an ORDER BY part.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRef {
    /// A column name, bare (`title`) or qualified (`articles.title`).
    Name(String),
    /// A computed expression. Never rewritten by name-based passes.
    Expr(Box<Expr>),
}

impl FieldRef {
    /// Borrow the column name, if this is a name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            FieldRef::Name(name) => Some(name),
            FieldRef::Expr(_) => None,
        }
    }

    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        match self {
            FieldRef::Name(name) => name.clone(),
            FieldRef::Expr(expr) => expr.to_sql(params),
        }
    }
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        FieldRef::Name(name.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(name: String) -> Self {
        FieldRef::Name(name)
    }
}

impl From<Expr> for FieldRef {
    fn from(expr: Expr) -> Self {
        FieldRef::Expr(Box::new(expr))
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    /// SQL operator.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "LIKE",
        }
    }
}

/// A boolean predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `field op value`
    Compare {
        field: FieldRef,
        op: CompareOp,
        value: Value,
    },
    /// `field [NOT] IN (values)`
    In {
        field: FieldRef,
        values: Vec<Value>,
        negated: bool,
    },
    /// `field IS [NOT] NULL`
    IsNull { field: FieldRef, negated: bool },
    /// Conjunction.
    And(Vec<Expr>),
    /// Disjunction.
    Or(Vec<Expr>),
    /// Negation.
    Not(Box<Expr>),
    /// Raw SQL fragment, passed through untouched.
    Raw(String),
}

impl Expr {
    fn compare(field: impl Into<FieldRef>, op: CompareOp, value: impl Into<Value>) -> Self {
        Expr::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// `field = value`
    pub fn eq(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// `field <> value`
    pub fn ne(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::NotEq, value)
    }

    /// `field < value`
    pub fn lt(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    /// `field <= value`
    pub fn le(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    /// `field > value`
    pub fn gt(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    /// `field >= value`
    pub fn ge(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    /// `field LIKE pattern` (`%` and `_` wildcards)
    pub fn like(field: impl Into<FieldRef>, pattern: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Like, Value::Text(pattern.into()))
    }

    /// `field IN (values)`
    pub fn is_in<V: Into<Value>>(
        field: impl Into<FieldRef>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Expr::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// `field IS NULL`
    pub fn is_null(field: impl Into<FieldRef>) -> Self {
        Expr::IsNull {
            field: field.into(),
            negated: false,
        }
    }

    /// `field IS NOT NULL`
    pub fn is_not_null(field: impl Into<FieldRef>) -> Self {
        Expr::IsNull {
            field: field.into(),
            negated: true,
        }
    }

    /// Raw SQL.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    /// Combine with AND, flattening nested conjunctions.
    #[must_use]
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut parts) => {
                parts.push(other);
                Expr::And(parts)
            }
            first => Expr::And(vec![first, other]),
        }
    }

    /// Combine with OR, flattening nested disjunctions.
    #[must_use]
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut parts) => {
                parts.push(other);
                Expr::Or(parts)
            }
            first => Expr::Or(vec![first, other]),
        }
    }

    /// Negate.
    #[must_use]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// The field this node filters on, for leaf predicates.
    pub fn field(&self) -> Option<&FieldRef> {
        match self {
            Expr::Compare { field, .. } | Expr::In { field, .. } | Expr::IsNull { field, .. } => {
                Some(field)
            }
            Expr::And(_) | Expr::Or(_) | Expr::Not(_) | Expr::Raw(_) => None,
        }
    }

    /// Mutable access to the field this node filters on.
    pub fn field_mut(&mut self) -> Option<&mut FieldRef> {
        match self {
            Expr::Compare { field, .. } | Expr::In { field, .. } | Expr::IsNull { field, .. } => {
                Some(field)
            }
            Expr::And(_) | Expr::Or(_) | Expr::Not(_) | Expr::Raw(_) => None,
        }
    }

    /// Visit this node and all descendants, parents first.
    pub fn traverse<F: FnMut(&Expr)>(&self, visitor: &mut F) {
        visitor(self);
        match self {
            Expr::And(parts) | Expr::Or(parts) => {
                for part in parts {
                    part.traverse(visitor);
                }
            }
            Expr::Not(inner) => inner.traverse(visitor),
            _ => {}
        }
    }

    /// Visit this node and all descendants mutably, parents first.
    pub fn traverse_mut<F: FnMut(&mut Expr)>(&mut self, visitor: &mut F) {
        visitor(self);
        match self {
            Expr::And(parts) | Expr::Or(parts) => {
                for part in parts {
                    part.traverse_mut(visitor);
                }
            }
            Expr::Not(inner) => inner.traverse_mut(visitor),
            _ => {}
        }
    }

    /// Render with `?` placeholders, pushing bound values onto `params`.
    pub fn to_sql(&self, params: &mut Vec<Value>) -> String {
        match self {
            Expr::Compare { field, op, value } => {
                let column = field.to_sql(params);
                params.push(value.clone());
                format!("{} {} ?", column, op.as_sql())
            }
            Expr::In {
                field,
                values,
                negated,
            } => {
                let column = field.to_sql(params);
                if values.is_empty() {
                    return if *negated { "1 = 1" } else { "1 = 0" }.to_string();
                }
                params.extend(values.iter().cloned());
                let placeholders = vec!["?"; values.len()].join(", ");
                let keyword = if *negated { "NOT IN" } else { "IN" };
                format!("{column} {keyword} ({placeholders})")
            }
            Expr::IsNull { field, negated } => {
                let column = field.to_sql(params);
                if *negated {
                    format!("{column} IS NOT NULL")
                } else {
                    format!("{column} IS NULL")
                }
            }
            Expr::And(parts) => join_parts(parts, " AND ", params),
            Expr::Or(parts) => join_parts(parts, " OR ", params),
            Expr::Not(inner) => format!("NOT ({})", inner.to_sql(params)),
            Expr::Raw(sql) => sql.clone(),
        }
    }

    /// Evaluate against a row, resolving column names through `lookup`.
    ///
    /// Comparisons involving NULL or a missing column are false. Raw SQL and
    /// computed fields cannot be evaluated in memory and are treated as true.
    pub fn matches<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<Value>,
    {
        let resolve = |field: &FieldRef| match field {
            FieldRef::Name(name) => Some(lookup(name).unwrap_or(Value::Null)),
            FieldRef::Expr(_) => None,
        };

        match self {
            Expr::Compare { field, op, value } => {
                let Some(actual) = resolve(field) else {
                    return true;
                };
                compare_values(&actual, *op, value)
            }
            Expr::In {
                field,
                values,
                negated,
            } => {
                let Some(actual) = resolve(field) else {
                    return true;
                };
                if actual.is_null() {
                    return false;
                }
                let found = values
                    .iter()
                    .any(|v| actual.compare(v) == Some(Ordering::Equal));
                found != *negated
            }
            Expr::IsNull { field, negated } => {
                let Some(actual) = resolve(field) else {
                    return true;
                };
                actual.is_null() != *negated
            }
            Expr::And(parts) => parts.iter().all(|p| p.matches(lookup)),
            Expr::Or(parts) => parts.iter().any(|p| p.matches(lookup)),
            Expr::Not(inner) => !inner.matches(lookup),
            Expr::Raw(_) => true,
        }
    }
}

fn join_parts(parts: &[Expr], separator: &str, params: &mut Vec<Value>) -> String {
    match parts {
        [] => "1 = 1".to_string(),
        [single] => single.to_sql(params),
        _ => {
            let rendered: Vec<String> = parts.iter().map(|p| p.to_sql(params)).collect();
            format!("({})", rendered.join(separator))
        }
    }
}

fn compare_values(actual: &Value, op: CompareOp, expected: &Value) -> bool {
    if actual.is_null() || expected.is_null() {
        return false;
    }
    if op == CompareOp::Like {
        return match (actual.as_str(), expected.as_str()) {
            (Some(text), Some(pattern)) => like_match(text.as_bytes(), pattern.as_bytes()),
            _ => false,
        };
    }
    let Some(ordering) = actual.compare(expected) else {
        return false;
    };
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::NotEq => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
        CompareOp::Like => false,
    }
}

fn like_match(text: &[u8], pattern: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'%', rest)) => (0..=text.len()).any(|i| like_match(&text[i..], rest)),
        Some((b'_', rest)) => !text.is_empty() && like_match(&text[1..], rest),
        Some((c, rest)) => text.first() == Some(c) && like_match(&text[1..], rest),
    }
}
