//! ORDER BY clauses.

use localerow_core::Value;

use crate::expr::{Expr, FieldRef};

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPart {
    /// Column or expression to sort by.
    pub term: FieldRef,
    /// Sort direction.
    pub direction: Direction,
}

/// An ordered list of sort keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBy {
    parts: Vec<OrderPart>,
}

impl OrderBy {
    /// Empty clause.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sort key.
    pub fn push(&mut self, term: impl Into<FieldRef>, direction: Direction) {
        self.parts.push(OrderPart {
            term: term.into(),
            direction,
        });
    }

    /// Number of sort keys.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// True if there are no sort keys.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Sort keys in order.
    pub fn parts(&self) -> &[OrderPart] {
        &self.parts
    }

    /// Let `visitor` inspect and rewrite every sort term in place.
    pub fn iterate_parts<F: FnMut(&mut FieldRef)>(&mut self, mut visitor: F) {
        for part in &mut self.parts {
            visitor(&mut part.term);
        }
    }

    /// Render the sort list (without the `ORDER BY` keyword).
    pub fn to_sql(&self, params: &mut Vec<Value>) -> String {
        self.parts
            .iter()
            .map(|part| {
                let term = match &part.term {
                    FieldRef::Name(name) => name.clone(),
                    FieldRef::Expr(expr) => render_expr_term(expr, params),
                };
                format!("{} {}", term, part.direction.as_sql())
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn render_expr_term(expr: &Expr, params: &mut Vec<Value>) -> String {
    match expr {
        Expr::Raw(sql) => sql.clone(),
        other => format!("({})", other.to_sql(params)),
    }
}
