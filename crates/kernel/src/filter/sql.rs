//! SQL translation of predicate trees using SeaQuery.
//!
//! Generates the listing, count and existence queries a PostgreSQL executor
//! runs for a compiled [`Predicate`] and resolved [`ExecutionSpec`].

use sea_query::{
    Alias, Asterisk, Cond, Expr, ExprTrait, Func, Order, PostgresQueryBuilder, Query,
    SelectStatement, SimpleExpr,
};

use super::paging::{ExecutionSpec, SortDirection, Window};
use super::predicate::Predicate;
use super::value::FilterValue;

/// Query builder for one relation and predicate.
pub struct PredicateQueryBuilder<'a> {
    table: &'a str,
    predicate: &'a Predicate,
}

impl<'a> PredicateQueryBuilder<'a> {
    pub fn new(table: &'a str, predicate: &'a Predicate) -> Self {
        Self { table, predicate }
    }

    /// Build the main SELECT query, ordered and windowed.
    pub fn build(&self, spec: &ExecutionSpec) -> String {
        let mut query = Query::select();
        query.column((Alias::new(self.table), Asterisk));
        query.from(Alias::new(self.table));
        self.add_filter(&mut query);

        let order = match spec.sort.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        query.order_by((Alias::new(self.table), Alias::new(spec.sort.column)), order);
        if spec.sort.tiebreaker != spec.sort.column {
            query.order_by(
                (Alias::new(self.table), Alias::new(spec.sort.tiebreaker)),
                Order::Asc,
            );
        }

        if let Window::Page { offset, limit } = spec.window {
            query.limit(limit);
            query.offset(offset);
        }

        query.to_string(PostgresQueryBuilder)
    }

    /// Build a COUNT query for total results.
    pub fn build_count(&self) -> String {
        let mut query = Query::select();
        query.expr(Expr::col(Asterisk).count());
        query.from(Alias::new(self.table));
        self.add_filter(&mut query);
        query.to_string(PostgresQueryBuilder)
    }

    /// Build an unordered, unwindowed SELECT of every matching row.
    pub fn build_select(&self) -> String {
        let mut query = Query::select();
        query.column((Alias::new(self.table), Asterisk));
        query.from(Alias::new(self.table));
        self.add_filter(&mut query);
        query.to_string(PostgresQueryBuilder)
    }

    /// Build `SELECT EXISTS (...)` over the matching rows.
    pub fn build_exists(&self) -> String {
        let mut query = Query::select();
        query.expr(Expr::val(1));
        query.from(Alias::new(self.table));
        self.add_filter(&mut query);
        query.limit(1);
        format!("SELECT EXISTS ({})", query.to_string(PostgresQueryBuilder))
    }

    fn add_filter(&self, query: &mut SelectStatement) {
        if !self.predicate.is_vacuous() {
            query.and_where(condition(self.table, self.predicate));
        }
    }
}

/// Translate a predicate into a SeaQuery condition over `table`.
pub fn condition(table: &str, predicate: &Predicate) -> SimpleExpr {
    match predicate {
        Predicate::True => Expr::cust("TRUE"),
        Predicate::False => Expr::cust("FALSE"),
        Predicate::And(children) => children
            .iter()
            .fold(Cond::all(), |cond, child| cond.add(condition(table, child)))
            .into(),
        Predicate::Or(children) => children
            .iter()
            .fold(Cond::any(), |cond, child| cond.add(condition(table, child)))
            .into(),
        Predicate::In { field, values } => {
            if values.is_empty() {
                // Nothing can be a member of the empty set.
                return Expr::cust("FALSE");
            }
            column(table, field).is_in(values.iter().map(FilterValue::as_sql_value))
        }
        Predicate::AnyIn { field, values } => {
            if values.is_empty() {
                return Expr::cust("FALSE");
            }
            let quoted = quoted_column(table, field);
            values
                .iter()
                .fold(Cond::any(), |cond, value| {
                    cond.add(Expr::cust_with_values(
                        format!("$1 = ANY({quoted})"),
                        [value.as_sql_value()],
                    ))
                })
                .into()
        }
        Predicate::Range { field, start, end } => {
            let mut cond = Cond::all();
            if let Some(start) = start {
                cond = cond.add(column(table, field).gte(start.as_sql_value()));
            }
            if let Some(end) = end {
                cond = cond.add(column(table, field).lte(end.as_sql_value()));
            }
            cond.into()
        }
        Predicate::Contains { field, needle } => {
            let pattern = format!("%{}%", escape_like_wildcards(&needle.to_lowercase()));
            Expr::expr(Func::lower(column(table, field))).like(pattern)
        }
        Predicate::IsNull { field } => column(table, field).is_null(),
    }
}

/// Wrap a SELECT so each row comes back as one JSON object.
pub fn row_to_json(sql: &str) -> String {
    format!("SELECT row_to_json(t) FROM ({sql}) t")
}

fn column(table: &str, field: &str) -> SimpleExpr {
    Expr::col((Alias::new(table), Alias::new(field))).into()
}

fn quoted_column(table: &str, field: &str) -> String {
    format!("{}.{}", quote_ident(table), quote_ident(field))
}

/// Quote an identifier for interpolation into hand-written SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
