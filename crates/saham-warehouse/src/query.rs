//! SQL rendering of history plans.
//!
//! Column names come from [`StockColumn`] and are interpolated; every filter
//! value is bound as a parameter.

use ::duckdb::types::Value as DuckValue;
use saham_core::{HistoryQuery, OrderKey, Predicate, SortOrder, StockColumn, Window};

/// Columns selected for a full `stock_queries` row, in decode order.
pub const RECORD_COLUMNS: [StockColumn; 23] = StockColumn::ALL;

/// Rendered statements for one history read.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySql {
    /// Page query with ordering and window applied.
    pub select: String,
    /// Unpaginated match count under the same predicates.
    pub count: String,
    /// Parameters shared by both statements.
    pub params: Vec<DuckValue>,
}

pub fn render_history(query: &HistoryQuery) -> HistorySql {
    let mut params = Vec::new();
    let where_clause = render_where(&query.predicates, &mut params);

    let mut select = format!(
        "SELECT {} FROM stock_queries{where_clause}",
        select_list()
    );
    if !query.order.is_empty() {
        let keys: Vec<String> = query.order.iter().map(render_order_key).collect();
        select.push_str(" ORDER BY ");
        select.push_str(&keys.join(", "));
    }
    match query.window {
        Some(Window::Limit(limit)) => select.push_str(&format!(" LIMIT {limit}")),
        Some(window @ Window::Range { start, .. }) => {
            select.push_str(&format!(" LIMIT {} OFFSET {start}", window.len()));
        }
        None => {}
    }

    HistorySql {
        select,
        count: format!("SELECT COUNT(*) FROM stock_queries{where_clause}"),
        params,
    }
}

pub fn select_list() -> String {
    RECORD_COLUMNS
        .iter()
        .map(|column| column.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_where(predicates: &[Predicate], params: &mut Vec<DuckValue>) -> String {
    if predicates.is_empty() {
        return String::new();
    }

    let conditions: Vec<String> = predicates
        .iter()
        .map(|predicate| {
            let column = predicate.column().as_str();
            match predicate {
                Predicate::In { values, .. } => {
                    params.extend(values.iter().cloned().map(DuckValue::Text));
                    let placeholders = vec!["?"; values.len()].join(", ");
                    format!("{column} IN ({placeholders})")
                }
                Predicate::Eq { value, .. } => {
                    params.push(DuckValue::Text(value.clone()));
                    format!("{column} = ?")
                }
                Predicate::Gte { value, .. } => {
                    params.push(DuckValue::Text(value.clone()));
                    format!("{column} >= ?")
                }
                Predicate::Lte { value, .. } => {
                    params.push(DuckValue::Text(value.clone()));
                    format!("{column} <= ?")
                }
            }
        })
        .collect();

    format!(" WHERE {}", conditions.join(" AND "))
}

// Nulls sort as the hosted store sorts them: last ascending, first descending.
fn render_order_key(key: &OrderKey) -> String {
    let column = key.column.as_str();
    match key.direction {
        SortOrder::Asc => format!("{column} ASC NULLS LAST"),
        SortOrder::Desc => format!("{column} DESC NULLS FIRST"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saham_core::{HistoryFilter, SortBy, TradeDate};

    fn compose(filter: HistoryFilter) -> HistoryQuery {
        HistoryQuery::compose(&filter).expect("compose")
    }

    #[test]
    fn empty_plan_selects_everything_newest_first() {
        let sql = render_history(&compose(HistoryFilter::default()));

        assert!(sql.select.ends_with("FROM stock_queries ORDER BY from_date DESC NULLS FIRST"));
        assert_eq!(sql.count, "SELECT COUNT(*) FROM stock_queries");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn filters_are_and_combined_and_bound() {
        let sql = render_history(&compose(HistoryFilter {
            emiten: Some(String::from("BBCA TLKM")),
            sector: Some(String::from("Finance")),
            from_date: Some(TradeDate::parse("2024-01-02").expect("date")),
            ..HistoryFilter::default()
        }));

        assert_eq!(
            sql.count,
            "SELECT COUNT(*) FROM stock_queries WHERE emiten IN (?, ?) AND sector = ? AND from_date >= ?"
        );
        assert_eq!(
            sql.params,
            vec![
                DuckValue::Text(String::from("BBCA")),
                DuckValue::Text(String::from("TLKM")),
                DuckValue::Text(String::from("Finance")),
                DuckValue::Text(String::from("2024-01-02")),
            ]
        );
    }

    #[test]
    fn range_window_renders_limit_and_offset() {
        let sql = render_history(&compose(HistoryFilter {
            sort_by: SortBy::Emiten,
            limit: Some(10),
            offset: Some(20),
            ..HistoryFilter::default()
        }));

        assert!(sql.select.ends_with(
            "ORDER BY emiten DESC NULLS FIRST, from_date ASC NULLS LAST LIMIT 10 OFFSET 20"
        ));
    }

    #[test]
    fn bare_limit_has_no_offset() {
        let sql = render_history(&compose(HistoryFilter {
            limit: Some(5),
            ..HistoryFilter::default()
        }));

        assert!(sql.select.ends_with("LIMIT 5"));
        assert!(!sql.select.contains("OFFSET"));
    }
}
