use std::cmp::Ordering;

use serde_json::Value;

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Row selection parameters understood by every backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectQuery {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    /// Zero-based offset and row count.
    pub range: Option<(usize, usize)>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Restrict to one page of `per_page` rows, pages counted from zero.
    pub fn page(mut self, page: usize, per_page: usize) -> Self {
        self.range = Some((page.saturating_mul(per_page), per_page));
        self
    }

    /// Query-string parameters in the REST dialect of the hosted service.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        for filter in &self.filters {
            params.push((filter.column.clone(), format!("eq.{}", filter.value)));
        }
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{direction}", order.column)));
        }
        params
    }

    /// Inclusive `Range` header value, when paginated.
    pub fn range_header(&self) -> Option<String> {
        match self.range {
            Some((_, 0)) | None => None,
            Some((offset, count)) => Some(format!("{}-{}", offset, offset + count - 1)),
        }
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|filter| {
            row.get(&filter.column)
                .map(|value| scalar_text(value) == filter.value)
                .unwrap_or(false)
        })
    }

    /// Filter, order and paginate rows held in memory.
    pub fn apply(&self, rows: &[Value]) -> Vec<Value> {
        let mut selected: Vec<Value> = rows.iter().filter(|row| self.matches(row)).cloned().collect();

        if let Some(order) = &self.order {
            selected.sort_by(|left, right| {
                let ordering = compare_values(left.get(&order.column), right.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        match self.range {
            Some((offset, count)) => selected.into_iter().skip(offset).take(count).collect(),
            None => selected,
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(a), Some(b)) => scalar_text(a).cmp(&scalar_text(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_rest_parameters() {
        let query = SelectQuery::new()
            .eq("status", "approved")
            .order_by("created_at", false)
            .page(2, 25);

        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("status".to_string(), "eq.approved".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
        assert_eq!(query.range_header().as_deref(), Some("50-74"));
        assert_eq!(SelectQuery::new().range_header(), None);
    }

    #[test]
    fn applies_filters_order_and_range_in_memory() {
        let rows = vec![
            json!({ "id": "a", "status": "approved", "created_at": "2025-01-01T00:00:00Z" }),
            json!({ "id": "b", "status": "pending", "created_at": "2025-01-03T00:00:00Z" }),
            json!({ "id": "c", "status": "approved", "created_at": "2025-01-02T00:00:00Z" }),
            json!({ "id": "d", "status": "approved", "created_at": "2025-01-04T00:00:00Z" }),
        ];

        let query = SelectQuery::new()
            .eq("status", "approved")
            .order_by("created_at", false)
            .page(0, 2);
        let ids: Vec<_> = query
            .apply(&rows)
            .into_iter()
            .map(|row| row["id"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids, vec!["d", "c"]);

        let second_page = SelectQuery::new()
            .eq("status", "approved")
            .order_by("created_at", false)
            .page(1, 2);
        assert_eq!(second_page.apply(&rows).len(), 1);
    }

    #[test]
    fn numeric_columns_sort_numerically() {
        let rows = vec![json!({ "years": 10 }), json!({ "years": 9 }), json!({ "years": null })];
        let sorted = SelectQuery::new().order_by("years", true).apply(&rows);
        assert_eq!(sorted[0]["years"], Value::Null);
        assert_eq!(sorted[1]["years"], json!(9));
        assert_eq!(sorted[2]["years"], json!(10));
    }
}
