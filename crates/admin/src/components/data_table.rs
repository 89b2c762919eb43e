//! Data table component types.
//!
//! These types configure the list pages: columns, sidebar filters, the
//! year/month drill-down and the bulk action bar.

use serde::Serialize;

use tidemark_core::{RefundReason, RefundStatus};

use crate::models::refund::CreatedWithin;
use crate::services::RefundAction;

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize)]
pub struct TableColumn {
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Right-align the cell (amounts, counts).
    pub numeric: bool,
}

impl TableColumn {
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            numeric: false,
        }
    }

    #[must_use]
    pub fn numeric(key: &str, label: &str) -> Self {
        Self {
            numeric: true,
            ..Self::new(key, label)
        }
    }
}

/// Option for a select filter.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Sidebar filter: a query parameter and the values it may take.
///
/// An implicit "All" option clears the parameter.
#[derive(Debug, Clone, Serialize)]
pub struct TableFilter {
    /// Query parameter key.
    pub key: String,
    pub label: String,
    pub options: Vec<FilterOption>,
    /// Currently selected value, if any.
    pub selected: Option<String>,
}

impl TableFilter {
    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<FilterOption>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            options,
            selected: None,
        }
    }

    /// Yes/no filter over a boolean column.
    #[must_use]
    pub fn yes_no(key: &str, label: &str) -> Self {
        Self::select(
            key,
            label,
            vec![FilterOption::new("yes", "Yes"), FilterOption::new("no", "No")],
        )
    }

    /// Mark `value` as the active choice. Values not among the options are
    /// ignored.
    #[must_use]
    pub fn with_selected(mut self, value: Option<&str>) -> Self {
        self.selected = value
            .filter(|v| self.options.iter().any(|o| o.value == *v))
            .map(ToString::to_string);
        self
    }

    #[must_use]
    pub fn is_selected(&self, value: &str) -> bool {
        self.selected.as_deref() == Some(value)
    }
}

/// A link in the filter sidebar or the date drill-down.
#[derive(Debug, Clone, Serialize)]
pub struct FilterLink {
    pub label: String,
    pub url: String,
    pub selected: bool,
}

/// Encode `params` as a query string, with a leading `?` when non-empty.
#[must_use]
pub fn query_string(params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        query.append_pair(key, value);
    }
    format!("?{}", query.finish())
}

/// `path` with the current `params`, minus `drop` keys, plus `set`.
fn link_url(path: &str, params: &[(&str, String)], drop: &[&str], set: &[(&str, String)]) -> String {
    let mut merged: Vec<(&str, String)> = params
        .iter()
        .filter(|(key, _)| !drop.contains(key) && !set.iter().any(|(k, _)| k == key))
        .cloned()
        .collect();
    merged.extend(set.iter().cloned());
    format!("{path}{}", query_string(&merged))
}

impl TableFilter {
    /// Sidebar links: "All" then one per option, each keeping the other
    /// active parameters and resetting pagination.
    #[must_use]
    pub fn links(&self, path: &str, params: &[(&str, String)]) -> Vec<FilterLink> {
        let key = self.key.as_str();
        let mut links = vec![FilterLink {
            label: "All".to_string(),
            url: link_url(path, params, &[key, "page"], &[]),
            selected: self.selected.is_none(),
        }];
        links.extend(self.options.iter().map(|o| FilterLink {
            label: o.label.clone(),
            url: link_url(path, params, &["page"], &[(key, o.value.clone())]),
            selected: self.is_selected(&o.value),
        }));
        links
    }
}

/// Bulk action definition for data tables.
#[derive(Debug, Clone, Serialize)]
pub struct BulkAction {
    /// Action key posted as `action`.
    pub key: String,
    pub label: String,
    /// Phosphor icon class.
    pub icon: String,
    pub destructive: bool,
}

impl BulkAction {
    #[must_use]
    pub fn new(key: &str, label: &str, icon: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            icon: icon.to_string(),
            destructive: false,
        }
    }

    #[must_use]
    pub const fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }
}

impl From<RefundAction> for BulkAction {
    fn from(action: RefundAction) -> Self {
        let bulk = Self::new(action.key(), action.label(), &format!("ph-{}", action.icon()));
        if action.is_destructive() {
            bulk.destructive()
        } else {
            bulk
        }
    }
}

/// Year/month drill-down above a list, Django's `date_hierarchy`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DateDrilldown {
    pub year: Option<i32>,
    pub month: Option<i32>,
    /// Years to offer when no year is selected.
    pub years: Vec<i32>,
    /// Months of `year` to offer when a year but no month is selected.
    pub months: Vec<i32>,
}

impl DateDrilldown {
    /// English month name, or an empty string out of range.
    #[must_use]
    pub fn month_name(month: &i32) -> &'static str {
        const NAMES: [&str; 12] = [
            "January",
            "February",
            "March",
            "April",
            "May",
            "June",
            "July",
            "August",
            "September",
            "October",
            "November",
            "December",
        ];
        usize::try_from(*month - 1)
            .ok()
            .and_then(|i| NAMES.get(i))
            .copied()
            .unwrap_or("")
    }

    /// Link one level up, if drilled in.
    #[must_use]
    pub fn back_link(&self, path: &str, params: &[(&str, String)]) -> Option<FilterLink> {
        match (self.year, self.month) {
            (Some(year), Some(_)) => Some(FilterLink {
                label: format!("\u{2039} {year}"),
                url: link_url(path, params, &["month", "page"], &[]),
                selected: false,
            }),
            (Some(_), None) => Some(FilterLink {
                label: "\u{2039} All dates".to_string(),
                url: link_url(path, params, &["year", "month", "page"], &[]),
                selected: false,
            }),
            (None, _) => None,
        }
    }

    /// Links one level down: years, then months of the selected year.
    #[must_use]
    pub fn links(&self, path: &str, params: &[(&str, String)]) -> Vec<FilterLink> {
        match (self.year, self.month) {
            (None, _) => self
                .years
                .iter()
                .map(|year| FilterLink {
                    label: year.to_string(),
                    url: link_url(path, params, &["month", "page"], &[("year", year.to_string())]),
                    selected: false,
                })
                .collect(),
            (Some(year), None) => self
                .months
                .iter()
                .map(|month| FilterLink {
                    label: format!("{} {year}", Self::month_name(month)),
                    url: link_url(path, params, &["page"], &[("month", month.to_string())]),
                    selected: false,
                })
                .collect(),
            (Some(year), Some(month)) => vec![FilterLink {
                label: format!("{} {year}", Self::month_name(&month)),
                url: link_url(path, params, &["page"], &[]),
                selected: true,
            }],
        }
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize)]
pub struct DataTableConfig {
    pub table_id: String,
    pub columns: Vec<TableColumn>,
    pub filters: Vec<TableFilter>,
    pub bulk_actions: Vec<BulkAction>,
    pub search_placeholder: String,
    pub empty_icon: String,
    pub empty_title: String,
}

impl DataTableConfig {
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            filters: vec![],
            bulk_actions: vec![],
            search_placeholder: "Search...".to_string(),
            empty_icon: "ph-list".to_string(),
            empty_title: "No items found".to_string(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn bulk_action(mut self, action: BulkAction) -> Self {
        self.bulk_actions.push(action);
        self
    }

    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    #[must_use]
    pub fn empty_state(mut self, icon: &str, title: &str) -> Self {
        self.empty_icon = icon.to_string();
        self.empty_title = title.to_string();
        self
    }

    /// Apply the request's filter values, keyed by filter key.
    #[must_use]
    pub fn with_selected<'a>(mut self, selected: impl Fn(&str) -> Option<&'a str>) -> Self {
        self.filters = self
            .filters
            .into_iter()
            .map(|f| {
                let value = selected(&f.key);
                f.with_selected(value)
            })
            .collect();
        self
    }
}

/// Refund request list: columns, the status/reason/created filters and the
/// six workflow actions.
#[must_use]
pub fn refunds_table_config() -> DataTableConfig {
    let status_options = RefundStatus::ALL
        .iter()
        .map(|s| FilterOption::new(s.as_str(), s.label()))
        .collect();
    let reason_options = RefundReason::ALL
        .iter()
        .map(|r| FilterOption::new(r.as_str(), r.label()))
        .collect();
    let created_options = CreatedWithin::ALL
        .iter()
        .map(|c| FilterOption::new(c.key(), c.label()))
        .collect();

    let mut config = DataTableConfig::new("refunds")
        .column(TableColumn::new("id", "ID"))
        .column(TableColumn::new("order", "Order"))
        .column(TableColumn::new("customer", "Customer"))
        .column(TableColumn::numeric("refund_amount", "Refund amount"))
        .column(TableColumn::new("status", "Status"))
        .column(TableColumn::new("reason", "Reason"))
        .column(TableColumn::new("created_at", "Created"))
        .filter(TableFilter::select("status", "By status", status_options))
        .filter(TableFilter::select("reason", "By reason", reason_options))
        .filter(TableFilter::select("created", "By created at", created_options))
        .search_placeholder("Search by order ID, email, name or username")
        .empty_state("ph-receipt-x", "No refund requests found");

    for action in RefundAction::ALL {
        config = config.bulk_action(action.into());
    }
    config
}

/// Refund item list. Read-only: no bulk actions.
#[must_use]
pub fn refund_items_table_config() -> DataTableConfig {
    DataTableConfig::new("refund-items")
        .column(TableColumn::new("id", "ID"))
        .column(TableColumn::new("refund_request", "Refund request"))
        .column(TableColumn::new("product", "Product"))
        .column(TableColumn::numeric("quantity", "Quantity"))
        .column(TableColumn::numeric("refund_amount", "Refund amount"))
        .column(TableColumn::new("condition_acceptable", "Condition acceptable"))
        .column(TableColumn::new("restocked", "Restocked"))
        .filter(TableFilter::yes_no("condition_acceptable", "By condition acceptable"))
        .filter(TableFilter::yes_no("restocked", "By restocked"))
        .search_placeholder("Search by refund ID or product")
        .empty_state("ph-package", "No refund items found")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_refunds_table_has_all_actions_in_order() {
        let config = refunds_table_config();
        let keys: Vec<_> = config.bulk_actions.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(
            keys,
            [
                "mark_product_received",
                "manual_restock_items",
                "process_paypal_refund",
                "complete_refund",
                "restore_rewards_goodwill",
                "reject_refund",
            ]
        );
        let destructive: Vec<_> = config
            .bulk_actions
            .iter()
            .filter(|a| a.destructive)
            .map(|a| a.key.as_str())
            .collect();
        assert_eq!(destructive, ["reject_refund"]);
    }

    #[test]
    fn test_refund_items_table_is_read_only() {
        let config = refund_items_table_config();
        assert!(config.bulk_actions.is_empty());
        assert_eq!(config.filters.len(), 2);
    }

    #[test]
    fn test_selected_filter_ignores_unknown_values() {
        let config = refunds_table_config().with_selected(|key| match key {
            "status" => Some("COMPLETED"),
            "reason" => Some("NOT_A_REASON"),
            _ => None,
        });
        assert!(config.filters[0].is_selected("COMPLETED"));
        assert_eq!(config.filters[1].selected, None);
        assert_eq!(config.filters[2].selected, None);
    }

    #[test]
    fn test_query_string() {
        assert_eq!(query_string(&[]), "");
        assert_eq!(
            query_string(&[("status", "COMPLETED".to_string()), ("q", "a&b".to_string())]),
            "?status=COMPLETED&q=a%26b"
        );
    }

    #[test]
    fn test_filter_links_keep_other_params() {
        let filter = TableFilter::yes_no("restocked", "By restocked").with_selected(Some("yes"));
        let params = [
            ("restocked", "yes".to_string()),
            ("q", "linen".to_string()),
            ("page", "3".to_string()),
        ];
        let links = filter.links("/refund-items", &params);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].url, "/refund-items?q=linen");
        assert!(!links[0].selected);
        assert_eq!(links[1].url, "/refund-items?q=linen&restocked=yes");
        assert!(links[1].selected);
        assert_eq!(links[2].url, "/refund-items?q=linen&restocked=no");
    }

    #[test]
    fn test_drilldown_levels() {
        let params = [("status", "COMPLETED".to_string())];
        let top = DateDrilldown {
            years: vec![2026, 2025],
            ..DateDrilldown::default()
        };
        assert!(top.back_link("/refunds", &params).is_none());
        let urls: Vec<_> = top.links("/refunds", &params).into_iter().map(|l| l.url).collect();
        assert_eq!(
            urls,
            ["/refunds?status=COMPLETED&year=2026", "/refunds?status=COMPLETED&year=2025"]
        );

        let year_params = [("status", "COMPLETED".to_string()), ("year", "2026".to_string())];
        let in_year = DateDrilldown {
            year: Some(2026),
            months: vec![3],
            ..DateDrilldown::default()
        };
        let back = in_year.back_link("/refunds", &year_params).unwrap();
        assert_eq!(back.url, "/refunds?status=COMPLETED");
        let months = in_year.links("/refunds", &year_params);
        assert_eq!(months[0].label, "March 2026");
        assert_eq!(months[0].url, "/refunds?status=COMPLETED&year=2026&month=3");
    }

    #[test]
    fn test_month_name() {
        assert_eq!(DateDrilldown::month_name(&1), "January");
        assert_eq!(DateDrilldown::month_name(&12), "December");
        assert_eq!(DateDrilldown::month_name(&0), "");
        assert_eq!(DateDrilldown::month_name(&13), "");
    }
}
