//! Admin dashboard refresh
//!
//! Fetches payables, receivables, inventory, and vendors concurrently and
//! reduces them to the headline figures shown on the admin dashboard.

use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiClient, Result};

/// Endpoints loaded by a dashboard refresh
pub const DASHBOARD_PATHS: [&str; 4] = ["hutang", "piutang", "inventory", "vendors"];

/// Headline dashboard figures
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Number of inventory records
    pub total_products: usize,
    /// Inventory records whose closing stock is zero or below
    pub out_of_stock: usize,
    /// Sum of unpaid receivable invoices
    pub total_receivable: f64,
    /// Sum of unpaid payable invoices
    pub total_payable: f64,
    /// Number of registered vendors
    pub total_vendors: usize,
}

impl DashboardSummary {
    /// Builds the summary from the four dashboard lists
    pub fn from_lists(
        hutang: &[Value],
        piutang: &[Value],
        inventory: &[Value],
        vendors: &[Value],
    ) -> Self {
        Self {
            total_products: inventory.len(),
            out_of_stock: inventory
                .iter()
                .filter_map(|item| item.get("stok_akhir").and_then(number))
                .filter(|stok| *stok <= 0.0)
                .count(),
            total_receivable: unpaid_total(piutang),
            total_payable: unpaid_total(hutang),
            total_vendors: vendors.len(),
        }
    }
}

/// Loads every dashboard list concurrently and summarizes them
///
/// Fails with the first error if any list cannot be loaded.
pub async fn refresh(client: &ApiClient) -> Result<DashboardSummary> {
    let [hutang, piutang, inventory, vendors] = DASHBOARD_PATHS;
    let (hutang, piutang, inventory, vendors) = futures::try_join!(
        client.get(hutang),
        client.get(piutang),
        client.get(inventory),
        client.get(vendors),
    )?;

    Ok(DashboardSummary::from_lists(
        hutang.data_list(),
        piutang.data_list(),
        inventory.data_list(),
        vendors.data_list(),
    ))
}

/// Sum of `total_tagihan` over records not marked "lunas" (paid)
fn unpaid_total(records: &[Value]) -> f64 {
    records
        .iter()
        .filter(|record| {
            !record["status"]
                .as_str()
                .unwrap_or_default()
                .eq_ignore_ascii_case("lunas")
        })
        .filter_map(|record| record.get("total_tagihan").and_then(number))
        .sum()
}

/// Reads a spreadsheet cell as a number
///
/// Sheets hand back numbers or numeric strings. An empty cell arrives as `""`
/// or `null` and reads as 0.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Null => Some(0.0),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
