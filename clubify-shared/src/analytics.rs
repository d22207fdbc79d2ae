/// Sales analytics
///
/// Aggregates a list of sales into totals per product and the pie-chart
/// geometry the dashboard draws from them.
///
/// # Pie chart
///
/// Products are laid out in name order. Each segment covers
/// `amount / total × 360` degrees, starting where the previous one ended,
/// beginning at 0. Colours cycle through [`PALETTE`].
///
/// # Example
///
/// ```
/// use clubify_shared::analytics::{SaleLine, SalesAnalytics};
///
/// let analytics = SalesAnalytics::from_lines(vec![
///     SaleLine { product: Some("Hoodie"), quantity: 2, amount: 75.0 },
///     SaleLine { product: Some("Mug"), quantity: 5, amount: 25.0 },
/// ]);
///
/// assert_eq!(analytics.total_sales, 100.0);
/// assert_eq!(analytics.chart[0].end_angle, 270.0);
/// ```

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::sale::Sale;

/// Label used when a sale has no product name
pub const UNKNOWN_PRODUCT: &str = "Unknown product";

/// Segment colours, reused in order when there are more products
pub const PALETTE: [&str; 8] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#06B6D4", "#84CC16", "#F97316",
];

/// The fields of a sale that analytics cares about
#[derive(Debug, Clone, Copy)]
pub struct SaleLine<'a> {
    pub product: Option<&'a str>,
    pub quantity: i64,
    pub amount: f64,
}

impl<'a> From<&'a Sale> for SaleLine<'a> {
    fn from(sale: &'a Sale) -> Self {
        SaleLine {
            product: Some(sale.product.name.as_str()),
            quantity: i64::from(sale.quantity),
            amount: sale.total_amount,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProductTotals {
    pub quantity: i64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSegment {
    pub label: String,
    pub amount: f64,

    /// Share of the total in percent (0-100)
    pub percentage: f64,

    /// Degrees
    pub start_angle: f64,

    /// Degrees
    pub end_angle: f64,

    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesAnalytics {
    /// Sum of the sales' total amounts
    pub total_sales: f64,

    /// Product name → quantity and amount
    pub sales_by_product: BTreeMap<String, ProductTotals>,

    pub total_transactions: usize,

    pub chart: Vec<PieSegment>,
}

impl SalesAnalytics {
    pub fn from_sales(sales: &[Sale]) -> Self {
        Self::from_lines(sales.iter().map(SaleLine::from))
    }

    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = SaleLine<'a>>,
    {
        let mut total_sales = 0.0;
        let mut total_transactions = 0;
        let mut sales_by_product: BTreeMap<String, ProductTotals> = BTreeMap::new();

        for line in lines {
            let name = line
                .product
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(UNKNOWN_PRODUCT);

            let totals = sales_by_product.entry(name.to_string()).or_default();
            totals.quantity += line.quantity;
            totals.amount += line.amount;

            total_sales += line.amount;
            total_transactions += 1;
        }

        let chart = pie_segments(&sales_by_product);

        SalesAnalytics {
            total_sales,
            sales_by_product,
            total_transactions,
            chart,
        }
    }
}

/// Lays out one segment per product
///
/// Returns no segments when the total is zero, negative or not finite.
pub fn pie_segments(totals: &BTreeMap<String, ProductTotals>) -> Vec<PieSegment> {
    let total: f64 = totals.values().map(|t| t.amount).sum();
    if !total.is_finite() || total <= 0.0 {
        return Vec::new();
    }

    let mut current_angle = 0.0;

    totals
        .iter()
        .enumerate()
        .map(|(index, (label, product))| {
            let share = product.amount / total;
            let start_angle = current_angle;
            let end_angle = current_angle + share * 360.0;
            current_angle = end_angle;

            PieSegment {
                label: label.clone(),
                amount: product.amount,
                percentage: share * 100.0,
                start_angle,
                end_angle,
                color: PALETTE[index % PALETTE.len()],
            }
        })
        .collect()
}
