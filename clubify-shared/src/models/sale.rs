/// Recorded sales
///
/// A sale's `total_amount` is whatever the seller submitted. It is not
/// recomputed from `quantity × unit_price` and stock is not decremented.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{product::ProductSummary, user::UserRole, user_columns, ClubSummary, UserSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Online,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sale_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Pending,
    #[default]
    Completed,
    Cancelled,
    Refunded,
}

/// Optional buyer contact details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub product: ProductSummary,
    pub club: ClubSummary,
    pub seller: UserSummary,
    pub buyer: Buyer,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSale {
    pub product_id: Uuid,
    pub club_id: Uuid,
    pub seller_id: Uuid,
    pub buyer: Buyer,
    pub quantity: i32,
    pub unit_price: f64,

    /// Stored as given; `None` falls back to `quantity × unit_price`
    pub total_amount: Option<f64>,

    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub notes: Option<String>,
}

impl CreateSale {
    pub fn resolved_total(&self) -> f64 {
        self.total_amount
            .unwrap_or_else(|| f64::from(self.quantity) * self.unit_price)
    }
}

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: Uuid,
    buyer_name: Option<String>,
    buyer_email: Option<String>,
    buyer_phone: Option<String>,
    quantity: i32,
    unit_price: f64,
    total_amount: f64,
    payment_method: PaymentMethod,
    status: SaleStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    product_id: Uuid,
    product_name: String,
    product_price: f64,
    club_id: Uuid,
    club_name: String,
    seller_id: Uuid,
    seller_name: String,
    seller_email: String,
    seller_role: UserRole,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Sale {
            id: row.id,
            product: ProductSummary {
                id: row.product_id,
                name: row.product_name,
                price: row.product_price,
            },
            club: ClubSummary {
                id: row.club_id,
                name: row.club_name,
            },
            seller: UserSummary {
                id: row.seller_id,
                name: row.seller_name,
                email: row.seller_email,
                role: row.seller_role,
            },
            buyer: Buyer {
                name: row.buyer_name,
                email: row.buyer_email,
                phone: row.buyer_phone,
            },
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_amount: row.total_amount,
            payment_method: row.payment_method,
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn sale_select() -> String {
    format!(
        "SELECT s.id, s.buyer_name, s.buyer_email, s.buyer_phone, s.quantity, s.unit_price, \
                s.total_amount, s.payment_method, s.status, s.notes, s.created_at, s.updated_at, \
                p.id AS product_id, p.name AS product_name, p.price AS product_price, \
                c.id AS club_id, c.name AS club_name, {} \
         FROM sales s \
         JOIN products p ON p.id = s.product_id \
         JOIN clubs c ON c.id = s.club_id \
         JOIN users u ON u.id = s.seller_id",
        user_columns("u", "seller")
    )
}

impl Sale {
    pub async fn create(pool: &PgPool, data: CreateSale) -> Result<Self, sqlx::Error> {
        let total_amount = data.resolved_total();

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO sales (product_id, club_id, seller_id, buyer_name, buyer_email, buyer_phone, \
                                quantity, unit_price, total_amount, payment_method, status, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id",
        )
        .bind(data.product_id)
        .bind(data.club_id)
        .bind(data.seller_id)
        .bind(data.buyer.name)
        .bind(data.buyer.email)
        .bind(data.buyer.phone)
        .bind(data.quantity)
        .bind(data.unit_price)
        .bind(total_amount)
        .bind(data.payment_method)
        .bind(data.status)
        .bind(data.notes)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{} WHERE s.id = $1", sale_select());

        let row = sqlx::query_as::<_, SaleRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Sale::from))
    }

    /// Every sale, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("{} ORDER BY s.created_at DESC", sale_select());

        let rows = sqlx::query_as::<_, SaleRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Sale::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_sale(quantity: i32, unit_price: f64, total_amount: Option<f64>) -> CreateSale {
        CreateSale {
            product_id: Uuid::new_v4(),
            club_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            buyer: Buyer::default(),
            quantity,
            unit_price,
            total_amount,
            payment_method: PaymentMethod::Cash,
            status: SaleStatus::Completed,
            notes: None,
        }
    }

    #[test]
    fn test_missing_total_is_filled() {
        assert_eq!(create_sale(3, 2.5, None).resolved_total(), 7.5);
    }

    #[test]
    fn test_submitted_total_is_kept_as_is() {
        // Discounts and mistakes alike are stored unchanged
        assert_eq!(create_sale(3, 2.5, Some(5.0)).resolved_total(), 5.0);
        assert_eq!(create_sale(1, 10.0, Some(0.0)).resolved_total(), 0.0);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
        assert_eq!(SaleStatus::default(), SaleStatus::Completed);
    }

    #[test]
    fn test_buyer_deserializes_partially() {
        let buyer: Buyer = serde_json::from_str(r#"{"name": "Lin"}"#).unwrap();
        assert_eq!(buyer.name.as_deref(), Some("Lin"));
        assert!(buyer.email.is_none());
        assert!(buyer.phone.is_none());
    }
}
