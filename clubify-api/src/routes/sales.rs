/// Sales ledger
///
/// - `GET /api/sales`: every sale, newest first, with analytics
/// - `POST /api/sales`: record a sale with the caller as seller (lead, board)
///
/// `totalAmount` is stored exactly as submitted. Only when it is omitted is
/// it filled in as `quantity × unitPrice`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::extract::{Gate, Officers, ValidJson},
};
use axum::{extract::State, http::StatusCode, Json};
use clubify_shared::{
    analytics::SalesAnalytics,
    models::{
        club::{Club, ClubRef},
        sale::{Buyer, CreateSale, PaymentMethod, Sale, SaleStatus},
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[validate(required(message = "product is required"))]
    pub product: Option<Uuid>,

    pub club: Option<ClubRef>,

    #[serde(default)]
    pub buyer: Buyer,

    #[validate(
        required(message = "quantity is required"),
        range(min = 1, message = "quantity must be at least 1")
    )]
    pub quantity: Option<i32>,

    #[validate(
        required(message = "unitPrice is required"),
        range(min = 0.0, message = "unitPrice must not be negative")
    )]
    pub unit_price: Option<f64>,

    #[validate(range(min = 0.0, message = "totalAmount must not be negative"))]
    pub total_amount: Option<f64>,

    pub payment_method: Option<PaymentMethod>,
    pub status: Option<SaleStatus>,

    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaleListResponse {
    pub success: bool,
    pub sales: Vec<Sale>,
    pub analytics: SalesAnalytics,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaleResponse {
    pub success: bool,
    pub message: String,
    pub sale: Sale,
}

pub async fn list_sales(State(state): State<AppState>) -> ApiResult<Json<SaleListResponse>> {
    let sales = Sale::list(&state.db).await?;
    let analytics = SalesAnalytics::from_sales(&sales);

    Ok(Json(SaleListResponse {
        success: true,
        sales,
        analytics,
    }))
}

pub async fn create_sale(
    State(state): State<AppState>,
    Gate(auth, _): Gate<Officers>,
    ValidJson(req): ValidJson<CreateSaleRequest>,
) -> ApiResult<(StatusCode, Json<SaleResponse>)> {
    let (Some(product_id), Some(quantity), Some(unit_price)) =
        (req.product, req.quantity, req.unit_price)
    else {
        return Err(ApiError::invalid_field(
            "product",
            "product, quantity and unitPrice are required",
        ));
    };

    let club_id = Club::resolve(&state.db, req.club.unwrap_or_default(), auth.user_id).await?;

    let sale = Sale::create(
        &state.db,
        CreateSale {
            product_id,
            club_id,
            seller_id: auth.user_id,
            buyer: req.buyer,
            quantity,
            unit_price,
            total_amount: req.total_amount,
            payment_method: req.payment_method.unwrap_or_default(),
            status: req.status.unwrap_or_default(),
            notes: req.notes,
        },
    )
    .await?;

    info!(
        sale_id = %sale.id,
        product_id = %product_id,
        seller = %auth.user_id,
        total = sale.total_amount,
        "Sale recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(SaleResponse {
            success: true,
            message: "Sale recorded successfully".to_string(),
            sale,
        }),
    ))
}
