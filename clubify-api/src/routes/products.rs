/// Product catalogue
///
/// - `GET /api/products`: active products, newest first
/// - `POST /api/products`: add a product (lead, board)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::extract::{not_blank, Gate, Officers, ValidJson},
};
use axum::{extract::State, http::StatusCode, Json};
use clubify_shared::models::{
    club::{Club, ClubRef},
    product::{CreateProduct, Product, ProductCategory},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "not_blank", message = "Name must not be blank")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 2000, message = "Description must be 1-2000 characters"),
        custom(function = "not_blank", message = "Description must not be blank")
    )]
    pub description: String,

    #[validate(
        required(message = "price is required"),
        range(min = 0.0, message = "price must not be negative")
    )]
    pub price: Option<f64>,

    #[validate(
        required(message = "cost is required"),
        range(min = 0.0, message = "cost must not be negative")
    )]
    pub cost: Option<f64>,

    /// Defaults to 0
    #[validate(range(min = 0, message = "stock must not be negative"))]
    pub stock: Option<i32>,

    pub club: Option<ClubRef>,
    pub category: Option<ProductCategory>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub success: bool,
    pub message: String,
    pub product: Product,
}

pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<ProductListResponse>> {
    let products = Product::list_active(&state.db).await?;

    Ok(Json(ProductListResponse {
        success: true,
        products,
    }))
}

pub async fn create_product(
    State(state): State<AppState>,
    Gate(auth, _): Gate<Officers>,
    ValidJson(req): ValidJson<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    let (Some(price), Some(cost)) = (req.price, req.cost) else {
        return Err(ApiError::invalid_field("price", "price and cost are required"));
    };

    let club_id = Club::resolve(&state.db, req.club.unwrap_or_default(), auth.user_id).await?;

    let product = Product::create(
        &state.db,
        CreateProduct {
            name: req.name.trim().to_string(),
            description: req.description,
            price,
            cost,
            stock: req.stock.unwrap_or(0),
            club_id,
            category: req.category.unwrap_or_default(),
        },
    )
    .await?;

    info!(product_id = %product.id, club_id = %club_id, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            message: "Product created successfully".to_string(),
            product,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_price_rejected() {
        let req: CreateProductRequest = serde_json::from_str(
            r#"{"name": "Mug", "description": "Club mug", "price": -1, "cost": 2}"#,
        )
        .unwrap();

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_missing_cost_rejected() {
        let req: CreateProductRequest =
            serde_json::from_str(r#"{"name": "Mug", "description": "Club mug", "price": 5}"#).unwrap();

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_valid_product() {
        let req: CreateProductRequest = serde_json::from_str(
            r#"{"name": "Mug", "description": "Club mug", "price": 5.5, "cost": 2, "category": "merchandise"}"#,
        )
        .unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.category, Some(ProductCategory::Merchandise));
        assert_eq!(req.stock, None);
    }
}
