//! Customer API endpoints.

use axum::{extract::State, Json};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateCustomerRequest, Customer};
use crate::AppState;

/// GET /api/customers - List converted customers.
pub async fn list_customers(State(state): State<AppState>) -> ApiResult<Vec<Customer>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_customers().await {
        Ok(customers) => success(customers, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/customers - Record a customer.
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> ApiResult<Customer> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.name.trim().is_empty() {
        return error(AppError::field("name", "Name is required"), revision_id);
    }

    match state.repo.create_customer(&request).await {
        Ok(customer) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(customer, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
