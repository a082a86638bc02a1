use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::{PincodeQuery, PincodeResponse};
use crate::services::metrics::record_pincode_lookup;
use crate::services::Serviceability;
use crate::utils::validate_pincode;
use crate::AppState;

/// Delivery serviceability for a pincode.
///
/// GET /pincode?pincode=110001
#[tracing::instrument(skip(state, query))]
pub async fn check_pincode(
    State(state): State<AppState>,
    Query(query): Query<PincodeQuery>,
) -> Result<(StatusCode, Json<PincodeResponse>), AppError> {
    let pincode = query.pincode.as_str();

    let format = validate_pincode(pincode);
    if let Some(message) = format.errors.get("pincode") {
        return Ok((StatusCode::BAD_REQUEST, Json(Serviceability::unavailable(message))));
    }

    let result = state
        .pincodes
        .lookup(pincode)
        .await
        .map_err(|e| AppError::upstream("Unable to check delivery availability", e))?;

    record_pincode_lookup(result.available);

    Ok((StatusCode::OK, Json(result)))
}
