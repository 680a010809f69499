//! Request handlers

use autobot_common::{ContentHash, Country};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::response::{ApiVehicle, ServiceStatus, VehicleOp, VehiclePatch, VehiclePatched};
use super::AppState;
use crate::error::AppError;
use crate::store::StoreStatus;

pub async fn root(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(ServiceStatus::running(state.started_at.elapsed()))
}

pub async fn store_status(State(state): State<AppState>) -> Json<StoreStatus> {
    Json(state.store.status().await)
}

#[derive(Debug, Default, Deserialize)]
pub struct LookupParams {
    pub hash: Option<String>,
    pub country: Option<String>,
    pub regnr: Option<String>,
    pub vin: Option<String>,
}

enum LookupKey {
    Hash(ContentHash),
    RegNr(Country, String),
    Vin(Country, String),
}

impl LookupParams {
    fn key(self) -> Result<LookupKey, AppError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let (hash, regnr, vin) = (present(self.hash), present(self.regnr), present(self.vin));
        let country = present(self.country);

        let given = [hash.is_some(), regnr.is_some(), vin.is_some()]
            .iter()
            .filter(|g| **g)
            .count();
        if given != 1 {
            return Err(AppError::BadRequest(
                "exactly one of 'hash', 'regnr' or 'vin' must be given".to_string(),
            ));
        }

        if let Some(hash) = hash {
            return Ok(LookupKey::Hash(hash.parse()?));
        }

        let country: Country = country
            .ok_or_else(|| AppError::BadRequest("missing query parameter 'country'".to_string()))?
            .parse()?;
        match (regnr, vin) {
            (Some(regnr), _) => Ok(LookupKey::RegNr(country, regnr)),
            (_, Some(vin)) => Ok(LookupKey::Vin(country, vin)),
            _ => Err(AppError::Internal("lookup key vanished".to_string())),
        }
    }
}

pub async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<ApiVehicle>, AppError> {
    let vehicle = match params.key()? {
        LookupKey::Hash(hash) => state.store.lookup_by_hash(hash).await?,
        LookupKey::RegNr(country, regnr) => {
            state.store.lookup_by_reg_nr(country, &regnr, false).await?
        },
        LookupKey::Vin(country, vin) => state.store.lookup_by_vin(country, &vin, false).await?,
    };
    Ok(Json(ApiVehicle::from(&vehicle)))
}

pub async fn patch_vehicle(
    State(state): State<AppState>,
    Json(patch): Json<VehiclePatch>,
) -> Result<Json<VehiclePatched>, AppError> {
    let hash: ContentHash = patch.hash.parse()?;
    match patch.op {
        VehicleOp::Enable => state.store.enable(hash).await?,
        VehicleOp::Disable => state.store.disable(hash).await?,
    }

    Ok(Json(VehiclePatched {
        hash: hash.as_key(),
        disabled: patch.op == VehicleOp::Disable,
    }))
}
