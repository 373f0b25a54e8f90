//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::FleetError;
use crate::models::{
    CommandOutcome, CommandType, Device, DeviceConfig, DeviceStatus, DeviceType, DeviceUpdate,
    Group, GroupStatistics, StatusReport,
};
use crate::server::state::ServerState;
use crate::utils::{from_json_object, version_info};

/// Error body returned by every handler
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wrapper that maps [`FleetError`] onto an HTTP status
pub struct ApiError(FleetError);

impl From<FleetError> for ApiError {
    fn from(err: FleetError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            FleetError::InvalidId(_)
            | FleetError::InvalidGroupName(_)
            | FleetError::InvalidConfig(_)
            | FleetError::InvalidCommand(_)
            | FleetError::MalformedMessage(_) => StatusCode::BAD_REQUEST,
            FleetError::NotFound(_) | FleetError::GroupNotFound(_) => StatusCode::NOT_FOUND,
            FleetError::AlreadyExists(_) => StatusCode::CONFLICT,
            FleetError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
            FleetError::DeliveryFailed { .. } | FleetError::GroupCommandFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        debug!("Request failed with {}: {}", status, self.0);
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ================================ SERVICE ===================================== //

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub bus_connected: bool,
    pub devices: usize,
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "fleethub".to_string(),
        version: version_info().version,
        bus_connected: state.bus.is_connected(),
        devices: state.registry.len(),
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    Json(version_info())
}

// ================================ DEVICES ===================================== //

/// Device registration request
#[derive(Debug, Deserialize)]
pub struct RegisterDeviceRequest {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub device_type: DeviceType,
    #[serde(default)]
    pub config: Option<DeviceConfig>,
    #[serde(default)]
    pub groups: Vec<String>,
}

pub async fn list_devices_handler(State(state): State<Arc<ServerState>>) -> Json<Vec<Device>> {
    Json(state.registry.all_devices())
}

pub async fn register_device_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<RegisterDeviceRequest>,
) -> ApiResult<(StatusCode, Json<Device>)> {
    let device = state.registry.register(
        &request.id,
        &request.name,
        request.device_type,
        request.config,
        &request.groups,
    )?;
    Ok((StatusCode::CREATED, Json(device)))
}

pub async fn get_device_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Device>> {
    Ok(Json(state.registry.get(&id)?))
}

pub async fn update_device_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(update): Json<DeviceUpdate>,
) -> ApiResult<Json<Device>> {
    Ok(Json(state.registry.update(&id, update)?))
}

pub async fn delete_device_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.registry.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(FleetError::NotFound(id).into())
    }
}

/// Apply a status report as if it had arrived on the device's status topic
pub async fn device_status_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<DeviceStatus>> {
    let report: StatusReport = from_json_object(body).map_err(FleetError::MalformedMessage)?;
    Ok(Json(state.lifecycle.ingest(&id, report)?))
}

/// Command request
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    #[serde(rename = "type")]
    pub command_type: CommandType,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

pub async fn device_command_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(request): Json<CommandRequest>,
) -> ApiResult<Json<CommandOutcome>> {
    let outcome = state
        .dispatcher
        .send_to_device(&id, request.command_type, request.payload)
        .await?;
    Ok(Json(outcome))
}

// ================================= GROUPS ===================================== //

/// Group creation request
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

/// Group creation response
#[derive(Debug, Serialize)]
pub struct CreateGroupResponse {
    pub name: String,
    pub created: bool,
}

/// Membership change response
#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub group: String,
    pub device_id: String,
    pub success: bool,
}

/// Group command response
#[derive(Debug, Serialize)]
pub struct GroupCommandResponse {
    pub group: String,
    pub command_type: CommandType,
    pub members: usize,
}

pub async fn list_groups_handler(State(state): State<Arc<ServerState>>) -> Json<Vec<Group>> {
    Json(state.registry.all_groups())
}

pub async fn create_group_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<CreateGroupResponse>)> {
    let created = state.registry.create_group(&request.name)?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(CreateGroupResponse {
            name: request.name,
            created,
        }),
    ))
}

pub async fn delete_group_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    if state.registry.remove_group(&name) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(FleetError::GroupNotFound(name).into())
    }
}

pub async fn group_devices_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<Device>>> {
    Ok(Json(state.registry.devices_in_group(&name)?))
}

pub async fn add_to_group_handler(
    State(state): State<Arc<ServerState>>,
    Path((name, id)): Path<(String, String)>,
) -> ApiResult<Json<MembershipResponse>> {
    let success = state.registry.add_to_group(&id, &name)?;
    Ok(Json(MembershipResponse {
        group: name,
        device_id: id,
        success,
    }))
}

pub async fn remove_from_group_handler(
    State(state): State<Arc<ServerState>>,
    Path((name, id)): Path<(String, String)>,
) -> ApiResult<Json<MembershipResponse>> {
    let success = state.registry.remove_from_group(&id, &name)?;
    Ok(Json(MembershipResponse {
        group: name,
        device_id: id,
        success,
    }))
}

pub async fn group_statistics_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<GroupStatistics>> {
    Ok(Json(state.statistics.compute_group_statistics(&name)?))
}

pub async fn group_command_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
    Json(request): Json<CommandRequest>,
) -> ApiResult<(StatusCode, Json<GroupCommandResponse>)> {
    let members = state.registry.device_ids_in_group(&name)?.len();
    state
        .dispatcher
        .send_to_group(&name, request.command_type, request.payload)
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(GroupCommandResponse {
            group: name,
            command_type: request.command_type,
            members,
        }),
    ))
}
