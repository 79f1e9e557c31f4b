//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{
    AutocompleteRequest, AutocompleteResponse, PaginationMeta, RoomListResponse, RoomResponse,
};
use super::handlers::system::HealthResponse;
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI specification, served by Swagger UI when the
/// `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::rooms::create_room,
        crate::api::handlers::rooms::list_rooms,
        crate::api::handlers::rooms::get_room,
        crate::api::handlers::autocomplete::autocomplete,
        crate::api::handlers::system::health_handler,
    ),
    components(schemas(
        RoomResponse,
        RoomListResponse,
        PaginationMeta,
        AutocompleteRequest,
        AutocompleteResponse,
        HealthResponse,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Rooms", description = "Room catalog"),
        (name = "Autocomplete", description = "Completion stub"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;
