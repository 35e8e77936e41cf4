//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Firecache API",
        version = "0.1.0",
        description = "Caching proxy for cloud storage download URLs. Assets are fetched once per object path and served from a local cache after every caller's access is re-checked at the origin. Image assets can be scaled to a bounding box on the fly."
    ),
    paths(
        handlers::cache::get_cached_asset,
        handlers::scale::get_scaled_asset,
        handlers::health::health_check,
    ),
    components(
        schemas(
            error::ErrorResponse,
            handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "assets", description = "Cached and scaled storage assets"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
