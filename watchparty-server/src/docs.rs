use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;
use utoipauto::utoipauto;

#[utoipauto(paths = "./watchparty-server/src")]
#[derive(OpenApi)]
#[openapi(info(
    description = "watchparty-server exposes endpoints to create and interact with watch rooms"
))]
pub struct ApiDoc;

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
