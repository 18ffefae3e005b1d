use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::Validate;
use watchparty_collab::{RoomSettings, VideoInfo};

use crate::context::ServerContext;

/// The header carrying the id of the member performing a request
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewRoomSchema {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(length(min = 1, max = 32))]
    pub user_name: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JoinRoomSchema {
    #[validate(length(min = 1, max = 32))]
    pub user_name: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewVideoSchema {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(url)]
    pub thumbnail: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewMessageSchema {
    #[validate(length(min = 1, max = 1024))]
    pub text: String,
}

#[derive(Debug, ToSchema, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransferHostSchema {
    pub user_id: String,
}

#[derive(Debug, ToSchema, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RoomSettingsSchema {
    pub allow_all_play_pause: bool,
    pub allow_all_skip: bool,
    pub allow_all_delete: bool,
    pub allow_all_queue_reorder: bool,
}

/// The new queue order, replacing the existing queue wholesale
#[derive(Debug, ToSchema, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReorderQueueSchema {
    #[schema(value_type = Vec<Object>)]
    pub queue: Vec<VideoInfo>,
}

#[derive(Debug, ToSchema, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RoomActionSchema {
    Play,
    Pause,
    Seek { to: f32 },
    Skip,
    SkipCurrent,
    PlayFromQueue { video_id: String },
}

impl From<RoomSettingsSchema> for RoomSettings {
    fn from(value: RoomSettingsSchema) -> Self {
        Self {
            allow_all_play_pause: value.allow_all_play_pause,
            allow_all_skip: value.allow_all_skip,
            allow_all_delete: value.allow_all_delete,
            allow_all_queue_reorder: value.allow_all_queue_reorder,
        }
    }
}

/// The id of the member performing the request, taken from the
/// `X-User-Id` header. Membership itself is checked by the room operations.
pub struct ActingUser(pub String);

#[async_trait]
impl FromRequestParts<ServerContext> for ActingUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing X-User-Id header"))?;

        Ok(Self(user_id.to_string()))
    }
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}
