use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use watchparty_collab::{RoomError, StoreError};

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },
    #[error("{resource}:{identifier} already exists")]
    Conflict {
        resource: &'static str,
        identifier: String,
    },
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.as_status_code(), self.to_string()).into_response()
    }
}

impl From<RoomError> for ServerError {
    fn from(value: RoomError) -> Self {
        match value {
            RoomError::UserNotInRoom
            | RoomError::NotAllowed
            | RoomError::HostOnly => Self::Forbidden(value.to_string()),
            RoomError::CannotTargetSelf
            | RoomError::NoCurrentVideo
            | RoomError::EmptyMessage => Self::BadRequest(value.to_string()),
            RoomError::VideoNotInQueue(id) => Self::NotFound {
                resource: "video",
                identifier: id,
            },
            RoomError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            StoreError::Conflict {
                resource,
                identifier,
            } => Self::Conflict {
                resource,
                identifier,
            },
            e => Self::Unknown(e.to_string()),
        }
    }
}
