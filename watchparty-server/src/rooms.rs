use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json,
};
use watchparty_collab::NewVideo;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::{
        ActingUser, JoinRoomSchema, NewMessageSchema, NewRoomSchema, NewVideoSchema,
        ReorderQueueSchema, RoomActionSchema, RoomSettingsSchema, TransferHostSchema,
        ValidatedJson,
    },
    serialized::{JoinedRoom, Message, Room, ToSerialized, Video},
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/rooms",
    tag = "rooms",
    responses(
        (status = 200, body = Vec<Room>)
    )
)]
async fn list_rooms(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Room>>> {
    let rooms = context.collab.rooms.list_all().await?;

    Ok(Json(rooms.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}",
    tag = "rooms",
    responses(
        (status = 200, body = Room)
    )
)]
async fn room(
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
) -> ServerResult<Json<Room>> {
    let room = context.collab.rooms.room_by_id(&room_id).await?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms",
    tag = "rooms",
    request_body = NewRoomSchema,
    responses(
        (status = 200, body = JoinedRoom)
    )
)]
async fn create_room(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewRoomSchema>,
) -> ServerResult<Json<JoinedRoom>> {
    let (room, user) = context
        .collab
        .rooms
        .create_room(&body.name, &body.user_name)
        .await?;

    Ok(Json(JoinedRoom {
        room: room.to_serialized(),
        user: user.to_serialized(),
    }))
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/members",
    tag = "rooms",
    request_body = JoinRoomSchema,
    responses(
        (status = 200, body = JoinedRoom)
    )
)]
async fn join_room(
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
    ValidatedJson(body): ValidatedJson<JoinRoomSchema>,
) -> ServerResult<Json<JoinedRoom>> {
    let (_, user) = context
        .collab
        .rooms
        .join_room(&room_id, &body.user_name)
        .await?;

    // Re-read so the response includes the new member
    let room = context.collab.rooms.room_by_id(&room_id).await?;

    Ok(Json(JoinedRoom {
        room: room.to_serialized(),
        user: user.to_serialized(),
    }))
}

#[utoipa::path(
    delete,
    path = "/v1/rooms/{id}/members/{user_id}",
    tag = "rooms",
    responses(
        (status = 200, description = "The member left the room, or was removed by the host")
    )
)]
async fn remove_member(
    acting: ActingUser,
    State(context): State<ServerContext>,
    Path((room_id, user_id)): Path<(String, String)>,
) -> ServerResult<()> {
    if acting.0 == user_id {
        context.collab.rooms.leave_room(&room_id, &user_id).await?;
    } else {
        context
            .collab
            .rooms
            .remove_user(&room_id, &acting.0, &user_id)
            .await?;
    }

    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/host",
    tag = "rooms",
    request_body = TransferHostSchema,
    responses(
        (status = 200, description = "Host privileges were transferred")
    )
)]
async fn transfer_host(
    acting: ActingUser,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
    Json(body): Json<TransferHostSchema>,
) -> ServerResult<()> {
    context
        .collab
        .rooms
        .transfer_host(&room_id, &acting.0, &body.user_id)
        .await?;

    Ok(())
}

#[utoipa::path(
    put,
    path = "/v1/rooms/{id}/settings",
    tag = "rooms",
    request_body = RoomSettingsSchema,
    responses(
        (status = 200, description = "The room settings were replaced")
    )
)]
async fn update_settings(
    acting: ActingUser,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
    Json(body): Json<RoomSettingsSchema>,
) -> ServerResult<()> {
    context
        .collab
        .rooms
        .update_settings(&room_id, &acting.0, body.into())
        .await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}/queue",
    tag = "rooms",
    responses(
        (status = 200, body = Vec<Video>)
    )
)]
async fn queue(
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
) -> ServerResult<Json<Vec<Video>>> {
    let room = context.collab.rooms.room_by_id(&room_id).await?;

    Ok(Json(room.queue.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/queue",
    tag = "rooms",
    request_body = NewVideoSchema,
    responses(
        (status = 200, description = "The video plays immediately, or was appended to the queue")
    )
)]
async fn add_to_queue(
    acting: ActingUser,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
    ValidatedJson(body): ValidatedJson<NewVideoSchema>,
) -> ServerResult<()> {
    context
        .collab
        .rooms
        .add_video(
            &room_id,
            &acting.0,
            NewVideo {
                id: body.id,
                title: body.title,
                thumbnail: body.thumbnail,
            },
        )
        .await?;

    Ok(())
}

#[utoipa::path(
    delete,
    path = "/v1/rooms/{id}/queue/{video_id}",
    tag = "rooms",
    responses(
        (status = 200, description = "The video was removed")
    )
)]
async fn remove_from_queue(
    acting: ActingUser,
    State(context): State<ServerContext>,
    Path((room_id, video_id)): Path<(String, String)>,
) -> ServerResult<()> {
    context
        .collab
        .rooms
        .remove_video(&room_id, &acting.0, &video_id)
        .await?;

    Ok(())
}

#[utoipa::path(
    put,
    path = "/v1/rooms/{id}/queue",
    tag = "rooms",
    request_body = ReorderQueueSchema,
    responses(
        (status = 200, description = "The queue was replaced with the supplied order")
    )
)]
async fn reorder_queue(
    acting: ActingUser,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
    Json(body): Json<ReorderQueueSchema>,
) -> ServerResult<()> {
    context
        .collab
        .rooms
        .reorder_queue(&room_id, &acting.0, body.queue)
        .await?;

    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/actions",
    tag = "rooms",
    request_body = RoomActionSchema,
    responses(
        (status = 200, description = "Action was performed")
    )
)]
async fn perform_room_action(
    acting: ActingUser,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
    Json(body): Json<RoomActionSchema>,
) -> ServerResult<()> {
    let rooms = &context.collab.rooms;

    match body {
        RoomActionSchema::Play => rooms.play(&room_id, &acting.0).await?,
        RoomActionSchema::Pause => rooms.pause(&room_id, &acting.0).await?,
        RoomActionSchema::Seek { to } => rooms.seek(&room_id, &acting.0, to).await?,
        RoomActionSchema::Skip => rooms.skip(&room_id, &acting.0).await?,
        RoomActionSchema::SkipCurrent => rooms.skip_current(&room_id, &acting.0).await?,
        RoomActionSchema::PlayFromQueue { video_id } => {
            rooms.play_from_queue(&room_id, &acting.0, &video_id).await?
        }
    };

    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}/messages",
    tag = "messages",
    responses(
        (status = 200, body = Vec<Message>)
    )
)]
async fn messages(
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
) -> ServerResult<Json<Vec<Message>>> {
    let messages = context.collab.rooms.messages(&room_id).await?;

    Ok(Json(messages.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/messages",
    tag = "messages",
    request_body = NewMessageSchema,
    responses(
        (status = 200, body = Message)
    )
)]
async fn send_message(
    acting: ActingUser,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
    ValidatedJson(body): ValidatedJson<NewMessageSchema>,
) -> ServerResult<Json<Message>> {
    let message = context
        .collab
        .rooms
        .send_message(&room_id, &acting.0, &body.text)
        .await?;

    Ok(Json(message.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_rooms))
        .route("/", post(create_room))
        .route("/:id", get(room))
        .route("/:id/members", post(join_room))
        .route("/:id/members/:user_id", delete(remove_member))
        .route("/:id/host", post(transfer_host))
        .route("/:id/settings", put(update_settings))
        .route("/:id/queue", get(queue))
        .route("/:id/queue", post(add_to_queue))
        .route("/:id/queue", put(reorder_queue))
        .route("/:id/queue/:video_id", delete(remove_from_queue))
        .route("/:id/actions", post(perform_room_action))
        .route("/:id/messages", get(messages))
        .route("/:id/messages", post(send_message))
}
