// ============================
// crates/backend-lib/src/handlers/meetings.rs
// ============================
//! REST handlers for meetings. Each one resolves the viewer and delegates to
//! [`MeetingService`](crate::service::MeetingService).
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use campus_common::{
    Ack, AddParticipantsRequest, AddRecordingRequest, MeetingStats, MeetingView, PublicListQuery,
    RecordingState, RescheduleRequest, ScheduleRequest, UpdateDetailsRequest,
};

use crate::{
    auth::Viewer,
    error::AppError,
    handlers::extract::{ApiJson, ApiPath, ApiQuery},
    AppState,
};

type Shared = State<Arc<AppState>>;

pub async fn list_public(
    State(state): Shared,
    viewer: Viewer,
    ApiQuery(filter): ApiQuery<PublicListQuery>,
) -> Result<Json<Vec<MeetingView>>, AppError> {
    let meetings = state
        .service
        .list_public_meetings(viewer.id(), &filter)
        .await?;
    Ok(Json(meetings))
}

pub async fn list_mine(
    State(state): Shared,
    viewer: Viewer,
) -> Result<Json<Vec<MeetingView>>, AppError> {
    Ok(Json(state.service.list_my_meetings(viewer.id()).await?))
}

pub async fn get_meeting(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
) -> Result<Json<MeetingView>, AppError> {
    Ok(Json(state.service.get_meeting(&meeting_id, viewer.id()).await?))
}

pub async fn schedule(
    State(state): Shared,
    viewer: Viewer,
    ApiJson(req): ApiJson<ScheduleRequest>,
) -> Result<(StatusCode, Json<MeetingView>), AppError> {
    let view = state.service.schedule_meeting(viewer.id(), req).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn reschedule(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
    ApiJson(req): ApiJson<RescheduleRequest>,
) -> Result<Json<MeetingView>, AppError> {
    let view = state
        .service
        .reschedule_meeting(&meeting_id, viewer.id(), req)
        .await?;
    Ok(Json(view))
}

pub async fn update_details(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
    ApiJson(req): ApiJson<UpdateDetailsRequest>,
) -> Result<Json<MeetingView>, AppError> {
    let view = state
        .service
        .update_meeting_details(&meeting_id, viewer.id(), req)
        .await?;
    Ok(Json(view))
}

pub async fn start(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
) -> Result<Json<MeetingView>, AppError> {
    Ok(Json(state.service.start_meeting(&meeting_id, viewer.id()).await?))
}

pub async fn end(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
) -> Result<Json<MeetingView>, AppError> {
    Ok(Json(state.service.end_meeting(&meeting_id, viewer.id()).await?))
}

pub async fn cancel(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
) -> Result<Json<MeetingView>, AppError> {
    Ok(Json(state.service.cancel_meeting(&meeting_id, viewer.id()).await?))
}

pub async fn delete_meeting(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
) -> Result<Json<Ack>, AppError> {
    Ok(Json(state.service.delete_meeting(&meeting_id, viewer.id()).await?))
}

pub async fn join(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
) -> Result<Json<Ack>, AppError> {
    Ok(Json(
        state
            .service
            .join_participation(&meeting_id, viewer.id())
            .await?,
    ))
}

pub async fn leave(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
) -> Result<Json<Ack>, AppError> {
    Ok(Json(
        state
            .service
            .leave_participation(&meeting_id, viewer.id())
            .await?,
    ))
}

pub async fn remove_participant(
    State(state): Shared,
    viewer: Viewer,
    ApiPath((meeting_id, participant_id)): ApiPath<(String, String)>,
) -> Result<Json<Ack>, AppError> {
    Ok(Json(
        state
            .service
            .remove_participant(&meeting_id, viewer.id(), &participant_id)
            .await?,
    ))
}

pub async fn stats(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
) -> Result<Json<MeetingStats>, AppError> {
    Ok(Json(state.service.meeting_stats(&meeting_id, viewer.id()).await?))
}

pub async fn add_participants(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
    ApiJson(req): ApiJson<AddParticipantsRequest>,
) -> Result<Json<MeetingView>, AppError> {
    let view = state
        .service
        .add_participants(&meeting_id, viewer.id(), req)
        .await?;
    Ok(Json(view))
}

pub async fn start_recording(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
) -> Result<Json<RecordingState>, AppError> {
    Ok(Json(state.service.start_recording(&meeting_id, viewer.id()).await?))
}

pub async fn stop_recording(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
) -> Result<Json<RecordingState>, AppError> {
    Ok(Json(state.service.stop_recording(&meeting_id, viewer.id()).await?))
}

pub async fn add_recording(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
    ApiJson(req): ApiJson<AddRecordingRequest>,
) -> Result<(StatusCode, Json<RecordingState>), AppError> {
    let recording = state
        .service
        .add_recording(&meeting_id, viewer.id(), req)
        .await?;
    Ok((StatusCode::CREATED, Json(recording)))
}

pub async fn list_recordings(
    State(state): Shared,
    viewer: Viewer,
    ApiPath(meeting_id): ApiPath<String>,
) -> Result<Json<RecordingState>, AppError> {
    Ok(Json(state.service.list_recordings(&meeting_id, viewer.id()).await?))
}
