//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the checklist endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::auth::{LoginRequest, NoticeResponse, SignupRequest};
use crate::web::events::EventView;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use scripture_core::{
    links::study_url,
    progress::{division_progress, overall_progress},
    CanonIndex, Division, Progress, Session,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scripture Checklist API",
        description = "Mark verses read, track progress per division, and sync it across devices."
    ),
    paths(
        canon_handler,
        stats_handler,
        toggle_handler,
        link_handler,
        restart_handler,
        session_handler,
        crate::web::events::events_handler,
        crate::web::auth::signup_handler,
        crate::web::auth::signin_handler,
        crate::web::auth::signout_handler,
    ),
    components(
        schemas(
            DivisionView, RecordView, ProgressView, StatsResponse, DivisionProgressView,
            ToggleResponse, LinkResponse, SessionResponse, NoticeResponse, SignupRequest,
            LoginRequest, EventView
        )
    ),
    tags(
        (name = "Scripture Checklist API", description = "Read-state tracking for the scripture reading checklist.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct ProgressView {
    read: usize,
    total: usize,
    percent: u8,
}

impl From<Progress> for ProgressView {
    fn from(progress: Progress) -> Self {
        Self {
            read: progress.read,
            total: progress.total,
            percent: progress.percent,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct RecordView {
    id: String,
    reference: String,
    book: String,
    chapter: u32,
    verse: String,
    text: String,
    read: bool,
}

/// One division with its verses, as rendered by the checklist.
#[derive(Serialize, ToSchema, Debug)]
pub struct DivisionView {
    name: String,
    progress: ProgressView,
    records: Vec<RecordView>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct DivisionProgressView {
    name: String,
    progress: ProgressView,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct StatsResponse {
    overall: ProgressView,
    divisions: Vec<DivisionProgressView>,
    /// Consecutive days with at least one verse marked read.
    streak: u32,
}

#[derive(Serialize, ToSchema)]
pub struct ToggleResponse {
    id: String,
    read: bool,
}

#[derive(Serialize, ToSchema)]
pub struct LinkResponse {
    id: String,
    url: String,
}

#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct SessionResponse {
    pub signed_in: bool,
    pub uid: Option<String>,
    pub email: Option<String>,
    /// Display name, or the email's local part.
    pub label: Option<String>,
    /// Avatar initial.
    pub initial: Option<String>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        match session.identity() {
            Some(identity) => Self {
                signed_in: true,
                uid: Some(identity.uid.clone()),
                email: identity.email.clone(),
                label: Some(identity.display_label()),
                initial: Some(identity.initial().to_string()),
            },
            None => Self {
                signed_in: false,
                uid: None,
                email: None,
                label: None,
                initial: None,
            },
        }
    }
}

//=========================================================================================
// View Builders
//=========================================================================================

/// Non-empty divisions in display order, each verse flagged with its read status.
fn canon_view(canon: &CanonIndex, read_ids: &BTreeSet<String>) -> Vec<DivisionView> {
    canon
        .iter()
        .filter(|(_, records)| !records.is_empty())
        .map(|(division, records)| DivisionView {
            name: division.name().to_string(),
            progress: division_progress(canon, read_ids, division).into(),
            records: records
                .iter()
                .map(|r| RecordView {
                    id: r.id.clone(),
                    reference: r.reference.clone(),
                    book: r.book.clone(),
                    chapter: r.chapter,
                    verse: r.verse.clone(),
                    text: r.text.clone(),
                    read: read_ids.contains(&r.id),
                })
                .collect(),
        })
        .collect()
}

fn stats_view(canon: &CanonIndex, read_ids: &BTreeSet<String>, streak: u32) -> StatsResponse {
    StatsResponse {
        overall: overall_progress(canon, read_ids).into(),
        divisions: Division::ALL
            .into_iter()
            .map(|division| DivisionProgressView {
                name: division.name().to_string(),
                progress: division_progress(canon, read_ids, division).into(),
            })
            .collect(),
        streak,
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// The full checklist: every division with its verses and read flags.
#[utoipa::path(
    get,
    path = "/canon",
    responses((status = 200, description = "Divisions with verses", body = [DivisionView]))
)]
pub async fn canon_handler(State(state): State<Arc<AppState>>) -> Json<Vec<DivisionView>> {
    Json(canon_view(&state.canon, &state.store.read_ids()))
}

/// Overall and per-division progress plus the reading streak.
#[utoipa::path(
    get,
    path = "/stats",
    responses((status = 200, description = "Progress statistics", body = StatsResponse))
)]
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(stats_view(
        &state.canon,
        &state.store.read_ids(),
        state.store.streak(),
    ))
}

/// Marks a verse read, or unread if it already was.
#[utoipa::path(
    post,
    path = "/scriptures/{id}/toggle",
    params(("id" = String, Path, description = "Verse id, e.g. `scripture-0`.")),
    responses(
        (status = 200, description = "New read status", body = ToggleResponse),
        (status = 404, description = "Unknown verse id")
    )
)]
pub async fn toggle_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, (StatusCode, String)> {
    if !state.canon.contains(&id) {
        warn!(%id, "Toggle requested for unknown scripture");
        return Err((StatusCode::NOT_FOUND, format!("Unknown scripture {id}")));
    }
    let read = state.store.toggle(&id).await;
    Ok(Json(ToggleResponse { id, read }))
}

/// The verse's page on the Church's online scripture library.
#[utoipa::path(
    get,
    path = "/scriptures/{id}/link",
    params(("id" = String, Path, description = "Verse id, e.g. `scripture-0`.")),
    responses(
        (status = 200, description = "Study-site URL", body = LinkResponse),
        (status = 404, description = "Unknown verse id")
    )
)]
pub async fn link_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LinkResponse>, (StatusCode, String)> {
    let (division, record) = state
        .canon
        .find_by_id(&id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown scripture {id}")))?;
    let url = study_url(record, division);
    Ok(Json(LinkResponse { id, url }))
}

/// Clears all progress for the current user. Confirmation is the caller's job.
#[utoipa::path(
    post,
    path = "/restart",
    responses((status = 200, description = "Progress cleared", body = NoticeResponse))
)]
pub async fn restart_handler(State(state): State<Arc<AppState>>) -> Json<NoticeResponse> {
    state.store.restart().await;
    Json(NoticeResponse::new(
        "Your progress has been reset. Time for a fresh start!",
    ))
}

/// Who is signed in, if anyone.
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "Current session", body = SessionResponse))
)]
pub async fn session_handler(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    Json(SessionResponse::from(&state.sessions.session()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{body_json, get, post, test_app};
    use scripture_core::{Identity, RawRecord};
    use tower::ServiceExt;

    fn canon() -> CanonIndex {
        CanonIndex::build(&[
            RawRecord::new("Gen 1:1", "In the beginning..."),
            RawRecord::new("D&C 1:1", "Hearken..."),
            RawRecord::new("D&C 4:2", "Therefore, O ye"),
        ])
    }

    fn read(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn canon_view_skips_empty_divisions_and_flags_reads() {
        let view = canon_view(&canon(), &read(&["scripture-2"]));
        let names: Vec<_> = view.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Old Testament", "Doctrine and Covenants"]);

        let dc = &view[1];
        assert_eq!(dc.progress, ProgressView { read: 1, total: 2, percent: 50 });
        assert!(!dc.records[0].read);
        assert!(dc.records[1].read);
    }

    #[test]
    fn stats_view_covers_every_division() {
        let stats = stats_view(&canon(), &read(&["scripture-0", "scripture-2"]), 3);
        assert_eq!(stats.overall, ProgressView { read: 2, total: 3, percent: 67 });
        assert_eq!(stats.divisions.len(), 5);
        assert_eq!(stats.divisions[2].progress.total, 0);
        assert_eq!(stats.streak, 3);
    }

    #[test]
    fn session_response_describes_identity() {
        let session = Session::Authenticated(Identity {
            uid: "u1".to_string(),
            email: Some("mary@example.com".to_string()),
            display_name: None,
        });
        let response = SessionResponse::from(&session);
        assert!(response.signed_in);
        assert_eq!(response.label.as_deref(), Some("mary"));
        assert_eq!(response.initial.as_deref(), Some("M"));
        assert!(!SessionResponse::from(&Session::Anonymous).signed_in);
    }

    #[tokio::test]
    async fn toggle_flips_a_known_verse() {
        let app = test_app();

        let response = app
            .router
            .clone()
            .oneshot(post("/scriptures/scripture-1/toggle", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], "scripture-1");
        assert_eq!(body["read"], true);
        assert!(app.state.store.is_read("scripture-1"));

        let response = app
            .router
            .oneshot(post("/scriptures/scripture-1/toggle", ""))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["read"], false);
        assert!(app.state.store.read_ids().is_empty());
    }

    #[tokio::test]
    async fn toggle_rejects_unknown_verses() {
        let app = test_app();
        let response = app
            .router
            .oneshot(post("/scriptures/scripture-42/toggle", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(app.state.store.read_ids().is_empty());
    }

    #[tokio::test]
    async fn link_resolves_known_verses_only() {
        let app = test_app();

        let response = app
            .router
            .clone()
            .oneshot(get("/scriptures/scripture-2/link"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["url"],
            "https://www.churchofjesuschrist.org/study/scriptures/bofm/mosiah/2?lang=eng&id=p17#p17"
        );

        let response = app
            .router
            .oneshot(get("/scriptures/nope/link"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn restart_clears_progress() {
        let app = test_app();
        app.state.store.toggle("scripture-0").await;

        let response = app
            .router
            .clone()
            .oneshot(post("/restart", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["message"],
            "Your progress has been reset. Time for a fresh start!"
        );
        assert!(app.state.store.read_ids().is_empty());

        let stats = body_json(app.router.oneshot(get("/stats")).await.unwrap()).await;
        assert_eq!(stats["overall"]["read"], 0);
        assert_eq!(stats["overall"]["total"], 3);
        assert_eq!(stats["streak"], 0);
    }

    #[tokio::test]
    async fn canon_and_session_reflect_current_state() {
        let app = test_app();
        app.state.store.toggle("scripture-0").await;

        let canon = body_json(app.router.clone().oneshot(get("/canon")).await.unwrap()).await;
        let divisions = canon.as_array().unwrap();
        assert_eq!(divisions.len(), 3);
        assert_eq!(divisions[0]["name"], "Old Testament");
        assert_eq!(divisions[0]["records"][0]["read"], true);
        assert_eq!(divisions[0]["progress"]["percent"], 100);

        let session = body_json(app.router.oneshot(get("/session")).await.unwrap()).await;
        assert_eq!(session["signed_in"], false);
    }
}
