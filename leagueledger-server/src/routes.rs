//! leagueledger-server/src/routes.rs
//!
//! JSON transport over `LeagueApi`. The acting user arrives in the
//! `x-user-id` header, set by whatever authenticates requests upstream.

use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use leagueledger_core::models::{
    MemberOverview, RankWindow, RedemptionFact, RedemptionResult, TeamStanding, TeamSummary,
    Token, TokenPreview, TokenSet, TokenSetDetail, TokenSpec,
};
use leagueledger_core::traits::api::{RedemptionApi, StandingsApi, TokenSetApi};
use leagueledger_core::traits::directory_traits::IdentityProvider;
use leagueledger_core::{Error, RedemptionError};

use crate::context::ServerContext;

pub const USER_HEADER: &str = "x-user-id";
const DEFAULT_RECENT_LIMIT: i64 = 20;

pub fn router(ctx: ServerContext) -> Router {
    Router::new()
        .route("/redeem", post(redeem))
        .route("/leaderboard", get(leaderboard))
        .route("/leaderboard/podium", get(podium))
        .route("/teams/{team_id}/summary", get(team_summary))
        .route("/teams/{team_id}/rank", get(team_rank))
        .route("/me/overview", get(member_overview))
        .route("/me/redemptions", get(recent_redemptions))
        .route("/tokens", post(issue_token))
        .route("/tokens/{code}", get(preview_token))
        .route("/sets", post(create_set).get(list_sets))
        .route("/sets/{set_id}", get(get_set))
        .route("/sets/{set_id}/tokens", post(add_tokens))
        .route("/sets/{set_id}/event", post(link_event))
        .with_state(ctx)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Acting user from the request header. Absent or malformed means nobody.
#[derive(Debug, Clone, Copy)]
pub struct RequestIdentity(Option<Uuid>);

impl<S: Send + Sync> FromRequestParts<S> for RequestIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok());
        Ok(RequestIdentity(user))
    }
}

impl IdentityProvider for RequestIdentity {
    fn current_user(&self) -> Result<Uuid, Error> {
        self.0
            .ok_or_else(|| Error::Unauthenticated(format!("missing or invalid {USER_HEADER} header")))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    retryable: bool,
}

#[derive(Debug)]
pub enum ApiError {
    Redemption(RedemptionError),
    Ledger(Error),
}

impl From<RedemptionError> for ApiError {
    fn from(e: RedemptionError) -> Self {
        ApiError::Redemption(e)
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Ledger(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, retryable) = match &self {
            ApiError::Redemption(e) => {
                let status = match e {
                    RedemptionError::InvalidCode | RedemptionError::TeamNotFound => StatusCode::NOT_FOUND,
                    RedemptionError::NotTeamMember => StatusCode::FORBIDDEN,
                    RedemptionError::Unauthenticated => StatusCode::UNAUTHORIZED,
                    RedemptionError::AlreadyExhausted => StatusCode::CONFLICT,
                    RedemptionError::Expired => StatusCode::GONE,
                    RedemptionError::Contention | RedemptionError::StoreUnavailable(_) => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                };
                if let RedemptionError::StoreUnavailable(cause) = e {
                    error!("Redemption store failure: {}", cause);
                }
                (status, e.user_message().to_string(), e.is_retryable())
            }
            ApiError::Ledger(e) => match e {
                Error::NotFound(_) => (StatusCode::NOT_FOUND, "not found".to_string(), false),
                Error::Validation(msg) | Error::Parse(msg) => (StatusCode::BAD_REQUEST, msg.clone(), false),
                Error::Unauthenticated(_) => {
                    (StatusCode::UNAUTHORIZED, "sign in required".to_string(), false)
                }
                other => {
                    error!("Request failed: {}", other);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "service temporarily unavailable".to_string(),
                        true,
                    )
                }
            },
        };
        (status, Json(ErrorBody { error: message, retryable })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn parse_window(raw: Option<&str>) -> Result<RankWindow, ApiError> {
    Ok(raw.unwrap_or("all").parse::<RankWindow>()?)
}

#[derive(Debug, Deserialize)]
pub struct RedeemBody {
    pub code: String,
    pub team_id: Uuid,
}

async fn redeem(
    State(ctx): State<ServerContext>,
    identity: RequestIdentity,
    Json(body): Json<RedeemBody>,
) -> ApiResult<RedemptionResult> {
    let result = ctx.api.redeem(&identity, &body.code, body.team_id).await?;
    Ok(Json(result))
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub window: Option<String>,
    #[serde(default)]
    pub include_all: bool,
}

async fn leaderboard(
    State(ctx): State<ServerContext>,
    Query(q): Query<LeaderboardQuery>,
) -> ApiResult<Vec<TeamStanding>> {
    let window = parse_window(q.window.as_deref())?;
    Ok(Json(ctx.api.rank(window, q.include_all).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub window: Option<String>,
}

async fn podium(
    State(ctx): State<ServerContext>,
    Query(q): Query<WindowQuery>,
) -> ApiResult<Vec<TeamStanding>> {
    let window = parse_window(q.window.as_deref())?;
    Ok(Json(ctx.api.podium(window).await?))
}

async fn team_summary(
    State(ctx): State<ServerContext>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<TeamSummary> {
    Ok(Json(ctx.api.team_summary(team_id).await?))
}

async fn team_rank(
    State(ctx): State<ServerContext>,
    Path(team_id): Path<Uuid>,
    Query(q): Query<WindowQuery>,
) -> ApiResult<TeamStanding> {
    let window = parse_window(q.window.as_deref())?;
    Ok(Json(ctx.api.team_rank(team_id, window).await?))
}

async fn member_overview(
    State(ctx): State<ServerContext>,
    identity: RequestIdentity,
) -> ApiResult<MemberOverview> {
    Ok(Json(ctx.api.member_overview(&identity).await?))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

async fn recent_redemptions(
    State(ctx): State<ServerContext>,
    identity: RequestIdentity,
    Query(q): Query<RecentQuery>,
) -> ApiResult<Vec<RedemptionFact>> {
    let limit = q.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Ok(Json(ctx.api.recent_redemptions(&identity, limit).await?))
}

async fn issue_token(
    State(ctx): State<ServerContext>,
    Json(spec): Json<TokenSpec>,
) -> Result<(StatusCode, Json<Token>), ApiError> {
    let token = ctx.api.issue_token(spec).await?;
    Ok((StatusCode::CREATED, Json(token)))
}

async fn preview_token(
    State(ctx): State<ServerContext>,
    Path(code): Path<String>,
) -> ApiResult<TokenPreview> {
    Ok(Json(ctx.api.preview_token(&code).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateSetBody {
    pub name: String,
    pub description: Option<String>,
}

async fn create_set(
    State(ctx): State<ServerContext>,
    Json(body): Json<CreateSetBody>,
) -> Result<(StatusCode, Json<TokenSet>), ApiError> {
    let set = ctx.api.create_set(&body.name, body.description.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(set)))
}

async fn list_sets(State(ctx): State<ServerContext>) -> ApiResult<Vec<TokenSet>> {
    Ok(Json(ctx.api.list_sets().await?))
}

async fn get_set(
    State(ctx): State<ServerContext>,
    Path(set_id): Path<Uuid>,
) -> ApiResult<TokenSetDetail> {
    Ok(Json(ctx.api.get_set(set_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddTokensBody {
    #[serde(default)]
    pub spec: TokenSpec,
    pub quantity: Option<u32>,
}

async fn add_tokens(
    State(ctx): State<ServerContext>,
    Path(set_id): Path<Uuid>,
    Json(body): Json<AddTokensBody>,
) -> Result<(StatusCode, Json<Vec<Token>>), ApiError> {
    let quantity = body.quantity.unwrap_or(1);
    let tokens = ctx.api.add_tokens_to_set(set_id, body.spec, quantity).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

#[derive(Debug, Deserialize)]
pub struct LinkEventBody {
    pub event_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LinkEventResponse {
    pub updated: u64,
}

async fn link_event(
    State(ctx): State<ServerContext>,
    Path(set_id): Path<Uuid>,
    Json(body): Json<LinkEventBody>,
) -> ApiResult<LinkEventResponse> {
    let updated = ctx.api.link_set_to_event(set_id, body.event_id).await?;
    Ok(Json(LinkEventResponse { updated }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use leagueledger_core::repositories::MemoryTeamDirectory;
    use leagueledger_core::services::RedemptionPolicy;
    use leagueledger_core::test_utils::helpers::memory_ledger;

    use super::*;

    fn app() -> (Router, Arc<MemoryTeamDirectory>) {
        let (ledger, _store, directory) = memory_ledger(RedemptionPolicy::default());
        (router(ServerContext::new(Arc::new(ledger))), directory)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.expect("router is infallible");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json") };
        (status, value)
    }

    fn post_json(uri: &str, user: Option<Uuid>, body: Value) -> Request<Body> {
        let mut builder = Request::post(uri).header("content-type", "application/json");
        if let Some(u) = user {
            builder = builder.header(USER_HEADER, u.to_string());
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    #[tokio::test]
    async fn redeem_then_replay_maps_to_conflict() {
        let (app, directory) = app();
        let team = Uuid::new_v4();
        let user = Uuid::new_v4();
        directory.add_member(team, user);

        let (status, token) = send(&app, post_json("/tokens", None, json!({ "points": "12.50" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let code = token["code"].as_str().expect("code").to_string();

        let body = json!({ "code": code, "team_id": team });
        let (status, result) = send(&app, post_json("/redeem", Some(user), body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["points_awarded"], json!("12.5"));

        let (status, err) = send(&app, post_json("/redeem", Some(user), body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err, json!({ "error": "already redeemed", "retryable": false }));
    }

    #[tokio::test]
    async fn redeem_without_identity_is_unauthorized() {
        let (app, _) = app();
        let body = json!({ "code": "whatever", "team_id": Uuid::new_v4() });
        let (status, err) = send(&app, post_json("/redeem", None, body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err["retryable"], json!(false));
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let (app, directory) = app();
        let team = Uuid::new_v4();
        let user = Uuid::new_v4();
        directory.add_member(team, user);

        let body = json!({ "code": "no-such-code", "team_id": team });
        let (status, err) = send(&app, post_json("/redeem", Some(user), body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["error"], json!("invalid code"));
    }

    #[tokio::test]
    async fn bad_window_is_bad_request() {
        let (app, _) = app();
        let req = Request::get("/leaderboard?window=fortnight").body(Body::empty()).expect("request");
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let req = Request::get("/leaderboard?window=week&include_all=true").body(Body::empty()).expect("request");
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn oversized_window_is_bad_request() {
        let (app, _) = app();
        for uri in [
            "/leaderboard?window=days:4000000000",
            "/leaderboard/podium?window=days:36501",
        ] {
            let req = Request::get(uri).body(Body::empty()).expect("request");
            let (status, body) = send(&app, req).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["retryable"], json!(false));
        }

        let req = Request::get(format!("/teams/{}/rank?window=days:4000000000", Uuid::new_v4()))
            .body(Body::empty())
            .expect("request");
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_points_and_batches_are_bad_requests() {
        let (app, _) = app();
        let huge = json!({ "points": "10000000000" });
        let (status, body) = send(&app, post_json("/tokens", None, huge)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["retryable"], json!(false));

        let (_, set) = send(&app, post_json("/sets", None, json!({ "name": "Big Night" }))).await;
        let set_id = set["set_id"].as_str().expect("set id").to_string();
        let batch = json!({ "spec": { "points": "1" }, "quantity": 4294967295u32 });
        let (status, _) = send(&app, post_json(&format!("/sets/{set_id}/tokens"), None, batch)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let req = Request::get(format!("/sets/{set_id}")).body(Body::empty()).expect("request");
        let (_, detail) = send(&app, req).await;
        assert_eq!(detail["tokens"], json!([]));
    }

    #[tokio::test]
    async fn preview_shows_reward_without_consuming() {
        let (app, directory) = app();
        let team = Uuid::new_v4();
        let user = Uuid::new_v4();
        directory.add_member(team, user);

        let spec = json!({ "points": "5", "title": "Music round", "max_uses": 2 });
        let (_, token) = send(&app, post_json("/tokens", None, spec)).await;
        let code = token["code"].as_str().expect("code").to_string();

        let req = Request::get(format!("/tokens/{code}")).body(Body::empty()).expect("request");
        let (status, preview) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(preview["title"], json!("Music round"));
        assert_eq!(preview["remaining_uses"], json!(2));
        assert_eq!(preview["state"], json!("unconsumed"));
        assert!(preview.get("code").is_none());
        assert!(preview.get("token_id").is_none());

        let body = json!({ "code": code, "team_id": team });
        let (status, _) = send(&app, post_json("/redeem", Some(user), body)).await;
        assert_eq!(status, StatusCode::OK);

        let req = Request::get(format!("/tokens/{code}")).body(Body::empty()).expect("request");
        let (_, preview) = send(&app, req).await;
        assert_eq!(preview["remaining_uses"], json!(1));

        let req = Request::get("/tokens/not-a-code").body(Body::empty()).expect("request");
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn set_batch_and_event_link() {
        let (app, _) = app();
        let (status, set) = send(&app, post_json("/sets", None, json!({ "name": "Quiz Night" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let set_id = set["set_id"].as_str().expect("set id").to_string();

        let batch = json!({ "spec": { "points": "3", "title": "Round 1" }, "quantity": 4 });
        let (status, tokens) = send(&app, post_json(&format!("/sets/{set_id}/tokens"), None, batch)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(tokens.as_array().map(Vec::len), Some(4));

        let link = json!({ "event_id": Uuid::new_v4() });
        let (status, linked) = send(&app, post_json(&format!("/sets/{set_id}/event"), None, link)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(linked["updated"], json!(4));

        let req = Request::get(format!("/sets/{set_id}")).body(Body::empty()).expect("request");
        let (status, detail) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["tokens"].as_array().map(Vec::len), Some(4));
    }
}
