//! API service routes

use auth::{Identity, TOKEN_COOKIE, models::LoginCredentials, models::NewUser, models::User};
use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{delete, get, post},
};
use axum_extra::extract::{
    WithRejection,
    cookie::{Cookie, CookieJar, SameSite},
};
use common::ApiResponse;
use media::FileField;
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    catalog::validate_title,
    config::ServerConfig,
    error::{ApiError, ApiResult},
    models::{FeedPage, FeedQuery, SearchQuery, Video, VideoWithOwner},
};

const AVATAR: &str = "avatar";
const COVER_IMAGE: &str = "coverImage";
const VIDEO_FILE: &str = "videoFile";
const THUMBNAIL: &str = "thumbnail";

const REGISTER_FIELDS: &[FileField] = &[
    FileField::required(AVATAR),
    FileField::optional(COVER_IMAGE),
];
const VIDEO_FIELDS: &[FileField] = &[
    FileField::required(VIDEO_FILE),
    FileField::required(THUMBNAIL),
];

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/:id", get(get_user_profile))
        .route("/videos", get(list_feed))
        .route("/videos/search", get(search_videos));

    let optional_routes = Router::new()
        .route("/videos/:video_id", get(get_video))
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth::optional_auth,
        ));

    let protected_routes = Router::new()
        .route("/users/logout", post(logout))
        .route("/videos", post(upload_video))
        .route("/videos/user-videos", get(list_my_videos))
        .route("/videos/:video_id", delete(delete_video))
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth::require_auth,
        ));

    let api_routes = public_routes.merge(optional_routes).merge(protected_routes);

    // Two files per request at most; each is also capped while staging
    let body_limit = usize::try_from(state.staging.config().max_file_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(1024 * 1024);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origins()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

fn parse_id(raw: &str, what: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::Validation(format!("Invalid {} id", what)))
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub videos: Vec<Video>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub videos: Vec<VideoWithOwner>,
}

/// Health check endpoint
pub async fn health_check() -> ApiResponse<Value> {
    ApiResponse::ok(json!({ "status": "ok", "service": "api" }), "Service is healthy")
}

/// Unknown paths get the same envelope as every other error
pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Register a user with an avatar and an optional cover image
pub async fn register(
    State(state): State<AppState>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<ApiResponse<User>> {
    let mut upload = state.staging.stage(multipart, REGISTER_FIELDS).await?;

    let text = |name: &str| upload.text(name).unwrap_or_default().to_string();
    let draft = NewUser {
        username: text("username"),
        email: text("email"),
        full_name: text("fullName"),
        avatar: String::new(),
        cover_image: None,
    }
    .normalized();
    let password = text("password");

    auth::validation::validate_registration(
        &draft.full_name,
        &draft.username,
        &draft.email,
        &password,
    )
    .map_err(ApiError::Validation)?;

    if state
        .credentials
        .is_taken(&draft.username, &draft.email)
        .await?
    {
        return Err(auth::CredentialError::Duplicate.into());
    }

    let avatar_file = upload
        .take_file(AVATAR)
        .ok_or_else(|| ApiError::Validation("Avatar file is required".to_string()))?;
    let avatar = state.publisher.publish(avatar_file).await.into_result()?;

    let cover_image = match upload.take_file(COVER_IMAGE) {
        Some(file) => match state.publisher.publish(file).await.into_result() {
            Ok(media) => Some(media.url),
            Err(failure) => {
                warn!("Registering without cover image: {}", failure);
                None
            }
        },
        None => None,
    };

    let new_user = NewUser {
        avatar: avatar.url.clone(),
        cover_image: cover_image.clone(),
        ..draft
    };

    let user = state
        .credentials
        .create(new_user, &password)
        .await
        .map_err(|e| {
            warn!(
                "Registration failed after publishing, orphaned objects: {} {}",
                avatar.url,
                cover_image.as_deref().unwrap_or_default()
            );
            e
        })?;

    Ok(ApiResponse::created(user, "User registered successfully"))
}

/// Verify credentials and hand out a session token
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(credentials), _): WithRejection<Json<LoginCredentials>, ApiError>,
) -> ApiResult<(CookieJar, ApiResponse<LoginResponse>)> {
    if credentials.identifier.trim().is_empty() {
        return Err(ApiError::Validation(
            "Username or email is required".to_string(),
        ));
    }
    if credentials.password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }

    let user = state
        .credentials
        .authenticate(&credentials.identifier, &credentials.password)
        .await?
        .ok_or_else(|| ApiError::Authentication("Invalid credentials".to_string()))?;

    let token = state.jwt.issue(&user.identity())?;

    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure);

    info!("User {} logged in", user.id);

    Ok((
        jar.add(cookie),
        ApiResponse::ok(LoginResponse { user, token }, "User logged in successfully"),
    ))
}

/// Clear the session cookie; the token itself stays valid until it expires
pub async fn logout(
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> (CookieJar, ApiResponse<Value>) {
    info!("User {} logged out", identity.id);

    // Sent even when the token came from the Authorization header
    let mut removal = Cookie::build((TOKEN_COOKIE, "")).path("/").build();
    removal.make_removal();

    (
        jar.add(removal),
        ApiResponse::ok(json!({}), "User logged out successfully"),
    )
}

/// Public profile with the user's published videos
pub async fn get_user_profile(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<ApiResponse<ProfileResponse>> {
    let id = parse_id(&id, "user")?;

    let user = state
        .credentials
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let videos = state.catalog.list_published_by_owner(id).await?;

    Ok(ApiResponse::ok(
        ProfileResponse { user, videos },
        "User profile fetched successfully",
    ))
}

/// Public feed
pub async fn list_feed(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<FeedQuery>, ApiError>,
) -> ApiResult<ApiResponse<FeedPage>> {
    let page = state.catalog.list_feed(query.page(), query.limit()).await?;

    Ok(ApiResponse::ok(page, "Videos fetched successfully"))
}

/// Search published videos by title or owner name
pub async fn search_videos(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SearchQuery>, ApiError>,
) -> ApiResult<ApiResponse<SearchResponse>> {
    let videos = state
        .catalog
        .search(query.query.as_deref().unwrap_or_default())
        .await?;

    Ok(ApiResponse::ok(
        SearchResponse { videos },
        "Search results fetched successfully",
    ))
}

/// Stage, publish and record a new video owned by the caller
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<ApiResponse<Video>> {
    let mut upload = state.staging.stage(multipart, VIDEO_FIELDS).await?;

    // Reject before anything leaves the scratch directory
    let title = validate_title(upload.text("title").unwrap_or_default())?;

    let video_file = upload
        .take_file(VIDEO_FILE)
        .ok_or_else(|| ApiError::Validation("Video file is required".to_string()))?;
    let thumbnail_file = upload
        .take_file(THUMBNAIL)
        .ok_or_else(|| ApiError::Validation("Thumbnail is required".to_string()))?;

    let video = state.publisher.publish(video_file).await.into_result()?;

    let thumbnail = match state.publisher.publish(thumbnail_file).await.into_result() {
        Ok(thumbnail) => thumbnail,
        Err(failure) => {
            warn!("Thumbnail upload failed, orphaned object: {}", video.url);
            return Err(failure.into());
        }
    };

    let created = state
        .catalog
        .create_video(
            identity.id,
            &title,
            video.url.clone(),
            thumbnail.url.clone(),
            video.duration,
        )
        .await
        .map_err(|e| {
            warn!(
                "Video record not created, orphaned objects: {} {}",
                video.url, thumbnail.url
            );
            e
        })?;

    Ok(ApiResponse::created(created, "Video uploaded successfully"))
}

/// Every video of the caller, published or not
pub async fn list_my_videos(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<ApiResponse<Vec<Video>>> {
    let videos = state.catalog.list_by_owner(identity.id).await?;

    Ok(ApiResponse::ok(videos, "User videos fetched successfully"))
}

/// A single video; authenticated callers get it added to their watch history
pub async fn get_video(
    State(state): State<AppState>,
    WithRejection(Path(video_id), _): WithRejection<Path<String>, ApiError>,
    identity: Option<Extension<Identity>>,
) -> ApiResult<ApiResponse<VideoWithOwner>> {
    let video_id = parse_id(&video_id, "video")?;
    let video = state.catalog.get_by_id(video_id).await?;

    if let Some(Extension(identity)) = identity {
        if let Err(e) = state.credentials.record_watch(identity.id, video_id).await {
            warn!("Failed to record watch of {} by {}: {}", video_id, identity.id, e);
        }
    }

    Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

/// Delete one of the caller's videos
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Path(video_id), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<ApiResponse<Value>> {
    let video_id = parse_id(&video_id, "video")?;
    state.catalog.delete_by_id(video_id, identity.id).await?;

    Ok(ApiResponse::ok(json!({}), "Video deleted successfully"))
}
