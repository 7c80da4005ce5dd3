use actix_multipart::Multipart;
use actix_web::{
    delete, get, patch, post, put,
    web::{scope, Bytes, Data, Path, ServiceConfig},
    HttpRequest, HttpResponse,
};
use logger_libs::debug_logger;
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::PostError,
    middlewares::auth_middleware::{current_user, AuthMW},
    modules::upload::multipart::read_create_form,
    AppState,
};

use super::{
    model::{CommentMessageResponse, CommentRequest, PostMessageResponse, Reaction, UpdatePostRequest},
    service::{PostServices, RequestOrigin},
};

fn log_id(handler_name: &str) -> String {
    format!("{}.{}", handler_name, Uuid::new_v4())
}

/// An empty body decodes to `T::default()`; anything else must be valid JSON for `T`.
/// Decoding is left to the service so id and ownership checks answer first.
fn json_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, PostError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|error| PostError::InvalidInput(format!("Invalid JSON body: {}", error)))
}

#[get("")]
pub async fn get_all_posts(app_state: Data<AppState>) -> Result<HttpResponse, PostError> {
    let log_id = log_id("get_all_posts");
    let posts = PostServices::get_all(&log_id, app_state.posts.as_ref()).await?;
    Ok(HttpResponse::Ok().json(posts))
}

#[post("", wrap = "AuthMW")]
pub async fn create_post(
    req: HttpRequest,
    payload: Multipart,
    app_state: Data<AppState>,
) -> Result<HttpResponse, PostError> {
    let log_id = log_id("create_post");
    let user = current_user(&req)?;
    let form = read_create_form(payload, app_state.max_upload_bytes).await?;

    let connection = req.connection_info().clone();
    let post = PostServices::create(
        &log_id,
        app_state.posts.as_ref(),
        &app_state.uploads,
        &user,
        form,
        RequestOrigin {
            scheme: connection.scheme(),
            host: connection.host(),
        },
    )
    .await?;

    debug_logger(&log_id, "create_post", "Service", &user, &post);
    Ok(HttpResponse::Created().json(post))
}

#[put("/{id}", wrap = "AuthMW")]
pub async fn update_post(
    req: HttpRequest,
    path: Path<String>,
    body: Bytes,
    app_state: Data<AppState>,
) -> Result<HttpResponse, PostError> {
    let log_id = log_id("update_post");
    let user = current_user(&req)?;

    let post = PostServices::update(
        &log_id,
        app_state.posts.as_ref(),
        &user,
        &path.into_inner(),
        json_body::<UpdatePostRequest>(&body),
    )
    .await?;

    Ok(HttpResponse::Ok().json(PostMessageResponse {
        message: "Post updated".to_string(),
        post,
    }))
}

#[delete("/{id}", wrap = "AuthMW")]
pub async fn delete_post(
    req: HttpRequest,
    path: Path<String>,
    app_state: Data<AppState>,
) -> Result<HttpResponse, PostError> {
    let log_id = log_id("delete_post");
    let user = current_user(&req)?;

    PostServices::remove(&log_id, app_state.posts.as_ref(), &user, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Post deleted successfully" })))
}

async fn react(
    req: HttpRequest,
    path: Path<String>,
    app_state: Data<AppState>,
    reaction: Reaction,
) -> Result<HttpResponse, PostError> {
    let log_id = log_id(reaction.label());
    let user = current_user(&req)?;

    let counts = PostServices::react(
        &log_id,
        app_state.posts.as_ref(),
        &user,
        &path.into_inner(),
        reaction,
    )
    .await?;

    Ok(HttpResponse::Ok().json(counts))
}

#[patch("/{id}/like", wrap = "AuthMW")]
pub async fn like_post(
    req: HttpRequest,
    path: Path<String>,
    app_state: Data<AppState>,
) -> Result<HttpResponse, PostError> {
    react(req, path, app_state, Reaction::Like).await
}

#[patch("/{id}/dislike", wrap = "AuthMW")]
pub async fn dislike_post(
    req: HttpRequest,
    path: Path<String>,
    app_state: Data<AppState>,
) -> Result<HttpResponse, PostError> {
    react(req, path, app_state, Reaction::Dislike).await
}

#[post("/{post_id}/comments", wrap = "AuthMW")]
pub async fn add_comment(
    req: HttpRequest,
    path: Path<String>,
    body: Bytes,
    app_state: Data<AppState>,
) -> Result<HttpResponse, PostError> {
    let log_id = log_id("add_comment");
    let user = current_user(&req)?;
    let post_id = path.into_inner();

    let comment = PostServices::add_comment(
        &log_id,
        app_state.posts.as_ref(),
        &user,
        &post_id,
        json_body::<CommentRequest>(&body),
    )
    .await?;

    debug_logger(&log_id, "add_comment", "Service", &post_id, &comment);
    Ok(HttpResponse::Created().json(comment))
}

#[patch("/{post_id}/comments/{comment_id}", wrap = "AuthMW")]
pub async fn edit_comment(
    req: HttpRequest,
    path: Path<(String, String)>,
    body: Bytes,
    app_state: Data<AppState>,
) -> Result<HttpResponse, PostError> {
    let log_id = log_id("edit_comment");
    let user = current_user(&req)?;
    let (post_id, comment_id) = path.into_inner();

    let comment = PostServices::edit_comment(
        &log_id,
        app_state.posts.as_ref(),
        &user,
        &post_id,
        &comment_id,
        json_body::<CommentRequest>(&body),
    )
    .await?;

    Ok(HttpResponse::Ok().json(CommentMessageResponse {
        message: "Comment updated".to_string(),
        comment,
    }))
}

#[delete("/{post_id}/comments/{comment_id}", wrap = "AuthMW")]
pub async fn delete_comment(
    req: HttpRequest,
    path: Path<(String, String)>,
    app_state: Data<AppState>,
) -> Result<HttpResponse, PostError> {
    let log_id = log_id("delete_comment");
    let user = current_user(&req)?;
    let (post_id, comment_id) = path.into_inner();

    PostServices::delete_comment(
        &log_id,
        app_state.posts.as_ref(),
        &user,
        &post_id,
        &comment_id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Comment deleted" })))
}

pub fn post_config(config: &mut ServiceConfig) {
    config.service(
        scope("/posts")
            .service(get_all_posts)
            .service(create_post)
            .service(update_post)
            .service(delete_post)
            .service(add_comment)
            .service(edit_comment)
            .service(delete_comment)
            .service(like_post)
            .service(dislike_post),
    );
}
