use std::sync::Arc;

use actix_web::{
    get,
    web::{scope, Data, ServiceConfig},
    HttpResponse, Responder,
};
use logger_libs::error_logger;
use serde_json::json;

pub mod config_type;
pub mod error;
pub mod middlewares;
pub mod modules;

use modules::{
    post::{handler::post_config, query::PostStore},
    upload::{handler::serve_upload, storage::UploadStorage},
    user::query::UserStore,
};

/// Everything a handler needs, injected through `web::Data`.
pub struct AppState {
    pub posts: Arc<dyn PostStore>,
    pub users: Arc<dyn UserStore>,
    pub uploads: UploadStorage,
    pub jwt_secret: String,
    pub max_upload_bytes: usize,
}

#[get("/healthcheck")]
async fn api_health_check(data: Data<AppState>) -> impl Responder {
    if let Err(err) = data.posts.ping().await {
        error_logger("api_health_check", &err.to_string());
        return HttpResponse::ServiceUnavailable().json(json!({
            "status": "failed",
            "error": "❌ Cannot connect to database"
        }));
    }

    HttpResponse::Ok().json(json!({ "status": "success", "message": "🚀 API healthy and ready to go!" }))
}

/// Routes of the service: static uploads at `/uploads`, JSON API under `/api`.
pub fn app_config(config: &mut ServiceConfig) {
    config
        .service(serve_upload)
        .service(
            scope("/api")
                .service(api_health_check)
                .configure(post_config),
        );
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use async_trait::async_trait;
    use serde_json::Value;
    use uuid::Uuid;

    use super::*;
    use crate::{
        error::StoreError,
        modules::{
            post::model::{Comment, NewComment, NewPost, Post, Reaction, ReactionOutcome},
            user::query::MemoryUserStore,
        },
    };

    struct UnreachableStore;

    fn down() -> StoreError {
        StoreError::Database(sqlx::Error::PoolTimedOut)
    }

    #[async_trait]
    impl PostStore for UnreachableStore {
        async fn ping(&self) -> Result<(), StoreError> {
            Err(down())
        }

        async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
            Err(down())
        }

        async fn create_post(&self, _: NewPost) -> Result<Post, StoreError> {
            Err(down())
        }

        async fn find_post(&self, _: Uuid) -> Result<Option<Post>, StoreError> {
            Err(down())
        }

        async fn update_content(&self, _: Uuid, _: Uuid, _: String) -> Result<Option<Post>, StoreError> {
            Err(down())
        }

        async fn delete_post(&self, _: Uuid, _: Uuid) -> Result<bool, StoreError> {
            Err(down())
        }

        async fn add_reaction(&self, _: Uuid, _: Uuid, _: Reaction) -> Result<ReactionOutcome, StoreError> {
            Err(down())
        }

        async fn push_comment(&self, _: Uuid, _: NewComment) -> Result<Option<Comment>, StoreError> {
            Err(down())
        }

        async fn edit_comment(&self, _: Uuid, _: Uuid, _: String) -> Result<Option<Comment>, StoreError> {
            Err(down())
        }

        async fn remove_comment(&self, _: Uuid, _: Uuid) -> Result<bool, StoreError> {
            Err(down())
        }
    }

    #[actix_web::test]
    async fn healthcheck_hides_store_failure_detail() {
        let state = Data::new(AppState {
            posts: Arc::new(UnreachableStore),
            users: Arc::new(MemoryUserStore::new()),
            uploads: UploadStorage::new(std::env::temp_dir()),
            jwt_secret: "secret".to_string(),
            max_upload_bytes: 1024,
        });
        let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/api/healthcheck").to_request()).await;
        assert_eq!(resp.status(), 503);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "failed");
        assert_eq!(body["error"], "❌ Cannot connect to database");
        assert!(!body.to_string().contains("pool timed out"));
    }
}
