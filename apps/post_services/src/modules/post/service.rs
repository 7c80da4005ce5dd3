use logger_libs::{info_logger, warning_logger};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::PostError,
    modules::{
        upload::{multipart::CreatePostForm, storage::UploadStorage},
        user::model::UserPayload,
    },
};

use super::{
    model::{
        Comment, CommentRequest, NewComment, NewPost, Post, Reaction, ReactionCounts,
        ReactionOutcome, UpdatePostRequest,
    },
    query::PostStore,
};

/// Where the request came from, used to build absolute upload URLs.
pub struct RequestOrigin<'a> {
    pub scheme: &'a str,
    pub host: &'a str,
}

pub struct PostServices {}

fn not_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn post_not_found() -> PostError {
    PostError::NotFound("Post not found".to_string())
}

fn comment_not_found() -> PostError {
    PostError::NotFound("Comment not found".to_string())
}

/// Runs the `validator` rules of `data` and folds the messages into one
/// `InvalidInput`.
fn validate_request<T: Validate>(data: &T, log_id: &str, handler: &str) -> Result<(), PostError> {
    if let Err(errors) = data.validate() {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        messages.dedup();

        let message = messages.join(", ");
        warning_logger(log_id, handler, "validate", &message);
        return Err(PostError::InvalidInput(message));
    }

    info_logger(log_id, handler, "validate");
    Ok(())
}

impl PostServices {
    pub fn parse_id(raw: &str, label: &str) -> Result<Uuid, PostError> {
        Uuid::parse_str(raw).map_err(|_| PostError::InvalidInput(format!("Invalid {} ID", label)))
    }

    async fn find_existing(
        log_id: &str,
        handler: &str,
        posts: &dyn PostStore,
        post_id: Uuid,
        failure: &str,
    ) -> Result<Post, PostError> {
        match posts.find_post(post_id).await {
            Ok(Some(post)) => {
                info_logger(log_id, handler, "find_post");
                Ok(post)
            }
            Ok(None) => {
                warning_logger(log_id, handler, "find_post", "post not found");
                Err(post_not_found())
            }
            Err(error) => Err(PostError::internal(failure, error)),
        }
    }

    pub async fn get_all(log_id: &str, posts: &dyn PostStore) -> Result<Vec<Post>, PostError> {
        let all = posts
            .list_posts()
            .await
            .map_err(|error| PostError::internal("Failed to fetch posts", error))?;
        info_logger(log_id, "get_all_posts", "list_posts");
        Ok(all)
    }

    pub async fn create(
        log_id: &str,
        posts: &dyn PostStore,
        uploads: &UploadStorage,
        user: &UserPayload,
        form: CreatePostForm,
        origin: RequestOrigin<'_>,
    ) -> Result<Post, PostError> {
        let handler = "create_post";
        let failure = "Failed to create post";

        let Some(content) = not_blank(form.content) else {
            warning_logger(log_id, handler, "validate", "missing content");
            return Err(PostError::InvalidInput("Post content is required".to_string()));
        };

        let stored = match &form.image {
            Some(image) => {
                let stored = uploads
                    .save(image)
                    .await
                    .map_err(|error| PostError::internal(failure, error))?;
                info_logger(log_id, handler, "save_image");
                Some(stored)
            }
            None => None,
        };

        let new_post = NewPost {
            content,
            image_url: stored
                .as_deref()
                .map(|name| UploadStorage::public_url(origin.scheme, origin.host, name)),
            created_by: user.id,
        };

        match posts.create_post(new_post).await {
            Ok(post) => {
                info_logger(log_id, handler, "create_post");
                Ok(post)
            }
            Err(error) => {
                if let Some(name) = stored {
                    if let Err(cleanup) = uploads.remove(&name).await {
                        warning_logger(log_id, handler, "remove_image", &cleanup.to_string());
                    }
                }
                Err(PostError::internal(failure, error))
            }
        }
    }

    pub async fn update(
        log_id: &str,
        posts: &dyn PostStore,
        user: &UserPayload,
        raw_post_id: &str,
        body: Result<UpdatePostRequest, PostError>,
    ) -> Result<Post, PostError> {
        let handler = "update_post";
        let failure = "Failed to update post";
        let post_id = Self::parse_id(raw_post_id, "post")?;

        let post = Self::find_existing(log_id, handler, posts, post_id, failure).await?;
        if !post.is_owned_by(user.id) {
            warning_logger(log_id, handler, "check_owner", "not the owner");
            return Err(PostError::Forbidden(
                "You are not authorized to update this post".to_string(),
            ));
        }

        let Some(content) = not_blank(body?.content) else {
            info_logger(log_id, handler, "content_unchanged");
            return Ok(post);
        };

        let updated = posts
            .update_content(post_id, user.id, content)
            .await
            .map_err(|error| PostError::internal(failure, error))?
            .ok_or_else(post_not_found)?;
        info_logger(log_id, handler, "update_content");
        Ok(updated)
    }

    pub async fn remove(
        log_id: &str,
        posts: &dyn PostStore,
        user: &UserPayload,
        raw_post_id: &str,
    ) -> Result<(), PostError> {
        let handler = "delete_post";
        let failure = "Failed to delete post";
        let post_id = Self::parse_id(raw_post_id, "post")?;

        let post = Self::find_existing(log_id, handler, posts, post_id, failure).await?;
        if !post.is_owned_by(user.id) {
            warning_logger(log_id, handler, "check_owner", "not the owner");
            return Err(PostError::Forbidden(
                "You are not authorized to delete this post".to_string(),
            ));
        }

        let deleted = posts
            .delete_post(post_id, user.id)
            .await
            .map_err(|error| PostError::internal(failure, error))?;
        if !deleted {
            return Err(post_not_found());
        }

        info_logger(log_id, handler, "delete_post");
        Ok(())
    }

    pub async fn react(
        log_id: &str,
        posts: &dyn PostStore,
        user: &UserPayload,
        raw_post_id: &str,
        reaction: Reaction,
    ) -> Result<ReactionCounts, PostError> {
        let handler = reaction.label();
        let post_id = Self::parse_id(raw_post_id, "post")?;

        let outcome = posts
            .add_reaction(post_id, user.id, reaction)
            .await
            .map_err(|error| {
                PostError::internal(&format!("Failed to {} post", reaction.label()), error)
            })?;

        match outcome {
            ReactionOutcome::Applied(counts) => {
                info_logger(log_id, handler, "add_reaction");
                Ok(counts)
            }
            ReactionOutcome::AlreadyDone => {
                warning_logger(log_id, handler, "add_reaction", "already reacted");
                Err(PostError::AlreadyDone(format!(
                    "You have already {}d this post",
                    reaction.label()
                )))
            }
            ReactionOutcome::NotFound => Err(post_not_found()),
        }
    }

    pub async fn add_comment(
        log_id: &str,
        posts: &dyn PostStore,
        user: &UserPayload,
        raw_post_id: &str,
        request: Result<CommentRequest, PostError>,
    ) -> Result<Comment, PostError> {
        let handler = "add_comment";
        let failure = "Failed to add comment";
        let post_id = Self::parse_id(raw_post_id, "post")?;

        Self::find_existing(log_id, handler, posts, post_id, failure).await?;
        let request = request?;
        validate_request(&request, log_id, handler)?;
        let text = request.text.unwrap_or_default();

        let comment = posts
            .push_comment(
                post_id,
                NewComment {
                    text,
                    created_by: user.id,
                },
            )
            .await
            .map_err(|error| PostError::internal(failure, error))?
            .ok_or_else(post_not_found)?;
        info_logger(log_id, handler, "push_comment");
        Ok(comment)
    }

    pub async fn edit_comment(
        log_id: &str,
        posts: &dyn PostStore,
        user: &UserPayload,
        raw_post_id: &str,
        raw_comment_id: &str,
        request: Result<CommentRequest, PostError>,
    ) -> Result<Comment, PostError> {
        let handler = "edit_comment";
        let failure = "Failed to edit comment";
        let post_id = Self::parse_id(raw_post_id, "post")?;
        let comment_id = Self::parse_id(raw_comment_id, "comment")?;

        let post = Self::find_existing(log_id, handler, posts, post_id, failure).await?;
        let comment = post.comment(comment_id).ok_or_else(comment_not_found)?;
        if comment.created_by != user.id {
            warning_logger(log_id, handler, "check_author", "not the author");
            return Err(PostError::Forbidden(
                "You are not authorized to edit this comment".to_string(),
            ));
        }
        let request = request?;
        validate_request(&request, log_id, handler)?;
        let text = request.text.unwrap_or_default();

        let edited = posts
            .edit_comment(post_id, comment_id, text)
            .await
            .map_err(|error| PostError::internal(failure, error))?
            .ok_or_else(comment_not_found)?;
        info_logger(log_id, handler, "edit_comment");
        Ok(edited)
    }

    pub async fn delete_comment(
        log_id: &str,
        posts: &dyn PostStore,
        user: &UserPayload,
        raw_post_id: &str,
        raw_comment_id: &str,
    ) -> Result<(), PostError> {
        let handler = "delete_comment";
        let failure = "Failed to delete comment";
        let post_id = Self::parse_id(raw_post_id, "post")?;
        let comment_id = Self::parse_id(raw_comment_id, "comment")?;

        let post = Self::find_existing(log_id, handler, posts, post_id, failure).await?;
        let comment = post.comment(comment_id).ok_or_else(comment_not_found)?;
        if comment.created_by != user.id && !post.is_owned_by(user.id) {
            warning_logger(log_id, handler, "check_author", "neither author nor post owner");
            return Err(PostError::Forbidden(
                "You are not authorized to delete this comment".to_string(),
            ));
        }

        let removed = posts
            .remove_comment(post_id, comment_id)
            .await
            .map_err(|error| PostError::internal(failure, error))?;
        if !removed {
            return Err(comment_not_found());
        }

        info_logger(log_id, handler, "remove_comment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::post::memory::MemoryPostStore;

    fn user() -> UserPayload {
        UserPayload {
            id: Uuid::new_v4(),
            username: "someone".into(),
            email: "someone@example.com".into(),
        }
    }

    fn origin() -> RequestOrigin<'static> {
        RequestOrigin {
            scheme: "http",
            host: "localhost:8000",
        }
    }

    fn form(content: Option<&str>) -> CreatePostForm {
        CreatePostForm {
            content: content.map(str::to_string),
            image: None,
        }
    }

    fn text(value: &str) -> Result<CommentRequest, PostError> {
        Ok(CommentRequest {
            text: Some(value.to_string()),
        })
    }

    fn content(value: &str) -> Result<UpdatePostRequest, PostError> {
        Ok(UpdatePostRequest {
            content: Some(value.to_string()),
        })
    }

    fn undecodable<T>() -> Result<T, PostError> {
        Err(PostError::InvalidInput("Invalid JSON body".to_string()))
    }

    async fn seeded(owner: &UserPayload) -> (MemoryPostStore, Post) {
        let store = MemoryPostStore::new();
        let uploads = UploadStorage::new(std::env::temp_dir());
        let post = PostServices::create("t", &store, &uploads, owner, form(Some("hello")), origin())
            .await
            .unwrap();
        (store, post)
    }

    #[tokio::test]
    async fn create_requires_content_and_persists_nothing_otherwise() {
        let store = MemoryPostStore::new();
        let uploads = UploadStorage::new(std::env::temp_dir());
        let owner = user();

        for content in [None, Some(""), Some("   ")] {
            let error = PostServices::create("t", &store, &uploads, &owner, form(content), origin())
                .await
                .unwrap_err();
            assert!(matches!(error, PostError::InvalidInput(_)));
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn create_sets_owner_and_null_image() {
        let owner = user();
        let (_, post) = seeded(&owner).await;
        assert_eq!(post.created_by, owner.id);
        assert_eq!(post.image_url, None);
        assert_eq!(post.content.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn update_keeps_content_when_replacement_is_blank() {
        let owner = user();
        let (store, post) = seeded(&owner).await;
        let id = post.id.to_string();

        let same = PostServices::update("t", &store, &owner, &id, content(" "))
            .await
            .unwrap();
        assert_eq!(same.content.as_deref(), Some("hello"));

        let changed = PostServices::update("t", &store, &owner, &id, content("bye"))
            .await
            .unwrap();
        assert_eq!(changed.content.as_deref(), Some("bye"));
    }

    #[tokio::test]
    async fn update_and_delete_check_existence_before_ownership() {
        let owner = user();
        let stranger = user();
        let (store, post) = seeded(&owner).await;
        let missing = Uuid::new_v4().to_string();

        let error = PostServices::update("t", &store, &stranger, &missing, content("x"))
            .await
            .unwrap_err();
        assert!(matches!(error, PostError::NotFound(_)));

        let error = PostServices::remove("t", &store, &stranger, &post.id.to_string())
            .await
            .unwrap_err();
        assert!(matches!(error, PostError::Forbidden(_)));
        assert!(store.find_post(post.id).await.unwrap().is_some());

        let error = PostServices::remove("t", &store, &owner, "not-a-uuid")
            .await
            .unwrap_err();
        assert!(matches!(error, PostError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn second_like_is_already_done_and_counts_hold() {
        let owner = user();
        let (store, post) = seeded(&owner).await;
        let id = post.id.to_string();

        let counts = PostServices::react("t", &store, &owner, &id, Reaction::Like)
            .await
            .unwrap();
        assert_eq!(counts, ReactionCounts { likes: 1, dislikes: 0 });

        let error = PostServices::react("t", &store, &owner, &id, Reaction::Like)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "You have already liked this post");

        PostServices::react("t", &store, &owner, &id, Reaction::Dislike)
            .await
            .unwrap();
        let error = PostServices::react("t", &store, &owner, &id, Reaction::Dislike)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "You have already disliked this post");

        let post = store.find_post(post.id).await.unwrap().unwrap();
        assert_eq!(post.likes as usize, post.liked_by.len());
        assert_eq!(post.dislikes as usize, post.disliked_by.len());
        assert_eq!(post.counts(), ReactionCounts { likes: 1, dislikes: 1 });
    }

    #[tokio::test]
    async fn comment_lifecycle_with_authorship() {
        let owner = user();
        let commenter = user();
        let stranger = user();
        let (store, post) = seeded(&owner).await;
        let id = post.id.to_string();

        let comment = PostServices::add_comment("t", &store, &commenter, &id, text("first"))
            .await
            .unwrap();
        assert_eq!(comment.created_by, commenter.id);
        let comment_id = comment.id.to_string();

        let error =
            PostServices::edit_comment("t", &store, &owner, &id, &comment_id, text("hijack"))
                .await
                .unwrap_err();
        assert!(matches!(error, PostError::Forbidden(_)));

        let error = PostServices::edit_comment("t", &store, &commenter, &id, &comment_id, text(""))
            .await
            .unwrap_err();
        assert!(matches!(error, PostError::InvalidInput(_)));

        let edited =
            PostServices::edit_comment("t", &store, &commenter, &id, &comment_id, text("second"))
                .await
                .unwrap();
        assert_eq!(edited.text, "second");

        let error = PostServices::delete_comment("t", &store, &stranger, &id, &comment_id)
            .await
            .unwrap_err();
        assert!(matches!(error, PostError::Forbidden(_)));

        // the post owner may moderate
        PostServices::delete_comment("t", &store, &owner, &id, &comment_id)
            .await
            .unwrap();
        let error = PostServices::delete_comment("t", &store, &owner, &id, &comment_id)
            .await
            .unwrap_err();
        assert!(matches!(error, PostError::NotFound(_)));
    }

    #[tokio::test]
    async fn blank_comment_is_rejected_without_touching_post() {
        let owner = user();
        let (store, post) = seeded(&owner).await;

        let error = PostServices::add_comment(
            "t",
            &store,
            &owner,
            &post.id.to_string(),
            Ok(CommentRequest::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(error.to_string(), "Comment text is required");

        let post = store.find_post(post.id).await.unwrap().unwrap();
        assert!(post.comments.is_empty());
    }

    #[tokio::test]
    async fn malformed_ids_are_invalid_input() {
        let owner = user();
        let (store, post) = seeded(&owner).await;

        let error = PostServices::add_comment("t", &store, &owner, "123", text("x"))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Invalid post ID");

        let error =
            PostServices::edit_comment("t", &store, &owner, &post.id.to_string(), "abc", text("x"))
                .await
                .unwrap_err();
        assert_eq!(error.to_string(), "Invalid comment ID");
    }

    #[tokio::test]
    async fn undecodable_body_surfaces_after_route_checks() {
        let owner = user();
        let stranger = user();
        let (store, post) = seeded(&owner).await;
        let id = post.id.to_string();
        let missing = Uuid::new_v4().to_string();

        let error = PostServices::add_comment("t", &store, &owner, "nope", undecodable())
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Invalid post ID");

        let error = PostServices::add_comment("t", &store, &owner, &missing, undecodable())
            .await
            .unwrap_err();
        assert!(matches!(error, PostError::NotFound(_)));

        let error = PostServices::update("t", &store, &stranger, &id, undecodable())
            .await
            .unwrap_err();
        assert!(matches!(error, PostError::Forbidden(_)));

        let error = PostServices::update("t", &store, &owner, &id, undecodable())
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Invalid JSON body");
        let post = store.find_post(post.id).await.unwrap().unwrap();
        assert_eq!(post.content.as_deref(), Some("hello"));
    }
}
