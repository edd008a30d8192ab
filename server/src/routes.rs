use bytes::Bytes;
use gotham::handler::{HandlerError, IntoHandlerError};
use gotham::helpers::http::response::create_response;
use gotham::middleware::state::StateMiddleware;
use hyper::{body, Body, Response, StatusCode};
use gotham::pipeline::{new_pipeline, single_pipeline};
use gotham::router::builder::{build_router, DefineSingleRoute, DrawRoutes};
use gotham::router::Router;
use gotham::state::{FromState, State};
use gotham_derive::{StateData, StaticResponseExtender};
use registry_types::Identifier;
use serde_derive::Deserialize;

use crate::app::AppState;

/// What every async handler below returns: the gotham convention of
/// threading `State` through both the success and error arms.
type HandlerResult = Result<(State, Response<Body>), (State, HandlerError)>;

/// The HTTP surface this crate exposes. Exhaustive route coverage (archive
/// upload/download/delete, resource endpoints, delegatable credentials,
/// search) is routing glue out of scope here; these handlers exist to prove
/// the component stack is wired correctly end to end.
pub fn router(app: AppState) -> Router {
    let (chain, pipelines) = single_pipeline(new_pipeline().add(StateMiddleware::new(app)).build());
    build_router(chain, pipelines, |route| {
        route.get("/health").to(health);
        route
            .get("/:identifier")
            .with_path_extractor::<IdentifierExtractor>()
            .to_async(resolve_handler);
        route.post("/upload").to_async(new_upload_handler);
        route
            .put("/upload/:upload_id")
            .with_path_extractor::<UploadIdExtractor>()
            .to_async(finish_upload_handler);
        route
            .delete("/:identifier/archive")
            .with_path_extractor::<IdentifierExtractor>()
            .to_async(delete_handler);
    })
}

fn health(state: State) -> (State, &'static str) {
    (state, "ok")
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
struct IdentifierExtractor {
    identifier: String,
}

async fn resolve_handler(mut state: State) -> HandlerResult {
    let extractor = IdentifierExtractor::take_from(&mut state);
    let partial: Identifier = match extractor.identifier.parse() {
        Ok(id) => id,
        Err(e) => return Err((state, bad_request(e))),
    };

    let app = AppState::borrow_from(&state).clone();
    let ctx = app.anonymous_context();
    let query = resolver::ResolveQuery { partial: &partial, channel: None };
    match resolver::resolve(&ctx, app.metadata_dyn(), query).await {
        Ok((entity, channel)) => {
            let body = serde_json::json!({
                "identifier": entity.identifier.to_string(),
                "channel": channel.to_string(),
            });
            let res = create_response(&state, StatusCode::OK, mime::APPLICATION_JSON, body.to_string());
            Ok((state, res))
        }
        Err(resolver::ResolverError::NotFound) => {
            let res = create_response(&state, StatusCode::NOT_FOUND, mime::TEXT_PLAIN, "not found");
            Ok((state, res))
        }
        Err(e) => Err((state, e.into_handler_error())),
    }
}

async fn new_upload_handler(state: State) -> HandlerResult {
    let app = AppState::borrow_from(&state).clone();
    let ctx = app.anonymous_context();
    let expires_in_secs = ctx.config().max_upload_expiry.as_secs();
    match upload_pipeline::new_upload(&ctx, app.content_store(), expires_in_secs) {
        Ok(upload) => {
            let body = serde_json::json!({ "upload_id": upload.id });
            let res = create_response(&state, StatusCode::CREATED, mime::APPLICATION_JSON, body.to_string());
            Ok((state, res))
        }
        Err(e) => Err((state, e.into_handler_error())),
    }
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
struct UploadIdExtractor {
    upload_id: String,
}

/// Finishes a multipart upload from the raw bytes of the already-assembled
/// archive, treating the whole body as a single part. A full upload
/// protocol driven by explicit part numbers is routing glue out of scope
/// here; this handler proves the pipeline wiring end to end.
async fn finish_upload_handler(mut state: State) -> HandlerResult {
    let extractor = UploadIdExtractor::take_from(&mut state);
    let body_bytes = match body::to_bytes(Body::take_from(&mut state)).await {
        Ok(bytes) => bytes,
        Err(e) => return Err((state, e.into_handler_error())),
    };

    let app = AppState::borrow_from(&state).clone();
    let ctx = app.anonymous_context();
    let hash = registry_types::ContentHash::hash_bytes(&body_bytes);

    if let Err(e) = upload_pipeline::put_part(
        &ctx,
        app.content_store(),
        &extractor.upload_id,
        0,
        Bytes::from(body_bytes),
        hash,
    )
    .await
    {
        return Err((state, e.into_handler_error()));
    }

    match upload_pipeline::finish_upload(&ctx, app.content_store(), &extractor.upload_id, &[hash]).await {
        Ok(stored) => {
            let body = serde_json::json!({ "blob_name": stored.blob_name, "hash": stored.hash.to_string() });
            let res = create_response(&state, StatusCode::OK, mime::APPLICATION_JSON, body.to_string());
            Ok((state, res))
        }
        Err(e) => Err((state, e.into_handler_error())),
    }
}

/// `DELETE /<fully-resolved-id>/archive`: fails `Forbidden` via
/// `ChannelPublisherError::PinnedRevision` if the revision is currently
/// pinned on any channel (SPEC_FULL.md §6).
async fn delete_handler(mut state: State) -> HandlerResult {
    let extractor = IdentifierExtractor::take_from(&mut state);
    let identifier: Identifier = match extractor.identifier.parse() {
        Ok(id) => id,
        Err(e) => return Err((state, bad_request(e))),
    };

    let app = AppState::borrow_from(&state).clone();
    let ctx = app.anonymous_context();
    match channel_publisher::delete_entity(&ctx, app.metadata_dyn(), &identifier).await {
        Ok(()) => {
            let res = create_response(&state, StatusCode::NO_CONTENT, mime::TEXT_PLAIN, "");
            Ok((state, res))
        }
        Err(e) => Err((state, e.into_handler_error())),
    }
}

fn bad_request<E: std::error::Error + Send + 'static>(e: E) -> HandlerError {
    e.into_handler_error().with_status(StatusCode::BAD_REQUEST)
}
