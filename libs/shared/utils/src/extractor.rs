use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use shared_models::error::AppError;

/// Header carrying the authenticated user id, set by the gateway in front of this service.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The user performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub Uuid);

impl Actor {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

// Middleware that turns the actor header into an `Actor` extension
pub async fn actor_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(ACTOR_HEADER)
        .ok_or_else(|| AppError::Auth("Missing actor header".to_string()))?;

    let raw = header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid actor header format".to_string()))?;

    let actor_id = Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Auth("Actor header is not a valid id".to_string()))?;

    request.extensions_mut().insert(Actor(actor_id));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/whoami", get(|Extension(actor): Extension<Actor>| async move { actor.id().to_string() }))
            .layer(middleware::from_fn(actor_middleware))
    }

    #[tokio::test]
    async fn missing_header_is_unauthorised() {
        let response = app()
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_header_is_unauthorised() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(ACTOR_HEADER, "not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_header_reaches_handler() {
        let actor = Uuid::new_v4();
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(ACTOR_HEADER, actor.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
