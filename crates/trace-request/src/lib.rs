//! Per-request tracing: every request gets an id (taken from `X-Request-Id`
//! when the caller supplies one) and a span that covers the handler.

use std::fmt;

use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{Header, Status},
    request::{self, FromRequest, Request},
    Data, Response,
};
use sentry::configure_scope;
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// A request's id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the current request's ID, assigning one only as necessary.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestId {
    type Error = ();

    async fn from_request(
        request: &'r Request<'_>,
    ) -> request::Outcome<Self, Self::Error> {
        // `local_cache` runs the closure at most once per request, so every
        // guard sees the same id.
        request::Outcome::Success(
            request
                .local_cache(|| {
                    RequestId(
                        request
                            .headers()
                            .get_one(REQUEST_ID_HEADER)
                            .filter(|id| !id.trim().is_empty())
                            .map(ToString::to_string)
                            .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    )
                })
                .clone(),
        )
    }
}

/// The span opened for the current request by [`RequestTracing`].
pub struct RequestSpan(pub Span);

struct CachedSpan(Option<Span>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestSpan {
    type Error = ();

    async fn from_request(
        request: &'r Request<'_>,
    ) -> request::Outcome<Self, ()> {
        match &request.local_cache(|| CachedSpan(None)).0 {
            Some(span) => request::Outcome::Success(RequestSpan(span.clone())),
            None => {
                request::Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}

/// Opens a span per request and echoes the request id on the response.
pub struct RequestTracing;

#[rocket::async_trait]
impl Fairing for RequestTracing {
    fn info(&self) -> Info {
        Info {
            name: "Request tracing",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let Some(request_id) = req.guard::<RequestId>().await.succeeded()
        else {
            return;
        };

        let span = tracing::info_span!(
            "request",
            http.method = %req.method(),
            http.uri = %req.uri().path(),
            http.status_code = tracing::field::Empty,
            http.request_id = %request_id,
        );
        span.in_scope(|| {
            tracing::debug!("received request");
            configure_scope(|scope| {
                scope.set_tag("request_id", &request_id);
            });
        });
        req.local_cache(|| CachedSpan(Some(span)));
    }

    async fn on_response<'r>(
        &self,
        req: &'r Request<'_>,
        res: &mut Response<'r>,
    ) {
        if let Some(span) = &req.local_cache(|| CachedSpan(None)).0 {
            span.record("http.status_code", res.status().code);
            span.in_scope(|| {
                if res.status().code >= 500 {
                    tracing::warn!(status = %res.status(), "request failed");
                } else {
                    tracing::info!(status = %res.status(), "request complete");
                }
            });
        }

        if let Some(request_id) = req.guard::<RequestId>().await.succeeded() {
            res.set_header(Header::new(REQUEST_ID_HEADER, request_id.0));
        }
    }
}
