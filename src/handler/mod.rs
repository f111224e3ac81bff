//! S3 request handler
//!
//! One [`S3Handler`] is constructed per gateway instance and invoked once per
//! accepted HTTP request, concurrently across connection tasks. This module
//! owns the scaffolding around the wire protocol: resolving which bucket a
//! request addresses (virtual-hosted vs path style), gating requests when the
//! gateway is configured with credentials, and shaping S3 error documents.
//! The protocol operations themselves are answered with `NotImplemented`
//! until a wire-protocol layer is plugged in behind [`S3Handler::handle`].

use std::sync::Arc;

use bytes::Bytes;
use http::{header, Request, Response, StatusCode};
use http_body_util::Full;
use log::debug;
use uuid::Uuid;

use crate::config::Credentials;
use crate::storage::ObjectStore;

/// Bucket and key a request addresses, as far as routing can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Addressed bucket, if any
    pub bucket: Option<String>,
    /// Addressed key within the bucket, if any
    pub key: Option<String>,
}

/// Per-gateway request handler.
///
/// Holds the backend store handle, the gateway-local credentials (absent
/// for an unauthenticated gateway), and the optional virtual host used to
/// recognize virtual-hosted-style requests.
pub struct S3Handler {
    store: Arc<dyn ObjectStore>,
    credentials: Option<Credentials>,
    virtual_host: Option<String>,
}

impl S3Handler {
    /// Create the handler for one gateway instance.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        credentials: Option<Credentials>,
        virtual_host: Option<String>,
    ) -> Self {
        Self {
            store,
            credentials,
            virtual_host,
        }
    }

    /// The backend store this handler operates against.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Handle one HTTP request.
    ///
    /// Must be callable concurrently; the gateway invokes it from every
    /// connection task.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>> {
        let request_id = Uuid::new_v4();

        if self.credentials.is_some() && !req.headers().contains_key(header::AUTHORIZATION) {
            debug!("request {} refused: no authorization header", request_id);
            return error_response(
                StatusCode::FORBIDDEN,
                "AccessDenied",
                "Access Denied",
                request_id,
            );
        }

        let target = self.resolve_target(&req);
        debug!(
            "request {} {} {} resolved to {:?}",
            request_id,
            req.method(),
            req.uri().path(),
            target
        );

        error_response(
            StatusCode::NOT_IMPLEMENTED,
            "NotImplemented",
            "This gateway does not implement the requested operation.",
            request_id,
        )
    }

    /// Resolve which bucket and key a request addresses.
    ///
    /// A request whose Host header is `<bucket>.<virtual-host>` is
    /// virtual-hosted style: the bucket comes from the host name and the
    /// whole path is the key. Anything else is path style: the first path
    /// segment is the bucket, the rest is the key.
    pub fn resolve_target<B>(&self, req: &Request<B>) -> ResolvedTarget {
        let path = req.uri().path().trim_start_matches('/');

        if let Some(bucket) = self.bucket_from_host(req) {
            return ResolvedTarget {
                bucket: Some(bucket),
                key: non_empty(path),
            };
        }

        match path.split_once('/') {
            Some((bucket, key)) => ResolvedTarget {
                bucket: non_empty(bucket),
                key: non_empty(key),
            },
            None => ResolvedTarget {
                bucket: non_empty(path),
                key: None,
            },
        }
    }

    /// Extract a bucket name from a virtual-hosted-style Host header.
    fn bucket_from_host<B>(&self, req: &Request<B>) -> Option<String> {
        let virtual_host = self.virtual_host.as_deref()?;
        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())?;
        // Ignore an optional port suffix.
        let host = host.rsplit_once(':').map_or(host, |(name, _)| name);

        let prefix = host.strip_suffix(virtual_host)?.strip_suffix('.')?;
        if prefix.is_empty() {
            None
        } else {
            Some(prefix.to_string())
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Build an S3-style XML error response.
fn error_response(
    status: StatusCode,
    code: &str,
    message: &str,
    request_id: Uuid,
) -> Response<Full<Bytes>> {
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <Error><Code>{}</Code><Message>{}</Message><RequestId>{}</RequestId></Error>",
        code, message, request_id
    );

    // The builder only fails on malformed header values; ours are constant.
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/xml")
        .header("x-amz-request-id", request_id.to_string())
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}
