//! HTTP implementation of [`PeerLookup`] for peers running out of process.

use crate::resolver::{PeerError, PeerLookup};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::marker::PhantomData;

/// `GET {base_url}/{resource}/{id}` against a peer service.
///
/// 2xx decodes the body as `T`, 404 is "absent", anything else is a [`PeerError`]. No
/// request timeout is set here: the gate wrapping the call owns the time budget.
pub struct HttpPeer<T> {
    base_url: String,
    resource: String,
    client: reqwest::Client,
    _snapshot: PhantomData<fn() -> T>,
}

impl<T> Clone for HttpPeer<T> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            resource: self.resource.clone(),
            client: self.client.clone(),
            _snapshot: PhantomData,
        }
    }
}

impl<T> HttpPeer<T> {
    #[must_use]
    pub fn new(base_url: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, resource)
    }

    /// Shares an existing connection pool.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            resource: resource.into(),
            client,
            _snapshot: PhantomData,
        }
    }

    fn url(&self, id: &dyn Display) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.resource.trim_matches('/'),
            id
        )
    }
}

#[async_trait]
impl<Id, T> PeerLookup<Id, T> for HttpPeer<T>
where
    Id: Display + Send + 'static,
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self, id: Id) -> Result<Option<T>, PeerError> {
        let response = self
            .client
            .get(self.url(&id))
            .send()
            .await
            .map_err(|e| PeerError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| PeerError::Decode(e.to_string())),
            StatusCode::SERVICE_UNAVAILABLE => {
                Err(PeerError::Unavailable(format!("{} answered 503", self.resource)))
            }
            status => Err(PeerError::Status(status.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::routing::get;
    use axum::Router;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct DepartmentSnapshot {
        id: u32,
        name: String,
    }

    async fn spawn_peer() -> String {
        let app = Router::new().route(
            "/departments/{id}",
            get(|Path(id): Path<u32>| async move {
                match id {
                    1 => (StatusCode::OK, axum::Json(json!({ "id": 1, "name": "Cardiology" }))),
                    2 => (StatusCode::OK, axum::Json(json!({ "unexpected": true }))),
                    3 => (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(json!({}))),
                    _ => (StatusCode::NOT_FOUND, axum::Json(json!({ "error": "no department" }))),
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn maps_statuses_to_peer_outcomes() {
        let peer = HttpPeer::<DepartmentSnapshot>::new(spawn_peer().await, "departments");

        assert_eq!(
            peer.fetch(1u32).await,
            Ok(Some(DepartmentSnapshot {
                id: 1,
                name: "Cardiology".into()
            }))
        );
        assert_eq!(peer.fetch(9u32).await, Ok(None));
        assert!(matches!(peer.fetch(2u32).await, Err(PeerError::Decode(_))));
        assert_eq!(peer.fetch(3u32).await, Err(PeerError::Status(500)));
    }

    #[tokio::test]
    async fn unreachable_peer_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let peer = HttpPeer::<DepartmentSnapshot>::new(format!("http://{addr}"), "departments");
        assert!(matches!(peer.fetch(1u32).await, Err(PeerError::Transport(_))));
    }
}
