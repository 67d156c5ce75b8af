//! # ServiceClient Trait
//!
//! The inbound surface every service exposes (`GET`, `GET /{id}`, `GET ?filter`, `POST`,
//! `PATCH`, `PATCH /{id}/status`, `DELETE`), provided once on top of a [`ResourceClient`].
//! The default methods check the caller's [`AuthContext`], classify actor failures into the
//! [`ServiceError`] taxonomy and redact what they return.
use crate::auth::{AuthContext, Capability};
use crate::compose::Redact;
use crate::error::ServiceError;
use crate::{OwnedEntity, ResourceClient};
use async_trait::async_trait;

/// Trait for service-specific clients to inherit the standard operations.
///
/// # Example
///
/// ```rust
/// use fleet_framework::{
///     define_id, AuthContext, Capability, OwnedEntity, Redact, ResourceActor, ResourceClient,
///     Role, ServiceClient, ServiceError,
/// };
/// use async_trait::async_trait;
///
/// define_id!(Ward);
///
/// #[derive(Clone, Debug)]
/// struct Ward { id: WardId, name: String }
/// #[derive(Debug)] struct WardCreate { name: String }
/// #[derive(Debug)] struct WardPatch { name: Option<String> }
///
/// #[async_trait]
/// impl OwnedEntity for Ward {
///     type Id = WardId; type Create = WardCreate; type Patch = WardPatch;
///     type Filter = (); type Action = (); type ActionResult = (); type Context = ();
///     fn id(&self) -> &WardId { &self.id }
///     fn from_create_params(id: WardId, p: WardCreate) -> Result<Self, ServiceError> {
///         Ok(Self { id, name: p.name })
///     }
///     async fn on_update(&mut self, p: WardPatch, _: &()) -> Result<(), ServiceError> {
///         if let Some(name) = p.name { self.name = name; }
///         Ok(())
///     }
///     async fn handle_action(&mut self, _: (), _: &()) -> Result<(), ServiceError> { Ok(()) }
/// }
///
/// impl Redact for Ward {
///     fn redact(self, _: &AuthContext) -> Self { self }
/// }
///
/// struct WardClient { inner: ResourceClient<Ward> }
///
/// impl ServiceClient<Ward> for WardClient {
///     const SERVICE: &'static str = "ward";
///     const WRITE: Capability = Capability::ManageClinic;
///     fn inner(&self) -> &ResourceClient<Ward> { &self.inner }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, inner) = ResourceActor::<Ward>::new(10);
///     tokio::spawn(actor.run(()));
///     let wards = WardClient { inner };
///
///     let anonymous = AuthContext::anonymous();
///     let err = wards.create(&anonymous, WardCreate { name: "A".into() }).await.unwrap_err();
///     assert_eq!(err.status(), 401);
///
///     let admin = AuthContext::new(1, Role::Admin);
///     let id = wards.create(&admin, WardCreate { name: "A".into() }).await.unwrap();
///     assert_eq!(wards.find_by_id(&admin, id).await.unwrap().name, "A");
///     assert_eq!(wards.set_status(&admin, id, false).await.unwrap_err().status(), 405);
/// }
/// ```
#[async_trait]
pub trait ServiceClient<T>: Send + Sync
where
    T: OwnedEntity + Redact,
{
    /// Service name used in messages and logs (`"duty"`).
    const SERVICE: &'static str;

    /// Capability required to create, patch and delete.
    const WRITE: Capability;

    /// Reads are open to anonymous callers.
    const PUBLIC_READ: bool = false;

    /// Creation is open to anonymous callers (self sign-up).
    const PUBLIC_CREATE: bool = false;

    fn inner(&self) -> &ResourceClient<T>;

    fn authorize_read(&self, auth: &AuthContext) -> Result<(), ServiceError> {
        if !Self::PUBLIC_READ {
            auth.authenticated()?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, auth))]
    async fn find_all(&self, auth: &AuthContext) -> Result<Vec<T>, ServiceError> {
        self.authorize_read(auth)?;
        let items = self
            .inner()
            .list(None)
            .await
            .map_err(|e| ServiceError::classify(Self::SERVICE, "find_all", &"*", e))?;
        Ok(items.into_iter().map(|item| item.redact(auth)).collect())
    }

    #[tracing::instrument(skip(self, auth))]
    async fn find_by(&self, auth: &AuthContext, filter: T::Filter) -> Result<Vec<T>, ServiceError> {
        self.authorize_read(auth)?;
        let items = self
            .inner()
            .list(Some(filter))
            .await
            .map_err(|e| ServiceError::classify(Self::SERVICE, "find_by", &"?", e))?;
        Ok(items.into_iter().map(|item| item.redact(auth)).collect())
    }

    /// Unredacted record, or `NotFound`. Used by the typed clients before composing.
    async fn fetch(&self, id: T::Id) -> Result<T, ServiceError> {
        match self.inner().get(id.clone()).await {
            Ok(Some(item)) => Ok(item),
            Ok(None) => Err(ServiceError::classify(
                Self::SERVICE,
                "find_by_id",
                &id,
                crate::FrameworkError::NotFound(id.to_string()),
            )),
            Err(e) => Err(ServiceError::classify(Self::SERVICE, "find_by_id", &id, e)),
        }
    }

    #[tracing::instrument(skip(self, auth))]
    async fn find_by_id(&self, auth: &AuthContext, id: T::Id) -> Result<T, ServiceError> {
        self.authorize_read(auth)?;
        Ok(self.fetch(id).await?.redact(auth))
    }

    #[tracing::instrument(skip(self, auth))]
    async fn create(&self, auth: &AuthContext, params: T::Create) -> Result<T::Id, ServiceError> {
        if !Self::PUBLIC_CREATE {
            auth.require(Self::WRITE)?;
        }
        self.inner()
            .create(params)
            .await
            .map_err(|e| ServiceError::classify(Self::SERVICE, "create", &"new", e))
    }

    #[tracing::instrument(skip(self, auth))]
    async fn patch(&self, auth: &AuthContext, id: T::Id, patch: T::Patch) -> Result<T, ServiceError> {
        auth.require(Self::WRITE)?;
        self.inner()
            .update(id.clone(), patch)
            .await
            .map(|item| item.redact(auth))
            .map_err(|e| ServiceError::classify(Self::SERVICE, "patch", &id, e))
    }

    /// `PATCH /{id}/status?isActive=`. Only entities with a status flag override this.
    async fn set_status(&self, _auth: &AuthContext, id: T::Id, _active: bool) -> Result<T, ServiceError> {
        Err(ServiceError::MethodNotAllowed(format!(
            "{} {} has no status",
            Self::SERVICE,
            id
        )))
    }

    #[tracing::instrument(skip(self, auth))]
    async fn delete(&self, auth: &AuthContext, id: T::Id) -> Result<(), ServiceError> {
        auth.require(Self::WRITE)?;
        self.inner()
            .delete(id.clone())
            .await
            .map_err(|e| ServiceError::classify(Self::SERVICE, "delete", &id, e))
    }
}
