//! # Generic Messages
//!
//! Message types exchanged between a [`ResourceClient`](crate::ResourceClient) and its
//! [`ResourceActor`](crate::ResourceActor).

use crate::entity::OwnedEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Request sent to a service's actor.
///
/// The variants follow the inbound REST surface of a service: `Create` (POST), `Get` and
/// `List` (GET), `Update` (PATCH), `Delete` (DELETE), plus `Action` for entity-specific
/// operations such as status toggles or detaching a foreign reference, and `Shutdown`, which
/// stops the actor even when peers still hold clients to it.
#[derive(Debug)]
pub enum ResourceRequest<T: OwnedEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        filter: Option<T::Filter>,
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
    Shutdown,
}
