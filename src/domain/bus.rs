//! In-process synchronous event bus.
//!
//! Dispatch is keyed by the concrete event type and runs on the publisher's
//! task; there is no queue, no persistence and no retry. Handlers for one
//! event type run in registration order.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::marker::PhantomData;

use futures::future::BoxFuture;
use sea_orm::DatabaseTransaction;
use tracing::{debug, warn};

use super::events::DomainEvent;
use crate::services::ServiceError;

/// Handles one concrete event type.
///
/// Handlers receive the publisher's open transaction when one exists, so
/// follow-up writes land in the same commit scope and roll back with it.
#[async_trait::async_trait]
pub trait EventHandler<E: DomainEvent>: Send + Sync {
    async fn handle(
        &self,
        event: &E,
        session: Option<&DatabaseTransaction>,
    ) -> Result<(), ServiceError>;
}

trait ErasedHandler: Send + Sync {
    fn call<'a>(
        &'a self,
        event: &'a (dyn Any + Send + Sync),
        session: Option<&'a DatabaseTransaction>,
    ) -> BoxFuture<'a, Result<(), ServiceError>>;
}

struct Adapter<E, H> {
    handler: H,
    event: PhantomData<fn(E)>,
}

impl<E, H> ErasedHandler for Adapter<E, H>
where
    E: DomainEvent,
    H: EventHandler<E>,
{
    fn call<'a>(
        &'a self,
        event: &'a (dyn Any + Send + Sync),
        session: Option<&'a DatabaseTransaction>,
    ) -> BoxFuture<'a, Result<(), ServiceError>> {
        Box::pin(async move {
            // The registry is keyed by TypeId, so the downcast only fails if
            // the bus itself mixed up its tables.
            match event.downcast_ref::<E>() {
                Some(event) => self.handler.handle(event, session).await,
                None => Err(ServiceError::Internal(anyhow::anyhow!(
                    "event type mismatch in bus dispatch"
                ))),
            }
        })
    }
}

struct RegisteredHandler {
    name: &'static str,
    inner: Box<dyn ErasedHandler>,
}

/// Type-keyed handler registry.
///
/// Registration takes `&mut self` and happens while the application is being
/// wired, before the bus is shared; afterwards the bus is read-only.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<TypeId, Vec<RegisteredHandler>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<E, H>(&mut self, handler: H)
    where
        E: DomainEvent,
        H: EventHandler<E> + 'static,
    {
        self.handlers
            .entry(TypeId::of::<E>())
            .or_default()
            .push(RegisteredHandler {
                name: type_name::<H>(),
                inner: Box::new(Adapter {
                    handler,
                    event: PhantomData,
                }),
            });
    }

    /// Dispatch `event` to its subscribers in registration order, stopping
    /// at the first failure. The error propagates unchanged, so a publisher
    /// holding `session` rolls the surrounding transaction back.
    pub async fn publish<E: DomainEvent>(
        &self,
        event: &E,
        session: Option<&DatabaseTransaction>,
    ) -> Result<(), ServiceError> {
        let Some(registered) = self.handlers.get(&TypeId::of::<E>()) else {
            return Ok(());
        };

        for handler in registered {
            debug!(
                event = event.name(),
                handler = handler.name,
                "Dispatching event"
            );
            if let Err(err) = handler.inner.call(event, session).await {
                warn!(
                    event = event.name(),
                    handler = handler.name,
                    error = %err,
                    "Event handler failed, aborting dispatch"
                );
                return Err(err);
            }
        }

        Ok(())
    }

    /// Like [`Self::publish`], but every handler runs even after a failure.
    /// Failures are logged and handed back for observability; none
    /// propagate.
    pub async fn publish_best_effort<E: DomainEvent>(
        &self,
        event: &E,
        session: Option<&DatabaseTransaction>,
    ) -> Vec<(&'static str, ServiceError)> {
        let Some(registered) = self.handlers.get(&TypeId::of::<E>()) else {
            return Vec::new();
        };

        let mut failures = Vec::new();
        for handler in registered {
            debug!(
                event = event.name(),
                handler = handler.name,
                "Dispatching event"
            );
            if let Err(err) = handler.inner.call(event, session).await {
                warn!(
                    event = event.name(),
                    handler = handler.name,
                    error = %err,
                    "Event handler failed, continuing dispatch"
                );
                failures.push((handler.name, err));
            }
        }

        failures
    }
}
