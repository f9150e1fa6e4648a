//! Operation routing: dispatches each named operation to its domain's
//! resolver service via the composed schema, and applies the fail-soft /
//! fail-loud policy the schema declares.
//!
//! Reads whose declared shape has an empty form (`List`, `Nullable`)
//! degrade to that form when the downstream stays broken after retries; a
//! validation failure is a caller error and stays loud even on reads, and
//! mutations always surface their classified error.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use fitgate_core::{ComposedSchema, ErrorKind, OperationDef, OperationKind};
use tower::util::BoxCloneSyncService;
use tower::Service;
use tracing::warn;

use super::operation::{Operation, OperationError, OperationResponse};

/// A boxed, cloneable Tower service resolving operations for one domain.
/// The `Sync` bound lets the composed pipeline live in axum handler state.
type BoxedResolver = BoxCloneSyncService<Operation, OperationResponse, OperationError>;

type BoxedFuture = Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

/// Routes operations to domain resolver services.
///
/// The composed schema maps each root-level operation name to its owning
/// domain; resolver services are registered per domain. An operation whose
/// name is absent from the schema is a caller error; a schema entry whose
/// domain has no registered service is an internal configuration error —
/// composition validation makes the latter unreachable in a correctly
/// assembled gateway.
#[derive(Clone)]
pub struct OperationRouter {
    schema: Arc<ComposedSchema>,
    services: HashMap<&'static str, BoxedResolver>,
}

impl OperationRouter {
    /// Creates a router over the composed schema with no resolvers bound.
    #[must_use]
    pub fn new(schema: Arc<ComposedSchema>) -> Self {
        Self {
            schema,
            services: HashMap::new(),
        }
    }

    /// Registers the resolver service for a domain.
    pub fn register<S>(&mut self, domain: &'static str, service: S)
    where
        S: Service<Operation, Response = OperationResponse, Error = OperationError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        self.services
            .insert(domain, BoxCloneSyncService::new(service));
    }

    /// The composed schema this router dispatches against.
    #[must_use]
    pub fn schema(&self) -> &Arc<ComposedSchema> {
        &self.schema
    }
}

impl Service<Operation> for OperationRouter {
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // All registered resolvers must be ready.
        for svc in self.services.values_mut() {
            match svc.poll_ready(cx) {
                Poll::Ready(Ok(())) => {}
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }
        }
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let bound = self.schema.get(&op.name).map(|b| (b.domain, b.def));
        match bound {
            None => {
                let name = op.name;
                Box::pin(async move { Err(OperationError::UnknownOperation { name }) })
            }
            Some((domain, def)) => match self.services.get_mut(domain) {
                Some(svc) => {
                    let name = op.name.clone();
                    let fut = svc.call(op);
                    Box::pin(async move { apply_failure_policy(fut.await, &name, def) })
                }
                None => {
                    let name = op.name;
                    Box::pin(async move { Err(OperationError::UnresolvedOperation { name }) })
                }
            },
        }
    }
}

/// Applies the declared fail-soft/fail-loud asymmetry to a resolver result.
///
/// Queries whose shape has an empty form degrade on classified downstream
/// failures; validation failures (`Invalid`) and all mutation failures are
/// surfaced.
fn apply_failure_policy(
    result: Result<OperationResponse, OperationError>,
    name: &str,
    def: OperationDef,
) -> Result<OperationResponse, OperationError> {
    match result {
        Err(OperationError::Rejected(classified))
            if def.kind == OperationKind::Query && classified.kind != ErrorKind::Invalid =>
        {
            match def.shape.empty_value() {
                Some(empty) => {
                    warn!(
                        operation = name,
                        kind = classified.kind.as_str(),
                        "read degraded to empty result after retries"
                    );
                    Ok(OperationResponse::Data(empty))
                }
                None => Err(OperationError::Rejected(classified)),
            }
        }
        other => other,
    }
}
