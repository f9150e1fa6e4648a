/// Per-request context carrying the caller's forwarded credential and the
/// originating screen tag used for downstream personalization.
///
/// Created once at the start of each inbound call from forwarded headers and
/// passed by reference into every resolver and adapter invocation. Never
/// persisted and never shared across calls.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request identifier for log correlation (`x-request-id`).
    pub request_id: String,
    /// Opaque forwarded credential (`Authorization` header). The gateway
    /// never inspects it; downstream services enforce it.
    pub authorization: Option<String>,
    /// Originating screen/feature tag (`x-screen` header), forwarded to the
    /// analytics backend for personalization.
    pub screen: Option<String>,
}

impl RequestContext {
    /// Creates a context with the given request id and no credential.
    #[must_use]
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            authorization: None,
            screen: None,
        }
    }

    /// Attaches the opaque forwarded credential.
    #[must_use]
    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.authorization = Some(authorization.into());
        self
    }

    /// Attaches the originating screen tag.
    #[must_use]
    pub fn with_screen(mut self, screen: impl Into<String>) -> Self {
        self.screen = Some(screen.into());
        self
    }
}
