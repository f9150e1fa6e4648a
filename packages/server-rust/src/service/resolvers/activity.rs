//! Resolver service for the activity domain.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use fitgate_core::types::ExerciseInput;
use fitgate_core::{validate, OperationDef, RequestContext, ResultShape, SchemaFragment};
use serde_json::{Map, Value};
use tower::Service;

use super::{parse_arg, require_str, to_json};
use crate::adapters::{ActivityBackend, AdapterError};
use crate::service::classify::ErrorClassifier;
use crate::service::operation::{Operation, OperationError, OperationResponse};
use crate::service::retry::{RetryPolicy, Sleeper};

const CLASSIFIER: ErrorClassifier = ErrorClassifier::new("Activity", "Exercise");

type BoxedFuture = Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

/// Resolves the activity domain's operations against its backend.
#[derive(Clone)]
pub struct ActivityResolvers {
    backend: Arc<dyn ActivityBackend>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ActivityResolvers {
    pub const DOMAIN: &'static str = "activity";

    #[must_use]
    pub fn new(backend: Arc<dyn ActivityBackend>, retry: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            backend,
            retry,
            sleeper,
        }
    }

    /// Root-level operations this domain contributes to the composed schema.
    #[must_use]
    pub fn fragment() -> SchemaFragment {
        SchemaFragment {
            domain: Self::DOMAIN,
            operations: vec![
                OperationDef::query("exercises", ResultShape::List),
                OperationDef::query("exercise", ResultShape::Nullable),
                OperationDef::mutation("addExercise", ResultShape::Object),
                OperationDef::mutation("updateExercise", ResultShape::Object),
                OperationDef::mutation("deleteExercise", ResultShape::Scalar),
            ],
        }
    }

    async fn dispatch(self, op: Operation) -> Result<OperationResponse, OperationError> {
        match op.name.as_str() {
            "exercises" => self.exercises(&op.ctx).await,
            "exercise" => self.exercise(&op.args, &op.ctx).await,
            "addExercise" => self.add_exercise(&op.args, &op.ctx).await,
            "updateExercise" => self.update_exercise(&op.args, &op.ctx).await,
            "deleteExercise" => self.delete_exercise(&op.args, &op.ctx).await,
            other => Err(OperationError::UnresolvedOperation {
                name: other.to_string(),
            }),
        }
    }

    async fn exercises(&self, ctx: &RequestContext) -> Result<OperationResponse, OperationError> {
        let result = self
            .retry
            .execute_if(
                self.sleeper.as_ref(),
                || self.backend.list_exercises(ctx),
                AdapterError::is_transient,
            )
            .await;

        match result {
            Ok(list) => Ok(OperationResponse::Data(to_json(&list))),
            Err(raw) => Err(CLASSIFIER.classify(&raw, "fetch exercises").into()),
        }
    }

    async fn exercise(
        &self,
        args: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<OperationResponse, OperationError> {
        let id = validate_id(args)?;

        let result = self
            .retry
            .execute_if(
                self.sleeper.as_ref(),
                || self.backend.get_exercise(&id, ctx),
                AdapterError::is_transient,
            )
            .await;

        match result {
            Ok(Some(exercise)) => Ok(OperationResponse::Data(to_json(&exercise))),
            Ok(None) => Ok(OperationResponse::Data(Value::Null)),
            Err(raw) => Err(CLASSIFIER.classify(&raw, "fetch exercise").into()),
        }
    }

    async fn add_exercise(
        &self,
        args: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<OperationResponse, OperationError> {
        let input: ExerciseInput = parse_arg(args, "input")?;

        let result = self
            .retry
            .execute_if(
                self.sleeper.as_ref(),
                || self.backend.add_exercise(&input, ctx),
                AdapterError::is_transient,
            )
            .await;

        match result {
            Ok(created) => Ok(OperationResponse::Data(to_json(&created))),
            Err(raw) => Err(CLASSIFIER.classify(&raw, "add exercise").into()),
        }
    }

    async fn update_exercise(
        &self,
        args: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<OperationResponse, OperationError> {
        let id = validate_id(args)?;
        let input: ExerciseInput = parse_arg(args, "input")?;

        let result = self
            .retry
            .execute_if(
                self.sleeper.as_ref(),
                || self.backend.update_exercise(&id, &input, ctx),
                AdapterError::is_transient,
            )
            .await;

        match result {
            Ok(updated) => Ok(OperationResponse::Data(to_json(&updated))),
            Err(raw) => Err(CLASSIFIER.classify(&raw, "update exercise").into()),
        }
    }

    async fn delete_exercise(
        &self,
        args: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<OperationResponse, OperationError> {
        let id = validate_id(args)?;

        let result = self
            .retry
            .execute_if(
                self.sleeper.as_ref(),
                || self.backend.delete_exercise(&id, ctx),
                AdapterError::is_transient,
            )
            .await;

        match result {
            Ok(message) => Ok(OperationResponse::Data(Value::String(message))),
            Err(raw) => Err(CLASSIFIER.classify(&raw, "delete exercise").into()),
        }
    }
}

/// Validates the `id` argument before any downstream call.
fn validate_id(args: &Map<String, Value>) -> Result<String, OperationError> {
    let raw = require_str(args, "id")?;
    let id = validate::identifier(raw, "id").map_err(fitgate_core::ClassifiedError::from)?;
    Ok(id)
}

impl Service<Operation> for ActivityResolvers {
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let this = self.clone();
        Box::pin(this.dispatch(op))
    }
}
