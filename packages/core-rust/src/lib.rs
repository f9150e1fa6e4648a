//! `FitGate` Core — schema composition, request context, validators, and the
//! classified-error taxonomy shared by the gateway server.

pub mod context;
pub mod envelope;
pub mod error;
pub mod schema;
pub mod types;
pub mod validate;

pub use context::RequestContext;
pub use envelope::{GatewayRequest, GatewayResponse};
pub use error::{ClassifiedError, ErrorKind};
pub use schema::{
    BoundOperation, ComposedSchema, CompositionError, OperationDef, OperationKind, ResultShape,
    SchemaFragment,
};
pub use validate::{DateRange, ValidationError};
