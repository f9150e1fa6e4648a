//! Schema fragments and startup composition.
//!
//! Each backend domain owns one [`SchemaFragment`] declaring its root-level
//! operations. Fragments are combined exactly once, at process start, into a
//! [`ComposedSchema`]; composition fails fast if two fragments claim the same
//! root-level operation name. Nested per-domain type names never collide
//! because they live under domain-scoped containers, not the shared root.

use std::collections::HashMap;

/// Whether an operation reads or writes. Drives the fail-soft/fail-loud
/// policy: reads degrade to empty results under persistent downstream
/// failure, writes always surface their classified error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// Declared shape of an operation's result.
///
/// The gateway substitutes the shape's empty value when a read fails after
/// retries: `List` becomes an empty array, `Nullable` becomes null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// Zero or more records; degrades to `[]`.
    List,
    /// A single record that may legitimately be absent; degrades to `null`.
    Nullable,
    /// A single record that must be present on success.
    Object,
    /// A bare scalar (e.g. a confirmation string).
    Scalar,
}

impl ResultShape {
    /// The value substituted when a read with this shape degrades.
    ///
    /// `None` means the shape has no empty form and the failure must be
    /// surfaced instead.
    #[must_use]
    pub fn empty_value(self) -> Option<serde_json::Value> {
        match self {
            Self::List => Some(serde_json::Value::Array(Vec::new())),
            Self::Nullable => Some(serde_json::Value::Null),
            Self::Object | Self::Scalar => None,
        }
    }
}

/// A named, typed unit of work in the composed schema.
///
/// Identity is (domain, name). Immutable once the schema is composed.
#[derive(Debug, Clone, Copy)]
pub struct OperationDef {
    /// Root-level operation name, unique across the composed schema.
    pub name: &'static str,
    pub kind: OperationKind,
    pub shape: ResultShape,
}

impl OperationDef {
    /// Declares a query operation with the given result shape.
    #[must_use]
    pub fn query(name: &'static str, shape: ResultShape) -> Self {
        Self {
            name,
            kind: OperationKind::Query,
            shape,
        }
    }

    /// Declares a mutation operation with the given result shape.
    #[must_use]
    pub fn mutation(name: &'static str, shape: ResultShape) -> Self {
        Self {
            name,
            kind: OperationKind::Mutation,
            shape,
        }
    }
}

/// A named collection of operations owned by one backend domain.
#[derive(Debug, Clone)]
pub struct SchemaFragment {
    /// Owning domain (e.g. `"activity"`, `"analytics"`).
    pub domain: &'static str,
    /// Root-level operations this fragment contributes.
    pub operations: Vec<OperationDef>,
}

/// Error raised when fragment composition fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    /// Two fragments declared the same root-level operation name.
    #[error(
        "duplicate root operation `{name}`: declared by both `{first_domain}` and `{second_domain}`"
    )]
    DuplicateOperation {
        name: &'static str,
        first_domain: &'static str,
        second_domain: &'static str,
    },
    /// A single fragment declared the same operation twice.
    #[error("fragment `{domain}` declares operation `{name}` more than once")]
    DuplicateWithinFragment {
        domain: &'static str,
        name: &'static str,
    },
}

/// Entry in the composed schema: an operation plus its owning domain.
#[derive(Debug, Clone)]
pub struct BoundOperation {
    pub def: OperationDef,
    /// Domain whose resolver service handles this operation.
    pub domain: &'static str,
}

/// The single addressable namespace produced by merging all fragments.
///
/// Built once at startup and immutable afterwards. Operations are looked up
/// by name, never by position.
#[derive(Debug, Clone)]
pub struct ComposedSchema {
    operations: HashMap<&'static str, BoundOperation>,
}

impl ComposedSchema {
    /// Merges each fragment's root-level operations into one namespace.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::DuplicateOperation`] naming the conflict
    /// if two fragments declare the same root-level operation name, or
    /// [`CompositionError::DuplicateWithinFragment`] if a fragment repeats
    /// itself. Callers are expected to abort startup on either.
    pub fn compose(fragments: Vec<SchemaFragment>) -> Result<Self, CompositionError> {
        let mut operations: HashMap<&'static str, BoundOperation> = HashMap::new();

        for fragment in fragments {
            tracing::debug!(
                domain = fragment.domain,
                operations = fragment.operations.len(),
                "registering schema fragment"
            );
            for def in fragment.operations {
                if let Some(existing) = operations.get(def.name) {
                    if existing.domain == fragment.domain {
                        return Err(CompositionError::DuplicateWithinFragment {
                            domain: fragment.domain,
                            name: def.name,
                        });
                    }
                    return Err(CompositionError::DuplicateOperation {
                        name: def.name,
                        first_domain: existing.domain,
                        second_domain: fragment.domain,
                    });
                }
                operations.insert(
                    def.name,
                    BoundOperation {
                        def,
                        domain: fragment.domain,
                    },
                );
            }
        }

        Ok(Self { operations })
    }

    /// Looks up an operation by its root-level name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoundOperation> {
        self.operations.get(name)
    }

    /// Number of root-level operations in the composed namespace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// True when no fragment contributed any operation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Iterates over all bound operations in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &BoundOperation> {
        self.operations.values()
    }
}
