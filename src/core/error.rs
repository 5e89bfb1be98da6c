// ============================================================================
// weak-signals - Errors
// Slot failures and the aggregated emit error
// ============================================================================

use std::fmt;

/// What a slot body returns. Any error type converts via `?`.
pub type SlotResult = anyhow::Result<()>;

// =============================================================================
// SLOT FAILURE
// =============================================================================

/// How a single slot failed.
#[derive(Debug, thiserror::Error)]
pub enum FailureKind {
    /// The slot body returned an error.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),

    /// The slot body panicked and the panic was captured.
    #[error("slot panicked: {0}")]
    Panicked(String),
}

/// One link of an [`EmitError`]: a slot that failed during dispatch.
#[derive(Debug, thiserror::Error)]
#[error("slot #{index}: {kind}")]
pub struct SlotFailure {
    /// Position of the slot in the emit snapshot.
    pub index: usize,
    #[source]
    pub kind: FailureKind,
}

impl SlotFailure {
    pub(crate) fn failed(index: usize, error: anyhow::Error) -> Self {
        Self {
            index,
            kind: FailureKind::Failed(error),
        }
    }

    pub(crate) fn panicked(index: usize, message: String) -> Self {
        Self {
            index,
            kind: FailureKind::Panicked(message),
        }
    }

    /// The slot's own error, if it returned one.
    pub fn error(&self) -> Option<&anyhow::Error> {
        match &self.kind {
            FailureKind::Failed(error) => Some(error),
            FailureKind::Panicked(_) => None,
        }
    }

    /// Whether the slot panicked rather than returning an error.
    pub fn is_panic(&self) -> bool {
        matches!(self.kind, FailureKind::Panicked(_))
    }
}

// =============================================================================
// EMIT ERROR
// =============================================================================

/// Every slot failure from one emit pass, in invocation order.
///
/// Raised only after all slots in the pass have been attempted.
#[derive(Debug)]
pub struct EmitError {
    failures: Vec<SlotFailure>,
}

impl EmitError {
    /// Build from collected failures. Returns `None` if there were none.
    pub(crate) fn from_failures(failures: Vec<SlotFailure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    /// Number of failed slots.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Always false; an `EmitError` holds at least one failure.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// The failures in invocation order.
    pub fn failures(&self) -> &[SlotFailure] {
        &self.failures
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SlotFailure> {
        self.failures.iter()
    }

    /// The earliest failure.
    pub fn first(&self) -> &SlotFailure {
        &self.failures[0]
    }

    pub fn into_failures(self) -> Vec<SlotFailure> {
        self.failures
    }
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} slot(s) failed during emit", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|f| f as &(dyn std::error::Error + 'static))
    }
}

impl<'a> IntoIterator for &'a EmitError {
    type Item = &'a SlotFailure;
    type IntoIter = std::slice::Iter<'a, SlotFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

// =============================================================================
// TESTS
// =============================================================================
