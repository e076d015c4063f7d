//! The [`Call`] type: one registered unit of scheduled work.

use serde_json::Value;

use weft_core::CallError;
use weft_spec::AccessNode;

/// A call's precondition: full state in, go/no-go out.
///
/// A `false` result is a silent skip, never a fault; an `Err` is a fault
/// contained by the run's error path.
pub type Precondition = Box<dyn Fn(&Value) -> Result<bool, CallError>>;

/// A call's body: declared input slice in, declared outputs out.
///
/// `None` (or a `Null` value) is an empty output set. A concrete output
/// must be a mapping keyed by the call's declared writes.
pub type Body = Box<dyn FnMut(Value) -> Result<Option<Value>, CallError>>;

/// One registered unit of scheduled work.
///
/// Carries the call's name, its declared input and output access specs,
/// an optional precondition, and the body. The two anchors a schedule is
/// seeded with are calls without a body; they occupy a slot in every
/// order but execute nothing.
pub struct Call {
    pub(crate) name: String,
    pub(crate) reads: AccessNode,
    pub(crate) writes: AccessNode,
    pub(crate) precondition: Option<Precondition>,
    pub(crate) body: Option<Body>,
}

impl Call {
    /// A call with the given name and body, reading the whole state and
    /// declaring no writes. Narrow the contract with
    /// [`with_reads`](Call::with_reads) / [`with_writes`](Call::with_writes).
    pub fn new(
        name: impl Into<String>,
        body: impl FnMut(Value) -> Result<Option<Value>, CallError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            reads: AccessNode::Whole,
            writes: AccessNode::branch(),
            precondition: None,
            body: Some(Box::new(body)),
        }
    }

    /// A bodiless anchor call.
    pub(crate) fn anchor(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reads: AccessNode::Whole,
            writes: AccessNode::branch(),
            precondition: None,
            body: None,
        }
    }

    /// Replace the input access spec.
    pub fn with_reads(mut self, spec: AccessNode) -> Self {
        self.reads = spec;
        self
    }

    /// Replace the output access spec.
    pub fn with_writes(mut self, spec: AccessNode) -> Self {
        self.writes = spec;
        self
    }

    /// Gate the call on a precondition over the full state.
    pub fn with_precondition(
        mut self,
        precondition: impl Fn(&Value) -> Result<bool, CallError> + 'static,
    ) -> Self {
        self.precondition = Some(Box::new(precondition));
        self
    }

    /// The call's name, used in error reports and build diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this call is an executable registration (anchors are not).
    pub fn is_executable(&self) -> bool {
        self.body.is_some()
    }
}

impl std::fmt::Debug for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Call")
            .field("name", &self.name)
            .field("reads", &self.reads)
            .field("writes", &self.writes)
            .field("precondition", &self.precondition.as_ref().map(|_| "<fn>"))
            .field("body", &self.body.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
