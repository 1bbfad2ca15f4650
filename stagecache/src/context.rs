//! Query execution context used to tag batch log records.

/// Identifiers of the query step a cache machine is serving.
///
/// Only consulted for observability; a missing context produces empty tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Context {
    token: u32,
    step: u32,
    substep: u32,
}

impl Context {
    /// Create a context for the given query token, step, and substep.
    pub fn new(token: u32, step: u32, substep: u32) -> Self {
        Self {
            token,
            step,
            substep,
        }
    }

    pub fn token(&self) -> u32 {
        self.token
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn substep(&self) -> u32 {
        self.substep
    }
}

/// Rendered context tags for a log record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ContextTags {
    pub query_id: String,
    pub step: String,
    pub substep: String,
}

impl ContextTags {
    pub(crate) fn from_context(ctx: Option<&Context>) -> Self {
        match ctx {
            Some(ctx) => Self {
                query_id: ctx.token.to_string(),
                step: ctx.step.to_string(),
                substep: ctx.substep.to_string(),
            },
            None => Self::default(),
        }
    }
}

/// Emit one batch-flow record on the `batch_logger` target.
pub(crate) fn trace_batch(
    ctx: Option<&Context>,
    info: &str,
    message_id: &str,
    rows: usize,
    tier: &str,
) {
    let tags = ContextTags::from_context(ctx);
    tracing::trace!(
        target: crate::logging::BATCH_LOG_TARGET,
        query_id = %tags.query_id,
        step = %tags.step,
        substep = %tags.substep,
        info,
        message_id,
        rows,
        tier,
        "batch"
    );
}
