use crate::core::error::AppError;
use crate::core::types::{ErrorCategory, LogLevel};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Value update for a single output slot. `NoChange` tells the host engine to
/// leave the bound property alone for this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutputUpdate {
    Set(Value),
    NoChange,
}

impl OutputUpdate {
    pub fn is_no_change(&self) -> bool {
        matches!(self, OutputUpdate::NoChange)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            OutputUpdate::Set(value) => Some(value),
            OutputUpdate::NoChange => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            OutputUpdate::Set(value) => Some(value),
            OutputUpdate::NoChange => None,
        }
    }
}

impl From<Value> for OutputUpdate {
    fn from(value: Value) -> Self {
        OutputUpdate::Set(value)
    }
}

pub type HandlerOutput = Result<Vec<OutputUpdate>, AppError>;

/// A resolved callback handler: an async callable over the invocation
/// context, returning one update per output slot.
pub type BoxedHandler = Arc<dyn Fn(InvocationContext) -> BoxFuture<'static, HandlerOutput> + Send + Sync>;

/// Per-invocation firing context supplied by the host engine.
///
/// `args` holds one value per input in declared order; `changed` holds the
/// indices of the inputs whose change fired this invocation, which is all the
/// state fan-in arbitration needs (no shared mutable state).
#[derive(Clone, Debug)]
pub struct InvocationContext {
    pub args: Vec<Value>,
    pub changed: BTreeSet<usize>,
    pub session_id: String,
    pub logger: Option<CallbackLogger>,
}

impl InvocationContext {
    pub fn new(args: Vec<Value>) -> Self {
        InvocationContext {
            args,
            changed: BTreeSet::new(),
            session_id: "default".to_string(),
            logger: None,
        }
    }

    /// Record which input positions fired this invocation.
    pub fn with_changed<I: IntoIterator<Item = usize>>(mut self, changed: I) -> Self {
        self.changed = changed.into_iter().collect();
        self
    }

    /// Scope this invocation to a browser session.
    pub fn with_session<T: Into<String>>(mut self, session_id: T) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// The buffering logger injected by the logging transform. Erroring here
    /// rather than returning a dummy keeps a missing `log` option loud.
    pub fn logger(&self) -> Result<CallbackLogger, AppError> {
        self.logger.clone().ok_or_else(|| {
            AppError::new(
                ErrorCategory::ValidationError,
                "handler requested a logger but the callback was not declared with the log option",
            )
            .with_code("CBK-LOG-001")
        })
    }
}

/// Buffers leveled records during one handler call. Clones share the buffer,
/// so the wrapper that created the logger can render what the handler wrote.
#[derive(Clone, Debug, Default)]
pub struct CallbackLogger {
    records: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl CallbackLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info<T: Into<String>>(&self, message: T) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn warning<T: Into<String>>(&self, message: T) {
        self.push(LogLevel::Warning, message.into());
    }

    pub fn error<T: Into<String>>(&self, message: T) {
        self.push(LogLevel::Error, message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().expect("log buffer poisoned").is_empty()
    }

    /// Render the buffered records, one `LEVEL: message` line per record, in
    /// emission order.
    pub fn render(&self) -> String {
        let records = self.records.lock().expect("log buffer poisoned");
        records
            .iter()
            .map(|(level, message)| format!("{}: {}", level, message))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&self, level: LogLevel, message: String) {
        self.records.lock().expect("log buffer poisoned").push((level, message));
    }
}

/// Box an async closure into the handler calling convention.
pub fn handler<F, Fut>(f: F) -> BoxedHandler
where
    F: Fn(InvocationContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerOutput> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}
