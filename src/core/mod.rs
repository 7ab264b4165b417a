pub mod blueprint;
pub mod component;
pub mod dependency;
pub mod error;
pub mod invocation;
pub mod registry;
pub mod store;
pub mod transform;
pub mod types;

pub use blueprint::{CallbackBlueprint, CallbackOptions};
pub use component::{ComponentHandle, HiddenComponent};
pub use dependency::{
    input, output, serverside_output, state, trigger, ComponentRef, DependencyItem,
    DependencySpec,
};
pub use error::{AppError, DefaultErrorReporter, ErrorReporter};
pub use invocation::{
    handler, BoxedHandler, CallbackLogger, HandlerOutput, InvocationContext, OutputUpdate,
};
pub use registry::{
    callback, clientside_callback, default_registry, BlueprintRegistry, CallbackHost,
    Registration, Resolution,
};
pub use store::{CacheToken, MemoryStore, StoreError, ValueStore};
pub use types::*;
