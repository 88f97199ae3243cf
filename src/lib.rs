// Library exports for the resource-tree dispatcher compiler

pub mod compiler;
pub mod dispatch;
pub mod params;
pub mod pattern;
pub mod resource;

pub use compiler::compile;
pub use dispatch::{
    middleware_fn, CompiledDispatcher, Dispatch, DispatcherService, Middleware, RouteFlow,
};
pub use params::ParamMap;
pub use pattern::{ParamValue, PathParams, PathPattern};
pub use resource::{Method, Operation, ParamSpec, ParamType, Resource, ResourceTree, UnknownMethod};
