use crate::dispatch::{CompiledDispatcher, CompiledRoute, Middleware};
use crate::params::{self, ParamMap};
use crate::pattern::PathPattern;
use crate::resource::{Operation, Resource};
use tracing::debug;

/// Compile a resource tree into a dispatcher.
///
/// Resources are compiled in declaration order, depth-first, operations
/// before children, and the handler factory is invoked exactly once per
/// declared operation in that order. A factory that returns `None`
/// suppresses the route: no handler is registered for that method and path.
///
/// Compilation never fails. An empty slice produces a dispatcher that
/// matches nothing.
pub fn compile<F>(resources: &[Resource], mut factory: F) -> CompiledDispatcher
where
    F: FnMut(&Operation, &str) -> Option<Middleware>,
{
    let mut routes = Vec::new();
    let mut aggregated = ParamMap::new();
    let root_scope = ParamMap::new();

    for resource in resources {
        compile_resource(
            resource,
            "",
            &root_scope,
            &mut aggregated,
            &mut routes,
            &mut factory,
        );
    }

    CompiledDispatcher::new(routes, aggregated)
}

/// Compile one resource node: bind its operations at the resolved path,
/// then recurse into children with the path and parameter scope threaded
/// down.
fn compile_resource<F>(
    resource: &Resource,
    ancestor_path: &str,
    ancestor_params: &ParamMap,
    aggregated: &mut ParamMap,
    routes: &mut Vec<CompiledRoute>,
    factory: &mut F,
) where
    F: FnMut(&Operation, &str) -> Option<Middleware>,
{
    // Exact concatenation. Whatever slash convention the source
    // description used is the contract.
    let resolved_path = format!("{ancestor_path}{}", resource.path);
    let scope = params::merge_scope(ancestor_params, &resource.parameters, &resolved_path);
    params::collect(aggregated, &resource.parameters);

    let mut seen_methods = Vec::new();
    for operation in &resource.operations {
        if seen_methods.contains(&operation.method) {
            debug!(
                method = %operation.method,
                path = %resolved_path,
                "method redeclared within one resource; first declaration wins at dispatch"
            );
        } else {
            seen_methods.push(operation.method);
        }
        if let Some(route) = bind_operation(operation, &resolved_path, &scope, factory) {
            routes.push(route);
        }
    }

    for child in &resource.children {
        compile_resource(child, &resolved_path, &scope, aggregated, routes, factory);
    }
}

/// Ask the handler factory for this operation's middleware and, if it
/// provides one, bind it at the resolved path.
fn bind_operation<F>(
    operation: &Operation,
    resolved_path: &str,
    scope: &ParamMap,
    factory: &mut F,
) -> Option<CompiledRoute>
where
    F: FnMut(&Operation, &str) -> Option<Middleware>,
{
    let Some(middleware) = factory(operation, resolved_path) else {
        debug!(method = %operation.method, path = %resolved_path, "operation suppressed by handler factory");
        return None;
    };

    debug!(method = %operation.method, path = %resolved_path, "registering route");
    Some(CompiledRoute {
        method: operation.method,
        pattern: PathPattern::compile(resolved_path, scope),
        middleware,
    })
}
