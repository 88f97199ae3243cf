use crate::resource::ParamSpec;
use std::collections::HashMap;
use tracing::debug;

/// Named path-parameter declarations, keyed by parameter name.
pub type ParamMap = HashMap<String, ParamSpec>;

/// Merge a resource's own declarations into the scope inherited from its
/// ancestors, producing the scope visible to the resource and its children.
///
/// The merge is additive: inherited names are never removed going deeper.
/// If a name is redeclared with a different constraint, the innermost
/// declaration wins for the segments it owns.
pub fn merge_scope(ancestors: &ParamMap, own: &ParamMap, resolved_path: &str) -> ParamMap {
    let mut scope = ancestors.clone();
    for (name, spec) in own {
        if let Some(previous) = scope.insert(name.clone(), *spec) {
            if previous != *spec {
                debug!(
                    parameter = %name,
                    path = %resolved_path,
                    outer = %previous.kind,
                    inner = %spec.kind,
                    "parameter redeclared with a different type; innermost declaration wins"
                );
            }
        }
    }
    scope
}

/// Fold a resource's declarations into the whole-tree aggregated map.
///
/// Collection follows traversal order, so a name declared at several nodes
/// ends up with the declaration of the last node visited.
pub fn collect(aggregated: &mut ParamMap, own: &ParamMap) {
    for (name, spec) in own {
        aggregated.insert(name.clone(), *spec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ParamType;

    fn spec(kind: ParamType) -> ParamSpec {
        ParamSpec::new(kind)
    }

    #[test]
    fn test_merge_is_additive() {
        let mut ancestors = ParamMap::new();
        ancestors.insert("userId".to_string(), spec(ParamType::Number));

        let mut own = ParamMap::new();
        own.insert("fileId".to_string(), spec(ParamType::Integer));

        let scope = merge_scope(&ancestors, &own, "/users/{userId}/files/{fileId}");
        assert_eq!(scope.len(), 2);
        assert_eq!(scope["userId"], spec(ParamType::Number));
        assert_eq!(scope["fileId"], spec(ParamType::Integer));
    }

    #[test]
    fn test_innermost_redeclaration_wins() {
        let mut ancestors = ParamMap::new();
        ancestors.insert("id".to_string(), spec(ParamType::String));

        let mut own = ParamMap::new();
        own.insert("id".to_string(), spec(ParamType::Integer));

        let scope = merge_scope(&ancestors, &own, "/things/{id}");
        assert_eq!(scope["id"], spec(ParamType::Integer));
    }

    #[test]
    fn test_collect_accumulates_across_nodes() {
        let mut aggregated = ParamMap::new();

        let mut first = ParamMap::new();
        first.insert("userId".to_string(), spec(ParamType::Number));
        collect(&mut aggregated, &first);

        let mut second = ParamMap::new();
        second.insert("orderId".to_string(), spec(ParamType::Integer));
        collect(&mut aggregated, &second);

        assert_eq!(aggregated.len(), 2);
        assert_eq!(aggregated["userId"], spec(ParamType::Number));
        assert_eq!(aggregated["orderId"], spec(ParamType::Integer));
    }
}
