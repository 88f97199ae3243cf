use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// One node of the API description.
///
/// A resource contributes a path segment relative to its parent, declares
/// zero or more operations and path parameters, and may nest child
/// resources. The tree is built once from the source description and is
/// never mutated by the compiler.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Resource {
    /// Path segment relative to the parent resource (empty string allowed).
    pub path: String,
    /// Operations handled at this resource, unique by method.
    pub operations: Vec<Operation>,
    /// Path parameters declared here, visible to this node and descendants.
    pub parameters: HashMap<String, ParamSpec>,
    /// Child resources nested under this node's resolved path.
    pub children: Vec<Resource>,
}

/// One HTTP method handled at a resource.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Operation {
    pub method: Method,
}

/// Closed set of HTTP verbs the compiler registers routes for.
///
/// Parsing is case-insensitive; the canonical form is lower-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Head => "head",
            Method::Options => "options",
            Method::Trace => "trace",
        }
    }

    /// Returns true if this verb matches an incoming request method.
    pub fn matches(&self, method: &axum::http::Method) -> bool {
        self.as_str().eq_ignore_ascii_case(method.as_str())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verb outside the supported set.
#[derive(Debug, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "patch" => Ok(Method::Patch),
            "delete" => Ok(Method::Delete),
            "head" => Ok(Method::Head),
            "options" => Ok(Method::Options),
            "trace" => Ok(Method::Trace),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Type constraint for a named path parameter.
///
/// The compiler treats the constraint as opaque; it is forwarded to the
/// path matcher and exposed through the aggregated parameter map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
        };
        f.write_str(s)
    }
}

/// A path parameter declaration.
///
/// Accepts both the shorthand form (`userId: number`) and the expanded form
/// (`userId: { type: number }`) in source descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub kind: ParamType,
}

impl ParamSpec {
    pub fn new(kind: ParamType) -> Self {
        Self { kind }
    }
}

impl<'de> Deserialize<'de> for ParamSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bare(ParamType),
            Full {
                #[serde(rename = "type")]
                kind: ParamType,
            },
        }

        let (Repr::Bare(kind) | Repr::Full { kind }) = Repr::deserialize(deserializer)?;
        Ok(ParamSpec { kind })
    }
}

/// Top-level resource list as supplied by an API description.
///
/// Deserialization is deliberately forgiving at the top level: any
/// non-sequence value (null, scalar, map) yields an empty tree, so
/// compilation always has something to work with. Malformed *elements*
/// inside a sequence are still errors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceTree(pub Vec<Resource>);

impl std::ops::Deref for ResourceTree {
    type Target = [Resource];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Resource>> for ResourceTree {
    fn from(resources: Vec<Resource>) -> Self {
        Self(resources)
    }
}

impl<'de> Deserialize<'de> for ResourceTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TreeVisitor;

        impl<'de> Visitor<'de> for TreeVisitor {
            type Value = ResourceTree;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a sequence of resources (any other value is treated as empty)")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut resources = Vec::new();
                while let Some(resource) = seq.next_element::<Resource>()? {
                    resources.push(resource);
                }
                Ok(ResourceTree(resources))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(ResourceTree::default())
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ResourceTree::default())
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ResourceTree::default())
            }

            fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
                Ok(ResourceTree::default())
            }

            fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
                Ok(ResourceTree::default())
            }

            fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
                Ok(ResourceTree::default())
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
                Ok(ResourceTree::default())
            }

            fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
                Ok(ResourceTree::default())
            }
        }

        deserializer.deserialize_any(TreeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_deserialization() {
        let yaml = r#"
- path: /users
  operations:
    - method: GET
    - method: post
  children:
    - path: /{userId}
      parameters:
        userId: number
      operations:
        - method: get
"#;

        let tree: ResourceTree = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(tree.len(), 1);

        let users = &tree[0];
        assert_eq!(users.path, "/users");
        assert_eq!(users.operations.len(), 2);
        assert_eq!(users.operations[0].method, Method::Get);
        assert_eq!(users.operations[1].method, Method::Post);

        let child = &users.children[0];
        assert_eq!(child.path, "/{userId}");
        assert_eq!(
            child.parameters["userId"],
            ParamSpec::new(ParamType::Number)
        );
    }

    #[test]
    fn test_method_case_insensitive() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Delete".parse::<Method>().unwrap(), Method::Delete);
        assert!("brew".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_canonical_lowercase() {
        let json = serde_json::to_string(&Method::Options).unwrap();
        assert_eq!(json, "\"options\"");
        assert_eq!(Method::Patch.to_string(), "patch");
    }

    #[test]
    fn test_param_spec_expanded_form() {
        let yaml = r#"
path: /files
parameters:
  fileId:
    type: integer
"#;
        let resource: Resource = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            resource.parameters["fileId"],
            ParamSpec::new(ParamType::Integer)
        );
    }

    #[test]
    fn test_non_sequence_tree_is_empty() {
        let tree: ResourceTree = serde_json::from_value(serde_json::Value::Null).unwrap();
        assert!(tree.is_empty());

        let tree: ResourceTree = serde_yaml::from_str("just a string").unwrap();
        assert!(tree.is_empty());

        let tree: ResourceTree = serde_json::from_str(r#"{"unexpected": "shape"}"#).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_resource_defaults() {
        let resource: Resource = serde_yaml::from_str("path: /ping").unwrap();
        assert!(resource.operations.is_empty());
        assert!(resource.parameters.is_empty());
        assert!(resource.children.is_empty());
    }
}
