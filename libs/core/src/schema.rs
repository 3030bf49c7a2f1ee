//! Service schemas: method descriptors, message shapes, payload validation.
//!
//! A schema describes which methods a service exposes and what their request
//! and response payloads look like. Registries are built in code with the
//! builder methods, or loaded from a JSON schema file:
//!
//! ```json
//! {
//!   "services": [
//!     {
//!       "name": "echo",
//!       "methods": [
//!         {
//!           "name": "Echo",
//!           "input": { "fields": { "text": { "kind": "text" } } },
//!           "output": { "fields": { "text": { "kind": "text" } } }
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed schema: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Why a payload failed validation against a [`MessageShape`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("unexpected field '{0}'")]
    UnknownField(String),

    #[error("field '{field}' expects {expected}")]
    WrongKind { field: String, expected: FieldKind },
}

/// JSON value kind a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Text,
    /// Accepts any JSON value.
    Any,
}

impl FieldKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Int => value.is_i64() || value.is_u64(),
            FieldKind::Float => value.is_number(),
            FieldKind::Text => value.is_string(),
            FieldKind::Any => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Text => "text",
            FieldKind::Any => "any",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a message shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: FieldKind,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: true,
        }
    }

    pub fn optional(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
        }
    }
}

/// The shape of a request or response payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageShape {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
}

impl MessageShape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field (builder style, for in-code schemas)
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), FieldSpec::new(kind));
        self
    }

    /// Add an optional field
    pub fn optional_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), FieldSpec::optional(kind));
        self
    }

    /// Check a payload against this shape.
    ///
    /// Required fields must be present and non-null, present fields must
    /// match their declared kind, and undeclared fields are rejected.
    pub fn validate(&self, payload: &Value) -> Result<(), ShapeError> {
        let object = payload.as_object().ok_or(ShapeError::NotAnObject)?;

        for (name, spec) in &self.fields {
            match object.get(name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(ShapeError::MissingField(name.clone()));
                    }
                }
                Some(value) => {
                    if !spec.kind.matches(value) {
                        return Err(ShapeError::WrongKind {
                            field: name.clone(),
                            expected: spec.kind,
                        });
                    }
                }
            }
        }

        for name in object.keys() {
            if !self.fields.contains_key(name) {
                return Err(ShapeError::UnknownField(name.clone()));
            }
        }

        Ok(())
    }
}

/// A resolved service method: names plus input/output shapes.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    service: String,
    name: String,
    input: MessageShape,
    output: MessageShape,
}

impl MethodDescriptor {
    pub fn new(
        service: impl Into<String>,
        name: impl Into<String>,
        input: MessageShape,
        output: MessageShape,
    ) -> Self {
        Self {
            service: service.into(),
            name: name.into(),
            input,
            output,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `service.method` form, as used on the command line.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.service, self.name)
    }

    pub fn input(&self) -> &MessageShape {
        &self.input
    }

    pub fn output(&self) -> &MessageShape {
        &self.output
    }
}

/// A service and the methods it exposes.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    name: String,
    methods: HashMap<String, MethodDescriptor>,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    /// Add a method (builder style)
    pub fn method(
        mut self,
        name: impl Into<String>,
        input: MessageShape,
        output: MessageShape,
    ) -> Self {
        let name = name.into();
        let descriptor = MethodDescriptor::new(self.name.clone(), name.clone(), input, output);
        self.methods.insert(name, descriptor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(name)
    }
}

/// Set of known services, the dispatch layer's schema provider.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    services: HashMap<String, ServiceDescriptor>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, service: ServiceDescriptor) {
        self.services.insert(service.name().to_string(), service);
    }

    pub fn find_service(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.get(name)
    }

    /// Resolve a `(service, method)` pair to its descriptor.
    pub fn resolve(&self, service: &str, method: &str) -> Option<&MethodDescriptor> {
        self.services.get(service)?.find_method(method)
    }

    /// Load a registry from JSON schema text.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let file: SchemaFile = serde_json::from_str(text)?;
        let mut registry = Self::new();
        for service in file.services {
            let mut descriptor = ServiceDescriptor::new(service.name);
            for method in service.methods {
                descriptor = descriptor.method(method.name, method.input, method.output);
            }
            registry.register(descriptor);
        }
        Ok(registry)
    }

    /// Load a registry from a JSON schema file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

// On-disk schema representation; flattened into descriptors on load.

#[derive(Deserialize)]
struct SchemaFile {
    services: Vec<ServiceFile>,
}

#[derive(Deserialize)]
struct ServiceFile {
    name: String,
    #[serde(default)]
    methods: Vec<MethodFile>,
}

#[derive(Deserialize)]
struct MethodFile {
    name: String,
    #[serde(default)]
    input: MessageShape,
    #[serde(default)]
    output: MessageShape,
}
