// Copyright 2025 Cowboy AI, LLC.

//! Published type definitions
//!
//! Types publish their parameter declarations, constructor and static
//! factories here once. Every registration or removal stamps the affected
//! name with a fresh revision; the reader compares those per-type stamps to
//! drop stale derived descriptors without touching unrelated ones.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as Json;

use super::declared::DeclaredParameter;
use crate::data::entity::EntityRepository;
use crate::data::factory::DataFactory;
use crate::data::Data;
use crate::errors::DomainResult;
use crate::payload::{instance, Instance, Payload};
use crate::support::data_accessor::Source;
use crate::support::enumeration::Enumeration;
use crate::value::Value;

/// Method name under which constructor parameters are declared
pub const CONSTRUCTOR: &str = "new";

/// Name of the static factory every data type gets
pub const FROM: &str = "from";

/// What kind of type a definition describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKind {
    /// Serde-backed DTO
    Data,
    /// Closed set of cases
    Enum,
    /// Persisted record looked up by identifier
    Entity,
    /// Any other constructible type
    Class,
}

/// Builds an instance from resolved named arguments
pub type Constructor = Arc<dyn Fn(IndexMap<String, Payload>) -> DomainResult<Instance> + Send + Sync>;

/// Static factory: receives the value followed by configured extra arguments
pub type StaticMethod = Arc<
    dyn for<'a> Fn(&'a DataFactory, Vec<Payload>) -> BoxFuture<'a, DomainResult<Value<Payload>>>
        + Send
        + Sync,
>;

/// Case lookup for enum definitions
#[derive(Clone)]
pub struct EnumDefinition {
    /// `(name, backing value)` per case in order
    pub cases: Vec<(String, Option<Json>)>,
    lookup: Arc<dyn Fn(&Json) -> Option<Instance> + Send + Sync>,
}

impl EnumDefinition {
    /// Case for a raw backing value (or a name, for unit enums)
    pub fn lookup(&self, raw: &Json) -> Option<Instance> {
        (self.lookup)(raw)
    }

    /// Whether cases carry backing values
    pub fn is_backed(&self) -> bool {
        self.cases.iter().any(|(_, backing)| backing.is_some())
    }
}

/// Everything the crate knows about one named type
#[derive(Clone)]
pub struct TypeDefinition {
    name: String,
    kind: TypeKind,
    type_id: Option<TypeId>,
    methods: IndexMap<String, Vec<DeclaredParameter>>,
    constructor: Option<Constructor>,
    statics: HashMap<String, StaticMethod>,
    enumeration: Option<EnumDefinition>,
    repository: Option<Arc<dyn EntityRepository>>,
}

impl fmt::Debug for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TypeDefinition {
    /// Bare definition with no methods
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_id: None,
            methods: IndexMap::new(),
            constructor: None,
            statics: HashMap::new(),
            enumeration: None,
            repository: None,
        }
    }

    /// Definition of a [`Data`] type: serde constructor plus a `from` factory
    pub fn for_data<T: Data>() -> Self {
        Self::new(T::NAME, TypeKind::Data)
            .with_type_id::<T>()
            .with_constructor_params(T::parameters())
            .with_constructor(Arc::new(construct_data::<T>))
            .with_static(FROM, data_from::<T>)
    }

    /// Definition of an [`Enumeration`]
    pub fn for_enum<E>() -> Self
    where
        E: Enumeration + Serialize,
    {
        let cases = E::cases()
            .iter()
            .map(|case| (case.name().to_string(), case.backing_value()))
            .collect();
        let lookup = Arc::new(|raw: &Json| {
            let case = if E::is_backed() {
                E::try_from_backing(raw)
            } else {
                raw.as_str().and_then(E::from_name)
            };
            case.map(instance)
        });
        let mut definition = Self::new(E::NAME, TypeKind::Enum).with_type_id::<E>();
        definition.enumeration = Some(EnumDefinition { cases, lookup });
        definition
    }

    /// Definition of an entity looked up through `repository`
    pub fn for_entity(name: impl Into<String>, repository: Arc<dyn EntityRepository>) -> Self {
        let mut definition = Self::new(name, TypeKind::Entity);
        definition.repository = Some(repository);
        definition
    }

    /// Record the Rust type behind this definition
    pub fn with_type_id<T: 'static>(mut self) -> Self {
        self.type_id = Some(TypeId::of::<T>());
        self
    }

    /// Declare constructor parameters
    pub fn with_constructor_params(self, params: Vec<DeclaredParameter>) -> Self {
        self.with_method(CONSTRUCTOR, params)
    }

    /// Declare parameters of a named method
    pub fn with_method(mut self, method: impl Into<String>, params: Vec<DeclaredParameter>) -> Self {
        self.methods.insert(method.into(), params);
        self
    }

    /// Set the constructor
    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Add or replace a static factory
    pub fn with_static<F>(mut self, method: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(&'a DataFactory, Vec<Payload>) -> BoxFuture<'a, DomainResult<Value<Payload>>>
            + Send
            + Sync
            + 'static,
    {
        self.statics.insert(method.into(), Arc::new(f));
        self
    }

    /// Registered name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Rust type id, when known
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// Raw declarations for `method`
    pub fn method(&self, method: &str) -> Option<&[DeclaredParameter]> {
        self.methods.get(method).map(Vec::as_slice)
    }

    /// Constructor, if the type can be built
    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    /// Static factory by name
    pub fn static_method(&self, method: &str) -> Option<&StaticMethod> {
        self.statics.get(method)
    }

    /// Enum cases, for enum definitions
    pub fn enumeration(&self) -> Option<&EnumDefinition> {
        self.enumeration.as_ref()
    }

    /// Lookup repository, for entity definitions
    pub fn repository(&self) -> Option<&Arc<dyn EntityRepository>> {
        self.repository.as_ref()
    }

    /// Whether an instance belongs to this type
    pub fn owns(&self, object: &Instance) -> bool {
        self.type_id == Some(object.as_any().type_id())
    }
}

fn construct_data<T: Data>(args: IndexMap<String, Payload>) -> DomainResult<Instance> {
    let json = Payload::Map(args).to_json()?;
    let value: T = serde_json::from_value(json)?;
    Ok(instance(value))
}

fn data_from<'a, T: Data>(
    factory: &'a DataFactory,
    args: Vec<Payload>,
) -> BoxFuture<'a, DomainResult<Value<Payload>>> {
    Box::pin(async move {
        let raw = args.into_iter().next().unwrap_or_else(Payload::null);
        if raw.is::<T>() {
            return Ok(Value::some(raw));
        }
        let built = match &raw {
            Payload::Map(entries) => factory.make_dynamic(T::NAME, &Source::Collection(entries)).await?,
            Payload::Object(object) => factory.make_dynamic(T::NAME, &Source::Object(object)).await?,
            other => {
                let json = other.to_json()?;
                factory.make_dynamic(T::NAME, &Source::Json(&json)).await?
            }
        };
        Ok(Value::some(Payload::Object(built)))
    })
}

#[derive(Default)]
struct Inner {
    types: HashMap<String, Arc<TypeDefinition>>,
    by_type_id: HashMap<TypeId, String>,
    revisions: HashMap<String, u64>,
}

/// Registry of published definitions
#[derive(Default)]
pub struct TypeRegistry {
    inner: RwLock<Inner>,
    revision: AtomicU64,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = inner.types.keys().cloned().collect();
        names.sort();
        f.debug_struct("TypeRegistry")
            .field("types", &names)
            .field("revision", &self.revision())
            .finish()
    }
}

/// Canonical registry key for a type name
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_start_matches("::").to_string()
}

impl TypeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Current revision; changes on every registration or removal
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Revision at which `name` last changed; 0 when it never was registered
    pub fn revision_of(&self, name: &str) -> u64 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .revisions
            .get(&normalize_name(name))
            .copied()
            .unwrap_or(0)
    }

    fn stamp(&self, inner: &mut Inner, name: String) {
        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        inner.revisions.insert(name, revision);
    }

    /// Register or replace a definition
    pub fn register(&self, definition: TypeDefinition) {
        let name = normalize_name(definition.name());
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(type_id) = definition.type_id() {
            inner.by_type_id.insert(type_id, name.clone());
        }
        inner.types.insert(name.clone(), Arc::new(definition));
        self.stamp(&mut inner, name.clone());
        tracing::debug!(type_name = %name, "type registered");
    }

    /// Register a [`Data`] type
    pub fn register_data<T: Data>(&self) {
        self.register(T::definition());
    }

    /// Register an [`Enumeration`]
    pub fn register_enum<E: Enumeration + Serialize>(&self) {
        self.register(TypeDefinition::for_enum::<E>());
    }

    /// Register `T` unless a definition with its name already exists
    pub fn ensure_data<T: Data>(&self) {
        if !self.contains(T::NAME) {
            self.register_data::<T>();
        }
    }

    /// Remove a definition; true when something was removed
    pub fn remove(&self, name: &str) -> bool {
        let name = normalize_name(name);
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let removed = inner.types.remove(&name);
        if let Some(type_id) = removed.as_ref().and_then(|d| d.type_id()) {
            inner.by_type_id.remove(&type_id);
        }
        if removed.is_some() {
            self.stamp(&mut inner, name);
        }
        removed.is_some()
    }

    /// Definition by name
    pub fn get(&self, name: &str) -> Option<Arc<TypeDefinition>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .types
            .get(&normalize_name(name))
            .cloned()
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Definition of the Rust type with `type_id`
    pub fn by_type_id(&self, type_id: TypeId) -> Option<Arc<TypeDefinition>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .by_type_id
            .get(&type_id)
            .and_then(|name| inner.types.get(name))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    enum Color {
        Red,
        Blue,
    }

    impl Enumeration for Color {
        const NAME: &'static str = "Color";

        fn cases() -> Vec<Self> {
            vec![Color::Red, Color::Blue]
        }

        fn name(&self) -> &'static str {
            match self {
                Color::Red => "Red",
                Color::Blue => "Blue",
            }
        }
    }

    #[test]
    fn test_register_bumps_revision() {
        let registry = TypeRegistry::new();
        let before = registry.revision();

        registry.register(TypeDefinition::new("Money", TypeKind::Class));
        assert!(registry.revision() > before);
        assert!(registry.contains(" ::Money "));

        let after = registry.revision();
        assert!(registry.remove("Money"));
        assert!(!registry.remove("Money"));
        assert_eq!(registry.revision(), after + 1);
    }

    #[test]
    fn test_revisions_are_tracked_per_type() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.revision_of("Money"), 0);

        registry.register(TypeDefinition::new("Money", TypeKind::Class));
        let money = registry.revision_of("Money");
        assert!(money > 0);

        registry.register(TypeDefinition::new("Rate", TypeKind::Class));
        assert_eq!(registry.revision_of("::Money"), money);

        assert!(registry.remove("Money"));
        assert!(registry.revision_of("Money") > money);
    }

    #[test]
    fn test_unit_enum_lookup_by_name() {
        let registry = TypeRegistry::new();
        registry.register_enum::<Color>();

        let definition = registry.get("Color").unwrap();
        assert_eq!(definition.kind(), TypeKind::Enum);
        let enumeration = definition.enumeration().unwrap();
        assert!(!enumeration.is_backed());

        let blue = enumeration.lookup(&json!("Blue")).unwrap();
        assert_eq!(blue.as_any().downcast_ref::<Color>(), Some(&Color::Blue));
        assert!(enumeration.lookup(&json!("Green")).is_none());
        assert!(definition.owns(&blue));
        assert!(registry.by_type_id(TypeId::of::<Color>()).is_some());
    }
}
