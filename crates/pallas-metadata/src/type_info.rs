//! Runtime type descriptions.
//!
//! Rust has no runtime reflection, so every type that takes part in binding
//! or validation describes itself through [`Reflect`]. The description is a
//! [`TypeInfo`]: a cheap-to-clone handle carrying the facts the metadata graph
//! needs (nullability, properties, element type, string conversion kind,
//! attributes, and a serde-backed decoder).
//!
//! Property and element types are stored as `fn() -> TypeInfo` so that
//! recursive types (`Node { children: Vec<Node> }`) never recurse eagerly.

use crate::attributes::Attribute;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// How values of a type relate to `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A non-nullable value type (`i32`, `bool`, plain structs bound by value).
    Value,
    /// A reference-like type that may be absent (`String`, `Vec<T>`, boxed models).
    Reference,
    /// A nullable wrapper around a value type (`Option<T>`).
    Nullable,
}

/// Whether a type can be instantiated by an activator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivationKind {
    /// A concrete type with a constructor.
    Concrete,
    /// A value type.
    ValueType,
    /// An abstract type.
    Abstract,
    /// An interface (trait-like) type.
    Interface,
    /// A generic type definition with unbound parameters.
    OpenGeneric,
}

impl ActivationKind {
    /// Returns `true` for kinds an activator may instantiate.
    #[must_use]
    pub const fn is_activatable(self) -> bool {
        matches!(self, Self::Concrete)
    }
}

/// How a single string value converts into a value of the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `true` / `false`.
    Bool,
    /// Signed integer.
    Integer,
    /// Unsigned integer.
    Unsigned,
    /// Floating point.
    Float,
    /// Single character.
    Char,
    /// Any string.
    String,
    /// One of the type's enum names (or its numeric value).
    Enum,
}

/// One value of an enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// The variant name as written in code.
    pub name: String,
    /// The serialized value.
    pub value: String,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Optional display group.
    pub group: Option<String>,
}

impl EnumValue {
    /// Creates an enum value with no display information.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            display_name: None,
            group: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn display(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the display group.
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Normalizes a JSON value through a Rust type.
pub type DecodeFn = fn(serde_json::Value) -> Result<serde_json::Value, String>;

/// A property declared on a complex type.
#[derive(Clone)]
pub struct PropertyInfo {
    name: &'static str,
    property_type: fn() -> TypeInfo,
    attributes: Vec<Arc<dyn Attribute>>,
    has_getter: bool,
    has_setter: bool,
}

impl PropertyInfo {
    /// Creates a read-write property.
    #[must_use]
    pub fn new(name: &'static str, property_type: fn() -> TypeInfo) -> Self {
        Self {
            name,
            property_type,
            attributes: Vec::new(),
            has_getter: true,
            has_setter: true,
        }
    }

    /// Creates a property for `T`.
    #[must_use]
    pub fn of<T: Reflect>(name: &'static str) -> Self {
        Self::new(name, T::type_info)
    }

    /// Adds a property-level attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: impl Attribute) -> Self {
        self.attributes.push(Arc::new(attribute));
        self
    }

    /// Marks the property as having no setter.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.has_setter = false;
        self
    }

    /// The property name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolves the property type.
    #[must_use]
    pub fn property_type(&self) -> TypeInfo {
        (self.property_type)()
    }

    /// Attributes declared on the property itself.
    #[must_use]
    pub fn attributes(&self) -> &[Arc<dyn Attribute>] {
        &self.attributes
    }

    /// Whether the property can be read.
    #[must_use]
    pub fn has_getter(&self) -> bool {
        self.has_getter
    }

    /// Whether the property can be assigned.
    #[must_use]
    pub fn has_setter(&self) -> bool {
        self.has_setter
    }
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("attributes", &self.attributes.len())
            .field("has_setter", &self.has_setter)
            .finish()
    }
}

/// An action parameter.
#[derive(Clone, Debug)]
pub struct ParameterInfo {
    name: String,
    owner: String,
    parameter_type: TypeInfo,
    attributes: Vec<Arc<dyn Attribute>>,
}

impl ParameterInfo {
    /// Creates a parameter of `parameter_type` declared by `owner` (usually
    /// `Controller.Action`).
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>, parameter_type: TypeInfo) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            parameter_type,
            attributes: Vec::new(),
        }
    }

    /// Adds a parameter-level attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: impl Attribute) -> Self {
        self.attributes.push(Arc::new(attribute));
        self
    }

    /// Replaces the parameter-level attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<Arc<dyn Attribute>>) -> Self {
        self.attributes = attributes;
        self
    }

    /// The parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declaring member.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The parameter type.
    #[must_use]
    pub fn parameter_type(&self) -> &TypeInfo {
        &self.parameter_type
    }

    /// Attributes declared on the parameter.
    #[must_use]
    pub fn attributes(&self) -> &[Arc<dyn Attribute>] {
        &self.attributes
    }
}

struct TypeInfoInner {
    name: &'static str,
    type_id: TypeId,
    value_kind: ValueKind,
    activation: ActivationKind,
    scalar: Option<ScalarKind>,
    attributes: Vec<Arc<dyn Attribute>>,
    properties: Vec<PropertyInfo>,
    element: Option<fn() -> TypeInfo>,
    enum_values: Vec<EnumValue>,
    is_flags: bool,
    decode: Option<DecodeFn>,
    default_value: Option<fn() -> serde_json::Value>,
}

/// Shared description of a type. Equality is by `TypeId`.
#[derive(Clone)]
pub struct TypeInfo(Arc<TypeInfoInner>);

impl TypeInfo {
    /// Starts describing `T`.
    #[must_use]
    pub fn builder<T: 'static>() -> TypeInfoBuilder {
        TypeInfoBuilder {
            inner: TypeInfoInner {
                name: short_type_name(std::any::type_name::<T>()),
                type_id: TypeId::of::<T>(),
                value_kind: ValueKind::Reference,
                activation: ActivationKind::Concrete,
                scalar: None,
                attributes: Vec::new(),
                properties: Vec::new(),
                element: None,
                enum_values: Vec::new(),
                is_flags: false,
                decode: None,
                default_value: None,
            },
        }
    }

    /// The display name of the type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// The Rust `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.0.type_id
    }

    /// How the type relates to `null`.
    #[must_use]
    pub fn value_kind(&self) -> ValueKind {
        self.0.value_kind
    }

    /// Whether an activator may instantiate the type.
    #[must_use]
    pub fn activation(&self) -> ActivationKind {
        self.0.activation
    }

    /// The string conversion kind for simple types.
    #[must_use]
    pub fn scalar(&self) -> Option<ScalarKind> {
        self.0.scalar
    }

    /// Attributes declared on the type.
    #[must_use]
    pub fn attributes(&self) -> &[Arc<dyn Attribute>] {
        &self.0.attributes
    }

    /// Declared properties, in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.0.properties
    }

    /// Looks up a property by name (ASCII case-insensitive).
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.0
            .properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// The element type of an enumerable type.
    #[must_use]
    pub fn element(&self) -> Option<TypeInfo> {
        self.0.element.map(|f| f())
    }

    /// Enum values in declaration order.
    #[must_use]
    pub fn enum_values(&self) -> &[EnumValue] {
        &self.0.enum_values
    }

    /// Whether the type is a flags enum.
    #[must_use]
    pub fn is_flags(&self) -> bool {
        self.0.is_flags
    }

    /// Whether the type converts from a single string.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.0.scalar.is_some()
    }

    /// Whether the type is enumerable.
    #[must_use]
    pub fn is_enumerable(&self) -> bool {
        self.0.element.is_some()
    }

    /// Whether `null` is a legal value.
    #[must_use]
    pub fn is_reference_or_nullable(&self) -> bool {
        !matches!(self.0.value_kind, ValueKind::Value)
    }

    /// Normalizes a JSON value through the Rust type.
    ///
    /// Types without a decoder accept any value unchanged.
    pub fn decode(&self, value: serde_json::Value) -> Result<serde_json::Value, String> {
        match self.0.decode {
            Some(decode) => decode(value),
            None => Ok(value),
        }
    }

    /// Whether a decoder was registered.
    #[must_use]
    pub fn has_decoder(&self) -> bool {
        self.0.decode.is_some()
    }

    /// The default value of the type, `null` for reference-like types.
    #[must_use]
    pub fn default_value(&self) -> serde_json::Value {
        self.0
            .default_value
            .map_or(serde_json::Value::Null, |f| f())
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.0.type_id == other.0.type_id
    }
}

impl Eq for TypeInfo {}

impl std::hash::Hash for TypeInfo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.type_id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.0.name)
            .field("value_kind", &self.0.value_kind)
            .field("scalar", &self.0.scalar)
            .field("properties", &self.0.properties.len())
            .finish()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name)
    }
}

/// Builder for [`TypeInfo`].
pub struct TypeInfoBuilder {
    inner: TypeInfoInner,
}

impl TypeInfoBuilder {
    /// Overrides the display name.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.inner.name = name;
        self
    }

    /// Sets the nullability kind.
    #[must_use]
    pub fn value_kind(mut self, kind: ValueKind) -> Self {
        self.inner.value_kind = kind;
        if kind == ValueKind::Value && self.inner.activation == ActivationKind::Concrete {
            self.inner.activation = ActivationKind::ValueType;
        }
        self
    }

    /// Sets the activation kind.
    #[must_use]
    pub fn activation(mut self, activation: ActivationKind) -> Self {
        self.inner.activation = activation;
        self
    }

    /// Marks the type as a simple type converted from one string.
    #[must_use]
    pub fn scalar(mut self, scalar: ScalarKind) -> Self {
        self.inner.scalar = Some(scalar);
        self
    }

    /// Adds a type-level attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: impl Attribute) -> Self {
        self.inner.attributes.push(Arc::new(attribute));
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn property(mut self, property: PropertyInfo) -> Self {
        self.inner.properties.push(property);
        self
    }

    /// Declares the element type of an enumerable type.
    #[must_use]
    pub fn element(mut self, element: fn() -> TypeInfo) -> Self {
        self.inner.element = Some(element);
        self
    }

    /// Declares the enum values; also marks the type as a simple enum.
    #[must_use]
    pub fn enum_values(mut self, values: Vec<EnumValue>) -> Self {
        self.inner.enum_values = values;
        self.inner.scalar = Some(ScalarKind::Enum);
        self
    }

    /// Marks an enum as a flags enum.
    #[must_use]
    pub fn flags(mut self) -> Self {
        self.inner.is_flags = true;
        self
    }

    /// Uses serde to normalize values through `T`.
    #[must_use]
    pub fn serde<T: Serialize + DeserializeOwned + 'static>(mut self) -> Self {
        self.inner.decode = Some(decode_via::<T>);
        self
    }

    /// Declares the type's default value.
    #[must_use]
    pub fn default_with(mut self, default_value: fn() -> serde_json::Value) -> Self {
        self.inner.default_value = Some(default_value);
        self
    }

    /// Finishes the description.
    #[must_use]
    pub fn build(self) -> TypeInfo {
        TypeInfo(Arc::new(self.inner))
    }
}

/// Round-trips a value through `T`.
pub fn decode_via<T: Serialize + DeserializeOwned>(
    value: serde_json::Value,
) -> Result<serde_json::Value, String> {
    let typed: T = serde_json::from_value(value).map_err(|e| e.to_string())?;
    serde_json::to_value(typed).map_err(|e| e.to_string())
}

fn short_type_name(full: &'static str) -> &'static str {
    // Only strip the module path of non-generic names; generics keep the full path.
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

/// Types that describe themselves to the metadata graph.
///
/// # Example
///
/// ```
/// use pallas_metadata::{PropertyInfo, Reflect, TypeInfo, ValueKind};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, Default)]
/// #[serde(default)]
/// struct Sample {
///     #[serde(rename = "SampleInt")]
///     sample_int: i32,
/// }
///
/// impl Reflect for Sample {
///     fn type_info() -> TypeInfo {
///         TypeInfo::builder::<Self>()
///             .property(PropertyInfo::of::<i32>("SampleInt"))
///             .serde::<Self>()
///             .build()
///     }
/// }
///
/// assert_eq!(Sample::type_info().properties().len(), 1);
/// ```
pub trait Reflect: 'static {
    /// Describes the type.
    fn type_info() -> TypeInfo;
}

macro_rules! reflect_scalar {
    ($($ty:ty => $kind:expr, $default:expr;)*) => {
        $(
            impl Reflect for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::builder::<$ty>()
                        .name(stringify!($ty))
                        .value_kind(ValueKind::Value)
                        .scalar($kind)
                        .serde::<$ty>()
                        .default_with(|| $default)
                        .build()
                }
            }
        )*
    };
}

reflect_scalar! {
    bool => ScalarKind::Bool, serde_json::Value::Bool(false);
    i8 => ScalarKind::Integer, serde_json::json!(0);
    i16 => ScalarKind::Integer, serde_json::json!(0);
    i32 => ScalarKind::Integer, serde_json::json!(0);
    i64 => ScalarKind::Integer, serde_json::json!(0);
    u8 => ScalarKind::Unsigned, serde_json::json!(0);
    u16 => ScalarKind::Unsigned, serde_json::json!(0);
    u32 => ScalarKind::Unsigned, serde_json::json!(0);
    u64 => ScalarKind::Unsigned, serde_json::json!(0);
    usize => ScalarKind::Unsigned, serde_json::json!(0);
    f32 => ScalarKind::Float, serde_json::json!(0.0);
    f64 => ScalarKind::Float, serde_json::json!(0.0);
    char => ScalarKind::Char, serde_json::json!("\0");
}

impl Reflect for String {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .name("String")
            .scalar(ScalarKind::String)
            .serde::<Self>()
            .build()
    }
}

impl Reflect for serde_json::Value {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>().name("Value").build()
    }
}

impl<T: Reflect + Serialize + DeserializeOwned> Reflect for Option<T> {
    fn type_info() -> TypeInfo {
        let inner = T::type_info();
        let mut builder = TypeInfo::builder::<Self>()
            .name(inner.name())
            .value_kind(ValueKind::Nullable)
            .serde::<Self>();
        if let Some(scalar) = inner.scalar() {
            builder = builder.scalar(scalar);
        }
        if !inner.enum_values().is_empty() {
            builder = builder.enum_values(inner.enum_values().to_vec());
        }
        for property in inner.properties() {
            builder = builder.property(property.clone());
        }
        builder.build()
    }
}

impl<T: Reflect + Serialize + DeserializeOwned> Reflect for Vec<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .element(T::type_info)
            .serde::<Self>()
            .build()
    }
}
