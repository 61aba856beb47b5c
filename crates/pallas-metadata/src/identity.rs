//! Identities of metadata nodes.

use crate::type_info::TypeInfo;
use std::any::TypeId;
use std::hash::{Hash, Hasher};

/// The kind of member a metadata node describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    /// A type on its own.
    Type,
    /// A property of a container type.
    Property,
    /// An action parameter.
    Parameter,
}

/// Uniquely identifies a metadata node.
#[derive(Debug, Clone)]
pub struct ModelMetadataIdentity {
    kind: MetadataKind,
    model_type: TypeInfo,
    name: Option<String>,
    container_type: Option<TypeInfo>,
    owner: Option<String>,
}

impl ModelMetadataIdentity {
    /// Identity of a type.
    #[must_use]
    pub fn for_type(model_type: TypeInfo) -> Self {
        Self {
            kind: MetadataKind::Type,
            model_type,
            name: None,
            container_type: None,
            owner: None,
        }
    }

    /// Identity of a property named `name` of type `model_type` on `container_type`.
    #[must_use]
    pub fn for_property(model_type: TypeInfo, name: impl Into<String>, container_type: TypeInfo) -> Self {
        Self {
            kind: MetadataKind::Property,
            model_type,
            name: Some(name.into()),
            container_type: Some(container_type),
            owner: None,
        }
    }

    /// Identity of a parameter named `name` declared by `owner`.
    #[must_use]
    pub fn for_parameter(model_type: TypeInfo, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            kind: MetadataKind::Parameter,
            model_type,
            name: Some(name.into()),
            container_type: None,
            owner: Some(owner.into()),
        }
    }

    /// The node kind.
    #[must_use]
    pub fn kind(&self) -> MetadataKind {
        self.kind
    }

    /// The model type.
    #[must_use]
    pub fn model_type(&self) -> &TypeInfo {
        &self.model_type
    }

    /// The member name (properties and parameters).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The container type (properties).
    #[must_use]
    pub fn container_type(&self) -> Option<&TypeInfo> {
        self.container_type.as_ref()
    }

    /// The declaring member (parameters).
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    fn key(&self) -> (MetadataKind, TypeId, Option<&str>, Option<TypeId>, Option<&str>) {
        (
            self.kind,
            self.model_type.type_id(),
            self.name.as_deref(),
            self.container_type.as_ref().map(TypeInfo::type_id),
            self.owner.as_deref(),
        )
    }
}

impl PartialEq for ModelMetadataIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ModelMetadataIdentity {}

impl Hash for ModelMetadataIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl std::fmt::Display for ModelMetadataIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.kind, &self.container_type, &self.owner, &self.name) {
            (MetadataKind::Property, Some(container), _, Some(name)) => {
                write!(f, "{}.{} ({})", container.name(), name, self.model_type.name())
            }
            (MetadataKind::Parameter, _, Some(owner), Some(name)) => {
                write!(f, "{owner}({name}: {})", self.model_type.name())
            }
            _ => f.write_str(self.model_type.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reflect;
    use std::collections::HashSet;

    #[test]
    fn test_identities_distinguish_kind_and_name() {
        let a = ModelMetadataIdentity::for_type(i32::type_info());
        let b = ModelMetadataIdentity::for_property(i32::type_info(), "Id", String::type_info());
        let c = ModelMetadataIdentity::for_property(i32::type_info(), "Count", String::type_info());
        let d = ModelMetadataIdentity::for_type(i32::type_info());
        let set: HashSet<_> = [a, b, c, d].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_display() {
        let p = ModelMetadataIdentity::for_parameter(i32::type_info(), "id", "Orders.Get");
        assert_eq!(p.to_string(), "Orders.Get(id: i32)");
    }
}
