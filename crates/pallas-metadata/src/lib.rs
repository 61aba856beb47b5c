//! # Pallas Metadata
//!
//! The model metadata graph: a lazily computed, cached description of how to
//! bind, display and validate every type, property and parameter reachable
//! from an action.
//!
//! - [`Reflect`] / [`TypeInfo`] - Runtime type descriptions
//! - [`Attribute`] / [`ModelAttributes`] - Declarative attributes of a node
//! - [`MetadataDetailsProvider`] - Contributes binding, display and validation facts
//! - [`ModelMetadata`] - One node with compute-once facts
//! - [`DefaultModelMetadataProvider`] - The caching owner of all nodes

#![doc(html_root_url = "https://docs.rs/pallas-metadata/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod attributes;
pub mod details;
mod identity;
mod metadata;
mod provider;
mod type_info;

pub use attributes::{
    downcast, Attribute, BindFrom, BindNever, BindRequired, BindingSource, DataType, DataTypeKind,
    Display, DisplayFormat, Editable, HiddenInput, ModelAttributes, ModelBinderAttribute,
    ModelMetadataType, ScaffoldColumn, UiHint,
};
pub use details::{
    BindingMetadata, BindingMetadataProviderContext, CompositeMetadataDetailsProvider,
    DefaultBindingMetadataProvider, DefaultDisplayMetadataProvider, DisplayMetadata,
    DisplayMetadataProviderContext, MetadataDetailsProvider, ValidationMetadata,
    ValidationMetadataProviderContext, DEFAULT_ORDER,
};
pub use identity::{MetadataKind, ModelMetadataIdentity};
pub use metadata::{MetadataDetails, ModelMetadata};
pub use provider::{DefaultModelMetadataProvider, ModelMetadataProvider};
pub use type_info::{
    decode_via, ActivationKind, DecodeFn, EnumValue, ParameterInfo, PropertyInfo, Reflect,
    ScalarKind, TypeInfo, TypeInfoBuilder, ValueKind,
};
