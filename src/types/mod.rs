//! Core data model: semantic types, dynamic values and interface descriptors.

pub mod descriptor;
pub mod invocation;
pub mod semantic;
pub mod value;

pub use descriptor::{
    InterfaceDescriptor, InterfaceDescriptorBuilder, MethodDescriptor, ParameterDescriptor,
};
pub use invocation::{Invocation, InvocationState};
pub use semantic::{EnumSchema, FieldSchema, FloatKind, IntKind, ObjectSchema, SemanticType};
pub use value::Value;
