//! Interface and method descriptors
//!
//! Descriptors are the data form of an abstract interface. They are built once,
//! validated by `ProxyFactory::create`, and then shared read-only by the proxy.

use super::semantic::SemanticType;

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: SemanticType,
}

/// Signature and hints of one interface method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub parameters: Vec<ParameterDescriptor>,
    pub returns: SemanticType,
    /// Natural-language description of what the method does.
    pub hint: Option<String>,
    /// Model override for this method only.
    pub model: Option<String>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, returns: SemanticType) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            returns,
            hint: None,
            model: None,
        }
    }

    /// Append a parameter. Declaration order is the call order.
    pub fn param(mut self, name: impl Into<String>, ty: SemanticType) -> Self {
        self.parameters.push(ParameterDescriptor {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// An abstract interface: a name, an optional hint and its methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    pub name: String,
    pub hint: Option<String>,
    pub methods: Vec<MethodDescriptor>,
}

impl InterfaceDescriptor {
    pub fn builder(name: impl Into<String>) -> InterfaceDescriptorBuilder {
        InterfaceDescriptorBuilder {
            name: name.into(),
            hint: None,
            methods: Vec::new(),
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Builder for [`InterfaceDescriptor`].
#[derive(Debug, Clone)]
pub struct InterfaceDescriptorBuilder {
    name: String,
    hint: Option<String>,
    methods: Vec<MethodDescriptor>,
}

impl InterfaceDescriptorBuilder {
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Finish the descriptor. Validation happens when a proxy is created.
    pub fn build(self) -> InterfaceDescriptor {
        InterfaceDescriptor {
            name: self.name,
            hint: self.hint,
            methods: self.methods,
        }
    }
}
