//! Declarative macros for typed interfaces
//!
//! - [`ai_object!`](crate::ai_object) declares a struct that crosses the model
//!   boundary as an object.
//! - [`ai_enum!`](crate::ai_enum) declares a unit-only enum.
//! - [`ai_interface!`](crate::ai_interface) declares an interface and a typed
//!   client whose async methods are answered by a proxy.

/// Declare a struct usable as a parameter or return type.
///
/// ```rust,ignore
/// aiface::ai_object! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Person {
///         pub name: String,
///         pub age: u8,
///     }
/// }
/// ```
#[macro_export]
macro_rules! ai_object {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $fty,
            )*
        }

        impl $crate::Transcodable for $name {
            fn semantic_type() -> $crate::types::SemanticType {
                $crate::types::SemanticType::Object(
                    $crate::types::ObjectSchema::new(stringify!($name))
                        $(.field(
                            stringify!($field),
                            <$fty as $crate::Transcodable>::semantic_type(),
                        ))*
                )
            }

            fn into_value(self) -> $crate::types::Value {
                $crate::types::Value::Object(vec![
                    $((
                        stringify!($field).to_string(),
                        $crate::Transcodable::into_value(self.$field),
                    )),*
                ])
            }

            fn from_value(
                value: $crate::types::Value,
            ) -> ::std::result::Result<Self, $crate::error::DecodeError> {
                #[allow(unused_mut, unused_variables)]
                let mut fields = $crate::transcoder::ObjectFields::from_value(value, stringify!($name))?;
                Ok(Self {
                    $($field: fields.take::<$fty>(stringify!($field))?,)*
                })
            }
        }
    };
}

/// Declare a unit-only enum usable as a parameter or return type.
///
/// Variants are exchanged with the model by name.
#[macro_export]
macro_rules! ai_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::Transcodable for $name {
            fn semantic_type() -> $crate::types::SemanticType {
                $crate::types::SemanticType::Enum($crate::types::EnumSchema::new(
                    stringify!($name),
                    [$(stringify!($variant)),+],
                ))
            }

            fn into_value(self) -> $crate::types::Value {
                let name = match self {
                    $(Self::$variant => stringify!($variant),)+
                };
                $crate::types::Value::Enum(name.to_string())
            }

            fn from_value(
                value: $crate::types::Value,
            ) -> ::std::result::Result<Self, $crate::error::DecodeError> {
                match &value {
                    $crate::types::Value::Enum(name) | $crate::types::Value::String(name) => {
                        match name.as_str() {
                            $(stringify!($variant) => Ok(Self::$variant),)+
                            _ => Err($crate::transcoder::transcodable::mismatch::<Self>(&value)),
                        }
                    }
                    other => Err($crate::transcoder::transcodable::mismatch::<Self>(other)),
                }
            }
        }
    };
}

/// Declare an interface and a typed client for it.
///
/// ```rust,ignore
/// aiface::ai_interface! {
///     /// Arithmetic answered by a model.
///     pub struct Calculator {
///         hint: "Performs integer arithmetic";
///         fn sum(a: i64, b: i64) -> i64 => "Adds two numbers";
///         fn is_prime(n: u64) -> bool;
///     }
/// }
///
/// let calc = Calculator::create(&factory)?;
/// assert_eq!(calc.sum(1, 2).await?, 3);
/// ```
///
/// The generated type holds an [`AiProxy`](crate::AiProxy); every declared
/// method becomes an `async fn` returning `Result<R, ProxyError>`.
#[macro_export]
macro_rules! ai_interface {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(hint: $hint:literal;)?
            $(
                $(#[$mmeta:meta])*
                fn $method:ident ( $($arg:ident : $ty:ty),* $(,)? ) -> $ret:ty $(=> $mhint:literal)? ;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis struct $name {
            proxy: $crate::AiProxy,
        }

        impl $name {
            /// The descriptor this client is built from.
            pub fn descriptor() -> $crate::types::InterfaceDescriptor {
                let builder = $crate::types::InterfaceDescriptor::builder(stringify!($name));
                $(let builder = builder.hint($hint);)?
                $(
                    let builder = builder.method({
                        let method = $crate::types::MethodDescriptor::new(
                            stringify!($method),
                            <$ret as $crate::Transcodable>::semantic_type(),
                        )
                        $(.param(stringify!($arg), <$ty as $crate::Transcodable>::semantic_type()))*;
                        $(let method = method.hint($mhint);)?
                        method
                    });
                )*
                builder.build()
            }

            pub fn create(
                factory: &$crate::ProxyFactory,
            ) -> ::std::result::Result<Self, $crate::ProxyError> {
                Ok(Self {
                    proxy: factory.create(Self::descriptor())?,
                })
            }

            pub fn proxy(&self) -> &$crate::AiProxy {
                &self.proxy
            }

            $(
                $(#[$mmeta])*
                pub async fn $method(
                    &self,
                    $($arg: $ty),*
                ) -> ::std::result::Result<$ret, $crate::ProxyError> {
                    self.proxy
                        .invoke_typed::<$ret>(
                            stringify!($method),
                            &[$($crate::Transcodable::into_value($arg)),*],
                        )
                        .await
                }
            )*
        }
    };
}
