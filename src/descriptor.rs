//! Runtime-agnostic descriptors of a module's types and members.
//!
//! Descriptors are produced once by a [`crate::MetadataProvider`] and never mutated afterwards.
//! Everything downstream (selection, filtering, formatting, report assembly) is a pure function
//! of these records.
//!
//! # Key Types
//!
//! - [`TypeDescriptor`] - A type with its declared methods and fields
//! - [`MethodDescriptor`] / [`ParamDescriptor`] - A method and its parameters
//! - [`FieldDescriptor`] - A field
//! - [`TypeName`] - A recursive type reference as it appears in a signature

use bitflags::bitflags;

use crate::token::Token;

bitflags! {
    /// Kind of a type definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeKind: u8 {
        /// Reference type
        const CLASS = 0x01;
        /// Interface
        const INTERFACE = 0x02;
        /// Enumeration (extends `System.Enum`)
        const ENUM = 0x04;
        /// Value type (extends `System.ValueType`)
        const STRUCT = 0x08;
    }
}

/// Member accessibility, exactly one per member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accessibility {
    /// `public`
    Public,
    /// `private`
    Private,
    /// `protected`
    Protected,
    /// `protected internal`
    ProtectedInternal,
    /// `internal`
    Internal,
    /// No keyword is rendered (compiler-controlled and `private protected` members)
    #[default]
    None,
}

impl Accessibility {
    /// Maps the ECMA-335 member access mask (`MemberAccessMask`, low three bits of the
    /// method or field attributes) to an accessibility.
    #[must_use]
    pub fn from_access_mask(flags: u16) -> Self {
        match flags & 0x0007 {
            0x0006 => Accessibility::Public,
            0x0001 => Accessibility::Private,
            0x0004 => Accessibility::Protected,
            0x0005 => Accessibility::ProtectedInternal,
            0x0003 => Accessibility::Internal,
            _ => Accessibility::None,
        }
    }

    /// The C# keyword for this accessibility, if any.
    #[must_use]
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Accessibility::Public => Some("public"),
            Accessibility::Private => Some("private"),
            Accessibility::Protected => Some("protected"),
            Accessibility::ProtectedInternal => Some("protected internal"),
            Accessibility::Internal => Some("internal"),
            Accessibility::None => None,
        }
    }
}

/// Inheritance modifier of a method; the variants are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MethodModifier {
    /// No modifier keyword
    #[default]
    None,
    /// `virtual`
    Virtual,
    /// `override`
    Override,
    /// `abstract`
    Abstract,
}

impl MethodModifier {
    /// Derives the modifier from the raw virtual/final/abstract attribute bits.
    ///
    /// A virtual method that is neither final nor abstract renders as `virtual`, a final
    /// non-abstract virtual method as `override`, and any abstract method as `abstract`.
    #[must_use]
    pub fn from_flags(is_virtual: bool, is_final: bool, is_abstract: bool) -> Self {
        if is_abstract {
            MethodModifier::Abstract
        } else if is_virtual && is_final {
            MethodModifier::Override
        } else if is_virtual {
            MethodModifier::Virtual
        } else {
            MethodModifier::None
        }
    }

    /// The C# keyword for this modifier, if any.
    #[must_use]
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            MethodModifier::None => None,
            MethodModifier::Virtual => Some("virtual"),
            MethodModifier::Override => Some("override"),
            MethodModifier::Abstract => Some("abstract"),
        }
    }
}

/// A type reference as it appears in a member signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    /// A built-in type, by C# keyword (`int`) or runtime name (`Int32`, `System.Int32`)
    Primitive(String),
    /// Array of the element type, of any rank
    Array(Box<TypeName>),
    /// Managed reference to the element type (`ref`/`out` parameters)
    ByRef(Box<TypeName>),
    /// `System.Nullable<T>` over a value type
    NullableValue(Box<TypeName>),
    /// Generic instantiation; `base` may still carry its backtick arity suffix
    Generic {
        /// Simple name of the generic type definition, e.g. ``List`1``
        base: String,
        /// Type arguments, in declaration order
        args: Vec<TypeName>,
    },
    /// A nested type that is not publicly visible, qualified by its enclosing type
    NestedNonPublic {
        /// The enclosing type
        enclosing: Box<TypeName>,
        /// Simple name of the nested type
        name: String,
    },
    /// Any other type, by simple name
    Plain(String),
}

impl TypeName {
    /// Shorthand for [`TypeName::Primitive`].
    pub fn primitive(name: impl Into<String>) -> Self {
        TypeName::Primitive(name.into())
    }

    /// Shorthand for [`TypeName::Plain`].
    pub fn plain(name: impl Into<String>) -> Self {
        TypeName::Plain(name.into())
    }

    /// Wraps `element` into an array.
    #[must_use]
    pub fn array(element: TypeName) -> Self {
        TypeName::Array(Box::new(element))
    }

    /// Wraps `element` into a by-ref.
    #[must_use]
    pub fn by_ref(element: TypeName) -> Self {
        TypeName::ByRef(Box::new(element))
    }

    /// Wraps `element` into `Nullable<T>`.
    #[must_use]
    pub fn nullable(element: TypeName) -> Self {
        TypeName::NullableValue(Box::new(element))
    }

    /// A generic instantiation of `base` over `args`.
    pub fn generic(base: impl Into<String>, args: Vec<TypeName>) -> Self {
        TypeName::Generic {
            base: base.into(),
            args,
        }
    }

    /// A non-public nested type `name` inside `enclosing`.
    pub fn nested(enclosing: TypeName, name: impl Into<String>) -> Self {
        TypeName::NestedNonPublic {
            enclosing: Box::new(enclosing),
            name: name.into(),
        }
    }

    /// Returns `true` for a by-ref type.
    #[must_use]
    pub fn is_by_ref(&self) -> bool {
        matches!(self, TypeName::ByRef(_))
    }
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    /// Parameter name; empty when the module carries none
    pub name: String,
    /// Parameter type; by-ref parameters keep the [`TypeName::ByRef`] wrapper
    pub type_name: TypeName,
    /// Marked `[Out]`
    pub is_out: bool,
    /// Passed by reference
    pub is_ref: bool,
    /// Marked `[Optional]`
    pub is_optional: bool,
}

impl ParamDescriptor {
    /// A plain by-value parameter.
    pub fn new(name: impl Into<String>, type_name: TypeName) -> Self {
        ParamDescriptor {
            name: name.into(),
            type_name,
            is_out: false,
            is_ref: false,
            is_optional: false,
        }
    }
}

/// A method declared by a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Method name
    pub name: String,
    /// MethodDef token
    pub token: Token,
    /// Return type
    pub return_type: TypeName,
    /// Parameters in declaration order
    pub params: Vec<ParamDescriptor>,
    /// Accessibility
    pub access: Accessibility,
    /// Declared `static`
    pub is_static: bool,
    /// Inheritance modifier
    pub modifier: MethodModifier,
    /// Names of the method's own generic parameters
    pub generic_params: Vec<String>,
    /// Carries `CompilerGeneratedAttribute`
    pub compiler_generated: bool,
}

impl MethodDescriptor {
    /// A public, non-static, non-virtual method without parameters.
    pub fn new(name: impl Into<String>, token: Token, return_type: TypeName) -> Self {
        MethodDescriptor {
            name: name.into(),
            token,
            return_type,
            params: Vec::new(),
            access: Accessibility::Public,
            is_static: false,
            modifier: MethodModifier::None,
            generic_params: Vec::new(),
            compiler_generated: false,
        }
    }
}

/// A field declared by a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Field token
    pub token: Token,
    /// Field type
    pub type_name: TypeName,
    /// Accessibility
    pub access: Accessibility,
    /// Declared `static`
    pub is_static: bool,
    /// `readonly` (init-only)
    pub is_read_only: bool,
    /// Compile-time constant (literal)
    pub is_constant: bool,
    /// Carries `CompilerGeneratedAttribute`
    pub compiler_generated: bool,
}

impl FieldDescriptor {
    /// A public, mutable instance field.
    pub fn new(name: impl Into<String>, token: Token, type_name: TypeName) -> Self {
        FieldDescriptor {
            name: name.into(),
            token,
            type_name,
            access: Accessibility::Public,
            is_static: false,
            is_read_only: false,
            is_constant: false,
            compiler_generated: false,
        }
    }
}

/// A type definition with its declared members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Simple name, e.g. ``Inventory`1``
    pub name: String,
    /// Qualified name; nested types use `+`, e.g. `Game.Player+State`
    pub full_name: String,
    /// TypeDef token
    pub token: Token,
    /// Type kind
    pub kind: TypeKind,
    /// Declared methods, constructors excluded
    pub methods: Vec<MethodDescriptor>,
    /// Declared fields
    pub fields: Vec<FieldDescriptor>,
    /// Carries `CompilerGeneratedAttribute`
    pub compiler_generated: bool,
}

impl TypeDescriptor {
    /// A class without members.
    pub fn new(name: impl Into<String>, full_name: impl Into<String>, token: Token) -> Self {
        TypeDescriptor {
            name: name.into(),
            full_name: full_name.into(),
            token,
            kind: TypeKind::CLASS,
            methods: Vec::new(),
            fields: Vec::new(),
            compiler_generated: false,
        }
    }

    /// Returns `true` if the type declares neither methods nor fields.
    #[must_use]
    pub fn has_no_members(&self) -> bool {
        self.methods.is_empty() && self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_mask() {
        assert_eq!(Accessibility::from_access_mask(0x0006), Accessibility::Public);
        assert_eq!(Accessibility::from_access_mask(0x0001), Accessibility::Private);
        assert_eq!(Accessibility::from_access_mask(0x0004), Accessibility::Protected);
        assert_eq!(
            Accessibility::from_access_mask(0x0005),
            Accessibility::ProtectedInternal
        );
        assert_eq!(Accessibility::from_access_mask(0x0003), Accessibility::Internal);
        assert_eq!(Accessibility::from_access_mask(0x0002), Accessibility::None);
        assert_eq!(Accessibility::from_access_mask(0x0000), Accessibility::None);
        // Upper bits (static, virtual, ...) do not leak into the access level
        assert_eq!(Accessibility::from_access_mask(0x01D6), Accessibility::Public);
    }

    #[test]
    fn modifier_derivation() {
        assert_eq!(MethodModifier::from_flags(true, false, false), MethodModifier::Virtual);
        assert_eq!(MethodModifier::from_flags(true, true, false), MethodModifier::Override);
        assert_eq!(MethodModifier::from_flags(true, false, true), MethodModifier::Abstract);
        assert_eq!(MethodModifier::from_flags(false, false, true), MethodModifier::Abstract);
        assert_eq!(MethodModifier::from_flags(false, true, false), MethodModifier::None);
        assert_eq!(MethodModifier::from_flags(false, false, false), MethodModifier::None);
    }

    #[test]
    fn empty_type() {
        let ty = TypeDescriptor::new("Empty", "Game.Empty", Token::new(0x02000002));
        assert!(ty.has_no_members());
    }
}
