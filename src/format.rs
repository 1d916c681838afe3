//! C#-style rendering of type references, methods and fields.
//!
//! # Type references
//!
//! | Kind | Rendering |
//! |---|---|
//! | primitive | C# keyword for the built-in types, otherwise the raw name |
//! | array | element + `[]` |
//! | by-ref | element; `ref`/`out` is emitted at parameter level |
//! | nullable | element + `?` |
//! | generic | base without its backtick arity + `<args>` |
//! | non-public nested | enclosing + `.` + name |
//! | plain | name |
//!
//! # Examples
//!
//! ```rust
//! use typedump::{MethodDescriptor, SignatureFormatter, Token, TypeName};
//!
//! let list = TypeName::generic("List`1", vec![TypeName::primitive("Int32")]);
//! assert_eq!(SignatureFormatter::type_name(&list), "List<int>");
//!
//! let method = MethodDescriptor::new("Foo", Token::new(0x06000001), TypeName::primitive("int"));
//! assert_eq!(SignatureFormatter::method(&method), "public int Foo()");
//! ```

use std::fmt::{self, Write};

use crate::descriptor::{FieldDescriptor, MethodDescriptor, ParamDescriptor, TypeName};

/// Renders descriptors into display text. Deterministic and total.
pub struct SignatureFormatter;

impl SignatureFormatter {
    /// Renders a type reference.
    #[must_use]
    pub fn type_name(type_name: &TypeName) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = Self::write_type(&mut out, type_name);
        out
    }

    /// Renders a method line without token, e.g. `public static T Get<T>(out int count)`.
    #[must_use]
    pub fn method(method: &MethodDescriptor) -> String {
        let mut out = String::new();
        let _ = Self::write_method(&mut out, method);
        out
    }

    /// Renders a field line without token, e.g. `private static readonly string Name`.
    #[must_use]
    pub fn field(field: &FieldDescriptor) -> String {
        let mut out = String::new();
        let _ = Self::write_field(&mut out, field);
        out
    }

    /// Writes a type reference.
    pub fn write_type(w: &mut dyn Write, type_name: &TypeName) -> fmt::Result {
        match type_name {
            TypeName::Primitive(name) => w.write_str(primitive_alias(name)),
            TypeName::Array(element) => {
                Self::write_type(w, element)?;
                w.write_str("[]")
            }
            TypeName::ByRef(element) => Self::write_type(w, element),
            TypeName::NullableValue(element) => {
                Self::write_type(w, element)?;
                w.write_char('?')
            }
            TypeName::Generic { base, args } => {
                w.write_str(strip_arity(base))?;
                w.write_char('<')?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        w.write_str(", ")?;
                    }
                    Self::write_type(w, arg)?;
                }
                w.write_char('>')
            }
            TypeName::NestedNonPublic { enclosing, name } => {
                Self::write_type(w, enclosing)?;
                write!(w, ".{name}")
            }
            TypeName::Plain(name) => w.write_str(name),
        }
    }

    /// Writes a method line:
    /// `[access ][static ][virtual|override|abstract ]Return Name[<G, ...>]([out|ref ]Type name, ...)`.
    pub fn write_method(w: &mut dyn Write, method: &MethodDescriptor) -> fmt::Result {
        if let Some(access) = method.access.keyword() {
            write!(w, "{access} ")?;
        }
        if method.is_static {
            w.write_str("static ")?;
        }
        if let Some(modifier) = method.modifier.keyword() {
            write!(w, "{modifier} ")?;
        }

        Self::write_type(w, &method.return_type)?;
        write!(w, " {}", method.name)?;

        if !method.generic_params.is_empty() {
            write!(w, "<{}>", method.generic_params.join(", "))?;
        }

        w.write_char('(')?;
        for (i, param) in method.params.iter().enumerate() {
            if i > 0 {
                w.write_str(", ")?;
            }
            Self::write_param(w, param)?;
        }
        w.write_char(')')
    }

    /// Writes a single parameter, `[out |ref ]Type name`.
    pub fn write_param(w: &mut dyn Write, param: &ParamDescriptor) -> fmt::Result {
        if param.is_out {
            w.write_str("out ")?;
        } else if param.is_ref || param.type_name.is_by_ref() {
            w.write_str("ref ")?;
        }

        let pointee = match &param.type_name {
            TypeName::ByRef(element) => element.as_ref(),
            other => other,
        };
        Self::write_type(w, pointee)?;
        write!(w, " {}", param.name)
    }

    /// Writes a field line: `[access ][static ][readonly ][const ]Type Name`.
    pub fn write_field(w: &mut dyn Write, field: &FieldDescriptor) -> fmt::Result {
        if let Some(access) = field.access.keyword() {
            write!(w, "{access} ")?;
        }
        if field.is_static {
            w.write_str("static ")?;
        }
        if field.is_read_only {
            w.write_str("readonly ")?;
        }
        if field.is_constant && !field.is_read_only {
            w.write_str("const ")?;
        }

        Self::write_type(w, &field.type_name)?;
        write!(w, " {}", field.name)
    }
}

/// Maps built-in types to their C# keyword; anything else passes through unchanged.
fn primitive_alias(name: &str) -> &str {
    let simple = name.strip_prefix("System.").unwrap_or(name);
    match simple {
        "Void" | "void" => "void",
        "Boolean" | "bool" => "bool",
        "Byte" | "byte" => "byte",
        "SByte" | "sbyte" => "sbyte",
        "Char" | "char" => "char",
        "Decimal" | "decimal" => "decimal",
        "Double" | "double" => "double",
        "Single" | "float" => "float",
        "Int32" | "int" => "int",
        "UInt32" | "uint" => "uint",
        "Int64" | "long" => "long",
        "UInt64" | "ulong" => "ulong",
        "Int16" | "short" => "short",
        "UInt16" | "ushort" => "ushort",
        "String" | "string" => "string",
        "Object" | "object" => "object",
        _ => name,
    }
}

/// Strips the backtick arity suffix of a generic type name: ``Dictionary`2`` -> `Dictionary`.
fn strip_arity(name: &str) -> &str {
    match name.find('`') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        descriptor::{Accessibility, MethodModifier},
        token::Token,
    };

    fn method(name: &str, return_type: TypeName) -> MethodDescriptor {
        MethodDescriptor::new(name, Token::new(0x06000001), return_type)
    }

    #[test]
    fn primitives() {
        for (raw, alias) in [
            ("Void", "void"),
            ("System.Boolean", "bool"),
            ("Byte", "byte"),
            ("SByte", "sbyte"),
            ("Char", "char"),
            ("Decimal", "decimal"),
            ("Double", "double"),
            ("Single", "float"),
            ("Int32", "int"),
            ("UInt32", "uint"),
            ("Int64", "long"),
            ("UInt64", "ulong"),
            ("Int16", "short"),
            ("UInt16", "ushort"),
            ("String", "string"),
            ("System.Object", "object"),
            ("int", "int"),
            ("IntPtr", "IntPtr"),
            ("TypedReference", "TypedReference"),
        ] {
            assert_eq!(
                SignatureFormatter::type_name(&TypeName::primitive(raw)),
                alias
            );
        }
    }

    #[test]
    fn composite_types() {
        let list = TypeName::generic("List`1", vec![TypeName::primitive("int")]);
        assert_eq!(SignatureFormatter::type_name(&list), "List<int>");

        let dict = TypeName::generic(
            "Dictionary`2",
            vec![
                TypeName::primitive("String"),
                TypeName::array(TypeName::generic("List`1", vec![TypeName::plain("Item")])),
            ],
        );
        assert_eq!(
            SignatureFormatter::type_name(&dict),
            "Dictionary<string, List<Item>[]>"
        );

        let jagged = TypeName::array(TypeName::array(TypeName::primitive("Byte")));
        assert_eq!(SignatureFormatter::type_name(&jagged), "byte[][]");

        let nullable = TypeName::nullable(TypeName::plain("Vector3"));
        assert_eq!(SignatureFormatter::type_name(&nullable), "Vector3?");

        let by_ref = TypeName::by_ref(TypeName::primitive("Single"));
        assert_eq!(SignatureFormatter::type_name(&by_ref), "float");

        let nested = TypeName::nested(
            TypeName::nested(TypeName::plain("Outer"), "Middle"),
            "Inner",
        );
        assert_eq!(SignatureFormatter::type_name(&nested), "Outer.Middle.Inner");

        let nested_in_generic = TypeName::nested(
            TypeName::generic("Pool`1", vec![TypeName::plain("T")]),
            "Slot",
        );
        assert_eq!(
            SignatureFormatter::type_name(&nested_in_generic),
            "Pool<T>.Slot"
        );
    }

    #[test]
    fn arity_suffix() {
        assert_eq!(strip_arity("List`1"), "List");
        assert_eq!(strip_arity("List"), "List");
        // A leading backtick is left untouched
        assert_eq!(strip_arity("`1"), "`1");
    }

    #[test]
    fn plain_method() {
        let m = method("Foo", TypeName::primitive("int"));
        assert_eq!(SignatureFormatter::method(&m), "public int Foo()");
    }

    #[test]
    fn out_and_ref_params() {
        let mut m = method("TryGet", TypeName::primitive("Boolean"));
        m.params.push(ParamDescriptor {
            is_out: true,
            ..ParamDescriptor::new("x", TypeName::primitive("int"))
        });
        assert_eq!(
            SignatureFormatter::method(&m),
            "public bool TryGet(out int x)"
        );

        let mut m = method("Swap", TypeName::primitive("Void"));
        m.access = Accessibility::Private;
        m.is_static = true;
        m.generic_params = vec!["T".to_string()];
        for name in ["a", "b"] {
            m.params.push(ParamDescriptor {
                is_ref: true,
                ..ParamDescriptor::new(name, TypeName::by_ref(TypeName::plain("T")))
            });
        }
        assert_eq!(
            SignatureFormatter::method(&m),
            "private static void Swap<T>(ref T a, ref T b)"
        );

        // [Out] on a by-ref parameter renders `out`, never `out ref`
        let mut m = method("Read", TypeName::primitive("Void"));
        m.params.push(ParamDescriptor {
            is_out: true,
            is_ref: true,
            ..ParamDescriptor::new("value", TypeName::by_ref(TypeName::primitive("Int64")))
        });
        assert_eq!(SignatureFormatter::method(&m), "public void Read(out long value)");
    }

    #[test]
    fn method_modifiers() {
        let cases = [
            (MethodModifier::Virtual, "protected virtual void OnEnable()"),
            (MethodModifier::Override, "protected override void OnEnable()"),
            (MethodModifier::Abstract, "protected abstract void OnEnable()"),
            (MethodModifier::None, "protected void OnEnable()"),
        ];
        for (modifier, expected) in cases {
            let mut m = method("OnEnable", TypeName::primitive("Void"));
            m.access = Accessibility::Protected;
            m.modifier = modifier;
            assert_eq!(SignatureFormatter::method(&m), expected);
        }

        let mut m = method("Tick", TypeName::primitive("Void"));
        m.access = Accessibility::None;
        m.is_static = true;
        assert_eq!(SignatureFormatter::method(&m), "static void Tick()");

        let mut m = method("Build", TypeName::plain("TResult"));
        m.access = Accessibility::ProtectedInternal;
        m.generic_params = vec!["TKey".to_string(), "TResult".to_string()];
        m.params.push(ParamDescriptor::new(
            "keys",
            TypeName::generic("IEnumerable`1", vec![TypeName::plain("TKey")]),
        ));
        m.params.push(ParamDescriptor {
            is_optional: true,
            ..ParamDescriptor::new("limit", TypeName::primitive("Int32"))
        });
        assert_eq!(
            SignatureFormatter::method(&m),
            "protected internal TResult Build<TKey, TResult>(IEnumerable<TKey> keys, int limit)"
        );
    }

    #[test]
    fn fields() {
        let mut f = FieldDescriptor::new("Bar", Token::new(0x04000001), TypeName::primitive("string"));
        f.is_static = true;
        f.is_read_only = true;
        assert_eq!(
            SignatureFormatter::field(&f),
            "public static readonly string Bar"
        );

        let mut f = FieldDescriptor::new("MaxHealth", Token::new(0x04000002), TypeName::primitive("Int32"));
        f.access = Accessibility::Internal;
        f.is_static = true;
        f.is_constant = true;
        assert_eq!(SignatureFormatter::field(&f), "internal static const int MaxHealth");

        // readonly takes precedence over const in invalid input
        f.is_read_only = true;
        assert_eq!(
            SignatureFormatter::field(&f),
            "internal static readonly int MaxHealth"
        );

        let mut f = FieldDescriptor::new(
            "slots",
            Token::new(0x04000003),
            TypeName::array(TypeName::nested(TypeName::plain("Inventory"), "Slot")),
        );
        f.access = Accessibility::Private;
        assert_eq!(SignatureFormatter::field(&f), "private Inventory.Slot[] slots");
    }

    #[test]
    fn deterministic() {
        let mut m = method("Spawn", TypeName::generic("Task`1", vec![TypeName::plain("Enemy")]));
        m.params.push(ParamDescriptor::new("position", TypeName::plain("Vector3")));
        let first = SignatureFormatter::method(&m);
        for _ in 0..10 {
            assert_eq!(SignatureFormatter::method(&m.clone()), first);
        }
    }
}
