//! Noise filtering: which types and members make it into a report.
//!
//! [`TypeSelector`] decides per type, [`MemberFilter`] per method and field. Both are pure
//! predicates over descriptors plus the user supplied [`Filters`].

use crate::descriptor::{FieldDescriptor, MethodDescriptor, TypeDescriptor};

/// Namespaces whose types are framework or engine code, never user code.
pub const EXCLUDED_NAMESPACES: &[&str] = &[
    "System.",
    "Microsoft.",
    "UnityEngine.",
    "Unity.",
    "TMPro.",
    "Mono.",
    "AOT.",
    "JetBrains.",
];

/// Name prefixes of property and event accessors.
const ACCESSOR_PREFIXES: &[&str] = &["get_", "set_", "add_", "remove_"];

/// Optional substring filters supplied by the caller.
///
/// Both filters are case-sensitive. A filter that is empty or only whitespace is treated as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Keep only types whose simple or full name contains this substring
    pub class_name: Option<String>,
    /// Keep only methods whose name contains this substring
    pub method_name: Option<String>,
}

impl Filters {
    /// Builds filters from optional strings, discarding blank values.
    #[must_use]
    pub fn new(class_name: Option<&str>, method_name: Option<&str>) -> Self {
        Filters {
            class_name: non_blank(class_name),
            method_name: non_blank(method_name),
        }
    }

    /// The effective class-name filter.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref().filter(|f| !f.trim().is_empty())
    }

    /// The effective method-name filter.
    #[must_use]
    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref().filter(|f| !f.trim().is_empty())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(ToString::to_string)
}

/// Decides whether a type is in scope for reporting.
pub struct TypeSelector;

impl TypeSelector {
    /// Returns `true` if `ty` should be reported.
    ///
    /// Checks, in order: the class-name filter, the excluded namespaces, the compiler-generated
    /// heuristics, and finally whether the type declares any member at all.
    #[must_use]
    pub fn accepts(ty: &TypeDescriptor, filters: &Filters) -> bool {
        if let Some(filter) = filters.class_name() {
            if !ty.name.contains(filter) && !ty.full_name.contains(filter) {
                return false;
            }
        }

        if Self::is_framework_type(ty) || Self::is_generated_type(ty) {
            return false;
        }

        !ty.has_no_members()
    }

    /// Returns `true` if the type lives in one of [`EXCLUDED_NAMESPACES`].
    #[must_use]
    pub fn is_framework_type(ty: &TypeDescriptor) -> bool {
        EXCLUDED_NAMESPACES
            .iter()
            .any(|ns| ty.full_name.starts_with(ns))
    }

    /// Returns `true` if the type was emitted by the compiler (closures, iterators,
    /// anonymous types, fixed buffers, ...).
    #[must_use]
    pub fn is_generated_type(ty: &TypeDescriptor) -> bool {
        let name = ty.name.as_str();
        ty.compiler_generated
            || name.contains('<')
            || name.contains('>')
            || name.starts_with("__")
            || name.contains("AnonymousType")
            || name.contains("DisplayClass")
            || name.contains("<>")
    }
}

/// Decides, per member, whether it is signal or noise.
pub struct MemberFilter;

impl MemberFilter {
    /// Returns `true` if the method should appear in the report.
    #[must_use]
    pub fn accepts_method(method: &MethodDescriptor, filters: &Filters) -> bool {
        if let Some(filter) = filters.method_name() {
            if !method.name.contains(filter) {
                return false;
            }
        }

        !Self::is_generated_method(method)
    }

    /// Returns `true` if the field should appear in the report.
    ///
    /// Fields are never subject to the method-name filter.
    #[must_use]
    pub fn accepts_field(field: &FieldDescriptor) -> bool {
        !(field.compiler_generated || is_generated_name(&field.name))
    }

    /// Returns `true` for compiler-generated methods and property/event accessors.
    #[must_use]
    pub fn is_generated_method(method: &MethodDescriptor) -> bool {
        method.compiler_generated
            || ACCESSOR_PREFIXES
                .iter()
                .any(|prefix| method.name.starts_with(prefix))
            || is_generated_name(&method.name)
    }
}

fn is_generated_name(name: &str) -> bool {
    name.contains('<') || name.contains('>') || name.starts_with("__") || name.starts_with("<>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        descriptor::{FieldDescriptor, MethodDescriptor, TypeName},
        token::Token,
    };

    fn player() -> TypeDescriptor {
        let mut ty = TypeDescriptor::new("Player", "Game.Player", Token::new(0x02000002));
        ty.methods.push(MethodDescriptor::new(
            "Jump",
            Token::new(0x06000001),
            TypeName::primitive("void"),
        ));
        ty
    }

    fn method(name: &str) -> MethodDescriptor {
        MethodDescriptor::new(name, Token::new(0x06000001), TypeName::primitive("void"))
    }

    fn field(name: &str) -> FieldDescriptor {
        FieldDescriptor::new(name, Token::new(0x04000001), TypeName::primitive("int"))
    }

    #[test]
    fn accepts_user_type() {
        assert!(TypeSelector::accepts(&player(), &Filters::default()));
    }

    #[test]
    fn class_filter_matches_simple_or_full_name() {
        let ty = player();
        assert!(TypeSelector::accepts(&ty, &Filters::new(Some("Play"), None)));
        assert!(TypeSelector::accepts(&ty, &Filters::new(Some("Game."), None)));
        assert!(!TypeSelector::accepts(&ty, &Filters::new(Some("Enemy"), None)));
        // case-sensitive
        assert!(!TypeSelector::accepts(&ty, &Filters::new(Some("player"), None)));
    }

    #[test]
    fn blank_filters_are_ignored() {
        let filters = Filters::new(Some("   "), Some(""));
        assert_eq!(filters, Filters::default());

        let raw = Filters {
            class_name: Some(" \t".to_string()),
            method_name: None,
        };
        assert!(TypeSelector::accepts(&player(), &raw));
    }

    #[test]
    fn class_filter_is_idempotent() {
        let filters = Filters::new(Some("Play"), None);
        let types = [player(), {
            let mut t = player();
            t.name = "Enemy".to_string();
            t.full_name = "Game.Enemy".to_string();
            t
        }];

        let first: Vec<&TypeDescriptor> = types
            .iter()
            .filter(|t| TypeSelector::accepts(t, &filters))
            .collect();
        let second: Vec<&TypeDescriptor> = first
            .iter()
            .copied()
            .filter(|t| TypeSelector::accepts(t, &filters))
            .collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn excludes_framework_namespaces() {
        for full_name in [
            "System.String",
            "Microsoft.Win32.Registry",
            "UnityEngine.MonoBehaviour",
            "Unity.Collections.NativeArray",
            "TMPro.TMP_Text",
            "Mono.Security.Cryptography",
            "AOT.MonoPInvokeCallbackAttribute",
            "JetBrains.Annotations.NotNullAttribute",
        ] {
            let mut ty = player();
            ty.full_name = full_name.to_string();
            assert!(
                !TypeSelector::accepts(&ty, &Filters::default()),
                "{full_name} should be excluded"
            );
        }

        // Prefix match only; a namespace merely named like one is fine
        let mut ty = player();
        ty.full_name = "SystemsGame.Player".to_string();
        assert!(TypeSelector::accepts(&ty, &Filters::default()));
    }

    #[test]
    fn excludes_generated_types() {
        for name in [
            "<>c",
            "<Start>d__4",
            "__StaticArrayInitTypeSize=16",
            "<>f__AnonymousType0`2",
            "AnonymousTypeHolder",
            "DisplayClass5_0",
            "Weird>Name",
        ] {
            let mut ty = player();
            ty.name = name.to_string();
            assert!(
                !TypeSelector::accepts(&ty, &Filters::default()),
                "{name} should be excluded"
            );
        }

        let mut ty = player();
        ty.compiler_generated = true;
        assert!(!TypeSelector::accepts(&ty, &Filters::default()));
    }

    #[test]
    fn excludes_memberless_types() {
        let ty = TypeDescriptor::new("Marker", "Game.Marker", Token::new(0x02000003));
        assert!(!TypeSelector::accepts(&ty, &Filters::default()));

        let mut with_field = ty.clone();
        with_field.fields.push(field("value"));
        assert!(TypeSelector::accepts(&with_field, &Filters::default()));
    }

    #[test]
    fn method_noise() {
        let filters = Filters::default();
        for name in [
            "get_Health",
            "set_Health",
            "add_OnDeath",
            "remove_OnDeath",
            "<Start>b__0",
            "__Gen",
            "<>m__Finally1",
            "Do>It",
        ] {
            assert!(
                !MemberFilter::accepts_method(&method(name), &filters),
                "{name} should be excluded"
            );
        }

        assert!(MemberFilter::accepts_method(&method("Update"), &filters));
        // Only prefixes count as accessors
        assert!(MemberFilter::accepts_method(&method("Reset_get_"), &filters));

        let mut generated = method("Update");
        generated.compiler_generated = true;
        assert!(!MemberFilter::accepts_method(&generated, &filters));
    }

    #[test]
    fn method_name_filter() {
        let filters = Filters::new(None, Some("Damage"));
        assert!(MemberFilter::accepts_method(&method("TakeDamage"), &filters));
        assert!(!MemberFilter::accepts_method(&method("Heal"), &filters));
        // The name filter does not re-admit accessors
        assert!(!MemberFilter::accepts_method(&method("get_Damage"), &filters));
    }

    #[test]
    fn field_noise() {
        assert!(MemberFilter::accepts_field(&field("health")));
        assert!(!MemberFilter::accepts_field(&field("<Health>k__BackingField")));
        assert!(!MemberFilter::accepts_field(&field("__cache")));
        assert!(!MemberFilter::accepts_field(&field("<>9")));

        let mut generated = field("health");
        generated.compiler_generated = true;
        assert!(!MemberFilter::accepts_field(&generated));
    }
}
