//! Resolution of raw metadata rows into descriptors.
//!
//! [`Resolver`] indexes the cross-table relations once (nesting, generic parameters,
//! compiler-generated markers) and then resolves each `TypeDef` independently, so types can be
//! resolved in parallel and a malformed type fails alone.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use log::debug;

use crate::{
    descriptor::{
        Accessibility, FieldDescriptor, MethodDescriptor, MethodModifier, ParamDescriptor,
        TypeDescriptor, TypeKind, TypeName,
    },
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    loader::{
        rows::{
            CustomAttributeRaw, FieldPtrRaw, FieldRaw, GenericParamRaw, MemberRefRaw,
            MetadataTable, MethodDefRaw, MethodPtrRaw, NestedClassRaw, ParamPtrRaw, ParamRaw,
            RowReadable, TypeDefRaw, TypeRefRaw, TypeSpecRaw,
        },
        signature::{SignatureParser, TypeSignature, MAX_RECURSION_DEPTH},
        streams::{Blob, Strings},
        tables::{CodedIndex, TableId, TablesHeader},
    },
    token::Token,
    Error::RecursionLimit,
    Result,
};

const COMPILER_SERVICES_NAMESPACE: &str = "System.Runtime.CompilerServices";
const COMPILER_GENERATED_ATTRIBUTE: &str = "CompilerGeneratedAttribute";

/// `TypeAttributes.VisibilityMask`
const TYPE_VISIBILITY_MASK: u32 = 0x0007;
/// `TypeAttributes.NestedPublic`
const TYPE_NESTED_PUBLIC: u32 = 0x0002;
/// `TypeAttributes.Interface`
const TYPE_INTERFACE: u32 = 0x0020;

const METHOD_STATIC: u32 = 0x0010;
const METHOD_FINAL: u32 = 0x0020;
const METHOD_VIRTUAL: u32 = 0x0040;
const METHOD_ABSTRACT: u32 = 0x0400;

const FIELD_STATIC: u32 = 0x0010;
const FIELD_INIT_ONLY: u32 = 0x0020;
const FIELD_LITERAL: u32 = 0x0040;

const PARAM_OUT: u32 = 0x0002;
const PARAM_OPTIONAL: u32 = 0x0010;

/// Runtime names of the types C# spells with a keyword, all in `System`.
const RUNTIME_PRIMITIVES: &[&str] = &[
    "Void", "Boolean", "Char", "SByte", "Byte", "Int16", "UInt16", "Int32", "UInt32", "Int64",
    "UInt64", "Single", "Double", "Decimal", "String", "Object",
];

/// Runtime name of a signature element type that needs no table lookup.
fn element_runtime_name(sig: &TypeSignature) -> Option<&'static str> {
    Some(match sig {
        TypeSignature::Void => "Void",
        TypeSignature::Boolean => "Boolean",
        TypeSignature::Char => "Char",
        TypeSignature::I1 => "SByte",
        TypeSignature::U1 => "Byte",
        TypeSignature::I2 => "Int16",
        TypeSignature::U2 => "UInt16",
        TypeSignature::I4 => "Int32",
        TypeSignature::U4 => "UInt32",
        TypeSignature::I8 => "Int64",
        TypeSignature::U8 => "UInt64",
        TypeSignature::R4 => "Single",
        TypeSignature::R8 => "Double",
        TypeSignature::String => "String",
        TypeSignature::Object => "Object",
        TypeSignature::I => "IntPtr",
        TypeSignature::U => "UIntPtr",
        TypeSignature::TypedByRef => "TypedReference",
        _ => return None,
    })
}

/// Simple runtime name of a resolved type, used for pointer rendering.
fn simple_name(name: &TypeName) -> String {
    match name {
        TypeName::Primitive(name) | TypeName::Plain(name) => name.clone(),
        TypeName::Generic { base, .. } => base.clone(),
        TypeName::NestedNonPublic { name, .. } => name.clone(),
        TypeName::Array(element) => format!("{}[]", simple_name(element)),
        TypeName::ByRef(element) | TypeName::NullableValue(element) => simple_name(element),
    }
}

/// The member lists a `TypeDef` or `MethodDef` row owns a run of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberList {
    Field,
    Method,
    Param,
}

/// Generic parameter names in scope while resolving a signature.
#[derive(Clone, Copy, Default)]
struct GenericContext<'r> {
    type_params: &'r [String],
    method_params: &'r [String],
}

/// Resolves `TypeDef` rows of one module into [`TypeDescriptor`]s.
pub(crate) struct Resolver<'a> {
    strings: Strings<'a>,
    blobs: Blob<'a>,
    typedefs: Option<MetadataTable<'a, TypeDefRaw>>,
    typerefs: Option<MetadataTable<'a, TypeRefRaw>>,
    typespecs: Option<MetadataTable<'a, TypeSpecRaw>>,
    fields: Option<MetadataTable<'a, FieldRaw>>,
    field_ptrs: Option<MetadataTable<'a, FieldPtrRaw>>,
    methods: Option<MetadataTable<'a, MethodDefRaw>>,
    method_ptrs: Option<MetadataTable<'a, MethodPtrRaw>>,
    params: Option<MetadataTable<'a, ParamRaw>>,
    param_ptrs: Option<MetadataTable<'a, ParamPtrRaw>>,
    /// Nested `TypeDef` row -> enclosing `TypeDef` row
    enclosing: HashMap<u32, u32>,
    /// `TypeDef` row -> generic parameter names by position
    type_generics: HashMap<u32, Vec<String>>,
    /// `MethodDef` row -> generic parameter names by position
    method_generics: HashMap<u32, Vec<String>>,
    compiler_generated: HashSet<Token>,
    diagnostics: Arc<Diagnostics>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        strings: Strings<'a>,
        blobs: Blob<'a>,
        tables: &TablesHeader<'a>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        let mut resolver = Resolver {
            strings,
            blobs,
            typedefs: tables.table::<TypeDefRaw>(),
            typerefs: tables.table::<TypeRefRaw>(),
            typespecs: tables.table::<TypeSpecRaw>(),
            fields: tables.table::<FieldRaw>(),
            field_ptrs: tables.table::<FieldPtrRaw>(),
            methods: tables.table::<MethodDefRaw>(),
            method_ptrs: tables.table::<MethodPtrRaw>(),
            params: tables.table::<ParamRaw>(),
            param_ptrs: tables.table::<ParamPtrRaw>(),
            enclosing: HashMap::new(),
            type_generics: HashMap::new(),
            method_generics: HashMap::new(),
            compiler_generated: HashSet::new(),
            diagnostics,
        };

        if let Some(nested) = tables.table::<NestedClassRaw>() {
            resolver.enclosing = nested
                .iter()
                .map(|row| (row.nested_class, row.enclosing_class))
                .collect();
        }

        if let Some(generic_params) = tables.table::<GenericParamRaw>() {
            resolver.index_generic_params(&generic_params);
        }

        if let Some(attributes) = tables.table::<CustomAttributeRaw>() {
            let member_refs = tables.table::<MemberRefRaw>();
            resolver.index_compiler_generated(&attributes, member_refs.as_ref());
        }

        resolver
    }

    /// All `TypeDef` rows in definition order.
    pub(crate) fn type_defs(&self) -> Vec<TypeDefRaw> {
        self.typedefs
            .as_ref()
            .map(|table| table.iter().collect())
            .unwrap_or_default()
    }

    /// Resolves one type; `None` for the `<Module>` pseudo type.
    ///
    /// # Errors
    /// Fails for malformed names, signatures or member references of this type.
    pub(crate) fn resolve_type(&self, typedef: &TypeDefRaw) -> Result<Option<TypeDescriptor>> {
        let name = self.strings.get(typedef.type_name as usize)?;
        if name == "<Module>" {
            return Ok(None);
        }

        let mut descriptor =
            TypeDescriptor::new(name, self.full_name(typedef.rid)?, typedef.token);

        descriptor.kind = if typedef.flags & TYPE_INTERFACE != 0 {
            TypeKind::INTERFACE
        } else {
            match self.coded_full_name(&typedef.extends)?.as_deref() {
                Some("System.Enum") => TypeKind::ENUM,
                Some("System.ValueType") => TypeKind::STRUCT,
                _ => TypeKind::CLASS,
            }
        };
        descriptor.compiler_generated = self.compiler_generated.contains(&typedef.token);

        let type_params = self
            .type_generics
            .get(&typedef.rid)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let next = self.typedefs.as_ref().and_then(|t| t.get(typedef.rid + 1));

        for rid in self.list_range(
            typedef.field_list,
            next.as_ref().map(|n| n.field_list),
            MemberList::Field,
            typedef.token,
        ) {
            descriptor.fields.push(self.resolve_field(rid, type_params)?);
        }

        for rid in self.list_range(
            typedef.method_list,
            next.as_ref().map(|n| n.method_list),
            MemberList::Method,
            typedef.token,
        ) {
            if let Some(method) = self.resolve_method(rid, type_params)? {
                descriptor.methods.push(method);
            }
        }

        Ok(Some(descriptor))
    }

    fn resolve_field(&self, rid: u32, type_params: &[String]) -> Result<FieldDescriptor> {
        let Some(row) = self.fields.as_ref().and_then(|t| t.get(rid)) else {
            return Err(malformed_error!("Failed to resolve field - {}", rid));
        };

        let name = self.strings.get(row.name as usize)?;
        let signature =
            SignatureParser::new(self.blobs.get(row.signature as usize)?).parse_field_signature()?;
        let context = GenericContext {
            type_params,
            method_params: &[],
        };

        let mut field = FieldDescriptor::new(
            name,
            row.token,
            self.signature_type_name(&signature.base, context, 0)?,
        );
        field.access = Accessibility::from_access_mask(row.flags as u16);
        field.is_static = row.flags & FIELD_STATIC != 0;
        field.is_read_only = row.flags & FIELD_INIT_ONLY != 0;
        field.is_constant = row.flags & FIELD_LITERAL != 0;
        field.compiler_generated = self.compiler_generated.contains(&row.token);

        Ok(field)
    }

    fn resolve_method(&self, rid: u32, type_params: &[String]) -> Result<Option<MethodDescriptor>> {
        let Some(row) = self.methods.as_ref().and_then(|t| t.get(rid)) else {
            return Err(malformed_error!("Failed to resolve method - {}", rid));
        };

        let name = self.strings.get(row.name as usize)?;
        if name == ".ctor" || name == ".cctor" {
            return Ok(None);
        }

        let signature = SignatureParser::new(self.blobs.get(row.signature as usize)?)
            .parse_method_signature()?;
        let generic_params = self.method_generics.get(&rid).cloned().unwrap_or_default();
        let context = GenericContext {
            type_params,
            method_params: &generic_params,
        };

        let mut return_type = self.signature_type_name(&signature.return_type.base, context, 0)?;
        if signature.return_type.by_ref {
            return_type = TypeName::by_ref(return_type);
        }

        let next_param_list = self
            .methods
            .as_ref()
            .and_then(|t| t.get(rid + 1))
            .map(|next| next.param_list);
        let mut param_rows = HashMap::new();
        for param_rid in self.list_range(row.param_list, next_param_list, MemberList::Param, row.token)
        {
            if let Some(param) = self.params.as_ref().and_then(|t| t.get(param_rid)) {
                param_rows.insert(param.sequence, param);
            }
        }

        let mut params = Vec::with_capacity(signature.params.len());
        for (index, param) in signature.params.iter().enumerate() {
            let mut type_name = self.signature_type_name(&param.base, context, 0)?;
            if param.by_ref {
                type_name = TypeName::by_ref(type_name);
            }

            let (name, flags) = match param_rows.get(&(index as u32 + 1)) {
                Some(row) => (self.strings.get(row.name as usize)?, row.flags),
                None => ("", 0),
            };

            let mut descriptor = ParamDescriptor::new(name, type_name);
            descriptor.is_ref = param.by_ref;
            descriptor.is_out = flags & PARAM_OUT != 0;
            descriptor.is_optional = flags & PARAM_OPTIONAL != 0;
            params.push(descriptor);
        }

        let mut method = MethodDescriptor::new(name, row.token, return_type);
        method.params = params;
        method.access = Accessibility::from_access_mask(row.flags as u16);
        method.is_static = row.flags & METHOD_STATIC != 0;
        method.modifier = MethodModifier::from_flags(
            row.flags & METHOD_VIRTUAL != 0,
            row.flags & METHOD_FINAL != 0,
            row.flags & METHOD_ABSTRACT != 0,
        );
        method.generic_params = generic_params;
        method.compiler_generated = self.compiler_generated.contains(&row.token);

        Ok(Some(method))
    }

    /// Qualified name of a `TypeDef`: `Namespace.Name`, nested types `Enclosing+Name`.
    fn full_name(&self, rid: u32) -> Result<String> {
        let mut parts = Vec::new();
        let mut current = rid;

        loop {
            let (namespace, name) = self.typedef_names(current)?;
            match self.enclosing.get(&current) {
                Some(&outer) => {
                    if parts.len() >= MAX_RECURSION_DEPTH {
                        return Err(RecursionLimit(MAX_RECURSION_DEPTH));
                    }
                    parts.push(name.to_string());
                    current = outer;
                }
                None => {
                    parts.push(if namespace.is_empty() {
                        name.to_string()
                    } else {
                        format!("{namespace}.{name}")
                    });
                    break;
                }
            }
        }

        parts.reverse();
        Ok(parts.join("+"))
    }

    fn typedef_names(&self, rid: u32) -> Result<(&'a str, &'a str)> {
        let Some(row) = self.typedefs.as_ref().and_then(|t| t.get(rid)) else {
            return Err(malformed_error!("Failed to resolve TypeDef - {}", rid));
        };

        Ok((
            self.strings.get(row.type_namespace as usize)?,
            self.strings.get(row.type_name as usize)?,
        ))
    }

    fn typeref_names(&self, rid: u32) -> Result<(&'a str, &'a str)> {
        let Some(row) = self.typerefs.as_ref().and_then(|t| t.get(rid)) else {
            return Err(malformed_error!("Failed to resolve TypeRef - {}", rid));
        };

        Ok((
            self.strings.get(row.type_namespace as usize)?,
            self.strings.get(row.type_name as usize)?,
        ))
    }

    /// Namespace and name of a `TypeDef` or `TypeRef` token.
    fn token_names(&self, token: Token) -> Result<Option<(&'a str, &'a str)>> {
        match token.table() {
            0x02 => self.typedef_names(token.row()).map(Some),
            0x01 => self.typeref_names(token.row()).map(Some),
            _ => Ok(None),
        }
    }

    /// Qualified name of a `TypeDefOrRef` target; `None` for null or `TypeSpec` targets.
    fn coded_full_name(&self, index: &CodedIndex) -> Result<Option<String>> {
        if index.is_null() {
            return Ok(None);
        }

        match index.tag {
            TableId::TypeDef => self.full_name(index.row).map(Some),
            TableId::TypeRef => {
                let (namespace, name) = self.typeref_names(index.row)?;
                Ok(Some(if namespace.is_empty() {
                    name.to_string()
                } else {
                    format!("{namespace}.{name}")
                }))
            }
            _ => Ok(None),
        }
    }

    fn signature_type_name(
        &self,
        sig: &TypeSignature,
        context: GenericContext<'_>,
        depth: usize,
    ) -> Result<TypeName> {
        if depth >= MAX_RECURSION_DEPTH {
            return Err(RecursionLimit(MAX_RECURSION_DEPTH));
        }

        if let Some(runtime_name) = element_runtime_name(sig) {
            return Ok(TypeName::primitive(runtime_name));
        }

        Ok(match sig {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => {
                self.token_type_name(*token, context, depth + 1)?
            }
            TypeSignature::GenericParamType(index) => TypeName::plain(
                context
                    .type_params
                    .get(*index as usize)
                    .cloned()
                    .unwrap_or_else(|| format!("!{index}")),
            ),
            TypeSignature::GenericParamMethod(index) => TypeName::plain(
                context
                    .method_params
                    .get(*index as usize)
                    .cloned()
                    .unwrap_or_else(|| format!("!!{index}")),
            ),
            TypeSignature::SzArray(element) | TypeSignature::Array(element, _) => {
                TypeName::array(self.signature_type_name(element, context, depth + 1)?)
            }
            TypeSignature::ByRef(element) => {
                TypeName::by_ref(self.signature_type_name(element, context, depth + 1)?)
            }
            TypeSignature::Pinned(element) => {
                self.signature_type_name(element, context, depth + 1)?
            }
            TypeSignature::Ptr(element) => {
                let pointee = self.signature_type_name(element, context, depth + 1)?;
                TypeName::plain(format!("{}*", simple_name(&pointee)))
            }
            TypeSignature::FnPtr(_) => TypeName::primitive("IntPtr"),
            TypeSignature::GenericInst(base, args) => {
                let base_token = match base.as_ref() {
                    TypeSignature::Class(token) | TypeSignature::ValueType(token) => *token,
                    other => {
                        return Err(malformed_error!(
                            "Generic instantiation over non-type - {:?}",
                            other
                        ))
                    }
                };

                let Some((namespace, name)) = self.token_names(base_token)? else {
                    return Err(malformed_error!(
                        "Generic instantiation over unsupported token - {}",
                        base_token
                    ));
                };

                let mut type_args = Vec::with_capacity(args.len());
                for arg in args {
                    type_args.push(self.signature_type_name(arg, context, depth + 1)?);
                }

                if namespace == "System" && name == "Nullable`1" && type_args.len() == 1 {
                    TypeName::nullable(type_args.remove(0))
                } else {
                    TypeName::generic(name, type_args)
                }
            }
            other => {
                return Err(malformed_error!(
                    "Unsupported type in member signature - {:?}",
                    other
                ))
            }
        })
    }

    fn token_type_name(
        &self,
        token: Token,
        context: GenericContext<'_>,
        depth: usize,
    ) -> Result<TypeName> {
        if depth >= MAX_RECURSION_DEPTH {
            return Err(RecursionLimit(MAX_RECURSION_DEPTH));
        }

        match token.table() {
            0x02 => {
                let rid = token.row();
                let Some(row) = self.typedefs.as_ref().and_then(|t| t.get(rid)) else {
                    return Err(malformed_error!("Failed to resolve TypeDef - {}", token));
                };

                let namespace = self.strings.get(row.type_namespace as usize)?;
                let name = self.strings.get(row.type_name as usize)?;

                if namespace == "System" && RUNTIME_PRIMITIVES.contains(&name) {
                    return Ok(TypeName::primitive(name));
                }

                if let Some(params) = self.type_generics.get(&rid) {
                    return Ok(TypeName::generic(
                        name,
                        params.iter().map(TypeName::plain).collect(),
                    ));
                }

                match self.enclosing.get(&rid) {
                    Some(&outer) if row.flags & TYPE_VISIBILITY_MASK != TYPE_NESTED_PUBLIC => {
                        let enclosing =
                            self.token_type_name(TableId::TypeDef.token(outer), context, depth + 1)?;
                        Ok(TypeName::nested(enclosing, name))
                    }
                    _ => Ok(TypeName::plain(name)),
                }
            }
            0x01 => {
                let (namespace, name) = self.typeref_names(token.row())?;
                if namespace == "System" && RUNTIME_PRIMITIVES.contains(&name) {
                    Ok(TypeName::primitive(name))
                } else {
                    Ok(TypeName::plain(name))
                }
            }
            0x1B => {
                let Some(row) = self.typespecs.as_ref().and_then(|t| t.get(token.row())) else {
                    return Err(malformed_error!("Failed to resolve TypeSpec - {}", token));
                };

                let signature =
                    SignatureParser::new(self.blobs.get(row.signature as usize)?).parse_type_spec()?;
                self.signature_type_name(&signature, context, depth + 1)
            }
            _ => Err(malformed_error!("Unsupported type token - {}", token)),
        }
    }

    /// Rows of `list` owned by the row whose run starts at `start`.
    ///
    /// The run ends where the next owner's run starts, or at the end of the table. Runs that
    /// point outside the table are clamped and reported as warnings.
    fn list_range(
        &self,
        start: u32,
        next_start: Option<u32>,
        list: MemberList,
        owner: Token,
    ) -> Vec<u32> {
        let len = self.list_len(list);
        let table_end = len + 1;
        let end = next_start.unwrap_or(table_end);

        if start == 0 || start > table_end {
            self.warn_range(owner, list, start, end, len);
            return Vec::new();
        }

        let clamped_end = if end > table_end {
            self.warn_range(owner, list, start, end, len);
            table_end
        } else {
            end
        };

        if clamped_end < start {
            self.warn_range(owner, list, start, end, len);
            return Vec::new();
        }

        (start..clamped_end)
            .filter_map(|index| self.list_target(list, index))
            .collect()
    }

    fn warn_range(&self, owner: Token, list: MemberList, start: u32, end: u32, len: u32) {
        self.diagnostics.push(
            Diagnostic::new(
                DiagnosticSeverity::Warning,
                DiagnosticCategory::Table,
                format!("{list:?} list {start}..{end} exceeds table of {len} rows, clamped"),
            )
            .with_token(owner),
        );
    }

    fn list_len(&self, list: MemberList) -> u32 {
        fn rows<T: RowReadable>(table: Option<&MetadataTable<'_, T>>) -> u32 {
            table.map_or(0, |table| table.row_count())
        }

        match list {
            MemberList::Field => match &self.field_ptrs {
                Some(ptrs) => ptrs.row_count(),
                None => rows(self.fields.as_ref()),
            },
            MemberList::Method => match &self.method_ptrs {
                Some(ptrs) => ptrs.row_count(),
                None => rows(self.methods.as_ref()),
            },
            MemberList::Param => match &self.param_ptrs {
                Some(ptrs) => ptrs.row_count(),
                None => rows(self.params.as_ref()),
            },
        }
    }

    /// Maps a position in a member list to the target row, through the pointer table if any.
    fn list_target(&self, list: MemberList, index: u32) -> Option<u32> {
        match list {
            MemberList::Field => match &self.field_ptrs {
                Some(ptrs) => ptrs.get(index).map(|ptr| ptr.field),
                None => Some(index),
            },
            MemberList::Method => match &self.method_ptrs {
                Some(ptrs) => ptrs.get(index).map(|ptr| ptr.method),
                None => Some(index),
            },
            MemberList::Param => match &self.param_ptrs {
                Some(ptrs) => ptrs.get(index).map(|ptr| ptr.param),
                None => Some(index),
            },
        }
    }

    fn index_generic_params(&mut self, table: &MetadataTable<'a, GenericParamRaw>) {
        let mut by_owner: HashMap<Token, Vec<(u32, String)>> = HashMap::new();

        for row in table {
            let name = match self.strings.get(row.name as usize) {
                Ok(name) => name.to_string(),
                Err(error) => {
                    self.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticSeverity::Warning,
                            DiagnosticCategory::Heap,
                            format!("Generic parameter name unreadable - {error}"),
                        )
                        .with_token(row.token),
                    );
                    continue;
                }
            };

            by_owner
                .entry(row.owner.token)
                .or_default()
                .push((row.number, name));
        }

        for (owner, mut params) in by_owner {
            params.sort_by_key(|(number, _)| *number);
            let names = params.into_iter().map(|(_, name)| name).collect();

            match owner.table() {
                0x02 => {
                    self.type_generics.insert(owner.row(), names);
                }
                0x06 => {
                    self.method_generics.insert(owner.row(), names);
                }
                _ => {}
            }
        }
    }

    fn index_compiler_generated(
        &mut self,
        attributes: &MetadataTable<'a, CustomAttributeRaw>,
        member_refs: Option<&MetadataTable<'a, MemberRefRaw>>,
    ) {
        let mut marked = HashSet::new();

        for attribute in attributes {
            let attribute_type = match attribute.constructor.tag {
                TableId::MethodDef => self
                    .method_owner(attribute.constructor.row)
                    .and_then(|owner| self.typedef_names(owner).ok()),
                TableId::MemberRef => member_refs
                    .and_then(|table| table.get(attribute.constructor.row))
                    .and_then(|member| match member.class.tag {
                        TableId::TypeRef => self.typeref_names(member.class.row).ok(),
                        TableId::TypeDef => self.typedef_names(member.class.row).ok(),
                        _ => None,
                    }),
                _ => None,
            };

            if attribute_type
                == Some((COMPILER_SERVICES_NAMESPACE, COMPILER_GENERATED_ATTRIBUTE))
            {
                marked.insert(attribute.parent.token);
            }
        }

        debug!("{} members marked as compiler generated", marked.len());
        self.compiler_generated = marked;
    }

    /// The `TypeDef` row whose method run contains `method_rid`.
    fn method_owner(&self, method_rid: u32) -> Option<u32> {
        let typedefs = self.typedefs.as_ref()?;

        let mut rows = typedefs.iter().peekable();
        while let Some(row) = rows.next() {
            let next = rows.peek().map(|next| next.method_list);
            let end = next.unwrap_or(self.list_len(MemberList::Method) + 1);
            let owns = (row.method_list..end)
                .any(|index| self.list_target(MemberList::Method, index) == Some(method_rid));
            if owns {
                return Some(row.rid);
            }
        }

        None
    }
}
