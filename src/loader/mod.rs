//! ECMA-335 module loading.
//!
//! [`CilProvider`] is the [`MetadataProvider`] shipped with the crate. It reads a .NET PE module
//! directly, without a managed runtime:
//!
//! ```text
//! PE (goblin) -> CLR header -> metadata root -> #Strings / #Blob / #~ -> rows -> descriptors
//! ```
//!
//! Everything below the provider is bounds-checked. A module that is not a PE, carries no CLR
//! header or has an unreadable metadata root fails as a whole; a single type with a malformed
//! signature or out-of-range member list only fails itself and is reported through
//! [`LoadedModule::diagnostics`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use typedump::{loader::CilProvider, MetadataProvider};
//!
//! let module = CilProvider::default().load(Path::new("Managed/Assembly-CSharp.dll"))?;
//! for ty in &module.types {
//!     println!("{} ({} methods)", ty.full_name, ty.methods.len());
//! }
//! # Ok::<(), typedump::Error>(())
//! ```

pub mod cor20header;
pub mod file;
pub mod io;
pub mod parser;
pub mod root;
pub mod rows;
pub mod signature;
pub mod streams;
pub mod tables;

mod resolver;

use std::{path::Path, sync::Arc};

use log::{debug, warn};
use rayon::prelude::*;

use crate::{
    descriptor::TypeDescriptor,
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    loader::{
        cor20header::{Cor20Header, COR20_HEADER_SIZE},
        file::File,
        resolver::Resolver,
        root::Root,
        rows::{AssemblyRaw, AssemblyRefRaw, ModuleRaw},
        streams::{Blob, Strings},
        tables::TablesHeader,
    },
    provider::{sibling_resolver, LoadedModule, MetadataProvider, SiblingResolver},
    token::Token,
    Error, Result,
};

/// A heap holding only the mandatory empty entry, used when a module omits the stream.
const EMPTY_HEAP: &[u8] = &[0];

/// Reads .NET modules through their ECMA-335 metadata.
#[derive(Default, Clone)]
pub struct CilProvider {
    siblings: Option<SiblingResolver>,
}

impl CilProvider {
    /// A provider that checks references against the module's own directory.
    #[must_use]
    pub fn new() -> Self {
        CilProvider::default()
    }

    /// A provider that checks references with `siblings` instead.
    #[must_use]
    pub fn with_resolver(siblings: SiblingResolver) -> Self {
        CilProvider {
            siblings: Some(siblings),
        }
    }

    /// Loads a module from an in-memory PE image.
    ///
    /// # Errors
    /// Fails if `data` is not a PE image with readable CLR metadata.
    pub fn load_bytes(&self, data: Vec<u8>) -> Result<LoadedModule> {
        let file = File::from_mem(data)?;
        self.load_metadata_with(metadata_slice(&file)?, self.siblings.as_ref())
    }

    /// Loads a module from its raw metadata, starting at the `BSJB` root.
    ///
    /// # Errors
    /// Fails if the metadata root, heaps or tables header are unreadable.
    pub fn load_metadata(&self, metadata: &[u8]) -> Result<LoadedModule> {
        self.load_metadata_with(metadata, self.siblings.as_ref())
    }

    fn load_metadata_with(
        &self,
        metadata: &[u8],
        siblings: Option<&SiblingResolver>,
    ) -> Result<LoadedModule> {
        let root = Root::read(metadata)?;
        let stream = |name: &str| {
            root.stream(name).and_then(|header| {
                metadata.get(header.offset as usize..(header.offset + header.size) as usize)
            })
        };

        let Some(tables_data) = stream("#~").or_else(|| stream("#-")) else {
            return Err(malformed_error!("Module has no tables stream"));
        };
        let strings = Strings::from(stream("#Strings").unwrap_or(EMPTY_HEAP))?;
        let blobs = Blob::from(stream("#Blob").unwrap_or(EMPTY_HEAP))?;
        let tables = TablesHeader::from(tables_data)?;

        debug!(
            "Metadata {} with tables schema {}.{}",
            root.version, tables.major_version, tables.minor_version
        );

        let name = module_name(&tables, strings);
        let diagnostics = Arc::new(Diagnostics::new());
        check_references(&tables, strings, siblings, &diagnostics);

        let resolver = Resolver::new(strings, blobs, &tables, diagnostics.clone());
        let typedefs = resolver.type_defs();

        let resolved: Vec<(Token, Result<Option<TypeDescriptor>>)> = typedefs
            .par_iter()
            .map(|typedef| (typedef.token, resolver.resolve_type(typedef)))
            .collect();

        let mut types = Vec::with_capacity(resolved.len());
        for (token, result) in resolved {
            match result {
                Ok(Some(descriptor)) => types.push(descriptor),
                Ok(None) => {}
                Err(error) => diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Error,
                        DiagnosticCategory::Type,
                        format!("Failed to resolve type - {error}"),
                    )
                    .with_token(token),
                ),
            }
        }

        debug!(
            "Resolved {} of {} type definitions",
            types.len(),
            typedefs.len()
        );

        Ok(LoadedModule {
            name,
            types,
            diagnostics,
        })
    }
}

impl MetadataProvider for CilProvider {
    fn load(&self, path: &Path) -> Result<LoadedModule> {
        if !path.is_file() {
            return Err(Error::ModuleNotFound(path.to_path_buf()));
        }

        let file = File::from_file(path)?;
        let siblings = match &self.siblings {
            Some(siblings) => siblings.clone(),
            None => sibling_resolver(path.parent().unwrap_or(Path::new("."))),
        };

        self.load_metadata_with(metadata_slice(&file)?, Some(&siblings))
    }
}

/// The metadata blob of a PE module, located through the CLR header.
fn metadata_slice(file: &File) -> Result<&[u8]> {
    let (clr_rva, clr_size) = file.clr();
    if clr_rva == 0 || clr_size < COR20_HEADER_SIZE {
        return Err(malformed_error!(
            "File does not carry CLR metadata - rva {}, size {}",
            clr_rva,
            clr_size
        ));
    }

    let clr_offset = file.rva_to_offset(clr_rva)?;
    let header = Cor20Header::read(file.data_slice(clr_offset, COR20_HEADER_SIZE)?)?;

    let metadata_offset = file.rva_to_offset(header.meta_data_rva as usize)?;
    file.data_slice(metadata_offset, header.meta_data_size as usize)
}

/// Assembly name, or the module name without extension for modules without a manifest.
fn module_name(tables: &TablesHeader<'_>, strings: Strings<'_>) -> String {
    let assembly = tables
        .table::<AssemblyRaw>()
        .and_then(|table| table.get(1))
        .and_then(|row| strings.get(row.name as usize).ok());

    let name = assembly.or_else(|| {
        tables
            .table::<ModuleRaw>()
            .and_then(|table| table.get(1))
            .and_then(|row| strings.get(row.name as usize).ok())
            .map(|name| name.strip_suffix(".dll").unwrap_or(name))
    });

    name.unwrap_or_default().to_string()
}

/// Logs whether each referenced assembly is available beside the module.
fn check_references(
    tables: &TablesHeader<'_>,
    strings: Strings<'_>,
    siblings: Option<&SiblingResolver>,
    diagnostics: &Diagnostics,
) {
    let (Some(references), Some(siblings)) = (tables.table::<AssemblyRefRaw>(), siblings) else {
        return;
    };

    for reference in &references {
        match strings.get(reference.name as usize) {
            Ok(name) => match siblings(name) {
                Some(path) => debug!("Reference {} resolves to {}", name, path.display()),
                None => debug!("Reference {} not found beside the module", name),
            },
            Err(error) => {
                warn!("AssemblyRef {} has no readable name", reference.token);
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Warning,
                        DiagnosticCategory::Reference,
                        format!("Unreadable assembly reference name - {error}"),
                    )
                    .with_token(reference.token),
                );
            }
        }
    }
}
