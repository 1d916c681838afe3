//! The seam between the dump pipeline and whatever reads a module.
//!
//! A [`MetadataProvider`] turns a module path into [`TypeDescriptor`]s. The pipeline never looks
//! at raw bytes; [`crate::loader::CilProvider`] is the provider shipped with the crate, tests use
//! in-memory ones.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{descriptor::TypeDescriptor, diagnostics::Diagnostics, Result};

/// A loaded module: its types plus whatever went wrong while resolving them.
#[derive(Debug, Default)]
pub struct LoadedModule {
    /// Module (assembly) name
    pub name: String,
    /// Types that resolved, in definition order
    pub types: Vec<TypeDescriptor>,
    /// Per-type resolution failures; the matching types are absent from `types`
    pub diagnostics: Arc<Diagnostics>,
}

impl LoadedModule {
    /// A module without diagnostics.
    pub fn new(name: impl Into<String>, types: Vec<TypeDescriptor>) -> Self {
        LoadedModule {
            name: name.into(),
            types,
            diagnostics: Arc::new(Diagnostics::new()),
        }
    }
}

/// Yields the type descriptors of a module.
pub trait MetadataProvider: Send + Sync {
    /// Loads the module at `path`.
    ///
    /// A module that loads only partially is still `Ok`; the failures are in
    /// [`LoadedModule::diagnostics`].
    ///
    /// # Errors
    /// Returns an error if the module cannot be read or is not a valid module at all.
    fn load(&self, path: &Path) -> Result<LoadedModule>;
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for Box<P> {
    fn load(&self, path: &Path) -> Result<LoadedModule> {
        (**self).load(path)
    }
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for Arc<P> {
    fn load(&self, path: &Path) -> Result<LoadedModule> {
        (**self).load(path)
    }
}

/// Maps a referenced assembly name to the module file that would satisfy it.
pub type SiblingResolver = Arc<dyn Fn(&str) -> Option<PathBuf> + Send + Sync>;

/// Resolves assembly names to `{dir}/{name}.dll`, if that file exists.
///
/// ```rust,no_run
/// let resolve = typedump::provider::sibling_resolver("Game_Data/Managed");
/// if let Some(path) = resolve("UnityEngine.CoreModule") {
///     println!("{}", path.display());
/// }
/// ```
pub fn sibling_resolver(dir: impl Into<PathBuf>) -> SiblingResolver {
    let dir = dir.into();
    Arc::new(move |name: &str| {
        let candidate = dir.join(format!("{name}.dll"));
        candidate.is_file().then_some(candidate)
    })
}
