//! The dump pipeline.
//!
//! One run walks a module's types once, in order:
//!
//! ```text
//! Discover -> { Select -> Filter -> Format -> Assemble }* -> { Write }|| -> Join -> Report
//! ```
//!
//! Selection, filtering, formatting and assembly are sequential. Every page is handed to the
//! [`ReportWriter`] as soon as it is assembled and written on the `rayon` pool; the run returns
//! only after all writes joined. Totals are counted during assembly, so a failed write never
//! changes them.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{error, info};

use crate::{
    diagnostics::Diagnostics,
    filter::{Filters, TypeSelector},
    provider::MetadataProvider,
    report::ReportAssembler,
    writer::{ReportWriter, WriteFailure},
    Error, Result,
};

/// Counters accumulated while assembling pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Methods emitted across all pages
    pub methods: usize,
    /// Types that produced a page
    pub classes: usize,
}

/// What a run produced.
#[derive(Debug)]
pub struct DumpSummary {
    /// Name of the dumped module
    pub module: String,
    /// Method and class totals
    pub totals: RunTotals,
    /// Directory the pages went to
    pub output_dir: PathBuf,
    /// Pages successfully written
    pub pages_written: usize,
    /// Pages whose write failed
    pub failed_writes: Vec<WriteFailure>,
    /// Problems reported by the provider while loading
    pub diagnostics: Arc<Diagnostics>,
}

/// Runs the dump pipeline for modules read through `P`.
pub struct Dumper<P: MetadataProvider> {
    provider: P,
    output_dir: PathBuf,
}

impl<P: MetadataProvider> Dumper<P> {
    /// Creates a dumper writing pages into `output_dir`.
    pub fn new(provider: P, output_dir: impl Into<PathBuf>) -> Self {
        Dumper {
            provider,
            output_dir: output_dir.into(),
        }
    }

    /// The directory pages are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Dumps every selected type of `module`.
    ///
    /// # Errors
    /// - [`Error::ModuleNotFound`] if `module` is not an existing file; nothing is written.
    /// - Any error of the provider if the module cannot be loaded at all.
    /// - [`Error::FileError`] if the output directory cannot be created.
    ///
    /// Individual write failures are not errors; they are reported in
    /// [`DumpSummary::failed_writes`].
    pub fn run(&self, module: &Path, filters: &Filters) -> Result<DumpSummary> {
        if !module.is_file() {
            error!("{} not found", module.display());
            return Err(Error::ModuleNotFound(module.to_path_buf()));
        }
        info!("Found file: {}", module.display());

        let loaded = self.provider.load(module)?;
        info!("Assembly {} has been loaded", loaded.name);
        for diagnostic in loaded.diagnostics.iter() {
            error!("Loader exception: {diagnostic}");
        }
        info!("Found {} types in the assembly", loaded.types.len());

        let writer = ReportWriter::new(&self.output_dir)?;
        let mut totals = RunTotals::default();

        rayon::scope(|scope| {
            for ty in &loaded.types {
                if !TypeSelector::accepts(ty, filters) {
                    continue;
                }

                info!("Type: {}", ty.full_name);
                let Some(page) = ReportAssembler::assemble(ty, filters) else {
                    continue;
                };

                totals.methods += page.method_count();
                totals.classes += 1;
                writer.dispatch(scope, page);
            }
        });

        let outcome = writer.finish();
        info!(
            "Total {} methods found in {} classes",
            totals.methods, totals.classes
        );
        info!("Results saved in {}", self.output_dir.display());

        Ok(DumpSummary {
            module: loaded.name,
            totals,
            output_dir: self.output_dir.clone(),
            pages_written: outcome.written,
            failed_writes: outcome.failures,
            diagnostics: loaded.diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        descriptor::{FieldDescriptor, MethodDescriptor, TypeDescriptor, TypeName},
        diagnostics::DiagnosticCategory,
        provider::LoadedModule,
        token::Token,
    };
    use std::fs;

    struct Fixed(Vec<TypeDescriptor>);

    impl MetadataProvider for Fixed {
        fn load(&self, _path: &Path) -> Result<LoadedModule> {
            let module = LoadedModule::new("Assembly-CSharp", self.0.clone());
            module
                .diagnostics
                .error(DiagnosticCategory::Signature, "Bad signature for 'Broken'");
            Ok(module)
        }
    }

    fn ty(name: &str, methods: &[&str], fields: &[&str]) -> TypeDescriptor {
        let mut ty = TypeDescriptor::new(name, format!("Game.{name}"), Token::new(0x02000002));
        for (i, m) in methods.iter().enumerate() {
            ty.methods.push(MethodDescriptor::new(
                *m,
                Token::new(0x06000001 + i as u32),
                TypeName::primitive("Void"),
            ));
        }
        for (i, f) in fields.iter().enumerate() {
            ty.fields.push(FieldDescriptor::new(
                *f,
                Token::new(0x04000001 + i as u32),
                TypeName::primitive("Int32"),
            ));
        }
        ty
    }

    fn module_file(dir: &Path) -> PathBuf {
        let path = dir.join("Assembly-CSharp.dll");
        fs::write(&path, b"MZ").unwrap();
        path
    }

    #[test]
    fn missing_module_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let dumper = Dumper::new(Fixed(vec![ty("Player", &["Jump"], &[])]), &out);

        let result = dumper.run(&dir.path().join("missing.dll"), &Filters::default());
        assert!(matches!(result, Err(Error::ModuleNotFound(_))));
        assert!(!out.exists());
    }

    #[test]
    fn totals_count_emitted_members() {
        let dir = tempfile::tempdir().unwrap();
        let module = module_file(dir.path());
        let out = dir.path().join("out");

        let types = vec![
            ty("Player", &["Jump", "get_Speed", "Run"], &["speed"]),
            ty("Stats", &[], &["hp", "<Hp>k__BackingField"]),
            ty("Noise", &["get_Value"], &["<Value>k__BackingField"]),
            ty("Empty", &[], &[]),
        ];
        let summary = Dumper::new(Fixed(types), &out)
            .run(&module, &Filters::default())
            .unwrap();

        assert_eq!(summary.module, "Assembly-CSharp");
        assert_eq!(summary.totals, RunTotals { methods: 2, classes: 2 });
        assert_eq!(summary.pages_written, 2);
        assert!(summary.failed_writes.is_empty());
        assert_eq!(summary.diagnostics.count(), 1);
        assert!(out.join("Player.txt").is_file());
        assert!(out.join("Stats.txt").is_file());
        assert!(!out.join("Noise.txt").exists());
        assert!(!out.join("Empty.txt").exists());
    }

    #[test]
    fn filters_narrow_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let module = module_file(dir.path());
        let out = dir.path().join("out");

        let types = vec![
            ty("Player", &["TakeDamage", "Heal"], &[]),
            ty("Enemy", &["TakeDamage"], &[]),
        ];
        let summary = Dumper::new(Fixed(types), &out)
            .run(&module, &Filters::new(Some("Player"), Some("Damage")))
            .unwrap();

        assert_eq!(summary.totals, RunTotals { methods: 1, classes: 1 });
        let page = fs::read_to_string(out.join("Player.txt")).unwrap();
        assert!(page.contains("Method: public void TakeDamage(), Token: 0x6000001"));
        assert!(!page.contains("Heal"));
    }
}
