use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use typedump::locate::find_managed_folder;

/// Where a run reads from and writes to.
#[derive(Debug, PartialEq, Eq)]
pub struct Target {
    pub module: PathBuf,
    pub output_dir: PathBuf,
}

/// Resolves the module to dump from a path or a running process.
///
/// A directory path is joined with `module`; without a path, the managed folder of `process`
/// is located. The output defaults to `Parsed/{process name or module stem}`.
pub fn resolve_target(
    path: Option<&Path>,
    process: Option<&str>,
    module: &str,
    output: Option<&Path>,
) -> anyhow::Result<Target> {
    let module_path = match (path, process) {
        (Some(path), _) if path.is_dir() => path.join(module),
        (Some(path), _) => path.to_path_buf(),
        (None, Some(process)) => find_managed_folder(process)
            .with_context(|| format!("no managed folder found for process {process}"))?
            .join(module),
        (None, None) => bail!("either a module path or --process is required"),
    };

    let output_dir = match output {
        Some(output) => output.to_path_buf(),
        None => {
            let name = match process {
                Some(process) => process.to_string(),
                None => module_path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "module".to_string()),
            };
            Path::new("Parsed").join(name)
        }
    };

    Ok(Target {
        module: module_path,
        output_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_uses_module_name() {
        let dir = tempfile::tempdir().unwrap();
        let target = resolve_target(Some(dir.path()), None, "Assembly-CSharp.dll", None).unwrap();

        assert_eq!(target.module, dir.path().join("Assembly-CSharp.dll"));
        assert_eq!(target.output_dir, Path::new("Parsed").join("Assembly-CSharp"));
    }

    #[test]
    fn file_and_explicit_output() {
        let target = resolve_target(
            Some(Path::new("Managed/Game.dll")),
            Some("Game"),
            "Assembly-CSharp.dll",
            Some(Path::new("out")),
        )
        .unwrap();

        assert_eq!(target.module, PathBuf::from("Managed/Game.dll"));
        assert_eq!(target.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn process_names_output() {
        let target = resolve_target(
            Some(Path::new("Managed/Assembly-CSharp.dll")),
            Some("Game"),
            "Assembly-CSharp.dll",
            None,
        )
        .unwrap();

        assert_eq!(target.output_dir, Path::new("Parsed").join("Game"));
    }

    #[test]
    fn requires_input() {
        assert!(resolve_target(None, None, "Assembly-CSharp.dll", None).is_err());
        assert!(resolve_target(None, Some("no-such-process-typedump"), "a.dll", None).is_err());
    }
}
