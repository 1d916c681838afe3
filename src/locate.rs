//! Finding the managed folder of a running game.
//!
//! Unity players keep their managed modules in `{name}_Data/Managed` next to the executable;
//! some builds place them in `Managed` directly. [`find_managed_folder`] looks up a running
//! process by name and probes both locations.

use std::path::{Path, PathBuf};

use log::{debug, warn};

/// The managed folder of the running process `name`, if it can be found.
///
/// Processes match by executable stem or by their kernel command name. Lookup uses `/proc` and
/// is only available on Linux.
#[must_use]
pub fn find_managed_folder(name: &str) -> Option<PathBuf> {
    let Some(exe) = find_process_executable(name) else {
        warn!("Process {name} not found");
        return None;
    };

    debug!("Process {} runs {}", name, exe.display());
    managed_folder_for(exe.parent()?, name)
}

/// The first existing directory of `{exe_dir}/{name}_Data/Managed` and `{exe_dir}/Managed`.
#[must_use]
pub fn managed_folder_for(exe_dir: &Path, name: &str) -> Option<PathBuf> {
    [
        exe_dir.join(format!("{name}_Data")).join("Managed"),
        exe_dir.join("Managed"),
    ]
    .into_iter()
    .find(|candidate| candidate.is_dir())
}

#[cfg(target_os = "linux")]
fn find_process_executable(name: &str) -> Option<PathBuf> {
    let entries = match std::fs::read_dir("/proc") {
        Ok(entries) => entries,
        Err(error) => {
            warn!("Unable to list processes - {error}");
            return None;
        }
    };

    for entry in entries.flatten() {
        let pid = entry.file_name();
        if !pid.to_string_lossy().bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }

        // Unreadable for processes of other users
        let Ok(exe) = std::fs::read_link(entry.path().join("exe")) else {
            continue;
        };

        let stem_matches = exe
            .file_stem()
            .is_some_and(|stem| stem.to_string_lossy() == name);
        let comm_matches = std::fs::read_to_string(entry.path().join("comm"))
            .is_ok_and(|comm| comm.trim_end() == name);

        if stem_matches || comm_matches {
            return Some(exe);
        }
    }

    None
}

#[cfg(not(target_os = "linux"))]
fn find_process_executable(name: &str) -> Option<PathBuf> {
    warn!("Process lookup for {name} is not supported on this host");
    None
}
