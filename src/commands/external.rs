use nix::unistd::{access, AccessFlags};
use std::collections::BTreeSet;
use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the search-path variable.
pub const PATH_VAR: &str = "PATH";

fn search_path() -> Option<OsString> {
    env::var_os(PATH_VAR)
}

fn search_dirs(path_var: &OsStr) -> impl Iterator<Item = PathBuf> + '_ {
    env::split_paths(path_var).filter(|dir| !dir.as_os_str().is_empty())
}

/// Regular file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && access(path, AccessFlags::X_OK).is_ok(),
        Err(_) => false,
    }
}

/// Resolve a command name against `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    find_executable_in(name, search_path().as_deref())
}

/// Resolve a command name against an explicit search path.
///
/// Names containing `/` are taken as paths and only checked for execute
/// permission. Otherwise each directory is tried in order and the first
/// executable `<dir>/<name>` wins.
pub fn find_executable_in(name: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    if name.contains('/') {
        let path = Path::new(name);
        return is_executable(path).then(|| path.to_path_buf());
    }

    search_dirs(path_var?)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// Names of executables on an explicit search path starting with `prefix`,
/// sorted and de-duplicated.
pub fn executables_with_prefix_in(prefix: &str, path_var: Option<&OsStr>) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let Some(path_var) = path_var else {
        return names;
    };

    for dir in search_dirs(path_var) {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if file_name.starts_with(prefix) && is_executable(&entry.path()) {
                names.insert(file_name);
            }
        }
    }

    names
}

/// [`executables_with_prefix_in`] over the current `PATH`.
pub fn executables_with_prefix(prefix: &str) -> BTreeSet<String> {
    executables_with_prefix_in(prefix, search_path().as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn make_file(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    fn joined(dirs: &[&TempDir]) -> OsString {
        env::join_paths(dirs.iter().map(|d| d.path())).unwrap()
    }

    #[test]
    fn test_first_matching_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_file(second.path(), "tool", 0o755);
        let winner = make_file(first.path(), "tool", 0o755);

        let path_var = joined(&[&first, &second]);
        assert_eq!(find_executable_in("tool", Some(&path_var)), Some(winner));
    }

    #[test]
    fn test_non_executable_files_are_skipped() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_file(first.path(), "tool", 0o644);
        let runnable = make_file(second.path(), "tool", 0o755);

        let path_var = joined(&[&first, &second]);
        assert_eq!(find_executable_in("tool", Some(&path_var)), Some(runnable));
    }

    #[test]
    fn test_empty_search_path_finds_nothing() {
        assert_eq!(find_executable_in("sh", Some(OsStr::new(""))), None);
        assert_eq!(find_executable_in("sh", None), None);
    }

    #[test]
    fn test_directories_are_not_executables() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        let path_var = joined(&[&dir]);
        assert_eq!(find_executable_in("subdir", Some(&path_var)), None);
    }

    #[test]
    fn test_slash_names_bypass_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = make_file(dir.path(), "tool", 0o755);
        let name = tool.to_str().unwrap();
        assert_eq!(find_executable_in(name, None), Some(tool.clone()));
    }

    #[test]
    fn test_prefix_listing_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        make_file(dir.path(), "gamma", 0o755);
        make_file(dir.path(), "gadget", 0o755);
        make_file(dir.path(), "gnotexec", 0o644);
        make_file(dir.path(), "other", 0o755);

        let path_var = joined(&[&dir]);
        let names: Vec<_> = executables_with_prefix_in("g", Some(&path_var))
            .into_iter()
            .collect();
        assert_eq!(names, vec!["gadget", "gamma"]);
    }
}
