use std::fs;
use std::path::{Path, PathBuf};

use story_core::PlatformProbe;

/// [`PlatformProbe`] backed by the real environment and filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl PlatformProbe for SystemProbe {
    fn is_windows(&self) -> bool {
        cfg!(windows)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.trim().is_empty())
    }

    fn read_dir(&self, dir: &Path) -> Vec<PathBuf> {
        match fs::read_dir(dir) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn current_exe_dir(&self) -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
    }
}
