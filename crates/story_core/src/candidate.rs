use std::path::{Path, PathBuf};

/// One way of launching the backend: an executable followed by fixed
/// leading arguments (for example a launcher version flag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    argv: Vec<String>,
}

impl Candidate {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            argv: vec![program.into()],
        }
    }

    pub fn with_args<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec![program.into()];
        argv.extend(args.into_iter().map(Into::into));
        Self { argv }
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn leading_args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

/// Read-only view of the host used while resolving candidates.
pub trait PlatformProbe {
    fn is_windows(&self) -> bool;
    fn env_var(&self, name: &str) -> Option<String>;
    /// Full paths of the entries directly inside `dir`; empty when unreadable.
    fn read_dir(&self, dir: &Path) -> Vec<PathBuf>;
    fn is_file(&self, path: &Path) -> bool;
    fn current_exe_dir(&self) -> Option<PathBuf>;
}

/// What kind of program the backend is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRuntime {
    /// A standalone executable, located by name.
    Native { binary: String },
    /// A script run by a Python 3 interpreter.
    Python,
}

impl Default for BackendRuntime {
    fn default() -> Self {
        BackendRuntime::Native {
            binary: "story_fetch".to_string(),
        }
    }
}

/// Build the ordered candidate list.
///
/// A non-blank override yields exactly that one candidate. Otherwise
/// discovered absolute paths come first, followed by the generic names.
pub fn resolve_candidates(
    override_cmd: Option<&str>,
    runtime: &BackendRuntime,
    probe: &dyn PlatformProbe,
) -> Vec<Candidate> {
    if let Some(cmd) = override_cmd.map(str::trim).filter(|cmd| !cmd.is_empty()) {
        return vec![Candidate::new(cmd)];
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for path in discover(runtime, probe) {
        let candidate = Candidate::new(path.to_string_lossy().into_owned());
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates.extend(generic_candidates(runtime, probe));
    candidates
}

fn generic_candidates(runtime: &BackendRuntime, probe: &dyn PlatformProbe) -> Vec<Candidate> {
    match runtime {
        BackendRuntime::Native { binary } => {
            if probe.is_windows() {
                vec![
                    Candidate::new(format!("{binary}.exe")),
                    Candidate::new(binary.clone()),
                ]
            } else {
                vec![Candidate::new(binary.clone())]
            }
        }
        BackendRuntime::Python => {
            if probe.is_windows() {
                vec![
                    Candidate::with_args("py", ["-3"]),
                    Candidate::new("python"),
                    Candidate::new("python3"),
                ]
            } else {
                vec![Candidate::new("python3"), Candidate::new("python")]
            }
        }
    }
}

fn discover(runtime: &BackendRuntime, probe: &dyn PlatformProbe) -> Vec<PathBuf> {
    match runtime {
        BackendRuntime::Native { binary } => discover_native(binary, probe),
        BackendRuntime::Python if probe.is_windows() => discover_windows_python(probe),
        BackendRuntime::Python => Vec::new(),
    }
}

fn discover_native(binary: &str, probe: &dyn PlatformProbe) -> Vec<PathBuf> {
    let file_name = if probe.is_windows() {
        format!("{binary}.exe")
    } else {
        binary.to_string()
    };

    let mut dirs = Vec::new();
    if let Some(dir) = probe.current_exe_dir() {
        dirs.push(dir);
    }
    if let Some(cargo_home) = probe.env_var("CARGO_HOME") {
        dirs.push(PathBuf::from(cargo_home).join("bin"));
    } else {
        let home_var = if probe.is_windows() { "USERPROFILE" } else { "HOME" };
        if let Some(home) = probe.env_var(home_var) {
            dirs.push(PathBuf::from(home).join(".cargo").join("bin"));
        }
    }

    dirs.into_iter()
        .map(|dir| dir.join(&file_name))
        .filter(|path| probe.is_file(path))
        .collect()
}

fn discover_windows_python(probe: &dyn PlatformProbe) -> Vec<PathBuf> {
    let mut roots = vec![
        PathBuf::from(r"C:\"),
        PathBuf::from(r"C:\Program Files"),
        PathBuf::from(r"C:\Program Files (x86)"),
    ];
    if let Some(local) = probe.env_var("LOCALAPPDATA") {
        roots.push(PathBuf::from(local).join("Programs").join("Python"));
    }

    let mut found = Vec::new();
    for root in roots {
        let mut installs: Vec<PathBuf> = probe
            .read_dir(&root)
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| wildcard_matches("Python3*", name))
            })
            .map(|dir| dir.join("python.exe"))
            .filter(|exe| probe.is_file(exe))
            .collect();
        // Newest install first within a root.
        installs.sort_by(|a, b| b.cmp(a));
        found.extend(installs);
    }
    found
}

/// Match `value` against a pattern in which `*` stands for any run of
/// characters.
pub fn wildcard_matches(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == value;
    }
    let mut cursor = 0usize;
    for (idx, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if idx == 0 {
            if !value.starts_with(part) {
                return false;
            }
            cursor = part.len();
            continue;
        }
        if idx == parts.len() - 1 {
            return value.len() >= cursor + part.len() && value.ends_with(part);
        }
        match value[cursor..].find(part) {
            Some(pos) => cursor += pos + part.len(),
            None => return false,
        }
    }
    true
}
