//! Platform-specific shell detection.

use std::path::{Path, PathBuf};

/// Known shell types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Cmd,
    Unknown,
}

impl ShellType {
    /// Parse shell type from executable name.
    pub fn from_executable(exe: &str) -> Self {
        let name = Path::new(exe)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match name.as_str() {
            "bash" => ShellType::Bash,
            "zsh" => ShellType::Zsh,
            "fish" => ShellType::Fish,
            "powershell" | "pwsh" => ShellType::PowerShell,
            "cmd" => ShellType::Cmd,
            _ => ShellType::Unknown,
        }
    }
}

/// The user's login shell executable.
///
/// `$SHELL` on Unix, `powershell` on Windows.
pub fn shell_executable() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from("powershell")
    } else {
        std::env::var("SHELL")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/bin/sh"))
    }
}

/// Build the command that prints the given variables, one per line, from the
/// user's interactive shell environment.
///
/// Variables such as `MAMBA_ROOT_PREFIX` are usually exported by init blocks
/// in `.bashrc`/`.zshrc`, so the shell runs with `-i` (interactive,
/// non-login). On Windows PowerShell loads the user profile by default.
pub fn variable_probe_command(shell: &Path, variables: &[&str]) -> (String, Vec<String>) {
    let program = shell.to_string_lossy().to_string();
    let shell_type = ShellType::from_executable(&program);

    match shell_type {
        ShellType::PowerShell => {
            let script = variables
                .iter()
                .map(|v| format!("Write-Output \"$env:{}\"", v))
                .collect::<Vec<_>>()
                .join("; ");
            (program, vec!["-Command".to_string(), script])
        }
        ShellType::Cmd => {
            let script = variables
                .iter()
                .map(|v| format!("echo.%{}%", v))
                .collect::<Vec<_>>()
                .join(" & ");
            (program, vec!["/C".to_string(), script])
        }
        ShellType::Fish => {
            let script = variables
                .iter()
                .map(|v| format!("echo \"${}\"", v))
                .collect::<Vec<_>>()
                .join("; ");
            (program, vec!["-i".to_string(), "-c".to_string(), script])
        }
        _ => {
            let script = variables
                .iter()
                .map(|v| format!("echo \"${{{}}}\"", v))
                .collect::<Vec<_>>()
                .join("; ");
            (program, vec!["-ic".to_string(), script])
        }
    }
}

/// Whether the native filesystem compares paths case-insensitively.
pub fn is_case_insensitive_fs() -> bool {
    cfg!(any(target_os = "windows", target_os = "macos"))
}

/// Check if running in a CI environment.
///
/// Used to force non-interactive mode in `main()`. Checks common CI
/// environment variables: `CI`, `GITHUB_ACTIONS`, `GITLAB_CI`, `CIRCLECI`,
/// `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_type_from_executable() {
        assert_eq!(ShellType::from_executable("/bin/bash"), ShellType::Bash);
        assert_eq!(ShellType::from_executable("/usr/bin/zsh"), ShellType::Zsh);
        assert_eq!(ShellType::from_executable("/usr/bin/fish"), ShellType::Fish);
        assert_eq!(ShellType::from_executable("pwsh"), ShellType::PowerShell);
        assert_eq!(
            ShellType::from_executable("powershell.exe"),
            ShellType::PowerShell
        );
        assert_eq!(ShellType::from_executable("cmd.exe"), ShellType::Cmd);
        assert_eq!(ShellType::from_executable("unknown"), ShellType::Unknown);
    }

    #[test]
    fn probe_command_for_bash_is_interactive() {
        let (program, args) =
            variable_probe_command(Path::new("/bin/bash"), &["MAMBA_ROOT_PREFIX", "MAMBA_EXE"]);

        assert_eq!(program, "/bin/bash");
        assert_eq!(args[0], "-ic");
        assert_eq!(
            args[1],
            "echo \"${MAMBA_ROOT_PREFIX}\"; echo \"${MAMBA_EXE}\""
        );
    }

    #[test]
    fn probe_command_for_powershell_reads_env_drive() {
        let (program, args) =
            variable_probe_command(Path::new("powershell"), &["MAMBA_ROOT_PREFIX", "MAMBA_EXE"]);

        assert_eq!(program, "powershell");
        assert_eq!(args[0], "-Command");
        assert!(args[1].contains("$env:MAMBA_ROOT_PREFIX"));
        assert!(args[1].contains("$env:MAMBA_EXE"));
        assert!(args[1].find("MAMBA_ROOT_PREFIX") < args[1].find("MAMBA_EXE"));
    }

    #[test]
    fn probe_command_for_fish_uses_fish_syntax() {
        let (_, args) = variable_probe_command(Path::new("/usr/bin/fish"), &["MAMBA_EXE"]);
        assert_eq!(args, vec!["-i", "-c", "echo \"$MAMBA_EXE\""]);
    }

    #[test]
    fn shell_executable_is_not_empty() {
        assert!(!shell_executable().as_os_str().is_empty());
    }

    #[test]
    fn is_ci_detects_environment() {
        // Just ensure function doesn't panic
        let _ = is_ci();
    }
}
