//! Log file location, ANSI stripping and timestamps.
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

/// Remove ANSI escape sequences (`ESC [` ... final byte) from `s`.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        if chars.next_if_eq(&'[').is_some() {
            // parameters and intermediates run until a byte in '@'..='~'
            chars.by_ref().find(|c| ('@'..='~').contains(c));
        }
    }
    out
}

/// `dotlink` directory under the XDG cache root.
///
/// An unset or empty `XDG_CACHE_HOME` falls back to `~/.cache`.
fn log_dir_from(xdg_cache_home: Option<OsString>, home: Option<PathBuf>) -> Option<PathBuf> {
    let base = match xdg_cache_home {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home?.join(".cache"),
    };
    Some(base.join("dotlink"))
}

/// `$XDG_CACHE_HOME/dotlink/<command>.log`, creating the directory.
///
/// `None` when no location can be determined or created.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let dir = log_dir_from(std::env::var_os("XDG_CACHE_HOME"), dirs::home_dir())?;
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// Current UTC time as `YYYY-MM-DD HH:MM:SS`.
pub(super) fn format_utc_datetime() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Current UTC time as `HH:MM:SS`.
pub(super) fn format_utc_time() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}
