use std::{
    env,
    path::{Path, PathBuf},
};

/// File name of the redirect ledger inside the configured app directory.
pub const LEDGER_FILE: &str = "_redirects";

/// Resolve the config file location.
///
/// Lookup order:
/// 1. `explicit` (the `--config` flag)
/// 2. `$NETSHORT_CONFIG`
/// 3. `$XDG_CONFIG_HOME/netshort/config.toml`, if that file exists
/// 4. `$HOME/netshort.toml`
///
/// The returned flag is `true` when the path was asked for explicitly, in
/// which case a missing file is an error rather than "use defaults".
pub fn config_path(explicit: Option<&Path>) -> (PathBuf, bool) {
    if let Some(p) = explicit {
        return (p.to_path_buf(), true);
    }
    if let Some(p) = env::var_os("NETSHORT_CONFIG").filter(|v| !v.is_empty()) {
        return (PathBuf::from(p), true);
    }
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        let p = PathBuf::from(xdg).join("netshort").join("config.toml");
        if p.is_file() {
            return (p, false);
        }
    }
    let home = PathBuf::from(env::var_os("HOME").unwrap_or_default());
    (home.join("netshort.toml"), false)
}

/// Path of the ledger file inside `app_dir`.
pub fn ledger_path(app_dir: &Path) -> PathBuf {
    app_dir.join(LEDGER_FILE)
}
