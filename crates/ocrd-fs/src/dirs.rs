use crate::env::Environment;
use std::path::PathBuf;

pub fn user_home() -> Option<PathBuf> {
    home::home_dir()
}

/// `$XDG_DATA_HOME`, falling back to `~/.local/share`.
pub fn user_data(env: &dyn Environment) -> Option<PathBuf> {
    xdg_dir(env, "XDG_DATA_HOME", ".local/share")
}

/// `$XDG_CONFIG_HOME`, falling back to `~/.config`.
pub fn user_config(env: &dyn Environment) -> Option<PathBuf> {
    xdg_dir(env, "XDG_CONFIG_HOME", ".config")
}

/// `$XDG_CACHE_HOME`, falling back to `~/.cache`.
pub fn user_cache(env: &dyn Environment) -> Option<PathBuf> {
    xdg_dir(env, "XDG_CACHE_HOME", ".cache")
}

fn xdg_dir(env: &dyn Environment, var: &str, fallback: &str) -> Option<PathBuf> {
    if let Some(dir) = env.var(var).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    let home = env
        .var("HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(user_home)?;
    Some(home.join(fallback))
}
