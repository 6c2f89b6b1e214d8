use std::path::{Path, PathBuf};

pub const BASE_DATA_DIR_ENV: &str = "BASE_DATA_DIR";
pub const DEFAULT_BASE_DATA_DIR: &str = "data";

/// Directory the database file names are resolved against,
/// `$BASE_DATA_DIR` when set and not empty, `data` otherwise.
pub fn get_base_data_path() -> PathBuf {
    base_data_path_from(std::env::var(BASE_DATA_DIR_ENV).ok())
}

fn base_data_path_from(env_value: Option<String>) -> PathBuf {
    match env_value {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
        _ => PathBuf::from(DEFAULT_BASE_DATA_DIR),
    }
}

pub fn resolve_db_path(base: &Path, db_name: &str) -> PathBuf {
    base.join(db_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_dir() {
        assert_eq!(base_data_path_from(None), PathBuf::from("data"));
        assert_eq!(base_data_path_from(Some("  ".to_string())), PathBuf::from("data"));
    }

    #[test]
    fn uses_env_value_when_present() {
        assert_eq!(
            base_data_path_from(Some("/var/lib/buzz".to_string())),
            PathBuf::from("/var/lib/buzz")
        );
    }

    #[test]
    fn db_name_joins_base_dir() {
        let p = resolve_db_path(Path::new("data"), "buzz.sqlite");
        assert_eq!(p, Path::new("data").join("buzz.sqlite"));
    }
}
