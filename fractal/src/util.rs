use std::path::PathBuf;

pub(crate) fn get_toml_config_file(dir: &str, name: &str) -> Option<PathBuf> {
    let mut path_buf = get_base_dir(dir)?;
    path_buf.push(format!("{name}.toml"));
    Some(path_buf)
}

/// Expand a leading `~/` to the home directory
pub(crate) fn get_base_dir(dir: &str) -> Option<PathBuf> {
    let mut path_buf = PathBuf::new();
    if dir.starts_with("~/") {
        let home_dir = dirs::home_dir()?;
        path_buf.push(home_dir);
        path_buf.push(dir.strip_prefix("~/")?);
    } else {
        path_buf.push(dir);
    }
    Some(path_buf)
}
