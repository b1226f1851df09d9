use std::fs;
use std::io::{self, Write};
use std::path::Path;

const EXAMPLE_CONFIG: &str = include_str!("../config.yaml.example");

/// Writes the example config to `path`, creating parent directories.
/// An existing file is kept unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> io::Result<()> {
    if path.exists() && !force {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists (use --force to overwrite)", path.display()),
        ));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    f.write_all(EXAMPLE_CONFIG.as_bytes())?;
    Ok(())
}
