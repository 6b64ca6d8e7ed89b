use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Resolves the bearer token the daemon's own API requires, in priority
/// order: an explicit `--auth-token` / `VIGIL_AUTH_TOKEN` value, then a
/// previously generated token stored next to the database, generating and
/// persisting a fresh one on first run.
pub fn resolve(explicit: Option<String>, database_path: &Path, rotate: bool) -> anyhow::Result<String> {
    if let Some(token) = explicit {
        return Ok(token);
    }

    let path = token_path(database_path);
    if !rotate {
        if let Ok(existing) = std::fs::read_to_string(&path) {
            let existing = existing.trim().to_string();
            if !existing.is_empty() {
                return Ok(existing);
            }
        }
    }

    let token = generate();
    write(&path, &token)?;
    tracing::info!(path = %path.display(), "generated new API bearer token");
    Ok(token)
}

fn generate() -> String {
    let a = Uuid::new_v4().to_string().replace('-', "");
    let b = Uuid::new_v4().to_string().replace('-', "");
    format!("{a}{b}")
}

fn write(path: &PathBuf, token: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, token)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

fn token_path(database_path: &Path) -> PathBuf {
    let mut path = database_path.to_path_buf();
    path.set_extension("token");
    path
}
