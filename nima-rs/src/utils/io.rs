//! Reading actor files from disk

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use nima_actor::Actor;

/// A loaded actor together with the size of the file it came from
#[derive(Debug)]
pub struct LoadedActor {
    pub actor: Actor,
    pub file_size: u64,
}

/// Read and parse a `.nima` file
pub fn load_actor(path: &Path) -> Result<LoadedActor> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    log::info!("Read {} bytes from {}", bytes.len(), path.display());

    let actor = Actor::load(&bytes)
        .with_context(|| format!("Failed to parse actor file: {}", path.display()))?;

    Ok(LoadedActor {
        actor,
        file_size: bytes.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_actor_reports_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"NIMA").unwrap();
        file.write_all(&18u32.to_le_bytes()).unwrap();

        let loaded = load_actor(file.path()).unwrap();
        assert_eq!(loaded.file_size, 8);
        assert_eq!(loaded.actor.component_count(), 1);
    }

    #[test]
    fn test_load_actor_wraps_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"RIVE0000").unwrap();

        let err = load_actor(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse actor file"));
    }

    #[test]
    fn test_load_actor_missing_file() {
        let err = load_actor(Path::new("/definitely/not/here.nima")).unwrap_err();
        assert!(err.to_string().contains("Failed to open file"));
    }
}
