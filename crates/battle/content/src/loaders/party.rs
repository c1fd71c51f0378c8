//! Starting party loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::party::PartySpec;

/// Loader for the starting party from RON files.
///
/// ```ron
/// (members: [1, 2], gold: 100, items: [(1, 3)])
/// ```
pub struct PartyLoader;

impl PartyLoader {
    pub fn load(path: &Path) -> LoadResult<PartySpec> {
        let content = read_file(path)?;
        let party: PartySpec = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse party RON: {}", e))?;

        anyhow::ensure!(
            !party.members.is_empty(),
            "Party in {} has no members",
            path.display()
        );
        Ok(party)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{ActorId, ItemId};
    use tempfile::TempDir;

    #[test]
    fn loads_party_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("party.ron");
        std::fs::write(&path, "(members: [1, 2], gold: 100, items: [(1, 3)])").unwrap();

        let party = PartyLoader::load(&path).unwrap();
        assert_eq!(party.members, vec![ActorId(1), ActorId(2)]);
        assert_eq!(party.gold, 100);
        assert_eq!(party.items, vec![(ItemId(1), 3)]);
        assert!(party.switches.is_empty());
    }

    #[test]
    fn empty_party_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("party.ron");
        std::fs::write(&path, "(gold: 5)").unwrap();

        assert!(PartyLoader::load(&path).is_err());
    }
}
