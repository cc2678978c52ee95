// src/services/artifact_store.rs
use log::debug;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::models::GeneratedArtifact;

/// Local-only reference to a downloaded artifact, valid until revoked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactUrl(String);

impl ArtifactUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holds artifacts behind `blob:` style references so that every reference
/// handed out can be released explicitly.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    artifacts: HashMap<ArtifactUrl, GeneratedArtifact>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, artifact: GeneratedArtifact) -> ArtifactUrl {
        let url = ArtifactUrl(format!("blob:{}", Uuid::new_v4()));
        debug!("Registered {} as {}", artifact.filename, url);
        self.artifacts.insert(url.clone(), artifact);
        url
    }

    pub fn get(&self, url: &ArtifactUrl) -> Option<&GeneratedArtifact> {
        self.artifacts.get(url)
    }

    pub fn revoke_all(&mut self) {
        for url in self.artifacts.keys() {
            debug!("Revoked {}", url);
        }
        self.artifacts.clear();
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_revoke() {
        let mut store = ArtifactStore::new();
        let first = store.register(GeneratedArtifact::new(vec![1u8], "a.pptx"));
        let second = store.register(GeneratedArtifact::new(vec![2u8], "b.pptx"));

        assert_ne!(first, second);
        assert!(first.as_str().starts_with("blob:"));
        assert_eq!(store.get(&second).map(|a| a.filename.as_str()), Some("b.pptx"));

        assert_eq!(store.len(), 2);

        store.revoke_all();
        assert!(store.is_empty());
        assert!(store.get(&first).is_none());
    }
}
