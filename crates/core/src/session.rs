//! Session identifier.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::SessionIdError;

/// Opaque identifier correlating the push channel and every outgoing request
/// with one backend conversation. Fixed for the lifetime of a client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Result<Self, SessionIdError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SessionIdError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(SessionIdError::Whitespace(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Derives the id the backend assigns to a project: the lowercase hex
    /// SHA-256 of the canonical project path.
    ///
    /// Paths that cannot be resolved (not on this machine) are hashed in
    /// their lexical normal form, without `.` segments or a trailing slash.
    pub fn from_project_path(path: &Path) -> Self {
        let resolved = std::fs::canonicalize(path)
            .unwrap_or_else(|_| path.components().collect::<PathBuf>());
        Self::from_path_text(&resolved.to_string_lossy())
    }

    fn from_path_text(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        let hex = digest
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<String>();
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_rejects_empty_and_whitespace() {
        assert_eq!(SessionId::new("   "), Err(SessionIdError::Empty));
        assert!(matches!(
            SessionId::new("a b"),
            Err(SessionIdError::Whitespace(_))
        ));
        assert_eq!(SessionId::new(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_session_id_from_project_path_is_sha256_hex() {
        let id = SessionId::from_project_path(Path::new("/home/dev/project"));
        assert_eq!(id.as_str().len(), 64);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            id,
            SessionId::from_project_path(Path::new("/home/dev/project"))
        );
        assert_ne!(id, SessionId::from_project_path(Path::new("/home/dev/other")));
    }

    #[test]
    fn test_session_id_known_digest() {
        // sha256("abc")
        let id = SessionId::from_path_text("abc");
        assert_eq!(
            id.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_session_id_ignores_spelling_of_the_same_directory() {
        let dir = tempfile::tempdir().unwrap();
        let canonical = std::fs::canonicalize(dir.path()).unwrap();
        let id = SessionId::from_project_path(&canonical);

        let trailing = PathBuf::from(format!("{}/", canonical.display()));
        assert_eq!(SessionId::from_project_path(&trailing), id);
        assert_eq!(SessionId::from_project_path(&canonical.join(".")), id);

        std::fs::create_dir(canonical.join("sub")).unwrap();
        assert_eq!(SessionId::from_project_path(&canonical.join("sub").join("..")), id);

        assert_eq!(SessionId::from_path_text(&canonical.to_string_lossy()), id);
    }

    #[test]
    fn test_unresolvable_path_is_normalized_lexically() {
        let id = SessionId::from_project_path(Path::new("/no/such/jide/project"));
        assert_eq!(id, SessionId::from_project_path(Path::new("/no/such/jide/project/")));
        assert_eq!(id, SessionId::from_project_path(Path::new("/no/./such/jide/project")));
        assert_eq!(id, SessionId::from_path_text("/no/such/jide/project"));
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let id = SessionId::new("s-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"s-1\"");
    }
}
