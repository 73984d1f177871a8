//! Interactive features derived from the drawn text.
//!
//! The driver itself only draws. The text it draws is collected into lines, which
//! are searched for URLs (web links), headings (bookmarks) and recurring phrases
//! (cross references). All of them are optional and configured per job.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::DefinitionError;

pub(crate) mod annotation;
pub mod bookmark;
pub(crate) mod weblink;
pub(crate) mod xref;

/// Read a JSON definition file.
pub(crate) fn read_definitions<T: DeserializeOwned>(path: &Path) -> Result<T, DefinitionError> {
    let data = std::fs::read(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&data).map_err(|source| DefinitionError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_are_told_apart() {
        let missing = read_definitions::<Vec<String>>(Path::new("/nonexistent/xrefs.json"));
        assert!(missing.unwrap_err().is_missing());
    }
}
