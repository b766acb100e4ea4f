//! Loading `.scw` files from disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Required suffix of Screw source files.
pub const EXTENSION: &str = ".scw";

/// Shortest acceptable file name: one character plus the extension.
pub const MIN_NAME_LEN: usize = 5;

/// Errors raised before the source text reaches the validator.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Invalid filename '{}'", path.display())]
    InvalidName { path: PathBuf },

    #[error("This type of file is not supported. Please use a screw (.scw) file!")]
    UnsupportedExtension { path: PathBuf },

    #[error("{} doesn't exist!", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Check that `path` names a `.scw` file with a usable name.
pub fn check_file_name(path: &Path) -> Result<(), SourceError> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Err(SourceError::InvalidName { path: path.to_path_buf() });
    };

    if name.chars().count() < MIN_NAME_LEN {
        return Err(SourceError::InvalidName { path: path.to_path_buf() });
    }
    if !name.ends_with(EXTENSION) {
        return Err(SourceError::UnsupportedExtension { path: path.to_path_buf() });
    }

    Ok(())
}

/// Read the source text of a `.scw` file.
///
/// Bytes that are not valid UTF-8 are replaced; they can never be instructions,
/// so the lexer would discard them anyway.
pub fn read_source(path: &Path) -> Result<String, SourceError> {
    check_file_name(path)?;

    let bytes = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => SourceError::NotFound { path: path.to_path_buf() },
        _ => SourceError::Read { path: path.to_path_buf(), source },
    })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn accepts_scw_names() {
        assert!(check_file_name(Path::new("a.scw")).is_ok());
        assert!(check_file_name(Path::new("programs/hello.scw")).is_ok());
    }

    #[test]
    fn rejects_short_names() {
        assert!(matches!(
            check_file_name(Path::new(".scw")),
            Err(SourceError::InvalidName { .. })
        ));
        assert!(matches!(
            check_file_name(Path::new("dir/.scw")),
            Err(SourceError::InvalidName { .. })
        ));
    }

    #[test]
    fn rejects_other_extensions() {
        for name in ["hello.bf", "hello.scw.txt", "hello_scw"] {
            assert!(
                matches!(check_file_name(Path::new(name)), Err(SourceError::UnsupportedExtension { .. })),
                "{name}"
            );
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.scw");
        assert!(matches!(read_source(&path), Err(SourceError::NotFound { .. })));
    }

    #[test]
    fn reads_file_contents() {
        let mut file = tempfile::Builder::new().suffix(".scw").tempfile().unwrap();
        write!(file, "+++.~").unwrap();
        assert_eq!(read_source(file.path()).unwrap(), "+++.~");
    }

    #[test]
    fn invalid_utf8_is_tolerated() {
        let mut file = tempfile::Builder::new().suffix(".scw").tempfile().unwrap();
        file.write_all(b"+\xff+~").unwrap();
        let text = read_source(file.path()).unwrap();
        assert_eq!(crate::lex(&text).as_str(), "++~");
    }
}
