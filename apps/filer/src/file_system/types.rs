//! Content-type resolution.

use std::path::Path;

use super::item::{ContentType, DirectoryItem, FileKind};

/// Resolves the content type of an item. Used by type ordering and by the open dispatcher.
pub trait TypeResolver: Send + Sync {
    /// `dir` is the directory containing `item`.
    fn resolve_type(&self, dir: &Path, item: &DirectoryItem) -> Option<ContentType>;
}

/// Guesses from the file name's extension. Directories and special files have no type.
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeGuessResolver;

impl TypeResolver for MimeGuessResolver {
    fn resolve_type(&self, _dir: &Path, item: &DirectoryItem) -> Option<ContentType> {
        if item.kind != FileKind::File {
            return None;
        }
        let mime = mime_guess::from_path(&item.name).first()?;
        Some(ContentType::new(mime.type_().as_str(), mime.subtype().as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guesses_from_extension() {
        let resolver = MimeGuessResolver;
        let item = DirectoryItem::new("notes.txt", FileKind::File);
        assert_eq!(
            resolver.resolve_type(Path::new("/tmp"), &item),
            Some(ContentType::text_plain())
        );
    }

    #[test]
    fn test_directories_and_unknown_have_no_type() {
        let resolver = MimeGuessResolver;
        let dir = DirectoryItem::new("docs.txt", FileKind::Directory);
        assert_eq!(resolver.resolve_type(Path::new("/tmp"), &dir), None);

        let unknown = DirectoryItem::new("Makefile", FileKind::File);
        assert_eq!(resolver.resolve_type(Path::new("/tmp"), &unknown), None);
    }
}
