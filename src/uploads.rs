//! Image upload handling: extension validation, generated filenames, and
//! best-effort cleanup. Client filenames are never trusted beyond their
//! extension; stored names always embed a random token.

use std::path::Path;

use crate::auth::session::generate_token;

const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Extract the lowercased extension from a client filename, if it is one
/// of the allowed image types. Anything else is skipped by callers.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let ext = filename.rsplit_once('.')?.1.to_lowercase();
    if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

/// `place_<id>_<token>.<ext>` for place photos.
pub fn place_photo_name(place_id: i64, ext: &str) -> String {
    format!("place_{}_{}.{}", place_id, generate_token(), ext)
}

/// `review_<place>_<user>_<token>.<ext>` for review images.
pub fn review_image_name(place_id: i64, user_id: i64, ext: &str) -> String {
    format!(
        "review_{}_{}_{}.{}",
        place_id,
        user_id,
        generate_token(),
        ext
    )
}

/// Write upload bytes to the store. Errors here propagate: a failed write
/// must not leave a dangling database row.
pub fn save(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::write(dir.join(file_name), bytes)
}

/// Best-effort removal. Missing files and IO failures are logged and
/// swallowed; cleanup must never abort the surrounding mutation.
pub fn remove_quiet(dir: &Path, file_name: &str) {
    if let Err(e) = std::fs::remove_file(dir.join(file_name)) {
        tracing::warn!("Could not remove upload {}: {}", file_name, e);
    }
}

/// True when the name is a bare filename, with no path traversal parts.
pub fn is_safe_name(file_name: &str) -> bool {
    !file_name.is_empty()
        && !file_name.contains('/')
        && !file_name.contains('\\')
        && file_name != "."
        && file_name != ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_extensions_are_lowercased() {
        assert_eq!(allowed_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(allowed_extension("a.b.webp").as_deref(), Some("webp"));
    }

    #[test]
    fn disallowed_or_missing_extensions_are_rejected() {
        assert!(allowed_extension("script.exe").is_none());
        assert!(allowed_extension("noextension").is_none());
        assert!(allowed_extension("").is_none());
    }

    #[test]
    fn generated_names_embed_ids_and_differ() {
        let a = place_photo_name(7, "png");
        let b = place_photo_name(7, "png");
        assert!(a.starts_with("place_7_"));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);

        let r = review_image_name(7, 3, "gif");
        assert!(r.starts_with("review_7_3_"));
        assert!(r.ends_with(".gif"));
    }

    #[test]
    fn save_then_remove() {
        let tmp = tempfile::tempdir().unwrap();
        save(tmp.path(), "x.png", b"bytes").unwrap();
        assert!(tmp.path().join("x.png").exists());
        remove_quiet(tmp.path(), "x.png");
        assert!(!tmp.path().join("x.png").exists());
    }

    #[test]
    fn remove_quiet_swallows_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        // Must not panic or error
        remove_quiet(tmp.path(), "never-existed.jpg");
    }

    #[test]
    fn path_traversal_names_are_unsafe() {
        assert!(is_safe_name("place_1_ab.png"));
        assert!(!is_safe_name("../etc/passwd"));
        assert!(!is_safe_name("a/b.png"));
        assert!(!is_safe_name(""));
    }
}
