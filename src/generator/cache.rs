use std::fs;
use std::io::Write;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

/// Flat file cache under the app data dir, used for synthesized audio clips.
pub struct DiskCache {
    base_dir: PathBuf,
}

impl DiskCache {
    pub fn new(subdir: &str) -> Option<Self> {
        let base = dirs::data_dir()?.join("kaiwa").join(subdir);
        Self::with_base_dir(base)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Option<Self> {
        fs::create_dir_all(&base_dir).ok()?;
        Some(Self { base_dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(Self::sanitize_key(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).exists()
    }

    /// First `{stem}.{ext}` already cached, in `extensions` order.
    pub fn find(&self, stem: &str, extensions: &[&str]) -> Option<PathBuf> {
        extensions
            .iter()
            .map(|ext| self.path_for(&format!("{stem}.{ext}")))
            .find(|path| path.exists())
    }

    /// Store `content` and return where it landed. Written to a `.tmp`
    /// sibling first so a clip is either complete or absent.
    pub fn put(&self, key: &str, content: &[u8]) -> Option<PathBuf> {
        let path = self.path_for(key);
        let tmp_path = path.with_extension("tmp");

        let mut file = fs::File::create(&tmp_path).ok()?;
        let written = file.write_all(content).and_then(|()| file.sync_all());
        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
            return None;
        }
        fs::rename(&tmp_path, &path).ok()?;
        Some(path)
    }

    /// SHA-256 of the parts, hex encoded and cut to 32 characters. Parts are
    /// separated so `["ab", "c"]` and `["a", "bc"]` differ.
    pub fn digest_stem(parts: &[&str]) -> String {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update(b"|");
        }
        hasher.finalize()[..16]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}
