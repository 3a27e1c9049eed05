use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::types::ContentPlanError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModInputHash {
    pub xml_file_count: usize,
    pub hash_hex: String,
}

/// Hashes NUL-separated parts, so `["ab", "c"]` and `["a", "bc"]` differ.
pub(crate) fn hash_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    to_hex_lower(&hasher.finalize())
}

pub(crate) fn hash_mod_xml_inputs(mod_dir: &Path) -> Result<ModInputHash, ContentPlanError> {
    let xml_files = collect_xml_files(mod_dir)?;
    let mut hasher = Sha256::new();
    for (normalized_rel, abs_path) in &xml_files {
        let bytes = fs::read(abs_path).map_err(|source| ContentPlanError::ReadFile {
            path: abs_path.clone(),
            source,
        })?;
        hasher.update(normalized_rel.as_bytes());
        hasher.update([0u8]);
        hasher.update(&bytes);
    }

    Ok(ModInputHash {
        xml_file_count: xml_files.len(),
        hash_hex: to_hex_lower(&hasher.finalize()),
    })
}

/// XML files under `mod_dir` keyed by `/`-joined relative path, sorted by that key.
pub(crate) fn collect_xml_files(mod_dir: &Path) -> Result<Vec<(String, PathBuf)>, ContentPlanError> {
    let mut files = Vec::<(String, PathBuf)>::new();
    collect_recursive(mod_dir, Vec::new(), &mut files)?;
    files.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(files)
}

fn collect_recursive(
    current: &Path,
    rel_components: Vec<String>,
    files: &mut Vec<(String, PathBuf)>,
) -> Result<(), ContentPlanError> {
    let entries = fs::read_dir(current).map_err(|source| ContentPlanError::ReadDir {
        path: current.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| ContentPlanError::ReadDir {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let mut rel = rel_components.clone();
        rel.push(entry.file_name().to_string_lossy().to_string());
        if path.is_dir() {
            collect_recursive(&path, rel, files)?;
        } else if is_xml_file(&path) {
            files.push((rel.join("/"), path));
        }
    }
    Ok(())
}

fn is_xml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

fn to_hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn part_hash_is_order_and_boundary_sensitive() {
        assert_ne!(hash_parts(["base", "a", "b"]), hash_parts(["base", "b", "a"]));
        assert_ne!(hash_parts(["ab", "c"]), hash_parts(["a", "bc"]));
        assert_eq!(hash_parts(["x"]).len(), 64);
    }

    #[test]
    fn hash_ignores_non_xml_and_changes_on_edit_or_add() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path();
        fs::create_dir_all(dir.join("nested")).expect("mkdir");
        fs::write(dir.join("nested").join("defs.xml"), "<Defs/>").expect("write defs");
        fs::write(dir.join("notes.txt"), "ignore me").expect("write txt");

        let first = hash_mod_xml_inputs(dir).expect("hash");
        assert_eq!(first.xml_file_count, 1);

        fs::write(dir.join("nested").join("defs.xml"), "<Defs><A/></Defs>").expect("edit");
        let second = hash_mod_xml_inputs(dir).expect("hash");
        assert_ne!(first.hash_hex, second.hash_hex);

        fs::write(dir.join("new.xml"), "<Defs><B/></Defs>").expect("add xml");
        let third = hash_mod_xml_inputs(dir).expect("hash");
        assert_eq!(third.xml_file_count, 2);
        assert_ne!(second.hash_hex, third.hash_hex);
    }

    #[test]
    fn collected_files_are_sorted_by_relative_path() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path();
        fs::create_dir_all(dir.join("b")).expect("mkdir");
        fs::write(dir.join("b").join("z.xml"), "<Defs/>").expect("write");
        fs::write(dir.join("a.XML"), "<Defs/>").expect("write");

        let files = collect_xml_files(dir).expect("collect");
        let keys = files.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["a.XML", "b/z.xml"]);
    }
}
