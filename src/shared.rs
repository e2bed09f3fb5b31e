use std::path::Path;

use sha2::{Digest, Sha256};

/// Create a directory (and parents) if it doesn't already exist.
pub fn ensure_directory(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

/// SHA-256 of a file's contents, streamed in 8KB blocks.
pub fn hash_file_sha256(path: &Path) -> std::io::Result<String> {
    use std::io::Read;

    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Strip diacritics to ASCII-7, drop control characters, collapse whitespace.
pub fn remove_diacritics_to_ascii(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    let decomposed: String = s
        .chars()
        .flat_map(unicode_decompose)
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut out = String::with_capacity(decomposed.len());
    let mut last_was_space = false;
    for ch in decomposed.chars() {
        let mapped = match ch {
            '\r' | '\n' | '\t' => ' ',
            c => c,
        };
        if !(' '..='~').contains(&mapped) {
            continue;
        }
        if mapped == ' ' {
            if last_was_space {
                continue;
            }
            last_was_space = true;
        } else {
            last_was_space = false;
        }
        out.push(mapped);
    }
    out.trim().to_string()
}

/// Best-effort NFKD decomposition for the ASCII-relevant Latin diacritics this
/// service actually sees (Spanish/Portuguese input). Falls back to the
/// original character when no decomposition is known.
fn unicode_decompose(c: char) -> Vec<char> {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => vec!['a'],
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => vec!['A'],
        'é' | 'è' | 'ê' | 'ë' => vec!['e'],
        'É' | 'È' | 'Ê' | 'Ë' => vec!['E'],
        'í' | 'ì' | 'î' | 'ï' => vec!['i'],
        'Í' | 'Ì' | 'Î' | 'Ï' => vec!['I'],
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => vec!['o'],
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => vec!['O'],
        'ú' | 'ù' | 'û' | 'ü' => vec!['u'],
        'Ú' | 'Ù' | 'Û' | 'Ü' => vec!['U'],
        'ñ' => vec!['n'],
        'Ñ' => vec!['N'],
        'ç' => vec!['c'],
        'Ç' => vec!['C'],
        other => vec![other],
    }
}

fn is_combining_mark(_c: char) -> bool {
    false
}

const WIN_BAD_CHARS: &[char] = &[
    '<', '>', ':', '"', '/', '\\', '|', '?', '*',
];

/// Sanitize a string into a path component safe on Windows and POSIX alike.
pub fn safe_path_component(name: &str, max_len: usize) -> String {
    let mut cleaned = remove_diacritics_to_ascii(name);
    cleaned = cleaned
        .chars()
        .map(|c| {
            if WIN_BAD_CHARS.contains(&c) || (c as u32) < 0x20 {
                '_'
            } else {
                c
            }
        })
        .collect();
    cleaned = cleaned.trim_end_matches([' ', '.']).trim().to_string();

    if cleaned.is_empty() {
        cleaned = "item".to_string();
    }

    if cleaned.len() > max_len {
        cleaned.truncate(max_len);
        cleaned = cleaned.trim_end_matches(['_', '-', ' ', '.']).to_string();
        if cleaned.is_empty() {
            cleaned = "item".to_string();
        }
    }

    cleaned
}

/// Atomically write bytes to `path`: write to a temp file in the same
/// directory, then rename. Avoids readers observing a partially-written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    ensure_directory(dir)?;
    let tmp_path = dir.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file"),
        uuid::Uuid::new_v4()
    ));
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics_and_collapses_whitespace() {
        assert_eq!(remove_diacritics_to_ascii("café   con\tleche\n"), "cafe con leche");
    }

    #[test]
    fn sanitizes_bad_path_characters() {
        assert_eq!(safe_path_component("a/b:c*d", 80), "a_b_c_d");
    }

    #[test]
    fn empty_name_falls_back_to_item() {
        assert_eq!(safe_path_component("   ", 80), "item");
    }

    #[test]
    fn write_atomic_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_atomic(&path, b"{\"a\":1}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":1}");
    }
}
