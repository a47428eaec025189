use anyhow::{Context, Result};
use std::path::Path;

use rvlite::Program;

/// A loaded program image; word `i` sits at byte address `4 * i`.
#[derive(Debug, Clone)]
pub struct Image {
    pub name: String,
    pub program: Program,
}

pub fn load_text_bin(path: &Path) -> Result<Image> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let program = Program::from_text(&text)
        .with_context(|| format!("loading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Image { name, program })
}

pub fn read_u32(img: &Image, addr: u32) -> Option<u32> {
    img.program.fetch(addr)
}

pub fn is_mapped(img: &Image, addr: u32) -> bool {
    read_u32(img, addr).is_some()
}

/// One past the last instruction address.
pub fn end(img: &Image) -> u32 {
    (img.program.len() as u32).wrapping_mul(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_reads_text_words() {
        let path = std::env::temp_dir().join("_rvlite_model_test.txt");
        std::fs::write(
            &path,
            "00000000010100000000010100010011\n00000000000000000000000001100011",
        )
        .unwrap();
        let img = load_text_bin(&path).unwrap();
        assert_eq!(img.name, "_rvlite_model_test.txt");
        assert_eq!(read_u32(&img, 0), Some(0x0050_0513));
        assert_eq!(read_u32(&img, 4), Some(0x63));
        assert!(!is_mapped(&img, 8));
        assert_eq!(end(&img), 8);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn loader_rejects_garbage() {
        let path = std::env::temp_dir().join("_rvlite_model_bad.txt");
        std::fs::write(&path, "not a word\n").unwrap();
        assert!(load_text_bin(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
