//! Warrior file loading.
//!
//! Reads UTF-8 `.red` files, pulls the `;name` / `;author` metadata comments,
//! and assembles the source into a [`Warrior`]. A malformed file fails the
//! whole load; there is no partial warrior.

use crate::mars::assembler::assemble;
use crate::mars::errors::MarsError;
use crate::warrior::Warrior;
use std::fs;
use std::path::Path;

/// Loads a warrior from a Redcode file.
///
/// The name falls back to the file stem and the author to `"Unknown"` when
/// the metadata comments are absent.
pub fn load_warrior(path: &Path) -> Result<Warrior, MarsError> {
    let source = fs::read_to_string(path).map_err(|source| MarsError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let code = assemble(&source)?;

    let name = metadata_field(&source, ";name ")
        .map(str::to_string)
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Anonymous".to_string())
        });
    let author = metadata_field(&source, ";author ").unwrap_or("Unknown");

    Ok(Warrior::new(name, author, code))
}

/// Extracts a `;key value` metadata comment from the source, if present.
fn metadata_field<'a>(source: &'a str, key: &str) -> Option<&'a str> {
    source
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(key))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Writes a warrior file under a unique temp path, removed on drop.
    struct TempWarrior(PathBuf);

    impl TempWarrior {
        fn new(file_name: &str, source: &str) -> Self {
            let path = std::env::temp_dir().join(format!("corewar-test-{file_name}"));
            fs::write(&path, source).expect("failed to write temp warrior");
            TempWarrior(path)
        }
    }

    impl Drop for TempWarrior {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    #[test]
    fn loads_a_warrior_with_metadata() {
        let file = TempWarrior::new(
            "dwarf.red",
            "\
;name Dwarf
;author A.K. Dewdney
ADD #4, 3
MOV #0, @2
JMP -2
DAT #0, #0
END
",
        );

        let warrior = load_warrior(&file.0).unwrap();
        assert_eq!(warrior.name, "Dwarf");
        assert_eq!(warrior.author, "A.K. Dewdney");
        assert_eq!(warrior.code.len(), 4);
    }

    #[test]
    fn name_falls_back_to_the_file_stem() {
        let file = TempWarrior::new("nameless.red", "MOV $0, $1\n");

        let warrior = load_warrior(&file.0).unwrap();
        assert_eq!(warrior.name, "corewar-test-nameless");
        assert_eq!(warrior.author, "Unknown");
    }

    #[test]
    fn assembly_errors_fail_the_whole_load() {
        let file = TempWarrior::new("broken.red", "MOV $0, $1\nFROB 1\n");

        assert!(matches!(
            load_warrior(&file.0).unwrap_err(),
            MarsError::UnknownOpcode { line: 2, .. }
        ));
    }

    #[test]
    fn missing_files_report_an_io_error() {
        let path = std::env::temp_dir().join("corewar-test-does-not-exist.red");
        assert!(matches!(
            load_warrior(&path).unwrap_err(),
            MarsError::Io { .. }
        ));
    }

    #[test]
    fn metadata_extraction_ignores_other_comments() {
        let source = "; just a comment\n;name  Spaced Out  \n;authorless\n";
        assert_eq!(metadata_field(source, ";name "), Some("Spaced Out"));
        assert_eq!(metadata_field(source, ";author "), None);
    }
}
