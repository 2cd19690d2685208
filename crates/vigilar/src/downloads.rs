//! Moving, renaming and unpacking downloaded output artifacts.
//!
//! Extraction output arrives as a zip archive in the OS downloads directory.
//! The suite moves anything downloaded recently into a per-section/option
//! working directory, renaming with a UTC timestamp suffix so repeated runs
//! never collide, then unpacks the archive and checks for spreadsheet output.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tracing::{info, warn};

use crate::result::{VigilarError, VigilarResult};

/// How recently a file must have been modified to count as "this download"
pub const RECENT_WINDOW: Duration = Duration::from_secs(80);

/// Extensions recognized as spreadsheet output
pub const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "xlsm", "xlsb"];

/// A file moved out of the downloads directory
#[derive(Debug, Clone)]
pub struct MovedFile {
    /// New file name (timestamp-suffixed)
    pub file_name: String,
    /// Full path after the move
    pub path: PathBuf,
}

/// Move files modified within `window` from `downloads_dir` into `dest_dir`.
///
/// Each file is renamed `<stem><HHMMSSffffff>.<ext>` (UTC) before the move;
/// the original extension is preserved. Returns the moved files, which may be
/// empty when nothing recent was found.
pub fn collect_recent_downloads(
    downloads_dir: &Path,
    dest_dir: &Path,
    window: Duration,
) -> VigilarResult<Vec<MovedFile>> {
    std::fs::create_dir_all(dest_dir)?;
    let now = SystemTime::now();
    let mut moved = Vec::new();

    for entry in std::fs::read_dir(downloads_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age > window {
            continue;
        }

        let path = entry.path();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "download".to_string());
        let suffix = Utc::now().format("%H%M%S%6f");
        let new_name = match path.extension() {
            Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
            None => format!("{stem}{suffix}"),
        };

        let dest = dest_dir.join(&new_name);
        move_file(&path, &dest)?;
        info!(from = %path.display(), to = %dest.display(), "moved downloaded file");
        moved.push(MovedFile {
            file_name: new_name,
            path: dest,
        });
    }

    if moved.is_empty() {
        warn!(dir = %downloads_dir.display(), "no recently downloaded files found");
    }
    Ok(moved)
}

/// `rename` first; copy-and-delete when the directories sit on different
/// filesystems.
fn move_file(from: &Path, to: &Path) -> VigilarResult<()> {
    if std::fs::rename(from, to).is_err() {
        std::fs::copy(from, to)?;
        std::fs::remove_file(from)?;
    }
    Ok(())
}

/// Unpack `archive` into `extract_to` and return the names of spreadsheet
/// members found inside it.
pub fn unzip_and_find_spreadsheets(
    archive: &Path,
    extract_to: &Path,
) -> VigilarResult<Vec<String>> {
    std::fs::create_dir_all(extract_to)?;
    let file = std::fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;

    let spreadsheets: Vec<String> = zip
        .file_names()
        .filter(|name| {
            Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| {
                    SPREADSHEET_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
        })
        .map(str::to_string)
        .collect();

    zip.extract(extract_to)?;

    if spreadsheets.is_empty() {
        warn!(archive = %archive.display(), "no spreadsheet files found in archive");
    } else {
        info!(count = spreadsheets.len(), "spreadsheet output verified");
    }
    Ok(spreadsheets)
}

/// Remove everything under `dir` (files, links, subdirectories), keeping the
/// directory itself.
pub fn clear_dir(dir: &Path) -> VigilarResult<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let result = if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "failed to remove");
        }
    }
    Ok(())
}

/// Pick an input file for the option from the testdata directory, optionally
/// filtered by extension. Selection rotates by wall clock so repeated runs
/// spread across the corpus.
pub fn pick_input_file(
    testdata_dir: &Path,
    option: &str,
    extension: Option<&str>,
) -> VigilarResult<PathBuf> {
    let dir = testdata_dir.join(option);
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(&dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| match extension {
            None => true,
            Some(ext) => p
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext)),
        })
        .collect();
    candidates.sort();

    if candidates.is_empty() {
        return Err(VigilarError::Config {
            message: format!(
                "no input files under {} matching extension {extension:?}",
                dir.display()
            ),
        });
    }

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as usize;
    Ok(candidates[nanos % candidates.len()].clone())
}

/// List every input file for the option, for parameterized sweeps
pub fn list_input_files(testdata_dir: &Path, option: &str) -> VigilarResult<Vec<PathBuf>> {
    let dir = testdata_dir.join(option);
    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    mod move_tests {
        use super::*;

        #[test]
        fn test_recent_file_moved_with_extension_preserved() {
            let downloads = tempfile::tempdir().unwrap();
            let dest = tempfile::tempdir().unwrap();
            std::fs::write(downloads.path().join("output.zip"), b"PK\x03\x04").unwrap();

            let moved =
                collect_recent_downloads(downloads.path(), dest.path(), RECENT_WINDOW).unwrap();

            assert_eq!(moved.len(), 1);
            let moved = &moved[0];
            // Round-trip: discoverable at the new path, original extension kept
            assert!(moved.path.exists());
            assert_eq!(
                moved.path.extension().and_then(|e| e.to_str()),
                Some("zip")
            );
            assert!(moved.file_name.starts_with("output"));
            assert_ne!(moved.file_name, "output.zip");
            assert!(!downloads.path().join("output.zip").exists());
        }

        #[test]
        fn test_old_files_left_alone() {
            let downloads = tempfile::tempdir().unwrap();
            let dest = tempfile::tempdir().unwrap();
            std::fs::write(downloads.path().join("stale.zip"), b"old").unwrap();

            // Zero window: nothing counts as recent
            let moved =
                collect_recent_downloads(downloads.path(), dest.path(), Duration::ZERO).unwrap();

            assert!(moved.is_empty());
            assert!(downloads.path().join("stale.zip").exists());
        }
    }

    mod zip_tests {
        use super::*;

        fn write_archive(path: &Path, members: &[(&str, &[u8])]) {
            let file = std::fs::File::create(path).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            for (name, contents) in members {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents).unwrap();
            }
            writer.finish().unwrap();
        }

        #[test]
        fn test_unzip_finds_spreadsheets() {
            let dir = tempfile::tempdir().unwrap();
            let archive = dir.path().join("output.zip");
            write_archive(
                &archive,
                &[
                    ("statement_output.xlsx", b"sheet".as_slice()),
                    ("summary.txt", b"notes".as_slice()),
                ],
            );

            let extract_to = dir.path().join("extracted");
            let sheets = unzip_and_find_spreadsheets(&archive, &extract_to).unwrap();

            assert_eq!(sheets, vec!["statement_output.xlsx".to_string()]);
            assert!(extract_to.join("statement_output.xlsx").exists());
            assert!(extract_to.join("summary.txt").exists());
        }

        #[test]
        fn test_archive_without_spreadsheets_reports_empty() {
            let dir = tempfile::tempdir().unwrap();
            let archive = dir.path().join("output.zip");
            write_archive(&archive, &[("readme.md", b"hi".as_slice())]);

            let sheets =
                unzip_and_find_spreadsheets(&archive, &dir.path().join("x")).unwrap();
            assert!(sheets.is_empty());
        }
    }

    mod cleanup_tests {
        use super::*;

        #[test]
        fn test_clear_dir_removes_files_and_subdirs() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("a.zip"), b"x").unwrap();
            std::fs::create_dir_all(dir.path().join("extracted/inner")).unwrap();

            clear_dir(dir.path()).unwrap();

            assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        }

        #[test]
        fn test_clear_missing_dir_is_fine() {
            clear_dir(Path::new("/nonexistent/vigilar-test")).unwrap();
        }
    }

    mod picker_tests {
        use super::*;

        #[test]
        fn test_pick_respects_extension_filter() {
            let dir = tempfile::tempdir().unwrap();
            let option_dir = dir.path().join("bank_statement");
            std::fs::create_dir_all(&option_dir).unwrap();
            std::fs::write(option_dir.join("a.pdf"), b"pdf").unwrap();
            std::fs::write(option_dir.join("b.png"), b"png").unwrap();

            let picked = pick_input_file(dir.path(), "bank_statement", Some("pdf")).unwrap();
            assert_eq!(picked.extension().and_then(|e| e.to_str()), Some("pdf"));
        }

        #[test]
        fn test_pick_with_no_candidates_is_config_error() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("empty")).unwrap();
            assert!(matches!(
                pick_input_file(dir.path(), "empty", None),
                Err(VigilarError::Config { .. })
            ));
        }

        #[test]
        fn test_list_input_files_sorted() {
            let dir = tempfile::tempdir().unwrap();
            let option_dir = dir.path().join("redaction");
            std::fs::create_dir_all(&option_dir).unwrap();
            std::fs::write(option_dir.join("b.pdf"), b"2").unwrap();
            std::fs::write(option_dir.join("a.pdf"), b"1").unwrap();

            let files = list_input_files(dir.path(), "redaction").unwrap();
            assert_eq!(files.len(), 2);
            assert!(files[0].ends_with("a.pdf"));
        }
    }
}
