//! Load a workbook export from disk: one JSON file, a folder of sheet files, or a .zip.

use crate::config::{MAX_SHEETS, MAX_WORKBOOK_FILE_BYTES};
use crate::sheet::{parse_export, Sheet, Workbook};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

const JSON_SUFFIX: &str = ".json";

/// Read the workbook at `path`. Directory and archive entries are read in
/// file-name order; non-JSON files are ignored.
pub fn load_workbook(path: &Path) -> Result<Workbook, String> {
    let path = path.canonicalize().map_err(|e| e.to_string())?;
    let sheets = if path.is_dir() {
        load_dir(&path)?
    } else {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "zip" => load_zip(&path)?,
            "json" => read_export(&path)?,
            _ => {
                return Err(format!(
                    "{} is not a .json export, .zip archive or directory",
                    path.display()
                ))
            }
        }
    };
    if sheets.len() > MAX_SHEETS {
        return Err(format!("workbook has {} sheets (max {})", sheets.len(), MAX_SHEETS));
    }
    tracing::info!("loaded {} sheet(s) from {}", sheets.len(), path.display());
    Ok(Workbook { sheets })
}

fn read_export(path: &Path) -> Result<Vec<Sheet>, String> {
    crate::util::check_file_size(path, MAX_WORKBOOK_FILE_BYTES)?;
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    parse_export(&content)
        .map(|wb| wb.sheets)
        .map_err(|e| format!("{}: {}", path.display(), e))
}

fn is_json_name(name: &str) -> bool {
    name.to_lowercase().ends_with(JSON_SUFFIX)
}

fn load_dir(dir: &Path) -> Result<Vec<Sheet>, String> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| e.to_string())?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .map(is_json_name)
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    let mut sheets = Vec::new();
    for file in files {
        if sheets.len() >= MAX_SHEETS {
            tracing::warn!("sheet limit reached; ignoring {}", file.display());
            break;
        }
        sheets.extend(read_export(&file)?);
    }
    Ok(sheets)
}

fn load_zip(zip_path: &Path) -> Result<Vec<Sheet>, String> {
    let file = fs::File::open(zip_path).map_err(|e| e.to_string())?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| e.to_string())?;
    let mut names: Vec<(String, usize)> = (0..zip.len())
        .filter_map(|i| {
            let entry = zip.by_index(i).ok()?;
            let name = entry.name().to_string();
            (entry.is_file() && is_json_name(&name) && !name.contains("__MACOSX"))
                .then_some((name, i))
        })
        .collect();
    names.sort();

    let mut sheets = Vec::new();
    for (name, i) in names {
        if sheets.len() >= MAX_SHEETS {
            tracing::warn!("sheet limit reached; ignoring archive entry {}", name);
            break;
        }
        let mut entry = zip.by_index(i).map_err(|e| e.to_string())?;
        if entry.size() > MAX_WORKBOOK_FILE_BYTES as u64 {
            return Err(format!(
                "{}: entry too large: {} bytes (max {})",
                name,
                entry.size(),
                MAX_WORKBOOK_FILE_BYTES
            ));
        }
        let mut content = String::with_capacity(entry.size() as usize);
        entry
            .read_to_string(&mut content)
            .map_err(|e| format!("{}: {}", name, e))?;
        let wb = parse_export(&content).map_err(|e| format!("{}: {}", name, e))?;
        sheets.extend(wb.sheets);
    }
    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SHEET_A: &str = r##"{"name": "A", "tabColor": "#ff0000", "rows": [["x"]]}"##;
    const SHEET_B: &str = r##"{"name": "B", "tabColor": "#ff9900", "rows": []}"##;

    #[test]
    fn directory_reads_json_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("02_b.json"), SHEET_B).unwrap();
        fs::write(dir.path().join("01_a.json"), SHEET_A).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let wb = load_workbook(dir.path()).unwrap();
        let names: Vec<_> = wb.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn single_workbook_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workbook.json");
        fs::write(&path, format!(r#"{{"sheets": [{}, {}]}}"#, SHEET_A, SHEET_B)).unwrap();
        assert_eq!(load_workbook(&path).unwrap().sheets.len(), 2);
    }

    #[test]
    fn zip_archive_skips_macos_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheets.zip");
        let file = fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let opts = zip::write::SimpleFileOptions::default();
        zip.start_file("sheets/b.json", opts).unwrap();
        zip.write_all(SHEET_B.as_bytes()).unwrap();
        zip.start_file("sheets/a.json", opts).unwrap();
        zip.write_all(SHEET_A.as_bytes()).unwrap();
        zip.start_file("__MACOSX/sheets/._a.json", opts).unwrap();
        zip.write_all(b"junk").unwrap();
        zip.finish().unwrap();

        let wb = load_workbook(&path).unwrap();
        let names: Vec<_> = wb.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn unsupported_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "a,b").unwrap();
        assert!(load_workbook(&path).is_err());
    }
}
