//! Helpers for output folders and file names shared by the tools

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use crate::Error;

/// The folder created next to the font when no output folder is given.
pub const SVG_FOLDER_NAME: &str = "SVGs";
/// The folder used for file names that clash on case-insensitive systems.
pub const NESTED_FOLDER_NAME: &str = "_moreSVGs_";

/// Split a comma separated list, trimming whitespace around each item.
pub fn split_comma_sequence(input: &str) -> Vec<String> {
    input.split(',').map(|item| item.trim().to_string()).collect()
}

/// The folder to write output to.
///
/// A provided folder must already exist; otherwise this is a `SVGs` folder
/// next to the first font, which is created later, when needed.
pub fn output_folder_path(provided: Option<&Path>, first_font: &Path) -> Result<PathBuf, Error> {
    match provided {
        Some(folder) => {
            let resolved = folder.canonicalize().unwrap_or_else(|_| folder.to_owned());
            if resolved.is_dir() {
                Ok(resolved)
            } else {
                Err(Error::InvalidFolderPath(resolved))
            }
        }
        None => Ok(first_font
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(SVG_FOLDER_NAME)),
    }
}

/// Create a folder (and its parents); an existing folder is not an error.
pub fn create_folder(path: &Path) -> Result<(), Error> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Create the nested folder inside `main_folder` and return its path.
pub fn create_nested_folder(main_folder: &Path) -> Result<PathBuf, Error> {
    let nested = main_folder.join(NESTED_FOLDER_NAME);
    create_folder(&nested)?;
    Ok(nested)
}

/// The names that would overwrite an earlier name on a case-insensitive
/// file system, like `A` after `a`.
pub fn names_to_save_in_nested_folder<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| !seen.insert(name.to_lowercase()))
        .collect()
}

/// Writes output files, creating folders only once something is written.
pub(crate) struct OutputFolder {
    main: PathBuf,
    nested: HashSet<String>,
    saved: usize,
}

impl OutputFolder {
    pub(crate) fn new(main: PathBuf, nested: HashSet<&str>) -> Self {
        Self {
            main,
            nested: nested.into_iter().map(str::to_owned).collect(),
            saved: 0,
        }
    }

    /// Write `<name>.svg`, in the nested folder if the name clashes.
    pub(crate) fn save(&mut self, name: &str, contents: &[u8]) -> Result<(), Error> {
        create_folder(&self.main)?;
        let folder = if self.nested.contains(name) {
            create_nested_folder(&self.main)?
        } else {
            self.main.clone()
        };
        let path = folder.join(format!("{name}.svg"));
        fs::write(&path, contents).map_err(|e| Error::io(&path, e))?;
        self.saved += 1;
        Ok(())
    }

    pub(crate) fn saved(&self) -> usize {
        self.saved
    }
}

/// The closing message of the dump and fonts2svg tools.
pub fn final_message(num_saved: usize) -> String {
    match num_saved {
        0 => "No SVG files saved.".to_string(),
        1 => "1 SVG file saved.".to_string(),
        n => format!("{n} SVG files saved."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_trim() {
        assert_eq!(split_comma_sequence("a, b ,c"), ["a", "b", "c"]);
        assert_eq!(split_comma_sequence("one"), ["one"]);
    }

    #[test]
    fn nested_names() {
        let names = ["a", "A", "b", "B", "c", "AA", "aa"];
        let nested = names_to_save_in_nested_folder(names);
        assert_eq!(nested, HashSet::from(["A", "B", "aa"]));
    }

    #[test]
    fn messages() {
        assert_eq!(final_message(0), "No SVG files saved.");
        assert_eq!(final_message(1), "1 SVG file saved.");
        assert_eq!(final_message(12), "12 SVG files saved.");
    }

    #[test]
    fn default_output_folder() {
        let folder = output_folder_path(None, Path::new("/fonts/test.otf")).unwrap();
        assert_eq!(folder, Path::new("/fonts/SVGs"));
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            output_folder_path(Some(&missing), Path::new("x.otf")),
            Err(Error::InvalidFolderPath(_))
        ));
        assert!(output_folder_path(Some(dir.path()), Path::new("x.otf")).is_ok());
    }

    #[test]
    fn output_folder_is_created_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("SVGs");
        let mut output = OutputFolder::new(main.clone(), HashSet::from(["A"]));
        assert!(!main.exists());
        output.save("a", b"<svg/>").unwrap();
        assert!(!main.join(NESTED_FOLDER_NAME).exists());
        output.save("A", b"<svg/>").unwrap();
        assert!(main.join("a.svg").is_file());
        assert!(main.join(NESTED_FOLDER_NAME).join("A.svg").is_file());
        assert_eq!(output.saved(), 2);
    }
}
