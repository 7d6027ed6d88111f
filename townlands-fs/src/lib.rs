//! Shared filesystem helpers built on `cap-std` and `camino`.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;

/// Open a UTF-8 file path using ambient authority.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Resolve an ambient directory for the given path and return the directory with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Return whether a path exists and is a regular file using capability-based IO.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Return whether a path exists and is a directory.
pub fn dir_is_dir(path: &Utf8Path) -> io::Result<bool> {
    match fs_utf8::Dir::open_ambient_dir(path, ambient_authority()) {
        Ok(dir) => dir.dir_metadata().map(|meta| meta.is_dir()),
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
            ) =>
        {
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// List the regular files directly inside `dir` whose extension equals
/// `extension`, sorted by file name.
///
/// Matching is case-sensitive and non-recursive. Hidden files are ignored.
///
/// # Examples
/// ```
/// use camino::Utf8Path;
/// use townlands_fs::list_files_with_extension;
///
/// let dir = tempfile::tempdir()?;
/// std::fs::write(dir.path().join("b.geojson"), "{}")?;
/// std::fs::write(dir.path().join("a.geojson"), "{}")?;
/// std::fs::write(dir.path().join("notes.txt"), "")?;
/// let root = Utf8Path::from_path(dir.path()).ok_or_else(|| std::io::Error::other("utf8"))?;
/// let files = list_files_with_extension(root, "geojson")?;
/// let names: Vec<_> = files.iter().filter_map(|path| path.file_name()).collect();
/// assert_eq!(names, ["a.geojson", "b.geojson"]);
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn list_files_with_extension(dir: &Utf8Path, extension: &str) -> io::Result<Vec<Utf8PathBuf>> {
    let handle = fs_utf8::Dir::open_ambient_dir(dir, ambient_authority())?;
    let mut names = Vec::new();
    for entry in handle.entries()? {
        let name = entry?.file_name()?;
        if name.starts_with('.') || Utf8Path::new(&name).extension() != Some(extension) {
            continue;
        }
        if handle.metadata(name.as_str())?.is_file() {
            names.push(name);
        }
    }
    names.sort_unstable();
    Ok(names.into_iter().map(|name| dir.join(name)).collect())
}
