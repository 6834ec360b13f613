//! Unpacking of downloaded mod archives into the scratch folder

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Archive container recognized by the fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    SevenZip,
    Rar,
    Unknown,
}

impl ArchiveFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "zip" => Self::Zip,
            "7z" => Self::SevenZip,
            "rar" => Self::Rar,
            _ => Self::Unknown,
        }
    }

    /// Sniff the container from its signature
    pub fn from_magic(head: &[u8]) -> Self {
        const SIGNATURES: [(&[u8], ArchiveFormat); 3] = [
            (b"PK", ArchiveFormat::Zip),
            (&[0x37, 0x7A, 0xBC, 0xAF], ArchiveFormat::SevenZip),
            (b"Rar!", ArchiveFormat::Rar),
        ];
        SIGNATURES
            .iter()
            .find(|(sig, _)| head.starts_with(sig))
            .map(|(_, format)| *format)
            .unwrap_or(Self::Unknown)
    }

    /// Format by extension, falling back to the file signature
    pub fn detect(path: &Path) -> Result<Self> {
        let by_name = Self::from_path(path);
        if by_name != Self::Unknown {
            return Ok(by_name);
        }
        let mut head = [0u8; 4];
        let read = fs::File::open(path)
            .and_then(|mut file| file.read(&mut head))
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_magic(&head[..read]))
    }
}

/// Unpack `archive` into `dest`, creating it if needed
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;

    let format = ArchiveFormat::detect(archive)?;
    tracing::info!("Extracting {} ({:?}) to {}", archive.display(), format, dest.display());

    match format {
        ArchiveFormat::Zip => unpack_zip(archive, dest),
        ArchiveFormat::SevenZip => sevenz_rust::decompress_file(archive, dest)
            .with_context(|| format!("Failed to extract {}", archive.display())),
        ArchiveFormat::Rar => unpack_rar(archive, dest),
        ArchiveFormat::Unknown => bail!("Unsupported archive: {}", archive.display()),
    }
}

fn unpack_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a valid zip archive", archive.display()))?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let Some(relative) = entry_path(entry.name()) else {
            tracing::warn!("Skipping unsafe archive entry {}", entry.name());
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        std::io::copy(&mut entry, &mut out)?;
    }

    Ok(())
}

/// Relative path for an archive entry, `None` when it would escape the
/// destination or names nothing
///
/// Backslash separators are accepted since many mod archives are packed
/// on Windows.
fn entry_path(name: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for part in name.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => return None,
            part if part.contains(':') => return None,
            part => path.push(part),
        }
    }
    (!path.as_os_str().is_empty()).then_some(path)
}

fn unpack_rar(archive: &Path, dest: &Path) -> Result<()> {
    // unrar wants a trailing separator to treat dest as a folder
    let mut target = dest.as_os_str().to_owned();
    target.push(std::path::MAIN_SEPARATOR_STR);

    let output = std::process::Command::new("unrar")
        .args(["x", "-o+", "-y", "-idq"])
        .arg(archive)
        .arg(&target)
        .output();

    match output {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => bail!(
            "unrar could not extract {}: {}",
            archive.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        ),
        Err(_) => bail!(
            "Extracting .rar archives needs the 'unrar' tool on PATH ({})",
            archive.display()
        ),
    }
}
