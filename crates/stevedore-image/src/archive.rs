//! Archive detection and extraction.
//!
//! Archives are recognised by content, not by name: a file is an archive
//! when its stream, after any gzip, bzip2, xz or zstd decoding, starts with
//! a valid tar entry. Empty archives therefore count as plain files.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use stevedore_common::error::{Result, StevedoreError};
use stevedore_core::filesystem::paths::ensure_dir;
use stevedore_core::ownership::can_chown_freely;

/// Gzip member header magic.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// bzip2 stream header magic.
const BZIP2_MAGIC: &[u8] = b"BZh";
/// xz stream header magic.
const XZ_MAGIC: [u8; 6] = [0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];
/// zstd frame magic.
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// Stream compression recognised in front of a tar archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain tar.
    None,
    /// gzip (`.tar.gz`, `.tgz`).
    Gzip,
    /// bzip2 (`.tar.bz2`).
    Bzip2,
    /// xz (`.tar.xz`).
    Xz,
    /// zstd (`.tar.zst`).
    Zstd,
}

/// Detect compression from leading magic bytes.
#[must_use]
pub fn detect_compression_magic(magic: &[u8]) -> Compression {
    if magic.starts_with(&GZIP_MAGIC) {
        Compression::Gzip
    } else if magic.starts_with(BZIP2_MAGIC) {
        Compression::Bzip2
    } else if magic.starts_with(&XZ_MAGIC) {
        Compression::Xz
    } else if magic.starts_with(&ZSTD_MAGIC) {
        Compression::Zstd
    } else {
        Compression::None
    }
}

/// Opens `path` and returns a reader over its decompressed bytes.
fn open_decoded(path: &Path) -> Result<Box<dyn Read>> {
    let mut file = File::open(path).map_err(|e| StevedoreError::io(path, e))?;
    let mut magic = Vec::with_capacity(XZ_MAGIC.len());
    let _ = file
        .by_ref()
        .take(XZ_MAGIC.len() as u64)
        .read_to_end(&mut magic)
        .map_err(|e| StevedoreError::io(path, e))?;
    let _ = file
        .seek(SeekFrom::Start(0))
        .map_err(|e| StevedoreError::io(path, e))?;

    let file = BufReader::new(file);
    match detect_compression_magic(&magic) {
        Compression::Gzip => Ok(Box::new(flate2::read::GzDecoder::new(file))),
        Compression::Bzip2 => Ok(Box::new(bzip2::read::BzDecoder::new(file))),
        Compression::Xz => Ok(Box::new(xz2::read::XzDecoder::new(file))),
        Compression::Zstd => {
            let decoder = zstd::stream::read::Decoder::with_buffer(file)
                .map_err(|e| StevedoreError::io(path, e))?;
            Ok(Box::new(decoder))
        }
        Compression::None => Ok(Box::new(file)),
    }
}

/// Returns whether `path` is a non-empty, possibly compressed, tar archive.
#[must_use]
pub fn is_archive(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let Ok(reader) = open_decoded(path) else {
        return false;
    };
    let mut archive = tar::Archive::new(reader);
    let Ok(mut entries) = archive.entries() else {
        return false;
    };
    let first = entries.next();
    matches!(first, Some(Ok(_)))
}

/// Unpacks a tar stream into `target`, keeping modes and timestamps.
///
/// Embedded ownership is kept when the process is allowed to chown.
pub(crate) fn unpack_into<R: Read>(reader: R, target: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_preserve_ownerships(can_chown_freely());
    archive.set_overwrite(true);
    archive
        .unpack(target)
        .map_err(|e| StevedoreError::io(target, e))
}

/// Extracts a tar archive into the target directory.
///
/// Supports plain tar and gzip, bzip2, xz or zstd compressed tar, detected
/// by content.
///
/// # Errors
///
/// Returns an error if the target cannot be created or extraction fails.
pub fn extract_archive(archive_path: &Path, target: &Path) -> Result<()> {
    tracing::debug!(
        archive = %archive_path.display(),
        target = %target.display(),
        "extracting archive"
    );
    ensure_dir(target)?;
    let reader = open_decoded(archive_path)?;
    unpack_into(reader, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tar(dir: &Path) -> std::path::PathBuf {
        let tar_path = dir.join("test.tar");
        let file = std::fs::File::create(&tar_path).expect("failed to create tar file");
        let mut builder = tar::Builder::new(file);
        let data = b"hello from archive";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "nested/hello.txt", &data[..])
            .expect("failed to append data");
        builder.finish().expect("failed to finish tar");
        tar_path
    }

    fn create_test_tar_gz(dir: &Path, name: &str) -> std::path::PathBuf {
        let tar_gz_path = dir.join(name);
        let file = std::fs::File::create(&tar_gz_path).expect("failed to create tar.gz");
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let data = b"hello from gzipped archive";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o640);
        header.set_cksum();
        builder
            .append_data(&mut header, "gzhello.txt", &data[..])
            .expect("failed to append data");
        let encoder = builder.into_inner().expect("failed to finish encoder");
        let _ = encoder.finish().expect("failed to finish gzip");
        tar_gz_path
    }

    fn tar_bytes(name: &str, data: &[u8]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, data)
            .expect("failed to append data");
        builder.into_inner().expect("failed to finish tar")
    }

    fn write_compressed(dir: &Path, name: &str, compression: Compression) -> std::path::PathBuf {
        use std::io::Write;

        let raw = tar_bytes("packed/inner.txt", b"compressed payload");
        let bytes = match compression {
            Compression::None => raw,
            Compression::Gzip => {
                let mut enc =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
                enc.write_all(&raw).expect("gzip");
                enc.finish().expect("gzip finish")
            }
            Compression::Bzip2 => {
                let mut enc =
                    bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
                enc.write_all(&raw).expect("bzip2");
                enc.finish().expect("bzip2 finish")
            }
            Compression::Xz => {
                let mut enc = xz2::write::XzEncoder::new(Vec::new(), 6);
                enc.write_all(&raw).expect("xz");
                enc.finish().expect("xz finish")
            }
            Compression::Zstd => zstd::stream::encode_all(&raw[..], 0).expect("zstd"),
        };
        let path = dir.join(name);
        std::fs::write(&path, bytes).expect("write archive");
        path
    }

    fn assert_extracts(compression: Compression) {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        // extension-free name: only the content may give the format away
        let archive = write_compressed(dir.path(), "payload", compression);
        let magic = std::fs::read(&archive).expect("read archive");
        assert_eq!(detect_compression_magic(&magic), compression);
        assert!(is_archive(&archive), "{compression:?} not sniffed as archive");

        let target = dir.path().join("out");
        extract_archive(&archive, &target).expect("extract failed");
        let content =
            std::fs::read_to_string(target.join("packed/inner.txt")).expect("read failed");
        assert_eq!(content, "compressed payload");
    }

    #[test]
    fn extract_bzip2_tar_detected_by_content() {
        assert_extracts(Compression::Bzip2);
    }

    #[test]
    fn extract_xz_tar_detected_by_content() {
        assert_extracts(Compression::Xz);
    }

    #[test]
    fn extract_zstd_tar_detected_by_content() {
        assert_extracts(Compression::Zstd);
    }

    #[test]
    fn compressed_non_tar_is_not_an_archive() {
        use std::io::Write;

        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("log.xz");
        let mut enc = xz2::write::XzEncoder::new(Vec::new(), 6);
        enc.write_all(&b"plain log line\n".repeat(64)).expect("xz");
        std::fs::write(&path, enc.finish().expect("xz finish")).expect("write");
        assert!(!is_archive(&path));
    }

    #[test]
    fn extract_plain_tar_creates_expected_files() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let tar_path = create_test_tar(dir.path());
        let target = dir.path().join("extracted");

        extract_archive(&tar_path, &target).expect("extract failed");
        let content =
            std::fs::read_to_string(target.join("nested/hello.txt")).expect("read failed");
        assert_eq!(content, "hello from archive");
    }

    #[test]
    fn extract_gzip_tar_detected_by_content() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        // misleading name: detection must not rely on the extension
        let tar_gz_path = create_test_tar_gz(dir.path(), "payload.bin");
        let target = dir.path().join("extracted_gz");

        extract_archive(&tar_gz_path, &target).expect("extract failed");
        let content = std::fs::read_to_string(target.join("gzhello.txt")).expect("read failed");
        assert_eq!(content, "hello from gzipped archive");
    }

    #[test]
    fn extract_nonexistent_archive_returns_error() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let result = extract_archive(&dir.path().join("missing.tar"), &dir.path().join("out"));
        assert!(result.is_err());
    }

    #[test]
    fn is_archive_sniffs_content() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        assert!(is_archive(&create_test_tar(dir.path())));
        assert!(is_archive(&create_test_tar_gz(dir.path(), "a.tgz")));

        let text = dir.path().join("notes.tar");
        std::fs::write(&text, "just text ".repeat(100)).expect("write");
        assert!(!is_archive(&text));

        let empty = dir.path().join("empty.tar");
        std::fs::write(&empty, b"").expect("write");
        assert!(!is_archive(&empty));

        assert!(!is_archive(dir.path()));
    }

    #[test]
    fn empty_tar_is_not_an_archive() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("empty.tar");
        let mut builder = tar::Builder::new(std::fs::File::create(&path).expect("create"));
        builder.finish().expect("finish");
        assert!(!is_archive(&path));
    }

    #[test]
    fn detect_compression_from_magic() {
        assert_eq!(detect_compression_magic(&[0x1f, 0x8b, 8]), Compression::Gzip);
        assert_eq!(detect_compression_magic(b"BZh91AY"), Compression::Bzip2);
        assert_eq!(
            detect_compression_magic(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, 0x00]),
            Compression::Xz
        );
        assert_eq!(detect_compression_magic(&[0xfd, 0x37, 0x7a]), Compression::None);
        assert_eq!(
            detect_compression_magic(&[0x28, 0xb5, 0x2f, 0xfd, 0x04]),
            Compression::Zstd
        );
        assert_eq!(detect_compression_magic(b"ustar"), Compression::None);
        assert_eq!(detect_compression_magic(&[]), Compression::None);
    }
}
