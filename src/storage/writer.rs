use super::error::StorageError;
use crate::metainfo::File;
use crate::scheduler::PieceTable;
use bytes::Bytes;
use std::path::{Component, Path};
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

fn validate_file_path(file_path: &Path) -> Result<(), StorageError> {
    for component in file_path.components() {
        match component {
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(StorageError::PathTraversal(file_path.display().to_string()));
            }
            _ => {}
        }
    }
    Ok(())
}

async fn create(path: &Path) -> Result<BufWriter<fs::File>, StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    Ok(BufWriter::new(fs::File::create(path).await?))
}

/// Writes `pieces` to `path` back to back, in index order. Returns the
/// number of bytes written.
pub async fn write_pieces(path: impl AsRef<Path>, pieces: &[Bytes]) -> Result<u64, StorageError> {
    let path = path.as_ref();
    let mut out = create(path).await?;

    let mut written = 0u64;
    for piece in pieces {
        out.write_all(piece).await?;
        written += piece.len() as u64;
    }
    out.flush().await?;

    debug!(path = %path.display(), bytes = written, pieces = pieces.len(), "pieces written");
    Ok(written)
}

/// Writes the verified pieces of `table`, refusing if any piece is missing.
pub async fn write_table(path: impl AsRef<Path>, table: &PieceTable) -> Result<u64, StorageError> {
    let pieces = (0..table.len())
        .map(|index| table.piece(index).ok_or(StorageError::MissingPiece(index)))
        .collect::<Result<Vec<_>, _>>()?;
    write_pieces(path, &pieces).await
}

/// Splits the concatenated pieces across a torrent's files under `base`.
///
/// File paths must be relative and free of `..`. The pieces must hold
/// exactly the files' total length.
pub async fn write_files(
    base: impl AsRef<Path>,
    files: &[File],
    pieces: &[Bytes],
) -> Result<(), StorageError> {
    let base = base.as_ref();
    for file in files {
        validate_file_path(&file.path)?;
    }

    let expected: u64 = files.iter().map(|f| f.length).sum();
    let actual: u64 = pieces.iter().map(|p| p.len() as u64).sum();
    if expected != actual {
        return Err(StorageError::LengthMismatch { expected, actual });
    }

    let mut source = pieces.iter().cloned();
    let mut current = Bytes::new();

    for file in files {
        let path = base.join(&file.path);
        let mut out = create(&path).await?;

        let mut remaining = file.length;
        while remaining > 0 {
            if current.is_empty() {
                current = source
                    .next()
                    .ok_or(StorageError::LengthMismatch { expected, actual })?;
                continue;
            }
            let n = remaining.min(current.len() as u64) as usize;
            out.write_all(&current.split_to(n)).await?;
            remaining -= n as u64;
        }
        out.flush().await?;
        debug!(path = %path.display(), bytes = file.length, "file written");
    }
    Ok(())
}
