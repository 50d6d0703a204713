//! Reading dump and seed files, transparently decompressing by extension.

use crate::error::{PipelineError, Result, Stage};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compression format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wrap a reader with the appropriate decompressor
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> std::io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

/// Read a whole input file as UTF-8 text.
///
/// A missing file is reported as `InputNotFound` for the given stage.
pub fn read_text(path: &Path, stage: Stage, what: &'static str) -> Result<String> {
    read_text_with_progress(path, stage, what, None::<fn(u64)>)
}

/// Like [`read_text`], reporting compressed bytes consumed to `progress`.
pub fn read_text_with_progress<F>(
    path: &Path,
    stage: Stage,
    what: &'static str,
    progress: Option<F>,
) -> Result<String>
where
    F: Fn(u64) + 'static,
{
    if !path.is_file() {
        return Err(PipelineError::InputNotFound {
            stage,
            what,
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let compression = Compression::from_path(path);
    if compression != Compression::None {
        log::debug!("{}: {} is {}-compressed", stage, path.display(), compression);
    }

    let raw: Box<dyn Read> = match progress {
        Some(report) => Box::new(CountingReader {
            inner: file,
            consumed: 0,
            report,
        }),
        None => Box::new(file),
    };
    let mut reader = compression
        .wrap_reader(raw)
        .map_err(|e| PipelineError::io(path, e))?;

    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| PipelineError::io(path, e))?;
    Ok(text)
}

/// Reports the running total of bytes pulled from `inner`
struct CountingReader<R, F> {
    inner: R,
    consumed: u64,
    report: F,
}

impl<R: Read, F: Fn(u64)> Read for CountingReader<R, F> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n as u64;
        (self.report)(self.consumed);
        Ok(n)
    }
}
