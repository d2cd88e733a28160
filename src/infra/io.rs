use memmap2::Mmap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

#[derive(Debug, thiserror::Error)]
pub enum SourceFileError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not valid {encoding:?} text", path.display())]
    Decode { path: PathBuf, encoding: TextEncoding },
    #[error("{} cannot hold {ch:?} in {encoding:?}", path.display())]
    Encode {
        path: PathBuf,
        encoding: TextEncoding,
        ch: char,
    },
}

/// On-disk text encoding, detected from the byte order mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    /// Fallback for bytes that are not UTF-8; maps each byte to one char
    Latin1,
}

pub enum FileContent {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl AsRef<[u8]> for FileContent {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileContent::Mapped(mmap) => &mmap[..],
            FileContent::Buffered(bytes) => bytes.as_slice(),
        }
    }
}

pub fn read_file_smart<P: AsRef<Path>>(path: P) -> io::Result<FileContent> {
    let path = path.as_ref();
    let metadata = fs::metadata(path)?;

    if metadata.len() > MMAP_THRESHOLD {
        // Use memory mapping for large files
        let file = File::open(path)?;

        // Safety: We're only reading the file, and the map is dropped before
        // the same path is written again
        let mmap = unsafe { Mmap::map(&file) }?;

        Ok(FileContent::Mapped(mmap))
    } else {
        Ok(FileContent::Buffered(fs::read(path)?))
    }
}

/// A file's full text, owned by whichever pass is rewriting it.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    pub text: String,
    encoding: TextEncoding,
}

impl SourceFile {
    pub fn load(path: &Path) -> Result<Self, SourceFileError> {
        let content = read_file_smart(path).map_err(|source| SourceFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let (text, encoding) = decode(content.as_ref()).map_err(|encoding| {
            SourceFileError::Decode {
                path: path.to_path_buf(),
                encoding,
            }
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            text,
            encoding,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Write the text back in its original encoding, replacing the file.
    #[allow(clippy::permissions_set_readonly_false)]
    pub fn save(&self) -> Result<(), SourceFileError> {
        let write_err = |source| SourceFileError::Write {
            path: self.path.clone(),
            source,
        };

        // Copied trees may carry read-only bits from the source
        let meta = fs::metadata(&self.path).map_err(write_err)?;
        let mut perms = meta.permissions();
        if perms.readonly() {
            perms.set_readonly(false);
            fs::set_permissions(&self.path, perms).map_err(write_err)?;
        }

        let bytes = encode(&self.text, self.encoding).map_err(|ch| SourceFileError::Encode {
            path: self.path.clone(),
            encoding: self.encoding,
            ch,
        })?;

        fs::write(&self.path, bytes).map_err(write_err)
    }
}

/// Decode bytes, reporting the detected encoding. The error carries the
/// encoding whose payload was malformed.
pub fn decode(bytes: &[u8]) -> Result<(String, TextEncoding), TextEncoding> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        let text = String::from_utf8(rest.to_vec()).map_err(|_| TextEncoding::Utf8Bom)?;
        return Ok((text, TextEncoding::Utf8Bom));
    }

    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        let text = decode_utf16(rest, u16::from_le_bytes).ok_or(TextEncoding::Utf16Le)?;
        return Ok((text, TextEncoding::Utf16Le));
    }

    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        let text = decode_utf16(rest, u16::from_be_bytes).ok_or(TextEncoding::Utf16Be)?;
        return Ok((text, TextEncoding::Utf16Be));
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Ok((text.to_string(), TextEncoding::Utf8)),
        Err(_) => Ok((
            bytes
                .iter()
                .map(|&b| char::from(b))
                .collect(),
            TextEncoding::Latin1,
        )),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }

    let units = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]));

    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .ok()
}

/// Encode text, restoring the BOM it was read with. The error is the first
/// char the encoding cannot represent.
pub fn encode(text: &str, encoding: TextEncoding) -> Result<Vec<u8>, char> {
    let bytes = match encoding {
        TextEncoding::Utf8 => text.as_bytes().to_vec(),
        TextEncoding::Utf8Bom => {
            let mut out = Vec::with_capacity(UTF8_BOM.len() + text.len());
            out.extend_from_slice(UTF8_BOM);
            out.extend_from_slice(text.as_bytes());
            out
        }
        TextEncoding::Utf16Le => {
            let mut out = UTF16_LE_BOM.to_vec();
            out.extend(
                text.encode_utf16()
                    .flat_map(u16::to_le_bytes),
            );
            out
        }
        TextEncoding::Utf16Be => {
            let mut out = UTF16_BE_BOM.to_vec();
            out.extend(
                text.encode_utf16()
                    .flat_map(u16::to_be_bytes),
            );
            out
        }
        // Decoded bytes map back one to one; anything added later must fit too
        TextEncoding::Latin1 => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).map_err(|_| c))
            .collect::<Result<_, _>>()?,
    };

    Ok(bytes)
}
