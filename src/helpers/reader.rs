use crate::error::BannerSheetError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use thiserror::Error;
use url::Url;

/// Signature of a Compound File Binary container (legacy xls, encrypted xlsx).
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Error, Debug)]
pub(crate) enum UnifiedReaderError {
    #[error("No data from remote file: '{0}'")]
    RemoteFileNoDataError(String),
}

/// A unified reader that can handle both local files and remote URLs
pub(crate) enum UnifiedReader {
    /// Local file reader
    Local(BufReader<File>),
    /// Remote URL reader (in-memory buffer)
    Remote(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a file from either a local path or remote URL
    /// For remote URLs, uses DuckDB's read_blob with proper credential handling
    pub(crate) fn new(file_name: &str) -> Result<UnifiedReader, BannerSheetError> {
        if Self::is_remote_url(file_name) {
            // DuckDB handles credentials and protocols (http, https, s3, gs, hf, ...)
            Self::read_blob_with_duckdb(file_name)
        } else {
            let file = File::open(file_name)?;
            Ok(UnifiedReader::Local(BufReader::new(file)))
        }
    }

    /// Wraps bytes that are already in memory.
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> UnifiedReader {
        UnifiedReader::Remote(Cursor::new(bytes))
    }

    /// Checks if a file name represents a remote URL
    pub(crate) fn is_remote_url(file_name: &str) -> bool {
        if let Ok(url) = Url::parse(file_name) {
            // Single letters are Windows drive prefixes such as `C:\`
            url.scheme() != "file" && url.scheme().len() > 1
        } else {
            false
        }
    }

    /// Returns true when the content starts with a CFB header.
    /// The stream position is restored to the beginning afterwards.
    pub(crate) fn is_compound_file(&mut self) -> Result<bool, BannerSheetError> {
        let mut signature = [0u8; 8];
        self.seek(SeekFrom::Start(0))?;
        let matched = match self.read_exact(&mut signature) {
            Ok(()) => signature == CFB_SIGNATURE,
            Err(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => false,
            Err(error) => Err(error)?,
        };
        self.seek(SeekFrom::Start(0))?;
        Ok(matched)
    }

    /// Reads a remote file using DuckDB's read_blob functionality
    fn read_blob_with_duckdb(file_name: &str) -> Result<UnifiedReader, BannerSheetError> {
        let connection = duckdb::Connection::open_in_memory()?;
        let result: Result<Vec<u8>, _> = connection.query_row("SELECT content FROM read_blob(?)", [file_name], |row| row.get(0));
        connection.close().map_err(|(_, e)| e)?;

        let bytes = result?;
        if bytes.is_empty() {
            Err(UnifiedReaderError::RemoteFileNoDataError(file_name.to_owned()))?;
        }
        log::debug!("fetched {} bytes from '{}'", bytes.len(), file_name);
        Ok(UnifiedReader::Remote(Cursor::new(bytes)))
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Remote(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Remote(reader) => reader.seek(pos),
        }
    }
}
