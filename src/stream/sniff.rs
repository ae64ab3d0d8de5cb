//! Container format detection over the header window
//!
//! ```
//! use headerpeek::ContainerFormat;
//!
//! assert_eq!(ContainerFormat::detect(b"fLaC\x00\x00\x00\x22"), ContainerFormat::Flac);
//! assert_eq!(ContainerFormat::detect(b"hello"), ContainerFormat::Unknown);
//! ```

use std::fmt;
use std::io::SeekFrom;

use serde::Serialize;

use super::error::Result;
use super::peek::HeaderPeekStream;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Wav,
    Aiff,
    Ogg,
    Flac,
    Mp3,
    Mp4,
    Pdf,
    Zip,
    Png,
    Jpeg,
    Unknown,
}

impl ContainerFormat {
    /// Identify a container from its leading bytes
    pub fn detect(head: &[u8]) -> Self {
        match head {
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Self::Wav,
            [b'F', b'O', b'R', b'M', _, _, _, _, b'A', b'I', b'F', b'F' | b'C', ..] => Self::Aiff,
            [b'O', b'g', b'g', b'S', ..] => Self::Ogg,
            [b'f', b'L', b'a', b'C', ..] => Self::Flac,
            [b'I', b'D', b'3', ..] => Self::Mp3,
            // MPEG audio frame sync: 11 set bits, layer bits non-zero.
            [0xFF, second, ..] if second & 0xE0 == 0xE0 && second & 0x06 != 0 => Self::Mp3,
            [_, _, _, _, b'f', b't', b'y', b'p', ..] => Self::Mp4,
            [b'%', b'P', b'D', b'F', b'-', ..] => Self::Pdf,
            [b'P', b'K', 0x03, 0x04, ..] => Self::Zip,
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Self::Png,
            [0xFF, 0xD8, 0xFF, ..] => Self::Jpeg,
            _ => Self::Unknown,
        }
    }

    /// Conventional MIME type for the format
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Aiff => "audio/aiff",
            Self::Ogg => "audio/ogg",
            Self::Flac => "audio/flac",
            Self::Mp3 => "audio/mpeg",
            Self::Mp4 => "video/mp4",
            Self::Pdf => "application/pdf",
            Self::Zip => "application/zip",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Unknown => "application/octet-stream",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Wav => "WAV",
            Self::Aiff => "AIFF",
            Self::Ogg => "Ogg",
            Self::Flac => "FLAC",
            Self::Mp3 => "MP3",
            Self::Mp4 => "MP4",
            Self::Pdf => "PDF",
            Self::Zip => "ZIP",
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Result of sniffing a stream's header window
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Sniffed {
    pub format: ContainerFormat,
    pub header: Vec<u8>,
    /// Value of [`HeaderPeekStream::length`] at sniff time
    pub observed_len: u64,
}

/// Peek at the header window and rewind
///
/// Waits for the header (bounded by the stream's timeout), reads the whole
/// window from offset 0, and leaves the stream positioned at 0 so the
/// consumer sees the payload from the start.
pub fn sniff_stream(stream: &HeaderPeekStream) -> Result<Sniffed> {
    let observed_len = stream.length()?;
    stream.seek(SeekFrom::Start(0))?;

    // A single read hands back the whole remaining header window.
    let mut header = vec![0u8; stream.config().header_capacity];
    let n = stream.read(&mut header)?;
    header.truncate(n);
    stream.seek(SeekFrom::Start(0))?;

    Ok(Sniffed {
        format: ContainerFormat::detect(&header),
        header,
        observed_len,
    })
}
