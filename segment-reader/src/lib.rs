//! Parser for the "DMSG"-flavored RIFF segment container (§4.5 of the
//! design): a header chunk plus a list of typed track chunks.
//!
//! One-shot and synchronous: `SegmentReader::open` fully buffers the file,
//! validates structure, and returns a fully-populated [`Segment`] or a
//! [`SegmentError`] carrying a human-readable message, mirroring the
//! original reader's `open`/`get_error_message` pair.

mod fourcc;
mod guid;
mod riff;

use std::fs;
use std::path::Path;

pub use fourcc::FourCc;
pub use guid::MixedGuid;

use riff::ChunkCursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Format(String),
}

type Result<T> = std::result::Result<T, SegmentError>;

/// Flags carried by [`SegmentHeader::flags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoFlags8(pub u32);

impl IoFlags8 {
    pub const IS_REF_TIME: u32 = 0b0001;

    pub fn is_ref_time(self) -> bool {
        self.0 & Self::IS_REF_TIME != 0
    }
}

/// 40-byte `segh` header, decoded little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub repeat_count: u32,
    pub length: i32,
    pub play_start: i32,
    pub loop_start: i32,
    pub loop_end: i32,
    pub resolution: u32,
    pub ref_length: i64,
    pub flags: IoFlags8,
    pub reserved: u32,
}

impl SegmentHeader {
    pub const PACKED_SIZE: usize = 40;

    fn read(data: &[u8]) -> Result<Self> {
        if data.len() < Self::PACKED_SIZE {
            return Err(SegmentError::Format("invalid header size".into()));
        }
        let u32_at = |o: usize| u32::from_le_bytes(data[o..o + 4].try_into().unwrap());
        let i32_at = |o: usize| i32::from_le_bytes(data[o..o + 4].try_into().unwrap());
        let i64_at = |o: usize| i64::from_le_bytes(data[o..o + 8].try_into().unwrap());
        Ok(SegmentHeader {
            repeat_count: u32_at(0),
            length: i32_at(4),
            play_start: i32_at(8),
            loop_start: i32_at(12),
            loop_end: i32_at(16),
            resolution: u32_at(20),
            ref_length: i64_at(24),
            flags: IoFlags8(u32_at(32)),
            reserved: u32_at(36),
        })
    }
}

/// Track type, identified by the GUID carried in the track's `trkh` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Tempo,
    TimeSignature,
    Wave,
}

fn clsid_tempo_track() -> MixedGuid {
    MixedGuid::parse("D2AC2885-B39B-11D1-8704-00600893B1BD").unwrap()
}
fn clsid_time_sig_track() -> MixedGuid {
    MixedGuid::parse("D2AC2888-B39B-11D1-8704-00600893B1BD").unwrap()
}
fn clsid_wave_track() -> MixedGuid {
    MixedGuid::parse("EED36461-9EA5-11D3-9BD1-0080C7150A74").unwrap()
}

fn track_type_for_guid(guid: MixedGuid) -> Option<TrackType> {
    if guid == clsid_tempo_track() {
        Some(TrackType::Tempo)
    } else if guid == clsid_time_sig_track() {
        Some(TrackType::TimeSignature)
    } else if guid == clsid_wave_track() {
        Some(TrackType::Wave)
    } else {
        None
    }
}

/// 32-byte `trkh` track header.
#[derive(Debug, Clone, Copy)]
pub struct TrackHeader {
    pub guid: MixedGuid,
    pub position: u32,
    pub group: u32,
    pub chunk_id: FourCc,
    pub list_type: FourCc,
}

impl TrackHeader {
    pub const PACKED_SIZE: usize = 32;

    fn read(data: &[u8]) -> Result<Self> {
        if data.len() < Self::PACKED_SIZE {
            return Err(SegmentError::Format("invalid track header size".into()));
        }
        let mut guid_bytes = [0u8; 16];
        guid_bytes.copy_from_slice(&data[0..16]);
        let position = u32::from_le_bytes(data[16..20].try_into().unwrap());
        let group = u32::from_le_bytes(data[20..24].try_into().unwrap());
        let chunk_id = FourCc::from_bytes(&data[24..28]);
        let list_type = FourCc::from_bytes(&data[28..32]);
        Ok(TrackHeader {
            guid: MixedGuid::from_wire_bytes(&guid_bytes),
            position,
            group,
            chunk_id,
            list_type,
        })
    }

    pub fn track_type(&self) -> Option<TrackType> {
        track_type_for_guid(self.guid)
    }
}

/// A single track entry in the segment's track list. Payload decoding
/// (tempo curve, time signature changes, wave reference) is not performed
/// here -- the original reader's track-body handlers are no-ops too, and
/// nothing downstream of this crate consumes track payload contents.
#[derive(Debug, Clone)]
pub struct Track {
    pub header: TrackHeader,
    pub track_type: TrackType,
}

/// A fully-parsed segment file: its header plus its track list.
#[derive(Debug, Clone)]
pub struct Segment {
    pub header: SegmentHeader,
    pub tracks: Vec<Track>,
}

pub struct SegmentReader;

impl SegmentReader {
    /// Reads and parses `path`, returning the decoded [`Segment`] on
    /// success. Unlike the original C++ implementation (which returns
    /// `false` from `open_internal` even after every step succeeds), a
    /// fully successful parse here reports success -- see the design
    /// notes on the segment reader's "always returns false" defect.
    pub fn open(path: impl AsRef<Path>) -> Result<Segment> {
        let file_image = fs::read(path.as_ref())?;
        Self::parse(&file_image)
    }

    pub fn parse(file_image: &[u8]) -> Result<Segment> {
        let mut cursor = ChunkCursor::new(file_image);

        let content = cursor
            .find_and_descend_typed(fourcc::RIFF, fourcc::DMSG)
            .ok_or_else(|| SegmentError::Format("not a segment file".into()))?;
        let mut body = ChunkCursor::new(content);

        let header = Self::read_header(&mut body)?;
        let tracks = Self::read_tracks(&mut body)?;

        Ok(Segment { header, tracks })
    }

    fn read_header(body: &mut ChunkCursor<'_>) -> Result<SegmentHeader> {
        let chunk = body
            .find_and_descend(fourcc::SEGH)
            .ok_or_else(|| SegmentError::Format("no header".into()))?;
        let header = SegmentHeader::read(chunk)?;
        if !body.ascend() {
            return Err(SegmentError::Format("RIFF error".into()));
        }
        Ok(header)
    }

    fn read_tracks(body: &mut ChunkCursor<'_>) -> Result<Vec<Track>> {
        let list = body
            .find_and_descend_typed(fourcc::LIST, fourcc::TRKL)
            .ok_or_else(|| SegmentError::Format("no track list chunk".into()))?;
        let mut list_cursor = ChunkCursor::new(list);

        let mut tracks = Vec::new();
        loop {
            let track_content = match list_cursor.find_and_descend_typed(fourcc::RIFF, fourcc::DMTK) {
                Some(c) => c,
                None => break,
            };
            let track = Self::read_track(track_content)?;
            tracks.push(track);
            if !list_cursor.ascend() {
                return Err(SegmentError::Format("RIFF error".into()));
            }
        }

        if !body.ascend() {
            return Err(SegmentError::Format("RIFF error".into()));
        }

        Ok(tracks)
    }

    fn read_track(track_content: &[u8]) -> Result<Track> {
        let mut cursor = ChunkCursor::new(track_content);
        let chunk = cursor
            .find_and_descend(fourcc::TRKH)
            .ok_or_else(|| SegmentError::Format("no track header".into()))?;
        let header = TrackHeader::read(chunk)?;

        let track_type = header
            .track_type()
            .ok_or_else(|| SegmentError::Format("unsupported track type".into()))?;

        if header.chunk_id.is_zero() && header.list_type.is_zero() {
            return Err(SegmentError::Format(
                "expected track's chunk id or chunk type".into(),
            ));
        }

        if !cursor.ascend() {
            return Err(SegmentError::Format("RIFF error".into()));
        }

        Ok(Track { header, track_type })
    }
}
