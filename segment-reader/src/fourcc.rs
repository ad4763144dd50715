use std::fmt;

/// A 4-byte chunk identifier, compared byte-for-byte (no case folding).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const fn new(tag: &[u8; 4]) -> Self {
        FourCc(*tag)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut b = [0u8; 4];
        b.copy_from_slice(&bytes[..4]);
        FourCc(b)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0, 0, 0, 0]
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "FourCc({s:?})"),
            Err(_) => write!(f, "FourCc({:?})", self.0),
        }
    }
}

pub const RIFF: FourCc = FourCc(*b"RIFF");
pub const LIST: FourCc = FourCc(*b"LIST");
pub const SEGH: FourCc = FourCc(*b"segh");
pub const TRKL: FourCc = FourCc(*b"trkl");
pub const DMTK: FourCc = FourCc(*b"DMTK");
pub const TRKH: FourCc = FourCc(*b"trkh");
pub const DMSG: FourCc = FourCc(*b"DMSG");
