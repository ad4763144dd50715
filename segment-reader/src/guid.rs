/// A 16-byte GUID read in the container's mixed-endian layout: the first
/// three fields (`data1: u32`, `data2: u16`, `data3: u16`) are little-endian
/// on the wire, the last 8 bytes (`data4`) are stored in the order they
/// appear in the canonical hyphenated string (i.e. big-endian/network byte
/// order, untouched by the endian swap applied to the first three fields).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MixedGuid(pub [u8; 16]);

impl MixedGuid {
    pub fn from_wire_bytes(bytes: &[u8; 16]) -> Self {
        MixedGuid(*bytes)
    }

    /// Parses the canonical `AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE` form into
    /// the mixed-endian wire representation used by this container.
    pub fn parse(canonical: &str) -> Option<Self> {
        let hex: String = canonical.chars().filter(|c| *c != '-').collect();
        if hex.len() != 32 {
            return None;
        }
        let mut raw = [0u8; 16];
        for i in 0..16 {
            raw[i] = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        // raw is big-endian throughout (as written in the string); swap the
        // first three fields to little-endian to get the wire layout.
        let mut wire = [0u8; 16];
        wire[0] = raw[3];
        wire[1] = raw[2];
        wire[2] = raw[1];
        wire[3] = raw[0];
        wire[4] = raw[5];
        wire[5] = raw[4];
        wire[6] = raw[7];
        wire[7] = raw[6];
        wire[8..16].copy_from_slice(&raw[8..16]);
        Some(MixedGuid(wire))
    }
}

impl std::fmt::Debug for MixedGuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MixedGuid(")?;
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_matches_hand_computed_wire_bytes() {
        let g = MixedGuid::parse("D2AC2885-B39B-11D1-8704-00600893B1BD").unwrap();
        assert_eq!(
            g.0,
            [0x85, 0x28, 0xAC, 0xD2, 0x9B, 0xB3, 0xD1, 0x11, 0x87, 0x04, 0x00, 0x60, 0x08, 0x93, 0xB1, 0xBD]
        );
    }
}
