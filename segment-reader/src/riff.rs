use crate::fourcc::FourCc;

/// A cursor over a chunked (RIFF-style) byte buffer: 4-byte FourCC id, a
/// 32-bit little-endian size, then `size` bytes of content padded to an
/// even boundary. `LIST`/`RIFF` containers additionally carry a 4-byte
/// type FourCC as the first four bytes of their content.
///
/// Mirrors the descend/ascend discipline of the original `RiffReader`:
/// every successful `find_and_descend*` must be matched by an `ascend` on
/// every exit path.
pub struct ChunkCursor<'a> {
    data: &'a [u8],
    pos: usize,
    bound_stack: Vec<usize>,
}

impl<'a> ChunkCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ChunkCursor {
            data,
            pos: 0,
            bound_stack: vec![data.len()],
        }
    }

    fn bound(&self) -> usize {
        *self.bound_stack.last().expect("bound stack never empty")
    }

    fn read_header(&self, at: usize) -> Option<(FourCc, u32)> {
        if at + 8 > self.data.len() {
            return None;
        }
        let id = FourCc::from_bytes(&self.data[at..at + 4]);
        let size = u32::from_le_bytes(self.data[at + 4..at + 8].try_into().unwrap());
        Some((id, size))
    }

    fn padded_end(content_start: usize, size: u32) -> usize {
        let end = content_start + size as usize;
        end + (end & 1)
    }

    /// Scans forward for a plain chunk with the given id and descends into
    /// it, returning its content slice. Leaves the cursor positioned past
    /// the end of the search on failure (matching the original's behaviour
    /// of consuming chunks it skips over).
    pub fn find_and_descend(&mut self, id: FourCc) -> Option<&'a [u8]> {
        let bound = self.bound();
        while self.pos + 8 <= bound {
            let (chunk_id, size) = self.read_header(self.pos)?;
            let content_start = self.pos + 8;
            let end = Self::padded_end(content_start, size);
            if end > bound || content_start + size as usize > self.data.len() {
                return None;
            }
            if chunk_id == id {
                self.bound_stack.push(end);
                self.pos = content_start;
                return Some(&self.data[content_start..content_start + size as usize]);
            }
            self.pos = end;
        }
        None
    }

    /// Scans forward for a `container_id` chunk (`RIFF`/`LIST`) whose
    /// embedded type FourCC matches `type_id`, and descends into its
    /// content (past the type field).
    pub fn find_and_descend_typed(&mut self, container_id: FourCc, type_id: FourCc) -> Option<&'a [u8]> {
        let bound = self.bound();
        while self.pos + 8 <= bound {
            let (chunk_id, size) = self.read_header(self.pos)?;
            let content_start = self.pos + 8;
            let end = Self::padded_end(content_start, size);
            if end > bound || content_start + size as usize > self.data.len() {
                return None;
            }
            if chunk_id == container_id && size >= 4 {
                let type_start = content_start;
                let inner_type = FourCc::from_bytes(&self.data[type_start..type_start + 4]);
                if inner_type == type_id {
                    self.bound_stack.push(end);
                    self.pos = content_start + 4;
                    return Some(&self.data[content_start + 4..content_start + size as usize]);
                }
            }
            self.pos = end;
        }
        None
    }

    /// Leaves the current chunk, restoring the cursor to just past its end.
    pub fn ascend(&mut self) -> bool {
        if self.bound_stack.len() <= 1 {
            return false;
        }
        let end = self.bound_stack.pop().unwrap();
        self.pos = end;
        true
    }
}
