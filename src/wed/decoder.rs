use log::{debug, trace, warn};

use crate::err::DeserializationResult;
use crate::utils::{ReadExt, ReadSeek};
use crate::wed::structs::{
    Door, Overlay, Polygon, SecondaryHeader, Tilemap, Vertex, Wallgroup, WedHeader, WedRecord,
};
use crate::wed::{
    Wed, door_tile_cell_count, polygon_index_count, tile_index_count, tilemap_count, vertex_count,
    wallgroup_count,
};

/// Where a region starts.
#[derive(Debug, Clone, Copy)]
enum Start {
    /// Absolute offset recorded in a header.
    At(u32),
    /// No offset is recorded; the region is assumed to follow the previous one.
    Cursor,
}

/// Resolves the WED's offsets and derived counts in dependency order.
///
/// Regions are read in the order their sizes become known, not in file order.
/// Two regions (tilemaps, tile index lookup) have no recorded offset and are read
/// from wherever the previous region ended.
pub(crate) struct WedDecoder<'a, T: ReadSeek> {
    stream: &'a mut T,
}

impl<'a, T: ReadSeek> WedDecoder<'a, T> {
    pub fn new(stream: &'a mut T) -> Self {
        WedDecoder { stream }
    }

    fn seek_to(&mut self, start: Start, region: &'static str) -> DeserializationResult<()> {
        match start {
            Start::At(offset) => {
                self.stream.try_seek_abs_named(u64::from(offset), region)?;
            }
            Start::Cursor => {
                trace!("{} continues from the current cursor", region);
            }
        }
        Ok(())
    }

    fn read_region<R: WedRecord>(
        &mut self,
        start: Start,
        region: &'static str,
        count: u64,
    ) -> DeserializationResult<Vec<R>> {
        self.seek_to(start, region)?;
        trace!("Reading {} ({} x {} bytes) from {:?}", region, count, R::SIZE, start);
        self.stream
            .try_read_counted_array(region, count, R::SIZE, |s| R::from_stream(s, region))
    }

    fn read_u16_region(&mut self, start: Start, region: &'static str, count: u64) -> DeserializationResult<Vec<u16>> {
        self.seek_to(start, region)?;
        trace!("Reading {} ({} x u16) from {:?}", region, count, start);
        self.stream.try_read_counted_u16_array(region, count)
    }

    fn read_u32_region(&mut self, start: Start, region: &'static str, count: u64) -> DeserializationResult<Vec<u32>> {
        self.seek_to(start, region)?;
        trace!("Reading {} ({} x u32) from {:?}", region, count, start);
        self.stream.try_read_counted_u32_array(region, count)
    }

    fn read_single<R: WedRecord>(&mut self, offset: u32, region: &'static str) -> DeserializationResult<R> {
        self.seek_to(Start::At(offset), region)?;
        self.stream.ensure_available(region, 1, R::SIZE)?;
        R::from_stream(&mut *self.stream, region)
    }

    pub fn decode(mut self) -> DeserializationResult<Wed> {
        // Always decode from the start, wherever the caller left the cursor.
        let header: WedHeader = self.read_single(0, "wed header")?;
        debug!("WED Header: {:#?}", header);

        let overlays: Vec<Overlay> = self.read_region(
            Start::At(header.offset_overlays),
            "overlays",
            u64::from(header.num_overlays),
        )?;

        let doors: Vec<Door> = self.read_region(
            Start::At(header.offset_doors),
            "doors",
            u64::from(header.num_doors),
        )?;

        // Tilemaps have no offset of their own: they must immediately follow the doors.
        let tilemaps: Vec<Tilemap> =
            self.read_region(Start::Cursor, "tilemaps", tilemap_count(&overlays))?;

        let secondary_header: SecondaryHeader =
            self.read_single(header.offset_secondary_header, "secondary header")?;
        debug!("WED Secondary header: {:#?}", secondary_header);

        let polygons: Vec<Polygon> = self.read_region(
            Start::At(secondary_header.offset_polygons),
            "polygons",
            u64::from(secondary_header.num_polygons),
        )?;

        let vertices: Vec<Vertex> = self.read_region(
            Start::At(secondary_header.offset_vertices),
            "vertices",
            vertex_count(&polygons),
        )?;

        let door_tile_cells = self.read_u32_region(
            Start::At(header.offset_door_tiles),
            "door tile cells",
            door_tile_cell_count(&doors),
        )?;

        // Same adjacency assumption: the lookup table follows the door tile cells.
        let tile_index_lookup =
            self.read_u16_region(Start::Cursor, "tile index lookup", tile_index_count(&tilemaps))?;

        if overlays.is_empty() {
            warn!("WED has no overlays, assuming it has no wallgroups");
        } else if overlays[1..]
            .iter()
            .any(|o| (o.width, o.height) != (overlays[0].width, overlays[0].height))
        {
            warn!("WED overlays differ in size, wallgroup count is derived from the first overlay only");
        }

        let wallgroups: Vec<Wallgroup> = self.read_region(
            Start::At(secondary_header.offset_wallgroups),
            "wallgroups",
            wallgroup_count(&overlays),
        )?;

        let polygon_index_lookup = self.read_u16_region(
            Start::At(secondary_header.offset_polygon_lookup),
            "polygon index lookup",
            polygon_index_count(&wallgroups),
        )?;

        debug!(
            "Decoded WED: {} overlays, {} doors, {} tilemaps, {} polygons, {} vertices, {} wallgroups",
            overlays.len(),
            doors.len(),
            tilemaps.len(),
            polygons.len(),
            vertices.len(),
            wallgroups.len()
        );

        Ok(Wed {
            header,
            secondary_header,
            overlays,
            doors,
            tilemaps,
            door_tile_cells,
            tile_index_lookup,
            wallgroups,
            polygons,
            polygon_index_lookup,
            vertices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensure_env_logger_initialized;
    use crate::err::DeserializationError;
    use std::io::Cursor;

    /// Header followed directly by the secondary header, every count zero.
    fn empty_wed(offset_secondary_header: u32) -> Vec<u8> {
        let mut bytes = b"WED V1.3".to_vec();
        for value in [0_u32, 0, 0x20, offset_secondary_header, 0x20, 0x20] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        for value in [0_u32, 0x34, 0x34, 0x34, 0x34] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_decodes_wed_without_overlays() {
        ensure_env_logger_initialized();
        let bytes = empty_wed(0x20);
        let mut reader = Cursor::new(bytes);

        let wed = WedDecoder::new(&mut reader).decode().unwrap();
        assert!(wed.overlays.is_empty());
        assert!(wed.tilemaps.is_empty());
        assert!(wed.wallgroups.is_empty());
        assert_eq!(wed.secondary_header.offset_polygons, 0x34);
    }

    #[test]
    fn test_secondary_header_past_the_end() {
        ensure_env_logger_initialized();
        let bytes = empty_wed(0x1000);
        let mut reader = Cursor::new(bytes);

        match WedDecoder::new(&mut reader).decode().unwrap_err() {
            DeserializationError::Truncated {
                region,
                offset,
                need,
                have,
            } => {
                assert_eq!(region, "secondary header");
                assert_eq!(offset, 0x1000);
                assert_eq!(need, 0x14);
                assert_eq!(have, 0);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }
}
