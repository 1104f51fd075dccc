//! Fixed-layout WED records.
//!
//! Every record is read field by field, little-endian, with no padding other
//! than what the format itself declares.
//!
//! ```text
//! WedHeader        (0x20 bytes)
//! [0x00] Signature "WED "          [0x04] Version "V1.3"
//! [0x08] NumOverlays       (u32)   [0x0C] NumDoors            (u32)
//! [0x10] OffsetOverlays    (u32)   [0x14] OffsetSecondaryHeader (u32)
//! [0x18] OffsetDoors       (u32)   [0x1C] OffsetDoorTiles     (u32)
//!
//! Overlay          (0x18 bytes)    Door             (0x16 bytes)
//! Tilemap          (0x0A bytes)    SecondaryHeader  (0x14 bytes)
//! Polygon          (0x12 bytes)    Vertex, Wallgroup (0x04 bytes)
//! ```

use bitflags::bitflags;
use serde::{Serialize, Serializer};

use crate::err::DeserializationResult;
use crate::resref::ResRef;
use crate::utils::{ReadExt, ReadSeek};

/// A record with a fixed on-disk size.
pub trait WedRecord: Sized {
    const SIZE: u64;

    fn from_stream<T: ReadSeek>(stream: &mut T, region: &'static str) -> DeserializationResult<Self>;
}

fn serialize_lossy_bytes<S: Serializer, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WedHeader {
    #[serde(serialize_with = "serialize_lossy_bytes")]
    pub signature: [u8; 4],
    #[serde(serialize_with = "serialize_lossy_bytes")]
    pub version: [u8; 4],
    pub num_overlays: u32,
    pub num_doors: u32,
    pub offset_overlays: u32,
    pub offset_secondary_header: u32,
    pub offset_doors: u32,
    pub offset_door_tiles: u32,
}

impl WedRecord for WedHeader {
    const SIZE: u64 = 0x20;

    fn from_stream<T: ReadSeek>(stream: &mut T, region: &'static str) -> DeserializationResult<WedHeader> {
        Ok(WedHeader {
            signature: stream.try_bytes_named::<4>(region)?,
            version: stream.try_bytes_named::<4>(region)?,
            num_overlays: stream.try_u32_named(region)?,
            num_doors: stream.try_u32_named(region)?,
            offset_overlays: stream.try_u32_named(region)?,
            offset_secondary_header: stream.try_u32_named(region)?,
            offset_doors: stream.try_u32_named(region)?,
            offset_door_tiles: stream.try_u32_named(region)?,
        })
    }
}

/// One tile layer of the area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Overlay {
    pub width: u16,
    pub height: u16,
    pub tileset: ResRef,
    pub unknown: u32,
    pub offset_tilemap: u32,
    pub offset_tile_index_lookup: u32,
}

impl Overlay {
    /// Number of tilemap cells this overlay owns.
    pub fn cell_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl WedRecord for Overlay {
    const SIZE: u64 = 0x18;

    fn from_stream<T: ReadSeek>(stream: &mut T, region: &'static str) -> DeserializationResult<Overlay> {
        Ok(Overlay {
            width: stream.try_u16_named(region)?,
            height: stream.try_u16_named(region)?,
            tileset: ResRef::from_stream(stream, region)?,
            unknown: stream.try_u32_named(region)?,
            offset_tilemap: stream.try_u32_named(region)?,
            offset_tile_index_lookup: stream.try_u32_named(region)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Door {
    pub name: ResRef,
    pub door_flags: u16,
    pub index_tile_cell: u16,
    pub num_door_tile_cells: u16,
    pub num_open_polys: u16,
    pub num_closed_polys: u16,
    pub offset_open_polys: u16,
    pub offset_closed_polys: u16,
}

impl Door {
    pub fn is_closed(&self) -> bool {
        self.door_flags & 1 != 0
    }
}

impl WedRecord for Door {
    const SIZE: u64 = 0x16;

    fn from_stream<T: ReadSeek>(stream: &mut T, region: &'static str) -> DeserializationResult<Door> {
        Ok(Door {
            name: ResRef::from_stream(stream, region)?,
            door_flags: stream.try_u16_named(region)?,
            index_tile_cell: stream.try_u16_named(region)?,
            num_door_tile_cells: stream.try_u16_named(region)?,
            num_open_polys: stream.try_u16_named(region)?,
            num_closed_polys: stream.try_u16_named(region)?,
            offset_open_polys: stream.try_u16_named(region)?,
            offset_closed_polys: stream.try_u16_named(region)?,
        })
    }
}

/// Per-cell tile selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tilemap {
    pub index_tile: u16,
    pub num_tiles: u16,
    pub index_alt_tile: u16,
    pub overlay_flags: u8,
    pub unknown: [u8; 3],
}

impl Tilemap {
    /// Whether overlay `index` is drawn over this cell (bit `index` of the overlay flags).
    pub fn draws_overlay(&self, index: usize) -> bool {
        index < 8 && self.overlay_flags & (1 << index) != 0
    }
}

impl WedRecord for Tilemap {
    const SIZE: u64 = 0x0A;

    fn from_stream<T: ReadSeek>(stream: &mut T, region: &'static str) -> DeserializationResult<Tilemap> {
        Ok(Tilemap {
            index_tile: stream.try_u16_named(region)?,
            num_tiles: stream.try_u16_named(region)?,
            index_alt_tile: stream.try_u16_named(region)?,
            overlay_flags: stream.try_u8_named(region)?,
            unknown: stream.try_bytes_named::<3>(region)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecondaryHeader {
    pub num_polygons: u32,
    pub offset_polygons: u32,
    pub offset_vertices: u32,
    pub offset_wallgroups: u32,
    pub offset_polygon_lookup: u32,
}

impl WedRecord for SecondaryHeader {
    const SIZE: u64 = 0x14;

    fn from_stream<T: ReadSeek>(stream: &mut T, region: &'static str) -> DeserializationResult<SecondaryHeader> {
        Ok(SecondaryHeader {
            num_polygons: stream.try_u32_named(region)?,
            offset_polygons: stream.try_u32_named(region)?,
            offset_vertices: stream.try_u32_named(region)?,
            offset_wallgroups: stream.try_u32_named(region)?,
            offset_polygon_lookup: stream.try_u32_named(region)?,
        })
    }
}

bitflags! {
    /// Interpretation of [`Polygon::mode`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PolygonFlags: u8 {
        const SHADE_WALL = 0x01;
        const HOVERING = 0x02;
        const COVER_ANIMATIONS = 0x04;
        const DOOR = 0x80;
    }
}

/// A wall or door outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Polygon {
    pub index_vertex: u32,
    pub num_vertex: u32,
    pub mode: u8,
    pub unknown: u8,
    pub bounding_min_x: u16,
    pub bounding_max_x: u16,
    pub bounding_min_y: u16,
    pub bounding_max_y: u16,
}

impl Polygon {
    /// Known mode bits; unknown bits are dropped.
    pub fn flags(&self) -> PolygonFlags {
        PolygonFlags::from_bits_truncate(self.mode)
    }
}

impl WedRecord for Polygon {
    const SIZE: u64 = 0x12;

    fn from_stream<T: ReadSeek>(stream: &mut T, region: &'static str) -> DeserializationResult<Polygon> {
        Ok(Polygon {
            index_vertex: stream.try_u32_named(region)?,
            num_vertex: stream.try_u32_named(region)?,
            mode: stream.try_u8_named(region)?,
            unknown: stream.try_u8_named(region)?,
            bounding_min_x: stream.try_u16_named(region)?,
            bounding_max_x: stream.try_u16_named(region)?,
            bounding_min_y: stream.try_u16_named(region)?,
            bounding_max_y: stream.try_u16_named(region)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vertex {
    pub x: u16,
    pub y: u16,
}

impl WedRecord for Vertex {
    const SIZE: u64 = 0x04;

    fn from_stream<T: ReadSeek>(stream: &mut T, region: &'static str) -> DeserializationResult<Vertex> {
        Ok(Vertex {
            x: stream.try_u16_named(region)?,
            y: stream.try_u16_named(region)?,
        })
    }
}

/// A spatial bucket of polygons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Wallgroup {
    pub index_polygon: u16,
    pub num_polygons: u16,
}

impl WedRecord for Wallgroup {
    const SIZE: u64 = 0x04;

    fn from_stream<T: ReadSeek>(stream: &mut T, region: &'static str) -> DeserializationResult<Wallgroup> {
        Ok(Wallgroup {
            index_polygon: stream.try_u16_named(region)?,
            num_polygons: stream.try_u16_named(region)?,
        })
    }
}
