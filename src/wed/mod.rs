//! WED - area tile map and wall geometry.
//!
//! A WED file has no length prefixes for most of its arrays. The size of each
//! region is derived from records parsed earlier (see [`decoder`]), and the
//! helpers below compute those derived counts.

mod decoder;
mod structs;

use std::io::Write;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::err::{DeserializationResult, SerializationResult};
use crate::format::{Magic, Resource};
use crate::settings::ParserSettings;
use crate::utils::ReadSeek;

pub use self::structs::{
    Door, Overlay, Polygon, PolygonFlags, SecondaryHeader, Tilemap, Vertex, Wallgroup, WedHeader,
    WedRecord,
};

pub const FORMAT_NAME: &str = "WED";
pub const WED_MAGIC: Magic = Magic::new(b"WED V1.3");

/// A fully decoded WED resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Wed {
    pub header: WedHeader,
    #[serde(rename = "AltHeader")]
    pub secondary_header: SecondaryHeader,
    pub overlays: Vec<Overlay>,
    pub doors: Vec<Door>,
    pub tilemaps: Vec<Tilemap>,
    pub door_tile_cells: Vec<u32>,
    pub tile_index_lookup: Vec<u16>,
    pub wallgroups: Vec<Wallgroup>,
    pub polygons: Vec<Polygon>,
    pub polygon_index_lookup: Vec<u16>,
    #[serde(rename = "Verts")]
    pub vertices: Vec<Vertex>,
}

/// Σ width × height over all overlays.
pub fn tilemap_count(overlays: &[Overlay]) -> u64 {
    overlays.iter().map(Overlay::cell_count).sum()
}

pub fn vertex_count(polygons: &[Polygon]) -> u64 {
    polygons.iter().map(|p| u64::from(p.num_vertex)).sum()
}

pub fn door_tile_cell_count(doors: &[Door]) -> u64 {
    doors.iter().map(|d| u64::from(d.num_door_tile_cells)).sum()
}

pub fn tile_index_count(tilemaps: &[Tilemap]) -> u64 {
    tilemaps.iter().map(|t| u64::from(t.num_tiles)).sum()
}

pub fn polygon_index_count(wallgroups: &[Wallgroup]) -> u64 {
    wallgroups.iter().map(|w| u64::from(w.num_polygons)).sum()
}

/// Number of wallgroups, derived from the first overlay only:
/// `floor(width / 10) + floor(height / 7.5)`.
///
/// `floor(height / 7.5)` is computed as `(2 * height) / 15`, which is exact for
/// every `u16` height. No overlays means no wallgroups.
pub fn wallgroup_count(overlays: &[Overlay]) -> u64 {
    match overlays.first() {
        Some(first) => {
            let width = u64::from(first.width);
            let height = u64::from(first.height);
            width / 10 + (2 * height) / 15
        }
        None => 0,
    }
}

fn span<T>(items: &[T], start: u64, len: u64) -> Option<&[T]> {
    let start = usize::try_from(start).ok()?;
    let len = usize::try_from(len).ok()?;
    items.get(start..start.checked_add(len)?)
}

impl Wed {
    /// Decodes a WED from the beginning of `stream`, wherever its cursor currently is.
    pub fn from_stream<T: ReadSeek>(stream: &mut T) -> DeserializationResult<Wed> {
        decoder::WedDecoder::new(stream).decode()
    }

    /// Tilemap cells belonging to the overlay at `index`.
    ///
    /// Cells are stored overlay after overlay, `width * height` each.
    pub fn overlay_tilemaps(&self, index: usize) -> Option<&[Tilemap]> {
        let overlay = self.overlays.get(index)?;
        let start = tilemap_count(&self.overlays[..index]);
        span(&self.tilemaps, start, overlay.cell_count())
    }

    pub fn polygon_vertices(&self, polygon: &Polygon) -> Option<&[Vertex]> {
        span(
            &self.vertices,
            u64::from(polygon.index_vertex),
            u64::from(polygon.num_vertex),
        )
    }

    pub fn door_tile_cells_of(&self, door: &Door) -> Option<&[u32]> {
        span(
            &self.door_tile_cells,
            u64::from(door.index_tile_cell),
            u64::from(door.num_door_tile_cells),
        )
    }

    pub fn tile_indices_of(&self, tilemap: &Tilemap) -> Option<&[u16]> {
        span(
            &self.tile_index_lookup,
            u64::from(tilemap.index_tile),
            u64::from(tilemap.num_tiles),
        )
    }

    pub fn wallgroup_polygon_indices(&self, wallgroup: &Wallgroup) -> Option<&[u16]> {
        span(
            &self.polygon_index_lookup,
            u64::from(wallgroup.index_polygon),
            u64::from(wallgroup.num_polygons),
        )
    }
}

impl Resource for Wed {
    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn to_json_value(&self) -> SerializationResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn write_json(&self, writer: &mut dyn Write, settings: &ParserSettings) -> SerializationResult<()> {
        if settings.should_indent() {
            let formatter = PrettyFormatter::with_indent(b"\t");
            let mut serializer = serde_json::Serializer::with_formatter(&mut *writer, formatter);
            self.serialize(&mut serializer)?;
        } else {
            serde_json::to_writer(&mut *writer, self)?;
        }
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Registry entry point for the WED format.
pub fn decode_wed(mut stream: &mut dyn ReadSeek) -> DeserializationResult<Box<dyn Resource>> {
    Ok(Box::new(Wed::from_stream(&mut stream)?))
}
