#![allow(dead_code)]
use std::sync::Once;

static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}

/// Absolute offsets of every region in a built fixture.
#[derive(Debug, Clone, Default)]
pub struct RegionOffsets {
    pub overlays: u32,
    pub secondary_header: u32,
    pub doors: u32,
    pub tilemaps: u32,
    pub door_tile_cells: u32,
    pub tile_index_lookup: u32,
    pub polygons: u32,
    pub vertices: u32,
    pub wallgroups: u32,
    pub polygon_index_lookup: u32,
    pub end: u32,
}

pub struct WedFixture {
    pub bytes: Vec<u8>,
    pub offsets: RegionOffsets,
}

struct OverlaySpec {
    width: u16,
    height: u16,
    tileset: [u8; 8],
}

struct DoorSpec {
    name: [u8; 8],
    flags: u16,
    num_door_tile_cells: u16,
}

struct PolygonSpec {
    num_vertex: u32,
    mode: u8,
}

fn resref(name: &str) -> [u8; 8] {
    let mut raw = [0_u8; 8];
    let len = name.len().min(8);
    raw[..len].copy_from_slice(&name.as_bytes()[..len]);
    raw
}

/// Lays out a well-formed `WED V1.3` file.
///
/// Regions are laid out in the order the decoder reads them: header, overlays,
/// doors, tilemaps, secondary header, polygons, vertices, door tile cells, tile
/// index lookup, wallgroups, polygon index lookup. Truncating the file inside
/// any region therefore leaves every region read before it intact. Tilemaps
/// directly follow the doors and the tile index lookup directly follows the door
/// tile cells, as the format requires.
///
/// Generated content is deterministic: tilemap cell `i` has `tiles_per_cell`
/// tiles, lookups and cells count up from zero.
pub struct WedBuilder {
    signature: [u8; 8],
    overlays: Vec<OverlaySpec>,
    doors: Vec<DoorSpec>,
    polygons: Vec<PolygonSpec>,
    tiles_per_cell: u16,
    polygons_per_wallgroup: u16,
    padding_after_doors: u32,
}

impl Default for WedBuilder {
    fn default() -> Self {
        WedBuilder {
            signature: *b"WED V1.3",
            overlays: vec![],
            doors: vec![],
            polygons: vec![],
            tiles_per_cell: 1,
            polygons_per_wallgroup: 1,
            padding_after_doors: 0,
        }
    }
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

impl WedBuilder {
    pub fn new() -> Self {
        WedBuilder::default()
    }

    pub fn signature(mut self, signature: &[u8; 8]) -> Self {
        self.signature = *signature;
        self
    }

    pub fn overlay(mut self, width: u16, height: u16, tileset: &str) -> Self {
        self.overlays.push(OverlaySpec {
            width,
            height,
            tileset: resref(tileset),
        });
        self
    }

    pub fn door(mut self, name: &str, flags: u16, num_door_tile_cells: u16) -> Self {
        self.doors.push(DoorSpec {
            name: resref(name),
            flags,
            num_door_tile_cells,
        });
        self
    }

    pub fn polygon(mut self, num_vertex: u32, mode: u8) -> Self {
        self.polygons.push(PolygonSpec { num_vertex, mode });
        self
    }

    pub fn tiles_per_cell(mut self, n: u16) -> Self {
        self.tiles_per_cell = n;
        self
    }

    pub fn polygons_per_wallgroup(mut self, n: u16) -> Self {
        self.polygons_per_wallgroup = n;
        self
    }

    /// Inserts zero bytes between the doors and the tilemaps, breaking the
    /// adjacency the decoder relies on.
    pub fn padding_after_doors(mut self, n: u32) -> Self {
        self.padding_after_doors = n;
        self
    }

    pub fn tilemap_count(&self) -> u32 {
        self.overlays
            .iter()
            .map(|o| u32::from(o.width) * u32::from(o.height))
            .sum()
    }

    pub fn wallgroup_count(&self) -> u32 {
        self.overlays
            .first()
            .map(|o| u32::from(o.width) / 10 + (2 * u32::from(o.height)) / 15)
            .unwrap_or(0)
    }

    pub fn build(&self) -> WedFixture {
        let tilemap_count = self.tilemap_count();
        let door_tile_cell_count: u32 = self
            .doors
            .iter()
            .map(|d| u32::from(d.num_door_tile_cells))
            .sum();
        let tile_index_count = tilemap_count * u32::from(self.tiles_per_cell);
        let vertex_count: u32 = self.polygons.iter().map(|p| p.num_vertex).sum();
        let wallgroup_count = self.wallgroup_count();
        let polygon_index_count = wallgroup_count * u32::from(self.polygons_per_wallgroup);

        let mut o = RegionOffsets::default();
        o.overlays = 0x20;
        o.doors = o.overlays + 24 * self.overlays.len() as u32;
        o.tilemaps = o.doors + 22 * self.doors.len() as u32 + self.padding_after_doors;
        o.secondary_header = o.tilemaps + 10 * tilemap_count;
        o.polygons = o.secondary_header + 20;
        o.vertices = o.polygons + 18 * self.polygons.len() as u32;
        o.door_tile_cells = o.vertices + 4 * vertex_count;
        o.tile_index_lookup = o.door_tile_cells + 4 * door_tile_cell_count;
        o.wallgroups = o.tile_index_lookup + 2 * tile_index_count;
        o.polygon_index_lookup = o.wallgroups + 4 * wallgroup_count;
        o.end = o.polygon_index_lookup + 2 * polygon_index_count;

        let mut out = Vec::with_capacity(o.end as usize);

        // Header
        out.extend_from_slice(&self.signature);
        push_u32(&mut out, self.overlays.len() as u32);
        push_u32(&mut out, self.doors.len() as u32);
        push_u32(&mut out, o.overlays);
        push_u32(&mut out, o.secondary_header);
        push_u32(&mut out, o.doors);
        push_u32(&mut out, o.door_tile_cells);

        let mut tilemap_base = 0;
        for overlay in &self.overlays {
            push_u16(&mut out, overlay.width);
            push_u16(&mut out, overlay.height);
            out.extend_from_slice(&overlay.tileset);
            push_u32(&mut out, 0);
            push_u32(&mut out, o.tilemaps + 10 * tilemap_base);
            push_u32(&mut out, o.tile_index_lookup);
            tilemap_base += u32::from(overlay.width) * u32::from(overlay.height);
        }

        assert_eq!(out.len() as u32, o.doors);
        let mut door_cell_base = 0_u16;
        for (i, door) in self.doors.iter().enumerate() {
            out.extend_from_slice(&door.name);
            push_u16(&mut out, door.flags);
            push_u16(&mut out, door_cell_base);
            push_u16(&mut out, door.num_door_tile_cells);
            push_u16(&mut out, 1);
            push_u16(&mut out, 1);
            push_u16(&mut out, (2 * i) as u16);
            push_u16(&mut out, (2 * i + 1) as u16);
            door_cell_base += door.num_door_tile_cells;
        }
        out.extend(std::iter::repeat(0x00).take(self.padding_after_doors as usize));

        assert_eq!(out.len() as u32, o.tilemaps);
        for i in 0..tilemap_count {
            push_u16(&mut out, (i * u32::from(self.tiles_per_cell)) as u16);
            push_u16(&mut out, self.tiles_per_cell);
            push_u16(&mut out, 0xFFFF);
            out.push(0x01);
            out.extend_from_slice(&[0, 0, 0]);
        }

        assert_eq!(out.len() as u32, o.secondary_header);
        push_u32(&mut out, self.polygons.len() as u32);
        push_u32(&mut out, o.polygons);
        push_u32(&mut out, o.vertices);
        push_u32(&mut out, o.wallgroups);
        push_u32(&mut out, o.polygon_index_lookup);

        assert_eq!(out.len() as u32, o.polygons);
        let mut vertex_base = 0_u32;
        for (i, polygon) in self.polygons.iter().enumerate() {
            push_u32(&mut out, vertex_base);
            push_u32(&mut out, polygon.num_vertex);
            out.push(polygon.mode);
            out.push(0);
            push_u16(&mut out, i as u16);
            push_u16(&mut out, i as u16 + 10);
            push_u16(&mut out, i as u16);
            push_u16(&mut out, i as u16 + 20);
            vertex_base += polygon.num_vertex;
        }

        assert_eq!(out.len() as u32, o.vertices);
        for i in 0..vertex_count {
            push_u16(&mut out, (i * 2) as u16);
            push_u16(&mut out, (i * 3) as u16);
        }

        assert_eq!(out.len() as u32, o.door_tile_cells);
        for i in 0..door_tile_cell_count {
            push_u32(&mut out, 100 + i);
        }

        assert_eq!(out.len() as u32, o.tile_index_lookup);
        for i in 0..tile_index_count {
            push_u16(&mut out, i as u16);
        }

        assert_eq!(out.len() as u32, o.wallgroups);
        for i in 0..wallgroup_count {
            push_u16(&mut out, (i * u32::from(self.polygons_per_wallgroup)) as u16);
            push_u16(&mut out, self.polygons_per_wallgroup);
        }

        assert_eq!(out.len() as u32, o.polygon_index_lookup);
        for i in 0..polygon_index_count {
            push_u16(&mut out, i as u16);
        }

        assert_eq!(out.len() as u32, o.end);
        WedFixture {
            bytes: out,
            offsets: o,
        }
    }
}

/// A typical single-overlay area with two doors and a few wall polygons.
pub fn sample_wed() -> WedFixture {
    WedBuilder::new()
        .overlay(20, 15, "AR0100")
        .door("DOOR01", 1, 3)
        .door("DOOR02", 0, 2)
        .polygon(4, 0x01)
        .polygon(3, 0x81)
        .polygon(5, 0x00)
        .tiles_per_cell(2)
        .polygons_per_wallgroup(2)
        .build()
}
