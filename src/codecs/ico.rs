// src/codecs/ico.rs
//
// Single-frame legacy icon container, assembled byte by byte.
//
// Layout (all multi-byte fields little-endian):
//
//   offset  size   segment
//   0       6      IconFileHeader
//   6       16     IconDirEntry
//   22      40     BitmapInfoHeader
//   62      16384  pixel block: 64x64 BGRA, bottom row first
//   ------
//           16446

use crate::engine::RasterSurface;

/// Edge length of the only frame this container supports.
pub const ICON_SIZE: u32 = 64;
pub const ICON_BITS_PER_PIXEL: u16 = 32;

pub const FILE_HEADER_LEN: usize = 6;
pub const DIR_ENTRY_LEN: usize = 16;
pub const BITMAP_INFO_HEADER_LEN: usize = 40;
pub const PIXEL_BLOCK_LEN: usize = (ICON_SIZE * ICON_SIZE * 4) as usize;

/// Offset of the bitmap section from the start of the file.
pub const BITMAP_OFFSET: u32 = (FILE_HEADER_LEN + DIR_ENTRY_LEN) as u32;
/// Bitmap info header plus pixel block.
pub const BITMAP_DATA_LEN: u32 = (BITMAP_INFO_HEADER_LEN + PIXEL_BLOCK_LEN) as u32;
pub const ICON_FILE_LEN: usize =
    FILE_HEADER_LEN + DIR_ENTRY_LEN + BITMAP_INFO_HEADER_LEN + PIXEL_BLOCK_LEN;

pub const ICON_MEDIA_TYPE: &str = "image/x-icon";

const RESOURCE_TYPE_ICON: u16 = 1;

/// ICONDIR: reserved, resource type, image count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IconFileHeader {
    pub reserved: u16,
    pub resource_type: u16,
    pub image_count: u16,
}

impl IconFileHeader {
    pub fn single_icon() -> Self {
        Self {
            reserved: 0,
            resource_type: RESOURCE_TYPE_ICON,
            image_count: 1,
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.reserved.to_le_bytes());
        out.extend_from_slice(&self.resource_type.to_le_bytes());
        out.extend_from_slice(&self.image_count.to_le_bytes());
    }
}

/// ICONDIRENTRY for the one 64x64 frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IconDirEntry {
    pub width: u8,
    pub height: u8,
    pub color_count: u8,
    pub reserved: u8,
    pub color_planes: u16,
    pub bits_per_pixel: u16,
    pub data_size: u32,
    pub data_offset: u32,
}

impl IconDirEntry {
    pub fn for_frame() -> Self {
        Self {
            width: ICON_SIZE as u8,
            height: ICON_SIZE as u8,
            color_count: 0,
            reserved: 0,
            color_planes: 1,
            bits_per_pixel: ICON_BITS_PER_PIXEL,
            data_size: BITMAP_DATA_LEN,
            data_offset: BITMAP_OFFSET,
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.width);
        out.push(self.height);
        out.push(self.color_count);
        out.push(self.reserved);
        out.extend_from_slice(&self.color_planes.to_le_bytes());
        out.extend_from_slice(&self.bits_per_pixel.to_le_bytes());
        out.extend_from_slice(&self.data_size.to_le_bytes());
        out.extend_from_slice(&self.data_offset.to_le_bytes());
    }

    /// Read the entry back out of a built icon file.
    pub fn read_from(file: &[u8]) -> Option<Self> {
        let entry = file.get(FILE_HEADER_LEN..FILE_HEADER_LEN + DIR_ENTRY_LEN)?;
        Some(Self {
            width: entry[0],
            height: entry[1],
            color_count: entry[2],
            reserved: entry[3],
            color_planes: u16::from_le_bytes([entry[4], entry[5]]),
            bits_per_pixel: u16::from_le_bytes([entry[6], entry[7]]),
            data_size: u32::from_le_bytes([entry[8], entry[9], entry[10], entry[11]]),
            data_offset: u32::from_le_bytes([entry[12], entry[13], entry[14], entry[15]]),
        })
    }
}

/// BITMAPINFOHEADER. `height` is twice the pixel height: the format counts the
/// colour plane and the (omitted) AND mask plane together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitmapInfoHeader {
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pixels_per_meter: i32,
    pub y_pixels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

impl BitmapInfoHeader {
    pub fn for_frame() -> Self {
        Self {
            header_size: BITMAP_INFO_HEADER_LEN as u32,
            width: ICON_SIZE as i32,
            height: (ICON_SIZE * 2) as i32,
            planes: 1,
            bits_per_pixel: ICON_BITS_PER_PIXEL,
            // BI_RGB; image_size may be zero for uncompressed bitmaps
            compression: 0,
            image_size: 0,
            x_pixels_per_meter: 0,
            y_pixels_per_meter: 0,
            colors_used: 0,
            colors_important: 0,
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.header_size.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.planes.to_le_bytes());
        out.extend_from_slice(&self.bits_per_pixel.to_le_bytes());
        out.extend_from_slice(&self.compression.to_le_bytes());
        out.extend_from_slice(&self.image_size.to_le_bytes());
        out.extend_from_slice(&self.x_pixels_per_meter.to_le_bytes());
        out.extend_from_slice(&self.y_pixels_per_meter.to_le_bytes());
        out.extend_from_slice(&self.colors_used.to_le_bytes());
        out.extend_from_slice(&self.colors_important.to_le_bytes());
    }
}

/// Append the pixel block: rows bottom-up, each pixel RGBA -> BGRA.
///
/// Source row `y` lands at destination row `size - 1 - y`, same column.
fn write_pixel_block(pixels: &[u8], size: usize, out: &mut Vec<u8>) {
    let stride = size * 4;
    for row in pixels.chunks_exact(stride).rev() {
        for px in row.chunks_exact(4) {
            out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
    }
}

/// Build a complete icon file from a 64x64 surface.
///
/// # Panics
/// If the surface is not 64x64. The orchestrator always rasterizes icon
/// requests at that size, so a mismatch is a caller bug.
pub fn build_icon(surface: &RasterSurface) -> Vec<u8> {
    assert!(
        surface.width() == ICON_SIZE && surface.height() == ICON_SIZE,
        "icon surface must be {ICON_SIZE}x{ICON_SIZE}, got {}x{}",
        surface.width(),
        surface.height()
    );

    let mut out = Vec::with_capacity(ICON_FILE_LEN);
    IconFileHeader::single_icon().write_to(&mut out);
    IconDirEntry::for_frame().write_to(&mut out);
    BitmapInfoHeader::for_frame().write_to(&mut out);
    write_pixel_block(surface.pixels(), ICON_SIZE as usize, &mut out);

    debug_assert_eq!(out.len(), ICON_FILE_LEN);
    out
}
