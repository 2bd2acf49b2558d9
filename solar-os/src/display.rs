// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
use super::os_errors;
use super::{Error, OsResult};

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A decoded image ready to be presented
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,

    /// Tightly packed RGB8 pixels, row by row
    rgb: Vec<u8>,
}

impl Frame {
    /// Create a frame from packed RGB8 pixels
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> OsResult<Self> {
        // u32::MAX squared times three still fits
        let needed = u128::from(width) * u128::from(height) * 3;
        if rgb.len() as u128 != needed {
            return Err(Error::new(
                os_errors::IMAGE_LOAD_FAILURE,
                format!("{}x{} frame needs {} bytes, got {}", width, height, needed, rgb.len()),
            ));
        }
        Ok(Self { width, height, rgb })
    }

    /// Load and decode an image file
    pub fn load(path: &Path) -> OsResult<Self> {
        let image = image::open(path).map_err(|e| {
            Error::new(
                os_errors::IMAGE_LOAD_FAILURE,
                format!("Cannot load image `{}`: {}", path.display(), e),
            )
        })?;

        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self {
            width,
            height,
            rgb: rgb.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the RGB value of a pixel
    #[inline(always)]
    fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let at = (y as usize * self.width as usize + x as usize) * 3;
        [self.rgb[at], self.rgb[at + 1], self.rgb[at + 2]]
    }
}

/// A display surface that can show one image at a time.
pub trait Surface: Send {
    /// Load the image content of a file into a frame
    fn load(&mut self, path: &Path) -> OsResult<Frame> {
        Frame::load(path)
    }

    /// Make the frame the visible content of the surface
    fn present(&mut self, frame: &Frame) -> OsResult<()>;
}

/// Memory layout of a framebuffer device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramebufferGeometry {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,

    /// Bytes per line, at least `width * bits_per_pixel / 8`
    pub stride: u32,
}

impl FramebufferGeometry {
    /// Create a geometry with the line length derived from width and depth
    pub fn packed(width: u32, height: u32, bits_per_pixel: u32) -> OsResult<Self> {
        Self::check_depth(bits_per_pixel)?;
        Ok(Self {
            width,
            height,
            bits_per_pixel,
            stride: width * bits_per_pixel / 8,
        })
    }

    /// Parse the sysfs attributes `virtual_size` (`"800,480"`), `bits_per_pixel` and `stride`
    pub fn parse(virtual_size: &str, bits_per_pixel: &str, stride: &str) -> OsResult<Self> {
        let invalid = |what: &str| {
            Error::new(
                os_errors::DISPLAY_OPEN_FAILURE,
                format!("Invalid framebuffer {what}"),
            )
        };

        let (width, height) = virtual_size
            .trim()
            .split_once(',')
            .ok_or_else(|| invalid("size"))?;
        let width: u32 = width.parse().map_err(|_| invalid("width"))?;
        let height: u32 = height.parse().map_err(|_| invalid("height"))?;
        let bits_per_pixel: u32 = bits_per_pixel
            .trim()
            .parse()
            .map_err(|_| invalid("depth"))?;
        let stride: u32 = stride.trim().parse().map_err(|_| invalid("stride"))?;

        Self::check_depth(bits_per_pixel)?;
        if stride < width * bits_per_pixel / 8 {
            return Err(invalid("stride"));
        }

        Ok(Self {
            width,
            height,
            bits_per_pixel,
            stride,
        })
    }

    fn check_depth(bits_per_pixel: u32) -> OsResult<()> {
        match bits_per_pixel {
            16 | 24 | 32 => Ok(()),
            _ => Err(Error::new(
                os_errors::DISPLAY_UNSUPPORTED_FORMAT,
                format!("{bits_per_pixel} bits per pixel are not supported"),
            )),
        }
    }

    /// Total size of the visible buffer in bytes
    pub fn buffer_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }
}

/// A surface drawing into a Linux framebuffer device such as `/dev/fb0`.
///
/// Each presented frame clears the screen to black and draws the image at the
/// top-left corner, clipped to the screen.
pub struct FramebufferSurface {
    path: PathBuf,
    device: File,
    geometry: FramebufferGeometry,
    buffer: Vec<u8>,
}

impl FramebufferSurface {
    /// Open a framebuffer device and probe its geometry from sysfs
    pub fn open(path: &Path) -> OsResult<Self> {
        let name = path.file_name().ok_or_else(|| {
            Error::new(
                os_errors::DISPLAY_OPEN_FAILURE,
                format!("`{}` is not a framebuffer device", path.display()),
            )
        })?;
        let sysfs = Path::new("/sys/class/graphics").join(name);

        let read = |attr: &str| {
            fs::read_to_string(sysfs.join(attr)).map_err(|e| {
                Error::new(
                    os_errors::DISPLAY_OPEN_FAILURE,
                    format!("Cannot probe `{}`: {}", sysfs.join(attr).display(), e),
                )
            })
        };

        let geometry =
            FramebufferGeometry::parse(&read("virtual_size")?, &read("bits_per_pixel")?, &read("stride")?)?;
        Self::with_geometry(path, geometry)
    }

    /// Open a framebuffer file with a known geometry
    pub fn with_geometry(path: &Path, geometry: FramebufferGeometry) -> OsResult<Self> {
        let device = OpenOptions::new().write(true).open(path).map_err(|e| {
            Error::new(
                os_errors::DISPLAY_OPEN_FAILURE,
                format!("Cannot open framebuffer `{}`: {}", path.display(), e),
            )
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            device,
            geometry,
            buffer: vec![0; geometry.buffer_len()],
        })
    }

    pub fn geometry(&self) -> FramebufferGeometry {
        self.geometry
    }

    /// Render a frame into the internal buffer in device pixel format
    fn compose(&mut self, frame: &Frame) {
        let geometry = self.geometry;
        let bytes = geometry.bits_per_pixel as usize / 8;

        // black
        self.buffer.fill(0);

        let width = frame.width().min(geometry.width);
        let height = frame.height().min(geometry.height);

        for y in 0..height {
            let line = y as usize * geometry.stride as usize;
            for x in 0..width {
                let [r, g, b] = frame.pixel(x, y);
                let at = line + x as usize * bytes;
                let out = &mut self.buffer[at..at + bytes];
                match bytes {
                    2 => {
                        let rgb565 = ((r as u16 & 0xf8) << 8) | ((g as u16 & 0xfc) << 3) | (b as u16 >> 3);
                        out.copy_from_slice(&rgb565.to_le_bytes());
                    }
                    3 => out.copy_from_slice(&[b, g, r]),
                    _ => out.copy_from_slice(&[b, g, r, 0xff]),
                }
            }
        }
    }
}

impl Surface for FramebufferSurface {
    fn present(&mut self, frame: &Frame) -> OsResult<()> {
        self.compose(frame);

        self.device
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.device.write_all(&self.buffer))
            .and_then(|_| self.device.flush())
            .map_err(|e| {
                Error::new(
                    os_errors::DISPLAY_WRITE_FAILURE,
                    format!("Cannot write to `{}`: {}", self.path.display(), e),
                )
            })
    }
}
