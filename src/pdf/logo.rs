use std::path::{Path, PathBuf};

use image::{ColorType, ImageFormat};
use pdf_writer::{Filter, Pdf, Ref};

use crate::error::Error;

enum LogoData {
    /// JPEG bytes passed through untouched.
    Dct { data: Vec<u8>, gray: bool },
    /// Zlib-compressed RGB samples with an optional compressed alpha mask.
    Flate { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// The letterhead logo, decoded once when the canvas is built.
pub(crate) struct Logo {
    pub(crate) path: PathBuf,
    pub(crate) pixel_width: u32,
    pub(crate) pixel_height: u32,
    data: LogoData,
}

pub(crate) fn load_logo(path: &Path) -> Result<Logo, Error> {
    let bytes = std::fs::read(path).map_err(|source| Error::Asset {
        path: path.to_path_buf(),
        source,
    })?;
    let decode_err = |reason: String| Error::AssetDecode {
        path: path.to_path_buf(),
        reason,
    };

    let format = image::guess_format(&bytes).map_err(|e| decode_err(e.to_string()))?;
    let decoded =
        image::load_from_memory_with_format(&bytes, format).map_err(|e| decode_err(e.to_string()))?;
    let (w, h) = (decoded.width(), decoded.height());
    if w == 0 || h == 0 {
        return Err(decode_err("image has no pixels".to_string()));
    }

    let data = match (format, decoded.color()) {
        (ImageFormat::Jpeg, ColorType::Rgb8) => LogoData::Dct { data: bytes, gray: false },
        (ImageFormat::Jpeg, ColorType::L8) => LogoData::Dct { data: bytes, gray: true },
        _ => {
            let rgba = decoded.to_rgba8();
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
            let rgb_data: Vec<u8> = rgba
                .pixels()
                .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                .collect();
            let alpha = has_alpha.then(|| {
                let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6)
            });
            LogoData::Flate {
                rgb: miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6),
                alpha,
            }
        }
    };

    log::debug!("logo: {} {format:?} {w}x{h}px", path.display());
    Ok(Logo {
        path: path.to_path_buf(),
        pixel_width: w,
        pixel_height: h,
        data,
    })
}

impl Logo {
    /// Display height keeping the pixel aspect ratio.
    pub(crate) fn height_for_width(&self, width: f32) -> f32 {
        width * self.pixel_height as f32 / self.pixel_width as f32
    }

    /// Write the image XObject (and soft mask, if any) and return its ref.
    pub(crate) fn embed(&self, pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref) -> Ref {
        let xobj_ref = alloc();
        let (w, h) = (self.pixel_width as i32, self.pixel_height as i32);
        match &self.data {
            LogoData::Dct { data, gray } => {
                let mut xobj = pdf.image_xobject(xobj_ref, data);
                xobj.filter(Filter::DctDecode);
                xobj.width(w);
                xobj.height(h);
                if *gray {
                    xobj.color_space().device_gray();
                } else {
                    xobj.color_space().device_rgb();
                }
                xobj.bits_per_component(8);
            }
            LogoData::Flate { rgb, alpha } => {
                let smask_ref = alpha.as_ref().map(|alpha| {
                    let mask_ref = alloc();
                    let mut mask = pdf.image_xobject(mask_ref, alpha);
                    mask.filter(Filter::FlateDecode);
                    mask.width(w);
                    mask.height(h);
                    mask.color_space().device_gray();
                    mask.bits_per_component(8);
                    mask_ref
                });
                let mut xobj = pdf.image_xobject(xobj_ref, rgb);
                xobj.filter(Filter::FlateDecode);
                xobj.width(w);
                xobj.height(h);
                xobj.color_space().device_rgb();
                xobj.bits_per_component(8);
                if let Some(mask_ref) = smask_ref {
                    xobj.s_mask(mask_ref);
                }
            }
        }
        xobj_ref
    }
}
