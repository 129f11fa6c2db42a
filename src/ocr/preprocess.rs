use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

use crate::vision::Region;

/// Binarizes a grayscale image with a global threshold.
///
/// Pixels strictly brighter than `threshold` become white (text), everything
/// else black. A threshold of 255 therefore blanks the image, which is why
/// retry increments stop before reaching it.
pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel[0] > threshold { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Crops a region of the frame and converts it to grayscale.
///
/// The region is clamped to the frame; the full-frame sentinel crops nothing.
pub fn crop_gray(frame: &RgbaImage, region: Region) -> GrayImage {
    let (w, h) = frame.dimensions();
    let r = region.resolve(w, h);
    let cropped = imageops::crop_imm(frame, r.x, r.y, r.width, r.height).to_image();
    imageops::grayscale(&cropped)
}

/// Light cleanup for small numeric fields: blur away anti-aliasing, then binarize.
pub fn prepare_numeric(img: &GrayImage, blur_sigma: f32, threshold: u8) -> GrayImage {
    let blurred = if blur_sigma > 0.0 {
        gaussian_blur_f32(img, blur_sigma)
    } else {
        img.clone()
    };
    binarize(&blurred, threshold)
}

/// Halves both dimensions. Large glyphs read better at half size.
pub fn downscale_half(img: &GrayImage) -> GrayImage {
    let w = (img.width() / 2).max(1);
    let h = (img.height() / 2).max(1);
    imageops::resize(img, w, h, FilterType::Triangle)
}
