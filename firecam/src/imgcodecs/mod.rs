use crate::image::Image;
use anyhow::{anyhow, Result};
use firecam_core::pixel_format::ImageType;
use std::path::Path;

/// 保存图像文件
///
/// 根据文件扩展名自动决定格式 (PNG, BMP, TIFF ...)。
/// 采集得到的 Color 图像已经是 RGB 顺序，无需通道重排。
pub fn imwrite<P: AsRef<Path>>(path: P, img: &Image) -> Result<()> {
    if img.is_empty() {
        return Err(anyhow!("Refusing to save an empty image"));
    }

    // 1. 映射到 image crate 的颜色类型
    let color = match img.image_type {
        ImageType::Grayscale => image::ColorType::L8,
        ImageType::Color => image::ColorType::Rgb8,
        ImageType::ColorAlpha => image::ColorType::Rgba8,
    };

    // 2. 长度校验，避免 image crate 内部 panic
    let expected = img.step() * img.height as usize;
    if img.data.len() < expected {
        return Err(anyhow!(
            "Image buffer too short: {} bytes, expected {}",
            img.data.len(),
            expected
        ));
    }

    // 3. 保存
    image::save_buffer(
        path.as_ref(),
        &img.data[..expected],
        img.width,
        img.height,
        color,
    )
    .map_err(|e| anyhow!("Failed to save image {}: {}", path.as_ref().display(), e))?;

    tracing::debug!(target: "firecam::imgcodecs", "Saved {:?} to {}", img, path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_image_is_rejected() {
        let path = std::env::temp_dir().join("firecam_empty.png");
        assert!(imwrite(&path, &Image::empty()).is_err());
    }

    #[test]
    fn grayscale_png_round_trips_through_disk() {
        let mut img = Image::new(4, 2, ImageType::Grayscale);
        img.data.copy_from_slice(&[0, 32, 64, 96, 128, 160, 192, 224]);

        let path = std::env::temp_dir().join(format!("firecam_gray_{}.png", std::process::id()));
        imwrite(&path, &img).unwrap();

        let loaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(loaded.dimensions(), (4, 2));
        assert_eq!(loaded.as_raw(), &img.data);
        let _ = std::fs::remove_file(&path);
    }
}
