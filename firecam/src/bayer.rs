//! Bayer 去马赛克 (8-bit 马赛克 -> RGB24)

use firecam_core::pixel_format::{BayerMethod, Channel, ColorFilter};

/// 把单通道马赛克解码为紧密排列的 RGB 数据
///
/// `src` 长度必须至少为 `width * height`，调用方负责校验。
pub fn demosaic(
    src: &[u8],
    width: u32,
    height: u32,
    filter: ColorFilter,
    method: BayerMethod,
) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let mut out = vec![0u8; w * h * 3];
    if w == 0 || h == 0 {
        return out;
    }

    // 按像素视图写入，避免手工计算通道偏移
    let pixels: &mut [[u8; 3]] = bytemuck::cast_slice_mut(&mut out);

    for y in 0..h {
        for x in 0..w {
            let own = filter.color_at(x as u32, y as u32);
            let px = &mut pixels[y * w + x];
            for channel in [Channel::Red, Channel::Green, Channel::Blue] {
                px[channel as usize] = if channel == own {
                    src[y * w + x]
                } else {
                    match method {
                        BayerMethod::Nearest => nearest(src, w, h, x, y, filter, channel),
                        BayerMethod::Simple => block_average(src, w, h, x, y, filter, channel),
                        BayerMethod::Bilinear => neighbour_average(src, w, h, x, y, filter, channel),
                    }
                };
            }
        }
    }
    out
}

/// 2x2 块内第一个同色像素
fn nearest(
    src: &[u8],
    w: usize,
    h: usize,
    x: usize,
    y: usize,
    filter: ColorFilter,
    channel: Channel,
) -> u8 {
    block_sites(w, h, x, y)
        .find(|&(bx, by)| filter.color_at(bx as u32, by as u32) == channel)
        .map(|(bx, by)| src[by * w + bx])
        .unwrap_or(0)
}

/// 2x2 块内同色像素的平均值 (两个 G 取平均)
fn block_average(
    src: &[u8],
    w: usize,
    h: usize,
    x: usize,
    y: usize,
    filter: ColorFilter,
    channel: Channel,
) -> u8 {
    average(
        block_sites(w, h, x, y)
            .filter(|&(bx, by)| filter.color_at(bx as u32, by as u32) == channel)
            .map(|(bx, by)| src[by * w + bx]),
    )
}

/// 3x3 邻域内同色像素的平均值
fn neighbour_average(
    src: &[u8],
    w: usize,
    h: usize,
    x: usize,
    y: usize,
    filter: ColorFilter,
    channel: Channel,
) -> u8 {
    let xs = x.saturating_sub(1)..=(x + 1).min(w - 1);
    let sites = xs.flat_map(|nx| {
        (y.saturating_sub(1)..=(y + 1).min(h - 1)).map(move |ny| (nx, ny))
    });
    average(
        sites
            .filter(|&(nx, ny)| filter.color_at(nx as u32, ny as u32) == channel)
            .map(|(nx, ny)| src[ny * w + nx]),
    )
}

/// 像素所在 2x2 块的坐标 (图像边缘时钳位)
fn block_sites(w: usize, h: usize, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> {
    let (x0, y0) = (x & !1, y & !1);
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    [(x0, y0), (x1, y0), (x0, y1), (x1, y1)].into_iter()
}

fn average(values: impl Iterator<Item = u8>) -> u8 {
    let (sum, n) = values.fold((0u32, 0u32), |(s, n), v| (s + u32::from(v), n + 1));
    if n == 0 {
        0
    } else {
        ((sum + n / 2) / n) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 只有红色站点为 `v` 的马赛克
    fn red_only(w: usize, h: usize, filter: ColorFilter, v: u8) -> Vec<u8> {
        let mut m = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                if filter.color_at(x as u32, y as u32) == Channel::Red {
                    m[y * w + x] = v;
                }
            }
        }
        m
    }

    #[test]
    fn uniform_mosaic_decodes_to_gray() {
        let src = vec![90u8; 6 * 4];
        for method in [BayerMethod::Nearest, BayerMethod::Simple, BayerMethod::Bilinear] {
            let rgb = demosaic(&src, 6, 4, ColorFilter::Gbrg, method);
            assert!(rgb.iter().all(|&v| v == 90), "{method:?}");
        }
    }

    #[test]
    fn red_sites_fill_the_red_plane() {
        for filter in [
            ColorFilter::Rggb,
            ColorFilter::Gbrg,
            ColorFilter::Grbg,
            ColorFilter::Bggr,
        ] {
            let src = red_only(4, 4, filter, 200);
            for method in [BayerMethod::Nearest, BayerMethod::Simple, BayerMethod::Bilinear] {
                let rgb = demosaic(&src, 4, 4, filter, method);
                for px in rgb.chunks_exact(3) {
                    assert_eq!(px, [200, 0, 0], "{filter:?} {method:?}");
                }
            }
        }
    }

    #[test]
    fn simple_averages_both_greens() {
        // RGGB 2x2: R=0, G=100, G=200, B=0
        let src = [0u8, 100, 200, 0];
        let rgb = demosaic(&src, 2, 2, ColorFilter::Rggb, BayerMethod::Simple);
        assert_eq!(rgb[1], 150);
        let rgb = demosaic(&src, 2, 2, ColorFilter::Rggb, BayerMethod::Nearest);
        assert_eq!(rgb[1], 100);
    }
}
