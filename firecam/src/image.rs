use std::fmt;

use firecam_core::pixel_format::ImageType;

/// 采集输出的图像容器
///
/// 自有数据 (Vec<u8>)，紧密排列 (Packed)：`step == width * channels`。
/// 每次 grab 都会按需重新分配，调用方只把它当作写入目标。
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub image_type: ImageType,
}

impl Image {
    pub fn new(width: u32, height: u32, image_type: ImageType) -> Self {
        let size = width as usize * height as usize * image_type.channels() as usize;
        Self {
            data: vec![0; size],
            width,
            height,
            image_type,
        }
    }

    /// 创建一个空的 Image (通常用于作为输出 buffer)
    pub fn empty() -> Self {
        Self {
            data: vec![],
            width: 0,
            height: 0,
            image_type: ImageType::Grayscale,
        }
    }

    /// 检查是否为空
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }

    pub fn channels(&self) -> u8 {
        self.image_type.channels()
    }

    /// 每一行占用的字节数
    pub fn step(&self) -> usize {
        self.width as usize * self.channels() as usize
    }

    /// 尺寸或类型变化时重新分配；否则复用已有内存
    pub fn allocate(&mut self, width: u32, height: u32, image_type: ImageType) {
        let size = width as usize * height as usize * image_type.channels() as usize;
        self.width = width;
        self.height = height;
        self.image_type = image_type;
        self.data.resize(size, 0);
    }

    /// 用一帧已解码的像素数据替换内容
    pub(crate) fn assign(&mut self, width: u32, height: u32, image_type: ImageType, data: &[u8]) {
        self.allocate(width, height, image_type);
        let len = self.data.len().min(data.len());
        self.data[..len].copy_from_slice(&data[..len]);
    }

    /// 获取某一行的像素数据
    pub fn row_bytes(&self, row: u32) -> &[u8] {
        let start = row as usize * self.step();
        let end = (start + self.step()).min(self.data.len());
        &self.data[start.min(end)..end]
    }

    /// 读取 (x, y) 处的像素 (所有通道)
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let ch = self.channels() as usize;
        let start = y as usize * self.step() + x as usize * ch;
        self.data.get(start..start + ch)
    }
}

impl Default for Image {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("image_type", &self.image_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_reuses_and_resizes() {
        let mut img = Image::empty();
        assert!(img.is_empty());

        img.allocate(4, 2, ImageType::Color);
        assert_eq!(img.data.len(), 24);
        assert_eq!(img.step(), 12);

        img.allocate(2, 2, ImageType::Grayscale);
        assert_eq!(img.data.len(), 4);
        assert_eq!(img.channels(), 1);
    }

    #[test]
    fn pixel_access_is_bounds_checked() {
        let mut img = Image::new(2, 2, ImageType::Color);
        img.data[9..12].copy_from_slice(&[1, 2, 3]);
        assert_eq!(img.pixel(1, 1), Some(&[1u8, 2, 3][..]));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.row_bytes(1), &[0, 0, 0, 1, 2, 3]);
    }
}
