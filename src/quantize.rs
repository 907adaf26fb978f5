//! Reduce the colors of an image to a k-means palette.

use image::{Rgb, RgbaImage};
use rand::Rng;

use crate::error::Result;
use crate::kmeans::KMeans;

/// Outcome of quantizing one image.
#[derive(Debug, Clone)]
pub struct Quantized {
    /// The repainted image, same size and alpha as the source.
    pub image: RgbaImage,
    /// One color per cluster.
    pub palette: Vec<Rgb<u8>>,
    /// Number of k-means iterations executed.
    pub iterations: usize,
    /// Whether the palette stabilized before the iteration cap.
    pub converged: bool,
    /// Total number of empty clusters seen across all iterations.
    pub empty_clusters: usize,
}

/// RGB channels of every pixel in row-major order.
///
/// The index of a vector is the position of its pixel, `y * width + x`.
pub fn pixels_to_points(image: &RgbaImage) -> Vec<[f32; 3]> {
    image
        .pixels()
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect()
}

fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Convert RGB centroids to displayable colors, rounding and clamping every channel.
pub fn centroids_to_palette(centroids: &[Vec<f32>]) -> Vec<Rgb<u8>> {
    centroids
        .iter()
        .map(|c| Rgb([to_channel(c[0]), to_channel(c[1]), to_channel(c[2])]))
        .collect()
}

/// Paint every pixel with the palette color of its label, keeping its alpha.
///
/// `labels` holds one cluster index per pixel in row-major order.
pub fn repaint(image: &RgbaImage, palette: &[Rgb<u8>], labels: &[u32]) -> RgbaImage {
    let mut output = image.clone();
    for (pixel, &label) in output.pixels_mut().zip(labels.iter()) {
        pixel.0[..3].copy_from_slice(&palette[label as usize].0);
    }
    output
}

/// Quantize `image` to `kmeans.n_cluster()` colors.
///
/// Fails with [`Error::InvalidArgument`](crate::error::Error::InvalidArgument) when the image
/// is empty or has fewer distinct colors than requested clusters.
///
/// Memory grows with the pixel count: besides the `[f32; 3]` per pixel, the clustering result
/// holds a label and a borrowed slice (16 bytes on 64-bit) per pixel until repainting is done.
pub fn quantize<R: Rng + ?Sized>(
    image: &RgbaImage,
    kmeans: &KMeans,
    rng: &mut R,
) -> Result<Quantized> {
    let points = pixels_to_points(image);
    let res = kmeans.fit(&points, rng)?;
    let palette = centroids_to_palette(&res.centroids);
    Ok(Quantized {
        image: repaint(image, &palette, &res.labels),
        palette,
        iterations: res.iterations,
        converged: res.converged,
        empty_clusters: res.empty_clusters,
    })
}
