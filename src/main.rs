use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use argh::FromArgs;
use image::{DynamicImage, ImageFormat};
use kpalette::quantize::quantize;
use kpalette::{KMeans, Result};
use log::{LevelFilter, error, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Map the colors of an image to a smaller palette with k-means clustering.
#[derive(FromArgs, Debug)]
struct Args {
    /// source image path
    #[argh(option, short = 'f')]
    from: PathBuf,

    /// result image path
    #[argh(option, short = 't')]
    to: PathBuf,

    /// number of colors (clusters)
    #[argh(option, short = 'k', default = "8")]
    clusters: usize,

    /// maximum number of k-means iterations
    #[argh(option, short = 'i', default = "1000")]
    max_iter: usize,

    /// number of threads, 1 disables the parallel assignment
    #[argh(option, short = 'p', default = "4")]
    threads: usize,

    /// seed for the initial centroids, random if omitted
    #[argh(option, short = 's')]
    seed: Option<u64>,

    /// relative centroid change below which the clustering stops
    #[argh(option, default = "0.01")]
    tolerance: f32,

    /// print per-iteration debug logs
    #[argh(switch, short = 'v')]
    verbose: bool,
}

fn run(args: Args) -> Result<()> {
    info!("cluster count: {}, thread count: {}", args.clusters, args.threads);
    if args.threads == 0 {
        return Err(kpalette::Error::InvalidArgument(
            "threads must be greater than 0".to_string(),
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()?;
    let kmeans = KMeans::new(args.clusters, args.max_iter)?
        .with_tolerance(args.tolerance)?
        .with_parallel(args.threads > 1);
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    info!("reading {}...", args.from.display());
    let image = image::open(&args.from)?.into_rgba8();
    let pixels = image.width() as u64 * image.height() as u64;

    info!("clustering is starting...");
    let start = Instant::now();
    let quantized = quantize(&image, &kmeans, &mut rng)?;
    info!(
        "finished clustering {} pixels ({} iterations) in {} milliseconds, storing image...",
        pixels,
        quantized.iterations,
        start.elapsed().as_millis()
    );
    if !quantized.converged {
        warn!(
            "did not converge within {} iterations, keeping the last palette",
            args.max_iter
        );
    }
    if quantized.empty_clusters != 0 {
        warn!(
            "{} empty clusters during the run, fewer clusters may fit this image better",
            quantized.empty_clusters
        );
    }

    let output = DynamicImage::ImageRgba8(quantized.image);
    match ImageFormat::from_path(&args.to)? {
        ImageFormat::Jpeg => output.into_rgb8().save(&args.to)?,
        _ => output.save(&args.to)?,
    }
    info!("finished. saved result to: {}", args.to.display());
    Ok(())
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();

    let level = match args.verbose {
        true => LevelFilter::Debug,
        false => LevelFilter::Info,
    };
    logforth::builder()
        .dispatch(|d| d.filter(level).append(logforth::append::Stderr::default()))
        .apply();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
