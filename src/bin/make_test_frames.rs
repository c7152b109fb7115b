// Writes a folder of numbered synthetic images for trying out frame-sequencer

use std::path::PathBuf;

use clap::Parser;
use image::{Rgb, RgbImage};

use frame_sequencer::FrameSize;

#[derive(Parser)]
#[command(name = "make_test_frames", about = "Generate numbered test images")]
struct Args {
    /// Folder to write into (created if missing)
    dir: PathBuf,

    /// Number of images
    #[arg(short, long, default_value_t = 30)]
    count: u32,

    /// Image size as "<width>,<height>"
    #[arg(short, long, default_value = "640,480")]
    size: FrameSize,

    /// File extension (jpg, png or bmp)
    #[arg(short, long, default_value = "jpg")]
    ext: String,

    /// Also write one undecodable file in the middle of the sequence
    #[arg(long)]
    corrupt: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    std::fs::create_dir_all(&args.dir)?;

    println!("🎨 Writing {} {} images ({}) to {:?}", args.count, args.ext, args.size, args.dir);

    let corrupt_index = args.corrupt.then(|| args.count / 2 + 1);

    // Unpadded numbers on purpose so plain lexicographic order would be wrong
    for i in 1..=args.count {
        let path = args.dir.join(format!("frame{}.{}", i, args.ext));

        if corrupt_index == Some(i) {
            std::fs::write(&path, b"this is not an image")?;
            println!("   ⚠️  {:?} (corrupt)", path);
            continue;
        }

        let hue = (i - 1) as f32 / args.count.max(1) as f32 * 360.0;
        let image = test_pattern(args.size, hsv_to_rgb(hue, 0.7, 0.9), i);
        image.save(&path)?;
    }

    println!("✅ Done");
    Ok(())
}

/// Solid color with a white bar whose position encodes the frame number
fn test_pattern(size: FrameSize, color: [u8; 3], index: u32) -> RgbImage {
    let bar_x = (index * 8) % size.width.max(1);
    RgbImage::from_fn(size.width, size.height, |x, _| {
        if x >= bar_x && x < bar_x + 4 {
            Rgb([255, 255, 255])
        } else {
            Rgb(color)
        }
    })
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ]
}
