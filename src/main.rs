use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::info;

use gifpull::{Canvas, Decoder};

mod ppm_writer;

const USAGE: &str = "usage: gifpull <input.gif> [output-dir]";

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args_os().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        bail!(USAGE);
    };
    let out_dir = args.next().map_or_else(|| PathBuf::from("frames"), PathBuf::from);
    if args.next().is_some() {
        bail!(USAGE);
    }

    let file = File::open(&input).with_context(|| format!("failed to open {}", input.display()))?;
    let mut decoder = Decoder::new(BufReader::new(file));

    let screen = decoder
        .read_info()
        .with_context(|| format!("{} is not a readable GIF", input.display()))?
        .clone();
    info!(
        "{}x{} screen, {} global colors",
        screen.screen_width,
        screen.screen_height,
        screen.global_palette.as_ref().map_or(0, |palette| palette.len())
    );

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut canvas = Canvas::for_screen(&screen);
    let mut frame_count = 0;
    while let Some(frame) = decoder
        .next_frame()
        .with_context(|| format!("failed to decode frame {}", frame_count))?
    {
        canvas.draw(&frame);

        let palette = frame
            .local_palette
            .as_ref()
            .or(screen.global_palette.as_ref())
            .with_context(|| format!("frame {} has no color table", frame_count))?;

        let path = out_dir.join(format!("frame_{}.ppm", frame_count));
        ppm_writer::write_ppm(&path, &canvas, palette)?;
        info!(
            "frame {}: {}x{} at ({}, {}), delay {}ms -> {}",
            frame_count,
            frame.width(),
            frame.height(),
            frame.left(),
            frame.top(),
            frame.delay_time() as u32 * 10,
            path.display()
        );

        frame_count += 1;
    }

    if let Some(loop_count) = decoder.loop_count() {
        info!("loop count: {:?}", loop_count);
    }
    println!("wrote {} frames to {}", frame_count, out_dir.display());

    Ok(())
}
