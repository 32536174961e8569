use std::fs::File;
use std::io::{prelude::*, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use gifpull::{Canvas, Palette};

const MAGIC_NUMBER: &[u8] = b"P3";

/// Writes the canvas as a plain text PPM, looking colors up in `palette`.
pub fn write_ppm(path: &Path, canvas: &Canvas, palette: &Palette) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    write_ppm_to(&mut writer, canvas, palette)?;
    writer.flush()?;
    Ok(())
}

fn write_ppm_to<W: Write>(writer: &mut W, canvas: &Canvas, palette: &Palette) -> Result<()> {
    writer.write_all(MAGIC_NUMBER)?;
    writer.write_all(b"\n")?;
    writeln!(writer, "{} {} 255", canvas.width(), canvas.height())?;

    if canvas.width() == 0 {
        return Ok(());
    }

    let rgb = canvas.to_rgb(palette);
    for row in rgb.chunks(canvas.width() as usize * 3) {
        let line: Vec<String> = row
            .chunks_exact(3)
            .map(|pixel| format!("{: >3} {: >3} {: >3}", pixel[0], pixel[1], pixel[2]))
            .collect();
        writeln!(writer, "{}", line.join(" "))?;
    }

    Ok(())
}
