// Prints the overlay command for two inputs without running FFmpeg

use std::path::PathBuf;

use anaglyph_overlay::{config::Config, filter::StreamKind, OverlayCommand};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let background = args.next().ok_or("usage: show_command <background> <overlay> [output name]")?;
    let overlay = args.next().ok_or("usage: show_command <background> <overlay> [output name]")?;
    let output_name = args.next().unwrap_or_else(|| "output_overlay_washed.mp4".to_string());

    let output: PathBuf = Config::default().scratch_dir().join(output_name);
    let command = OverlayCommand::new(background, overlay, output);

    println!("Command line:\n  {}", command.to_command_line());
    println!("\nArguments:");
    for arg in command.args() {
        println!("  {}", arg);
    }
    println!("\nVideo labels: {:?}", command.graph().labels(StreamKind::Video));
    println!("Audio labels: {:?}", command.graph().labels(StreamKind::Audio));

    Ok(())
}
