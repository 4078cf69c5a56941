//! Headless Frame Buffer Console Runner
//!
//! Renders a text file through the console onto an in-memory frame buffer
//! and writes the result as a PPM image or as a JSON log of device calls.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use fbcon::console::CursorMode;
use fbcon::core::{encode_str, Font, FontError, FontRegistry};
use fbcon::display::{MemoryFramebuffer, Recorder, Visual};
use fbcon::render::ScrollDirection;
use fbcon::{Config, ConsoleSwitch, DisplayRegistry, FbConsole, VirtualConsole};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut xres = 640u32;
    let mut yres = 400u32;
    let mut bpp = 32u8;
    let mut font_path: Option<String> = None;
    let mut font_width = 8u32;
    let mut font_height = 16u32;
    let mut boot_option = String::new();
    let mut input_file: Option<String> = None;
    let mut output_file: Option<String> = None;
    let mut output_format = OutputFormat::Ppm;
    let mut show_help = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-x" | "--xres" => {
                i += 1;
                if i < args.len() {
                    xres = args[i].parse().unwrap_or(640);
                }
            },
            "-y" | "--yres" => {
                i += 1;
                if i < args.len() {
                    yres = args[i].parse().unwrap_or(400);
                }
            },
            "-b" | "--bpp" => {
                i += 1;
                if i < args.len() {
                    bpp = args[i].parse().unwrap_or(32);
                }
            },
            "--font" => {
                i += 1;
                if i < args.len() {
                    font_path = Some(args[i].clone());
                }
            },
            "--font-width" => {
                i += 1;
                if i < args.len() {
                    font_width = args[i].parse().unwrap_or(8);
                }
            },
            "--font-height" => {
                i += 1;
                if i < args.len() {
                    font_height = args[i].parse().unwrap_or(16);
                }
            },
            "--boot" => {
                i += 1;
                if i < args.len() {
                    boot_option = args[i].clone();
                }
            },
            "-o" | "--output" => {
                i += 1;
                if i < args.len() {
                    output_file = Some(args[i].clone());
                }
            },
            "-j" | "--json" => {
                output_format = OutputFormat::Json;
            },
            "-h" | "--help" => {
                show_help = true;
            },
            _ => {
                if input_file.is_none() && !args[i].starts_with('-') {
                    input_file = Some(args[i].clone());
                }
            },
        }
        i += 1;
    }

    if show_help {
        print_help();
        return ExitCode::SUCCESS;
    }

    let config = match Config::from_boot_option(&boot_option) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        },
    };

    let font = match &font_path {
        Some(path) => match load_font(path, font_width, font_height) {
            Ok(font) => font,
            Err(e) => {
                eprintln!("Error loading font '{}': {}", path, e);
                return ExitCode::FAILURE;
            },
        },
        None => match outline_font() {
            Ok(font) => font,
            Err(e) => {
                eprintln!("Error building fallback font: {}", e);
                return ExitCode::FAILURE;
            },
        },
    };
    let mut fonts = FontRegistry::new();
    fonts.register(font);

    let text = match &input_file {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path, e);
                return ExitCode::FAILURE;
            },
        },
        None => {
            let mut text = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut text) {
                eprintln!("Error reading stdin: {}", e);
                return ExitCode::FAILURE;
            }
            text
        },
    };

    let visual = if bpp <= 8 {
        Visual::PseudoColor
    } else {
        Visual::TrueColor
    };
    let mut displays = DisplayRegistry::new();
    displays.register(Recorder::new(MemoryFramebuffer::new(xres, yres, bpp, visual)));

    let mut vc = VirtualConsole::new();
    let mut console = match FbConsole::startup(&displays, &fonts, &config, &mut vc) {
        Ok(console) => console,
        Err(e) => {
            eprintln!("Console did not attach: {}", e);
            return ExitCode::FAILURE;
        },
    };

    render_text(&mut console, &mut vc, &text);

    let output = console.with_backend(|rec| match output_format {
        OutputFormat::Ppm => Ok(rec.inner().to_ppm()),
        OutputFormat::Json => serde_json::to_vec_pretty(rec.calls()),
    });
    let output = match output {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error serializing call log: {}", e);
            return ExitCode::FAILURE;
        },
    };

    let written = match &output_file {
        Some(path) => std::fs::write(path, &output),
        None => io::stdout().write_all(&output),
    };
    if let Err(e) = written {
        eprintln!("Error writing output: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[derive(Clone, Copy)]
enum OutputFormat {
    Ppm,
    Json,
}

/// Write `text` line by line, scrolling once the screen is full
fn render_text<C: ConsoleSwitch>(console: &mut C, vc: &mut VirtualConsole, text: &str) {
    let (rows, cols) = (vc.rows, vc.cols);
    let attr = vc.erase_attr();
    console.clear(vc, 0, 0, rows.saturating_sub(1), cols);

    let mut row = 0;
    for line in text.lines() {
        if row == rows {
            console.scroll_region(0, rows, ScrollDirection::Up, 1);
            row = rows - 1;
            console.clear(vc, row, 0, 0, cols);
        }
        let line = line.replace('\t', "    ");
        console.putcs(&encode_str(&line, attr, vc.high_glyphs()), row, 0);
        vc.x = (line.chars().count() as u32).min(cols.saturating_sub(1));
        vc.y = row;
        row += 1;
    }
    console.cursor(vc, CursorMode::Draw);
}

/// Load a raw font dump: glyph bitmaps back to back, rows padded to bytes
fn load_font(path: &str, width: u32, height: u32) -> Result<Font, Box<dyn std::error::Error>> {
    let data = std::fs::read(path)?;
    let glyph_size = width.div_ceil(8) as usize * height as usize;
    let glyph_count = if glyph_size > 0 && data.len() >= 512 * glyph_size {
        512
    } else {
        256
    };
    let name = std::path::Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    Ok(Font::new(name, width, height, glyph_count, data)?)
}

/// 8x16 font where every printable glyph is an outlined box
fn outline_font() -> Result<Font, FontError> {
    let mut data = vec![0u8; 256 * 16];
    for (code, glyph) in data.chunks_mut(16).enumerate() {
        if code <= 0x20 || code == 0x7f {
            continue;
        }
        glyph[2] = 0x7e;
        for row in &mut glyph[3..13] {
            *row = 0x42;
        }
        glyph[13] = 0x7e;
    }
    Font::new("outline8x16", 8, 16, 256, data)
}

fn print_help() {
    println!("Headless Frame Buffer Console");
    println!();
    println!("Usage: fbcon-headless [OPTIONS] [INPUT_FILE]");
    println!();
    println!("Options:");
    println!("  -x, --xres <N>         Surface width in pixels (default: 640)");
    println!("  -y, --yres <N>         Surface height in pixels (default: 400)");
    println!("  -b, --bpp <N>          Bits per pixel (default: 32)");
    println!("      --font <PATH>      Raw font dump to render with");
    println!("      --font-width <N>   Glyph width of the font dump (default: 8)");
    println!("      --font-height <N>  Glyph height of the font dump (default: 16)");
    println!("      --boot <OPTIONS>   Boot option string, e.g. font:NAME");
    println!("  -o, --output <PATH>    Write output to a file instead of stdout");
    println!("  -j, --json             Output the device call log as JSON");
    println!("  -h, --help             Show this help message");
    println!();
    println!("Without --json a PPM image of the surface is written.");
}
