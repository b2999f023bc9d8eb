use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

use mcd_codec::{Document, McdFile, Result};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <file.mcd | file.json> [base.mcd]", args[0]);
        std::process::exit(1);
    }

    let input = PathBuf::from(&args[1]);
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let result = match extension.as_str() {
        "mcd" => mcd_to_json(&input),
        "json" => {
            let base = match args.get(2) {
                Some(path) => PathBuf::from(path.trim_matches('"')),
                None => prompt_for_base(),
            };
            json_to_mcd(&input, &base)
        }
        _ => {
            eprintln!("ERROR: unrecognized input extension: {}", input.display());
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}

/// Decode an MCD file and write the interchange document next to it.
fn mcd_to_json(input: &Path) -> Result<()> {
    let mcd = McdFile::from_path(input)?;
    let document = mcd.to_document()?;

    let outfile = input.with_extension("json");
    std::fs::write(&outfile, serde_json::to_string_pretty(&document)?)?;

    println!("Wrote {}", outfile.display());
    Ok(())
}

/// Apply an edited interchange document on top of a base MCD file and
/// write the re-encoded binary next to the document.
fn json_to_mcd(input: &Path, base: &Path) -> Result<()> {
    let mut mcd = McdFile::from_path(base)?;

    let document: Document = serde_json::from_str(&std::fs::read_to_string(input)?)?;
    mcd.update_from_document(&document)?;

    let outfile = input.with_extension("mcd");
    mcd.write_to_path(&outfile)?;

    println!("Wrote {}", outfile.display());
    Ok(())
}

/// The base MCD file supplies the symbol/glyph/font tables the edited
/// document is re-encoded against.
fn prompt_for_base() -> PathBuf {
    print!("MCD file to use as a base for fonts/glyphs: ");
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() || line.trim().is_empty() {
        eprintln!("ERROR: no base MCD file given");
        std::process::exit(1);
    }
    PathBuf::from(line.trim().trim_matches('"'))
}
