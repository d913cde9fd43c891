//! starseek-upload CLI
//!
//! Local tooling around the upload pipeline: content hashes, the adaptive
//! compressor and the default batch configuration.

use bytesize::ByteSize;
use clap::{value_parser, Arg, ArgAction, Command};
use log::info;
use starseek_upload::{
    content_hash, BatchConfig, Compressor, FsImageSource, ImageCompressor, ImageRef, ImageSource,
    JpegCodec,
};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("starseek-upload")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plate-solving upload tools")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("hash")
                .about("Print the content hash of each image")
                .arg(
                    Arg::new("files")
                        .help("Images to hash")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("compress")
                .about("Compress an image to fit the upload cap")
                .arg(
                    Arg::new("input")
                        .help("Image to compress")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("output")
                        .help("Where to write the JPEG")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("max-bytes")
                        .long("max-bytes")
                        .help("Upload cap in bytes (default from config)")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .help("Batch configuration JSON file")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(Command::new("config").about("Print the default batch configuration"))
        .get_matches();

    let level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let source = FsImageSource::new();

    match matches.subcommand() {
        Some(("hash", sub_matches)) => {
            let files = sub_matches
                .get_many::<PathBuf>("files")
                .ok_or("No files given")?;
            for file in files {
                let bytes = source.read(&ImageRef::from(file.as_path())).await?;
                println!("{}  {}", content_hash(&bytes), file.display());
            }
        }
        Some(("compress", sub_matches)) => {
            let input = sub_matches
                .get_one::<PathBuf>("input")
                .ok_or("No input given")?;
            let output = sub_matches
                .get_one::<PathBuf>("output")
                .ok_or("No output given")?;

            let config = match sub_matches.get_one::<PathBuf>("config") {
                Some(path) => BatchConfig::from_file(path)?,
                None => BatchConfig::default(),
            };
            let max_bytes = sub_matches
                .get_one::<u64>("max-bytes")
                .copied()
                .unwrap_or(config.compress.max_upload_bytes);

            let bytes = source.read(&ImageRef::from(input.as_path())).await?;
            info!("compressing {} ({})", input.display(), ByteSize::b(bytes.len() as u64));

            let compressor = ImageCompressor::new(JpegCodec, config.compress);
            let compressed = compressor.compress(bytes, max_bytes).await?;
            tokio::fs::write(output, &compressed.bytes).await?;

            println!(
                "{} -> {}: quality {}, {} attempts, {} (cap {}{})",
                input.display(),
                output.display(),
                compressed.quality,
                compressed.attempts,
                ByteSize::b(compressed.len() as u64),
                ByteSize::b(max_bytes),
                if compressed.fits(max_bytes) {
                    ""
                } else {
                    ", not reached"
                }
            );
        }
        Some(("config", _)) => {
            println!("{}", BatchConfig::default().to_json()?);
        }
        _ => {
            eprintln!("No subcommand provided. Use --help for usage information.");
            std::process::exit(1);
        }
    }

    Ok(())
}
