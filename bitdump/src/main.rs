use std::{fs, io::stderr, path::Path};

use anyhow::{ensure, Context, Result};
use bitstream::BitStream;
use clap::Parser;
use itertools::Itertools;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

use args::{Args, Command};
use layout::{Entry, Layout};

mod args;
mod layout;

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };
    let filter = filter::Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target("bitdump", level)
        .with_target("bitstream", level);
    let format = tracing_subscriber::fmt::layer().with_writer(stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();

    match args.command {
        Command::Pack { output, entries } => pack(&entries, output.as_deref()),
        Command::Read {
            input,
            layout,
            offset,
            bits,
        } => read(&input, &layout, offset, bits),
    }
}

fn pack(entries: &[Entry], output: Option<&Path>) -> Result<()> {
    let mut stream = BitStream::new();
    for (i, entry) in entries.iter().enumerate() {
        entry
            .write(&mut stream)
            .with_context(|| format!("Failed to pack entry {i} (`{}`)", entry.field))?;
    }

    let bits = stream.len();
    let bytes = stream.into_bytes();
    match output {
        Some(path) => {
            fs::write(path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(
                "Packed {} entries into {bits} bits ({} bytes) at {}",
                entries.len(),
                bytes.len(),
                path.display()
            );
        }
        None => println!("{}", bytes.iter().map(|byte| format!("{byte:02x}")).join(" ")),
    }

    Ok(())
}

fn read(input: &Path, layout: &Layout, offset: usize, bits: Option<usize>) -> Result<()> {
    let mut raw =
        fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let mut stream = open(&mut raw, bits, input)?;

    stream.seek(offset);
    ensure!(
        stream.tell() == offset,
        "Offset {offset} is past the end of the input ({} bits)",
        stream.capacity()
    );

    for field in &layout.fields {
        let pos = stream.tell();
        let value = field
            .read(&mut stream)
            .with_context(|| format!("Failed to decode `{field}` at bit {pos}"))?;

        if let Some(value) = value {
            println!("{pos:>8}  {:<6} {value}", field.to_string());
        }
    }

    info!(
        "Decoded {} fields, {} of {} bits remaining",
        layout.fields.len(),
        stream.remaining(),
        stream.len()
    );
    Ok(())
}

fn open<'a>(raw: &'a mut [u8], bits: Option<usize>, input: &Path) -> Result<BitStream<'a>> {
    Ok(match bits {
        Some(bits) => BitStream::from_slice_bits(raw, bits).with_context(|| {
            format!("--bits {bits} is longer than {}", input.display())
        })?,
        None => BitStream::from_slice(raw),
    })
}
