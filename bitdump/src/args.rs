use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::layout::{Entry, Layout};

#[derive(Debug, Parser)]
/// Pack values into bit-packed buffers and decode them again.
pub struct Args {
    #[arg(short, long, global = true)]
    /// Trace stream internals such as buffer growth.
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encode fields back to back, least significant bit first.
    Pack {
        #[arg(short, long)]
        /// File to write the packed bytes to. The bytes are printed as hex
        /// when omitted.
        output: Option<PathBuf>,

        #[arg(required = true)]
        /// Fields to encode, for example `bool=true`, `u12=0xABC`, `i5=-9`,
        /// `f32=1.5`, `align4` or `skip3`.
        entries: Vec<Entry>,
    },
    /// Decode a file against a field layout.
    Read {
        /// File holding the packed bytes.
        input: PathBuf,

        #[arg(short, long)]
        /// Comma separated fields, for example `bool,u32,align2,i5`.
        layout: Layout,

        #[arg(long, default_value_t = 0)]
        /// Bit to start decoding at.
        offset: usize,

        #[arg(long)]
        /// Only treat the first this many bits of the file as data.
        bits: Option<usize>,
    },
}
