use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use lrzmagic::error::MagicError;
use lrzmagic::fields::CompressionInfo;
use lrzmagic::header::{read_comment, MagicHeader, RawHeader};
use lrzmagic::layout::HeaderLayout;
use lrzmagic::patch::patch_size;

// Stable exit codes, one per failure class.
const EXIT_BAD_FILENAME: i32 = 1;
const EXIT_BAD_SIZE: i32 = 2;
const EXIT_BAD_FLAGS: i32 = 3;
const EXIT_OPEN: i32 = 4;
const EXIT_BAD_MAGIC: i32 = 5;
const EXIT_TRUNCATED: i32 = 6;
const EXIT_ENCRYPTED: i32 = 7;
const EXIT_ALREADY_SET: i32 = 8;
const EXIT_PROTECTED: i32 = 9;
const EXIT_WRITE: i32 = 10;
const EXIT_USAGE: i32 = -1;

#[derive(Parser, Debug)]
#[command(
    name = "lrzmagic",
    about = "Inspect and patch the magic header of lrzip archives",
    disable_help_flag = true
)]
struct Cli {
    /// Uncompressed size in bytes to store at header offset 6
    #[arg(short = 's', value_name = "SIZE", value_parser = clap::value_parser!(u64).range(1..))]
    size: Option<u64>,

    /// Overwrite an already-stored nonzero size. CAUTION!!
    #[arg(short = 'f')]
    force: bool,

    /// Show header info and exit (opens the file read-only)
    #[arg(short = 'i', conflicts_with_all = ["size", "force"])]
    info: bool,

    /// Show this message
    #[arg(short = 'h', short_alias = '?', long = "help", action = clap::ArgAction::Help)]
    help: Option<bool>,

    /// Archive file
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

fn main() {
    let cli = parse_cli();
    if cli.force && cli.size.is_none() {
        eprintln!("-f has no effect without -s. Exiting...");
        process::exit(EXIT_BAD_FLAGS);
    }
    if cli.info {
        println!("Showing file info only");
    }

    // A bare filename implies info mode; only a patch request needs write
    // access.
    let patch_request = cli.size;
    let mut file = match open_archive(&cli.file, patch_request.is_some()) {
        Ok(f) => f,
        Err(err) => {
            eprintln!("File {} cannot be opened: {err}. Exiting...", cli.file.display());
            process::exit(EXIT_OPEN);
        }
    };

    let raw = match RawHeader::read_from(&mut file) {
        Ok(raw) => raw,
        Err(err) => fail(&err),
    };
    let mut header = match MagicHeader::decode(&raw) {
        Ok(header) => header,
        Err(err) => fail(&err),
    };
    if let Some(declared) = raw.comment_len() {
        header.comment = match read_comment(&mut file, declared) {
            Ok(comment) => comment,
            Err(err) => fail(&err),
        };
    }

    match patch_request {
        None => print_report(&cli.file, &raw, &header),
        Some(new_size) => match patch_size(&mut file, &header, new_size, cli.force) {
            Ok(written) => {
                println!(
                    "New file size is {new_size}. Magic size field set to: {}",
                    hex::encode(written)
                );
            }
            Err(err) => {
                if let MagicError::Io(_) = err {
                    eprintln!("Warning: the file may be left partially written.");
                }
                fail(&err);
            }
        },
    }
}

fn parse_cli() -> Cli {
    use clap::error::ErrorKind;

    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_USAGE,
                ErrorKind::ValueValidation | ErrorKind::InvalidValue => EXIT_BAD_SIZE,
                ErrorKind::ArgumentConflict => EXIT_BAD_FLAGS,
                ErrorKind::MissingRequiredArgument => EXIT_BAD_FILENAME,
                _ => EXIT_USAGE,
            };
            let _ = err.print();
            process::exit(code);
        }
    }
}

fn open_archive(path: &Path, write: bool) -> io::Result<File> {
    if write {
        // Read+update: never truncate, never append, so every byte outside
        // the size field survives untouched.
        OpenOptions::new().read(true).write(true).open(path)
    } else {
        File::open(path)
    }
}

fn fail(err: &MagicError) -> ! {
    eprintln!("{err}. Exiting...");
    process::exit(exit_code(err));
}

fn exit_code(err: &MagicError) -> i32 {
    match err {
        MagicError::NotAnArchive => EXIT_BAD_MAGIC,
        MagicError::Truncated { .. } => EXIT_TRUNCATED,
        MagicError::Encrypted => EXIT_ENCRYPTED,
        MagicError::AlreadySet(_) => EXIT_ALREADY_SET,
        MagicError::SizeProtected(_) => EXIT_PROTECTED,
        MagicError::Io(_) => EXIT_WRITE,
    }
}

// ── Info report ──────────────────────────────────────────────────────────────

fn print_report(path: &Path, raw: &RawHeader, header: &MagicHeader) {
    println!("── lrzip magic header ───────────────────────────────────");
    println!("  Path         {}", path.display());
    println!("  Version      {}", header.version);
    println!("  Encrypted    {}", if header.is_encrypted() {
        header.encryption.name()
    } else {
        "no"
    });
    match header.stored_size {
        Some(size) => println!("  Stored size  {size} bytes"),
        None => println!("  Stored size  unknown (file is encrypted)"),
    }
    if let Some(hash) = header.hash {
        println!("  Hash         {}", hash.name());
    }
    if let Some(md5) = header.md5_at_eof {
        println!("  MD5 at EOF   {}", if md5 { "yes" } else { "no" });
    }
    println!("  Filter       {}", header.filter);
    println!("  Compression  {}", header.compression);
    if let Some(levels) = header.levels {
        println!("  Levels       rzip={} lrzip={}", levels.rzip, levels.lrzip);
    }
    if let Some(comment) = &header.comment {
        println!("  Comment      \"{comment}\"");
    }

    println!();
    println!("Header dump, {} bytes:", raw.bytes().len());
    println!("{:<8} {:<18} Field", "Offset", "Raw");
    for (range, hex_run, desc) in dump_rows(raw, header) {
        println!("{range:<8} {hex_run:<18} {desc}");
    }
}

fn dump_rows(raw: &RawHeader, header: &MagicHeader) -> Vec<(String, String, String)> {
    let bytes = raw.bytes();
    let mut rows = Vec::new();
    let mut row = |lo: usize, hi: usize, desc: String| {
        let range = if lo == hi { lo.to_string() } else { format!("{lo}-{hi}") };
        rows.push((range, hex::encode_upper(&bytes[lo..=hi]), desc));
    };

    row(0, 3, format!("signature \"{}\"", String::from_utf8_lossy(&bytes[..4])));
    row(4, 5, format!("version {}", header.version));
    if let Some(salt) = header.salt {
        row(6, 7, format!("encryption hash loops ({})", salt.loop_count()));
        row(8, 13, "encryption salt".into());
    } else {
        row(6, 13, format!("uncompressed size ({})", header.stored_size.unwrap_or(0)));
    }

    match raw.layout() {
        HeaderLayout::Legacy { filter_offset: fo } => {
            row(14, 15, "unused".into());
            if fo == 1 {
                row(16, 16, format!("filter: {}", header.filter));
            }
            let props_desc = match header.compression {
                CompressionInfo::Unrecorded => "unused (not an LZMA archive)".into(),
                info => format!("LZMA properties: {info}"),
            };
            row(16 + fo, 20 + fo, props_desc);
            row(21 + fo, 21 + fo, format!(
                "MD5 at EOF: {}",
                if header.md5_at_eof.unwrap_or(false) { "yes" } else { "no" }
            ));
            row(22 + fo, 22 + fo, format!(
                "encrypted: {}",
                if header.is_encrypted() { "yes" } else { "no" }
            ));
            if fo == 0 {
                row(23, 23, "unused".into());
            }
        }
        HeaderLayout::V8 | HeaderLayout::V9 => {
            row(14, 14, format!("compression: {}", header.compression));
            row(15, 15, format!("filter: {}", header.filter));
            row(16, 16, format!("hash: {}", header.hash.map_or("none", |h| h.name())));
            row(17, 17, format!("encryption: {}", header.encryption.name()));
            if let Some(levels) = header.levels {
                row(18, 18, format!("levels: rzip={} lrzip={}", levels.rzip, levels.lrzip));
                row(19, 19, format!("comment length ({})", raw.comment_len().unwrap_or(0)));
            }
        }
        HeaderLayout::V11 => {
            row(14, 14, format!("hash: {}", header.hash.map_or("none", |h| h.name())));
            row(15, 15, format!("filter: {}", header.filter));
            row(16, 16, format!("encryption: {}", header.encryption.name()));
            row(17, 18, format!("compression: {}", header.compression));
            if let Some(levels) = header.levels {
                row(19, 19, format!("levels: rzip={} lrzip={}", levels.rzip, levels.lrzip));
            }
            row(20, 20, format!("comment length ({})", raw.comment_len().unwrap_or(0)));
        }
    }
    rows
}
