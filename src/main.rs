//! CLI entry point for `mobimeta`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mobimeta::config::Config;
use mobimeta::exth::{registry, types, ExthRecord};
use mobimeta::mobi::{locale, text, MetaInfo, MobiContainer};

#[derive(Parser)]
#[command(
    name = "mobimeta",
    version,
    about = "Inspect and edit the metadata of MOBI e-books"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a metadata summary
    Info {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// List EXTH records
    Exth {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Edit metadata and save to a new file
    Set {
        file: PathBuf,
        /// Output file (default: <stem><suffix>.<ext> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// New full name (title)
        #[arg(long)]
        title: Option<String>,
        /// Replace all authors (repeatable)
        #[arg(long)]
        author: Vec<String>,
        /// Remove every EXTH record of this type (repeatable)
        #[arg(long, value_name = "TYPE")]
        remove_type: Vec<u32>,
        /// Add an EXTH record, TYPE being a number or a label (repeatable)
        #[arg(long, value_name = "TYPE=VALUE")]
        add: Vec<String>,
        /// Locale code or name, e.g. 1033 or "english:us"
        #[arg(long)]
        locale: Option<String>,
        /// Dictionary input language
        #[arg(long)]
        input_language: Option<String>,
        /// Dictionary output language
        #[arg(long)]
        output_language: Option<String>,
        /// Keep record 0 at its original size when possible
        #[arg(long)]
        no_pack: bool,
    },
    /// Extract the cover or thumbnail image
    Cover {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a text preview, or export the full text with -o
    Text {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Preview length in characters
        #[arg(long)]
        chars: Option<usize>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = mobimeta::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Info { files, json } => cmd_info(&files, json),
        Commands::Exth { file, json } => cmd_exth(&file, json),
        Commands::Set {
            file,
            output,
            title,
            author,
            remove_type,
            add,
            locale,
            input_language,
            output_language,
            no_pack,
        } => {
            let edits = Edits {
                title,
                authors: author,
                remove_types: remove_type,
                additions: add,
                locale,
                input_language,
                output_language,
            };
            cmd_set(&file, output.as_deref(), &edits, no_pack, &config)
        }
        Commands::Cover { file, output } => cmd_cover(&file, &output),
        Commands::Text {
            file,
            output,
            chars,
        } => cmd_text(&file, output.as_deref(), chars, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = mobimeta::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mobimeta.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mobimeta", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

fn open(path: &Path) -> anyhow::Result<MobiContainer> {
    MobiContainer::open(path).with_context(|| format!("Cannot read {}", path.display()))
}

/// Show metadata for one or more files.
fn cmd_info(files: &[PathBuf], json: bool) -> anyhow::Result<()> {
    let pb = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Reading [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut infos = Vec::with_capacity(files.len());
    let mut failures = 0usize;
    for path in files {
        if let Some(pb) = &pb {
            pb.set_message(path.display().to_string());
        }
        match open(path) {
            Ok(container) => infos.push(MetaInfo::from_container(&container)),
            Err(e) => {
                failures += 1;
                if let Some(pb) = &pb {
                    pb.suspend(|| eprintln!("  {e:#}"));
                } else {
                    eprintln!("  {e:#}");
                }
            }
        }
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if json {
        let out = if files.len() == 1 && infos.len() == 1 {
            serde_json::to_string_pretty(&infos[0])?
        } else {
            serde_json::to_string_pretty(&infos)?
        };
        println!("{out}");
    } else {
        for info in &infos {
            print_info_table(info);
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} file(s) could not be read", files.len());
    }
    Ok(())
}

/// Print a metadata summary as a human-readable table.
fn print_info_table(info: &MetaInfo) {
    use humansize::{format_size, BINARY};

    let date = |d: Option<chrono::DateTime<chrono::Utc>>| {
        d.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    println!();
    if let Some(path) = &info.path {
        println!("  {:<20} {}", "File", path);
    }
    println!("  {:<20} {}", "Size", format_size(info.file_size, BINARY));
    println!("  {:<20} {}", "Title", info.title());
    let authors = info.authors();
    if !authors.is_empty() {
        println!("  {:<20} {}", "Author", authors.join(", "));
    }
    println!();
    println!("  {:<20} {}", "PDB name", info.pdb.name);
    println!("  {:<20} {}", "Type/creator", info.pdb.type_creator);
    if !info.pdb.attributes.is_empty() {
        println!("  {:<20} {}", "Attributes", info.pdb.attributes.join(", "));
    }
    println!("  {:<20} {}", "Created", date(info.pdb.created));
    println!("  {:<20} {}", "Modified", date(info.pdb.modified));
    println!("  {:<20} {}", "Records", info.pdb.record_count);
    println!();

    let m = &info.mobi;
    if let Some(len) = m.header_length {
        println!("  {:<20} {} bytes", "MOBI header", len);
    } else {
        println!("  {:<20} {}", "MOBI header", "none (PalmDOC only)");
    }
    if let Some(v) = m.file_version {
        println!("  {:<20} {}", "File version", v);
    }
    println!("  {:<20} {}", "Compression", m.compression);
    if m.encryption_type != 0 {
        println!("  {:<20} {}", "Encryption", m.encryption_type);
    }
    println!(
        "  {:<20} {} ({})",
        "Encoding", m.text_encoding, m.encoding_name
    );
    println!(
        "  {:<20} {} ({})",
        "Locale",
        m.locale,
        m.locale_name.as_deref().unwrap_or("unknown")
    );
    println!(
        "  {:<20} {} in {} record(s)",
        "Text length", m.text_length, m.text_record_count
    );
    let last = m
        .last_content_index
        .map_or_else(|| "unset".to_string(), |v| v.to_string());
    println!(
        "  {:<20} {}..{}",
        "Content records", m.first_content_index, last
    );
    if let Some(i) = m.first_image_index {
        println!("  {:<20} {}", "First image", i);
    }
    println!(
        "  {:<20} {}",
        "Cover",
        if info.has_cover { "yes" } else { "no" }
    );
    println!("  {:<20} {}", "EXTH records", info.exth.len());
    println!();
}

/// List the EXTH records of a file.
fn cmd_exth(path: &Path, json: bool) -> anyhow::Result<()> {
    let container = open(path)?;
    let info = MetaInfo::from_container(&container);

    if json {
        println!("{}", serde_json::to_string_pretty(&info.exth)?);
        return Ok(());
    }

    println!();
    if info.exth.is_empty() {
        println!("  No EXTH records.");
        println!();
        return Ok(());
    }
    println!("  {:>5}  {:<24} {:>6}  {}", "Type", "Label", "Size", "Value");
    println!("  {}", "-".repeat(78));
    for entry in &info.exth {
        let value: String = entry.value.chars().take(60).collect();
        println!(
            "  {:>5}  {:<24} {:>6}  {}",
            entry.record_type,
            entry.label.unwrap_or("?"),
            entry.size,
            value.replace('\n', " ")
        );
    }
    println!();
    Ok(())
}

/// Requested metadata changes for `set`.
struct Edits {
    title: Option<String>,
    authors: Vec<String>,
    remove_types: Vec<u32>,
    additions: Vec<String>,
    locale: Option<String>,
    input_language: Option<String>,
    output_language: Option<String>,
}

/// Edit metadata and write the result to a new file.
fn cmd_set(
    path: &Path,
    output: Option<&Path>,
    edits: &Edits,
    no_pack: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let mut container = open(path)?;
    let enc = container.character_encoding();

    let additions = edits
        .additions
        .iter()
        .map(|arg| parse_addition(arg, enc))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if let Some(title) = &edits.title {
        container.set_full_name(title)?;
        if container
            .exth()
            .is_some_and(|e| e.records_with_type_exist(types::UPDATED_TITLE))
        {
            container.edit_exth(|exth| {
                exth.set_all_records_with_type_to_string(types::UPDATED_TITLE, title, Some(enc))
            })?;
        }
    }

    let needs_exth =
        !edits.authors.is_empty() || !edits.remove_types.is_empty() || !additions.is_empty();
    if needs_exth {
        container.edit_exth(|exth| {
            for &t in &edits.remove_types {
                let removed = exth.remove_records_with_type(t);
                tracing::info!(record_type = t, removed, "Removed EXTH records");
            }
            if !edits.authors.is_empty() {
                exth.remove_records_with_type(types::AUTHOR);
                for author in &edits.authors {
                    exth.add_string_record(types::AUTHOR, author, Some(enc));
                }
            }
            for record in additions {
                exth.add_record(record);
            }
        })?;
    }

    if edits.locale.is_some() || edits.input_language.is_some() || edits.output_language.is_some()
    {
        let locale = resolve_language(edits.locale.as_deref(), container.locale())?;
        let input = resolve_language(edits.input_language.as_deref(), container.input_language())?;
        let output =
            resolve_language(edits.output_language.as_deref(), container.output_language())?;
        container.set_languages(locale, input, output)?;
    }

    let target = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.save.derived_output(path));
    let pack = config.save.pack && !no_pack;
    let saved =
        mobimeta::export::book::save_book(&mut container, &target, pack, config.save.overwrite)?;

    println!("  Saved {}", saved.display());
    Ok(())
}

/// Parse `TYPE=VALUE`, TYPE being a number or a registry label.
fn parse_addition(
    arg: &str,
    enc: &'static encoding_rs::Encoding,
) -> anyhow::Result<ExthRecord> {
    let (kind, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected TYPE=VALUE, got '{arg}'"))?;
    let record_type = match kind.trim().parse::<u32>() {
        Ok(n) => n,
        Err(_) => registry::type_for_description(kind).ok_or_else(|| {
            let labels: Vec<&str> = registry::known_types().map(|(_, label)| label).collect();
            anyhow::anyhow!(
                "Unknown EXTH type '{kind}'; use a number or one of: {}",
                labels.join(", ")
            )
        })?,
    };

    let record = if registry::is_integer_type(record_type) {
        let n: u32 = value
            .trim()
            .parse()
            .with_context(|| format!("EXTH type {record_type} needs an integer value"))?;
        ExthRecord::from_u32(record_type, n)
    } else if registry::is_boolean_type(record_type) {
        let flag = match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            other => anyhow::bail!("EXTH type {record_type} needs a boolean value, got '{other}'"),
        };
        ExthRecord::from_bool(record_type, flag)
    } else {
        ExthRecord::from_string(record_type, value, Some(enc))
    };
    Ok(record)
}

/// A language given as a number or as `language[:dialect]`; `None` keeps `current`.
fn resolve_language(arg: Option<&str>, current: u32) -> anyhow::Result<u32> {
    let Some(arg) = arg else {
        return Ok(current);
    };
    if let Ok(n) = arg.trim().parse::<u32>() {
        return Ok(n);
    }
    let (language, dialect) = match arg.split_once(':') {
        Some((l, d)) => (l, Some(d)),
        None => (arg, None),
    };
    locale::code_for(language, dialect).ok_or_else(|| anyhow::anyhow!("Unknown language '{arg}'"))
}

/// Extract the cover image.
fn cmd_cover(path: &Path, output: &Path) -> anyhow::Result<()> {
    let container = open(path)?;
    let saved = mobimeta::export::cover::export_cover(&container, output)?;
    println!("  Saved cover to {}", saved.display());
    Ok(())
}

/// Print a preview of the text or export all of it.
fn cmd_text(
    path: &Path,
    output: Option<&Path>,
    chars: Option<usize>,
    config: &Config,
) -> anyhow::Result<()> {
    let container = open(path)?;
    if let Some(output) = output {
        let saved = mobimeta::export::text::export_text(&container, output)?;
        println!("  Saved text to {}", saved.display());
        return Ok(());
    }

    let limit = chars.unwrap_or(config.text.preview_chars);
    println!("{}", text::preview(&container.text_content(), limit));
    Ok(())
}
