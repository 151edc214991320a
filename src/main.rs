use clap::{Parser, Subcommand};
use mdjsx_transpiler::generate::to_pascal_case;
use mdjsx_transpiler::{Error, Options, Pipeline, wrap_component};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "mdjsx")]
#[command(about = "mdjsx - Markdown with embedded JSX, compiled to components")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate JavaScript components from .md/.mdx files
    Generate {
        /// Path to a Markdown file or directory
        #[arg(required_unless_present = "stdin")]
        path: Option<PathBuf>,

        /// Read from stdin
        #[arg(long)]
        stdin: bool,

        /// Output `{ code, tags }` as JSON (stdin only)
        #[arg(long)]
        json: bool,

        /// Dump the parsed token stream as JSON (stdin only)
        #[arg(long)]
        tokens: bool,

        /// TOML file with renderer options
        #[arg(long)]
        config: Option<PathBuf>,

        /// Render soft line breaks as `br` elements
        #[arg(long)]
        breaks: bool,

        /// Class prefix for fenced code languages
        #[arg(long)]
        lang_prefix: Option<String>,

        /// Component name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
}

/// Settings shared by every generated file.
struct GenerateSettings {
    options: Options,
    name: Option<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { path, stdin, json, tokens, config, breaks, lang_prefix, name } => {
            load_options(config.as_deref(), breaks, lang_prefix).and_then(|options| {
                let settings = GenerateSettings { options, name };
                if stdin {
                    generate_stdin(&settings, json, tokens)
                } else if let Some(path) = path {
                    generate_path(&path, &settings)
                } else {
                    eprintln!("Error: provide a file/directory or use --stdin");
                    std::process::exit(1);
                }
            })
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Config file first, then command-line flags on top.
fn load_options(config: Option<&Path>, breaks: bool, lang_prefix: Option<String>) -> Result<Options, Error> {
    let mut options = match config {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    if breaks {
        options.breaks = true;
    }
    if let Some(prefix) = lang_prefix {
        options.lang_prefix = prefix;
    }
    // The component wrapper places the body inside `return [ ... ]`
    options.initial_indent = options.initial_indent.max(4);
    Ok(options)
}

fn generate_stdin(settings: &GenerateSettings, json: bool, tokens: bool) -> Result<(), Error> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .map_err(|e| Error::io("<stdin>", e))?;

    let pipeline = Pipeline::with_options(settings.options.clone());
    if tokens {
        println!("{}", serde_json::to_string_pretty(&pipeline.parse(&source))?);
        return Ok(());
    }

    let rendered = pipeline.compile(&source);
    if json {
        println!("{}", serde_json::to_string(&rendered)?);
    } else {
        let name = settings.name.as_deref().unwrap_or("Document");
        print!("{}", wrap_component(name, &rendered));
    }
    Ok(())
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md" || ext == "mdx")
}

fn generate_path(path: &Path, settings: &GenerateSettings) -> Result<(), Error> {
    if path.is_file() {
        if !is_markdown(path) {
            eprintln!("Error: {} is not a .md or .mdx file", path.display());
            std::process::exit(1);
        }
        let start = Instant::now();
        let pipeline = Pipeline::with_options(settings.options.clone());
        generate_file(&pipeline, path, settings.name.as_deref())?;
        print_summary(1, start.elapsed());
        Ok(())
    } else if path.is_dir() {
        generate_directory(path, settings)
    } else {
        eprintln!("Error: {} does not exist", path.display());
        std::process::exit(1);
    }
}

fn generate_directory(dir: &Path, settings: &GenerateSettings) -> Result<(), Error> {
    let start = Instant::now();
    let pipeline = Pipeline::with_options(settings.options.clone());

    // Directory -> (component name, module file name) generated in it
    let mut components_by_dir: BTreeMap<PathBuf, Vec<(String, String)>> = BTreeMap::new();
    let mut file_count = 0;

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_markdown(e.path()))
    {
        let path = entry.path();
        let (component, output) = generate_file(&pipeline, path, None)?;
        file_count += 1;

        if let (Some(parent), Some(module)) = (path.parent(), output.file_name()) {
            components_by_dir
                .entry(parent.to_path_buf())
                .or_default()
                .push((component, module.to_string_lossy().into_owned()));
        }
    }

    if file_count == 0 {
        eprintln!("No .md or .mdx files found in {}", dir.display());
        std::process::exit(1);
    }

    // index.js re-exporting every component of the directory
    for (dir_path, mut components) in components_by_dir {
        components.sort();
        let index_path = dir_path.join("index.js");
        let content: String = components
            .iter()
            .map(|(name, module)| format!("export {{ default as {name} }} from './{module}'\n"))
            .collect();
        fs::write(&index_path, content).map_err(|e| Error::io(&index_path, e))?;
        print_generated(&index_path.display().to_string());
    }

    print_summary(file_count, start.elapsed());
    Ok(())
}

/// Compile one file to a sibling `.js` module; returns (component name, output path).
fn generate_file(pipeline: &Pipeline, path: &Path, name: Option<&str>) -> Result<(String, PathBuf), Error> {
    let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Document");
    let name = to_pascal_case(name.unwrap_or(stem));

    let rendered = pipeline.compile(&source);
    log::debug!("{}: {} element bindings", path.display(), rendered.tags.len());

    let output = path.with_extension("js");
    fs::write(&output, wrap_component(&name, &rendered)).map_err(|e| Error::io(&output, e))?;
    print_generated(&output.display().to_string());

    Ok((name, output))
}

fn print_generated(path: &str) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("  \x1b[32m✓\x1b[0m {}", path);
    } else {
        eprintln!("  ✓ {}", path);
    }
}

fn print_summary(count: usize, elapsed: std::time::Duration) {
    let is_tty = io::stderr().is_terminal();
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };

    if is_tty {
        eprintln!("\n\x1b[1m✨ Generated {} {} in {}\x1b[0m", count, files_word, time_str);
    } else {
        eprintln!("\n✨ Generated {} {} in {}", count, files_word, time_str);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
