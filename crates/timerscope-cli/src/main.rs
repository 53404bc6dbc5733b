//! timerscope - Render BS Timer profiling trace files
//!
//! This tool decodes `.bs.timer` files and writes one chart or report per
//! recorded channel into an output directory.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use timerscope_core::{
    artifact_file_name, decode_file, ChannelRenderer, ReportConfig, ReportRenderer, SvgConfig,
    SvgRenderer, TimeUnit, TIMER_FILE_EXTENSION,
};
use tracing::{debug, error, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Render per-channel charts and reports from BS Timer trace files
#[derive(Parser, Debug)]
#[command(name = "timerscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Output directory for rendered artifacts
    #[arg(short, long, default_value = ".", env = "TIMERSCOPE_OUTPUT")]
    output: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "svg")]
    format: OutputFormat,

    /// Unit runtimes are displayed in
    #[arg(long, value_enum, default_value = "sec")]
    unit: Unit,

    /// Dry run - don't write files, just show what would be rendered
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing files without prompting
    #[arg(long)]
    force: bool,

    /// Only list channel names without rendering
    #[arg(long)]
    list_only: bool,

    /// How to name a channel already rendered from another timer file
    #[arg(long, value_enum, default_value = "rename")]
    on_collision: Collision,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single .bs.timer file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory searched recursively for .bs.timer files
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Output format for rendered channels
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// SVG chart per channel
    Svg,
    /// Plain-text summary per channel
    Report,
    /// Just the channel names (for scripting)
    Names,
}

/// Runtime display unit
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Unit {
    /// Seconds
    Sec,
    /// Milliseconds
    Msec,
    /// Microseconds
    Usec,
    /// Nanoseconds
    Nsec,
}

impl From<Unit> for TimeUnit {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Sec => TimeUnit::Seconds,
            Unit::Msec => TimeUnit::Milliseconds,
            Unit::Usec => TimeUnit::Microseconds,
            Unit::Nsec => TimeUnit::Nanoseconds,
        }
    }
}

/// What to do when two channels map to the same artifact file name
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Collision {
    /// Tag the later artifact with its run: forward~run2.svg
    Rename,
    /// Keep the first artifact, drop later ones
    Skip,
}

/// Artifact file names handed out during one invocation.
///
/// Channel names are unique within a timer file, so collisions come from
/// several runs in one directory recording the same channel.
#[derive(Default)]
struct OutputNames {
    /// Claimed file name -> timer file it was rendered from
    claimed: HashMap<String, PathBuf>,
    renamed: usize,
    skipped: usize,
}

impl OutputNames {
    fn new() -> Self {
        Self::default()
    }

    /// Claims `file_name` for a channel of `source`, or a run-tagged variant
    /// of it when the name is taken. `None` means the channel is skipped.
    fn claim(
        &mut self,
        file_name: String,
        source: &Path,
        on_collision: Collision,
    ) -> Option<String> {
        let Some(owner) = self.claimed.get(&file_name) else {
            self.claimed.insert(file_name.clone(), source.to_path_buf());
            return Some(file_name);
        };

        if let Collision::Skip = on_collision {
            warn!(
                "{} from {} collides with {}, skipping",
                file_name,
                source.display(),
                owner.display()
            );
            self.skipped += 1;
            return None;
        }

        let tagged = insert_before_extension(&file_name, &format!("~{}", run_name(source)));
        let mut resolved = tagged.clone();
        let mut n = 2;
        while self.claimed.contains_key(&resolved) {
            resolved = insert_before_extension(&tagged, &format!("-{}", n));
            n += 1;
        }

        info!(
            "{} already rendered from {}; writing {} instead",
            file_name,
            owner.display(),
            resolved
        );
        self.claimed.insert(resolved.clone(), source.to_path_buf());
        self.renamed += 1;
        Some(resolved)
    }
}

/// Run name of a timer file: its file name without `.bs.timer`
fn run_name(source: &Path) -> &str {
    source
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.strip_suffix(TIMER_FILE_EXTENSION).unwrap_or(n))
        .unwrap_or("unknown")
}

/// Inserts `tag` between a file name's stem and its extension
fn insert_before_extension(file_name: &str, tag: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}{}.{}", stem, tag, ext),
        _ => format!("{}{}", file_name, tag),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let renderer = build_renderer(&cli);

    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, renderer.as_ref(), file)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, renderer.as_ref(), directory)
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

/// Pick the renderer for the requested output format
fn build_renderer(cli: &Cli) -> Box<dyn ChannelRenderer> {
    let unit = TimeUnit::from(cli.unit);
    match cli.format {
        OutputFormat::Report => Box::new(ReportRenderer::with_config(
            ReportConfig::new().time_unit(unit),
        )),
        OutputFormat::Svg | OutputFormat::Names => {
            Box::new(SvgRenderer::with_config(SvgConfig::new().time_unit(unit)))
        }
    }
}

/// Returns true if the path names a timer file
fn is_timer_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.len() > TIMER_FILE_EXTENSION.len() && n.ends_with(TIMER_FILE_EXTENSION))
        .unwrap_or(false)
}

/// Process a single timer file
fn process_single_file(cli: &Cli, renderer: &dyn ChannelRenderer, file: &Path) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }
    if !is_timer_file(file) {
        bail!(
            "Unsupported input file: {} (expected a '{}' file)",
            file.display(),
            TIMER_FILE_EXTENSION
        );
    }

    let mut names = OutputNames::new();
    let written = process_timer_file(cli, renderer, file, &mut names)?;

    if !cli.list_only && !cli.dry_run {
        info!("Wrote {} artifact(s) from {}", written, file.display());
    }

    Ok(())
}

/// Process a directory of timer files recursively.
///
/// A file that fails is reported and the walk continues; the run as a whole
/// fails if any file did.
fn process_directory(cli: &Cli, renderer: &dyn ChannelRenderer, directory: &Path) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut names = OutputNames::new();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut written = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        if !is_timer_file(path) {
            trace!("Skipping non-timer file: {}", path.display());
            continue;
        }

        debug!("Processing timer file: {}", path.display());
        match process_timer_file(cli, renderer, path, &mut names) {
            Ok(count) => {
                succeeded += 1;
                written += count;
            }
            Err(e) => {
                error!("Error processing {}: {:#}", path.display(), e);
                failed += 1;
            }
        }
    }

    info!(
        "Processed {} timer file(s), {} failed",
        succeeded + failed,
        failed
    );

    if !cli.list_only && !cli.dry_run {
        info!(
            "Summary: {} written, {} renamed, {} skipped",
            written, names.renamed, names.skipped
        );
    }

    if failed > 0 {
        bail!(
            "{} of {} timer file(s) in {} failed",
            failed,
            succeeded + failed,
            directory.display()
        );
    }

    Ok(())
}

/// Decode a timer file and render its channels.
///
/// Returns the number of artifacts written. Every channel is attempted; any
/// write failure fails the file afterwards.
fn process_timer_file(
    cli: &Cli,
    renderer: &dyn ChannelRenderer,
    path: &Path,
    names: &mut OutputNames,
) -> Result<usize> {
    let channels = decode_file(path)
        .with_context(|| format!("Failed to decode timer file: {}", path.display()))?;

    debug!("Decoded {} channel(s) from {}", channels.len(), path.display());

    let mut written = 0;
    let mut failures = 0;

    for channel in &channels {
        if cli.list_only || matches!(cli.format, OutputFormat::Names) {
            println!("{}", channel.name());
            continue;
        }

        let file_name = match artifact_file_name(channel.name(), renderer.extension()) {
            Ok(name) => name,
            Err(e) => {
                warn!("Skipping channel from {}: {}", path.display(), e);
                continue;
            }
        };

        let Some(file_name) = names.claim(file_name, path, cli.on_collision) else {
            continue;
        };
        let output_path = cli.output.join(file_name);

        let content = renderer
            .render(channel)
            .with_context(|| format!("Failed to render channel '{}'", channel.name()))?;

        if cli.dry_run {
            println!("Would write: {}", output_path.display());
            if cli.verbose > 0 {
                println!("---");
                println!("{}", content);
                println!("---");
            }
            continue;
        }

        match write_artifact(&output_path, &content, cli.force) {
            Ok(()) => {
                println!("Wrote {}", output_path.display());
                written += 1;
            }
            Err(e) => {
                error!("{:#}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!(
            "{} of {} artifact(s) from {} could not be written",
            failures,
            failures + written,
            path.display()
        );
    }

    Ok(written)
}

/// Write an artifact to disk
fn write_artifact(output_path: &Path, content: &str, force: bool) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if output_path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            output_path.display()
        );
    }

    let mut file = fs::File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use timerscope_core::{encode_to_file, Channel, Series};

    fn cli_for(output: &Path, format: OutputFormat) -> Cli {
        Cli {
            input: InputMode {
                file: None,
                directory: None,
            },
            output: output.to_path_buf(),
            verbose: 0,
            format,
            unit: Unit::Sec,
            dry_run: false,
            force: false,
            list_only: false,
            on_collision: Collision::Rename,
        }
    }

    fn sample_channels() -> Vec<Channel> {
        vec![
            Channel::new("forward", Series::from_values(vec![1.0, 2.0, 3.0])),
            Channel::new("backward", Series::from_values(vec![0.5]))
                .with_bandwidths(Series::from_values(vec![1e9]))
                .unwrap(),
        ]
    }

    #[test]
    fn test_output_names_first_claim_is_unchanged() {
        let mut names = OutputNames::new();
        let source = Path::new("/runs/run1.bs.timer");

        let claimed = names.claim("forward.svg".to_string(), source, Collision::Rename);
        assert_eq!(claimed.as_deref(), Some("forward.svg"));

        let other = names.claim("backward.svg".to_string(), source, Collision::Rename);
        assert_eq!(other.as_deref(), Some("backward.svg"));
        assert_eq!(names.renamed, 0);
    }

    #[test]
    fn test_output_names_tag_collisions_with_run() {
        let mut names = OutputNames::new();
        let run1 = Path::new("/runs/a/run1.bs.timer");
        let run2 = Path::new("/runs/a/run2.bs.timer");
        let run2_elsewhere = Path::new("/runs/b/run2.bs.timer");

        names.claim("forward.svg".to_string(), run1, Collision::Rename);
        let second = names.claim("forward.svg".to_string(), run2, Collision::Rename);
        let third = names.claim("forward.svg".to_string(), run2_elsewhere, Collision::Rename);

        assert_eq!(second.as_deref(), Some("forward~run2.svg"));
        assert_eq!(third.as_deref(), Some("forward~run2-2.svg"));
        assert_eq!(names.renamed, 2);
    }

    #[test]
    fn test_output_names_skip_keeps_first() {
        let mut names = OutputNames::new();
        let run1 = Path::new("run1.bs.timer");
        let run2 = Path::new("run2.bs.timer");

        names.claim("forward.txt".to_string(), run1, Collision::Skip);
        let skipped = names.claim("forward.txt".to_string(), run2, Collision::Skip);

        assert!(skipped.is_none());
        assert_eq!(names.skipped, 1);
        assert_eq!(names.claimed["forward.txt"], PathBuf::from("run1.bs.timer"));
    }

    #[test]
    fn test_insert_before_extension() {
        assert_eq!(insert_before_extension("kernel.svg", "~run1"), "kernel~run1.svg");
        assert_eq!(
            insert_before_extension("ns::step.v2.txt", "~run1"),
            "ns::step.v2~run1.txt"
        );
        assert_eq!(insert_before_extension("noext", "~run1"), "noext~run1");
    }

    #[test]
    fn test_run_name() {
        assert_eq!(run_name(Path::new("/tmp/run1.bs.timer")), "run1");
        assert_eq!(run_name(Path::new("/tmp/other.dat")), "other.dat");
    }

    #[test]
    fn test_is_timer_file() {
        assert!(is_timer_file(Path::new("/tmp/run.bs.timer")));
        assert!(!is_timer_file(Path::new("/tmp/run.timer")));
        assert!(!is_timer_file(Path::new("/tmp/run.bs.timer.bak")));
        assert!(!is_timer_file(Path::new("/tmp/.bs.timer")));
    }

    #[test]
    fn test_process_timer_file_writes_artifacts() {
        let input_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let input = input_dir.path().join("run.bs.timer");
        encode_to_file(&input, &sample_channels()).unwrap();

        let cli = cli_for(output_dir.path(), OutputFormat::Svg);
        let renderer = build_renderer(&cli);
        let mut names = OutputNames::new();
        let written = process_timer_file(&cli, renderer.as_ref(), &input, &mut names).unwrap();

        assert_eq!(written, 2);
        let svg = fs::read_to_string(output_dir.path().join("forward.svg")).unwrap();
        assert!(svg.contains("forward"));
        assert!(output_dir.path().join("backward.svg").exists());
    }

    #[test]
    fn test_process_timer_file_reports() {
        let input_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let input = input_dir.path().join("run.bs.timer");
        encode_to_file(&input, &sample_channels()).unwrap();

        let cli = cli_for(output_dir.path(), OutputFormat::Report);
        let renderer = build_renderer(&cli);
        let mut names = OutputNames::new();
        process_timer_file(&cli, renderer.as_ref(), &input, &mut names).unwrap();

        let report = fs::read_to_string(output_dir.path().join("backward.txt")).unwrap();
        assert!(report.contains("Average Bandwidth"));
    }

    #[test]
    fn test_process_timer_file_rejects_truncated_input() {
        let input_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let input = input_dir.path().join("broken.bs.timer");
        fs::write(&input, [2u8, 0, 0, 0, 1]).unwrap();

        let cli = cli_for(output_dir.path(), OutputFormat::Svg);
        let renderer = build_renderer(&cli);
        let mut names = OutputNames::new();
        let err = process_timer_file(&cli, renderer.as_ref(), &input, &mut names).unwrap_err();

        assert!(format!("{:#}", err).contains("truncated input"));
        assert!(names.claimed.is_empty());
    }

    #[test]
    fn test_rerun_without_force_fails_and_keeps_existing() {
        let input_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let input = input_dir.path().join("run.bs.timer");
        encode_to_file(&input, &sample_channels()).unwrap();
        let artifact = output_dir.path().join("forward.svg");

        let mut cli = cli_for(output_dir.path(), OutputFormat::Svg);
        let renderer = build_renderer(&cli);
        process_single_file(&cli, renderer.as_ref(), &input).unwrap();
        fs::write(&artifact, "stale").unwrap();

        let err = process_single_file(&cli, renderer.as_ref(), &input).unwrap_err();
        assert!(format!("{:#}", err).contains("2 of 2 artifact(s)"));
        assert_eq!(fs::read_to_string(&artifact).unwrap(), "stale");

        cli.force = true;
        process_single_file(&cli, renderer.as_ref(), &input).unwrap();
        assert!(fs::read_to_string(&artifact).unwrap().contains("<svg"));
    }

    #[test]
    fn test_process_directory_renames_shared_channels() {
        let input_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        encode_to_file(input_dir.path().join("run1.bs.timer"), &sample_channels()).unwrap();
        encode_to_file(input_dir.path().join("run2.bs.timer"), &sample_channels()).unwrap();
        fs::write(input_dir.path().join("notes.txt"), "not a timer file").unwrap();

        let cli = cli_for(output_dir.path(), OutputFormat::Report);
        let renderer = build_renderer(&cli);
        process_directory(&cli, renderer.as_ref(), input_dir.path()).unwrap();

        let mut written: Vec<String> = fs::read_dir(output_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        written.sort();
        assert_eq!(
            written,
            ["backward.txt", "backward~run2.txt", "forward.txt", "forward~run2.txt"]
        );
    }

    #[test]
    fn test_process_directory_fails_when_a_file_fails() {
        let input_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        fs::write(input_dir.path().join("a-broken.bs.timer"), [1u8, 0, 0]).unwrap();
        encode_to_file(input_dir.path().join("b-good.bs.timer"), &sample_channels()).unwrap();

        let cli = cli_for(output_dir.path(), OutputFormat::Svg);
        let renderer = build_renderer(&cli);
        let err = process_directory(&cli, renderer.as_ref(), input_dir.path()).unwrap_err();

        assert!(err.to_string().contains("1 of 2 timer file(s)"));
        assert!(output_dir.path().join("forward.svg").exists());
    }

    #[test]
    fn test_write_artifact_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("k.svg");

        write_artifact(&path, "first", false).unwrap();
        assert!(write_artifact(&path, "second", false).is_err());
        write_artifact(&path, "second", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
