pub mod config;
pub mod fluid;
pub mod generator;
pub mod logging;
pub mod plugin;
pub mod properties;
pub mod rule;
pub mod scanner;

use crate::config::{ConfigError, FluidOptions};
use crate::plugin::{FluidSizePlugin, StylesheetRegistrar};
use crate::scanner::ScanError;
use globset::GlobSet;
use std::env;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{RecvTimeoutError, channel};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildOptions {
    pub inputs: Vec<String>,
    pub out: Option<String>,
    pub minify: bool,
    pub config: Option<String>,
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Build(BuildOptions),
    Watch {
        build: BuildOptions,
        poll: bool,
        poll_interval_ms: u64,
    },
    Classes {
        config: Option<String>,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CliError {
    pub message: String,
}

impl CliError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<ScanError> for CliError {
    fn from(err: ScanError) -> Self {
        Self::new(err.to_string())
    }
}

pub fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Build(options) => run_build(&options),
        Command::Watch {
            build,
            poll,
            poll_interval_ms,
        } => run_watch(&build, poll, poll_interval_ms),
        Command::Classes { config } => run_classes(config.as_deref()),
        Command::Help => {
            print_help();
            Ok(())
        }
    }
}

pub fn run_from_env() -> Result<(), CliError> {
    let (verbosity, args) = split_verbosity(env::args().skip(1));
    logging::init_logging(&logging::LogConfig {
        with_ansi: io::stderr().is_terminal(),
        ..logging::LogConfig::from_verbosity(verbosity)
    });
    let command = parse_args(args)?;
    run(command)
}

/// Pulls `-v`/`--verbose` flags out of the argument list so every command
/// accepts them in any position.
pub fn split_verbosity<I>(args: I) -> (u8, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    let mut verbosity = 0u8;
    let mut rest = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-v" | "--verbose" => verbosity = verbosity.saturating_add(1),
            "-vv" => verbosity = verbosity.saturating_add(2),
            _ => rest.push(arg),
        }
    }
    (verbosity, rest)
}

pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut iter = args.into_iter();
    let Some(cmd) = iter.next() else {
        return Ok(Command::Help);
    };

    match cmd.as_str() {
        "build" => parse_build_args(iter.collect()),
        "watch" => parse_watch_args(iter.collect()),
        "classes" => parse_classes_args(iter.collect()),
        "-h" | "--help" | "help" => Ok(Command::Help),
        _ => Err(CliError::new(format!("unknown command: {}", cmd))),
    }
}

fn parse_build_args(args: Vec<String>) -> Result<Command, CliError> {
    let mut options = BuildOptions::default();
    let mut idx = 0;

    while idx < args.len() {
        if parse_shared_build_flag(&args, &mut idx, &mut options, "build")? {
            idx += 1;
            continue;
        }
        match args[idx].as_str() {
            "--poll" | "--poll-interval" => {
                return Err(CliError::new(format!(
                    "{} is only supported with watch",
                    args[idx]
                )));
            }
            value => options.inputs.push(value.to_string()),
        }
        idx += 1;
    }

    Ok(Command::Build(options))
}

fn parse_watch_args(args: Vec<String>) -> Result<Command, CliError> {
    let mut options = BuildOptions::default();
    let mut poll = false;
    let mut poll_interval_ms = 500;
    let mut idx = 0;

    while idx < args.len() {
        if parse_shared_build_flag(&args, &mut idx, &mut options, "watch")? {
            idx += 1;
            continue;
        }
        match args[idx].as_str() {
            "--poll" => {
                poll = true;
            }
            "--poll-interval" => {
                let value = take_value(&args, &mut idx, "watch", "--poll-interval")?;
                poll = true;
                poll_interval_ms = parse_u64_arg(&value, "--poll-interval")?;
            }
            value => options.inputs.push(value.to_string()),
        }
        idx += 1;
    }

    Ok(Command::Watch {
        build: options,
        poll,
        poll_interval_ms,
    })
}

fn parse_classes_args(args: Vec<String>) -> Result<Command, CliError> {
    let mut config = None;
    let mut idx = 0;

    while idx < args.len() {
        match args[idx].as_str() {
            "--config" | "-c" => {
                config = Some(take_value(&args, &mut idx, "classes", "--config")?);
            }
            value => {
                return Err(CliError::new(format!(
                    "classes does not accept argument '{}'",
                    value
                )));
            }
        }
        idx += 1;
    }

    Ok(Command::Classes { config })
}

// Returns true when `args[idx]` was one of the flags shared by build and watch.
fn parse_shared_build_flag(
    args: &[String],
    idx: &mut usize,
    options: &mut BuildOptions,
    command: &str,
) -> Result<bool, CliError> {
    match args[*idx].as_str() {
        "--out" | "--output" | "-o" => {
            options.out = Some(take_value(args, idx, command, "--output")?);
        }
        "--config" | "-c" => {
            options.config = Some(take_value(args, idx, command, "--config")?);
        }
        "--ignore" | "-I" => {
            options.ignore.push(take_value(args, idx, command, "--ignore")?);
        }
        "--minify" => {
            options.minify = true;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn take_value(
    args: &[String],
    idx: &mut usize,
    command: &str,
    flag: &str,
) -> Result<String, CliError> {
    *idx += 1;
    args.get(*idx)
        .cloned()
        .ok_or_else(|| CliError::new(format!("{} requires a value for {}", command, flag)))
}

fn parse_u64_arg(value: &str, flag: &str) -> Result<u64, CliError> {
    value.parse::<u64>().map_err(|_| {
        CliError::new(format!(
            "{} requires a positive integer, got '{}'",
            flag, value
        ))
    })
}

fn load_options(config_path: Option<&str>) -> Result<FluidOptions, CliError> {
    if let Some(path) = config_path {
        return Ok(config::load(Path::new(path))?);
    }

    let default_path = Path::new(config::DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        return Ok(config::load(default_path)?);
    }

    warn!(
        "no --config given and {} not found; generating from defaults",
        config::DEFAULT_CONFIG_FILE
    );
    Ok(FluidOptions::default())
}

fn run_build(options: &BuildOptions) -> Result<(), CliError> {
    let plugin = FluidSizePlugin::new(load_options(options.config.as_deref())?);
    let mut registrar = StylesheetRegistrar::new(options.minify);

    if !options.inputs.is_empty() {
        let mut effective_ignore = options.ignore.clone();
        if let Some(out_path) = options.out.as_ref() {
            effective_ignore.push(out_path.clone());
        }
        let scan = scanner::scan_globs_with_ignore(&options.inputs, &effective_ignore)?;
        let used = scan.utility_names();
        info!(
            files = scan.files_scanned,
            candidates = used.len(),
            "scanned content"
        );
        registrar = registrar.with_used_classes(used);
    }

    plugin.register(&mut registrar);
    let generation = registrar.finish();
    let utility_css = generator::emit_css(&generation);
    let header = build_header();

    let css = if utility_css.is_empty() {
        format!("{}\n", header)
    } else if options.minify {
        format!("{}{}", header, utility_css)
    } else {
        format!("{}\n{}\n", header, utility_css)
    };

    if let Some(out_path) = options.out.as_ref() {
        if let Some(parent) = Path::new(out_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    CliError::new(format!("failed to create {}: {}", parent.display(), err))
                })?;
            }
        }
        fs::write(out_path, css)
            .map_err(|err| CliError::new(format!("failed to write output {}: {}", out_path, err)))?;
        info!(rules = generation.rule_count, output = %out_path, "wrote fluid utilities");
    } else {
        print!("{}", css);
        info!(rules = generation.rule_count, "generated fluid utilities");
    }

    Ok(())
}

fn run_classes(config_path: Option<&str>) -> Result<(), CliError> {
    let plugin = FluidSizePlugin::new(load_options(config_path)?);
    let mut registrar = StylesheetRegistrar::new(false);
    plugin.register(&mut registrar);

    for class in registrar.class_names() {
        println!("{}", class);
    }

    Ok(())
}

fn print_help() {
    println!("fluidsize");
    println!();
    println!("USAGE:");
    println!(
        "  fluidsize build [--config <path>] [--output <path>] [--minify] [--ignore <glob>] [<content glob>...]"
    );
    println!(
        "  fluidsize watch [--config <path>] [--output <path>] [--minify] [--ignore <glob>] [--poll] [--poll-interval <ms>] [<content glob>...]"
    );
    println!("  fluidsize classes [--config <path>]");
    println!();
    println!("  -v, --verbose    raise log level (repeatable); RUST_LOG overrides");
    println!();
    println!("EXAMPLES:");
    println!("  fluidsize build -c fluidsize.toml -o dist/fluid.css");
    println!("  fluidsize build -c fluidsize.json --minify \"src/**/*.{{html,tsx}}\"");
    println!("  fluidsize watch --poll --poll-interval 250 -o dist/fluid.css \"src/**/*.html\"");
    println!("  fluidsize classes -c fluidsize.toml");
}

fn build_header() -> String {
    "/*! fluidsize | MIT License */".to_string()
}

fn run_watch(options: &BuildOptions, poll: bool, poll_interval_ms: u64) -> Result<(), CliError> {
    run_build(options)?;

    let (tx, rx) = channel();
    let ignore_set = scanner::build_globset(&options.ignore).ok();
    let out_path = options.out.as_ref().and_then(|path| fs::canonicalize(path).ok());
    let mut watcher: Box<dyn notify::Watcher> = if poll {
        Box::new(
            notify::PollWatcher::new(
                tx,
                notify::Config::default().with_poll_interval(Duration::from_millis(poll_interval_ms)),
            )
            .map_err(|err| CliError::new(format!("failed to start poll watcher: {}", err)))?,
        )
    } else {
        Box::new(
            notify::recommended_watcher(tx)
                .map_err(|err| CliError::new(format!("failed to start watcher: {}", err)))?,
        )
    };

    let config_path = options
        .config
        .as_deref()
        .unwrap_or(config::DEFAULT_CONFIG_FILE);
    for root in watch_roots(&options.inputs, config_path) {
        watcher
            .watch(&root, notify::RecursiveMode::Recursive)
            .map_err(|err| CliError::new(format!("failed to watch {}: {}", root.display(), err)))?;
    }

    if poll {
        info!("watching for changes (polling, press Ctrl+C to stop)");
    } else {
        info!("watching for changes (press Ctrl+C to stop)");
    }

    let mut debounce = Debounce::new(WATCH_DEBOUNCE);
    loop {
        match rx.recv_timeout(WATCH_DEBOUNCE) {
            Ok(Ok(event)) => {
                if !should_ignore_event(&event, ignore_set.as_ref(), out_path.as_deref()) {
                    debounce.record(Instant::now());
                }
            }
            Ok(Err(err)) => warn!(error = %err, "watch error"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if debounce.take_ready(Instant::now()) {
            info!("change detected, rebuilding");
            if let Err(err) = run_build(options) {
                warn!(error = %err, "build failed");
            }
        }
    }

    Ok(())
}

const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// Coalesces bursts of change events: a rebuild fires once no event has
/// arrived for `quiet`.
#[derive(Debug, Clone, Copy)]
struct Debounce {
    quiet: Duration,
    last_change: Option<Instant>,
}

impl Debounce {
    fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            last_change: None,
        }
    }

    fn record(&mut self, at: Instant) {
        self.last_change = Some(at);
    }

    fn take_ready(&mut self, now: Instant) -> bool {
        match self.last_change {
            Some(last) if now.saturating_duration_since(last) >= self.quiet => {
                self.last_change = None;
                true
            }
            _ => false,
        }
    }
}

fn watch_roots(patterns: &[String], config_path: &str) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for pattern in patterns.iter().map(String::as_str).chain([config_path]) {
        let root = glob_root(pattern);
        let normalized = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root
        };
        if seen.insert(normalized.clone()) {
            roots.push(normalized);
        }
    }

    roots
}

fn glob_root(pattern: &str) -> PathBuf {
    let first_meta = pattern
        .char_indices()
        .find(|(_, ch)| matches!(ch, '*' | '?' | '[' | '{'))
        .map(|(idx, _)| idx);

    let Some(first_meta) = first_meta else {
        if pattern.ends_with('/') || pattern.ends_with('\\') {
            return PathBuf::from(pattern);
        }
        let path = Path::new(pattern);
        if path.extension().is_some() {
            return path.parent().unwrap_or(Path::new(".")).to_path_buf();
        }
        return path.to_path_buf();
    };

    let prefix = &pattern[..first_meta];
    match prefix.rfind(['/', '\\']) {
        Some(idx) => PathBuf::from(&prefix[..=idx]),
        None => PathBuf::from("."),
    }
}

fn should_ignore_event(
    event: &notify::Event,
    ignore_set: Option<&GlobSet>,
    out_path: Option<&Path>,
) -> bool {
    if event.paths.is_empty() {
        return false;
    }
    event.paths.iter().all(|path| {
        ignore_set.is_some_and(|set| set.is_match(path))
            || out_path.is_some_and(|out| fs::canonicalize(path).is_ok_and(|p| p.as_path() == out))
    })
}
