// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;

use locsync::app_config::{Config, LogLevel};
use locsync::content::ContentStore;
use locsync::errors::AppError;
use locsync::sync::events::{EventSink, SyncEvent};
use locsync::{locale_matches, DocumentRef, Locale, LocaleOrchestrator, SyncSummary, TranslationService};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a page or component into the site's secondary locales
    Translate(TranslateArgs),

    /// List the locales of the configured site
    Locales,

    /// Generate shell completions for locsync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false, id = "document")]
struct RootArgs {
    /// Page to translate
    #[arg(long, value_name = "PAGE_ID")]
    page: Option<String>,

    /// Component to translate
    #[arg(long, value_name = "COMPONENT_ID")]
    component: Option<String>,
}

impl RootArgs {
    fn document(&self) -> Option<DocumentRef> {
        match (&self.page, &self.component) {
            (Some(page), _) => Some(DocumentRef::Page(page.clone())),
            (None, Some(component)) => Some(DocumentRef::Component(component.clone())),
            (None, None) => None,
        }
    }
}

#[derive(Args, Debug)]
struct TranslateArgs {
    #[command(flatten)]
    root: RootArgs,

    /// Only sync these locales (e.g. 'fr', 'de-AT'); may be repeated
    #[arg(short = 'L', long = "locale", value_name = "TAG")]
    locales: Vec<String>,

    /// Print progress events as JSON lines instead of a progress bar
    #[arg(long)]
    json: bool,
}

/// locsync - localization sync for a remote CMS
///
/// Translates a page or component, including every component it references, into the
/// secondary locales of the configured site.
#[derive(Parser, Debug)]
#[command(name = "locsync")]
#[command(version)]
#[command(about = "Translate CMS content into every secondary locale of a site")]
#[command(long_about = "locsync walks a page or component of a remote content store, translates its text with an AI provider and writes the result into each secondary locale.

EXAMPLES:
    locsync translate --page home                    # Translate into every target locale
    locsync translate --component card -L fr -L de   # Only French and German
    locsync translate --page home --json             # Stream progress events as JSON lines
    locsync locales                                  # List the site's locales
    locsync completions bash > locsync.bash          # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. Secrets may be supplied through the
    LOCSYNC_STORE_TOKEN and LOCSYNC_API_KEY environment variables.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", env = "LOCSYNC_CONFIG", default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

/// Colored stderr logger with timestamps; filtering follows `log::max_level`
struct CustomLogger;

impl CustomLogger {
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();
    if let Some(level) = cli.log_level {
        log::set_max_level(LogLevel::from(level).into());
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "locsync", &mut std::io::stdout());
            Ok(())
        }
        Commands::Locales => {
            let config = load_config(&cli)?;
            list_locales(&config).await?;
            Ok(())
        }
        Commands::Translate(ref args) => {
            let config = load_config(&cli)?;
            let summary = run_translate(&config, args).await?;
            if summary.is_complete_success() {
                Ok(())
            } else {
                Err(anyhow!("{} of {} locales failed",
                            summary.failed.len(), summary.failed.len() + summary.completed.len()))
            }
        }
    }
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let (mut config, created) = Config::load_or_create(&cli.config_path)?;
    if created {
        warn!("Config file not found at '{}', created a default one; set site_id and store credentials.",
              cli.config_path.display());
    }

    match cli.log_level {
        Some(level) => config.log_level = level.into(),
        None => log::set_max_level(config.log_level.into()),
    }

    config.validate().map_err(|e| AppError::Config(e.to_string()))?;
    Ok(config)
}

async fn list_locales(config: &Config) -> Result<(), AppError> {
    let store = config.build_store().map_err(|e| AppError::Config(e.to_string()))?;
    let locales = store.get_locales(&config.site_id).await?;

    println!("{:<10} {:<24} {}", "TAG", "NAME", "STATUS");
    println!("{:<10} {:<24} {}", locales.primary.tag, locales.primary.display_name, "primary");
    for locale in &locales.secondary {
        let status = if locale.is_translation_target() { "target" } else { "localization disabled" };
        println!("{:<10} {:<24} {}", locale.tag, locale.display_name, status);
    }
    Ok(())
}

/// Keep the site's targets selected by `filters`; every target when no filter is given
fn select_targets(targets: Vec<Locale>, filters: &[String]) -> Vec<Locale> {
    if filters.is_empty() {
        return targets;
    }
    for filter in filters {
        if !targets.iter().any(|l| locale_matches(filter, &l.tag)) {
            warn!("Locale '{}' is not a translation target of this site, skipping", filter);
        }
    }
    targets
        .into_iter()
        .filter(|l| filters.iter().any(|f| locale_matches(f, &l.tag)))
        .collect()
}

async fn run_translate(config: &Config, args: &TranslateArgs) -> Result<SyncSummary, AppError> {
    let root = args
        .root
        .document()
        .ok_or_else(|| AppError::Config("--page or --component is required".to_string()))?;

    let store = config.build_store().map_err(|e| AppError::Config(e.to_string()))?;
    let service = TranslationService::new(config.build_backend(), config.translation_options());

    if let Err(e) = service.backend().test_connection().await {
        warn!("Translation backend check failed: {}", e);
    }

    let locales = store.get_locales(&config.site_id).await?;
    let targets = select_targets(locales.targets(), &args.locales);
    if targets.is_empty() {
        warn!("No target locales to sync");
    }

    info!("locsync: {} - {} ({} locales)",
          config.translation.provider.display_name(), config.translation.get_model(), targets.len());

    let (sender, receiver) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(report_events(receiver, targets.len(), args.json));

    let summary = {
        let orchestrator = LocaleOrchestrator::new(&store, &service, config.sync_options())
            .with_events(EventSink::new(sender));
        orchestrator.run(&root, &locales.primary, &targets).await
    };
    let _ = reporter.await;

    if !args.json {
        print_summary(&summary);
    }
    Ok(summary)
}

/// Render events as a progress bar, or as JSON lines on stdout
async fn report_events(mut receiver: mpsc::UnboundedReceiver<SyncEvent>, locale_count: usize, json: bool) {
    if json {
        let mut stdout = std::io::stdout();
        while let Some(event) = receiver.recv().await {
            if let Ok(line) = serde_json::to_string(&event) {
                let _ = writeln!(stdout, "{}", line);
            }
        }
        return;
    }

    let progress_bar = ProgressBar::new(locale_count as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} locales {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("#>-"));

    while let Some(event) = receiver.recv().await {
        match event {
            SyncEvent::LocaleStart { locale } => progress_bar.set_message(format!("{}: started", locale)),
            SyncEvent::Progress { locale, message } => {
                progress_bar.set_message(format!("{}: {}", locale.unwrap_or_default(), message));
            }
            SyncEvent::LocaleComplete(_) | SyncEvent::LocaleError(_) => progress_bar.inc(1),
            SyncEvent::Complete(_) => progress_bar.finish_and_clear(),
        }
    }
}

fn print_summary(summary: &SyncSummary) {
    for report in &summary.completed {
        info!("{}: {} nodes updated, {} corrected, {} untranslated",
              report.locale, report.stats.nodes_updated, report.stats.corrected, report.stats.untranslated);
    }
    for failure in &summary.failed {
        warn!("{}: failed: {}", failure.locale, failure.error);
    }
    info!("Done: {} nodes updated across {} locales, {} failed, {} outbound calls",
          summary.total_nodes, summary.completed.len(), summary.failed.len(), summary.total_calls);
}
