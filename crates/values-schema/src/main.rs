use std::path::PathBuf;
use std::process::ExitCode;

use bpaf::Bpaf;
use tracing_subscriber::prelude::*;

use values_schema::{Mode, Options, Outcome, config};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version, fallback_to_usage, generate(cli))]
#[allow(clippy::upper_case_acronyms)]
/// Generate a JSON Schema for chart values from an annotated truth document
struct CLI {
    #[bpaf(external(global_options))]
    global: GlobalOptions,

    #[bpaf(external(commands))]
    command: Commands,
}

/// Global options applied to all commands
#[derive(Debug, Clone, Bpaf)]
struct GlobalOptions {
    /// Print what was written or checked
    #[bpaf(short('v'), long("verbose"), switch, fallback(false))]
    verbose: bool,

    /// The level of logging. In order, from the most verbose to the least verbose:
    /// debug, info, warn, error.
    #[bpaf(
        long("log-level"),
        argument("none|debug|info|warn|error"),
        fallback(LogLevel::None),
        display_fallback
    )]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Bpaf)]
#[allow(clippy::struct_excessive_bools)]
struct GenerateArgs {
    /// Path to a values-schema.toml config file
    #[bpaf(long("config"), argument("PATH"))]
    config: Option<PathBuf>,

    /// Truth document to read [default: values.truth.yaml]
    #[bpaf(short('i'), long("input"), argument("PATH"))]
    input: Option<PathBuf>,

    /// Schema file to write [default: values.schema.json]
    #[bpaf(short('o'), long("output"), argument("PATH"))]
    output: Option<PathBuf>,

    /// Derive `required` for nested objects, not only the top level
    #[bpaf(long("recursive-required"), switch)]
    recursive_required: bool,

    /// Indent the generated schema
    #[bpaf(long("pretty"), switch)]
    pretty: bool,

    /// Print the schema to stdout instead of writing it
    #[bpaf(long("stdout"), switch)]
    stdout: bool,

    /// Fail if the output file is missing or out of date; write nothing
    #[bpaf(long("check"), switch)]
    check: bool,
}

#[derive(Debug, Clone, Bpaf)]
enum Commands {
    #[bpaf(command("generate"))]
    /// Generate values.schema.json from values.truth.yaml
    Generate(#[bpaf(external(generate_args))] GenerateArgs),

    #[bpaf(command("config-schema"))]
    /// Print the JSON Schema for values-schema.toml
    ConfigSchema,

    #[bpaf(command("version"))]
    /// Print version information
    Version,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum LogLevel {
    #[default]
    None,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn directive(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Debug => Some("debug"),
            Self::Info => Some("info"),
            Self::Warn => Some("warn"),
            Self::Error => Some("error"),
        }
    }
}

impl core::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "expected 'none', 'debug', 'info', 'warn', or 'error', got '{s}'"
            )),
        }
    }
}

impl core::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.directive().unwrap_or("none"))
    }
}

/// Install the tracing subscriber. `VALUES_SCHEMA_LOG` wins over `--log-level`.
fn setup_tracing(level: LogLevel) {
    let (filter, explicit) = match tracing_subscriber::EnvFilter::try_from_env("VALUES_SCHEMA_LOG")
    {
        Ok(f) => (f, true),
        Err(_) => match level.directive() {
            Some(directive) => (tracing_subscriber::EnvFilter::new(directive), false),
            None => return,
        },
    };
    tracing_subscriber::registry()
        .with(
            tracing_tree::HierarchicalLayer::new(2)
                .with_targets(true)
                .with_bracketed_fields(true)
                .with_indent_lines(true)
                .with_verbose_exit(explicit)
                .with_verbose_entry(explicit)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn setup_miette() {
    let theme = if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        miette::GraphicalTheme::unicode()
    } else {
        miette::GraphicalTheme::unicode_nocolor()
    };
    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .context_lines(2)
                .graphical_theme(theme.clone())
                .build(),
        )
    }))
    .ok();
}

/// Merge CLI flags over the config file over built-in defaults.
fn resolve_options(args: &GenerateArgs) -> values_schema::Result<Options> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let file = config::load(args.config.as_deref(), &cwd)?;
    let defaults = Options::default();
    Ok(Options {
        input: args.input.clone().or(file.input).unwrap_or(defaults.input),
        output: args.output.clone().or(file.output).unwrap_or(defaults.output),
        recursive_required: args.recursive_required
            || file.recursive_required.unwrap_or(defaults.recursive_required),
        pretty: args.pretty || file.pretty.unwrap_or(defaults.pretty),
    })
}

fn generate(args: &GenerateArgs, verbose: bool) -> miette::Result<ExitCode> {
    let options = resolve_options(args)?;
    let mode = if args.check {
        Mode::Check
    } else if args.stdout {
        Mode::Print
    } else {
        Mode::Write
    };

    match values_schema::run(&options, mode)? {
        Outcome::Written(path) => {
            if verbose {
                eprintln!("wrote {}", path.display());
            }
        }
        Outcome::Printed(text) => print!("{text}"),
        Outcome::UpToDate => {
            if verbose {
                eprintln!("{} is up to date", options.output.display());
            }
        }
        Outcome::Stale => {
            eprintln!(
                "{} is out of date with {}; run `values-schema generate`",
                options.output.display(),
                options.input.display()
            );
            return Ok(ExitCode::from(1));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    setup_miette();
    let cli = cli().run();
    setup_tracing(cli.global.log_level);

    let result = match cli.command {
        Commands::Generate(args) => generate(&args, cli.global.verbose),
        Commands::ConfigSchema => {
            match serde_json::to_string_pretty(&config::schema()) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    return ExitCode::from(1);
                }
            }
            return ExitCode::SUCCESS;
        }
        Commands::Version => {
            println!("values-schema {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
    };

    match result {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(1)
        }
    }
}
