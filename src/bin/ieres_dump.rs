use anyhow::{Context, Result, bail, format_err};
use clap::{Arg, ArgAction, ArgMatches, Command};
use dialoguer::Confirm;
use indoc::indoc;
use log::{Level, LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use ieres::{FormatRegistry, ParserSettings, ReadSeek};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    fn describe(&self) -> String {
        match self {
            Input::Stdin => "<stdin>".to_owned(),
            Input::File(path) => path.display().to_string(),
        }
    }

    /// Decoding needs to seek, so stdin is buffered into memory first.
    fn open(&self) -> Result<Box<dyn ReadSeek>> {
        match self {
            Input::Stdin => {
                let mut buf = Vec::new();
                io::stdin()
                    .lock()
                    .read_to_end(&mut buf)
                    .context("failed to read resource from stdin")?;
                Ok(Box::new(Cursor::new(buf)))
            }
            Input::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open file `{}`", path.display()))?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

struct IeresDump {
    settings: ParserSettings,
    input: Input,
    output_target: Option<PathBuf>,
    confirm_overwrite: bool,
    identify_only: bool,
    verbosity_level: Option<Level>,
}

impl IeresDump {
    pub fn from_cli_matches(matches: &ArgMatches) -> Result<Self> {
        let input = match matches
            .get_one::<String>("INPUT")
            .map(String::as_str)
            .expect("This is a required argument")
        {
            "-" => Input::Stdin,
            path => Input::File(PathBuf::from(path)),
        };

        let verbosity_level = match matches.get_count("verbose") {
            0 => None,
            1 => Some(Level::Info),
            2 => Some(Level::Debug),
            3 => Some(Level::Trace),
            _ => {
                eprintln!("using more than  -vvv does not affect verbosity level");
                Some(Level::Trace)
            }
        };

        Ok(IeresDump {
            settings: ParserSettings::new().indent(!matches.get_flag("no-indent")),
            input,
            output_target: matches.get_one::<String>("output-target").map(PathBuf::from),
            confirm_overwrite: !matches.get_flag("no-confirm-overwrite"),
            identify_only: matches.get_flag("identify"),
            verbosity_level,
        })
    }

    /// Main entry point for `IeresDump`
    pub fn run(&self) -> Result<()> {
        self.try_to_initialize_logging();

        let registry = FormatRegistry::with_builtin_formats();

        if self.identify_only {
            let mut stream = self.input.open()?;
            let format = registry
                .sniff(&mut *stream)
                .ok_or_else(|| format_err!("`{}` is not a recognized resource", self.input.describe()))?;
            let mut output = self.output()?;
            writeln!(output, "{}", format.name())?;
            output.flush()?;
            return Ok(());
        }

        let resource = match &self.input {
            Input::File(path) => registry.open_path(path),
            Input::Stdin => registry.open(&mut *self.input.open()?),
        }
        .with_context(|| format!("failed to decode `{}`", self.input.describe()))?;
        info!(
            "Decoded `{}` as {}",
            self.input.describe(),
            resource.format_name()
        );

        let mut output = self.output()?;
        resource
            .write_json(&mut output, &self.settings)
            .context("failed to write output")?;
        output.flush()?;

        Ok(())
    }

    fn output(&self) -> Result<Box<dyn Write>> {
        match &self.output_target {
            Some(path) => {
                let file = Self::create_output_file(path, self.confirm_overwrite).with_context(|| {
                    format!(
                        "An error occurred while creating output file at `{}`",
                        path.display()
                    )
                })?;
                Ok(Box::new(BufWriter::new(file)))
            }
            None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
        }
    }

    /// If `prompt` is passed, will display a confirmation prompt before overwriting files.
    fn create_output_file(path: impl AsRef<Path>, prompt: bool) -> Result<File> {
        let p = path.as_ref();

        if p.is_dir() {
            bail!(
                "There is a directory at {}, refusing to overwrite",
                p.display()
            );
        }

        if p.exists() {
            if prompt {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to override output file at {}",
                        p.display()
                    ))
                    .default(false)
                    .interact()
                    .context("Failed to write confirmation prompt to term")?;

                if !confirmed {
                    bail!("Cancelled");
                }
            }
            return Ok(File::create(p)?);
        }

        // Ok to assume p is not an existing directory
        match p.parent() {
            Some(parent) => {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
                Ok(File::create(p)?)
            }
            None => bail!("Output file cannot be root."),
        }
    }

    fn try_to_initialize_logging(&self) {
        if let Some(level) = self.verbosity_level {
            if let Err(e) = TermLogger::init(
                level.to_level_filter(),
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ) {
                eprintln!("Failed to initialize logging: {}", e);
            }
        } else {
            log::set_max_level(LevelFilter::Off);
        }
    }
}

fn command() -> Command {
    Command::new("ieres_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility to decode Infinity Engine resources into JSON")
        .long_about(indoc!(r#"
            Utility to decode Infinity Engine resources into JSON.

            The resource format is detected from the first 8 bytes of the input.
            Currently supported: WED (`WED V1.3`).
        "#))
        .arg(
            Arg::new("INPUT")
                .required(true)
                .help("Resource file to decode, or `-` to read it from stdin."),
        )
        .arg(
            Arg::new("output-target")
                .long("output")
                .short('f')
                .value_name("FILE")
                .help("Writes output to the file specified instead of stdout, errors will still be printed to stderr. \
                       Will ask for confirmation before overwriting files, to allow overwriting, pass `--no-confirm-overwrite`. \
                       Will create parent directories if needed."),
        )
        .arg(
            Arg::new("no-confirm-overwrite")
                .long("no-confirm-overwrite")
                .action(ArgAction::SetTrue)
                .help("When set, will not ask for confirmation before overwriting files, useful for automation"),
        )
        .arg(
            Arg::new("no-indent")
                .long("no-indent")
                .action(ArgAction::SetTrue)
                .help("When set, output will not be indented."),
        )
        .arg(
            Arg::new("identify")
                .long("identify")
                .action(ArgAction::SetTrue)
                .help("Only print the name of the detected resource format."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("-v - info, -vv - debug, -vvv - trace."),
        )
}

fn main() {
    let matches = command().get_matches();

    let result = IeresDump::from_cli_matches(&matches).and_then(|app| app.run());
    if let Err(e) = result {
        eprintln!("{:?}", e);
        exit(1);
    }
}
