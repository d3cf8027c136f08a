mod animation;
mod calc_engine;
mod i18n;
mod number_line;
mod settings;

#[cfg(feature = "tui")]
mod render_help;
#[cfg(feature = "tui")]
mod tui_mode;

#[cfg(feature = "line")]
mod line_mode;

use anyhow::{Context, Result};
use clap::Parser;
use i18n::Language;
use log::{debug, LevelFilter};
use settings::{load_config, DisplaySettings};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Arithmetic on a number line: type an expression, watch the marker walk it.
#[derive(Parser, Debug)]
#[command(name = "numline", version, about)]
struct Cli {
    /// Solve this expression, print the steps and exit
    expression: Option<String>,

    /// Display language
    #[arg(long, value_enum)]
    lang: Option<Language>,

    /// Text scale for the number line (0.75 ..= 1.5)
    #[arg(long)]
    scale: Option<f64>,

    /// TOML file with a [display] section
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write log records to this file (filter via NUMLINE_LOG)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Plain line-by-line prompt instead of the full-screen interface
    #[arg(long)]
    line: bool,
}

impl Cli {
    fn settings(&self) -> Result<DisplaySettings> {
        let mut settings = match &self.config {
            Some(path) => load_config(path)?,
            None => DisplaySettings::default(),
        };
        if let Some(language) = self.lang {
            settings.language = language;
        }
        if let Some(scale) = self.scale {
            settings = settings.with_font_scale(scale);
        }
        Ok(settings)
    }

    fn is_tui(&self) -> bool {
        self.expression.is_none() && !self.line
    }
}

fn init_logging(log_file: Option<&Path>, tui: bool) -> Result<()> {
    // полноэкранный режим владеет терминалом: без файла не логируем
    if tui && log_file.is_none() {
        return Ok(());
    }

    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn).parse_env("NUMLINE_LOG");

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(env_logger::Target::Stderr);
        }
    }

    builder.try_init().context("logger already installed")
}

fn one_shot(expression: &str, language: Language) -> ExitCode {
    let solution = calc_engine::solve(expression, language);
    for line in solution.report(language) {
        println!("{}", line);
    }
    if solution.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref(), cli.is_tui())?;

    let settings = cli.settings()?;
    debug!("settings: {:?}", settings);

    if let Some(expression) = &cli.expression {
        return Ok(one_shot(expression, settings.language));
    }

    if cli.line {
        #[cfg(feature = "line")]
        {
            line_mode::run_line(settings)?;
            return Ok(ExitCode::SUCCESS);
        }
        #[cfg(not(feature = "line"))]
        anyhow::bail!("built without line mode; rebuild with --features line");
    }

    #[cfg(feature = "tui")]
    {
        tui_mode::run_tui(settings)?;
        Ok(ExitCode::SUCCESS)
    }
    #[cfg(not(feature = "tui"))]
    {
        anyhow::bail!("built without the full-screen interface; use --line or pass an expression")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_flags_override_defaults() {
        let cli = Cli::parse_from(["numline", "--lang", "ur", "--scale", "9"]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.language, Language::Ur);
        assert_eq!(settings.font_scale, settings::FONT_SCALE_MAX);
        assert!(cli.is_tui());
    }

    #[test]
    fn expression_selects_one_shot() {
        let cli = Cli::parse_from(["numline", "5 + 3"]);
        assert_eq!(cli.expression.as_deref(), Some("5 + 3"));
        assert!(!cli.is_tui());
        assert_eq!(cli.settings().unwrap(), DisplaySettings::default());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["numline", "--config", "/nonexistent/numline.toml"]);
        let err = cli.settings().unwrap_err();
        assert!(format!("{:#}", err).contains("cannot read config file"));
    }
}
