//! Command-line interface.

use crate::loader::LabelLocale;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Space missions dashboard
///
/// Explore a global space missions dataset in the browser, or export the
/// same charts and statistics as a PDF report.
///
/// Examples:
///   space-dashboard serve --data missions.csv
///   space-dashboard report --output report.pdf
///   space-dashboard summary --rows 5
///   space-dashboard init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for space-dashboard.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the interactive dashboard
    Serve {
        #[command(flatten)]
        data: DataArgs,

        /// Address to listen on, e.g. 127.0.0.1:8501
        #[arg(short, long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Write the PDF report
    Report {
        #[command(flatten)]
        data: DataArgs,

        /// Output file; defaults to a timestamped name in the configured directory
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Report title
        #[arg(long)]
        title: Option<String>,
    },

    /// Print every aggregation as a table
    Summary {
        #[command(flatten)]
        data: DataArgs,

        /// Maximum rows per table
        #[arg(long, default_value = "20", value_name = "N")]
        rows: usize,
    },

    /// Write every aggregation as CSV plus summary.json
    Export {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long, default_value = "out", value_name = "DIR")]
        dir: PathBuf,
    },

    /// Generate a default space-dashboard.toml
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// Mission dataset (CSV)
    #[arg(short, long, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Vocabulary for mission type labels
    #[arg(long, value_enum)]
    pub locale: Option<LocaleArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LocaleArg {
    En,
    Pt,
}

impl From<LocaleArg> for LabelLocale {
    fn from(arg: LocaleArg) -> Self {
        match arg {
            LocaleArg::En => LabelLocale::En,
            LocaleArg::Pt => LabelLocale::Pt,
        }
    }
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Dataset flags of the chosen subcommand, if it reads one.
    pub fn data_args(&self) -> Option<&DataArgs> {
        match &self.command {
            Command::Serve { data, .. }
            | Command::Report { data, .. }
            | Command::Summary { data, .. }
            | Command::Export { data, .. } => Some(data),
            Command::InitConfig { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_serve_with_globals_after_subcommand() {
        let args = Args::try_parse_from(["space-dashboard", "serve", "--data", "m.csv", "--bind", "0.0.0.0:9000", "-v"])
            .unwrap();
        assert!(args.verbose);
        assert_eq!(args.log_level(), tracing::Level::DEBUG);
        let Command::Serve { data, bind } = &args.command else {
            panic!("expected serve");
        };
        assert_eq!(data.data.as_deref(), Some(std::path::Path::new("m.csv")));
        assert_eq!(bind.as_deref(), Some("0.0.0.0:9000"));
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["space-dashboard", "-v", "-q", "summary"]).is_err());
    }

    #[test]
    fn locale_flag_maps_to_label_locale() {
        let args = Args::try_parse_from(["space-dashboard", "summary", "--locale", "pt"]).unwrap();
        let locale = args.data_args().and_then(|d| d.locale).map(LabelLocale::from);
        assert_eq!(locale, Some(LabelLocale::Pt));
        let Command::Summary { rows, .. } = args.command else {
            panic!("expected summary");
        };
        assert_eq!(rows, 20);
    }

    #[test]
    fn init_config_has_no_data_args() {
        let args = Args::try_parse_from(["space-dashboard", "init-config"]).unwrap();
        assert!(args.data_args().is_none());
        assert_eq!(args.log_level(), tracing::Level::INFO);
    }
}
