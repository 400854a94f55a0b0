use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use data_summary::analyser::logic::{self, PlotRequest, SummaryOptions};
use data_summary::config::UploadLimits;
use data_summary::service::SessionService;
use data_summary::session::FileKind;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "data-summary",
    about = "Statistical summaries, missing-value handling and export for CSV files"
)]
pub struct Cli {
    /// Settings file (TOML). Defaults to `DataSummary.toml` if present.
    #[arg(long, global = true, env = "DATA_SUMMARY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Numeric and categorical statistics, correlation and quality ratings
    Summary {
        file: PathBuf,

        /// Only these columns (comma separated)
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        #[arg(long)]
        no_categorical: bool,

        #[arg(long)]
        no_correlation: bool,

        #[arg(long)]
        no_quality: bool,
    },
    /// Profile one column, or every column when none is given
    Describe {
        file: PathBuf,
        column: Option<String>,
    },
    /// Missing value report with recommendations
    Missing { file: PathBuf },
    /// Resolve missing values and report statistics before and after
    Impute {
        file: PathBuf,

        /// skip, fill_mean, fill_median, fill_mode, forward_fill or backward_fill
        #[arg(short, long)]
        strategy: String,

        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Also write the processed rows as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Pairwise Pearson correlation of numeric columns
    Correlate {
        file: PathBuf,

        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,
    },
    /// Series for a histogram, boxplot, scatter or line plot
    Plot {
        file: PathBuf,

        /// histogram, boxplot, scatter or line
        kind: String,

        x_column: String,

        y_column: Option<String>,

        #[arg(long, default_value_t = logic::types::DEFAULT_HISTOGRAM_BINS)]
        bins: usize,

        /// skip, fill_mean or fill_median
        #[arg(long, default_value = "skip")]
        missing: String,
    },
    /// Export rows as CSV or JSON
    Export {
        file: PathBuf,

        #[arg(short, long, default_value = "csv")]
        format: String,

        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Maximum number of rows; 0 exports all of them
        #[arg(short, long)]
        limit: Option<usize>,

        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    fn file(&self) -> &Path {
        match self {
            Self::Summary { file, .. }
            | Self::Describe { file, .. }
            | Self::Missing { file }
            | Self::Impute { file, .. }
            | Self::Correlate { file, .. }
            | Self::Plot { file, .. }
            | Self::Export { file, .. } => file.as_path(),
        }
    }
}

pub fn run_command(command: Commands, service: &SessionService, limits: &UploadLimits) -> Result<()> {
    let session_id = upload(command.file(), service, limits)?;
    let id = session_id.as_str();

    match command {
        Commands::Summary {
            columns,
            no_categorical,
            no_correlation,
            no_quality,
            ..
        } => {
            let options = SummaryOptions {
                columns,
                include_categorical: !no_categorical,
                include_correlation: !no_correlation,
                include_quality: !no_quality,
            };
            emit(&service.summarize(id, &options)?)
        }
        Commands::Describe { column, .. } => match column {
            Some(column) => emit(&service.describe_column(id, &column)?),
            None => emit(&service.describe_columns(id)?),
        },
        Commands::Missing { .. } => emit(&service.missing_report(id)?),
        Commands::Impute {
            strategy,
            columns,
            output,
            ..
        } => {
            let response = service.handle_missing(id, &strategy, columns.as_deref())?;
            if let Some(output) = output {
                let exported = service.export(id, None, None, "csv")?;
                write_output(&output, &exported.body)?;
            }
            emit(&response)
        }
        Commands::Correlate { columns, .. } => {
            emit(&service.correlation(id, columns.as_deref())?)
        }
        Commands::Plot {
            kind,
            x_column,
            y_column,
            bins,
            missing,
            ..
        } => {
            let request = PlotRequest {
                kind: kind.parse()?,
                x_column,
                y_column,
                bins,
                missing: missing.parse()?,
            };
            emit(&service.plot_data(id, &request)?)
        }
        Commands::Export {
            format,
            columns,
            limit,
            output,
            ..
        } => {
            let exported = service.export(id, columns.as_deref(), limit, &format)?;
            match output {
                Some(output) => {
                    write_output(&output, &exported.body)?;
                    println!(
                        "Exported {} rows x {} columns to {}",
                        exported.rows,
                        exported.columns,
                        output.display()
                    );
                }
                None => println!("{}", exported.body),
            }
            Ok(())
        }
    }
}

/// Runs the upload checks on `file` and stores it as a new session.
fn upload(file: &Path, service: &SessionService, limits: &UploadLimits) -> Result<String> {
    let filename = file
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", file.display()))?
        .to_string_lossy()
        .into_owned();

    if FileKind::from_filename(&filename)? == FileKind::Xlsx {
        bail!("Reading XLSX files is not supported by the command line; convert to CSV first");
    }

    let dataset = logic::load_csv(file, limits)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let created = service.create(dataset, &filename, FileKind::Csv)?;
    Ok(created.summary.session_id)
}

fn write_output(path: &Path, body: &str) -> Result<()> {
    std::fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
