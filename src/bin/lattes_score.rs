//! CLI binary for lattes-score.
//!
//! Usage: lattes-score analyze curriculo.zip --start-year 2017 --end-year 2020

#[cfg(feature = "cli")]
mod cli {
    use clap::{Parser, Subcommand};
    use lattes_score::config::{delimiter_byte, Config, CONFIG_ENV, DATA_DIR_ENV};
    use lattes_score::error::{Result, ScoreError};
    use lattes_score::identifier::format_decimal;
    use lattes_score::report::{format_report, report_file_name};
    use lattes_score::resolve::JournalClassification;
    use lattes_score::roster::{classify_authors, ContainmentMatcher, Roster};
    use lattes_score::tables::{dedupe_rows, Table};
    use lattes_score::{analyze_input, AnalysisReport, ParticipantCounts, QualityTier, ReferenceTables, YearRange, YearlyScoreRow};
    use std::path::{Path, PathBuf};
    use tracing::{debug, info};

    #[derive(Parser, Debug)]
    #[command(name = "lattes-score", about = "Score Lattes curricula by Qualis, JCR and SJR", version)]
    struct Cli {
        /// JSON configuration file
        #[arg(long, global = true, env = CONFIG_ENV)]
        config: Option<PathBuf>,

        /// Directory holding the reference tables
        #[arg(long, global = true, env = DATA_DIR_ENV)]
        data_dir: Option<PathBuf>,

        /// Output format
        #[arg(long, global = true, default_value = "table")]
        output: OutputFormat,

        /// More log output (-v debug, -vv trace)
        #[arg(short, long, global = true, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Only log errors
        #[arg(short, long, global = true, conflicts_with = "verbose")]
        quiet: bool,

        #[command(subcommand)]
        command: Commands,
    }

    #[derive(Clone, Copy, Debug, clap::ValueEnum)]
    enum OutputFormat {
        Table,
        Json,
        Csv,
    }

    #[derive(Subcommand, Debug)]
    enum Commands {
        /// Score a curriculum (.xml or .zip)
        Analyze {
            /// Curriculum file
            file: PathBuf,
            /// First publication year to include
            #[arg(long)]
            start_year: Option<i32>,
            /// Last publication year to include
            #[arg(long)]
            end_year: Option<i32>,
            /// Also write the yearly report to this directory
            #[arg(long)]
            report_dir: Option<PathBuf>,
        },
        /// Classify journals by ISSN
        Lookup {
            /// ISSNs, with or without hyphen
            #[arg(required = true)]
            issns: Vec<String>,
        },
        /// Count roster members among an author list
        Classify {
            /// Authors separated by ';'
            authors: String,
        },
        /// Build a roster from a faculty table and a student list
        Roster {
            /// Faculty table with NOME and CATEGORIA columns
            #[arg(long)]
            faculty: PathBuf,
            /// JSON array of student names
            #[arg(long)]
            students: PathBuf,
            /// Field delimiter of the faculty table
            #[arg(long, default_value = ",")]
            delimiter: char,
            /// Write the roster here instead of stdout
            #[arg(short = 'o', long = "out")]
            out: Option<PathBuf>,
        },
        /// Render the yearly scores of a JSON analysis
        Report {
            /// Output of `analyze --output json`, or its yearly_scores array
            file: PathBuf,
        },
        /// Remove duplicate lines from a delimited table
        Dedupe {
            /// Table to clean
            file: PathBuf,
            /// Field delimiter
            #[arg(long, default_value = ";")]
            delimiter: char,
            /// Write the result here instead of stdout
            #[arg(short = 'o', long = "out")]
            out: Option<PathBuf>,
        },
        /// Start MCP server (stdio)
        Serve,
    }

    fn init_tracing(verbose: u8, quiet: bool) {
        // RUST_LOG > quiet > verbose > info
        let default_level = if quiet {
            "error"
        } else {
            match verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };

        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    fn load_config(path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Config> {
        let config = match path {
            Some(path) => Config::from_file(path)?,
            None => Config::from_env()?,
        };
        Ok(match data_dir {
            Some(dir) => config.with_data_dir(dir),
            None => config,
        })
    }

    fn file_name_of(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn truncate(text: &str, max: usize) -> String {
        if text.chars().count() > max {
            let head: String = text.chars().take(max - 3).collect();
            format!("{}...", head)
        } else {
            text.to_string()
        }
    }

    fn number(value: Option<f64>) -> String {
        value.map(|v| format_decimal(v, 3)).unwrap_or_default()
    }

    fn print_articles_table(report: &AnalysisReport) {
        use comfy_table::{ContentArrangement, Table};

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Year", "Title", "ISSN", "Qualis", "JCR", "SJR", "DP", "DC", "DISC"]);

        for enriched in &report.articles {
            let article = &enriched.article;
            table.add_row(vec![
                article.year.to_string(),
                truncate(&article.title, 60),
                lattes_score::identifier::format_identifier(&article.journal_identifier),
                enriched.quality_tier.to_string(),
                format!("{} {}", enriched.jcr.score, enriched.jcr.quartile),
                format!("{} {}", enriched.sjr.score, enriched.sjr.quartile),
                enriched.participants.permanent.to_string(),
                enriched.participants.collaborator.to_string(),
                enriched.participants.student.to_string(),
            ]);
        }

        println!("{table}");
    }

    fn print_scores_table(rows: &[YearlyScoreRow]) {
        use comfy_table::{ContentArrangement, Table};

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        let mut header = vec!["Year".to_string()];
        header.extend(QualityTier::ALL.iter().map(|t| t.to_string()));
        header.extend(["Total A", "Total B", "Total", "% A", "% B"].map(String::from));
        table.set_header(header);

        for row in rows {
            let mut cells = vec![row.year.to_string()];
            cells.extend(
                QualityTier::ALL
                    .iter()
                    .map(|t| number(row.subscores.get(t).copied().flatten())),
            );
            cells.extend(
                [row.total_a, row.total_b, row.total, row.percent_a, row.percent_b]
                    .into_iter()
                    .map(number),
            );
            table.add_row(cells);
        }

        println!("{table}");
    }

    fn print_journals(journals: &[JournalClassification], output: OutputFormat) -> Result<()> {
        match output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(journals)?),
            OutputFormat::Csv => {
                println!("ISSN;Qualis;JCR;JCR Quartile;SJR;SJR Quartile");
                for j in journals {
                    println!(
                        "{};{};{};{};{};{}",
                        j.identifier, j.quality_tier, j.jcr.score, j.jcr.quartile, j.sjr.score, j.sjr.quartile
                    );
                }
            }
            OutputFormat::Table => {
                use comfy_table::{ContentArrangement, Table};
                let mut table = Table::new();
                table.set_content_arrangement(ContentArrangement::Dynamic);
                table.set_header(vec!["ISSN", "Qualis", "JCR", "JCR Quartile", "SJR", "SJR Quartile"]);
                for j in journals {
                    table.add_row(vec![
                        j.identifier.clone(),
                        j.quality_tier.to_string(),
                        j.jcr.score.clone(),
                        j.jcr.quartile.clone(),
                        j.sjr.score.clone(),
                        j.sjr.quartile.clone(),
                    ]);
                }
                println!("{table}");
            }
        }
        Ok(())
    }

    fn print_counts(counts: &ParticipantCounts, output: OutputFormat) -> Result<()> {
        match output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(counts)?),
            OutputFormat::Csv => {
                println!("DP;DC;DISC");
                println!("{};{};{}", counts.permanent, counts.collaborator, counts.student);
            }
            OutputFormat::Table => {
                println!("Permanent faculty (DP):     {}", counts.permanent);
                println!("Collaborating faculty (DC): {}", counts.collaborator);
                println!("Students (DISC):            {}", counts.student);
            }
        }
        Ok(())
    }

    /// Accept either a full analysis or a bare `yearly_scores` array.
    fn read_yearly_scores(text: &str) -> Result<Vec<YearlyScoreRow>> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let rows = match value {
            serde_json::Value::Object(mut map) => map
                .remove("yearly_scores")
                .ok_or_else(|| ScoreError::Config("JSON object has no 'yearly_scores'".into()))?,
            other => other,
        };
        Ok(serde_json::from_value(rows)?)
    }

    async fn write_or_print(out: Option<PathBuf>, contents: &str) -> Result<()> {
        match out {
            Some(path) => {
                tokio::fs::write(&path, contents).await?;
                info!(path = %path.display(), "Wrote file");
            }
            None => print!("{}", contents),
        }
        Ok(())
    }

    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        init_tracing(cli.verbose, cli.quiet);
        debug!(?cli, "CLI arguments parsed");

        match cli.command {
            Commands::Analyze {
                file,
                start_year,
                end_year,
                report_dir,
            } => {
                let config = load_config(cli.config, cli.data_dir)?;
                let tables = ReferenceTables::load(&config).await;
                let bytes = tokio::fs::read(&file).await?;
                let range = YearRange::from_bounds(start_year, end_year);
                let file_name = file_name_of(&file);

                let report =
                    tokio::task::spawn_blocking(move || analyze_input(&file_name, &bytes, &tables, range))
                        .await
                        .map_err(|e| ScoreError::Config(format!("analysis task failed: {}", e)))??;

                if let Some(dir) = report_dir {
                    let path = dir.join(report_file_name(&report.owner_name));
                    tokio::fs::write(&path, format_report(&report.yearly_scores)).await?;
                    info!(path = %path.display(), "Wrote yearly report");
                }

                match cli.output {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                    OutputFormat::Csv => print!("{}", format_report(&report.yearly_scores)),
                    OutputFormat::Table => {
                        println!("{}", report.owner_name);
                        if let Some(message) = &report.message {
                            println!("{}", message);
                        } else {
                            print_articles_table(&report);
                            print_scores_table(&report.yearly_scores);
                        }
                        for warning in &report.warnings {
                            eprintln!("Warning: {}", warning);
                        }
                    }
                }
            }

            Commands::Lookup { issns } => {
                let config = load_config(cli.config, cli.data_dir)?;
                let tables = ReferenceTables::load(&config).await;
                let journals: Vec<JournalClassification> =
                    issns.iter().map(|issn| tables.classify_journal(issn)).collect();
                print_journals(&journals, cli.output)?;
            }

            Commands::Classify { authors } => {
                let config = load_config(cli.config, cli.data_dir)?;
                let tables = ReferenceTables::load(&config).await;
                let counts = classify_authors(&authors, &tables.roster, &ContainmentMatcher);
                print_counts(&counts, cli.output)?;
            }

            Commands::Roster {
                faculty,
                students,
                delimiter,
                out,
            } => {
                let config = load_config(cli.config, cli.data_dir)?;
                let (faculty_bytes, student_bytes) =
                    tokio::try_join!(tokio::fs::read(&faculty), tokio::fs::read(&students))?;
                let faculty = Table::read(file_name_of(&faculty), &faculty_bytes, delimiter_byte(delimiter)?)?;
                let students: Vec<String> = serde_json::from_slice(&student_bytes)?;

                let roster = Roster::build(&faculty, &students)?;
                info!(participants = roster.len(), "Built roster");
                write_or_print(out, &roster.to_csv(&config.roster)?).await?;
            }

            Commands::Report { file } => {
                let text = tokio::fs::read_to_string(&file).await?;
                let rows = read_yearly_scores(&text)?;
                match cli.output {
                    OutputFormat::Table => print_scores_table(&rows),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                    OutputFormat::Csv => print!("{}", format_report(&rows)),
                }
            }

            Commands::Dedupe { file, delimiter, out } => {
                let bytes = tokio::fs::read(&file).await?;
                let cleaned = dedupe_rows(&bytes, delimiter_byte(delimiter)?)?;
                write_or_print(out, &cleaned).await?;
            }

            Commands::Serve => {
                let config = load_config(cli.config, cli.data_dir)?;
                info!(data_dir = %config.data_dir.display(), "Starting MCP server");
                lattes_score::mcp::run_server(config).await?;
            }
        }

        Ok(())
    }

}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("This binary requires the 'cli' feature. Build with: cargo build --features cli");
    std::process::exit(1);
}
