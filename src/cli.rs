use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::auth::Token;
use crate::error::EpicLensError;
use crate::providers::azure::{
    AzureDevOpsProvider, ChildFailurePolicy, ClientConfig, ReportOptions,
};
use crate::report::{ReportEvent, ReportOutcome, ReportRow};

#[derive(Parser)]
#[command(name = "epiclens")]
#[command(author, version, about = "Epic effort vs. story points for Azure DevOps", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Azure DevOps personal access token
    #[arg(long, env = "AZURE_DEVOPS_PAT", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Azure DevOps organization
    #[arg(long, env = "AZURE_DEVOPS_ORG", default_value = "access-devops", global = true)]
    organization: String,

    /// Azure DevOps instance URL
    #[arg(short, long, default_value = "https://dev.azure.com", global = true)]
    url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    timeout_secs: u64,

    /// Retries for timeouts and 5xx responses
    #[arg(long, default_value_t = 0, global = true)]
    retries: u32,

    /// Iteration path segments kept when grouping iterations
    #[arg(long, default_value_t = 2, global = true)]
    iteration_depth: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects, sorted by name
    Projects,

    /// List the iteration groups of a project
    Iterations {
        /// Project name
        #[arg(short = 'P', long)]
        project: String,
    },

    /// Compare Epic effort with the story points of their children
    Report {
        /// Project name
        #[arg(short = 'P', long)]
        project: String,

        /// Iteration path (defaults to the first iteration group of the project)
        #[arg(short, long)]
        iteration: Option<String>,

        /// Number of Epics fetched at once
        #[arg(long, default_value_t = 1)]
        concurrency: usize,

        /// Number of children fetched at once per Epic
        #[arg(long, default_value_t = 1)]
        child_concurrency: usize,

        /// Fail an Epic when one of its children cannot be fetched
        #[arg(long, default_value_t = false)]
        fail_on_child_error: bool,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        // Fail fast: no client and no request without a credential.
        let token = Token::try_from(self.connection.token.as_deref())?;

        let options = match &self.command {
            Commands::Report {
                concurrency,
                child_concurrency,
                fail_on_child_error,
                ..
            } => ReportOptions {
                concurrency: *concurrency,
                child_concurrency: *child_concurrency,
                child_failure: if *fail_on_child_error {
                    ChildFailurePolicy::FailEpic
                } else {
                    ChildFailurePolicy::ContributeZero
                },
                iteration_depth: self.connection.iteration_depth,
            },
            _ => ReportOptions {
                iteration_depth: self.connection.iteration_depth,
                ..ReportOptions::default()
            },
        };
        let provider = AzureDevOpsProvider::new(&self.client_config(), token, options)?;

        match &self.command {
            Commands::Projects => {
                let projects = provider
                    .list_projects()
                    .await
                    .context("Error fetching projects")?;
                self.write_list(&projects).context("Error writing output")
            }
            Commands::Iterations { project } => {
                let iterations = provider
                    .list_iterations(project)
                    .await
                    .context("Error fetching iterations")?;
                self.write_list(&iterations).context("Error writing output")
            }
            Commands::Report {
                project, iteration, ..
            } => {
                let iteration = match iteration {
                    Some(iteration) => iteration.clone(),
                    None => provider
                        .list_iterations(project)
                        .await
                        .context("Error fetching iterations")?
                        .into_iter()
                        .next()
                        .with_context(|| format!("No iterations found for project {project}"))?,
                };
                info!("Building report for {project} / {iteration}");

                let cancel = CancellationToken::new();
                let ctrl_c = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        ctrl_c.cancel();
                    }
                });

                match self.format {
                    Format::Json => {
                        let report = provider
                            .collect_report(project, &iteration, &cancel)
                            .await
                            .context("Error fetching Epics")?;
                        if report.total_epics == 0 {
                            eprintln!("No Epics found in this iteration.");
                        }
                        self.write_json(&report).context("Error writing output")
                    }
                    Format::Table => {
                        self.stream_table(&provider, project, &iteration, &cancel)
                            .await
                    }
                }
            }
        }
    }

    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.connection.organization.clone());
        config.base_url = self.connection.url.clone();
        config.timeout = Duration::from_secs(self.connection.timeout_secs);
        config.max_retries = self.connection.retries;
        config
    }

    /// Print rows as the pipeline produces them so partial results stay visible.
    async fn stream_table(
        &self,
        provider: &AzureDevOpsProvider,
        project: &str,
        iteration: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut out = self.writer().context("Error writing output")?;

        let print = async {
            while let Some(event) = rx.recv().await {
                match event {
                    ReportEvent::Started { epic_count } => {
                        info!("Processing {epic_count} Epics");
                        writeln!(out, "{}", header())?;
                    }
                    ReportEvent::Row(row) => writeln!(out, "{}", format_row(&row))?,
                    ReportEvent::EpicFailed { epic_id, error } => {
                        eprintln!("Error fetching Epic details for {epic_id}: {error}");
                    }
                }
                out.flush()?;
            }
            Ok::<_, EpicLensError>(())
        };

        let (outcome, printed) = tokio::join!(
            async {
                let outcome = provider.run_report(project, iteration, &tx, cancel).await;
                drop(tx);
                outcome
            },
            print
        );
        printed.context("Error writing output")?;

        match outcome.context("Error fetching Epics")? {
            ReportOutcome::NoEpics => eprintln!("No Epics found in this iteration."),
            ReportOutcome::Completed { rows, failures } => {
                info!("{rows} rows written, {failures} Epics failed");
            }
        }
        Ok(())
    }

    fn write_list(&self, items: &[String]) -> crate::error::Result<()> {
        match self.format {
            Format::Json => self.write_json(&items),
            Format::Table => {
                let mut out = self.writer()?;
                for item in items {
                    writeln!(out, "{item}")?;
                }
                Ok(())
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> crate::error::Result<()> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        let mut out = self.writer()?;
        writeln!(out, "{json_output}")?;
        Ok(())
    }

    fn writer(&self) -> crate::error::Result<Box<dyn Write>> {
        Ok(match &self.output {
            Some(path) => {
                info!("Writing output to: {}", path.display());
                Box::new(std::fs::File::create(path)?)
            }
            None => Box::new(std::io::stdout()),
        })
    }
}

fn header() -> String {
    format!(
        "{:<10} {:<12} {:<50} {:>10} {:>12} {:>22}",
        "Epic ID", "Epic State", "Title", "Effort", "Story Points", "Effort - Story Points"
    )
}

fn format_row(row: &ReportRow) -> String {
    format!(
        "{:<10} {:<12} {:<50} {:>10} {:>12} {:>22}",
        row.epic_id, row.epic_state, row.title, row.effort, row.story_points, row.difference
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_report_command() {
        let cli = Cli::try_parse_from([
            "epiclens",
            "--token",
            "pat",
            "report",
            "-P",
            "Alpha",
            "--iteration",
            r"Alpha\Q1",
            "--concurrency",
            "4",
            "--fail-on-child-error",
        ])
        .unwrap();

        match cli.command {
            Commands::Report {
                project,
                iteration,
                concurrency,
                child_concurrency,
                fail_on_child_error,
            } => {
                assert_eq!(project, "Alpha");
                assert_eq!(iteration.as_deref(), Some(r"Alpha\Q1"));
                assert_eq!(concurrency, 4);
                assert_eq!(child_concurrency, 1);
                assert!(fail_on_child_error);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_client_config_from_flags() {
        let cli = Cli::try_parse_from([
            "epiclens",
            "projects",
            "--organization",
            "contoso",
            "--timeout-secs",
            "5",
            "--retries",
            "2",
        ])
        .unwrap();

        let config = cli.client_config();

        assert_eq!(config.organization, "contoso");
        assert_eq!(config.base_url, "https://dev.azure.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_format_row_columns() {
        let row = ReportRow {
            epic_id: 101,
            epic_state: "New".to_string(),
            title: "Onboarding".to_string(),
            effort: 8.0,
            story_points: 6.0,
            difference: 2.0,
        };

        let line = format_row(&row);
        let columns: Vec<&str> = line.split_whitespace().collect();

        assert_eq!(columns, vec!["101", "New", "Onboarding", "8", "6", "2"]);
    }

    #[tokio::test]
    async fn test_execute_without_token_fails_before_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let cli = Cli::try_parse_from([
            "epiclens",
            "projects",
            "--token",
            "",
            "--url",
            server.url().as_str(),
        ])
        .unwrap();

        let err = cli.execute().await.unwrap_err();

        assert!(err.to_string().contains("AZURE_DEVOPS_PAT"));
        mock.assert_async().await;
    }

    #[test]
    fn test_unwritable_output_is_io_error() {
        let dir = std::env::temp_dir();
        let cli = Cli::try_parse_from([
            "epiclens",
            "projects",
            "--output",
            dir.to_str().unwrap(),
        ])
        .unwrap();

        let err = cli.write_list(&["Alpha".to_string()]).unwrap_err();

        assert!(matches!(err, EpicLensError::Io(_)));
    }
}
