use anyhow::{anyhow, Context, Result};
use clap::Parser;
use domain::{ScenarioOptions, TodoRoutes};
use load_runner::cli::Cli;
use load_runner::reporter::{print_summary, spawn_progress_logger};
use load_runner::{ReqwestTransport, Runner, TokioPacer, KNOWN_EXECS};
use shared::{init_tracing, Config, RunMetrics};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, Instrument};
use ulid::Ulid;

fn load_options(cli: &Cli) -> Result<ScenarioOptions> {
    let options = match &cli.options {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read options file {}", path.display()))?;
            ScenarioOptions::from_json(&raw)
                .with_context(|| format!("invalid options file {}", path.display()))?
        }
        None => ScenarioOptions::todo_scenarios(),
    };

    let options = options.select(&cli.scenarios)?;
    options.validate(KNOWN_EXECS)?;
    Ok(options)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let options = load_options(&cli)?;
    if cli.print_options {
        println!("{}", options.to_json_pretty()?);
        return Ok(());
    }

    // ENDPOINT 未設定はここで終了する（パニックはしない）
    let config = Config::from_env()?;

    init_tracing(config.log_format, if cli.verbose { "debug" } else { "info" })
        .map_err(|e| anyhow!(e))?;

    let run_id = Ulid::new();
    let span = info_span!("run", %run_id);

    async move {
        info!(endpoint = %config.endpoint, "todo-load starting");
        for (name, scenario) in &options.scenarios {
            info!(
                scenario = %name,
                exec = %scenario.exec,
                executor = scenario.executor.kind(),
                max_vus = scenario.executor.max_vus(),
                "scenario configured"
            );
        }

        let metrics = RunMetrics::new()?;
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        let runner = Runner::new(
            options,
            transport,
            Arc::new(TokioPacer),
            metrics.clone(),
            TodoRoutes::new(config.endpoint.clone()),
        )
        .with_planner_delete(cli.planner_delete);

        let progress =
            spawn_progress_logger(metrics, Duration::from_secs(cli.report_interval.max(1)));
        let result = runner.run().await;
        progress.abort();
        let snapshot = result?;

        print_summary(&snapshot);

        if let Some(path) = &cli.summary_json {
            let json = serde_json::to_string_pretty(&snapshot)?;
            std::fs::write(path, json)
                .with_context(|| format!("failed to write summary to {}", path.display()))?;
            info!(path = %path.display(), "summary written");
        }

        info!("load test complete");
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await
}
