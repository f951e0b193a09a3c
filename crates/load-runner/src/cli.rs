use crate::behaviors::PlannerDelete;
use clap::Parser;
use std::path::PathBuf;

/// ToDo API 負荷生成ツール
#[derive(Parser, Debug, Clone)]
#[command(name = "todo-load")]
#[command(about = "Simulates studying and planning users against a REST todos API")]
#[command(version)]
pub struct Cli {
    /// Scenario options JSON file (defaults to the built-in studier/planner scenarios)
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Run only the named scenario (repeatable)
    #[arg(long = "scenario", value_name = "NAME")]
    pub scenarios: Vec<String>,

    /// How the planner picks the URL it deletes
    #[arg(long, value_enum, default_value_t = PlannerDelete::Literal)]
    pub planner_delete: PlannerDelete,

    /// Progress log interval in seconds
    #[arg(long, default_value = "10")]
    pub report_interval: u64,

    /// Write the end-of-run metrics snapshot as JSON
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,

    /// Print the effective scenario options as JSON and exit
    #[arg(long)]
    pub print_options: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
