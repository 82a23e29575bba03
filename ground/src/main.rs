use anyhow::*;
use std::fmt::Formatter;
use std::fs::File;
use std::io::Write;
use std::str::FromStr;
use structopt::StructOpt;

use strips_planning::config::{Algorithm, Backend, GroundingConfig, HeuristicKind, SearchConfig};
use strips_planning::demos;
use strips_planning::search::SearchOutcome;
use strips_planning::{ground_and_search, trivial_plan};

/// Grounds and solves one of the built-in demo problems (no PDDL surface
/// parser lives in this workspace: `--problem` selects a demo by name).
#[derive(Debug, StructOpt)]
#[structopt(name = "ground", rename_all = "kebab-case")]
struct Opt {
    /// One of the built-in demo problems; pass `--list` to see the names.
    problem: Option<String>,

    #[structopt(long)]
    list: bool,

    #[structopt(long, default_value = "relational")]
    backend: BackendArg,

    #[structopt(long, default_value = "astar")]
    algorithm: AlgorithmArg,

    #[structopt(long, default_value = "hadd")]
    heuristic: HeuristicArg,

    #[structopt(long)]
    keep_static_facts: bool,

    #[structopt(long)]
    keep_action_args: bool,

    #[structopt(long)]
    remove_static_facts_from_preconditions: bool,

    #[structopt(long)]
    max_layers: Option<u32>,

    #[structopt(long)]
    max_atoms: Option<u32>,

    #[structopt(long)]
    max_expansions: Option<u64>,

    /// Dumps the assembled propositional task as JSON instead of searching.
    #[structopt(long)]
    dump_task: bool,

    /// Make `ground` return failure with code 1 if it does not solve the problem.
    #[structopt(long)]
    expect_sat: bool,

    /// Make `ground` return failure with code 1 if it does not prove the problem unsolvable.
    #[structopt(long)]
    expect_unsat: bool,

    /// If a plan is found, it will be written to the indicated file.
    #[structopt(short = "p", long = "plan")]
    plan_file: Option<String>,

    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

#[derive(Debug, Clone, Copy)]
struct BackendArg(Backend);
impl FromStr for BackendArg {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "relational" => Ok(BackendArg(Backend::Relational)),
            "datalog" => Ok(BackendArg(Backend::Datalog)),
            other => bail!("unknown backend: {other} (expected relational|datalog)"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AlgorithmArg(Algorithm);
impl FromStr for AlgorithmArg {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "astar" => Ok(AlgorithmArg(Algorithm::AStar)),
            "greedy" => Ok(AlgorithmArg(Algorithm::Greedy)),
            "lazy" => Ok(AlgorithmArg(Algorithm::Lazy)),
            other => bail!("unknown algorithm: {other} (expected astar|greedy|lazy)"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HeuristicArg(HeuristicKind);
impl FromStr for HeuristicArg {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hadd" => Ok(HeuristicArg(HeuristicKind::HAdd)),
            "hmax" => Ok(HeuristicArg(HeuristicKind::HMax)),
            "blind" => Ok(HeuristicArg(HeuristicKind::Blind)),
            other => bail!("unknown heuristic: {other} (expected hadd|hmax|blind)"),
        }
    }
}

fn main() -> Result<()> {
    let opt: Opt = Opt::from_args();

    let verbosity = match opt.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(verbosity).init();

    if opt.list {
        for name in demos::NAMES {
            println!("{name}");
        }
        return Ok(());
    }
    let name = opt.problem.as_deref().context("a problem name is required (see --list)")?;
    let problem = demos::build(name).with_context(|| format!("no such built-in problem: {name} (see --list)"))?;

    let grounding = GroundingConfig {
        keep_static_facts: opt.keep_static_facts,
        keep_action_args: opt.keep_action_args,
        remove_static_facts_from_preconditions: opt.remove_static_facts_from_preconditions,
        max_layers: opt.max_layers.or(GroundingConfig::default().max_layers),
        max_atoms: opt.max_atoms.or(GroundingConfig::default().max_atoms),
        backend: opt.backend.0,
    };
    let search_cfg = SearchConfig { algorithm: opt.algorithm.0, heuristic: opt.heuristic.0, max_expansions: opt.max_expansions };

    let start_time = std::time::Instant::now();
    let (outcome, stats, task) = ground_and_search(&problem, &grounding, &search_cfg);
    let runtime = start_time.elapsed();

    if task.capped {
        tracing::warn!("reachability fixpoint was capped by --max-layers/--max-atoms before reaching closure; this task may be incomplete");
    }

    if opt.dump_task {
        println!("{}", serde_json::to_string_pretty(&task.dump())?);
        return Ok(());
    }

    let outcome = match outcome {
        SearchOutcome::Abort => trivial_plan(&task).map(SearchOutcome::Found).unwrap_or(SearchOutcome::Abort),
        other => other,
    };

    let result = match &outcome {
        SearchOutcome::Found(plan) => {
            println!("Got plan: {} actions, cost {}", plan.length(), plan.cost);
            println!("=============");
            print!("{plan}");
            if let Some(plan_file) = &opt.plan_file {
                let mut output = File::create(plan_file).with_context(|| format!("option -p failed to create file {plan_file}"))?;
                write!(output, "{plan}").context("error while writing plan")?;
            }
            SolverResult { solution: Some(Solution::Sat), cost: Some(plan.cost as f64), runtime, stats: Some(stats), capped: task.capped }
        }
        SearchOutcome::Unsolvable => SolverResult { solution: Some(Solution::Unsat), cost: None, runtime, stats: Some(stats), capped: task.capped },
        SearchOutcome::Abort => SolverResult { solution: None, cost: None, runtime, stats: Some(stats), capped: task.capped },
    };

    println!("{result}");
    if opt.expect_sat && !result.proved_sat() {
        std::process::exit(1);
    }
    if opt.expect_unsat && result.solution != Some(Solution::Unsat) {
        std::process::exit(1);
    }
    Ok(())
}

struct SolverResult {
    solution: Option<Solution>,
    cost: Option<f64>,
    runtime: std::time::Duration,
    stats: Option<strips_planning::search::SearchStatistics>,
    capped: bool,
}
impl SolverResult {
    pub fn proved_sat(&self) -> bool {
        self.solution == Some(Solution::Sat)
    }
}
impl std::fmt::Display for SolverResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[summary] solution:{} cost:{} runtime:{}ms expansions:{} capped:{}",
            match self.solution {
                Some(Solution::Sat) => "SAT",
                Some(Solution::Unsat) => "UNSAT",
                None => "_",
            },
            self.cost.map_or_else(|| "_".to_string(), |cost| format!("{cost}")),
            self.runtime.as_millis(),
            self.stats.as_ref().map_or_else(|| "_".to_string(), |s| format!("{}", s.expansions)),
            self.capped,
        )
    }
}

#[derive(Eq, PartialEq)]
enum Solution {
    Unsat,
    Sat,
}
