use std::{fs::File, io::BufReader, path::PathBuf, thread};

use clap::Args;
use courier_graph::edge::{DayPeriod, Season};
use courier_optimizer::solver::{
    genetic::genetic_params::{GeneticParams, Threads},
    planning_context::{CancellationToken, PlanningContext},
    schedule::{
        scheduler::{ScheduleReport, Scheduler},
        scheduler_params::{AssignmentStrategy, SchedulerParams},
    },
};
use tracing::{info, warn};

use crate::{
    file_utils::{read_state, write_state},
    parsers,
    tables::{fleet_table, schedule_table},
};

#[derive(Args)]
pub struct PlanArgs {
    /// The state file to plan
    #[arg(short, long, env = "COURIER_STATE")]
    input: PathBuf,

    /// Where to write the planned state, stdout when missing
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Planning parameters as JSON, see `courier schema --params`
    #[arg(long, env = "COURIER_PARAMS")]
    params: Option<PathBuf>,

    /// Plans a single day instead of the whole horizon
    #[arg(long)]
    day: Option<usize>,

    /// Uses the genetic assignment instead of the greedy one
    #[arg(short, long)]
    genetic: bool,

    #[arg(long)]
    seed: Option<u64>,

    /// Threads evaluating the genetic population (default: all cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Ends routes at their last drop instead of the depot
    #[arg(long)]
    no_return: bool,

    /// Hour of day used for travel times
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
    hour: Option<u32>,

    #[arg(long, value_parser = parsers::parse_season)]
    season: Option<Season>,

    /// Cancels planning after this long (e.g., "30s", "PT5M")
    #[arg(long, value_parser = parsers::parse_duration)]
    timeout: Option<jiff::SignedDuration>,
}

fn scheduler_params(args: &PlanArgs) -> Result<SchedulerParams, anyhow::Error> {
    let mut params: SchedulerParams = match &args.params {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => SchedulerParams::default(),
    };

    if args.genetic || args.seed.is_some() || args.threads.is_some() {
        let mut genetic = match params.strategy {
            AssignmentStrategy::Genetic(genetic) => genetic,
            AssignmentStrategy::Greedy => GeneticParams::default(),
        };
        if let Some(seed) = args.seed {
            genetic.seed = Some(seed);
        }
        if let Some(threads) = args.threads {
            genetic.threads = Threads::Multi(threads);
        }
        params.strategy = AssignmentStrategy::Genetic(genetic);
    }
    if args.no_return {
        params.route.return_to_depot = false;
    }
    if let Some(hour) = args.hour {
        params.route.conditions.hour = Some(hour);
        params.route.conditions.period = DayPeriod::from_hour(hour);
    }
    if let Some(season) = args.season {
        params.route.conditions.season = season;
    }

    Ok(params)
}

/// Cancels `token` once `timeout` elapsed. The watcher thread is left running when planning
/// finishes first.
fn cancel_after(token: CancellationToken, timeout: jiff::SignedDuration) -> Result<(), anyhow::Error> {
    let timeout = std::time::Duration::try_from(timeout.abs())?;
    thread::spawn(move || {
        thread::sleep(timeout);
        token.cancel();
    });
    Ok(())
}

pub fn run(args: PlanArgs) -> Result<(), anyhow::Error> {
    let params = scheduler_params(&args)?;
    let mut state = read_state(&args.input)?;

    let mut context = PlanningContext::default();
    if let Some(timeout) = args.timeout {
        cancel_after(context.token().clone(), timeout)?;
    }

    let scheduler = Scheduler::new(&params);
    let report = match args.day {
        Some(day) => {
            let day_report = scheduler.plan_day(&mut state, day, &mut context)?;
            ScheduleReport {
                delivered: day_report.delivered_total,
                total: state.packages().len(),
                days: vec![day_report],
            }
        }
        None => scheduler.plan_horizon(&mut state, &mut context)?,
    };

    println!("{}", schedule_table(&report));
    println!("{}", fleet_table(&state));

    let statistics = context.statistics();
    info!(
        "Planned in {}: delivered = {}/{}, routes = {}, charging stops = {}, rest stops = {}",
        context.elapsed(),
        report.delivered,
        report.total,
        statistics.routes_built,
        statistics.charging_stops,
        statistics.rest_stops,
    );
    if report.delivered < report.total {
        warn!("{} packages left undelivered", report.total - report.delivered);
    }

    write_state(&state, args.output.as_deref())
}
