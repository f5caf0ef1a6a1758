use clap::Parser;
use log::*;
#[cfg(debug_assertions)]
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::{
    append::rolling_file::{
        RollingFileAppender,
        policy::compound::{
            CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
        },
    },
    config::{Appender, Config as LogConfig, Logger, Root},
    encode::pattern::PatternEncoder,
};
use scoreboard_common::{
    match_state::MatchState,
    match_time::{countdown_seconds, format_clock, split_clock},
    periods::PeriodSchedule,
};
use scoreboard_sync::{
    commands::CommandClient,
    config::{APP_NAME, AppConfig},
    settings::Settings,
    store::StateStore,
    transport::PushTransport,
};
use std::{error::Error, path::PathBuf};
use tokio::runtime;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(long, short, action(clap::ArgAction::Count))]
    /// Increase the log verbosity
    verbose: u8,

    #[clap(long)]
    /// Directory within which log files will be placed, default is platform dependent
    log_location: Option<PathBuf>,

    #[clap(long, default_value = "5000000")]
    /// Max size in bytes that a log file is allowed to reach before being rolled over
    log_max_file_size: u64,

    #[clap(long, default_value = "3")]
    /// Number of archived logs to keep
    num_old_logs: u32,

    #[clap(long)]
    /// Base URL of the match authority, overrides the config file
    authority_url: Option<String>,

    #[clap(long)]
    /// Websocket URL the authority pushes updates on, overrides the config file
    push_url: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    init_logging(&args)?;

    let mut config = AppConfig::load_or_default();
    if let Some(url) = args.authority_url {
        config.authority_url = url;
    }
    if let Some(url) = args.push_url {
        config.push_url = url;
    }
    let settings = Settings::load_or_default();
    info!("Starting with {config:?} and {settings:?}");

    let runtime = runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config, settings))
}

async fn run(config: AppConfig, settings: Settings) -> Result<(), Box<dyn Error>> {
    let client = CommandClient::new(&config.authority_url, config.command_timeout())?;
    let schedule = match client.get_periods().await {
        Ok(schedule) => schedule,
        Err(e) => {
            warn!("Could not load the period schedule, using default period ends: {e}");
            PeriodSchedule::default()
        }
    };

    let store = StateStore::new();

    let _scoreboard = store.subscribe(move |state| {
        if let Some(line) = scoreboard_line(state, &schedule, settings.futsal_clock) {
            info!("{line}");
        }
        Ok(())
    });
    let _connection = store.subscribe_connection_status(|connected| {
        if *connected {
            info!("Connected to the authority");
        } else {
            warn!("Lost connection to the authority");
        }
        Ok(())
    });

    let transport = PushTransport::spawn(&config.push_url, config.reconnect_delay(), store)?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    drop(transport);
    Ok(())
}

/// One line summary like `HOM 01 - 00 AWY 45:00 +00:12`
fn scoreboard_line(state: &MatchState, schedule: &PeriodSchedule, futsal: bool) -> Option<String> {
    let teams = &state.config.as_ref()?.teams;
    let period = &state.config.as_ref()?.current_period;
    let boundary = schedule.boundary_for(period);
    let elapsed = state.timer.elapsed_seconds;

    let clock = if futsal || state.futsal_clock_on {
        format_clock(countdown_seconds(elapsed, boundary))
    } else {
        let (main, additional) = split_clock(elapsed, boundary);
        if additional > 0 {
            format!("{} +{}", format_clock(main), format_clock(additional))
        } else {
            format_clock(main)
        }
    };

    let mut line = format!(
        "{} {} - {} {} {clock}",
        teams.home.display_code(),
        teams.home.formatted_score(),
        teams.away.formatted_score(),
        teams.away.display_code(),
    );
    if state.extra_time.is_visible && state.extra_time.minutes > 0 {
        line.push_str(&format!(" (+{}')", state.extra_time.minutes));
    }
    if !period.is_empty() {
        line.push_str(&format!(" [{period}]"));
    }
    Some(line)
}

fn init_logging(args: &Cli) -> Result<(), Box<dyn Error>> {
    let log_level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let log_base_path = match &args.log_location {
        Some(path) => path.clone(),
        None => {
            let mut path = directories::BaseDirs::new()
                .ok_or("Could not find a directory to store logs")?
                .data_local_dir()
                .to_path_buf();
            path.push("scoreboard-sync-logs");
            path
        }
    };
    let mut log_path = log_base_path.clone();
    let mut archived_log_path = log_base_path.clone();
    log_path.push(format!("{APP_NAME}-log.txt"));
    archived_log_path.push(format!("{APP_NAME}-log-{{}}.txt.gz"));

    #[cfg(debug_assertions)]
    println!("Log path: {}", log_path.display());

    // Only log to the console in debug mode
    #[cfg(all(debug_assertions, not(target_os = "windows")))]
    let console_target = Target::Stderr;
    #[cfg(all(debug_assertions, target_os = "windows"))]
    let console_target = Target::Stdout; // Windows apps don't get a stderr handle
    #[cfg(debug_assertions)]
    let console = ConsoleAppender::builder()
        .target(console_target)
        .encoder(Box::new(PatternEncoder::new("[{d} {h({l:5})} {M}] {m}{n}")))
        .build();

    let roller = FixedWindowRoller::builder().build(
        archived_log_path
            .to_str()
            .ok_or("Log path is not valid unicode")?,
        args.num_old_logs,
    )?;
    let file_policy = CompoundPolicy::new(
        Box::new(SizeTrigger::new(args.log_max_file_size)),
        Box::new(roller),
    );
    let file_appender = RollingFileAppender::builder()
        .append(true)
        .encoder(Box::new(PatternEncoder::new("[{d} {l:5} {M}] {m}{n}")))
        .build(log_path, Box::new(file_policy))?;

    // Everything else only logs errors
    let root = Root::builder().appender("file_appender");
    #[cfg(debug_assertions)]
    let root = root.appender("console");
    let root = root.build(LevelFilter::Error);

    let log_config = LogConfig::builder()
        .appender(Appender::builder().build("file_appender", Box::new(file_appender)));

    #[cfg(debug_assertions)]
    let log_config = log_config.appender(Appender::builder().build("console", Box::new(console)));

    let log_config = log_config
        .logger(Logger::builder().build("scoreboard_sync", log_level))
        .logger(Logger::builder().build("scoreboard_common", log_level))
        .build(root)?;

    log4rs::init_config(log_config)?;
    log_panics::init();
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use scoreboard_common::{
        match_state::{ExtraTimeStatus, MatchAggregate, TimerStatus},
        periods::PeriodSetting,
    };

    fn state(elapsed_seconds: u32) -> MatchState {
        let mut config = MatchAggregate {
            current_period: "First Half".to_string(),
            ..Default::default()
        };
        config.teams.home.name = "Home".to_string();
        config.teams.home.abbreviation = "HOM".to_string();
        config.teams.home.score = 1;
        config.teams.away.name = "AWY".to_string();
        MatchState {
            config: Some(config),
            timer: TimerStatus {
                is_running: true,
                elapsed_seconds,
            },
            ..Default::default()
        }
    }

    fn schedule() -> PeriodSchedule {
        vec![PeriodSetting::new("First Half", 45)].into()
    }

    #[test]
    fn test_scoreboard_line() {
        assert_eq!(
            scoreboard_line(&state(2712), &schedule(), false).unwrap(),
            "HOM 01 - 00 AWY 45:00 +00:12 [First Half]"
        );
        assert_eq!(
            scoreboard_line(&state(600), &schedule(), false).unwrap(),
            "HOM 01 - 00 AWY 10:00 [First Half]"
        );
        assert_eq!(
            scoreboard_line(&state(600), &schedule(), true).unwrap(),
            "HOM 01 - 00 AWY 35:00 [First Half]"
        );
    }

    #[test]
    fn test_scoreboard_line_extra_time() {
        let mut state = state(60);
        state.extra_time = ExtraTimeStatus {
            minutes: 3,
            is_visible: true,
        };
        assert_eq!(
            scoreboard_line(&state, &schedule(), false).unwrap(),
            "HOM 01 - 00 AWY 01:00 (+3') [First Half]"
        );
    }

    #[test]
    fn test_no_line_before_sync() {
        assert_eq!(
            scoreboard_line(&MatchState::default(), &schedule(), false),
            None
        );
    }
}
