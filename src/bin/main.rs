use std::{cell::RefCell, path::PathBuf};

use clap::Parser;
use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_time::{Instant, Timer};
use log::{error, info, warn};
use pacer_core::{
    app::{ReaderConfig, ReaderSession},
    clock::TickResult,
    rate::{DEFAULT_WPM, RateCell, clamp_wpm},
    settings::{PreferenceStore, PreferenceSync, Preferences},
    text_policy::remaining_label,
};
use pacer_services::RecordStore;
use tracing_subscriber::EnvFilter;

use file_storage::FileStorage;
use surface::TerminalSurface;

#[path = "main/file_storage.rs"]
mod file_storage;
#[path = "main/surface.rs"]
mod surface;

const FRAME_MS: u64 = 8;
const ESTIMATE_LOG_INTERVAL_MS: u64 = 1_000;
const REPORT_INTERVAL_MS: u64 = 5_000;
const PREFS_CAPACITY_BYTES: usize = 4_096;
const PREFS_BASE_OFFSET: u32 = 0;

static RATE: RateCell = RateCell::new(DEFAULT_WPM);

type PrefsStore = RecordStore<FileStorage>;

#[derive(Debug, Parser)]
#[command(name = "pacer", version, about = "Rapid serial visual presentation in the terminal")]
struct Args {
    /// Text file to read.
    path: PathBuf,

    /// Base reading rate in words per minute.
    #[arg(long)]
    wpm: Option<u16>,

    /// Ramp the rate up to this many words per minute while reading.
    #[arg(long)]
    ramp_to: Option<u16>,

    /// Seconds the ramp takes to reach its target.
    #[arg(long)]
    ramp_secs: Option<f64>,

    /// Read at a constant rate even if a ramp was saved.
    #[arg(long, conflicts_with = "ramp_to")]
    no_ramp: bool,

    /// Where preferences are kept between runs.
    #[arg(long, default_value = "pacer.prefs")]
    prefs: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

fn open_store(args: &Args) -> Option<PrefsStore> {
    let storage = match FileStorage::open(&args.prefs, PREFS_CAPACITY_BYTES) {
        Ok(storage) => storage,
        Err(err) => {
            warn!(
                "prefs: cannot open {}: {}; running without persistence",
                args.prefs.display(),
                err
            );
            return None;
        }
    };

    match RecordStore::open(storage, PREFS_BASE_OFFSET) {
        Ok(store) => Some(store),
        Err(err) => {
            warn!("prefs: unreadable record ({:?}); running without persistence", err);
            None
        }
    }
}

fn restore_preferences(store: Option<&PrefsStore>) -> Preferences {
    let Some(store) = store else {
        return Preferences::default();
    };

    match Preferences::load(store) {
        Ok(prefs) => prefs,
        Err(err) => {
            warn!("prefs: load failed ({:?}); using defaults", err);
            Preferences::default()
        }
    }
}

fn apply_args(prefs: &mut Preferences, args: &Args) {
    if let Some(wpm) = args.wpm {
        prefs.wpm = clamp_wpm(wpm as i64);
    }
    if let Some(target) = args.ramp_to {
        prefs.ramp.enabled = true;
        prefs.ramp.target_wpm = clamp_wpm(target as i64);
    }
    if let Some(secs) = args.ramp_secs.filter(|secs| secs.is_finite()) {
        prefs.ramp.duration_secs = secs.max(0.0);
    }
    if args.no_ramp {
        prefs.ramp.enabled = false;
    }
}

fn flush_preferences<S: PreferenceStore>(
    sync: &mut PreferenceSync,
    store: Option<&mut S>,
    now_ms: u64,
    force: bool,
) {
    let Some(store) = store else {
        return;
    };

    let flushed = if force {
        sync.flush_now(store, now_ms)
    } else {
        sync.flush_if_due(store, now_ms)
    };
    if flushed {
        info!("prefs: saved");
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    init_tracing();
    let args = Args::parse();

    let raw = match std::fs::read_to_string(&args.path) {
        Ok(raw) => raw,
        Err(err) => {
            error!("cannot read {}: {}", args.path.display(), err);
            std::process::exit(1);
        }
    };

    let mut store = open_store(&args);
    let restored = restore_preferences(store.as_ref());
    let mut prefs = restored.clone();
    apply_args(&mut prefs, &args);

    let mut settings_sync = PreferenceSync::new(restored);
    settings_sync.track_current(&prefs, now_ms());

    let session = RefCell::new(ReaderSession::new(&RATE, ReaderConfig::from(&prefs)));
    let mut surface = TerminalSurface::new();
    {
        let mut session = session.borrow_mut();
        session.load_text(raw);
        if session.text().is_empty() {
            warn!("{} has no words to read", args.path.display());
            flush_preferences(&mut settings_sync, store.as_mut(), now_ms(), true);
            std::process::exit(0);
        }

        let config = session.config();
        info!(
            "Reader started: words={} wpm={} ramp_enabled={} ramp_target_wpm={} ramp_secs={}",
            session.text().len(),
            config.wpm,
            config.ramp.enabled,
            config.ramp.target_wpm,
            config.ramp.duration_secs
        );

        let now = now_ms();
        session.start(now);
        surface.show(&session.view(now));
    }

    let frame_future = async {
        let mut report_words = 0u64;
        let mut report_start = now_ms();

        loop {
            let now = now_ms();
            let result = session.borrow_mut().poll(now);
            match result {
                TickResult::Advanced => surface.show(&session.borrow().view(now)),
                TickResult::Finished => break,
                TickResult::Idle => {}
            }

            report_words =
                report_words.saturating_add(session.borrow_mut().drain_word_updates() as u64);
            let elapsed_ms = now.saturating_sub(report_start);
            if elapsed_ms >= REPORT_INTERVAL_MS {
                let wpm_x100 = report_words * 6_000_000 / elapsed_ms.max(1);
                info!(
                    "effective_wpm={}.{:02} live_wpm={} words={} elapsed_ms={}",
                    wpm_x100 / 100,
                    wpm_x100 % 100,
                    session.borrow().effective_wpm(),
                    report_words,
                    elapsed_ms
                );
                report_words = 0;
                report_start = now;
            }

            settings_sync.track_current(&session.borrow().preferences(&prefs), now);
            flush_preferences(&mut settings_sync, store.as_mut(), now, false);
            Timer::after_millis(FRAME_MS).await;
        }
    };

    let estimate_future = async {
        loop {
            Timer::after_millis(ESTIMATE_LOG_INTERVAL_MS).await;
            let seconds = session.borrow().seconds_remaining(now_ms());
            info!("remaining {}", remaining_label(seconds));
        }
    };

    if let Either::First(()) = select(frame_future, estimate_future).await {
        surface.finish();
        info!("Reader finished");
    }

    flush_preferences(&mut settings_sync, store.as_mut(), now_ms(), true);
    std::process::exit(0);
}
