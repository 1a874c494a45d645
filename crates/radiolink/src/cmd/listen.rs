use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use radiolink_frame::FrameError;
use radiolink_station::{EventChannel, Station, StationConfig, StationError, StationEvent};
use radiolink_transport::PortConfig;
use tracing::{debug, info};

use crate::cmd::ListenArgs;
use crate::exit::{station_error, CliError, CliResult, SUCCESS};
use crate::output::{print_audio, print_message, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: ListenArgs, mut config: StationConfig, format: OutputFormat) -> CliResult<i32> {
    if let Some(station_id) = args.station {
        config.station_id = station_id;
    }

    let mut port = if args.connect {
        PortConfig::connect(&args.path)
    } else {
        PortConfig::listen(&args.path)
    };
    port.read_timeout = Some(POLL_INTERVAL);

    let (events, rx) = EventChannel::new();
    let mut station = Station::with_events(config, events);
    if args.raw {
        station.set_use_header(false);
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        if !station.is_open() {
            station
                .open(&port)
                .map_err(|err| station_error("open failed", err))?;
            info!(station = station.config().station_id, path = ?args.path, "listening");
        }

        match station.poll() {
            Ok(_) => {}
            Err(StationError::Frame(FrameError::Io(err)))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(StationError::Frame(FrameError::ConnectionClosed)) => {
                debug!("far end closed the link");
                if args.connect {
                    break;
                }
            }
            Err(err) => return Err(station_error("receive failed", err)),
        }

        printed += drain(&mut station, &rx, format);
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    station.close();
    Ok(SUCCESS)
}

/// Print everything the last poll produced. Returns how many deliveries were printed.
fn drain(station: &mut Station, rx: &Receiver<StationEvent>, format: OutputFormat) -> usize {
    let mut printed = 0usize;
    while let Some(message) = station.next_message() {
        print_message(&message, format);
        printed += 1;
    }
    while let Ok(event) = rx.try_recv() {
        let (kind, data) = match event {
            StationEvent::AudioReceived(data) => ("AUDIO", data),
            StationEvent::AudioStreamReceived(data) => ("AUDIO_STREAM", data),
            StationEvent::RawReceived(data) => ("raw", data),
            StationEvent::QueueSizeChanged(_) | StationEvent::PlaybackStopped => continue,
        };
        print_audio(kind, &data, format);
        printed += 1;
    }
    printed
}

/// First Ctrl-C stops the poll loop; a second one exits even while blocked opening the port.
fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    let hits = AtomicUsize::new(0);
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        if hits.fetch_add(1, Ordering::SeqCst) > 0 {
            std::process::exit(130);
        }
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
