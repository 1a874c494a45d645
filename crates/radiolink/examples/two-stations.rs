//! Two stations on one simulated link: station 1 sends, station 3 receives.
//!
//! Run with:
//!   cargo run --example two-stations

use std::time::Duration;

use radiolink::frame::DecodeOptions;
use radiolink::station::{EventChannel, Station, StationConfig, StationEvent};
use radiolink::transport::LinkStream;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (left, right) = LinkStream::pair()?;
    right.set_read_timeout(Some(Duration::from_secs(1)))?;

    let mut alpha = Station::new(StationConfig::for_station(1));
    let (events, rx) = EventChannel::new();
    let mut bravo = Station::with_events(StationConfig::for_station(3), events);
    alpha.attach(left)?;
    bravo.attach(right)?;

    alpha.write(b"HELLO", 3, true, DecodeOptions::text().with_rle().with_xor())?;
    alpha.write(&[0x40; 512], 0, true, DecodeOptions::audio().with_rle())?;

    let mut frames = 0;
    while frames < 2 {
        frames += bravo.poll()?;
    }

    while let Some(message) = bravo.next_message() {
        println!(
            "text from {} (seq {}): {}",
            message.sender_id,
            message.sequence,
            message.text()
        );
    }
    for event in rx.try_iter() {
        if let StationEvent::AudioReceived(audio) = event {
            println!("audio broadcast: {} bytes", audio.len());
        }
    }

    Ok(())
}
