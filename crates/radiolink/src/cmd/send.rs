use radiolink_frame::{FrameConfig, FrameEncoder, FrameWriter};
use radiolink_station::StationConfig;
use radiolink_transport::PortConfig;
use tracing::info;

use crate::cmd::{describe_options, parse_duration, SendArgs};
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_sent, OutputFormat};

pub fn run(args: SendArgs, mut config: StationConfig, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    args.payload.apply(&mut config);
    let payload = args.payload.read_payload()?;
    let options = args.payload.options();

    let port = if args.listen {
        PortConfig::listen(&args.path)
    } else {
        PortConfig::connect(&args.path)
    };
    let link =
        radiolink_transport::open(&port).map_err(|err| transport_error("open failed", err))?;

    let frame_config = FrameConfig {
        max_payload_size: config.max_payload_size,
        write_timeout: Some(timeout),
        ..FrameConfig::default()
    };
    let encoder = FrameEncoder::new(config.encoder_config());
    let mut writer = FrameWriter::with_config_link(link, encoder, &frame_config)
        .map_err(|err| frame_error("open failed", err))?;

    let written = if args.payload.raw {
        writer.send_raw(&payload)
    } else {
        writer.send(&payload, args.payload.to, options)
    }
    .map_err(|err| frame_error("send failed", err))?;

    let label = if args.payload.raw {
        "raw".to_string()
    } else {
        describe_options(options)
    };
    info!(to = args.payload.to, options = %label, written, "frame sent");
    print_sent(args.payload.kind(), args.payload.to, &label, written, format);

    Ok(SUCCESS)
}
