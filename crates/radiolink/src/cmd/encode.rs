use radiolink_frame::{FrameEncoder, FrameWriter};
use radiolink_station::StationConfig;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, mut config: StationConfig, format: OutputFormat) -> CliResult<i32> {
    args.payload.apply(&mut config);
    let payload = args.payload.read_payload()?;

    let mut writer = FrameWriter::with_encoder(Vec::new(), FrameEncoder::new(config.encoder_config()));
    if args.payload.raw {
        writer.send_raw(&payload)
    } else {
        writer.send(&payload, args.payload.to, args.payload.options())
    }
    .map_err(|err| frame_error("encode failed", err))?;

    print_encoded(&writer.into_inner(), !args.payload.raw, format);
    Ok(SUCCESS)
}
