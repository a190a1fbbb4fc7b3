//! Print the compiled model.

use clap::Args;

use audioroute_core::{Ctl, CtlIndex, CtlValue, Model, Stream, VolumeControl, devices};

use super::common::ConfigArgs;

/// Print devices, paths and streams as loaded.
#[derive(Args)]
pub struct DumpArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Run the dump command.
pub fn run(args: DumpArgs) -> anyhow::Result<()> {
    let (_card, manager) = args.config.open()?;
    println!("Card {}", manager.card());
    manager.with_model(print_model);
    Ok(())
}

fn print_model(model: &Model) {
    for device in &model.devices {
        println!(
            "Device {} ({:#x})",
            devices::device_name(device.mask),
            device.mask
        );
        for path in &device.paths {
            println!("  path {}", model.path_name(path.id).unwrap_or("?"));
            for ctl in &path.ctls {
                println!("    {}", format_ctl(ctl));
            }
        }
    }

    for (i, stream) in model.anon_streams.iter().enumerate() {
        println!("Stream #{i} {}", describe_stream(stream));
        print_stream_body(model, stream);
    }
    for stream in &model.named_streams {
        println!(
            "Stream '{}' {}",
            stream.name.as_deref().unwrap_or(""),
            describe_stream(stream)
        );
        print_stream_body(model, stream);
    }
}

fn describe_stream(stream: &Stream) -> String {
    let info = &stream.info;
    let mut s = format!("{} card {}", info.stream_type, info.card_number);
    if info.has_device() {
        s.push_str(&format!(" device {}", info.device_number));
    }
    if info.rate != 0 {
        s.push_str(&format!(" rate {}", info.rate));
    }
    if info.period_size != 0 || info.period_count != 0 {
        s.push_str(&format!(" periods {}x{}", info.period_count, info.period_size));
    }
    if stream.max_ref_count != audioroute_config::UNLIMITED_INSTANCES {
        s.push_str(&format!(" instances {}", stream.max_ref_count));
    }
    s
}

fn print_stream_body(model: &Model, stream: &Stream) {
    let path = |id| model.path_name(id).unwrap_or("?");
    if let Some(id) = stream.enable_path {
        println!("  enable {}", path(id));
    }
    if let Some(id) = stream.disable_path {
        println!("  disable {}", path(id));
    }
    for (function, vol) in [("leftvol", &stream.volume_left), ("rightvol", &stream.volume_right)] {
        if let Some(vol) = vol {
            println!("  {function} {}", format_volume(vol));
        }
    }
    for usecase in &stream.usecases {
        println!("  usecase {}", usecase.name);
        for case in &usecase.cases {
            println!("    case {}", case.name);
            for ctl in &case.ctls {
                println!("      {}", format_ctl(ctl));
            }
        }
    }
    for constant in &stream.constants {
        println!("  set {} = {}", constant.name, constant.value);
    }
}

fn format_volume(vol: &VolumeControl) -> String {
    format!("'{}'[{}] {}..{}", vol.name, vol.index, vol.min, vol.max)
}

fn format_ctl(ctl: &Ctl) -> String {
    let target = match ctl.index {
        CtlIndex::All => format!("'{}'", ctl.name),
        CtlIndex::At(i) => format!("'{}'[{}]", ctl.name, i),
    };
    let value = match &ctl.value {
        CtlValue::Pending(text) => format!("{text} (unbound)"),
        CtlValue::PendingFile(path) => format!("<{}> (unbound)", path.display()),
        CtlValue::Int(v) => v.to_string(),
        CtlValue::Enum(item) => item.clone(),
        CtlValue::Bytes(block) => {
            let hex: Vec<String> = block.data.iter().map(|b| format!("{b:02x}")).collect();
            format!("[{}]", hex.join(" "))
        }
    };
    format!("{target} = {value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctl_formatting() {
        let ctl = Ctl::new("Speaker Switch", CtlIndex::All, CtlValue::Int(1));
        assert_eq!(format_ctl(&ctl), "'Speaker Switch' = 1");

        let ctl = Ctl::new("Mux", CtlIndex::At(2), CtlValue::Pending("ADC".into()));
        assert_eq!(format_ctl(&ctl), "'Mux'[2] = ADC (unbound)");
    }
}
