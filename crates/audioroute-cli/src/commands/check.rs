//! Validate a config against a virtual card.

use clap::Args;

use super::common::ConfigArgs;

/// Load a config and summarize it.
#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Run the check command.
pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let (card, manager) = args.config.open()?;
    let setup_writes = card.writes().len();

    let (devices, paths, ctls, anon, named) = manager.with_model(|m| {
        (
            m.devices.len(),
            m.devices.iter().map(|d| d.paths.len()).sum::<usize>(),
            m.path_ctl_count(),
            m.anon_streams.len(),
            m.named_streams.len(),
        )
    });

    println!("Config:       {}", args.config.config.display());
    println!("Card:         {}", manager.card());
    println!("Devices:      {devices} ({paths} paths, {ctls} controls)");
    println!("Outputs:      {:#010x}", manager.get_supported_output_devices());
    println!("Inputs:       {:#010x}", manager.get_supported_input_devices());
    println!("Streams:      {anon} anonymous, {named} named");
    println!("Setup writes: {setup_writes}");
    println!("OK");

    Ok(())
}
