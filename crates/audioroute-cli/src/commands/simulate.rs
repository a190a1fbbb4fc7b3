//! Run a routing script against a virtual card.
//!
//! Script lines (blank lines and `#` comments are skipped):
//!
//! ```text
//! open speaker pcm          # anonymous stream for a device list, slot 0
//! open voice                # named stream, slot 1
//! open "voice trigger"      # quote names containing spaces
//! route 0 headphone
//! usecase 1 mode call
//! volume 0 80 80
//! close 0
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use audioroute_core::{AudioFormat, OutputFlags};
use audioroute_engine::{ConfigManager, StreamHandle};
use audioroute_mixer::mock::MockCard;

use super::common::{ConfigArgs, parse_devices, parse_format};

/// Simulate stream and routing operations.
#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Script file, one operation per line ("-" reads stdin)
    #[arg(long)]
    pub script: PathBuf,
}

/// One script operation.
#[derive(Debug, PartialEq)]
enum Step {
    Open {
        target: String,
        format: Option<String>,
    },
    Route {
        slot: usize,
        devices: String,
    },
    UseCase {
        slot: usize,
        setting: String,
        case: String,
    },
    Volume {
        slot: usize,
        left: i32,
        right: i32,
    },
    Close {
        slot: usize,
    },
}

fn slot(s: &str) -> anyhow::Result<usize> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("'{}' is not a slot number", s))
}

fn percent(s: &str) -> anyhow::Result<i32> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("'{}' is not a volume", s))
}

/// Split a line into words. A double-quoted word may contain spaces.
fn split_words(line: &str) -> anyhow::Result<Vec<&str>> {
    let mut words = Vec::new();
    let mut rest = line.trim_start();
    while !rest.is_empty() {
        let (word, tail) = if let Some(quoted) = rest.strip_prefix('"') {
            let Some(end) = quoted.find('"') else {
                anyhow::bail!("Unterminated quote in '{}'", line);
            };
            (&quoted[..end], &quoted[end + 1..])
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            rest.split_at(end)
        };
        words.push(word);
        rest = tail.trim_start();
    }
    Ok(words)
}

fn parse_step(line: &str) -> anyhow::Result<Option<Step>> {
    let line = line.split('#').next().unwrap_or("").trim();
    let words = split_words(line)?;

    let step = match words.as_slice() {
        [] => return Ok(None),
        ["open", target] => Step::Open {
            target: (*target).to_string(),
            format: None,
        },
        ["open", target, format] => Step::Open {
            target: (*target).to_string(),
            format: Some((*format).to_string()),
        },
        ["route", s, devices] => Step::Route {
            slot: slot(s)?,
            devices: (*devices).to_string(),
        },
        ["usecase", s, setting, case] => Step::UseCase {
            slot: slot(s)?,
            setting: (*setting).to_string(),
            case: (*case).to_string(),
        },
        ["volume", s, left, right] => Step::Volume {
            slot: slot(s)?,
            left: percent(left)?,
            right: percent(right)?,
        },
        ["close", s] => Step::Close { slot: slot(s)? },
        _ => anyhow::bail!("Unrecognized operation '{}'", line),
    };
    Ok(Some(step))
}

/// Open streams by slot. Closed slots stay `None` so numbering is stable.
struct Session<'a> {
    manager: &'a ConfigManager,
    slots: Vec<Option<StreamHandle>>,
}

impl Session<'_> {
    fn stream(&self, slot: usize) -> anyhow::Result<StreamHandle> {
        self.slots
            .get(slot)
            .copied()
            .flatten()
            .ok_or_else(|| anyhow::anyhow!("Slot {} is not open", slot))
    }

    /// Run one step and describe what it did.
    fn run(&mut self, step: Step) -> anyhow::Result<String> {
        let m = self.manager;
        match step {
            Step::Open { target, format } => {
                let handle = if m.is_named_stream_defined(&target) {
                    m.get_named_stream(&target)
                } else {
                    let devices = parse_devices(&target)?;
                    let format = match format {
                        Some(f) => parse_format(&f)?,
                        None => AudioFormat::PCM_16_BIT,
                    };
                    m.get_stream(devices, OutputFlags::NONE, format)
                };
                let Some(handle) = handle else {
                    return Ok("no stream available".into());
                };
                self.slots.push(Some(handle));
                Ok(format!(
                    "slot {} = {} card {}",
                    self.slots.len() - 1,
                    handle.stream_type(),
                    handle.info().card_number
                ))
            }
            Step::Route { slot, devices } => {
                let stream = self.stream(slot)?;
                m.apply_route(&stream, parse_devices(&devices)?);
                Ok(format!("routes {:#x}", m.get_current_routes(&stream)))
            }
            Step::UseCase {
                slot,
                setting,
                case,
            } => {
                m.apply_use_case(&self.stream(slot)?, &setting, &case)?;
                Ok(format!("{setting} = {case}"))
            }
            Step::Volume { slot, left, right } => {
                m.set_hw_volume(&self.stream(slot)?, left, right)?;
                Ok(format!("volume {left}/{right}"))
            }
            Step::Close { slot } => {
                let stream = self.stream(slot)?;
                m.release_stream(&stream);
                self.slots[slot] = None;
                Ok(format!("slot {slot} closed"))
            }
        }
    }
}

fn read_script(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_writes(card: &MockCard) {
    let writes = card.take_writes();
    if writes.is_empty() {
        println!("    (no writes)");
    }
    for write in writes {
        println!("    {write}");
    }
}

/// Run the simulate command.
pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let script = read_script(&args.script)?;
    let (card, manager) = args.config.open()?;

    println!("setup");
    print_writes(&card);

    let mut session = Session {
        manager: &manager,
        slots: Vec::new(),
    };

    for (n, line) in script.lines().enumerate() {
        let context = || format!("line {}: {}", n + 1, line.trim());
        let Some(step) = parse_step(line).with_context(context)? else {
            continue;
        };
        let outcome = session.run(step).with_context(context)?;
        println!("{}: {}", line.trim(), outcome);
        print_writes(&card);
    }

    Ok(())
}
