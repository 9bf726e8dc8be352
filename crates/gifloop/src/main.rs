use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossbeam_channel::{Receiver, RecvError, never, select, unbounded};

use gifloop::{CompositedFrame, PlayDirection, Player, PlayerConfig};

const USAGE: &str = "usage: gifloop <file.gif> [--dump <dir>]";

#[derive(Debug, PartialEq)]
struct Args {
    path: PathBuf,
    dump_dir: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut path = None;
    let mut dump_dir = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dump" => {
                let Some(dir) = args.next() else {
                    bail!("--dump needs a directory\n{USAGE}");
                };
                dump_dir = Some(PathBuf::from(dir));
            }
            "-h" | "--help" => bail!("{USAGE}"),
            _ if path.is_none() => path = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument '{arg}'\n{USAGE}"),
        }
    }

    let Some(path) = path else {
        bail!("{USAGE}");
    };
    Ok(Args { path, dump_dir })
}

#[derive(Debug, PartialEq)]
enum Command {
    Direction(PlayDirection),
    Delay(Duration),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let cmd = match words.next()? {
        "play" | "p" => Command::Direction(PlayDirection::Play),
        "pause" | "s" => Command::Direction(PlayDirection::Pause),
        "rewind" | "r" => Command::Direction(PlayDirection::Rewind),
        "delay" | "d" => {
            let ms: u64 = words.next()?.parse().ok()?;
            Command::Delay(Duration::from_millis(ms))
        }
        "quit" | "q" => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

/// Read commands from stdin on a background thread. The channel disconnects on EOF.
fn spawn_command_reader() -> Result<Receiver<Command>> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("gifloop-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Some(cmd) => {
                        if tx.send(cmd).is_err() {
                            break;
                        }
                    }
                    None => log::warn!("Unknown command: {}", line.trim()),
                }
            }
        })
        .context("spawn stdin reader")?;
    Ok(rx)
}

/// What the main loop does after one message from the command channel.
#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    /// Stdin hit EOF; playback carries on without further commands.
    InputClosed,
    Quit,
}

fn apply_command(player: &Player, msg: Result<Command, RecvError>) -> Flow {
    match msg {
        Ok(Command::Direction(direction)) => player.set_direction(direction),
        Ok(Command::Delay(delay)) => player.set_delay(delay),
        Ok(Command::Quit) => return Flow::Quit,
        Err(RecvError) => return Flow::InputClosed,
    }
    Flow::Continue
}

fn mean_rgb(frame: &CompositedFrame) -> [u8; 3] {
    let count = u64::from(frame.image.width()) * u64::from(frame.image.height());
    if count == 0 {
        return [0; 3];
    }
    let mut sum = [0u64; 3];
    for px in frame.image.pixels() {
        for (acc, &c) in sum.iter_mut().zip(&px.0[..3]) {
            *acc += u64::from(c);
        }
    }
    sum.map(|s| (s / count) as u8)
}

fn show_frame(frame: &CompositedFrame, dump_dir: Option<&Path>) {
    let (w, h) = frame.dimensions();
    let [r, g, b] = mean_rgb(frame);
    log::info!("Frame {} ({w}x{h}) mean rgb({r}, {g}, {b})", frame.index);

    if let Some(dir) = dump_dir {
        let path = dir.join(format!("frame_{:04}.png", frame.index));
        if let Err(e) = frame.image.save(&path) {
            log::error!("Failed to write {}: {e}", path.display());
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if let Some(dir) = &args.dump_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create dump dir '{}'", dir.display()))?;
    }

    let config = PlayerConfig::load();
    let (frame_tx, frame_rx) = unbounded::<Arc<CompositedFrame>>();
    let player = Player::open_with_config(&args.path, &config, move |frame| {
        let _ = frame_tx.send(frame);
    })
    .with_context(|| format!("play '{}'", args.path.display()))?;

    let mut commands = spawn_command_reader()?;
    log::info!("Commands: play, pause, rewind, delay <ms>, quit");

    loop {
        select! {
            recv(frame_rx) -> frame => match frame {
                Ok(frame) => show_frame(&frame, args.dump_dir.as_deref()),
                Err(_) => break,
            },
            recv(commands) -> cmd => match apply_command(&player, cmd) {
                Flow::Continue => {}
                Flow::InputClosed => {
                    log::info!("Stdin closed, playing until interrupted");
                    commands = never();
                }
                Flow::Quit => break,
            },
        }
    }

    log::info!("Stopping playback");
    Ok(())
}
