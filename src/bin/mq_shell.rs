use std::{
    error::Error,
    io::{self, BufRead, Write},
    sync::{Arc, mpsc},
    thread,
    time::Duration,
};

use clap::{Parser, ValueEnum};
use log::{debug, warn};
use mercury::{BodyFraming, Client, ClientConfig, Command};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Framing {
    /// Read the body as a single line
    Line,
    /// Read exactly Content-Length bytes
    ContentLength,
}

impl From<Framing> for BodyFraming {
    fn from(value: Framing) -> Self {
        match value {
            Framing::Line => BodyFraming::Line,
            Framing::ContentLength => BodyFraming::ContentLength,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Broker host
    #[arg(default_value = "localhost")]
    host: String,
    /// Broker port
    #[arg(default_value = "9620")]
    port: String,
    /// Name of this client's queue on the broker
    #[arg(env = "USER", default_value = "echo_client_test")]
    name: String,
    /// How poll response bodies are read
    #[arg(long, value_enum, default_value_t = Framing::Line)]
    framing: Framing,
    /// Connect/read/write timeout in milliseconds; blocks indefinitely when unset
    #[arg(long)]
    io_timeout_ms: Option<u64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let config = ClientConfig::parse(&cli.host, &cli.port)?
        .framing(cli.framing.into())
        .io_timeout(cli.io_timeout_ms.map(Duration::from_millis));
    let client = Arc::new(Client::with_config(&cli.name, config)?);
    client.start()?;

    let (commands, received) = mpsc::channel();

    let interrupt = commands.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt.send(Command::Exit);
    })?;

    // Feeds parsed stdin lines to the session, then asks it to exit on EOF.
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match Command::try_from(line.as_str()) {
                Ok(cmd) => {
                    if commands.send(cmd).is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("{e}"),
            }
        }
        let _ = commands.send(Command::Exit);
    });

    let printer = {
        let client = Arc::clone(&client);
        thread::spawn(move || print_messages(&client))
    };

    prompt()?;
    for cmd in received {
        debug!("executing {cmd:?}");
        let exit = cmd == Command::Exit;
        client.execute(cmd.signed(client.name()))?;
        if exit {
            break;
        }
        prompt()?;
    }

    if printer.join().is_err() {
        warn!("message printer panicked");
    }
    Ok(())
}

fn prompt() -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "> ")?;
    stdout.flush()
}

/// Print retrieved messages until this client shuts down. Messages that
/// mention this client's name are shown as local, everything else as remote.
fn print_messages(client: &Client) {
    let mut count = 0usize;
    while let Some(message) = client.next_message() {
        count += 1;
        let message = message.trim_end();
        let marker = if message.contains(client.name()) { "<" } else { ">" };
        println!("\r{marker} [{count}] {message}");
    }
    debug!("{} printed {count} messages", client.name());
}
