use anyhow::{bail, Error};
use keypad::{Engine, KeyReader};
use std::ffi::OsString;
use std::io::BufRead;
use std::io::Write;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "keypad",
    about = "A pocket calculator. Keys come from the arguments, or from stdin line by line."
)]
struct Opt {
    /// Enables info log level
    #[structopt(short, long)]
    info: bool,

    /// Enables debug log level
    #[structopt(short, long)]
    debug: bool,

    /// Enables trace log level
    #[structopt(short, long)]
    trace: bool,

    /// Keys to press, e.g. `12 + 3 X 4 =`
    #[structopt(parse(from_os_str), allow_hyphen_values = true)]
    keys: Vec<OsString>,
}

impl Opt {
    fn log_level(&self) -> log::Level {
        if self.trace {
            log::Level::Trace
        } else if self.debug {
            log::Level::Debug
        } else if self.info {
            log::Level::Info
        } else {
            log::Level::Warn
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let opt = Opt::from_args();

    simple_logger::init_with_level(opt.log_level())?;

    let mut reader = KeyReader::default();
    let mut engine = Engine::new();

    let stdout = std::io::stdout();
    let lock = stdout.lock();
    let mut w = std::io::BufWriter::new(lock);

    if !opt.keys.is_empty() {
        for arg in opt.keys {
            let Some(utf8_arg) = arg.to_str() else {
                bail!("Arguments contain invalid UTF-8 string");
            };

            for char in utf8_arg.chars().chain(std::iter::once(' ')) {
                reader
                    .update(char)?
                    .map(|key| engine.push(key))
                    .transpose()?;
            }
        }

        reader.finalize()?.map(|key| engine.push(key)).transpose()?;
        writeln!(&mut w, "{}", engine)?;
    } else {
        let stdin = std::io::stdin();
        let input = std::io::BufReader::new(stdin);
        let is_interactive = atty::is(atty::Stream::Stdin);

        if is_interactive {
            write!(&mut w, ">>> ")?;
            w.flush()?;
        }

        for line in input.lines() {
            let line = line?;
            // A rejected key is reported and the rest of the line still runs
            for outcome in line.chars().map(Some).chain(std::iter::once(None)) {
                let key = match outcome {
                    Some(char) => reader.update(char),
                    None => reader.finalize(),
                };
                match key {
                    Ok(Some(key)) => {
                        if let Err(e) = engine.push(key) {
                            eprintln!("error: {}", e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("error: {}", e),
                }
            }

            writeln!(&mut w, "{}", engine)?;
            if is_interactive {
                write!(&mut w, ">>> ")?;
            }
            w.flush()?;
        }
    }
    w.flush()?;

    Ok(())
}
