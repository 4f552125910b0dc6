mod completions;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use ramhog_txinfo::config::{self, Config};
use ramhog_txinfo::ramhog;
use ramhog_txinfo::txinfo::{CTxInfo, TxInfoKey, TxInfoStore, TxInfoType};

#[derive(Parser)]
#[command(name = "ramhog-txinfo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "RamHog memory-hard hasher and TxInfo metadata store")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(long = "install-completions", value_name = "SHELL")]
    install_completions: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Hash bytes with RamHog and print the digest as hex.
    Hash {
        /// Input bytes, taken literally as UTF-8 text (use --hex for binary
        /// input). Omit, or pass `-`, to read from stdin instead.
        input: Option<String>,
        /// Treat `input` as a hex string instead of literal text.
        #[arg(long)]
        hex: bool,
        /// Digest length in bytes.
        #[arg(long, default_value_t = 32)]
        output_len: usize,
        /// Number of scratchpads. Defaults to the reference parameter (8);
        /// pass a small value for quick local testing.
        #[arg(long)]
        n: Option<u32>,
        /// 64-bit words per scratchpad (must be >= 2).
        #[arg(long)]
        chunks_per_pad: Option<u32>,
        /// Walk iteration count (must be >= 16).
        #[arg(long)]
        iterations: Option<u32>,
    },
    /// Operate on a TxInfo store.
    Txinfo {
        /// Path to the backing SQLite database. Defaults to the path saved
        /// in the config file (or `txinfo.sqlite` on first run).
        #[arg(long)]
        db: Option<String>,
        #[command(subcommand)]
        action: TxinfoAction,
    },
}

#[derive(Subcommand)]
enum TxinfoAction {
    /// Process (insert/supersede) a binding for an address.
    Process {
        address: String,
        #[arg(value_enum)]
        key_type: KeyTypeArg,
        key: String,
        value: String,
    },
    /// Undo the most recently processed binding matching exactly.
    Undo {
        address: String,
        #[arg(value_enum)]
        key_type: KeyTypeArg,
        key: String,
        value: String,
    },
    /// Print the current value bound to `(address, key_type, key)`, if any.
    Get {
        address: String,
        #[arg(value_enum)]
        key_type: KeyTypeArg,
        key: String,
    },
    /// List addresses currently bound to `(key_type, key, value)`.
    AddressesWithValue {
        #[arg(value_enum)]
        key_type: KeyTypeArg,
        key: String,
        value: String,
    },
    /// Print every current binding, sorted by address.
    Dump,
    /// Drop and recreate the store, discarding all history.
    Reset,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum KeyTypeArg {
    Normal,
    WriteOnce,
    Unique,
    Id,
}

impl From<KeyTypeArg> for TxInfoType {
    fn from(value: KeyTypeArg) -> Self {
        match value {
            KeyTypeArg::Normal => TxInfoType::Normal,
            KeyTypeArg::WriteOnce => TxInfoType::WriteOnce,
            KeyTypeArg::Unique => TxInfoType::Unique,
            KeyTypeArg::Id => TxInfoType::Id,
        }
    }
}

/// Load the saved config, if any, falling back to defaults, and persist
/// it back so a first run leaves a config file behind for the next one.
fn load_and_merge_config() -> Result<Config> {
    let path = config::get_config_path();
    let config = if path.exists() {
        config::load_config(&path)?
    } else {
        Config::default()
    };
    config::save_config(&config, &path)?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = &cli.install_completions {
        if shell == "stdout" {
            completions::print_to_stdout("bash")?;
        } else {
            let path = completions::install_user_completion(shell)?;
            println!("Completions installed to: {}", path.display());
        }
        return Ok(());
    }

    let config = load_and_merge_config()?;

    match cli.command {
        Some(Command::Hash { input, hex, output_len, n, chunks_per_pad, iterations }) => {
            run_hash(&config, input.as_deref(), hex, output_len, n, chunks_per_pad, iterations)
        }
        Some(Command::Txinfo { db, action }) => {
            let db_path = db.unwrap_or(config.txinfo_db_path);
            run_txinfo(&db_path, action)
        }
        None => {
            println!("{}", "No command given. Try `--help`.".yellow());
            Ok(())
        }
    }
}

fn run_hash(
    config: &Config,
    input: Option<&str>,
    is_hex: bool,
    output_len: usize,
    n: Option<u32>,
    chunks_per_pad: Option<u32>,
    iterations: Option<u32>,
) -> Result<()> {
    // Omitted, or `-`, means read the input bytes from stdin instead of
    // taking them as a positional argument.
    let bytes = match input {
        Some(text) if text != "-" => {
            if is_hex {
                hex_decode(text)?
            } else {
                text.as_bytes().to_vec()
            }
        }
        _ => read_stdin_input(is_hex)?,
    };

    let defaults = config.ramhog_params();
    let params = ramhog::RamHogParams {
        n: n.unwrap_or(defaults.n),
        chunks_per_pad: chunks_per_pad.unwrap_or(defaults.chunks_per_pad),
        iterations: iterations.unwrap_or(defaults.iterations),
    };

    let mut pads = ramhog::ScratchpadSet::alloc(&params);
    let digest = ramhog::hash(&bytes, &params, &mut pads, output_len);

    println!("{}", hex_encode(&digest).green());
    Ok(())
}

fn run_txinfo(db_path: &str, action: TxinfoAction) -> Result<()> {
    let mut store = TxInfoStore::open(db_path)?;

    match action {
        TxinfoAction::Process { address, key_type, key, value } => {
            let info = CTxInfo::new(TxInfoKey::new(key_type.into(), key), value);
            let (ok, reason) = store.process(&address, &info)?;
            if ok {
                println!("{}", "ok".green());
            } else {
                println!("{}: {}", "rejected".red(), reason);
            }
        }
        TxinfoAction::Undo { address, key_type, key, value } => {
            let info = CTxInfo::new(TxInfoKey::new(key_type.into(), key), value);
            let (ok, reason) = store.undo(&address, &info)?;
            if ok {
                println!("{}", "ok".green());
            } else {
                println!("{}: {}", "rejected".red(), reason);
            }
        }
        TxinfoAction::Get { address, key_type, key } => {
            let key = TxInfoKey::new(key_type.into(), key);
            match store.get(&address, &key)? {
                Some(value) => println!("{value}"),
                None => println!("{}", "(absent)".yellow()),
            }
        }
        TxinfoAction::AddressesWithValue { key_type, key, value } => {
            let key = TxInfoKey::new(key_type.into(), key);
            for address in store.addresses_with_value(&key, &value)? {
                println!("{address}");
            }
        }
        TxinfoAction::Dump => store.dump_latest_infos()?,
        TxinfoAction::Reset => {
            store.reset()?;
            println!("{}", "store reset".green());
        }
    }

    Ok(())
}

/// Reads the hash input from stdin: raw bytes in literal mode, or hex text
/// (trimmed of surrounding whitespace/newlines) in `--hex` mode.
fn read_stdin_input(is_hex: bool) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::Read::read_to_end(&mut std::io::stdin(), &mut buf).context("reading input from stdin")?;
    if is_hex {
        let text = String::from_utf8(buf).context("stdin input must be valid UTF-8 hex text")?;
        hex_decode(text.trim())
    } else {
        Ok(buf)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(anyhow!("hex input must have an even number of characters"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| anyhow!("invalid hex: {e}")))
        .collect()
}
