use anyhow::Result;
use log::info;
use mailbox_chess::config::SessionConfig;
use mailbox_chess::engine::{EngineSession, ProcessAnalyzer, RandomAnalyzer};
use mailbox_chess::uci::UciHandler;
use std::io;

fn main() -> Result<()> {
    env_logger::init();
    let config = SessionConfig::from_env()?;
    let stdin = io::stdin();
    let stdout = io::stdout();

    match config.engine_command {
        Some(command) => {
            info!("analysis by external engine '{}'", command);
            let session = EngineSession::new(move || ProcessAnalyzer::spawn(&command), config.limits);
            UciHandler::new(session).run(stdin.lock(), stdout.lock())
        }
        None => {
            info!("analysis by random legal moves");
            let session = EngineSession::new(|| Ok(RandomAnalyzer::new()), config.limits);
            UciHandler::new(session).run(stdin.lock(), stdout.lock())
        }
    }
}
