use crate::config::SearchLimits;
use crate::engine::{Analyzer, EngineSession};
use crate::error::EngineError;
use crate::movegen::{GameStatus, MoveGenerator};
use crate::piece::Color;
use crate::position::Position;
use anyhow::{bail, Context, Result};
use futures_lite::future::block_on;
use log::debug;
use std::io::{BufRead, Write};
use std::time::Duration;

/// Line-oriented command loop in the style of UCI.
pub struct UciHandler<A: Analyzer> {
    position: Position,
    session: EngineSession<A>,
    move_generator: MoveGenerator,
}

impl<A: Analyzer> UciHandler<A> {
    pub fn new(session: EngineSession<A>) -> Self {
        UciHandler {
            position: Position::new(),
            session,
            move_generator: MoveGenerator::new(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Reads commands until `quit` or end of input. Failed commands are
    /// reported on the output and the loop carries on.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("failed to read command")?;
            let command = line.trim();
            if command == "quit" {
                break;
            }

            let response = match self.handle_command(command) {
                Ok(response) => response,
                Err(err) => {
                    debug!("command '{}' failed: {:#}", command, err);
                    format!("info string error: {:#}\n", err)
                }
            };
            output.write_all(response.as_bytes())?;
            output.flush()?;
        }
        self.session.shutdown();
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let Some((&name, args)) = parts.split_first() else {
            return Ok(String::new());
        };

        match name {
            "uci" => Ok(self.handle_uci()),
            "isready" => Ok("readyok\n".to_string()),
            "ucinewgame" => {
                self.position = Position::new();
                Ok(String::new())
            }
            "position" => self.handle_position(args),
            "go" => self.handle_go(args),
            "eval" => self.handle_eval(),
            "moves" => Ok(self.handle_moves()),
            "d" => Ok(self.handle_display()),
            "quit" => Ok(String::new()),
            other => bail!("unknown command '{}'", other),
        }
    }

    fn handle_uci(&self) -> String {
        format!(
            "id name Mailbox Chess {}\nid author {}\nuciok\n",
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_AUTHORS")
        )
    }

    /// `position startpos [moves ...]` or `position fen <fen> [moves ...]`.
    /// The current position is replaced only when every part is accepted.
    fn handle_position(&mut self, args: &[&str]) -> Result<String> {
        let moves_at = args.iter().position(|&word| word == "moves");
        let (setup, moves) = match moves_at {
            Some(at) => (&args[..at], &args[at + 1..]),
            None => (args, &[][..]),
        };

        let mut position = match setup.split_first() {
            Some((&"startpos", [])) => Position::new(),
            Some((&"fen", fields)) if !fields.is_empty() => {
                let fen = fields.join(" ");
                Position::from_fen(&fen).with_context(|| format!("invalid fen '{}'", fen))?
            }
            _ => bail!("expected 'position startpos' or 'position fen <fen>'"),
        };

        for text in moves {
            position
                .play_uci(text)
                .with_context(|| format!("cannot play '{}' in {}", text, position.to_fen()))?;
        }
        self.position = position;
        Ok(String::new())
    }

    fn handle_go(&mut self, args: &[&str]) -> Result<String> {
        let limits = self.parse_limits(args)?;
        if self.move_generator.legal_moves(&self.position).is_empty() {
            return Ok("bestmove (none)\n".to_string());
        }

        match block_on(self.session.best_move(&self.position, Some(limits))) {
            Ok(mv) => Ok(format!("bestmove {}\n", mv)),
            Err(EngineError::NoMove) => Ok("bestmove (none)\n".to_string()),
            Err(err) => Err(err).context("analysis failed"),
        }
    }

    fn parse_limits(&self, args: &[&str]) -> Result<SearchLimits> {
        let mut limits = self.session.limits();
        let mut words = args.iter();
        while let Some(&word) = words.next() {
            let mut value = || -> Result<u64> {
                let text = words.next().with_context(|| format!("'{}' needs a value", word))?;
                text.parse()
                    .with_context(|| format!("'{}' expects a number, got '{}'", word, text))
            };
            match word {
                "depth" => limits.depth = u32::try_from(value()?).context("depth is too large")?,
                "movetime" => limits.movetime = Duration::from_millis(value()?),
                // A twentieth of the remaining clock for the side on move.
                "wtime" | "btime" => {
                    let millis = value()?;
                    let clock_owner = if word == "wtime" { Color::White } else { Color::Black };
                    if clock_owner == self.position.side_to_move {
                        limits.movetime = Duration::from_millis(millis / 20);
                    }
                }
                _ => {}
            }
        }
        Ok(limits)
    }

    fn handle_eval(&mut self) -> Result<String> {
        let score = block_on(self.session.evaluate(&self.position, None)).context("evaluation failed")?;
        Ok(format!("info score cp {}\n", score))
    }

    fn handle_moves(&self) -> String {
        let moves: Vec<String> = self
            .move_generator
            .legal_moves(&self.position)
            .iter()
            .map(|mv| mv.to_string())
            .collect();
        format!("{}\n", moves.join(" "))
    }

    fn handle_display(&self) -> String {
        let status = match self.move_generator.game_status(&self.position) {
            GameStatus::Ongoing if self.position.in_check() => "check".to_string(),
            GameStatus::Ongoing => "ongoing".to_string(),
            GameStatus::Checkmate(winner) => format!("checkmate, {} wins", winner),
            GameStatus::Stalemate => "stalemate".to_string(),
            GameStatus::FiftyMoveRule => "draw by fifty-move rule".to_string(),
            GameStatus::InsufficientMaterial => "draw by insufficient material".to_string(),
        };
        format!("{}\nstatus: {}\n", self.position, status)
    }
}
