//! Boundary to the external analysis engine.
//!
//! The core only ever hands the engine a FEN string and gets back a move
//! string or a score. A suggested move is accepted only after it has been
//! found in the position's own legal move set.

use crate::config::SearchLimits;
use crate::error::EngineError;
use crate::movegen::Move;
use crate::position::Position;
use futures_lite::future;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::future::Future;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

/// Scores at or beyond this magnitude encode a forced mate.
pub const MATE_SCORE: i32 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    BestMove,
    Evaluate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub fen: String,
    pub kind: AnalysisKind,
    pub limits: SearchLimits,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisReply {
    /// UCI move text, unvalidated.
    BestMove(String),
    /// Centipawns from the side to move's point of view.
    Score(i32),
}

pub trait Analyzer {
    fn analyze(
        &mut self,
        request: AnalysisRequest,
    ) -> impl Future<Output = Result<AnalysisReply, EngineError>> + Send;

    fn shutdown(&mut self) {}
}

type Factory<A> = Box<dyn FnMut() -> Result<A, EngineError> + Send>;

/// Owns an analyzer for the length of a session.
///
/// The analyzer is created by the factory on the first request and torn
/// down by `shutdown` or when the session is dropped. A later request after
/// shutdown starts a fresh one.
pub struct EngineSession<A: Analyzer> {
    factory: Factory<A>,
    engine: Option<A>,
    limits: SearchLimits,
}

impl<A: Analyzer> EngineSession<A> {
    pub fn new<F>(factory: F, limits: SearchLimits) -> Self
    where
        F: FnMut() -> Result<A, EngineError> + Send + 'static,
    {
        Self {
            factory: Box::new(factory),
            engine: None,
            limits,
        }
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_some()
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    fn engine(&mut self) -> Result<&mut A, EngineError> {
        if self.engine.is_none() {
            info!("starting analysis engine");
            self.engine = Some((self.factory)()?);
        }
        self.engine.as_mut().ok_or(EngineError::Disconnected)
    }

    async fn request(
        &mut self,
        position: &Position,
        kind: AnalysisKind,
        limits: Option<SearchLimits>,
    ) -> Result<AnalysisReply, EngineError> {
        let request = AnalysisRequest {
            fen: position.to_fen(),
            kind,
            limits: limits.unwrap_or(self.limits),
        };
        debug!("analysis request {:?}", request);
        self.engine()?.analyze(request).await
    }

    /// Asks for a move and checks it against the position's legal moves.
    pub async fn best_move(
        &mut self,
        position: &Position,
        limits: Option<SearchLimits>,
    ) -> Result<Move, EngineError> {
        let text = match self.request(position, AnalysisKind::BestMove, limits).await? {
            AnalysisReply::BestMove(text) => text,
            other => return Err(EngineError::UnexpectedReply(format!("{:?}", other))),
        };
        let mut trial = position.clone();
        trial.play_uci(&text).map_err(|err| {
            warn!("engine suggested '{}' in {}: {}", text, position.to_fen(), err);
            EngineError::RejectedMove(err)
        })
    }

    pub async fn evaluate(
        &mut self,
        position: &Position,
        limits: Option<SearchLimits>,
    ) -> Result<i32, EngineError> {
        match self.request(position, AnalysisKind::Evaluate, limits).await? {
            AnalysisReply::Score(score) => Ok(score),
            other => Err(EngineError::UnexpectedReply(format!("{:?}", other))),
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            info!("stopping analysis engine");
            engine.shutdown();
        }
    }
}

impl<A: Analyzer> Drop for EngineSession<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// In-process stand-in: plays a random legal move and scores by material.
pub struct RandomAnalyzer {
    rng: StdRng,
}

impl RandomAnalyzer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn reply(&mut self, request: &AnalysisRequest) -> Result<AnalysisReply, EngineError> {
        let position = Position::from_fen(&request.fen)?;
        match request.kind {
            AnalysisKind::BestMove => {
                let moves = position.legal_moves();
                let mv = moves.choose(&mut self.rng).ok_or(EngineError::NoMove)?;
                Ok(AnalysisReply::BestMove(mv.to_string()))
            }
            AnalysisKind::Evaluate => Ok(AnalysisReply::Score(material_balance(&position))),
        }
    }
}

impl Default for RandomAnalyzer {
    fn default() -> Self {
        RandomAnalyzer::new()
    }
}

impl Analyzer for RandomAnalyzer {
    fn analyze(
        &mut self,
        request: AnalysisRequest,
    ) -> impl Future<Output = Result<AnalysisReply, EngineError>> + Send {
        future::ready(self.reply(&request))
    }
}

/// Material difference in centipawns, positive when the side to move is ahead.
pub fn material_balance(position: &Position) -> i32 {
    position
        .board
        .pieces()
        .map(|(_, piece)| {
            if piece.is_color(position.side_to_move) {
                piece.value()
            } else {
                -piece.value()
            }
        })
        .sum()
}

/// An external UCI engine driven over its stdin/stdout.
pub struct ProcessAnalyzer {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ProcessAnalyzer {
    pub fn spawn(command: &str) -> Result<Self, EngineError> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or(EngineError::Disconnected)?;
        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                command: command.to_string(),
                source,
            })?;
        let stdin = child.stdin.take().ok_or(EngineError::Disconnected)?;
        let stdout = child.stdout.take().ok_or(EngineError::Disconnected)?;

        let mut engine = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        };
        engine.send("uci")?;
        engine.read_until("uciok")?;
        engine.send("isready")?;
        engine.read_until("readyok")?;
        info!("external engine '{}' ready", command);
        Ok(engine)
    }

    fn send(&mut self, line: &str) -> Result<(), EngineError> {
        debug!("engine <- {}", line);
        writeln!(self.stdin, "{}", line)?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(EngineError::Disconnected);
        }
        let line = line.trim().to_string();
        debug!("engine -> {}", line);
        Ok(line)
    }

    fn read_until(&mut self, token: &str) -> Result<(), EngineError> {
        loop {
            if self.read_line()? == token {
                return Ok(());
            }
        }
    }

    fn search(&mut self, request: &AnalysisRequest) -> Result<AnalysisReply, EngineError> {
        self.send(&format!("position fen {}", request.fen))?;
        self.send(&format!(
            "go depth {} movetime {}",
            request.limits.depth,
            request.limits.movetime.as_millis()
        ))?;

        let mut score = None;
        loop {
            let line = self.read_line()?;
            let mut words = line.split_whitespace();
            match words.next() {
                Some("info") => {
                    if let Some(found) = parse_score(&line) {
                        score = Some(found);
                    }
                }
                Some("bestmove") => {
                    let mv = words.next().ok_or_else(|| EngineError::UnexpectedReply(line.clone()))?;
                    return match request.kind {
                        AnalysisKind::BestMove if mv == "(none)" || mv == "0000" => {
                            Err(EngineError::NoMove)
                        }
                        AnalysisKind::BestMove => Ok(AnalysisReply::BestMove(mv.to_string())),
                        AnalysisKind::Evaluate => score
                            .map(AnalysisReply::Score)
                            .ok_or(EngineError::UnexpectedReply(line)),
                    };
                }
                _ => {}
            }
        }
    }
}

impl Analyzer for ProcessAnalyzer {
    /// The returned future does blocking pipe I/O when polled and holds its
    /// thread until the engine answers `bestmove`. Drive it with `block_on`
    /// or from a thread where blocking is acceptable.
    fn analyze(
        &mut self,
        request: AnalysisRequest,
    ) -> impl Future<Output = Result<AnalysisReply, EngineError>> + Send {
        async move { self.search(&request) }
    }

    fn shutdown(&mut self) {
        if self.send("quit").is_ok() {
            let _ = self.child.wait();
        }
    }
}

impl Drop for ProcessAnalyzer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Reads `score cp N` or `score mate N` out of a UCI info line.
///
/// Mate distances come in moves and are stored as `MATE_SCORE` minus plies:
/// mate in N is 2N-1 plies away, being mated in N is 2N plies away.
fn parse_score(line: &str) -> Option<i32> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let at = words.iter().position(|&word| word == "score")?;
    let value: i32 = words.get(at + 2)?.parse().ok()?;
    match *words.get(at + 1)? {
        "cp" => Some(value),
        "mate" if value > 0 => Some(MATE_SCORE - value.checked_mul(2)?.checked_sub(1)?),
        "mate" => Some(-MATE_SCORE - value.checked_mul(2)?),
        _ => None,
    }
}
