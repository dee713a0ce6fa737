//! External agents.
//!
//! An [`Agent`] answers observations with one line of output. Agents may
//! be child processes (one per seat), the runner's own stdin/stdout, or
//! the built-in [`RandomAgent`](crate::random_agent::RandomAgent).

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use agricola_core::snapshot::Observation;
use thiserror::Error;

use crate::protocol::observation_line;

/// Error type for agent communication.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The agent program could not be started.
    #[error("Failed to start agent '{program}': {source}")]
    Spawn {
        /// Program path.
        program: String,
        /// Underlying error.
        source: io::Error,
    },
    /// Reading from or writing to the agent failed.
    #[error("Agent I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The observation could not be encoded.
    #[error("Failed to encode observation: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Something that answers observations.
pub trait Agent {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Show `observation` and wait for one line of output.
    ///
    /// `Ok(None)` means the agent has closed its output and will not
    /// decide anything more.
    fn respond(&mut self, observation: &Observation) -> Result<Option<String>, AgentError>;
}

// ============================================================================
// Line streams
// ============================================================================

/// Agent on the other end of a reader/writer pair.
#[derive(Debug)]
pub struct StreamAgent<R, W> {
    name: String,
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> StreamAgent<R, W> {
    /// Agent reading decisions from `reader` and writing observations to
    /// `writer`.
    pub fn new(name: impl Into<String>, reader: R, writer: W) -> Self {
        Self {
            name: name.into(),
            reader,
            writer,
        }
    }

    /// The writer side.
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl StreamAgent<BufReader<io::Stdin>, io::Stdout> {
    /// Agent on the runner's own stdin/stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new("stdio", BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> Agent for StreamAgent<R, W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn respond(&mut self, observation: &Observation) -> Result<Option<String>, AgentError> {
        let line = observation_line(observation)?;
        match self
            .writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.flush())
        {
            Ok(()) => {}
            // The agent went away; same as closing its output.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let mut answer = String::new();
        loop {
            answer.clear();
            if self.reader.read_line(&mut answer)? == 0 {
                return Ok(None);
            }
            if !answer.trim().is_empty() {
                return Ok(Some(answer.trim().to_string()));
            }
        }
    }
}

// ============================================================================
// Child processes
// ============================================================================

/// Agent running as a child process, speaking over its stdin/stdout.
///
/// The child's stderr is inherited. The child is killed when the agent is
/// dropped.
#[derive(Debug)]
pub struct ProcessAgent {
    child: Child,
    stream: StreamAgent<BufReader<ChildStdout>, ChildStdin>,
}

impl ProcessAgent {
    /// Start `program` with `args`.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, AgentError> {
        let spawn_error = |source| AgentError::Spawn {
            program: program.to_string(),
            source,
        };
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_error)?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(spawn_error(io::Error::other("agent pipes unavailable")));
        };
        tracing::info!(program, pid = child.id(), "agent started");
        Ok(Self {
            child,
            stream: StreamAgent::new(program, BufReader::new(stdout), stdin),
        })
    }

    /// Start a program given as a command line: the first word is the
    /// program, the rest are arguments.
    pub fn from_command_line(command: &str) -> Result<Self, AgentError> {
        let mut words = command.split_whitespace().map(String::from);
        let program = words.next().unwrap_or_default();
        let args: Vec<String> = words.collect();
        Self::spawn(&program, &args)
    }
}

impl Agent for ProcessAgent {
    fn name(&self) -> &str {
        self.stream.name()
    }

    fn respond(&mut self, observation: &Observation) -> Result<Option<String>, AgentError> {
        self.stream.respond(observation)
    }
}

impl Drop for ProcessAgent {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agricola_core::cards::CardCatalogue;
    use agricola_core::config::GameConfig;
    use agricola_core::engine::Game;
    use std::io::Cursor;

    fn observation() -> Observation {
        let game = Game::new(&GameConfig::default(), CardCatalogue::standard()).unwrap();
        game.observe(0).unwrap()
    }

    #[test]
    fn test_stream_round_trip() {
        let input = Cursor::new(b"\n{\"type\":\"pick\",\"index\":1}\n".to_vec());
        let mut agent = StreamAgent::new("test", input, Vec::new());
        let answer = agent.respond(&observation()).unwrap();
        assert_eq!(answer.as_deref(), Some(r#"{"type":"pick","index":1}"#));

        let written = String::from_utf8(agent.writer().clone()).unwrap();
        assert_eq!(written.lines().count(), 1);
        let sent: Observation = serde_json::from_str(written.trim()).unwrap();
        assert_eq!(sent, observation());
    }

    #[test]
    fn test_stream_end_is_none() {
        let mut agent = StreamAgent::new("test", Cursor::new(Vec::new()), Vec::new());
        assert_eq!(agent.respond(&observation()).unwrap(), None);
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        let err = ProcessAgent::spawn("./definitely-not-an-agent", &[]).unwrap_err();
        assert!(matches!(err, AgentError::Spawn { .. }));
    }
}
